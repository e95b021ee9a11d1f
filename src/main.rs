//! Progress Bridge
//!
//! Command-line front end: converts progress between the packed and
//! structural formats against a Komga catalog, and relays it to and from the
//! sync service.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use progress_bridge::config::Config;
use progress_bridge::content::KomgaClient;
use progress_bridge::identity;
use progress_bridge::sync::SyncClient;
use progress_bridge::{Converter, PackedProgress};

#[derive(Debug, Parser)]
#[command(name = "progress-bridge", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the document identity of a remote file
    Hash {
        /// File URL (absolute, or relative to the catalog API root)
        url: String,
    },
    /// Convert a structural pointer to packed progress
    ToPacked {
        /// Catalog book id
        book: String,
        /// Structural pointer or fragment anchor
        pointer: String,
        /// Percentage text to carry into the packed form
        #[arg(long, default_value = "0.0")]
        percentage: String,
    },
    /// Convert packed progress to a structural pointer
    ToPointer {
        /// Catalog book id
        book: String,
        /// Packed progress, e.g. `0*40@0#1766:39.0%`
        packed: String,
    },
    /// Fetch progress from the sync service as packed progress
    Pull {
        /// Catalog book id
        book: String,
        /// Document identity (see `hash`)
        document: String,
    },
    /// Store packed progress in the sync service
    Push {
        /// Catalog book id
        book: String,
        /// Document identity (see `hash`)
        document: String,
        /// Packed progress
        packed: String,
    },
    /// Check the sync service credentials
    Auth,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "progress_bridge=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    let cli = Cli::parse();
    tracing::debug!(catalog = %config.catalog.api_root, sync = %config.sync.api_root, "Configuration loaded");

    let komga = KomgaClient::new(&config.catalog, &config.http)
        .context("Failed to initialize catalog client")?;
    let converter = Converter::new(&komga).with_ledger_mode(config.conversion.ledger_mode);

    match cli.command {
        Command::Hash { url } => {
            let digest = identity::hash_remote(&komga, &url)
                .with_context(|| format!("Failed to hash {}", url))?;
            println!("{}", digest);
        }
        Command::ToPacked {
            book,
            pointer,
            percentage,
        } => {
            let packed = converter.to_packed(&book, &pointer, &percentage)?;
            println!("{}", packed);
        }
        Command::ToPointer { book, packed } => {
            let packed: PackedProgress = packed.parse()?;
            println!("{}", converter.to_structural(&book, &packed)?);
        }
        Command::Pull { book, document } => {
            let sync = SyncClient::new(&config.sync, &config.http)?;
            let progress = sync
                .progress(&document)
                .with_context(|| format!("Failed to fetch progress for {}", document))?;
            println!("{}", converter.sync_to_packed(&book, &progress)?);
        }
        Command::Push {
            book,
            document,
            packed,
        } => {
            let packed: PackedProgress = packed.parse()?;
            let progress = converter.packed_to_sync(&book, &document, &packed, &config.sync.device)?;
            let sync = SyncClient::new(&config.sync, &config.http)?;
            let result = sync
                .update_progress(&progress)
                .with_context(|| format!("Failed to store progress for {}", document))?;
            println!("{} {}", result.document, result.timestamp.to_rfc3339());
        }
        Command::Auth => {
            SyncClient::new(&config.sync, &config.http)?.authorize()?;
            println!("ok");
        }
    }

    Ok(())
}
