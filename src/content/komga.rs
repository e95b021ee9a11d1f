//! Komga catalog client
//!
//! Blocking HTTP implementation of [`ContentSource`] against a Komga-style
//! API, authenticated with an `X-API-Key` header.

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use tracing::debug;

use super::source::{ContentSource, ContentStream};
use super::types::{ManifestEntry, ReadingOrderManifest};
use crate::config::{CatalogConfig, HttpConfig};
use crate::error::{Error, Result};

const API_KEY_HEADER: &str = "X-API-Key";

/// Komga API client
#[derive(Debug, Clone)]
pub struct KomgaClient {
    client: Client,
    api_root: String,
    api_key: String,
}

impl KomgaClient {
    /// Create a new client from configuration
    pub fn new(config: &CatalogConfig, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder().timeout(http.timeout()).build()?;

        Ok(Self {
            client,
            api_root: config.api_root.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// URL of an API endpoint below the API root
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    /// Resolve a manifest locator, which may be relative to the API root
    fn locate(&self, href: &str) -> Result<Url> {
        let base = Url::parse(&format!("{}/", self.api_root))
            .map_err(|e| Error::FetchFailed(format!("invalid API root {}: {}", self.api_root, e)))?;
        base.join(href)
            .map_err(|e| Error::FetchFailed(format!("invalid fragment locator {}: {}", href, e)))
    }

    fn get(&self, url: &str) -> Result<Response> {
        debug!(url, "Komga GET");
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailed(format!("{} returned {}", url, status)));
        }
        Ok(response)
    }
}

impl ContentSource for KomgaClient {
    fn manifest(&self, document_id: &str) -> Result<ReadingOrderManifest> {
        let url = self.endpoint(&format!(
            "api/v1/books/{}/manifest/epub",
            urlencoding::encode(document_id)
        ));
        let manifest: ReadingOrderManifest = self.get(&url)?.json()?;
        debug!(document_id, fragments = manifest.len(), "Fetched manifest");
        Ok(manifest)
    }

    fn fetch_fragment(&self, document_id: &str, fragment: &ManifestEntry) -> Result<ContentStream> {
        let url = self.locate(&fragment.href)?;
        debug!(document_id, url = %url, "Fetching fragment");
        Ok(Box::new(self.get(url.as_str())?))
    }

    fn fetch_raw(&self, url: &str) -> Result<ContentStream> {
        let url = self.locate(url)?;
        Ok(Box::new(self.get(url.as_str())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(root: &str) -> KomgaClient {
        let config = CatalogConfig {
            api_root: root.to_string(),
            api_key: "key".to_string(),
        };
        KomgaClient::new(&config, &HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let komga = client("https://komga.local/");
        assert_eq!(
            komga.endpoint("/api/v1/books/0A/manifest/epub"),
            "https://komga.local/api/v1/books/0A/manifest/epub"
        );
    }

    #[test]
    fn test_locate_absolute_and_relative() {
        let komga = client("https://komga.local/base");
        assert_eq!(
            komga.locate("https://cdn.local/ch1.xhtml").unwrap().as_str(),
            "https://cdn.local/ch1.xhtml"
        );
        assert_eq!(
            komga.locate("api/v1/books/0A/resource/ch1.xhtml").unwrap().as_str(),
            "https://komga.local/base/api/v1/books/0A/resource/ch1.xhtml"
        );
    }
}
