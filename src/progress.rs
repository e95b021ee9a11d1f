//! Packed progress codec
//!
//! The packed ecosystem stores progress as a single line:
//!
//! ```text
//! 1725870547829*40@0#1766:39.0%
//! │             │  │ │    └── percentage, kept verbatim
//! │             │  │ └─────── character offset into the fragment
//! │             │  └───────── reserved, always 0
//! │             └──────────── reading-order fragment index
//! └────────────────────────── library insertion token
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Progress record in the packed numeric format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedProgress {
    /// Library insertion token (0 when produced by conversion)
    pub token: u64,
    /// Reading-order fragment index (0-based)
    pub fragment: u64,
    /// Reserved, always 0
    pub reserved: u64,
    /// Character offset into the fragment
    pub offset: u64,
    /// Percentage text without the trailing `%`, never reformatted
    pub percentage: String,
}

impl PackedProgress {
    /// Create a record for a position produced by conversion
    pub fn new(fragment: u64, offset: u64, percentage: impl Into<String>) -> Self {
        Self {
            token: 0,
            fragment,
            reserved: 0,
            offset,
            percentage: percentage.into(),
        }
    }

    /// Completion as a fraction in `0.0..=1.0`, if the percentage text is a number
    pub fn completion(&self) -> Option<f64> {
        self.percentage
            .parse::<f64>()
            .ok()
            .map(|percent| (percent / 100.0).clamp(0.0, 1.0))
    }
}

/// Render a completion fraction as packed percentage text (`0.391` -> `39.1`)
pub fn percentage_text(fraction: f64) -> String {
    format!("{:.1}", (fraction * 100.0).clamp(0.0, 100.0))
}

/// Check percentage text for the packed form: digits and dots, nothing else
pub fn validate_percentage(text: &str) -> Result<()> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(Error::InvalidProgressFormat(format!(
            "invalid percentage '{}'",
            text
        )));
    }
    Ok(())
}

/// Parse the packed text form
pub fn parse(input: &str) -> Result<PackedProgress> {
    let invalid = |reason: &str| {
        Error::InvalidProgressFormat(format!("{} in '{}'", reason, input))
    };

    let body = input
        .strip_suffix('%')
        .ok_or_else(|| invalid("missing trailing '%'"))?;

    let mut rest = body;
    let mut fields = [0u64; 4];
    for (field, separator) in fields.iter_mut().zip(['*', '@', '#', ':']) {
        let (digits, after) = rest
            .split_once(separator)
            .ok_or_else(|| invalid(&format!("missing '{}'", separator)))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(&format!("expected digits before '{}'", separator)));
        }
        *field = digits
            .parse()
            .map_err(|_| invalid(&format!("number out of range before '{}'", separator)))?;
        rest = after;
    }

    validate_percentage(rest).map_err(|_| invalid("invalid percentage"))?;

    let [token, fragment, reserved, offset] = fields;
    Ok(PackedProgress {
        token,
        fragment,
        reserved,
        offset,
        percentage: rest.to_string(),
    })
}

impl FromStr for PackedProgress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl fmt::Display for PackedProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}*{}@{}#{}:{}%",
            self.token, self.fragment, self.reserved, self.offset, self.percentage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let progress = parse("1725870547829*40@0#1766:39.0%").unwrap();
        assert_eq!(progress.token, 1725870547829);
        assert_eq!(progress.fragment, 40);
        assert_eq!(progress.reserved, 0);
        assert_eq!(progress.offset, 1766);
        assert_eq!(progress.percentage, "39.0");
    }

    #[test]
    fn test_roundtrip_preserves_percentage_text() {
        for original in [
            "1725870547829*40@0#1766:39.0%",
            "0*0@0#0:0%",
            "12*3@0#45:100.00%",
        ] {
            assert_eq!(parse(original).unwrap().to_string(), original);
        }
    }

    #[test]
    fn test_invalid_formats() {
        for input in [
            "",
            "1*2@0#3:4.0",
            "1*2@0#3:%",
            "1*2@0#3:4,0%",
            "1*2@0#:4.0%",
            "-1*2@0#3:4.0%",
            "1*2@0#3#4:5%",
            "99999999999999999999*2@0#3:4.0%",
            " 1*2@0#3:4.0%",
        ] {
            assert!(
                matches!(parse(input), Err(Error::InvalidProgressFormat(_))),
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn test_completion_fraction() {
        let progress = PackedProgress::new(3, 10, "39.0");
        assert_eq!(progress.to_string(), "0*3@0#10:39.0%");
        let completion = progress.completion().unwrap();
        assert!((completion - 0.39).abs() < 1e-9);

        assert_eq!(PackedProgress::new(0, 0, "1.2.3").completion(), None);
    }

    #[test]
    fn test_validate_percentage() {
        for ok in ["0", "39.0", "100.00", "1.2.3"] {
            assert!(validate_percentage(ok).is_ok(), "{:?}", ok);
        }
        for bad in ["", "abc", "39%", "-1", " 5", "4,0"] {
            assert!(
                matches!(validate_percentage(bad), Err(Error::InvalidProgressFormat(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_percentage_text() {
        assert_eq!(percentage_text(0.391), "39.1");
        assert_eq!(percentage_text(0.0), "0.0");
        assert_eq!(percentage_text(1.0), "100.0");
    }
}
