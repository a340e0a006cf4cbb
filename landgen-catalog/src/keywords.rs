use serde::{Deserialize, Serialize};
use tracing::warn;

/// Why a keyword was kept out of page generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeywordRejection {
    #[error("too short")]
    TooShort,

    #[error("no letters")]
    NoLetters,
}

/// Rules a keyword must pass before any page is created for it
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeywordPolicy {
    /// Minimum length in characters, after trimming
    pub min_len: usize,
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self { min_len: 3 }
    }
}

impl KeywordPolicy {
    pub fn validate(&self, keyword: &str) -> Result<(), KeywordRejection> {
        // Short entries are usually typos or a field caught mid-edit.
        if keyword.chars().count() < self.min_len {
            return Err(KeywordRejection::TooShort);
        }
        if !keyword.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(KeywordRejection::NoLetters);
        }
        Ok(())
    }

    /// Split a comma-separated keyword field into valid and rejected entries,
    /// preserving the operator's order.
    pub fn parse(&self, raw: &str) -> ParsedKeywords {
        let mut parsed = ParsedKeywords::default();

        for keyword in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            match self.validate(keyword) {
                Ok(()) => {
                    if !parsed.valid.iter().any(|k| k == keyword) {
                        parsed.valid.push(keyword.to_string());
                    }
                }
                Err(rejection) => {
                    warn!(keyword, %rejection, "Skipping invalid keyword");
                    parsed.rejected.push((keyword.to_string(), rejection));
                }
            }
        }

        parsed
    }

    /// Parse an optional field; a missing field yields nothing.
    pub fn parse_field(&self, raw: Option<&str>) -> ParsedKeywords {
        raw.map(|r| self.parse(r)).unwrap_or_default()
    }
}

/// Outcome of parsing one service's keyword field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedKeywords {
    pub valid: Vec<String>,
    pub rejected: Vec<(String, KeywordRejection)>,
}

impl ParsedKeywords {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}
