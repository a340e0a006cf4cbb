use serde::de::DeserializeOwned;
use tracing::warn;

/// Parse a generated JSON list field. Missing, blank or malformed text
/// yields an empty list; one bad field never takes the page down with it.
pub fn parse_list<T: DeserializeOwned>(field: &str, page: &str, raw: Option<&str>) -> Vec<T> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(e) => {
            let preview: String = raw.chars().take(100).collect();
            warn!(page, field, error = %e, preview = %preview, "Failed to parse JSON field");
            Vec::new()
        }
    }
}

/// Comma-separated text as a trimmed list without empties
pub fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
