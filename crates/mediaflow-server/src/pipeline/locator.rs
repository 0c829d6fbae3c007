//! Source locator parsing
//!
//! A locator is a single URL or a comma-separated list of URLs.

use super::error::PipelineError;

/// Check that a URL uses a scheme the downloader can fetch
pub fn is_valid_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Split a raw locator into trimmed URLs, preserving order.
///
/// Empty entries (`a,,b`, a trailing comma) and non-HTTP(S) entries reject the
/// whole locator, so the number of sources always equals the number of
/// comma-separated entries.
pub fn split_locator(raw: &str) -> Result<Vec<String>, PipelineError> {
    if raw.trim().is_empty() {
        return Err(PipelineError::InvalidRequest(
            "Source URL is required and cannot be empty".to_string(),
        ));
    }

    raw.split(',')
        .enumerate()
        .map(|(position, entry)| {
            let url = entry.trim();
            if url.is_empty() {
                return Err(PipelineError::InvalidRequest(format!(
                    "Source URL list has an empty entry at position {}",
                    position
                )));
            }
            if !is_valid_url(url) {
                return Err(PipelineError::InvalidRequest(format!(
                    "Source URL at position {} must start with http:// or https://: {}",
                    position, url
                )));
            }
            Ok(url.to_string())
        })
        .collect()
}
