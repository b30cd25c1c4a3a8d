//! Builds the chat provider URL carrying the prompt.

use crate::error::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;

/// Browsers may silently truncate URLs longer than this.
pub const URL_LENGTH_WARNING_THRESHOLD: usize = 8000;

/// Everything but RFC 3986 unreserved characters gets percent-encoded.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Append `model` (when non-empty) and `q` to `base_url`.
///
/// Existing parameters on the base URL are kept, except that a key being set
/// replaces its previous value.
pub fn build_url(base_url: &str, model: &str, query: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| Error::InvalidBaseUrl(format!("{} ({})", base_url, e)))?;

    let mut params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if !model.is_empty() {
        set_param(&mut params, "model", model);
    }
    set_param(&mut params, "q", query);

    let encoded = params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(&encoded));

    Ok(url)
}

/// Warning text for URLs long enough to risk truncation.
pub fn length_warning(url: &str) -> Option<String> {
    let len = url.len();
    (len > URL_LENGTH_WARNING_THRESHOLD).then(|| {
        format!(
            "Warning: URL is {} characters long and may be truncated by the browser.",
            len
        )
    })
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Set `key` in place: the first occurrence takes the value, later ones are
/// dropped, and a missing key is appended.
fn set_param(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    let mut seen = false;
    params.retain(|(k, _)| {
        if k != key {
            return true;
        }
        let keep = !seen;
        seen = true;
        keep
    });

    match params.iter_mut().find(|(k, _)| k == key) {
        Some((_, existing)) => *existing = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}
