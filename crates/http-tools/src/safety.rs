//! Redaction helpers for outbound HTTP.
//!
//! Spec and API URLs frequently carry credentials (`user:pass@host`) or API keys in the query
//! string. Anything that ends up in an error message or a log line goes through here first.

use url::Url;

/// Strip userinfo, query and fragment from a URL.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut redacted = url.clone();
    // Both setters only fail for cannot-be-a-base URLs, which have nothing to strip.
    let _ = redacted.set_username("");
    let _ = redacted.set_password(None);
    redacted.set_query(None);
    redacted.set_fragment(None);
    redacted.to_string()
}

/// Render a `reqwest` error with its URL (if any) redacted.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let msg = e.to_string();
    match e.url() {
        Some(u) => msg.replace(u.as_str(), &redact_url(u)),
        None => msg,
    }
}
