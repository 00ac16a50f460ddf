//! Tool identifiers derived from (method, path).

use apibridge_http_tools::transport::HttpMethod;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// MCP clients commonly reject longer tool names.
pub const MAX_TOOL_NAME_LEN: usize = 64;

const TRUNCATED_PREFIX_LEN: usize = 55;
const HASH_SUFFIX_LEN: usize = 8;

/// Derive a deterministic tool name from an operation's method and path.
///
/// `GET /pet/{petId}` becomes `get_pet_petId`. Output matches `^[A-Za-z0-9_-]{1,64}$`; names
/// that would exceed 64 characters keep their first 55 characters plus `_` and 8 hex digits of
/// a SHA-256 over the full cleaned name.
#[must_use]
pub fn sanitize(method: HttpMethod, path: &str) -> String {
    let path = path
        .trim_matches('/')
        .replace('/', "_")
        .replace(['{', '}'], "");

    let name: String = format!("{}_{path}", method.as_str())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if name.len() <= MAX_TOOL_NAME_LEN {
        return name;
    }

    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    format!(
        "{}_{}",
        &name[..TRUNCATED_PREFIX_LEN],
        &digest[..HASH_SUFFIX_LEN]
    )
}

/// Names already handed out within one registration pass.
///
/// Reservation is first-come: on a clash the later operation gets `_1`, `_2`, ... so the
/// final name depends on registration order.
#[derive(Debug, Clone, Default)]
pub struct NameReservations {
    taken: HashSet<String>,
}

impl NameReservations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Claim `base`, or the first free `base_<n>` (trimmed to stay within 64 characters).
    pub fn reserve(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }

        let mut counter: usize = 1;
        loop {
            let suffix = format!("_{counter}");
            let keep = base.len().min(MAX_TOOL_NAME_LEN - suffix.len());
            let candidate = format!("{}{suffix}", truncate_to_char_boundary(base, keep));
            if self.taken.insert(candidate.clone()) {
                tracing::warn!(
                    tool = %base,
                    assigned = %candidate,
                    "tool name already taken; assigned a suffixed name"
                );
                return candidate;
            }
            counter += 1;
        }
    }
}

fn truncate_to_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
