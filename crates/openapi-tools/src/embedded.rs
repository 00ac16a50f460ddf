//! Extract a JSON object assigned inside script text.
//!
//! Swagger UI bundles (`swagger-ui-init.js`) ship the spec as a JavaScript object literal, e.g.
//! `var options = { "swaggerDoc": { ... }, ... }`. [`extract`] finds the first occurrence of the
//! key and returns the balanced-brace object that follows it.
//!
//! Known limitation: brace counting ignores string-literal context, so a `{` or `}` inside a
//! quoted string desynchronizes the scan. A string-aware tokenizer would close this gap.

use crate::error::SpecError;
use serde_json::Value;

/// Locate `key` in `script` and parse the balanced `{...}` object following it.
///
/// # Errors
///
/// - [`SpecError::KeyNotFound`] if `key` does not occur in `script`
/// - [`SpecError::MalformedEmbedding`] if no `{` follows the key
/// - [`SpecError::UnbalancedBraces`] if the text ends before the braces balance
/// - [`SpecError::EmbeddedJsonParse`] if the extracted text is not valid JSON
pub fn extract(script: &str, key: &str) -> Result<Value, SpecError> {
    let raw = extract_raw(script, key)?;
    serde_json::from_str(raw).map_err(|source| SpecError::EmbeddedJsonParse {
        key: key.to_string(),
        source,
    })
}

/// Same scan as [`extract`], returning the object text without parsing it.
///
/// # Errors
///
/// See [`extract`]; never returns [`SpecError::EmbeddedJsonParse`].
pub fn extract_raw<'a>(script: &'a str, key: &str) -> Result<&'a str, SpecError> {
    let key_pos = script.find(key).ok_or_else(|| SpecError::KeyNotFound {
        key: key.to_string(),
    })?;

    let start = script[key_pos..]
        .find('{')
        .map(|offset| key_pos + offset)
        .ok_or_else(|| SpecError::MalformedEmbedding {
            key: key.to_string(),
        })?;

    // `{` and `}` are ASCII, so byte offsets are always char boundaries.
    let mut depth: usize = 0;
    for (offset, byte) in script.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&script[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    Err(SpecError::UnbalancedBraces {
        key: key.to_string(),
    })
}
