//! Local `$ref` resolver.
//!
//! Parameters, request bodies and path items may be `{"$ref": "#/..."}` JSON pointers into the
//! same document (`#/parameters/...` in Swagger 2, `#/components/...` in `OpenAPI` 3).
//! External document refs are not followed.

use crate::error::SpecError;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct RefResolver<'a> {
    root: &'a Value,
}

impl<'a> RefResolver<'a> {
    #[must_use]
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Follow a `$ref` chain until a value without `$ref` is reached.
    ///
    /// Values without a `$ref` are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Invalid`] for external refs, dangling pointers and cycles.
    pub fn resolve(&self, value: &'a Value) -> Result<&'a Value, SpecError> {
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut cur = value;

        while let Some(reference) = cur.get("$ref").and_then(Value::as_str) {
            if !seen.insert(reference) {
                return Err(SpecError::Invalid(format!(
                    "Cyclic $ref detected while resolving: {reference}"
                )));
            }

            let Some(pointer) = reference.strip_prefix('#') else {
                return Err(SpecError::Invalid(format!(
                    "Unsupported $ref (only local '#/...' refs are resolved): {reference}"
                )));
            };
            if !pointer.is_empty() && !pointer.starts_with('/') {
                return Err(SpecError::Invalid(format!(
                    "Unsupported $ref fragment (expected JSON pointer starting with '/'): {reference}"
                )));
            }

            cur = self.root.pointer(pointer).ok_or_else(|| {
                SpecError::Invalid(format!("Unresolved $ref '{reference}'"))
            })?;
        }

        Ok(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn follows_chained_local_refs() {
        let doc = json!({
            "parameters": {
                "Alias": { "$ref": "#/parameters/Limit" },
                "Limit": { "name": "limit", "in": "query" }
            }
        });
        let r = RefResolver::new(&doc);
        let start = json!({ "$ref": "#/parameters/Alias" });
        let resolved = r.resolve(&start).unwrap();
        assert_eq!(resolved["name"], "limit");
    }

    #[test]
    fn non_ref_values_pass_through() {
        let doc = json!({});
        let v = json!({ "name": "id" });
        assert_eq!(RefResolver::new(&doc).resolve(&v).unwrap(), &v);
    }

    #[test]
    fn rejects_cycles_dangling_and_external_refs() {
        let doc = json!({
            "a": { "$ref": "#/b" },
            "b": { "$ref": "#/a" }
        });
        let r = RefResolver::new(&doc);

        let cyclic = json!({ "$ref": "#/a" });
        assert!(matches!(r.resolve(&cyclic), Err(SpecError::Invalid(m)) if m.contains("Cyclic")));

        let dangling = json!({ "$ref": "#/nope" });
        assert!(matches!(r.resolve(&dangling), Err(SpecError::Invalid(m)) if m.contains("Unresolved")));

        let external = json!({ "$ref": "common.yaml#/parameters/Q" });
        assert!(matches!(r.resolve(&external), Err(SpecError::Invalid(m)) if m.contains("Unsupported")));
    }
}
