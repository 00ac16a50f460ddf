//! HTTP semantics helpers.
//!
//! Generated tools advertise RFC 9110-style method semantics to MCP clients through
//! `ToolAnnotations`.

use crate::transport::HttpMethod;
use rmcp::model::ToolAnnotations;

/// Generate MCP tool annotations for an operation's HTTP method.
///
/// `openWorldHint` is always `true`: every generated tool talks to a remote API.
#[must_use]
pub fn annotations_for_method(method: HttpMethod) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match method {
        HttpMethod::Get | HttpMethod::Head | HttpMethod::Options | HttpMethod::Trace => {
            (Some(true), Some(false), Some(true))
        }
        HttpMethod::Post => (Some(false), Some(false), Some(false)),
        HttpMethod::Put | HttpMethod::Delete => (Some(false), Some(true), Some(true)),
        // PATCH may or may not be idempotent; do not guess.
        HttpMethod::Patch => (Some(false), Some(true), None),
    };

    ToolAnnotations {
        title: None,
        read_only_hint: read_only,
        destructive_hint: destructive,
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}
