//! HTTP plumbing shared by apibridge tool sources.
//!
//! - [`transport`]: the outbound call abstraction generated tools delegate to
//! - [`semantics`]: MCP tool annotations derived from HTTP method semantics
//! - [`safety`]: redaction helpers for URLs and transport error messages
//!
//! It intentionally contains **no** OpenAPI knowledge.

pub mod safety;
pub mod semantics;
pub mod transport;
