//! OpenAPI/Swagger -> MCP tool registration.
//!
//! Given a spec URL (plain JSON, or a Swagger UI JavaScript bundle with the spec embedded),
//! this crate fetches and parses the document, synthesizes one callable tool per operation and
//! registers them into a [`registry::ToolRegistry`] that is frozen before serving.
//!
//! Pipeline, leaf-first:
//! - [`acquire`] + [`embedded`]: fetch the spec and pull it out of script payloads
//! - [`model`] + [`resolver`]: parse into a [`model::SpecDocument`], following local `$ref`s
//! - [`params`]: declared parameters -> tool arguments + [`params::ParameterContract`]
//! - [`naming`]: `(method, path)` -> safe tool identifier
//! - [`builder`]: operation -> [`registry::ToolDescriptor`] with a request-building handler
//! - [`driver`]: every operation -> registry
//! - [`source`]: the above, bounded by a startup timeout
//!
//! HTTP itself is delegated to `apibridge-http-tools`.

pub mod acquire;
pub mod builder;
pub mod config;
pub mod driver;
pub mod embedded;
pub mod error;
pub mod model;
pub mod naming;
pub mod params;
pub mod registry;
pub mod resolver;
pub mod source;

pub use config::{ApiSourceConfig, HashPolicy};
pub use error::{OpenApiToolsError, Result};
pub use registry::{FrozenRegistry, ToolDescriptor, ToolRegistry};
pub use source::{ApiToolSource, StartedSource};
