//! Registration driver: every (path, method) operation becomes one registered tool.

use crate::builder;
use crate::model::SpecDocument;
use crate::naming::NameReservations;
use crate::registry::{ToolDescriptor, ToolRegistry};
use apibridge_http_tools::transport::HttpTransport;
use std::sync::Arc;

/// Build a tool for every operation in `spec` and register it. Returns the number registered.
///
/// Names are made unique within this document; order follows the document (paths, then methods
/// within a path). A name already in the registry is replaced, so registering the same document
/// twice leaves the registry unchanged. Descriptors are all built before the first one is
/// registered.
pub fn register_all(
    spec: &SpecDocument,
    registry: &mut ToolRegistry,
    transport: Arc<dyn HttpTransport>,
) -> usize {
    let mut names = NameReservations::new();

    let descriptors: Vec<ToolDescriptor> = spec
        .operations()
        .map(|(path, method, operation)| {
            let mut descriptor = builder::build(method, path, operation, Arc::clone(&transport));
            descriptor.name = names.reserve(&descriptor.name);
            descriptor
        })
        .collect();

    let count = descriptors.len();
    for descriptor in descriptors {
        registry.register(descriptor);
    }
    count
}
