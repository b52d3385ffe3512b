//! Request dispatcher (spec.md §4.4): resolves `(method, path)` against the
//! endpoint registry and classifies the call as read or write.

use crate::domain::endpoint::EndpointDescriptor;
use crate::errors::GatewayError;
use crate::registry::EndpointRegistry;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Read,
    Write,
}

/// Resolve `method`/`path` to a descriptor and its read/write class, failing
/// closed with `EndpointNotFound` when nothing matches (spec.md §4.4).
pub fn resolve(
    registry: &EndpointRegistry,
    method: &str,
    path: &str,
) -> Result<(Arc<EndpointDescriptor>, RequestClass), GatewayError> {
    let descriptor = registry
        .lookup(method, path)
        .ok_or_else(|| GatewayError::endpoint_not_found(method, path))?;

    let class =
        if descriptor.is_write_method(method) { RequestClass::Write } else { RequestClass::Read };

    Ok((descriptor, class))
}
