//! # Error Handling
//!
//! Defines the single error taxonomy used across the gateway, following
//! spec.md §7. Parse/validation/policy errors carry a `details` list and are
//! rendered 4xx by the API layer; everything else is a single-message 5xx.

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// The gateway's error taxonomy (spec.md §7 "Error kinds").
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// Filter DSL failed to parse into an operator tree.
    #[error("invalid filter structure: {message}")]
    InvalidFilterStructure { message: String },

    /// Filter tree parsed but violates per-endpoint policy.
    #[error("filter validation failed")]
    FilterValidationFailed { details: Vec<String> },

    /// Document failed JSON-Schema validation during a write.
    #[error("schema validation failed")]
    SchemaValidationFailed { details: Vec<String> },

    /// HTTP method not permitted for the resolved endpoint.
    #[error("method not allowed: {method}")]
    MethodNotAllowed { method: String },

    /// No endpoint descriptor matches (method, path).
    #[error("endpoint not found: {method} {path}")]
    EndpointNotFound { method: String, path: String },

    /// `env` request header did not match the configured environment
    /// (spec.md §4.8: exact wording is part of the wire contract).
    #[error("Fatal attempt of a breach of environments.")]
    EnvironmentMismatch,

    /// Sub-entity merge rule violation (non-existent id, already deleted, missing id on delete).
    #[error("sub-entity conflict: {message}")]
    SubEntityConflict { message: String },

    /// Required environment variable or config path is missing.
    #[error("configuration missing: {message}")]
    ConfigMissing { message: String },

    /// The document backend could not be reached or returned an error.
    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// Caller passed a structurally invalid argument (mapped to 400).
    #[error("illegal argument: {message}")]
    IllegalArgument { message: String },

    /// Catch-all for anything else (mapped to 500).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    pub fn invalid_filter<S: Into<String>>(message: S) -> Self {
        Self::InvalidFilterStructure { message: message.into() }
    }

    pub fn filter_validation(details: Vec<String>) -> Self {
        Self::FilterValidationFailed { details }
    }

    pub fn schema_validation(details: Vec<String>) -> Self {
        Self::SchemaValidationFailed { details }
    }

    pub fn method_not_allowed<S: Into<String>>(method: S) -> Self {
        Self::MethodNotAllowed { method: method.into() }
    }

    pub fn endpoint_not_found<M: Into<String>, P: Into<String>>(method: M, path: P) -> Self {
        Self::EndpointNotFound { method: method.into(), path: path.into() }
    }

    pub fn sub_entity_conflict<S: Into<String>>(message: S) -> Self {
        Self::SubEntityConflict { message: message.into() }
    }

    pub fn config_missing<S: Into<String>>(message: S) -> Self {
        Self::ConfigMissing { message: message.into() }
    }

    pub fn backend_unavailable<S: Into<String>>(message: S) -> Self {
        Self::BackendUnavailable { message: message.into() }
    }

    pub fn illegal_argument<S: Into<String>>(message: S) -> Self {
        Self::IllegalArgument { message: message.into() }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// The `details` list to surface on a 4xx body, if any (spec.md §7).
    pub fn details(&self) -> Option<&[String]> {
        match self {
            Self::FilterValidationFailed { details } | Self::SchemaValidationFailed { details } => {
                Some(details)
            }
            _ => None,
        }
    }

    /// Whether this error kind belongs to the 4xx "recovered by the orchestrator" class
    /// (spec.md §4.5, §7) as opposed to an unhandled 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilterStructure { .. }
                | Self::FilterValidationFailed { .. }
                | Self::SchemaValidationFailed { .. }
                | Self::MethodNotAllowed { .. }
                | Self::EndpointNotFound { .. }
                | Self::EnvironmentMismatch
                | Self::SubEntityConflict { .. }
                | Self::IllegalArgument { .. }
        )
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidFilterStructure { .. }
            | Self::FilterValidationFailed { .. }
            | Self::SchemaValidationFailed { .. }
            | Self::SubEntityConflict { .. }
            | Self::IllegalArgument { .. } => 400,
            Self::MethodNotAllowed { .. } => 400,
            Self::EndpointNotFound { .. } => 404,
            Self::EnvironmentMismatch => 403,
            Self::ConfigMissing { .. } => 500,
            Self::BackendUnavailable { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }
}

impl From<config::ConfigError> for GatewayError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_missing(format!("configuration loading failed: {error}"))
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{field}: {}", error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");
        Self::config_missing(message)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::invalid_filter(format!("malformed JSON: {error}"))
    }
}

impl From<mongodb::error::Error> for GatewayError {
    fn from(error: mongodb::error::Error) -> Self {
        Self::backend_unavailable(error.to_string())
    }
}
