//! Error types for odin-core.

use thiserror::Error;

/// Result type alias using odin-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for bridge operations
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Discovery errors
    #[error("Did not find valid {what} in response:\n{response}")]
    DiscoveryShape { what: String, response: String },

    // Attribute I/O errors
    #[error("Put {path} = {value} rejected: {message}")]
    Rejected {
        path: String,
        value: String,
        message: String,
    },

    #[error("{key} not found in response:\n{response}")]
    MissingKey { key: String, response: String },

    #[error("Value {value} is not a valid {expected}")]
    TypeMismatch { expected: String, value: String },

    #[error("Value {value} is not one of the allowed values for {attribute}")]
    NotAllowed { attribute: String, value: String },

    #[error("Attribute {0} is read only")]
    ReadOnly(String),

    #[error("Fan out of {attribute} failed for {failed} of {total} targets")]
    FanOut {
        attribute: String,
        failed: usize,
        total: usize,
    },

    // Hierarchy errors
    #[error("Node {child} not found in {parent}")]
    NodeNotFound { parent: String, child: String },

    #[error("Attribute {attribute} not found in {node}")]
    AttributeNotFound { node: String, attribute: String },

    #[error("Attribute {attribute} already defined on {node}")]
    DuplicateAttribute { node: String, attribute: String },

    #[error("Fan out targets for {attribute} have mismatched types: {types}")]
    FanOutTypeMismatch { attribute: String, types: String },

    #[error("Invalid node pattern: {0}")]
    Pattern(#[from] regex::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a discovery shape error naming the offending response
    pub fn discovery_shape(what: impl Into<String>, response: &serde_json::Value) -> Self {
        Self::DiscoveryShape {
            what: what.into(),
            response: response.to_string(),
        }
    }

    /// Create a type mismatch error for a value
    pub fn type_mismatch(expected: impl std::fmt::Display, value: &serde_json::Value) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            value: value.to_string(),
        }
    }

    pub fn node_not_found(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self::NodeNotFound {
            parent: parent.into(),
            child: child.into(),
        }
    }
}
