//! Error handling for the Relaygen code generation library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Decoding failures of the
//! smuggled generator properties get their own type, [`DecodeError`], because
//! they are usually reported as diagnostics instead of aborting a run.
//!
//! # Examples
//!
//! ```
//! use relaygen_core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     // Operations that might fail...
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type for Relaygen generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Relaygen generation operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// OpenAPI error
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// Template error
    #[error("Template error: {0}")]
    Template(String),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generator property could not be decoded
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Self::Template(msg.into())
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}

/// Failure to decode one of the base64 transported generator properties.
///
/// Segment indices are zero-based positions in the `.`-split `targets` value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A `targets` segment is not valid base64
    #[error("targets segment {index} is not valid base64: {source}")]
    TargetBase64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    /// A `targets` segment decoded to something that is not JSON
    #[error("targets segment {index} is not valid JSON: {source}")]
    TargetJson {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A `targets` segment is JSON but not a flat object of scalars
    #[error("targets segment {index} {reason}")]
    TargetShape { index: usize, reason: String },

    /// A mapping property is not valid base64
    #[error("{key} is not valid base64: {source}")]
    MappingBase64 {
        key: &'static str,
        #[source]
        source: base64::DecodeError,
    },
}

impl DecodeError {
    /// Index of the failing `targets` segment, if the error concerns one
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            Self::TargetBase64 { index, .. }
            | Self::TargetJson { index, .. }
            | Self::TargetShape { index, .. } => Some(*index),
            Self::MappingBase64 { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_index() {
        let err = DecodeError::TargetShape {
            index: 2,
            reason: "must be a JSON object".to_string(),
        };
        assert_eq!(err.segment_index(), Some(2));
        assert_eq!(err.to_string(), "targets segment 2 must be a JSON object");
    }

    #[test]
    fn test_decode_error_converts() {
        let err: Error = DecodeError::TargetShape {
            index: 0,
            reason: "must be a JSON object".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Decoding error: targets segment 0"));
    }
}
