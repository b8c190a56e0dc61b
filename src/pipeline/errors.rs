//! Error types for pipeline conversion

use super::platform::{Platform, Role};
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across parsers, generators and the converter.
pub type Result<T> = std::result::Result<T, ConversionError>;

/// Errors that can occur while converting a pipeline
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The platform exists but has no parser (source) or generator (target)
    #[error("unsupported {role} platform: {platform}")]
    UnsupportedPlatform {
        /// Requested platform.
        platform: Platform,
        /// Whether it was asked for as a source or a target.
        role: Role,
    },

    /// The name does not denote any known platform
    #[error("unknown platform '{0}' (expected one of: github, gitlab, circleci, jenkins, azure, bitbucket)")]
    UnknownPlatform(String),

    /// Input text could not be decoded as the expected structured format
    #[error("malformed {platform} input: {source}")]
    MalformedInput {
        /// Platform whose parser rejected the input.
        platform: Platform,
        /// Underlying decoder diagnostic.
        #[source]
        source: serde_yaml::Error,
    },

    /// Input unreadable or output unwritable
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    /// Builds a `MalformedInput` error from a plain message.
    pub(crate) fn malformed(platform: Platform, message: impl std::fmt::Display) -> Self {
        use serde::de::Error as _;
        Self::MalformedInput {
            platform,
            source: serde_yaml::Error::custom(message),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
