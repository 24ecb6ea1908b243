//! Error types for the ds-ec2 planner.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration, input parsing, planning and the hand-off to the
//! provisioning collaborator.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the ds-ec2 planner.
#[derive(Debug, Error)]
pub enum DsEc2Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed user input.
    #[error("Input parse error: {0}")]
    Input(#[from] InputParseError),

    /// Errors raised at the provisioning boundary.
    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A GPU instance was requested without a custom machine image.
    #[error("Instance type '{instance_type}' is GPU enabled but no custom image id was supplied (set AWS_AMI)")]
    MissingCustomImage {
        /// The GPU instance type.
        instance_type: String,
    },

    /// The required package list is empty.
    #[error("Required package list is empty; nothing to install")]
    EmptyPackageList,

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// A configuration or requirements file was not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Input parsing errors.
#[derive(Debug, Error)]
pub enum InputParseError {
    /// The instance type is not of the form `family.size`.
    #[error("Invalid instance type '{value}': {reason}")]
    InvalidInstanceType {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors raised by a provisioning collaborator.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The stack could not be rendered into the collaborator's format.
    #[error("Failed to render stack '{stack}': {message}")]
    RenderFailed {
        /// Stack name.
        stack: String,
        /// Description of the failure.
        message: String,
    },

    /// The rendered output could not be written.
    #[error("Failed to write {path}: {message}")]
    WriteFailed {
        /// Destination path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for ds-ec2 operations.
pub type Result<T> = std::result::Result<T, DsEc2Error>;

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl InputParseError {
    /// Creates an invalid instance type error.
    #[must_use]
    pub fn instance_type(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInstanceType {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl ProvisionError {
    /// Creates a write failure for the given path.
    #[must_use]
    pub fn write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_convert_into_top_level() {
        let err = DsEc2Error::from(ConfigError::EmptyPackageList);
        assert!(matches!(err, DsEc2Error::Config(ConfigError::EmptyPackageList)));
        assert!(err.to_string().starts_with("Configuration error:"));

        let err = DsEc2Error::from(InputParseError::instance_type("x", "no dot"));
        assert_eq!(
            err.to_string(),
            "Input parse error: Invalid instance type 'x': no dot"
        );
    }

    #[test]
    fn test_missing_image_message_names_instance() {
        let err = ConfigError::MissingCustomImage {
            instance_type: String::from("g4dn.xlarge"),
        };
        assert!(err.to_string().contains("g4dn.xlarge"));
    }
}
