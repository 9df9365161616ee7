//! CLI error types with exit code handling
//!
//! Every failure is reported through miette and mapped to an exit code.

use crdform_kube::ProviderError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Configuration or schema validation failed
    #[error("Validation failed: {message}")]
    #[diagnostic(code(crdform::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Error raised by the provider
    #[error("{summary}: {message}")]
    #[diagnostic(code(crdform::cli::provider))]
    Provider {
        summary: String,
        message: String,
        #[help]
        help: Option<String>,
        exit_code: i32,
    },

    /// Bad argument or input document
    #[error("Invalid input: {message}")]
    #[diagnostic(code(crdform::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(crdform::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Provider { exit_code, .. } => *exit_code,
            CliError::Input { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        let exit_code = match &err {
            ProviderError::InvalidConfig { .. } | ProviderError::RequiresReplace { .. } => {
                exit_codes::VALIDATION_ERROR
            }
            ProviderError::Get { .. }
            | ProviderError::Patch { .. }
            | ProviderError::Delete { .. }
            | ProviderError::WaitTimeout { .. } => exit_codes::CLUSTER_ERROR,
            ProviderError::OfflineMode
            | ProviderError::Unconfigured
            | ProviderError::ClientConfig(_) => exit_codes::CONFIG_ERROR,
            ProviderError::UnknownType { .. } | ProviderError::InvalidImportId(_) => {
                exit_codes::USAGE_ERROR
            }
            ProviderError::Io(_) => exit_codes::IO_ERROR,
            _ => exit_codes::ERROR,
        };
        let help = match &err {
            ProviderError::UnknownType {
                suggestion: Some(s), ..
            } => Some(format!("did you mean '{}'?", s)),
            ProviderError::UnknownType { .. } => {
                Some("run 'crdform schema list' to see registered type names".to_string())
            }
            ProviderError::OfflineMode => {
                Some("drop --offline (or set 'offline: false') to manage resources".to_string())
            }
            ProviderError::RequiresReplace { .. } => {
                Some("delete the object and apply it again to rename or move it".to_string())
            }
            _ => None,
        };
        let diagnostic = err.to_diagnostic();
        CliError::Provider {
            summary: diagnostic.summary,
            message: err.to_string(),
            help,
            exit_code,
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_exit_codes() {
        assert_eq!(
            CliError::from(ProviderError::OfflineMode).exit_code(),
            exit_codes::CONFIG_ERROR
        );
        assert_eq!(
            CliError::from(ProviderError::RequiresReplace {
                paths: vec!["metadata.name".into()]
            })
            .exit_code(),
            exit_codes::VALIDATION_ERROR
        );
    }

    #[test]
    fn test_unknown_type_help() {
        let err = CliError::from(ProviderError::UnknownType {
            type_name: "k8s_x".into(),
            suggestion: Some("k8s_y".into()),
        });
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
        assert!(matches!(err, CliError::Provider { help: Some(ref h), .. } if h.contains("k8s_y")));
        assert_eq!(err.to_string(), "Unknown Type: unknown type 'k8s_x'");
    }
}
