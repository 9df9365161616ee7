//! Error types for crdform-kube

use crdform_core::{CoreError, Diagnostic};
use std::time::Duration;
use thiserror::Error;

/// Result type for crdform-kube operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur on the provider surface
///
/// None of these are retried; each is reported to the caller as a
/// [`Diagnostic`] via [`ProviderError::to_diagnostic`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The object could not be built from the plan
    #[error("unable to marshal {kind}: {message}")]
    Marshal { kind: String, message: String },

    /// The object returned by the API server could not be decoded
    #[error("unable to unmarshal {kind}: {message}")]
    Unmarshal { kind: String, message: String },

    /// GET failed
    #[error("unable to GET {kind} '{key}': {source}")]
    Get {
        kind: String,
        key: String,
        #[source]
        source: kube::Error,
    },

    /// Server-side apply PATCH failed
    #[error("unable to PATCH {kind} '{key}': {source}")]
    Patch {
        kind: String,
        key: String,
        #[source]
        source: kube::Error,
    },

    /// DELETE failed
    #[error("unable to DELETE {kind} '{key}': {source}")]
    Delete {
        kind: String,
        key: String,
        #[source]
        source: kube::Error,
    },

    /// YAML rendering failed
    #[error("unable to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The provider was configured without cluster access
    #[error("the provider is in offline mode and cannot contact the cluster")]
    OfflineMode,

    /// Import identifier was malformed
    #[error(transparent)]
    InvalidImportId(CoreError),

    /// An adapter was used before the provider handed it configuration
    #[error("the provider has not been configured")]
    Unconfigured,

    /// No type registered under this name
    #[error("unknown type '{type_name}'")]
    UnknownType {
        type_name: String,
        suggestion: Option<String>,
    },

    /// Configuration failed validation
    #[error("invalid configuration: {}", summarize(.diagnostics))]
    InvalidConfig { diagnostics: Vec<Diagnostic> },

    /// An update would change attributes that force replacement
    #[error("changing {} requires replacing the object", .paths.join(", "))]
    RequiresReplace { paths: Vec<String> },

    /// `wait_for` conditions did not match before the timeout
    #[error("timed out after {timeout:?} waiting for {kind} '{key}': pending {}", .pending.join(", "))]
    WaitTimeout {
        kind: String,
        key: String,
        pending: Vec<String>,
        timeout: Duration,
    },

    /// Kubernetes client configuration could not be loaded
    #[error("unable to configure Kubernetes client: {0}")]
    ClientConfig(String),

    /// Provider configuration file could not be read
    #[error("unable to read provider configuration: {0}")]
    Io(#[from] std::io::Error),
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ProviderError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::Get { source, .. }
            | ProviderError::Patch { source, .. }
            | ProviderError::Delete { source, .. } => {
                matches!(source, kube::Error::Api(resp) if resp.code == 404)
            }
            _ => false,
        }
    }

    /// Convert into diagnostics for the caller
    ///
    /// Validation failures expand into their individual diagnostics.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            ProviderError::InvalidConfig { diagnostics } => diagnostics.clone(),
            other => vec![other.to_diagnostic()],
        }
    }

    /// Convert into a single diagnostic with a stable summary line
    pub fn to_diagnostic(&self) -> Diagnostic {
        let summary = match self {
            ProviderError::Marshal { .. } => "Unable to marshal JSON",
            ProviderError::Unmarshal { .. } => "Unable to unmarshal resource",
            ProviderError::Get { .. } => "Unable to GET resource",
            ProviderError::Patch { .. } => "Unable to PATCH resource",
            ProviderError::Delete { .. } => "Unable to DELETE resource",
            ProviderError::Yaml(_) => "Unable to marshal YAML",
            ProviderError::OfflineMode => "Provider in Offline Mode",
            ProviderError::InvalidImportId(_) => "Unexpected Import Identifier",
            ProviderError::Unconfigured => "Unexpected Provider Data",
            ProviderError::UnknownType { .. } => "Unknown Type",
            ProviderError::InvalidConfig { .. } => "Invalid Configuration",
            ProviderError::RequiresReplace { .. } => "Replacement Required",
            ProviderError::WaitTimeout { .. } => "Timed Out Waiting for Resource",
            ProviderError::ClientConfig(_) => "Unable to Configure Kubernetes Client",
            ProviderError::Io(_) => "Unable to Read Configuration",
        };
        let mut detail = self.to_string();
        if let ProviderError::UnknownType {
            suggestion: Some(s),
            ..
        } = self
        {
            detail.push_str(&format!(" (did you mean '{}'?)", s));
        }
        if let ProviderError::OfflineMode = self {
            detail.push_str(". Set 'offline' to false in the provider configuration to manage resources");
        }
        Diagnostic::error(summary, detail)
    }
}
