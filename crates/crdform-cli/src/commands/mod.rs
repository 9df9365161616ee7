//! CLI commands

pub mod data_source;
pub mod render;
pub mod resource;
pub mod schema;
pub mod validate;

use crdform_kube::ProviderError;

use crate::display;
use crate::error::CliError;

/// Convert a provider error, printing its per-attribute diagnostics first
pub(crate) fn fail(err: ProviderError) -> CliError {
    if let ProviderError::InvalidConfig { diagnostics } = &err {
        display::print_diagnostics(diagnostics);
    }
    err.into()
}
