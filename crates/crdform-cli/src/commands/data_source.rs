//! Get command - read an object through the data source

use crdform_kube::{Provider, ProviderConfig};
use std::path::Path;

use super::fail;
use crate::error::Result;
use crate::input;

pub async fn get(config: &ProviderConfig, type_name: &str, file: &Path) -> Result<()> {
    let lookup = input::load_document(file)?;
    let mut provider = Provider::new();
    // Resolve the type name before connecting
    provider.data_source(type_name)?;
    provider.configure(config).await?;
    let state = provider
        .data_source(type_name)?
        .read(&lookup)
        .await
        .map_err(fail)?;
    input::print_state(&state)
}
