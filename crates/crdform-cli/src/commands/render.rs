//! Render command - manifest to YAML, no cluster required

use crdform_kube::Provider;
use std::path::Path;

use super::fail;
use crate::error::{CliError, Result};
use crate::input;

pub fn run(type_name: &str, file: &Path, full_state: bool) -> Result<()> {
    let renderer = Provider::new().manifest(type_name)?;
    let config = input::load_document(file)?;
    let state = renderer.render(&config).map_err(fail)?;

    if full_state {
        return input::print_state(&state);
    }
    let yaml = state["yaml"]
        .as_str()
        .ok_or_else(|| CliError::internal("rendered state has no yaml"))?;
    print!("{}", yaml);
    Ok(())
}
