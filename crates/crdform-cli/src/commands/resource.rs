//! Resource commands - apply, read, delete and import

use console::style;
use crdform_kube::{Provider, ProviderConfig, ResourceAdapter};
use std::path::Path;

use super::fail;
use crate::error::Result;
use crate::input;

/// Resolve the type name, then connect and hand out a configured adapter
async fn adapter(config: &ProviderConfig, type_name: &str) -> Result<ResourceAdapter> {
    let mut provider = Provider::new();
    provider.resource(type_name)?;
    provider.configure(config).await?;
    Ok(provider.resource(type_name)?)
}

/// Create, or update when a prior state is given
pub async fn apply(
    config: &ProviderConfig,
    type_name: &str,
    file: &Path,
    prior: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let desired = input::load_document(file)?;
    let prior = prior.map(input::load_document).transpose()?;

    if dry_run {
        let adapter = Provider::new().resource(type_name)?;
        let outcome = adapter.plan(prior.as_ref(), &desired).map_err(fail)?;
        for path in &outcome.requires_replace {
            eprintln!(
                "{} {} forces replacement",
                style("⚠").yellow(),
                style(path).cyan()
            );
        }
        eprintln!("{} Plan is valid (dry run)", style("✓").green().bold());
        return input::print_state(&outcome.planned);
    }

    let adapter = adapter(config, type_name).await?;
    let state = match &prior {
        Some(prior) => adapter.update(prior, &desired).await,
        None => adapter.create(&desired).await,
    }
    .map_err(fail)?;

    eprintln!(
        "{} Applied {} {}",
        style("✓").green().bold(),
        type_name,
        style(state["id"].as_str().unwrap_or_default()).cyan()
    );
    input::print_state(&state)
}

pub async fn read(config: &ProviderConfig, type_name: &str, state_file: &Path) -> Result<()> {
    let state = input::load_document(state_file)?;
    let adapter = adapter(config, type_name).await?;
    let refreshed = adapter.read(&state).await.map_err(fail)?;
    input::print_state(&refreshed)
}

pub async fn delete(config: &ProviderConfig, type_name: &str, state_file: &Path) -> Result<()> {
    let state = input::load_document(state_file)?;
    let adapter = adapter(config, type_name).await?;
    adapter.delete(&state).await.map_err(fail)?;
    eprintln!(
        "{} Deleted {} {}",
        style("✓").green().bold(),
        type_name,
        style(state["id"].as_str().unwrap_or_default()).cyan()
    );
    Ok(())
}

/// Import `<namespace>/<name>` and complete it with a read
pub async fn import(config: &ProviderConfig, type_name: &str, id: &str) -> Result<()> {
    // Check the identifier before connecting
    let imported = Provider::new().resource(type_name)?.import_state(id)?;
    let adapter = adapter(config, type_name).await?;
    let state = adapter.read(&imported).await.map_err(fail)?;
    input::print_state(&state)
}
