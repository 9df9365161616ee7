//! Schema command - list and show registered types

use console::style;
use crdform_kube::{Provider, TypeKind};
use serde::Serialize;

use crate::display;
use crate::error::{CliError, Result};

#[derive(Serialize)]
struct TypeEntry<'a> {
    kind: TypeKind,
    type_name: &'a str,
}

pub fn list(kind: Option<TypeKind>, json: bool) -> Result<()> {
    let provider = Provider::new();
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => vec![TypeKind::Resource, TypeKind::DataSource, TypeKind::Manifest],
    };

    if json {
        let entries: Vec<TypeEntry> = kinds
            .iter()
            .flat_map(|&kind| {
                provider
                    .type_names(kind)
                    .into_iter()
                    .map(move |type_name| TypeEntry { kind, type_name })
            })
            .collect();
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    let metadata = provider.metadata();
    println!(
        "{} provider {} v{}",
        style("→").blue(),
        style(metadata.type_name).cyan(),
        metadata.version
    );
    for kind in kinds {
        println!();
        println!("{}", style(format!("{}s", kind)).bold());
        for type_name in provider.type_names(kind) {
            println!("  {}", type_name);
        }
    }
    Ok(())
}

pub fn show(type_name: &str, kind: TypeKind, json: bool) -> Result<()> {
    let schema = Provider::new().schema(kind, type_name)?;
    if json {
        let out = serde_json::to_string_pretty(&schema)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", out);
    } else {
        display::print_schema(type_name, &schema);
    }
    Ok(())
}
