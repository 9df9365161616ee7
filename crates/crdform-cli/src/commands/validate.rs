//! Validate command - check every registered schema

use console::style;
use crdform_core::has_errors;
use crdform_kube::{Provider, TypeKind};

use crate::display;
use crate::error::{CliError, Result};

pub fn run(json: bool) -> Result<()> {
    let provider = Provider::new();
    let diagnostics = provider.validate_implementation();
    let checked: usize = [TypeKind::Resource, TypeKind::DataSource, TypeKind::Manifest]
        .iter()
        .map(|&kind| provider.type_names(kind).len())
        .sum();

    if json {
        let out = serde_json::json!({
            "valid": !has_errors(&diagnostics),
            "schemas": checked,
            "diagnostics": diagnostics,
        });
        println!("{}", out);
    } else if diagnostics.is_empty() {
        println!(
            "{} Validation passed: {} schemas checked",
            style("✓").green().bold(),
            checked
        );
    } else {
        display::print_diagnostics(&diagnostics);
    }

    if has_errors(&diagnostics) {
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        return Err(CliError::validation_with_help(
            format!("{} schema problem(s) found", errors),
            "fix the attribute declarations reported above",
        ));
    }
    Ok(())
}
