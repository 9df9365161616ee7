//! Display formatting for CLI output

use console::style;
use crdform_core::{AttrType, Attribute, Diagnostic, PlanModifier, Schema, Severity};

/// Print diagnostics to stderr, errors first
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

    for diag in sorted {
        let marker = match diag.severity {
            Severity::Error => style("✗").red().bold(),
            Severity::Warning => style("⚠").yellow().bold(),
        };
        match &diag.path {
            Some(path) => eprintln!("{} {} {}", marker, diag.summary, style(path).cyan()),
            None => eprintln!("{} {}", marker, diag.summary),
        }
        eprintln!("    {}", style(&diag.detail).dim());
    }
}

/// Print a schema as an indented attribute tree
pub fn print_schema(type_name: &str, schema: &Schema) {
    println!("{}", style(type_name).cyan().bold());
    if !schema.description.is_empty() {
        println!("  {}", style(&schema.description).dim());
    }
    println!();
    for attr in &schema.attributes {
        print_attribute(attr, 1);
    }
}

fn print_attribute(attr: &Attribute, depth: usize) {
    let indent = "  ".repeat(depth);
    let flags = attribute_flags(attr);
    println!(
        "{}{} {} {}",
        indent,
        style(&attr.name).bold(),
        style(attr.ty.type_name()).yellow(),
        style(flags).dim()
    );
    if attr.json_name != crdform_core::schema::snake_to_camel(&attr.name) {
        println!("{}  {} {}", indent, style("field:").dim(), attr.json_name);
    }

    let nested = match &attr.ty {
        AttrType::Object(attrs) => Some(attrs),
        AttrType::List(elem) | AttrType::Map(elem) => match elem.as_ref() {
            AttrType::Object(attrs) => Some(attrs),
            _ => None,
        },
        _ => None,
    };
    if let Some(attrs) = nested {
        for child in attrs {
            print_attribute(child, depth + 1);
        }
    }
}

/// Short flag summary such as `(required, forces replacement)`
pub fn attribute_flags(attr: &Attribute) -> String {
    let mut flags = Vec::new();
    if attr.required {
        flags.push("required");
    }
    if attr.optional {
        flags.push("optional");
    }
    if attr.computed {
        flags.push("computed");
    }
    if attr.sensitive {
        flags.push("sensitive");
    }
    if attr.has_modifier(PlanModifier::RequiresReplace) {
        flags.push("forces replacement");
    }
    if flags.is_empty() {
        String::new()
    } else {
        format!("({})", flags.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_flags() {
        let attr = Attribute::string("name")
            .required()
            .plan_modifier(PlanModifier::RequiresReplace);
        assert_eq!(attribute_flags(&attr), "(required, forces replacement)");

        let attr = Attribute::bool("force").optional().computed();
        assert_eq!(attribute_flags(&attr), "(optional, computed)");
    }
}
