//! Schema implementation checks and configuration validation
//!
//! [`validate_implementation`] inspects a schema declaration itself and
//! reports attribute definitions that could never work (conflicting flags,
//! unparseable regexes, validators on the wrong type). [`validate_config`]
//! checks a user configuration against the declared validators.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

use crate::diag::Diagnostic;
use crate::schema::{AttrType, Attribute, PlanModifier, Schema, Validator};

static ATTRIBUTE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static regex"));

/// Names reserved for meta-arguments at the root of a resource block
const RESERVED_ROOT_NAMES: &[&str] = &[
    "connection",
    "count",
    "depends_on",
    "for_each",
    "lifecycle",
    "provider",
    "provisioner",
];

/// Check a schema declaration for internal consistency
///
/// An empty result means the schema is usable.
pub fn validate_implementation(schema: &Schema) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    for name in schema
        .attributes
        .iter()
        .map(|a| a.name.as_str())
        .filter(|n| RESERVED_ROOT_NAMES.contains(n))
    {
        diags.push(
            Diagnostic::error(
                "Reserved Root Attribute Name",
                format!("'{}' is a meta-argument and cannot be an attribute name", name),
            )
            .at(name),
        );
    }

    check_attributes(&schema.attributes, "", &mut diags);
    diags
}

fn check_attributes(attrs: &[Attribute], prefix: &str, diags: &mut Vec<Diagnostic>) {
    let mut names = HashSet::new();
    let mut json_names = HashSet::new();

    for attr in attrs {
        let path = join_path(prefix, &attr.name);

        if !names.insert(attr.name.as_str()) {
            diags.push(Diagnostic::error("Duplicate Attribute Name", "declared more than once").at(&path));
        }
        if attr.json_name.is_empty() {
            diags.push(Diagnostic::error("Missing Field Name", "json_name must not be empty").at(&path));
        } else if !json_names.insert(attr.json_name.as_str()) {
            diags.push(
                Diagnostic::error(
                    "Duplicate Field Name",
                    format!("field '{}' is mapped by more than one attribute", attr.json_name),
                )
                .at(&path),
            );
        }

        check_attribute(attr, &path, diags);
    }
}

fn check_attribute(attr: &Attribute, path: &str, diags: &mut Vec<Diagnostic>) {
    if !ATTRIBUTE_NAME.is_match(&attr.name) {
        diags.push(
            Diagnostic::error(
                "Invalid Attribute Name",
                "names must contain only lowercase letters, digits and underscores, and must not start with a digit",
            )
            .at(path),
        );
    }

    if !attr.required && !attr.optional && !attr.computed {
        diags.push(
            Diagnostic::error(
                "Invalid Attribute Definition",
                "at least one of required, optional or computed must be set",
            )
            .at(path),
        );
    }
    if attr.required && (attr.optional || attr.computed) {
        diags.push(
            Diagnostic::error(
                "Invalid Attribute Definition",
                "required cannot be combined with optional or computed",
            )
            .at(path),
        );
    }

    if let Some(default) = &attr.default {
        if !attr.computed {
            diags.push(
                Diagnostic::error(
                    "Invalid Attribute Definition",
                    "attributes with a default value must also be computed",
                )
                .at(path),
            );
        }
        if let Some(problem) = type_problem(&attr.ty, default) {
            diags.push(
                Diagnostic::error("Invalid Default Value", problem).at(path),
            );
        }
    }

    if attr.has_modifier(PlanModifier::UseStateForUnknown) && !attr.computed {
        diags.push(
            Diagnostic::error(
                "Invalid Plan Modifier",
                "use_state_for_unknown requires a computed attribute",
            )
            .at(path),
        );
    }

    check_validators(attr, path, diags);

    match &attr.ty {
        AttrType::Object(nested) => {
            if nested.is_empty() {
                diags.push(
                    Diagnostic::error("Invalid Attribute Definition", "object has no attributes").at(path),
                );
            }
            check_attributes(nested, path, diags);
        }
        AttrType::List(elem) | AttrType::Map(elem) => {
            if let AttrType::Object(nested) = elem.as_ref() {
                if nested.is_empty() {
                    diags.push(
                        Diagnostic::error("Invalid Attribute Definition", "element object has no attributes")
                            .at(path),
                    );
                }
                check_attributes(nested, path, diags);
            }
        }
        _ => {}
    }
}

fn check_validators(attr: &Attribute, path: &str, diags: &mut Vec<Diagnostic>) {
    let mut min_len = None;
    let mut max_len = None;
    let mut min_val = None;
    let mut max_val = None;

    for validator in &attr.validators {
        let applicable = match validator {
            Validator::LengthAtLeast { min } => {
                min_len = Some(*min);
                attr.ty == AttrType::String
            }
            Validator::LengthAtMost { max } => {
                max_len = Some(*max);
                attr.ty == AttrType::String
            }
            Validator::RegexMatches { pattern, .. } => {
                if let Err(e) = Regex::new(pattern) {
                    diags.push(Diagnostic::error("Invalid Validator", e.to_string()).at(path));
                }
                attr.ty == AttrType::String
            }
            Validator::OneOf { values } => {
                if values.is_empty() {
                    diags.push(
                        Diagnostic::error("Invalid Validator", "one_of requires at least one value").at(path),
                    );
                }
                attr.ty == AttrType::String
            }
            Validator::AtLeast { min } => {
                min_val = Some(*min);
                matches!(attr.ty, AttrType::Int64 | AttrType::Float64)
            }
            Validator::AtMost { max } => {
                max_val = Some(*max);
                matches!(attr.ty, AttrType::Int64 | AttrType::Float64)
            }
            Validator::SizeAtMost { .. } => matches!(attr.ty, AttrType::List(_) | AttrType::Map(_)),
        };

        if !applicable {
            diags.push(
                Diagnostic::error(
                    "Invalid Validator",
                    format!("{:?} cannot be applied to a {} attribute", validator, attr.ty.type_name()),
                )
                .at(path),
            );
        }
    }

    if let (Some(min), Some(max)) = (min_len, max_len) {
        if min > max {
            diags.push(
                Diagnostic::error("Invalid Validator", format!("length bounds are inverted ({} > {})", min, max))
                    .at(path),
            );
        }
    }
    if let (Some(min), Some(max)) = (min_val, max_val) {
        if min > max {
            diags.push(
                Diagnostic::error("Invalid Validator", format!("value bounds are inverted ({} > {})", min, max))
                    .at(path),
            );
        }
    }
}

/// Validate a configuration value against a schema
///
/// Reports unknown arguments, missing required attributes, values set on
/// read-only attributes, type mismatches and validator failures.
pub fn validate_config(schema: &Schema, config: &JsonValue) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    match config {
        JsonValue::Object(_) => check_object(&schema.attributes, config, "", &mut diags),
        _ => diags.push(Diagnostic::error(
            "Invalid Configuration",
            "configuration must be an object",
        )),
    }
    diags
}

fn check_object(attrs: &[Attribute], value: &JsonValue, prefix: &str, diags: &mut Vec<Diagnostic>) {
    let Some(obj) = value.as_object() else {
        return;
    };

    for key in obj.keys() {
        if !attrs.iter().any(|a| &a.name == key) {
            diags.push(
                Diagnostic::error(
                    "Unsupported Argument",
                    format!("an argument named '{}' is not expected here", key),
                )
                .at(join_path(prefix, key)),
            );
        }
    }

    for attr in attrs {
        let path = join_path(prefix, &attr.name);
        let field = obj.get(&attr.name).unwrap_or(&JsonValue::Null);

        if field.is_null() {
            if attr.required {
                diags.push(
                    Diagnostic::error(
                        "Missing Configuration for Required Attribute",
                        format!("'{}' must be set", attr.name),
                    )
                    .at(&path),
                );
            }
            continue;
        }

        if attr.computed && !attr.optional {
            diags.push(
                Diagnostic::error(
                    "Invalid Configuration for Read-Only Attribute",
                    format!("'{}' is computed and cannot be set", attr.name),
                )
                .at(&path),
            );
            continue;
        }

        check_value(attr, &attr.ty, field, &path, true, diags);
    }
}

fn check_value(
    attr: &Attribute,
    ty: &AttrType,
    value: &JsonValue,
    path: &str,
    own_value: bool,
    diags: &mut Vec<Diagnostic>,
) {
    if value.is_null() {
        return;
    }
    if let Some(problem) = type_problem(ty, value) {
        diags.push(Diagnostic::error("Incorrect Attribute Value Type", problem).at(path));
        return;
    }

    // Validators belong to the attribute itself, not to its elements.
    if own_value {
        for validator in &attr.validators {
            if let Some(problem) = check_validator(validator, value) {
                diags.push(Diagnostic::error("Invalid Attribute Value", problem).at(path));
            }
        }
    }

    match (ty, value) {
        (AttrType::Object(nested), _) => check_object(nested, value, path, diags),
        (AttrType::List(elem), JsonValue::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                check_value(attr, elem, item, &format!("{}[{}]", path, i), false, diags);
            }
        }
        (AttrType::Map(elem), JsonValue::Object(entries)) => {
            for (key, item) in entries {
                check_value(attr, elem, item, &format!("{}[\"{}\"]", path, key), false, diags);
            }
        }
        _ => {}
    }
}

fn check_validator(validator: &Validator, value: &JsonValue) -> Option<String> {
    match validator {
        Validator::LengthAtLeast { min } => {
            let len = value.as_str()?.chars().count();
            (len < *min).then(|| format!("string length must be at least {}, got {}", min, len))
        }
        Validator::LengthAtMost { max } => {
            let len = value.as_str()?.chars().count();
            (len > *max).then(|| format!("string length must be at most {}, got {}", max, len))
        }
        Validator::RegexMatches { pattern, message } => {
            let s = value.as_str()?;
            let re = Regex::new(pattern).ok()?;
            (!re.is_match(s)).then(|| format!("value '{}' {}", s, message))
        }
        Validator::OneOf { values } => {
            let s = value.as_str()?;
            (!values.iter().any(|v| v == s))
                .then(|| format!("value must be one of {:?}, got '{}'", values, s))
        }
        Validator::AtLeast { min } => {
            let n = value.as_f64()?;
            (n < *min as f64).then(|| format!("value must be at least {}, got {}", min, value))
        }
        Validator::AtMost { max } => {
            let n = value.as_f64()?;
            (n > *max as f64).then(|| format!("value must be at most {}, got {}", max, value))
        }
        Validator::SizeAtMost { max } => {
            let len = match value {
                JsonValue::Array(items) => items.len(),
                JsonValue::Object(entries) => entries.len(),
                _ => return None,
            };
            (len > *max).then(|| format!("must contain at most {} elements, got {}", max, len))
        }
    }
}

/// Describe why `value` does not fit `ty`, if it doesn't
fn type_problem(ty: &AttrType, value: &JsonValue) -> Option<String> {
    let ok = match ty {
        AttrType::String => value.is_string(),
        AttrType::Int64 => value.is_i64() || value.is_u64(),
        AttrType::Float64 => value.is_number(),
        AttrType::Bool => value.is_boolean(),
        AttrType::Dynamic => true,
        AttrType::List(_) => value.is_array(),
        AttrType::Map(_) | AttrType::Object(_) => value.is_object(),
    };
    (!ok).then(|| format!("expected {}, got {}", ty.type_name(), json_type_name(value)))
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::new(
            "sample",
            vec![
                Attribute::string("id").computed(),
                Attribute::object(
                    "spec",
                    vec![
                        Attribute::string("name")
                            .required()
                            .validator(Validator::length_at_least(1))
                            .validator(Validator::length_at_most(10)),
                        Attribute::string("mode")
                            .optional()
                            .validator(Validator::one_of(&["a", "b"])),
                        Attribute::int64("port")
                            .optional()
                            .validator(Validator::at_least(1))
                            .validator(Validator::at_most(65535)),
                        Attribute::string_list("hosts")
                            .optional()
                            .validator(Validator::size_at_most(2)),
                        Attribute::string_map("labels").optional(),
                    ],
                )
                .required(),
            ],
        )
    }

    #[test]
    fn test_sample_schema_is_valid() {
        assert!(validate_implementation(&sample_schema()).is_empty());
    }

    #[test]
    fn test_missing_flags() {
        let schema = Schema::new("bad", vec![Attribute::string("name")]);
        let diags = validate_implementation(&schema);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("at least one of"));
    }

    #[test]
    fn test_required_and_computed_conflict() {
        let schema = Schema::new("bad", vec![Attribute::string("name").required().computed()]);
        let diags = validate_implementation(&schema);
        assert!(diags.iter().any(|d| d.detail.contains("cannot be combined")));
    }

    #[test]
    fn test_default_requires_computed() {
        let schema = Schema::new(
            "bad",
            vec![Attribute::bool("flag").optional().default_value(json!(false))],
        );
        let diags = validate_implementation(&schema);
        assert!(diags.iter().any(|d| d.detail.contains("must also be computed")));
    }

    #[test]
    fn test_default_type_mismatch() {
        let schema = Schema::new(
            "bad",
            vec![Attribute::bool("flag").optional().computed().default_value(json!("yes"))],
        );
        let diags = validate_implementation(&schema);
        assert_eq!(diags[0].summary, "Invalid Default Value");
    }

    #[test]
    fn test_invalid_regex_and_misplaced_validator() {
        let schema = Schema::new(
            "bad",
            vec![
                Attribute::string("name").optional().validator(Validator::regex("([a-z", "bad")),
                Attribute::bool("flag").optional().validator(Validator::at_least(1)),
            ],
        );
        let diags = validate_implementation(&schema);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].path.as_deref(), Some("name"));
        assert_eq!(diags[1].path.as_deref(), Some("flag"));
    }

    #[test]
    fn test_reserved_and_malformed_names() {
        let schema = Schema::new(
            "bad",
            vec![
                Attribute::string("count").optional(),
                Attribute::string("Name").optional(),
            ],
        );
        let diags = validate_implementation(&schema);
        assert!(diags.iter().any(|d| d.summary == "Reserved Root Attribute Name"));
        assert!(diags.iter().any(|d| d.summary == "Invalid Attribute Name"));
    }

    #[test]
    fn test_duplicate_names_in_nested_object() {
        let schema = Schema::new(
            "bad",
            vec![Attribute::object(
                "spec",
                vec![
                    Attribute::string("a").optional(),
                    Attribute::string("b").optional().json_name("a"),
                ],
            )
            .optional()],
        );
        let diags = validate_implementation(&schema);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Duplicate Field Name");
        assert_eq!(diags[0].path.as_deref(), Some("spec.b"));
    }

    #[test]
    fn test_inverted_bounds() {
        let schema = Schema::new(
            "bad",
            vec![Attribute::int64("n")
                .optional()
                .validator(Validator::at_least(10))
                .validator(Validator::at_most(1))],
        );
        let diags = validate_implementation(&schema);
        assert!(diags[0].detail.contains("inverted"));
    }

    #[test]
    fn test_valid_config() {
        let config = json!({
            "spec": {
                "name": "web",
                "mode": "a",
                "port": 8080,
                "hosts": ["x"],
                "labels": {"app": "web"}
            }
        });
        assert!(validate_config(&sample_schema(), &config).is_empty());
    }

    #[test]
    fn test_config_errors_carry_paths() {
        let config = json!({
            "id": "set-by-user",
            "spec": {
                "name": "",
                "mode": "c",
                "port": 70000,
                "hosts": ["x", "y", "z"],
                "labels": {"app": 1},
                "extra": true
            }
        });
        let diags = validate_config(&sample_schema(), &config);
        let paths: Vec<_> = diags.iter().filter_map(|d| d.path.as_deref()).collect();

        assert!(paths.contains(&"id"));
        assert!(paths.contains(&"spec.extra"));
        assert!(paths.contains(&"spec.name"));
        assert!(paths.contains(&"spec.mode"));
        assert!(paths.contains(&"spec.port"));
        assert!(paths.contains(&"spec.hosts"));
        assert!(paths.contains(&"spec.labels[\"app\"]"));
    }

    #[test]
    fn test_missing_required() {
        let diags = validate_config(&sample_schema(), &json!({}));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Missing Configuration for Required Attribute");
        assert_eq!(diags[0].path.as_deref(), Some("spec"));
    }

    #[test]
    fn test_wrong_type() {
        let diags = validate_config(&sample_schema(), &json!({"spec": {"name": "x", "port": "80"}}));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].detail, "expected int64, got string");
    }
}
