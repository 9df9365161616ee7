//! Plan computation from configuration and prior state
//!
//! Fills schema defaults into unset attributes, carries `UseStateForUnknown`
//! values over from prior state and reports which `RequiresReplace`
//! attributes changed.

use serde_json::{Map, Value as JsonValue};

use crate::schema::{AttrType, Attribute, PlanModifier, Schema};

/// Result of planning a change
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// Planned state
    pub planned: JsonValue,
    /// Attribute paths whose change forces replacement
    pub requires_replace: Vec<String>,
}

impl PlanOutcome {
    pub fn requires_replace(&self) -> bool {
        !self.requires_replace.is_empty()
    }
}

/// Plan `config` against `prior` state (absent on create)
pub fn plan(schema: &Schema, prior: Option<&JsonValue>, config: &JsonValue) -> PlanOutcome {
    let mut requires_replace = Vec::new();
    let planned = plan_object(&schema.attributes, prior, config, "", &mut requires_replace);
    PlanOutcome {
        planned,
        requires_replace,
    }
}

fn plan_object(
    attrs: &[Attribute],
    prior: Option<&JsonValue>,
    config: &JsonValue,
    prefix: &str,
    replace: &mut Vec<String>,
) -> JsonValue {
    let Some(config_obj) = config.as_object() else {
        return config.clone();
    };

    let mut out = Map::new();
    for attr in attrs {
        let path = if prefix.is_empty() {
            attr.name.clone()
        } else {
            format!("{}.{}", prefix, attr.name)
        };
        let prior_value = prior.and_then(|p| p.get(&attr.name)).filter(|v| !v.is_null());
        let configured = config_obj.get(&attr.name).cloned().unwrap_or(JsonValue::Null);

        let value = if configured.is_null() {
            if let Some(default) = &attr.default {
                default.clone()
            } else if attr.computed && attr.has_modifier(PlanModifier::UseStateForUnknown) {
                prior_value.cloned().unwrap_or(JsonValue::Null)
            } else {
                JsonValue::Null
            }
        } else if let AttrType::Object(nested) = &attr.ty {
            plan_object(nested, prior_value, &configured, &path, replace)
        } else {
            configured
        };

        if prior.is_some() && attr.has_modifier(PlanModifier::RequiresReplace) {
            let before = prior_value.unwrap_or(&JsonValue::Null);
            if before != &value {
                replace.push(path);
            }
        }

        out.insert(attr.name.clone(), value);
    }
    JsonValue::Object(out)
}
