//! Schema-driven translation between state and Kubernetes objects
//!
//! State uses the snake_case attribute names from the schema; Kubernetes
//! objects use each attribute's `json_name`. Encoding drops null values so
//! the applied object only carries fields the user actually set. Decoding
//! fills every declared attribute, with `null` for absent fields, and drops
//! fields the schema does not know about.

use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};
use crate::schema::{AttrType, Attribute};

/// Encode a state object into its Kubernetes representation
pub fn encode(attrs: &[Attribute], state: &JsonValue) -> Result<JsonValue> {
    encode_object(attrs, state, "")
}

/// Decode a Kubernetes object into state shape
pub fn decode(attrs: &[Attribute], object: &JsonValue) -> Result<JsonValue> {
    decode_object(attrs, object, "")
}

fn encode_object(attrs: &[Attribute], state: &JsonValue, path: &str) -> Result<JsonValue> {
    let obj = match state {
        JsonValue::Null => return Ok(JsonValue::Null),
        JsonValue::Object(obj) => obj,
        _ => return Err(mismatch(path, "object")),
    };

    let mut out = Map::new();
    for attr in attrs {
        let Some(value) = obj.get(&attr.name) else {
            continue;
        };
        let child = child_path(path, &attr.name);
        let encoded = encode_value(&attr.ty, value, &child)?;
        if !encoded.is_null() {
            out.insert(attr.json_name.clone(), encoded);
        }
    }
    Ok(JsonValue::Object(out))
}

fn encode_value(ty: &AttrType, value: &JsonValue, path: &str) -> Result<JsonValue> {
    if value.is_null() {
        return Ok(JsonValue::Null);
    }
    match ty {
        AttrType::Object(attrs) => encode_object(attrs, value, path),
        AttrType::List(elem) => {
            let items = value.as_array().ok_or_else(|| mismatch(path, "list"))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| encode_value(elem, item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()
                .map(JsonValue::Array)
        }
        AttrType::Map(elem) => {
            let entries = value.as_object().ok_or_else(|| mismatch(path, "map"))?;
            let mut out = Map::new();
            for (key, item) in entries {
                out.insert(key.clone(), encode_value(elem, item, &format!("{}[\"{}\"]", path, key))?);
            }
            Ok(JsonValue::Object(out))
        }
        _ => Ok(value.clone()),
    }
}

fn decode_object(attrs: &[Attribute], object: &JsonValue, path: &str) -> Result<JsonValue> {
    let obj = match object {
        JsonValue::Null => return Ok(JsonValue::Null),
        JsonValue::Object(obj) => obj,
        _ => return Err(mismatch(path, "object")),
    };

    let mut out = Map::new();
    for attr in attrs {
        let child = child_path(path, &attr.json_name);
        let decoded = match obj.get(&attr.json_name) {
            Some(value) => decode_value(&attr.ty, value, &child)?,
            None => JsonValue::Null,
        };
        out.insert(attr.name.clone(), decoded);
    }
    Ok(JsonValue::Object(out))
}

fn decode_value(ty: &AttrType, value: &JsonValue, path: &str) -> Result<JsonValue> {
    if value.is_null() {
        return Ok(JsonValue::Null);
    }
    match ty {
        AttrType::Object(attrs) => decode_object(attrs, value, path),
        AttrType::List(elem) => {
            let items = value.as_array().ok_or_else(|| mismatch(path, "list"))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_value(elem, item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()
                .map(JsonValue::Array)
        }
        AttrType::Map(elem) => {
            let entries = value.as_object().ok_or_else(|| mismatch(path, "map"))?;
            let mut out = Map::new();
            for (key, item) in entries {
                out.insert(key.clone(), decode_value(elem, item, &format!("{}[\"{}\"]", path, key))?);
            }
            Ok(JsonValue::Object(out))
        }
        _ => Ok(value.clone()),
    }
}

fn child_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn mismatch(path: &str, expected: &'static str) -> CoreError {
    CoreError::ShapeMismatch {
        path: if path.is_empty() {
            "(root)".to_string()
        } else {
            path.to_string()
        },
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::string("cluster_name").optional(),
            Attribute::string_list("public_access_cidrs")
                .optional()
                .json_name("publicAccessCIDRs"),
            Attribute::object(
                "scaling_config",
                vec![
                    Attribute::int64("min_size").optional(),
                    Attribute::int64("max_size").optional(),
                ],
            )
            .optional(),
            Attribute::object_list(
                "taints",
                vec![
                    Attribute::string("key").optional(),
                    Attribute::string("effect").optional(),
                ],
            )
            .optional(),
            Attribute::string_map("tags").optional(),
            Attribute::dynamic("extra").optional(),
        ]
    }

    #[test]
    fn test_encode_renames_and_drops_nulls() {
        let state = json!({
            "cluster_name": "prod",
            "public_access_cidrs": ["10.0.0.0/8"],
            "scaling_config": {"min_size": 1, "max_size": null},
            "taints": [{"key": "dedicated", "effect": "NO_SCHEDULE"}],
            "tags": {"team_name": "infra"},
            "extra": {"any_key": [1, 2]}
        });

        let encoded = encode(&attrs(), &state).unwrap();
        assert_eq!(
            encoded,
            json!({
                "clusterName": "prod",
                "publicAccessCIDRs": ["10.0.0.0/8"],
                "scalingConfig": {"minSize": 1},
                "taints": [{"key": "dedicated", "effect": "NO_SCHEDULE"}],
                "tags": {"team_name": "infra"},
                "extra": {"any_key": [1, 2]}
            })
        );
    }

    #[test]
    fn test_decode_fills_absent_and_drops_unknown() {
        let object = json!({
            "clusterName": "prod",
            "scalingConfig": {"maxSize": 3},
            "unknownField": "ignored"
        });

        let decoded = decode(&attrs(), &object).unwrap();
        assert_eq!(
            decoded,
            json!({
                "cluster_name": "prod",
                "public_access_cidrs": null,
                "scaling_config": {"min_size": null, "max_size": 3},
                "taints": null,
                "tags": null,
                "extra": null
            })
        );
    }

    #[test]
    fn test_decode_of_encode_is_identity_for_full_state() {
        let state = json!({
            "cluster_name": "prod",
            "public_access_cidrs": ["0.0.0.0/0"],
            "scaling_config": {"min_size": 1, "max_size": 5},
            "taints": [{"key": "k", "effect": null}],
            "tags": {"a": "b"},
            "extra": null
        });
        let roundtrip = decode(&attrs(), &encode(&attrs(), &state).unwrap()).unwrap();
        assert_eq!(roundtrip, state);
    }

    #[test]
    fn test_shape_mismatch_reports_path() {
        let err = decode(&attrs(), &json!({"scalingConfig": ["not", "an", "object"]})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Value at 'scalingConfig' has the wrong shape: expected object"
        );

        let err = encode(&attrs(), &json!({"taints": [{"key": "a"}, "x"]})).unwrap_err();
        assert!(err.to_string().contains("taints[1]"));
    }
}
