//! `wait_for` conditions evaluated against a live object
//!
//! A condition maps a field path (`status.phase`,
//! `status.conditions[0].status`) to a regular expression the field's value
//! must match. Paths address the Kubernetes object, so they use the
//! camelCase field names.

use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// Parsed `wait_for` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitFor {
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

impl WaitFor {
    /// Read the `wait_for` attribute out of a resource state object
    ///
    /// Returns `None` when no condition is configured.
    pub fn from_state(state: &JsonValue) -> Option<Self> {
        let fields = state.get("wait_for")?.get("fields")?.as_object()?;
        let fields: BTreeMap<String, String> = fields
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect();
        if fields.is_empty() {
            None
        } else {
            Some(Self { fields })
        }
    }

    /// Check every path and pattern without looking at an object
    pub fn check(&self) -> Result<()> {
        for (path, pattern) in &self.fields {
            parse_path(path)?;
            compile(pattern)?;
        }
        Ok(())
    }

    /// Paths whose value does not (yet) match
    pub fn pending(&self, object: &JsonValue) -> Result<Vec<String>> {
        let mut pending = Vec::new();
        for (path, pattern) in &self.fields {
            let re = compile(pattern)?;
            let matched = lookup(object, path)?
                .and_then(scalar_text)
                .map(|text| re.is_match(&text))
                .unwrap_or(false);
            if !matched {
                pending.push(path.clone());
            }
        }
        Ok(pending)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| CoreError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lookup<'a>(object: &'a JsonValue, path: &str) -> Result<Option<&'a JsonValue>> {
    let mut current = object;
    for segment in parse_path(path)? {
        let next = match segment {
            Segment::Field(name) => current.get(name.as_str()),
            Segment::Index(i) => current.get(i),
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn parse_path(path: &str) -> Result<Vec<Segment>> {
    let invalid = |message: &str| CoreError::InvalidWaitPath {
        path: path.to_string(),
        message: message.to_string(),
    };

    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut rest) = match part.find('[') {
            Some(pos) => part.split_at(pos),
            None => (part, ""),
        };
        if name.is_empty() {
            return Err(invalid("empty field name"));
        }
        segments.push(Segment::Field(name.to_string()));

        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
            let index = rest[1..close]
                .parse::<usize>()
                .map_err(|_| invalid("list index must be a non-negative integer"))?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(invalid("unexpected characters after ']'"));
            }
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wait_for(pairs: &[(&str, &str)]) -> WaitFor {
        WaitFor {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_from_state() {
        let state = json!({"wait_for": {"fields": {"status.status": "ACTIVE"}}});
        let wf = WaitFor::from_state(&state).unwrap();
        assert_eq!(wf.fields.get("status.status").unwrap(), "ACTIVE");

        assert!(WaitFor::from_state(&json!({"wait_for": null})).is_none());
        assert!(WaitFor::from_state(&json!({"wait_for": {"fields": {}}})).is_none());
    }

    #[test]
    fn test_pending() {
        let object = json!({
            "status": {
                "status": "CREATING",
                "conditions": [{"type": "ACK.ResourceSynced", "status": "True"}],
                "replicas": 3
            }
        });

        let wf = wait_for(&[
            ("status.conditions[0].status", "^True$"),
            ("status.replicas", "^3$"),
            ("status.status", "^ACTIVE$"),
            ("status.missing", ".*"),
        ]);
        assert_eq!(
            wf.pending(&object).unwrap(),
            vec!["status.missing".to_string(), "status.status".to_string()]
        );
    }

    #[test]
    fn test_invalid_paths() {
        for path in ["", "status..phase", "status[", "status[x]", "status[0]x"] {
            assert!(parse_path(path).is_err(), "expected '{}' to be rejected", path);
        }
        assert_eq!(
            parse_path("a[1][2].b").unwrap(),
            vec![
                Segment::Field("a".into()),
                Segment::Index(1),
                Segment::Index(2),
                Segment::Field("b".into()),
            ]
        );
    }

    #[test]
    fn test_check_rejects_bad_regex() {
        let wf = wait_for(&[("status.phase", "([")]);
        assert!(matches!(wf.check(), Err(CoreError::InvalidRegex { .. })));
    }
}
