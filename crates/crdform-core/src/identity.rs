//! Object identity and the opaque `id` attribute
//!
//! Every exposed kind is namespaced, so an object is identified by
//! `(namespace, name)`. The `id` attribute and import identifiers both use
//! the form `<namespace>/<name>`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Namespace and name of a Kubernetes object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse an import identifier of the form `<namespace>/<name>`
    ///
    /// Anything other than exactly two non-empty segments is rejected.
    pub fn parse_import_id(id: &str) -> Result<Self> {
        let mut parts = id.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(name), None) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(namespace, name))
            }
            _ => Err(CoreError::InvalidImportId { id: id.to_string() }),
        }
    }

    /// Compose the `id` attribute value
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// Read namespace and name out of a decoded `metadata` state object
    pub fn from_metadata(metadata: &serde_json::Value) -> Result<Self> {
        let field = |name: &str| {
            metadata
                .get(name)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| CoreError::MissingField {
                    field: format!("metadata.{}", name),
                })
        };
        Ok(Self {
            namespace: field("namespace")?,
            name: field("name")?,
        })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_import_id() {
        let key = ObjectKey::parse_import_id("ns/name").unwrap();
        assert_eq!(key.namespace, "ns");
        assert_eq!(key.name, "name");
    }

    #[test]
    fn test_parse_import_id_rejects_malformed() {
        for id in ["", "name", "/name", "ns/", "/", "a/b/c", "ns//name"] {
            assert!(
                matches!(
                    ObjectKey::parse_import_id(id),
                    Err(CoreError::InvalidImportId { .. })
                ),
                "expected '{}' to be rejected",
                id
            );
        }
    }

    #[test]
    fn test_id_is_namespace_then_name() {
        let key = ObjectKey::new("kube-system", "vpc-cni");
        assert_eq!(key.id(), "kube-system/vpc-cni");
        assert_eq!(ObjectKey::parse_import_id(&key.id()).unwrap(), key);
    }

    #[test]
    fn test_from_metadata() {
        let key = ObjectKey::from_metadata(&json!({"name": "web", "namespace": "default"})).unwrap();
        assert_eq!(key, ObjectKey::new("default", "web"));

        let err = ObjectKey::from_metadata(&json!({"name": "web", "namespace": null})).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: metadata.namespace");
    }
}
