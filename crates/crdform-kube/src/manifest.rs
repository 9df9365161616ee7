//! Manifest data source: render an object to YAML without a cluster

use crdform_core::{CrdDefinition, Schema, plan};
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::resource::{check_config, marshal, object_key};

/// Manifest renderer for one custom resource kind
///
/// Never touches the cluster, so it works in offline mode and before the
/// provider is configured.
#[derive(Debug, Clone)]
pub struct ManifestRenderer {
    crd: CrdDefinition,
    schema: Schema,
}

impl ManifestRenderer {
    pub fn new(crd: CrdDefinition) -> Self {
        Self {
            schema: crd.manifest_schema(),
            crd,
        }
    }

    pub fn type_name(&self) -> String {
        self.crd.manifest_type_name()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validated and planned state for `config`
    fn planned(&self, config: &JsonValue) -> Result<JsonValue> {
        check_config(&self.schema, config)?;
        Ok(plan(&self.schema, None, config).planned)
    }

    fn build(&self, planned: &JsonValue) -> Result<JsonValue> {
        self.crd
            .build_object(&self.schema, planned)
            .map_err(|e| marshal(&self.crd, e))
    }

    /// The Kubernetes object described by `config`
    pub fn object(&self, config: &JsonValue) -> Result<JsonValue> {
        let planned = self.planned(config)?;
        self.build(&planned)
    }

    /// State for `config`: the configuration plus `id` and `yaml`
    pub fn render(&self, config: &JsonValue) -> Result<JsonValue> {
        let planned = self.planned(config)?;
        let object = self.build(&planned)?;
        let key = object_key(&self.crd, &planned)?;
        let yaml = serde_yaml::to_string(&object)?;

        let mut state = match planned {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        state.insert("id".into(), JsonValue::String(key.id()));
        state.insert("yaml".into(), JsonValue::String(yaml));
        Ok(JsonValue::Object(state))
    }
}
