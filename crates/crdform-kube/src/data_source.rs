//! Read-only data source: GET and decode a live object

use crdform_core::{CrdDefinition, Schema};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

use crate::config::ProviderData;
use crate::error::{ProviderError, Result};
use crate::resource::{check_config, compose_state, object_key, unmarshal};

/// Data source for one custom resource kind
#[derive(Debug, Clone)]
pub struct DataSourceReader {
    crd: CrdDefinition,
    schema: Schema,
    data: Option<Arc<ProviderData>>,
}

impl DataSourceReader {
    pub fn new(crd: CrdDefinition) -> Self {
        Self {
            schema: crd.data_source_schema(),
            crd,
            data: None,
        }
    }

    pub fn configure(&mut self, data: Arc<ProviderData>) {
        self.data = Some(data);
    }

    pub fn type_name(&self) -> String {
        self.crd.type_name()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Look up the object named by `config.metadata`
    pub async fn read(&self, config: &JsonValue) -> Result<JsonValue> {
        let client = self
            .data
            .as_deref()
            .ok_or(ProviderError::Unconfigured)?
            .client()?;
        check_config(&self.schema, config)?;

        let key = object_key(&self.crd, config)?;
        debug!(kind = self.crd.kind, %key, "reading data source");
        let object = client.get(&self.crd, &key).await.map_err(|source| ProviderError::Get {
            kind: self.crd.kind.to_string(),
            key: key.id(),
            source,
        })?;
        let decoded = self
            .crd
            .decode_object(&self.schema, &object)
            .map_err(|e| unmarshal(&self.crd, e))?;
        Ok(compose_state(&self.schema, config, decoded, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::mock::MockDynamicClient;
    use crdform_core::{ObjectKey, crds};
    use serde_json::json;

    fn reader(client: &MockDynamicClient) -> DataSourceReader {
        let mut reader = DataSourceReader::new(crds::CLUSTER);
        reader.configure(Arc::new(ProviderData::with_client(
            &ProviderConfig::default(),
            Arc::new(client.clone()),
        )));
        reader
    }

    #[tokio::test]
    async fn test_read_decodes_live_object() {
        let client = MockDynamicClient::new();
        client.insert(
            &crds::CLUSTER,
            &ObjectKey::new("infra", "prod"),
            json!({
                "apiVersion": "services.k8s.aws/v1alpha1",
                "kind": "Cluster",
                "metadata": {"name": "prod", "namespace": "infra", "labels": {"env": "prod"}, "uid": "abc"},
                "spec": {
                    "name": "prod",
                    "roleARN": "arn:aws:iam::123456789012:role/eks",
                    "resourcesVPCConfig": {"subnetIDs": ["subnet-1", "subnet-2"]},
                    "unknownField": true
                },
                "status": {"status": "ACTIVE"}
            }),
        );

        let state = reader(&client)
            .read(&json!({"metadata": {"name": "prod", "namespace": "infra"}}))
            .await
            .unwrap();
        assert_eq!(state["id"], "infra/prod");
        assert_eq!(state["metadata"]["labels"]["env"], "prod");
        assert_eq!(state["spec"]["role_arn"], "arn:aws:iam::123456789012:role/eks");
        assert_eq!(
            state["spec"]["resources_vpc_config"]["subnet_ids"],
            json!(["subnet-1", "subnet-2"])
        );
        assert!(state["spec"].get("unknownField").is_none());
        assert!(state["spec"]["version"].is_null());
    }

    #[tokio::test]
    async fn test_spec_is_read_only() {
        let client = MockDynamicClient::new();
        let err = reader(&client)
            .read(&json!({
                "metadata": {"name": "prod", "namespace": "infra"},
                "spec": {"name": "prod"}
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig { .. }));
        assert_eq!(client.operation_counts().gets, 0);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let client = MockDynamicClient::new();
        let err = reader(&client)
            .read(&json!({"metadata": {"name": "gone", "namespace": "infra"}}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_offline() {
        let mut reader = DataSourceReader::new(crds::CLUSTER);
        reader.configure(Arc::new(ProviderData::offline(&ProviderConfig::offline())));
        let err = reader
            .read(&json!({"metadata": {"name": "prod", "namespace": "infra"}}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::OfflineMode));
    }
}
