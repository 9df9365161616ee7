//! Server-side-apply resource lifecycle
//!
//! Create and Update build the object from the planned state, PATCH it with
//! an apply patch and decode the returned object back into state. Read
//! decodes a GET, Delete issues a DELETE. Nothing is retried: the first error
//! is returned to the caller.

use crdform_core::{
    CoreError, CrdDefinition, Diagnostic, ObjectKey, PlanOutcome, Schema, WaitFor, has_errors, plan,
    validate_config,
};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::client::DynamicClient;
use crate::config::ProviderData;
use crate::error::{ProviderError, Result};

/// Validate `config` against `schema`, failing on any error diagnostic
pub(crate) fn check_config(schema: &Schema, config: &JsonValue) -> Result<()> {
    let diagnostics = validate_config(schema, config);
    if has_errors(&diagnostics) {
        return Err(ProviderError::InvalidConfig { diagnostics });
    }
    Ok(())
}

/// Read the object key from the `metadata` of a state or config
pub(crate) fn object_key(crd: &CrdDefinition, state: &JsonValue) -> Result<ObjectKey> {
    ObjectKey::from_metadata(&state["metadata"]).map_err(|e| match e {
        CoreError::MissingField { field } => ProviderError::InvalidConfig {
            diagnostics: vec![
                Diagnostic::error(
                    "Missing object identity",
                    format!("{} is required to address a {} object", field, crd.kind),
                )
                .at(field),
            ],
        },
        other => marshal(crd, other),
    })
}

pub(crate) fn marshal(crd: &CrdDefinition, err: CoreError) -> ProviderError {
    ProviderError::Marshal {
        kind: crd.kind.to_string(),
        message: err.to_string(),
    }
}

pub(crate) fn unmarshal(crd: &CrdDefinition, err: CoreError) -> ProviderError {
    ProviderError::Unmarshal {
        kind: crd.kind.to_string(),
        message: err.to_string(),
    }
}

/// Overlay `prior` onto an all-null state for `schema`, then the decoded
/// object sections, then the id
pub(crate) fn compose_state(
    schema: &Schema,
    prior: &JsonValue,
    decoded: Map<String, JsonValue>,
    key: &ObjectKey,
) -> JsonValue {
    let mut state = Map::new();
    for attr in &schema.attributes {
        let value = prior.get(&attr.name).cloned().unwrap_or(JsonValue::Null);
        state.insert(attr.name.clone(), value);
    }
    state.extend(decoded);
    state.insert("id".into(), JsonValue::String(key.id()));
    JsonValue::Object(state)
}

/// Lifecycle adapter for one custom resource kind
#[derive(Debug, Clone)]
pub struct ResourceAdapter {
    crd: CrdDefinition,
    schema: Schema,
    data: Option<Arc<ProviderData>>,
}

impl ResourceAdapter {
    pub fn new(crd: CrdDefinition) -> Self {
        Self {
            schema: crd.resource_schema(),
            crd,
            data: None,
        }
    }

    /// Hand the adapter the provider's configuration
    pub fn configure(&mut self, data: Arc<ProviderData>) {
        self.data = Some(data);
    }

    pub fn type_name(&self) -> String {
        self.crd.type_name()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn data(&self) -> Result<&ProviderData> {
        self.data.as_deref().ok_or(ProviderError::Unconfigured)
    }

    /// Validate a configuration, including the `wait_for` expressions
    pub fn validate(&self, config: &JsonValue) -> Result<()> {
        check_config(&self.schema, config)?;
        if let Some(wait) = WaitFor::from_state(config) {
            wait.check().map_err(|e| ProviderError::InvalidConfig {
                diagnostics: vec![Diagnostic::error("Invalid wait_for", e.to_string()).at("wait_for.fields")],
            })?;
        }
        Ok(())
    }

    /// Plan `config` against the prior state (absent on create)
    pub fn plan(&self, prior: Option<&JsonValue>, config: &JsonValue) -> Result<PlanOutcome> {
        self.validate(config)?;
        Ok(plan(&self.schema, prior, config))
    }

    /// Create the object with a server-side apply
    pub async fn create(&self, config: &JsonValue) -> Result<JsonValue> {
        let outcome = self.plan(None, config)?;
        self.apply(outcome.planned).await
    }

    /// Refresh state from the live object
    pub async fn read(&self, state: &JsonValue) -> Result<JsonValue> {
        let client = self.data()?.client()?;
        let key = object_key(&self.crd, state)?;
        let object = client.get(&self.crd, &key).await.map_err(|source| ProviderError::Get {
            kind: self.crd.kind.to_string(),
            key: key.id(),
            source,
        })?;
        let decoded = self
            .crd
            .decode_object(&self.schema, &object)
            .map_err(|e| unmarshal(&self.crd, e))?;
        Ok(compose_state(&self.schema, state, decoded, &key))
    }

    /// Apply `config` over the existing object
    ///
    /// Changes to attributes that force replacement are refused; the caller
    /// must delete and create instead.
    pub async fn update(&self, prior: &JsonValue, config: &JsonValue) -> Result<JsonValue> {
        let outcome = self.plan(Some(prior), config)?;
        if outcome.requires_replace() {
            return Err(ProviderError::RequiresReplace {
                paths: outcome.requires_replace,
            });
        }
        self.apply(outcome.planned).await
    }

    /// Delete the object
    pub async fn delete(&self, state: &JsonValue) -> Result<()> {
        let client = self.data()?.client()?;
        let key = object_key(&self.crd, state)?;
        client.delete(&self.crd, &key).await.map_err(|source| ProviderError::Delete {
            kind: self.crd.kind.to_string(),
            key: key.id(),
            source,
        })?;
        info!(kind = self.crd.kind, %key, "deleted");
        Ok(())
    }

    /// State for an import identifier `<namespace>/<name>`, to be completed
    /// by a [`read`](Self::read)
    pub fn import_state(&self, id: &str) -> Result<JsonValue> {
        let key = ObjectKey::parse_import_id(id).map_err(ProviderError::InvalidImportId)?;
        Ok(self.crd.import_state(&key))
    }

    async fn apply(&self, planned: JsonValue) -> Result<JsonValue> {
        let data = self.data()?;
        let client = data.client()?;
        let key = object_key(&self.crd, &planned)?;
        let object = self
            .crd
            .build_object(&self.schema, &planned)
            .map_err(|e| marshal(&self.crd, e))?;
        let options = data.apply_options(
            planned["field_manager"].as_str(),
            planned["force_conflicts"].as_bool(),
        );

        let applied = client
            .apply(&self.crd, &key, &object, &options)
            .await
            .map_err(|source| ProviderError::Patch {
                kind: self.crd.kind.to_string(),
                key: key.id(),
                source,
            })?;
        let decoded = self
            .crd
            .decode_object(&self.schema, &applied)
            .map_err(|e| unmarshal(&self.crd, e))?;
        let state = compose_state(&self.schema, &planned, decoded, &key);

        if let Some(wait) = WaitFor::from_state(&planned) {
            self.wait_for(client, data, &key, &wait, applied).await?;
        }

        info!(kind = self.crd.kind, %key, field_manager = %options.field_manager, "applied");
        Ok(state)
    }

    /// Poll until every `wait_for` condition matches or the timeout passes
    async fn wait_for(
        &self,
        client: &dyn DynamicClient,
        data: &ProviderData,
        key: &ObjectKey,
        wait: &WaitFor,
        mut object: JsonValue,
    ) -> Result<()> {
        // A timeout too large to represent never expires
        let deadline = Instant::now().checked_add(data.wait_timeout);
        loop {
            let pending = wait.pending(&object).map_err(|e| ProviderError::InvalidConfig {
                diagnostics: vec![Diagnostic::error("Invalid wait_for", e.to_string()).at("wait_for.fields")],
            })?;
            if pending.is_empty() {
                return Ok(());
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(ProviderError::WaitTimeout {
                    kind: self.crd.kind.to_string(),
                    key: key.id(),
                    pending,
                    timeout: data.wait_timeout,
                });
            }
            debug!(kind = self.crd.kind, %key, ?pending, "waiting for fields");
            sleep(data.wait_poll_interval).await;
            object = client.get(&self.crd, key).await.map_err(|source| ProviderError::Get {
                kind: self.crd.kind.to_string(),
                key: key.id(),
                source,
            })?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApplyOptions;
    use crate::config::ProviderConfig;
    use crate::mock::{MockDynamicClient, OperationCounts};
    use crdform_core::crds;
    use serde_json::json;

    fn adapter(client: &MockDynamicClient, config: ProviderConfig) -> ResourceAdapter {
        let mut adapter = ResourceAdapter::new(crds::HTTP_PROXY);
        adapter.configure(Arc::new(ProviderData::with_client(&config, Arc::new(client.clone()))));
        adapter
    }

    fn proxy_config() -> JsonValue {
        json!({
            "metadata": {"name": "web", "namespace": "default", "labels": {"app": "web"}},
            "spec": {
                "virtualhost": {"fqdn": "web.example.com"},
                "routes": [{"services": [{"name": "web", "port": 8080}]}]
            }
        })
    }

    #[tokio::test]
    async fn test_create() {
        let client = MockDynamicClient::new();
        let adapter = adapter(&client, ProviderConfig::default());

        let state = adapter.create(&proxy_config()).await.unwrap();
        assert_eq!(state["id"], "default/web");
        assert_eq!(state["metadata"]["labels"]["app"], "web");
        assert_eq!(state["spec"]["virtualhost"]["fqdn"], "web.example.com");
        assert_eq!(state["spec"]["routes"][0]["services"][0]["port"], 8080);
        assert!(state["spec"]["tcpproxy"].is_null());

        let stored = client.object(&crds::HTTP_PROXY, &ObjectKey::new("default", "web")).unwrap();
        assert_eq!(stored["apiVersion"], "projectcontour.io/v1");
        assert_eq!(stored["kind"], "HTTPProxy");
        assert_eq!(stored["spec"]["virtualhost"], json!({"fqdn": "web.example.com"}));

        assert_eq!(
            client.applied_options(),
            vec![ApplyOptions {
                field_manager: "crdform".into(),
                force_conflicts: false
            }]
        );
    }

    #[tokio::test]
    async fn test_resource_overrides_provider_defaults() {
        let client = MockDynamicClient::new();
        let provider = ProviderConfig {
            field_manager: "platform".into(),
            force_conflicts: true,
            ..ProviderConfig::default()
        };
        let adapter = adapter(&client, provider);

        let mut config = proxy_config();
        config["field_manager"] = json!("ci");
        adapter.create(&config).await.unwrap();

        let mut config = proxy_config();
        config["force_conflicts"] = json!(false);
        adapter.create(&config).await.unwrap();

        assert_eq!(
            client.applied_options(),
            vec![
                ApplyOptions {
                    field_manager: "ci".into(),
                    force_conflicts: true
                },
                ApplyOptions {
                    field_manager: "platform".into(),
                    force_conflicts: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_config_never_reaches_client() {
        let client = MockDynamicClient::new();
        let adapter = adapter(&client, ProviderConfig::default());

        let mut config = proxy_config();
        config["spec"]["routes"][0]["services"][0]["port"] = json!(70000);
        let err = adapter.create(&config).await.unwrap_err();
        let diagnostics = match err {
            ProviderError::InvalidConfig { diagnostics } => diagnostics,
            other => panic!("expected invalid config, got {:?}", other),
        };
        assert_eq!(diagnostics[0].path.as_deref(), Some("spec.routes[0].services[0].port"));
        assert_eq!(client.operation_counts(), OperationCounts::default());
    }

    #[tokio::test]
    async fn test_read_after_import() {
        let client = MockDynamicClient::new();
        let adapter = adapter(&client, ProviderConfig::default());
        adapter.create(&proxy_config()).await.unwrap();

        let imported = adapter.import_state("default/web").unwrap();
        let state = adapter.read(&imported).await.unwrap();
        assert_eq!(state["id"], "default/web");
        assert_eq!(state["spec"]["virtualhost"]["fqdn"], "web.example.com");
        assert!(state["field_manager"].is_null());
        assert!(state["wait_for"].is_null());
    }

    #[tokio::test]
    async fn test_read_missing_object() {
        let client = MockDynamicClient::new();
        let adapter = adapter(&client, ProviderConfig::default());
        let err = adapter.read(&proxy_config()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_diagnostic().summary, "Unable to GET resource");
    }

    #[tokio::test]
    async fn test_read_and_delete_need_metadata() {
        let client = MockDynamicClient::new();
        let adapter = adapter(&client, ProviderConfig::default());
        let state = json!({"id": "default/web", "metadata": {"name": "web"}});

        for err in [
            adapter.read(&state).await.unwrap_err(),
            adapter.delete(&state).await.unwrap_err(),
        ] {
            let ProviderError::InvalidConfig { diagnostics } = err else {
                panic!("expected InvalidConfig");
            };
            assert_eq!(diagnostics[0].path.as_deref(), Some("metadata.namespace"));
        }
        assert_eq!(client.operation_counts(), OperationCounts::default());
    }

    #[test]
    fn test_import_rejects_malformed_id() {
        let adapter = ResourceAdapter::new(crds::HTTP_PROXY);
        for id in ["web", "default/web/extra", "/web"] {
            assert!(matches!(adapter.import_state(id), Err(ProviderError::InvalidImportId(_))));
        }
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_refuses_rename() {
        let client = MockDynamicClient::new();
        let adapter = adapter(&client, ProviderConfig::default());
        let state = adapter.create(&proxy_config()).await.unwrap();

        let mut config = proxy_config();
        config["spec"]["virtualhost"]["fqdn"] = json!("www.example.com");
        let updated = adapter.update(&state, &config).await.unwrap();
        assert_eq!(updated["id"], "default/web");
        assert_eq!(updated["spec"]["virtualhost"]["fqdn"], "www.example.com");

        config["metadata"]["name"] = json!("web2");
        let err = adapter.update(&updated, &config).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RequiresReplace { ref paths } if paths == &vec!["metadata.name".to_string()]
        ));
        assert_eq!(client.operation_counts().applies, 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let client = MockDynamicClient::new();
        let adapter = adapter(&client, ProviderConfig::default());
        let state = adapter.create(&proxy_config()).await.unwrap();

        adapter.delete(&state).await.unwrap();
        assert!(client.object(&crds::HTTP_PROXY, &ObjectKey::new("default", "web")).is_none());

        let err = adapter.delete(&state).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_offline_mode_errors_before_client_call() {
        let mut adapter = ResourceAdapter::new(crds::HTTP_PROXY);
        adapter.configure(Arc::new(ProviderData::offline(&ProviderConfig::offline())));

        assert!(matches!(
            adapter.create(&proxy_config()).await,
            Err(ProviderError::OfflineMode)
        ));
        assert!(matches!(
            adapter.read(&proxy_config()).await,
            Err(ProviderError::OfflineMode)
        ));
        assert!(matches!(
            adapter.delete(&proxy_config()).await,
            Err(ProviderError::OfflineMode)
        ));
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let adapter = ResourceAdapter::new(crds::HTTP_PROXY);
        assert!(matches!(
            adapter.create(&proxy_config()).await,
            Err(ProviderError::Unconfigured)
        ));
    }

    #[tokio::test]
    async fn test_wait_for_matches_status() {
        let client = MockDynamicClient::new().with_status(json!({"currentStatus": "valid"}));
        let adapter = adapter(&client, ProviderConfig::default());

        let mut config = proxy_config();
        config["wait_for"] = json!({"fields": {"status.currentStatus": "^valid$"}});
        let state = adapter.create(&config).await.unwrap();
        assert_eq!(state["wait_for"]["fields"]["status.currentStatus"], "^valid$");
        assert_eq!(client.operation_counts().gets, 0);
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        let client = MockDynamicClient::new().with_status(json!({"currentStatus": "invalid"}));
        let provider = ProviderConfig {
            wait_timeout_secs: 0,
            wait_poll_interval_ms: 10,
            ..ProviderConfig::default()
        };
        let adapter = adapter(&client, provider);

        let mut config = proxy_config();
        config["wait_for"] = json!({"fields": {"status.currentStatus": "^valid$"}});
        let err = adapter.create(&config).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::WaitTimeout { ref pending, .. } if pending == &vec!["status.currentStatus".to_string()]
        ));
    }

    #[tokio::test]
    async fn test_wait_for_huge_timeout_keeps_polling() {
        let client = MockDynamicClient::new().with_status(json!({"currentStatus": "pending"}));
        let provider = ProviderConfig {
            wait_timeout_secs: u64::MAX,
            wait_poll_interval_ms: 10,
            ..ProviderConfig::default()
        };
        let adapter = adapter(&client, provider);

        let writer = client.clone();
        tokio::spawn(async move {
            let key = ObjectKey::new("default", "web");
            loop {
                sleep(std::time::Duration::from_millis(20)).await;
                if let Some(mut object) = writer.object(&crds::HTTP_PROXY, &key) {
                    object["status"] = json!({"currentStatus": "valid"});
                    writer.insert(&crds::HTTP_PROXY, &key, object);
                    break;
                }
            }
        });

        let mut config = proxy_config();
        config["wait_for"] = json!({"fields": {"status.currentStatus": "^valid$"}});
        let state = adapter.create(&config).await.unwrap();
        assert_eq!(state["id"], "default/web");
        assert!(client.operation_counts().gets >= 1);
    }

    #[test]
    fn test_wait_for_bad_regex_rejected() {
        let adapter = ResourceAdapter::new(crds::HTTP_PROXY);
        let mut config = proxy_config();
        config["wait_for"] = json!({"fields": {"status.currentStatus": "(unclosed"}});
        let err = adapter.validate(&config).unwrap_err();
        assert_eq!(err.to_diagnostics()[0].path.as_deref(), Some("wait_for.fields"));
    }
}
