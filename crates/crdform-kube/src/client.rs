//! Dynamic Kubernetes client used by every adapter
//!
//! Adapters only ever need GET, server-side-apply PATCH and DELETE on a
//! single namespaced object. [`DynamicClient`] is that seam;
//! [`KubeDynamicClient`] implements it with `kube::Api<DynamicObject>` and
//! [`crate::mock::MockDynamicClient`] keeps objects in memory for tests.

use async_trait::async_trait;
use crdform_core::{CrdDefinition, ObjectKey};
use kube::{
    Client,
    api::{Api, DeleteParams, DynamicObject, Patch, PatchParams},
    core::{GroupVersionKind, params::ValidationDirective},
    discovery::ApiResource,
};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Options for a server-side-apply PATCH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Field manager recorded as owner of the applied fields
    pub field_manager: String,
    /// Take ownership of fields held by other managers
    pub force_conflicts: bool,
}

/// Minimal dynamic client for namespaced custom resources
#[async_trait]
pub trait DynamicClient: Send + Sync {
    /// GET the object
    async fn get(&self, crd: &CrdDefinition, key: &ObjectKey) -> Result<JsonValue, kube::Error>;

    /// Server-side apply `object` and return the object the server stored
    async fn apply(
        &self,
        crd: &CrdDefinition,
        key: &ObjectKey,
        object: &JsonValue,
        options: &ApplyOptions,
    ) -> Result<JsonValue, kube::Error>;

    /// DELETE the object
    async fn delete(&self, crd: &CrdDefinition, key: &ObjectKey) -> Result<(), kube::Error>;
}

/// [`DynamicClient`] backed by a live cluster
#[derive(Clone)]
pub struct KubeDynamicClient {
    client: Client,
}

impl KubeDynamicClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, crd: &CrdDefinition, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &api_resource(crd))
    }
}

/// Build the `ApiResource` for a definition without running discovery
pub fn api_resource(crd: &CrdDefinition) -> ApiResource {
    let gvk = GroupVersionKind::gvk(crd.group, crd.version, crd.kind);
    ApiResource::from_gvk_with_plural(&gvk, crd.plural)
}

/// Build the PATCH parameters for a server-side apply
pub fn apply_params(options: &ApplyOptions) -> PatchParams {
    PatchParams {
        field_manager: Some(options.field_manager.clone()),
        force: options.force_conflicts,
        field_validation: Some(ValidationDirective::Strict),
        ..PatchParams::default()
    }
}

#[async_trait]
impl DynamicClient for KubeDynamicClient {
    async fn get(&self, crd: &CrdDefinition, key: &ObjectKey) -> Result<JsonValue, kube::Error> {
        debug!(kind = crd.kind, %key, "GET");
        let object = self.api(crd, &key.namespace).get(&key.name).await?;
        serde_json::to_value(object).map_err(kube::Error::SerdeError)
    }

    async fn apply(
        &self,
        crd: &CrdDefinition,
        key: &ObjectKey,
        object: &JsonValue,
        options: &ApplyOptions,
    ) -> Result<JsonValue, kube::Error> {
        debug!(
            kind = crd.kind,
            %key,
            field_manager = %options.field_manager,
            force = options.force_conflicts,
            "PATCH (server-side apply)"
        );
        let applied = self
            .api(crd, &key.namespace)
            .patch(&key.name, &apply_params(options), &Patch::Apply(object))
            .await?;
        serde_json::to_value(applied).map_err(kube::Error::SerdeError)
    }

    async fn delete(&self, crd: &CrdDefinition, key: &ObjectKey) -> Result<(), kube::Error> {
        debug!(kind = crd.kind, %key, "DELETE");
        self.api(crd, &key.namespace)
            .delete(&key.name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdform_core::crds;

    #[test]
    fn test_api_resource_uses_plural() {
        let ar = api_resource(&crds::HTTP_PROXY);
        assert_eq!(ar.group, "projectcontour.io");
        assert_eq!(ar.version, "v1");
        assert_eq!(ar.api_version, "projectcontour.io/v1");
        assert_eq!(ar.kind, "HTTPProxy");
        assert_eq!(ar.plural, "httpproxies");
    }

    #[test]
    fn test_apply_params() {
        let params = apply_params(&ApplyOptions {
            field_manager: "crdform".to_string(),
            force_conflicts: true,
        });
        assert_eq!(params.field_manager.as_deref(), Some("crdform"));
        assert!(params.force);
        assert!(!params.dry_run);
        assert!(matches!(params.field_validation, Some(ValidationDirective::Strict)));
    }
}
