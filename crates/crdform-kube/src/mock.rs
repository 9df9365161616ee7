//! In-memory dynamic client for testing
//!
//! Objects are stored per kind and key. Applying merges nothing: the applied
//! object replaces the stored one, with `uid`, `resourceVersion` and an
//! optional `status` filled in the way an API server would.

use async_trait::async_trait;
use crdform_core::{CrdDefinition, ObjectKey};
use kube::core::ErrorResponse;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::client::{ApplyOptions, DynamicClient};

type StoreKey = (String, ObjectKey);

/// In-memory client for tests
#[derive(Clone, Default)]
pub struct MockDynamicClient {
    store: Arc<RwLock<HashMap<StoreKey, JsonValue>>>,
    operations: Arc<RwLock<OperationCounts>>,
    applied: Arc<RwLock<Vec<ApplyOptions>>>,
    status: Option<JsonValue>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub applies: usize,
    pub deletes: usize,
}

impl MockDynamicClient {
    /// Create a new empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `status` on every applied object
    pub fn with_status(mut self, status: JsonValue) -> Self {
        self.status = Some(status);
        self
    }

    /// Pre-populate an object
    pub fn insert(&self, crd: &CrdDefinition, key: &ObjectKey, object: JsonValue) {
        self.store
            .write()
            .unwrap()
            .insert((crd.kind.to_string(), key.clone()), object);
    }

    /// Stored object, if any
    pub fn object(&self, crd: &CrdDefinition, key: &ObjectKey) -> Option<JsonValue> {
        self.store
            .read()
            .unwrap()
            .get(&(crd.kind.to_string(), key.clone()))
            .cloned()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Options passed to every apply so far
    pub fn applied_options(&self) -> Vec<ApplyOptions> {
        self.applied.read().unwrap().clone()
    }
}

fn not_found(crd: &CrdDefinition, key: &ObjectKey) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{}.{} \"{}\" not found", crd.plural, crd.group, key.name),
        reason: "NotFound".to_string(),
        code: 404,
    })
}

#[async_trait]
impl DynamicClient for MockDynamicClient {
    async fn get(&self, crd: &CrdDefinition, key: &ObjectKey) -> Result<JsonValue, kube::Error> {
        self.operations.write().unwrap().gets += 1;
        self.object(crd, key).ok_or_else(|| not_found(crd, key))
    }

    async fn apply(
        &self,
        crd: &CrdDefinition,
        key: &ObjectKey,
        object: &JsonValue,
        options: &ApplyOptions,
    ) -> Result<JsonValue, kube::Error> {
        self.operations.write().unwrap().applies += 1;
        self.applied.write().unwrap().push(options.clone());

        let mut stored = object.clone();
        let generation = self
            .object(crd, key)
            .and_then(|prev| prev["metadata"]["resourceVersion"].as_str()?.parse::<u64>().ok())
            .unwrap_or(0);
        if let Some(metadata) = stored.get_mut("metadata").and_then(|m| m.as_object_mut()) {
            metadata.insert("uid".into(), JsonValue::String(format!("uid-{}", key)));
            metadata.insert(
                "resourceVersion".into(),
                JsonValue::String((generation + 1).to_string()),
            );
        }
        if let (Some(status), Some(obj)) = (&self.status, stored.as_object_mut()) {
            obj.insert("status".into(), status.clone());
        }

        self.insert(crd, key, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, crd: &CrdDefinition, key: &ObjectKey) -> Result<(), kube::Error> {
        self.operations.write().unwrap().deletes += 1;
        self.store
            .write()
            .unwrap()
            .remove(&(crd.kind.to_string(), key.clone()))
            .map(|_| ())
            .ok_or_else(|| not_found(crd, key))
    }
}
