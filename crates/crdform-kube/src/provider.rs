//! Provider: type registry, configuration and dispatch
//!
//! Every [`CrdDefinition`] is registered three times: as a resource and a
//! data source under its type name, and as a manifest under the
//! `_manifest` type name. Adapters handed out after [`Provider::configure`]
//! carry the provider's [`ProviderData`].

use crdform_core::{CrdDefinition, Diagnostic, PROVIDER_TYPE_NAME, Schema, crds, validate_implementation};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use strsim::levenshtein;
use tracing::{debug, info};

use crate::config::{ProviderConfig, ProviderData};
use crate::data_source::DataSourceReader;
use crate::error::{ProviderError, Result};
use crate::manifest::ManifestRenderer;
use crate::resource::ResourceAdapter;

/// Maximum edit distance for "did you mean" suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Which surface a type name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Resource,
    DataSource,
    Manifest,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Resource => write!(f, "resource"),
            TypeKind::DataSource => write!(f, "data source"),
            TypeKind::Manifest => write!(f, "manifest"),
        }
    }
}

/// Provider type name and version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    pub type_name: &'static str,
    pub version: &'static str,
}

/// The provider
pub struct Provider {
    resources: IndexMap<String, CrdDefinition>,
    data_sources: IndexMap<String, CrdDefinition>,
    manifests: IndexMap<String, CrdDefinition>,
    data: Option<Arc<ProviderData>>,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    /// Provider exposing every built-in kind
    pub fn new() -> Self {
        Self::with_definitions(crds::all())
    }

    /// Provider exposing the given kinds
    pub fn with_definitions(definitions: &[CrdDefinition]) -> Self {
        let mut provider = Self {
            resources: IndexMap::new(),
            data_sources: IndexMap::new(),
            manifests: IndexMap::new(),
            data: None,
        };
        for crd in definitions {
            provider.resources.insert(crd.type_name(), *crd);
            provider.data_sources.insert(crd.type_name(), *crd);
            provider.manifests.insert(crd.manifest_type_name(), *crd);
        }
        provider
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    fn registry(&self, kind: TypeKind) -> &IndexMap<String, CrdDefinition> {
        match kind {
            TypeKind::Resource => &self.resources,
            TypeKind::DataSource => &self.data_sources,
            TypeKind::Manifest => &self.manifests,
        }
    }

    /// Registered type names of one kind, in registration order
    pub fn type_names(&self, kind: TypeKind) -> Vec<&str> {
        self.registry(kind).keys().map(String::as_str).collect()
    }

    fn lookup(&self, kind: TypeKind, type_name: &str) -> Result<CrdDefinition> {
        self.registry(kind)
            .get(type_name)
            .copied()
            .ok_or_else(|| ProviderError::UnknownType {
                type_name: type_name.to_string(),
                suggestion: self.suggest(kind, type_name),
            })
    }

    /// Closest registered name of the same kind, if any is close enough
    pub fn suggest(&self, kind: TypeKind, type_name: &str) -> Option<String> {
        self.registry(kind)
            .keys()
            .map(|candidate| (levenshtein(type_name, candidate), candidate))
            .filter(|(distance, _)| *distance > 0 && *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate.clone())
    }

    /// Schema for a type name
    pub fn schema(&self, kind: TypeKind, type_name: &str) -> Result<Schema> {
        let crd = self.lookup(kind, type_name)?;
        Ok(match kind {
            TypeKind::Resource => crd.resource_schema(),
            TypeKind::DataSource => crd.data_source_schema(),
            TypeKind::Manifest => crd.manifest_schema(),
        })
    }

    /// Connect (or go offline) according to `config`
    pub async fn configure(&mut self, config: &ProviderConfig) -> Result<()> {
        let data = config.connect().await?;
        info!(
            offline = data.is_offline(),
            field_manager = %data.field_manager,
            "provider configured"
        );
        self.data = Some(Arc::new(data));
        Ok(())
    }

    /// Configure with prepared provider data, e.g. a mock client
    pub fn configure_with(&mut self, data: ProviderData) {
        self.data = Some(Arc::new(data));
    }

    pub fn is_configured(&self) -> bool {
        self.data.is_some()
    }

    pub fn resource(&self, type_name: &str) -> Result<ResourceAdapter> {
        let mut adapter = ResourceAdapter::new(self.lookup(TypeKind::Resource, type_name)?);
        if let Some(data) = &self.data {
            adapter.configure(Arc::clone(data));
        }
        Ok(adapter)
    }

    pub fn data_source(&self, type_name: &str) -> Result<DataSourceReader> {
        let mut reader = DataSourceReader::new(self.lookup(TypeKind::DataSource, type_name)?);
        if let Some(data) = &self.data {
            reader.configure(Arc::clone(data));
        }
        Ok(reader)
    }

    pub fn manifest(&self, type_name: &str) -> Result<ManifestRenderer> {
        Ok(ManifestRenderer::new(self.lookup(TypeKind::Manifest, type_name)?))
    }

    /// Check every registered schema
    ///
    /// Diagnostic paths are prefixed with the type name.
    pub fn validate_implementation(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for kind in [TypeKind::Resource, TypeKind::DataSource, TypeKind::Manifest] {
            for type_name in self.registry(kind).keys() {
                let Ok(schema) = self.schema(kind, type_name) else {
                    continue;
                };
                let found = validate_implementation(&schema);
                debug!(%kind, type_name = %type_name, problems = found.len(), "validated schema");
                diagnostics.extend(found.into_iter().map(|mut d| {
                    d.path = Some(match d.path.take() {
                        Some(path) => format!("{}.{}", type_name, path),
                        None => type_name.clone(),
                    });
                    d
                }));
            }
        }
        diagnostics
    }
}
