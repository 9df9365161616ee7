//! crdform Kube - provider surface for Kubernetes custom resources
//!
//! This crate provides:
//! - **Provider**: type registry, schema lookup with suggestions, configuration
//! - **Resources**: server-side-apply create/read/update/delete/import with optional `wait_for`
//! - **Data Sources**: read-only lookup of live objects
//! - **Manifests**: offline rendering of objects to YAML
//! - **Dynamic Client**: `kube::Api<DynamicObject>` behind a trait, with an in-memory mock

pub mod client;
pub mod config;
pub mod data_source;
pub mod error;
pub mod manifest;
pub mod mock;
pub mod provider;
pub mod resource;

pub use client::{ApplyOptions, DynamicClient, KubeDynamicClient};
pub use config::{DEFAULT_FIELD_MANAGER, ProviderConfig, ProviderData};
pub use data_source::DataSourceReader;
pub use error::{ProviderError, Result};
pub use manifest::ManifestRenderer;
pub use mock::{MockDynamicClient, OperationCounts};
pub use provider::{Provider, ProviderMetadata, TypeKind};
pub use resource::ResourceAdapter;
