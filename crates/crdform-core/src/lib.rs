//! crdform Core - schema model and object codec for Kubernetes CRDs
//!
//! This crate provides the cluster-independent pieces of crdform:
//! - `Schema`: attribute descriptors with validators and plan modifiers
//! - `validate`: schema implementation checks and configuration validation
//! - `codec`: translation between snake_case state and camelCase objects
//! - `CrdDefinition`: an exposed kind and its resource, data source and manifest schemas
//! - `ObjectKey`: `<namespace>/<name>` identity and import-ID parsing
//! - `plan`: defaults, state carry-over and replacement detection
//! - `WaitFor`: field conditions checked against a live object
//! - `crds`: the schema tables for every exposed kind

pub mod codec;
pub mod crds;
pub mod definition;
pub mod diag;
pub mod error;
pub mod identity;
pub mod plan;
pub mod schema;
pub mod validate;
pub mod wait;

pub use definition::{CrdDefinition, PROVIDER_TYPE_NAME};
pub use diag::{Diagnostic, Severity, has_errors};
pub use error::{CoreError, Result};
pub use identity::ObjectKey;
pub use plan::{PlanOutcome, plan};
pub use schema::{AttrType, Attribute, PlanModifier, Schema, Validator};
pub use validate::{validate_config, validate_implementation};
pub use wait::WaitFor;
