//! Exposed Kubernetes kinds and the schemas derived from them
//!
//! A [`CrdDefinition`] names a custom resource kind and supplies its spec
//! attribute table. From that, three schemas are derived: one for the
//! server-side-apply resource, one for the read-only data source and one for
//! the manifest renderer. The definition also builds the Kubernetes object
//! from state and decodes a live object back into state.

use serde_json::{Map, Value as JsonValue, json};

use crate::codec;
use crate::error::{CoreError, Result};
use crate::identity::ObjectKey;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

/// Provider type name prefix
pub const PROVIDER_TYPE_NAME: &str = "k8s";

const DNS_SUBDOMAIN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";
const DNS_LABEL: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// A namespaced custom resource kind
#[derive(Debug, Clone, Copy)]
pub struct CrdDefinition {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub description: &'static str,
    pub spec: fn() -> Vec<Attribute>,
}

impl CrdDefinition {
    /// `<group>/<version>`
    pub fn api_version(&self) -> String {
        format!("{}/{}", self.group, self.version)
    }

    /// Type name shared by the resource and the data source,
    /// e.g. `k8s_services_k8s_aws_addon_v1alpha1`
    pub fn type_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            PROVIDER_TYPE_NAME,
            self.group.replace(['.', '-'], "_"),
            self.kind.to_lowercase(),
            self.version
        )
    }

    /// Type name of the manifest data source
    pub fn manifest_type_name(&self) -> String {
        format!("{}_manifest", self.type_name())
    }

    pub fn resource_schema(&self) -> Schema {
        Schema::new(
            format!("{} ({}) managed with server-side apply", self.kind, self.api_version()),
            vec![
                id_attribute(),
                Attribute::string("field_manager")
                    .optional()
                    .description("The name of the manager used to track field ownership. Overrides the provider default.")
                    .validator(Validator::length_at_least(1)),
                Attribute::bool("force_conflicts")
                    .optional()
                    .description("If true, server-side apply will force the changes against conflicts. Overrides the provider default."),
                Attribute::object(
                    "wait_for",
                    vec![Attribute::string_map("fields")
                        .optional()
                        .description("Map of field paths in the live object to regular expressions their value must match.")],
                )
                .optional()
                .description("Wait for the applied object to reach the given state before finishing."),
                metadata_attribute(),
                self.spec_attribute(),
            ],
        )
    }

    pub fn data_source_schema(&self) -> Schema {
        Schema::new(
            format!("Reads a {} ({}) from the cluster", self.kind, self.api_version()),
            vec![
                Attribute::string("id")
                    .computed()
                    .description("Contains the value 'metadata.namespace/metadata.name'."),
                Attribute::object(
                    "metadata",
                    vec![
                        name_attribute(),
                        namespace_attribute(),
                        Attribute::string_map("labels").computed(),
                        Attribute::string_map("annotations").computed(),
                    ],
                )
                .required(),
                self.spec_attribute().into_computed(),
            ],
        )
    }

    pub fn manifest_schema(&self) -> Schema {
        Schema::new(
            format!("Renders a {} ({}) as YAML", self.kind, self.api_version()),
            vec![
                id_attribute(),
                Attribute::string("yaml")
                    .computed()
                    .description("The generated manifest in YAML format."),
                metadata_attribute(),
                self.spec_attribute(),
            ],
        )
    }

    fn spec_attribute(&self) -> Attribute {
        Attribute::object("spec", (self.spec)())
            .required()
            .description(self.description)
    }

    /// Build the Kubernetes object for a state or plan
    ///
    /// `apiVersion` and `kind` are injected; `metadata` and `spec` are
    /// encoded with the schema's attribute tables.
    pub fn build_object(&self, schema: &Schema, state: &JsonValue) -> Result<JsonValue> {
        let mut object = Map::new();
        object.insert("apiVersion".into(), JsonValue::String(self.api_version()));
        object.insert("kind".into(), JsonValue::String(self.kind.to_string()));

        for section in ["metadata", "spec"] {
            let encoded = codec::encode(section_attributes(schema, section)?, &state[section])?;
            if !encoded.is_null() {
                object.insert(section.into(), encoded);
            }
        }
        Ok(JsonValue::Object(object))
    }

    /// Decode a live object into the `metadata` and `spec` state attributes
    ///
    /// The returned map is merged into the surface's state by the caller.
    pub fn decode_object(&self, schema: &Schema, object: &JsonValue) -> Result<Map<String, JsonValue>> {
        let mut state = Map::new();
        for section in ["metadata", "spec"] {
            let decoded = codec::decode(section_attributes(schema, section)?, &object[section])?;
            state.insert(section.into(), decoded);
        }
        Ok(state)
    }

    /// Empty state carrying only the object identity, as produced by import
    pub fn import_state(&self, key: &ObjectKey) -> JsonValue {
        json!({
            "id": key.id(),
            "metadata": { "name": key.name, "namespace": key.namespace },
        })
    }
}

fn section_attributes<'a>(schema: &'a Schema, section: &str) -> Result<&'a [Attribute]> {
    schema
        .attribute(section)
        .and_then(|a| a.ty.attributes())
        .ok_or_else(|| CoreError::MissingField {
            field: section.to_string(),
        })
}

fn id_attribute() -> Attribute {
    Attribute::string("id")
        .computed()
        .description("Contains the value 'metadata.namespace/metadata.name'.")
        .plan_modifier(PlanModifier::UseStateForUnknown)
}

fn name_attribute() -> Attribute {
    Attribute::string("name")
        .required()
        .description("Unique name of the object within its namespace.")
        .validator(Validator::length_at_least(1))
        .validator(Validator::length_at_most(253))
        .validator(Validator::regex(DNS_SUBDOMAIN, "must be a valid DNS subdomain name"))
        .plan_modifier(PlanModifier::RequiresReplace)
}

fn namespace_attribute() -> Attribute {
    Attribute::string("namespace")
        .required()
        .description("Namespace the object lives in.")
        .validator(Validator::length_at_least(1))
        .validator(Validator::length_at_most(63))
        .validator(Validator::regex(DNS_LABEL, "must be a valid DNS label"))
        .plan_modifier(PlanModifier::RequiresReplace)
}

fn metadata_attribute() -> Attribute {
    Attribute::object(
        "metadata",
        vec![
            name_attribute(),
            namespace_attribute(),
            Attribute::string_map("labels")
                .optional()
                .description("Map of string keys and values used to organize and categorize objects."),
            Attribute::string_map("annotations")
                .optional()
                .description("Unstructured key value map stored with the object."),
        ],
    )
    .required()
    .description("Data that helps uniquely identify this object.")
}
