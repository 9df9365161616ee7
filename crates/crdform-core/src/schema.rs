//! Attribute descriptors for exposed Kubernetes kinds
//!
//! A schema is a tree of [`Attribute`]s. Each attribute carries two names:
//! the snake_case name used in configuration and state, and the camelCase
//! field name used in the Kubernetes object. The tables in [`crate::crds`]
//! are built with the chaining constructors below.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Attribute value type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    String,
    Int64,
    Float64,
    Bool,
    /// Arbitrary JSON passed through unchanged
    Dynamic,
    List(Box<AttrType>),
    Map(Box<AttrType>),
    Object(Vec<Attribute>),
}

impl AttrType {
    /// Human-readable type name
    pub fn type_name(&self) -> String {
        match self {
            AttrType::String => "string".to_string(),
            AttrType::Int64 => "int64".to_string(),
            AttrType::Float64 => "float64".to_string(),
            AttrType::Bool => "bool".to_string(),
            AttrType::Dynamic => "dynamic".to_string(),
            AttrType::List(elem) => format!("list({})", elem.type_name()),
            AttrType::Map(elem) => format!("map({})", elem.type_name()),
            AttrType::Object(_) => "object".to_string(),
        }
    }

    /// Nested attributes of an object type
    pub fn attributes(&self) -> Option<&[Attribute]> {
        match self {
            AttrType::Object(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// Declarative value constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Validator {
    LengthAtLeast { min: usize },
    LengthAtMost { max: usize },
    RegexMatches { pattern: String, message: String },
    OneOf { values: Vec<String> },
    AtLeast { min: i64 },
    AtMost { max: i64 },
    SizeAtMost { max: usize },
}

impl Validator {
    pub fn length_at_least(min: usize) -> Self {
        Self::LengthAtLeast { min }
    }

    pub fn length_at_most(max: usize) -> Self {
        Self::LengthAtMost { max }
    }

    pub fn regex(pattern: &str, message: &str) -> Self {
        Self::RegexMatches {
            pattern: pattern.to_string(),
            message: message.to_string(),
        }
    }

    pub fn one_of(values: &[&str]) -> Self {
        Self::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn at_least(min: i64) -> Self {
        Self::AtLeast { min }
    }

    pub fn at_most(max: i64) -> Self {
        Self::AtMost { max }
    }

    pub fn size_at_most(max: usize) -> Self {
        Self::SizeAtMost { max }
    }
}

/// Plan-time behavior attached to an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    /// A change to this value forces the object to be recreated
    RequiresReplace,
    /// Keep the prior state value when the planned value is unknown
    UseStateForUnknown,
}

/// A single attribute descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub json_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type")]
    pub ty: AttrType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<PlanModifier>,
}

impl Attribute {
    /// Create an attribute with no flags set; `json_name` is derived from `name`
    pub fn new(name: &str, ty: AttrType) -> Self {
        Self {
            name: name.to_string(),
            json_name: snake_to_camel(name),
            description: String::new(),
            ty,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            default: None,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, AttrType::String)
    }

    pub fn int64(name: &str) -> Self {
        Self::new(name, AttrType::Int64)
    }

    pub fn float64(name: &str) -> Self {
        Self::new(name, AttrType::Float64)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, AttrType::Bool)
    }

    pub fn dynamic(name: &str) -> Self {
        Self::new(name, AttrType::Dynamic)
    }

    pub fn string_list(name: &str) -> Self {
        Self::new(name, AttrType::List(Box::new(AttrType::String)))
    }

    pub fn string_map(name: &str) -> Self {
        Self::new(name, AttrType::Map(Box::new(AttrType::String)))
    }

    pub fn object(name: &str, attrs: Vec<Attribute>) -> Self {
        Self::new(name, AttrType::Object(attrs))
    }

    pub fn object_list(name: &str, attrs: Vec<Attribute>) -> Self {
        Self::new(name, AttrType::List(Box::new(AttrType::Object(attrs))))
    }

    pub fn json_name(mut self, json_name: &str) -> Self {
        self.json_name = json_name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, value: JsonValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    pub fn has_modifier(&self, modifier: PlanModifier) -> bool {
        self.plan_modifiers.contains(&modifier)
    }

    /// Rewrite this attribute and every nested one as read-only output
    ///
    /// Validators, defaults and plan modifiers only apply to configured
    /// values, so they are dropped.
    pub fn into_computed(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.computed = true;
        self.default = None;
        self.validators.clear();
        self.plan_modifiers.clear();
        self.ty = computed_type(self.ty);
        self
    }
}

fn computed_type(ty: AttrType) -> AttrType {
    match ty {
        AttrType::Object(attrs) => {
            AttrType::Object(attrs.into_iter().map(Attribute::into_computed).collect())
        }
        AttrType::List(elem) => AttrType::List(Box::new(computed_type(*elem))),
        AttrType::Map(elem) => AttrType::Map(Box::new(computed_type(*elem))),
        other => other,
    }
}

/// Schema for one exposed type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(description: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            version: 0,
            description: description.into(),
            attributes,
        }
    }

    /// Look up a root attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up an attribute by dotted path, e.g. `metadata.name`
    pub fn attribute_at(&self, path: &str) -> Option<&Attribute> {
        let mut parts = path.split('.');
        let mut current = self.attribute(parts.next()?)?;
        for part in parts {
            current = current
                .ty
                .attributes()?
                .iter()
                .find(|a| a.name == part)?;
        }
        Some(current)
    }
}

/// Convert a snake_case attribute name into its lowerCamelCase field name
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
