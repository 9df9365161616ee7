//! Schema tables for every exposed custom resource kind

mod contour;
mod eks;

use crate::definition::CrdDefinition;
use crate::schema::Attribute;

pub use contour::{HTTP_PROXY, TLS_CERTIFICATE_DELEGATION};
pub use eks::{ADDON, CLUSTER, NODEGROUP};

static ALL: [CrdDefinition; 5] = [ADDON, CLUSTER, NODEGROUP, HTTP_PROXY, TLS_CERTIFICATE_DELEGATION];

/// All kinds exposed by the provider, in registration order
pub fn all() -> &'static [CrdDefinition] {
    &ALL
}

/// Name-only reference to another object, resolved by the owning controller
///
/// Rendered as `{ from: { name } }`.
fn reference(name: &str, description: &str) -> Attribute {
    Attribute::object(
        name,
        vec![Attribute::object(
            "from",
            vec![Attribute::string("name").optional()],
        )
        .optional()],
    )
    .optional()
    .description(description)
}

/// List of name-only references
fn reference_list(name: &str, description: &str) -> Attribute {
    Attribute::object_list(
        name,
        vec![Attribute::object(
            "from",
            vec![Attribute::string("name").optional()],
        )
        .optional()],
    )
    .optional()
    .description(description)
}
