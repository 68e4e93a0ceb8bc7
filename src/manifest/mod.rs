//! The declarative package manifest: schema types, document merging,
//! validation and the typed query layer the orchestrator builds on.
//!
//! A manifest set is one common YAML document plus optional per-platform
//! documents. Later documents win on key collision at the
//! package/category/profile level (whole-entry replacement, never a
//! field-by-field deep merge).

pub mod merge;
pub mod query;
pub mod schema;
pub mod validate;

pub use merge::load_and_merge;
pub use query::{
    backend_config, expand_mise_tools, native_names, packages_for_profile, priority_for_package,
    BackendConfig,
};
pub use schema::{Category, Manifest, Package, Profile};
pub use validate::{validate, validate_manifest_schema, Violation};
