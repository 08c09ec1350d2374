pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{
    apply_patch, apply_patches, apply_target, ApplicationError, PatchResult, PatchedText,
};
pub use loader::{
    load, load_builtin, load_from_path, load_from_str, ConfigError, ConfigOrigin, BUILTIN_CONFIG,
};
pub use schema::{
    Branch, Metadata, Operation, PatchConfig, PatchDefinition, Query, TargetDefinition,
    ValidationError, ValidationIssue,
};
