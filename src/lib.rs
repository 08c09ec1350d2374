//! ClassFlow fix: one-shot source patcher for the ClassFlow frontend
//!
//! Wires the assignments and grades tabs into `app.js` and gives
//! `app-assignments.js` local fallbacks for the helpers it borrows from
//! `app.js`. The originals are kept as `<name>.backup`.
//!
//! # Architecture
//!
//! All patch operations compile down to a single primitive: [`Edit`], a
//! verified byte-span replacement on an in-memory buffer. Span location lives
//! in [`js`] (conditional-chain matcher, anchors, regex); the ordered patch
//! lists live in a TOML [`config`] embedded in the binary.
//!
//! A run is: [`locate`] the targets, patch each buffer with
//! [`config::apply_target`], then stage and commit the writes through a
//! [`backup::Transaction`].
//!
//! # Example
//!
//! ```
//! use classflow_fix::config::{apply_target, load_builtin};
//!
//! let config = load_builtin().unwrap();
//! let primary = config.primary().unwrap();
//! let patched = apply_target(primary, "const untouched = true;\n").unwrap();
//! assert_eq!(patched.text, "const untouched = true;\n");
//! assert!(!patched.changed());
//! ```

pub mod backup;
pub mod cache;
pub mod config;
pub mod edit;
pub mod js;
pub mod locate;
pub mod report;
pub mod safety;

// Re-exports
pub use backup::{BackupError, Committed, RestoreResult, Transaction};
pub use config::{
    apply_target, load, load_builtin, load_from_path, load_from_str, ApplicationError,
    ConfigError, PatchConfig, PatchResult, PatchedText, ValidationError,
};
pub use edit::{Edit, EditError, EditResult, EditVerification};
pub use locate::{LocateError, Located, LocatedTarget};
pub use safety::{SafetyError, WorkspaceGuard};
