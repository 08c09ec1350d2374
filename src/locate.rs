use crate::config::{PatchConfig, TargetDefinition};
use crate::safety::{SafetyError, WorkspaceGuard};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("required file not found: {file}")]
    MissingPrimary { file: PathBuf },

    #[error("patch config has no required target")]
    NoPrimary,

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

/// A target whose file exists and is safe to patch.
#[derive(Debug, Clone)]
pub struct LocatedTarget<'a> {
    pub target: &'a TargetDefinition,
    /// Path under the working directory (not symlink-resolved)
    pub path: PathBuf,
}

/// Outcome of the precondition check.
#[derive(Debug, Clone)]
pub struct Located<'a> {
    pub primary: LocatedTarget<'a>,
    pub secondaries: Vec<LocatedTarget<'a>>,
    /// Optional targets that are absent
    pub missing: Vec<&'a TargetDefinition>,
}

impl<'a> Located<'a> {
    /// Primary first, then present secondaries in declaration order.
    pub fn present(&self) -> impl Iterator<Item = &LocatedTarget<'a>> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }
}

/// Check which targets of `config` exist under the guard's root.
///
/// A missing primary is an error; a missing secondary is only recorded.
pub fn locate<'a>(
    guard: &WorkspaceGuard,
    config: &'a PatchConfig,
) -> Result<Located<'a>, LocateError> {
    let primary_def = config.primary().ok_or(LocateError::NoPrimary)?;

    let primary = find(guard, primary_def)?.ok_or_else(|| LocateError::MissingPrimary {
        file: guard.resolve(&primary_def.file),
    })?;

    let mut secondaries = Vec::new();
    let mut missing = Vec::new();
    for target in config.secondaries() {
        match find(guard, target)? {
            Some(located) => secondaries.push(located),
            None => missing.push(target),
        }
    }

    Ok(Located {
        primary,
        secondaries,
        missing,
    })
}

fn find<'a>(
    guard: &WorkspaceGuard,
    target: &'a TargetDefinition,
) -> Result<Option<LocatedTarget<'a>>, LocateError> {
    let path = guard.resolve(&target.file);
    if !path.is_file() {
        return Ok(None);
    }
    guard.validate_path(&path)?;
    Ok(Some(LocatedTarget { target, path }))
}
