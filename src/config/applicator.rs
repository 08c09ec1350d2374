//! Patch applicator - runs one target's patches over an in-memory buffer
//!
//! Patches run strictly in declaration order; each sees the output of the
//! previous one. A patch whose query finds nothing leaves the buffer alone and
//! is reported as [`PatchResult::NoMatch`], never as an error.

use crate::config::schema::{Operation, PatchDefinition, Query, TargetDefinition};
use crate::edit::{apply_batch, Edit, EditError, EditResult};
use crate::js::{anchor, chain, pattern, PatternError};
use std::fmt;

/// Result of applying a single patch
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchResult should be checked"]
pub enum PatchResult {
    /// Patch changed the buffer at `sites` locations
    Applied { sites: usize },
    /// Query matched, but every site already held the new text
    AlreadyApplied { sites: usize },
    /// Query matched nothing; buffer unchanged
    NoMatch,
}

impl PatchResult {
    pub fn changed(&self) -> bool {
        matches!(self, PatchResult::Applied { .. })
    }
}

impl fmt::Display for PatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchResult::Applied { sites } => write!(f, "Applied at {sites} site(s)"),
            PatchResult::AlreadyApplied { sites } => {
                write!(f, "Already applied at {sites} site(s)")
            }
            PatchResult::NoMatch => write!(f, "No match, skipped"),
        }
    }
}

/// Errors during patch application
#[derive(Debug)]
pub enum ApplicationError {
    /// Regex could not be compiled
    Pattern {
        patch_id: String,
        source: PatternError,
    },
    /// Edit verification or splicing failed
    Edit { patch_id: String, source: EditError },
    /// Query and operation do not fit together
    Unsupported {
        patch_id: String,
        query: &'static str,
        operation: &'static str,
    },
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Pattern { patch_id, source } => {
                write!(f, "patch '{patch_id}': {source}")
            }
            ApplicationError::Edit { patch_id, source } => {
                write!(f, "patch '{patch_id}': edit error: {source}")
            }
            ApplicationError::Unsupported {
                patch_id,
                query,
                operation,
            } => write!(
                f,
                "patch '{patch_id}': {query} query does not support {operation} operation"
            ),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Pattern { source, .. } => Some(source),
            ApplicationError::Edit { source, .. } => Some(source),
            ApplicationError::Unsupported { .. } => None,
        }
    }
}

/// Output of running a target's patch list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedText {
    pub text: String,
    /// One entry per patch, in application order
    pub results: Vec<(String, PatchResult)>,
}

impl PatchedText {
    pub fn changed(&self) -> bool {
        self.results.iter().any(|(_, r)| r.changed())
    }
}

/// Run every patch of `target` over `content`, in order.
pub fn apply_target(
    target: &TargetDefinition,
    content: &str,
) -> Result<PatchedText, ApplicationError> {
    apply_patches(&target.patches, content)
}

/// Run `patches` over `content`, in order.
pub fn apply_patches(
    patches: &[PatchDefinition],
    content: &str,
) -> Result<PatchedText, ApplicationError> {
    let mut text = content.to_string();
    let mut results = Vec::with_capacity(patches.len());

    for patch in patches {
        let (next, result) = apply_patch(patch, &text)?;
        text = next;
        results.push((patch.id.clone(), result));
    }

    Ok(PatchedText { text, results })
}

/// Apply one patch to `content`, returning the new buffer and what happened.
pub fn apply_patch(
    patch: &PatchDefinition,
    content: &str,
) -> Result<(String, PatchResult), ApplicationError> {
    let edits = compute_edits(patch, content)?;
    if edits.is_empty() {
        return Ok((content.to_string(), PatchResult::NoMatch));
    }

    let sites = edits.len();
    let (text, edit_results) =
        apply_batch(content, edits).map_err(|source| ApplicationError::Edit {
            patch_id: patch.id.clone(),
            source,
        })?;

    let result = if edit_results
        .iter()
        .any(|r| matches!(r, EditResult::Applied { .. }))
    {
        PatchResult::Applied { sites }
    } else {
        PatchResult::AlreadyApplied { sites }
    };

    Ok((text, result))
}

/// Compute the edits for a patch without applying them.
fn compute_edits(patch: &PatchDefinition, content: &str) -> Result<Vec<Edit>, ApplicationError> {
    let edits = match (&patch.query, &patch.operation) {
        (Query::ConditionalChain { subject, cases }, Operation::AppendBranches { branches }) => {
            let branches: Vec<(String, String)> = branches
                .iter()
                .map(|b| (b.case.clone(), b.body.clone()))
                .collect();
            chain::find_exact_chains(content, subject, cases)
                .iter()
                .map(|found| found.extend(content, subject, &branches))
                .collect()
        }
        (Query::Anchor { markers }, Operation::InsertBefore { text }) => {
            anchor::locate(content, markers)
                .map(|found| anchor::insert_before(found, text))
                .into_iter()
                .collect()
        }
        (Query::Regex { pattern: source }, Operation::AppendAfter { text }) => {
            let regex = compile(patch, source)?;
            pattern::append_after(content, &regex, text)
        }
        (Query::Regex { pattern: source }, Operation::Replace { text }) => {
            let regex = compile(patch, source)?;
            pattern::replace(content, &regex, text)
        }
        (Query::Text { search }, Operation::Replace { text }) => {
            pattern::replace_literal(content, search, text)
        }
        (query, operation) => {
            return Err(ApplicationError::Unsupported {
                patch_id: patch.id.clone(),
                query: query.kind(),
                operation: operation.kind(),
            })
        }
    };
    Ok(edits)
}

fn compile(patch: &PatchDefinition, source: &str) -> Result<regex::Regex, ApplicationError> {
    pattern::compile(source).map_err(|source| ApplicationError::Pattern {
        patch_id: patch.id.clone(),
        source,
    })
}
