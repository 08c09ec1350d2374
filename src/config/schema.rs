use crate::js::pattern;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub targets: Vec<TargetDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.targets.is_empty() {
            issues.push(ValidationIssue::EmptyTargetList);
        }

        match self.targets.iter().filter(|t| t.required).count() {
            1 => {}
            0 if self.targets.is_empty() => {}
            0 => issues.push(ValidationIssue::PrimaryCount { count: 0 }),
            count => issues.push(ValidationIssue::PrimaryCount { count }),
        }

        let mut files = HashSet::new();
        for target in &self.targets {
            if target.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "targets.file",
                });
            } else if !files.insert(target.file.as_str()) {
                issues.push(ValidationIssue::DuplicateTarget {
                    file: target.file.clone(),
                });
            }

            if target.patches.is_empty() {
                issues.push(ValidationIssue::EmptyPatchList {
                    file: target.file.clone(),
                });
            }

            let mut ids = HashSet::new();
            for patch in &target.patches {
                if patch.id.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: None,
                        field: "id",
                    });
                } else if !ids.insert(patch.id.as_str()) {
                    issues.push(ValidationIssue::DuplicateId {
                        file: target.file.clone(),
                        patch_id: patch.id.clone(),
                    });
                }
                patch.collect_issues(&mut issues);
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// The single required target. Only meaningful after [`validate`](Self::validate).
    pub fn primary(&self) -> Option<&TargetDefinition> {
        self.targets.iter().find(|t| t.required)
    }

    /// Optional targets, in declaration order.
    pub fn secondaries(&self) -> impl Iterator<Item = &TargetDefinition> {
        self.targets.iter().filter(|t| !t.required)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Manual verification steps printed after a successful run
    #[serde(default)]
    pub checklist: Vec<String>,
}

/// One file and the patches applied to it, in order.
#[derive(Debug, Deserialize, Clone)]
pub struct TargetDefinition {
    pub file: String,
    /// A missing required target aborts the run; a missing optional one is a warning
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchDefinition {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub query: Query,
    pub operation: Operation,
}

impl PatchDefinition {
    fn collect_issues(&self, issues: &mut Vec<ValidationIssue>) {
        let id = Some(self.id.clone());

        match &self.query {
            Query::ConditionalChain { subject, cases } => {
                if subject.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: id.clone(),
                        field: "query.subject",
                    });
                }
                if cases.is_empty() || cases.iter().any(|c| c.is_empty()) {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: id.clone(),
                        field: "query.cases",
                    });
                }
            }
            Query::Anchor { markers } => {
                if markers.is_empty() || markers.iter().any(|m| m.is_empty()) {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: id.clone(),
                        field: "query.markers",
                    });
                }
            }
            Query::Regex { pattern: source } => {
                if source.is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: id.clone(),
                        field: "query.pattern",
                    });
                } else if let Err(e) = pattern::compile(source) {
                    issues.push(ValidationIssue::InvalidPattern {
                        patch_id: self.id.clone(),
                        message: e.to_string(),
                    });
                }
            }
            Query::Text { search } => {
                if search.is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: id.clone(),
                        field: "query.search",
                    });
                }
            }
        }

        match &self.operation {
            Operation::AppendBranches { branches } => {
                if branches.is_empty()
                    || branches
                        .iter()
                        .any(|b| b.case.is_empty() || b.body.trim().is_empty())
                {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: id.clone(),
                        field: "operation.branches",
                    });
                }
            }
            Operation::InsertBefore { text } | Operation::AppendAfter { text } => {
                if text.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: id.clone(),
                        field: "operation.text",
                    });
                }
            }
            // An empty replacement deletes the match, which is allowed.
            Operation::Replace { .. } => {}
        }

        let valid_combo = matches!(
            (&self.query, &self.operation),
            (Query::ConditionalChain { .. }, Operation::AppendBranches { .. })
                | (Query::Anchor { .. }, Operation::InsertBefore { .. })
                | (Query::Regex { .. }, Operation::AppendAfter { .. })
                | (Query::Regex { .. }, Operation::Replace { .. })
                | (Query::Text { .. }, Operation::Replace { .. })
        );
        if !valid_combo {
            issues.push(ValidationIssue::InvalidCombo {
                patch_id: id,
                message: format!(
                    "{} query does not support {} operation",
                    self.query.kind(),
                    self.operation.kind()
                ),
            });
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Query {
    /// `if (<subject> === '<case>') { ... } else if ...` with exactly these cases
    ConditionalChain { subject: String, cases: Vec<String> },
    /// Literal markers, tried in order
    Anchor { markers: Vec<String> },
    Regex { pattern: String },
    /// Exact text
    Text { search: String },
}

impl Query {
    pub fn kind(&self) -> &'static str {
        match self {
            Query::ConditionalChain { .. } => "conditional-chain",
            Query::Anchor { .. } => "anchor",
            Query::Regex { .. } => "regex",
            Query::Text { .. } => "text",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    AppendBranches { branches: Vec<Branch> },
    InsertBefore { text: String },
    AppendAfter { text: String },
    Replace { text: String },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::AppendBranches { .. } => "append-branches",
            Operation::InsertBefore { .. } => "insert-before",
            Operation::AppendAfter { .. } => "append-after",
            Operation::Replace { .. } => "replace",
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Branch {
    pub case: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyTargetList,
    EmptyPatchList {
        file: String,
    },
    PrimaryCount {
        count: usize,
    },
    DuplicateTarget {
        file: String,
    },
    DuplicateId {
        file: String,
        patch_id: String,
    },
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    InvalidPattern {
        patch_id: String,
        message: String,
    },
    InvalidCombo {
        patch_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyTargetList => write!(f, "patch config contains no targets"),
            ValidationIssue::EmptyPatchList { file } => {
                write!(f, "target '{file}' contains no patches")
            }
            ValidationIssue::PrimaryCount { count } => write!(
                f,
                "exactly one target must be marked required (found {count})"
            ),
            ValidationIssue::DuplicateTarget { file } => {
                write!(f, "target '{file}' is declared more than once")
            }
            ValidationIssue::DuplicateId { file, patch_id } => {
                write!(f, "patch id '{patch_id}' is used twice in target '{file}'")
            }
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::InvalidPattern { patch_id, message } => {
                write!(f, "patch '{patch_id}' has an unusable pattern: {message}")
            }
            ValidationIssue::InvalidCombo { patch_id, message } => match patch_id {
                Some(id) => write!(f, "patch '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid patch configuration: {message}"),
            },
        }
    }
}
