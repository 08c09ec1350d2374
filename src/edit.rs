use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement with verification.
///
/// Every patch operation compiles down to a list of these. Intelligence lives in
/// span location (chain matcher, anchors, regex), not in application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied to a buffer"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to put at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("Before-text verification failed at byte {byte_start}: found {found:?}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("Invalid byte range: [{byte_start}, {byte_end}) in buffer of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("Overlapping edits at [{byte_start}, {byte_end})")]
    Overlap { byte_start: usize, byte_end: usize },

    #[error("Edit boundary at byte {0} is not on a UTF-8 character boundary")]
    CharBoundary(usize),
}

/// Result of applying an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditResult {
    /// Edit changed the buffer
    Applied { bytes_changed: usize },
    /// Span already held the new text
    AlreadyApplied,
}

impl Edit {
    /// Create a new edit with automatic verification generation.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Zero-width insertion at `at`.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at, at, text, "")
    }

    /// Validate the edit against the buffer and return the current span text.
    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: content.len(),
            });
        }
        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::CharBoundary(offset));
            }
        }

        let current = &content[self.byte_start..self.byte_end];

        // Already applied (idempotency)
        if current == self.new_text {
            return Ok(current);
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(current)
    }

    /// Apply this edit to a buffer, returning the new buffer.
    pub fn apply_to(&self, content: &str) -> Result<(String, EditResult), EditError> {
        let (new_content, mut results) = apply_batch(content, vec![self.clone()])?;
        Ok((new_content, results.remove(0)))
    }
}

/// Apply multiple edits to one buffer.
///
/// Edits are validated against the original buffer, sorted by byte_start
/// descending and applied bottom-to-top to avoid offset invalidation. Results
/// are returned in the caller's order.
pub fn apply_batch(
    content: &str,
    edits: Vec<Edit>,
) -> Result<(String, Vec<EditResult>), EditError> {
    if edits.is_empty() {
        return Ok((content.to_string(), Vec::new()));
    }

    for edit in &edits {
        edit.validate(content)?;
    }

    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by(|&a, &b| {
        edits[b]
            .byte_start
            .cmp(&edits[a].byte_start)
            .then(edits[b].byte_end.cmp(&edits[a].byte_end))
    });

    // Sorted descending: an earlier-positioned edit must end before the later one starts.
    // Two insertions at the same offset would be ambiguous, so they overlap too.
    for window in order.windows(2) {
        let (later, earlier) = (&edits[window[0]], &edits[window[1]]);
        let same_point = earlier.byte_start == later.byte_start;
        if earlier.byte_end > later.byte_start || same_point {
            return Err(EditError::Overlap {
                byte_start: earlier.byte_start,
                byte_end: later.byte_end.max(earlier.byte_end),
            });
        }
    }

    let mut new_content = content.to_string();
    let mut results = vec![EditResult::AlreadyApplied; edits.len()];

    for idx in order {
        let edit = &edits[idx];
        if new_content[edit.byte_start..edit.byte_end] == edit.new_text {
            continue;
        }
        new_content.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
        results[idx] = EditResult::Applied {
            bytes_changed: edit.new_text.len(),
        };
    }

    Ok((new_content, results))
}
