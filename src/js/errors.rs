use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("invalid regex pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("regex pattern {pattern:?} matches the empty string")]
    MatchesEmpty { pattern: String },
}
