//! Span location in JavaScript source text.
//!
//! Nothing here parses JavaScript. Each locator recognizes one narrow shape
//! (a conditional chain, a literal marker, a regex) and turns it into
//! [`Edit`](crate::edit::Edit)s against the buffer it was given.

pub mod anchor;
pub mod chain;
pub mod errors;
pub mod pattern;

pub use anchor::AnchorMatch;
pub use chain::{find_chains, find_exact_chains, Clause, ConditionalChain};
pub use errors::PatternError;
