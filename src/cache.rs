//! Thread-local compilation cache for regex patterns.
//!
//! The same pattern is compiled once during config validation and again when
//! the engine runs; the cache makes the second compile free.
//! Cache is capped at 256 entries; all entries are evicted when full.

use regex::{Regex, RegexBuilder};
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

/// Compiled programs above this size are rejected.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

thread_local! {
    static REGEX_CACHE: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
}

/// Get a compiled regex from cache, or compile and cache it.
pub fn get_or_compile_regex(pattern: &str) -> Result<Regex, regex::Error> {
    REGEX_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(re) = cache.get(pattern) {
            return Ok(re.clone());
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = RegexBuilder::new(pattern)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()?;
        cache.insert(pattern.to_string(), compiled.clone());
        Ok(compiled)
    })
}

/// Clear the regex cache (mainly for testing).
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}
