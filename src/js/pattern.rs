use crate::cache::get_or_compile_regex;
use crate::edit::Edit;
use crate::js::errors::PatternError;
use regex::Regex;

/// Compile a pattern through the cache, rejecting patterns that can match
/// the empty string (they would splice text at every offset).
pub fn compile(pattern: &str) -> Result<Regex, PatternError> {
    let regex = get_or_compile_regex(pattern).map_err(|e| PatternError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    if regex.is_match("") {
        return Err(PatternError::MatchesEmpty {
            pattern: pattern.to_string(),
        });
    }
    Ok(regex)
}

/// Keep every match verbatim and append `text` right after it.
pub fn append_after(source: &str, regex: &Regex, text: &str) -> Vec<Edit> {
    regex
        .find_iter(source)
        .map(|m| {
            Edit::new(
                m.start(),
                m.end(),
                format!("{}{}", m.as_str(), text),
                m.as_str(),
            )
        })
        .collect()
}

/// Replace every match with `template`, expanding `$1`/`${name}` references.
pub fn replace(source: &str, regex: &Regex, template: &str) -> Vec<Edit> {
    regex
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let mut expanded = String::new();
            caps.expand(template, &mut expanded);
            Some(Edit::new(whole.start(), whole.end(), expanded, whole.as_str()))
        })
        .collect()
}

/// Replace every exact occurrence of `search` with `text`.
pub fn replace_literal(source: &str, search: &str, text: &str) -> Vec<Edit> {
    if search.is_empty() {
        return Vec::new();
    }
    source
        .match_indices(search)
        .map(|(start, found)| Edit::new(start, start + found.len(), text, found))
        .collect()
}
