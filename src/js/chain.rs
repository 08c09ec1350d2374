//! Matcher for `if (<subject> === '<case>') { ... } else if ...` chains.
//!
//! Instead of a free-form regex, chains are recognized by a small cursor
//! parser over a fixed grammar:
//!
//! ```text
//! chain  := clause ( "else" "if" clause )*
//! clause := "if" "(" SUBJECT "===" QUOTED ")" BLOCK
//! ```
//!
//! A chain that continues with any other `else` branch is reported as
//! open (`terminated == false`) so callers can refuse to extend it.

use crate::edit::Edit;

/// One `if (<subject> === '<case>') { ... }` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub case: String,
    /// Byte range of the block contents, excluding braces
    pub body_start: usize,
    pub body_end: usize,
}

/// A located conditional chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalChain {
    /// Offset of the leading `if`
    pub byte_start: usize,
    /// Offset just past the closing brace of the last clause
    pub byte_end: usize,
    /// Whitespace preceding the `if` on its line
    pub indent: String,
    /// Quote character used by the first clause
    pub quote: char,
    pub clauses: Vec<Clause>,
    /// False when the chain is followed by an `else` this grammar does not cover
    pub terminated: bool,
}

impl ConditionalChain {
    pub fn cases(&self) -> Vec<&str> {
        self.clauses.iter().map(|c| c.case.as_str()).collect()
    }

    /// Indentation unit used inside clause bodies, relative to the chain.
    fn body_unit(&self, source: &str) -> String {
        self.clauses
            .first()
            .and_then(|clause| {
                source[clause.body_start..clause.body_end]
                    .lines()
                    .find(|line| !line.trim().is_empty())
            })
            .map(|line| {
                let leading: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                leading
                    .strip_prefix(self.indent.as_str())
                    .map(str::to_string)
                    .unwrap_or(leading)
            })
            .filter(|unit| !unit.is_empty())
            .unwrap_or_else(|| "    ".to_string())
    }

    /// Render `else if` clauses to be inserted right after the chain.
    pub fn render_branches(
        &self,
        source: &str,
        subject: &str,
        branches: &[(String, String)],
    ) -> String {
        let unit = self.body_unit(source);
        let mut out = String::new();
        for (case, body) in branches {
            out.push_str(&format!(
                " else if ({subject} === {q}{case}{q}) {{\n",
                q = self.quote
            ));
            for line in body.trim_matches('\n').lines() {
                if line.trim().is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&format!("{}{}{}\n", self.indent, unit, line));
                }
            }
            out.push_str(&self.indent);
            out.push('}');
        }
        out
    }

    /// Build the insertion edit that extends this chain with `branches`.
    pub fn extend(&self, source: &str, subject: &str, branches: &[(String, String)]) -> Edit {
        Edit::insert(self.byte_end, self.render_branches(source, subject, branches))
    }
}

/// Find every chain over `subject` in `source`, outermost first.
pub fn find_chains(source: &str, subject: &str) -> Vec<ConditionalChain> {
    let mut chains = Vec::new();

    for (idx, _) in source.match_indices("if") {
        if idx > 0 && source[..idx].chars().next_back().is_some_and(is_ident_char) {
            continue;
        }
        // `else if` clauses belong to the chain that started earlier
        if ends_with_keyword(source[..idx].trim_end(), "else") {
            continue;
        }
        let mut cursor = Cursor::new(source, idx);
        if let Some(chain) = cursor.chain(subject) {
            chains.push(chain);
        }
    }

    chains
}

/// Chains over `subject` whose cases are exactly `cases`, in order, and that
/// are not followed by another `else`.
pub fn find_exact_chains(source: &str, subject: &str, cases: &[String]) -> Vec<ConditionalChain> {
    find_chains(source, subject)
        .into_iter()
        .filter(|chain| chain.terminated && chain.cases() == cases)
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn ends_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_suffix(keyword)
        .is_some_and(|head| !head.chars().next_back().is_some_and(is_ident_char))
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, lit: &str) -> bool {
        if self.rest().starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let start = self.pos;
        if self.eat(keyword) && !self.peek().is_some_and(is_ident_char) {
            return true;
        }
        self.pos = start;
        false
    }

    fn quoted(&mut self) -> Option<(char, &'a str)> {
        let quote = self.peek().filter(|c| *c == '\'' || *c == '"')?;
        self.bump();
        let start = self.pos;
        loop {
            match self.bump()? {
                '\\' => {
                    self.bump()?;
                }
                '\n' => return None,
                c if c == quote => return Some((quote, &self.src[start..self.pos - 1])),
                _ => {}
            }
        }
    }

    /// Skip a string or template literal whose opening quote is at the cursor.
    fn skip_literal(&mut self, quote: char) -> Option<()> {
        self.bump();
        loop {
            match self.bump()? {
                '\\' => {
                    self.bump()?;
                }
                c if c == quote => return Some(()),
                _ => {}
            }
        }
    }

    /// Consume a `{ ... }` block and return the byte range of its contents.
    fn block(&mut self) -> Option<(usize, usize)> {
        if !self.eat("{") {
            return None;
        }
        let body_start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' | '`' => {
                    self.skip_literal(c)?;
                    continue;
                }
                '/' if self.rest().starts_with("//") => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                    continue;
                }
                '/' if self.rest().starts_with("/*") => {
                    let end = self.rest().find("*/")?;
                    self.pos += end + 2;
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let body_end = self.pos;
                        self.bump();
                        return Some((body_start, body_end));
                    }
                }
                _ => {}
            }
            self.bump();
        }
        None
    }

    fn clause(&mut self, subject: &str) -> Option<(char, Clause)> {
        if !self.eat_keyword("if") {
            return None;
        }
        self.skip_ws();
        if !self.eat("(") {
            return None;
        }
        self.skip_ws();
        if !self.eat_keyword(subject) {
            return None;
        }
        self.skip_ws();
        if !self.eat("===") {
            return None;
        }
        self.skip_ws();
        let (quote, case) = self.quoted()?;
        self.skip_ws();
        if !self.eat(")") {
            return None;
        }
        self.skip_ws();
        let (body_start, body_end) = self.block()?;
        Some((
            quote,
            Clause {
                case: case.to_string(),
                body_start,
                body_end,
            },
        ))
    }

    fn chain(&mut self, subject: &str) -> Option<ConditionalChain> {
        let byte_start = self.pos;
        let (quote, first) = self.clause(subject)?;
        let mut clauses = vec![first];
        let mut byte_end = self.pos;
        let mut terminated = true;

        loop {
            self.skip_ws();
            if !self.eat_keyword("else") {
                break;
            }
            self.skip_ws();
            match self.clause(subject) {
                Some((_, clause)) => {
                    clauses.push(clause);
                    byte_end = self.pos;
                }
                None => {
                    terminated = false;
                    break;
                }
            }
        }

        let line_start = self.src[..byte_start].rfind('\n').map_or(0, |i| i + 1);
        let prefix = &self.src[line_start..byte_start];
        let indent = if prefix.chars().all(char::is_whitespace) {
            prefix.to_string()
        } else {
            String::new()
        };

        Some(ConditionalChain {
            byte_start,
            byte_end,
            indent,
            quote,
            clauses,
            terminated,
        })
    }
}
