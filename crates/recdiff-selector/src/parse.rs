//! Render and parse the canonical path notation.
//!
//! The notation is compact and round-trips exactly:
//!
//! - `.name` — a field whose name is a plain identifier
//! - `['odd key']` — any other field name, single-quoted, with `\'` and
//!   `\\` escapes
//! - `[3]` — a collection index
//! - `[*]` — a wildcard
//!
//! The empty string denotes the root selector. Selector-set notation wraps
//! alternatives in parentheses separated by `|`, e.g. `(.a.b|.a.d|.c)`.

use crate::error::{Result, SelectorError};
use crate::selector::Step;

/// `true` when a field name renders as `.name` rather than `['name']`.
fn is_plain_field(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render one step.
pub fn render_step(step: &Step) -> String {
    let mut out = String::new();
    push_step(&mut out, step);
    out
}

/// Render a step sequence.
pub fn render_steps(steps: &[Step]) -> String {
    let mut out = String::new();
    for step in steps {
        push_step(&mut out, step);
    }
    out
}

fn push_step(out: &mut String, step: &Step) {
    match step {
        Step::Field(name) if is_plain_field(name) => {
            out.push('.');
            out.push_str(name);
        }
        Step::Field(name) => {
            out.push_str("['");
            for c in name.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '\'' => out.push_str("\\'"),
                    c => out.push(c),
                }
            }
            out.push_str("']");
        }
        Step::Index(i) => {
            out.push('[');
            out.push_str(&i.to_string());
            out.push(']');
        }
        Step::Wildcard => out.push_str("[*]"),
    }
}

/// A token of the selector-set notation: a path step or a branch control.
pub(crate) enum Token {
    Step(Step),
    Open,
    Alt,
    Close,
}

pub(crate) struct Scanner<'s> {
    input: &'s str,
    bytes: &'s [u8],
    pos: usize,
    /// Whether `(`, `|`, `)` are recognized (selector-set notation).
    branches: bool,
}

impl<'s> Scanner<'s> {
    pub(crate) fn new(input: &'s str, branches: bool) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            branches,
        }
    }

    fn error(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError::Parse {
            input: self.input.to_string(),
            pos: self.pos,
            reason: reason.into(),
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Option<Token>> {
        let Some(&b) = self.bytes.get(self.pos) else {
            return Ok(None);
        };
        match b {
            b'.' => {
                self.pos += 1;
                let start = self.pos;
                while self
                    .bytes
                    .get(self.pos)
                    .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_')
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.error("expected a field name after '.'"));
                }
                Ok(Some(Token::Step(Step::Field(
                    self.input[start..self.pos].to_string(),
                ))))
            }
            b'[' => {
                self.pos += 1;
                let step = self.bracketed()?;
                match self.bytes.get(self.pos) {
                    Some(b']') => {
                        self.pos += 1;
                        Ok(Some(Token::Step(step)))
                    }
                    _ => Err(self.error("expected ']'")),
                }
            }
            b'(' if self.branches => {
                self.pos += 1;
                Ok(Some(Token::Open))
            }
            b'|' if self.branches => {
                self.pos += 1;
                Ok(Some(Token::Alt))
            }
            b')' if self.branches => {
                self.pos += 1;
                Ok(Some(Token::Close))
            }
            _ => Err(self.error("expected '.', '[', or end of input")),
        }
    }

    fn bracketed(&mut self) -> Result<Step> {
        match self.bytes.get(self.pos) {
            Some(b'*') => {
                self.pos += 1;
                Ok(Step::Wildcard)
            }
            Some(b'0'..=b'9') => {
                let start = self.pos;
                while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
                    self.pos += 1;
                }
                let index = self.input[start..self.pos]
                    .parse::<usize>()
                    .map_err(|e| self.error(format!("bad index: {e}")))?;
                Ok(Step::Index(index))
            }
            Some(b'\'') => {
                self.pos += 1;
                let mut name = String::new();
                loop {
                    match self.bytes.get(self.pos) {
                        Some(b'\'') => {
                            self.pos += 1;
                            return Ok(Step::Field(name));
                        }
                        Some(b'\\') => {
                            // The backslash is ASCII, so the position after
                            // it is a char boundary; decode a full char so
                            // multi-byte escapes stay intact.
                            self.pos += 1;
                            match self.input[self.pos..].chars().next() {
                                Some(c) => {
                                    name.push(c);
                                    self.pos += c.len_utf8();
                                }
                                None => return Err(self.error("dangling escape")),
                            }
                        }
                        Some(_) => {
                            // Multi-byte characters are copied verbatim.
                            let rest = &self.input[self.pos..];
                            let c = rest.chars().next().ok_or_else(|| {
                                self.error("invalid utf-8 boundary")
                            })?;
                            name.push(c);
                            self.pos += c.len_utf8();
                        }
                        None => return Err(self.error("unterminated quoted key")),
                    }
                }
            }
            _ => Err(self.error("expected an index, '*', or a quoted key")),
        }
    }
}

/// Parse a step sequence (no branch syntax). The empty string is the root.
pub fn parse_steps(input: &str) -> Result<Vec<Step>> {
    let mut scanner = Scanner::new(input, false);
    let mut steps = Vec::new();
    while let Some(token) = scanner.next_token()? {
        match token {
            Token::Step(step) => steps.push(step),
            // Unreachable with branches disabled.
            _ => unreachable!("branch token outside set notation"),
        }
    }
    Ok(steps)
}

/// Parse selector-set notation into the selectors it contains.
///
/// Follows the shape produced by [`crate::SelectorSet`]'s `Display`: a
/// single path, or parenthesized alternatives joined by `|`, nested
/// arbitrarily (`(.a(.b|.d)|.c)` is accepted as well as `(.a.b|.a.d|.c)`).
pub fn parse_set_paths(input: &str) -> Result<Vec<Vec<Step>>> {
    let mut scanner = Scanner::new(input, true);
    let mut done = Vec::new();
    let mut current: Vec<Step> = Vec::new();
    let mut stack: Vec<Vec<Step>> = Vec::new();
    let mut just_closed = false;
    while let Some(token) = scanner.next_token()? {
        match token {
            Token::Step(step) => {
                current.push(step);
                just_closed = false;
            }
            Token::Open => {
                stack.push(current.clone());
                just_closed = false;
            }
            Token::Alt => {
                if !just_closed && !current.is_empty() {
                    done.push(current);
                }
                current = stack.last().cloned().unwrap_or_default();
                just_closed = false;
            }
            Token::Close => {
                if !just_closed && !current.is_empty() {
                    done.push(current.clone());
                }
                current = stack.pop().ok_or_else(|| SelectorError::Parse {
                    input: input.to_string(),
                    pos: input.len(),
                    reason: "unbalanced ')'".to_string(),
                })?;
                just_closed = true;
            }
        }
    }
    if !stack.is_empty() {
        return Err(SelectorError::Parse {
            input: input.to_string(),
            pos: input.len(),
            reason: "unbalanced '('".to_string(),
        });
    }
    if !just_closed && !current.is_empty() {
        done.push(current);
    }
    Ok(done)
}
