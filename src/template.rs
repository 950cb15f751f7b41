//! Minimal `{placeholder}` templates for ledger entries.
//!
//! `{{` and `}}` produce literal braces. Placeholder names are checked once
//! against the set of fields a run can supply, so a typo fails before any
//! record is written.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(LedgerError::Template(format!(
                                    "unclosed placeholder '{{{name}'"
                                )))
                            }
                        }
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() {
                        return Err(LedgerError::Template("empty placeholder '{}'".to_string()));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name));
                }
                '}' => return Err(LedgerError::Template("unmatched '}'".to_string())),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn uses(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// Reject placeholders outside `known`.
    pub fn validate(&self, known: &BTreeSet<String>) -> Result<()> {
        let unknown: Vec<&str> = self.placeholders().filter(|p| !known.contains(*p)).collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Template(format!(
                "unknown placeholder(s): {}",
                unknown.join(", ")
            )))
        }
    }

    pub fn render(&self, values: &BTreeMap<String, String>) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| LedgerError::Template(format!("no value for '{{{name}}}'")))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}
