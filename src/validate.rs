//! Declarative validation
//!
//! A `Validator` binds dotted paths to rules and interprets them against a
//! node. Every rule runs; `validate` returns the full list of failures
//! instead of stopping at the first one. Only [`Rule::Required`] cares about
//! absent fields; the other rules skip fields that are not there.

use regex::Regex;

use crate::error::{Error, Result};
use crate::index::ValueKind;
use crate::node::Node;

/// One validation check.
#[derive(Debug, Clone)]
pub enum Rule {
    /// The field must exist.
    Required,
    /// String content must match the pattern.
    Pattern(Regex),
    /// Numeric reading must sit inside the closed range.
    Range { min: Option<f64>, max: Option<f64> },
    /// Bounds on string character count or container child count.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
}

impl Rule {
    /// Compile a pattern rule. A malformed pattern is a validation error.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Rule::Pattern)
            .map_err(|err| Error::validation(format!("invalid pattern: {err}")))
    }

    pub fn range(min: impl Into<Option<f64>>, max: impl Into<Option<f64>>) -> Self {
        Rule::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn length(min: impl Into<Option<usize>>, max: impl Into<Option<usize>>) -> Self {
        Rule::Length {
            min: min.into(),
            max: max.into(),
        }
    }
}

/// Set of path-bound rules, applied together.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rules: Vec<(String, Rule)>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for the field at `path`.
    #[must_use]
    pub fn rule(mut self, path: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((path.into(), rule));
        self
    }

    /// Run every rule against `node`, collecting all failures in rule
    /// order. Each failure names its field in the error context.
    pub fn validate(&self, node: Node<'_>) -> Vec<Error> {
        let mut failures = Vec::new();
        for (path, rule) in &self.rules {
            let target = node.path(path);
            if let Some(error) = check(target, rule) {
                failures.push(error.with_context(format!("field {path:?}")));
            }
        }
        tracing::debug!(
            rules = self.rules.len(),
            failures = failures.len(),
            "validation run"
        );
        failures
    }

    /// True when every rule passes.
    pub fn is_valid(&self, node: Node<'_>) -> bool {
        self.validate(node).is_empty()
    }
}

fn check(target: Node<'_>, rule: &Rule) -> Option<Error> {
    match rule {
        Rule::Required => {
            if target.exists() {
                None
            } else {
                Some(Error::validation("required field is missing"))
            }
        }
        Rule::Pattern(regex) => {
            if !target.exists() {
                return None;
            }
            match target.as_str() {
                Ok(text) => {
                    if regex.is_match(&text) {
                        None
                    } else {
                        Some(Error::validation(format!(
                            "value does not match pattern {:?}",
                            regex.as_str()
                        )))
                    }
                }
                Err(_) => Some(Error::validation("pattern rule applies to strings only")),
            }
        }
        Rule::Range { min, max } => {
            if !target.exists() {
                return None;
            }
            let Some(value) = target.numeric_value() else {
                return Some(Error::validation("range rule applies to numeric values"));
            };
            if let Some(m) = min {
                if value < *m {
                    return Some(Error::validation(format!(
                        "value {value} is below minimum {m}"
                    )));
                }
            }
            if let Some(m) = max {
                if value > *m {
                    return Some(Error::validation(format!(
                        "value {value} is above maximum {m}"
                    )));
                }
            }
            None
        }
        Rule::Length { min, max } => {
            if !target.exists() {
                return None;
            }
            let length = match target.kind() {
                ValueKind::String => target
                    .as_str()
                    .map(|text| text.chars().count())
                    .unwrap_or(0),
                ValueKind::Array | ValueKind::Object => target.len(),
                _ => {
                    return Some(Error::validation(
                        "length rule applies to strings and containers",
                    ))
                }
            };
            if let Some(m) = min {
                if length < *m {
                    return Some(Error::validation(format!(
                        "length {length} is below minimum {m}"
                    )));
                }
            }
            if let Some(m) = max {
                if length > *m {
                    return Some(Error::validation(format!(
                        "length {length} is above maximum {m}"
                    )));
                }
            }
            None
        }
    }
}
