//! Aggregation over container values
//!
//! An `Aggregate` describes metrics (count, sum, avg, min, max) computed
//! over the elements of an array or the member values of an object, with
//! optional grouping. Each metric is registered under a caller-chosen alias;
//! results come back as a sorted map from alias to a tagged [`AggValue`],
//! and grouped runs nest one such metric map per group.
//!
//! Numeric readings are loose in the same way queries are: JSON numbers and
//! strings that parse fully as finite floats both contribute. A sum stays
//! integral only while every contributor is an integer-formed JSON number.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::index::ValueKind;
use crate::node::Node;

/// One aggregation result.
#[derive(Debug, Clone, PartialEq)]
pub enum AggValue {
    Int(i64),
    Float(f64),
    Str(String),
    Group(BTreeMap<String, AggValue>),
}

impl AggValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AggValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric reading; integers widen to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AggValue::Int(v) => Some(*v as f64),
            AggValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AggValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&BTreeMap<String, AggValue>> {
        match self {
            AggValue::Group(map) => Some(map),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Metric {
    Count { alias: String },
    Sum { path: String, alias: String },
    Avg { path: String, alias: String },
    Min { path: String, alias: String },
    Max { path: String, alias: String },
}

/// Reusable aggregation description, applied to a container node.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    metrics: Vec<Metric>,
    group_by: Vec<String>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count candidates under `alias`. Always yields an [`AggValue::Int`].
    #[must_use]
    pub fn count(mut self, alias: impl Into<String>) -> Self {
        self.metrics.push(Metric::Count {
            alias: alias.into(),
        });
        self
    }

    /// Sum the numeric readings at `path` under `alias`. Zero contributors
    /// sum to `Int(0)`.
    #[must_use]
    pub fn sum(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.metrics.push(Metric::Sum {
            path: path.into(),
            alias: alias.into(),
        });
        self
    }

    /// Mean of the numeric readings at `path` under `alias`. Omitted from
    /// the result when nothing contributes.
    #[must_use]
    pub fn avg(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.metrics.push(Metric::Avg {
            path: path.into(),
            alias: alias.into(),
        });
        self
    }

    /// Smallest value at `path` under `alias`. Numeric when any candidate
    /// reads as a number, otherwise the lexically smallest scalar text;
    /// omitted when neither exists.
    #[must_use]
    pub fn min(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.metrics.push(Metric::Min {
            path: path.into(),
            alias: alias.into(),
        });
        self
    }

    /// Largest value at `path` under `alias`, with the same fallback rules
    /// as [`Self::min`].
    #[must_use]
    pub fn max(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.metrics.push(Metric::Max {
            path: path.into(),
            alias: alias.into(),
        });
        self
    }

    /// Group candidates by the value at `path` before computing metrics.
    /// Repeated calls compose a compound key joined with `|`; candidates
    /// missing the field group under the empty string.
    #[must_use]
    pub fn group_by(mut self, path: impl Into<String>) -> Self {
        self.group_by.push(path.into());
        self
    }

    /// Run the aggregation. Grouped runs return one [`AggValue::Group`] per
    /// distinct key, sorted; ungrouped runs return the metric map directly.
    pub fn execute(&self, node: Node<'_>) -> BTreeMap<String, AggValue> {
        let candidates: Vec<Node<'_>> = match node.kind() {
            ValueKind::Array => node.elements().collect(),
            ValueKind::Object => node.members().map(|(_, value)| value).collect(),
            _ => Vec::new(),
        };

        if self.group_by.is_empty() {
            let result = self.compute(&candidates);
            tracing::trace!(candidates = candidates.len(), "aggregation executed");
            return result;
        }

        let mut groups: BTreeMap<String, Vec<Node<'_>>> = BTreeMap::new();
        for &candidate in &candidates {
            groups
                .entry(self.group_key(candidate))
                .or_default()
                .push(candidate);
        }
        tracing::trace!(
            candidates = candidates.len(),
            groups = groups.len(),
            "aggregation executed"
        );
        groups
            .into_iter()
            .map(|(key, members)| (key, AggValue::Group(self.compute(&members))))
            .collect()
    }

    fn group_key(&self, candidate: Node<'_>) -> String {
        let parts: Vec<String> = self
            .group_by
            .iter()
            .map(|path| {
                candidate
                    .path(path)
                    .string_form()
                    .map(Cow::into_owned)
                    .unwrap_or_default()
            })
            .collect();
        parts.join("|")
    }

    fn compute(&self, members: &[Node<'_>]) -> BTreeMap<String, AggValue> {
        let mut out = BTreeMap::new();
        for metric in &self.metrics {
            match metric {
                Metric::Count { alias } => {
                    out.insert(alias.clone(), AggValue::Int(members.len() as i64));
                }
                Metric::Sum { path, alias } => {
                    let mut total = 0.0f64;
                    let mut all_integer = true;
                    for node in members {
                        let target = node.path(path);
                        if let Some(v) = target.numeric_value() {
                            total += v;
                            if !target.is_integer_literal() {
                                all_integer = false;
                            }
                        }
                    }
                    let value = if all_integer {
                        AggValue::Int(total as i64)
                    } else {
                        AggValue::Float(total)
                    };
                    out.insert(alias.clone(), value);
                }
                Metric::Avg { path, alias } => {
                    let mut total = 0.0f64;
                    let mut count = 0u64;
                    for node in members {
                        if let Some(v) = node.path(path).numeric_value() {
                            total += v;
                            count += 1;
                        }
                    }
                    if count > 0 {
                        out.insert(alias.clone(), AggValue::Float(total / count as f64));
                    }
                }
                Metric::Min { path, alias } => {
                    if let Some(value) = extreme(members, path, true) {
                        out.insert(alias.clone(), value);
                    }
                }
                Metric::Max { path, alias } => {
                    if let Some(value) = extreme(members, path, false) {
                        out.insert(alias.clone(), value);
                    }
                }
            }
        }
        out
    }
}

/// Min/max of the values at `path`. Numeric readings win when any exist;
/// otherwise the comparison falls back to lexical scalar text.
fn extreme(members: &[Node<'_>], path: &str, want_smaller: bool) -> Option<AggValue> {
    let mut best: Option<(f64, bool)> = None;
    for node in members {
        let target = node.path(path);
        if let Some(v) = target.numeric_value() {
            let integer = target.is_integer_literal();
            let replace = match best {
                None => true,
                Some((current, _)) => {
                    if want_smaller {
                        v < current
                    } else {
                        v > current
                    }
                }
            };
            if replace {
                best = Some((v, integer));
            }
        }
    }
    if let Some((v, integer)) = best {
        return Some(if integer {
            AggValue::Int(v as i64)
        } else {
            AggValue::Float(v)
        });
    }

    let mut best_text: Option<String> = None;
    for node in members {
        let Some(text) = node.path(path).string_form() else {
            continue;
        };
        let replace = match &best_text {
            None => true,
            Some(current) => {
                if want_smaller {
                    text.as_ref() < current.as_str()
                } else {
                    text.as_ref() > current.as_str()
                }
            }
        };
        if replace {
            best_text = Some(text.into_owned());
        }
    }
    best_text.map(AggValue::Str)
}
