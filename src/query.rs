//! Query engine over container values
//!
//! A `Query` is a reusable description of filters, ordering, and pagination.
//! Candidates are the elements of an array or the member values of an
//! object; every filter compares a dotted path inside each candidate against
//! a literal operand. A candidate whose filter path is absent fails that
//! filter, negated forms included.
//!
//! Comparison is numeric when both sides read as numbers (JSON numbers, or
//! strings that parse fully as finite floats) and lexical otherwise.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::index::ValueKind;
use crate::node::Node;

/// Comparison operator for [`Query::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Cmp {
    fn eval(self, ordering: Ordering) -> bool {
        match self {
            Cmp::Eq => ordering == Ordering::Equal,
            Cmp::Ne => ordering != Ordering::Equal,
            Cmp::Gt => ordering == Ordering::Greater,
            Cmp::Ge => ordering != Ordering::Less,
            Cmp::Lt => ordering == Ordering::Less,
            Cmp::Le => ordering != Ordering::Greater,
        }
    }
}

impl FromStr for Cmp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "=" | "==" => Cmp::Eq,
            "!=" => Cmp::Ne,
            ">" => Cmp::Gt,
            ">=" => Cmp::Ge,
            "<" => Cmp::Lt,
            "<=" => Cmp::Le,
            _ => return Err(Error::validation(format!("unknown comparison operator {s:?}"))),
        })
    }
}

/// Sort direction for [`Query::sort_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Order {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("asc") || s.eq_ignore_ascii_case("ascending") {
            Ok(Order::Asc)
        } else if s.eq_ignore_ascii_case("desc") || s.eq_ignore_ascii_case("descending") {
            Ok(Order::Desc)
        } else {
            Err(Error::validation(format!("unknown sort order {s:?}")))
        }
    }
}

/// Literal a candidate field is compared against.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Operand {
    fn numeric_value(&self) -> Option<f64> {
        match self {
            Operand::Number(v) if v.is_finite() => Some(*v),
            Operand::Str(s) => s.parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    fn text(&self) -> Cow<'_, str> {
        match self {
            Operand::Number(v) => Cow::Owned(v.to_string()),
            Operand::Str(s) => Cow::Borrowed(s),
            Operand::Bool(true) => Cow::Borrowed("true"),
            Operand::Bool(false) => Cow::Borrowed("false"),
            Operand::Null => Cow::Borrowed("null"),
        }
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Number(v as f64)
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Number(v as f64)
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Number(v)
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Str(v.to_string())
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Operand::Str(v)
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Bool(v)
    }
}

/// Compare a resolved field against an operand. `None` means the two are
/// not comparable (the node is a container or absent), which fails every
/// operator.
fn compare_node(node: Node<'_>, operand: &Operand) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (node.numeric_value(), operand.numeric_value()) {
        return a.partial_cmp(&b);
    }
    let text = node.string_form()?;
    Some(text.as_ref().cmp(operand.text().as_ref()))
}

#[derive(Debug, Clone)]
enum Predicate {
    Compare {
        path: String,
        op: Cmp,
        operand: Operand,
    },
    In {
        path: String,
        operands: Vec<Operand>,
        negate: bool,
    },
    Contains {
        path: String,
        operand: Operand,
    },
}

impl Predicate {
    fn matches(&self, candidate: Node<'_>) -> bool {
        match self {
            Predicate::Compare { path, op, operand } => {
                let target = candidate.path(path);
                if !target.exists() {
                    return false;
                }
                compare_node(target, operand).is_some_and(|ordering| op.eval(ordering))
            }
            Predicate::In {
                path,
                operands,
                negate,
            } => {
                let target = candidate.path(path);
                if !target.exists() {
                    return false;
                }
                let found = operands
                    .iter()
                    .any(|operand| compare_node(target, operand) == Some(Ordering::Equal));
                if *negate {
                    !found
                } else {
                    found
                }
            }
            Predicate::Contains { path, operand } => {
                let target = candidate.path(path);
                match target.kind() {
                    ValueKind::String => match target.as_str() {
                        Ok(text) => text.contains(operand.text().as_ref()),
                        Err(_) => false,
                    },
                    ValueKind::Array => target
                        .elements()
                        .any(|element| compare_node(element, operand) == Some(Ordering::Equal)),
                    _ => false,
                }
            }
        }
    }
}

/// Sort comparator. Numbers order before text so ties between mixed kinds
/// still form a total order; absent keys and containers sort as empty text.
fn sort_key_cmp(a: Node<'_>, b: Node<'_>) -> Ordering {
    match (a.numeric_value(), b.numeric_value()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            let ax = a.string_form().unwrap_or(Cow::Borrowed(""));
            let bx = b.string_form().unwrap_or(Cow::Borrowed(""));
            ax.as_ref().cmp(bx.as_ref())
        }
    }
}

/// Reusable filter/sort/paginate description, applied to a container node.
#[derive(Debug, Clone, Default)]
pub struct Query {
    predicates: Vec<Predicate>,
    sort: Option<(String, Order)>,
    offset: usize,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep candidates whose `path` compares against `operand` under `op`.
    #[must_use]
    pub fn filter(mut self, path: impl Into<String>, op: Cmp, operand: impl Into<Operand>) -> Self {
        self.predicates.push(Predicate::Compare {
            path: path.into(),
            op,
            operand: operand.into(),
        });
        self
    }

    /// Keep candidates whose `path` equals one of `operands`.
    #[must_use]
    pub fn filter_in<O>(mut self, path: impl Into<String>, operands: impl IntoIterator<Item = O>) -> Self
    where
        O: Into<Operand>,
    {
        self.predicates.push(Predicate::In {
            path: path.into(),
            operands: operands.into_iter().map(Into::into).collect(),
            negate: false,
        });
        self
    }

    /// Keep candidates whose `path` exists and equals none of `operands`.
    #[must_use]
    pub fn filter_not_in<O>(
        mut self,
        path: impl Into<String>,
        operands: impl IntoIterator<Item = O>,
    ) -> Self
    where
        O: Into<Operand>,
    {
        self.predicates.push(Predicate::In {
            path: path.into(),
            operands: operands.into_iter().map(Into::into).collect(),
            negate: true,
        });
        self
    }

    /// Keep candidates whose `path` is a string containing `operand` as a
    /// substring, or an array with an equal element.
    #[must_use]
    pub fn filter_contains(mut self, path: impl Into<String>, operand: impl Into<Operand>) -> Self {
        self.predicates.push(Predicate::Contains {
            path: path.into(),
            operand: operand.into(),
        });
        self
    }

    /// Order results by the value at `path`. The sort is stable, so ties
    /// keep document order. A later call replaces an earlier key.
    #[must_use]
    pub fn sort_by(mut self, path: impl Into<String>, order: Order) -> Self {
        self.sort = Some((path.into(), order));
        self
    }

    /// Keep at most `n` results, applied after sorting and offset.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skip the first `n` results, applied after sorting.
    #[must_use]
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    /// Run the query and collect the matching nodes.
    pub fn to_vec<'a>(&self, node: Node<'a>) -> Vec<Node<'a>> {
        self.selected(node)
    }

    /// Number of results after filtering and pagination.
    pub fn count(&self, node: Node<'_>) -> usize {
        self.selected(node).len()
    }

    /// First result, or a not-found error when nothing matches.
    pub fn first<'a>(&self, node: Node<'a>) -> Result<Node<'a>> {
        self.selected(node)
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("query matched no values"))
    }

    fn selected<'a>(&self, node: Node<'a>) -> Vec<Node<'a>> {
        let candidates: Vec<Node<'a>> = match node.kind() {
            ValueKind::Array => node.elements().collect(),
            ValueKind::Object => node.members().map(|(_, value)| value).collect(),
            _ => Vec::new(),
        };
        let total = candidates.len();

        let mut rows: Vec<Node<'a>> = candidates
            .into_iter()
            .filter(|candidate| self.predicates.iter().all(|p| p.matches(*candidate)))
            .collect();

        if let Some((path, order)) = &self.sort {
            rows.sort_by(|a, b| {
                let ordering = sort_key_cmp(a.path(path), b.path(path));
                match order {
                    Order::Asc => ordering,
                    Order::Desc => ordering.reverse(),
                }
            });
        }

        tracing::trace!(total, matched = rows.len(), "query evaluated");

        let iter = rows.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}
