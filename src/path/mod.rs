//! Dotted path resolution
//!
//! Paths are dot-separated segments. A digits-only segment indexes an array;
//! against an object the same segment falls back to a literal key lookup, so
//! `"items.0"` works for both `{"items": [..]}` and `{"items": {"0": ..}}`.

pub mod cache;

use crate::index::ValueKind;
use crate::node::Node;

enum Segment<'p> {
    Key(&'p str),
    Index(usize),
}

fn classify(segment: &str) -> Segment<'_> {
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        // Digit runs too long for usize stay key lookups
        if let Ok(index) = segment.parse::<usize>() {
            return Segment::Index(index);
        }
    }
    Segment::Key(segment)
}

/// Resolve `path` relative to `node`. An empty path is the node itself;
/// resolution stops early once a step comes up absent.
pub(crate) fn resolve<'a>(node: Node<'a>, path: &str) -> Node<'a> {
    if path.is_empty() {
        return node;
    }
    let mut current = node;
    for segment in path.split('.') {
        if !current.exists() {
            break;
        }
        current = match classify(segment) {
            Segment::Index(index) if current.kind() == ValueKind::Array => current.at(index),
            _ => current.get(segment),
        };
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc(input: &str) -> Document {
        Document::parse(input).unwrap()
    }

    #[test]
    fn test_path_mixed_segments() {
        let doc = doc("{\"a\": {\"b\": [1, 2, 3]}}");
        assert_eq!(doc.path("a.b.1").as_i64().unwrap(), 2);
        assert_eq!(doc.path("a.b.0").as_i64().unwrap(), 1);
    }

    #[test]
    fn test_path_empty_is_self() {
        let doc = doc("{\"a\": 1}");
        assert_eq!(doc.path(""), doc.root());
    }

    #[test]
    fn test_path_digits_as_object_key() {
        let doc = doc("{\"0\": \"zero\", \"items\": {\"0\": 5}}");
        assert_eq!(doc.path("0").str_or(""), "zero");
        assert_eq!(doc.path("items.0").as_i64().unwrap(), 5);
    }

    #[test]
    fn test_path_missing_is_absent() {
        let doc = doc("{\"a\": {\"b\": 1}}");
        assert!(!doc.path("a.c").exists());
        assert!(!doc.path("x.y.z").exists());
    }

    #[test]
    fn test_path_index_out_of_range() {
        let doc = doc("{\"a\": [1]}");
        assert!(!doc.path("a.5").exists());
    }

    #[test]
    fn test_path_through_scalar_is_absent() {
        let doc = doc("{\"a\": 5}");
        assert!(!doc.path("a.b").exists());
        assert!(!doc.path("a.0").exists());
    }

    #[test]
    fn test_path_empty_segment_is_empty_key() {
        let doc = doc("{\"\": {\"x\": 1}}");
        assert_eq!(doc.path(".x").as_i64().unwrap(), 1);
    }

    #[test]
    fn test_path_huge_digit_run_is_key() {
        let doc = doc("{\"99999999999999999999999999\": true}");
        assert!(doc.path("99999999999999999999999999").bool_or(false));
    }

    #[test]
    fn test_path_relative_to_node() {
        let doc = doc("{\"a\": {\"b\": {\"c\": 3}}}");
        let a = doc.path("a");
        assert_eq!(a.path("b.c").as_i64().unwrap(), 3);
    }
}
