//! Parallel batch helpers
//!
//! Rayon-backed resolution of many paths against one document, and parallel
//! mapping over array elements. Documents are immutable, so shared
//! references cross threads freely.

use rayon::prelude::*;

use crate::document::Document;
use crate::node::Node;

/// Resolve many paths against one document in parallel. Results come back
/// in input order, absent nodes included.
pub fn resolve_many<'a>(doc: &'a Document, paths: &[&str]) -> Vec<Node<'a>> {
    paths.par_iter().map(|path| doc.path(path)).collect()
}

/// Map every element of an array in parallel, preserving element order.
/// Any other kind yields an empty vector.
pub fn map_elements<'a, F, T>(node: Node<'a>, mapper: F) -> Vec<T>
where
    F: Fn(Node<'a>) -> T + Sync + Send,
    T: Send,
{
    let elements: Vec<Node<'a>> = node.elements().collect();
    elements.par_iter().map(|&element| mapper(element)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_resolve_many_keeps_input_order() {
        let doc = Document::parse("{\"a\": 1, \"b\": {\"c\": 2}}").unwrap();
        let nodes = resolve_many(&doc, &["a", "b.c", "missing"]);

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].int_or(0), 1);
        assert_eq!(nodes[1].int_or(0), 2);
        assert!(!nodes[2].exists());
    }

    #[test]
    fn test_resolve_many_wide() {
        let body: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let doc = Document::parse(format!("[{}]", body.join(","))).unwrap();

        let paths: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let nodes = resolve_many(&doc, &refs);

        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(node.int_or(-1), i as i64);
        }
    }

    #[test]
    fn test_map_elements() {
        let doc = Document::parse("[1, 2, 3]").unwrap();
        let doubled = map_elements(doc.root(), |n| n.int_or(0) * 2);
        assert_eq!(doubled, vec![2, 4, 6]);
    }

    #[test]
    fn test_map_elements_on_non_array() {
        let doc = Document::parse("{\"a\": 1}").unwrap();
        let out = map_elements(doc.root(), |n| n.int_or(0));
        assert!(out.is_empty());
    }
}
