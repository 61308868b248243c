//! Directed edge tables

use fedreg_core::Uid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized form of a single edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge<P> {
    /// Source node uid
    pub source: Uid,
    /// Target node uid
    pub target: Uid,
    /// Edge properties
    pub props: P,
}

/// Edges of one relationship type, from a source node kind to a target node kind
///
/// Edges are keyed by `(source, target)` so a pair is connected at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Vec<Edge<P>>",
    into = "Vec<Edge<P>>",
    bound(
        serialize = "P: Serialize + Clone",
        deserialize = "P: Deserialize<'de>"
    )
)]
pub struct Relation<P = ()> {
    edges: BTreeMap<(Uid, Uid), P>,
}

impl<P> Default for Relation<P> {
    fn default() -> Self {
        Self {
            edges: BTreeMap::new(),
        }
    }
}

impl<P> From<Vec<Edge<P>>> for Relation<P> {
    fn from(edges: Vec<Edge<P>>) -> Self {
        Self {
            edges: edges
                .into_iter()
                .map(|e| ((e.source, e.target), e.props))
                .collect(),
        }
    }
}

impl<P> From<Relation<P>> for Vec<Edge<P>> {
    fn from(relation: Relation<P>) -> Self {
        relation
            .edges
            .into_iter()
            .map(|((source, target), props)| Edge {
                source,
                target,
                props,
            })
            .collect()
    }
}

impl<P: Default> Relation<P> {
    /// Connect two nodes with default properties
    pub fn connect(&mut self, source: &str, target: &str) -> bool {
        self.connect_with(source, target, P::default())
    }
}

impl<P> Relation<P> {
    /// Connect two nodes, replacing the properties of an existing edge.
    /// Returns `true` if the edge did not exist.
    pub fn connect_with(&mut self, source: &str, target: &str, props: P) -> bool {
        self.edges
            .insert((source.to_string(), target.to_string()), props)
            .is_none()
    }

    /// Remove the edge between two nodes. Returns `true` if it existed.
    pub fn disconnect(&mut self, source: &str, target: &str) -> bool {
        self.edges
            .remove(&(source.to_string(), target.to_string()))
            .is_some()
    }

    /// Check whether two nodes are connected
    pub fn is_connected(&self, source: &str, target: &str) -> bool {
        self.edges
            .contains_key(&(source.to_string(), target.to_string()))
    }

    /// Properties of the edge between two nodes
    pub fn props(&self, source: &str, target: &str) -> Option<&P> {
        self.edges.get(&(source.to_string(), target.to_string()))
    }

    /// Mutable properties of the edge between two nodes
    pub fn props_mut(&mut self, source: &str, target: &str) -> Option<&mut P> {
        self.edges
            .get_mut(&(source.to_string(), target.to_string()))
    }

    /// Nodes reached from `source`
    pub fn targets(&self, source: &str) -> Vec<Uid> {
        self.edges
            .range((source.to_string(), Uid::new())..)
            .take_while(|((s, _), _)| s == source)
            .map(|((_, t), _)| t.clone())
            .collect()
    }

    /// Nodes pointing to `target`
    pub fn sources(&self, target: &str) -> Vec<Uid> {
        self.edges
            .keys()
            .filter(|(_, t)| t == target)
            .map(|(s, _)| s.clone())
            .collect()
    }

    /// First node reached from `source`, for to-one relationships
    pub fn single_target(&self, source: &str) -> Option<Uid> {
        self.targets(source).into_iter().next()
    }

    /// First node pointing to `target`, for one-to-many relationships
    pub fn single_source(&self, target: &str) -> Option<Uid> {
        self.sources(target).into_iter().next()
    }

    /// Remove every edge touching `uid`. Returns the number of removed edges.
    pub fn detach(&mut self, uid: &str) -> usize {
        let before = self.edges.len();
        self.edges.retain(|(s, t), _| s != uid && t != uid);
        before - self.edges.len()
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if there are no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_and_sources() {
        let mut rel: Relation = Relation::default();
        assert!(rel.connect("a", "x"));
        assert!(rel.connect("a", "y"));
        assert!(rel.connect("b", "x"));
        assert!(!rel.connect("a", "x"));

        assert_eq!(rel.targets("a"), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(rel.sources("x"), vec!["a".to_string(), "b".to_string()]);
        assert!(rel.targets("ab").is_empty());
        assert_eq!(rel.single_target("b"), Some("x".to_string()));
    }

    #[test]
    fn test_detach_removes_both_directions() {
        let mut rel: Relation = Relation::default();
        rel.connect("a", "x");
        rel.connect("x", "b");
        rel.connect("c", "d");

        assert_eq!(rel.detach("x"), 2);
        assert_eq!(rel.len(), 1);
        assert!(rel.is_connected("c", "d"));
    }

    #[test]
    fn test_props_serialize_as_edge_list() {
        let mut rel: Relation<String> = Relation::default();
        rel.connect_with("p", "i", "oidc".to_string());

        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json[0]["source"], "p");
        assert_eq!(json[0]["props"], "oidc");

        let back: Relation<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back.props("p", "i").map(String::as_str), Some("oidc"));
    }
}
