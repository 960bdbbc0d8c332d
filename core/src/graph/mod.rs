pub mod serialization;

use crate::types::AttrValue;
use std::collections::{BTreeMap, HashMap};

/// A node of the network, identified by the canonical raw identifier
/// first seen for the entity it represents.
///
/// Attributes are fixed when the node is built: a node encountered
/// again through an alias is returned as-is and never re-attributed.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    attributes: BTreeMap<String, AttrValue>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Node {
        Node {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.attributes.iter()
    }
}

/// A directed edge between two nodes, referenced by their identities.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: String,
    source: String,
    target: String,
    attributes: BTreeMap<String, AttrValue>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Edge {
        Edge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.attributes.iter()
    }
}

/// Attributed-graph container. Owns all nodes and edges in insertion
/// order and offers lookup by node identity, nothing more.
#[derive(Debug, Default)]
pub struct Graph {
    title: String,
    attributes: BTreeMap<String, AttrValue>,
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new(title: impl Into<String>) -> Graph {
        Graph {
            title: title.into(),
            ..Graph::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.attributes.iter()
    }

    pub fn add_node(&mut self, node: Node) {
        self.node_index.insert(node.id().to_string(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|i| &self.nodes[*i])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
