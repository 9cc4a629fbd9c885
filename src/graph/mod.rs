pub mod edge;
pub mod node;

use std::collections::HashMap;

use petgraph::Directed;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use edge::{GraphRelationship, RelationshipId, RelationshipKind};
use node::{GraphNode, NodeId, NodeLabel};

/// The in-memory knowledge graph: a directed petgraph StableGraph with O(1)
/// id-keyed lookup indexes.
///
/// Node and relationship ids are deterministic hashes, so inserts are
/// idempotent: adding a node or relationship whose id already exists replaces
/// the stored value (last writer wins) without growing the graph. Iteration
/// order of [`nodes`](Self::nodes) and [`relationships`](Self::relationships)
/// follows insertion order but is not part of the contract — consumers that
/// need a stable order must sort explicitly.
pub struct KnowledgeGraph {
    graph: StableGraph<GraphNode, GraphRelationship, Directed>,
    /// Maps node ids to their petgraph indices.
    node_index: HashMap<NodeId, NodeIndex>,
    /// Maps relationship ids to their petgraph edge indices.
    edge_index: HashMap<RelationshipId, EdgeIndex>,
}

impl KnowledgeGraph {
    /// Create an empty knowledge graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
        }
    }

    /// Insert a node. If a node with the same id already exists its stored
    /// value is replaced.
    pub fn add_node(&mut self, node: GraphNode) {
        if let Some(&existing) = self.node_index.get(&node.id) {
            self.graph[existing] = node;
            return;
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
    }

    /// Insert a relationship. Returns `false` (and stores nothing) when either
    /// endpoint is absent from the graph. A relationship with an existing id
    /// replaces the stored value.
    pub fn add_relationship(&mut self, rel: GraphRelationship) -> bool {
        let (Some(&src), Some(&dst)) = (
            self.node_index.get(&rel.source_id),
            self.node_index.get(&rel.target_id),
        ) else {
            return false;
        };
        if let Some(&existing) = self.edge_index.get(&rel.id) {
            self.graph[existing] = rel;
            return true;
        }
        let id = rel.id;
        let eidx = self.graph.add_edge(src, dst, rel);
        self.edge_index.insert(id, eidx);
        true
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.node_index.get(&id).map(|&idx| &self.graph[idx])
    }

    /// Iterate all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Iterate all relationships in insertion order.
    pub fn relationships(&self) -> impl Iterator<Item = &GraphRelationship> {
        self.graph.edge_references().map(|edge| edge.weight())
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of relationships in the graph.
    pub fn relationship_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Return a count of nodes broken down by label.
    pub fn nodes_by_label(&self) -> HashMap<NodeLabel, usize> {
        let mut map: HashMap<NodeLabel, usize> = HashMap::new();
        for node in self.nodes() {
            *map.entry(node.label).or_insert(0) += 1;
        }
        map
    }

    /// Targets of outgoing relationships of `kind` from the node with `id`.
    pub fn neighbors_out(&self, id: NodeId, kind: RelationshipKind) -> Vec<&GraphNode> {
        let Some(&idx) = self.node_index.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .filter(|e| e.weight().kind == kind)
            .map(|e| &self.graph[e.target()])
            .collect()
    }

    /// Sources of incoming relationships of `kind` to the node with `id`.
    pub fn neighbors_in(&self, id: NodeId, kind: RelationshipKind) -> Vec<&GraphNode> {
        let Some(&idx) = self.node_index.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter(|e| e.weight().kind == kind)
            .map(|e| &self.graph[e.source()])
            .collect()
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}
