//! Knowledge graph of queries, papers, and projects
//!
//! Undirected typed graph: origin edges connect a query to the findings it
//! surfaced, topic-link edges connect findings that shared at least one
//! topic token when the newer of the two was inserted. The graph is owned
//! by [`KnowledgeGraph`] and mutated only through its API; readers never
//! observe a partially linked batch.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use parking_lot::RwLock;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};
use crate::record::Finding;
use crate::topics;

/// Kind of a graph node, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Query,
    Paper,
    Project,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Paper => "paper",
            Self::Project => "project",
        }
    }

    /// Finding nodes participate in topic linking; query nodes do not.
    pub fn is_finding(&self) -> bool {
        matches!(self, Self::Paper | Self::Project)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the knowledge graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable key: query text, paper title, or repository full name
    pub id: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Topic tokens derived once at insertion, immutable thereafter
    #[serde(default)]
    pub topics: BTreeSet<String>,
}

/// Kind of an edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    /// Query → finding it surfaced
    Origin,
    /// Finding ↔ finding with overlapping topics
    TopicLink { shared_topics: BTreeSet<String> },
}

/// An edge in a rendered graph snapshot, endpoints in lexicographic order
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEdge {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

/// Immutable view of the graph for an external rendering collaborator.
///
/// Nodes are sorted by id and edges by endpoint pair, so identical graphs
/// always render to identical snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<SnapshotEdge>,
}

impl GraphSnapshot {
    /// Serialize the snapshot for a rendering collaborator
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

struct GraphInner {
    graph: UnGraph<Node, EdgeKind>,
    index: HashMap<String, NodeIndex>,
}

impl GraphInner {
    fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            index: HashMap::new(),
        }
    }

    /// Insert a node, or refresh an existing one.
    ///
    /// Duplicate insertion is last-write-wins on the summary only: kind and
    /// topics stay as created, so topic links are never recomputed
    /// retroactively.
    fn ensure_node(
        &mut self,
        id: &str,
        kind: NodeKind,
        summary: Option<String>,
        topics: BTreeSet<String>,
    ) -> NodeIndex {
        if let Some(&ix) = self.index.get(id) {
            if let Some(summary) = summary {
                self.graph[ix].summary = Some(summary);
            }
            return ix;
        }

        let ix = self.graph.add_node(Node {
            id: id.to_string(),
            kind,
            summary,
            topics,
        });
        self.index.insert(id.to_string(), ix);
        ix
    }

    /// Add an edge unless one of the same kind already connects the pair
    fn ensure_edge(&mut self, a: NodeIndex, b: NodeIndex, kind: EdgeKind) {
        let exists = self
            .graph
            .edges_connecting(a, b)
            .any(|e| std::mem::discriminant(e.weight()) == std::mem::discriminant(&kind));
        if !exists {
            self.graph.add_edge(a, b, kind);
        }
    }

    /// Link a freshly inserted finding to every other finding node whose
    /// topic set intersects its own, carrying the intersection.
    fn link_shared_topics(&mut self, finding_ix: NodeIndex) {
        let own_topics = self.graph[finding_ix].topics.clone();
        if own_topics.is_empty() {
            return;
        }

        let candidates: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&ix| ix != finding_ix && self.graph[ix].kind.is_finding())
            .collect();

        for other_ix in candidates {
            let shared: BTreeSet<String> = own_topics
                .intersection(&self.graph[other_ix].topics)
                .cloned()
                .collect();
            if shared.is_empty() {
                continue;
            }
            self.ensure_edge(
                finding_ix,
                other_ix,
                EdgeKind::TopicLink {
                    shared_topics: shared,
                },
            );
        }
    }
}

/// Graph store for queries, papers, and projects
pub struct KnowledgeGraph {
    inner: RwLock<GraphInner>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(GraphInner::new()),
        }
    }

    /// Ensure a query node exists. Idempotent: re-adding the same query
    /// changes nothing beyond presence.
    pub fn add_query(&self, query: &str) {
        let mut inner = self.inner.write();
        inner.ensure_node(query, NodeKind::Query, None, BTreeSet::new());
    }

    /// Fold a batch of findings for a query into the graph.
    ///
    /// Each finding node gets exactly one origin edge to the query node and
    /// topic-link edges to every existing finding whose topics intersect
    /// its own at insertion time. An empty batch touches only the query
    /// node. A finding whose id equals the query text collapses onto the
    /// query node and the would-be origin self-loop is skipped.
    pub fn update_graph(&self, query: &str, findings: &[(Finding, String)]) {
        let mut inner = self.inner.write();
        let query_ix = inner.ensure_node(query, NodeKind::Query, None, BTreeSet::new());

        for (finding, summary) in findings {
            let kind = match finding {
                Finding::Paper(_) => NodeKind::Paper,
                Finding::Project(_) => NodeKind::Project,
            };
            let node_topics = topics::finding_topics(finding);
            let finding_ix =
                inner.ensure_node(finding.id(), kind, Some(summary.clone()), node_topics);

            if finding_ix != query_ix {
                inner.ensure_edge(query_ix, finding_ix, EdgeKind::Origin);
            }
            inner.link_shared_topics(finding_ix);
        }
    }

    /// Get a node by id
    pub fn get_node(&self, id: &str) -> Result<Node> {
        let inner = self.inner.read();
        let ix = inner
            .index
            .get(id)
            .copied()
            .ok_or_else(|| MemoryError::not_found(id))?;
        Ok(inner.graph[ix].clone())
    }

    /// Ids of all nodes adjacent to the given node
    pub fn get_neighbors(&self, id: &str) -> Result<BTreeSet<String>> {
        let inner = self.inner.read();
        let ix = inner
            .index
            .get(id)
            .copied()
            .ok_or_else(|| MemoryError::not_found(id))?;
        Ok(inner
            .graph
            .neighbors(ix)
            .map(|n| inner.graph[n].id.clone())
            .collect())
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.read().graph.edge_count()
    }

    /// Produce an immutable, deterministic snapshot for rendering.
    ///
    /// The engine never draws or lays out the graph itself.
    pub fn render(&self) -> GraphSnapshot {
        let inner = self.inner.read();

        let mut nodes: Vec<Node> = inner.graph.node_weights().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<SnapshotEdge> = inner
            .graph
            .edge_references()
            .map(|e| {
                let mut source = inner.graph[e.source()].id.clone();
                let mut target = inner.graph[e.target()].id.clone();
                if target < source {
                    std::mem::swap(&mut source, &mut target);
                }
                SnapshotEdge {
                    source,
                    target,
                    kind: e.weight().clone(),
                }
            })
            .collect();
        edges.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then_with(|| a.target.cmp(&b.target))
        });

        GraphSnapshot { nodes, edges }
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}
