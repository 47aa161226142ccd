//! Core types for workflow graphs
//!
//! These types define the nodes and edges the editor surface renders.
//! Field names serialize in camelCase and match the graph-drawing
//! library's wire format (`id`, `type`, `position`, `data` for nodes;
//! `id`, `source`, `target`, `type`, `animated` for edges).

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Partial node data applied by a shallow, per-key merge
pub type DataPatch = BTreeMap<String, DataValue>;

/// The closed set of node kinds the studio knows how to configure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Trigger,
    Orchestrator,
    // Data sources
    MarketData,
    NewsFeed,
    SecFilings,
    SocialSentiment,
    EarningsCalls,
    AlternativeData,
    // Analysis
    SentimentAnalysis,
    TechnicalAnalysis,
    FundamentalAnalysis,
    RiskAssessment,
    PortfolioOptimization,
    LlmAnalysis,
    // Investment lifecycle stages
    DealSourcing,
    Screening,
    DueDiligence,
    ValuationModeling,
    InvestmentCommittee,
    PortfolioMonitoring,
    ExitPlanning,
    // Sinks
    Alert,
    Output,
    Report,
}

impl NodeKind {
    /// Every kind, in palette order
    pub const ALL: [NodeKind; 24] = [
        NodeKind::Trigger,
        NodeKind::Orchestrator,
        NodeKind::MarketData,
        NodeKind::NewsFeed,
        NodeKind::SecFilings,
        NodeKind::SocialSentiment,
        NodeKind::EarningsCalls,
        NodeKind::AlternativeData,
        NodeKind::SentimentAnalysis,
        NodeKind::TechnicalAnalysis,
        NodeKind::FundamentalAnalysis,
        NodeKind::RiskAssessment,
        NodeKind::PortfolioOptimization,
        NodeKind::LlmAnalysis,
        NodeKind::DealSourcing,
        NodeKind::Screening,
        NodeKind::DueDiligence,
        NodeKind::ValuationModeling,
        NodeKind::InvestmentCommittee,
        NodeKind::PortfolioMonitoring,
        NodeKind::ExitPlanning,
        NodeKind::Alert,
        NodeKind::Output,
        NodeKind::Report,
    ];

    /// The type identifier used on the wire (e.g. "valuationModeling")
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Orchestrator => "orchestrator",
            NodeKind::MarketData => "marketData",
            NodeKind::NewsFeed => "newsFeed",
            NodeKind::SecFilings => "secFilings",
            NodeKind::SocialSentiment => "socialSentiment",
            NodeKind::EarningsCalls => "earningsCalls",
            NodeKind::AlternativeData => "alternativeData",
            NodeKind::SentimentAnalysis => "sentimentAnalysis",
            NodeKind::TechnicalAnalysis => "technicalAnalysis",
            NodeKind::FundamentalAnalysis => "fundamentalAnalysis",
            NodeKind::RiskAssessment => "riskAssessment",
            NodeKind::PortfolioOptimization => "portfolioOptimization",
            NodeKind::LlmAnalysis => "llmAnalysis",
            NodeKind::DealSourcing => "dealSourcing",
            NodeKind::Screening => "screening",
            NodeKind::DueDiligence => "dueDiligence",
            NodeKind::ValuationModeling => "valuationModeling",
            NodeKind::InvestmentCommittee => "investmentCommittee",
            NodeKind::PortfolioMonitoring => "portfolioMonitoring",
            NodeKind::ExitPlanning => "exitPlanning",
            NodeKind::Alert => "alert",
            NodeKind::Output => "output",
            NodeKind::Report => "report",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known node kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNodeKind(pub String);

impl fmt::Display for UnknownNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown node kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownNodeKind {}

impl FromStr for NodeKind {
    type Err = UnknownNodeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownNodeKind(s.to_string()))
    }
}

/// The type tag carried by a node
///
/// Known kinds get typed defaults from the catalog. Anything else is kept
/// verbatim so graphs produced by newer palettes still load and render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Known(NodeKind),
    Unrecognized(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Known(kind) => kind.as_str(),
            NodeType::Unrecognized(name) => name,
        }
    }

    /// The known kind, if this type is part of the closed enumeration
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            NodeType::Known(kind) => Some(*kind),
            NodeType::Unrecognized(_) => None,
        }
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        match s.parse::<NodeKind>() {
            Ok(kind) => NodeType::Known(kind),
            Err(_) => NodeType::Unrecognized(s.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        match s.parse::<NodeKind>() {
            Ok(kind) => NodeType::Known(kind),
            Err(_) => NodeType::Unrecognized(s),
        }
    }
}

impl From<NodeKind> for NodeType {
    fn from(kind: NodeKind) -> Self {
        NodeType::Known(kind)
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Known(kind) => kind.as_str().to_string(),
            NodeType::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position on the editor canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Measured size of a rendered node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// A scalar configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl DataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => f.write_str("null"),
            DataValue::Bool(b) => write!(f, "{}", b),
            DataValue::Number(n) => write!(f, "{}", n),
            DataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Text(s)
    }
}

impl From<f64> for DataValue {
    fn from(n: f64) -> Self {
        DataValue::Number(n)
    }
}

impl From<u32> for DataValue {
    fn from(n: u32) -> Self {
        DataValue::Number(f64::from(n))
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Bool(b)
    }
}

/// Configuration payload of a node
///
/// `label` is always present. Every other key lives in `fields` and is
/// flattened next to it when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    #[serde(flatten)]
    fields: BTreeMap<String, DataValue>,
}

impl NodeData {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter, routed through the same rules as `merge`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.set(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.fields.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(DataValue::as_text)
    }

    /// Non-label fields in key order
    pub fn fields(&self) -> &BTreeMap<String, DataValue> {
        &self.fields
    }

    /// Shallow merge: every key in `patch` overwrites the existing value
    pub fn merge(&mut self, patch: DataPatch) {
        for (key, value) in patch {
            self.set(key, value);
        }
    }

    /// A blank or null label leaves the current label in place
    fn set(&mut self, key: String, value: DataValue) {
        if key == "label" {
            let label = match &value {
                DataValue::Null => String::new(),
                other => other.to_string(),
            };
            if label.trim().is_empty() {
                log::debug!("Ignoring blank label for '{}'", self.label);
                return;
            }
            self.label = label;
        } else {
            self.fields.insert(key, value);
        }
    }
}

/// Rendering style of an edge; the studio draws a single style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeKind {
    #[default]
    #[serde(rename = "smoothstep")]
    SmoothStep,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Node type; fixed for the node's lifetime
    #[serde(rename = "type")]
    node_type: NodeType,
    /// Position in the UI
    pub position: Position,
    /// Type-specific configuration
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Dimensions>,
}

impl GraphNode {
    pub fn new(
        id: impl Into<NodeId>,
        node_type: impl Into<NodeType>,
        position: Position,
        data: NodeData,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position,
            data,
            selected: false,
            measured: None,
        }
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }
}

/// A request from the editor surface to connect two nodes
///
/// Endpoints are optional because the surface may report a half-finished
/// drag; such connections are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: Option<NodeId>,
    pub target: Option<NodeId>,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_handles(
        mut self,
        source_handle: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        self.source_handle = Some(source_handle.into());
        self.target_handle = Some(target_handle.into());
        self
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

impl GraphEdge {
    /// Whether this edge links the same endpoints and handles as `other`
    pub fn parallels(&self, other: &GraphEdge) -> bool {
        self.source == other.source
            && self.target == other.target
            && self.source_handle == other.source_handle
            && self.target_handle == other.target_handle
    }
}

/// A complete workflow graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGraph {
    /// Human-readable name
    pub name: String,
    /// Nodes in insertion (render) order
    pub nodes: Vec<GraphNode>,
    /// Edges connecting nodes
    pub edges: Vec<GraphEdge>,
}

impl WorkflowGraph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Nodes referenced by at least one edge, in node order
    ///
    /// Only nodes that still exist are returned; an edge pointing at a
    /// removed node contributes nothing for that endpoint.
    pub fn participants(&self) -> Vec<&GraphNode> {
        let referenced: HashSet<&str> = self
            .edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();
        self.nodes
            .iter()
            .filter(|n| referenced.contains(n.id.as_str()))
            .collect()
    }

    /// Nodes with no incident edges
    pub fn idle_nodes(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| {
                self.outgoing_edges(&n.id).next().is_none()
                    && self.incoming_edges(&n.id).next().is_none()
            })
            .collect()
    }

    /// Edges whose source or target no longer exists
    pub fn dangling_edges(&self) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|e| self.find_node(&e.source).is_none() || self.find_node(&e.target).is_none())
            .collect()
    }

    /// Resolve both endpoints of an edge; `None` when the edge is dangling
    pub fn endpoints(&self, edge: &GraphEdge) -> Option<(&GraphNode, &GraphNode)> {
        Some((self.find_node(&edge.source)?, self.find_node(&edge.target)?))
    }
}
