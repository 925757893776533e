use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NodeStatus, StatusSource};

/// A unit of planned work in a workspace tree.
///
/// Nodes form a tree via `parent_id`. `path` caches the ancestor chain from the
/// root down to the parent, and `depth == path.len()`; both are fixed when the
/// node is created.
///
/// # Status
/// A node's status is either derived from its critical children or pinned by a
/// manual edit (see [`StatusSource`]). `is_critical` says whether *this* node
/// counts toward its parent's derived status, not whether its own status
/// depends on anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub parent_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub description: Option<String>,
    pub path: Vec<Uuid>,
    pub depth: u32,
    #[serde(flatten)]
    pub status_source: StatusSource,
    pub is_critical: bool,
    pub importance: Option<Importance>,
    /// Created by scaffold generation rather than by a person.
    pub ai_suggested: bool,
    pub ai_confidence: Option<f64>,
    /// Unconfirmed AI suggestions are "ghost" nodes until someone accepts them.
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Build a fresh node under `parent` (or as a root), filling in the
    /// ancestor path, depth and creation defaults.
    pub fn new(workspace_id: Uuid, parent: Option<&Node>, input: CreateNodeInput) -> Self {
        let now = Utc::now();
        let (path, depth) = match parent {
            Some(p) => {
                let mut path = p.path.clone();
                path.push(p.id);
                (path, p.depth + 1)
            }
            None => (Vec::new(), 0),
        };
        let node_type = input.node_type.unwrap_or_else(|| {
            parent
                .map(|p| p.node_type.default_child())
                .unwrap_or(NodeType::Project)
        });

        Self {
            id: Uuid::new_v4(),
            workspace_id,
            parent_id: parent.map(|p| p.id),
            node_type,
            name: input.name,
            description: input.description,
            path,
            depth,
            status_source: StatusSource::Derived(input.status.unwrap_or(NodeStatus::Idea)),
            is_critical: input.is_critical.unwrap_or(true),
            importance: input.importance,
            ai_suggested: input.ai_suggested,
            ai_confidence: input.ai_confidence,
            confirmed: !input.ai_suggested,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> NodeStatus {
        self.status_source.status()
    }

    pub fn is_auto(&self) -> bool {
        self.status_source.is_auto()
    }
}

/// The level of a node in the planning hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Project,
    Domain,
    System,
    Feature,
    Component,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Domain => "domain",
            Self::System => "system",
            Self::Feature => "feature",
            Self::Component => "component",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "project" => Some(Self::Project),
            "domain" => Some(Self::Domain),
            "system" => Some(Self::System),
            "feature" => Some(Self::Feature),
            "component" => Some(Self::Component),
            _ => None,
        }
    }

    /// The type a new child of this node gets when none is given.
    pub fn default_child(self) -> Self {
        match self {
            Self::Project => Self::Domain,
            Self::Domain => Self::System,
            Self::System => Self::Feature,
            Self::Feature | Self::Component => Self::Component,
        }
    }
}

/// Informational importance label. Does not affect aggregation; use
/// `is_critical` for that.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Critical,
    Important,
    Optional,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Optional => "optional",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "important" => Some(Self::Important),
            "optional" => Some(Self::Optional),
            _ => None,
        }
    }
}

/// Input for creating a new node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNodeInput {
    /// Parent node. `None` creates a root.
    pub parent_id: Option<Uuid>,
    /// Defaults to the parent's natural child type, or `project` for roots.
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
    pub name: String,
    pub description: Option<String>,
    /// Initial status. Defaults to `idea`.
    pub status: Option<NodeStatus>,
    /// Defaults to `true`.
    pub is_critical: Option<bool>,
    pub importance: Option<Importance>,
    #[serde(default)]
    pub ai_suggested: bool,
    pub ai_confidence: Option<f64>,
}

/// Input for editing a node's descriptive fields. Status and criticality have
/// dedicated operations because they trigger propagation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNodeInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
    pub importance: Option<Importance>,
}

/// Column-level partial write used by the status engine.
///
/// Only the fields that are `Some` are written; in particular writing a status
/// leaves `auto_status` alone unless it is set too.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeUpdate {
    pub status: Option<NodeStatus>,
    pub auto_status: Option<bool>,
    pub is_critical: Option<bool>,
    pub confirmed: Option<bool>,
}

impl NodeUpdate {
    /// A manual edit: set the status and pin it.
    pub fn pin(status: NodeStatus) -> Self {
        Self {
            status: Some(status),
            auto_status: Some(false),
            ..Self::default()
        }
    }

    /// A derived write: set the status, leave the pin flag untouched.
    pub fn derived(status: NodeStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn auto_status(auto_status: bool) -> Self {
        Self {
            auto_status: Some(auto_status),
            ..Self::default()
        }
    }

    pub fn critical(is_critical: bool) -> Self {
        Self {
            is_critical: Some(is_critical),
            ..Self::default()
        }
    }

    pub fn confirmed(confirmed: bool) -> Self {
        Self {
            confirmed: Some(confirmed),
            ..Self::default()
        }
    }
}

/// Body of a manual status edit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetStatusInput {
    pub status: NodeStatus,
}

/// Rollup of a node's immediate critical children, for progress bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: u32,
    pub complete: u32,
    pub in_progress: u32,
    /// `complete / total` as a rounded percentage, `0` when there are no critical children.
    pub percentage: u32,
}

/// A node with its nested children, used for tree responses.
///
/// The `node` fields are flattened into the JSON response, with an additional
/// `children` array containing nested `NodeTreeNode` objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTreeNode {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<NodeTreeNode>,
}

/// An externally generated plan to persist as ghost nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldInput {
    /// Name of the `project` root node created for the plan.
    pub project_name: String,
    pub summary: Option<String>,
    pub nodes: Vec<ProposedNode>,
}

/// One node of a proposed plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_critical: bool,
    #[serde(default)]
    pub children: Vec<ProposedNode>,
}

fn default_true() -> bool {
    true
}

/// Result of persisting a scaffold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldResult {
    pub project: Node,
    pub created_node_ids: Vec<Uuid>,
}
