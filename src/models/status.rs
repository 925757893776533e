use std::fmt;

use serde::{Deserialize, Serialize};

/// The completion status of a node.
///
/// Statuses are ordered `Idea < Planned < InProgress < Mvp < Testing < Complete`.
/// `Archived` sits outside that ordering: it ranks below everything else and
/// never satisfies an "at least" check during aggregation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Idea,
    Planned,
    InProgress,
    Mvp,
    Testing,
    Complete,
    Archived,
}

impl NodeStatus {
    pub const ALL: [NodeStatus; 7] = [
        Self::Idea,
        Self::Planned,
        Self::InProgress,
        Self::Mvp,
        Self::Testing,
        Self::Complete,
        Self::Archived,
    ];

    /// Position in the progress ordering. `Archived` is `-1`.
    pub fn rank(self) -> i8 {
        match self {
            Self::Idea => 0,
            Self::Planned => 1,
            Self::InProgress => 2,
            Self::Mvp => 3,
            Self::Testing => 4,
            Self::Complete => 5,
            Self::Archived => -1,
        }
    }

    /// True when this status has reached at least `other` in the ordering.
    pub fn at_least(self, other: NodeStatus) -> bool {
        self.rank() >= other.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Mvp => "mvp",
            Self::Testing => "testing",
            Self::Complete => "complete",
            Self::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idea" => Some(Self::Idea),
            "planned" => Some(Self::Planned),
            "in_progress" => Some(Self::InProgress),
            "mvp" => Some(Self::Mvp),
            "testing" => Some(Self::Testing),
            "complete" => Some(Self::Complete),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a node's status comes from.
///
/// - `Derived`: recomputed from the node's critical children whenever they change.
/// - `Pinned`: set by hand; aggregation never overwrites it, and upward
///   propagation stops at this node.
///
/// On the wire and in storage this is the flat pair `status` + `auto_status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "StatusFields", into = "StatusFields")]
pub enum StatusSource {
    Derived(NodeStatus),
    Pinned(NodeStatus),
}

impl StatusSource {
    pub fn from_parts(status: NodeStatus, auto_status: bool) -> Self {
        if auto_status {
            Self::Derived(status)
        } else {
            Self::Pinned(status)
        }
    }

    pub fn status(&self) -> NodeStatus {
        match *self {
            Self::Derived(status) | Self::Pinned(status) => status,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Derived(_))
    }
}

impl Default for StatusSource {
    fn default() -> Self {
        Self::Derived(NodeStatus::Idea)
    }
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct StatusFields {
    status: NodeStatus,
    #[serde(default = "default_true")]
    auto_status: bool,
}

fn default_true() -> bool {
    true
}

impl From<StatusFields> for StatusSource {
    fn from(fields: StatusFields) -> Self {
        Self::from_parts(fields.status, fields.auto_status)
    }
}

impl From<StatusSource> for StatusFields {
    fn from(source: StatusSource) -> Self {
        Self {
            status: source.status(),
            auto_status: source.is_auto(),
        }
    }
}
