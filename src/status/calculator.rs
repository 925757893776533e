use crate::models::{Node, NodeStatus};

/// The two facts about a child that its parent's aggregate depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildStatus {
    pub status: NodeStatus,
    pub is_critical: bool,
}

impl ChildStatus {
    pub fn critical(status: NodeStatus) -> Self {
        Self {
            status,
            is_critical: true,
        }
    }

    pub fn optional(status: NodeStatus) -> Self {
        Self {
            status,
            is_critical: false,
        }
    }
}

impl From<&Node> for ChildStatus {
    fn from(node: &Node) -> Self {
        Self {
            status: node.status(),
            is_critical: node.is_critical,
        }
    }
}

/// Derive a parent's status from its children.
///
/// Non-critical children are ignored; with no critical children the result is
/// `Idea`. Otherwise the first matching rule wins:
///
/// 1. all `Complete` → `Complete`
/// 2. all at least `Mvp` → `Mvp`
/// 3. all at least `Testing` → `Testing`
/// 4. any `InProgress` → `InProgress`
/// 5. all at least `Planned` → `Planned`
/// 6. otherwise `Idea`
///
/// Rule 2 subsumes rule 3, so the result is never `Testing`: children that are
/// all in `Testing` roll up to `Mvp`. Existing trees depend on this ordering.
/// `Archived` ranks below `Idea` and drags rules 2, 3 and 5 down.
pub fn aggregate(children: &[ChildStatus]) -> NodeStatus {
    let statuses: Vec<NodeStatus> = children
        .iter()
        .filter(|c| c.is_critical)
        .map(|c| c.status)
        .collect();

    if statuses.is_empty() {
        return NodeStatus::Idea;
    }

    let all_at_least = |floor: NodeStatus| statuses.iter().all(|s| s.at_least(floor));

    if statuses.iter().all(|s| *s == NodeStatus::Complete) {
        NodeStatus::Complete
    } else if all_at_least(NodeStatus::Mvp) {
        NodeStatus::Mvp
    } else if all_at_least(NodeStatus::Testing) {
        NodeStatus::Testing
    } else if statuses.contains(&NodeStatus::InProgress) {
        NodeStatus::InProgress
    } else if all_at_least(NodeStatus::Planned) {
        NodeStatus::Planned
    } else {
        NodeStatus::Idea
    }
}
