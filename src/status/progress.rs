use crate::models::{Node, NodeStatus, Progress};

/// Count a node's immediate critical children by completion.
///
/// Grandchildren are not visited: a child's own status already summarizes its
/// subtree when it is derived.
pub fn progress(children: &[Node]) -> Progress {
    let critical: Vec<&Node> = children.iter().filter(|c| c.is_critical).collect();

    let total = critical.len() as u32;
    let complete = critical
        .iter()
        .filter(|c| c.status() == NodeStatus::Complete)
        .count() as u32;
    let in_progress = critical
        .iter()
        .filter(|c| c.status() == NodeStatus::InProgress)
        .count() as u32;
    let percentage = if total > 0 {
        (f64::from(complete) / f64::from(total) * 100.0).round() as u32
    } else {
        0
    };

    Progress {
        total,
        complete,
        in_progress,
        percentage,
    }
}
