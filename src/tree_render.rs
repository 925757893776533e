//! ASCII tree rendering for node hierarchies.

use crate::models::{NodeStatus, NodeTreeNode};

/// Get the symbol for a node status.
fn status_symbol(status: NodeStatus) -> char {
    match status {
        NodeStatus::Idea => '◇',
        NodeStatus::Planned => '○',
        NodeStatus::InProgress => '◐',
        NodeStatus::Mvp => '◑',
        NodeStatus::Testing => '◕',
        NodeStatus::Complete => '●',
        NodeStatus::Archived => '✗',
    }
}

/// Render a node tree as ASCII art with status symbols.
///
/// Pinned statuses are marked with `*`, nodes that don't count toward their
/// parent with `(optional)`, and unconfirmed suggestions with `?`.
///
/// Example output:
/// ```text
/// ◐ Farm Platform
/// ├── ● Sensors
/// ├── ◐ Irrigation *
/// │   ├── ◐ Scheduler
/// │   └── ◇ Valve Control (optional)
/// └── ◇ Billing ?
/// ```
pub fn render_tree(nodes: &[NodeTreeNode]) -> String {
    let mut output = String::new();
    for node in nodes {
        render_node(&mut output, node, "", None);
    }
    output
}

/// Recursively render a node and its children. `is_last` is `None` for roots.
fn render_node(output: &mut String, node: &NodeTreeNode, prefix: &str, is_last: Option<bool>) {
    if let Some(is_last) = is_last {
        output.push_str(prefix);
        output.push_str(if is_last { "└── " } else { "├── " });
    }
    output.push(status_symbol(node.node.status()));
    output.push(' ');
    output.push_str(&node.node.name);
    if !node.node.is_auto() {
        output.push_str(" *");
    }
    if !node.node.is_critical {
        output.push_str(" (optional)");
    }
    if !node.node.confirmed {
        output.push_str(" ?");
    }
    output.push('\n');

    let child_prefix = match is_last {
        None => String::new(),
        Some(true) => format!("{}    ", prefix),
        Some(false) => format!("{}│   ", prefix),
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, Some(child_is_last));
    }
}
