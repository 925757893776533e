//! Domain models for plantree.
//!
//! # Core Concepts
//!
//! - [`Workspace`]: Top-level container holding one or more planning trees.
//! - [`Node`]: A unit of planned work. Nodes form a tree via `parent_id`, typed
//!   project → domain → system → feature → component.
//! - [`NodeStatus`]: Completion status. Leaf statuses are set by hand; parent
//!   statuses are usually derived from their critical children.
//! - [`StatusSource`]: Whether a node's status is derived from its children or
//!   pinned by a manual edit.

mod node;
mod status;
mod workspace;

pub use node::*;
pub use status::*;
pub use workspace::*;
