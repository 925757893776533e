//! Status aggregation.
//!
//! - [`aggregate`]: pure rollup of children's statuses into a parent status.
//! - [`progress`]: pure completion counts for progress bars.
//! - [`StatusEngine`]: applies edits through a [`NodeStore`] and keeps the
//!   ancestor chain consistent afterwards.
//!
//! [`NodeStore`]: crate::store::NodeStore

mod calculator;
mod engine;
mod progress;

pub use calculator::{aggregate, ChildStatus};
pub use engine::StatusEngine;
pub use progress::progress;
