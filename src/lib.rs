//! Hierarchical project planning with derived status rollups.
//!
//! Work is organized into a tree of typed nodes per workspace. A parent's
//! status is derived from its critical children unless it has been pinned by
//! hand, and every edit re-derives the ancestor chain (see [`status`]).

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scaffold;
pub mod status;
pub mod store;
pub mod tree_render;
