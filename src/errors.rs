//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`CanopyError`] covers structural misuse of the graph:
//! - Stale node keys passed to edge operations
//! - Child edges requested on non-group nodes
//! - Edges that would close a cycle
//!
//! Invalid-but-harmless mutations (adding an edge that already exists,
//! removing one that does not) are *not* errors; those are reported through
//! `Ok(bool)` results so callers can branch on them.
//!
//! # Usage
//!
//! Fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, CanopyError>`.

use thiserror::Error;

use crate::scene::NodeKey;

/// The main error type for the scene graph.
///
/// Every variant is local to the operation that induced it; no failure in
/// this crate corrupts graph state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanopyError {
    /// A node key did not resolve to a live node in the arena.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeKey),

    /// A child edge was requested on a node that carries no child list.
    #[error("node {0:?} is not a group")]
    NotAGroup(NodeKey),

    /// Attaching the child under the parent would close a cycle.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// The group that would have gained the child.
        parent: NodeKey,
        /// The node that is already an ancestor of `parent`.
        child: NodeKey,
    },
}

/// Alias for `Result<T, CanopyError>`.
pub type Result<T> = std::result::Result<T, CanopyError>;
