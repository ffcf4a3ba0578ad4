//! Scene graph module
//!
//! Manages a retained-mode scene graph that is a DAG rather than a tree:
//! - Node: graph vertex (parent set, lazy bounding volume, content dispatch)
//! - Group: child-list capability for interior nodes
//! - Leaf: overridable hooks for drawable node variants
//! - SceneGraph: node arena, edge management and dirty propagation
//! - CullContext / DrawContext: per-traversal stacks for the two render phases
//! - traverse: decoupled depth-first traversal system

pub mod bounds;
pub mod context;
pub mod graph;
pub mod group;
pub mod leaf;
pub mod node;
pub mod traverse;

// Re-export common types
pub use bounds::BoundingSphere;
pub use context::{AttributeBits, AttributeStack, CullContext, DrawContext, NullAttributes, TraversalSettings};
pub use graph::SceneGraph;
pub use group::Group;
pub use leaf::Leaf;
pub use node::{Node, NodeContent};

use slotmap::new_key_type;

new_key_type! {
    /// Generational key identifying a node in a [`SceneGraph`] arena.
    ///
    /// Keys are the node's identity: two distinct nodes never compare equal,
    /// and a key outlives neither removal nor reuse of its slot (stale keys
    /// simply stop resolving).
    pub struct NodeKey;
}
