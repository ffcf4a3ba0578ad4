//! Leaf hook trait
//!
//! Defines the extension point for drawable node variants.
//!
//! # Design Principles
//! - The graph's caching and propagation protocols never dispatch
//!   dynamically; only the content-specific hooks below do.
//! - Hooks receive the traversal context, which carries the current node and
//!   the ancestor chain; a hook that needs its own key reads
//!   `ctx.current_node()`.
//! - Hooks are assumed to succeed. A hook that panics aborts the traversal;
//!   the crate guarantees the bounding cache stays dirty (safe to retry) and
//!   the context stacks unwind balanced.

use std::fmt;

use crate::scene::bounds::BoundingSphere;
use crate::scene::context::{CullContext, DrawContext};

/// Content hooks for a drawable node.
///
/// Every method has a do-nothing default, so an implementation overrides
/// only what its content needs: a piece of geometry typically overrides
/// [`bounding_sphere`](Self::bounding_sphere) and [`draw`](Self::draw), and
/// overrides [`cull`](Self::cull) when it wants to push work into the draw
/// list or make its own LOD decision.
pub trait Leaf: fmt::Debug {
    /// Computes this leaf's bounding sphere.
    ///
    /// Called by the graph whenever the node's cache is dirty; the result is
    /// cached until the node is invalidated again. The default, for content
    /// with no geometry, is the empty sphere.
    fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::empty()
    }

    /// Visibility/LOD decision hook, run between the node's cull push/pop.
    ///
    /// May append drawable work via
    /// [`CullContext::append_drawable`](CullContext::append_drawable).
    fn cull(&self, ctx: &mut CullContext) {
        let _ = ctx;
    }

    /// Rendering hook, run between the node's draw push/pop with a fresh
    /// attribute save in place.
    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let _ = ctx;
    }
}
