//! Traversal system
//!
//! Depth-first cull/draw drivers for the scene graph, decoupled from
//! [`SceneGraph`](crate::scene::SceneGraph) to avoid borrow conflicts: the
//! functions here only borrow the node arena and the root list.
//!
//! # Begin/hook/End discipline
//!
//! Each visited node runs a strictly nested triple: Begin (push the node,
//! and for draw additionally save an attribute mark), the content hook, End
//! (undo the Begin). The pairing must survive every exit path, including a
//! panicking hook, or the context stacks end up unbalanced for the rest of
//! the frame. [`CullScope`] and [`DrawScope`] encode the pairing in `Drop`,
//! so unwinding runs the End half automatically.

use std::ops::{Deref, DerefMut};

use log::warn;
use slotmap::SlotMap;

use crate::scene::context::{AttributeBits, CullContext, DrawContext};
use crate::scene::node::{Node, NodeContent};
use crate::scene::NodeKey;

/// Runs the cull phase over every root, depth-first.
///
/// Group bounds are tested against the context's view volume using each
/// node's *cached* sphere; run this after the caches have been refreshed
/// (see [`SceneGraph::cull`](crate::scene::SceneGraph::cull)). A node whose
/// cache is still dirty is descended conservatively.
pub fn cull(nodes: &SlotMap<NodeKey, Node>, roots: &[NodeKey], ctx: &mut CullContext) {
    for &root in roots {
        cull_node(nodes, root, ctx);
    }
}

fn cull_node(nodes: &SlotMap<NodeKey, Node>, key: NodeKey, ctx: &mut CullContext) {
    let Some(node) = nodes.get(key) else {
        warn!("Node {key:?} missing during cull traversal");
        return;
    };
    if ctx.settings().prune_invisible && !node.visible {
        return;
    }

    let mut scope = CullScope::enter(ctx, key);
    match node.content() {
        NodeContent::Empty => {}
        NodeContent::Leaf(leaf) => leaf.cull(&mut scope),
        NodeContent::Group(group) => {
            // Prune the subtree when the group's envelope cannot intersect
            // the view volume. A dirty cache descends conservatively.
            let prune = match node.cached_bounds() {
                Some(bounds) => !scope.intersects_view(&bounds),
                None => false,
            };
            if !prune {
                for &child in group.children() {
                    cull_node(nodes, child, &mut scope);
                }
            }
        }
    }
}

/// Runs the draw phase over every root, in the same depth-first order as
/// [`cull`].
pub fn draw(nodes: &SlotMap<NodeKey, Node>, roots: &[NodeKey], ctx: &mut DrawContext<'_>) {
    for &root in roots {
        draw_node(nodes, root, ctx);
    }
}

fn draw_node(nodes: &SlotMap<NodeKey, Node>, key: NodeKey, ctx: &mut DrawContext<'_>) {
    let Some(node) = nodes.get(key) else {
        warn!("Node {key:?} missing during draw traversal");
        return;
    };
    if ctx.settings().prune_invisible && !node.visible {
        return;
    }

    let mut scope = DrawScope::enter(ctx, key);
    match node.content() {
        NodeContent::Empty => {}
        NodeContent::Leaf(leaf) => leaf.draw(&mut scope),
        NodeContent::Group(group) => {
            for &child in group.children() {
                draw_node(nodes, child, &mut scope);
            }
        }
    }
}

// ─── Scopes ──────────────────────────────────────────────────────────────────

/// RAII Begin/End pair for one node's cull visit.
///
/// `enter` pushes the node onto the context stack; dropping the scope pops
/// it, on normal exit and on unwind alike. Derefs to [`CullContext`] so the
/// hook between Begin and End sees the context itself.
pub struct CullScope<'s> {
    ctx: &'s mut CullContext,
}

impl<'s> CullScope<'s> {
    pub fn enter(ctx: &'s mut CullContext, key: NodeKey) -> Self {
        ctx.push_node(key);
        Self { ctx }
    }
}

impl Deref for CullScope<'_> {
    type Target = CullContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for CullScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for CullScope<'_> {
    fn drop(&mut self) {
        self.ctx.pop_node();
    }
}

/// RAII Begin/End pair for one node's draw visit.
///
/// `enter` pushes the node and saves a full attribute mark; dropping the
/// scope restores the mark and pops the node, so attribute changes made by
/// the hook (or anything below it) cannot leak to siblings even when a hook
/// panics.
pub struct DrawScope<'s, 'a> {
    ctx: &'s mut DrawContext<'a>,
}

impl<'s, 'a> DrawScope<'s, 'a> {
    pub fn enter(ctx: &'s mut DrawContext<'a>, key: NodeKey) -> Self {
        ctx.push_node(key);
        ctx.save_attributes(AttributeBits::ALL);
        Self { ctx }
    }
}

impl<'a> Deref for DrawScope<'_, 'a> {
    type Target = DrawContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for DrawScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for DrawScope<'_, '_> {
    fn drop(&mut self) {
        self.ctx.restore_attributes();
        self.ctx.pop_node();
    }
}
