//! Traversal Protocol Tests
//!
//! Tests for:
//! - Cull phase: draw-list collection, view-volume pruning, visibility
//! - Draw phase: hook order, attribute save/restore pairing
//! - Stack balance across normal exits and panicking hooks

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use canopy::{
    AttributeBits, AttributeStack, BoundingSphere, CullContext, DrawContext, Leaf, Node,
    NullAttributes, SceneGraph, TraversalSettings,
};
use glam::Vec3;

/// Drawable stub: culls itself in when its sphere may be visible, and logs
/// its tag when drawn.
#[derive(Debug)]
struct ShapeLeaf {
    sphere: BoundingSphere,
    tag: &'static str,
    drawn: Rc<RefCell<Vec<&'static str>>>,
}

impl ShapeLeaf {
    fn new(tag: &'static str, center: Vec3, drawn: &Rc<RefCell<Vec<&'static str>>>) -> Self {
        Self {
            sphere: BoundingSphere::new(center, 1.0),
            tag,
            drawn: Rc::clone(drawn),
        }
    }
}

impl Leaf for ShapeLeaf {
    fn bounding_sphere(&self) -> BoundingSphere {
        self.sphere
    }

    fn cull(&self, ctx: &mut CullContext) {
        if ctx.intersects_view(&self.sphere)
            && let Some(key) = ctx.current_node()
        {
            ctx.append_drawable(key);
        }
    }

    fn draw(&self, _ctx: &mut DrawContext<'_>) {
        self.drawn.borrow_mut().push(self.tag);
    }
}

/// Attribute backend that checks save/restore pairing.
#[derive(Debug, Default)]
struct CountingAttributes {
    saves: usize,
    restores: usize,
    depth: usize,
    max_depth: usize,
}

impl AttributeStack for CountingAttributes {
    fn save(&mut self, mark: AttributeBits) {
        assert_eq!(mark, AttributeBits::ALL);
        self.saves += 1;
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
    }

    fn restore(&mut self) {
        assert!(self.depth > 0, "restore without matching save");
        self.restores += 1;
        self.depth -= 1;
    }
}

// ============================================================================
// Cull phase
// ============================================================================

#[test]
fn cull_collects_visible_leaves_in_graph_order() {
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());
    let a = graph
        .add_child_node(root, Node::leaf(ShapeLeaf::new("a", Vec3::ZERO, &drawn)))
        .unwrap();
    let b = graph
        .add_child_node(root, Node::leaf(ShapeLeaf::new("b", Vec3::ONE, &drawn)))
        .unwrap();

    let mut ctx = CullContext::new();
    graph.cull(&mut ctx);

    assert_eq!(ctx.draw_list(), &[a, b]);
    assert_eq!(ctx.depth(), 0, "stack returns to pre-traversal depth");
}

#[test]
fn cull_prunes_groups_outside_the_view_volume() {
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());

    let near_group = graph.add_child_node(root, Node::group()).unwrap();
    let near = graph
        .add_child_node(near_group, Node::leaf(ShapeLeaf::new("near", Vec3::ZERO, &drawn)))
        .unwrap();

    let far_group = graph.add_child_node(root, Node::group()).unwrap();
    graph
        .add_child_node(
            far_group,
            Node::leaf(ShapeLeaf::new("far", Vec3::new(100.0, 0.0, 0.0), &drawn)),
        )
        .unwrap();

    let mut ctx = CullContext::new();
    ctx.set_view_volume(Some(BoundingSphere::new(Vec3::ZERO, 10.0)));
    graph.cull(&mut ctx);

    assert_eq!(ctx.draw_list(), &[near], "far subtree never entered");
    assert_eq!(ctx.depth(), 0);
}

#[test]
fn cull_skips_invisible_subtrees() {
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());
    let hidden_group = graph.add_child_node(root, Node::group()).unwrap();
    graph
        .add_child_node(hidden_group, Node::leaf(ShapeLeaf::new("hidden", Vec3::ZERO, &drawn)))
        .unwrap();
    let shown = graph
        .add_child_node(root, Node::leaf(ShapeLeaf::new("shown", Vec3::ZERO, &drawn)))
        .unwrap();

    graph.get_node_mut(hidden_group).unwrap().visible = false;

    let mut ctx = CullContext::new();
    graph.cull(&mut ctx);
    assert_eq!(ctx.draw_list(), &[shown]);

    // With pruning disabled the hidden leaf is visited again.
    let mut ctx = CullContext::with_settings(TraversalSettings {
        prune_invisible: false,
        ..TraversalSettings::default()
    });
    graph.cull(&mut ctx);
    assert_eq!(ctx.draw_list().len(), 2);
}

#[test]
fn shared_subtree_is_culled_once_per_path() {
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());
    let left = graph.add_child_node(root, Node::group()).unwrap();
    let right = graph.add_child_node(root, Node::group()).unwrap();

    let shared = graph
        .add_child_node(left, Node::leaf(ShapeLeaf::new("shared", Vec3::ZERO, &drawn)))
        .unwrap();
    graph.add_child(right, shared).unwrap();

    let mut ctx = CullContext::new();
    graph.cull(&mut ctx);

    assert_eq!(ctx.draw_list(), &[shared, shared], "one entry per instance path");
}

#[test]
fn cull_reset_clears_stale_work() {
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());
    graph
        .add_child_node(root, Node::leaf(ShapeLeaf::new("a", Vec3::ZERO, &drawn)))
        .unwrap();

    let mut ctx = CullContext::new();
    graph.cull(&mut ctx);
    graph.cull(&mut ctx);

    assert_eq!(ctx.draw_list().len(), 1, "re-culling does not accumulate");
}

// ============================================================================
// Draw phase
// ============================================================================

#[test]
fn draw_runs_hooks_in_graph_order() {
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());
    let inner = graph.add_child_node(root, Node::group()).unwrap();
    graph
        .add_child_node(inner, Node::leaf(ShapeLeaf::new("a", Vec3::ZERO, &drawn)))
        .unwrap();
    graph
        .add_child_node(root, Node::leaf(ShapeLeaf::new("b", Vec3::ZERO, &drawn)))
        .unwrap();

    let mut attributes = NullAttributes;
    let mut ctx = DrawContext::new(&mut attributes);
    graph.draw(&mut ctx);

    assert_eq!(*drawn.borrow(), vec!["a", "b"]);
    assert_eq!(ctx.depth(), 0);
}

#[test]
fn draw_saves_and_restores_attributes_per_node() {
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());
    let inner = graph.add_child_node(root, Node::group()).unwrap();
    graph
        .add_child_node(inner, Node::leaf(ShapeLeaf::new("a", Vec3::ZERO, &drawn)))
        .unwrap();

    let mut attributes = CountingAttributes::default();
    {
        let mut ctx = DrawContext::new(&mut attributes);
        graph.draw(&mut ctx);
        assert_eq!(ctx.depth(), 0);
    }

    assert_eq!(attributes.saves, 3, "one save per visited node");
    assert_eq!(attributes.saves, attributes.restores);
    assert_eq!(attributes.depth, 0);
    assert_eq!(attributes.max_depth, 3, "saves nest to traversal depth");
}

// ============================================================================
// Panic balance
// ============================================================================

/// Hook stub that fails mid-traversal.
#[derive(Debug)]
struct ExplodingLeaf;

impl Leaf for ExplodingLeaf {
    fn cull(&self, _ctx: &mut CullContext) {
        panic!("cull hook failure");
    }

    fn draw(&self, _ctx: &mut DrawContext<'_>) {
        panic!("draw hook failure");
    }
}

#[test]
fn draw_stacks_stay_balanced_across_a_panicking_hook() {
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());
    let inner = graph.add_child_node(root, Node::group()).unwrap();
    graph.add_child_node(inner, Node::leaf(ExplodingLeaf)).unwrap();

    let mut attributes = CountingAttributes::default();
    {
        let mut ctx = DrawContext::new(&mut attributes);
        let result = catch_unwind(AssertUnwindSafe(|| graph.draw(&mut ctx)));
        assert!(result.is_err());
        assert_eq!(ctx.depth(), 0, "node stack unwinds balanced");
    }

    assert_eq!(attributes.saves, attributes.restores, "every save restored");
    assert_eq!(attributes.depth, 0);
}

#[test]
fn cull_stack_stays_balanced_across_a_panicking_hook() {
    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::group());
    graph.add_child_node(root, Node::leaf(ExplodingLeaf)).unwrap();

    let mut ctx = CullContext::new();
    let result = catch_unwind(AssertUnwindSafe(|| graph.cull(&mut ctx)));
    assert!(result.is_err());
    assert_eq!(ctx.depth(), 0);
}
