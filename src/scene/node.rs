use smallvec::SmallVec;

use crate::scene::NodeKey;
use crate::scene::bounds::BoundingSphere;
use crate::scene::group::Group;
use crate::scene::leaf::Leaf;

/// A vertex in the scene graph.
///
/// # Design Principles
///
/// - Nodes live in a [`SceneGraph`](crate::scene::SceneGraph) arena and refer
///   to each other through [`NodeKey`]s only; a node never owns another node.
/// - A node may be shared: it tracks the *set* of groups that currently hold
///   it as a child, which is what makes the graph a DAG rather than a tree.
/// - The bounding sphere is derived, expensive state. It is cached per node
///   and invalidated upward through the parent set, so a query never observes
///   a stale value and never recomputes a clean one.
///
/// # Hierarchy
///
/// The forward (parent → child) edge is owned by the parent's [`Group`]
/// content; this struct holds only the inverse edge, for propagation. The two
/// sides are kept consistent by routing every mutation through
/// [`SceneGraph::add_child`](crate::scene::SceneGraph::add_child) and
/// [`SceneGraph::remove_child`](crate::scene::SceneGraph::remove_child) —
/// which is why [`add_parent`](Self::add_parent) and
/// [`remove_parent`](Self::remove_parent) are crate-internal.
///
/// # Bounding cache
///
/// `bounds` is `None` until first computed and reset to `None` whenever the
/// node (or anything below it) is invalidated: absent *is* the dirty flag.
#[derive(Debug)]
pub struct Node {
    // === Core Hierarchy ===
    /// Groups that currently include this node as a child (inverse edges).
    pub(crate) parents: SmallVec<[NodeKey; 2]>,

    // === Derived State ===
    /// Cached bounding sphere; `None` means dirty.
    pub(crate) bounds: Option<BoundingSphere>,

    // === Core State ===
    /// Visibility flag; invisible nodes prune their subtree during traversal.
    pub visible: bool,

    /// What this node *is*: structural, group, or drawable leaf.
    pub(crate) content: NodeContent,
}

/// Tagged content dispatch for node variants.
///
/// The propagation protocols never need dynamic dispatch; only the
/// variant-specific hooks (bounds recomputation, cull, draw) do, and those
/// route through here.
#[derive(Debug)]
pub enum NodeContent {
    /// A structural node with no drawable content and no children.
    Empty,
    /// An interior node carrying a child list.
    Group(Group),
    /// A drawable node deferring to user hooks.
    Leaf(Box<dyn Leaf>),
}

impl Node {
    /// Creates a structural node with no content.
    #[must_use]
    pub fn new() -> Self {
        Self::with_content(NodeContent::Empty)
    }

    /// Creates an interior node with an empty child list.
    #[must_use]
    pub fn group() -> Self {
        Self::with_content(NodeContent::Group(Group::new()))
    }

    /// Creates a drawable node around the given hook implementation.
    #[must_use]
    pub fn leaf(leaf: impl Leaf + 'static) -> Self {
        Self::with_content(NodeContent::Leaf(Box::new(leaf)))
    }

    fn with_content(content: NodeContent) -> Self {
        Self {
            parents: SmallVec::new(),
            bounds: None,
            visible: true,
            content,
        }
    }

    /// Returns the number of distinct current parents.
    #[inline]
    #[must_use]
    pub fn count_parents(&self) -> usize {
        self.parents.len()
    }

    /// Returns a read-only snapshot of the current parent set.
    ///
    /// Iteration order is insertion order but carries no meaning; propagation
    /// results are order-independent.
    #[inline]
    #[must_use]
    pub fn parents(&self) -> &[NodeKey] {
        &self.parents
    }

    /// Returns the child keys, or an empty slice for non-group nodes.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        match &self.content {
            NodeContent::Group(group) => group.children(),
            _ => &[],
        }
    }

    #[inline]
    #[must_use]
    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    #[inline]
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.content, NodeContent::Group(_))
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        match &self.content {
            NodeContent::Group(group) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut Group> {
        match &mut self.content {
            NodeContent::Group(group) => Some(group),
            _ => None,
        }
    }

    /// True if the cached bounding sphere cannot be trusted.
    #[inline]
    #[must_use]
    pub fn is_bounds_dirty(&self) -> bool {
        self.bounds.is_none()
    }

    /// The cached bounding sphere, if clean.
    ///
    /// Prefer [`SceneGraph::bounding_sphere`](crate::scene::SceneGraph::bounding_sphere),
    /// which recomputes on demand and never returns a stale value.
    #[inline]
    #[must_use]
    pub fn cached_bounds(&self) -> Option<BoundingSphere> {
        self.bounds
    }

    /// Records `parent` in the parent set.
    ///
    /// Returns `true` if `parent` was not already present; returns `false`
    /// and mutates nothing otherwise. Called only by the graph's child-edge
    /// operations so the child list and this inverse set stay consistent.
    pub(crate) fn add_parent(&mut self, parent: NodeKey) -> bool {
        if self.parents.contains(&parent) {
            false
        } else {
            self.parents.push(parent);
            true
        }
    }

    /// Removes `parent` from the parent set.
    ///
    /// Returns `true` if it was present, `false` (no-op) otherwise.
    pub(crate) fn remove_parent(&mut self, parent: NodeKey) -> bool {
        if let Some(pos) = self.parents.iter().position(|&p| p == parent) {
            self.parents.remove(pos);
            true
        } else {
            false
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
