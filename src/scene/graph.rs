//! Scene graph container
//!
//! `SceneGraph` is the pure data layer: it owns the node arena, the
//! registered roots, and the graph-wide protocols — edge management that
//! keeps both directions of every parent/child link consistent, upward
//! dirty propagation for the bounding caches, the redraw broadcast, and the
//! entry points of the two traversal phases.

use rustc_hash::FxHashSet;
use slotmap::{SlotMap, SparseSecondaryMap};
use smallvec::SmallVec;

use crate::errors::{CanopyError, Result};
use crate::scene::NodeKey;
use crate::scene::bounds::BoundingSphere;
use crate::scene::context::{CullContext, DrawContext};
use crate::scene::node::{Node, NodeContent};
use crate::scene::traverse;
use crate::utils::ChangeTracker;

/// Arena-backed scene graph.
///
/// Nodes are stored behind generational keys and refer to each other only
/// through those keys, so sharing a subtree under several parents is just a
/// matter of recording the extra edges — no ownership changes hands.
///
/// # Roots
///
/// Roots are the nodes a display canvas renders from. They anchor the
/// traversal phases and terminate the redraw broadcast: a
/// [`dirty_draw`](Self::dirty_draw) that reaches a registered root bumps the
/// graph's redraw version, which canvases poll between frames.
pub struct SceneGraph {
    pub(crate) nodes: SlotMap<NodeKey, Node>,
    roots: Vec<NodeKey>,
    names: SparseSecondaryMap<NodeKey, String>,
    redraw: ChangeTracker,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            names: SparseSecondaryMap::new(),
            redraw: ChangeTracker::new(),
        }
    }

    // ========================================================================
    // Node storage
    // ========================================================================

    /// Inserts a node with no parents and no root registration.
    pub fn add_node(&mut self, node: Node) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Inserts a node and registers it as a root.
    pub fn add_root(&mut self, node: Node) -> NodeKey {
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Inserts a node and attaches it under `parent` in one step.
    pub fn add_child_node(&mut self, parent: NodeKey, node: Node) -> Result<NodeKey> {
        // Validate the parent before committing the insert.
        let parent_node = self.nodes.get(parent).ok_or(CanopyError::NodeNotFound(parent))?;
        if !parent_node.is_group() {
            return Err(CanopyError::NotAGroup(parent));
        }

        let key = self.nodes.insert(node);
        self.add_child(parent, key)?;
        Ok(key)
    }

    /// Removes a node, severing every edge that touches it.
    ///
    /// Former parents lose the child (and get their bounds dirtied); former
    /// children lose one parent but stay in the arena — with a shared
    /// subtree, the other parents still hold them.
    pub fn remove_node(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.remove(key) else {
            return;
        };

        for &parent in &node.parents {
            if let Some(parent_node) = self.nodes.get_mut(parent)
                && let Some(group) = parent_node.as_group_mut()
            {
                group.remove_child(key);
            }
            self.dirty_bounds(parent);
        }

        if let NodeContent::Group(group) = node.content {
            for &child in group.children() {
                if let Some(child_node) = self.nodes.get_mut(child) {
                    child_node.remove_parent(key);
                }
            }
        }

        self.roots.retain(|&root| root != key);
        self.names.remove(key);
    }

    #[must_use]
    pub fn get_node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    #[must_use]
    pub fn get_node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    // ========================================================================
    // Roots
    // ========================================================================

    #[must_use]
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Registers an existing node as a root. Returns `false` if it already
    /// was one.
    pub fn make_root(&mut self, key: NodeKey) -> Result<bool> {
        if !self.nodes.contains_key(key) {
            return Err(CanopyError::NodeNotFound(key));
        }
        if self.roots.contains(&key) {
            return Ok(false);
        }
        self.roots.push(key);
        Ok(true)
    }

    /// Unregisters a root. Returns whether it was registered.
    pub fn remove_root(&mut self, key: NodeKey) -> bool {
        let before = self.roots.len();
        self.roots.retain(|&root| root != key);
        self.roots.len() != before
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Attaches a debug name to a live node; no-op for stale keys.
    pub fn set_name(&mut self, key: NodeKey, name: impl Into<String>) {
        if self.nodes.contains_key(key) {
            self.names.insert(key, name.into());
        }
    }

    #[must_use]
    pub fn name(&self, key: NodeKey) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    // ========================================================================
    // Edge management (the Group side of the protocol)
    // ========================================================================

    /// Establishes a parent → child edge.
    ///
    /// Records both directions atomically: the child joins the group's child
    /// list exactly when the group joins the child's parent set. Returns
    /// `Ok(false)` (no mutation) if the edge already exists.
    ///
    /// A new edge dirties the parent's bounding cache — its envelope now has
    /// one more member to cover.
    ///
    /// # Errors
    ///
    /// [`CanopyError::NodeNotFound`] for stale keys,
    /// [`CanopyError::NotAGroup`] if `parent` carries no child list, and
    /// [`CanopyError::CycleDetected`] if `child` is `parent` itself or one
    /// of its ancestors — the graph stays acyclic so that upward walks
    /// terminate.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<bool> {
        let parent_node = self.nodes.get(parent).ok_or(CanopyError::NodeNotFound(parent))?;
        if !parent_node.is_group() {
            return Err(CanopyError::NotAGroup(parent));
        }
        if !self.nodes.contains_key(child) {
            return Err(CanopyError::NodeNotFound(child));
        }
        if self.creates_cycle(parent, child) {
            return Err(CanopyError::CycleDetected { parent, child });
        }

        let child_node = &mut self.nodes[child];
        if !child_node.add_parent(parent) {
            return Ok(false);
        }

        // The inverse edge is recorded; mirror it on the forward side.
        if let Some(group) = self.nodes[parent].as_group_mut() {
            group.push_child(child);
        }

        // An attached child is no longer a free-standing root.
        self.roots.retain(|&root| root != child);

        self.dirty_bounds(parent);
        Ok(true)
    }

    /// Severs a parent → child edge.
    ///
    /// Returns `Ok(false)` (no mutation) if no such edge exists. The child
    /// stays in the arena, detached on that side only.
    ///
    /// # Errors
    ///
    /// [`CanopyError::NodeNotFound`] for stale keys,
    /// [`CanopyError::NotAGroup`] if `parent` carries no child list.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<bool> {
        let parent_node = self.nodes.get(parent).ok_or(CanopyError::NodeNotFound(parent))?;
        if !parent_node.is_group() {
            return Err(CanopyError::NotAGroup(parent));
        }
        let child_node = self.nodes.get_mut(child).ok_or(CanopyError::NodeNotFound(child))?;

        if !child_node.remove_parent(parent) {
            return Ok(false);
        }
        if let Some(group) = self.nodes[parent].as_group_mut() {
            group.remove_child(child);
        }

        self.dirty_bounds(parent);
        Ok(true)
    }

    /// True if adding `parent → child` would close a cycle, i.e. `child`
    /// already lies on some upward path from `parent` (or is `parent`).
    ///
    /// The walk carries a visited set so diamond sharing stays linear.
    fn creates_cycle(&self, parent: NodeKey, child: NodeKey) -> bool {
        let mut visited: FxHashSet<NodeKey> = FxHashSet::default();
        let mut stack: SmallVec<[NodeKey; 8]> = SmallVec::new();
        stack.push(parent);

        while let Some(key) = stack.pop() {
            if key == child {
                return true;
            }
            if !visited.insert(key) {
                continue;
            }
            if let Some(node) = self.nodes.get(key) {
                stack.extend(node.parents().iter().copied());
            }
        }
        false
    }

    // ========================================================================
    // Dirty propagation
    // ========================================================================

    /// Invalidates the bounding cache of `key` and of every ancestor
    /// reachable through the parent graph.
    ///
    /// The walk short-circuits at nodes that are already dirty: when a node
    /// was first dirtied, everything above it was dirtied with it, so there
    /// is nothing left to do on that path. Calling this on an already-dirty
    /// node is a no-op.
    pub fn dirty_bounds(&mut self, key: NodeKey) {
        let mut stack: SmallVec<[NodeKey; 8]> = SmallVec::new();
        stack.push(key);

        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current) else {
                continue;
            };
            if node.bounds.is_none() {
                continue;
            }
            node.bounds = None;
            stack.extend(node.parents().iter().copied());
        }
    }

    /// Requests a redraw of every canvas this node may be rendered in.
    ///
    /// Pure broadcast: unlike [`dirty_bounds`](Self::dirty_bounds) there is
    /// no per-node "already requested" state, so every call walks every
    /// ancestor path. When the walk reaches a registered root the graph's
    /// redraw version is bumped (once per call at most); canvases merge
    /// requests by polling [`redraw_version`](Self::redraw_version). A
    /// detached node reaches no root and changes nothing.
    pub fn dirty_draw(&mut self, key: NodeKey) {
        if !self.nodes.contains_key(key) {
            return;
        }

        let mut reached_root = false;
        let mut stack: SmallVec<[NodeKey; 8]> = SmallVec::new();
        stack.push(key);

        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if self.roots.contains(&current) {
                reached_root = true;
            }
            stack.extend(node.parents().iter().copied());
        }

        if reached_root {
            self.redraw.changed();
        }
    }

    /// The current redraw version. Canvases record the value they last
    /// rendered and repaint when it moves.
    #[must_use]
    pub fn redraw_version(&self) -> u64 {
        self.redraw.version()
    }

    // ========================================================================
    // Bounding volumes
    // ========================================================================

    /// Returns the node's bounding sphere, recomputing it first if the
    /// cache is dirty — the result is always valid for the graph as it is
    /// *now*, never stale.
    ///
    /// Group spheres are the union of their children's (computed
    /// recursively, so one call cleans the whole dirty subtree); leaf
    /// spheres come from the content hook; structural nodes are empty. A
    /// stale key yields the empty sphere.
    pub fn bounding_sphere(&mut self, key: NodeKey) -> BoundingSphere {
        enum Recompute {
            Value(BoundingSphere),
            Children(SmallVec<[NodeKey; 8]>),
        }

        let plan = match self.nodes.get(key) {
            None => return BoundingSphere::empty(),
            Some(node) => {
                if let Some(cached) = node.bounds {
                    return cached;
                }
                match node.content() {
                    NodeContent::Empty => Recompute::Value(BoundingSphere::empty()),
                    NodeContent::Leaf(leaf) => Recompute::Value(leaf.bounding_sphere()),
                    NodeContent::Group(group) => {
                        Recompute::Children(group.children().iter().copied().collect())
                    }
                }
            }
        };

        let sphere = match plan {
            Recompute::Value(sphere) => sphere,
            Recompute::Children(children) => children
                .into_iter()
                .fold(BoundingSphere::empty(), |acc, child| {
                    acc.union(&self.bounding_sphere(child))
                }),
        };

        // Store only after the computation succeeded; a panicking hook
        // leaves the cache dirty and the next call retries.
        if let Some(node) = self.nodes.get_mut(key) {
            node.bounds = Some(sphere);
        }
        sphere
    }

    /// True if the node's cached sphere cannot be trusted (or the key is
    /// stale).
    #[must_use]
    pub fn is_bounds_dirty(&self, key: NodeKey) -> bool {
        self.nodes.get(key).is_none_or(Node::is_bounds_dirty)
    }

    // ========================================================================
    // Traversal phases
    // ========================================================================

    /// Runs the cull phase from every root.
    ///
    /// Refreshes the bounding caches first (the per-group view-volume test
    /// reads them), resets the context's draw list, then hands off to the
    /// traversal system. After the call the context's draw list holds
    /// whatever work the cull hooks appended, and its node stack is back at
    /// depth zero.
    pub fn cull(&mut self, ctx: &mut CullContext) {
        ctx.reset();

        let roots: SmallVec<[NodeKey; 8]> = self.roots.iter().copied().collect();
        for &root in &roots {
            self.bounding_sphere(root);
        }

        traverse::cull(&self.nodes, &roots, ctx);
    }

    /// Runs the draw phase from every root, in the same order as
    /// [`cull`](Self::cull).
    pub fn draw(&self, ctx: &mut DrawContext<'_>) {
        traverse::draw(&self.nodes, &self.roots, ctx);
    }
}
