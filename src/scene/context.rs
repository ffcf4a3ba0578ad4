//! Traversal Context System
//!
//! Provides two phase-separated contexts for the render traversal:
//!
//! - [`CullContext`]: context for the **cull** phase. Carries the node stack,
//!   the view volume culling decisions test against, and the draw list that
//!   cull hooks push work into.
//!
//! - [`DrawContext`]: context for the **draw** phase. Carries the node stack
//!   plus the opaque attribute save/restore pair, so per-node attribute
//!   changes cannot leak to siblings.
//!
//! # Design Principles
//!
//! 1. **Strict nesting**: both contexts are stacks. Every Begin must pair
//!    with an End on every exit path; the traversal system wraps the pair in
//!    RAII scopes so even a panicking hook unwinds balanced.
//! 2. **Opaque attribute state**: this crate never touches graphics-API
//!    state itself. The draw phase only pushes and pops an [`AttributeBits`]
//!    mark through the caller-supplied [`AttributeStack`] collaborator.

use bitflags::bitflags;

use crate::scene::NodeKey;
use crate::scene::bounds::BoundingSphere;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Traversal configuration.
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `expected_depth` | 16 | Stack preallocation; deeper graphs still work |
/// | `prune_invisible` | `true` | Whether `visible = false` prunes a subtree |
#[derive(Debug, Clone, Copy)]
pub struct TraversalSettings {
    /// Expected traversal depth, used to size the context stacks up front.
    pub expected_depth: usize,
    /// When set, nodes with `visible = false` are skipped along with their
    /// entire subtree during both phases.
    pub prune_invisible: bool,
}

impl Default for TraversalSettings {
    fn default() -> Self {
        Self {
            expected_depth: 16,
            prune_invisible: true,
        }
    }
}

// ─── Attribute marks ─────────────────────────────────────────────────────────

bitflags! {
    /// Opaque mark naming which attribute groups a draw save covers.
    ///
    /// The crate itself only ever saves [`AttributeBits::ALL`] around each
    /// node; the finer groups exist so an [`AttributeStack`] backend can
    /// snapshot selectively.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeBits: u32 {
        const COLOR    = 1 << 0;
        const DEPTH    = 1 << 1;
        const BLEND    = 1 << 2;
        const LIGHTING = 1 << 3;
        const LINE     = 1 << 4;
        const POLYGON  = 1 << 5;
        const TEXTURE  = 1 << 6;
        const ALL = Self::COLOR.bits()
            | Self::DEPTH.bits()
            | Self::BLEND.bits()
            | Self::LIGHTING.bits()
            | Self::POLYGON.bits()
            | Self::LINE.bits()
            | Self::TEXTURE.bits();
    }
}

/// Graphics-attribute snapshot collaborator.
///
/// Implemented by the embedder over whatever attribute state its graphics
/// API carries. Calls arrive strictly nested: every `save` is matched by
/// exactly one `restore`, LIFO, to arbitrary depth.
pub trait AttributeStack {
    /// Snapshots the attribute groups named by `mark`.
    fn save(&mut self, mark: AttributeBits);

    /// Restores the most recent unrestored snapshot.
    fn restore(&mut self);
}

/// An [`AttributeStack`] that records nothing. Useful for headless
/// traversals and for graphs whose leaves do not touch attribute state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAttributes;

impl AttributeStack for NullAttributes {
    fn save(&mut self, _mark: AttributeBits) {}
    fn restore(&mut self) {}
}

// ─── Node stack ──────────────────────────────────────────────────────────────

/// LIFO node path shared by both context types.
#[derive(Debug)]
struct NodeStack {
    stack: Vec<NodeKey>,
}

impl NodeStack {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, key: NodeKey) {
        self.stack.push(key);
    }

    fn pop(&mut self) -> Option<NodeKey> {
        self.stack.pop()
    }

    fn current(&self) -> Option<NodeKey> {
        self.stack.last().copied()
    }

    fn path(&self) -> &[NodeKey] {
        &self.stack
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn clear(&mut self) {
        self.stack.clear();
    }
}

// ─── Cull context ────────────────────────────────────────────────────────────

/// Per-traversal state for the cull phase.
///
/// The node stack mirrors the depth-first descent, so a cull hook can ask
/// for the current node or the full ancestor chain. Hooks that decide their
/// content is worth drawing push it into the draw list.
#[derive(Debug)]
pub struct CullContext {
    nodes: NodeStack,
    draw_list: Vec<NodeKey>,
    view_volume: Option<BoundingSphere>,
    settings: TraversalSettings,
}

impl CullContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(TraversalSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: TraversalSettings) -> Self {
        Self {
            nodes: NodeStack::with_capacity(settings.expected_depth),
            draw_list: Vec::new(),
            view_volume: None,
            settings,
        }
    }

    /// Sets the volume that group bounds are tested against. `None` disables
    /// the test, so the whole visible graph is descended.
    pub fn set_view_volume(&mut self, volume: Option<BoundingSphere>) {
        self.view_volume = volume;
    }

    #[must_use]
    pub fn view_volume(&self) -> Option<&BoundingSphere> {
        self.view_volume.as_ref()
    }

    /// True if `bounds` may be visible in the current view volume.
    #[must_use]
    pub fn intersects_view(&self, bounds: &BoundingSphere) -> bool {
        match &self.view_volume {
            Some(volume) => volume.intersects(bounds),
            None => true,
        }
    }

    /// Pushes `key` onto the node stack. Part of the Begin half of the
    /// Begin/hook/End triple.
    pub fn push_node(&mut self, key: NodeKey) {
        self.nodes.push(key);
    }

    /// Pops the top of the node stack. Part of the End half.
    pub fn pop_node(&mut self) -> Option<NodeKey> {
        self.nodes.pop()
    }

    /// The node whose Begin/End pair we are currently inside, if any.
    #[must_use]
    pub fn current_node(&self) -> Option<NodeKey> {
        self.nodes.current()
    }

    /// Root-to-current ancestor chain.
    #[must_use]
    pub fn node_path(&self) -> &[NodeKey] {
        self.nodes.path()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes.depth()
    }

    #[must_use]
    pub fn settings(&self) -> TraversalSettings {
        self.settings
    }

    /// Appends drawable work for the draw phase / renderer to consume.
    pub fn append_drawable(&mut self, key: NodeKey) {
        self.draw_list.push(key);
    }

    #[must_use]
    pub fn draw_list(&self) -> &[NodeKey] {
        &self.draw_list
    }

    /// Clears the draw list and node stack, keeping settings and view
    /// volume. Called at the start of each cull traversal.
    pub fn reset(&mut self) {
        self.draw_list.clear();
        self.nodes.clear();
    }
}

impl Default for CullContext {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Draw context ────────────────────────────────────────────────────────────

/// Per-traversal state for the draw phase.
///
/// Wraps the embedder's [`AttributeStack`]; the traversal saves a full
/// attribute mark on node entry and restores it on exit, so whatever a draw
/// hook changes stays scoped to its own subtree.
pub struct DrawContext<'a> {
    nodes: NodeStack,
    attributes: &'a mut dyn AttributeStack,
    settings: TraversalSettings,
}

impl<'a> DrawContext<'a> {
    #[must_use]
    pub fn new(attributes: &'a mut dyn AttributeStack) -> Self {
        Self::with_settings(attributes, TraversalSettings::default())
    }

    #[must_use]
    pub fn with_settings(attributes: &'a mut dyn AttributeStack, settings: TraversalSettings) -> Self {
        Self {
            nodes: NodeStack::with_capacity(settings.expected_depth),
            attributes,
            settings,
        }
    }

    /// Pushes `key` onto the node stack. Part of the Begin half.
    pub fn push_node(&mut self, key: NodeKey) {
        self.nodes.push(key);
    }

    /// Pops the top of the node stack. Part of the End half.
    pub fn pop_node(&mut self) -> Option<NodeKey> {
        self.nodes.pop()
    }

    #[must_use]
    pub fn current_node(&self) -> Option<NodeKey> {
        self.nodes.current()
    }

    #[must_use]
    pub fn node_path(&self) -> &[NodeKey] {
        self.nodes.path()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes.depth()
    }

    #[must_use]
    pub fn settings(&self) -> TraversalSettings {
        self.settings
    }

    /// Forwards a snapshot request to the attribute collaborator.
    pub fn save_attributes(&mut self, mark: AttributeBits) {
        self.attributes.save(mark);
    }

    /// Forwards a restore request to the attribute collaborator.
    pub fn restore_attributes(&mut self) {
        self.attributes.restore();
    }
}

impl std::fmt::Debug for DrawContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawContext")
            .field("nodes", &self.nodes)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
