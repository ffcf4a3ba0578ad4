#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

pub mod errors;
pub mod scene;
pub mod utils;

pub use errors::{CanopyError, Result};
pub use scene::{
    AttributeBits, AttributeStack, BoundingSphere, CullContext, DrawContext, Group, Leaf, Node,
    NodeContent, NodeKey, NullAttributes, SceneGraph, TraversalSettings,
};
pub use scene::traverse::{CullScope, DrawScope};
pub use utils::ChangeTracker;
