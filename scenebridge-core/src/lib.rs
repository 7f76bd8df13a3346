//! Host-side building blocks for SceneBridge.
//!
//! The scene graph, its path addressing, the undo history and the
//! registries that command handlers consult all live here. Nothing in this
//! crate knows about transports or tools.

pub mod assets;
pub mod directory;
pub mod document;
pub mod logging;
pub mod registry;
pub mod scene;
