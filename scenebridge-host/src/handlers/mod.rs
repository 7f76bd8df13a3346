//! Built-in command handlers
//!
//! - [`scene`]: `scene.*`, nodes and scene containers
//! - [`asset`]: `asset.*`, content search

mod asset;
mod scene;

pub use asset::{AssetAction, AssetCommandHandler};
pub use scene::{SceneAction, SceneCommandHandler};
