//! Canvas geometry and pointer interaction.
//!
//! [`ViewTransform`] maps between normalized image coordinates and viewport
//! pixels under pan and zoom; [`InteractionController`] turns raw pointer
//! events into store intents.

mod interaction;
mod transform;

pub use interaction::{InteractionController, Intent, Preview};
pub use transform::{
    GeometryError, PanZoom, Point, ResizeHandle, ViewTransform, HANDLE_SIZE,
};
