//! The mutable stage: render objects, the viewport camera and per-document state.

pub(crate) mod camera;
pub(crate) mod compositor;
pub(crate) mod node;
pub(crate) mod state;

pub use camera::Camera;
pub use compositor::Compositor;
pub use node::{BitmapNode, Mask, RenderObject, TextNode};
pub use state::{LayerBinding, SceneState};
