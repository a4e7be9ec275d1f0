//! Layerstage rebuilds an editable 2D stage from the layers of a layered design document.
//!
//! The flow is message-driven:
//!
//! - A [`StageSession`] posts the document bytes to a [`ParsingWorker`] thread
//! - The worker decodes them with a [`DocumentDecoder`] and streams one `Layer` message per layer,
//!   back to front, then `EndParsing`
//! - Each layer becomes a frame, an instance, a render object on the [`Compositor`] and a section
//!   of the [`ControlPanel`], whose edits flow back into the scene
#![forbid(unsafe_code)]

mod foundation;

/// Control sections and the edits they produce.
pub mod binding;
/// Decoder boundary and the JSON manifest decoder.
pub mod decode;
/// Signed message envelope.
pub mod protocol;
/// Layer reconstruction.
pub mod reconstruct;
/// Render surfaces.
pub mod render;
/// Render objects, compositor and camera.
pub mod scene;
/// The rendering context.
pub mod session;
/// The parsing worker.
pub mod worker;

pub use crate::foundation::core::{Affine, DocSize, LayerBounds, Point, Rect, Rgb8, Vec2};
pub use crate::foundation::error::{StageError, StageResult};

pub use crate::binding::{ControlPanel, Edit, EditOutcome, EditRecord, FontService};
pub use crate::decode::{DocumentDecoder, ManifestDecoder};
pub use crate::protocol::{Message, MessageKind, Payload};
pub use crate::render::{CpuSurface, FrameRgba, RecordingSurface, RenderSurface};
pub use crate::scene::{Camera, Compositor};
pub use crate::session::{StageOpts, StageSession, StageSnapshot, StageStatus};
pub use crate::worker::{ParsingWorker, WorkerEvent};
