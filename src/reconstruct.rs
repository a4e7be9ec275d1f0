//! From one `Layer` message to a frame, an instance, render objects and a control section.

pub(crate) mod frame;
pub(crate) mod ids;
pub(crate) mod instance;
pub(crate) mod pipeline;
pub(crate) mod style;

pub use frame::{Frame, FrameKind, percent_position};
pub use ids::IdRegistry;
pub use instance::{Instance, TextInstance};
pub use pipeline::{Reconstructed, reconstruct_layer};
pub use style::{
    FALLBACK_FAMILY, FontDescriptor, align_center, apply_caps, cmyk_to_rgb, fill_color,
    font_family_base, font_size,
};
