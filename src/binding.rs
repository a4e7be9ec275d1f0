//! Control sections bound to render objects, and the edits that flow back from them.

pub(crate) mod edit;
pub(crate) mod fonts;
pub(crate) mod panel;
pub(crate) mod reducer;

pub use edit::{Edit, EditRecord};
pub use fonts::{
    DirectoryFontService, FontEvent, FontOutcome, FontRegistry, FontRequest, FontRequestToken,
    FontService, NoopFontService,
};
pub use panel::{ControlPanel, Field, FieldValue, Section, section_key};
pub use reducer::{EditOutcome, EditTarget, apply_edit, request_font, settle_font};
