//! The rendering context that ties the worker, the stage and the control panel together.

pub(crate) mod opts;
pub(crate) mod stage;

pub use opts::StageOpts;
pub use stage::{StageSession, StageSnapshot, StageStatus};
