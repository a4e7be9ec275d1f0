//! Signed, timestamped envelope for everything that crosses the worker boundary.

pub(crate) mod message;

pub use message::{
    DocumentPreview, LayerPayload, Message, MessageKind, Payload, SIGNATURE, now_millis, validate,
    validate_wire,
};
