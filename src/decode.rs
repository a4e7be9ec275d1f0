//! Boundary to the layered-document decoder.
//!
//! Turning a binary design file into layers is the job of an external parser. This module fixes
//! the shape that parser must hand back ([`DecodedDocument`]) and ships [`ManifestDecoder`], a
//! JSON-manifest decoder that produces the same shape for tests, fixtures and the CLI.

pub(crate) mod manifest;
pub(crate) mod model;

use crate::foundation::error::StageResult;

pub use manifest::ManifestDecoder;
pub use model::{
    DecodedDocument, DecodedLayer, FillColor, FontResource, LayerProperties, LayerRaster,
    StyleSheet, TextLayerMeta, TextMetadata, TextTransform,
};

/// A parser for layered design documents.
///
/// Implementations run on the parsing worker thread, so they must be shareable across threads.
pub trait DocumentDecoder: Send + Sync {
    /// Decode a whole-file buffer.
    ///
    /// Layers are returned in storage order (front-most first).
    fn parse(&self, bytes: &[u8]) -> StageResult<DecodedDocument>;
}
