use crate::foundation::core::{DocSize, Point};
use crate::reconstruct::{Frame, FrameKind, IdRegistry, Instance};

/// How one control section maps onto the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerBinding {
    /// Section key, `<layerName>-<frameId>`.
    pub key: String,
    /// Frame and render object id.
    pub frame_id: String,
    pub instance_id: String,
    pub kind: FrameKind,
    /// Size of the document the layer came from.
    pub doc: DocSize,
    /// Native layer size.
    pub width: u32,
    pub height: u32,
    /// Text stays horizontally centered in the document.
    pub centered: bool,
    /// Percent position last written through the panel (image layers).
    pub percent: Point,
}

/// Everything the rendering context knows about the current document.
///
/// Owned by the session and passed by reference into reconstruction, edits and clearing.
#[derive(Debug, Default)]
pub struct SceneState {
    ids: IdRegistry,
    frames: Vec<Frame>,
    instances: Vec<Instance>,
    bindings: Vec<LayerBinding>,
}

impl SceneState {
    /// Empty state drawing identifiers from `ids`.
    pub fn new(ids: IdRegistry) -> Self {
        Self {
            ids,
            frames: Vec::new(),
            instances: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Identifiers handed out for the current document.
    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    pub fn ids_mut(&mut self) -> &mut IdRegistry {
        &mut self.ids
    }

    /// Frames in reconstruction order, back to front.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Instances in the same order as `frames`.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn bindings(&self) -> &[LayerBinding] {
        &self.bindings
    }

    /// Record one reconstructed layer.
    pub fn push_layer(&mut self, frame: Frame, instance: Instance, binding: LayerBinding) {
        self.frames.push(frame);
        self.instances.push(instance);
        self.bindings.push(binding);
    }

    /// Look up a frame by its `F_` id.
    pub fn frame(&self, id: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    /// Look up an instance by its `I_` id.
    pub fn instance(&self, id: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn instance_mut(&mut self, id: &str) -> Option<&mut Instance> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    /// Look up a binding by section key.
    pub fn binding(&self, key: &str) -> Option<&LayerBinding> {
        self.bindings.iter().find(|b| b.key == key)
    }

    pub fn binding_mut(&mut self, key: &str) -> Option<&mut LayerBinding> {
        self.bindings.iter_mut().find(|b| b.key == key)
    }

    pub fn binding_for_instance(&self, instance_id: &str) -> Option<&LayerBinding> {
        self.bindings.iter().find(|b| b.instance_id == instance_id)
    }

    /// True when no layer has been recorded and no identifier is taken.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
            && self.instances.is_empty()
            && self.bindings.is_empty()
            && self.ids.is_empty()
    }

    /// Forget every identifier, frame, instance and binding.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.frames.clear();
        self.instances.clear();
        self.bindings.clear();
    }
}
