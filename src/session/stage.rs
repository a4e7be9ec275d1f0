use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use serde_json::Value as JsonValue;

use crate::binding::{
    ControlPanel, DirectoryFontService, Edit, EditOutcome, EditRecord, EditTarget, FontEvent,
    FontRegistry, FontService, NoopFontService, apply_edit, request_font, settle_font,
};
use crate::decode::DocumentDecoder;
use crate::foundation::core::Point;
use crate::foundation::error::{StageError, StageResult};
use crate::protocol::{LayerPayload, Message, Payload, validate};
use crate::reconstruct::{FALLBACK_FAMILY, Frame, IdRegistry, Instance, reconstruct_layer};
use crate::render::{CpuSurface, FrameRgba, RenderSurface};
use crate::scene::{Camera, Compositor, SceneState};
use crate::session::opts::StageOpts;
use crate::worker::{ParsingWorker, WorkerEvent};

/// Where the stage is in its document lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum StageStatus {
    /// Nothing loaded yet, or the stage was cleared.
    Empty,
    /// A document is being parsed; input is disabled.
    Parsing,
    /// The last document finished parsing.
    Ready,
    /// The last document could not be parsed.
    Failed(String),
}

/// Frames, instances and sections of the current document.
#[derive(Clone, Debug, serde::Serialize)]
pub struct StageSnapshot<'a> {
    pub status: &'a StageStatus,
    pub frames: &'a [Frame],
    pub instances: &'a [Instance],
    pub panel: &'a ControlPanel,
}

/// The rendering context: one stage, one camera, one control panel, at most one parse in flight.
pub struct StageSession {
    opts: StageOpts,
    decoder: Arc<dyn DocumentDecoder>,
    scene: SceneState,
    compositor: Compositor,
    panel: ControlPanel,
    camera: Camera,
    fonts: FontRegistry,
    font_service: Box<dyn FontService>,
    font_tx: mpsc::Sender<FontEvent>,
    font_rx: mpsc::Receiver<FontEvent>,
    job: Option<ParsingWorker>,
    status: StageStatus,
}

impl std::fmt::Debug for StageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageSession")
            .field("status", &self.status)
            .field("objects", &self.compositor.len())
            .field("camera", &self.camera)
            .finish_non_exhaustive()
    }
}

impl StageSession {
    /// Create a session drawing to `surface`.
    ///
    /// The font service reads from `opts.font_dir` when set; otherwise every family settles as
    /// inactive.
    pub fn new(
        opts: StageOpts,
        decoder: Arc<dyn DocumentDecoder>,
        mut surface: Box<dyn RenderSurface>,
    ) -> StageResult<Self> {
        opts.validate()?;
        surface.resize(opts.viewport_width, opts.viewport_height)?;
        let font_service: Box<dyn FontService> = match &opts.font_dir {
            Some(dir) => Box::new(DirectoryFontService::new(dir)),
            None => Box::new(NoopFontService),
        };
        let ids = match opts.id_seed {
            Some(seed) => IdRegistry::new(seed, opts.id_max_retries),
            None => IdRegistry::new(crate::protocol::now_millis(), opts.id_max_retries),
        };
        let camera = Camera::new(
            (opts.viewport_width, opts.viewport_height),
            opts.initial_zoom,
            opts.zoom_factor,
        );
        let (font_tx, font_rx) = mpsc::channel();
        Ok(Self {
            decoder,
            scene: SceneState::new(ids),
            compositor: Compositor::new(surface),
            panel: ControlPanel::new(),
            camera,
            fonts: FontRegistry::new(),
            font_service,
            font_tx,
            font_rx,
            job: None,
            status: StageStatus::Empty,
            opts,
        })
    }

    /// Create a session with the `vello_cpu` surface, loading `opts.default_font` if set.
    pub fn with_cpu_surface(
        opts: StageOpts,
        decoder: Arc<dyn DocumentDecoder>,
    ) -> StageResult<Self> {
        let mut surface = CpuSurface::new(opts.viewport_width, opts.viewport_height)?
            .with_clear_rgba(opts.clear_rgba);
        let default_font = match &opts.default_font {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read default font '{}'", path.display()))?;
                surface.text_engine_mut().register(FALLBACK_FAMILY, bytes)?;
                true
            }
            None => false,
        };
        let mut session = Self::new(opts, decoder, Box::new(surface))?;
        if default_font {
            session.fonts.mark_loaded(FALLBACK_FAMILY);
        }
        Ok(session)
    }

    /// Replace the font service. Requests already in flight still settle through the old one.
    pub fn with_font_service(mut self, service: Box<dyn FontService>) -> Self {
        self.font_service = service;
        self
    }

    /// Start parsing a new document.
    ///
    /// The stage is cleared first and the document gets a worker of its own, so nothing from a
    /// previous document can reach the new scene.
    #[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
    pub fn open_document(&mut self, bytes: Vec<u8>) -> StageResult<()> {
        if self.is_busy() {
            return Err(StageError::busy("a document is already being parsed"));
        }
        self.clear();
        let worker = ParsingWorker::spawn(Arc::clone(&self.decoder))?;
        worker.post(Message::parse_data(bytes))?;
        self.job = Some(worker);
        self.status = StageStatus::Parsing;
        tracing::info!("document posted to parsing worker");
        Ok(())
    }

    /// Remove every layer, frame, instance, identifier and control section.
    pub fn clear(&mut self) {
        self.job = None;
        self.scene.clear();
        self.compositor.clear();
        self.panel.clear();
        self.fonts.clear_pending();
        self.status = StageStatus::Empty;
    }

    pub fn is_busy(&self) -> bool {
        self.status == StageStatus::Parsing
    }

    /// Handle every event already waiting, without blocking. Returns how many were handled.
    pub fn pump(&mut self) -> StageResult<usize> {
        let mut handled = 0;
        while let Some(ev) = self.job.as_ref().and_then(ParsingWorker::try_next) {
            self.on_worker_event(ev)?;
            handled += 1;
        }
        while let Ok(ev) = self.font_rx.try_recv() {
            self.on_font_event(ev)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Block until the current parse is over and no font is in flight, or `timeout` passes.
    pub fn wait_idle(&mut self, timeout: Duration) -> StageResult<&StageStatus> {
        let deadline = Instant::now() + timeout;
        while self.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(job) = self.job.as_ref() else {
                break;
            };
            match job.next_timeout(remaining) {
                Ok(ev) => self.on_worker_event(ev)?,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    return Err(StageError::busy(format!(
                        "document still parsing after {timeout:?}"
                    )));
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.fail("parsing worker exited without finishing");
                }
            }
        }
        while self.fonts.in_flight_count() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.font_rx.recv_timeout(remaining) {
                Ok(ev) => {
                    self.on_font_event(ev)?;
                }
                Err(_) => {
                    tracing::warn!(
                        in_flight = self.fonts.in_flight_count(),
                        "fonts still loading; continuing without them"
                    );
                    break;
                }
            }
        }
        Ok(&self.status)
    }

    fn on_worker_event(&mut self, ev: WorkerEvent) -> StageResult<()> {
        let msg = match ev {
            WorkerEvent::Message(msg) => msg,
            WorkerEvent::Failed(err) => {
                self.fail(&err.to_string());
                return Ok(());
            }
        };
        if let Err(err) = validate(&msg) {
            tracing::warn!(%err, "dropped an invalid worker message");
            return Ok(());
        }
        tracing::debug!(
            latency_ms = msg.latency_ms(),
            kind = %msg.kind,
            "message transit (worker -> main)"
        );
        match msg.value {
            Payload::Layer(layer) => self.on_layer(*layer),
            Payload::EndParsing => self.on_end_parsing(),
            Payload::MainImageData(_) => {
                tracing::debug!("document preview ignored");
                Ok(())
            }
            Payload::ParseData(_) => {
                tracing::warn!("unexpected ParseData from the worker");
                Ok(())
            }
        }
    }

    fn on_layer(&mut self, layer: LayerPayload) -> StageResult<()> {
        let name = layer.layer_name.clone();
        let rebuilt =
            match reconstruct_layer(layer, &mut self.scene, &mut self.compositor, &mut self.panel) {
                Ok(r) => r,
                Err(err) => {
                    tracing::warn!(layer = %name, %err, "layer skipped");
                    return Ok(());
                }
            };
        if let Some(family) = rebuilt.font_family.as_deref() {
            if !self.fonts.is_loaded(family) {
                let instance_id = rebuilt.instance_id.clone();
                request_font(&mut self.edit_target(), &instance_id, family);
            }
        }
        // The layer stays attached; a frame that cannot be drawn is retried on the next render.
        if let Err(err) = self.compositor.request_render(&self.camera) {
            tracing::warn!(layer = %name, %err, "render after layer failed");
        }
        Ok(())
    }

    fn on_end_parsing(&mut self) -> StageResult<()> {
        let [dx, dy] = self.opts.end_nudge;
        self.camera.nudge(dx, dy);
        self.job = None;
        self.status = StageStatus::Ready;
        tracing::info!(layers = self.compositor.len(), "document ready");
        if let Err(err) = self.compositor.request_render(&self.camera) {
            tracing::warn!(%err, "render after parsing failed");
        }
        Ok(())
    }

    fn on_font_event(&mut self, ev: FontEvent) -> StageResult<usize> {
        settle_font(&mut self.edit_target(), ev)
    }

    fn fail(&mut self, reason: &str) {
        tracing::error!(reason, "document failed to parse");
        self.job = None;
        self.status = StageStatus::Failed(reason.to_owned());
    }

    fn edit_target(&mut self) -> EditTarget<'_> {
        EditTarget {
            scene: &mut self.scene,
            compositor: &mut self.compositor,
            panel: &mut self.panel,
            fonts: &mut self.fonts,
            font_service: self.font_service.as_ref(),
            font_events: &self.font_tx,
            camera: &self.camera,
        }
    }

    /// Apply one control change to the section keyed `section`.
    pub fn edit(&mut self, section: &str, edit: Edit) -> StageResult<EditOutcome> {
        apply_edit(&mut self.edit_target(), section, edit)
    }

    /// Apply a raw panel notification, `name` being the control and `value` its new value.
    pub fn edit_field(
        &mut self,
        section: &str,
        name: &str,
        value: &JsonValue,
    ) -> StageResult<EditOutcome> {
        let edit = Edit::from_field(name, value)?;
        self.edit(section, edit)
    }

    /// Replay recorded edits in order, stopping at the first one that fails.
    pub fn replay(&mut self, records: &[EditRecord]) -> StageResult<()> {
        for record in records {
            self.edit(&record.section, record.to_edit()?)?;
        }
        Ok(())
    }

    pub fn start_pan(&mut self, pointer: Point) {
        self.camera.start_pan(pointer);
    }

    /// Drag the view; redraws only if a pan is in progress.
    pub fn continue_pan(&mut self, pointer: Point) -> StageResult<()> {
        if self.camera.continue_pan(pointer) {
            self.compositor.request_render(&self.camera)?;
        }
        Ok(())
    }

    pub fn end_pan(&mut self) {
        self.camera.end_pan();
    }

    pub fn zoom_in(&mut self) -> StageResult<()> {
        self.camera.zoom_in();
        self.compositor.request_render(&self.camera)
    }

    pub fn zoom_out(&mut self) -> StageResult<()> {
        self.camera.zoom_out();
        self.compositor.request_render(&self.camera)
    }

    /// Scroll wheel: positive deltas zoom out, negative zoom in, zero does nothing.
    pub fn wheel(&mut self, delta: f64) -> StageResult<()> {
        if delta > 0.0 {
            self.zoom_out()
        } else if delta < 0.0 {
            self.zoom_in()
        } else {
            Ok(())
        }
    }

    /// Match the viewport to a new window size.
    pub fn resize(&mut self, width: u32, height: u32) -> StageResult<()> {
        self.compositor.resize(width, height)?;
        self.camera.resize(width, height);
        self.compositor.request_render(&self.camera)
    }

    pub fn render(&mut self) -> StageResult<()> {
        self.compositor.request_render(&self.camera)
    }

    pub fn opts(&self) -> &StageOpts {
        &self.opts
    }

    pub fn status(&self) -> &StageStatus {
        &self.status
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Last frame drawn, if the surface keeps one.
    pub fn frame(&self) -> Option<&FrameRgba> {
        self.compositor.frame()
    }

    pub fn snapshot(&self) -> StageSnapshot<'_> {
        StageSnapshot {
            status: &self.status,
            frames: self.scene.frames(),
            instances: self.scene.instances(),
            panel: &self.panel,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/stage.rs"]
mod tests;
