//! The parsing side of the boundary.
//!
//! A [`ParsingWorker`] owns a [`DocumentDecoder`] on its own thread. It accepts validated
//! [`Message`]s, and for each `ParseData` it decodes the document, composites every layer in
//! paint order and streams one `Layer` message per layer followed by `EndParsing`.

use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::decode::{DecodedLayer, DocumentDecoder, TextMetadata};
use crate::foundation::core::DocSize;
use crate::foundation::error::{StageError, StageResult};
use crate::protocol::{LayerPayload, Message, Payload, validate};

/// Everything the worker can send back.
#[derive(Debug)]
pub enum WorkerEvent {
    /// A protocol message.
    Message(Message),
    /// The current parse attempt failed; no layers were emitted for it.
    Failed(StageError),
}

/// Outcome of one parse run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// `Layer` messages sent.
    pub emitted: usize,
    /// Names of layers skipped because compositing failed.
    pub skipped: Vec<String>,
    /// The receiving side hung up before the run finished.
    pub cancelled: bool,
}

/// Handle to a running parsing thread.
///
/// Dropping the handle closes both channels; a worker mid-parse stops at its next send.
pub struct ParsingWorker {
    inbox: mpsc::Sender<Message>,
    events: mpsc::Receiver<WorkerEvent>,
    _thread: JoinHandle<()>,
}

impl std::fmt::Debug for ParsingWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsingWorker").finish_non_exhaustive()
    }
}

impl ParsingWorker {
    /// Start a worker thread owning `decoder`.
    pub fn spawn(decoder: Arc<dyn DocumentDecoder>) -> StageResult<Self> {
        let (inbox_tx, inbox_rx) = mpsc::channel::<Message>();
        let (events_tx, events_rx) = mpsc::channel::<WorkerEvent>();
        let thread = std::thread::Builder::new()
            .name("layerstage-parse".to_owned())
            .spawn(move || worker_loop(decoder.as_ref(), inbox_rx, events_tx))
            .map_err(|e| StageError::Other(anyhow::Error::new(e).context("spawn parsing worker")))?;
        Ok(Self {
            inbox: inbox_tx,
            events: events_rx,
            _thread: thread,
        })
    }

    /// Send a message to the worker.
    pub fn post(&self, msg: Message) -> StageResult<()> {
        self.inbox
            .send(msg)
            .map_err(|_| StageError::protocol("parsing worker is not accepting messages"))
    }

    /// Next pending event, without blocking.
    pub fn try_next(&self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    /// Next event, waiting at most `timeout`.
    pub fn next_timeout(&self, timeout: Duration) -> Result<WorkerEvent, mpsc::RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }
}

fn worker_loop(
    decoder: &dyn DocumentDecoder,
    inbox: mpsc::Receiver<Message>,
    events: mpsc::Sender<WorkerEvent>,
) {
    for msg in inbox {
        if let Err(err) = validate(&msg) {
            tracing::warn!(%err, "worker dropped an invalid message");
            continue;
        }
        tracing::debug!(
            latency_ms = msg.latency_ms(),
            kind = %msg.kind,
            "message transit (main -> worker)"
        );

        match msg.value {
            Payload::ParseData(bytes) => {
                let mut emit = |m: Message| events.send(WorkerEvent::Message(m)).is_ok();
                match run_parse(decoder, &bytes, &mut emit) {
                    Ok(summary) if summary.cancelled => {
                        tracing::debug!("parse receiver hung up; stopping worker");
                        return;
                    }
                    Ok(summary) => {
                        tracing::info!(
                            emitted = summary.emitted,
                            skipped = summary.skipped.len(),
                            "parse finished"
                        );
                    }
                    Err(err) => {
                        tracing::error!(%err, "parse failed");
                        if events.send(WorkerEvent::Failed(err)).is_err() {
                            return;
                        }
                    }
                }
            }
            _ => {
                tracing::error!(kind = %msg.kind, "worker received a message it cannot handle");
            }
        }
    }
}

/// Decode `bytes` once and stream the layers through `emit`.
///
/// Layers are emitted back-to-front in paint order, each composited before its message is sent,
/// then a single `EndParsing`. A decode failure returns the error before anything is emitted.
/// A layer that fails to composite is skipped and recorded in the summary. `emit` returns
/// `false` when the receiver is gone, which ends the run early.
#[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
pub fn run_parse(
    decoder: &dyn DocumentDecoder,
    bytes: &[u8],
    emit: &mut dyn FnMut(Message) -> bool,
) -> StageResult<ParseSummary> {
    let started = Instant::now();
    let doc = decoder.parse(bytes).map_err(|err| match err {
        StageError::Decode(_) => err,
        other => StageError::decode(other.to_string()),
    })?;
    tracing::debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        layers = doc.layers.len(),
        "decoded document"
    );

    let size = doc.size;
    let mut summary = ParseSummary::default();
    for (index, layer) in doc.layers.into_iter().rev().enumerate() {
        let started = Instant::now();
        let pixels = match composite_layer(&layer) {
            Ok(px) => px,
            Err(err) => {
                tracing::warn!(index, name = %layer.name, %err, "skipping layer");
                summary.skipped.push(layer.name);
                continue;
            }
        };
        tracing::debug!(
            index,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "composited layer"
        );

        if !emit(Message::layer(layer_payload(&layer, pixels, size))) {
            summary.cancelled = true;
            return Ok(summary);
        }
        summary.emitted += 1;
    }

    if !emit(Message::end_parsing()) {
        summary.cancelled = true;
    }
    Ok(summary)
}

fn composite_layer(layer: &DecodedLayer) -> StageResult<Vec<u8>> {
    let pixels = layer.raster.composite(true, true)?;
    let expected = layer.bounds.rgba_len();
    if pixels.len() != expected {
        return Err(StageError::compositing(format!(
            "layer '{}' composited to {} bytes, expected {expected}",
            layer.name,
            pixels.len()
        )));
    }
    Ok(pixels)
}

/// Extract the normalized per-layer metadata carried by a `Layer` message.
pub fn layer_payload(layer: &DecodedLayer, pixel_data: Vec<u8>, doc: DocSize) -> LayerPayload {
    let props = &layer.properties;
    let text = props.text.clone().filter(|t| !t.is_empty());

    let (font_style, font_family, is_center, font_transform, font_caps) = match &props.text_meta
    {
        TextMetadata::NoText => (None, None, None, None, None),
        TextMetadata::TextLayer(meta) => (
            meta.style_sheet.clone(),
            meta.first_font().map(str::to_owned),
            Some(meta.is_centered()),
            Some(meta.transform.average_scale()),
            meta.style_sheet.as_ref().and_then(|s| s.font_caps),
        ),
    };

    LayerPayload {
        pixel_data,
        layer_name: layer.name.clone(),
        left: layer.bounds.left,
        top: layer.bounds.top,
        width: layer.bounds.width,
        height: layer.bounds.height,
        opacity: props.opacity,
        text,
        hidden: props.hidden,
        font_style,
        font_family,
        is_center,
        font_transform,
        font_caps,
        psd_width: doc.width,
        psd_height: doc.height,
    }
}

#[cfg(test)]
#[path = "../tests/unit/worker/worker.rs"]
mod tests;
