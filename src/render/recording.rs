use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::core::Affine;
use crate::foundation::error::{StageError, StageResult};
use crate::render::RenderSurface;
use crate::scene::{RenderObject, TextNode};

/// What a [`RecordingSurface`] has been asked to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceLog {
    pub redraws: u64,
    pub last_view: Option<Affine>,
    /// Ids of the objects passed to the last redraw, in paint order.
    pub last_ids: Vec<String>,
    pub viewport: (u32, u32),
    pub fonts: Vec<String>,
    pub releases: u64,
}

/// Headless surface that draws nothing and measures every character as `advance_em` em wide.
///
/// Clones share one log, so a handle kept outside the compositor sees every call.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    advance_em: f64,
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn new(advance_em: f64) -> Self {
        Self {
            advance_em,
            log: Arc::default(),
        }
    }

    pub fn log(&self) -> MutexGuard<'_, SurfaceLog> {
        // A poisoned log only means a test already panicked while holding it.
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl RenderSurface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) -> StageResult<()> {
        if width == 0 || height == 0 {
            return Err(StageError::validation("viewport must be non-empty"));
        }
        self.log().viewport = (width, height);
        Ok(())
    }

    fn redraw(&mut self, view: Affine, objects: &[RenderObject]) -> StageResult<()> {
        let mut log = self.log();
        log.redraws += 1;
        log.last_view = Some(view);
        log.last_ids = objects.iter().map(|o| o.id().to_owned()).collect();
        Ok(())
    }

    fn measure_text(&mut self, node: &TextNode) -> f64 {
        node.text.chars().count() as f64 * f64::from(node.font.size_px) * self.advance_em
    }

    fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> StageResult<()> {
        if bytes.is_empty() {
            return Err(StageError::font_load(format!("'{family}': empty font data")));
        }
        self.log().fonts.push(family.to_owned());
        Ok(())
    }

    fn release(&mut self) {
        self.log().releases += 1;
    }
}
