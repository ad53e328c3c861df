//! Label measurement through a Canvas 2D context.

use wf_core::{FixedAdvance, TextMeasure, TextMetrics};
use web_sys::CanvasRenderingContext2d;

/// Font used for labels; keep in sync with the `text` rule of the
/// canvas stylesheet.
pub const LABEL_FONT: &str = "12px sans-serif";

/// Measures text with `measureText`, falling back to a fixed advance when
/// the context refuses.
pub struct CanvasTextMeasure {
    ctx: CanvasRenderingContext2d,
    fallback: FixedAdvance,
}

impl CanvasTextMeasure {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        ctx.set_font(LABEL_FONT);
        Self {
            ctx,
            fallback: FixedAdvance::default(),
        }
    }
}

impl TextMeasure for CanvasTextMeasure {
    fn measure(&self, text: &str) -> TextMetrics {
        match self.ctx.measure_text(text) {
            Ok(m) => TextMetrics {
                width: m.width(),
                ascent: m.font_bounding_box_ascent(),
                descent: m.font_bounding_box_descent(),
            },
            Err(_) => {
                log::warn!("measureText failed for {text:?}");
                self.fallback.measure(text)
            }
        }
    }
}
