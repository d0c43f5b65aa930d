//! Text measurement and font shrink-to-fit.

use crate::error::{GaugeError, Result};
use crate::geometry::Rect;
use rusttype::{point, Font, PositionedGlyph, Scale};
use std::path::Path;
use tracing::debug;

/// Tick labels never shrink below this size.
pub const MIN_FONT_SIZE: f64 = 10.0;
/// Starting size for the central value label when the slot is shorter.
pub const CENTRAL_FONT_FLOOR: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

/// Measures rendered text at a given pixel size.
pub trait TextMeasure {
    fn measure(&self, text: &str, size: f64) -> TextExtent;
}

/// A loaded TrueType/OpenType font.
#[derive(Clone)]
pub struct FontFace {
    font: Font<'static>,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl FontFace {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Font::try_from_vec(data)
            .map(|font| Self { font })
            .ok_or_else(|| GaugeError::Font("font data is not a valid TrueType/OpenType font".into()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    pub fn font(&self) -> &Font<'static> {
        &self.font
    }
}

impl TextMeasure for FontFace {
    fn measure(&self, text: &str, size: f64) -> TextExtent {
        let scale = Scale::uniform(size as f32);
        let v_metrics = self.font.v_metrics(scale);
        let glyphs: Vec<PositionedGlyph> = self.font.layout(text, scale, point(0.0, 0.0)).collect();
        let (min_x, max_x) = glyphs
            .iter()
            .filter_map(|g| g.pixel_bounding_box())
            .fold((i32::MAX, i32::MIN), |(min_x, max_x), bb| {
                (min_x.min(bb.min.x), max_x.max(bb.max.x))
            });
        let width = if min_x < max_x {
            (max_x - min_x) as f64
        } else {
            // whitespace-only text has no bounding boxes
            glyphs
                .last()
                .map(|g| (g.position().x + g.unpositioned().h_metrics().advance_width) as f64)
                .unwrap_or(0.0)
        };
        TextExtent {
            width,
            height: (v_metrics.ascent - v_metrics.descent) as f64,
        }
    }
}

/// Fixed-advance estimate used when no font is loaded.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMetrics {
    pub advance: f64,
    pub line_height: f64,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.0,
        }
    }
}

impl TextMeasure for ApproxMetrics {
    fn measure(&self, text: &str, size: f64) -> TextExtent {
        TextExtent {
            width: text.chars().count() as f64 * self.advance * size,
            height: self.line_height * size,
        }
    }
}

/// Arc length consumed by `count` labels centered on their ticks.
///
/// Labels are modelled as `count - 1` slots of the widest label plus a gap
/// between inner neighbours, so the result goes to zero or below for one label.
pub fn arc_labels_width(count: usize, widest: f64, gap: f64) -> f64 {
    let count = count as f64;
    (count - 1.0) * widest + gap * (count - 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontFit {
    pub size: f64,
    /// Number of shrink steps taken.
    pub steps: usize,
    pub fits: bool,
}

/// Shrinks the tick label font until the labels fit `radius × (sweep + adjust)`.
pub fn fit_tick_font(
    measure: &dyn TextMeasure,
    labels: &[String],
    start_size: f64,
    radius: f64,
    sweep: f64,
    adjust: f64,
    gap: f64,
) -> FontFit {
    let range_length = radius * (sweep + adjust);
    let mut size = start_size.max(MIN_FONT_SIZE);
    let mut steps = 0;
    loop {
        let widest = labels
            .iter()
            .map(|l| measure.measure(l, size).width)
            .fold(0.0, f64::max);
        let needed = arc_labels_width(labels.len(), widest, gap);
        let fits = needed <= range_length;
        if fits || size <= MIN_FONT_SIZE {
            debug!(size, steps, needed, range_length, "tick font fitted");
            return FontFit { size, steps, fits };
        }
        size = (size - 1.0).max(MIN_FONT_SIZE);
        steps += 1;
    }
}

/// Fits the central value label into `slot`, then applies `font_scale`.
pub fn fit_central_font(measure: &dyn TextMeasure, text: &str, slot: Rect, font_scale: f64) -> f64 {
    let mut size = CENTRAL_FONT_FLOOR.max(slot.height);
    loop {
        let extent = measure.measure(text, size);
        if (extent.width <= slot.width - 2.0 && extent.height <= slot.height) || size <= 1.0 {
            break;
        }
        size = (size - 1.0).max(1.0);
    }
    size * font_scale
}
