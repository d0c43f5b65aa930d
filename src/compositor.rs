//! Output sizing, drop shadow and the finished render.

use crate::config::{FaceGeometry, RenderOptions};
use crate::error::{GaugeError, Result};
use crate::geometry::{Affine, Point, Rect};
use crate::raster::blend_over;
use crate::svg::SvgDocument;
use image::RgbaImage;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Placement of the face's design box inside the output canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceLayout {
    /// Uniform design-unit to pixel factor.
    pub scale: f64,
    /// Canvas position of the design box's top-left corner.
    pub origin: Point,
    pub width: u32,
    pub height: u32,
}

impl FaceLayout {
    pub fn point(&self, p: Point) -> Point {
        Point::new(self.origin.x + p.x * self.scale, self.origin.y + p.y * self.scale)
    }

    pub fn scaled(&self, v: f64) -> f64 {
        v * self.scale
    }

    pub fn rect(&self, r: Rect) -> Rect {
        let at = self.point(Point::new(r.x, r.y));
        Rect::new(at.x, at.y, self.scaled(r.width), self.scaled(r.height))
    }

    /// Design space to canvas.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.x, self.origin.y).then(&Affine::scale(self.scale, self.scale))
    }
}

/// Scales the face uniformly into the requested size and centers it.
///
/// In export mode the insets are subtracted first and the face is shifted
/// by the top and left insets.
pub fn layout_face(face: &FaceGeometry, options: &RenderOptions) -> FaceLayout {
    let insets = options.export_insets.unwrap_or_default();
    let available_w = (options.width as f64 - insets.horizontal()).max(1.0);
    let available_h = (options.height as f64 - insets.vertical()).max(1.0);
    let scale = (available_w / face.bounds_width.max(1.0)).min(available_h / face.bounds_height.max(1.0));
    FaceLayout {
        scale,
        origin: Point::new(
            insets.left + (available_w - face.bounds_width * scale) / 2.0,
            insets.top + (available_h - face.bounds_height * scale) / 2.0,
        ),
        width: options.width.max(1),
        height: options.height.max(1),
    }
}

// ============================================================================
// DROP SHADOW
// ============================================================================

const SHADOW_PASSES: usize = 3;
const SHADOW_OPACITY: f64 = 0.5;

/// Shadow of `image`: its alpha blurred, tinted black at half opacity and
/// offset by `edge`. The result is `edge` pixels wider and taller.
pub fn drop_shadow(image: &RgbaImage, edge: u32) -> RgbaImage {
    let (w, h) = (image.width() + edge, image.height() + edge);
    let mut alpha = vec![0.0f32; (w * h) as usize];
    for (x, y, pixel) in image.enumerate_pixels() {
        alpha[((y + edge) * w + x + edge) as usize] = pixel.0[3] as f32 / 255.0;
    }

    let radius = ((edge as f64 / 2.0).round() as usize).max(1);
    for _ in 0..SHADOW_PASSES {
        box_blur_horizontal(&mut alpha, w as usize, h as usize, radius);
        box_blur_vertical(&mut alpha, w as usize, h as usize, radius);
    }

    let mut shadow = RgbaImage::new(w, h);
    for (x, y, pixel) in shadow.enumerate_pixels_mut() {
        let a = alpha[(y * w + x) as usize] as f64 * SHADOW_OPACITY;
        pixel.0 = [0, 0, 0, (a * 255.0).round().clamp(0.0, 255.0) as u8];
    }
    shadow
}

fn box_blur_horizontal(buf: &mut [f32], w: usize, h: usize, radius: usize) {
    let mut row = vec![0.0f32; w];
    let window = (2 * radius + 1) as f32;
    for y in 0..h {
        let line = &buf[y * w..(y + 1) * w];
        for (x, out) in row.iter_mut().enumerate() {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(w - 1);
            *out = line[lo..=hi].iter().sum::<f32>() / window;
        }
        buf[y * w..(y + 1) * w].copy_from_slice(&row);
    }
}

fn box_blur_vertical(buf: &mut [f32], w: usize, h: usize, radius: usize) {
    let mut column = vec![0.0f32; h];
    let window = (2 * radius + 1) as f32;
    for x in 0..w {
        for (y, out) in column.iter_mut().enumerate() {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(h - 1);
            *out = (lo..=hi).map(|yy| buf[yy * w + x]).sum::<f32>() / window;
        }
        for (y, &v) in column.iter().enumerate() {
            buf[y * w + x] = v;
        }
    }
}

/// Source-over of `src` onto `dst` with `src`'s top-left at `(x, y)`.
pub fn composite_over(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    for (sx, sy, pixel) in src.enumerate_pixels() {
        let (dx, dy) = (sx as i64 + x, sy as i64 + y);
        if dx < 0 || dy < 0 || dx >= dst.width() as i64 || dy >= dst.height() as i64 {
            continue;
        }
        let [r, g, b, a] = pixel.0;
        blend_over(&mut dst.get_pixel_mut(dx as u32, dy as u32).0, [r, g, b], a as f64 / 255.0);
    }
}

// ============================================================================
// RENDER OUTPUT
// ============================================================================

/// Visual parts of a gauge, used to report layers a render had to leave out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaugePart {
    Panel,
    Ranges,
    Labels,
    Needle,
    Hub,
    CentralValue,
}

impl fmt::Display for GaugePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GaugePart::Panel => "panel",
            GaugePart::Ranges => "ranges",
            GaugePart::Labels => "labels",
            GaugePart::Needle => "needle",
            GaugePart::Hub => "hub",
            GaugePart::CentralValue => "central value",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLayer {
    pub part: GaugePart,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GaugeOutput {
    Raster(RgbaImage),
    Vector(SvgDocument),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub output: GaugeOutput,
    /// Layers left out because their input was unusable.
    pub skipped: Vec<SkippedLayer>,
}

impl RenderOutput {
    pub fn size(&self) -> (u32, u32) {
        match &self.output {
            GaugeOutput::Raster(image) => image.dimensions(),
            GaugeOutput::Vector(doc) => (doc.width as u32, doc.height as u32),
        }
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        match &self.output {
            GaugeOutput::Raster(image) => Some(image),
            GaugeOutput::Vector(_) => None,
        }
    }

    pub fn is_skipped(&self, part: GaugePart) -> bool {
        self.skipped.iter().any(|s| s.part == part)
    }

    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let image = self.image().ok_or_else(|| {
            GaugeError::InvalidArgument("vector output cannot be written as PNG".into())
        })?;
        image.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
        info!(path = ?path.as_ref(), "gauge written");
        Ok(())
    }

    pub fn to_svg_string(&self) -> Option<String> {
        match &self.output {
            GaugeOutput::Vector(doc) => Some(doc.to_string()),
            GaugeOutput::Raster(_) => None,
        }
    }
}
