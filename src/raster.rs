// ============================================================================
// RASTER SINK
// ============================================================================
//
// RGBA canvas with straight (non-premultiplied) alpha and anti-aliased
// primitives. All coordinates are pixels, y growing downward; angles passed in
// are mathematical (counter-clockwise).

use crate::config::Color;
use crate::geometry::{angle_in_sweep, normalize_radian, Affine, Point};
use crate::text::FontFace;
use crate::ticks::TextAnchor;
use image::RgbaImage;
use rusttype::{point, PositionedGlyph, Scale};
use std::f64::consts::TAU;

pub struct Canvas {
    pub frame: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Canvas {
    /// A fully transparent canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Color) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * self.width + x) * 4;
        [
            self.frame[idx],
            self.frame[idx + 1],
            self.frame[idx + 2],
            self.frame[idx + 3],
        ]
    }

    pub fn alpha(&self, x: usize, y: usize) -> u8 {
        self.frame[(y * self.width + x) * 4 + 3]
    }

    /// Source-over blend of `color` at `coverage` onto one pixel.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f64) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        blend_over(
            &mut self.frame[idx..idx + 4],
            [color.r, color.g, color.b],
            coverage.clamp(0.0, 1.0) * color.opacity(),
        );
    }

    /// Pixels whose centers may be within `radius` of `center`, clipped to the canvas.
    fn bounds_around(&self, center: Point, radius: f64) -> (i32, i32, i32, i32) {
        let x0 = ((center.x - radius).floor() as i32 - 1).max(0);
        let y0 = ((center.y - radius).floor() as i32 - 1).max(0);
        let x1 = ((center.x + radius).ceil() as i32 + 1).min(self.width as i32 - 1);
        let y1 = ((center.y + radius).ceil() as i32 + 1).min(self.height as i32 - 1);
        (x0, y0, x1, y1)
    }

    pub fn into_image(self) -> RgbaImage {
        let (w, h) = (self.width as u32, self.height as u32);
        RgbaImage::from_raw(w, h, self.frame).unwrap_or_else(|| RgbaImage::new(w, h))
    }

    pub fn from_image(image: &RgbaImage) -> Self {
        Self {
            frame: image.as_raw().clone(),
            width: image.width() as usize,
            height: image.height() as usize,
        }
    }
}

/// Straight-alpha source-over of `rgb` at opacity `src_a` onto one RGBA pixel.
pub fn blend_over(dst: &mut [u8], rgb: [u8; 3], src_a: f64) {
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f64 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    for (channel, &s) in rgb.iter().enumerate() {
        let d = dst[channel] as f64;
        let mixed = (s as f64 * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        dst[channel] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

// ============================================================================
// LINES AND DISCS
// ============================================================================

/// Distance-field line with round caps.
pub fn draw_thick_line_aa(canvas: &mut Canvas, from: Point, to: Point, thickness: f64, color: Color) {
    draw_line_with(canvas, from, to, color, |_| thickness);
}

/// Line narrowing from `thickness` at `from` to 5% of it at `to`.
pub fn draw_thick_line_tapered_aa(
    canvas: &mut Canvas,
    from: Point,
    to: Point,
    thickness: f64,
    color: Color,
) {
    draw_line_with(canvas, from, to, color, |t| thickness * (1.0 - t * 0.95));
}

fn draw_line_with(
    canvas: &mut Canvas,
    from: Point,
    to: Point,
    color: Color,
    thickness_at: impl Fn(f64) -> f64,
) {
    let pad = thickness_at(0.0).max(thickness_at(1.0)).ceil() + 1.0;
    let min_x = (from.x.min(to.x) - pad).floor() as i32;
    let max_x = (from.x.max(to.x) + pad).ceil() as i32;
    let min_y = (from.y.min(to.y) - pad).floor() as i32;
    let max_y = (from.y.max(to.y) + pad).ceil() as i32;
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len_sq = (dx * dx + dy * dy).max(f64::EPSILON);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f64 + 0.5 - from.x;
            let py = y as f64 + 0.5 - from.y;
            let t = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);
            let lx = from.x + t * dx;
            let ly = from.y + t * dy;
            let dist = ((lx - x as f64 - 0.5).powi(2) + (ly - y as f64 - 0.5).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness_at(t) / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                canvas.blend_pixel(x, y, color, aa);
            }
        }
    }
}

pub fn fill_circle(canvas: &mut Canvas, center: Point, radius: f64, color: Color) {
    let (x0, y0, x1, y1) = canvas.bounds_around(center, radius);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dist = Point::new(x as f64 + 0.5, y as f64 + 0.5).distance(center);
            let aa = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if aa > 0.0 {
                canvas.blend_pixel(x, y, color, aa);
            }
        }
    }
}

/// Disc half lying on the `outward` side of the line through `center`.
pub fn fill_half_disc(canvas: &mut Canvas, center: Point, radius: f64, outward: Point, color: Color) {
    let (x0, y0, x1, y1) = canvas.bounds_around(center, radius);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let side = (p.x - center.x) * outward.x + (p.y - center.y) * outward.y;
            let radial = (radius + 0.5 - p.distance(center)).clamp(0.0, 1.0);
            let cut = (side + 0.5).clamp(0.0, 1.0);
            if radial * cut > 0.0 {
                canvas.blend_pixel(x, y, color, radial * cut);
            }
        }
    }
}

pub fn fill_polygon(canvas: &mut Canvas, points: &[Point], color: Color) {
    if points.len() < 3 {
        return;
    }
    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor() as i32;
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max).ceil() as i32;
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor() as i32;
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max).ceil() as i32;
    const SUB: [f64; 2] = [0.25, 0.75];
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let hits = SUB
                .iter()
                .flat_map(|&sy| SUB.iter().map(move |&sx| (sx, sy)))
                .filter(|&(sx, sy)| contains(points, Point::new(x as f64 + sx, y as f64 + sy)))
                .count();
            if hits > 0 {
                canvas.blend_pixel(x, y, color, hits as f64 / 4.0);
            }
        }
    }
}

fn contains(points: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

// ============================================================================
// ARCS
// ============================================================================

/// Parameters of an annular sector fill.
#[derive(Debug, Clone, Copy)]
pub struct ArcFill {
    pub center: Point,
    pub inner: f64,
    pub outer: f64,
    /// Clockwise from `begin` to `end`, mathematical radians.
    pub begin: f64,
    pub end: f64,
    pub color1: Color,
    pub color2: Color,
    /// Chord the gradient runs along; `None` fills with `color1`.
    pub gradient: Option<(Point, Point)>,
    /// Width in pixels of the fade at the angular edges.
    pub edge_softness: f64,
}

pub fn fill_arc(canvas: &mut Canvas, arc: &ArcFill) {
    let extent = (arc.begin - arc.end).clamp(0.0, TAU);
    if extent <= 0.0 || arc.outer <= arc.inner {
        return;
    }
    let full = extent >= TAU - 1e-9;
    let softness = arc.edge_softness.max(1.0);
    let (x0, y0, x1, y1) = canvas.bounds_around(arc.center, arc.outer);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let dist = p.distance(arc.center);
            let radial = (arc.outer + 0.5 - dist).clamp(0.0, 1.0)
                * (dist - arc.inner + 0.5).clamp(0.0, 1.0);
            if radial <= 0.0 {
                continue;
            }
            let angle = normalize_radian((arc.center.y - p.y).atan2(p.x - arc.center.x));
            let from_begin = normalize_radian(arc.begin - angle);
            let angular = if full {
                1.0
            } else if angle_in_sweep(angle, arc.begin, extent) {
                let edge = from_begin.min(extent - from_begin) * dist;
                ((edge + 0.5) / softness).clamp(0.0, 1.0)
            } else {
                0.0
            };
            if angular <= 0.0 {
                continue;
            }
            let color = match arc.gradient {
                Some((a, b)) => arc.color1.lerp(arc.color2, gradient_t(a, b, p, from_begin / extent)),
                None => arc.color1,
            };
            canvas.blend_pixel(x, y, color, radial * angular);
        }
    }
}

/// Projection of `p` onto the chord `a -> b`; angular fraction for degenerate chords.
fn gradient_t(a: Point, b: Point, p: Point, angular_fraction: f64) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1.0 {
        return angular_fraction.clamp(0.0, 1.0);
    }
    (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
}

// ============================================================================
// IMAGES AND TEXT
// ============================================================================

/// Draws `image` through `transform` (image space to canvas), bilinear sampled.
pub fn draw_image(canvas: &mut Canvas, image: &RgbaImage, transform: &Affine) {
    let Some(inverse) = transform.invert() else {
        return;
    };
    let (w, h) = (image.width() as f64, image.height() as f64);
    let corners = [
        transform.apply(Point::new(0.0, 0.0)),
        transform.apply(Point::new(w, 0.0)),
        transform.apply(Point::new(0.0, h)),
        transform.apply(Point::new(w, h)),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor().max(0.0) as i32;
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor().max(0.0) as i32;
    let max_x = (corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max).ceil() as i32)
        .min(canvas.width as i32 - 1);
    let max_y = (corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max).ceil() as i32)
        .min(canvas.height as i32 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let src = inverse.apply(Point::new(x as f64 + 0.5, y as f64 + 0.5));
            if let Some(color) = sample_bilinear(image, src.x - 0.5, src.y - 0.5) {
                canvas.blend_pixel(x, y, color, 1.0);
            }
        }
    }
}

fn sample_bilinear(image: &RgbaImage, u: f64, v: f64) -> Option<Color> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    if u < -0.5 || v < -0.5 || u > w as f64 - 0.5 || v > h as f64 - 0.5 {
        return None;
    }
    let (x0, y0) = (u.floor() as i64, v.floor() as i64);
    let (fx, fy) = (u - x0 as f64, v - y0 as f64);
    let texel = |x: i64, y: i64| {
        let p = image.get_pixel(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32).0;
        [p[0] as f64, p[1] as f64, p[2] as f64, p[3] as f64]
    };
    let (a, b, c, d) = (texel(x0, y0), texel(x0 + 1, y0), texel(x0, y0 + 1), texel(x0 + 1, y0 + 1));
    let mix = |i: usize| {
        let top = a[i] + (b[i] - a[i]) * fx;
        let bottom = c[i] + (d[i] - c[i]) * fx;
        (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8
    };
    Some(Color::new(mix(0), mix(1), mix(2)).with_alpha(mix(3)))
}

/// Horizontal text anchored at `at`, vertically centered on it.
pub fn draw_text(
    canvas: &mut Canvas,
    font: &FontFace,
    at: Point,
    text: &str,
    size: f64,
    anchor: TextAnchor,
    color: Color,
) {
    let scale = Scale::uniform(size as f32);
    let v_metrics = font.font().v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .font()
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();

    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    if min_x >= max_x || min_y >= max_y {
        return;
    }
    let width_px = (max_x - min_x) as f64;
    let height_px = (max_y - min_y) as f64;
    let offset_x = match anchor {
        TextAnchor::Start => at.x,
        TextAnchor::Middle => at.x - width_px / 2.0,
        TextAnchor::End => at.x - width_px,
    }
    .round() as i32;
    let offset_y = (at.y - height_px / 2.0).round() as i32;

    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + gx as i32 + bb.min.x - min_x;
                let py = offset_y + gy as i32 + bb.min.y - min_y;
                canvas.blend_pixel(px, py, color, v as f64);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{degree_to_radian, polar_to_cartesian};

    #[test]
    fn test_blend_onto_transparent_keeps_source_color() {
        let mut canvas = Canvas::new(2, 2);
        canvas.blend_pixel(0, 0, Color::RED, 0.5);
        let [r, g, b, a] = canvas.pixel(0, 0);
        assert_eq!((r, g, b), Color::RED.as_tuple());
        assert_eq!(a, 128);
        // out of bounds is ignored
        canvas.blend_pixel(-1, 5, Color::RED, 1.0);
    }

    #[test]
    fn test_opaque_over_opaque_replaces() {
        let mut canvas = Canvas::new(1, 1);
        canvas.clear(Color::WHITE);
        canvas.blend_pixel(0, 0, Color::BLACK, 1.0);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_arc_covers_only_its_sweep() {
        let mut canvas = Canvas::new(100, 100);
        let center = Point::new(50.0, 50.0);
        fill_arc(
            &mut canvas,
            &ArcFill {
                center,
                inner: 30.0,
                outer: 40.0,
                begin: degree_to_radian(90.0),
                end: 0.0,
                color1: Color::GREEN,
                color2: Color::GREEN,
                gradient: None,
                edge_softness: 1.0,
            },
        );
        // upper-right quadrant of the band is painted
        let inside = polar_to_cartesian(center, 35.0, degree_to_radian(45.0));
        assert_eq!(canvas.alpha(inside.x as usize, inside.y as usize), 255);
        // lower-left is not
        let outside = polar_to_cartesian(center, 35.0, degree_to_radian(225.0));
        assert_eq!(canvas.alpha(outside.x as usize, outside.y as usize), 0);
        // the hole is not
        assert_eq!(canvas.alpha(50, 50), 0);
    }

    #[test]
    fn test_gradient_runs_along_chord() {
        let mut canvas = Canvas::new(100, 100);
        let center = Point::new(50.0, 50.0);
        let begin = degree_to_radian(180.0);
        let a = polar_to_cartesian(center, 40.0, begin);
        let b = polar_to_cartesian(center, 40.0, 0.0);
        fill_arc(
            &mut canvas,
            &ArcFill {
                center,
                inner: 30.0,
                outer: 40.0,
                begin,
                end: 0.0,
                color1: Color::new(0, 0, 0),
                color2: Color::new(200, 0, 0),
                gradient: Some((a, b)),
                edge_softness: 1.0,
            },
        );
        let left = canvas.pixel(12, 47);
        let right = canvas.pixel(87, 47);
        assert!(left[0] < 20, "left end should be near color1: {left:?}");
        assert!(right[0] > 180, "right end should be near color2: {right:?}");
    }

    #[test]
    fn test_half_disc_paints_one_side() {
        let mut canvas = Canvas::new(20, 20);
        fill_half_disc(&mut canvas, Point::new(10.0, 10.0), 6.0, Point::new(1.0, 0.0), Color::RED);
        assert_eq!(canvas.alpha(14, 10), 255);
        assert_eq!(canvas.alpha(5, 10), 0);
    }

    #[test]
    fn test_polygon_fill() {
        let mut canvas = Canvas::new(10, 10);
        let square = [
            Point::new(2.0, 2.0),
            Point::new(8.0, 2.0),
            Point::new(8.0, 8.0),
            Point::new(2.0, 8.0),
        ];
        fill_polygon(&mut canvas, &square, Color::BLACK);
        assert_eq!(canvas.alpha(5, 5), 255);
        assert_eq!(canvas.alpha(0, 0), 0);
    }

    #[test]
    fn test_draw_image_translated() {
        let mut canvas = Canvas::new(10, 10);
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        draw_image(&mut canvas, &image, &Affine::translate(4.0, 4.0));
        assert_eq!(canvas.pixel(4, 4), [0, 0, 255, 255]);
        assert_eq!(canvas.pixel(5, 5), [0, 0, 255, 255]);
        assert_eq!(canvas.alpha(8, 8), 0);
    }
}
