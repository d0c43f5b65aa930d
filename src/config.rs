// ============================================================================
// GAUGE CONFIGURATION
// ============================================================================

use crate::error::GaugeError;
use crate::geometry::{degree_to_radian, Insets, Point, Rect};
use bon::Builder;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// RGBA color for gauge elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const GREEN: Color = Color::new(0x2e, 0xb8, 0x4b);
    pub const YELLOW: Color = Color::new(0xf2, 0xc0, 0x1e);
    pub const RED: Color = Color::new(0xe0, 0x2b, 0x2b);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Each channel scaled by 0.7, floored.
    pub fn darker(self) -> Self {
        let scale = |c: u8| (c as f64 * 0.7) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }

    pub fn lerp(self, other: Color, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// `#rrggbb` for SVG attributes.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f64 {
        self.a as f64 / 255.0
    }
}

impl FromStr for Color {
    type Err = GaugeError;

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional) and a few names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "black" => return Ok(Color::BLACK),
            "white" => return Ok(Color::WHITE),
            "green" => return Ok(Color::GREEN),
            "yellow" => return Ok(Color::YELLOW),
            "red" => return Ok(Color::RED),
            _ => {}
        }
        let hex = s.trim_start_matches('#');
        let bad = || GaugeError::InvalidArgument(format!("bad color {s:?}"));
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2).ok_or_else(bad)?, 16).map_err(|_| bad());
        match hex.len() {
            3 => {
                let nib = |i: usize| {
                    u8::from_str_radix(hex.get(i..i + 1).ok_or_else(bad)?, 16)
                        .map(|v| v * 17)
                        .map_err(|_| bad())
                };
                Ok(Color::new(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Ok(Color::new(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color::new(byte(0)?, byte(2)?, byte(4)?).with_alpha(byte(6)?)),
            _ => Err(bad()),
        }
    }
}

// ============================================================================
// FACE GEOMETRY
// ============================================================================

/// Declarative face template in design units, loaded once per face.
#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[serde(default)]
pub struct FaceGeometry {
    #[builder(default = Point::new(100.0, 100.0))]
    pub center: Point,
    /// Default bounding size the radii are expressed against.
    #[builder(default = 200.0)]
    pub bounds_width: f64,
    #[builder(default = 200.0)]
    pub bounds_height: f64,

    #[builder(default = degree_to_radian(270.0))]
    pub angle_span: f64,
    #[builder(default = 0.0)]
    pub rotation_offset: f64,

    // Ticks: radii are the outer end of each tick line
    #[builder(default = 86.0)]
    pub major_tick_radius: f64,
    #[builder(default = 12.0)]
    pub major_tick_length: f64,
    #[builder(default = 2.0)]
    pub major_tick_width: f64,
    #[builder(default = 86.0)]
    pub minor_tick_radius: f64,
    #[builder(default = 6.0)]
    pub minor_tick_length: f64,
    #[builder(default = 1.0)]
    pub minor_tick_width: f64,

    // Labels
    #[builder(default = 62.0)]
    pub value_radius: f64,
    #[builder(default = 14.0)]
    pub label_font_size: f64,
    /// Slot for the aggregate value in full-circle faces.
    pub value_slot: Option<Rect>,

    // Range band
    #[builder(default = 94.0)]
    pub range_outer_radius: f64,
    #[builder(default = 6.0)]
    pub range_width: f64,

    // Needle and hub
    #[builder(default = 80.0)]
    pub needle_length: f64,
    #[builder(default = 14.0)]
    pub needle_back_length: f64,
    #[builder(default = 4.0)]
    pub needle_width: f64,
    #[builder(default = 6.0)]
    pub hub_radius: f64,
    #[builder(default = 98.0)]
    pub panel_radius: f64,

    pub panel_asset: Option<PathBuf>,
    pub needle_asset: Option<PathBuf>,
    pub hub_asset: Option<PathBuf>,
}

impl Default for FaceGeometry {
    fn default() -> Self {
        Self::builder().build()
    }
}

// ============================================================================
// GAUGE SPEC
// ============================================================================

/// Live data painted onto a face for a single render.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct GaugeSpec {
    #[builder(default = 0.0)]
    pub min: f64,
    #[builder(default = 100.0)]
    pub max: f64,
    #[builder(default = 10.0)]
    pub major_inc: f64,
    #[builder(default = 2.0)]
    pub minor_inc: f64,
    #[builder(default = 0.0)]
    pub value: f64,
    pub target: Option<f64>,
    /// Range boundaries, expected ascending.
    #[builder(default)]
    pub ranges: Vec<f64>,
    #[builder(default)]
    pub range_colors: Vec<Color>,
    #[builder(default = false)]
    pub round_ranges: bool,
    #[builder(default = false)]
    pub gradient: bool,
    /// Translucent overlay band between two values.
    pub highlight: Option<(f64, f64)>,
}

impl GaugeSpec {
    /// `max > min` and a positive major increment.
    pub fn is_drawable(&self) -> bool {
        self.max > self.min && self.major_inc > 0.0 && self.min.is_finite() && self.max.is_finite()
    }

    pub fn clamped_value(&self) -> f64 {
        self.value.clamp(self.min, self.max)
    }
}

// ============================================================================
// RENDER OPTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Raster,
    Vector,
}

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct RenderOptions {
    #[builder(default = 300)]
    pub width: u32,
    #[builder(default = 300)]
    pub height: u32,
    #[builder(default = OutputFormat::Raster)]
    pub format: OutputFormat,
    #[builder(default = false)]
    pub shadow: bool,
    #[builder(default = 8.0)]
    pub shadow_edge: f64,
    /// Export mode: padding subtracted from the output size.
    pub export_insets: Option<Insets>,
    /// Multiplier applied to the central value font after fitting.
    #[builder(default = 1.0)]
    pub font_scale: f64,
    /// Horizontal gap between neighbouring tick labels, in pixels.
    #[builder(default = 4.0)]
    pub label_gap: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_darker_scales_channels() {
        let c = Color::new(100, 200, 10).darker();
        assert_eq!(c.as_tuple(), (70, 140, 7));
        assert_eq!(c.a, 0xff);
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!("#ff0000".parse::<Color>().unwrap(), Color::new(255, 0, 0));
        assert_eq!("0f0".parse::<Color>().unwrap(), Color::new(0, 255, 0));
        assert_eq!(
            "#00000080".parse::<Color>().unwrap(),
            Color::BLACK.with_alpha(0x80)
        );
        assert_eq!("red".parse::<Color>().unwrap(), Color::RED);
        assert!("#12".parse::<Color>().is_err());
        assert!("zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_face_defaults_match_builder() {
        let face: FaceGeometry = serde_json::from_str(r#"{ "range_width": 10.0 }"#).unwrap();
        assert_eq!(face.range_width, 10.0);
        assert_eq!(face.major_tick_radius, FaceGeometry::default().major_tick_radius);
    }

    #[test]
    fn test_degenerate_spec_is_not_drawable() {
        assert!(!GaugeSpec::builder().min(5.0).max(5.0).build().is_drawable());
        assert!(!GaugeSpec::builder().major_inc(0.0).build().is_drawable());
        assert!(GaugeSpec::builder().build().is_drawable());
    }
}
