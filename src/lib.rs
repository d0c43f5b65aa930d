// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

//! Radial gauge rendering.
//!
//! Given a face template, a shape variant and the live values of a gauge,
//! [`render`] lays out ticks and labels, fills range bands, places the needle
//! and produces either an RGBA image or an SVG document.
//!
//! ```no_run
//! use gaugeface::{FaceGeometry, GaugeSpec, RenderOptions, Renderer, RenderContext, ShapeVariant};
//!
//! let spec = GaugeSpec::builder().value(42.0).ranges(vec![70.0]).build();
//! let out = Renderer::new().render(
//!     &FaceGeometry::default(),
//!     ShapeVariant::Half,
//!     &spec,
//!     &RenderOptions::default(),
//!     &RenderContext::new("light"),
//! );
//! out.write_png("gauge.png").unwrap();
//! ```

pub mod angle;
pub mod assets;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod needle;
pub mod preview;
pub mod ranges;
pub mod raster;
pub mod render;
pub mod scene;
pub mod shape;
pub mod svg;
pub mod text;
pub mod theme;
pub mod ticks;

pub use angle::{rotation_offset_from_field, AngleDomain};
pub use assets::{Asset, AssetCache, AssetData};
pub use catalog::FaceCatalog;
pub use compositor::{GaugeOutput, GaugePart, RenderOutput, SkippedLayer};
pub use config::{Color, FaceGeometry, GaugeSpec, OutputFormat, RenderOptions};
pub use error::{AssetError, GaugeError, RangeError, Result};
pub use geometry::{Insets, Point, Rect};
pub use needle::NeedleState;
pub use ranges::RangeSegment;
pub use render::{render, RenderResources, Renderer};
pub use shape::{FaceId, ShapeTraits, ShapeVariant};
pub use svg::SvgDocument;
pub use text::{ApproxMetrics, FontFace, TextMeasure};
pub use theme::{DefaultTheme, Palette, RenderContext, ThemeResolver};
pub use ticks::{TickPlan, TickSet};

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`, INFO by default.
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
