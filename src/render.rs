//! The render pipeline.
//!
//! A render is a pure function of an immutable face, a shape variant and the
//! live spec. Everything scale dependent is derived per call, so renders of
//! the same face can run on any number of threads; the only shared state is
//! the asset cache, which hands out immutable snapshots.

use crate::angle::AngleDomain;
use crate::assets::{Asset, AssetCache, AssetData};
use crate::catalog::FaceCatalog;
use crate::compositor::{
    composite_over, drop_shadow, layout_face, FaceLayout, GaugeOutput, GaugePart, RenderOutput,
    SkippedLayer,
};
use crate::config::{FaceGeometry, GaugeSpec, OutputFormat, RenderOptions};
use crate::error::Result;
use crate::geometry::{polar_to_cartesian, Affine, Point};
use crate::needle::{needle_state, value_fill_segment, NeedleState};
use crate::raster::{ArcFill, Canvas};
use crate::ranges::{merge_ranges, RangeSegment};
use crate::scene::{DrawCommand, Layer, Scene};
use crate::shape::{FaceId, ShapeTraits, ShapeVariant};
use crate::text::{fit_central_font, fit_tick_font, ApproxMetrics, FontFace, TextMeasure};
use crate::theme::{DefaultTheme, Palette, RenderContext, ThemeResolver};
use crate::ticks::{abbreviate, build_tick_set, label_decimals, label_flags, TextAnchor, TickPlan, TickSet};
use std::f64::consts::PI;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, debug_span, warn};

/// Fade width of the highlight band edges, in pixels.
const HIGHLIGHT_SOFTNESS: f64 = 4.0;

/// Shared collaborators a render reads from.
#[derive(Clone, Copy)]
pub struct RenderResources<'a> {
    pub theme: &'a dyn ThemeResolver,
    pub assets: &'a AssetCache,
    /// Label font; without one raster labels are left out.
    pub font: Option<&'a FontFace>,
}

/// Renders one gauge.
///
/// Never fails: unusable ranges, missing artwork or a missing font leave the
/// affected layer out and are reported in [`RenderOutput::skipped`].
pub fn render(
    face: &FaceGeometry,
    shape: ShapeVariant,
    spec: &GaugeSpec,
    options: &RenderOptions,
    ctx: &RenderContext,
    resources: RenderResources<'_>,
) -> RenderOutput {
    let span = debug_span!("render", ?shape, width = options.width, height = options.height);
    let _enter = span.enter();

    let (scene, skipped) = paint(face, shape, spec, options, ctx, resources);
    let output = match options.format {
        OutputFormat::Vector => {
            if options.shadow {
                debug!("drop shadow is raster only");
            }
            GaugeOutput::Vector(scene.to_svg())
        }
        OutputFormat::Raster => GaugeOutput::Raster(rasterize(&scene, options, resources.font)),
    };
    debug!(skipped = skipped.len(), "render finished");
    RenderOutput { output, skipped }
}

fn rasterize(scene: &Scene, options: &RenderOptions, font: Option<&FontFace>) -> image::RgbaImage {
    let mut body = Canvas::new(scene.width as usize, scene.height as usize);
    scene.render(Layer::Body, &mut body, font);
    if !options.shadow || options.shadow_edge <= 0.0 {
        scene.render(Layer::Labels, &mut body, font);
        return body.into_image();
    }

    let edge = options.shadow_edge.round().max(1.0) as u32;
    let body = body.into_image();
    let mut labels = Canvas::new(scene.width as usize, scene.height as usize);
    scene.render(Layer::Labels, &mut labels, font);

    let mut out = drop_shadow(&body, edge);
    composite_over(&mut out, &body, 0, 0);
    composite_over(&mut out, &labels.into_image(), 0, 0);
    out
}

/// Records the draw commands of one render, in canvas pixels.
pub(crate) fn paint(
    face: &FaceGeometry,
    shape: ShapeVariant,
    spec: &GaugeSpec,
    options: &RenderOptions,
    ctx: &RenderContext,
    resources: RenderResources<'_>,
) -> (Scene, Vec<SkippedLayer>) {
    let layout = layout_face(face, options);
    let mut painter = Painter {
        face,
        spec,
        options,
        traits: shape.traits(),
        domain: AngleDomain::resolve(shape, face.angle_span, face.rotation_offset),
        center: layout.point(face.center),
        layout,
        palette: resources.theme.palette(ctx),
        resources,
        scene: Scene::new(layout.width, layout.height),
        skipped: Vec::new(),
    };

    painter.panel();
    if !spec.is_drawable() {
        debug!(min = spec.min, max = spec.max, major_inc = spec.major_inc, "degenerate domain, panel only");
        return (painter.scene, painter.skipped);
    }

    let needle = needle_state(spec, &painter.domain, &painter.traits);
    painter.ranges();
    painter.highlight();
    if painter.traits.value_fill {
        painter.value_fill(&needle);
    }
    painter.ticks();
    painter.target();
    painter.needle(&needle);
    painter.hub();
    painter.central_value(&needle);
    (painter.scene, painter.skipped)
}

enum Artwork {
    Asset(Arc<Asset>),
    Procedural,
    Omitted,
}

struct Painter<'a> {
    face: &'a FaceGeometry,
    spec: &'a GaugeSpec,
    options: &'a RenderOptions,
    traits: ShapeTraits,
    domain: AngleDomain,
    layout: FaceLayout,
    center: Point,
    palette: Palette,
    resources: RenderResources<'a>,
    scene: Scene,
    skipped: Vec<SkippedLayer>,
}

impl Painter<'_> {
    fn skip(&mut self, part: GaugePart, reason: String) {
        self.skipped.push(SkippedLayer { part, reason });
    }

    fn body(&mut self, command: DrawCommand) {
        self.scene.add_command(Layer::Body, command);
    }

    fn font_missing_for_raster(&self) -> bool {
        self.resources.font.is_none() && self.options.format == OutputFormat::Raster
    }

    /// Loads declared artwork; faces without any get the procedural shape.
    fn artwork(&mut self, path: Option<&Path>, part: GaugePart) -> Artwork {
        let Some(path) = path else {
            return Artwork::Procedural;
        };
        match self.resources.assets.get(path) {
            Ok(asset) => match (&asset.data, self.options.format) {
                (AssetData::Vector(_), OutputFormat::Raster) => {
                    debug!(%part, path = ?path, "vector artwork in raster output, drawing procedurally");
                    Artwork::Procedural
                }
                _ => Artwork::Asset(asset),
            },
            Err(e) => {
                warn!(%part, error = %e, "artwork unavailable, layer omitted");
                self.skip(part, e.to_string());
                Artwork::Omitted
            }
        }
    }

    // ========================================================================
    // BODY LAYERS
    // ========================================================================

    fn panel(&mut self) {
        let face = self.face;
        match self.artwork(face.panel_asset.as_deref(), GaugePart::Panel) {
            Artwork::Asset(asset) => {
                let transform = self.layout.transform().then(&Affine::scale(
                    face.bounds_width / asset.width.max(1.0),
                    face.bounds_height / asset.height.max(1.0),
                ));
                self.body(DrawCommand::Asset { asset, transform });
            }
            Artwork::Procedural => self.body(DrawCommand::Disc {
                center: self.center,
                radius: self.layout.scaled(face.panel_radius),
                color: self.palette.panel,
            }),
            Artwork::Omitted => {}
        }
    }

    fn band_radii(&self) -> (f64, f64) {
        let outer = self.layout.scaled(self.face.range_outer_radius);
        (outer - self.layout.scaled(self.face.range_width), outer)
    }

    fn ranges(&mut self) {
        let segments = match merge_ranges(self.spec, &self.domain) {
            Ok(segments) => segments,
            Err(e) => {
                warn!(error = %e, "range layer skipped");
                self.skip(GaugePart::Ranges, e.to_string());
                return;
            }
        };
        let (inner, outer) = self.band_radii();
        for segment in &segments {
            self.segment(segment, inner, outer);
        }
    }

    fn segment(&mut self, segment: &RangeSegment, inner: f64, outer: f64) {
        let (begin, end) = (segment.begin_radian, segment.end_radian);
        self.body(DrawCommand::band(
            self.center,
            inner,
            outer,
            (begin, end),
            (segment.color1, segment.color2),
            segment.gradient,
        ));

        let mid = (inner + outer) / 2.0;
        let cap = (outer - inner) / 2.0;
        let (first, last) = segment.edge_colors();
        if segment.left_round {
            // the band runs clockwise, so its begin edge faces counter-clockwise
            self.body(DrawCommand::RoundCap {
                center: polar_to_cartesian(self.center, mid, begin),
                radius: cap,
                outward: Point::new(-begin.sin(), -begin.cos()),
                color: first,
            });
        }
        if segment.right_round {
            self.body(DrawCommand::RoundCap {
                center: polar_to_cartesian(self.center, mid, end),
                radius: cap,
                outward: Point::new(end.sin(), end.cos()),
                color: last,
            });
        }
    }

    fn highlight(&mut self) {
        let Some((a, b)) = self.spec.highlight else {
            return;
        };
        let (min, max) = (self.spec.min, self.spec.max);
        let (lo, hi) = (a.min(b).max(min), a.max(b).min(max));
        if hi <= lo {
            return;
        }
        let outer = self
            .layout
            .scaled(self.face.major_tick_radius - self.face.major_tick_length);
        let inner = outer - self.layout.scaled(self.face.range_width);
        let color = self.palette.highlight;
        self.body(DrawCommand::Band(ArcFill {
            center: self.center,
            inner,
            outer,
            begin: self.domain.radian_for(lo, min, max),
            end: self.domain.radian_for(hi, min, max),
            color1: color,
            color2: color,
            gradient: None,
            edge_softness: HIGHLIGHT_SOFTNESS,
        }));
    }

    fn value_fill(&mut self, needle: &NeedleState) {
        let color = self.palette.value_fill;
        if let Some(segment) = value_fill_segment(self.spec, &self.domain, needle, color) {
            let (inner, outer) = self.band_radii();
            self.segment(&segment, inner, outer);
        }
    }

    fn tick_line(&mut self, radian: f64, radius: f64, length: f64, width: f64) {
        let (outer, inner) = (self.layout.scaled(radius), self.layout.scaled(radius - length));
        self.body(DrawCommand::Line {
            from: polar_to_cartesian(self.center, outer, radian),
            to: polar_to_cartesian(self.center, inner, radian),
            width: self.layout.scaled(width),
            color: self.palette.tick,
        });
    }

    fn ticks(&mut self) {
        let spec = self.spec;
        let Some(plan) = TickPlan::compute(spec.min, spec.max, spec.major_inc, spec.minor_inc) else {
            return;
        };
        let mut ticks = build_tick_set(&plan, spec.min, spec.max, &self.domain);
        let face = self.face;
        for radian in ticks.majors.iter().map(|t| t.radian).collect::<Vec<_>>() {
            self.tick_line(radian, face.major_tick_radius, face.major_tick_length, face.major_tick_width);
        }
        for radian in ticks.minors.clone() {
            self.tick_line(radian, face.minor_tick_radius, face.minor_tick_length, face.minor_tick_width);
        }
        self.labels(&mut ticks);
    }

    fn target(&mut self) {
        let Some(target) = self.spec.target else {
            return;
        };
        let (min, max) = (self.spec.min, self.spec.max);
        let radian = self.domain.radian_for(target.clamp(min, max), min, max);
        let (_, tip) = self.band_radii();
        let size = self.layout.scaled(self.face.range_width).max(4.0);
        let base = (tip - size * 2.0).max(1.0);
        let half_angle = size / base;
        self.body(DrawCommand::Polygon {
            points: vec![
                polar_to_cartesian(self.center, tip, radian),
                polar_to_cartesian(self.center, base, radian + half_angle),
                polar_to_cartesian(self.center, base, radian - half_angle),
            ],
            color: self.palette.target,
        });
    }

    fn needle(&mut self, needle: &NeedleState) {
        let face = self.face;
        match self.artwork(face.needle_asset.as_deref(), GaugePart::Needle) {
            // artwork points along +x with its pivot at its center
            Artwork::Asset(asset) => {
                let k = 2.0 * face.needle_length / asset.width.max(1.0);
                let transform = self
                    .layout
                    .transform()
                    .then(&Affine::translate(face.center.x, face.center.y))
                    .then(&Affine::rotate(needle.rotation))
                    .then(&Affine::scale(k, k))
                    .then(&Affine::translate(-asset.width / 2.0, -asset.height / 2.0));
                self.body(DrawCommand::Asset { asset, transform });
            }
            Artwork::Procedural => self.body(DrawCommand::Needle {
                from: polar_to_cartesian(
                    self.center,
                    self.layout.scaled(face.needle_back_length),
                    needle.radian + PI,
                ),
                to: polar_to_cartesian(self.center, self.layout.scaled(face.needle_length), needle.radian),
                width: self.layout.scaled(face.needle_width),
                color: self.palette.needle,
            }),
            Artwork::Omitted => {}
        }
    }

    fn hub(&mut self) {
        let face = self.face;
        match self.artwork(face.hub_asset.as_deref(), GaugePart::Hub) {
            Artwork::Asset(asset) => {
                let r = face.hub_radius;
                let transform = self
                    .layout
                    .transform()
                    .then(&Affine::translate(face.center.x - r, face.center.y - r))
                    .then(&Affine::scale(2.0 * r / asset.width.max(1.0), 2.0 * r / asset.height.max(1.0)));
                self.body(DrawCommand::Asset { asset, transform });
            }
            Artwork::Procedural => self.body(DrawCommand::Disc {
                center: self.center,
                radius: self.layout.scaled(face.hub_radius),
                color: self.palette.hub,
            }),
            Artwork::Omitted => {}
        }
    }

    // ========================================================================
    // LABEL LAYER
    // ========================================================================

    fn labels(&mut self, ticks: &mut TickSet) {
        let font = self.resources.font;
        let approx = ApproxMetrics::default();
        let measure: &dyn TextMeasure = match font {
            Some(font) => font,
            None => &approx,
        };

        let labels: Vec<String> = ticks.labels().map(str::to_owned).collect();
        let radius = self.layout.scaled(self.face.value_radius);
        let gap = self.options.label_gap;
        let (sweep, adjust) = (self.domain.sweep, self.traits.label_arc_adjust);
        let fit = fit_tick_font(
            measure,
            &labels,
            self.layout.scaled(self.face.label_font_size),
            radius,
            sweep,
            adjust,
            gap,
        );
        let widths: Vec<f64> = labels.iter().map(|l| measure.measure(l, fit.size).width).collect();
        let thinned = label_flags(&widths, gap, radius * (sweep + adjust));
        for (tick, visible) in ticks.majors.iter_mut().zip(thinned.flags) {
            tick.visible = visible;
        }
        self.traits.labels.apply(ticks, self.spec.min);

        if self.font_missing_for_raster() {
            warn!("no font loaded, tick labels skipped");
            self.skip(GaugePart::Labels, "no font loaded".into());
            return;
        }
        for tick in ticks.visible_labels() {
            self.scene.add_command(
                Layer::Labels,
                DrawCommand::Text {
                    at: polar_to_cartesian(self.center, radius, tick.label_radian),
                    text: tick.label.clone(),
                    size: fit.size,
                    anchor: tick.anchor,
                    color: self.palette.label,
                },
            );
        }
    }

    fn central_value(&mut self, needle: &NeedleState) {
        if !self.traits.central_value {
            return;
        }
        let Some(slot) = self.face.value_slot else {
            return;
        };
        if self.font_missing_for_raster() {
            warn!("no font loaded, central value skipped");
            self.skip(GaugePart::CentralValue, "no font loaded".into());
            return;
        }
        let approx = ApproxMetrics::default();
        let measure: &dyn TextMeasure = match self.resources.font {
            Some(font) => font,
            None => &approx,
        };
        let text = abbreviate(needle.value, label_decimals(self.spec.major_inc));
        let slot = self.layout.rect(slot);
        let size = fit_central_font(measure, &text, slot, self.options.font_scale);
        self.scene.add_command(
            Layer::Labels,
            DrawCommand::Text {
                at: slot.center(),
                text,
                size,
                anchor: TextAnchor::Middle,
                color: self.palette.label,
            },
        );
    }
}

// ============================================================================
// RENDERER
// ============================================================================

/// Owns the shared collaborators so callers only pass per-render data.
pub struct Renderer {
    assets: Arc<AssetCache>,
    theme: Box<dyn ThemeResolver + Send + Sync>,
    font: Option<FontFace>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            assets: Arc::new(AssetCache::new()),
            theme: Box::new(DefaultTheme),
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontFace) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_theme(mut self, theme: impl ThemeResolver + Send + Sync + 'static) -> Self {
        self.theme = Box::new(theme);
        self
    }

    /// Shares an asset cache with other renderers.
    pub fn with_assets(mut self, assets: Arc<AssetCache>) -> Self {
        self.assets = assets;
        self
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    pub fn resources(&self) -> RenderResources<'_> {
        RenderResources {
            theme: self.theme.as_ref(),
            assets: &self.assets,
            font: self.font.as_ref(),
        }
    }

    pub fn render(
        &self,
        face: &FaceGeometry,
        shape: ShapeVariant,
        spec: &GaugeSpec,
        options: &RenderOptions,
        ctx: &RenderContext,
    ) -> RenderOutput {
        render(face, shape, spec, options, ctx, self.resources())
    }

    /// Decodes a packed face ID, resolves its face in `catalog` and renders it.
    ///
    /// The ID's rotation field is added to the face's own rotation offset.
    pub fn render_face_id(
        &self,
        catalog: &FaceCatalog,
        face_id: u16,
        theme_offset: u32,
        spec: &GaugeSpec,
        options: &RenderOptions,
        ctx: &RenderContext,
    ) -> Result<RenderOutput> {
        let id = FaceId::decode(face_id)?;
        let mut face = catalog.resolve(id.face, theme_offset)?.clone();
        face.rotation_offset += id.rotation_offset();
        Ok(self.render(&face, id.shape, spec, options, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Color;

    fn scene_for(face: &FaceGeometry, shape: ShapeVariant, spec: &GaugeSpec, format: OutputFormat) -> (Scene, Vec<SkippedLayer>) {
        let assets = AssetCache::new();
        let resources = RenderResources {
            theme: &DefaultTheme,
            assets: &assets,
            font: None,
        };
        let options = RenderOptions::builder().width(200).height(200).format(format).build();
        paint(face, shape, spec, &options, &RenderContext::default(), resources)
    }

    fn count(scene: &Scene, layer: Layer, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        scene.commands(layer).iter().filter(|c| pred(c)).count()
    }

    #[test]
    fn test_degenerate_spec_draws_panel_only() {
        let spec = GaugeSpec::builder().min(10.0).max(10.0).build();
        let (scene, skipped) = scene_for(&FaceGeometry::default(), ShapeVariant::Full, &spec, OutputFormat::Vector);
        assert_eq!(scene.commands(Layer::Body).len(), 1);
        assert!(matches!(scene.commands(Layer::Body)[0], DrawCommand::Disc { .. }));
        assert!(scene.commands(Layer::Labels).is_empty());
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_scenario_ticks_and_labels() {
        let spec = GaugeSpec::builder().major_inc(25.0).minor_inc(5.0).build();
        let (scene, _) = scene_for(&FaceGeometry::default(), ShapeVariant::Half, &spec, OutputFormat::Vector);
        let lines = count(&scene, Layer::Body, |c| matches!(c, DrawCommand::Line { .. }));
        // 5 majors and 4 minors in each of the 4 intervals
        assert_eq!(lines, 5 + 16);
        let labels: Vec<&str> = scene
            .commands(Layer::Labels)
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, ["0", "25", "50", "75", "100"]);
    }

    #[test]
    fn test_rounded_ranges_add_outer_caps() {
        let spec = GaugeSpec::builder()
            .ranges(vec![30.0, 70.0])
            .range_colors(vec![Color::GREEN, Color::RED])
            .round_ranges(true)
            .build();
        let (scene, _) = scene_for(&FaceGeometry::default(), ShapeVariant::Half, &spec, OutputFormat::Vector);
        assert_eq!(count(&scene, Layer::Body, |c| matches!(c, DrawCommand::Band(_))), 3);
        assert_eq!(count(&scene, Layer::Body, |c| matches!(c, DrawCommand::RoundCap { .. })), 2);
    }

    #[test]
    fn test_missing_colors_skip_range_layer_only() {
        let spec = GaugeSpec::builder()
            .ranges(vec![30.0, 70.0])
            .range_colors(vec![Color::GREEN])
            .build();
        let (scene, skipped) = scene_for(&FaceGeometry::default(), ShapeVariant::Half, &spec, OutputFormat::Vector);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].part, GaugePart::Ranges);
        assert_eq!(count(&scene, Layer::Body, |c| matches!(c, DrawCommand::Band(_))), 0);
        assert_eq!(count(&scene, Layer::Body, |c| matches!(c, DrawCommand::Needle { .. })), 1);
    }

    #[test]
    fn test_missing_needle_asset_omits_needle() {
        let face = FaceGeometry::builder()
            .needle_asset("does/not/exist.svg".into())
            .build();
        let (scene, skipped) = scene_for(&face, ShapeVariant::Full, &GaugeSpec::builder().build(), OutputFormat::Vector);
        assert!(skipped.iter().any(|s| s.part == GaugePart::Needle));
        assert_eq!(count(&scene, Layer::Body, |c| matches!(c, DrawCommand::Needle { .. })), 0);
        // the hub still sits on top
        assert!(matches!(scene.commands(Layer::Body).last(), Some(DrawCommand::Disc { .. })));
    }

    #[test]
    fn test_raster_without_font_skips_labels() {
        let (scene, skipped) = scene_for(
            &FaceGeometry::default(),
            ShapeVariant::Full,
            &GaugeSpec::builder().build(),
            OutputFormat::Raster,
        );
        assert!(scene.commands(Layer::Labels).is_empty());
        assert!(skipped.iter().any(|s| s.part == GaugePart::Labels));
    }

    #[test]
    fn test_rotated_full_fills_to_needle_and_hides_zero() {
        let face = FaceGeometry::builder().angle_span(2.0 * PI).build();
        let spec = GaugeSpec::builder().value(40.0).major_inc(20.0).build();
        let (scene, _) = scene_for(&face, ShapeVariant::RotatedFull, &spec, OutputFormat::Vector);
        assert_eq!(count(&scene, Layer::Body, |c| matches!(c, DrawCommand::Band(_))), 1);
        assert!(!scene
            .commands(Layer::Labels)
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "0")));
    }

    #[test]
    fn test_central_value_uses_slot() {
        let face = FaceGeometry::builder()
            .angle_span(2.0 * PI)
            .value_slot(crate::geometry::Rect::new(70.0, 120.0, 60.0, 24.0))
            .build();
        let spec = GaugeSpec::builder().value(42.0).build();
        let (scene, _) = scene_for(&face, ShapeVariant::Full, &spec, OutputFormat::Vector);
        let central = scene.commands(Layer::Labels).iter().find_map(|c| match c {
            DrawCommand::Text { at, text, .. } if text == "42" => Some(*at),
            _ => None,
        });
        assert_eq!(central, Some(Point::new(100.0, 132.0)));
    }
}
