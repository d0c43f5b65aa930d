// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================
//
// A render first records draw commands in canvas pixels, then replays them
// into whichever sink was requested. Labels live on their own layer so the
// raster sink can keep them out of the drop shadow.

use crate::assets::{Asset, AssetData};
use crate::config::Color;
use crate::geometry::{polar_to_cartesian, Affine, Point};
use crate::raster::{self, ArcFill, Canvas};
use crate::svg::{self, Fill, SvgDocument};
use crate::text::FontFace;
use crate::ticks::TextAnchor;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Everything that casts a shadow.
    Body,
    Labels,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Disc {
        center: Point,
        radius: f64,
        color: Color,
    },
    Band(ArcFill),
    /// Half-disc closing a band edge, on the `outward` side.
    RoundCap {
        center: Point,
        radius: f64,
        outward: Point,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        width: f64,
        color: Color,
    },
    /// Needle narrowing from `width` at `from` towards `to`.
    Needle {
        from: Point,
        to: Point,
        width: f64,
        color: Color,
    },
    Polygon {
        points: Vec<Point>,
        color: Color,
    },
    Text {
        at: Point,
        text: String,
        size: f64,
        anchor: TextAnchor,
        color: Color,
    },
    /// Cached artwork mapped from its own `width × height` box by `transform`.
    Asset {
        asset: Arc<Asset>,
        transform: Affine,
    },
}

impl DrawCommand {
    /// Annular band between `inner` and `outer`, clockwise from `begin` to `end`.
    ///
    /// Gradient bands run along the chord joining the band ends on the outer edge.
    pub fn band(
        center: Point,
        inner: f64,
        outer: f64,
        (begin, end): (f64, f64),
        (color1, color2): (Color, Color),
        gradient: bool,
    ) -> Self {
        let chord = gradient.then(|| {
            (
                polar_to_cartesian(center, outer, begin),
                polar_to_cartesian(center, outer, end),
            )
        });
        DrawCommand::Band(ArcFill {
            center,
            inner,
            outer,
            begin,
            end,
            color1,
            color2,
            gradient: chord,
            edge_softness: 1.0,
        })
    }

    fn render(&self, canvas: &mut Canvas, font: Option<&FontFace>) {
        match self {
            DrawCommand::Disc {
                center,
                radius,
                color,
            } => raster::fill_circle(canvas, *center, *radius, *color),
            DrawCommand::Band(arc) => raster::fill_arc(canvas, arc),
            DrawCommand::RoundCap {
                center,
                radius,
                outward,
                color,
            } => raster::fill_half_disc(canvas, *center, *radius, *outward, *color),
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => raster::draw_thick_line_aa(canvas, *from, *to, *width, *color),
            DrawCommand::Needle {
                from,
                to,
                width,
                color,
            } => raster::draw_thick_line_tapered_aa(canvas, *from, *to, *width, *color),
            DrawCommand::Polygon { points, color } => raster::fill_polygon(canvas, points, *color),
            DrawCommand::Text {
                at,
                text,
                size,
                anchor,
                color,
            } => match font {
                Some(font) => raster::draw_text(canvas, font, *at, text, *size, *anchor, *color),
                None => debug!(text = %text, "no font, text not rasterized"),
            },
            DrawCommand::Asset { asset, transform } => match &asset.data {
                AssetData::Raster(image) => raster::draw_image(canvas, image, transform),
                AssetData::Vector(_) => {
                    debug!(path = ?asset.path, "vector artwork skipped by raster sink")
                }
            },
        }
    }

    fn write_svg(&self, doc: &mut SvgDocument) {
        match self {
            DrawCommand::Disc {
                center,
                radius,
                color,
            } => doc.circle(*center, *radius, *color),
            DrawCommand::Band(arc) => {
                let d = svg::annular_sector_path(arc.center, arc.inner, arc.outer, arc.begin, arc.end);
                let fill = match arc.gradient {
                    Some((a, b)) => Fill::Gradient(doc.add_gradient(a, b, arc.color1, arc.color2)),
                    None => Fill::Solid(arc.color1),
                };
                doc.path(d, fill);
            }
            DrawCommand::RoundCap {
                center,
                radius,
                outward,
                color,
            } => doc.path(
                svg::half_disc_path(*center, *radius, *outward),
                Fill::Solid(*color),
            ),
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => doc.line(*from, *to, *width, *color),
            DrawCommand::Needle {
                from,
                to,
                width,
                color,
            } => doc.polygon(&needle_outline(*from, *to, *width), *color),
            DrawCommand::Polygon { points, color } => doc.polygon(points, *color),
            DrawCommand::Text {
                at,
                text,
                size,
                anchor,
                color,
            } => doc.text(*at, text, *size, *anchor, *color),
            DrawCommand::Asset { asset, transform } => match &asset.data {
                AssetData::Vector(fragment) => {
                    doc.merge(fragment, asset.width, asset.height, transform)
                }
                AssetData::Raster(_) => doc.image_ref(
                    &asset.path.to_string_lossy(),
                    asset.width,
                    asset.height,
                    transform,
                ),
            },
        }
    }
}

/// Quad matching the raster needle taper: full width at `from`, 5% at `to`.
fn needle_outline(from: Point, to: Point, width: f64) -> Vec<Point> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
    let (nx, ny) = (-dy / len, dx / len);
    let (w0, w1) = (width / 2.0, width * 0.05 / 2.0);
    vec![
        Point::new(from.x + nx * w0, from.y + ny * w0),
        Point::new(to.x + nx * w1, to.y + ny * w1),
        Point::new(to.x - nx * w1, to.y - ny * w1),
        Point::new(from.x - nx * w0, from.y - ny * w0),
    ]
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    body: Vec<DrawCommand>,
    labels: Vec<DrawCommand>,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            body: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn add_command(&mut self, layer: Layer, command: DrawCommand) {
        match layer {
            Layer::Body => self.body.push(command),
            Layer::Labels => self.labels.push(command),
        }
    }

    pub fn commands(&self, layer: Layer) -> &[DrawCommand] {
        match layer {
            Layer::Body => &self.body,
            Layer::Labels => &self.labels,
        }
    }

    pub fn render(&self, layer: Layer, canvas: &mut Canvas, font: Option<&FontFace>) {
        for command in self.commands(layer) {
            command.render(canvas, font);
        }
    }

    /// Both layers, labels on top.
    pub fn to_svg(&self) -> SvgDocument {
        let mut doc = SvgDocument::new(self.width as f64, self.height as f64);
        for command in self.body.iter().chain(&self.labels) {
            command.write_svg(&mut doc);
        }
        doc
    }
}
