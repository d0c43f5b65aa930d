//! Vector sink: a small SVG document builder.
//!
//! Asset sub-documents are merged by wrapping their markup in a `<g>` with an
//! affine `matrix(...)` transform, so callers can inline the result directly.

use crate::assets::SvgFragment;
use crate::config::Color;
use crate::geometry::{polar_to_cartesian, Affine, Point};
use crate::ticks::TextAnchor;
use std::f64::consts::{PI, TAU};
use std::fmt;

/// Path fill: a solid color or the id of a registered gradient.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Color),
    Gradient(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    pub width: f64,
    pub height: f64,
    defs: Vec<String>,
    elements: Vec<String>,
    next_id: usize,
}

/// Formats a coordinate with at most two decimals.
pub fn fmt_num(v: f64) -> String {
    let mut s = format!("{v:.2}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn paint(color: Color) -> String {
    if color.a == 0xff {
        format!(r#"fill="{}""#, color.to_hex())
    } else {
        format!(
            r#"fill="{}" fill-opacity="{}""#,
            color.to_hex(),
            fmt_num(color.opacity())
        )
    }
}

impl SvgDocument {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            defs: Vec::new(),
            elements: Vec::new(),
            next_id: 0,
        }
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn push(&mut self, element: String) {
        self.elements.push(element);
    }

    /// Registers a linear gradient in user space and returns its id.
    pub fn add_gradient(&mut self, from: Point, to: Point, c1: Color, c2: Color) -> String {
        let id = format!("gauge-gradient-{}", self.next_id);
        self.next_id += 1;
        self.defs.push(format!(
            r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}"><stop offset="0" stop-color="{}" stop-opacity="{}"/><stop offset="1" stop-color="{}" stop-opacity="{}"/></linearGradient>"#,
            fmt_num(from.x),
            fmt_num(from.y),
            fmt_num(to.x),
            fmt_num(to.y),
            c1.to_hex(),
            fmt_num(c1.opacity()),
            c2.to_hex(),
            fmt_num(c2.opacity()),
        ));
        id
    }

    pub fn circle(&mut self, center: Point, radius: f64, color: Color) {
        self.push(format!(
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(radius),
            paint(color)
        ));
    }

    pub fn line(&mut self, from: Point, to: Point, width: f64, color: Color) {
        self.push(format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-opacity="{}" stroke-width="{}" stroke-linecap="round"/>"#,
            fmt_num(from.x),
            fmt_num(from.y),
            fmt_num(to.x),
            fmt_num(to.y),
            color.to_hex(),
            fmt_num(color.opacity()),
            fmt_num(width)
        ));
    }

    pub fn polygon(&mut self, points: &[Point], color: Color) {
        let list: Vec<String> = points
            .iter()
            .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
            .collect();
        self.push(format!(
            r#"<polygon points="{}" {}/>"#,
            list.join(" "),
            paint(color)
        ));
    }

    pub fn path(&mut self, d: String, fill: Fill) {
        let fill = match fill {
            Fill::Solid(color) => paint(color),
            Fill::Gradient(id) => format!(r#"fill="url(#{id})""#),
        };
        self.push(format!(r#"<path d="{d}" {fill}/>"#));
    }

    pub fn text(&mut self, at: Point, text: &str, size: f64, anchor: TextAnchor, color: Color) {
        let anchor = match anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        };
        self.push(format!(
            r#"<text x="{}" y="{}" font-size="{}" text-anchor="{anchor}" dominant-baseline="central" {}>{}</text>"#,
            fmt_num(at.x),
            fmt_num(at.y),
            fmt_num(size),
            paint(color),
            escape(text)
        ));
    }

    /// Inlines another SVG document, mapping its `width × height` box through `transform`.
    pub fn merge(&mut self, fragment: &SvgFragment, width: f64, height: f64, transform: &Affine) {
        let inner = match fragment.view_box {
            Some((x, y, w, h)) => format!(
                r#"<svg x="0" y="0" width="{}" height="{}" viewBox="{} {} {} {}" overflow="visible">{}</svg>"#,
                fmt_num(width),
                fmt_num(height),
                fmt_num(x),
                fmt_num(y),
                fmt_num(w),
                fmt_num(h),
                fragment.body
            ),
            None => fragment.body.clone(),
        };
        self.push(format!(r#"<g transform="{}">{inner}</g>"#, matrix(transform)));
    }

    /// References a raster file by path.
    pub fn image_ref(&mut self, href: &str, width: f64, height: f64, transform: &Affine) {
        self.push(format!(
            r#"<image href="{}" width="{}" height="{}" transform="{}"/>"#,
            escape(href),
            fmt_num(width),
            fmt_num(height),
            matrix(transform)
        ));
    }
}

fn matrix(t: &Affine) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        fmt_num4(t.a),
        fmt_num4(t.b),
        fmt_num4(t.c),
        fmt_num4(t.d),
        fmt_num(t.e),
        fmt_num(t.f)
    )
}

fn fmt_num4(v: f64) -> String {
    let mut s = format!("{v:.4}");
    let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
    s.truncate(trimmed);
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Path data of an annular sector running clockwise from `begin` to `end`.
pub fn annular_sector_path(center: Point, inner: f64, outer: f64, begin: f64, end: f64) -> String {
    let extent = (begin - end).clamp(0.0, TAU);
    if extent >= TAU - 1e-9 {
        // a single arc command cannot draw a full circle
        let mid = begin - PI;
        return format!(
            "{} {} Z {} {} Z",
            arc_half(center, outer, begin, mid, true, true),
            arc_half(center, outer, mid, begin - TAU, false, true),
            arc_half(center, inner, begin, mid, true, false),
            arc_half(center, inner, mid, begin - TAU, false, false),
        );
    }
    let large = if extent > PI { 1 } else { 0 };
    let ob = polar_to_cartesian(center, outer, begin);
    let oe = polar_to_cartesian(center, outer, end);
    let ie = polar_to_cartesian(center, inner, end);
    let ib = polar_to_cartesian(center, inner, begin);
    format!(
        "M {} {} A {} {} 0 {large} 1 {} {} L {} {} A {} {} 0 {large} 0 {} {} Z",
        fmt_num(ob.x),
        fmt_num(ob.y),
        fmt_num(outer),
        fmt_num(outer),
        fmt_num(oe.x),
        fmt_num(oe.y),
        fmt_num(ie.x),
        fmt_num(ie.y),
        fmt_num(inner),
        fmt_num(inner),
        fmt_num(ib.x),
        fmt_num(ib.y),
    )
}

fn arc_half(center: Point, r: f64, from: f64, to: f64, move_to: bool, clockwise: bool) -> String {
    let (from, to) = if clockwise { (from, to) } else { (to, from) };
    let a = polar_to_cartesian(center, r, from);
    let b = polar_to_cartesian(center, r, to);
    let sweep = if clockwise { 1 } else { 0 };
    let head = if move_to {
        format!("M {} {} ", fmt_num(a.x), fmt_num(a.y))
    } else {
        String::new()
    };
    format!(
        "{head}A {} {} 0 0 {sweep} {} {}",
        fmt_num(r),
        fmt_num(r),
        fmt_num(b.x),
        fmt_num(b.y)
    )
}

/// Half-disc path on the `outward` side of `center`.
pub fn half_disc_path(center: Point, radius: f64, outward: Point) -> String {
    // the diameter is perpendicular to `outward`
    let (nx, ny) = (-outward.y, outward.x);
    let a = Point::new(center.x + nx * radius, center.y + ny * radius);
    let b = Point::new(center.x - nx * radius, center.y - ny * radius);
    format!(
        "M {} {} A {} {} 0 0 1 {} {} Z",
        fmt_num(a.x),
        fmt_num(a.y),
        fmt_num(radius),
        fmt_num(radius),
        fmt_num(b.x),
        fmt_num(b.y)
    )
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = fmt_num(self.width),
            h = fmt_num(self.height)
        )?;
        if !self.defs.is_empty() {
            write!(f, "<defs>{}</defs>", self.defs.join(""))?;
        }
        for element in &self.elements {
            f.write_str(element)?;
        }
        f.write_str("</svg>")
    }
}
