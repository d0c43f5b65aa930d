//! Polar/Cartesian conversion and angle normalization.
//!
//! Angles are mathematical: counter-clockwise positive with 0 on the +x axis.
//! Screen space has y growing downward, so the conversions flip the y axis.

use serde::Deserialize;
use std::f64::consts::{PI, TAU};

/// A point in design units or pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Padding subtracted from the output size in export mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    pub const fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// 2D affine transform in SVG `matrix(a b c d e f)` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Screen rotation: positive angles turn clockwise because y points down.
    pub fn rotate(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self` applied after `inner`.
    pub fn then(&self, inner: &Affine) -> Affine {
        Affine {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn invert(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

pub fn degree_to_radian(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Converts to degrees normalized into `[0, 360)`.
pub fn radian_to_degree(radians: f64) -> f64 {
    let degrees = (radians * 180.0 / PI).rem_euclid(360.0);
    // rem_euclid may round up to the modulus itself
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

/// Normalizes an angle into `[0, 2π)`.
pub fn normalize_radian(radians: f64) -> f64 {
    let r = radians.rem_euclid(TAU);
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Point at `radius` from `center` along the mathematical angle `radians`.
pub fn polar_to_cartesian(center: Point, radius: f64, radians: f64) -> Point {
    Point::new(
        center.x + radius * radians.cos(),
        center.y - radius * radians.sin(),
    )
}

/// Returns `(radius, radians)` of `p` around `center`, angle in `[0, 2π)`.
pub fn cartesian_to_polar(center: Point, p: Point) -> (f64, f64) {
    let dx = p.x - center.x;
    let dy = center.y - p.y;
    ((dx * dx + dy * dy).sqrt(), normalize_radian(dy.atan2(dx)))
}

/// True when `angle` lies on the clockwise sweep from `begin` down to `begin - sweep`.
pub fn angle_in_sweep(angle: f64, begin: f64, sweep: f64) -> bool {
    if sweep >= TAU {
        return true;
    }
    normalize_radian(begin - angle) <= sweep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_polar_round_trip() {
        let c = Point::new(100.0, 100.0);
        let p = polar_to_cartesian(c, 50.0, degree_to_radian(30.0));
        let (r, a) = cartesian_to_polar(c, p);
        assert!(close(r, 50.0));
        assert!(close(radian_to_degree(a), 30.0));
    }

    #[test]
    fn test_screen_y_points_down() {
        let c = Point::new(0.0, 0.0);
        let top = polar_to_cartesian(c, 10.0, PI / 2.0);
        assert!(close(top.x, 0.0));
        assert!(close(top.y, -10.0));
    }

    #[test]
    fn test_radian_to_degree_normalizes() {
        assert!(close(radian_to_degree(degree_to_radian(-90.0)), 270.0));
        assert!(close(radian_to_degree(degree_to_radian(720.0)), 0.0));
        assert!(close(radian_to_degree(degree_to_radian(405.0)), 45.0));
    }

    #[test]
    fn test_affine_compose_and_invert() {
        let t = Affine::translate(10.0, 20.0)
            .then(&Affine::rotate(PI / 2.0))
            .then(&Affine::scale(2.0, 2.0));
        let p = t.apply(Point::new(1.0, 0.0));
        // scale to (2,0), quarter turn clockwise on screen to (0,2), then shift
        assert!(close(p.x, 10.0) && close(p.y, 22.0));
        let back = t.invert().unwrap().apply(p);
        assert!(close(back.x, 1.0) && close(back.y, 0.0));
        assert!(Affine::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_angle_in_sweep_wraps() {
        // sweep from 45° clockwise to -45°
        let begin = degree_to_radian(45.0);
        let sweep = degree_to_radian(90.0);
        assert!(angle_in_sweep(0.0, begin, sweep));
        assert!(angle_in_sweep(degree_to_radian(350.0), begin, sweep));
        assert!(!angle_in_sweep(degree_to_radian(90.0), begin, sweep));
    }
}
