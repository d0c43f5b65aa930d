//! Begin/end sweep angles for a face.

use crate::geometry::{degree_to_radian, normalize_radian};
use crate::shape::{AngleFormula, ShapeVariant};
use std::f64::consts::{FRAC_PI_2, TAU};

/// One rotation step of the face ID's rotation field.
pub const ROTATION_STEP_DEGREES: f64 = 22.5;

/// `-(field × 22.5°)` in radians; only the low 4 bits of `field` count.
pub fn rotation_offset_from_field(field: u8) -> f64 {
    -degree_to_radian((field & 0x0f) as f64 * ROTATION_STEP_DEGREES)
}

/// The angular domain of a gauge: a clockwise sweep from `begin` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleDomain {
    pub begin: f64,
    pub end: f64,
    pub sweep: f64,
}

impl AngleDomain {
    pub fn resolve(shape: ShapeVariant, angle_span: f64, rotation_offset: f64) -> Self {
        let begin = match shape.traits().angle {
            AngleFormula::Centered => FRAC_PI_2 + angle_span / 2.0 + rotation_offset,
            AngleFormula::TopAnchored => (FRAC_PI_2 - angle_span) + angle_span - rotation_offset,
        };
        let begin = normalize_radian(begin);

        // taken from the span to avoid cancellation error
        let mut sweep = angle_span;
        if sweep < 0.0 {
            sweep += TAU;
        } else if sweep > TAU {
            sweep -= TAU;
        }
        let sweep = sweep.clamp(0.0, TAU);
        Self {
            begin,
            end: begin - sweep,
            sweep,
        }
    }

    /// Angle of `value` on a `[min, max]` scale, unclamped.
    pub fn radian_for(&self, value: f64, min: f64, max: f64) -> f64 {
        self.begin - self.sweep * (value - min) / (max - min)
    }

    pub fn is_full_circle(&self) -> bool {
        self.sweep >= TAU - 1e-9
    }

    pub fn low(&self) -> f64 {
        self.begin.min(self.begin - self.sweep)
    }

    pub fn high(&self) -> f64 {
        self.begin.max(self.begin - self.sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_default_formula_centers_on_top() {
        let d = AngleDomain::resolve(ShapeVariant::Full, degree_to_radian(270.0), 0.0);
        assert!((d.begin - degree_to_radian(225.0)).abs() < 1e-9);
        assert!((d.end - degree_to_radian(-45.0)).abs() < 1e-9);
        assert!((d.sweep - degree_to_radian(270.0)).abs() < 1e-9);
    }

    #[test]
    fn test_top_anchored_ignores_half_span_bias() {
        let d = AngleDomain::resolve(ShapeVariant::Quarter, FRAC_PI_2, 0.0);
        assert!((d.begin - FRAC_PI_2).abs() < 1e-9);
        assert!(d.end.abs() < 1e-9);
    }

    #[test]
    fn test_rotation_sign_differs_between_formulas() {
        let offset = rotation_offset_from_field(4);
        assert!((offset + FRAC_PI_2).abs() < 1e-9);
        let centered = AngleDomain::resolve(ShapeVariant::Half, PI, offset);
        let anchored = AngleDomain::resolve(ShapeVariant::Quarter, FRAC_PI_2, offset);
        assert!((centered.begin - PI / 2.0).abs() < 1e-9);
        assert!((anchored.begin - PI).abs() < 1e-9);
    }

    #[test]
    fn test_full_circle_keeps_full_sweep() {
        let d = AngleDomain::resolve(ShapeVariant::Full, TAU, 0.0);
        assert!((d.sweep - TAU).abs() < 1e-9);
        assert!(d.is_full_circle());
    }

    #[test]
    fn test_negative_span_wraps_once() {
        let d = AngleDomain::resolve(ShapeVariant::Half, -FRAC_PI_2, 0.0);
        assert!(d.sweep >= 0.0 && d.sweep <= TAU);
        assert!((d.sweep - 1.5 * PI).abs() < 1e-9);
        assert!((d.begin - d.end - d.sweep).abs() < 1e-12);
    }

    #[test]
    fn test_end_follows_wrapped_sweep() {
        let d = AngleDomain::resolve(ShapeVariant::Full, TAU + FRAC_PI_2, 0.0);
        assert!((d.sweep - FRAC_PI_2).abs() < 1e-9);
        assert!((d.end - (d.begin - FRAC_PI_2)).abs() < 1e-12);
    }
}
