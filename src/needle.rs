//! Value to needle angle mapping.

use crate::angle::AngleDomain;
use crate::config::{Color, GaugeSpec};
use crate::ranges::RangeSegment;
use crate::shape::ShapeTraits;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedleState {
    /// The clamped value the needle shows.
    pub value: f64,
    /// Angle of the needle tip, always inside the sweep.
    pub radian: f64,
    /// Screen rotation applied to needle artwork drawn pointing along +x.
    pub rotation: f64,
}

pub fn needle_state(spec: &GaugeSpec, domain: &AngleDomain, traits: &ShapeTraits) -> NeedleState {
    let value = spec.clamped_value();
    let fraction = (value - spec.min) / (spec.max - spec.min);
    let travelled = domain.sweep * fraction;
    NeedleState {
        value,
        radian: domain.begin - travelled,
        rotation: travelled - domain.begin + traits.needle_adjust,
    }
}

/// Band from the begin angle up to the needle, used by the rotated variants.
pub fn value_fill_segment(
    spec: &GaugeSpec,
    domain: &AngleDomain,
    needle: &NeedleState,
    color: Color,
) -> Option<RangeSegment> {
    if needle.value <= spec.min {
        return None;
    }
    Some(RangeSegment {
        begin_value: spec.min,
        end_value: needle.value,
        begin_radian: domain.begin,
        end_radian: needle.radian,
        color1: color,
        color2: color,
        gradient: false,
        left_round: false,
        right_round: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::degree_to_radian;
    use crate::shape::ShapeVariant;
    use std::f64::consts::PI;

    fn setup(shape: ShapeVariant) -> (AngleDomain, ShapeTraits) {
        (
            AngleDomain::resolve(shape, degree_to_radian(270.0), 0.0),
            shape.traits(),
        )
    }

    #[test]
    fn test_value_above_max_clamps_to_end() {
        let (domain, traits) = setup(ShapeVariant::Full);
        let spec = GaugeSpec::builder().value(150.0).build();
        let needle = needle_state(&spec, &domain, &traits);
        assert_eq!(needle.value, 100.0);
        assert!((needle.radian - (domain.begin - domain.sweep)).abs() < 1e-12);
    }

    #[test]
    fn test_value_below_min_clamps_to_begin() {
        let (domain, traits) = setup(ShapeVariant::Full);
        let spec = GaugeSpec::builder().value(-5.0).build();
        let needle = needle_state(&spec, &domain, &traits);
        assert_eq!(needle.radian, domain.begin);
        assert_eq!(needle.rotation, -domain.begin);
    }

    #[test]
    fn test_rotated_quarter_turns_artwork_half_a_turn() {
        let (domain, traits) = setup(ShapeVariant::RotatedQuarter);
        let spec = GaugeSpec::builder().value(50.0).build();
        let needle = needle_state(&spec, &domain, &traits);
        assert!((needle.rotation - (domain.sweep / 2.0 - domain.begin - PI)).abs() < 1e-12);
        assert!((needle.radian + needle.rotation + PI).abs() < 1e-12);
    }

    #[test]
    fn test_value_fill_spans_begin_to_needle() {
        let (domain, traits) = setup(ShapeVariant::RotatedFull);
        let spec = GaugeSpec::builder().value(40.0).build();
        let needle = needle_state(&spec, &domain, &traits);
        let fill = value_fill_segment(&spec, &domain, &needle, Color::GREEN).unwrap();
        assert_eq!(fill.begin_radian, domain.begin);
        assert_eq!(fill.end_radian, needle.radian);
        assert!(!fill.left_round && !fill.right_round);

        let at_min = GaugeSpec::builder().value(0.0).build();
        let needle = needle_state(&at_min, &domain, &traits);
        assert!(value_fill_segment(&at_min, &domain, &needle, Color::GREEN).is_none());
    }
}
