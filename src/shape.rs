//! Shape variants and face-ID decoding.
//!
//! Each variant is a plain tag; its behavior lives in a [`ShapeTraits`] row
//! looked up from a static table, so every override point can be tested on
//! its own.

use crate::error::{GaugeError, Result};
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, PI};

/// Gauge layout selected by the face ID's shape field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ShapeVariant {
    Full,
    Half,
    Quarter,
    Eighth,
    Sector,
    RotatedFull,
    RotatedQuarter,
}

/// Which begin-angle formula a variant uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleFormula {
    /// `π/2 + span/2 + offset`: the sweep is centered on the top of the face.
    Centered,
    /// `(π/2 - span) + span - offset`: the sweep starts at the top.
    TopAnchored,
}

/// How value labels are placed and thinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Radial labels thinned by the jump algorithm.
    Radial,
    /// Only the first and last labels, anchored away from the arc ends.
    Endpoints,
    /// Radial labels without the zero/min labels, nudged off the sweep boundary.
    Rotated,
}

/// The per-variant override points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeTraits {
    pub angle: AngleFormula,
    /// Added to the needle rotation to match the orientation of the face's needle artwork.
    pub needle_adjust: f64,
    pub labels: LabelPolicy,
    /// Extra angle added to the sweep when measuring room for tick labels.
    pub label_arc_adjust: f64,
    /// Draw the aggregate value in the middle of the face.
    pub central_value: bool,
    /// Fill the arc from the begin angle to the needle.
    pub value_fill: bool,
}

const CENTERED_RADIAL: ShapeTraits = ShapeTraits {
    angle: AngleFormula::Centered,
    needle_adjust: 0.0,
    labels: LabelPolicy::Radial,
    label_arc_adjust: 0.0,
    central_value: false,
    value_fill: false,
};

impl ShapeVariant {
    pub const ALL: [ShapeVariant; 7] = [
        ShapeVariant::Full,
        ShapeVariant::Half,
        ShapeVariant::Quarter,
        ShapeVariant::Eighth,
        ShapeVariant::Sector,
        ShapeVariant::RotatedFull,
        ShapeVariant::RotatedQuarter,
    ];

    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| GaugeError::InvalidArgument(format!("unknown shape code {code}")))
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn traits(self) -> ShapeTraits {
        match self {
            ShapeVariant::Full => ShapeTraits {
                central_value: true,
                ..CENTERED_RADIAL
            },
            ShapeVariant::Half => CENTERED_RADIAL,
            ShapeVariant::Quarter => ShapeTraits {
                angle: AngleFormula::TopAnchored,
                ..CENTERED_RADIAL
            },
            ShapeVariant::Eighth => ShapeTraits {
                needle_adjust: FRAC_PI_2,
                ..CENTERED_RADIAL
            },
            ShapeVariant::Sector => ShapeTraits {
                angle: AngleFormula::TopAnchored,
                needle_adjust: FRAC_PI_2,
                labels: LabelPolicy::Endpoints,
                ..CENTERED_RADIAL
            },
            ShapeVariant::RotatedFull => ShapeTraits {
                angle: AngleFormula::TopAnchored,
                labels: LabelPolicy::Rotated,
                label_arc_adjust: -2.0 * crate::ticks::LABEL_NUDGE,
                central_value: true,
                value_fill: true,
                ..CENTERED_RADIAL
            },
            ShapeVariant::RotatedQuarter => ShapeTraits {
                angle: AngleFormula::TopAnchored,
                needle_adjust: -PI,
                labels: LabelPolicy::Rotated,
                label_arc_adjust: -2.0 * crate::ticks::LABEL_NUDGE,
                value_fill: true,
                ..CENTERED_RADIAL
            },
        }
    }
}

/// Bit-packed face identifier: `rotation:4 | shape:4 | face:8` (high to low).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId {
    pub face: u8,
    pub shape: ShapeVariant,
    /// Rotation in steps of 22.5°.
    pub rotation: u8,
}

impl FaceId {
    pub fn decode(id: u16) -> Result<Self> {
        Ok(Self {
            face: (id & 0xff) as u8,
            shape: ShapeVariant::from_code(((id >> 8) & 0x0f) as u8)?,
            rotation: ((id >> 12) & 0x0f) as u8,
        })
    }

    pub fn encode(&self) -> u16 {
        ((self.rotation as u16 & 0x0f) << 12)
            | ((self.shape.code() as u16 & 0x0f) << 8)
            | self.face as u16
    }

    pub fn rotation_offset(&self) -> f64 {
        crate::angle::rotation_offset_from_field(self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_id_fields() {
        let id = FaceId::decode(0x3205).unwrap();
        assert_eq!(id.face, 5);
        assert_eq!(id.shape, ShapeVariant::Quarter);
        assert_eq!(id.rotation, 3);
        assert_eq!(id.encode(), 0x3205);
    }

    #[test]
    fn test_unknown_shape_code_is_rejected() {
        assert!(FaceId::decode(0x0f00).is_err());
        assert!(ShapeVariant::from_code(7).is_err());
    }

    #[test]
    fn test_needle_adjustments() {
        assert_eq!(ShapeVariant::Eighth.traits().needle_adjust, FRAC_PI_2);
        assert_eq!(ShapeVariant::Sector.traits().needle_adjust, FRAC_PI_2);
        assert_eq!(ShapeVariant::RotatedQuarter.traits().needle_adjust, -PI);
        assert_eq!(ShapeVariant::Full.traits().needle_adjust, 0.0);
    }

    #[test]
    fn test_only_full_circle_variants_show_central_value() {
        let central: Vec<_> = ShapeVariant::ALL
            .iter()
            .filter(|s| s.traits().central_value)
            .collect();
        assert_eq!(
            central,
            vec![&ShapeVariant::Full, &ShapeVariant::RotatedFull]
        );
    }
}
