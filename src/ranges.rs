//! Colored range segments clipped onto the gauge domain.

use crate::angle::AngleDomain;
use crate::config::{Color, GaugeSpec};
use crate::error::RangeError;
use tracing::debug;

/// One colored band of the range annulus.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSegment {
    pub begin_value: f64,
    pub end_value: f64,
    pub begin_radian: f64,
    pub end_radian: f64,
    pub color1: Color,
    pub color2: Color,
    /// Interpolate from `color1` to `color2` instead of filling with `color1`.
    pub gradient: bool,
    pub left_round: bool,
    pub right_round: bool,
}

impl RangeSegment {
    /// Color at the start and end of the band, as actually painted.
    pub fn edge_colors(&self) -> (Color, Color) {
        if self.gradient {
            (self.color1, self.color2)
        } else {
            (self.color1, self.color1)
        }
    }
}

fn color_at(colors: &[Color], index: usize) -> Result<Color, RangeError> {
    colors.get(index).copied().ok_or(RangeError::MissingColor {
        index,
        available: colors.len(),
    })
}

/// Splits `[min, max]` at the gauge's range boundaries.
///
/// Boundaries are taken in index order; one that does not exceed the previously
/// accepted boundary is dropped along with its color, never reordered. The
/// band before the first boundary is solid `colors[0]`, the band after the
/// last is solid in the last accepted color, and each inner band runs from its
/// left boundary's color to its right boundary's color.
pub fn merge_ranges(
    spec: &GaugeSpec,
    domain: &AngleDomain,
) -> Result<Vec<RangeSegment>, RangeError> {
    let (min, max) = (spec.min, spec.max);
    let colors = &spec.range_colors;
    if colors.is_empty() {
        return Ok(Vec::new());
    }

    let mut accepted: Vec<(f64, usize)> = Vec::with_capacity(spec.ranges.len());
    let mut last = f64::NEG_INFINITY;
    for (index, &boundary) in spec.ranges.iter().enumerate() {
        if !boundary.is_finite() || boundary <= last {
            debug!(index, boundary, last, "dropping out-of-order range boundary");
            continue;
        }
        accepted.push((boundary, index));
        last = boundary;
    }

    let mut segments = Vec::new();
    let mut begin = min;
    for k in 0..=accepted.len() {
        if begin >= max {
            break;
        }
        let (end, color1, color2) = match (k, accepted.len()) {
            (_, 0) => {
                let c = color_at(colors, 0)?;
                (max, c, c)
            }
            (0, _) => {
                let (boundary, index) = accepted[0];
                let c = color_at(colors, index)?;
                (boundary, c, c)
            }
            (k, n) if k == n => {
                let c = color_at(colors, accepted[n - 1].1)?;
                (max, c, c)
            }
            (k, _) => {
                let (boundary, index) = accepted[k];
                let c1 = color_at(colors, accepted[k - 1].1)?;
                let c2 = colors.get(index).copied().unwrap_or_else(|| c1.darker());
                (boundary, c1, c2)
            }
        };

        let end = end.min(max);
        if end <= begin {
            continue;
        }
        segments.push(RangeSegment {
            begin_value: begin,
            end_value: end,
            begin_radian: domain.radian_for(begin, min, max),
            end_radian: domain.radian_for(end, min, max),
            color1,
            color2,
            gradient: spec.gradient,
            left_round: false,
            right_round: false,
        });
        begin = end;
    }

    if spec.round_ranges {
        if let Some(first) = segments.first_mut() {
            first.left_round = first.begin_value <= min;
        }
        if let Some(last) = segments.last_mut() {
            last.right_round = last.end_value >= max;
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::degree_to_radian;
    use crate::shape::ShapeVariant;

    fn domain() -> AngleDomain {
        AngleDomain::resolve(ShapeVariant::Full, degree_to_radian(270.0), 0.0)
    }

    fn spans(segments: &[RangeSegment]) -> Vec<(f64, f64)> {
        segments
            .iter()
            .map(|s| (s.begin_value, s.end_value))
            .collect()
    }

    #[test]
    fn test_two_boundaries_three_bands() {
        let spec = GaugeSpec::builder()
            .ranges(vec![30.0, 70.0])
            .range_colors(vec![Color::GREEN, Color::RED])
            .round_ranges(true)
            .gradient(true)
            .build();
        let segments = merge_ranges(&spec, &domain()).unwrap();
        assert_eq!(spans(&segments), vec![(0.0, 30.0), (30.0, 70.0), (70.0, 100.0)]);

        assert_eq!(segments[0].edge_colors(), (Color::GREEN, Color::GREEN));
        assert_eq!(segments[1].edge_colors(), (Color::GREEN, Color::RED));
        assert_eq!(segments[2].edge_colors(), (Color::RED, Color::RED));

        assert!(segments[0].left_round && !segments[0].right_round);
        assert!(!segments[1].left_round && !segments[1].right_round);
        assert!(!segments[2].left_round && segments[2].right_round);
    }

    #[test]
    fn test_solid_mode_uses_first_color() {
        let spec = GaugeSpec::builder()
            .ranges(vec![30.0, 70.0])
            .range_colors(vec![Color::GREEN, Color::RED])
            .build();
        let segments = merge_ranges(&spec, &domain()).unwrap();
        assert_eq!(segments[1].edge_colors(), (Color::GREEN, Color::GREEN));
        assert!(segments.iter().all(|s| !s.left_round && !s.right_round));
    }

    #[test]
    fn test_out_of_order_boundaries_are_dropped() {
        let spec = GaugeSpec::builder()
            .ranges(vec![50.0, 20.0, 80.0])
            .range_colors(vec![Color::GREEN, Color::YELLOW, Color::RED])
            .gradient(true)
            .build();
        let segments = merge_ranges(&spec, &domain()).unwrap();
        assert_eq!(spans(&segments), vec![(0.0, 50.0), (50.0, 80.0), (80.0, 100.0)]);
        // the yellow boundary went with its value
        assert_eq!(segments[1].edge_colors(), (Color::GREEN, Color::RED));
    }

    #[test]
    fn test_boundaries_are_clipped_to_domain() {
        let spec = GaugeSpec::builder()
            .ranges(vec![-10.0, 40.0, 150.0, 180.0])
            .range_colors(vec![Color::GREEN, Color::YELLOW, Color::RED, Color::BLACK])
            .round_ranges(true)
            .build();
        let segments = merge_ranges(&spec, &domain()).unwrap();
        assert_eq!(spans(&segments), vec![(0.0, 40.0), (40.0, 100.0)]);
        assert!(segments[0].left_round);
        assert!(segments[1].right_round);
    }

    #[test]
    fn test_whole_domain_segment_rounds_both_edges() {
        let spec = GaugeSpec::builder()
            .range_colors(vec![Color::GREEN])
            .round_ranges(true)
            .build();
        let segments = merge_ranges(&spec, &domain()).unwrap();
        assert_eq!(spans(&segments), vec![(0.0, 100.0)]);
        assert!(segments[0].left_round && segments[0].right_round);
        assert_eq!(segments[0].begin_radian, domain().begin);
    }

    #[test]
    fn test_missing_next_color_darkens() {
        let spec = GaugeSpec::builder()
            .ranges(vec![30.0, 150.0])
            .range_colors(vec![Color::GREEN])
            .gradient(true)
            .build();
        let segments = merge_ranges(&spec, &domain()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].color2, Color::GREEN.darker());
    }

    #[test]
    fn test_missing_color_is_an_error() {
        let spec = GaugeSpec::builder()
            .ranges(vec![30.0, 70.0])
            .range_colors(vec![Color::GREEN])
            .build();
        assert_eq!(
            merge_ranges(&spec, &domain()),
            Err(RangeError::MissingColor {
                index: 1,
                available: 1
            })
        );
    }

    #[test]
    fn test_no_colors_no_layer() {
        let spec = GaugeSpec::builder().ranges(vec![30.0]).build();
        assert!(merge_ranges(&spec, &domain()).unwrap().is_empty());
    }
}
