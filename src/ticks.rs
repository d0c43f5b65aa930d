//! Major/minor tick generation, label formatting and label thinning.

use crate::angle::AngleDomain;
use crate::shape::LabelPolicy;
use crate::text::arc_labels_width;
use tracing::{debug, info};

/// Half of the major tick count above which increments are coarsened.
pub const MAX_MAJOR_TICKS: usize = 40;
/// Upper bound on minor ticks between two major ticks.
pub const MAX_MINOR_TICKS: usize = 20;
/// Label shift applied by the rotated variants, in radians (3°).
pub const LABEL_NUDGE: f64 = 3.0 * std::f64::consts::PI / 180.0;

const EPSILON: f64 = 1e-9;

/// Increments and counts after the density caps have been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickPlan {
    pub major_inc: f64,
    pub minor_inc: f64,
    pub major_count: usize,
    pub minor_per_major: usize,
    /// Integer factor both increments were multiplied by; 1 when untouched,
    /// saturating at `usize::MAX`.
    pub coarsen_factor: usize,
}

impl TickPlan {
    /// Returns `None` when the domain or increment is degenerate.
    pub fn compute(min: f64, max: f64, major_inc: f64, minor_inc: f64) -> Option<Self> {
        let span = max - min;
        let ratio = span / major_inc;
        if !(span > 0.0 && major_inc > 0.0 && ratio.is_finite()) {
            return None;
        }

        let mut major_inc = major_inc;
        let mut minor_inc = minor_inc;
        let mut major_count = (ratio.round() as usize).saturating_add(1);
        let mut coarsen_factor = 1usize;

        let cap = 2 * MAX_MAJOR_TICKS;
        if major_count >= cap {
            // smallest k with ceil(ratio / k) <= cap - 2; rounding can leave it one step short
            let mut k = (ratio / (cap - 2) as f64).ceil().max(2.0);
            while (span / (major_inc * k)).ceil() + 1.0 >= cap as f64 {
                k = (k + 1.0).max(k * (1.0 + 4.0 * f64::EPSILON));
            }
            info!(
                requested = major_count,
                factor = k,
                "too many major ticks, coarsening increments"
            );
            major_inc *= k;
            minor_inc *= k;
            major_count = (span / major_inc).ceil() as usize + 1;
            coarsen_factor = k as usize;
        }

        let mut minor_per_major = 0;
        if minor_inc > 0.0 {
            let per = (major_inc / minor_inc - EPSILON).ceil() - 1.0;
            if per > MAX_MINOR_TICKS as f64 {
                debug!(requested = per, "capping minor ticks per interval");
                minor_inc = major_inc / (MAX_MINOR_TICKS + 1) as f64;
                minor_per_major = MAX_MINOR_TICKS;
            } else if per > 0.0 {
                minor_per_major = per as usize;
            }
        }

        Some(Self {
            major_inc,
            minor_inc,
            major_count,
            minor_per_major,
            coarsen_factor,
        })
    }

    pub fn coarsened(&self) -> bool {
        self.coarsen_factor > 1
    }
}

/// Where a label's text sits relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MajorTick {
    pub value: f64,
    pub radian: f64,
    pub label: String,
    pub label_radian: f64,
    pub anchor: TextAnchor,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickSet {
    pub majors: Vec<MajorTick>,
    pub minors: Vec<f64>,
}

impl TickSet {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.majors.iter().map(|t| t.label.as_str())
    }

    pub fn visible_labels(&self) -> impl Iterator<Item = &MajorTick> {
        self.majors.iter().filter(|t| t.visible)
    }
}

pub fn build_tick_set(plan: &TickPlan, min: f64, max: f64, domain: &AngleDomain) -> TickSet {
    let step = domain.sweep * plan.major_inc / (max - min);
    let end = domain.begin - domain.sweep;
    let decimals = label_decimals(plan.major_inc).max(label_decimals(min));

    let mut majors = Vec::with_capacity(plan.major_count);
    for i in 0..plan.major_count {
        let mut value = min + i as f64 * plan.major_inc;
        let mut radian = domain.begin - i as f64 * step;
        if i + 1 == plan.major_count && (value > max || radian < end) {
            value = max;
            radian = end;
        }
        majors.push(MajorTick {
            value,
            radian,
            label: format_label(value, decimals),
            label_radian: radian,
            anchor: TextAnchor::Middle,
            visible: true,
        });
    }

    let mut minors = Vec::new();
    if plan.minor_per_major > 0 {
        for pair in majors.windows(2) {
            for j in 1..=plan.minor_per_major {
                let value = pair[0].value + j as f64 * plan.minor_inc;
                if value >= pair[1].value - EPSILON || value > max + EPSILON {
                    break;
                }
                minors.push(domain.radian_for(value, min, max));
            }
        }
    }

    TickSet { majors, minors }
}

/// Decimal places needed to print multiples of `inc` exactly, at most 4.
pub fn label_decimals(inc: f64) -> usize {
    (0..=4)
        .find(|&d| {
            let scaled = inc * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(4)
}

pub fn format_label(value: f64, decimals: usize) -> String {
    abbreviate(value, decimals)
}

/// Formats `value`, shortening thousands, millions and billions to `K`, `M`, `B`.
pub fn abbreviate(value: f64, decimals: usize) -> String {
    let magnitude = value.abs();
    let (scaled, suffix, digits) = if magnitude >= 1e9 {
        (value / 1e9, "B", 2)
    } else if magnitude >= 1e6 {
        (value / 1e6, "M", 2)
    } else if magnitude >= 1e3 {
        (value / 1e3, "K", 2)
    } else {
        (value, "", decimals)
    };

    let mut text = format!("{:.*}", digits, scaled);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text.push_str(suffix);
    text
}

/// Smallest stride above `current` that splits `intervals` into equal gaps.
pub fn next_jump(current: usize, intervals: usize) -> usize {
    (current + 1..=intervals)
        .find(|j| intervals % j == 0)
        .unwrap_or_else(|| intervals.max(1))
}

/// Result of thinning labels along the arc.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub flags: Vec<bool>,
    /// Every stride tried, in order; the last one produced `flags`.
    pub jumps: Vec<usize>,
}

/// Chooses which labels to draw so their combined width fits `available`.
///
/// `widths[i]` is the rendered width of label `i`. Strides only ever grow, and
/// the first and last label are always kept.
pub fn label_flags(widths: &[f64], gap: f64, available: f64) -> LabelLayout {
    let n = widths.len();
    if n <= 1 {
        return LabelLayout {
            flags: vec![true; n],
            jumps: vec![1],
        };
    }

    let intervals = n - 1;
    let mut jump = 1;
    let mut jumps = vec![jump];
    loop {
        let shown: Vec<usize> = (0..n).step_by(jump).collect();
        let widest = shown.iter().map(|&i| widths[i]).fold(0.0, f64::max);
        let needed = arc_labels_width(shown.len(), widest, gap);
        if needed <= available || jump >= intervals {
            debug!(jump, needed, available, "label stride chosen");
            let mut flags = vec![false; n];
            for i in shown {
                flags[i] = true;
            }
            return LabelLayout { flags, jumps };
        }
        jump = next_jump(jump, intervals);
        jumps.push(jump);
    }
}

impl LabelPolicy {
    /// Applies the variant's label rules on top of the thinned flags.
    pub fn apply(self, ticks: &mut TickSet, min: f64) {
        let last = ticks.majors.len().saturating_sub(1);
        match self {
            LabelPolicy::Radial => {}
            LabelPolicy::Endpoints => {
                for (i, tick) in ticks.majors.iter_mut().enumerate() {
                    tick.visible = i == 0 || i == last;
                    tick.anchor = match i {
                        0 => TextAnchor::Start,
                        _ => TextAnchor::End,
                    };
                }
            }
            LabelPolicy::Rotated => {
                for (i, tick) in ticks.majors.iter_mut().enumerate() {
                    if i == 0 || tick.label == "0" || tick.value == min {
                        tick.visible = false;
                    }
                    tick.label_radian = tick.radian + LABEL_NUDGE;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::degree_to_radian;
    use crate::shape::ShapeVariant;

    fn domain() -> AngleDomain {
        AngleDomain::resolve(ShapeVariant::Full, degree_to_radian(270.0), 0.0)
    }

    #[test]
    fn test_quarters_of_a_hundred() {
        let plan = TickPlan::compute(0.0, 100.0, 25.0, 5.0).unwrap();
        assert_eq!(plan.major_count, 5);
        assert!(!plan.coarsened());
        assert_eq!(plan.minor_per_major, 4);

        let ticks = build_tick_set(&plan, 0.0, 100.0, &domain());
        let values: Vec<f64> = ticks.majors.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        let labels: Vec<&str> = ticks.labels().collect();
        assert_eq!(labels, vec!["0", "25", "50", "75", "100"]);
        assert_eq!(ticks.minors.len(), 16);
    }

    #[test]
    fn test_dense_domain_is_coarsened() {
        let plan = TickPlan::compute(0.0, 1.0, 0.001, 0.0005).unwrap();
        assert!(plan.coarsened());
        assert!(plan.major_count < 2 * MAX_MAJOR_TICKS);
        assert!((plan.minor_inc / plan.major_inc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_huge_ratio_coarsens_in_one_step() {
        let plan = TickPlan::compute(0.0, 1e20, 1.0, 0.0).unwrap();
        assert!(plan.coarsened());
        assert!(plan.major_count >= 2 && plan.major_count < 2 * MAX_MAJOR_TICKS);
        assert!(plan.major_inc >= 1e20 / 78.0);

        let plan = TickPlan::compute(-1e300, 1e300, 1e-5, 0.0).unwrap();
        assert!(plan.major_count < 2 * MAX_MAJOR_TICKS);
        assert_eq!(plan.coarsen_factor, usize::MAX);
    }

    #[test]
    fn test_coarsening_picks_smallest_factor() {
        // 1000 intervals need a factor of ceil(1000 / 78) = 13
        let plan = TickPlan::compute(0.0, 1000.0, 1.0, 0.0).unwrap();
        assert_eq!(plan.coarsen_factor, 13);
        assert_eq!(plan.major_count, 78);
    }

    #[test]
    fn test_degenerate_domains() {
        assert!(TickPlan::compute(5.0, 5.0, 1.0, 0.5).is_none());
        assert!(TickPlan::compute(0.0, 10.0, 0.0, 0.5).is_none());
        assert!(TickPlan::compute(0.0, 10.0, -1.0, 0.5).is_none());
    }

    #[test]
    fn test_minor_ticks_are_capped() {
        let plan = TickPlan::compute(0.0, 100.0, 50.0, 0.1).unwrap();
        assert_eq!(plan.minor_per_major, MAX_MINOR_TICKS);
        assert!((plan.minor_inc - 50.0 / 21.0).abs() < 1e-12);
    }

    #[test]
    fn test_last_tick_is_pinned_to_end() {
        let d = domain();
        let plan = TickPlan::compute(0.0, 10.0, 4.0, 0.0).unwrap();
        assert_eq!(plan.major_count, 4);
        let ticks = build_tick_set(&plan, 0.0, 10.0, &d);
        let last = ticks.majors.last().unwrap();
        assert_eq!(last.value, 10.0);
        assert_eq!(last.radian, d.begin - d.sweep);
        assert!(ticks.minors.is_empty());
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(abbreviate(1200.0, 0), "1.2K");
        assert_eq!(abbreviate(1_500_000.0, 0), "1.5M");
        assert_eq!(abbreviate(2e9, 0), "2B");
        assert_eq!(abbreviate(-2500.0, 0), "-2.5K");
        assert_eq!(abbreviate(0.25, 2), "0.25");
        assert_eq!(abbreviate(0.5, 2), "0.5");
        assert_eq!(abbreviate(-0.000001, 0), "0");
        assert_eq!(abbreviate(999.0, 0), "999");
    }

    #[test]
    fn test_label_decimals() {
        assert_eq!(label_decimals(25.0), 0);
        assert_eq!(label_decimals(0.25), 2);
        assert_eq!(label_decimals(0.1), 1);
        assert_eq!(label_decimals(1.0 / 3.0), 4);
    }

    #[test]
    fn test_next_jump_divides_intervals() {
        assert_eq!(next_jump(1, 12), 2);
        assert_eq!(next_jump(2, 12), 3);
        assert_eq!(next_jump(4, 12), 6);
        assert_eq!(next_jump(6, 12), 12);
        assert_eq!(next_jump(1, 7), 7);
    }

    #[test]
    fn test_all_labels_fit_without_looping() {
        let layout = label_flags(&[10.0; 5], 4.0, 1000.0);
        assert_eq!(layout.flags, vec![true; 5]);
        assert_eq!(layout.jumps, vec![1]);
    }

    #[test]
    fn test_label_stride_steps() {
        // 13 labels of width 20: (k-1)*20 + 4*(k-2)
        // k=13 -> 284, k=7 -> 140, k=5 -> 92, k=4 -> 68
        let layout = label_flags(&[20.0; 13], 4.0, 100.0);
        assert_eq!(layout.jumps, vec![1, 2, 3]);
        let shown: Vec<usize> = (0..13).filter(|&i| layout.flags[i]).collect();
        assert_eq!(shown, vec![0, 3, 6, 9, 12]);
    }

    #[test]
    fn test_prime_interval_count_drops_to_endpoints() {
        let layout = label_flags(&[30.0; 8], 4.0, 10.0);
        assert_eq!(layout.jumps, vec![1, 7]);
        assert_eq!(
            layout.flags,
            vec![true, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn test_endpoint_policy() {
        let plan = TickPlan::compute(0.0, 100.0, 25.0, 0.0).unwrap();
        let mut ticks = build_tick_set(&plan, 0.0, 100.0, &domain());
        LabelPolicy::Endpoints.apply(&mut ticks, 0.0);
        let visible: Vec<&str> = ticks.visible_labels().map(|t| t.label.as_str()).collect();
        assert_eq!(visible, vec!["0", "100"]);
        assert_eq!(ticks.majors[0].anchor, TextAnchor::Start);
        assert_eq!(ticks.majors[4].anchor, TextAnchor::End);
    }

    #[test]
    fn test_rotated_policy_hides_zero_and_min() {
        let plan = TickPlan::compute(-50.0, 50.0, 25.0, 0.0).unwrap();
        let mut ticks = build_tick_set(&plan, -50.0, 50.0, &domain());
        LabelPolicy::Rotated.apply(&mut ticks, -50.0);
        let visible: Vec<&str> = ticks.visible_labels().map(|t| t.label.as_str()).collect();
        assert_eq!(visible, vec!["-25", "25", "50"]);
        let t = &ticks.majors[1];
        assert!((t.label_radian - t.radian - LABEL_NUDGE).abs() < 1e-12);
    }
}
