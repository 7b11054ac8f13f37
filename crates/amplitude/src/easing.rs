/// Interpolation curve applied to transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    Smoothstep,
    EaseInOut,
    /// `1 - (1 - t)^3`: fast start, slow settle.
    #[default]
    EaseOutCubic,
}

impl Easing {
    /// Maps `t` (clamped to `0..=1`) onto the curve. Every curve pins
    /// `sample(0) == 0` and `sample(1) == 1`.
    pub fn sample(self, t: f32) -> f32 {
        let clamped = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => clamped,
            Easing::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
            Easing::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
            Easing::EaseOutCubic => {
                let remaining = 1.0 - clamped;
                1.0 - remaining * remaining * remaining
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::Smoothstep,
        Easing::EaseInOut,
        Easing::EaseOutCubic,
    ];

    #[test]
    fn every_curve_is_pinned_at_the_ends() {
        for curve in ALL {
            assert_eq!(curve.sample(0.0), 0.0, "{curve:?}");
            assert_eq!(curve.sample(1.0), 1.0, "{curve:?}");
        }
    }

    #[test]
    fn every_curve_increases_monotonically() {
        for curve in ALL {
            let mut last = 0.0;
            for step in 0..=100 {
                let sample = curve.sample(step as f32 / 100.0);
                assert!(sample >= last - f32::EPSILON, "{curve:?} at {step}");
                last = sample;
            }
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        for curve in ALL {
            assert_eq!(curve.sample(-3.0), 0.0);
            assert_eq!(curve.sample(7.5), 1.0);
            assert_eq!(curve.sample(f32::NAN), 0.0);
        }
    }

    #[test]
    fn ease_out_cubic_front_loads_progress() {
        let curve = Easing::EaseOutCubic;
        assert!((curve.sample(0.5) - 0.875).abs() < 1e-6);
        assert!(curve.sample(0.25) > 0.25);
    }

    #[test]
    fn smoothstep_matches_expected_values() {
        let curve = Easing::Smoothstep;
        assert!((curve.sample(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ease_in_out_accelerates_then_decelerates() {
        let curve = Easing::EaseInOut;
        let first = curve.sample(0.25);
        let mid = curve.sample(0.5);
        let last = curve.sample(0.75);
        assert!(first < mid);
        assert!(last > mid);
        assert!((first - 0.125).abs() < 1e-6);
    }
}
