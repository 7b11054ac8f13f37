use std::time::Duration;

use tracing::{debug, trace};

use crate::easing::Easing;

#[derive(Debug, thiserror::Error)]
pub enum AmplitudeError {
    #[error("amplitude bounds [{min}, {max}] are invalid; min must be finite and below max")]
    InvalidBounds { min: f32, max: f32 },
    #[error("amplitude step {0} must be finite and greater than zero")]
    InvalidStep(f32),
    #[error("transition duration must be greater than zero")]
    ZeroDuration,
}

/// Which bound the next accepted trigger heads toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// Start-of-transition snapshot captured by the frame tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub start_time: Duration,
    pub start_value: f32,
    pub last_target: f32,
}

/// Controller phase. `Requested` means a trigger was accepted but no tick
/// has captured the transition start yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    Requested,
    Active(Transition),
}

#[derive(Debug, Clone)]
pub struct AmplitudeSettings {
    pub initial: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for AmplitudeSettings {
    fn default() -> Self {
        Self {
            initial: 4.0,
            min: 2.0,
            max: 5.0,
            step: 1.0,
            duration: Duration::from_secs(5),
            easing: Easing::EaseOutCubic,
        }
    }
}

/// Owns the live amplitude and drives it toward its target once per frame.
#[derive(Debug, Clone)]
pub struct AmplitudeController {
    current: f32,
    target: f32,
    min: f32,
    max: f32,
    step: f32,
    duration: Duration,
    easing: Easing,
    direction: Direction,
    phase: Phase,
}

impl AmplitudeController {
    pub fn new(settings: AmplitudeSettings) -> Result<Self, AmplitudeError> {
        let AmplitudeSettings {
            initial,
            min,
            max,
            step,
            duration,
            easing,
        } = settings;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(AmplitudeError::InvalidBounds { min, max });
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(AmplitudeError::InvalidStep(step));
        }
        if duration.is_zero() {
            return Err(AmplitudeError::ZeroDuration);
        }

        let initial = if initial.is_finite() {
            initial.clamp(min, max)
        } else {
            min
        };
        let direction = if initial >= max {
            Direction::Decreasing
        } else {
            Direction::Increasing
        };

        Ok(Self {
            current: initial,
            target: initial,
            min,
            max,
            step,
            duration,
            easing,
            direction,
            phase: Phase::Idle,
        })
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_transitioning(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Live amplitude clamped to the bounds, safe to hand to the shader.
    pub fn uniform_value(&self) -> f32 {
        self.current.clamp(self.min, self.max)
    }

    /// Applies the oscillation policy: step the target toward the bound the
    /// controller is currently heading for, flipping direction on arrival.
    /// Returns the new target.
    pub fn advance(&mut self) -> f32 {
        let next = match self.direction {
            Direction::Increasing => {
                let next = (self.target + self.step).min(self.max);
                if next == self.max {
                    self.direction = Direction::Decreasing;
                }
                next
            }
            Direction::Decreasing => {
                let next = (self.target - self.step).max(self.min);
                if next == self.min {
                    self.direction = Direction::Increasing;
                }
                next
            }
        };
        debug!(
            from = self.target,
            to = next,
            direction = ?self.direction,
            "amplitude target advanced"
        );
        self.request(next);
        next
    }

    /// Drives the transition toward an explicit value, clamped to the bounds.
    /// Returns the clamped target.
    pub fn retarget(&mut self, value: f32) -> f32 {
        let next = if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.target
        };
        if next >= self.max {
            self.direction = Direction::Decreasing;
        } else if next <= self.min {
            self.direction = Direction::Increasing;
        }
        debug!(from = self.target, to = next, "amplitude target selected");
        self.request(next);
        next
    }

    fn request(&mut self, target: f32) {
        self.target = target;
        if matches!(self.phase, Phase::Idle) {
            self.phase = Phase::Requested;
        }
    }

    /// Integrates one frame at clock time `now` and returns the live value.
    pub fn tick(&mut self, now: Duration) -> f32 {
        let transition = match self.phase {
            Phase::Idle => return self.current,
            Phase::Requested => {
                let transition = Transition {
                    start_time: now,
                    start_value: self.current,
                    last_target: self.target,
                };
                debug!(
                    start = self.current,
                    goal = self.target,
                    at = now.as_secs_f32(),
                    "amplitude transition started"
                );
                transition
            }
            Phase::Active(transition) if transition.last_target != self.target => {
                // Restart from the live value so a mid-flight retarget never jumps.
                debug!(
                    from = self.current,
                    stale_target = transition.last_target,
                    goal = self.target,
                    "amplitude transition restarted"
                );
                Transition {
                    start_time: now,
                    start_value: self.current,
                    last_target: self.target,
                }
            }
            Phase::Active(transition) => transition,
        };

        let elapsed = now.saturating_sub(transition.start_time);
        let progress =
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0) as f32;
        let eased = self.easing.sample(progress);
        self.current =
            transition.start_value + (self.target - transition.start_value) * eased;

        if progress >= 1.0 {
            self.current = self.target;
            self.phase = Phase::Idle;
            debug!(value = self.current, "amplitude transition settled");
        } else {
            self.phase = Phase::Active(transition);
            trace!(progress, value = self.current, "amplitude transition step");
        }
        self.current
    }
}

impl Default for AmplitudeController {
    fn default() -> Self {
        Self {
            current: 4.0,
            target: 4.0,
            min: 2.0,
            max: 5.0,
            step: 1.0,
            duration: Duration::from_secs(5),
            easing: Easing::EaseOutCubic,
            direction: Direction::Increasing,
            phase: Phase::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f32) -> Duration {
        Duration::from_secs_f32(value)
    }

    #[test]
    fn new_controller_starts_idle_at_initial_value() {
        let controller = AmplitudeController::default();
        assert_eq!(controller.current(), 4.0);
        assert_eq!(controller.target(), 4.0);
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.direction(), Direction::Increasing);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = AmplitudeController::new(AmplitudeSettings {
            min: 5.0,
            max: 2.0,
            ..AmplitudeSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, AmplitudeError::InvalidBounds { .. }));
    }

    #[test]
    fn rejects_zero_duration() {
        let err = AmplitudeController::new(AmplitudeSettings {
            duration: Duration::ZERO,
            ..AmplitudeSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, AmplitudeError::ZeroDuration));
    }

    #[test]
    fn initial_value_is_clamped_and_faces_away_from_the_bound() {
        let controller = AmplitudeController::new(AmplitudeSettings {
            initial: 9.0,
            ..AmplitudeSettings::default()
        })
        .unwrap();
        assert_eq!(controller.current(), 5.0);
        assert_eq!(controller.direction(), Direction::Decreasing);
    }

    #[test]
    fn idle_tick_leaves_value_untouched() {
        let mut controller = AmplitudeController::default();
        assert_eq!(controller.tick(secs(1.0)), 4.0);
        assert_eq!(controller.tick(secs(100.0)), 4.0);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn trigger_is_requested_until_the_next_tick() {
        let mut controller = AmplitudeController::default();
        controller.advance();
        assert_eq!(controller.phase(), Phase::Requested);
        controller.tick(secs(3.0));
        match controller.phase() {
            Phase::Active(transition) => {
                assert_eq!(transition.start_time, secs(3.0));
                assert_eq!(transition.start_value, 4.0);
                assert_eq!(transition.last_target, 5.0);
            }
            other => panic!("expected active transition, got {other:?}"),
        }
        assert_eq!(controller.current(), 4.0);
    }

    #[test]
    fn completion_snaps_exactly_and_clears_bookkeeping() {
        let mut controller = AmplitudeController::default();
        controller.advance();
        controller.tick(secs(0.0));
        controller.tick(secs(4.0));
        assert!(controller.current() < 5.0);
        assert_eq!(controller.tick(secs(5.0)), 5.0);
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(!controller.is_transitioning());
    }

    #[test]
    fn clock_running_backwards_holds_the_start_value() {
        let mut controller = AmplitudeController::default();
        controller.advance();
        controller.tick(secs(2.0));
        assert_eq!(controller.tick(secs(1.0)), 4.0);
        assert!(controller.is_transitioning());
    }

    #[test]
    fn retarget_clamps_into_bounds() {
        let mut controller = AmplitudeController::default();
        assert_eq!(controller.retarget(11.0), 5.0);
        assert_eq!(controller.direction(), Direction::Decreasing);
        assert_eq!(controller.retarget(-1.0), 2.0);
        assert_eq!(controller.direction(), Direction::Increasing);
        assert_eq!(controller.retarget(f32::NAN), 2.0);
    }

    #[test]
    fn uniform_value_stays_within_bounds() {
        let mut controller = AmplitudeController::default();
        controller.retarget(2.0);
        for frame in 0..=60 {
            controller.tick(secs(frame as f32 / 10.0));
            let value = controller.uniform_value();
            assert!((2.0..=5.0).contains(&value));
        }
    }
}
