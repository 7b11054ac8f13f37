use std::time::Duration;

/// Minimum spacing between accepted triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Drops triggers that arrive within `interval` of the last accepted one.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    interval: Duration,
    last_trigger: Option<Duration>,
}

impl DebounceGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_trigger: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_trigger(&self) -> Option<Duration> {
        self.last_trigger
    }

    /// Records `now` and returns true when the trigger should be honoured.
    ///
    /// A timestamp earlier than the last accepted trigger counts as zero
    /// elapsed time and is rejected.
    pub fn accept(&mut self, now: Duration) -> bool {
        let accepted = match self.last_trigger {
            None => true,
            Some(last) => now
                .checked_sub(last)
                .is_some_and(|elapsed| elapsed >= self.interval),
        };
        if accepted {
            self.last_trigger = Some(now);
        }
        accepted
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn first_trigger_is_always_accepted() {
        let mut gate = DebounceGate::default();
        assert!(gate.accept(ms(0)));
        assert_eq!(gate.last_trigger(), Some(ms(0)));
    }

    #[test]
    fn trigger_inside_interval_is_dropped_without_touching_state() {
        let mut gate = DebounceGate::default();
        assert!(gate.accept(ms(1_000)));
        assert!(!gate.accept(ms(1_050)));
        assert_eq!(gate.last_trigger(), Some(ms(1_000)));
        assert!(gate.accept(ms(1_150)));
        assert_eq!(gate.last_trigger(), Some(ms(1_150)));
    }

    #[test]
    fn trigger_exactly_on_interval_is_accepted() {
        let mut gate = DebounceGate::default();
        assert!(gate.accept(ms(0)));
        assert!(gate.accept(ms(100)));
    }

    #[test]
    fn rejected_triggers_do_not_extend_the_window() {
        let mut gate = DebounceGate::default();
        assert!(gate.accept(ms(0)));
        assert!(!gate.accept(ms(60)));
        assert!(!gate.accept(ms(90)));
        assert!(gate.accept(ms(100)));
    }

    #[test]
    fn clock_running_backwards_is_rejected() {
        let mut gate = DebounceGate::default();
        assert!(gate.accept(ms(500)));
        assert!(!gate.accept(ms(100)));
        assert_eq!(gate.last_trigger(), Some(ms(500)));
    }
}
