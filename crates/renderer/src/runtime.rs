use std::time::{Duration, Instant};

/// Abstraction over where frame time originates from.
///
/// Every consumer (controller, debounce gate, synchronizer) reads the same
/// `Duration` since the source was created or reset.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Elapsed time for the frame about to be drawn.
    fn elapsed(&mut self) -> Duration;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
    }

    fn elapsed(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced explicitly by the caller; drives headless simulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTimeSource {
    now: Duration,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, step: Duration) -> Duration {
        self.now = self.now.saturating_add(step);
        self.now
    }

    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }
}

impl TimeSource for ManualTimeSource {
    fn reset(&mut self) {
        self.now = Duration::ZERO;
    }

    fn elapsed(&mut self) -> Duration {
        self.now
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;
