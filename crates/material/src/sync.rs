use std::time::Duration;

use tracing::{trace, warn};

use crate::program::{AMPLITUDE_UNIFORM, TIME_UNIFORM};
use crate::uniforms::UniformTable;

/// Clock seconds per unit of shader `time`.
pub const DEFAULT_TIME_SCALE: f32 = 5.0;

/// Copies the frame clock and the live amplitude into a compiled program's
/// uniforms once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSynchronizer {
    time_scale: f32,
}

impl UniformSynchronizer {
    pub fn new(time_scale: f32) -> Self {
        let time_scale = if time_scale.is_finite() && time_scale > 0.0 {
            time_scale
        } else {
            warn!(time_scale, "invalid time scale; using default");
            DEFAULT_TIME_SCALE
        };
        Self { time_scale }
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Shader time for a clock reading.
    pub fn shader_time(&self, elapsed: Duration) -> f32 {
        elapsed.as_secs_f32() / self.time_scale
    }

    /// Writes `time` and `amplitude` and returns whether both landed. A `None`
    /// handle means the program is not compiled yet; the frame is skipped
    /// quietly. A table without the two uniforms is left untouched.
    pub fn sync(
        &self,
        uniforms: Option<&mut UniformTable>,
        elapsed: Duration,
        amplitude: f32,
    ) -> bool {
        let Some(uniforms) = uniforms else {
            trace!("program not compiled yet; skipping uniform sync");
            return false;
        };
        let time = self.shader_time(elapsed);
        let wrote_time = uniforms.set(TIME_UNIFORM, time);
        let wrote_amplitude = uniforms.set(AMPLITUDE_UNIFORM, amplitude);
        if !(wrote_time && wrote_amplitude) {
            trace!(
                wrote_time,
                wrote_amplitude,
                "uniform table lacks the displacement uniforms; sync incomplete"
            );
        }
        wrote_time && wrote_amplitude
    }
}

impl Default for UniformSynchronizer {
    fn default() -> Self {
        Self {
            time_scale: DEFAULT_TIME_SCALE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> UniformTable {
        let mut table = UniformTable::new();
        table.register(TIME_UNIFORM, 0.0);
        table.register(AMPLITUDE_UNIFORM, 4.0);
        table
    }

    #[test]
    fn writes_scaled_time_and_amplitude() {
        let sync = UniformSynchronizer::default();
        let mut uniforms = table();
        assert!(sync.sync(Some(&mut uniforms), Duration::from_secs(10), 4.5));
        assert_eq!(uniforms.get(TIME_UNIFORM), Some(2.0));
        assert_eq!(uniforms.get(AMPLITUDE_UNIFORM), Some(4.5));
    }

    #[test]
    fn missing_handle_is_skipped() {
        let sync = UniformSynchronizer::default();
        assert!(!sync.sync(None, Duration::from_secs(1), 4.0));
    }

    #[test]
    fn table_without_displacement_uniforms_reports_failure() {
        let sync = UniformSynchronizer::default();
        let mut uniforms = UniformTable::new();
        uniforms.register(TIME_UNIFORM, 0.0);
        assert!(!sync.sync(Some(&mut uniforms), Duration::from_secs(5), 3.0));
        assert_eq!(uniforms.get(TIME_UNIFORM), Some(1.0));
        assert_eq!(uniforms.get(AMPLITUDE_UNIFORM), None);
        assert_eq!(uniforms.len(), 1);
    }

    #[test]
    fn invalid_scale_falls_back_to_default() {
        assert_eq!(UniformSynchronizer::new(0.0).time_scale(), DEFAULT_TIME_SCALE);
        assert_eq!(UniformSynchronizer::new(f32::NAN).time_scale(), DEFAULT_TIME_SCALE);
        assert_eq!(UniformSynchronizer::new(2.0).time_scale(), 2.0);
    }

    #[test]
    fn frame_order_is_last_write_wins() {
        let sync = UniformSynchronizer::default();
        let mut uniforms = table();
        sync.sync(Some(&mut uniforms), Duration::from_secs(5), 3.0);
        sync.sync(Some(&mut uniforms), Duration::from_secs(15), 2.5);
        assert_eq!(uniforms.get(TIME_UNIFORM), Some(3.0));
        assert_eq!(uniforms.get(AMPLITUDE_UNIFORM), Some(2.5));
    }
}
