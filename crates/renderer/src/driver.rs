use std::time::Duration;

use amplitude::{AmplitudeController, AmplitudeError, AmplitudeSettings, DebounceGate, Easing};
use material::{UniformSynchronizer, UniformTable};
use sceneconfig::{EasingSetting, SceneConfig};
use tracing::debug;

/// Per-frame glue between user triggers, the amplitude controller and the
/// compiled program's uniforms.
///
/// Everything runs on the event-loop thread, so triggers and ticks never race.
#[derive(Debug, Clone, Default)]
pub struct FrameDriver {
    controller: AmplitudeController,
    gate: DebounceGate,
    sync: UniformSynchronizer,
}

impl FrameDriver {
    pub fn new(
        controller: AmplitudeController,
        gate: DebounceGate,
        sync: UniformSynchronizer,
    ) -> Self {
        Self {
            controller,
            gate,
            sync,
        }
    }

    /// Builds the controller, gate and synchronizer described by `config`.
    pub fn from_config(config: &SceneConfig) -> Result<Self, AmplitudeError> {
        let section = &config.amplitude;
        let controller = AmplitudeController::new(AmplitudeSettings {
            initial: section.initial,
            min: section.min,
            max: section.max,
            step: section.step,
            duration: section.transition,
            easing: easing_for(section.easing),
        })?;
        Ok(Self::new(
            controller,
            DebounceGate::new(section.debounce),
            UniformSynchronizer::new(config.clock.time_scale),
        ))
    }

    pub fn controller(&self) -> &AmplitudeController {
        &self.controller
    }

    pub fn synchronizer(&self) -> &UniformSynchronizer {
        &self.sync
    }

    /// Debounced oscillation step. Returns whether the trigger was accepted.
    pub fn advance(&mut self, now: Duration) -> bool {
        if !self.gate.accept(now) {
            debug!(at = now.as_secs_f32(), "trigger debounced");
            return false;
        }
        self.controller.advance();
        true
    }

    /// Debounced jump toward an explicit target.
    pub fn select(&mut self, now: Duration, value: f32) -> bool {
        if !self.gate.accept(now) {
            debug!(at = now.as_secs_f32(), value, "selection debounced");
            return false;
        }
        self.controller.retarget(value);
        true
    }

    /// Ticks the controller and pushes the result into `uniforms`. Returns
    /// the amplitude written (or that would have been written).
    pub fn on_frame(&mut self, now: Duration, uniforms: Option<&mut UniformTable>) -> f32 {
        self.controller.tick(now);
        let amplitude = self.controller.uniform_value();
        self.sync.sync(uniforms, now, amplitude);
        amplitude
    }
}

pub fn easing_for(setting: EasingSetting) -> Easing {
    match setting {
        EasingSetting::Linear => Easing::Linear,
        EasingSetting::Smoothstep => Easing::Smoothstep,
        EasingSetting::EaseInOut => Easing::EaseInOut,
        EasingSetting::EaseOutCubic => Easing::EaseOutCubic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use material::{AMPLITUDE_UNIFORM, TIME_UNIFORM};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn table() -> UniformTable {
        let mut table = UniformTable::new();
        table.register(TIME_UNIFORM, 0.0);
        table.register(AMPLITUDE_UNIFORM, 4.0);
        table
    }

    #[test]
    fn rapid_triggers_collapse_to_one_step() {
        let mut driver = FrameDriver::default();
        assert!(driver.advance(ms(0)));
        assert!(!driver.advance(ms(50)));
        assert_eq!(driver.controller().target(), 5.0);
        assert!(driver.advance(ms(150)));
        assert_eq!(driver.controller().target(), 4.0);
    }

    #[test]
    fn frame_without_program_still_ticks_the_controller() {
        let mut driver = FrameDriver::default();
        driver.advance(ms(0));
        driver.on_frame(ms(0), None);
        let value = driver.on_frame(ms(2_500), None);
        assert!((value - 4.875).abs() < 1e-4);
    }

    #[test]
    fn frame_writes_time_and_amplitude() {
        let mut driver = FrameDriver::default();
        let mut uniforms = table();
        driver.advance(ms(0));
        driver.on_frame(ms(0), Some(&mut uniforms));
        driver.on_frame(ms(5_000), Some(&mut uniforms));
        assert_eq!(uniforms.get(TIME_UNIFORM), Some(1.0));
        assert_eq!(uniforms.get(AMPLITUDE_UNIFORM), Some(5.0));
    }

    #[test]
    fn default_config_reproduces_the_reference_driver() {
        let driver = FrameDriver::from_config(&SceneConfig::default()).unwrap();
        assert_eq!(driver.controller().current(), 4.0);
        assert_eq!(driver.controller().bounds(), (2.0, 5.0));
        assert_eq!(driver.controller().duration(), Duration::from_secs(5));
        assert_eq!(driver.synchronizer().time_scale(), 5.0);
    }

    #[test]
    fn select_is_debounced_with_advance() {
        let mut driver = FrameDriver::default();
        assert!(driver.select(ms(0), 2.0));
        assert!(!driver.advance(ms(10)));
        assert_eq!(driver.controller().target(), 2.0);
    }
}
