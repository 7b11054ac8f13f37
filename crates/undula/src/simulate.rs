use std::io::{self, Write};
use std::time::Duration;

use amplitude::{Direction, Phase};
use anyhow::{bail, Context, Result};
use material::TIME_UNIFORM;
use renderer::{FrameDriver, ManualTimeSource, TimeSource};
use sceneconfig::SceneConfig;
use serde::Serialize;

use crate::cli::SimulateArgs;

const MAX_FRAMES: u64 = 1_000_000;

/// One simulated frame.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub time: f64,
    pub amplitude: f32,
    pub target: f32,
    pub direction: &'static str,
    pub phase: &'static str,
    pub shader_time: f32,
}

pub fn print(args: &SimulateArgs, scene: &SceneConfig) -> Result<()> {
    let samples = simulate(args, scene)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        for sample in &samples {
            serde_json::to_writer(&mut out, sample)?;
            writeln!(out)?;
        }
    } else {
        writeln!(
            out,
            "{:>9} {:>10} {:>7}  {:<10} {:<9}",
            "time", "amplitude", "target", "direction", "phase"
        )?;
        for sample in &samples {
            writeln!(
                out,
                "{:>9.3} {:>10.4} {:>7.2}  {:<10} {:<9}",
                sample.time, sample.amplitude, sample.target, sample.direction, sample.phase
            )?;
        }
    }
    Ok(())
}

/// Runs the frame driver against a manual clock, firing each trigger on the
/// first frame at or after its timestamp.
pub fn simulate(args: &SimulateArgs, scene: &SceneConfig) -> Result<Vec<Sample>> {
    let mut driver = FrameDriver::from_config(scene).context("invalid amplitude configuration")?;
    let mut program = material::displaced_standard(driver.controller().current())
        .context("failed to inject displacement into the base material")?;

    let mut triggers = args
        .triggers
        .iter()
        .map(|&at| seconds(at, "trigger"))
        .collect::<Result<Vec<_>>>()?;
    triggers.sort_unstable();
    let until = match args.until {
        Some(until) => seconds(until, "--until")?,
        None => {
            let last = triggers.last().copied().unwrap_or_default();
            last.checked_add(scene.amplitude.transition)
                .context("simulation end overflows the clock")?
        }
    };
    let step = seconds(args.step, "--step")?;
    if step.is_zero() {
        bail!("--step must be greater than zero");
    }
    let frames = (until.as_secs_f64() / step.as_secs_f64()).round();
    if frames > MAX_FRAMES as f64 {
        bail!(
            "simulation of {}s at {}s steps exceeds {MAX_FRAMES} frames",
            until.as_secs_f64(),
            step.as_secs_f64()
        );
    }
    let frames = frames as u32;

    let mut clock = ManualTimeSource::new();
    let mut pending = triggers.into_iter().peekable();
    let mut samples = Vec::with_capacity(frames as usize + 1);
    for frame in 0..=frames {
        let Some(frame_time) = step.checked_mul(frame) else {
            bail!("frame {frame} at {}s steps overflows the clock", step.as_secs_f64());
        };
        clock.set(frame_time);
        let now = clock.elapsed();
        while let Some(at) = pending.next_if(|at| *at <= now) {
            let accepted = driver.advance(at);
            tracing::debug!(at = at.as_secs_f64(), accepted, "simulated trigger");
        }
        let amplitude = driver.on_frame(now, Some(program.uniforms_mut()));
        let controller = driver.controller();
        samples.push(Sample {
            time: now.as_secs_f64(),
            amplitude,
            target: controller.target(),
            direction: direction_name(controller.direction()),
            phase: phase_name(controller.phase()),
            shader_time: program.uniforms().get(TIME_UNIFORM).unwrap_or_default(),
        });
    }
    Ok(samples)
}

fn seconds(value: f64, what: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("{what} {value}s is out of range"))
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Increasing => "increasing",
        Direction::Decreasing => "decreasing",
    }
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Requested => "requested",
        Phase::Active(_) => "active",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(triggers: &[f64], until: Option<f64>, step: f64) -> SimulateArgs {
        SimulateArgs {
            triggers: triggers.to_vec(),
            until,
            step,
            json: false,
        }
    }

    #[test]
    fn reproduces_the_reference_transition() {
        let samples = simulate(&args(&[0.0], None, 0.5), &SceneConfig::default()).unwrap();
        assert_eq!(samples.len(), 11);
        assert_eq!(samples[0].amplitude, 4.0);
        assert_eq!(samples[0].phase, "active");
        assert!((samples[5].amplitude - 4.875).abs() < 1e-5);
        let last = samples.last().unwrap();
        assert_eq!(last.time, 5.0);
        assert_eq!(last.amplitude, 5.0);
        assert_eq!(last.phase, "idle");
        assert_eq!(last.direction, "decreasing");
        assert!((last.shader_time - 1.0).abs() < 1e-6);
    }

    #[test]
    fn no_triggers_means_no_motion() {
        let samples = simulate(&args(&[], Some(1.0), 0.25), &SceneConfig::default()).unwrap();
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.amplitude == 4.0 && s.phase == "idle"));
    }

    #[test]
    fn triggers_inside_the_debounce_window_are_dropped() {
        let samples =
            simulate(&args(&[1.0, 1.05], Some(1.5), 0.5), &SceneConfig::default()).unwrap();
        assert_eq!(samples.last().unwrap().target, 5.0);
    }

    #[test]
    fn out_of_range_times_are_errors() {
        let err = simulate(&args(&[1e20], None, 1e15), &SceneConfig::default()).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");

        let err =
            simulate(&args(&[], Some(1.84e19), 1.2e19), &SceneConfig::default()).unwrap_err();
        assert!(err.to_string().contains("overflows"), "{err}");
    }

    #[test]
    fn runaway_frame_counts_are_rejected() {
        let err = simulate(&args(&[], Some(1.0e9), 0.001), &SceneConfig::default()).unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }
}
