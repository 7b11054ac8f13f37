use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use renderer::Antialiasing;

#[derive(Parser, Debug)]
#[command(
    name = "undula",
    author,
    version,
    about = "Noise-displaced sphere with an eased, oscillating amplitude",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Scene configuration TOML; defaults reproduce the reference scene.
    #[arg(long, global = true, env = "UNDULA_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the preview window (the default when no subcommand is given).
    Run(RunArgs),
    /// Print the augmented material shader sources.
    Shader(ShaderArgs),
    /// Drive the amplitude controller against a simulated clock and print its timeline.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Window size in physical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_antialias,
        default_value = "auto"
    )]
    pub antialias: Antialiasing,

    /// Starting amplitude, overriding `[amplitude] initial`.
    #[arg(long, value_name = "VALUE")]
    pub amplitude: Option<f32>,
}

#[derive(Parser, Debug, Clone)]
pub struct ShaderArgs {
    /// Which stage to print.
    #[arg(long, value_enum, default_value_t = StageSelection::Both)]
    pub stage: StageSelection,

    /// Print the injected sources with `#include` directives left unexpanded.
    #[arg(long)]
    pub raw: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSelection {
    Vertex,
    Fragment,
    Both,
}

#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Clock time (seconds) of a trigger; repeat for several.
    #[arg(long = "trigger", value_name = "SECONDS", value_parser = parse_seconds)]
    pub triggers: Vec<f64>,

    /// Stop the simulation at this clock time (seconds). Defaults to one
    /// transition past the last trigger.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub until: Option<f64>,

    /// Frame interval in seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_step, default_value = "0.1")]
    pub step: f64,

    /// Emit one JSON object per frame instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let parse = |part: &str| -> Result<u32, String> {
        match part.trim().parse::<u32>() {
            Ok(0) | Err(_) => Err(format!("invalid dimension '{part}' in size '{value}'")),
            Ok(dimension) => Ok(dimension),
        }
    };
    Ok((parse(width)?, parse(height)?))
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    let seconds = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid time '{value}'; expected non-negative seconds"))?;
    Duration::try_from_secs_f64(seconds)
        .map(|_| seconds)
        .map_err(|err| format!("invalid time '{value}': {err}"))
}

fn parse_step(value: &str) -> Result<f64, String> {
    match parse_seconds(value)? {
        step if step > 0.0 => Ok(step),
        _ => Err("step must be greater than zero".to_string()),
    }
}
