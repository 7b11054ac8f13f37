mod cli;
mod run;
mod shader;
mod simulate;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let scene = run::load_config(cli.config.as_deref())?;
    match cli.command {
        Some(Command::Run(args)) => run::run(args, scene),
        Some(Command::Shader(args)) => shader::print(&args, &scene),
        Some(Command::Simulate(args)) => simulate::print(&args, &scene),
        None => run::run(cli.run, scene),
    }
}
