use std::fs;

use anyhow::Context;
use clap::Parser;

use twamm_sim::{create_example_config, ScenarioRunner, SimConfig};

#[derive(Parser, Debug)]
#[command(name = "twamm-sim")]
#[command(about = "Replay a scripted scenario against a TWAMM pool")]
struct Args {
    /// Path to scenario configuration file
    #[arg(short, long, default_value = "scenario.toml")]
    config: String,

    /// Write an example scenario to the config path and exit
    #[arg(long)]
    init: bool,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if args.init {
        create_example_config(&args.config)
            .with_context(|| format!("failed to write example scenario to {}", args.config))?;
        log::info!("Wrote example scenario to {}", args.config);
        return Ok(());
    }

    let config = SimConfig::load(&args.config).with_context(|| format!("failed to load {}", args.config))?;
    log::info!("Loaded scenario '{}' with {} steps", config.name, config.steps.len());

    let report = ScenarioRunner::new(config)?.run()?;
    let failed = report.failed_steps();
    if failed > 0 {
        log::warn!("{} of {} steps failed", failed, report.steps.len());
    }

    let json = serde_json::to_string_pretty(&report)?;
    match args.output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("failed to write report to {}", path))?;
            log::info!("Report written to {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
