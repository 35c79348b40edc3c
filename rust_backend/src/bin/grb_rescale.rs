use anyhow::{Context, Result};
use flexi_logger::{Logger, LoggerHandle};
use std::path::{Path, PathBuf};

use grblc_rust::algorithms::ColorEvolutionPipeline;
use grblc_rust::config::PipelineConfig;
use grblc_rust::io::{grb_name, grb_name_from_path, load_observations, save_color_evolution, save_rescaled};

const USAGE: &str = "Usage: grb-rescale <light-curve-file> [config.toml] [--json]";

struct Args {
    input: PathBuf,
    config: Option<PathBuf>,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let mut positional = positional.into_iter();
    let input = positional.next().context(USAGE)?;
    Ok(Args {
        input,
        config: positional.next(),
        json,
    })
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::from_default_location_or_default()?,
    };
    Ok(config)
}

/// `RUST_LOG` wins over the configured level
fn setup_logging(level: &str) -> Result<LoggerHandle> {
    let handle = Logger::try_with_env_or_str(level)
        .context("Invalid log specification")?
        .start()
        .context("Logger initialization failed")?;
    Ok(handle)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = load_config(args.config.as_deref())?;
    let _logger = setup_logging(&config.logging.level)?;

    let grb = match &config.output.grb_name {
        Some(name) => grb_name(name),
        None => grb_name_from_path(&args.input),
    };
    log::info!("Processing {} from {}", grb, args.input.display());

    let table = load_observations(&args.input, &config)?;
    let output = ColorEvolutionPipeline::with_config(config.clone())
        .run(&table)
        .with_context(|| format!("Color-evolution analysis of {} failed", grb))?;

    if config.output.save {
        save_rescaled(&config.output.directory, &grb, &output.rescaled)?;
        save_color_evolution(&config.output.directory, &grb, &output.report)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    } else {
        println!("{}", output.report.slope_summary());
        println!(
            "Rescaled {} of {} observations to {}",
            output.rescaled.rescaled_count(),
            output.rescaled.len(),
            output.reference_band
        );
    }

    Ok(())
}
