//! Radar volume converter.
//!
//! Loads a volume document (JSON or YAML) and writes it as CF-Radial,
//! either into an output directory with a composed file name or to an
//! explicit path. On failure the writer's error text goes to stderr and
//! the process exits non-zero.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use cfradial_writer::{CfRadialWriter, OutputFormat};
use clap::Parser;
use radx_model::Volume;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{resolve_writer_config, CliOverrides};

#[derive(Parser, Debug)]
#[command(name = "radx-convert")]
#[command(about = "Write radar volume documents as CF-Radial files")]
struct Args {
    /// Volume document (.json, .yaml or .yml)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory; the file name is composed from the volume
    #[arg(short, long, conflicts_with = "output_path", required_unless_present = "output_path")]
    output_dir: Option<PathBuf>,

    /// Explicit output file path
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Write one file per sweep (output directory only)
    #[arg(long, conflicts_with = "output_path")]
    sweeps: bool,

    /// Output format: netcdf or json
    #[arg(short, long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Writer configuration file (YAML)
    #[arg(short, long, env = "RADX_CONVERT_CONFIG")]
    config: Option<PathBuf>,

    /// Always use the ragged n_points layout
    #[arg(long)]
    force_ragged: bool,

    /// Disable deflate compression of field variables
    #[arg(long)]
    no_compression: bool,

    /// Add a yyyymmdd subdirectory
    #[arg(long)]
    day_dir: bool,

    /// Add a yyyy subdirectory
    #[arg(long)]
    year_dir: bool,

    /// Print a one-line volume summary before writing
    #[arg(long)]
    summary: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse().map_err(|e: cfradial_writer::WriterError| e.to_string())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let overrides = CliOverrides {
        format: args.format,
        write_individual_sweeps: args.sweeps,
        force_ragged: args.force_ragged,
        no_compression: args.no_compression,
        append_day_dir: args.day_dir,
        append_year_dir: args.year_dir,
    };
    let config = resolve_writer_config(args.config.as_deref(), &overrides)?;
    // clap only sees --sweeps; the config file or environment can also ask for a split
    if args.output_path.is_some() && config.write_individual_sweeps {
        anyhow::bail!(
            "write_individual_sweeps is set but --output-path names a single file; use --output-dir"
        );
    }

    let vol = Volume::from_path(&args.input)
        .with_context(|| format!("Failed to load volume from {}", args.input.display()))?;
    if args.summary {
        println!("{}", vol.summary());
    }
    info!(input = %args.input.display(), volume = %vol.summary(), "Loaded volume");

    let add_day_dir = config.append_day_dir;
    let add_year_dir = config.append_year_dir;
    let mut writer = CfRadialWriter::new(config)?;

    let result = match (&args.output_path, &args.output_dir) {
        (Some(path), _) => writer.write_to_path(&vol, path),
        (None, Some(dir)) => writer.write_to_dir(&vol, dir, add_day_dir, add_year_dir),
        (None, None) => anyhow::bail!("one of --output-dir or --output-path is required"),
    };

    if let Err(err) = result {
        error!(error = %err, "Write failed");
        eprint!("{}", writer.error_str());
        return Ok(ExitCode::FAILURE);
    }

    for path in writer.write_paths() {
        println!("{}", path.display());
    }
    info!(n_files = writer.write_paths().len(), "Conversion complete");
    Ok(ExitCode::SUCCESS)
}
