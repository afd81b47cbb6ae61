//! lightmap CLI: reconstruct light-string layouts from shot logs.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lightmap::reconstruct::{ReconstructConfig, ReconstructionParams};
use lightmap::synthetic::{canonical_truth, write_shot_records, HelixRig};
use log::{info, LevelFilter};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "lightmap")]
#[command(about = "Reconstruct the 3D layout of a light string from multi-angle captures")]
#[command(version)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Emit tracing output as JSON lines.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct coordinates from a shot log.
    Reconstruct(ReconstructArgs),

    /// Run a reconstruction described by a JSON config.
    Run {
        /// Path to the JSON config.
        #[arg(long)]
        config: PathBuf,
    },

    /// Print the default reconstruction parameters as JSON.
    DefaultParams,

    /// Write a synthetic shot log of a helix-wound string.
    Simulate(SimulateArgs),
}

#[derive(Debug, Clone, Args)]
struct ReconstructArgs {
    /// Shot records, one per line.
    #[arg(long)]
    input: PathBuf,

    /// Path to write the coordinate CSV.
    #[arg(long)]
    output: PathBuf,

    /// Path to write the diagnostic report (JSON).
    #[arg(long)]
    report: Option<PathBuf>,

    /// JSON config whose `params` are used as the base; flags override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    params: ParamsArgs,
}

#[derive(Debug, Clone, Args, Default)]
struct ParamsArgs {
    /// Capture width in pixels.
    #[arg(long)]
    image_width: Option<u32>,
    /// Capture height in pixels.
    #[arg(long)]
    image_height: Option<u32>,
    /// Minimum detector confidence kept (0-255).
    #[arg(long)]
    confidence_floor: Option<u8>,
    /// Percentile of neighbor distances used as the outlier threshold.
    #[arg(long)]
    outlier_percentile: Option<f64>,
    /// Rotation (degrees) taking diagonal readings onto the cardinal axes.
    #[arg(long, allow_negative_numbers = true)]
    diagonal_rotation: Option<f64>,
    /// Number of lights on the string (default: max id + 1).
    #[arg(long)]
    light_count: Option<u32>,
}

impl ParamsArgs {
    fn apply_to(&self, params: &mut ReconstructionParams) {
        if let Some(v) = self.image_width {
            params.image_width = v;
        }
        if let Some(v) = self.image_height {
            params.image_height = v;
        }
        if let Some(v) = self.confidence_floor {
            params.confidence_floor = v;
        }
        if let Some(v) = self.outlier_percentile {
            params.outlier_percentile = v;
        }
        if let Some(v) = self.diagonal_rotation {
            params.diagonal_rotation_deg = v;
        }
        if let Some(v) = self.light_count {
            params.light_count = Some(v);
        }
    }
}

#[derive(Debug, Clone, Args)]
struct SimulateArgs {
    /// Path to write the shot records (JSON lines).
    #[arg(long)]
    output: PathBuf,

    /// Path to write the canonical ground truth as CSV.
    #[arg(long)]
    truth: Option<PathBuf>,

    /// Number of lights on the string.
    #[arg(long, default_value = "500")]
    lights: u32,

    /// Helix radius in pixels.
    #[arg(long, default_value = "400.0")]
    radius: f64,

    /// Number of helix turns.
    #[arg(long, default_value = "5.0")]
    turns: f64,

    /// Half-width of the uniform pixel noise.
    #[arg(long, default_value = "0.5")]
    noise: f64,

    /// Probability of a failed detection per shot.
    #[arg(long, default_value = "0.05")]
    dropout: f64,

    /// RNG seed.
    #[arg(long, default_value = "7")]
    seed: u64,
}

fn init_logging(cli: &Cli) -> CliResult<()> {
    #[cfg(feature = "tracing")]
    {
        lightmap::core::init_tracing(cli.json_logs, cli.log_level);
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        lightmap::core::init_with_level(cli.log_level)?;
        Ok(())
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::Reconstruct(args) => run_reconstruct(&args),
        Commands::Run { config } => run_from_config(&config),
        Commands::DefaultParams => run_default_params(),
        Commands::Simulate(args) => run_simulate(&args),
    }
}

// ── reconstruct ────────────────────────────────────────────────────────

fn run_reconstruct(args: &ReconstructArgs) -> CliResult<()> {
    let mut cfg = match &args.config {
        Some(path) => ReconstructConfig::load_json(path)?,
        None => ReconstructConfig::new(args.input.to_string_lossy()),
    };
    cfg.input_path = args.input.to_string_lossy().into_owned();
    cfg.output_path = Some(args.output.to_string_lossy().into_owned());
    if let Some(report) = &args.report {
        cfg.report_path = Some(report.to_string_lossy().into_owned());
    }
    args.params.apply_to(&mut cfg.params);

    run_and_summarize(&cfg, args.config.as_deref())
}

// ── run ────────────────────────────────────────────────────────────────

fn run_from_config(path: &Path) -> CliResult<()> {
    let cfg = ReconstructConfig::load_json(path)?;
    run_and_summarize(&cfg, Some(path))
}

fn run_and_summarize(cfg: &ReconstructConfig, config_path: Option<&Path>) -> CliResult<()> {
    let result = lightmap::run_config(cfg, config_path)?;
    let counts = &result.counts;
    println!(
        "resolved {} lights ({} diagonal, {} interpolated, {} outliers), {} unresolved",
        counts.resolved,
        counts.diagonal_fixed,
        counts.neighbor_fixed,
        counts.outliers_deleted,
        counts.unresolved
    );
    Ok(())
}

// ── default-params ─────────────────────────────────────────────────────

fn run_default_params() -> CliResult<()> {
    let json = serde_json::to_string_pretty(&ReconstructionParams::default())?;
    println!("{json}");
    Ok(())
}

// ── simulate ───────────────────────────────────────────────────────────

fn run_simulate(args: &SimulateArgs) -> CliResult<()> {
    let rig = HelixRig {
        light_count: args.lights,
        radius_px: args.radius,
        turns: args.turns,
        noise_px: args.noise,
        dropout: args.dropout,
        seed: args.seed,
        ..HelixRig::default()
    };
    let capture = rig.capture();

    let out = BufWriter::new(File::create(&args.output)?);
    write_shot_records(&capture.shots, out)?;
    info!(
        "wrote {} shots ({} failed) to {}",
        capture.shots.len(),
        capture.failed_shots,
        args.output.display()
    );

    if let Some(path) = &args.truth {
        let truth = canonical_truth(&capture.truth, &rig.params());
        lightmap::reconstruct::write_csv_file(&truth, path)?;
        info!("ground truth written to {}", path.display());
    }

    println!(
        "simulated {} lights; reconstruct with --diagonal-rotation=-45",
        rig.light_count
    );
    Ok(())
}
