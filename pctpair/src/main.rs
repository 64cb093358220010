use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use pctcore::{Emit, LogEmitter, Silent};
use pctpair::config::{Axis, AxisMapping, PairingConfig, DEFAULT_TREE_AFTER, DEFAULT_TREE_BEFORE};
use pctpair::pipeline::run_pairing;

#[derive(Parser, Debug)]
#[command(name = "pctpairprotons")]
#[command(version, about = "Pair corresponding protons from GATE phase space files", long_about = None)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Phase space file of particles before the object (.root or SQLite)
    #[arg(short = 'i', long)]
    input_in: PathBuf,

    /// Phase space file of particles after the object (.root or SQLite)
    #[arg(short = 'j', long)]
    input_out: PathBuf,

    /// Output file name, the run index is inserted before the extension
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Plane position of incoming protons
    #[arg(long)]
    plane_in: f64,

    /// Plane position of outgoing protons
    #[arg(long)]
    plane_out: f64,

    /// Minimum run (inclusive)
    #[arg(long, default_value_t = 0)]
    min_run: i32,

    /// Maximum run (exclusive), unbounded if not given
    #[arg(long)]
    max_run: Option<i32>,

    /// Remove inelastic nuclear collisions
    #[arg(long)]
    no_nuclear: bool,

    /// Name of the first axis in the phase space
    #[arg(long, default_value = "Y")]
    proju: Axis,

    /// Name of the second axis in the phase space
    #[arg(long, default_value = "Z")]
    projv: Axis,

    /// Name of the third axis in the phase space
    #[arg(long, default_value = "X")]
    projw: Axis,

    /// Weight of the third axis direction component
    #[arg(long, default_value_t = -1.0)]
    wweight: f64,

    /// Name of the tree (or table) in the input phase space
    #[arg(long, default_value = DEFAULT_TREE_BEFORE)]
    psin: String,

    /// Name of the tree (or table) in the output phase space
    #[arg(long, default_value = DEFAULT_TREE_AFTER)]
    psout: String,

    /// Number of export threads, all cores if not given
    #[arg(long)]
    threads: Option<usize>,

    /// Write a JSON summary of the pairing to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Verbose execution
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> PairingConfig {
        PairingConfig {
            input_before: self.input_in,
            input_after: self.input_out,
            tree_before: self.psin,
            tree_after: self.psout,
            output_path_template: self.output,
            plane_before: self.plane_in,
            plane_after: self.plane_out,
            min_run: self.min_run,
            max_run: self.max_run,
            exclude_nuclear: self.no_nuclear,
            axes: AxisMapping::new(self.proju, self.projv, self.projw),
            tertiary_weight: self.wweight,
            verbose: self.verbose,
            num_threads: self.threads,
            summary: self.summary,
        }
    }
}

fn run(config: &PairingConfig) -> Result<bool> {
    let emitter: &dyn Emit = if config.verbose { &LogEmitter } else { &Silent };
    let summary = run_pairing(config, emitter).with_context(|| {
        format!(
            "pairing {} with {} failed",
            config.input_before.display(),
            config.input_after.display()
        )
    })?;

    for failed in summary.failed_runs() {
        log::error!(
            "run {} ({} pairs) was not written to {}",
            failed.run_id,
            failed.pairs,
            failed.output.display()
        );
    }
    Ok(summary.is_success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    builder.format_timestamp_secs();
    builder.init();

    let config = cli.into_config();
    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
