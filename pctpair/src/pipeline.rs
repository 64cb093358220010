use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use pctcore::{dedup_first, Emit, FeatureAssembler, KeySpec, PairingJoin, ParticleRecord, RunBatch, RunBatches, RunRange};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use crate::config::PairingConfig;
use crate::error::{PairError, Result};
use crate::io::loader::{load_phase_space, LoadRequest};
use crate::io::mha::write_run_image;

/// Result of exporting one run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub run_id: i32,
    pub pairs: usize,
    pub output: PathBuf,
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// What a pairing run read, matched and wrote.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PairingSummary {
    pub key_spec: KeySpec,
    pub run_range: RunRange,
    pub before_records: usize,
    pub before_unique: usize,
    pub after_records: usize,
    pub pair_count: usize,
    pub runs: Vec<RunOutcome>,
}

impl PairingSummary {
    pub fn failed_runs(&self) -> Vec<&RunOutcome> {
        self.runs.iter().filter(|run| !run.succeeded()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.runs.iter().all(RunOutcome::succeeded)
    }

    /// Largest exported run id + 1, if anything was paired.
    pub fn observed_run_end(&self) -> Option<i64> {
        self.runs.iter().map(|run| i64::from(run.run_id) + 1).max()
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let f = BufWriter::new(File::create(path).map_err(|e| PairError::io(path, e))?);
        serde_json::to_writer_pretty(f, self)?;
        Ok(())
    }
}

/// Load, deduplicate, pair and export as configured.
pub struct PairingPipeline<'a> {
    pub config: &'a PairingConfig,
    emitter: &'a dyn Emit,
}

impl<'a> PairingPipeline<'a> {
    pub fn new(config: &'a PairingConfig, emitter: &'a dyn Emit) -> Self {
        PairingPipeline { config, emitter }
    }

    pub fn before_request(&self) -> LoadRequest {
        LoadRequest {
            path: self.config.input_before.clone(),
            tree: self.config.tree_before.clone(),
            axes: self.config.axes,
            plane: self.config.plane_before,
            run_range: self.config.run_range(),
            key_spec: self.config.key_spec(),
        }
    }

    pub fn after_request(&self) -> LoadRequest {
        LoadRequest {
            path: self.config.input_after.clone(),
            tree: self.config.tree_after.clone(),
            axes: self.config.axes,
            plane: self.config.plane_after,
            run_range: self.config.run_range(),
            key_spec: self.config.key_spec(),
        }
    }

    /// Both streams, sorted and range filtered. Schema problems surface
    /// here, before any pairing.
    pub fn load_streams(&self) -> Result<(Vec<ParticleRecord>, Vec<ParticleRecord>)> {
        let before = load_phase_space(&self.before_request())?;
        self.emitter.emit(&format!(
            "Read input phase space {}: {} records",
            self.config.input_before.display(),
            before.len()
        ));

        let after = load_phase_space(&self.after_request())?;
        self.emitter.emit(&format!(
            "Read output phase space {}: {} records",
            self.config.input_after.display(),
            after.len()
        ));

        Ok((before, after))
    }

    fn export_batch(&self, assembler: &FeatureAssembler, batch: RunBatch) -> RunOutcome {
        self.emitter.emit(&format!("Processing run {} with {} pairs", batch.run_id, batch.len()));

        let features = assembler.assemble(&batch);
        let output = self.config.output_path(batch.run_id);

        let error = match write_run_image(&features, &output) {
            Ok(()) => {
                self.emitter.emit(&format!("Wrote file {}.", output.display()));
                None
            }
            Err(e) => {
                log::error!("run {}: {}", batch.run_id, e);
                Some(e.to_string())
            }
        };

        RunOutcome {
            run_id: batch.run_id,
            pairs: batch.len(),
            output,
            error,
        }
    }

    /// Pair the loaded streams and export every non-empty run in range.
    ///
    /// Runs are exported concurrently; a failing run is recorded in its
    /// outcome and does not stop the others.
    pub fn pair_and_export(&self, before: Vec<ParticleRecord>, after: Vec<ParticleRecord>) -> Result<PairingSummary> {
        let key_spec = self.config.key_spec();
        let run_range = self.config.run_range();
        let before_records = before.len();
        let after_records = after.len();

        let before = dedup_first(before, key_spec);
        let before_unique = before.len();
        self.emitter.emit(&format!(
            "Kept {} of {} incoming records after removing duplicate {} keys",
            before_unique, before_records, key_spec
        ));

        let assembler = self.config.assembler();
        let batches = RunBatches::new(PairingJoin::new(before, after, key_spec), run_range);

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads.unwrap_or(0))
            .build()?;
        let mut runs: Vec<RunOutcome> = thread_pool.install(|| {
            batches
                .par_bridge()
                .map(|batch| self.export_batch(&assembler, batch))
                .collect()
        });
        runs.sort_by_key(|run| run.run_id);

        let summary = PairingSummary {
            key_spec,
            run_range,
            before_records,
            before_unique,
            after_records,
            pair_count: runs.iter().map(|run| run.pairs).sum(),
            runs,
        };

        match summary.observed_run_end() {
            Some(end) => self.emitter.emit(&format!(
                "Paired {} protons, identified runs {:?}, exported {}",
                summary.pair_count,
                run_range.runs_up_to(end),
                summary.runs.len()
            )),
            None => self.emitter.emit("No pairs found in the requested run range"),
        }

        Ok(summary)
    }

    pub fn run(&self) -> Result<PairingSummary> {
        if let Ok(config) = serde_json::to_string(self.config) {
            self.emitter.emit(&format!("Configuration: {}", config));
        }

        let (before, after) = self.load_streams()?;
        let summary = self.pair_and_export(before, after)?;

        if let Some(path) = &self.config.summary {
            summary.save_json(path)?;
            self.emitter.emit(&format!("Wrote summary {}.", path.display()));
        }

        Ok(summary)
    }
}

/// Run the whole pipeline for `config`.
pub fn run_pairing(config: &PairingConfig, emitter: &dyn Emit) -> Result<PairingSummary> {
    PairingPipeline::new(config, emitter).run()
}
