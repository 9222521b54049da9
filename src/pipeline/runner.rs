//! Pipeline execution and failure containment.
//!
//! `run_pipeline` is the heart of the build: resolve sources, read buffers,
//! thread them through stages, write the output directory, broadcast a
//! reload. Everything that can go wrong *inside* a run (malformed CSS,
//! unreadable source, failed write) is contained: logged, the run discarded,
//! the reload suppressed, and `Ok(PipelineOutcome::Failed)` returned so the
//! caller - in particular the watch loop - keeps going. Only failure to
//! start the run at all (unwritable output root) is a hard error.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{PipelineConfig, StageConfig};
use crate::pipeline::{resolve_sources, BuildContext, NamedBuffer};
use crate::serve::ReloadHub;
use crate::stages::build_stage;
use crate::watch::timestamp;

/// Error establishing a pipeline run.
#[derive(Debug)]
pub enum PipelineError {
    /// Output directory could not be created
    Io(std::io::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io(err) => write!(f, "cannot start pipeline: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

/// A resolved pipeline definition, ready to run.
#[derive(Debug, Clone)]
pub struct PipelineDef {
    /// Task name this pipeline is registered under
    pub name: String,
    /// Glob patterns resolved in declared order
    pub sources: Vec<String>,
    /// Stages applied in declared order
    pub stages: Vec<StageConfig>,
    /// Absolute output directory
    pub out_dir: PathBuf,
}

impl PipelineDef {
    /// Build a runnable definition from a config entry.
    pub fn from_config(ctx: &BuildContext, config: &PipelineConfig) -> Self {
        let out_dir = match &config.out {
            Some(out) => ctx.resolve_path(out),
            None => ctx.out_dir(),
        };
        Self {
            name: config.name.clone(),
            sources: config.sources.clone(),
            stages: config.stages.clone(),
            out_dir,
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// All stages ran, outputs written, reload broadcast
    Completed {
        /// Files written to the output directory
        outputs: Vec<PathBuf>,
        /// Run duration
        duration: Duration,
    },
    /// A stage or filesystem operation failed inside the run; nothing was
    /// written and no reload fired
    Failed {
        /// Name of the failing step
        stage: String,
        /// Underlying error text
        message: String,
    },
}

impl PipelineOutcome {
    /// Whether the run completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed { .. })
    }
}

/// Run one pipeline to completion.
///
/// An empty source match is a successful no-op write: stages run over an
/// empty sequence, nothing lands in the output directory, and the reload
/// still fires because the run completed.
pub fn run_pipeline(
    ctx: &BuildContext,
    def: &PipelineDef,
    hub: &ReloadHub,
) -> Result<PipelineOutcome, PipelineError> {
    let start = Instant::now();

    // The one non-contained failure: without an output root there is no run
    fs::create_dir_all(&def.out_dir)?;

    let files = match resolve_sources(ctx.project_root(), &def.sources) {
        Ok(files) => files,
        Err(e) => return Ok(fail(&def.name, "sources", e.to_string())),
    };

    let mut buffers = Vec::with_capacity(files.len());
    for path in &files {
        match NamedBuffer::from_path(path) {
            Ok(buffer) => buffers.push(buffer),
            Err(e) => {
                return Ok(fail(&def.name, "read", format!("{}: {}", path.display(), e)))
            }
        }
    }

    for stage_config in &def.stages {
        let stage = build_stage(stage_config);
        match stage.apply(buffers) {
            Ok(next) => buffers = next,
            Err(e) => return Ok(fail(&def.name, e.stage, e.message)),
        }
    }

    let mut outputs = Vec::with_capacity(buffers.len());
    for buffer in &buffers {
        let path = def.out_dir.join(&buffer.name);
        if let Err(e) = fs::write(&path, &buffer.content) {
            return Ok(fail(&def.name, "write", format!("{}: {}", path.display(), e)));
        }
        outputs.push(path);
    }

    let duration = start.elapsed();
    if ctx.is_verbose() {
        println!(
            "[{}] task '{}': wrote {} file{} ({}ms)",
            timestamp(),
            def.name,
            outputs.len(),
            if outputs.len() == 1 { "" } else { "s" },
            duration.as_millis()
        );
    }

    hub.broadcast();
    Ok(PipelineOutcome::Completed { outputs, duration })
}

/// Log a contained failure and build its outcome.
fn fail(task: &str, stage: &str, message: String) -> PipelineOutcome {
    eprintln!("[{}] task '{}': stage '{}' failed: {}", timestamp(), task, stage, message);
    PipelineOutcome::Failed { stage: stage.to_string(), message }
}
