//! Transform stages for the asset pipeline
//!
//! A stage is a pure function over an ordered sequence of named buffers:
//! it may rewrite, rename, merge or drop buffers but holds no state between
//! invocations. Stages are constructed from [`StageConfig`] entries and
//! applied by the pipeline runner in declared order, each stage receiving
//! the full output of the previous one.

pub mod concat;
pub mod css;
pub mod js;

pub use concat::Concat;
pub use css::{Autoprefix, MinifyCss};
pub use js::MinifyJs;

use crate::config::StageConfig;
use crate::pipeline::NamedBuffer;

/// Error raised by a transform stage on its input.
///
/// Contained by the pipeline runner: a stage error aborts the run, is logged
/// with the stage name, and never propagates out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    /// Name of the failing stage
    pub stage: &'static str,
    /// What went wrong, including the offending buffer name where known
    pub message: String,
}

impl StageError {
    /// Create a new stage error.
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self { stage, message: message.into() }
    }
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stage '{}' failed: {}", self.stage, self.message)
    }
}

impl std::error::Error for StageError {}

/// One transform step in a pipeline.
pub trait Stage {
    /// Stage name for log output.
    fn name(&self) -> &'static str;

    /// Apply the transform to the full buffer sequence.
    fn apply(&self, input: Vec<NamedBuffer>) -> Result<Vec<NamedBuffer>, StageError>;
}

/// Construct the stage implementation for a config entry.
pub fn build_stage(config: &StageConfig) -> Box<dyn Stage> {
    match config {
        StageConfig::Concat { output } => Box::new(Concat::new(output.clone())),
        StageConfig::Autoprefix => Box::new(Autoprefix),
        StageConfig::MinifyCss => Box::new(MinifyCss),
        StageConfig::MinifyJs => Box::new(MinifyJs),
    }
}
