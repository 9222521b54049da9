//! Task registry for sitepack
//!
//! Maps task names to runnables: either a single pipeline or a composite of
//! named tasks run strictly in sequence. The registry is built once from
//! configuration at startup and handed by reference to the CLI and the watch
//! loop; there is no process-wide mutable state.

use crate::config::SiteConfig;
use crate::pipeline::{run_pipeline, BuildContext, PipelineDef, PipelineError};
use crate::serve::ReloadHub;

/// Error running a registered task.
#[derive(Debug)]
pub enum TaskError {
    /// The requested task name is not registered
    NotFound(String),
    /// A pipeline could not start (e.g. unwritable output root)
    Pipeline {
        /// Task name that failed to start
        task: String,
        /// Underlying start error
        source: PipelineError,
    },
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskError::NotFound(name) => write!(f, "task '{}' is not registered", name),
            TaskError::Pipeline { task, source } => {
                write!(f, "task '{}': {}", task, source)
            }
        }
    }
}

impl std::error::Error for TaskError {}

/// A runnable unit registered under a task name.
#[derive(Debug, Clone)]
pub enum Runnable {
    /// A single asset pipeline
    Pipeline(PipelineDef),
    /// Named subtasks run sequentially, aborting at the first failure
    Composite(Vec<String>),
}

/// Registry of named tasks, constructed once at startup.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    /// Registration order is preserved for listing
    tasks: Vec<(String, Runnable)>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a validated configuration.
    ///
    /// Every `[[pipeline]]` registers under its name; every `[tasks]` entry
    /// registers as a composite.
    pub fn from_config(ctx: &BuildContext) -> Self {
        let mut registry = Self::new();
        let config: &SiteConfig = ctx.config();
        for pipeline in &config.pipelines {
            registry.register(
                pipeline.name.clone(),
                Runnable::Pipeline(PipelineDef::from_config(ctx, pipeline)),
            );
        }
        for (name, subtasks) in &config.tasks {
            registry.register(name.clone(), Runnable::Composite(subtasks.clone()));
        }
        registry
    }

    /// Register a runnable under a name. A later registration under the same
    /// name shadows the earlier one (config validation rejects duplicates).
    pub fn register(&mut self, name: impl Into<String>, runnable: Runnable) {
        self.tasks.push((name.into(), runnable));
    }

    /// Look up a runnable by name.
    pub fn get(&self, name: &str) -> Option<&Runnable> {
        self.tasks.iter().rev().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Registered task names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Run the named task.
    ///
    /// Composites run subtasks strictly sequentially; a failing subtask
    /// aborts the rest and surfaces here. A pipeline's contained stage
    /// failure is already logged by the runner and does NOT count as a task
    /// failure - only a pipeline that cannot start does.
    pub fn run(&self, name: &str, ctx: &BuildContext, hub: &ReloadHub) -> Result<(), TaskError> {
        match self.get(name) {
            None => Err(TaskError::NotFound(name.to_string())),
            Some(Runnable::Pipeline(def)) => {
                run_pipeline(ctx, def, hub)
                    .map_err(|source| TaskError::Pipeline { task: name.to_string(), source })?;
                Ok(())
            }
            Some(Runnable::Composite(subtasks)) => {
                for subtask in subtasks {
                    self.run(subtask, ctx, hub)?;
                }
                Ok(())
            }
        }
    }
}
