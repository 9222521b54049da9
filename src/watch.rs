//! Watch mode: re-run bound tasks on file changes.
//!
//! Maintains one debounced filesystem observer over the static roots of the
//! configured watch bindings. Each change event is matched against every
//! binding's glob pattern and the bound tasks are re-run through the task
//! registry. The loop is synchronous, so runs never overlap: events arriving
//! mid-run are held by the debounce channel and dispatched afterwards.
//!
//! Failure containment is the loop's central contract: a broken source file
//! fails its pipeline run, is logged, and the loop keeps servicing events.
//! Only startup problems (missing source root, watcher init) are fatal.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::pipeline::BuildContext;
use crate::serve::ReloadHub;
use crate::tasks::TaskRegistry;

/// Error during watch mode
#[derive(Debug)]
pub enum WatchError {
    /// Failed to initialize file watcher
    WatcherInit(notify::Error),
    /// Failed to add watch path
    WatchPath(notify::Error),
    /// Channel receive error
    ChannelError(String),
    /// A binding pattern does not compile
    InvalidPattern(String, glob::PatternError),
    /// A binding's source root does not exist
    SourceNotFound(PathBuf),
    /// No watch bindings configured
    NoBindings,
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::WatcherInit(e) => write!(f, "Failed to initialize file watcher: {}", e),
            WatchError::WatchPath(e) => write!(f, "Failed to watch path: {}", e),
            WatchError::ChannelError(msg) => write!(f, "Watch channel error: {}", msg),
            WatchError::InvalidPattern(pattern, e) => {
                write!(f, "Invalid watch pattern '{}': {}", pattern, e)
            }
            WatchError::SourceNotFound(path) => {
                write!(f, "Watched source directory not found: {}", path.display())
            }
            WatchError::NoBindings => write!(f, "No watch bindings configured"),
        }
    }
}

impl std::error::Error for WatchError {}

/// A compiled watch binding: pattern matched against project-relative paths.
#[derive(Debug)]
struct CompiledBinding {
    pattern: glob::Pattern,
    task: String,
}

/// Get current timestamp for logging
pub fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Longest pattern prefix containing no glob metacharacters.
///
/// `public/css/**/*.css` watches `public/css`; a literal file pattern like
/// `public/css/reset.css` watches its parent directory.
fn static_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[', '{']) {
            break;
        }
        prefix.push(component);
    }
    prefix
}

/// Distinct directories to observe for a set of bindings.
///
/// Prefixes naming a file (a literal pattern) collapse to their parent; a
/// prefix nested under another already-watched root is dropped since the
/// watchers are recursive.
fn watch_roots(project_root: &Path, patterns: &[&str]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let mut root = project_root.join(static_prefix(pattern));
        if root.is_file() {
            if let Some(parent) = root.parent() {
                root = parent.to_path_buf();
            }
        }
        if !roots.iter().any(|r| root.starts_with(r)) {
            roots.retain(|r| !r.starts_with(&root));
            roots.push(root);
        }
    }
    roots
}

/// Tasks to run for a batch of changed paths, deduplicated in trigger order.
fn tasks_for_paths<'a>(
    bindings: &'a [CompiledBinding],
    project_root: &Path,
    paths: &[PathBuf],
) -> Vec<&'a str> {
    let mut tasks: Vec<&str> = Vec::new();
    for path in paths {
        let relative = path.strip_prefix(project_root).unwrap_or(path);
        for binding in bindings {
            if binding.pattern.matches_path(relative) && !tasks.contains(&binding.task.as_str()) {
                tasks.push(&binding.task);
            }
        }
    }
    tasks
}

/// Run one batch of triggered tasks, containing every failure.
///
/// Nothing dispatched from the watch loop may take the loop down: even a
/// pipeline that cannot start (unwritable output root) is only logged here.
fn dispatch(tasks: &[&str], registry: &TaskRegistry, ctx: &BuildContext, hub: &ReloadHub) {
    for task in tasks {
        println!("[{}] change detected, running '{}'", timestamp(), task);
        if let Err(e) = registry.run(task, ctx, hub) {
            eprintln!("[{}] {}", timestamp(), e);
        }
    }
}

/// Watch for file changes and re-run bound tasks.
///
/// Blocks until the hosting process is killed; there is no programmed
/// shutdown. Returns an error only when the watcher cannot be established.
pub fn watch(
    ctx: &BuildContext,
    registry: &TaskRegistry,
    hub: &ReloadHub,
) -> Result<(), WatchError> {
    let config = ctx.config();
    if config.watch.is_empty() {
        return Err(WatchError::NoBindings);
    }

    let mut bindings = Vec::with_capacity(config.watch.len());
    for binding in &config.watch {
        let pattern = glob::Pattern::new(&binding.pattern)
            .map_err(|e| WatchError::InvalidPattern(binding.pattern.clone(), e))?;
        bindings.push(CompiledBinding { pattern, task: binding.task.clone() });
    }

    let patterns: Vec<&str> = config.watch.iter().map(|b| b.pattern.as_str()).collect();
    let roots = watch_roots(ctx.project_root(), &patterns);
    for root in &roots {
        if !root.exists() {
            return Err(WatchError::SourceNotFound(root.clone()));
        }
    }

    // Create channel for debounced events
    let (tx, rx) = channel();
    let debounce = Duration::from_millis(u64::from(config.watcher.debounce_ms));
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;
    for root in &roots {
        debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .map_err(WatchError::WatchPath)?;
    }

    // Initial build so the output directory reflects current sources
    if registry.get("default").is_some() {
        println!("[{}] Building...", timestamp());
        if let Err(e) = registry.run("default", ctx, hub) {
            eprintln!("[{}] {}", timestamp(), e);
        }
    }
    for root in &roots {
        println!("[{}] Watching {} for changes...", timestamp(), root.display());
    }

    // Watch loop
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<PathBuf> = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .map(|e| e.path.clone())
                    .collect();

                let tasks = tasks_for_paths(&bindings, ctx.project_root(), &changed);
                dispatch(&tasks, registry, ctx, hub);
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal) - log but continue watching
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
            }
            Err(e) => {
                return Err(WatchError::ChannelError(e.to_string()));
            }
        }
    }
}
