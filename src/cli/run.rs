//! Run command implementation (`sitepack run [TASK]`)

use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::config::{find_config, load_config, merge_cli_overrides, CliOverrides};
use crate::pipeline::BuildContext;
use crate::serve::ReloadHub;
use crate::tasks::{TaskError, TaskRegistry};

/// Load configuration and build the context for one invocation.
///
/// An explicit `--config` path wins; otherwise sitepack.toml is discovered
/// by walking up from the current directory, falling back to defaults when
/// none exists. The project root is the config file's directory.
pub(crate) fn load_context(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    verbose: bool,
) -> Result<BuildContext, ExitCode> {
    let discovered = match config_path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    let (config, project_root) = match discovered {
        Some(path) => {
            if verbose {
                println!("Using config: {}", path.display());
            }
            let config = match load_config(Some(&path)) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return Err(ExitCode::from(EXIT_ERROR));
                }
            };
            let root = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            (config, root)
        }
        None => {
            if verbose {
                println!("No sitepack.toml found, using defaults");
            }
            let root = std::env::current_dir().unwrap_or_default();
            (crate::config::default_config(), root)
        }
    };

    let mut config = config;
    merge_cli_overrides(&mut config, overrides);

    Ok(BuildContext::new(config, project_root).with_verbose(verbose))
}

/// Run the run command
pub fn run_task(
    task: Option<&str>,
    config_path: Option<&Path>,
    out: Option<&Path>,
    verbose: bool,
) -> ExitCode {
    let overrides = CliOverrides { out: out.map(|p| p.to_path_buf()), ..Default::default() };
    let ctx = match load_context(config_path, &overrides, verbose) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let registry = TaskRegistry::from_config(&ctx);
    let hub = ReloadHub::new();
    let name = task.unwrap_or("default");

    println!("Running task '{}'...", name);
    match registry.run(name, &ctx, &hub) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e @ TaskError::NotFound(_)) => {
            eprintln!("Error: {}", e);
            let names = registry.names();
            if names.is_empty() {
                eprintln!("No tasks are configured; add [[pipeline]] entries to sitepack.toml");
            } else {
                eprintln!("Available tasks: {}", names.join(", "));
            }
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
