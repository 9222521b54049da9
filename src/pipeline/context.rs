//! Build context containing configuration and paths for pipeline runs.

use crate::config::SiteConfig;
use std::path::{Path, PathBuf};

/// Context shared by every pipeline run in one invocation.
///
/// Holds the loaded configuration and the project root (the directory
/// containing `sitepack.toml`) against which all relative paths resolve.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: SiteConfig,
    /// Project root directory (where sitepack.toml is located)
    project_root: PathBuf,
    /// Whether to run in verbose mode
    verbose: bool,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: SiteConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, verbose: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Get the dev server root directory (resolved to absolute path).
    pub fn server_root(&self) -> PathBuf {
        self.resolve_path(&self.config.server.root)
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve a path relative to the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
