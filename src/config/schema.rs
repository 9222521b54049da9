//! Configuration schema types for `sitepack.toml`
//!
//! Defines the structure and defaults for sitepack project configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Output directory for built artifacts
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

fn default_out() -> PathBuf {
    PathBuf::from("public/dist")
}

/// Dev server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Directory served over HTTP
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { root: default_root(), port: default_port() }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_port() -> u16 {
    3000
}

/// One transform stage in a pipeline's stage list.
///
/// Stages are declared as inline tables: `{ kind = "concat", output = "styles.css" }`.
/// An unknown `kind` fails deserialization, so misconfigured stages are
/// rejected at load time rather than mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StageConfig {
    /// Join all buffers, in order, into one output file
    Concat {
        /// Name of the combined output file
        output: String,
    },
    /// Add vendor prefixes for the configured browser targets
    Autoprefix,
    /// Minify stylesheet content
    MinifyCss,
    /// Strip comments and redundant whitespace from scripts
    MinifyJs,
}

impl StageConfig {
    /// Stage name as it appears in config and log output.
    pub fn kind(&self) -> &'static str {
        match self {
            StageConfig::Concat { .. } => "concat",
            StageConfig::Autoprefix => "autoprefix",
            StageConfig::MinifyCss => "minify-css",
            StageConfig::MinifyJs => "minify-js",
        }
    }
}

/// One `[[pipeline]]` entry: glob sources threaded through stages into `out`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Task name this pipeline is registered under
    pub name: String,
    /// Glob patterns resolved in declared order
    pub sources: Vec<String>,
    /// Transform stages applied in declared order
    #[serde(default)]
    pub stages: Vec<StageConfig>,
    /// Output directory override (defaults to `project.out`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,
}

/// One `[[watch]]` entry binding a file pattern to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchBindingConfig {
    /// Glob pattern matched against changed paths (project-root relative)
    pub pattern: String,
    /// Task to re-run on a matching change
    pub task: String,
}

/// Watcher behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Debounce interval for file change events (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

fn default_debounce_ms() -> u32 {
    100
}

/// Root configuration structure for `sitepack.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Project metadata
    pub project: ProjectConfig,
    /// Dev server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Asset pipelines
    #[serde(default, rename = "pipeline")]
    pub pipelines: Vec<PipelineConfig>,
    /// Composite tasks: name -> ordered subtask names
    #[serde(default)]
    pub tasks: BTreeMap<String, Vec<String>>,
    /// Watch bindings
    #[serde(default, rename = "watch")]
    pub watch: Vec<WatchBindingConfig>,
    /// Watcher settings
    #[serde(default)]
    pub watcher: WatcherConfig,
}

impl SiteConfig {
    /// Look up a pipeline by name.
    pub fn pipeline(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// Whether `name` refers to a declared pipeline or composite task.
    pub fn has_task(&self, name: &str) -> bool {
        self.pipeline(name).is_some() || self.tasks.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.port, 3000);
        assert_eq!(server.root, PathBuf::from("public"));
    }

    #[test]
    fn test_stage_config_kind_names() {
        assert_eq!(StageConfig::Concat { output: "x".into() }.kind(), "concat");
        assert_eq!(StageConfig::Autoprefix.kind(), "autoprefix");
        assert_eq!(StageConfig::MinifyCss.kind(), "minify-css");
        assert_eq!(StageConfig::MinifyJs.kind(), "minify-js");
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [project]
            name = "site"
        "#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project.name, "site");
        assert_eq!(config.project.out, PathBuf::from("public/dist"));
        assert_eq!(config.server.port, 3000);
        assert!(config.pipelines.is_empty());
        assert!(config.watch.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [project]
            name = "site"
            out = "dist"

            [server]
            root = "public"
            port = 8080

            [[pipeline]]
            name = "styles"
            sources = ["css/reset.css", "css/**/*.css"]
            stages = [
                { kind = "autoprefix" },
                { kind = "concat", output = "styles.css" },
                { kind = "minify-css" },
            ]

            [tasks]
            default = ["styles"]

            [[watch]]
            pattern = "css/**/*.css"
            task = "styles"
        "#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pipelines.len(), 1);
        let styles = config.pipeline("styles").unwrap();
        assert_eq!(styles.sources.len(), 2);
        assert_eq!(
            styles.stages[1],
            StageConfig::Concat { output: "styles.css".to_string() }
        );
        assert_eq!(config.tasks["default"], vec!["styles"]);
        assert_eq!(config.watch[0].task, "styles");
        assert!(config.has_task("styles"));
        assert!(config.has_task("default"));
        assert!(!config.has_task("images"));
    }

    #[test]
    fn test_unknown_stage_kind_rejected() {
        let toml = r#"
            [project]
            name = "site"

            [[pipeline]]
            name = "images"
            sources = ["img/**/*.png"]
            stages = [{ kind = "imagemin" }]
        "#;
        assert!(toml::from_str::<SiteConfig>(toml).is_err());
    }
}
