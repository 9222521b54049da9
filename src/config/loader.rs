//! Configuration loading and discovery for `sitepack.toml`
//!
//! Provides functions to find, load, validate and merge configuration.

use super::schema::{ProjectConfig, ServerConfig, SiteConfig, WatcherConfig};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse sitepack.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override server root directory
    pub root: Option<PathBuf>,
    /// Override server port
    pub port: Option<u16>,
}

/// Find sitepack.toml by walking up from the current working directory.
///
/// # Returns
/// - `Some(path)` if a sitepack.toml file is found
/// - `None` if no config file is found
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find sitepack.toml by walking up from a specific directory.
///
/// This is the internal implementation that allows specifying the start
/// directory, useful for testing.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join("sitepack.toml");
        if config_path.exists() {
            return Some(config_path);
        }

        // Move to parent directory
        if !current.pop() {
            // Reached root, no config found
            return None;
        }
    }
}

/// Load configuration from a sitepack.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses
/// `find_config()` to locate the config file. If no config file is found,
/// returns a default configuration.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SiteConfig = toml::from_str(&contents)?;

    let errors = validate(&config);
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    Ok(config)
}

/// Create a default configuration when no sitepack.toml is found.
///
/// Returns a minimal valid configuration with the project name set to
/// the current directory name.
pub fn default_config() -> SiteConfig {
    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_string());

    SiteConfig {
        project: ProjectConfig { name: project_name, out: PathBuf::from("public/dist") },
        server: ServerConfig::default(),
        pipelines: Vec::new(),
        tasks: BTreeMap::new(),
        watch: Vec::new(),
        watcher: WatcherConfig::default(),
    }
}

/// Validate a loaded configuration.
///
/// Checks that pipeline and task names are unique, that composite tasks and
/// watch bindings only reference declared tasks, that composites do not form
/// cycles, and that glob patterns compile.
pub fn validate(config: &SiteConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push("server.port must be nonzero".to_string());
    }

    // Unique names across pipelines and composite tasks
    let mut seen = HashSet::new();
    for pipeline in &config.pipelines {
        if !seen.insert(pipeline.name.as_str()) {
            errors.push(format!("duplicate task name '{}'", pipeline.name));
        }
        if pipeline.sources.is_empty() {
            errors.push(format!("pipeline '{}' declares no sources", pipeline.name));
        }
        for pattern in &pipeline.sources {
            if let Err(e) = glob::Pattern::new(pattern) {
                errors.push(format!(
                    "pipeline '{}': invalid glob pattern '{}': {}",
                    pipeline.name, pattern, e
                ));
            }
        }
    }
    for name in config.tasks.keys() {
        if !seen.insert(name.as_str()) {
            errors.push(format!("duplicate task name '{}'", name));
        }
    }

    // Composite subtasks must reference declared tasks
    for (name, subtasks) in &config.tasks {
        for subtask in subtasks {
            if !config.has_task(subtask) {
                errors.push(format!("task '{}' references unknown task '{}'", name, subtask));
            }
        }
    }

    // Composites must not form cycles
    for name in config.tasks.keys() {
        if has_cycle(config, name, &mut Vec::new()) {
            errors.push(format!("task '{}' is part of a composition cycle", name));
        }
    }

    // Watch bindings must reference declared tasks and compile as patterns
    for binding in &config.watch {
        if !config.has_task(&binding.task) {
            errors.push(format!("watch binding references unknown task '{}'", binding.task));
        }
        if let Err(e) = glob::Pattern::new(&binding.pattern) {
            errors.push(format!("invalid watch pattern '{}': {}", binding.pattern, e));
        }
    }

    errors
}

/// Depth-first walk through composite references looking for a cycle.
fn has_cycle<'a>(config: &'a SiteConfig, name: &'a str, stack: &mut Vec<&'a str>) -> bool {
    if stack.contains(&name) {
        return true;
    }
    let Some(subtasks) = config.tasks.get(name) else {
        // Pipelines have no subtasks
        return false;
    };
    stack.push(name);
    let cyclic = subtasks.iter().any(|s| has_cycle(config, s, stack));
    stack.pop();
    cyclic
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut SiteConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.project.out = out.clone();
    }

    if let Some(ref root) = overrides.root {
        config.server.root = root.clone();
    }

    if let Some(port) = overrides.port {
        config.server.port = port;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("sitepack.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const VALID: &str = r#"
        [project]
        name = "site"

        [[pipeline]]
        name = "styles"
        sources = ["css/**/*.css"]
        stages = [{ kind = "minify-css" }]

        [tasks]
        default = ["styles"]

        [[watch]]
        pattern = "css/**/*.css"
        task = "styles"
    "#;

    #[test]
    fn test_load_valid_config() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), VALID);

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.pipelines.len(), 1);
        assert_eq!(config.tasks["default"], vec!["styles"]);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_config(Some(Path::new("/nonexistent/sitepack.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[project\nname = ");
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_find_config_from_walks_up() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), VALID);
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let found = find_config_from(nested).unwrap();
        assert_eq!(found, temp.path().join("sitepack.toml"));
    }

    #[test]
    fn test_validate_unknown_subtask() {
        let mut config = default_config();
        config.tasks.insert("default".to_string(), vec!["styles".to_string()]);

        let errors = validate(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("unknown task 'styles'"));
    }

    #[test]
    fn test_validate_unknown_watch_task() {
        let toml = r#"
            [project]
            name = "site"

            [[watch]]
            pattern = "css/**/*.css"
            task = "styles"
        "#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.contains("unknown task 'styles'")));
    }

    #[test]
    fn test_validate_detects_cycles() {
        let mut config = default_config();
        config.tasks.insert("a".to_string(), vec!["b".to_string()]);
        config.tasks.insert("b".to_string(), vec!["a".to_string()]);

        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.contains("composition cycle")));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let toml = r#"
            [project]
            name = "site"

            [[pipeline]]
            name = "styles"
            sources = ["a/**/*.css"]

            [[pipeline]]
            name = "styles"
            sources = ["b/**/*.css"]
        "#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.contains("duplicate task name 'styles'")));
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = default_config();
        config.server.port = 0;
        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.contains("nonzero")));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = default_config();
        let overrides = CliOverrides {
            out: Some(PathBuf::from("dist")),
            port: Some(8080),
            ..Default::default()
        };
        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.project.out, PathBuf::from("dist"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.root, PathBuf::from("public"));
    }
}
