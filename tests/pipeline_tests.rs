//! Integration tests for the sitepack build system.
//!
//! Exercises the full path from configuration text through the task
//! registry to files on disk:
//!
//! - Glob resolution and concatenation ordering
//! - Stage failure containment
//! - Composite task sequencing
//! - Reload notification delivery
//! - Config validation errors

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use sitepack::config::{validate, SiteConfig};
use sitepack::pipeline::BuildContext;
use sitepack::serve::ReloadHub;
use sitepack::tasks::{TaskError, TaskRegistry};

// ============================================================================
// Test Utilities
// ============================================================================

/// Create a test file with content, creating parent directories as needed.
fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Parse a config, asserting it validates cleanly.
fn parse_config(toml: &str) -> SiteConfig {
    let config: SiteConfig = toml::from_str(toml).unwrap();
    let errors = validate(&config);
    assert!(errors.is_empty(), "unexpected validation errors: {:?}", errors);
    config
}

/// Build a context + registry over a temp project root.
fn setup(temp: &TempDir, toml: &str) -> (BuildContext, TaskRegistry) {
    let config = parse_config(toml);
    let ctx = BuildContext::new(config, temp.path().to_path_buf());
    let registry = TaskRegistry::from_config(&ctx);
    (ctx, registry)
}

// ============================================================================
// Pipeline Integration Tests
// ============================================================================

const SITE_CONFIG: &str = r#"
    [project]
    name = "site"
    out = "public/dist"

    [[pipeline]]
    name = "styles"
    sources = ["public/css/reset.css", "public/css/**/*.css"]
    stages = [
        { kind = "autoprefix" },
        { kind = "concat", output = "styles.css" },
        { kind = "minify-css" },
    ]

    [[pipeline]]
    name = "scripts"
    sources = ["public/scripts/**/*.js"]
    stages = [{ kind = "minify-js" }]

    [tasks]
    default = ["styles", "scripts"]

    [[watch]]
    pattern = "public/css/**/*.css"
    task = "styles"

    [[watch]]
    pattern = "public/scripts/**/*.js"
    task = "scripts"
"#;

#[test]
fn test_default_task_builds_styles_and_scripts() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "public/css/reset.css", "html { margin: 0px; }");
    create_test_file(temp.path(), "public/css/main.css", "body { color: #ff0000; }");
    create_test_file(temp.path(), "public/scripts/app.js", "var x = 1; // note\n");

    let (ctx, registry) = setup(&temp, SITE_CONFIG);
    registry.run("default", &ctx, &ReloadHub::new()).unwrap();

    let styles = fs::read_to_string(temp.path().join("public/dist/styles.css")).unwrap();
    // reset.css is pinned first by the explicit glob entry
    let reset_pos = styles.find("margin").unwrap();
    let main_pos = styles.find("color").unwrap();
    assert!(reset_pos < main_pos, "reset rules must precede main rules: {}", styles);
    assert!(!styles.contains('\n'), "minified output should be one line");

    let scripts = fs::read_to_string(temp.path().join("public/dist/app.js")).unwrap();
    assert_eq!(scripts, "var x = 1;\n");
}

#[test]
fn test_rerun_with_unchanged_sources_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "public/css/reset.css", "html { margin: 0; }");
    create_test_file(temp.path(), "public/css/b.css", "b { font-weight: 700; }");
    create_test_file(temp.path(), "public/css/a.css", "a { color: #00ff00; }");

    let (ctx, registry) = setup(&temp, SITE_CONFIG);
    let hub = ReloadHub::new();

    registry.run("styles", &ctx, &hub).unwrap();
    let first = fs::read(temp.path().join("public/dist/styles.css")).unwrap();
    registry.run("styles", &ctx, &hub).unwrap();
    let second = fs::read(temp.path().join("public/dist/styles.css")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_glob_match_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let (ctx, registry) = setup(&temp, SITE_CONFIG);

    registry.run("scripts", &ctx, &ReloadHub::new()).unwrap();

    let entries = fs::read_dir(temp.path().join("public/dist")).unwrap().count();
    assert_eq!(entries, 0);
}

#[test]
fn test_unknown_task_is_not_found() {
    let temp = TempDir::new().unwrap();
    let (ctx, registry) = setup(&temp, SITE_CONFIG);

    let result = registry.run("nonexistent", &ctx, &ReloadHub::new());
    match result {
        Err(TaskError::NotFound(name)) => assert_eq!(name, "nonexistent"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_broken_source_contains_failure_and_spares_other_tasks() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "public/css/reset.css", "html { margin: ");
    create_test_file(temp.path(), "public/scripts/app.js", "var x = 1;\n");

    let (ctx, registry) = setup(&temp, SITE_CONFIG);
    let hub = ReloadHub::new();
    let mut subscriber = hub.subscribe();

    // The styles stage fails, but the task call is contained
    registry.run("styles", &ctx, &hub).unwrap();
    assert!(!temp.path().join("public/dist/styles.css").exists());
    assert!(subscriber.try_recv().is_err(), "failed run must not broadcast a reload");

    // A subsequent task on the same registry still runs and notifies
    registry.run("scripts", &ctx, &hub).unwrap();
    assert!(temp.path().join("public/dist/app.js").exists());
    assert!(subscriber.try_recv().is_ok());
}

// ============================================================================
// Composite Task Tests
// ============================================================================

#[test]
fn test_composite_subtasks_run_in_declared_order() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "a/one.txt", "from-a");
    create_test_file(temp.path(), "b/one.txt", "from-b");

    // Both pipelines write the same output file; declaration order decides
    // the final content (last writer wins per file).
    let toml = r#"
        [project]
        name = "site"
        out = "dist"

        [[pipeline]]
        name = "first"
        sources = ["a/*.txt"]
        stages = [{ kind = "concat", output = "out.txt" }]

        [[pipeline]]
        name = "second"
        sources = ["b/*.txt"]
        stages = [{ kind = "concat", output = "out.txt" }]

        [tasks]
        default = ["first", "second"]
    "#;
    let (ctx, registry) = setup(&temp, toml);
    registry.run("default", &ctx, &ReloadHub::new()).unwrap();

    let out = fs::read_to_string(temp.path().join("dist/out.txt")).unwrap();
    assert_eq!(out, "from-b");
}

#[test]
fn test_composite_aborts_remaining_subtasks_on_failure() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "a/one.txt", "a");
    // Occupy the output path with a file so the first pipeline cannot start
    create_test_file(temp.path(), "dist", "not a directory");

    let toml = r#"
        [project]
        name = "site"
        out = "dist"

        [[pipeline]]
        name = "first"
        sources = ["a/*.txt"]

        [[pipeline]]
        name = "second"
        sources = ["a/*.txt"]
        out = "dist2"

        [tasks]
        default = ["first", "second"]
    "#;
    let (ctx, registry) = setup(&temp, toml);

    let result = registry.run("default", &ctx, &ReloadHub::new());
    assert!(matches!(result, Err(TaskError::Pipeline { .. })));
    assert!(!temp.path().join("dist2").exists(), "'second' must never start");
}

// ============================================================================
// Reload Notification Tests
// ============================================================================

#[test]
fn test_reload_reaches_only_subscribers_connected_before_broadcast() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "public/scripts/app.js", "var x = 1;\n");

    let (ctx, registry) = setup(&temp, SITE_CONFIG);
    let hub = ReloadHub::new();
    let mut early = hub.subscribe();

    registry.run("scripts", &ctx, &hub).unwrap();
    assert!(early.try_recv().is_ok());

    let mut late = hub.subscribe();
    assert!(late.try_recv().is_err(), "late subscriber must miss the earlier broadcast");

    registry.run("scripts", &ctx, &hub).unwrap();
    assert!(early.try_recv().is_ok());
    assert!(late.try_recv().is_ok());
}

// ============================================================================
// Configuration Validation Tests
// ============================================================================

#[test]
fn test_config_with_dangling_references_fails_validation() {
    let toml = r#"
        [project]
        name = "site"

        [tasks]
        default = ["styles"]

        [[watch]]
        pattern = "css/**/*.css"
        task = "scripts"
    "#;
    let config: SiteConfig = toml::from_str(toml).unwrap();
    let errors = validate(&config);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.contains("unknown task 'styles'")));
    assert!(errors.iter().any(|e| e.contains("unknown task 'scripts'")));
}
