//! Sitepack - library for bundling, watching and serving static web assets
//!
//! This library provides functionality to:
//! - Resolve glob-matched source files into ordered buffer sequences
//! - Thread buffers through configurable transform stages (concat, minify, prefix)
//! - Re-run tasks on file changes and notify connected browsers to reload

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod serve;
pub mod stages;
pub mod tasks;
pub mod watch;
