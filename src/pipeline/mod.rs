//! Asset pipeline module for sitepack
//!
//! A pipeline resolves glob-matched source files into an ordered sequence of
//! named buffers, threads the whole sequence through transform stages, writes
//! the resulting buffers into the output directory and broadcasts a reload
//! notification.
//!
//! # Overview
//!
//! Pipeline execution consists of:
//! - **Resolution**: match source globs, in declared order, deterministically
//! - **Transformation**: apply each stage to the full buffer sequence
//! - **Write-out**: flush surviving buffers into the flat output directory
//!
//! A stage failure is contained: it is logged, the run is discarded, no
//! reload fires, and the caller sees a completed-but-failed outcome rather
//! than an error. The watch loop relies on this to survive broken sources.

pub mod buffer;
pub mod context;
pub mod runner;
pub mod source;

pub use buffer::*;
pub use context::*;
pub use runner::*;
pub use source::*;
