//! CSS transform stages backed by lightningcss.
//!
//! Two stages share the same parse/print machinery: `autoprefix` adds vendor
//! prefixes for a fixed set of browser targets and keeps readable output,
//! `minify-css` prints compressed output. Malformed CSS surfaces as a
//! [`StageError`] naming the offending buffer.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::pipeline::NamedBuffer;
use crate::stages::{Stage, StageError};

/// Browser targets driving vendor prefixing.
///
/// Versions are encoded `major << 16 | minor << 8` per the lightningcss
/// Browsers convention.
fn browser_targets() -> Targets {
    Targets {
        browsers: Some(Browsers {
            chrome: Some(109 << 16),
            edge: Some(109 << 16),
            firefox: Some(102 << 16),
            safari: Some((15 << 16) | (6 << 8)),
            ios_saf: Some((15 << 16) | (6 << 8)),
            ..Browsers::default()
        }),
        ..Targets::default()
    }
}

/// Parse, transform for the given targets, and print one stylesheet.
fn process_css(
    stage: &'static str,
    buffer: &NamedBuffer,
    compress: bool,
) -> Result<String, StageError> {
    let source = buffer
        .as_str()
        .map_err(|_| StageError::new(stage, format!("{}: not valid UTF-8", buffer.name)))?;

    let targets = browser_targets();

    let mut sheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| StageError::new(stage, format!("{}: {}", buffer.name, e)))?;

    sheet
        .minify(MinifyOptions { targets, ..MinifyOptions::default() })
        .map_err(|e| StageError::new(stage, format!("{}: {}", buffer.name, e)))?;

    let output = sheet
        .to_css(PrinterOptions { minify: compress, targets, ..PrinterOptions::default() })
        .map_err(|e| StageError::new(stage, format!("{}: {}", buffer.name, e)))?;

    Ok(output.code)
}

/// Adds vendor prefixes for the configured browser targets.
#[derive(Debug, Clone, Copy)]
pub struct Autoprefix;

impl Stage for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, input: Vec<NamedBuffer>) -> Result<Vec<NamedBuffer>, StageError> {
        input
            .into_iter()
            .map(|buffer| {
                let code = process_css(self.name(), &buffer, false)?;
                Ok(NamedBuffer::new(buffer.name, code))
            })
            .collect()
    }
}

/// Prints each stylesheet in compressed form.
#[derive(Debug, Clone, Copy)]
pub struct MinifyCss;

impl Stage for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, input: Vec<NamedBuffer>) -> Result<Vec<NamedBuffer>, StageError> {
        input
            .into_iter()
            .map(|buffer| {
                let code = process_css(self.name(), &buffer, true)?;
                Ok(NamedBuffer::new(buffer.name, code))
            })
            .collect()
    }
}
