//! Script minification stage.
//!
//! A conservative whitespace/comment stripper: comments are removed, leading
//! indentation and blank lines are dropped, string, template and regex
//! literals pass through verbatim. No identifier renaming or expression
//! rewriting, so output is always semantically equivalent to input.
//!
//! Known limitation: a regex literal in a position where a division would
//! also be legal (e.g. directly after `return`) is copied verbatim, which is
//! only wrong if it contains `//`.

use crate::pipeline::NamedBuffer;
use crate::stages::{Stage, StageError};

/// Strips comments and redundant whitespace from each script buffer.
#[derive(Debug, Clone, Copy)]
pub struct MinifyJs;

impl Stage for MinifyJs {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply(&self, input: Vec<NamedBuffer>) -> Result<Vec<NamedBuffer>, StageError> {
        input
            .into_iter()
            .map(|buffer| {
                let source = buffer.as_str().map_err(|_| {
                    StageError::new(self.name(), format!("{}: not valid UTF-8", buffer.name))
                })?;
                let code = strip_js(source).map_err(|e| {
                    StageError::new(self.name(), format!("{}: {}", buffer.name, e))
                })?;
                Ok(NamedBuffer::new(buffer.name, code))
            })
            .collect()
    }
}

/// Whether a `/` following this byte starts a regex literal rather than a
/// division. `0` marks the start of input.
fn regex_can_start(last: u8) -> bool {
    matches!(
        last,
        0 | b'(' | b',' | b'=' | b':' | b'[' | b'!' | b'&' | b'|' | b'?' | b'{' | b'}' | b';'
            | b'+' | b'-' | b'*' | b'%' | b'~' | b'^' | b'<' | b'>' | b'\n'
    )
}

/// Remove comments, indentation and blank lines from JavaScript source.
///
/// Errors on input that cannot be stripped safely: unterminated block
/// comments, strings, templates or regex literals.
pub fn strip_js(source: &str) -> Result<String, String> {
    let bytes = source.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    // Last significant (non-whitespace) byte emitted; decides regex vs division
    let mut last: u8 = 0;
    let mut at_line_start = true;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                // Line comment: drop to end of line, keep the newline
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let mut j = i + 2;
                while j + 1 < bytes.len() && !(bytes[j] == b'*' && bytes[j + 1] == b'/') {
                    j += 1;
                }
                if j + 1 >= bytes.len() {
                    return Err("unterminated block comment".to_string());
                }
                // A space keeps tokens on either side of the comment apart
                if !at_line_start && !out.ends_with(b" ") {
                    out.push(b' ');
                }
                i = j + 2;
            }
            b'/' if regex_can_start(last) => {
                i = copy_regex(bytes, i, &mut out)?;
                last = b'/';
                at_line_start = false;
            }
            b'\'' | b'"' => {
                i = copy_string(bytes, i, &mut out)?;
                last = c;
                at_line_start = false;
            }
            b'`' => {
                i = copy_template(bytes, i, &mut out)?;
                last = c;
                at_line_start = false;
            }
            b'\n' => {
                trim_trailing_blanks(&mut out);
                if !(out.is_empty() || out.ends_with(b"\n")) {
                    out.push(b'\n');
                    last = b'\n';
                }
                at_line_start = true;
                i += 1;
            }
            b' ' | b'\t' | b'\r' if at_line_start => {
                i += 1;
            }
            _ => {
                out.push(c);
                if !c.is_ascii_whitespace() {
                    last = c;
                }
                at_line_start = false;
                i += 1;
            }
        }
    }

    trim_trailing_blanks(&mut out);
    if !out.is_empty() {
        out.push(b'\n');
    }

    // Only ASCII sequences were removed, so the result is still valid UTF-8
    String::from_utf8(out).map_err(|e| e.to_string())
}

/// Copy a quoted string literal, honoring backslash escapes.
fn copy_string(bytes: &[u8], start: usize, out: &mut Vec<u8>) -> Result<usize, String> {
    let quote = bytes[start];
    out.push(quote);
    let mut i = start + 1;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' && i + 1 < bytes.len() {
            out.push(c);
            out.push(bytes[i + 1]);
            i += 2;
            continue;
        }
        if c == b'\n' {
            return Err("unterminated string literal".to_string());
        }
        out.push(c);
        i += 1;
        if c == quote {
            return Ok(i);
        }
    }
    Err("unterminated string literal".to_string())
}

/// Copy a template literal verbatim, honoring backslash escapes. Newlines
/// inside templates are significant and pass through untouched.
fn copy_template(bytes: &[u8], start: usize, out: &mut Vec<u8>) -> Result<usize, String> {
    out.push(b'`');
    let mut i = start + 1;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' && i + 1 < bytes.len() {
            out.push(c);
            out.push(bytes[i + 1]);
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
        if c == b'`' {
            return Ok(i);
        }
    }
    Err("unterminated template literal".to_string())
}

/// Copy a regex literal, honoring escapes and character classes.
fn copy_regex(bytes: &[u8], start: usize, out: &mut Vec<u8>) -> Result<usize, String> {
    out.push(b'/');
    let mut i = start + 1;
    let mut in_class = false;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' && i + 1 < bytes.len() {
            out.push(c);
            out.push(bytes[i + 1]);
            i += 2;
            continue;
        }
        if c == b'\n' {
            return Err("unterminated regular expression".to_string());
        }
        out.push(c);
        i += 1;
        match c {
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => return Ok(i),
            _ => {}
        }
    }
    Err("unterminated regular expression".to_string())
}

/// Drop trailing spaces and tabs from the output buffer.
fn trim_trailing_blanks(out: &mut Vec<u8>) {
    while out.last().is_some_and(|c| *c == b' ' || *c == b'\t' || *c == b'\r') {
        out.pop();
    }
}
