//! Concatenating stage: joins all buffers into one output file.

use crate::pipeline::NamedBuffer;
use crate::stages::{Stage, StageError};

/// Joins every incoming buffer, in sequence order, into a single buffer
/// with the configured output name. Buffers are separated by a newline so
/// a file without a trailing newline cannot glue onto the next one.
///
/// Concatenating zero buffers yields zero buffers: an empty source match
/// stays a no-op write instead of producing an empty artifact.
#[derive(Debug, Clone)]
pub struct Concat {
    output: String,
}

impl Concat {
    /// Create a concat stage writing to `output`.
    pub fn new(output: impl Into<String>) -> Self {
        Self { output: output.into() }
    }
}

impl Stage for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, input: Vec<NamedBuffer>) -> Result<Vec<NamedBuffer>, StageError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let mut content = Vec::new();
        for (i, buffer) in input.iter().enumerate() {
            if i > 0 {
                content.push(b'\n');
            }
            content.extend_from_slice(&buffer.content);
        }

        Ok(vec![NamedBuffer::new(self.output.clone(), content)])
    }
}
