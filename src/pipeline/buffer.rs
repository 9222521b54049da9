//! Named byte buffers flowing through pipeline stages.

use std::fs;
use std::path::Path;

/// One file's worth of content moving through a pipeline.
///
/// `name` is the output-relative file name; stages may rename, merge or drop
/// buffers but the sequence order is always significant. Each buffer is owned
/// exclusively by the pipeline run processing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBuffer {
    /// Output file name (no directory components)
    pub name: String,
    /// Raw file content
    pub content: Vec<u8>,
}

impl NamedBuffer {
    /// Create a buffer from a name and content.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), content: content.into() }
    }

    /// Read a buffer from disk, naming it after the source file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = fs::read(path)?;
        Ok(Self { name, content })
    }

    /// Interpret the content as UTF-8 text.
    ///
    /// Text stages (CSS, JS) need string input; binary content is a stage
    /// error, not a crash.
    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_buffer_from_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.js");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"var x = 1;").unwrap();

        let buffer = NamedBuffer::from_path(&path).unwrap();
        assert_eq!(buffer.name, "app.js");
        assert_eq!(buffer.content, b"var x = 1;");
    }

    #[test]
    fn test_buffer_from_missing_path() {
        assert!(NamedBuffer::from_path(Path::new("/nonexistent/app.js")).is_err());
    }

    #[test]
    fn test_buffer_as_str() {
        let buffer = NamedBuffer::new("a.css", "body {}");
        assert_eq!(buffer.as_str().unwrap(), "body {}");

        let binary = NamedBuffer::new("a.bin", vec![0xff, 0xfe]);
        assert!(binary.as_str().is_err());
    }
}
