//! Hosts for exported snapshot text: a clipboard stand-in and a file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("snapshot transport I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no snapshot available")]
    Empty,
}

/// Somewhere an exported snapshot can be written to and read back from.
pub trait TextBlob {
    fn read_text(&mut self) -> Result<String, TransportError>;
    fn write_text(&mut self, text: &str) -> Result<(), TransportError>;
}

/// In-process clipboard.
#[derive(Clone, Debug, Default)]
pub struct MemoryBlob {
    text: Option<String>,
}

impl MemoryBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard already holding `text`, e.g. pasted by a remote client.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

impl TextBlob for MemoryBlob {
    fn read_text(&mut self) -> Result<String, TransportError> {
        self.text.clone().ok_or(TransportError::Empty)
    }

    fn write_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.text = Some(text.to_string());
        Ok(())
    }
}

/// Snapshot file, replaced atomically on write.
#[derive(Clone, Debug)]
pub struct FileBlob {
    path: PathBuf,
}

impl FileBlob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextBlob for FileBlob {
    fn read_text(&mut self) -> Result<String, TransportError> {
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Err(TransportError::Empty);
        }
        Ok(text)
    }

    fn write_text(&mut self, text: &str) -> Result<(), TransportError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            // Windows refuses to rename over an existing file.
            if self.path.exists() {
                fs::remove_file(&self.path)?;
                fs::rename(&tmp, &self.path)?;
            } else {
                return Err(e.into());
            }
        }
        Ok(())
    }
}
