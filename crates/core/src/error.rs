//! Error types for slot photo extraction.

use crate::types::Slot;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a deck or extracting its slot photos.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The deck file does not exist.
    #[error("Deck file not found: {}", .0.display())]
    DeckNotFound(PathBuf),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A slide does not carry exactly five photographs.
    #[error("found {found} photographs, 5 required")]
    ImageCount { found: usize },

    /// The embedded image for a slot could not be read.
    #[error("{slot} image extraction failed: {reason}")]
    ImageExtraction { slot: Slot, reason: String },

    /// Writing a slot file failed.
    #[error("Failed to write {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
