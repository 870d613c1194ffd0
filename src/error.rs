//! Error types for folio operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while editing a project or exporting it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid project: {0}")]
    InvalidProject(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Template '{0}' not found")]
    UnknownTemplate(String),

    #[error("Export to {} failed: {source}", path.display())]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reserved for callers that want to surface unreadable scene content.
    /// The built-in transforms degrade to best-effort text instead.
    #[error("Malformed content: {0}")]
    MalformedContent(String),

    /// An archive read back by the inspector is not a usable EPUB package.
    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Invalid word target: {0} (expected 1..=50000)")]
    InvalidGoal(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
