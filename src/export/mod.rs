//! Export pipeline: render a project into text, RTF or EPUB.
//!
//! Provides the [`FormatHandler`] trait, the [`ExportService`] registry and
//! the format-specific handlers.
//!
//! # Architecture
//!
//! Handlers follow a builder pattern:
//! - `new()` creates a handler with default configuration
//! - `with_config()` allows customization
//! - `render()` turns a borrowed project into a [`Payload`] without side
//!   effects
//!
//! Persistence is a separate step behind the [`SaveTarget`] trait, so
//! rendering can be tested and reused without touching the filesystem.
//!
//! # Example
//!
//! ```
//! use folio::export::{ExportOptions, FormatHandler, TextHandler};
//! use folio::Project;
//!
//! let project = Project::new("Empty", "");
//! let payload = TextHandler::new().render(&project, &ExportOptions::default())?;
//! assert!(payload.as_text().unwrap().starts_with("Empty"));
//! # Ok::<(), folio::Error>(())
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::model::Project;

pub mod epub;
mod options;
mod rtf;
mod service;
mod text;

pub use epub::{EpubConfig, EpubHandler};
pub use options::{EpubMetadataOptions, EpubOptions, ExportOptions, Format};
pub use rtf::{RtfHandler, html_to_rtf};
pub use service::ExportService;
pub use text::{TextHandler, html_to_text};

/// Rendered export output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Textual formats (plain text, RTF).
    Text(String),
    /// Binary formats (EPUB zip archives).
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    /// The text content, if this is a textual payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Text(text) => text.into_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of an export that went through a [`SaveTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The payload was written to this path.
    Saved(PathBuf),
    /// The user dismissed the save prompt. Nothing was written.
    Cancelled,
}

/// File type filter offered to the save prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFilter<'a> {
    pub label: &'a str,
    pub extension: &'a str,
}

/// Where exported files go.
///
/// The host application implements this with a native save dialog; the CLI
/// uses [`DirectoryTarget`].
pub trait SaveTarget {
    /// Ask for a destination. `None` means the user cancelled.
    fn prompt_save_location(&mut self, suggested_name: &str, filter: FileFilter<'_>)
    -> Option<PathBuf>;

    /// Write the payload to the chosen destination.
    fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Save target that writes into a fixed directory under the suggested name.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectoryTarget {
    fn prompt_save_location(
        &mut self,
        suggested_name: &str,
        _filter: FileFilter<'_>,
    ) -> Option<PathBuf> {
        Some(self.dir.join(suggested_name))
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    }
}

/// A renderer for one export format.
///
/// Handlers are stateless with respect to the project: `render` takes a
/// shared borrow and must return identical output for identical input.
pub trait FormatHandler: Send + Sync {
    /// Render the project.
    fn render(&self, project: &Project, options: &ExportOptions) -> Result<Payload>;

    /// File extension without the dot.
    fn file_extension(&self) -> &str;

    fn mime_type(&self) -> &str;

    /// Human-readable label for save dialog filters.
    fn filter_label(&self) -> &str;

    /// Render the project and hand the result to `target`.
    fn export_and_download(
        &self,
        project: &Project,
        options: &ExportOptions,
        target: &mut dyn SaveTarget,
    ) -> Result<ExportOutcome> {
        let payload = self.render(project, options)?;
        let filename = filename_for(project.title(), self.file_extension());
        debug!("rendered {} ({} bytes)", filename, payload.len());

        let filter = FileFilter {
            label: self.filter_label(),
            extension: self.file_extension(),
        };
        let Some(path) = target.prompt_save_location(&filename, filter) else {
            debug!("save of {filename} cancelled");
            return Ok(ExportOutcome::Cancelled);
        };

        target
            .write(&path, payload.as_bytes())
            .map_err(|source| Error::ExportFailed {
                path: path.clone(),
                source,
            })?;
        info!("exported {}", path.display());
        Ok(ExportOutcome::Saved(path))
    }
}

/// Suggested file name for a project title: every character outside
/// `[A-Za-z0-9]` becomes `_`, the result is lower-cased.
pub fn filename_for(title: &str, extension: &str) -> String {
    let mut stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        stem.push_str("untitled");
    }
    format!("{stem}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_for() {
        assert_eq!(filename_for("My Novel: Part 2", "txt"), "my_novel__part_2.txt");
        assert_eq!(filename_for("Café", "rtf"), "caf_.rtf");
        assert_eq!(filename_for("", "epub"), "untitled.epub");
    }

    #[test]
    fn test_payload_accessors() {
        let text = Payload::Text("abc".into());
        assert_eq!(text.as_text(), Some("abc"));
        assert_eq!(text.len(), 3);

        let binary = Payload::Binary(vec![1, 2]);
        assert_eq!(binary.as_text(), None);
        assert_eq!(binary.into_bytes(), vec![1, 2]);
        assert!(Payload::Text(String::new()).is_empty());
    }

    #[test]
    fn test_directory_target_writes_under_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = DirectoryTarget::new(dir.path().join("nested"));
        let filter = FileFilter {
            label: "Text Files",
            extension: "txt",
        };
        let path = target.prompt_save_location("a.txt", filter).unwrap();
        target.write(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }
}
