//! Template abstraction for EPUB generation.

use crate::error::Result;
use crate::export::ExportOptions;
use crate::model::Project;

use super::metadata::EpubMetadata;

/// A file to be placed in the EPUB archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpubFile {
    /// Path within the archive (`OEBPS/chapter_01.xhtml`).
    pub path: String,
    pub content: String,
    pub media_type: String,
}

impl EpubFile {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            media_type: media_type.into(),
        }
    }
}

/// Everything a template needs to produce a book.
#[derive(Debug, Clone)]
pub struct EpubTemplateContext<'a> {
    pub project: &'a Project,
    pub options: &'a ExportOptions,
    pub metadata: EpubMetadata,
    /// Stylesheet written to `OEBPS/stylesheet.css`.
    pub css: &'a str,
}

/// A named EPUB layout.
///
/// Implementations produce the complete file set for a book, excluding the
/// `mimetype` entry which the archive writer adds itself.
pub trait EpubTemplate: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn css(&self) -> &str;

    fn generate_files(&self, context: &EpubTemplateContext<'_>) -> Result<Vec<EpubFile>>;
}

/// Registry listing entry for a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDefinition {
    /// Key used to select the template (`generic_novel`).
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_default: bool,
}
