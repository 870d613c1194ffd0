//! Export configuration.
//!
//! Options deserialize from the same JSON the host application stores
//! (`include_title`, `include_chapter_titles`, ...). Missing fields take the
//! defaults below.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Output format selector.
///
/// Unknown format ids are representable so that a request for an
/// unregistered format reaches the service and fails there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Format {
    #[default]
    Text,
    Rtf,
    Epub,
    Other(String),
}

impl Format {
    /// Registry id of the format (`txt`, `rtf`, `epub`, ...).
    pub fn id(&self) -> &str {
        match self {
            Format::Text => "txt",
            Format::Rtf => "rtf",
            Format::Epub => "epub",
            Format::Other(id) => id,
        }
    }
}

impl From<&str> for Format {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Format::Text,
            "rtf" => Format::Rtf,
            "epub" => Format::Epub,
            other => Format::Other(other.to_string()),
        }
    }
}

impl From<String> for Format {
    fn from(s: String) -> Self {
        Format::from(s.as_str())
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.id().to_string()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What to export and which optional parts to include.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: Format,
    /// Title at the start of the document, or the EPUB title page.
    pub include_title: bool,
    pub include_chapter_titles: bool,
    pub include_scene_titles: bool,
    /// Per-scene `Words: N` lines.
    pub include_word_count: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epub: Option<EpubOptions>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: Format::Text,
            include_title: true,
            include_chapter_titles: true,
            include_scene_titles: false,
            include_word_count: false,
            epub: None,
        }
    }
}

impl ExportOptions {
    /// Default options for the given format.
    pub fn new(format: impl Into<Format>) -> Self {
        Self {
            format: format.into(),
            ..Default::default()
        }
    }

    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_title(mut self, include: bool) -> Self {
        self.include_title = include;
        self
    }

    pub fn with_chapter_titles(mut self, include: bool) -> Self {
        self.include_chapter_titles = include;
        self
    }

    pub fn with_scene_titles(mut self, include: bool) -> Self {
        self.include_scene_titles = include;
        self
    }

    pub fn with_word_counts(mut self, include: bool) -> Self {
        self.include_word_count = include;
        self
    }

    /// Select an EPUB template by name.
    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.epub.get_or_insert_with(Default::default).template_name = Some(name.into());
        self
    }

    /// Set EPUB metadata overrides.
    pub fn with_metadata(mut self, metadata: EpubMetadataOptions) -> Self {
        self.epub.get_or_insert_with(Default::default).metadata = Some(metadata);
        self
    }

    /// Requested template name, if any.
    pub fn template_name(&self) -> Option<&str> {
        self.epub.as_ref()?.template_name.as_deref()
    }

    /// Metadata overrides, if any.
    pub fn metadata_overrides(&self) -> Option<&EpubMetadataOptions> {
        self.epub.as_ref()?.metadata.as_ref()
    }
}

/// EPUB-specific options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpubOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EpubMetadataOptions>,
}

/// Publication details. Used both as per-export overrides and as the
/// defaults saved on a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpubMetadataOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
}

impl EpubMetadataOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_rights(mut self, rights: impl Into<String>) -> Self {
        self.rights = Some(rights.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ids() {
        assert_eq!(Format::from("TXT"), Format::Text);
        assert_eq!(Format::from("text"), Format::Text);
        assert_eq!(Format::from("epub").id(), "epub");
        assert_eq!(Format::from("pdf"), Format::Other("pdf".into()));
        assert_eq!(Format::Rtf.to_string(), "rtf");
    }

    #[test]
    fn test_defaults() {
        let options = ExportOptions::default();
        assert!(options.include_title);
        assert!(options.include_chapter_titles);
        assert!(!options.include_scene_titles);
        assert!(!options.include_word_count);
        assert_eq!(options.template_name(), None);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let options = ExportOptions::from_json(
            r#"{
                "format": "epub",
                "include_scene_titles": true,
                "epub": {
                    "template_name": "classic_book",
                    "metadata": { "author": "Ada", "subjects": ["Fantasy"] }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(options.format, Format::Epub);
        assert!(options.include_title);
        assert!(options.include_scene_titles);
        assert_eq!(options.template_name(), Some("classic_book"));
        let metadata = options.metadata_overrides().unwrap();
        assert_eq!(metadata.author.as_deref(), Some("Ada"));
        assert_eq!(metadata.subjects, vec!["Fantasy"]);
    }

    #[test]
    fn test_builders() {
        let options = ExportOptions::new("epub")
            .with_title(false)
            .with_template("modern_compact")
            .with_metadata(EpubMetadataOptions::new().with_language("fr"));
        assert!(!options.include_title);
        assert_eq!(options.template_name(), Some("modern_compact"));
        assert_eq!(
            options.metadata_overrides().unwrap().language.as_deref(),
            Some("fr")
        );
    }
}
