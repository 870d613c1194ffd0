//! Book metadata resolution.

use uuid::Uuid;

use crate::export::{EpubMetadataOptions, ExportOptions};
use crate::model::Project;

/// Fallback values used when neither the export options nor the project
/// provide a field.
#[derive(Debug, Clone, Copy)]
pub struct MetadataDefaults {
    pub author: &'static str,
    pub language: &'static str,
    pub rights: &'static str,
    pub publisher: Option<&'static str>,
}

impl Default for MetadataDefaults {
    fn default() -> Self {
        Self {
            author: "Unknown Author",
            language: "en",
            rights: "All rights reserved",
            publisher: None,
        }
    }
}

/// Fully resolved metadata for one EPUB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpubMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
    /// `urn:uuid:` identifier, stable for a given project.
    pub identifier: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub rights: Option<String>,
    pub subjects: Vec<String>,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    /// `dcterms:modified` timestamp, `YYYY-MM-DDThh:mm:ssZ`.
    pub modified: String,
}

impl EpubMetadata {
    /// Resolve each field from, in order: the export options, the project's
    /// saved EPUB metadata, then `defaults`. Blank values are skipped.
    pub fn resolve(project: &Project, options: &ExportOptions, defaults: &MetadataDefaults) -> Self {
        let overrides = options.metadata_overrides();
        let saved = project.epub_metadata();
        let pick = |field: fn(&EpubMetadataOptions) -> Option<&String>| -> Option<String> {
            [overrides, saved]
                .into_iter()
                .flatten()
                .filter_map(field)
                .map(|v| v.trim())
                .find(|v| !v.is_empty())
                .map(str::to_string)
        };

        let subjects = [overrides, saved]
            .into_iter()
            .flatten()
            .map(|m| clean_list(&m.subjects))
            .find(|s| !s.is_empty())
            .unwrap_or_default();

        let title = match project.title().trim() {
            "" => "Untitled".to_string(),
            title => title.to_string(),
        };
        let description = Some(project.description().trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let updated = project.updated_at();

        Self {
            title,
            author: pick(|m| m.author.as_ref()).unwrap_or_else(|| defaults.author.to_string()),
            language: pick(|m| m.language.as_ref())
                .unwrap_or_else(|| defaults.language.to_string()),
            identifier: book_identifier(project.id()),
            description,
            publisher: pick(|m| m.publisher.as_ref())
                .or_else(|| defaults.publisher.map(str::to_string)),
            rights: pick(|m| m.rights.as_ref()).or_else(|| Some(defaults.rights.to_string())),
            subjects,
            date: updated.format("%Y-%m-%d").to_string(),
            modified: updated.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// Deterministic `urn:uuid:` identifier for a project id.
pub fn book_identifier(project_id: &str) -> String {
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("folio:project:{project_id}").as_bytes());
    format!("urn:uuid:{uuid}")
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let project = Project::new("Book", "");
        let metadata =
            EpubMetadata::resolve(&project, &ExportOptions::new("epub"), &MetadataDefaults::default());
        assert_eq!(metadata.title, "Book");
        assert_eq!(metadata.author, "Unknown Author");
        assert_eq!(metadata.language, "en");
        assert_eq!(metadata.rights.as_deref(), Some("All rights reserved"));
        assert_eq!(metadata.publisher, None);
        assert_eq!(metadata.description, None);
        assert!(metadata.subjects.is_empty());
    }

    #[test]
    fn test_override_beats_saved_beats_default() {
        let mut project = Project::new("Book", "Blurb");
        project.set_epub_metadata(Some(
            EpubMetadataOptions::new()
                .with_author("Saved Author")
                .with_publisher("Saved Press")
                .with_subject("Saved"),
        ));
        let options = ExportOptions::new("epub").with_metadata(
            EpubMetadataOptions::new()
                .with_author("  Override  ")
                .with_publisher("   ")
                .with_language("de"),
        );

        let metadata = EpubMetadata::resolve(&project, &options, &MetadataDefaults::default());
        assert_eq!(metadata.author, "Override");
        assert_eq!(metadata.publisher.as_deref(), Some("Saved Press"));
        assert_eq!(metadata.language, "de");
        assert_eq!(metadata.subjects, vec!["Saved"]);
        assert_eq!(metadata.description.as_deref(), Some("Blurb"));
    }

    #[test]
    fn test_identifier_is_stable() {
        let a = book_identifier("project-1");
        assert_eq!(a, book_identifier("project-1"));
        assert_ne!(a, book_identifier("project-2"));
        assert!(a.starts_with("urn:uuid:"));
    }

    #[test]
    fn test_dates_follow_project() {
        let json = r#"{"id":"p","title":"T","createdAt":"2024-03-05T10:20:30Z","updatedAt":"2024-03-06T07:08:09Z"}"#;
        let project = Project::from_json(json).unwrap();
        let metadata =
            EpubMetadata::resolve(&project, &ExportOptions::new("epub"), &MetadataDefaults::default());
        assert_eq!(metadata.date, "2024-03-06");
        assert_eq!(metadata.modified, "2024-03-06T07:08:09Z");
    }
}
