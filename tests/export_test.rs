use std::io;
use std::path::{Path, PathBuf};

use folio::export::{FileFilter, RtfHandler, TextHandler};
use folio::{
    DirectoryTarget, Error, ExportOptions, ExportOutcome, ExportService, Format, FormatHandler,
    Project, SaveTarget,
};
use tempfile::TempDir;

const NOVEL_JSON: &str = include_str!("fixtures/novel.json");

fn novel() -> Project {
    Project::from_json(NOVEL_JSON).expect("fixture should parse")
}

/// Save target that records every interaction.
#[derive(Default)]
struct RecordingTarget {
    answer: Option<PathBuf>,
    fail_writes: bool,
    prompts: Vec<(String, String, String)>,
    writes: Vec<(PathBuf, Vec<u8>)>,
}

impl SaveTarget for RecordingTarget {
    fn prompt_save_location(
        &mut self,
        suggested_name: &str,
        filter: FileFilter<'_>,
    ) -> Option<PathBuf> {
        self.prompts.push((
            suggested_name.to_string(),
            filter.label.to_string(),
            filter.extension.to_string(),
        ));
        self.answer.clone()
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.writes.push((path.to_path_buf(), bytes.to_vec()));
        Ok(())
    }
}

#[test]
fn test_unsupported_format_has_no_side_effects() {
    let mut target = RecordingTarget {
        answer: Some(PathBuf::from("/tmp/never")),
        ..Default::default()
    };
    let err = ExportService::new()
        .export_project(&novel(), &ExportOptions::new("pdf"), &mut target)
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat(ref f) if f == "pdf"));
    assert_eq!(err.to_string(), "Unsupported export format: pdf");
    assert!(target.prompts.is_empty());
    assert!(target.writes.is_empty());
}

#[test]
fn test_format_is_checked_before_project() {
    let mut project = novel();
    let json = project.to_json().unwrap().replace("scene-a1-1", "scene-b2-1");
    project = Project::from_json(&json).unwrap();

    let service = ExportService::new();
    let err = service
        .export_content(&project, &ExportOptions::new("pdf"))
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));

    let err = service
        .export_content(&project, &ExportOptions::new("txt"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidProject(_)));
}

#[test]
fn test_cancelled_save_is_not_an_error() {
    let mut target = RecordingTarget::default();
    let outcome = ExportService::new()
        .export_project(&novel(), &ExportOptions::new(Format::Rtf), &mut target)
        .unwrap();

    assert_eq!(outcome, ExportOutcome::Cancelled);
    assert_eq!(
        target.prompts,
        vec![(
            "the_lighthouse_keeper.rtf".to_string(),
            "RTF Files".to_string(),
            "rtf".to_string()
        )]
    );
    assert!(target.writes.is_empty());
}

#[test]
fn test_write_failure_carries_path() {
    let mut target = RecordingTarget {
        answer: Some(PathBuf::from("/books/out.txt")),
        fail_writes: true,
        ..Default::default()
    };
    let err = ExportService::new()
        .export_project(&novel(), &ExportOptions::new("txt"), &mut target)
        .unwrap_err();

    match err {
        Error::ExportFailed { path, source } => {
            assert_eq!(path, PathBuf::from("/books/out.txt"));
            assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_saved_bytes_match_rendered_payload() {
    let project = novel();
    let options = ExportOptions::new("epub");
    let mut target = RecordingTarget {
        answer: Some(PathBuf::from("book.epub")),
        ..Default::default()
    };
    let service = ExportService::new();
    let outcome = service.export_project(&project, &options, &mut target).unwrap();

    assert_eq!(outcome, ExportOutcome::Saved(PathBuf::from("book.epub")));
    let rendered = service.export_content(&project, &options).unwrap();
    assert_eq!(target.writes.len(), 1);
    assert_eq!(target.writes[0].1, rendered.as_bytes());
}

#[test]
fn test_directory_target_writes_files() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("exports");
    let mut target = DirectoryTarget::new(&out);
    let service = ExportService::new();
    let project = novel();

    for format in service.available_formats() {
        let outcome = service
            .export_project(&project, &ExportOptions::new(format), &mut target)
            .unwrap();
        let expected = out.join(format!("the_lighthouse_keeper.{format}"));
        assert_eq!(outcome, ExportOutcome::Saved(expected.clone()));
        assert!(std::fs::metadata(&expected).unwrap().len() > 0);
    }
}

#[test]
fn test_text_document_layout() {
    let project = novel();
    let options = ExportOptions::new("txt")
        .with_scene_titles(true)
        .with_word_counts(true);
    let payload = TextHandler::new().render(&project, &options).unwrap();
    let text = payload.as_text().unwrap();

    let expected_start = "The Lighthouse Keeper\n\n\
A short novel about weather & solitude.\n\n\
ARRIVAL\n\n\
The Boat\n\n\
Élise stepped onto the jetty & looked up.\n\n\
Words: 8\n\n\
STORM\n\n\
Night Watch\n\n";
    assert!(text.starts_with(expected_start), "got:\n{text}");
    assert!(text.contains("--- Midnight --- Wind tore at the **lamp room**. He held on."));
    assert!(text.ends_with("DEPARTURE\n\n"));
}

#[test]
fn test_text_description_without_title() {
    let project = novel();
    let options = ExportOptions::new("txt")
        .with_title(false)
        .with_chapter_titles(false);
    let payload = TextHandler::new().render(&project, &options).unwrap();
    let text = payload.as_text().unwrap();
    assert!(text.starts_with("A short novel about weather & solitude.\n\n"));
    assert!(!text.contains("ARRIVAL"));
}

#[test]
fn test_rtf_document_layout() {
    let project = novel();
    let payload = RtfHandler::new()
        .render(&project, &ExportOptions::new("rtf").with_word_counts(true))
        .unwrap();
    let rtf = payload.as_text().unwrap();

    assert!(rtf.starts_with("{\\rtf1\\ansi"));
    assert!(rtf.trim_end().ends_with('}'));
    assert!(rtf.contains("\\fs36"));
    assert!(rtf.contains("The Lighthouse Keeper"));
    assert!(rtf.contains("\\u201?lise"));
    assert!(rtf.contains("{\\i Words: 8}"));
    assert_eq!(
        rtf.matches('{').count() - rtf.matches("\\{").count(),
        rtf.matches('}').count() - rtf.matches("\\}").count()
    );
}

#[test]
fn test_options_from_json() {
    let options = ExportOptions::from_json(
        r#"{
            "format": "epub",
            "include_title": false,
            "include_scene_titles": true,
            "epub": { "template_name": "modern_compact", "metadata": { "author": "A. N. Other" } }
        }"#,
    )
    .unwrap();

    assert_eq!(options.format, Format::Epub);
    assert!(!options.include_title);
    assert!(options.include_chapter_titles);
    assert!(options.include_scene_titles);
    assert_eq!(options.template_name(), Some("modern_compact"));
    assert_eq!(
        options.metadata_overrides().and_then(|m| m.author.as_deref()),
        Some("A. N. Other")
    );
}
