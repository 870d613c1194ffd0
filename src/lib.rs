//! # folio
//!
//! Manuscript document model with plain text, RTF and EPUB export.
//!
//! ## Features
//!
//! - Project → chapter → scene hierarchy plus tagged notes, with explicit
//!   ordering and derived word counts
//! - Export to plain text, RTF and EPUB 3 through a pluggable handler registry
//! - EPUB templates that share one package generator, so manifest, spine and
//!   navigation always agree
//! - Daily word goals and writing streaks derived from project snapshots
//! - Readability scores and prose checks (adverbs, passive voice, repeated
//!   words, sentence variety) over scene text
//!
//! ## Quick Start
//!
//! ```
//! use folio::{ExportOptions, ExportService, Format, Project};
//!
//! let mut project = Project::new("The Long Night", "A short novel");
//! let chapter = project.add_chapter("Arrival");
//! let scene = project.add_scene(&chapter, "Station").unwrap();
//! project
//!     .set_scene_content(&chapter, &scene, "<p>The train was <em>late</em>.</p>")
//!     .unwrap();
//!
//! let service = ExportService::new();
//! let text = service
//!     .export_content(&project, &ExportOptions::new(Format::Text))
//!     .unwrap();
//! assert!(text.as_text().unwrap().contains("The train was *late*."));
//! ```
//!
//! ## Writing EPUB files
//!
//! ```no_run
//! use folio::{DirectoryTarget, ExportOptions, ExportService, Format, Project};
//!
//! let json = std::fs::read_to_string("novel.json")?;
//! let project = Project::from_json(&json)?;
//!
//! let options = ExportOptions::new(Format::Epub).with_template("classic_book");
//! let mut target = DirectoryTarget::new("out");
//! ExportService::new().export_project(&project, &options, &mut target)?;
//! # Ok::<(), folio::Error>(())
//! ```

pub mod analysis;
pub mod error;
pub mod export;
pub mod html;
pub mod model;
pub mod progress;

pub use analysis::{
    AnalysisConfig, Highlight, HighlightKind, ReadabilityScores, ReadingLevel, TextAnalysis,
    analyze_html, analyze_project, analyze_scene,
};
pub use error::{Error, Result};
pub use export::{
    DirectoryTarget, EpubMetadataOptions, EpubOptions, ExportOptions, ExportOutcome,
    ExportService, FileFilter, Format, FormatHandler, Payload, SaveTarget,
};
pub use model::{Chapter, Note, Project, ProjectChange, ProjectStats, Scene, SceneRef};
pub use progress::{
    ChartDataPoint, Clock, DailyProgress, FixedClock, ProgressCoordinator, ProgressGoals,
    ProgressState, ProgressStats, SystemClock,
};
