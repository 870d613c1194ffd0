//! folio - Export manuscripts to text, RTF and EPUB

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};

use folio::export::EpubHandler;
use folio::export::epub::inspect_epub;
use folio::{
    AnalysisConfig, DirectoryTarget, EpubMetadataOptions, ExportOptions, ExportOutcome,
    ExportService, Format, Project, ProgressCoordinator, ProgressState, TextAnalysis,
    analyze_project, analyze_scene,
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Export manuscripts to text, RTF and EPUB", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio export novel.json -f epub          Write novel.epub to the current directory
    folio export novel.json -f txt -o out    Write a plain text manuscript into out/
    folio info novel.epub                    Show the package structure of an EPUB
    folio analyze novel.json --json          Print the prose analysis as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show debug output (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Export a project file
    Export {
        /// Project JSON file
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Output format (txt, rtf, epub)
        #[arg(short, long)]
        format: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// EPUB template
        #[arg(long)]
        template: Option<String>,

        /// EPUB author
        #[arg(long)]
        author: Option<String>,

        /// EPUB language code
        #[arg(long)]
        language: Option<String>,

        /// Leave out the title
        #[arg(long)]
        no_title: bool,

        /// Leave out chapter titles
        #[arg(long)]
        no_chapter_titles: bool,

        /// Include scene titles
        #[arg(long)]
        scene_titles: bool,

        /// Include per-scene word counts
        #[arg(long)]
        word_counts: bool,

        /// Export options JSON; flags override its values
        #[arg(long, value_name = "FILE")]
        options: Option<PathBuf>,
    },

    /// List export formats
    Formats,

    /// List EPUB templates
    Templates,

    /// Show the package structure of an EPUB file
    Info {
        #[arg(value_name = "EPUB")]
        epub: PathBuf,
    },

    /// Show project statistics and writing progress
    Stats {
        /// Project JSON file
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Progress state JSON file; updated with today's progress
        #[arg(long, value_name = "FILE")]
        progress: Option<PathBuf>,
    },

    /// Analyze readability and prose quality
    Analyze {
        /// Project JSON file
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Analyze a single scene instead of the whole manuscript
        #[arg(long, value_name = "ID")]
        scene: Option<String>,

        /// Analysis settings JSON
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _logger = init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Export {
            project,
            format,
            output,
            template,
            author,
            language,
            no_title,
            no_chapter_titles,
            scene_titles,
            word_counts,
            options,
        } => {
            let flags = ExportFlags {
                format,
                template,
                author,
                language,
                no_title,
                no_chapter_titles,
                scene_titles,
                word_counts,
            };
            export(&project, &output, options.as_deref(), flags, cli.quiet)
        }
        Command::Formats => {
            for format in ExportService::new().available_formats() {
                println!("{format}");
            }
            Ok(())
        }
        Command::Templates => {
            list_templates();
            Ok(())
        }
        Command::Info { epub } => show_info(&epub),
        Command::Stats { project, progress } => show_stats(&project, progress.as_deref()),
        Command::Analyze {
            project,
            scene,
            config,
            json,
        } => analyze(&project, scene.as_deref(), config.as_deref(), json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over the flags when set.
fn init_logging(verbose: u8, quiet: bool) -> Option<LoggerHandle> {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    match Logger::try_with_env_or_str(level).and_then(|logger| logger.log_to_stderr().start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("warning: logging disabled: {e}");
            None
        }
    }
}

struct ExportFlags {
    format: Option<String>,
    template: Option<String>,
    author: Option<String>,
    language: Option<String>,
    no_title: bool,
    no_chapter_titles: bool,
    scene_titles: bool,
    word_counts: bool,
}

fn load_project(path: &Path) -> folio::Result<Project> {
    Project::from_json(&fs::read_to_string(path)?)
}

fn export_options(file: Option<&Path>, flags: ExportFlags) -> folio::Result<ExportOptions> {
    let mut options = match file {
        Some(path) => ExportOptions::from_json(&fs::read_to_string(path)?)?,
        None => ExportOptions::default(),
    };

    if let Some(format) = flags.format {
        options.format = Format::from(format);
    }
    if flags.no_title {
        options.include_title = false;
    }
    if flags.no_chapter_titles {
        options.include_chapter_titles = false;
    }
    if flags.scene_titles {
        options.include_scene_titles = true;
    }
    if flags.word_counts {
        options.include_word_count = true;
    }
    if let Some(template) = flags.template {
        options = options.with_template(template);
    }
    if flags.author.is_some() || flags.language.is_some() {
        let mut metadata = options
            .metadata_overrides()
            .cloned()
            .unwrap_or_else(EpubMetadataOptions::new);
        if let Some(author) = flags.author {
            metadata = metadata.with_author(author);
        }
        if let Some(language) = flags.language {
            metadata = metadata.with_language(language);
        }
        options = options.with_metadata(metadata);
    }

    Ok(options)
}

fn export(
    project_path: &Path,
    output: &Path,
    options_file: Option<&Path>,
    flags: ExportFlags,
    quiet: bool,
) -> folio::Result<()> {
    let project = load_project(project_path)?;
    let options = export_options(options_file, flags)?;

    let mut target = DirectoryTarget::new(output);
    match ExportService::new().export_project(&project, &options, &mut target)? {
        ExportOutcome::Saved(path) => {
            if !quiet {
                println!("Wrote {}", path.display());
            }
        }
        ExportOutcome::Cancelled => {
            if !quiet {
                println!("Export cancelled");
            }
        }
    }
    Ok(())
}

fn list_templates() {
    for template in EpubHandler::new().template_definitions() {
        let marker = if template.is_default { " (default)" } else { "" };
        println!("{}{marker}", template.id);
        println!("    {}: {}", template.name, template.description);
    }
}

fn show_info(path: &Path) -> folio::Result<()> {
    let summary = inspect_epub(&fs::read(path)?)?;
    let meta = &summary.metadata;

    println!("File: {}", path.display());
    println!("Title: {}", meta.title);
    if !meta.creators.is_empty() {
        println!("Authors: {}", meta.creators.join(", "));
    }
    if !meta.language.is_empty() {
        println!("Language: {}", meta.language);
    }
    println!("Identifier: {}", meta.identifier);
    if let Some(ref publisher) = meta.publisher {
        println!("Publisher: {publisher}");
    }
    if let Some(ref desc) = meta.description {
        let desc = desc.trim();
        match desc.char_indices().nth(200) {
            Some((cut, _)) => println!("Description: {}...", &desc[..cut]),
            None => println!("Description: {desc}"),
        }
    }
    if !meta.subjects.is_empty() {
        println!("Subjects: {}", meta.subjects.join(", "));
    }
    println!("Manifest items: {}", summary.manifest.len());
    println!("Spine: {}", summary.spine.join(" "));
    println!("TOC entries:");
    for entry in &summary.nav {
        println!("    {} -> {}", entry.label, entry.href);
    }

    let missing = summary.missing_files();
    if !missing.is_empty() {
        println!("Missing files: {}", missing.join(", "));
    }
    if !summary.mimetype_first {
        println!("Warning: mimetype is not the first stored entry");
    }

    Ok(())
}

fn show_stats(project_path: &Path, progress_path: Option<&Path>) -> folio::Result<()> {
    let project = load_project(project_path)?;
    let stats = project.stats();

    println!("Project: {}", project.title());
    println!("Chapters: {}", stats.total_chapters);
    println!("Scenes: {}", stats.total_scenes);
    println!("Words: {}", stats.total_words);
    println!("Characters: {}", stats.total_characters);

    let Some(progress_path) = progress_path else {
        return Ok(());
    };

    let state: ProgressState = match fs::read_to_string(progress_path) {
        Ok(json) => serde_json::from_str(&json)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProgressState::default(),
        Err(e) => return Err(e.into()),
    };
    let mut coordinator = ProgressCoordinator::new().with_state(state);
    let today = coordinator.sync_with_project(&project).clone();
    let progress = coordinator.stats(&project);

    println!(
        "Today: {} / {} words ({}%)",
        today.words_written,
        coordinator.daily_goal(),
        coordinator.todays_percentage()
    );
    println!("Current streak: {} days", progress.current_streak);
    println!("Longest streak: {} days", progress.longest_streak);
    println!("Active days: {}", progress.total_days_active);
    println!("Average words per active day: {}", progress.average_daily_words);
    if let Some(date) = progress.estimated_completion_date {
        println!("Estimated completion: {date}");
    }

    fs::write(progress_path, serde_json::to_string_pretty(coordinator.state())?)?;
    Ok(())
}

fn analyze(
    project_path: &Path,
    scene: Option<&str>,
    config_path: Option<&Path>,
    json: bool,
) -> folio::Result<()> {
    let project = load_project(project_path)?;
    let config: AnalysisConfig = match config_path {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    let analysis = match scene {
        Some(id) => analyze_scene(&project, id, &config)?,
        None => analyze_project(&project, &config),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

fn print_analysis(analysis: &TextAnalysis) {
    let scores = &analysis.readability;
    let sentences = &analysis.sentences;

    println!("Words: {}", analysis.word_count);
    println!("Sentences: {}", sentences.count);
    println!(
        "Reading ease: {:.1} ({})",
        scores.flesch_reading_ease,
        scores.level.label()
    );
    println!("Grade level: {:.1}", scores.flesch_kincaid_grade);
    println!("Readability index: {:.1}", scores.automated_readability_index);
    println!(
        "Sentence length: {:.1} avg, {}-{} words, variety {}",
        sentences.avg_length, sentences.min_length, sentences.max_length, sentences.variety_score
    );
    println!("Dialogue: {}%", analysis.metrics.dialogue_percentage);
    println!("Score: {}/100", analysis.overall_score);
    if !analysis.top_issues.is_empty() {
        println!("Issues:");
        for issue in &analysis.top_issues {
            println!("    [{}] {}", issue.kind, issue.message);
        }
    }
    println!("{}", analysis.summary);
}
