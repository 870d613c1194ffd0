//! Readability and prose quality analysis of scene text.
//!
//! Analysis runs over the plain text of scene HTML
//! ([`crate::html::plain_text`]), where every tag acts as a word break.
//! Highlight and sentence positions are byte offsets into that plain text.
//!
//! ## Architecture
//!
//! ```text
//! scene HTML ──plain_text──► text ─┬─► syllables    words, syllable counts
//!                                  ├─► readability  sentences, Flesch, ARI
//!                                  ├─► sentence_stats  lengths, openings
//!                                  ├─► repetition   repeats, weak verbs
//!                                  └─► prose        adverbs, passive, ...
//!                                            │
//!                                            ▼
//!                                  TextAnalysis (score, issues, highlights)
//! ```
//!
//! ```
//! use folio::analysis::{AnalysisConfig, analyze_html};
//!
//! let analysis = analyze_html(
//!     "<p>The door was opened slowly.</p><p>Nobody came.</p>",
//!     &AnalysisConfig::default(),
//! );
//! assert_eq!(analysis.word_count, 7);
//! assert_eq!(analysis.sentences.count, 2);
//! assert_eq!(analysis.metrics.passive_voice_count, 1);
//! ```

use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::html::{collapse_whitespace, plain_text};
use crate::model::Project;

mod prose;
mod readability;
mod repetition;
mod sentence_stats;
mod syllables;

pub use prose::{adverbs, cliches, filter_words, passive_voice, prose_highlights, vague_words};
pub use readability::{
    ReadabilityScores, ReadingLevel, Sentence, automated_readability_index, flesch_kincaid_grade,
    flesch_reading_ease, readability, sentences,
};
pub use repetition::{
    Repetition, WeakVerb, WordShare, overused_words, repetitions, weak_verbs, word_highlights,
};
pub use sentence_stats::{
    SentenceSample, SentenceStats, StarterShare, StarterStats, dialogue_percentage,
    sentence_highlights, sentence_stats, starter_stats,
};
pub use syllables::{Span, Words, count_syllables, count_total_syllables, words};

/// Most issues reported in [`TextAnalysis::top_issues`].
const MAX_TOP_ISSUES: usize = 5;

/// Thresholds and switches for [`analyze_html`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Sentences shorter than this (in words) count as too short.
    pub min_sentence_length: usize,
    /// Sentences longer than this are highlighted.
    pub max_sentence_length: usize,
    /// Adverbs per hundred words before adverb use becomes an issue.
    pub max_adverb_percentage: f64,
    /// Passive constructions per hundred sentences before it becomes an issue.
    pub max_passive_percentage: f64,
    /// Window, in words, for repeated-word detection.
    pub repetition_distance: usize,
    /// Shorter words are never reported as repeated.
    pub repetition_min_word_length: usize,
    pub cliche_detection: bool,
    pub vague_word_detection: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_sentence_length: 5,
            max_sentence_length: 30,
            max_adverb_percentage: 1.5,
            max_passive_percentage: 10.0,
            repetition_distance: 50,
            repetition_min_word_length: 5,
            cliche_detection: true,
            vague_word_detection: true,
        }
    }
}

/// What a highlight or issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Adverb,
    PassiveVoice,
    FilterWord,
    Cliche,
    VagueWord,
    LongSentence,
    SentenceStarter,
    Repetition,
    WeakVerb,
}

impl HighlightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adverb => "adverb",
            Self::PassiveVoice => "passive_voice",
            Self::FilterWord => "filter_word",
            Self::Cliche => "cliche",
            Self::VagueWord => "vague_word",
            Self::LongSentence => "long_sentence",
            Self::SentenceStarter => "sentence_starter",
            Self::Repetition => "repetition",
            Self::WeakVerb => "weak_verb",
        }
    }
}

impl fmt::Display for HighlightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// A marked range of the analyzed text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// `<kind>-<n>`, numbered per kind in text order.
    pub id: String,
    pub kind: HighlightKind,
    pub severity: Severity,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub message: String,
    pub suggestion: &'static str,
}

impl Highlight {
    pub(crate) fn new(
        kind: HighlightKind,
        severity: Severity,
        span: Span<'_>,
        message: String,
        suggestion: &'static str,
    ) -> Self {
        Self {
            id: String::new(),
            kind,
            severity,
            start: span.start,
            end: span.end(),
            text: span.text.to_string(),
            message,
            suggestion,
        }
    }
}

/// Rates of the prose quality markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProseMetrics {
    /// Adverbs per hundred words.
    pub adverb_percentage: f64,
    pub adverb_count: usize,
    /// Passive constructions per hundred sentences.
    pub passive_voice_percentage: f64,
    pub passive_voice_count: usize,
    pub filter_word_count: usize,
    pub weak_verb_count: usize,
    pub cliche_count: usize,
    pub vague_word_count: usize,
    pub dialogue_percentage: u32,
}

/// A summarized problem, ranked for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: HighlightKind,
    pub severity: Severity,
    pub message: String,
    pub count: usize,
}

/// Full analysis of a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysis {
    pub word_count: usize,
    /// Characters of the text with whitespace runs collapsed.
    pub character_count: usize,
    pub readability: ReadabilityScores,
    pub sentences: SentenceStats,
    pub sentence_starters: StarterStats,
    pub metrics: ProseMetrics,
    /// Every highlight, ordered by position.
    pub highlights: Vec<Highlight>,
    /// 0-100 weighted quality score.
    pub overall_score: u32,
    pub summary: String,
    pub top_issues: Vec<Issue>,
}

/// Headline numbers for live feedback while typing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAnalysis {
    pub word_count: usize,
    pub sentence_count: usize,
    pub reading_ease: f64,
    pub level: ReadingLevel,
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Analyze scene HTML.
pub fn analyze_html(html: &str, config: &AnalysisConfig) -> TextAnalysis {
    analyze_text(&plain_text(html), config)
}

/// Analyze plain text.
pub fn analyze_text(text: &str, config: &AnalysisConfig) -> TextAnalysis {
    let word_count = words(text).count();
    let sentence_list = sentences(text);
    let readability = readability(text);
    let sentences = sentence_stats(&sentence_list, config);
    let sentence_starters = starter_stats(&sentence_list);

    let adverb_count = adverbs(text).len();
    let passive_voice_count = passive_voice(text).len();
    let metrics = ProseMetrics {
        adverb_percentage: percentage(adverb_count, word_count),
        adverb_count,
        passive_voice_percentage: percentage(passive_voice_count, sentences.count),
        passive_voice_count,
        filter_word_count: filter_words(text).len(),
        weak_verb_count: weak_verbs(text).len(),
        cliche_count: if config.cliche_detection {
            cliches(text).len()
        } else {
            0
        },
        vague_word_count: if config.vague_word_detection {
            vague_words(text).len()
        } else {
            0
        },
        dialogue_percentage: dialogue_percentage(text),
    };

    let mut highlights = prose_highlights(text, config);
    highlights.extend(sentence_highlights(&sentence_list, config));
    highlights.extend(word_highlights(text, config));
    highlights.sort_by_key(|h| h.start);
    number_highlights(&mut highlights);

    let overall_score = overall_score(
        readability.flesch_reading_ease,
        sentences.variety_score,
        sentence_starters.variety_score,
        &metrics,
        word_count,
    );
    let top_issues = top_issues(&highlights, &metrics, config);
    let summary = summary(overall_score, &top_issues, &readability);

    debug!(
        "analyzed {word_count} words in {} sentences: score {overall_score}, {} highlights",
        sentences.count,
        highlights.len()
    );

    TextAnalysis {
        word_count,
        character_count: collapse_whitespace(text).chars().count(),
        readability,
        sentences,
        sentence_starters,
        metrics,
        highlights,
        overall_score,
        summary,
        top_issues,
    }
}

/// Word count, sentence count and reading ease only.
pub fn quick_analyze(html: &str) -> QuickAnalysis {
    let text = plain_text(html);
    let scores = readability(&text);
    QuickAnalysis {
        word_count: words(&text).count(),
        sentence_count: sentences(&text).len(),
        reading_ease: scores.flesch_reading_ease,
        level: scores.level,
    }
}

/// Analyze one scene of a project.
pub fn analyze_scene(
    project: &Project,
    scene_id: &str,
    config: &AnalysisConfig,
) -> Result<TextAnalysis> {
    let found = project
        .find_scene(scene_id)
        .ok_or_else(|| Error::SceneNotFound(scene_id.to_string()))?;
    Ok(analyze_html(found.scene.content(), config))
}

/// Analyze the whole manuscript in reading order.
///
/// Scenes are joined with blank lines, so offsets refer to the joined text.
pub fn analyze_project(project: &Project, config: &AnalysisConfig) -> TextAnalysis {
    let text = project
        .scenes()
        .iter()
        .map(|found| plain_text(found.scene.content()))
        .collect::<Vec<_>>()
        .join("\n\n");
    analyze_text(&text, config)
}

fn number_highlights(highlights: &mut [Highlight]) {
    let mut counters: HashMap<HighlightKind, usize> = HashMap::new();
    for highlight in highlights {
        let n = counters.entry(highlight.kind).or_default();
        highlight.id = format!("{}-{n}", highlight.kind);
        *n += 1;
    }
}

/// Weighted score starting from 70: readability and variety add or take
/// away a few points, heavy adverb, passive and filter word use subtract.
fn overall_score(
    reading_ease: f64,
    length_variety: u32,
    starter_variety: u32,
    metrics: &ProseMetrics,
    word_count: usize,
) -> u32 {
    let mut score = 70.0;

    score += if (50.0..=80.0).contains(&reading_ease) {
        5.0
    } else {
        0.0
    };
    score += f64::from(length_variety) / 100.0 * 15.0 - 7.5;
    score += f64::from(starter_variety) / 100.0 * 10.0 - 5.0;

    if metrics.adverb_percentage > 2.0 {
        score -= ((metrics.adverb_percentage - 2.0) * 3.0).min(10.0);
    }
    if metrics.passive_voice_percentage > 15.0 {
        score -= ((metrics.passive_voice_percentage - 15.0) * 0.5).min(10.0);
    }
    let filter_percentage = percentage(metrics.filter_word_count, word_count.max(1));
    if filter_percentage > 1.0 {
        score -= ((filter_percentage - 1.0) * 2.0).min(5.0);
    }

    score.round().clamp(0.0, 100.0) as u32
}

fn top_issues(
    highlights: &[Highlight],
    metrics: &ProseMetrics,
    config: &AnalysisConfig,
) -> Vec<Issue> {
    let count_of = |kind: HighlightKind| highlights.iter().filter(|h| h.kind == kind).count();
    let graded = |count: usize, warn_above: usize| {
        if count > warn_above {
            Severity::Warning
        } else {
            Severity::Info
        }
    };
    let mut issues = Vec::new();

    if metrics.adverb_percentage > config.max_adverb_percentage {
        issues.push(Issue {
            kind: HighlightKind::Adverb,
            severity: if metrics.adverb_percentage > 3.0 {
                Severity::Warning
            } else {
                Severity::Info
            },
            message: format!("High adverb density ({:.1}%)", metrics.adverb_percentage),
            count: metrics.adverb_count,
        });
    }
    if metrics.passive_voice_percentage > config.max_passive_percentage {
        issues.push(Issue {
            kind: HighlightKind::PassiveVoice,
            severity: if metrics.passive_voice_percentage > 20.0 {
                Severity::Warning
            } else {
                Severity::Info
            },
            message: format!(
                "Frequent passive voice ({:.1}% of sentences)",
                metrics.passive_voice_percentage
            ),
            count: metrics.passive_voice_count,
        });
    }
    if metrics.filter_word_count > 5 {
        issues.push(Issue {
            kind: HighlightKind::FilterWord,
            severity: graded(metrics.filter_word_count, 15),
            message: format!("{} filter words found", metrics.filter_word_count),
            count: metrics.filter_word_count,
        });
    }

    let repeated = count_of(HighlightKind::Repetition);
    if repeated > 3 {
        issues.push(Issue {
            kind: HighlightKind::Repetition,
            severity: graded(repeated, 10),
            message: format!("{repeated} word repetitions detected"),
            count: repeated,
        });
    }
    let long = count_of(HighlightKind::LongSentence);
    if long > 2 {
        issues.push(Issue {
            kind: HighlightKind::LongSentence,
            severity: graded(long, 5),
            message: format!(
                "{long} sentences exceed {} words",
                config.max_sentence_length
            ),
            count: long,
        });
    }
    let starters = count_of(HighlightKind::SentenceStarter);
    if starters > 0 {
        issues.push(Issue {
            kind: HighlightKind::SentenceStarter,
            severity: Severity::Info,
            message: "Some sentence starters are repetitive".to_string(),
            count: starters,
        });
    }
    if metrics.cliche_count > 0 {
        let plural = if metrics.cliche_count > 1 { "s" } else { "" };
        issues.push(Issue {
            kind: HighlightKind::Cliche,
            severity: Severity::Warning,
            message: format!("{} cliché{plural} detected", metrics.cliche_count),
            count: metrics.cliche_count,
        });
    }

    // Warnings first, then by count.
    issues.sort_by(|a, b| {
        let rank = |s: Severity| matches!(s, Severity::Info);
        rank(a.severity)
            .cmp(&rank(b.severity))
            .then(b.count.cmp(&a.count))
    });
    issues.truncate(MAX_TOP_ISSUES);
    issues
}

fn summary(score: u32, issues: &[Issue], readability: &ReadabilityScores) -> String {
    let quality = match score {
        80.. => "Excellent prose quality",
        60..=79 => "Good prose quality",
        40..=59 => "Fair prose quality",
        _ => "Prose needs attention",
    };
    let reading = readability
        .interpretation
        .split('.')
        .next()
        .unwrap_or_default();

    let mut parts = vec![quality.to_string(), format!("{reading} readability")];
    if let Some(issue) = issues.first().filter(|i| i.severity == Severity::Warning) {
        parts.push(issue.message.to_lowercase());
    }
    format!("{}.", parts.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = "<p>The lighthouse stood on the rocks. The keeper climbed the stairs \
        slowly. The lamp was cleaned at dusk.</p><p>Wind came off the sea. Mira watched \
        the lighthouse from the jetty.</p>";

    #[test]
    fn test_analyze_html_counts() {
        let analysis = analyze_html(SCENE, &AnalysisConfig::default());
        assert_eq!(analysis.word_count, 30);
        assert_eq!(analysis.sentences.count, 5);
        assert_eq!(analysis.metrics.adverb_count, 1);
        assert_eq!(analysis.metrics.passive_voice_count, 1);
        assert_eq!(analysis.metrics.passive_voice_percentage, 20.0);
        assert!(analysis.readability.flesch_reading_ease > 70.0);
        assert!(analysis.overall_score <= 100);
    }

    #[test]
    fn test_highlights_sorted_and_numbered() {
        let analysis = analyze_html(SCENE, &AnalysisConfig::default());
        let starts: Vec<_> = analysis.highlights.iter().map(|h| h.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);

        let text = plain_text(SCENE);
        for h in &analysis.highlights {
            assert!(h.id.starts_with(h.kind.as_str()), "{}", h.id);
            assert!(h.end <= text.len());
        }
        let passive = analysis
            .highlights
            .iter()
            .find(|h| h.kind == HighlightKind::PassiveVoice)
            .unwrap();
        assert_eq!(passive.id, "passive_voice-0");
        assert_eq!(&text[passive.start..passive.end], "was cleaned");
        assert!(
            analysis
                .highlights
                .iter()
                .any(|h| h.kind == HighlightKind::Repetition && h.text == "lighthouse")
        );
    }

    #[test]
    fn test_tags_separate_sentences_and_words() {
        let analysis = analyze_html("<p>One.</p><p>Two.</p>", &AnalysisConfig::default());
        assert_eq!(analysis.word_count, 2);
        assert_eq!(analysis.sentences.count, 2);
        assert_eq!(analysis.character_count, "One. Two.".len());
    }

    #[test]
    fn test_empty_text() {
        let analysis = analyze_html("", &AnalysisConfig::default());
        assert_eq!(analysis.word_count, 0);
        assert_eq!(analysis.sentences, SentenceStats::default());
        assert!(analysis.highlights.is_empty());
        assert!(analysis.top_issues.is_empty());
        assert_eq!(analysis.metrics.adverb_percentage, 0.0);
        assert!(analysis.summary.ends_with("Very difficult to read readability."));
    }

    #[test]
    fn test_top_issues_rank_warnings_first() {
        let text = "Once upon a time the door was opened. It was really very quietly \
                    closed. The wind was suddenly heard.";
        let analysis = analyze_text(text, &AnalysisConfig::default());
        let kinds: Vec<_> = analysis.top_issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds[0], HighlightKind::Adverb);
        assert!(kinds.contains(&HighlightKind::PassiveVoice));
        assert!(kinds.contains(&HighlightKind::Cliche));
        assert!(
            analysis
                .top_issues
                .windows(2)
                .all(|w| !(w[0].severity == Severity::Info && w[1].severity == Severity::Warning))
        );
        assert!(analysis.summary.contains("high adverb density"));
    }

    #[test]
    fn test_disabled_checks_are_not_counted() {
        let config = AnalysisConfig {
            cliche_detection: false,
            vague_word_detection: false,
            ..AnalysisConfig::default()
        };
        let analysis = analyze_text("Once upon a time, a nice thing happened.", &config);
        assert_eq!(analysis.metrics.cliche_count, 0);
        assert_eq!(analysis.metrics.vague_word_count, 0);
        assert!(analysis.top_issues.iter().all(|i| i.kind != HighlightKind::Cliche));
    }

    #[test]
    fn test_quick_analyze() {
        let quick = quick_analyze("<p>The cat sat.</p><p>It slept.</p>");
        assert_eq!(quick.word_count, 5);
        assert_eq!(quick.sentence_count, 2);
        assert_eq!(quick.level, ReadingLevel::VeryEasy);
    }

    #[test]
    fn test_analyze_scene_and_project() {
        let mut project = Project::new("Keeper", "");
        let chapter = project.add_chapter("One");
        let first = project.add_scene(&chapter, "Dusk").unwrap();
        let second = project.add_scene(&chapter, "Night").unwrap();
        project
            .set_scene_content(&chapter, &first, "<p>The lamp was lit.</p>")
            .unwrap();
        project
            .set_scene_content(&chapter, &second, "<p>Ships passed the rocks.</p>")
            .unwrap();

        let config = AnalysisConfig::default();
        let scene = analyze_scene(&project, &first, &config).unwrap();
        assert_eq!(scene.word_count, 4);
        assert!(matches!(
            analyze_scene(&project, "missing", &config),
            Err(Error::SceneNotFound(_))
        ));

        let whole = analyze_project(&project, &config);
        assert_eq!(whole.word_count, 8);
        assert_eq!(whole.sentences.count, 2);
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"maxSentenceLength": 20, "clicheDetection": false}"#)
                .unwrap();
        assert_eq!(config.max_sentence_length, 20);
        assert!(!config.cliche_detection);
        assert_eq!(config.repetition_distance, 50);
    }
}
