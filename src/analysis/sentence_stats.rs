//! Sentence length, variety and openings.

use std::collections::BTreeMap;

use serde::Serialize;

use super::readability::Sentence;
use super::syllables::Span;
use super::{AnalysisConfig, Highlight, HighlightKind, Severity, round1};

/// Standard deviation of sentence length (in words) that reads as varied
/// without being erratic.
const IDEAL_LENGTH_DEVIATION: f64 = 7.0;
/// Consecutive sentences with the same opening word before it is flagged.
const REPEATED_STARTER_RUN: usize = 3;
/// Share of sentences an opening word may take before it counts as overused.
const OVERUSED_STARTER_SHARE: f64 = 0.15;

/// A sentence picked out by the statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SentenceSample {
    pub length: usize,
    pub position: usize,
    pub text: String,
}

/// Sentence length statistics, in words.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceStats {
    pub count: usize,
    pub avg_length: f64,
    pub min_length: usize,
    pub max_length: usize,
    pub std_deviation: f64,
    /// 0-100; highest when lengths vary by about seven words.
    pub variety_score: u32,
    pub longest: SentenceSample,
    pub shortest: SentenceSample,
    pub too_long_count: usize,
    pub too_short_count: usize,
}

/// How often sentences open with the same word.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterStats {
    pub starters: BTreeMap<String, usize>,
    pub most_common: Option<StarterShare>,
    /// 0-100; the share of sentences with a distinct opening word.
    pub variety_score: u32,
    pub overused: Vec<StarterShare>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarterShare {
    pub word: String,
    pub count: usize,
    pub percentage: u32,
}

/// Truncate to `max` characters, marking the cut with "...".
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn std_deviation(values: &[usize], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
    (sum / values.len() as f64).sqrt()
}

fn length_variety(lengths: &[usize], mean: f64) -> u32 {
    if lengths.len() < 3 {
        return 50;
    }
    let deviation = std_deviation(lengths, mean);
    (100.0 - (deviation - IDEAL_LENGTH_DEVIATION).abs() * 10.0)
        .max(0.0)
        .round() as u32
}

fn sample(sentence: &Sentence<'_>, max_chars: Option<usize>) -> SentenceSample {
    SentenceSample {
        length: sentence.word_count,
        position: sentence.start,
        text: match max_chars {
            Some(max) => truncate_chars(sentence.text, max),
            None => sentence.text.to_string(),
        },
    }
}

pub fn sentence_stats(sentences: &[Sentence<'_>], config: &AnalysisConfig) -> SentenceStats {
    if sentences.is_empty() {
        return SentenceStats::default();
    }

    let lengths: Vec<usize> = sentences.iter().map(|s| s.word_count).collect();
    let mean = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;

    // First of the longest and first of the shortest, in text order.
    let mut longest = &sentences[0];
    let mut shortest = &sentences[0];
    for sentence in sentences {
        if sentence.word_count > longest.word_count {
            longest = sentence;
        }
        if sentence.word_count < shortest.word_count {
            shortest = sentence;
        }
    }

    SentenceStats {
        count: sentences.len(),
        avg_length: round1(mean),
        min_length: shortest.word_count,
        max_length: longest.word_count,
        std_deviation: round1(std_deviation(&lengths, mean)),
        variety_score: length_variety(&lengths, mean),
        longest: sample(longest, Some(100)),
        shortest: sample(shortest, None),
        too_long_count: lengths
            .iter()
            .filter(|&&l| l > config.max_sentence_length)
            .count(),
        too_short_count: lengths
            .iter()
            .filter(|&&l| l > 0 && l < config.min_sentence_length)
            .count(),
    }
}

pub fn starter_stats(sentences: &[Sentence<'_>]) -> StarterStats {
    if sentences.is_empty() {
        return StarterStats::default();
    }

    let mut starters: BTreeMap<String, usize> = BTreeMap::new();
    // Ties for most common go to the word that opened a sentence first.
    let mut first_seen: Vec<&str> = Vec::new();
    for sentence in sentences.iter().filter(|s| !s.first_word.is_empty()) {
        let count = starters.entry(sentence.first_word.clone()).or_default();
        if *count == 0 {
            first_seen.push(&sentence.first_word);
        }
        *count += 1;
    }

    let total = sentences.len();
    let share = |word: &str, count: usize| StarterShare {
        word: word.to_string(),
        count,
        percentage: (count as f64 / total as f64 * 100.0).round() as u32,
    };

    let mut most_common: Option<StarterShare> = None;
    for word in &first_seen {
        let count = starters[*word];
        if most_common.as_ref().is_none_or(|m| count > m.count) {
            most_common = Some(share(*word, count));
        }
    }

    let threshold = (total as f64 * OVERUSED_STARTER_SHARE).max(2.0);
    let mut overused: Vec<StarterShare> = starters
        .iter()
        .filter(|&(_, &count)| count as f64 >= threshold)
        .map(|(word, &count)| share(word.as_str(), count))
        .collect();
    overused.sort_by(|a, b| b.count.cmp(&a.count));

    StarterStats {
        variety_score: ((starters.len() as f64 / total as f64) * 100.0)
            .min(100.0)
            .round() as u32,
        starters,
        most_common,
        overused,
    }
}

/// Highlights for over-long sentences and runs of sentences that open
/// with the same word.
pub fn sentence_highlights(sentences: &[Sentence<'_>], config: &AnalysisConfig) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    for sentence in sentences {
        if sentence.word_count > config.max_sentence_length {
            let span = Span {
                start: sentence.start,
                text: sentence.text,
            };
            let mut highlight = Highlight::new(
                HighlightKind::LongSentence,
                Severity::Warning,
                span,
                format!(
                    "Long sentence ({} words). Consider breaking it up",
                    sentence.word_count
                ),
                "Look for natural break points like conjunctions (and, but, or)",
            );
            highlight.text = truncate_chars(sentence.text, 50);
            highlights.push(highlight);
        }
    }

    for run in sentences.chunk_by(|a, b| a.first_word == b.first_word) {
        let starter = &run[0].first_word;
        if run.len() < REPEATED_STARTER_RUN || starter.is_empty() {
            continue;
        }
        for sentence in run {
            let span = Span {
                start: sentence.start,
                text: &sentence.text[..first_word_len(sentence.text)],
            };
            highlights.push(Highlight::new(
                HighlightKind::SentenceStarter,
                Severity::Info,
                span,
                format!(
                    "{} consecutive sentences start with \"{starter}\"",
                    run.len()
                ),
                "Vary your sentence openings for better flow",
            ));
        }
    }

    highlights
}

/// Byte length of the sentence up to the end of its first word.
fn first_word_len(text: &str) -> usize {
    super::syllables::words(text)
        .next()
        .map_or(0, |w| w.end())
}

/// Percentage of non-whitespace characters that sit inside double quotes.
pub fn dialogue_percentage(text: &str) -> u32 {
    let total = text.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return 0;
    }

    let mut inside = 0;
    let mut quoted: Option<char> = None;
    let mut run = 0;
    for c in text.chars() {
        match (quoted, c) {
            (None, '"') => {
                quoted = Some('"');
                run = 0;
            }
            (None, '\u{201C}') => {
                quoted = Some('\u{201D}');
                run = 0;
            }
            (Some(close), c) if c == close => {
                inside += run;
                quoted = None;
            }
            (Some(_), c) if !c.is_whitespace() => run += 1,
            _ => {}
        }
    }

    (inside as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use crate::analysis::readability::sentences;
    use super::*;

    #[test]
    fn test_sentence_stats() {
        let text = "One two three. One two three four five six seven. Go now.";
        let found = sentences(text);
        let stats = sentence_stats(&found, &AnalysisConfig::default());
        assert_eq!(stats.count, 3);
        assert_eq!(stats.avg_length, 4.0);
        assert_eq!(stats.min_length, 2);
        assert_eq!(stats.max_length, 7);
        assert_eq!(stats.longest.position, 15);
        assert_eq!(stats.shortest.text, "Go now.");
        assert_eq!(stats.too_short_count, 2);
        assert_eq!(stats.too_long_count, 0);
        // lengths 3, 7, 2 have a deviation of about 2.2 words
        assert_eq!(stats.std_deviation, 2.2);
        assert_eq!(stats.variety_score, 52);
    }

    #[test]
    fn test_sentence_stats_empty_and_short() {
        let config = AnalysisConfig::default();
        assert_eq!(sentence_stats(&[], &config), SentenceStats::default());
        let found = sentences("Just one sentence here.");
        assert_eq!(sentence_stats(&found, &config).variety_score, 50);
    }

    #[test]
    fn test_starter_stats() {
        let found = sentences("She ran. He hid. She waited. She slept. Then dawn.");
        let stats = starter_stats(&found);
        assert_eq!(stats.starters["she"], 3);
        let most = stats.most_common.unwrap();
        assert_eq!((most.word.as_str(), most.count, most.percentage), ("she", 3, 60));
        assert_eq!(stats.variety_score, 60);
        assert_eq!(stats.overused.len(), 1);
        assert_eq!(stats.overused[0].word, "she");
    }

    #[test]
    fn test_starter_ties_keep_first() {
        let found = sentences("Rain fell. Wind rose. Wind fell. Rain rose.");
        let stats = starter_stats(&found);
        assert_eq!(stats.most_common.unwrap().word, "rain");
    }

    #[test]
    fn test_sentence_highlights() {
        let config = AnalysisConfig {
            max_sentence_length: 4,
            ..AnalysisConfig::default()
        };
        let text = "She ran. She hid. She waited a very long time there. He slept.";
        let highlights = sentence_highlights(&sentences(text), &config);

        let long: Vec<_> = highlights
            .iter()
            .filter(|h| h.kind == HighlightKind::LongSentence)
            .collect();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].start, 18);

        let starters: Vec<_> = highlights
            .iter()
            .filter(|h| h.kind == HighlightKind::SentenceStarter)
            .map(|h| (h.start, h.text.as_str()))
            .collect();
        assert_eq!(starters, [(0, "She"), (9, "She"), (18, "She")]);
    }

    #[test]
    fn test_dialogue_percentage() {
        assert_eq!(dialogue_percentage(""), 0);
        assert_eq!(dialogue_percentage("No dialogue here."), 0);
        // 4 of 13 visible characters are quoted
        assert_eq!(dialogue_percentage("\"Stop\" he said."), 31);
        assert_eq!(dialogue_percentage("\u{201C}Stop\u{201D} he said."), 31);
        assert_eq!(dialogue_percentage("\"never closed"), 0);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("caf\u{e9} au lait", 4), "caf\u{e9}...");
    }
}
