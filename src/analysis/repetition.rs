//! Word repetition, weak verbs and overused words.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::syllables::{Span, words};
use super::{AnalysisConfig, Highlight, HighlightKind, Severity, round1};

/// Verbs that tend to tell rather than show.
const WEAK_VERBS: &[&str] = &[
    "was", "were", "is", "are", "am", "be", "been", "being", "had", "has", "have", "do", "does",
    "did", "got", "get", "gets", "getting", "went", "go", "goes", "going", "came", "come", "comes",
    "coming", "made", "make", "makes", "making", "put", "puts", "putting", "took", "take", "takes",
    "taking", "felt", "feel", "feels", "feeling", "seemed", "seem", "seems", "seeming", "looked",
    "look", "looks", "looking", "said", "say", "says", "saying",
];

/// Function words and auxiliaries that are expected to repeat.
const COMMON_WORDS: &[&str] = &[
    "a", "an", "the", "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he",
    "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us",
    "our", "ours", "ourselves", "they", "them", "their", "theirs", "themselves", "who", "whom",
    "whose", "which", "what", "that", "this", "these", "those", "in", "on", "at", "to", "for", "of",
    "with", "by", "from", "up", "down", "into", "out", "over", "under", "through", "between",
    "after", "before", "about", "around", "against", "among", "and", "or", "but", "nor", "so",
    "yet", "if", "then", "than", "when", "while", "as", "because", "although", "though", "unless",
    "until", "since", "was", "were", "is", "are", "am", "be", "been", "being", "had", "has",
    "have", "do", "does", "did", "would", "could", "should", "might", "must", "will", "shall",
    "can", "may", "not", "no", "yes", "all", "some", "any", "each", "every", "both", "few", "more",
    "most", "other", "such", "only", "just", "also", "very", "too", "even", "still", "again",
    "now", "here", "there", "where", "how", "why", "said", "like",
];

/// Weak verbs are only flagged when they make up more than this share of
/// the words, and then only every third one.
const WEAK_VERB_DENSITY: f64 = 15.0;
const WEAK_VERB_SAMPLE: usize = 3;
const CONTEXT_WORDS: usize = 5;

/// A word used again within the repetition window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repetition {
    /// Lower-cased word.
    pub word: String,
    /// Byte offsets of every occurrence in the group.
    pub positions: Vec<usize>,
    /// Words between the first two occurrences.
    pub distance: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeakVerb {
    pub verb: String,
    pub position: usize,
    /// Up to five words either side, lower-cased.
    pub context: String,
}

/// A word and how much of the text it accounts for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordShare {
    pub word: String,
    pub count: usize,
    pub percentage: f64,
}

fn is_common(word: &str) -> bool {
    COMMON_WORDS.contains(&word)
}

/// Find distinctive words repeated within `config.repetition_distance` words.
///
/// Occurrences that chain within the window are grouped, so a word used
/// three times close together yields one [`Repetition`] with three
/// positions.
pub fn repetitions(text: &str, config: &AnalysisConfig) -> Vec<Repetition> {
    let mut found: Vec<Repetition> = Vec::new();
    let mut recent: HashMap<String, Vec<(usize, usize)>> = HashMap::new();

    for (index, span) in words(text).enumerate() {
        let word = span.text.to_lowercase();
        if word.chars().count() < config.repetition_min_word_length || is_common(&word) {
            continue;
        }

        let window = recent.entry(word.clone()).or_default();
        window.retain(|&(i, _)| index - i <= config.repetition_distance);

        for &(prev_index, prev_position) in window.iter() {
            let group = found
                .iter_mut()
                .find(|r| r.word == word && r.positions.contains(&prev_position));
            match group {
                Some(group) => {
                    if !group.positions.contains(&span.start) {
                        group.positions.push(span.start);
                    }
                }
                None => found.push(Repetition {
                    word: word.clone(),
                    positions: vec![prev_position, span.start],
                    distance: index - prev_index,
                }),
            }
        }

        window.push((index, span.start));
    }

    found
}

/// Every weak verb with its surrounding words.
pub fn weak_verbs(text: &str) -> Vec<WeakVerb> {
    let all: Vec<Span<'_>> = words(text).collect();
    let lower: Vec<String> = all.iter().map(|w| w.text.to_lowercase()).collect();

    lower
        .iter()
        .enumerate()
        .filter(|(_, word)| WEAK_VERBS.contains(&word.as_str()))
        .map(|(i, word)| {
            let from = i.saturating_sub(CONTEXT_WORDS);
            let to = (i + CONTEXT_WORDS + 1).min(lower.len());
            WeakVerb {
                verb: word.clone(),
                position: all[i].start,
                context: lower[from..to].join(" "),
            }
        })
        .collect()
}

/// Distinctive words used more than twice, most frequent first.
pub fn overused_words(text: &str, limit: usize) -> Vec<WordShare> {
    let mut total = 0;
    let mut frequency: BTreeMap<String, usize> = BTreeMap::new();
    for span in words(text) {
        total += 1;
        *frequency.entry(span.text.to_lowercase()).or_default() += 1;
    }

    let mut shares: Vec<WordShare> = frequency
        .into_iter()
        .filter(|(word, count)| *count > 2 && word.len() >= 4 && !is_common(word))
        .map(|(word, count)| WordShare {
            word,
            count,
            percentage: round1(count as f64 / total as f64 * 100.0),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares.truncate(limit);
    shares
}

/// Highlights for repeated words and, when they are dense, weak verbs.
pub fn word_highlights(text: &str, config: &AnalysisConfig) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    for repetition in repetitions(text, config) {
        for (i, &position) in repetition.positions.iter().enumerate() {
            let end = position + repetition.word.len();
            let span = Span {
                start: position,
                text: text.get(position..end).unwrap_or(repetition.word.as_str()),
            };
            let message = if i == 0 {
                format!(
                    "\"{}\" appears again within {} words",
                    repetition.word, repetition.distance
                )
            } else {
                format!(
                    "Repeated word: \"{}\", {} words from previous use",
                    repetition.word, repetition.distance
                )
            };
            highlights.push(Highlight::new(
                HighlightKind::Repetition,
                Severity::Info,
                span,
                message,
                "Consider using a synonym or restructuring the sentence",
            ));
        }
    }

    let weak = weak_verbs(text);
    let total = words(text).count();
    if total > 0 && weak.len() as f64 / total as f64 * 100.0 > WEAK_VERB_DENSITY {
        for verb in weak.iter().step_by(WEAK_VERB_SAMPLE) {
            let span = Span {
                start: verb.position,
                text: text
                    .get(verb.position..verb.position + verb.verb.len())
                    .unwrap_or(verb.verb.as_str()),
            };
            highlights.push(Highlight::new(
                HighlightKind::WeakVerb,
                Severity::Info,
                span,
                format!(
                    "Weak verb \"{}\": consider a more specific action verb",
                    verb.verb
                ),
                "Replace with a stronger, more descriptive verb",
            ));
        }
    }

    highlights
}
