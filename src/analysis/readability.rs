//! Sentence splitting and readability formulas.
//!
//! Scores follow the usual definitions:
//!
//! - Flesch reading ease: `206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)`
//! - Flesch-Kincaid grade: `0.39 * (words / sentences) + 11.8 * (syllables / words) - 15.59`
//! - Automated readability index: `4.71 * (letters / words) + 0.5 * (words / sentences) - 21.43`
//!
//! All three are rounded to one decimal. Reading ease is clamped to
//! `0..=100`, the grade levels to zero and above.

use serde::Serialize;

use super::round1;
use super::syllables::{count_total_syllables, words};

/// Words ending in a period that does not end the sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "vs", "etc", "i.e", "e.g", "st", "lt", "gen",
    "col", "sgt", "rev", "inc", "ltd", "corp", "co", "no", "vol", "ch", "pg", "fig",
];

/// Quotes and brackets that may close a sentence after its punctuation.
const CLOSERS: &[char] = &['"', '\'', '\u{201D}', '\u{2019}', ')'];
/// Quotes that may open the next sentence before its capital letter.
const OPENERS: &[char] = &['"', '\'', '\u{201C}', '\u{2018}', '('];

/// One sentence of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence<'a> {
    /// Byte offset of the sentence in the text.
    pub start: usize,
    /// The trimmed sentence, including its closing punctuation.
    pub text: &'a str,
    pub word_count: usize,
    /// First word, lower-cased; empty when the sentence has none.
    pub first_word: String,
}

impl Sentence<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Split text into sentences.
///
/// A sentence ends at a run of `.`, `!` or `?` (plus any closing quotes)
/// that is followed by whitespace and a capital letter, or by the end of
/// the text. Periods after common abbreviations, inside numbers and in
/// ellipses do not end a sentence.
///
/// ```
/// use folio::analysis::sentences;
///
/// let found: Vec<_> = sentences("Mr. Hale waited... \"Who's there?\" Nobody.")
///     .iter()
///     .map(|s| s.text)
///     .collect();
/// assert_eq!(found, ["Mr. Hale waited... \"Who's there?\"", "Nobody."]);
/// ```
pub fn sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut result = Vec::new();
    let mut segment_start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }

        let mut run_end = i + c.len_utf8();
        while let Some(&(j, next)) = iter.peek() {
            if !matches!(next, '.' | '!' | '?') {
                break;
            }
            run_end = j + next.len_utf8();
            iter.next();
        }
        let mut end = run_end;
        while let Some(&(j, next)) = iter.peek() {
            if !CLOSERS.contains(&next) {
                break;
            }
            end = j + next.len_utf8();
            iter.next();
        }

        let run = &text[i..run_end];
        if is_ellipsis(run) || (run == "." && follows_abbreviation(&text[..i])) {
            continue;
        }
        if !starts_next_sentence(&text[end..]) {
            continue;
        }

        push_sentence(text, segment_start, end, &mut result);
        segment_start = end;
    }

    push_sentence(text, segment_start, text.len(), &mut result);
    result
}

fn push_sentence<'a>(text: &'a str, from: usize, to: usize, out: &mut Vec<Sentence<'a>>) {
    let raw = &text[from..to];
    let trimmed = raw.trim();
    if !trimmed.chars().any(char::is_alphanumeric) {
        return;
    }

    let first_word = words(trimmed)
        .next()
        .map(|w| w.text.to_lowercase())
        .unwrap_or_default();
    out.push(Sentence {
        start: from + (raw.len() - raw.trim_start().len()),
        text: trimmed,
        word_count: words(trimmed).count(),
        first_word,
    });
}

fn is_ellipsis(run: &str) -> bool {
    run.len() >= 3 && run.bytes().all(|b| b == b'.')
}

fn follows_abbreviation(before: &str) -> bool {
    let token_start = before
        .bytes()
        .rposition(|b| !(b.is_ascii_alphabetic() || b == b'.'))
        .map_or(0, |i| i + 1);
    let token = before[token_start..].trim_start_matches('.');
    !token.is_empty() && ABBREVIATIONS.iter().any(|a| a.eq_ignore_ascii_case(token))
}

/// Whitespace then a capital letter (possibly quoted), or nothing but whitespace.
fn starts_next_sentence(rest: &str) -> bool {
    let next = rest.trim_start();
    if next.is_empty() {
        return true;
    }
    if next.len() == rest.len() {
        return false;
    }
    next.trim_start_matches(OPENERS)
        .chars()
        .next()
        .is_some_and(char::is_uppercase)
}

/// Coarse difficulty band derived from reading ease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingLevel {
    VeryEasy,
    Easy,
    Moderate,
    Difficult,
    VeryDifficult,
}

impl ReadingLevel {
    pub fn from_reading_ease(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Self::VeryEasy,
            s if s >= 60.0 => Self::Easy,
            s if s >= 40.0 => Self::Moderate,
            s if s >= 20.0 => Self::Difficult,
            _ => Self::VeryDifficult,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryEasy => "Very Easy",
            Self::Easy => "Easy",
            Self::Moderate => "Moderate",
            Self::Difficult => "Difficult",
            Self::VeryDifficult => "Very Difficult",
        }
    }
}

/// Readability of a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityScores {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    pub automated_readability_index: f64,
    pub level: ReadingLevel,
    /// One-line reading of the scores for display.
    pub interpretation: String,
}

pub fn flesch_reading_ease(words: usize, sentences: usize, syllables: usize) -> f64 {
    if words == 0 || sentences == 0 {
        return 0.0;
    }
    let words_per_sentence = words as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words as f64;
    round1(206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word).clamp(0.0, 100.0)
}

pub fn flesch_kincaid_grade(words: usize, sentences: usize, syllables: usize) -> f64 {
    if words == 0 || sentences == 0 {
        return 0.0;
    }
    let words_per_sentence = words as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words as f64;
    round1(0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59).max(0.0)
}

pub fn automated_readability_index(letters: usize, words: usize, sentences: usize) -> f64 {
    if words == 0 || sentences == 0 {
        return 0.0;
    }
    let letters_per_word = letters as f64 / words as f64;
    let words_per_sentence = words as f64 / sentences as f64;
    round1(4.71 * letters_per_word + 0.5 * words_per_sentence - 21.43).max(0.0)
}

/// Compute all readability scores for plain text.
///
/// A text without sentence punctuation counts as one sentence.
pub fn readability(text: &str) -> ReadabilityScores {
    let (word_count, letters) = words(text).fold((0, 0), |(n, letters), w| {
        (n + 1, letters + w.text.chars().filter(char::is_ascii_alphabetic).count())
    });
    let sentence_count = sentences(text).len().max(1);
    let syllables = count_total_syllables(text);

    let ease = flesch_reading_ease(word_count, sentence_count, syllables);
    let grade = flesch_kincaid_grade(word_count, sentence_count, syllables);
    let level = ReadingLevel::from_reading_ease(ease);

    ReadabilityScores {
        flesch_reading_ease: ease,
        flesch_kincaid_grade: grade,
        automated_readability_index: automated_readability_index(
            letters,
            word_count,
            sentence_count,
        ),
        level,
        interpretation: interpretation(level, grade),
    }
}

fn interpretation(level: ReadingLevel, grade: f64) -> String {
    let grade_text = match grade {
        g if g <= 5.0 => "5th grade or below".to_string(),
        g if g <= 8.0 => format!("{}th grade", g.round()),
        g if g <= 12.0 => format!("{}th grade (high school)", g.round()),
        _ => "college level".to_string(),
    };
    let (lead, advice) = match level {
        ReadingLevel::VeryEasy => ("Very easy to read", "Suitable for a wide audience."),
        ReadingLevel::Easy => ("Easy to read", "Good for most adult fiction."),
        ReadingLevel::Moderate => ("Moderate difficulty", "May challenge some readers."),
        ReadingLevel::Difficult => ("Difficult to read", "Dense prose or complex sentences."),
        ReadingLevel::VeryDifficult => ("Very difficult to read", "Consider simplifying."),
    };
    format!("{lead}. {grade_text}. {advice}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<&str> {
        sentences(text).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_split_basic() {
        assert_eq!(
            texts("The sea was calm. Was it? Yes!"),
            ["The sea was calm.", "Was it?", "Yes!"]
        );
        assert_eq!(texts("no punctuation here"), ["no punctuation here"]);
        assert!(texts("").is_empty());
        assert!(texts("  ...  ").is_empty());
    }

    #[test]
    fn test_split_requires_capital() {
        assert_eq!(
            texts("It cost 3.50 dollars. then more."),
            ["It cost 3.50 dollars. then more."]
        );
    }

    #[test]
    fn test_abbreviations_and_ellipsis() {
        assert_eq!(
            texts("Dr. Reyes met Mr. Hale. They talked... About nothing."),
            ["Dr. Reyes met Mr. Hale.", "They talked... About nothing."]
        );
        assert_eq!(texts("Bring tea, i.e. Earl Grey."), ["Bring tea, i.e. Earl Grey."]);
        assert_eq!(texts("Call the doctor. Now."), ["Call the doctor.", "Now."]);
    }

    #[test]
    fn test_dialogue_quotes() {
        let found = sentences("\u{201C}Run!\u{201D} She ran. \u{201C}Where?\u{201D}");
        let texts: Vec<_> = found.iter().map(|s| s.text).collect();
        assert_eq!(
            texts,
            ["\u{201C}Run!\u{201D}", "She ran.", "\u{201C}Where?\u{201D}"]
        );
        assert_eq!(found[1].first_word, "she");
    }

    #[test]
    fn test_sentence_offsets() {
        let text = "  One two.   Three four five!";
        let found = sentences(text);
        assert_eq!(found.len(), 2);
        for s in &found {
            assert_eq!(&text[s.start..s.end()], s.text);
        }
        assert_eq!(found[0].word_count, 2);
        assert_eq!(found[1].word_count, 3);
        assert_eq!(found[1].first_word, "three");
    }

    #[test]
    fn test_formulas() {
        // 10 words, 1 sentence, 10 syllables
        assert_eq!(flesch_reading_ease(10, 1, 10), 100.0);
        assert_eq!(flesch_reading_ease(20, 1, 30), 59.6);
        assert_eq!(flesch_kincaid_grade(10, 1, 10), 0.1);
        assert_eq!(automated_readability_index(40, 10, 1), 2.4);
        assert_eq!(flesch_reading_ease(0, 1, 0), 0.0);
        assert_eq!(flesch_kincaid_grade(5, 0, 5), 0.0);
    }

    #[test]
    fn test_readability_simple_text() {
        let scores = readability("The cat sat on the mat. The dog ran.");
        assert!(scores.flesch_reading_ease > 90.0);
        assert_eq!(scores.level, ReadingLevel::VeryEasy);
        assert_eq!(scores.flesch_kincaid_grade, 0.0);
        assert!(scores.interpretation.starts_with("Very easy to read. 5th grade or below."));
    }

    #[test]
    fn test_readability_dense_text() {
        let scores = readability(
            "Institutional considerations notwithstanding, the administrative \
             reorganization necessitated comprehensive evaluation of organizational \
             responsibilities.",
        );
        assert_eq!(scores.level, ReadingLevel::VeryDifficult);
        assert!(scores.flesch_kincaid_grade > 12.0);
        assert!(scores.automated_readability_index > 12.0);
    }

    #[test]
    fn test_readability_empty() {
        let scores = readability("");
        assert_eq!(scores.flesch_reading_ease, 0.0);
        assert_eq!(scores.automated_readability_index, 0.0);
        assert_eq!(scores.level, ReadingLevel::VeryDifficult);
    }

    #[test]
    fn test_level_bands() {
        assert_eq!(ReadingLevel::from_reading_ease(85.0), ReadingLevel::VeryEasy);
        assert_eq!(ReadingLevel::from_reading_ease(60.0), ReadingLevel::Easy);
        assert_eq!(ReadingLevel::from_reading_ease(45.5), ReadingLevel::Moderate);
        assert_eq!(ReadingLevel::from_reading_ease(20.0), ReadingLevel::Difficult);
        assert_eq!(ReadingLevel::from_reading_ease(3.0), ReadingLevel::VeryDifficult);
        assert_eq!(ReadingLevel::Moderate.label(), "Moderate");
    }
}
