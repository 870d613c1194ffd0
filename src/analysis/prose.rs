//! Prose quality checks: adverbs, passive voice, filter words, clichés and
//! vague words.
//!
//! All matching is case-insensitive and on whole words.

use memchr::memmem;

use super::syllables::{Span, words};
use super::{AnalysisConfig, Highlight, HighlightKind, Severity};
use crate::html::collapse_whitespace;

const FILTER_WORDS: &[&str] = &[
    "just", "really", "very", "quite", "rather", "somewhat", "actually", "basically", "literally",
    "simply", "totally", "completely", "absolutely", "definitely", "certainly", "probably",
    "possibly", "maybe", "perhaps", "almost", "nearly", "hardly", "barely", "slightly", "kind of",
    "sort of", "a bit", "a little", "in order to", "start to", "begin to", "seem to", "appear to",
    "tend to",
];

const CLICHES: &[&str] = &[
    "it was a dark and stormy night",
    "once upon a time",
    "in the nick of time",
    "all of a sudden",
    "at the end of the day",
    "the fact of the matter",
    "when all was said and done",
    "for all intents and purposes",
    "each and every",
    "first and foremost",
    "few and far between",
    "last but not least",
    "only time will tell",
    "time will tell",
    "easier said than done",
    "better late than never",
    "actions speak louder than words",
    "a needle in a haystack",
    "avoid like the plague",
    "beat around the bush",
    "bite the bullet",
    "break the ice",
    "burning the midnight oil",
    "crystal clear",
    "dead as a doornail",
    "fit as a fiddle",
    "heart of gold",
    "in the blink of an eye",
    "let the cat out of the bag",
    "once in a blue moon",
    "read between the lines",
    "scared to death",
    "sick and tired",
    "think outside the box",
    "tip of the iceberg",
    "under the weather",
    "white as a ghost",
    "white as a sheet",
    "her heart skipped a beat",
    "his heart pounded",
    "butterflies in her stomach",
    "a chill ran down his spine",
    "goosebumps rose on her skin",
    "he let out a breath he didn't know he was holding",
    "she let out a breath she didn't know she was holding",
    "time stood still",
    "the world fell away",
    "his blood ran cold",
    "her blood ran cold",
];

const VAGUE_WORDS: &[&str] = &[
    "thing", "things", "stuff", "something", "anything", "everything", "nothing", "someone",
    "anyone", "everyone", "somewhere", "anywhere", "everywhere", "somehow", "anyway", "whatever",
    "whenever", "wherever", "nice", "good", "bad", "big", "small", "great", "interesting",
    "beautiful", "ugly", "amazing", "awesome", "terrible", "horrible", "wonderful", "fantastic",
    "incredible",
];

/// Forms of "be" and "get" that start a passive construction.
const PASSIVE_AUXILIARIES: &[&str] = &[
    "was", "were", "is", "are", "been", "being", "be", "am", "get", "gets", "got", "getting",
];

const IRREGULAR_PARTICIPLES: &[&str] = &[
    "been", "done", "gone", "seen", "taken", "given", "known", "made", "found", "told", "left",
    "felt", "brought", "thought", "bought", "caught", "taught", "sought", "written", "driven",
    "eaten", "fallen", "forgotten", "chosen", "spoken", "stolen", "broken", "frozen", "hidden",
    "bitten", "beaten", "shaken", "woken", "worn", "torn", "sworn", "born", "borne", "drawn",
    "grown", "shown", "thrown", "blown", "flown", "slain", "lain", "paid", "said", "sent", "spent",
    "built", "burnt", "dealt", "dreamt", "dwelt", "kept", "knelt", "leant", "leapt", "learnt",
    "meant", "slept", "smelt", "spelt", "spilt", "swept", "wept", "lost", "shot", "hurt", "cut",
    "put", "shut", "hit", "let", "set", "rid", "spread", "read", "held", "hung", "dug", "stuck",
    "struck", "stung", "swung", "clung", "flung", "slung", "sprung", "sung", "rung", "begun",
    "drunk", "shrunk", "sunk", "swum", "run", "won",
];

/// Words ending in -ly that are not adverbs.
const LY_EXCEPTIONS: &[&str] = &[
    "only", "early", "daily", "weekly", "monthly", "yearly", "holy", "lonely", "lovely", "ugly",
    "likely", "unlikely", "friendly", "family", "elderly", "orderly", "silly", "belly", "bully",
    "jelly", "jolly", "folly", "rally", "tally", "gully", "fully", "hilly", "chilly", "frilly",
    "smelly", "wooly", "curly", "burly", "surly", "pearly", "gnarly", "italy", "assembly",
    "butterfly", "dragonfly", "firefly", "fly", "july", "reply", "supply", "apply", "multiply",
    "comply", "imply", "rely",
];

/// Adverbs without the -ly ending.
const PLAIN_ADVERBS: &[&str] = &[
    "very", "quite", "rather", "almost", "already", "also", "always", "never", "ever", "often",
    "seldom", "sometimes", "soon", "still", "yet", "just", "even", "too", "well", "fast", "hard",
    "late", "near", "far", "long", "low", "high", "straight", "right", "wrong", "much", "little",
    "enough", "anywhere", "everywhere", "nowhere", "somewhere", "somehow", "anyway", "perhaps",
    "maybe",
];

fn is_ly_adverb(word: &str) -> bool {
    word.len() > 2 && word.ends_with("ly") && !LY_EXCEPTIONS.contains(&word)
}

fn is_participle(word: &str) -> bool {
    IRREGULAR_PARTICIPLES.contains(&word)
        || (word.len() > 3 && (word.ends_with("ed") || word.ends_with("en")))
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whole-word occurrences of a lower-case phrase.
///
/// `lower` must be `text.to_ascii_lowercase()`, which keeps byte offsets
/// identical to `text`.
fn find_phrase<'a>(text: &'a str, lower: &str, phrase: &str) -> Vec<Span<'a>> {
    let bytes = lower.as_bytes();
    memmem::find_iter(bytes, phrase.as_bytes())
        .filter(|&start| {
            let end = start + phrase.len();
            let before_ok = start == 0 || !is_word_byte(bytes[start - 1]);
            let after_ok = bytes.get(end).is_none_or(|&b| !is_word_byte(b));
            before_ok && after_ok
        })
        .map(|start| Span {
            start,
            text: &text[start..start + phrase.len()],
        })
        .collect()
}

fn find_all<'a>(text: &'a str, phrases: &[&str]) -> Vec<Span<'a>> {
    let lower = text.to_ascii_lowercase();
    let mut found: Vec<Span<'a>> = phrases
        .iter()
        .flat_map(|phrase| find_phrase(text, &lower, phrase))
        .collect();
    found.sort_by_key(|span| span.start);
    found
}

/// Words ending in -ly (minus known non-adverbs) and common plain adverbs.
pub fn adverbs(text: &str) -> Vec<Span<'_>> {
    words(text)
        .filter(|w| {
            let lower = w.text.to_ascii_lowercase();
            is_ly_adverb(&lower) || PLAIN_ADVERBS.contains(&lower.as_str())
        })
        .collect()
}

/// A form of "be" or "get", optionally an -ly adverb, then a past
/// participle, with only whitespace between them.
///
/// ```
/// use folio::analysis::passive_voice;
///
/// let found = passive_voice("The door was quickly opened. She opened it.");
/// assert_eq!(found[0].text, "was quickly opened");
/// assert_eq!(found.len(), 1);
/// ```
pub fn passive_voice(text: &str) -> Vec<Span<'_>> {
    let all: Vec<Span<'_>> = words(text).collect();
    let lower: Vec<String> = all.iter().map(|w| w.text.to_ascii_lowercase()).collect();
    let adjacent = |a: usize, b: usize| {
        b < all.len() && {
            let gap = &text[all[a].end()..all[b].start];
            !gap.is_empty() && gap.chars().all(char::is_whitespace)
        }
    };

    let mut found = Vec::new();
    for i in 0..all.len() {
        if !PASSIVE_AUXILIARIES.contains(&lower[i].as_str()) || !adjacent(i, i + 1) {
            continue;
        }
        let next = i + 1;
        let last = if is_ly_adverb(&lower[next]) && adjacent(next, next + 1) {
            next + 1
        } else {
            next
        };
        if is_participle(&lower[last]) {
            found.push(Span {
                start: all[i].start,
                text: &text[all[i].start..all[last].end()],
            });
        }
    }
    found
}

/// Filter words and phrases in text order.
pub fn filter_words(text: &str) -> Vec<Span<'_>> {
    find_all(text, FILTER_WORDS)
}

pub fn cliches(text: &str) -> Vec<Span<'_>> {
    find_all(text, CLICHES)
}

pub fn vague_words(text: &str) -> Vec<Span<'_>> {
    find_all(text, VAGUE_WORDS)
}

/// Highlights for every prose quality check enabled in `config`.
pub fn prose_highlights(text: &str, config: &AnalysisConfig) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    for span in adverbs(text) {
        highlights.push(Highlight::new(
            HighlightKind::Adverb,
            Severity::Info,
            span,
            format!("Adverb: \"{}\". Consider a stronger verb instead", span.text),
            "Try replacing with a more specific verb",
        ));
    }
    for span in passive_voice(text) {
        highlights.push(Highlight::new(
            HighlightKind::PassiveVoice,
            Severity::Warning,
            span,
            format!(
                "Passive voice: \"{}\". Active voice is often stronger",
                collapse_whitespace(span.text)
            ),
            "Consider rewriting in active voice",
        ));
    }
    for span in filter_words(text) {
        highlights.push(Highlight::new(
            HighlightKind::FilterWord,
            Severity::Info,
            span,
            format!(
                "Filter word: \"{}\". Often unnecessary and weakens prose",
                span.text
            ),
            "Consider removing or finding a stronger alternative",
        ));
    }
    if config.cliche_detection {
        for span in cliches(text) {
            highlights.push(Highlight::new(
                HighlightKind::Cliche,
                Severity::Warning,
                span,
                format!("Cliché: \"{}\". Consider a more original expression", span.text),
                "Try expressing this idea in your own way",
            ));
        }
    }
    if config.vague_word_detection {
        for span in vague_words(text) {
            highlights.push(Highlight::new(
                HighlightKind::VagueWord,
                Severity::Info,
                span,
                format!("Vague word: \"{}\". Could be more specific", span.text),
                "Consider using a more precise word",
            ));
        }
    }

    highlights.sort_by_key(|h| h.start);
    highlights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(spans: &[Span<'a>]) -> Vec<&'a str> {
        spans.iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_adverbs() {
        let found = adverbs("She quickly and quietly left the lovely family home. He never ran.");
        assert_eq!(texts(&found), ["quickly", "quietly", "never"]);
        assert_eq!(found[0].start, 4);
    }

    #[test]
    fn test_passive_voice() {
        let found = passive_voice("The letters were written. He is being watched. It was dark.");
        assert_eq!(texts(&found), ["were written", "being watched"]);

        // punctuation between the words breaks the construction
        assert!(passive_voice("It was. Opened later.").is_empty());
        assert_eq!(texts(&passive_voice("They got\n  caught")), ["got\n  caught"]);
    }

    #[test]
    fn test_filter_words_whole_words() {
        let found = filter_words("It was just a bit odd, justly so. Kind of strange.");
        assert_eq!(texts(&found), ["just", "a bit", "Kind of"]);
    }

    #[test]
    fn test_cliches_and_vague_words() {
        let text = "All of a sudden, something moved. Time stood still.";
        assert_eq!(texts(&cliches(text)), ["All of a sudden", "Time stood still"]);
        assert_eq!(texts(&vague_words(text)), ["something"]);
        assert!(vague_words("Nothingness").is_empty());
    }

    #[test]
    fn test_prose_highlights_respect_config() {
        let text = "Once upon a time a nice thing was found.";
        let all = prose_highlights(text, &AnalysisConfig::default());
        let kinds: Vec<_> = all.iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            [
                HighlightKind::Cliche,
                HighlightKind::VagueWord,
                HighlightKind::VagueWord,
                HighlightKind::PassiveVoice,
            ]
        );

        let config = AnalysisConfig {
            cliche_detection: false,
            vague_word_detection: false,
            ..AnalysisConfig::default()
        };
        let kinds: Vec<_> = prose_highlights(text, &config).iter().map(|h| h.kind).collect();
        assert_eq!(kinds, [HighlightKind::PassiveVoice]);
    }
}
