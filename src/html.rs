//! Lenient HTML scanning for editor-produced scene content.
//!
//! Scene bodies come from a rich-text editor and are never trusted to be
//! well-formed. The tokenizer here splits a string into text runs and tags
//! without building a tree, and never fails: anything that does not look
//! like markup is passed through as text.
//!
//! Consumers:
//! - word and character counting on the document model
//! - the plain text and RTF converters in [`crate::export`]
//! - notes-to-content tag matching

use std::borrow::Cow;

use memchr::memchr;
use memchr::memmem;

/// A lexical unit of scene HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Raw text between tags. Entities are still encoded.
    Text(&'a str),
    /// An opening, closing, or self-closing element tag.
    Tag(Tag<'a>),
    /// Comments, doctypes and processing instructions.
    Comment(&'a str),
}

/// A single element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Element name as written in the source.
    pub name: &'a str,
    /// True for `</name>`.
    pub closing: bool,
    /// True for `<name/>`.
    pub self_closing: bool,
    /// The complete tag text including angle brackets.
    pub raw: &'a str,
}

impl Tag<'_> {
    /// Case-insensitive element name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Attribute section of the tag (everything after the name).
    pub fn attributes(&self) -> &str {
        let skip = if self.closing { 2 } else { 1 } + self.name.len();
        let end = if self.self_closing {
            self.raw.len() - 2
        } else {
            self.raw.len() - 1
        };
        self.raw.get(skip..end).unwrap_or("")
    }
}

/// Iterator over the tokens of an HTML fragment.
pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

/// Tokenize an HTML fragment.
///
/// ```
/// use folio::html::{tokenize, Token};
///
/// let tokens: Vec<_> = tokenize("a <b>bold</b> < c").collect();
/// assert!(matches!(tokens[1], Token::Tag(t) if t.is("b") && !t.closing));
/// ```
pub fn tokenize(src: &str) -> Tokens<'_> {
    Tokens { src, pos: 0 }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.src.len() {
            return None;
        }

        let rest = &self.src[self.pos..];
        match memchr(b'<', rest.as_bytes()) {
            None => {
                self.pos = self.src.len();
                Some(Token::Text(rest))
            }
            Some(0) => {
                if let Some((token, len)) = scan_markup(rest) {
                    self.pos += len;
                    Some(token)
                } else {
                    // A stray '<' is literal text ("a < b").
                    self.pos += 1;
                    Some(Token::Text(&rest[..1]))
                }
            }
            Some(i) => {
                self.pos += i;
                Some(Token::Text(&rest[..i]))
            }
        }
    }
}

/// Try to read markup starting at a '<'. Returns the token and its byte length.
fn scan_markup(rest: &str) -> Option<(Token<'_>, usize)> {
    let bytes = rest.as_bytes();
    let next = *bytes.get(1)?;

    if rest.starts_with("<!--") {
        let end = memmem::find(&bytes[4..], b"-->")? + 4 + 3;
        return Some((Token::Comment(&rest[..end]), end));
    }
    if next == b'!' || next == b'?' {
        let end = memchr(b'>', bytes)? + 1;
        return Some((Token::Comment(&rest[..end]), end));
    }

    let closing = next == b'/';
    let name_start = if closing { 2 } else { 1 };
    if !bytes.get(name_start)?.is_ascii_alphabetic() {
        return None;
    }

    let name_len = bytes[name_start..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-' || **b == b':')
        .count();
    let end = find_tag_end(bytes, name_start + name_len)? + 1;
    let raw = &rest[..end];

    Some((
        Token::Tag(Tag {
            name: &rest[name_start..name_start + name_len],
            closing,
            self_closing: !closing && raw.ends_with("/>"),
            raw,
        }),
        end,
    ))
}

/// Find the '>' closing a tag, skipping quoted attribute values.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i),
            // A new tag opening before this one closed means it never will.
            (None, b'<') => return None,
            _ => {}
        }
    }
    None
}

/// Decode the HTML entities the editor emits.
///
/// Handles `&nbsp;`, `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;` (any case)
/// and numeric references. Unknown entities are left untouched.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if memchr(b'&', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        match decode_one(rest) {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode a single entity at the start of `s`, returning the character and
/// the number of bytes consumed.
fn decode_one(s: &str) -> Option<(char, usize)> {
    // Longest entity we recognize is "&#x10FFFF;".
    let window = &s.as_bytes()[..s.len().min(12)];
    let semi = memchr(b';', window)?;
    let body = &s[1..semi];

    let ch = if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        char::from_u32(code)?
    } else {
        match body.to_ascii_lowercase().as_str() {
            "nbsp" => ' ',
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => return None,
        }
    };

    Some((ch, semi + 1))
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Rewrite an HTML fragment tag by tag.
///
/// `on_tag` returns the replacement for each element tag (empty string to
/// strip it). `on_text` appends a decoded text run to the output, escaping
/// it for the target format. Comments are dropped. The result has its
/// whitespace collapsed.
pub fn rewrite<F, E>(html: &str, mut on_tag: F, mut on_text: E) -> String
where
    F: FnMut(&Tag<'_>) -> &'static str,
    E: FnMut(&str, &mut String),
{
    let mut out = String::with_capacity(html.len() + html.len() / 4);

    for token in tokenize(html) {
        match token {
            Token::Text(text) => on_text(&decode_entities(text), &mut out),
            Token::Tag(tag) => out.push_str(on_tag(&tag)),
            Token::Comment(_) => {}
        }
    }

    collapse_whitespace(&out)
}

/// Plain text of an HTML fragment, with every tag acting as a word break.
pub fn plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for token in tokenize(html) {
        match token {
            Token::Text(text) => out.push_str(&decode_entities(text)),
            Token::Tag(_) | Token::Comment(_) => out.push(' '),
        }
    }
    out
}

/// Word and character totals for a piece of scene content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextMetrics {
    pub words: usize,
    pub characters: usize,
}

/// Measure scene content.
///
/// Words are whitespace-separated runs of the plain text (tags separate
/// words). Characters count every decoded character outside of markup.
pub fn measure(html: &str) -> TextMetrics {
    let mut words = 0;
    let mut characters = 0;
    let mut in_word = false;

    for token in tokenize(html) {
        match token {
            Token::Text(text) => {
                for ch in decode_entities(text).chars() {
                    characters += 1;
                    if ch.is_whitespace() {
                        in_word = false;
                    } else if !in_word {
                        in_word = true;
                        words += 1;
                    }
                }
            }
            Token::Tag(_) | Token::Comment(_) => in_word = false,
        }
    }

    TextMetrics { words, characters }
}

/// Case-insensitive whole-word search.
///
/// A match must not be preceded or followed by an alphanumeric character or
/// underscore.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    let haystack = haystack.to_lowercase();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    let finder = memmem::Finder::new(needle.as_bytes());
    for start in finder.find_iter(haystack.as_bytes()) {
        let end = start + needle.len();
        let before_ok = haystack[..start].chars().next_back().is_none_or(|c| !is_word(c));
        let after_ok = haystack[end..].chars().next().is_none_or(|c| !is_word(c));
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_tags_and_text() {
        let tokens: Vec<_> = tokenize("<p class=\"x\">Hi <em>there</em></p>").collect();
        assert_eq!(tokens.len(), 6);
        assert!(matches!(tokens[0], Token::Tag(t) if t.is("p") && !t.closing));
        assert_eq!(tokens[1], Token::Text("Hi "));
        assert!(matches!(tokens[5], Token::Tag(t) if t.is("P") && t.closing));
    }

    #[test]
    fn test_tokenize_quoted_gt_in_attribute() {
        let tokens: Vec<_> = tokenize("<span title=\"a > b\">x</span>").collect();
        assert!(matches!(tokens[0], Token::Tag(t) if t.raw == "<span title=\"a > b\">"));
        assert_eq!(tokens[1], Token::Text("x"));
    }

    #[test]
    fn test_stray_angle_brackets_are_text() {
        let text: String = tokenize("1 < 2 and 3 > 2")
            .map(|t| match t {
                Token::Text(s) => s,
                _ => panic!("unexpected markup"),
            })
            .collect();
        assert_eq!(text, "1 < 2 and 3 > 2");
    }

    #[test]
    fn test_unterminated_tag_is_text() {
        let tokens: Vec<_> = tokenize("hello <strong").collect();
        assert!(tokens.iter().all(|t| matches!(t, Token::Text(_))));
    }

    #[test]
    fn test_self_closing_and_attributes() {
        let tokens: Vec<_> = tokenize("<img src=\"a.png\"/>").collect();
        let Token::Tag(tag) = tokens[0] else {
            panic!("expected tag");
        };
        assert!(tag.self_closing);
        assert_eq!(tag.attributes(), " src=\"a.png\"");
    }

    #[test]
    fn test_comments_skipped() {
        let tokens: Vec<_> = tokenize("a<!-- <p> -->b").collect();
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[1], Token::Comment(_)));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&LT;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&quot;hi&apos;"), "\"hi'");
        assert_eq!(decode_entities("x&nbsp;y"), "x y");
        assert_eq!(decode_entities("&#8212;&#x2026;"), "\u{2014}\u{2026}");
        assert_eq!(decode_entities("AT&T &copy;"), "AT&T &copy;");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n b\t c  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_measure() {
        let m = measure("<p>Hello <strong>brave</strong> new</p><p>world</p>");
        assert_eq!(m.words, 4);
        assert_eq!(m.characters, "Hello brave newworld".len());

        assert_eq!(measure("").words, 0);
        assert_eq!(measure("<p></p>").words, 0);
        assert_eq!(measure("one&nbsp;two").words, 2);
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("The Dragon sleeps", "dragon"));
        assert!(!contains_word("dragonfly", "dragon"));
        assert!(contains_word("a dragon.", "Dragon"));
        assert!(!contains_word("anything", "  "));
    }
}
