//! Coercion of editor HTML into well-formed XHTML fragments.

use crate::html::{Tag, Token, decode_entities, tokenize};

/// Elements that never have content and must be self-closed in XHTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    push_escaped(s, &mut result);
    result
}

fn push_escaped(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Convert an HTML fragment to XHTML.
///
/// - void elements are self-closed (`<br>` → `<br/>`)
/// - element names are lower-cased
/// - text is entity-decoded and re-escaped, so HTML-only entities such as
///   `&nbsp;` and bare ampersands never reach the XML parser
/// - attribute values are quoted and escaped
/// - comments are dropped
///
/// Elements are balanced against a stack of open tags. A closing tag that
/// matches nothing open is dropped, one that matches an outer element first
/// closes everything opened inside it, and whatever is still open at the
/// end of the fragment is closed there.
pub fn html_to_xhtml(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 8);
    let mut open: Vec<String> = Vec::new();

    for token in tokenize(html) {
        match token {
            Token::Text(text) => push_escaped(&decode_entities(text), &mut out),
            Token::Comment(_) => {}
            Token::Tag(tag) => {
                let name = tag.name.to_ascii_lowercase();
                let is_void = VOID_ELEMENTS.contains(&name.as_str());

                if tag.closing {
                    // </br> and friends have no XHTML equivalent.
                    if is_void {
                        continue;
                    }
                    let Some(depth) = open.iter().rposition(|n| *n == name) else {
                        continue;
                    };
                    for inner in open.drain(depth..).rev() {
                        push_close(&inner, &mut out);
                    }
                    continue;
                }

                out.push('<');
                out.push_str(&name);
                push_attributes(&tag, &mut out);
                if is_void || tag.self_closing {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    open.push(name);
                }
            }
        }
    }

    for name in open.iter().rev() {
        push_close(name, &mut out);
    }

    out
}

fn push_close(name: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Re-emit a tag's attributes as `name="value"` pairs.
///
/// Unquoted and valueless HTML attributes are quoted, values are escaped,
/// and repeated or malformed names are dropped.
fn push_attributes(tag: &Tag<'_>, out: &mut String) {
    let mut seen: Vec<String> = Vec::new();
    let mut rest = tag.attributes();

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }

        let name_len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | '/' | '"' | '\''))
            .unwrap_or(rest.len());
        if name_len == 0 {
            // A quote with no name in front of it; skip the stray character.
            rest = &rest[1..];
            continue;
        }
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after) => {
                let after = after.trim_start();
                let (value, remaining) = attribute_value(after);
                rest = remaining;
                decode_entities(value).into_owned()
            }
            None => name.clone(),
        };

        if !is_xml_name(&name) || seen.contains(&name) {
            continue;
        }
        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        push_escaped(&value, out);
        out.push('"');
        seen.push(name);
    }
}

/// Split a quoted or bare attribute value off the front of `s`.
fn attribute_value(s: &str) -> (&str, &str) {
    match s.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let body = &s[1..];
            match body.find(q) {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            }
        }
        _ => {
            let end = s.find(char::is_whitespace).unwrap_or(s.len());
            (&s[..end], &s[end..])
        }
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}
