//! RTF export.
//!
//! Produces a single-font RTF 1 document. Text is written as 7-bit ASCII
//! with `\uN?` escapes for everything else, so the output does not depend on
//! the reader's code page.

use log::debug;

use crate::error::Result;
use crate::html::{Tag, Token, decode_entities, tokenize};
use crate::model::Project;

use super::{ExportOptions, FormatHandler, Payload};

const BODY: &str = "\\pard\\plain\\f0\\fs24 ";
const HEADING_END: &str = "\\par\\pard\\plain\\f0\\fs24\\par ";

/// Configuration for RTF export.
#[derive(Debug, Clone)]
pub struct RtfConfig {
    /// Font family declared as `\f0`.
    pub font_name: String,
}

impl Default for RtfConfig {
    fn default() -> Self {
        Self {
            font_name: "Times New Roman".to_string(),
        }
    }
}

/// Handler for `.rtf` output.
#[derive(Debug, Clone, Default)]
pub struct RtfHandler {
    config: RtfConfig,
}

impl RtfHandler {
    /// Create a new RtfHandler with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an RtfHandler with the specified configuration.
    pub fn with_config(config: RtfConfig) -> Self {
        Self { config }
    }

    fn header(&self) -> String {
        let mut font = String::new();
        escape_rtf(&self.config.font_name, &mut font);
        format!(
            "{{\\rtf1\\ansi\\ansicpg1252\\uc1\\deff0\\deflang1033\
             {{\\fonttbl{{\\f0\\fnil\\fcharset0 {font};}}}}\
             {{\\colortbl;\\red0\\green0\\blue0;}}\\f0\\fs24"
        )
    }
}

impl FormatHandler for RtfHandler {
    fn render(&self, project: &Project, options: &ExportOptions) -> Result<Payload> {
        let mut out = self.header();

        if options.include_title {
            out.push_str("\\pard\\plain\\f0\\fs36\\b\\qc ");
            push_plain(&mut out, project.title());
            out.push_str(HEADING_END);
        }

        if !project.description().trim().is_empty() {
            push_plain(&mut out, project.description());
            out.push_str("\\par\\par");
        }

        for chapter in project.chapters() {
            if options.include_chapter_titles {
                push_heading(&mut out, chapter.title(), 32);
            }

            for scene in chapter.scenes() {
                if options.include_scene_titles {
                    push_heading(&mut out, scene.title(), 28);
                }

                if !scene.is_blank() {
                    out.push_str(BODY);
                    out.push_str(&html_to_rtf(scene.content()));
                    out.push_str("\\par\\par");
                }

                if options.include_word_count {
                    out.push_str(&format!("{{\\i Words: {}}}\\par", scene.word_count()));
                }

                out.push_str("\\par");
            }
        }

        out.push('}');
        debug!("rtf export of {}: {} bytes", project.id(), out.len());
        Ok(Payload::Text(out))
    }

    fn file_extension(&self) -> &str {
        "rtf"
    }

    fn mime_type(&self) -> &str {
        "text/rtf"
    }

    fn filter_label(&self) -> &str {
        "RTF Files"
    }
}

fn push_heading(out: &mut String, text: &str, half_points: u32) {
    out.push_str(&format!("\\pard\\plain\\f0\\fs{half_points}\\b "));
    push_plain(out, text);
    out.push_str(HEADING_END);
}

/// Plain (non-HTML) text such as titles. Line breaks become paragraphs.
fn push_plain(out: &mut String, text: &str) {
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push_str("\\par ");
        }
        escape_rtf(line, out);
    }
}

/// Convert scene HTML to an RTF fragment.
///
/// Whitespace runs in the text collapse to one space. The space that ends a
/// control word is its delimiter, so a space in the text right after an
/// inline marker is written separately.
///
/// ```
/// use folio::export::html_to_rtf;
///
/// assert_eq!(
///     html_to_rtf("<p>A <strong>bold</strong> move</p>"),
///     "\\pard\\plain\\f0\\fs24 A \\b bold\\b0  move\\par"
/// );
/// ```
pub fn html_to_rtf(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 4);
    // Whitespace seen since the last word and not yet written.
    let mut pending_space = false;
    // Leading whitespace of a paragraph is dropped.
    let mut line_start = true;

    for token in tokenize(html) {
        match token {
            Token::Text(text) => {
                let text = decode_entities(text);
                let mut words = text.split_whitespace().peekable();
                if words.peek().is_none() {
                    pending_space |= !text.is_empty();
                    continue;
                }
                pending_space |= text.starts_with(char::is_whitespace);
                for word in words {
                    if pending_space && !line_start {
                        out.push(' ');
                    }
                    escape_rtf(word, &mut out);
                    pending_space = true;
                    line_start = false;
                }
                pending_space = text.ends_with(char::is_whitespace);
            }
            Token::Tag(tag) => {
                let marker = rtf_marker(&tag);
                if marker.is_empty() {
                    continue;
                }
                if marker.contains("\\par") || marker.contains("\\tab") {
                    line_start = true;
                    pending_space = false;
                } else if pending_space && !line_start {
                    out.push(' ');
                    pending_space = false;
                }
                out.push_str(marker);
            }
            Token::Comment(_) => {}
        }
    }

    out.truncate(out.trim_end().len());
    out
}

fn rtf_marker(tag: &Tag<'_>) -> &'static str {
    let name = tag.name.to_ascii_lowercase();
    match (name.as_str(), tag.closing) {
        ("p", false) => BODY,
        ("p", true) | ("br", _) => "\\par ",
        ("h1", false) => "\\pard\\plain\\f0\\fs36\\b\\qc ",
        ("h2", false) => "\\pard\\plain\\f0\\fs32\\b ",
        ("h3", false) => "\\pard\\plain\\f0\\fs28\\b ",
        ("h1" | "h2" | "h3", true) => HEADING_END,
        ("strong" | "b", false) => "\\b ",
        ("strong" | "b", true) => "\\b0 ",
        ("em" | "i", false) => "\\i ",
        ("em" | "i", true) => "\\i0 ",
        ("u", false) => "\\ul ",
        ("u", true) => "\\ul0 ",
        ("ul" | "ol", false) => BODY,
        ("ul" | "ol", true) => "\\par\\pard\\plain\\f0\\fs24 ",
        ("li", false) => "\\tab ",
        ("li", true) => "\\par ",
        ("blockquote", false) => "\\pard\\plain\\f0\\fs24\\li720\\fi-720\\qj ",
        ("blockquote", true) => "\\par\\pard\\plain\\f0\\fs24 ",
        ("div", true) => "\\par ",
        _ => "",
    }
}

/// Escape text for RTF: control characters are backslash-escaped and every
/// non-ASCII character becomes `\uN?` (UTF-16 code units as signed 16-bit).
fn escape_rtf(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\t' => out.push_str("\\tab "),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(text: &str) -> String {
        let mut out = String::new();
        escape_rtf(text, &mut out);
        out
    }

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escaped("a\\b{c}"), "a\\\\b\\{c\\}");
    }

    #[test]
    fn test_escape_unicode() {
        assert_eq!(escaped("é"), "\\u233?");
        assert_eq!(escaped("\u{2014}"), "\\u8212?");
        // Above 0x7FFF the code unit is written as a negative number.
        assert_eq!(escaped("\u{FB01}"), "\\u-1279?");
        // Astral characters are written as a surrogate pair.
        assert_eq!(escaped("\u{1F600}"), "\\u-10179?\\u-8704?");
    }

    #[test]
    fn test_html_to_rtf_tags() {
        assert_eq!(
            html_to_rtf("<em>soft</em> <u>under</u>"),
            "\\i soft\\i0  \\ul under\\ul0"
        );
        assert_eq!(
            html_to_rtf("<ul><li>a</li></ul>"),
            "\\pard\\plain\\f0\\fs24 \\tab a\\par \\par\\pard\\plain\\f0\\fs24"
        );
        assert_eq!(
            html_to_rtf("<h2>Part</h2>"),
            "\\pard\\plain\\f0\\fs32\\b Part\\par\\pard\\plain\\f0\\fs24\\par"
        );
    }

    #[test]
    fn test_space_after_inline_marker_survives() {
        assert_eq!(html_to_rtf("<b>bold</b> move"), "\\b bold\\b0  move");
        assert_eq!(
            html_to_rtf("<p>  lead\n\n trail  </p>"),
            "\\pard\\plain\\f0\\fs24 lead trail\\par"
        );
        assert_eq!(html_to_rtf("a<span> b</span>"), "a b");
    }

    #[test]
    fn test_escaped_markup_stays_text() {
        assert_eq!(html_to_rtf("&lt;b&gt;{x}"), "<b>\\{x\\}");
    }

    #[test]
    fn test_render_document() {
        let mut project = Project::new("Title {1}", "");
        let chapter = project.add_chapter("Ch");
        let scene = project.add_scene(&chapter, "Sc").unwrap();
        project.set_scene_content(&chapter, &scene, "<p>Hi</p>").unwrap();

        let options = ExportOptions::new("rtf").with_word_counts(true);
        let payload = RtfHandler::new().render(&project, &options).unwrap();
        let rtf = payload.as_text().unwrap();

        assert!(rtf.starts_with("{\\rtf1\\ansi\\ansicpg1252\\uc1\\deff0\\deflang1033{\\fonttbl{\\f0\\fnil\\fcharset0 Times New Roman;}}"));
        assert!(rtf.contains("\\fs36\\b\\qc Title \\{1\\}\\par"));
        assert!(rtf.contains("\\pard\\plain\\f0\\fs32\\b Ch\\par"));
        assert!(rtf.contains("\\pard\\plain\\f0\\fs24 \\pard\\plain\\f0\\fs24 Hi\\par\\par\\par"));
        assert!(rtf.contains("{\\i Words: 1}\\par\\par}"));
        assert!(rtf.ends_with('}'));
        assert_eq!(
            rtf.matches('{').count() - rtf.matches("\\{").count(),
            rtf.matches('}').count() - rtf.matches("\\}").count()
        );
    }
}
