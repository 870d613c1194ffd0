//! Plain text export.
//!
//! Scene HTML is flattened with light markup conventions: `**bold**`,
//! `*italic*`, `_underline_`, `=== h1 ===`, `--- h2 ---` and `•` bullets.

use log::debug;

use crate::error::Result;
use crate::html::{Tag, rewrite};
use crate::model::Project;

use super::{ExportOptions, FormatHandler, Payload};

/// Configuration for plain text export.
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    /// Line width for wrapping converted scene text (0 = no wrapping).
    pub line_width: usize,
}

/// Handler for `.txt` output.
#[derive(Debug, Clone, Default)]
pub struct TextHandler {
    config: TextConfig,
}

impl TextHandler {
    /// Create a new TextHandler with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a TextHandler with the specified configuration.
    pub fn with_config(config: TextConfig) -> Self {
        Self { config }
    }
}

impl FormatHandler for TextHandler {
    fn render(&self, project: &Project, options: &ExportOptions) -> Result<Payload> {
        let mut out = String::new();

        if options.include_title {
            push_block(&mut out, project.title());
        }
        if !project.description().trim().is_empty() {
            push_block(&mut out, project.description());
        }

        for chapter in project.chapters() {
            if options.include_chapter_titles {
                push_block(&mut out, &chapter.title().to_uppercase());
            }

            for scene in chapter.scenes() {
                if options.include_scene_titles {
                    push_block(&mut out, scene.title());
                }

                if !scene.is_blank() {
                    let text = html_to_text(scene.content());
                    if !text.is_empty() {
                        push_block(&mut out, &wrap(&text, self.config.line_width));
                    }
                }

                if options.include_word_count {
                    push_block(&mut out, &format!("Words: {}", scene.word_count()));
                }
            }
        }

        debug!("text export of {}: {} bytes", project.id(), out.len());
        Ok(Payload::Text(out))
    }

    fn file_extension(&self) -> &str {
        "txt"
    }

    fn mime_type(&self) -> &str {
        "text/plain"
    }

    fn filter_label(&self) -> &str {
        "Text Files"
    }
}

fn push_block(out: &mut String, block: &str) {
    out.push_str(block);
    out.push_str("\n\n");
}

/// Convert scene HTML to plain text.
///
/// Entities are decoded, unknown tags are dropped, and whitespace runs
/// (including the line breaks introduced by block tags) collapse to a single
/// space.
///
/// ```
/// use folio::export::html_to_text;
///
/// let text = html_to_text("<h1>Title</h1><p>Hello <strong>world</strong></p>");
/// assert_eq!(text, "=== Title === Hello **world**");
/// ```
pub fn html_to_text(html: &str) -> String {
    rewrite(html, text_marker, |text, out| out.push_str(text))
}

fn text_marker(tag: &Tag<'_>) -> &'static str {
    let name = tag.name.to_ascii_lowercase();
    match (name.as_str(), tag.closing) {
        ("p", false) => "",
        ("p", true) => "\n\n",
        ("br", _) => "\n",
        ("h1", false) => "\n\n=== ",
        ("h1", true) => " ===\n\n",
        ("h2", false) => "\n\n--- ",
        ("h2", true) => " ---\n\n",
        ("h3", false) => "\n\n• ",
        ("h3", true) => "\n\n",
        ("strong" | "b", _) => "**",
        ("em" | "i", _) => "*",
        ("u", _) => "_",
        ("ul" | "ol", _) => "\n",
        ("li", false) => "\n• ",
        ("blockquote", false) => "\n> ",
        ("blockquote", true) => "\n",
        ("div", true) => "\n",
        _ => "",
    }
}

/// Greedy word wrap. A width of 0 leaves the text alone.
fn wrap(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + text.len() / width);
    let mut line_len = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len > 0 && line_len + 1 + word_len > width {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(word);
        line_len += word_len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_markers() {
        assert_eq!(html_to_text("<p>a <b>b</b> <i>c</i> <u>d</u></p>"), "a **b** *c* _d_");
        assert_eq!(html_to_text("<h2>Part</h2><h3>Sub</h3>"), "--- Part --- • Sub");
        assert_eq!(html_to_text("<ul><li>one</li><li>two</li></ul>"), "• one • two");
        assert_eq!(html_to_text("<blockquote>quoted</blockquote>"), "> quoted");
    }

    #[test]
    fn test_html_to_text_is_case_insensitive() {
        assert_eq!(html_to_text("<P>Hi <STRONG>there</Strong></P>"), "Hi **there**");
    }

    #[test]
    fn test_html_to_text_does_not_confuse_similar_tags() {
        // <br> and <blockquote> start with "b" but are not bold.
        assert_eq!(html_to_text("a<br>b"), "a b");
        assert_eq!(html_to_text("<blockquote><b>x</b></blockquote>"), "> **x**");
    }

    #[test]
    fn test_entities_decoded_after_tags() {
        assert_eq!(html_to_text("<p>&lt;p&gt; &amp; &quot;x&quot;&nbsp;y</p>"), "<p> & \"x\" y");
    }

    #[test]
    fn test_unknown_tags_and_malformed_input() {
        assert_eq!(html_to_text("<span class=\"x\">a</span><custom>b</custom>"), "ab");
        assert_eq!(html_to_text("1 < 2 <p"), "1 < 2 <p");
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("aa bb cc dd", 5), "aa bb\ncc dd");
        assert_eq!(wrap("aa bb", 0), "aa bb");
        assert_eq!(wrap("toolongword x", 4), "toolongword\nx");
    }

    #[test]
    fn test_render_layout() {
        let mut project = Project::new("Book", "About things");
        let chapter = project.add_chapter("One");
        let scene = project.add_scene(&chapter, "Start").unwrap();
        project
            .set_scene_content(&chapter, &scene, "<p>Hello world</p>")
            .unwrap();

        let options = ExportOptions::default()
            .with_scene_titles(true)
            .with_word_counts(true);
        let payload = TextHandler::new().render(&project, &options).unwrap();
        assert_eq!(
            payload.as_text().unwrap(),
            "Book\n\nAbout things\n\nONE\n\nStart\n\nHello world\n\nWords: 2\n\n"
        );
    }

    #[test]
    fn test_render_respects_flags() {
        let mut project = Project::new("Book", "");
        let chapter = project.add_chapter("One");
        project.add_scene(&chapter, "Empty").unwrap();

        let options = ExportOptions::default()
            .with_title(false)
            .with_chapter_titles(false);
        let payload = TextHandler::new().render(&project, &options).unwrap();
        assert_eq!(payload.as_text().unwrap(), "");
    }
}
