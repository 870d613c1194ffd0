//! The novel layout shared by every built-in template.
//!
//! One XHTML document per chapter, one `<section>` per scene, an optional
//! title page in front. Templates differ only in name, description and
//! stylesheet.

use std::borrow::Cow;

use crate::error::Result;
use crate::model::Chapter;

use super::package::{ContentDocument, generate_manifest_and_nav};
use super::placeholder::Placeholders;
use super::template::{EpubFile, EpubTemplate, EpubTemplateContext};
use super::xhtml::{escape_xml, html_to_xhtml};

const TITLE_PAGE_TEMPLATE: &str = include_str!("assets/title_page.xhtml");
const CHAPTER_TEMPLATE: &str = include_str!("assets/chapter.xhtml");

const GENERIC_NOVEL_CSS: &str = include_str!("assets/generic_novel.css");
const CLASSIC_BOOK_CSS: &str = include_str!("assets/classic_book.css");
const MODERN_COMPACT_CSS: &str = include_str!("assets/modern_compact.css");

/// Novel layout with a configurable look.
#[derive(Debug, Clone)]
pub struct NovelTemplate {
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    css: Cow<'static, str>,
}

impl NovelTemplate {
    /// A novel template with custom presentation.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
        css: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            css: css.into(),
        }
    }

    pub fn generic_novel() -> Self {
        Self::new(
            "Generic Novel",
            "A standard novel template with title page, chapters, and scenes",
            GENERIC_NOVEL_CSS,
        )
    }

    pub fn classic_book() -> Self {
        Self::new(
            "Classic Book",
            "Traditional print-inspired layout with generous margins and elegant rhythm",
            CLASSIC_BOOK_CSS,
        )
    }

    pub fn modern_compact() -> Self {
        Self::new(
            "Modern Compact",
            "Clean modern typography with compact spacing for fast reading",
            MODERN_COMPACT_CSS,
        )
    }

    fn title_page(&self, context: &EpubTemplateContext<'_>) -> ContentDocument {
        let metadata = &context.metadata;
        let xhtml = Placeholders::new()
            .set("language", metadata.language.as_str())
            .set("title", metadata.title.as_str())
            .set("author", metadata.author.as_str())
            .set_opt("description", metadata.description.as_deref())
            .render(TITLE_PAGE_TEMPLATE);

        ContentDocument {
            id: "title".to_string(),
            href: "title.xhtml".to_string(),
            label: metadata.title.clone(),
            xhtml,
        }
    }

    fn chapter_document(
        &self,
        context: &EpubTemplateContext<'_>,
        number: usize,
        chapter: &Chapter,
    ) -> ContentDocument {
        let options = context.options;
        let id = format!("chapter_{number}");

        let heading = Some(chapter.title().trim())
            .filter(|title| options.include_chapter_titles && !title.is_empty());
        let label = match heading {
            Some(title) => title.to_string(),
            None => format!("Chapter {number}"),
        };

        let mut content = String::new();
        for (i, scene) in chapter.scenes().into_iter().enumerate() {
            if i > 0 {
                content.push_str("    <div class=\"scene-break\">* * *</div>\n");
            }
            content.push_str(&format!(
                "    <section class=\"scene\" id=\"scene_{number}_{}\">\n",
                i + 1
            ));
            if options.include_scene_titles {
                content.push_str(&format!(
                    "      <h3 class=\"scene-title\">{}</h3>\n",
                    escape_xml(scene.title())
                ));
            }
            if !scene.is_blank() {
                content.push_str("      ");
                content.push_str(&html_to_xhtml(scene.content()));
                content.push('\n');
            }
            if options.include_word_count {
                content.push_str(&format!(
                    "      <p class=\"word-count\">Words: {}</p>\n",
                    scene.word_count()
                ));
            }
            content.push_str("    </section>\n");
        }

        let xhtml = Placeholders::new()
            .set("language", context.metadata.language.as_str())
            .set("title", label.as_str())
            .set("id", id.as_str())
            .set_opt("heading", heading)
            .set("content", content)
            .render(CHAPTER_TEMPLATE);

        ContentDocument {
            href: format!("chapter_{number:02}.xhtml"),
            id,
            label,
            xhtml,
        }
    }
}

impl EpubTemplate for NovelTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn css(&self) -> &str {
        &self.css
    }

    fn generate_files(&self, context: &EpubTemplateContext<'_>) -> Result<Vec<EpubFile>> {
        let mut documents = Vec::new();

        if context.options.include_title {
            documents.push(self.title_page(context));
        }
        for (i, chapter) in context.project.chapters().into_iter().enumerate() {
            documents.push(self.chapter_document(context, i + 1, chapter));
        }

        generate_manifest_and_nav(documents, context)
    }
}
