//! EPUB 3 exporter.
//!
//! Books are produced by an [`EpubTemplate`] selected by id from the
//! handler's registry. Templates generate the content documents; the shared
//! packaging step builds the manifest, spine and both navigation documents
//! from that one document list, so the three always agree.
//!
//! # Example
//!
//! ```
//! use folio::export::{EpubHandler, ExportOptions};
//! use folio::export::epub::inspect_epub;
//! use folio::Project;
//!
//! let mut project = Project::new("Night Train", "");
//! project.add_chapter("Departure");
//!
//! let options = ExportOptions::new("epub").with_template("classic_book");
//! let bytes = EpubHandler::new().export_with_template(&project, &options, "classic_book")?;
//! let summary = inspect_epub(&bytes)?;
//! assert_eq!(summary.metadata.title, "Night Train");
//! # Ok::<(), folio::Error>(())
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::Project;

use super::{ExportOptions, FormatHandler, Payload};

mod archive;
mod inspect;
mod metadata;
mod novel;
mod package;
mod placeholder;
mod template;
mod xhtml;

pub use inspect::{ManifestEntry, NavEntry, PackageMetadata, PackageSummary, inspect_epub};
pub use metadata::{EpubMetadata, MetadataDefaults, book_identifier};
pub use novel::NovelTemplate;
pub use package::{ContentDocument, generate_manifest_and_nav};
pub use placeholder::Placeholders;
pub use template::{EpubFile, EpubTemplate, EpubTemplateContext, TemplateDefinition};
pub use xhtml::{escape_xml, html_to_xhtml};

/// Template used when none is requested.
pub const DEFAULT_TEMPLATE: &str = "generic_novel";

/// Configuration for EPUB export.
#[derive(Debug, Clone, Default)]
pub struct EpubConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<u32>,
    /// Fallbacks for metadata neither the options nor the project supply.
    pub defaults: MetadataDefaults,
}

/// EPUB format handler with a template registry.
///
/// Ships with `generic_novel`, `classic_book` and `modern_compact`.
#[derive(Clone)]
pub struct EpubHandler {
    config: EpubConfig,
    templates: BTreeMap<String, Arc<dyn EpubTemplate>>,
    default_template: String,
}

impl EpubHandler {
    /// Create a handler with the built-in templates.
    pub fn new() -> Self {
        let mut handler = Self {
            config: EpubConfig::default(),
            templates: BTreeMap::new(),
            default_template: DEFAULT_TEMPLATE.to_string(),
        };
        handler.register_template("generic_novel", NovelTemplate::generic_novel());
        handler.register_template("classic_book", NovelTemplate::classic_book());
        handler.register_template("modern_compact", NovelTemplate::modern_compact());
        handler
    }

    /// Configure the handler with custom settings.
    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a template under `id`, replacing any existing one.
    pub fn register_template<T>(&mut self, id: impl Into<String>, template: T)
    where
        T: EpubTemplate + 'static,
    {
        let id = id.into();
        debug!("registering epub template {id}");
        self.templates.insert(id, Arc::new(template));
    }

    pub fn template(&self, id: &str) -> Option<&dyn EpubTemplate> {
        self.templates.get(id).map(|t| t.as_ref())
    }

    /// Registered templates, sorted by id.
    pub fn template_definitions(&self) -> Vec<TemplateDefinition> {
        self.templates
            .iter()
            .map(|(id, template)| TemplateDefinition {
                id: id.clone(),
                name: template.name().to_string(),
                description: template.description().to_string(),
                is_default: *id == self.default_template,
            })
            .collect()
    }

    pub fn default_template(&self) -> &str {
        &self.default_template
    }

    /// Change the template used when the options name none.
    pub fn set_default_template(&mut self, id: &str) -> Result<()> {
        if !self.templates.contains_key(id) {
            return Err(Error::UnknownTemplate(id.to_string()));
        }
        self.default_template = id.to_string();
        Ok(())
    }

    /// Build an EPUB with a specific template.
    ///
    /// Unlike [`FormatHandler::render`], an unknown template id is an error.
    pub fn export_with_template(
        &self,
        project: &Project,
        options: &ExportOptions,
        template_id: &str,
    ) -> Result<Vec<u8>> {
        let template = self
            .template(template_id)
            .ok_or_else(|| Error::UnknownTemplate(template_id.to_string()))?;
        self.build(project, options, template_id, template)
    }

    fn build(
        &self,
        project: &Project,
        options: &ExportOptions,
        template_id: &str,
        template: &dyn EpubTemplate,
    ) -> Result<Vec<u8>> {
        let context = EpubTemplateContext {
            project,
            options,
            metadata: EpubMetadata::resolve(project, options, &self.config.defaults),
            css: template.css(),
        };
        let files = template.generate_files(&context)?;
        debug!(
            "epub template {template_id} produced {} files for {}",
            files.len(),
            project.title()
        );
        archive::write_archive(&files, &self.config)
    }
}

impl Default for EpubHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHandler for EpubHandler {
    fn render(&self, project: &Project, options: &ExportOptions) -> Result<Payload> {
        let requested = options
            .template_name()
            .unwrap_or(self.default_template.as_str());
        let (id, template) = match self.templates.get_key_value(requested) {
            Some((id, template)) => (id.as_str(), template.as_ref()),
            None => {
                warn!(
                    "epub template {requested} not found, using {}",
                    self.default_template
                );
                let template = self
                    .template(&self.default_template)
                    .ok_or_else(|| Error::UnknownTemplate(self.default_template.clone()))?;
                (self.default_template.as_str(), template)
            }
        };
        self.build(project, options, id, template).map(Payload::Binary)
    }

    fn file_extension(&self) -> &str {
        "epub"
    }

    fn mime_type(&self) -> &str {
        "application/epub+zip"
    }

    fn filter_label(&self) -> &str {
        "EPUB Files"
    }
}
