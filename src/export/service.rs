//! Format registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use super::{
    EpubHandler, ExportOptions, ExportOutcome, FormatHandler, Payload, RtfHandler, SaveTarget,
    TextHandler,
};
use crate::error::{Error, Result};
use crate::model::Project;

/// Maps format ids to handlers and runs exports.
///
/// Requests are checked in a fixed order: an unregistered format fails with
/// [`Error::UnsupportedFormat`] before the project is looked at, then the
/// project is validated. Nothing is rendered or written when either check
/// fails.
#[derive(Clone)]
pub struct ExportService {
    handlers: BTreeMap<String, Arc<dyn FormatHandler>>,
}

impl ExportService {
    /// Service with the built-in `txt`, `rtf` and `epub` handlers.
    pub fn new() -> Self {
        let mut service = Self::empty();
        service.register_handler("rtf", RtfHandler::new());
        service.register_handler("txt", TextHandler::new());
        service.register_handler("epub", EpubHandler::new());
        service
    }

    /// Service with no handlers registered.
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register a handler for `format`, replacing any existing one.
    pub fn register_handler<H>(&mut self, format: impl Into<String>, handler: H)
    where
        H: FormatHandler + 'static,
    {
        let format = format.into();
        debug!("registering export handler for {format}");
        self.handlers.insert(format, Arc::new(handler));
    }

    /// Registered format ids, sorted.
    pub fn available_formats(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn handler(&self, format: &str) -> Option<&dyn FormatHandler> {
        self.handlers.get(format).map(|h| h.as_ref())
    }

    fn prepare(&self, project: &Project, options: &ExportOptions) -> Result<&dyn FormatHandler> {
        let handler = self
            .handler(options.format.id())
            .ok_or_else(|| Error::UnsupportedFormat(options.format.id().to_string()))?;
        project.validate()?;
        Ok(handler)
    }

    /// Render and persist a project through `target`.
    pub fn export_project(
        &self,
        project: &Project,
        options: &ExportOptions,
        target: &mut dyn SaveTarget,
    ) -> Result<ExportOutcome> {
        self.prepare(project, options)?
            .export_and_download(project, options, target)
    }

    /// Render a project without persisting it.
    pub fn export_content(&self, project: &Project, options: &ExportOptions) -> Result<Payload> {
        self.prepare(project, options)?.render(project, options)
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}
