//! Placeholder substitution for the XHTML document templates.
//!
//! Syntax:
//! - `{{key}}` inserts the value XML-escaped
//! - `{{{key}}}` inserts the value verbatim (for pre-rendered markup)
//! - `{{#key}}...{{/key}}` keeps the block only when `key` is set and
//!   non-empty
//!
//! Unknown keys expand to nothing. Unterminated markers are left as literal
//! text.

use memchr::memmem;

use super::xhtml::escape_xml;

/// Values available to a template.
#[derive(Debug, Clone, Default)]
pub struct Placeholders<'a> {
    values: Vec<(&'a str, String)>,
}

impl<'a> Placeholders<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any earlier one for the same key.
    pub fn set(mut self, key: &'a str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.values.push((key, value)),
        }
        self
    }

    /// Set a value only when present.
    pub fn set_opt(self, key: &'a str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn is_truthy(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.trim().is_empty())
    }

    /// Expand `template`.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        self.render_into(template, &mut out);
        out
    }

    fn render_into(&self, template: &str, out: &mut String) {
        let mut rest = template;

        while let Some(start) = memmem::find(rest.as_bytes(), b"{{") {
            out.push_str(&rest[..start]);
            rest = &rest[start..];

            if let Some(after) = rest.strip_prefix("{{{") {
                if let Some(end) = memmem::find(after.as_bytes(), b"}}}") {
                    if let Some(value) = self.get(after[..end].trim()) {
                        out.push_str(value);
                    }
                    rest = &after[end + 3..];
                    continue;
                }
            } else if let Some(after) = rest.strip_prefix("{{#") {
                if let Some(consumed) = self.render_section(after, out) {
                    rest = &after[consumed..];
                    continue;
                }
            } else if let Some(end) = memmem::find(&rest.as_bytes()[2..], b"}}") {
                let key = rest[2..2 + end].trim();
                if !key.starts_with('/') {
                    if let Some(value) = self.get(key) {
                        out.push_str(&escape_xml(value));
                    }
                    rest = &rest[2 + end + 2..];
                    continue;
                }
            }

            // Not a marker we understand; emit the braces literally.
            out.push_str("{{");
            rest = &rest[2..];
        }

        out.push_str(rest);
    }

    /// Render a `{{#key}}...{{/key}}` block. `after` starts just past `{{#`.
    /// Returns the number of bytes of `after` consumed.
    fn render_section(&self, after: &str, out: &mut String) -> Option<usize> {
        let name_end = memmem::find(after.as_bytes(), b"}}")?;
        let key = after[..name_end].trim();
        let body_start = name_end + 2;

        let closing = format!("{{{{/{key}}}}}");
        let body_len = memmem::find(&after.as_bytes()[body_start..], closing.as_bytes())?;
        let body = &after[body_start..body_start + body_len];

        if self.is_truthy(key) {
            self.render_into(body, out);
        }
        Some(body_start + body_len + closing.len())
    }
}
