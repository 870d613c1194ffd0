//! Read an EPUB archive back into a summary of its package structure.
//!
//! Used by the `folio info` command and by tests that check the manifest,
//! spine and navigation documents agree.

use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::{CompressionMethod, ZipArchive};

use crate::error::{Error, Result};
use crate::html::decode_entities;

use super::archive::MIMETYPE;

/// A manifest `<item>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestEntry {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == property))
    }
}

/// One entry of a navigation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub label: String,
    pub href: String,
}

/// Dublin Core metadata from the package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub title: String,
    pub creators: Vec<String>,
    pub language: String,
    pub identifier: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub subjects: Vec<String>,
    pub rights: Option<String>,
    pub modified: Option<String>,
}

/// Structure of an EPUB archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSummary {
    /// Archive entry names in storage order.
    pub entries: Vec<String>,
    /// True when the first entry is an uncompressed, correct `mimetype`.
    pub mimetype_first: bool,
    /// Directory of the package document within the archive.
    pub package_dir: String,
    pub metadata: PackageMetadata,
    pub manifest: Vec<ManifestEntry>,
    /// Spine idrefs in reading order.
    pub spine: Vec<String>,
    /// Entries of the EPUB 3 navigation document's `toc` nav.
    pub nav: Vec<NavEntry>,
    /// Entries of the NCX navMap.
    pub ncx: Vec<NavEntry>,
}

impl PackageSummary {
    pub fn manifest_item(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// Manifest ids of XHTML content documents (the navigation document
    /// excluded), in manifest order.
    pub fn content_ids(&self) -> Vec<&str> {
        self.manifest
            .iter()
            .filter(|item| item.media_type == "application/xhtml+xml" && !item.has_property("nav"))
            .map(|item| item.id.as_str())
            .collect()
    }

    /// Manifest ids targeted by the navigation document, in order.
    /// Entries pointing outside the manifest are returned as their href.
    pub fn nav_ids(&self) -> Vec<&str> {
        self.nav
            .iter()
            .map(|entry| {
                let href = strip_fragment(&entry.href);
                self.manifest
                    .iter()
                    .find(|item| item.href == href)
                    .map_or(href, |item| item.id.as_str())
            })
            .collect()
    }

    /// Manifest hrefs with no corresponding archive entry.
    pub fn missing_files(&self) -> Vec<&str> {
        let entries: HashSet<&str> = self.entries.iter().map(String::as_str).collect();
        self.manifest
            .iter()
            .filter(|item| !entries.contains(resolve_path(&self.package_dir, &item.href).as_str()))
            .map(|item| item.href.as_str())
            .collect()
    }

    /// Archive entries that are neither listed in the manifest nor part of
    /// the container itself.
    pub fn unlisted_files(&self) -> Vec<&str> {
        let listed: HashSet<String> = self
            .manifest
            .iter()
            .map(|item| resolve_path(&self.package_dir, &item.href))
            .collect();
        let package = resolve_path(&self.package_dir, "content.opf");
        self.entries
            .iter()
            .filter(|name| {
                name.as_str() != "mimetype"
                    && !name.starts_with("META-INF/")
                    && !name.ends_with('/')
                    && **name != package
                    && !listed.contains(name.as_str())
            })
            .map(String::as_str)
            .collect()
    }
}

/// Inspect an EPUB held in memory.
pub fn inspect_epub(bytes: &[u8]) -> Result<PackageSummary> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        entries.push(archive.by_index(i)?.name().to_string());
    }

    let mimetype_first = match archive.len() {
        0 => false,
        _ => {
            let mut first = archive.by_index(0)?;
            let mut content = Vec::new();
            let stored = first.compression() == CompressionMethod::Stored;
            let named = first.name() == "mimetype";
            first.read_to_end(&mut content)?;
            stored && named && content == MIMETYPE
        }
    };

    let container = read_archive_file(&mut archive, "META-INF/container.xml")?;
    let opf_path = parse_container_xml(&container)?;
    let package_dir = opf_path
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default();

    let opf = read_archive_file(&mut archive, &opf_path)?;
    let OpfData {
        metadata,
        manifest,
        spine,
        toc,
    } = parse_opf(&opf)?;

    let mut summary = PackageSummary {
        entries,
        mimetype_first,
        package_dir,
        metadata,
        manifest,
        spine,
        ..Default::default()
    };

    if let Some(nav) = summary.manifest.iter().find(|item| item.has_property("nav")) {
        let path = resolve_path(&summary.package_dir, &nav.href);
        summary.nav = parse_nav(&read_archive_file(&mut archive, &path)?)?;
    }

    let ncx = toc
        .as_deref()
        .and_then(|id| summary.manifest_item(id))
        .or_else(|| {
            summary
                .manifest
                .iter()
                .find(|item| item.media_type == "application/x-dtbncx+xml")
        });
    if let Some(ncx) = ncx {
        let path = resolve_path(&summary.package_dir, &ncx.href);
        summary.ncx = parse_ncx(&read_archive_file(&mut archive, &path)?)?;
    }

    Ok(summary)
}

fn read_archive_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(Error::InvalidEpub(format!("missing {path}")));
        }
        Err(e) => return Err(e.into()),
    };
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(String::from_utf8(contents)?)
}

fn resolve_path(dir: &str, href: &str) -> String {
    let href = strip_fragment(href);
    if dir.is_empty() {
        href.to_string()
    } else {
        format!("{dir}/{href}")
    }
}

fn strip_fragment(href: &str) -> &str {
    href.split_once('#').map_or(href, |(path, _)| path)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name {
            let raw = String::from_utf8(attr.value.to_vec())?;
            return Ok(Some(decode_entities(&raw).into_owned()));
        }
    }
    Ok(None)
}

fn push_entity(buf: &mut String, entity: &[u8]) {
    let entity = String::from_utf8_lossy(entity);
    buf.push_str(&decode_entities(&format!("&{entity};")));
}

/// Parse META-INF/container.xml to find the OPF path.
fn parse_container_xml(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = attribute(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::InvalidEpub("no rootfile in container.xml".into()))
}

struct OpfData {
    metadata: PackageMetadata,
    manifest: Vec<ManifestEntry>,
    spine: Vec<String>,
    toc: Option<String>,
}

fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);

    let mut metadata = PackageMetadata::default();
    let mut manifest = Vec::new();
    let mut spine = Vec::new();
    let mut toc = None;

    let mut in_metadata = false;
    let mut current: Option<&'static str> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = true,
                b"spine" => toc = attribute(&e, b"toc")?,
                local if in_metadata => {
                    current = match local {
                        b"title" => Some("title"),
                        b"creator" => Some("creator"),
                        b"language" => Some("language"),
                        b"identifier" => Some("identifier"),
                        b"description" => Some("description"),
                        b"publisher" => Some("publisher"),
                        b"date" => Some("date"),
                        b"subject" => Some("subject"),
                        b"rights" => Some("rights"),
                        b"meta"
                            if attribute(&e, b"property")?.as_deref()
                                == Some("dcterms:modified") =>
                        {
                            Some("modified")
                        }
                        _ => None,
                    };
                    text.clear();
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"item" => {
                    let id = attribute(&e, b"id")?.unwrap_or_default();
                    if !id.is_empty() {
                        manifest.push(ManifestEntry {
                            id,
                            href: attribute(&e, b"href")?.unwrap_or_default(),
                            media_type: attribute(&e, b"media-type")?.unwrap_or_default(),
                            properties: attribute(&e, b"properties")?,
                        });
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attribute(&e, b"idref")? {
                        spine.push(idref);
                    }
                }
                _ => {}
            },
            Event::Text(e) if current.is_some() => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) if current.is_some() => push_entity(&mut text, e.as_ref()),
            Event::End(e) => {
                if e.local_name().as_ref() == b"metadata" {
                    in_metadata = false;
                }
                if let Some(element) = current.take() {
                    let value = text.trim().to_string();
                    text.clear();
                    match element {
                        "title" => metadata.title = value,
                        "creator" => metadata.creators.push(value),
                        "language" => metadata.language = value,
                        "identifier" if metadata.identifier.is_empty() => {
                            metadata.identifier = value
                        }
                        "description" => metadata.description = Some(value),
                        "publisher" => metadata.publisher = Some(value),
                        "date" => metadata.date = Some(value),
                        "subject" => metadata.subjects.push(value),
                        "rights" => metadata.rights = Some(value),
                        "modified" => metadata.modified = Some(value),
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(OpfData {
        metadata,
        manifest,
        spine,
        toc,
    })
}

/// Parse the `toc` nav of an EPUB 3 navigation document.
fn parse_nav(content: &str) -> Result<Vec<NavEntry>> {
    let mut reader = Reader::from_str(content);

    let mut entries = Vec::new();
    let mut nav_depth = 0usize;
    let mut in_toc = false;
    let mut link: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"nav" => {
                    nav_depth += 1;
                    if nav_depth == 1 {
                        in_toc = attribute(&e, b"epub:type")?.as_deref() == Some("toc");
                    }
                }
                b"a" if in_toc => {
                    link = Some(attribute(&e, b"href")?.unwrap_or_default());
                    text.clear();
                }
                _ => {}
            },
            Event::Text(e) if link.is_some() => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) if link.is_some() => push_entity(&mut text, e.as_ref()),
            Event::End(e) => match e.local_name().as_ref() {
                b"nav" => {
                    nav_depth = nav_depth.saturating_sub(1);
                    if nav_depth == 0 {
                        in_toc = false;
                    }
                }
                b"a" => {
                    if let Some(href) = link.take() {
                        entries.push(NavEntry {
                            label: text.trim().to_string(),
                            href,
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Parse the navMap of an NCX document, flattening nested points.
fn parse_ncx(content: &str) -> Result<Vec<NavEntry>> {
    let mut reader = Reader::from_str(content);

    struct Point {
        label: String,
        src: String,
    }

    let mut entries = Vec::new();
    let mut stack: Vec<Point> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"navPoint" => stack.push(Point {
                    label: String::new(),
                    src: String::new(),
                }),
                b"text" if !stack.is_empty() => in_text = true,
                b"content" => {
                    if let Some(point) = stack.last_mut() {
                        point.src = attribute(&e, b"src")?.unwrap_or_default();
                    }
                }
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"content" => {
                if let Some(point) = stack.last_mut() {
                    point.src = attribute(&e, b"src")?.unwrap_or_default();
                }
            }
            Event::Text(e) if in_text => {
                if let Some(point) = stack.last_mut() {
                    point.label.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) if in_text => {
                if let Some(point) = stack.last_mut() {
                    push_entity(&mut point.label, e.as_ref());
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"text" => in_text = false,
                b"navPoint" => {
                    if let Some(point) = stack.pop() {
                        entries.push(NavEntry {
                            label: point.label.trim().to_string(),
                            href: point.src,
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}
