//! Package documents: container.xml, content.opf, toc.ncx and nav.xhtml.
//!
//! All four are derived from one ordered list of content documents, so the
//! manifest, spine, NCX and navigation document cannot disagree.

use std::collections::HashSet;

use crate::error::{Error, Result};

use super::placeholder::Placeholders;
use super::template::{EpubFile, EpubTemplateContext};
use super::xhtml::escape_xml;

pub(crate) const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";
const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";
const CSS_MEDIA_TYPE: &str = "text/css";

/// Manifest ids used by the package itself.
const RESERVED_IDS: &[&str] = &["ncx", "nav", "css"];
/// File names used by the package itself, relative to `OEBPS/`.
const RESERVED_HREFS: &[&str] = &["content.opf", "toc.ncx", "nav.xhtml", "stylesheet.css"];

const NAV_TEMPLATE: &str = include_str!("assets/nav.xhtml");

/// Container.xml template.
const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// A content document in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDocument {
    /// Manifest id, also used as the spine idref.
    pub id: String,
    /// File name relative to `OEBPS/`.
    pub href: String,
    /// Table of contents label.
    pub label: String,
    /// Complete XHTML document.
    pub xhtml: String,
}

struct ManifestItem<'a> {
    id: &'a str,
    href: &'a str,
    media_type: &'a str,
    properties: Option<&'a str>,
}

/// Build the full file set for a book from its content documents.
///
/// Emits, in order: `META-INF/container.xml`, `OEBPS/content.opf`,
/// `OEBPS/toc.ncx`, `OEBPS/nav.xhtml`, `OEBPS/stylesheet.css`, then every
/// content document. The manifest lists exactly the emitted `OEBPS/` files;
/// the spine and both navigation documents list exactly `documents`, in
/// order.
///
/// Fails with [`Error::InvalidEpub`] if two documents share an id or file
/// name, or collide with the package's own entries.
pub fn generate_manifest_and_nav(
    documents: Vec<ContentDocument>,
    context: &EpubTemplateContext<'_>,
) -> Result<Vec<EpubFile>> {
    check_unique(&documents)?;

    let mut manifest = vec![
        ManifestItem {
            id: "ncx",
            href: "toc.ncx",
            media_type: NCX_MEDIA_TYPE,
            properties: None,
        },
        ManifestItem {
            id: "nav",
            href: "nav.xhtml",
            media_type: XHTML_MEDIA_TYPE,
            properties: Some("nav"),
        },
        ManifestItem {
            id: "css",
            href: "stylesheet.css",
            media_type: CSS_MEDIA_TYPE,
            properties: None,
        },
    ];
    manifest.extend(documents.iter().map(|doc| ManifestItem {
        id: &doc.id,
        href: &doc.href,
        media_type: XHTML_MEDIA_TYPE,
        properties: None,
    }));

    let mut files = Vec::with_capacity(documents.len() + 5);
    files.push(EpubFile::new(
        "META-INF/container.xml",
        CONTAINER_XML,
        "application/xml",
    ));
    files.push(EpubFile::new(
        "OEBPS/content.opf",
        generate_opf(context, &manifest, &documents),
        "application/oebps-package+xml",
    ));
    files.push(EpubFile::new(
        "OEBPS/toc.ncx",
        generate_ncx(context, &documents),
        NCX_MEDIA_TYPE,
    ));
    files.push(EpubFile::new(
        "OEBPS/nav.xhtml",
        generate_nav(context, &documents),
        XHTML_MEDIA_TYPE,
    ));
    files.push(EpubFile::new(
        "OEBPS/stylesheet.css",
        context.css,
        CSS_MEDIA_TYPE,
    ));

    files.extend(documents.into_iter().map(|doc| {
        EpubFile::new(format!("OEBPS/{}", doc.href), doc.xhtml, XHTML_MEDIA_TYPE)
    }));

    Ok(files)
}

fn check_unique(documents: &[ContentDocument]) -> Result<()> {
    let mut ids: HashSet<&str> = RESERVED_IDS.iter().copied().collect();
    let mut hrefs: HashSet<&str> = RESERVED_HREFS.iter().copied().collect();
    for doc in documents {
        if !ids.insert(&doc.id) {
            return Err(Error::InvalidEpub(format!("duplicate manifest id {}", doc.id)));
        }
        if !hrefs.insert(&doc.href) {
            return Err(Error::InvalidEpub(format!("duplicate document {}", doc.href)));
        }
    }
    Ok(())
}

/// Generate content.opf from metadata and manifest.
fn generate_opf(
    context: &EpubTemplateContext<'_>,
    manifest: &[ManifestItem<'_>],
    documents: &[ContentDocument],
) -> String {
    let metadata = &context.metadata;
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );

    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_xml(&metadata.identifier)
    ));
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_xml(&metadata.title)
    ));
    opf.push_str(&format!(
        "    <dc:creator>{}</dc:creator>\n",
        escape_xml(&metadata.author)
    ));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(&metadata.language)
    ));
    if let Some(ref description) = metadata.description {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            escape_xml(description)
        ));
    }
    if let Some(ref publisher) = metadata.publisher {
        opf.push_str(&format!(
            "    <dc:publisher>{}</dc:publisher>\n",
            escape_xml(publisher)
        ));
    }
    opf.push_str(&format!(
        "    <dc:date>{}</dc:date>\n",
        escape_xml(&metadata.date)
    ));
    for subject in &metadata.subjects {
        opf.push_str(&format!(
            "    <dc:subject>{}</dc:subject>\n",
            escape_xml(subject)
        ));
    }
    if let Some(ref rights) = metadata.rights {
        opf.push_str(&format!(
            "    <dc:rights>{}</dc:rights>\n",
            escape_xml(rights)
        ));
    }
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        escape_xml(&metadata.modified)
    ));
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    for item in manifest {
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"",
            escape_xml(item.id),
            escape_xml(item.href),
            item.media_type
        ));
        if let Some(properties) = item.properties {
            opf.push_str(&format!(" properties=\"{properties}\""));
        }
        opf.push_str("/>\n");
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    for doc in documents {
        opf.push_str(&format!(
            "    <itemref idref=\"{}\"/>\n",
            escape_xml(&doc.id)
        ));
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}

/// Generate toc.ncx for EPUB 2 reading systems.
fn generate_ncx(context: &EpubTemplateContext<'_>, documents: &[ContentDocument]) -> String {
    let metadata = &context.metadata;
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
    );
    ncx.push_str(&escape_xml(&metadata.identifier));
    ncx.push_str(
        r#""/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape_xml(&metadata.title));
    ncx.push_str(
        r#"</text>
  </docTitle>
  <navMap>
"#,
    );

    for (i, doc) in documents.iter().enumerate() {
        let play_order = i + 1;
        ncx.push_str(&format!(
            "    <navPoint id=\"navPoint-{play_order}\" playOrder=\"{play_order}\">\n"
        ));
        ncx.push_str(&format!(
            "      <navLabel><text>{}</text></navLabel>\n",
            escape_xml(&doc.label)
        ));
        ncx.push_str(&format!(
            "      <content src=\"{}\"/>\n",
            escape_xml(&doc.href)
        ));
        ncx.push_str("    </navPoint>\n");
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

/// Generate the EPUB 3 navigation document.
fn generate_nav(context: &EpubTemplateContext<'_>, documents: &[ContentDocument]) -> String {
    let mut items = String::new();
    for doc in documents {
        items.push_str(&format!(
            "      <li><a href=\"{}\">{}</a></li>\n",
            escape_xml(&doc.href),
            escape_xml(&doc.label)
        ));
    }

    Placeholders::new()
        .set("language", context.metadata.language.as_str())
        .set("title", context.metadata.title.as_str())
        .set("nav_items", items)
        .render(NAV_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportOptions;
    use crate::export::epub::metadata::{EpubMetadata, MetadataDefaults};
    use crate::model::Project;

    fn doc(id: &str, href: &str) -> ContentDocument {
        ContentDocument {
            id: id.into(),
            href: href.into(),
            label: format!("Label {id}"),
            xhtml: "<html/>".into(),
        }
    }

    fn with_context<T>(f: impl FnOnce(&EpubTemplateContext<'_>) -> T) -> T {
        let project = Project::new("A & B", "");
        let options = ExportOptions::new("epub");
        let context = EpubTemplateContext {
            project: &project,
            options: &options,
            metadata: EpubMetadata::resolve(&project, &options, &MetadataDefaults::default()),
            css: "body {}",
        };
        f(&context)
    }

    #[test]
    fn test_manifest_matches_files() {
        let files = with_context(|ctx| {
            generate_manifest_and_nav(vec![doc("c1", "c1.xhtml"), doc("c2", "c2.xhtml")], ctx)
                .unwrap()
        });
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "META-INF/container.xml",
                "OEBPS/content.opf",
                "OEBPS/toc.ncx",
                "OEBPS/nav.xhtml",
                "OEBPS/stylesheet.css",
                "OEBPS/c1.xhtml",
                "OEBPS/c2.xhtml",
            ]
        );

        let opf = &files[1].content;
        assert!(opf.contains("<dc:title>A &amp; B</dc:title>"));
        assert!(opf.contains("<item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>"));
        assert!(opf.contains("<itemref idref=\"c1\"/>\n    <itemref idref=\"c2\"/>"));

        let nav = &files[3].content;
        assert!(nav.contains("<li><a href=\"c1.xhtml\">Label c1</a></li>"));
        assert!(files[2].content.contains("playOrder=\"2\""));
    }

    #[test]
    fn test_duplicate_documents_rejected() {
        let result = with_context(|ctx| {
            generate_manifest_and_nav(vec![doc("a", "a.xhtml"), doc("a", "b.xhtml")], ctx)
        });
        assert!(matches!(result, Err(Error::InvalidEpub(_))));

        let result = with_context(|ctx| generate_manifest_and_nav(vec![doc("x", "nav.xhtml")], ctx));
        assert!(matches!(result, Err(Error::InvalidEpub(_))));

        let result = with_context(|ctx| generate_manifest_and_nav(vec![doc("css", "s.xhtml")], ctx));
        assert!(matches!(result, Err(Error::InvalidEpub(_))));
    }
}
