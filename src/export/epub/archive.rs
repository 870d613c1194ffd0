//! Zip container writer.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::Result;

use super::EpubConfig;
use super::template::EpubFile;

pub(crate) const MIMETYPE: &[u8] = b"application/epub+zip";

/// Pack files into an EPUB container.
///
/// `mimetype` is written first and stored uncompressed; everything else is
/// deflated. All entries carry the zip epoch as their timestamp so identical
/// input produces identical bytes.
pub(crate) fn write_archive(files: &[EpubFile], config: &EpubConfig) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let compression_level = config.compression_level.unwrap_or(6);
    let stored = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());
    let deflated = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(compression_level as i64))
        .last_modified_time(DateTime::default());

    // Must be first, uncompressed
    zip.start_file("mimetype", stored)?;
    zip.write_all(MIMETYPE)?;

    for file in files {
        zip.start_file(file.path.as_str(), deflated)?;
        zip.write_all(file.content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    #[test]
    fn test_mimetype_first_and_stored() {
        let files = vec![EpubFile::new("OEBPS/a.xhtml", "<html/>", "application/xhtml+xml")];
        let bytes = write_archive(&files, &EpubConfig::default()).unwrap();

        // The first local header names "mimetype" right after its fixed 30 bytes.
        assert_eq!(&bytes[0..4], b"PK\x03\x04");
        assert_eq!(&bytes[30..38], b"mimetype");

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        drop(first);

        let mut content = String::new();
        archive
            .by_name("OEBPS/a.xhtml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<html/>");
    }

    #[test]
    fn test_output_is_deterministic() {
        let files = vec![EpubFile::new("OEBPS/a.css", "p {}", "text/css")];
        let config = EpubConfig::default();
        assert_eq!(
            write_archive(&files, &config).unwrap(),
            write_archive(&files, &config).unwrap()
        );
    }
}
