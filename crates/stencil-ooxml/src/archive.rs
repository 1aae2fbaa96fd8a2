//! ZIP container codec.
//!
//! A document archive is an ordered list of named parts. Exactly one part is
//! the main document; everything else is copied through byte-identical on
//! repack, in the original order.

use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{OoxmlError, Result};

/// Path of the main document part.
pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// Path of the content-types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Path of the package relationships part.
pub const RELATIONSHIPS_PART: &str = "_rels/.rels";

const MIN_ARCHIVE_BYTES: usize = 1000;
const MAX_ARCHIVE_BYTES: usize = 100 * 1024 * 1024;

/// The local-file-header signature every ZIP archive starts with.
const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// An opened document archive.
#[derive(Debug, Clone)]
pub struct Archive {
    parts: Vec<Part>,
}

impl Archive {
    /// Open an archive from bytes, verifying size bounds, the container
    /// signature, and the presence of the mandatory parts.
    pub fn open(bytes: &[u8]) -> Result<Archive> {
        if bytes.len() < MIN_ARCHIVE_BYTES {
            return Err(OoxmlError::TooSmall { size: bytes.len() });
        }
        if bytes.len() > MAX_ARCHIVE_BYTES {
            return Err(OoxmlError::TooLarge { size: bytes.len() });
        }
        if bytes[..4] != ZIP_SIGNATURE {
            return Err(OoxmlError::InvalidContainer {
                reason: "missing local file header signature".to_string(),
            });
        }

        let mut zip =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| OoxmlError::InvalidContainer {
                reason: e.to_string(),
            })?;

        let mut parts = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(|e| OoxmlError::InvalidContainer {
                reason: e.to_string(),
            })?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| OoxmlError::CorruptedPart {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            parts.push(Part { name, data });
        }

        let archive = Archive { parts };
        for required in [CONTENT_TYPES_PART, RELATIONSHIPS_PART, MAIN_DOCUMENT_PART] {
            if archive.part(required).is_none() {
                return Err(OoxmlError::MissingPart {
                    name: required.to_string(),
                });
            }
        }

        tracing::debug!(parts = archive.parts.len(), "opened document archive");
        Ok(archive)
    }

    fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Names of all parts, in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Read the main document part as text.
    pub fn read_main(&self) -> Result<String> {
        let part = self
            .part(MAIN_DOCUMENT_PART)
            .ok_or_else(|| OoxmlError::MissingPart {
                name: MAIN_DOCUMENT_PART.to_string(),
            })?;
        String::from_utf8(part.data.clone()).map_err(|e| OoxmlError::CorruptedPart {
            name: MAIN_DOCUMENT_PART.to_string(),
            reason: e.to_string(),
        })
    }

    /// Replace the main document part's content.
    pub fn write_main(&mut self, content: String) {
        if let Some(part) = self.parts.iter_mut().find(|p| p.name == MAIN_DOCUMENT_PART) {
            part.data = content.into_bytes();
        }
    }

    /// Serialize the archive back to bytes, preserving part order.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options.clone())
                .map_err(|e| OoxmlError::InvalidContainer {
                    reason: e.to_string(),
                })?;
            zip.write_all(&part.data)?;
        }

        let cursor = zip.finish().map_err(|e| OoxmlError::InvalidContainer {
            reason: e.to_string(),
        })?;
        Ok(cursor.into_inner())
    }
}
