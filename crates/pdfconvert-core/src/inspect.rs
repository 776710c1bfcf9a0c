//! PDF inspection: page count, encryption flag, document info and per-page text.

use std::collections::BTreeMap;

use lopdf::{Document, Object};
use serde::Serialize;
use tracing::debug;

use crate::error::ConvertError;
use crate::split::extract_page;

/// Read-only view of an uploaded PDF, recomputed per request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfMetadata {
    pub page_count: u32,
    pub encrypted: bool,
    /// Entries of the `/Info` dictionary keyed by PDF name (`/Title`, ...)
    pub raw_metadata: Option<BTreeMap<String, String>>,
    pub size_kb: f64,
}

impl PdfMetadata {
    /// e.g. `"12.34 KB"`
    pub fn size_label(&self) -> String {
        format!("{:.2} KB", self.size_kb)
    }
}

/// Parse PDF bytes, mapping any failure to [`ConvertError::ParseError`].
pub fn load(bytes: &[u8]) -> Result<Document, ConvertError> {
    Document::load_mem(bytes).map_err(|e| ConvertError::ParseError(e.to_string()))
}

pub fn inspect(bytes: &[u8]) -> Result<PdfMetadata, ConvertError> {
    let doc = load(bytes)?;
    Ok(describe(&doc, bytes.len()))
}

/// Metadata for an already-parsed document of `len` bytes.
pub fn describe(doc: &Document, len: usize) -> PdfMetadata {
    PdfMetadata {
        page_count: doc.get_pages().len() as u32,
        encrypted: doc.trailer.get(b"Encrypt").is_ok(),
        raw_metadata: info_dictionary(doc),
        size_kb: len as f64 / 1024.0,
    }
}

/// Single-page PDF holding page `index` (0-based).
pub fn page_at(bytes: &[u8], index: u32) -> Result<Vec<u8>, ConvertError> {
    extract_page(bytes, index)
}

/// Every page as its own PDF, in document order.
pub fn pages(bytes: &[u8]) -> Result<Vec<Vec<u8>>, ConvertError> {
    let count = load(bytes)?.get_pages().len() as u32;
    (0..count).map(|index| page_at(bytes, index)).collect()
}

/// Extracted text for each page in order. `None` marks a page with no
/// extractable text, including pages whose fonts lopdf cannot decode.
pub fn page_texts(doc: &Document) -> Vec<Option<String>> {
    doc.get_pages()
        .keys()
        .map(|&number| match doc.extract_text(&[number]) {
            Ok(text) => {
                let text = text.trim_end_matches('\n');
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                debug!("No text extracted from page {}: {}", number, e);
                None
            }
        })
        .collect()
}

fn info_dictionary(doc: &Document) -> Option<BTreeMap<String, String>> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let dict = info.as_dict().ok()?;

    let entries = dict
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Object::String(bytes, _) => decode_text_string(bytes),
                Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
                Object::Integer(i) => i.to_string(),
                Object::Real(r) => r.to_string(),
                Object::Boolean(b) => b.to_string(),
                _ => return None,
            };
            Some((format!("/{}", String::from_utf8_lossy(key)), value))
        })
        .collect();

    Some(entries)
}

/// PDF text strings are UTF-16BE when they start with a BOM, otherwise a
/// single-byte encoding that agrees with Latin-1 for printable text.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
