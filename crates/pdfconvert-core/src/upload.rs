//! Upload extraction
//!
//! Two ways of getting file bytes out of a `multipart/form-data` body:
//!
//! - [`parse_multipart`]: a standards-compliant decode (via `multer`) that
//!   returns every part.
//! - [`extract_first_file`]: the line-scanning extractor the serverless
//!   handler has always used. It only understands well-formed, single-file
//!   browser submissions and is kept bug-for-bug compatible:
//!   only the first file part is returned, the three lines after the
//!   `filename="` marker are skipped unconditionally, the boundary is
//!   recognised by a literal `------` prefix, and the CRLF-delimited line
//!   right before the boundary is dropped.

use std::convert::Infallible;

use bytes::Bytes;
use tracing::debug;

use crate::error::ConvertError;

/// A file received with a request. Lives for one request only.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Size announced by the transport, if it announced one
    pub declared_size: Option<u64>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            declared_size: None,
        }
    }

    pub fn size(&self) -> u64 {
        self.declared_size.unwrap_or(self.bytes.len() as u64)
    }
}

/// One decoded part of a multipart body
#[derive(Debug, Clone)]
pub struct Part {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub bytes: Bytes,
}

/// Pull the boundary out of a `multipart/form-data; boundary=...` header value.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    multer::parse_boundary(content_type).ok()
}

/// Decode every part of a multipart body.
pub async fn parse_multipart(body: Bytes, boundary: &str) -> Result<Vec<Part>, ConvertError> {
    let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ConvertError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        let filename = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ConvertError::Validation(format!("Failed to read upload: {}", e)))?;
        debug!(?name, ?filename, len = bytes.len(), "Decoded multipart part");
        parts.push(Part {
            name,
            filename,
            bytes,
        });
    }

    Ok(parts)
}

/// Keep the file parts submitted under one of `field_names`, in body order.
pub fn files_from_parts(parts: Vec<Part>, field_names: &[&str]) -> Vec<UploadedFile> {
    parts
        .into_iter()
        .filter(|part| {
            part.name
                .as_deref()
                .is_some_and(|name| field_names.contains(&name))
        })
        .filter_map(|part| {
            let filename = part.filename?;
            Some(UploadedFile::new(filename, part.bytes.to_vec()))
        })
        .collect()
}

const FILENAME_MARKER: &[u8] = b"filename=\"";
const BOUNDARY_PREFIX: &[u8] = b"------";
const HEADER_LINES_SKIPPED: usize = 3;

/// Line-scanning extraction of the first file part (see module docs for the
/// limitations this deliberately keeps).
pub fn extract_first_file(body: &[u8]) -> Option<UploadedFile> {
    if find(body, b"filename").is_none() {
        return None;
    }

    let lines = split_crlf(body);
    let mut start = None;
    let mut end = None;
    let mut filename = String::new();

    for (i, line) in lines.iter().enumerate() {
        if find(line, FILENAME_MARKER).is_some() {
            start = Some(i + HEADER_LINES_SKIPPED);
            filename = filename_attribute(line);
        }
        if start.is_some() && line.starts_with(BOUNDARY_PREFIX) {
            end = Some(i);
            break;
        }
    }

    let (start, end) = (start?, end?);
    let stop = end.saturating_sub(1);
    let bytes = if start < stop {
        lines[start..stop].join(&b"\r\n"[..])
    } else {
        Vec::new()
    };

    debug!(%filename, start, end, len = bytes.len(), "Legacy extractor found file part");
    Some(UploadedFile::new(filename, bytes))
}

fn split_crlf(body: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut rest = body;
    while let Some(pos) = find(rest, b"\r\n") {
        lines.push(&rest[..pos]);
        rest = &rest[pos + 2..];
    }
    lines.push(rest);
    lines
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn filename_attribute(line: &[u8]) -> String {
    let Some(pos) = find(line, FILENAME_MARKER) else {
        return String::new();
    };
    let value = &line[pos + FILENAME_MARKER.len()..];
    let value = match value.iter().position(|&b| b == b'"') {
        Some(close) => &value[..close],
        None => value,
    };
    String::from_utf8_lossy(value).into_owned()
}

/// Reduce an upload name to something safe to echo back in a download name.
///
/// Non-ASCII characters are dropped, path separators become spaces,
/// whitespace runs collapse to `_`, anything outside `[A-Za-z0-9_.-]` is
/// removed, and leading/trailing `.` and `_` are trimmed.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

    fn part(name: &str, filename: &str, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        out.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        out.extend_from_slice(data);
        out.extend_from_slice(b"\r\n");
        out
    }

    fn body(parts: &[Vec<u8>]) -> Vec<u8> {
        let mut out = parts.concat();
        out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        out
    }

    #[test]
    fn test_legacy_extracts_crlf_terminated_pdf() {
        let pdf = fixtures::crlf_terminated(fixtures::text_pdf(&["Hello"]));
        let raw = body(&[part("file", "hello.pdf", &pdf)]);

        let file = extract_first_file(&raw).unwrap();
        assert_eq!(file.filename, "hello.pdf");
        // The dropped line is the empty remainder after the PDF's own CRLF.
        assert_eq!(file.bytes, pdf[..pdf.len() - 2].to_vec());
        assert!(lopdf::Document::load_mem(&file.bytes).is_ok());
    }

    #[test]
    fn test_legacy_drops_last_line_before_boundary() {
        let raw = body(&[part("file", "a.pdf", b"first\r\nsecond\r\nthird")]);
        let file = extract_first_file(&raw).unwrap();
        assert_eq!(file.bytes, b"first\r\nsecond".to_vec());
    }

    #[test]
    fn test_legacy_single_line_payload_is_lost() {
        let raw = body(&[part("file", "a.pdf", b"no line breaks here")]);
        let file = extract_first_file(&raw).unwrap();
        assert!(file.bytes.is_empty());
    }

    #[test]
    fn test_legacy_returns_only_first_file_part() {
        let raw = body(&[
            part("files", "one.pdf", b"one\r\n"),
            part("files", "two.pdf", b"two\r\n"),
        ]);
        let file = extract_first_file(&raw).unwrap();
        assert_eq!(file.filename, "one.pdf");
        assert_eq!(file.bytes, b"one".to_vec());
    }

    #[test]
    fn test_legacy_without_filename_finds_nothing() {
        let raw = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhi\r\n--{b}--\r\n",
            b = BOUNDARY
        );
        assert!(extract_first_file(raw.as_bytes()).is_none());
    }

    #[test]
    fn test_legacy_without_boundary_finds_nothing() {
        let raw = b"Content-Disposition: form-data; name=\"file\"; filename=\"a.pdf\"\r\n\r\n\r\ndata";
        assert!(extract_first_file(raw).is_none());
    }

    #[tokio::test]
    async fn test_parse_multipart_returns_every_part() {
        let raw = body(&[
            part("files", "one.pdf", b"one"),
            part("files", "two.pdf", b"two"),
        ]);
        let parts = parse_multipart(Bytes::from(raw), BOUNDARY).await.unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].filename.as_deref(), Some("one.pdf"));
        assert_eq!(parts[1].bytes, Bytes::from_static(b"two"));

        let files = files_from_parts(parts, &["files"]);
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].filename, "two.pdf");
    }

    #[tokio::test]
    async fn test_parse_multipart_keeps_payload_intact() {
        let pdf = fixtures::text_pdf(&["Intact"]);
        let raw = body(&[part("file", "intact.pdf", &pdf)]);
        let parts = parse_multipart(Bytes::from(raw), BOUNDARY).await.unwrap();
        assert_eq!(parts[0].bytes.to_vec(), pdf);
    }

    #[test]
    fn test_files_from_parts_filters_by_field() {
        let parts = vec![
            Part {
                name: Some("file".into()),
                filename: Some("keep.pdf".into()),
                bytes: Bytes::from_static(b"x"),
            },
            Part {
                name: Some("other".into()),
                filename: Some("skip.pdf".into()),
                bytes: Bytes::from_static(b"y"),
            },
            Part {
                name: Some("file".into()),
                filename: None,
                bytes: Bytes::from_static(b"plain field"),
            },
        ];
        let files = files_from_parts(parts, &["file"]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "keep.pdf");
    }

    #[test]
    fn test_boundary_from_content_type() {
        assert_eq!(
            boundary_from_content_type(&format!("multipart/form-data; boundary={}", BOUNDARY)),
            Some(BOUNDARY.to_string())
        );
        assert_eq!(boundary_from_content_type("application/json"), None);
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My cool report.pdf"), "My_cool_report.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("résumé.pdf"), "rsum.pdf");
        assert_eq!(secure_filename("  _hidden.pdf"), "hidden.pdf");
        assert_eq!(secure_filename("a;b|c.pdf"), "abc.pdf");
    }

    proptest! {
        #[test]
        fn secure_filename_only_emits_safe_chars(name in "\\PC{0,40}") {
            let safe = secure_filename(&name);
            prop_assert!(safe
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')));
            prop_assert!(!safe.starts_with('.') && !safe.starts_with('_'));
            prop_assert!(!safe.ends_with('.') && !safe.ends_with('_'));
        }
    }
}
