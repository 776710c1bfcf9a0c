//! Upload limits shared by both entry points.

use crate::error::ConvertError;
use crate::upload::UploadedFile;

/// 50 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Room for multipart boundaries and part headers on top of one file.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Read-only limits applied to every uploaded file
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: u64,
    /// Lowercase extensions without the leading dot
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec!["pdf".to_string()],
        }
    }
}

impl UploadPolicy {
    pub fn with_max_upload_mb(max_upload_mb: u64) -> Self {
        Self {
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Whether `filename` carries one of the allowed extensions (case-insensitive).
    pub fn allows(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    /// Largest accepted request body. Each file is still held to
    /// `max_upload_bytes` by [`UploadPolicy::validate`].
    pub fn max_body_bytes(&self) -> u64 {
        self.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
    }

    /// Reject a request whose declared body length is already over the limit.
    pub fn check_content_length(&self, declared: u64) -> Result<(), ConvertError> {
        if declared > self.max_body_bytes() {
            return Err(self.too_large());
        }
        Ok(())
    }

    pub fn validate(&self, file: &UploadedFile) -> Result<(), ConvertError> {
        if file.filename.is_empty() {
            return Err(ConvertError::Validation("No file selected".into()));
        }
        if !self.allows(&file.filename) {
            return Err(ConvertError::Validation("Please provide a PDF file".into()));
        }
        if file.size() > self.max_upload_bytes {
            return Err(self.too_large());
        }
        Ok(())
    }

    pub fn too_large(&self) -> ConvertError {
        ConvertError::Validation(format!(
            "File too large (maximum {} MB)",
            self.max_upload_bytes / (1024 * 1024)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn file(name: &str, len: usize) -> UploadedFile {
        UploadedFile::new(name, vec![0u8; len])
    }

    #[test]
    fn test_allows_pdf_case_insensitive() {
        let policy = UploadPolicy::default();
        assert!(policy.allows("report.pdf"));
        assert!(policy.allows("REPORT.PDF"));
        assert!(policy.allows("archive.tar.Pdf"));
        assert!(!policy.allows("report.txt"));
        assert!(!policy.allows("pdf"));
    }

    #[test]
    fn test_empty_filename_rejected() {
        let err = UploadPolicy::default().validate(&file("", 10)).unwrap_err();
        assert_eq!(err.to_string(), "No file selected");
    }

    #[test]
    fn test_wrong_extension_rejected() {
        let err = UploadPolicy::default()
            .validate(&file("report.txt", 10))
            .unwrap_err();
        assert_eq!(err.to_string(), "Please provide a PDF file");
    }

    #[test]
    fn test_declared_size_over_limit_rejected() {
        let policy = UploadPolicy::with_max_upload_mb(1);
        let mut upload = file("big.pdf", 10);
        upload.declared_size = Some(2 * 1024 * 1024);
        let err = policy.validate(&upload).unwrap_err();
        assert_eq!(err.to_string(), "File too large (maximum 1 MB)");
        assert!(policy.check_content_length(2 * 1024 * 1024).is_err());
        assert!(policy.check_content_length(1024).is_ok());
    }

    #[test]
    fn test_body_limit_leaves_room_for_multipart_framing() {
        let policy = UploadPolicy::with_max_upload_mb(1);
        assert_eq!(policy.max_body_bytes(), 1024 * 1024 + MULTIPART_OVERHEAD_BYTES);
        assert!(policy.check_content_length(1024 * 1024 + 512).is_ok());

        let err = policy.validate(&file("big.pdf", 1024 * 1024 + 512)).unwrap_err();
        assert_eq!(err.to_string(), "File too large (maximum 1 MB)");
    }

    proptest! {
        #[test]
        fn non_pdf_extensions_always_rejected(
            stem in "[a-z]{1,12}",
            ext in "[a-z]{1,4}".prop_filter("not pdf", |e| e != "pdf")
        ) {
            let policy = UploadPolicy::default();
            let name = format!("{}.{}", stem, ext);
            prop_assert!(policy.validate(&file(&name, 1)).is_err());
        }

        #[test]
        fn pdf_uploads_under_limit_accepted(stem in "[A-Za-z0-9_]{1,20}", len in 0usize..4096) {
            let policy = UploadPolicy::default();
            let name = format!("{}.pdf", stem);
            prop_assert!(policy.validate(&file(&name, len)).is_ok());
        }
    }
}
