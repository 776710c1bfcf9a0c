//! Endpoint dispatch
//!
//! Both entry points translate their transport's request into a
//! [`ConversionRequest`] and call [`handle`]. The [`Profile`] selects the
//! entry point's variant of each transform.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::UploadPolicy;
use crate::error::ConvertError;
use crate::inspect::{self, describe, PdfMetadata};
use crate::merge::merge_documents;
use crate::split::split_first_page;
use crate::transform::{self, ConversionResult, TransformContext, PDF_MIME};
use crate::upload::UploadedFile;

/// Which entry point a request arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Long-running multi-route server
    Standalone,
    /// One request per invocation
    Serverless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Word,
    Jpg,
    Ppt,
    Merge,
    Split,
    Info,
}

impl Endpoint {
    pub const ALL: [Endpoint; 6] = [
        Endpoint::Word,
        Endpoint::Jpg,
        Endpoint::Ppt,
        Endpoint::Merge,
        Endpoint::Split,
        Endpoint::Info,
    ];

    /// Route path without the `/api` prefix
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Word => "/convert/word",
            Endpoint::Jpg => "/convert/jpg",
            Endpoint::Ppt => "/convert/ppt",
            Endpoint::Merge => "/merge",
            Endpoint::Split => "/split",
            Endpoint::Info => "/info",
        }
    }

    /// Resolve a request path, with or without the `/api` prefix.
    pub fn from_path(path: &str) -> Option<Endpoint> {
        let path = path.split('?').next().unwrap_or(path);
        let path = path.strip_prefix("/api").unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);
        Self::ALL.into_iter().find(|endpoint| endpoint.path() == path)
    }

    /// Multipart field names the endpoint reads files from
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            Endpoint::Merge => &["files", "files[]"],
            _ => &["file"],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub endpoint: Endpoint,
    pub files: Vec<UploadedFile>,
    /// Value of the request's `Date` header
    pub requested_at: Option<String>,
}

impl ConversionRequest {
    pub fn new(endpoint: Endpoint, files: Vec<UploadedFile>) -> Self {
        Self {
            endpoint,
            files,
            requested_at: None,
        }
    }

    pub fn requested_at(mut self, date: Option<String>) -> Self {
        self.requested_at = date;
        self
    }
}

/// JSON body of the info endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InfoReport {
    Full {
        filename: String,
        pages: u32,
        encrypted: bool,
        metadata: Option<BTreeMap<String, String>>,
        size: String,
    },
    Brief {
        pages: u32,
        encrypted: bool,
        size: String,
    },
}

impl InfoReport {
    pub fn new(profile: Profile, filename: &str, meta: PdfMetadata) -> Self {
        let size = meta.size_label();
        match profile {
            Profile::Standalone => InfoReport::Full {
                filename: filename.to_string(),
                pages: meta.page_count,
                encrypted: meta.encrypted,
                metadata: meta.raw_metadata,
                size,
            },
            Profile::Serverless => InfoReport::Brief {
                pages: meta.page_count,
                encrypted: meta.encrypted,
                size,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Binary download
    Artifact(ConversionResult),
    /// Structured JSON answer
    Report(InfoReport),
}

/// Validate, inspect and transform one request. Nothing is transformed until
/// every file has passed validation and parsed as a PDF.
pub fn handle(
    request: ConversionRequest,
    profile: Profile,
    policy: &UploadPolicy,
) -> Result<Outcome, ConvertError> {
    let ConversionRequest {
        endpoint,
        files,
        requested_at,
    } = request;

    check_arity(endpoint, profile, files.len())?;

    let mut documents = Vec::with_capacity(files.len());
    for file in &files {
        policy.validate(file)?;
        let doc = inspect::load(&file.bytes)?;
        debug!(
            endpoint = %endpoint,
            filename = %file.filename,
            bytes = file.bytes.len(),
            "Accepted upload"
        );
        documents.push(doc);
    }

    let ctx = TransformContext {
        profile,
        requested_at: requested_at.as_deref(),
    };
    let first = &files[0];
    let first_doc = &documents[0];

    let outcome = match endpoint {
        Endpoint::Word => Outcome::Artifact(transform::to_word_like(first, first_doc, ctx)),
        Endpoint::Ppt => Outcome::Artifact(transform::to_ppt_like(first, first_doc, ctx)),
        Endpoint::Jpg => {
            let page_count = first_doc.get_pages().len() as u32;
            Outcome::Artifact(transform::to_jpg_like(first, page_count, ctx)?)
        }
        Endpoint::Merge => {
            let inputs = files.into_iter().map(|file| file.bytes).collect();
            let merged = merge_documents(inputs)?;
            Outcome::Artifact(ConversionResult::new(merged, "merged.pdf", PDF_MIME))
        }
        Endpoint::Split => {
            let page = split_first_page(&first.bytes)?;
            Outcome::Artifact(ConversionResult::new(page, "split_page_1.pdf", PDF_MIME))
        }
        Endpoint::Info => {
            let meta = describe(first_doc, first.bytes.len());
            Outcome::Report(InfoReport::new(profile, &first.filename, meta))
        }
    };

    if let Outcome::Artifact(result) = &outcome {
        info!(
            endpoint = %endpoint,
            output = %result.filename,
            bytes = result.payload.len(),
            "Conversion complete"
        );
    }
    Ok(outcome)
}

fn check_arity(endpoint: Endpoint, profile: Profile, count: usize) -> Result<(), ConvertError> {
    match (endpoint, profile) {
        (Endpoint::Merge, _) if count == 0 => {
            Err(ConvertError::Validation("No files provided".into()))
        }
        (Endpoint::Merge, Profile::Standalone) if count < 2 => Err(ConvertError::Validation(
            "Please provide at least 2 PDF files".into(),
        )),
        (Endpoint::Merge, Profile::Serverless) if count != 1 => Err(ConvertError::Validation(
            "Exactly one PDF file is accepted".into(),
        )),
        (_, _) if count == 0 => Err(ConvertError::Validation("No file provided".into())),
        _ => Ok(()),
    }
}
