//! PDF Tools API handler
//!
//! Serves exactly one request per invocation with the serverless variants of
//! every transform. Only `/api/convert/{word,jpg,ppt}` and `/api/merge` are
//! routed explicitly; every other `POST` path answers with document info.
//!
//! Uploads are pulled out of the body by the legacy line scanner unless
//! `PDFCONVERT_MULTIPART=strict` selects the full multipart decoder.

use std::io::{self, Write};
use std::str::FromStr;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, DATE};
use http::{Method, Request, Response, StatusCode};
use pdfconvert_core::dispatch::{self, ConversionRequest, Endpoint, Profile};
use pdfconvert_core::upload::{boundary_from_content_type, files_from_parts};
use pdfconvert_core::{
    extract_first_file, parse_multipart, response, status, ConvertError, UploadPolicy,
    UploadedFile,
};
use thiserror::Error;
use tracing::{debug, info};

pub const HEALTH_PATH: &str = "/api/health";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid PDFCONVERT_MAX_UPLOAD_MB: {0}")]
    InvalidUploadLimit(String),

    #[error("Invalid PDFCONVERT_MULTIPART: {0} (expected \"legacy\" or \"strict\")")]
    InvalidMultipartMode(String),
}

/// How file bytes are pulled out of a multipart body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultipartMode {
    /// First file part only, found by line scanning
    #[default]
    Legacy,
    /// Standards-compliant decode honouring field names
    Strict,
}

impl FromStr for MultipartMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(MultipartMode::Legacy),
            "strict" => Ok(MultipartMode::Strict),
            _ => Err(ConfigError::InvalidMultipartMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HandlerConfig {
    pub policy: UploadPolicy,
    pub multipart: MultipartMode,
}

impl HandlerConfig {
    pub fn new(policy: UploadPolicy, multipart: MultipartMode) -> Self {
        Self { policy, multipart }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let policy = match lookup("PDFCONVERT_MAX_UPLOAD_MB") {
            Some(raw) => {
                let mb = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidUploadLimit(raw.clone()))?;
                UploadPolicy::with_max_upload_mb(mb)
            }
            None => UploadPolicy::default(),
        };
        let multipart = match lookup("PDFCONVERT_MULTIPART") {
            Some(raw) => raw.parse()?,
            None => MultipartMode::default(),
        };
        Ok(Self::new(policy, multipart))
    }
}

/// Answer one request.
pub async fn handle(request: Request<Bytes>, config: &HandlerConfig) -> Response<Vec<u8>> {
    let path = request.uri().path().to_string();
    debug!(method = %request.method(), path = %path, "Handling request");

    let method = request.method().clone();
    if method == Method::OPTIONS {
        response::preflight()
    } else if method == Method::GET {
        let body = if path.trim_end_matches('/') == HEALTH_PATH {
            status::health(Profile::Serverless)
        } else {
            status::service_index(Profile::Serverless)
        };
        response::json_response(StatusCode::OK, &body)
    } else if method == Method::POST {
        response::encode(convert(request, &path, config).await)
    } else {
        response::error_body(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

/// Endpoint a `POST` path is served by. Paths without an explicit route,
/// including `/api/split`, fall through to info.
pub fn route(path: &str) -> Endpoint {
    match Endpoint::from_path(path) {
        Some(endpoint @ (Endpoint::Word | Endpoint::Jpg | Endpoint::Ppt | Endpoint::Merge)) => {
            endpoint
        }
        _ => Endpoint::Info,
    }
}

async fn convert(
    request: Request<Bytes>,
    path: &str,
    config: &HandlerConfig,
) -> Result<dispatch::Outcome, ConvertError> {
    let (parts, body) = request.into_parts();

    if let Some(declared) = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
    {
        config.policy.check_content_length(declared)?;
    }

    let endpoint = route(path);
    let files = match config.multipart {
        MultipartMode::Legacy => extract_first_file(&body).into_iter().collect(),
        MultipartMode::Strict => {
            let content_type = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            strict_files(body, content_type, endpoint).await?
        }
    };

    if files.is_empty() {
        return Err(ConvertError::Validation("No file provided".into()));
    }

    let requested_at = parts
        .headers
        .get(DATE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    info!(endpoint = %endpoint, files = files.len(), "Handling conversion");
    let request = ConversionRequest::new(endpoint, files).requested_at(requested_at);
    dispatch::handle(request, Profile::Serverless, &config.policy)
}

async fn strict_files(
    body: Bytes,
    content_type: &str,
    endpoint: Endpoint,
) -> Result<Vec<UploadedFile>, ConvertError> {
    let Some(boundary) = boundary_from_content_type(content_type) else {
        return Ok(Vec::new());
    };
    let parts = parse_multipart(body, &boundary).await?;
    Ok(files_from_parts(parts, endpoint.field_names()))
}

/// Write `response` in CGI form: a `Status:` line, headers, a blank line,
/// then the body.
pub fn write_cgi_response(response: &Response<Vec<u8>>, out: &mut impl Write) -> io::Result<()> {
    let status = response.status();
    write!(
        out,
        "Status: {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )?;
    for (name, value) in response.headers() {
        out.write_all(name.as_str().as_bytes())?;
        out.write_all(b": ")?;
        out.write_all(value.as_bytes())?;
        out.write_all(b"\r\n")?;
    }
    write!(out, "Content-Length: {}\r\n\r\n", response.body().len())?;
    out.write_all(response.body())?;
    out.flush()
}
