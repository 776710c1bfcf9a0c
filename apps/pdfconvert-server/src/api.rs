//! API handlers for the PDFConvert server
//!
//! Each conversion route collects its uploads from the multipart body and
//! hands them to `pdfconvert_core::handle` on the blocking pool.

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header::DATE, HeaderMap, StatusCode},
    response::Response,
};
use pdfconvert_core::{
    dispatch::{self, ConversionRequest, Endpoint, Profile},
    response, status, ConvertError, UploadPolicy, UploadedFile,
};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

fn into_axum(response: axum::http::Response<Vec<u8>>) -> Response {
    response.map(Body::from)
}

/// Handler: GET /
pub async fn handle_index() -> Response {
    into_axum(response::json_response(
        StatusCode::OK,
        &status::service_index(Profile::Standalone),
    ))
}

/// Handler: GET /health
pub async fn handle_health() -> Response {
    into_axum(response::json_response(
        StatusCode::OK,
        &status::health(Profile::Standalone),
    ))
}

pub async fn handle_convert_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    convert(Endpoint::Word, state, headers, multipart).await
}

pub async fn handle_convert_jpg(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    convert(Endpoint::Jpg, state, headers, multipart).await
}

pub async fn handle_convert_ppt(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    convert(Endpoint::Ppt, state, headers, multipart).await
}

pub async fn handle_merge(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    convert(Endpoint::Merge, state, headers, multipart).await
}

pub async fn handle_split(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    convert(Endpoint::Split, state, headers, multipart).await
}

pub async fn handle_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    convert(Endpoint::Info, state, headers, multipart).await
}

async fn convert(
    endpoint: Endpoint,
    state: AppState,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let multipart = multipart.map_err(|rejection| {
        debug!("Multipart rejected: {}", rejection);
        ConvertError::Validation("No file provided".into())
    })?;
    let files = collect_files(multipart, endpoint, &state.policy).await?;

    let requested_at = headers
        .get(DATE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    info!(endpoint = %endpoint, files = files.len(), "Handling conversion");

    let request = ConversionRequest::new(endpoint, files).requested_at(requested_at);
    let policy = state.policy;
    let outcome = tokio::task::spawn_blocking(move || {
        dispatch::handle(request, Profile::Standalone, &policy)
    })
    .await??;

    Ok(into_axum(response::encode(Ok(outcome))))
}

/// Read the file parts submitted under the endpoint's field names.
async fn collect_files(
    mut multipart: Multipart,
    endpoint: Endpoint,
    policy: &UploadPolicy,
) -> Result<Vec<UploadedFile>, ConvertError> {
    let field_names = endpoint.field_names();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error(e, policy))?
    {
        let name = field.name().map(str::to_owned);
        let filename = field.file_name().map(str::to_owned);

        let bytes = field.bytes().await.map_err(|e| read_error(e, policy))?;

        let wanted = name.as_deref().is_some_and(|n| field_names.contains(&n));
        match filename {
            Some(filename) if wanted => {
                debug!(filename = %filename, len = bytes.len(), "Received upload");
                files.push(UploadedFile::new(filename, bytes.to_vec()));
            }
            _ => debug!(?name, "Skipping multipart field"),
        }
    }

    Ok(files)
}

/// Body-limit overflows surface as the policy's size error.
fn read_error(err: MultipartError, policy: &UploadPolicy) -> ConvertError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        policy.too_large()
    } else {
        ConvertError::Validation(err.body_text())
    }
}
