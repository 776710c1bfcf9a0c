//! HTTP response encoding shared by both entry points.

use http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_DISPOSITION, CONTENT_TYPE,
};
use http::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::dispatch::Outcome;
use crate::error::{ConvertError, ErrorKind};
use crate::transform::ConversionResult;

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type";

pub fn status_for(err: &ConvertError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Parse | ErrorKind::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn encode(result: Result<Outcome, ConvertError>) -> Response<Vec<u8>> {
    match result {
        Ok(Outcome::Artifact(artifact)) => artifact_response(artifact),
        Ok(Outcome::Report(report)) => json_response(StatusCode::OK, &report),
        Err(err) => error_response(&err),
    }
}

/// 200 with the payload as an attachment download.
pub fn artifact_response(artifact: ConversionResult) -> Response<Vec<u8>> {
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);

    let mut response = Response::new(artifact.payload);
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    match HeaderValue::from_str(&artifact.content_type) {
        Ok(value) => {
            headers.insert(CONTENT_TYPE, value);
        }
        Err(_) => {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
        }
    }
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    headers.insert(CONTENT_DISPOSITION, disposition);
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Vec<u8>> {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };
    with_json_headers(status, bytes)
}

/// `{"error": message}` with 400 for validation failures and 500 otherwise.
pub fn error_response(err: &ConvertError) -> Response<Vec<u8>> {
    let status = status_for(err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    error_body(status, &err.to_string())
}

pub fn error_body(status: StatusCode, message: &str) -> Response<Vec<u8>> {
    let bytes = serde_json::to_vec(&json!({ "error": message })).unwrap_or_default();
    with_json_headers(status, bytes)
}

/// Answer to an `OPTIONS` preflight.
pub fn preflight() -> Response<Vec<u8>> {
    let mut response = Response::new(Vec::new());
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}

fn with_json_headers(status: StatusCode, bytes: Vec<u8>) -> Response<Vec<u8>> {
    let mut response = Response::new(bytes);
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InfoReport;
    use crate::transform::PDF_MIME;
    use pretty_assertions::assert_eq;

    fn header<'a>(response: &'a Response<Vec<u8>>, name: http::header::HeaderName) -> &'a str {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[test]
    fn test_artifact_headers() {
        let response = encode(Ok(Outcome::Artifact(ConversionResult::new(
            b"%PDF".to_vec(),
            "merged.pdf",
            PDF_MIME,
        ))));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, CONTENT_TYPE), "application/pdf");
        assert_eq!(
            header(&response, CONTENT_DISPOSITION),
            "attachment; filename=\"merged.pdf\""
        );
        assert_eq!(header(&response, ACCESS_CONTROL_ALLOW_ORIGIN), "*");
        assert_eq!(response.body(), &b"%PDF".to_vec());
    }

    #[test]
    fn test_report_is_json() {
        let report = InfoReport::Brief {
            pages: 1,
            encrypted: false,
            size: "1.00 KB".into(),
        };
        let response = encode(Ok(Outcome::Report(report)));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, CONTENT_TYPE), "application/json");

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["pages"], 1);
    }

    #[test]
    fn test_validation_error_is_400() {
        let response = encode(Err(ConvertError::Validation("No file provided".into())));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(header(&response, ACCESS_CONTROL_ALLOW_ORIGIN), "*");

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"error": "No file provided"}));
    }

    #[test]
    fn test_parse_error_is_500_with_raw_message() {
        let response = encode(Err(ConvertError::ParseError("invalid file header".into())));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], "Failed to parse PDF: invalid file header");
    }

    #[test]
    fn test_preflight_headers() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, ACCESS_CONTROL_ALLOW_METHODS), ALLOWED_METHODS);
        assert_eq!(header(&response, ACCESS_CONTROL_ALLOW_HEADERS), ALLOWED_HEADERS);
    }
}
