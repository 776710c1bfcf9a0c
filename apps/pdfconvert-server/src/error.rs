//! Error types for the PDFConvert server

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pdfconvert_core::{response, ConvertError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Conversion task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = match &self {
            ServerError::Convert(err) => response::error_response(err),
            ServerError::Join(err) => {
                tracing::error!("Conversion task failed: {}", err);
                response::error_body(StatusCode::INTERNAL_SERVER_ERROR, &self.to_string())
            }
        };
        response.map(Body::from)
    }
}
