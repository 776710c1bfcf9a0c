use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// Rejected upload: missing file, bad extension, too large, wrong arity.
    #[error("{0}")]
    Validation(String),

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Image rendering failed: {0}")]
    Render(String),
}

/// Coarse classification used to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Parse,
    Unhandled,
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Validation(_) => ErrorKind::Validation,
            ConvertError::ParseError(_) => ErrorKind::Parse,
            ConvertError::InvalidRange(_)
            | ConvertError::OperationError(_)
            | ConvertError::Render(_) => ErrorKind::Unhandled,
        }
    }
}
