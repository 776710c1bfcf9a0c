//! PDF conversion core
//!
//! Everything the two PDFConvert entry points share: upload extraction,
//! PDF inspection, merge/split, the placeholder transforms, dispatch and
//! HTTP response encoding.
//!
//! A request flows `upload` -> `dispatch::handle` -> `response::encode`.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod inspect;
pub mod merge;
pub mod render;
pub mod response;
pub mod split;
pub mod status;
pub mod transform;
pub mod upload;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use config::UploadPolicy;
pub use dispatch::{handle, ConversionRequest, Endpoint, InfoReport, Outcome, Profile};
pub use error::{ConvertError, ErrorKind};
pub use inspect::{inspect, page_at, pages, PdfMetadata};
pub use merge::merge_documents;
pub use split::{extract_page, split_first_page};
pub use transform::ConversionResult;
pub use upload::{extract_first_file, parse_multipart, secure_filename, UploadedFile};
