//! Service index and liveness bodies.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::dispatch::Profile;

pub const STANDALONE_SERVICE: &str = "PDFConvert Pro API";
pub const SERVERLESS_SERVICE: &str = "PDF Tools API";

/// Endpoint listing served on `GET /`.
pub fn service_index(profile: Profile) -> Value {
    match profile {
        Profile::Standalone => json!({
            "message": "PDFConvert Pro API is running!",
            "version": "1.0",
            "endpoints": {
                "convert_to_word": "/convert/word",
                "convert_to_jpg": "/convert/jpg",
                "convert_to_ppt": "/convert/ppt",
                "merge_pdfs": "/merge",
                "split_pdf": "/split",
                "pdf_info": "/info",
            }
        }),
        Profile::Serverless => json!({
            "message": SERVERLESS_SERVICE,
            "endpoints": {
                "POST /api/convert/word": "Convert PDF to Word",
                "POST /api/convert/jpg": "Convert PDF to JPG",
                "POST /api/convert/ppt": "Convert PDF to PowerPoint",
                "POST /api/merge": "Merge PDFs",
                "POST /api/info": "Get PDF info",
            }
        }),
    }
}

pub fn health(profile: Profile) -> Value {
    match profile {
        Profile::Standalone => json!({
            "status": "healthy",
            "service": STANDALONE_SERVICE,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }),
        Profile::Serverless => json!({
            "status": "healthy",
            "service": SERVERLESS_SERVICE,
        }),
    }
}
