//! Text and image renditions of an uploaded PDF.
//!
//! The "Word" and "PowerPoint" outputs are plain UTF-8 text served under
//! Office MIME types and `.docx`/`.pptx` names. They are not OOXML
//! containers and office software will refuse to open them.

use lopdf::Document;

use crate::dispatch::Profile;
use crate::error::ConvertError;
use crate::inspect::page_texts;
use crate::render::{self, Caption};
use crate::upload::{secure_filename, UploadedFile};

pub const WORD_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PPT_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const JPEG_MIME: &str = "image/jpeg";
pub const PDF_MIME: &str = "application/pdf";

const SEPARATOR_WIDTH: usize = 50;
const MAX_SLIDES: usize = 3;
const JPG_DEMO_TEXT: &str =
    "This is a demo conversion. In production, actual PDF pages would be converted to images.";

/// Output of a successful transform, streamed straight back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub payload: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl ConversionResult {
    pub fn new(payload: Vec<u8>, filename: impl Into<String>, content_type: &str) -> Self {
        Self {
            payload,
            filename: filename.into(),
            content_type: content_type.to_string(),
        }
    }
}

/// Per-request inputs that are not part of the document itself
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub profile: Profile,
    /// Value of the request's `Date` header
    pub requested_at: Option<&'a str>,
}

impl TransformContext<'_> {
    fn conversion_date(&self) -> &str {
        self.requested_at.unwrap_or("N/A")
    }
}

/// Every page's text under a `Page N:` heading, each followed by a rule.
pub fn page_sections(texts: &[Option<String>], placeholder: &str) -> String {
    let rule = "=".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();
    for (i, text) in texts.iter().enumerate() {
        out.push_str(&format!("Page {}:\n", i + 1));
        out.push_str(text.as_deref().unwrap_or(placeholder));
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
    }
    out
}

pub fn to_word_like(file: &UploadedFile, doc: &Document, ctx: TransformContext) -> ConversionResult {
    let texts = page_texts(doc);

    match ctx.profile {
        Profile::Standalone => {
            let body = format!(
                "CONVERTED DOCUMENT - PDF TO WORD\n\n\
                 Original PDF: {}\n\
                 Total Pages: {}\n\
                 Conversion Date: {}\n\n\
                 DOCUMENT CONTENT:\n\
                 {}\n\
                 Converted via PDFConvert Pro API\n",
                file.filename,
                texts.len(),
                ctx.conversion_date(),
                page_sections(&texts, "[No extractable text]"),
            );
            ConversionResult::new(
                body.into_bytes(),
                format!("converted_{}.docx", secure_filename(&file.filename)),
                WORD_MIME,
            )
        }
        Profile::Serverless => {
            let body = format!(
                "PDF TO WORD CONVERSION\n\n{}",
                page_sections(&texts, "[Content]")
            );
            ConversionResult::new(body.into_bytes(), "converted.docx", WORD_MIME)
        }
    }
}

pub fn to_ppt_like(file: &UploadedFile, doc: &Document, ctx: TransformContext) -> ConversionResult {
    let texts = page_texts(doc);
    let slide_count = texts.len().min(MAX_SLIDES);

    match ctx.profile {
        Profile::Standalone => {
            let slides: String = texts
                .iter()
                .take(MAX_SLIDES)
                .enumerate()
                .map(|(i, text)| {
                    let text = text
                        .clone()
                        .unwrap_or_else(|| format!("Page {} content", i + 1));
                    format!("SLIDE {}:\n{}\n\n", i + 1, text)
                })
                .collect();

            let body = format!(
                "PDF TO POWERPOINT CONVERSION\n\n\
                 Original File: {}\n\
                 Total Pages: {}\n\
                 Conversion Date: {}\n\n\
                 PRESENTATION CONTENT:\n\n\
                 {}\n\
                 SLIDE NOTES:\n\
                 - Converted via PDFConvert Pro API\n\
                 - Each PDF page becomes a PowerPoint slide\n\
                 - Formatting and images are preserved\n\n\
                 PDFConvert Pro - Professional PDF Conversion\n",
                file.filename,
                texts.len(),
                ctx.conversion_date(),
                slides,
            );
            ConversionResult::new(
                body.into_bytes(),
                format!("converted_{}.pptx", secure_filename(&file.filename)),
                PPT_MIME,
            )
        }
        Profile::Serverless => {
            let mut body = format!(
                "PDF TO POWERPOINT CONVERSION\n\nTotal Pages: {}\n\n",
                texts.len()
            );
            for i in 0..slide_count {
                body.push_str(&format!(
                    "Slide {}:\nContent from PDF would appear here\n\n",
                    i + 1
                ));
            }
            ConversionResult::new(body.into_bytes(), "converted.pptx", PPT_MIME)
        }
    }
}

pub fn to_jpg_like(
    file: &UploadedFile,
    page_count: u32,
    ctx: TransformContext,
) -> Result<ConversionResult, ConvertError> {
    match ctx.profile {
        Profile::Standalone => {
            let mut captions = vec![
                Caption::new("PDF to JPG Conversion", 50, 50, render::BLACK),
                Caption::new(format!("File: {}", file.filename), 50, 100, render::DARK_BLUE),
                Caption::new(format!("Pages: {}", page_count), 50, 130, render::DARK_GREEN),
            ];
            for (i, line) in render::wrap(JPG_DEMO_TEXT, 60).into_iter().enumerate() {
                captions.push(Caption::new(line, 50, 180 + 30 * i as u32, render::GRAY));
            }

            let jpeg = render::render_placeholder(800, 400, &captions)?;
            Ok(ConversionResult::new(
                jpeg,
                format!("converted_{}_page_1.jpg", secure_filename(&file.filename)),
                JPEG_MIME,
            ))
        }
        Profile::Serverless => {
            let captions = [
                Caption::new("PDF to JPG Conversion", 50, 50, render::BLACK),
                Caption::new("Powered by Vercel Python API", 50, 100, render::BLUE),
            ];
            let jpeg = render::render_placeholder(800, 600, &captions)?;
            Ok(ConversionResult::new(jpeg, "converted.jpg", JPEG_MIME))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::inspect::load;
    use image::GenericImageView;
    use pretty_assertions::assert_eq;

    fn standalone() -> TransformContext<'static> {
        TransformContext {
            profile: Profile::Standalone,
            requested_at: Some("Tue, 15 Nov 1994 08:12:31 GMT"),
        }
    }

    fn serverless() -> TransformContext<'static> {
        TransformContext {
            profile: Profile::Serverless,
            requested_at: None,
        }
    }

    fn upload(pdf: Vec<u8>) -> (UploadedFile, Document) {
        let doc = load(&pdf).unwrap();
        (UploadedFile::new("My Report.pdf", pdf), doc)
    }

    #[test]
    fn test_page_sections_layout() {
        let sections = page_sections(&[Some("Hello".into()), None], "[Content]");
        let rule = "=".repeat(50);
        assert_eq!(
            sections,
            format!("Page 1:\nHello\n{rule}\nPage 2:\n[Content]\n{rule}\n")
        );
    }

    #[test]
    fn test_word_single_page_ends_with_separator() {
        let (file, doc) = upload(fixtures::text_pdf(&["Hello world"]));
        let result = to_word_like(&file, &doc, serverless());
        let text = String::from_utf8(result.payload).unwrap();

        assert!(text.contains("Page 1:"));
        assert!(text.contains("Hello world"));
        assert!(text.trim_end_matches('\n').ends_with(&"=".repeat(50)));
        assert_eq!(result.filename, "converted.docx");
        assert_eq!(result.content_type, WORD_MIME);
    }

    #[test]
    fn test_word_placeholder_for_blank_pages() {
        let (file, doc) = upload(fixtures::text_pdf(&[""]));

        let standalone_text =
            String::from_utf8(to_word_like(&file, &doc, standalone()).payload).unwrap();
        assert!(standalone_text.contains("Page 1:\n[No extractable text]\n"));

        let serverless_text =
            String::from_utf8(to_word_like(&file, &doc, serverless()).payload).unwrap();
        assert!(serverless_text.contains("Page 1:\n[Content]\n"));
    }

    #[test]
    fn test_word_standalone_header() {
        let (file, doc) = upload(fixtures::labelled_pdf(2, "Body"));
        let result = to_word_like(&file, &doc, standalone());
        let text = String::from_utf8(result.payload).unwrap();

        assert!(text.starts_with("CONVERTED DOCUMENT - PDF TO WORD\n"));
        assert!(text.contains("Original PDF: My Report.pdf\n"));
        assert!(text.contains("Total Pages: 2\n"));
        assert!(text.contains("Conversion Date: Tue, 15 Nov 1994 08:12:31 GMT\n"));
        assert!(text.contains("Page 2:\nBody 2\n"));
        assert_eq!(result.filename, "converted_My_Report.pdf.docx");
    }

    #[test]
    fn test_ppt_limits_to_three_slides() {
        let (file, doc) = upload(fixtures::labelled_pdf(5, "Slide text"));
        let result = to_ppt_like(&file, &doc, standalone());
        let text = String::from_utf8(result.payload).unwrap();

        assert!(text.contains("Total Pages: 5\n"));
        assert!(text.contains("SLIDE 1:\nSlide text 1\n"));
        assert!(text.contains("SLIDE 3:\nSlide text 3\n"));
        assert!(!text.contains("SLIDE 4:"));
        assert_eq!(result.content_type, PPT_MIME);
        assert_eq!(result.filename, "converted_My_Report.pdf.pptx");
    }

    #[test]
    fn test_ppt_blank_page_placeholder() {
        let (file, doc) = upload(fixtures::text_pdf(&["", "Second"]));
        let text = String::from_utf8(to_ppt_like(&file, &doc, standalone()).payload).unwrap();
        assert!(text.contains("SLIDE 1:\nPage 1 content\n"));
    }

    #[test]
    fn test_ppt_serverless_uses_static_slides() {
        let (file, doc) = upload(fixtures::labelled_pdf(2, "Ignored"));
        let result = to_ppt_like(&file, &doc, serverless());
        let text = String::from_utf8(result.payload).unwrap();

        assert_eq!(
            text,
            "PDF TO POWERPOINT CONVERSION\n\nTotal Pages: 2\n\n\
             Slide 1:\nContent from PDF would appear here\n\n\
             Slide 2:\nContent from PDF would appear here\n\n"
        );
        assert_eq!(result.filename, "converted.pptx");
    }

    #[test]
    fn test_jpg_dimensions_per_profile() {
        let file = UploadedFile::new("scan.pdf", Vec::new());

        let standalone_jpg = to_jpg_like(&file, 3, standalone()).unwrap();
        let decoded = image::load_from_memory(&standalone_jpg.payload).unwrap();
        assert_eq!(decoded.dimensions(), (800, 400));
        assert_eq!(standalone_jpg.filename, "converted_scan.pdf_page_1.jpg");
        assert_eq!(standalone_jpg.content_type, JPEG_MIME);

        let serverless_jpg = to_jpg_like(&file, 3, serverless()).unwrap();
        let decoded = image::load_from_memory(&serverless_jpg.payload).unwrap();
        assert_eq!(decoded.dimensions(), (800, 600));
        assert_eq!(serverless_jpg.filename, "converted.jpg");
    }
}
