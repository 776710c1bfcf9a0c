//! Single-page extraction

use lopdf::Document;
use tracing::debug;

use crate::error::ConvertError;
use crate::inspect::load;

/// Page `index` (0-based) of a PDF as a standalone document.
pub fn extract_page(bytes: &[u8], index: u32) -> Result<Vec<u8>, ConvertError> {
    let mut doc = load(bytes)?;
    let page_count = doc.get_pages().len() as u32;
    if index >= page_count {
        return Err(ConvertError::InvalidRange(format!(
            "Page {} does not exist (document has {} pages)",
            index + 1,
            page_count
        )));
    }

    let keep = index + 1;
    let others: Vec<u32> = (1..=page_count).filter(|&n| n != keep).collect();
    doc.delete_pages(&others);
    doc.prune_objects();
    doc.compress();

    debug!(page = keep, of = page_count, "Extracted page");
    save(doc)
}

/// What the `/split` endpoint returns.
pub fn split_first_page(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    extract_page(bytes, 0)
}

fn save(mut doc: Document) -> Result<Vec<u8>, ConvertError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ConvertError::OperationError(format!("Save failed: {}", e)))?;
    Ok(buffer)
}
