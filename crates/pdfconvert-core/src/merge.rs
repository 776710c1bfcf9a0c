//! PDF merge
//!
//! Concatenates the pages of several PDFs, in input order, into one document.

use crate::error::ConvertError;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::debug;

/// Page attributes a page may take from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against `/Parent` cycles in malformed page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Merge multiple PDFs into one
///
/// 1. Empty input is an error; a single document is returned unchanged
/// 2. The first document becomes the destination
/// 3. Every page gets a copy of the attributes it inherits, since all pages
///    end up as direct kids of the destination's root page node
/// 4. Every other document has its object ids shifted past the destination's
///    highest id, its objects imported and its pages appended
/// 5. The destination page tree is rebuilt and unreachable objects pruned
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, ConvertError> {
    if documents.is_empty() {
        return Err(ConvertError::OperationError("No documents to merge".into()));
    }

    if documents.len() == 1 {
        return Ok(documents.into_iter().next().unwrap_or_default());
    }

    let mut loaded_docs = Vec::with_capacity(documents.len());
    for (i, doc_bytes) in documents.iter().enumerate() {
        let mut doc = Document::load_mem(doc_bytes).map_err(|e| {
            ConvertError::ParseError(format!("Failed to load document {}: {}", i, e))
        })?;
        pin_inherited_attributes(&mut doc);
        loaded_docs.push(doc);
    }

    let mut dest = loaded_docs.remove(0);
    let mut dest_max_id = dest.max_id;
    let mut dest_page_refs = page_references(&dest);

    for source in loaded_docs.into_iter() {
        let source_pages = page_references(&source);
        let id_offset = dest_max_id;

        let remapped_objects: BTreeMap<ObjectId, Object> = source
            .objects
            .into_iter()
            .map(|(old_id, object)| {
                let new_id = (old_id.0 + id_offset, old_id.1);
                (new_id, remap_object_refs(object, id_offset))
            })
            .collect();
        dest.objects.extend(remapped_objects);

        dest_page_refs.extend(
            source_pages
                .into_iter()
                .map(|old_ref| (old_ref.0 + id_offset, old_ref.1)),
        );

        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
    }

    dest.max_id = dest_max_id;
    let page_count = dest_page_refs.len();
    update_page_tree(&mut dest, dest_page_refs)?;

    dest.prune_objects();
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| ConvertError::OperationError(format!("Failed to save merged PDF: {}", e)))?;

    debug!(inputs = documents.len(), pages = page_count, "Merged documents");
    Ok(buffer)
}

/// Page object ids in page-number order
fn page_references(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Write inherited attributes directly onto each page that lacks them.
fn pin_inherited_attributes(doc: &mut Document) {
    for page_id in page_references(doc) {
        let inherited = inherited_attributes(doc, page_id);
        if inherited.is_empty() {
            continue;
        }
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }
}

/// Nearest ancestor value of every inheritable key the page does not set.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut found = Vec::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node_id) = parent else { break };
        if missing.is_empty() {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    found
}

/// Recursively shift object references by `offset`
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the destination's root page node at `page_refs` and re-parent
/// imported pages onto it.
fn update_page_tree(doc: &mut Document, page_refs: Vec<ObjectId>) -> Result<(), ConvertError> {
    let catalog = doc
        .catalog()
        .map_err(|e| ConvertError::OperationError(format!("Catalog not found: {}", e)))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| ConvertError::OperationError("No Pages reference in catalog".into()))?;

    match doc.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(pages_dict)) => {
            let kids = page_refs
                .iter()
                .map(|&id| Object::Reference(id))
                .collect::<Vec<_>>();
            pages_dict.set("Kids", Object::Array(kids));
            pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
        }
        _ => {
            return Err(ConvertError::OperationError(
                "Invalid pages dictionary".into(),
            ))
        }
    }

    for page_id in &page_refs {
        if let Some(Object::Dictionary(page)) = doc.objects.get_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    Ok(())
}
