//! Sample documents for tests, built with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

/// A PDF with one page per entry; an empty entry produces a page without text.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    save(build(pages, Placement::Page))
}

/// Like [`text_pdf`], but `/MediaBox` and `/Resources` live on the `/Pages`
/// node and every page inherits them.
pub fn inherited_attributes_pdf(pages: &[&str]) -> Vec<u8> {
    save(build(pages, Placement::PageTree))
}

/// A PDF whose trailer references a Standard security handler dictionary.
/// Content streams stay in the clear, so it only exercises detection.
pub fn encrypted_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = build(pages, Placement::Page);
    let encrypt_id = doc.add_object(Dictionary::from_iter(vec![
        ("Filter", Object::Name(b"Standard".to_vec())),
        ("V", Object::Integer(1)),
        ("R", Object::Integer(2)),
        ("O", Object::String(vec![0x4F; 32], StringFormat::Hexadecimal)),
        ("U", Object::String(vec![0x55; 32], StringFormat::Hexadecimal)),
        ("P", Object::Integer(-44)),
    ]));
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
    save(doc)
}

/// Same as [`text_pdf`] with an `/Info` dictionary carrying a title and author.
pub fn pdf_with_info(pages: &[&str], title: &str, author: &str) -> Vec<u8> {
    let mut doc = build(pages, Placement::Page);
    let info = Dictionary::from_iter(vec![
        (
            "Title",
            Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
        ),
        (
            "Author",
            Object::String(author.as_bytes().to_vec(), StringFormat::Literal),
        ),
    ]);
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));
    save(doc)
}

/// A PDF with `count` pages labelled `"{prefix} {n}"`.
pub fn labelled_pdf(count: u32, prefix: &str) -> Vec<u8> {
    let labels: Vec<String> = (1..=count).map(|n| format!("{} {}", prefix, n)).collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    text_pdf(&labels)
}

/// Append a CRLF, as browsers see files saved on Windows.
pub fn crlf_terminated(mut pdf: Vec<u8>) -> Vec<u8> {
    pdf.extend_from_slice(b"\r\n");
    pdf
}

/// Where the inheritable page attributes are written.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Placement {
    Page,
    PageTree,
}

fn media_box() -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ])
}

fn build(pages: &[&str], placement: Placement) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut page_ids = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            vec![]
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        text.as_bytes().to_vec(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap_or_default(),
        ));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if placement == Placement::Page {
            page.set("MediaBox", media_box());
            page.set("Resources", Object::Reference(resources_id));
        }
        page_ids.push(doc.add_object(page));
    }

    let mut pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    if placement == Placement::PageTree {
        pages_dict.set("MediaBox", media_box());
        pages_dict.set("Resources", Object::Reference(resources_id));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .expect("in-memory PDF serialization cannot fail");
    buffer
}
