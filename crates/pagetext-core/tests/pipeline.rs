mod common;

use common::{literal, utf16, Fixture, PageSpec};
use lopdf::dictionary;
use pagetext_core::{
    parse, parse_bytes, parse_path, ByteSource, PageRecord, ParseError, ParseOptions, Warning,
    SCANNED_WARNING,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;

#[test]
fn test_text_and_blank_pages() {
    let pdf = Fixture::new()
        .page(PageSpec::Text("Hello"))
        .page(PageSpec::Blank)
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    assert_eq!(result.metadata().num_pages, 2);
    assert_eq!(
        result.pages().unwrap(),
        &[
            PageRecord {
                page: 1,
                text: "Hello".to_string(),
            },
            PageRecord {
                page: 2,
                text: String::new(),
            },
        ]
    );
    assert!(result.warnings().is_empty());
    assert!(!result.is_scanned());
}

#[test]
fn test_image_only_document_is_scanned() {
    let pdf = Fixture::new()
        .page(PageSpec::Image)
        .page(PageSpec::Image)
        .page(PageSpec::Blank)
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    assert_eq!(result.metadata().num_pages, 3);
    assert!(result.pages().unwrap().iter().all(|p| p.text.is_empty()));
    assert_eq!(result.warnings(), &[Warning::ScannedDocument]);
    assert!(result.is_scanned());
}

#[test]
fn test_zero_pages_is_not_scanned() {
    let pdf = Fixture::new().build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    assert_eq!(result.metadata().num_pages, 0);
    assert_eq!(result.pages(), Some(&[][..]));
    assert!(result.warnings().is_empty());
}

#[test]
fn test_broken_page_degrades_to_warning() {
    let pdf = Fixture::new()
        .page(PageSpec::Text("First"))
        .page(PageSpec::BrokenContents)
        .page(PageSpec::Text("Third"))
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    let pages = result.pages().unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].text, "First");
    assert_eq!(pages[1].text, "");
    assert_eq!(pages[2].text, "Third");

    assert_eq!(result.warnings().len(), 1);
    assert!(matches!(
        result.warnings()[0],
        Warning::PageExtractionFailed { page: 2, .. }
    ));
    assert!(result.warnings()[0].to_string().starts_with("page 2:"));
}

#[test]
fn test_only_broken_pages_are_scanned_too() {
    let pdf = Fixture::new().page(PageSpec::BrokenContents).build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    let warnings = result.warnings();
    assert_eq!(warnings.len(), 2);
    assert!(matches!(warnings[0], Warning::PageExtractionFailed { page: 1, .. }));
    assert_eq!(warnings[1], Warning::ScannedDocument);
}

#[test]
fn test_metadata_fields() {
    let pdf = Fixture::new()
        .page(PageSpec::Text("Body"))
        .info(dictionary! {
            "Title" => utf16("Résumé ✓"),
            "Author" => literal("  Jane Doe  "),
            "CreationDate" => literal("D:20240101120000Z"),
        })
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    let metadata = result.metadata();
    assert_eq!(metadata.title.as_deref(), Some("Résumé ✓"));
    assert_eq!(metadata.author.as_deref(), Some("Jane Doe"));
    assert_eq!(metadata.creation_date.as_deref(), Some("D:20240101120000Z"));
    assert_eq!(metadata.num_pages, 1);
}

#[test]
fn test_blank_and_non_string_metadata_is_absent() {
    let pdf = Fixture::new()
        .page(PageSpec::Text("Body"))
        .info(dictionary! {
            "Title" => literal("   "),
            "Author" => 42,
        })
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    let metadata = result.metadata();
    assert_eq!(metadata.title, None);
    assert_eq!(metadata.author, None);
    assert_eq!(metadata.creation_date, None);
}

#[test]
fn test_no_info_dictionary() {
    let pdf = Fixture::new().page(PageSpec::Text("Body")).build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    assert_eq!(
        serde_json::to_value(result.metadata()).unwrap(),
        json!({"title": null, "author": null, "creation_date": null, "num_pages": 1})
    );
}

#[test]
fn test_metadata_only_keeps_warnings() {
    let pdf = Fixture::new()
        .page(PageSpec::BrokenContents)
        .page(PageSpec::Image)
        .build();

    let full = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    let meta_only = parse_bytes(&pdf, &ParseOptions::metadata_only()).unwrap();

    assert_eq!(meta_only.pages(), None);
    assert_eq!(meta_only.metadata(), full.metadata());
    assert_eq!(meta_only.warnings(), full.warnings());

    let value = serde_json::to_value(&meta_only).unwrap();
    assert!(value.get("pages").is_none());
    assert_eq!(value["warnings"][1], json!(SCANNED_WARNING));
}

#[test]
fn test_parse_is_repeatable() {
    let pdf = Fixture::new()
        .page(PageSpec::Text("Same"))
        .page(PageSpec::Image)
        .build();

    let first = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    let second = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_encrypted_document_is_rejected() {
    let pdf = Fixture::with_text(&["Secret"]).encrypted().build();
    let err = parse_bytes(&pdf, &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::Encrypted));
}

#[test]
fn test_encrypt_key_in_page_text_is_not_encryption() {
    let pdf = Fixture::new()
        .page(PageSpec::Text("Set /Encrypt 5 0 R in the trailer"))
        .info(dictionary! {
            "Title" => literal("/Encrypt <key> howto"),
        })
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    assert_eq!(result.metadata().title.as_deref(), Some("/Encrypt <key> howto"));
    assert_eq!(
        result.pages().unwrap()[0].text,
        "Set /Encrypt 5 0 R in the trailer"
    );
    assert!(result.warnings().is_empty());
}

#[test]
fn test_compressed_page_text() {
    let pdf = Fixture::new()
        .page(PageSpec::Compressed(
            "Packed text packed text packed text packed text packed text packed text",
        ))
        .build();
    assert!(pdf.windows(12).any(|w| w == b"/FlateDecode"));

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    assert!(result.pages().unwrap()[0].text.starts_with("Packed text"));
    assert!(result.warnings().is_empty());
}

#[test]
fn test_corrupt_flate_page_degrades_to_warning() {
    let pdf = Fixture::new()
        .page(PageSpec::Text("Good"))
        .page(PageSpec::CorruptFlate)
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    let pages = result.pages().unwrap();
    assert_eq!(pages[0].text, "Good");
    assert_eq!(pages[1].text, "");

    let warnings = result.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], Warning::PageExtractionFailed { page: 2, .. }));
    assert!(warnings[0].to_string().contains("decode"));
}

#[test]
fn test_unterminated_string_is_a_page_failure() {
    let pdf = Fixture::new()
        .page(PageSpec::Raw(b"BT /F1 12 Tf (unterminated Tj ET"))
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    let warnings = result.warnings();
    assert!(matches!(warnings[0], Warning::PageExtractionFailed { page: 1, .. }));
    assert!(warnings[0].to_string().contains("malformed content stream"));
}

#[test]
fn test_truncated_operation_is_a_page_failure() {
    let pdf = Fixture::new()
        .page(PageSpec::Text("Intact"))
        .page(PageSpec::Raw(b"BT /F1 12 Tf 72 720 Td (Cut off) Tj ET ]"))
        .page(PageSpec::Raw(b"BT /F1 12 Tf 72 720 Td (Dangling)"))
        .build();

    let result = parse_bytes(&pdf, &ParseOptions::default()).unwrap();
    assert_eq!(result.pages().unwrap()[0].text, "Intact");
    let failed: Vec<u32> = result
        .warnings()
        .iter()
        .filter_map(|w| match w {
            Warning::PageExtractionFailed { page, .. } => Some(*page),
            Warning::ScannedDocument => None,
        })
        .collect();
    assert_eq!(failed, vec![2, 3]);
    assert!(!result.is_scanned());
}

#[test]
fn test_garbage_is_structural() {
    let err = parse_bytes(b"this is not a pdf", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::Structural(_)));

    let err = parse_bytes(b"", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::Structural(_)));
}

#[test]
fn test_path_and_bytes_agree() {
    let pdf = Fixture::new().page(PageSpec::Text("On disk")).build();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&pdf).unwrap();

    let from_path = parse_path(file.path(), &ParseOptions::default()).unwrap();
    let from_bytes = parse(ByteSource::Bytes(pdf), &ParseOptions::default()).unwrap();
    assert_eq!(from_path, from_bytes);
}

#[test]
fn test_missing_path_is_io_not_found() {
    let err = parse_path("/definitely/not/here.pdf", &ParseOptions::default()).unwrap_err();
    match err {
        ParseError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected error: {other:?}"),
    }
}
