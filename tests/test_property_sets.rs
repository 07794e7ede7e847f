
use fixtures::*;

use olecf::property_set::metadata::{
    FMTID_DOC_SUMMARY_INFORMATION, FMTID_SUMMARY_INFORMATION, PresentFields, PropertiesMetadata,
};
use olecf::property_set::{DocumentSummaryInformation, PropertySetMetadata};
use olecf::{
    CfbError, Container, OpenOptions, PropertySetStream, StreamMetadata, SummaryInformation,
    TypedValue, VarType,
};
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn single_set(properties: Vec<(u32, Vec<u8>)>) -> Vec<u8> {
    property_set_stream(&[SetSpec {
        fmtid: FMTID_SUMMARY_INFORMATION.to_bytes(),
        properties,
    }])
}

#[test]
fn test_summary_information_round_trip() {
    ensure_env_logger_initialized();

    let built = summary_information_container();
    let container = Container::open(built.cursor()).unwrap();

    let sid = container.find_path(SUMMARY_INFORMATION).unwrap().unwrap();
    let entry = container.entry(sid).unwrap();
    assert_eq!(entry.name_size, 0x28);
    assert!(entry.is_property_set_stream());
    assert_eq!(entry.display_name(), "\\u{5}SummaryInformation");

    let stream = container.property_set_stream(sid).unwrap();
    assert_eq!(stream.byte_order, 0xFFFE);
    assert_eq!(stream.sets.len(), 1);
    let set = &stream.sets[0];
    assert_eq!(set.fmtid, FMTID_SUMMARY_INFORMATION);
    assert_eq!(set.properties.len(), 2);
    assert_eq!(set.get(1), Some(&TypedValue::I2(1252)));
    assert_eq!(set.get(2), Some(&TypedValue::Lpstr("Hello".to_owned())));
    assert!(set.errors.is_empty());

    let meta = PropertiesMetadata::from(set);
    assert_eq!(meta.code_page, Some(1252));
    assert_eq!(meta.present, PresentFields::CODE_PAGE);
    let summary = SummaryInformation::from(set);
    assert_eq!(summary.title.as_deref(), Some("Hello"));
    assert_eq!(summary.author, None);

    let json = serde_json::to_value(&stream).unwrap();
    assert_eq!(json["sets"][0]["properties"]["2"], "Hello");
    assert_eq!(json["sets"][0]["properties"]["1"], 1252);
}

#[test]
fn test_negative_code_page_is_remapped() {
    ensure_env_logger_initialized();

    let data = single_set(vec![(1, vt::i2(0xFC00u16 as i16))]);
    let stream = PropertySetStream::from_bytes(&data).unwrap();
    let set = &stream.sets[0];
    assert_eq!(set.get(1), Some(&TypedValue::I2(-1024)));
    assert_eq!(set.code_page, 64512);
    assert_eq!(PropertiesMetadata::from(set).code_page, Some(64512));
}

#[test]
fn test_zero_properties() {
    ensure_env_logger_initialized();

    let data = single_set(Vec::new());
    let stream = PropertySetStream::from_bytes(&data).unwrap();
    let set = &stream.sets[0];
    assert!(set.properties.is_empty());
    assert!(set.errors.is_empty());
    assert_eq!(set.byte_size, 8);
    assert_eq!(set.code_page, 1252);

    let meta = PropertiesMetadata::from(set);
    assert_eq!(meta.code_page, None);
    assert!(meta.present.is_empty());
}

#[test]
fn test_parsing_twice_is_equal() {
    ensure_env_logger_initialized();

    let data = single_set(vec![
        (1, vt::i2(1252)),
        (2, vt::lpstr(b"Caf\xE9")),
        (4, vt::lpwstr("Zo\u{eb}")),
        (12, vt::filetime(0x01D3_2F5C_8F3B_8000)),
        (14, vt::i4(12)),
    ]);
    let first = PropertySetStream::from_bytes(&data).unwrap();
    let second = PropertySetStream::parse(&mut Cursor::new(&data)).unwrap();
    assert_eq!(first.sets[0].properties, second.sets[0].properties);
    assert_eq!(first.sets[0].layout, second.sets[0].layout);

    let summary = SummaryInformation::from(&first.sets[0]);
    assert_eq!(summary.title.as_deref(), Some("Café"));
    assert_eq!(summary.author.as_deref(), Some("Zoë"));
    assert_eq!(summary.page_count, Some(12));
    assert!(summary.created.is_some());
}

#[test]
fn test_encoded_sizes_fit_in_the_set() {
    ensure_env_logger_initialized();

    let data = single_set(vec![
        (1, vt::i2(1252)),
        (2, vt::lpstr(b"A title that needs padding")),
        (3, vt::vector_lpstr(&[b"one", b"three"])),
        (4, vt::vector_i4(&[1, 2, 3])),
        (5, vt::boolean(true)),
    ]);
    let stream = PropertySetStream::from_bytes(&data).unwrap();
    let set = &stream.sets[0];
    assert!(set.errors.is_empty());

    let used: u32 = set.layout.iter().map(|l| l.encoded_len).sum();
    assert!(used + 8 * set.layout.len() as u32 + 8 <= set.byte_size);
    for layout in &set.layout {
        assert_eq!(layout.encoded_len % 4, 0, "pid {}", layout.pid);
    }

    assert_eq!(
        set.get(3),
        Some(&TypedValue::Vector {
            element: VarType::Lpstr,
            items: vec![
                TypedValue::Lpstr("one".to_owned()),
                TypedValue::Lpstr("three".to_owned()),
            ],
        })
    );
    assert_eq!(
        set.get(4).and_then(TypedValue::as_items).map(|i| i.len()),
        Some(3)
    );
    assert_eq!(set.get(5), Some(&TypedValue::Bool(true)));
}

#[test]
fn test_unknown_type_keeps_raw_bytes() {
    ensure_env_logger_initialized();

    let data = single_set(vec![
        (1, vt::i2(1252)),
        (7, vt::raw(0x0FFF, &[1, 2, 3, 4, 5, 6, 7, 8])),
        (8, vt::lpstr(b"after")),
    ]);
    let stream = PropertySetStream::from_bytes(&data).unwrap();
    let set = &stream.sets[0];
    assert!(set.errors.is_empty());
    assert_eq!(
        set.get(7),
        Some(&TypedValue::Raw {
            tag: 0x0FFF,
            bytes: vec![1, 2, 3, 4, 5, 6, 7, 8],
        })
    );
    assert_eq!(set.get(8).and_then(TypedValue::as_str), Some("after"));
}

#[test]
fn test_property_errors_are_collected() {
    ensure_env_logger_initialized();

    // 0xFF never appears in UTF-8.
    let data = single_set(vec![
        (1, vt::i2(65001u16 as i16)),
        (2, vt::lpstr(b"bad \xFF byte")),
        (3, vt::lpstr(b"fine")),
    ]);
    let stream = PropertySetStream::from_bytes(&data).unwrap();
    let set = &stream.sets[0];
    assert_eq!(set.get(3).and_then(TypedValue::as_str), Some("fine"));
    assert_eq!(set.get(2), None);
    assert_eq!(set.errors.len(), 1);
    assert_eq!(set.errors[0].pid, 2);
    assert!(matches!(
        set.errors[0].source,
        CfbError::DecodeError { code_page: 65001, .. }
    ));

    let json = serde_json::to_value(&stream).unwrap();
    assert!(
        json["sets"][0]["errors"][0]
            .as_str()
            .unwrap()
            .contains("0x2")
    );
}

#[test]
fn test_dictionary_and_user_defined_set() {
    ensure_env_logger_initialized();

    let data = property_set_stream(&[
        SetSpec {
            fmtid: FMTID_DOC_SUMMARY_INFORMATION.to_bytes(),
            properties: vec![
                (1, vt::i2(1252)),
                (15, vt::lpstr(b"ACME")),
                (12, vt::vector_variant(&[vt::lpstr(b"Title"), vt::i4(1)])),
                (13, vt::vector_lpstr(&[b"Report"])),
            ],
        },
        SetSpec {
            fmtid: olecf::property_set::metadata::FMTID_USER_DEFINED_PROPERTIES.to_bytes(),
            properties: vec![
                (1, vt::i2(1252)),
                (0, vt::dictionary(&[(2, &b"Reviewer"[..]), (3, &b"Approved"[..])])),
                (2, vt::lpstr(b"Grace")),
                (3, vt::boolean(false)),
            ],
        },
    ]);

    let stream = PropertySetStream::from_bytes(&data).unwrap();
    assert_eq!(stream.sets.len(), 2);

    let doc = DocumentSummaryInformation::from(&stream.sets[0]);
    assert_eq!(doc.company.as_deref(), Some("ACME"));
    assert_eq!(doc.heading_pairs, Some(vec![("Title".to_owned(), 1)]));
    assert_eq!(doc.titles_of_parts, Some(vec!["Report".to_owned()]));

    let user = &stream.sets[1];
    assert_eq!(user.name_of(2), Some("Reviewer"));
    assert_eq!(user.name_of(3), Some("Approved"));
    assert_eq!(user.get(3), Some(&TypedValue::Bool(false)));
    let meta = PropertiesMetadata::from(user);
    assert!(meta.present.contains(PresentFields::DICTIONARY));

    let all = StreamMetadata::from(&stream);
    assert!(all.summary_information.is_none());
    assert_eq!(
        all.document_summary_information
            .as_ref()
            .and_then(|d| d.company.as_deref()),
        Some("ACME")
    );
    let header = PropertySetMetadata::from(&stream);
    assert_eq!(header.fmtids.len(), 2);
    assert_eq!(header.os_type, 2);
}

#[test]
fn test_malformed_streams() {
    ensure_env_logger_initialized();

    let mut data = single_set(vec![(1, vt::i2(1252))]);
    data[2] = 2;
    assert!(matches!(
        PropertySetStream::from_bytes(&data),
        Err(CfbError::BadPropertyStream { .. })
    ));

    // Set offset pointing past the end of the stream.
    let mut data = single_set(vec![(1, vt::i2(1252))]);
    data[44..48].copy_from_slice(&0x1000u32.to_le_bytes());
    assert!(matches!(
        PropertySetStream::from_bytes(&data),
        Err(CfbError::BadPropertyStream { offset: 0x1000, .. })
    ));

    assert!(
        PropertySetStream::from_bytes(&[0xFE, 0xFF])
            .unwrap_err()
            .is_truncation()
    );
}

#[test]
fn test_default_code_page_option() {
    ensure_env_logger_initialized();

    // No CodePage property: strings use the configured default.
    let stream = single_set(vec![(2, vt::lpstr(b"\xCF\xF0\xE8"))]);
    let mut builder = CfbBuilder::new(3);
    let sid = builder.stream(0, SUMMARY_INFORMATION, &stream);
    let built = builder.build();

    let container =
        Container::open_with(built.cursor(), OpenOptions::new().default_code_page(1251)).unwrap();
    let parsed = container.property_set_stream(sid).unwrap();
    assert_eq!(parsed.sets[0].code_page, 1251);
    assert_eq!(
        parsed.sets[0].get(2).and_then(TypedValue::as_str),
        Some("При")
    );
}
