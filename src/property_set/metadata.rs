//! Friendly records projected from decoded property sets.
//!
//! Missing or mistyped properties leave the corresponding field `None`; projection never fails.

use super::{PID_CODEPAGE, PID_DICTIONARY, PropertySet, PropertySetStream, TypedValue};
use crate::guid::Guid;
use crate::utils::FileTime;

use bitflags::bitflags;
use jiff::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;

pub const FMTID_SUMMARY_INFORMATION: Guid = Guid::new(
    0xF29F_85E0,
    0x4FF9,
    0x1068,
    [0xAB, 0x91, 0x08, 0x00, 0x2B, 0x27, 0xB3, 0xD9],
);
pub const FMTID_DOC_SUMMARY_INFORMATION: Guid = Guid::new(
    0xD5CD_D502,
    0x2E9C,
    0x101B,
    [0x93, 0x97, 0x08, 0x00, 0x2B, 0x2C, 0xF9, 0xAE],
);
/// Second set of a `\x05DocumentSummaryInformation` stream.
pub const FMTID_USER_DEFINED_PROPERTIES: Guid = Guid::new(
    0xD5CD_D505,
    0x2E9C,
    0x101B,
    [0x93, 0x97, 0x08, 0x00, 0x2B, 0x2C, 0xF9, 0xAE],
);

bitflags! {
    /// Distinguished properties found in a property set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub struct PresentFields: u32 {
        const CODE_PAGE = 0x0001;
        const DICTIONARY = 0x0002;
        const LOCALE = 0x0004;
        const BEHAVIOR = 0x0008;
    }
}

/// Stream-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySetMetadata {
    pub byte_order: u16,
    pub version: u16,
    pub system_identifier: u32,
    pub os_major_version: u8,
    pub os_minor_version: u8,
    pub os_type: u16,
    pub clsid: Guid,
    pub fmtids: Vec<Guid>,
}

impl From<&PropertySetStream> for PropertySetMetadata {
    fn from(stream: &PropertySetStream) -> Self {
        PropertySetMetadata {
            byte_order: stream.byte_order,
            version: stream.version,
            system_identifier: stream.system_identifier,
            os_major_version: stream.os_major_version(),
            os_minor_version: stream.os_minor_version(),
            os_type: stream.os_type(),
            clsid: stream.clsid,
            fmtids: stream.sets.iter().map(|s| s.fmtid).collect(),
        }
    }
}

/// The distinguished properties of one property set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertiesMetadata {
    pub fmtid: Guid,
    /// `None` when the set has no CodePage property.
    pub code_page: Option<u32>,
    pub dictionary: Option<BTreeMap<u32, String>>,
    pub locale: Option<u32>,
    pub behavior: Option<u32>,
    pub present: PresentFields,
}

impl From<&PropertySet> for PropertiesMetadata {
    fn from(set: &PropertySet) -> Self {
        let mut present = PresentFields::empty();
        let code_page = match set.get(PID_CODEPAGE) {
            Some(TypedValue::I2(_)) | Some(TypedValue::UI2(_)) => {
                present |= PresentFields::CODE_PAGE;
                Some(set.code_page)
            }
            _ => None,
        };
        if set.dictionary.is_some() || set.errors.iter().any(|e| e.pid == PID_DICTIONARY) {
            present |= PresentFields::DICTIONARY;
        }
        let locale = set.locale();
        if locale.is_some() {
            present |= PresentFields::LOCALE;
        }
        let behavior = set.behavior();
        if behavior.is_some() {
            present |= PresentFields::BEHAVIOR;
        }

        PropertiesMetadata {
            fmtid: set.fmtid,
            code_page,
            dictionary: set.dictionary.clone(),
            locale,
            behavior,
            present,
        }
    }
}

fn string(set: &PropertySet, pid: u32) -> Option<String> {
    set.get(pid).and_then(TypedValue::as_str).map(str::to_owned)
}

fn integer(set: &PropertySet, pid: u32) -> Option<i64> {
    set.get(pid).and_then(TypedValue::as_i64)
}

fn timestamp(set: &PropertySet, pid: u32) -> Option<Timestamp> {
    set.get(pid).and_then(TypedValue::as_timestamp)
}

fn boolean(set: &PropertySet, pid: u32) -> Option<bool> {
    set.get(pid).and_then(TypedValue::as_bool)
}

fn strings(set: &PropertySet, pid: u32) -> Option<Vec<String>> {
    set.get(pid)?
        .as_items()?
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    pub format: i32,
    pub size: usize,
}

/// Well-known properties of the `SummaryInformation` set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryInformation {
    pub code_page: Option<u32>,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub comments: Option<String>,
    pub template: Option<String>,
    pub last_author: Option<String>,
    pub revision_number: Option<String>,
    /// Total editing time, in seconds.
    pub edit_time_seconds: Option<u64>,
    pub last_printed: Option<Timestamp>,
    pub created: Option<Timestamp>,
    pub last_saved: Option<Timestamp>,
    pub page_count: Option<i64>,
    pub word_count: Option<i64>,
    pub char_count: Option<i64>,
    pub thumbnail: Option<Thumbnail>,
    pub application_name: Option<String>,
    pub security: Option<i64>,
}

impl From<&PropertySet> for SummaryInformation {
    fn from(set: &PropertySet) -> Self {
        let edit_time = match set.get(10) {
            Some(TypedValue::FileTime(FileTime(ticks))) => Some(ticks / 10_000_000),
            _ => None,
        };
        let thumbnail = match set.get(17) {
            Some(TypedValue::ClipboardData { format, data }) => Some(Thumbnail {
                format: *format,
                size: data.len(),
            }),
            _ => None,
        };

        SummaryInformation {
            code_page: PropertiesMetadata::from(set).code_page,
            title: string(set, 2),
            subject: string(set, 3),
            author: string(set, 4),
            keywords: string(set, 5),
            comments: string(set, 6),
            template: string(set, 7),
            last_author: string(set, 8),
            revision_number: string(set, 9),
            edit_time_seconds: edit_time,
            last_printed: timestamp(set, 11),
            created: timestamp(set, 12),
            last_saved: timestamp(set, 13),
            page_count: integer(set, 14),
            word_count: integer(set, 15),
            char_count: integer(set, 16),
            thumbnail,
            application_name: string(set, 18),
            security: integer(set, 19),
        }
    }
}

/// Well-known properties of the `DocumentSummaryInformation` set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentSummaryInformation {
    pub code_page: Option<u32>,
    pub category: Option<String>,
    pub presentation_target: Option<String>,
    pub byte_count: Option<i64>,
    pub line_count: Option<i64>,
    pub paragraph_count: Option<i64>,
    pub slide_count: Option<i64>,
    pub note_count: Option<i64>,
    pub hidden_slide_count: Option<i64>,
    pub mm_clip_count: Option<i64>,
    pub scale: Option<bool>,
    /// `(heading, number of parts)` pairs.
    pub heading_pairs: Option<Vec<(String, i64)>>,
    pub titles_of_parts: Option<Vec<String>>,
    pub manager: Option<String>,
    pub company: Option<String>,
    pub links_dirty: Option<bool>,
}

impl From<&PropertySet> for DocumentSummaryInformation {
    fn from(set: &PropertySet) -> Self {
        let heading_pairs = set.get(12).and_then(TypedValue::as_items).and_then(|items| {
            items
                .chunks_exact(2)
                .map(|pair| Some((pair[0].as_str()?.to_owned(), pair[1].as_i64()?)))
                .collect()
        });

        DocumentSummaryInformation {
            code_page: PropertiesMetadata::from(set).code_page,
            category: string(set, 2),
            presentation_target: string(set, 3),
            byte_count: integer(set, 4),
            line_count: integer(set, 5),
            paragraph_count: integer(set, 6),
            slide_count: integer(set, 7),
            note_count: integer(set, 8),
            hidden_slide_count: integer(set, 9),
            mm_clip_count: integer(set, 10),
            scale: boolean(set, 11),
            heading_pairs,
            titles_of_parts: strings(set, 13),
            manager: string(set, 14),
            company: string(set, 15),
            links_dirty: boolean(set, 16),
        }
    }
}

/// Every record that can be projected from one stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamMetadata {
    pub stream: PropertySetMetadata,
    pub sets: Vec<PropertiesMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_information: Option<SummaryInformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_summary_information: Option<DocumentSummaryInformation>,
}

impl From<&PropertySetStream> for StreamMetadata {
    fn from(stream: &PropertySetStream) -> Self {
        StreamMetadata {
            stream: PropertySetMetadata::from(stream),
            sets: stream.sets.iter().map(PropertiesMetadata::from).collect(),
            summary_information: stream
                .set(&FMTID_SUMMARY_INFORMATION)
                .map(SummaryInformation::from),
            document_summary_information: stream
                .set(&FMTID_DOC_SUMMARY_INFORMATION)
                .map(DocumentSummaryInformation::from),
        }
    }
}
