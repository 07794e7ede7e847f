//! OLE property-set streams (`\x05SummaryInformation` and friends).
//!
//! A stream holds a 28-byte header, one or two `(FMTID, offset)` pairs and the property sets they
//! point at. Each property set is decoded independently: a property that fails to decode is
//! recorded in [`PropertySet::errors`] and the rest of the set is still returned.

pub mod metadata;
pub mod value;

pub use self::metadata::{
    DocumentSummaryInformation, PresentFields, PropertiesMetadata, PropertySetMetadata,
    StreamMetadata, SummaryInformation,
};
pub use self::value::{ArrayDimension, Decimal, TypedValue, VarType};

use crate::codepage::{self, CP_WINUNICODE};
use crate::container::DEFAULT_CODE_PAGE;
use crate::err::{CfbError, PropertyError, Result};
use crate::guid::Guid;
use crate::utils::ByteCursor;
use self::value::ValueDecoder;

use hashbrown::HashSet;
use log::{debug, trace, warn};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::io::Read;

pub const PROPERTY_SET_BYTE_ORDER: u16 = 0xFFFE;
pub const PROPERTY_SET_HEADER_SIZE: usize = 28;
const FMTID_OFFSET_PAIR_SIZE: usize = 20;
pub const MAX_PROPERTY_SETS: u32 = 2;

pub const PID_DICTIONARY: u32 = 0x0000_0000;
pub const PID_CODEPAGE: u32 = 0x0000_0001;
pub const PID_LOCALE: u32 = 0x8000_0000;
pub const PID_BEHAVIOR: u32 = 0x8000_0003;
/// Identifiers above this value are reserved for the distinguished properties.
pub const MAX_ORDINARY_PID: u32 = 0x7FFF_FFFF;

/// Map a CodePage property value to a code page number.
///
/// The property is a signed 16-bit integer, so pages above 0x7FFF (1200 is fine, 65001 is not)
/// are stored negative.
pub fn remap_code_page(raw: i16) -> u32 {
    if raw < 0 {
        (i32::from(raw) + 0x10000) as u32
    } else {
        raw as u32
    }
}

/// A whole property-set stream.
#[derive(Debug, Serialize)]
pub struct PropertySetStream {
    pub byte_order: u16,
    pub version: u16,
    pub system_identifier: u32,
    pub clsid: Guid,
    pub sets: Vec<PropertySet>,
}

impl PropertySetStream {
    /// Read and parse a stream, using the default code page for sets without a CodePage property.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        PropertySetStream::parse_with(reader, DEFAULT_CODE_PAGE)
    }

    pub fn parse_with<R: Read>(reader: &mut R, default_code_page: u32) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        PropertySetStream::from_bytes_with(&data, default_code_page)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        PropertySetStream::from_bytes_with(data, DEFAULT_CODE_PAGE)
    }

    pub fn from_bytes_with(data: &[u8], default_code_page: u32) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let byte_order = cursor.u16_named("property set byte order")?;
        if byte_order != PROPERTY_SET_BYTE_ORDER {
            return Err(CfbError::bad_property_stream(
                0,
                format!("byte order mark {:#06x}, expected 0xfffe", byte_order),
            ));
        }
        let version = cursor.u16_named("property set version")?;
        if version > 1 {
            return Err(CfbError::bad_property_stream(
                2,
                format!("unsupported format version {}", version),
            ));
        }
        let system_identifier = cursor.u32_named("system identifier")?;
        let clsid = Guid::from_bytes(&cursor.array::<16>("property set clsid")?);
        let count = cursor.u32_named("property set count")?;
        if count > MAX_PROPERTY_SETS {
            return Err(CfbError::bad_property_stream(
                24,
                format!("{} property sets declared, at most 2 are allowed", count),
            ));
        }
        if count == 0 {
            warn!("property set stream declares no property sets");
        }

        let mut locations = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let fmtid = Guid::from_bytes(&cursor.array::<16>("property set fmtid")?);
            let offset = cursor.u32_named("property set offset")?;
            locations.push((fmtid, offset));
        }
        let header_end =
            (PROPERTY_SET_HEADER_SIZE + FMTID_OFFSET_PAIR_SIZE * count as usize) as u64;

        let mut sets = Vec::with_capacity(locations.len());
        for (fmtid, offset) in locations {
            if u64::from(offset) < header_end || offset as usize >= data.len() {
                return Err(CfbError::bad_property_stream(
                    u64::from(offset),
                    format!(
                        "property set {} lies outside the stream ({} bytes)",
                        fmtid,
                        data.len()
                    ),
                ));
            }
            debug!("property set {} at offset {}", fmtid, offset);
            sets.push(PropertySet::parse(
                fmtid,
                offset,
                &data[offset as usize..],
                default_code_page,
            )?);
        }

        Ok(PropertySetStream {
            byte_order,
            version,
            system_identifier,
            clsid,
            sets,
        })
    }

    pub fn os_major_version(&self) -> u8 {
        (self.system_identifier & 0xFF) as u8
    }

    pub fn os_minor_version(&self) -> u8 {
        ((self.system_identifier >> 8) & 0xFF) as u8
    }

    /// 0 for Win16, 1 for Macintosh, 2 for Win32.
    pub fn os_type(&self) -> u16 {
        (self.system_identifier >> 16) as u16
    }

    pub fn set(&self, fmtid: &Guid) -> Option<&PropertySet> {
        self.sets.iter().find(|s| s.fmtid == *fmtid)
    }
}

/// Where a property's value was found and how many bytes its encoding used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyLayout {
    pub pid: u32,
    /// Offset of the value, relative to the start of the property set.
    pub offset: u32,
    pub encoded_len: u32,
}

/// One property set: its code page, dictionary and decoded properties.
#[derive(Debug, Serialize)]
pub struct PropertySet {
    pub fmtid: Guid,
    /// Offset of the set within the stream.
    pub offset: u32,
    pub byte_size: u32,
    /// Effective code page for 8-bit strings, remapped to an unsigned number.
    pub code_page: u32,
    pub properties: BTreeMap<u32, TypedValue>,
    pub dictionary: Option<BTreeMap<u32, String>>,
    pub layout: Vec<PropertyLayout>,
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<PropertyError>,
}

fn serialize_errors<S: Serializer>(
    errors: &[PropertyError],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}

impl PropertySet {
    /// Parse a property set from `data`, which starts at the set and may run past its end.
    pub fn parse(fmtid: Guid, offset: u32, data: &[u8], default_code_page: u32) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let declared_size = cursor.u32_named("property set size")?;
        let count = cursor.u32_named("property count")?;

        let mut byte_size = declared_size;
        if declared_size as usize > data.len() {
            warn!(
                "property set {} declares {} bytes but only {} are available",
                fmtid,
                declared_size,
                data.len()
            );
            byte_size = data.len() as u32;
        }
        let table_end = 8u64 + u64::from(count) * 8;
        if table_end > u64::from(byte_size) {
            return Err(CfbError::bad_property_stream(
                u64::from(offset) + 4,
                format!(
                    "{} properties do not fit in a property set of {} bytes",
                    count, byte_size
                ),
            ));
        }

        let body = &data[..byte_size as usize];
        let mut cursor = ByteCursor::with_pos(body, 8)?;
        let mut entries: Vec<(u32, u32)> = Vec::with_capacity(count as usize);
        let mut seen = HashSet::with_capacity(count as usize);
        for _ in 0..count {
            let pid = cursor.u32_named("property identifier")?;
            let value_offset = cursor.u32_named("property offset")?;
            if !seen.insert(pid) {
                warn!("property set {}: duplicate property {:#x}, keeping the first", fmtid, pid);
                continue;
            }
            entries.push((pid, value_offset));
        }

        let mut set = PropertySet {
            fmtid,
            offset,
            byte_size,
            code_page: default_code_page,
            properties: BTreeMap::new(),
            dictionary: None,
            layout: Vec::with_capacity(entries.len()),
            errors: Vec::new(),
        };

        // Value extents run to the next value offset, or to the end of the set.
        let mut boundaries: Vec<u32> = entries.iter().map(|&(_, o)| o).collect();
        boundaries.sort_unstable();
        boundaries.dedup();
        let extent_end = |start: u32| -> usize {
            boundaries
                .get(boundaries.partition_point(|&b| b <= start))
                .map_or(byte_size as usize, |&b| b as usize)
        };

        // The code page governs every 8-bit string, so it is decoded before anything else.
        let mut ordered = entries;
        ordered.sort_by_key(|&(pid, _)| match pid {
            PID_CODEPAGE => 0,
            PID_DICTIONARY => 1,
            _ => 2,
        });

        for (pid, value_offset) in ordered {
            let result = if u64::from(value_offset) < table_end || value_offset >= byte_size {
                Err(CfbError::bad_property_stream(
                    u64::from(value_offset),
                    format!("value offset lies outside the property set ({} bytes)", byte_size),
                ))
            } else if pid == PID_DICTIONARY {
                set.read_dictionary(body, value_offset)
            } else {
                set.read_value(body, pid, value_offset, extent_end(value_offset))
            };

            match result {
                Ok(encoded_len) => set.layout.push(PropertyLayout {
                    pid,
                    offset: value_offset,
                    encoded_len,
                }),
                Err(source) => {
                    warn!("property set {}: property {:#x}: {}", fmtid, pid, source);
                    set.errors.push(PropertyError {
                        pid,
                        offset: value_offset,
                        source,
                    });
                }
            }
        }
        set.layout.sort_by_key(|l| l.offset);

        let used: u64 = set.layout.iter().map(|l| u64::from(l.encoded_len)).sum();
        if used + table_end > u64::from(byte_size) {
            warn!(
                "property set {}: values use {} bytes, more than the {} declared",
                fmtid,
                used + table_end,
                byte_size
            );
        }

        debug!(
            "property set {}: {} properties, {} errors, code page {}",
            fmtid,
            set.properties.len(),
            set.errors.len(),
            set.code_page
        );
        Ok(set)
    }

    fn read_value(
        &mut self,
        body: &[u8],
        pid: u32,
        value_offset: u32,
        extent_end: usize,
    ) -> Result<u32> {
        let mut cursor = ByteCursor::with_pos(body, value_offset as usize)?;
        let value = ValueDecoder::new(self.code_page).read_property(&mut cursor, extent_end)?;
        trace!("property {:#x} at {}: {:?}", pid, value_offset, value);

        if pid == PID_CODEPAGE {
            match &value {
                TypedValue::I2(raw) => self.code_page = remap_code_page(*raw),
                TypedValue::UI2(raw) => self.code_page = u32::from(*raw),
                other => warn!(
                    "CodePage property has type {:#06x}, keeping code page {}",
                    other.tag(),
                    self.code_page
                ),
            }
            if !codepage::is_supported(self.code_page) {
                warn!(
                    "code page {} is not supported, 8-bit strings will fail to decode",
                    self.code_page
                );
            }
        }

        self.properties.insert(pid, value);
        Ok((cursor.pos() - value_offset as usize) as u32)
    }

    /// The dictionary (pid 0) maps property identifiers to names and has no type tag.
    fn read_dictionary(&mut self, body: &[u8], value_offset: u32) -> Result<u32> {
        let mut cursor = ByteCursor::with_pos(body, value_offset as usize)?;
        let count = cursor.count_named(8, "dictionary entry count")?;
        let unicode = self.code_page == CP_WINUNICODE;

        let mut dictionary = BTreeMap::new();
        for _ in 0..count {
            let pid = cursor.u32_named("dictionary property identifier")?;
            let chars = cursor.count_named(1, "dictionary name length")?;
            let name = if unicode {
                let bytes = cursor.take_bytes(chars.saturating_mul(2), "dictionary name")?;
                let name = codepage::decode_z(CP_WINUNICODE, bytes)?;
                cursor.align(4);
                name
            } else {
                let bytes = cursor.take_bytes(chars, "dictionary name")?;
                codepage::decode_z(self.code_page, bytes)?
            };
            trace!("dictionary entry {:#x} = {:?}", pid, name);
            dictionary.insert(pid, name);
        }
        cursor.align(4);

        self.dictionary = Some(dictionary);
        Ok((cursor.pos() - value_offset as usize) as u32)
    }

    pub fn get(&self, pid: u32) -> Option<&TypedValue> {
        self.properties.get(&pid)
    }

    /// Property name from the dictionary, if the set has one.
    pub fn name_of(&self, pid: u32) -> Option<&str> {
        self.dictionary.as_ref()?.get(&pid).map(String::as_str)
    }

    pub fn locale(&self) -> Option<u32> {
        match self.properties.get(&PID_LOCALE)? {
            TypedValue::UI4(v) | TypedValue::UInt(v) => Some(*v),
            TypedValue::I4(v) => Some(*v as u32),
            _ => None,
        }
    }

    pub fn behavior(&self) -> Option<u32> {
        match self.properties.get(&PID_BEHAVIOR)? {
            TypedValue::UI4(v) | TypedValue::UInt(v) => Some(*v),
            TypedValue::I4(v) => Some(*v as u32),
            _ => None,
        }
    }
}
