use crate::codepage::{self, CP_WINUNICODE};
use crate::err::{CfbError, Result};
use crate::guid::Guid;
use crate::utils::{ByteCursor, FileTime, decode_utf16le_bytes_z, ole_date_to_timestamp};

use jiff::Timestamp;
use log::{trace, warn};
use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use std::fmt::Write;

pub const VT_VECTOR: u16 = 0x1000;
pub const VT_ARRAY: u16 = 0x2000;
const VT_TYPE_MASK: u16 = 0x0FFF;
pub const MAX_ARRAY_DIMENSIONS: u32 = 31;
/// Variants can nest through vectors and arrays of `VT_VARIANT`; real files never go deep.
const MAX_VARIANT_DEPTH: usize = 8;

/// Scalar variant types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum VarType {
    Empty,
    Null,
    I2,
    I4,
    R4,
    R8,
    Currency,
    Date,
    Bstr,
    Error,
    Bool,
    Variant,
    Decimal,
    I1,
    UI1,
    UI2,
    UI4,
    I8,
    UI8,
    Int,
    UInt,
    Lpstr,
    Lpwstr,
    FileTime,
    Blob,
    ClipboardData,
    Clsid,
    VersionedStream,
}

impl VarType {
    pub fn from_u16(tag: u16) -> Option<VarType> {
        match tag {
            0x0000 => Some(VarType::Empty),
            0x0001 => Some(VarType::Null),
            0x0002 => Some(VarType::I2),
            0x0003 => Some(VarType::I4),
            0x0004 => Some(VarType::R4),
            0x0005 => Some(VarType::R8),
            0x0006 => Some(VarType::Currency),
            0x0007 => Some(VarType::Date),
            0x0008 => Some(VarType::Bstr),
            0x000A => Some(VarType::Error),
            0x000B => Some(VarType::Bool),
            0x000C => Some(VarType::Variant),
            0x000E => Some(VarType::Decimal),
            0x0010 => Some(VarType::I1),
            0x0011 => Some(VarType::UI1),
            0x0012 => Some(VarType::UI2),
            0x0013 => Some(VarType::UI4),
            0x0014 => Some(VarType::I8),
            0x0015 => Some(VarType::UI8),
            0x0016 => Some(VarType::Int),
            0x0017 => Some(VarType::UInt),
            0x001E => Some(VarType::Lpstr),
            0x001F => Some(VarType::Lpwstr),
            0x0040 => Some(VarType::FileTime),
            0x0041 => Some(VarType::Blob),
            0x0047 => Some(VarType::ClipboardData),
            0x0048 => Some(VarType::Clsid),
            0x0049 => Some(VarType::VersionedStream),
            _ => None,
        }
    }

    pub fn tag(self) -> u16 {
        match self {
            VarType::Empty => 0x0000,
            VarType::Null => 0x0001,
            VarType::I2 => 0x0002,
            VarType::I4 => 0x0003,
            VarType::R4 => 0x0004,
            VarType::R8 => 0x0005,
            VarType::Currency => 0x0006,
            VarType::Date => 0x0007,
            VarType::Bstr => 0x0008,
            VarType::Error => 0x000A,
            VarType::Bool => 0x000B,
            VarType::Variant => 0x000C,
            VarType::Decimal => 0x000E,
            VarType::I1 => 0x0010,
            VarType::UI1 => 0x0011,
            VarType::UI2 => 0x0012,
            VarType::UI4 => 0x0013,
            VarType::I8 => 0x0014,
            VarType::UI8 => 0x0015,
            VarType::Int => 0x0016,
            VarType::UInt => 0x0017,
            VarType::Lpstr => 0x001E,
            VarType::Lpwstr => 0x001F,
            VarType::FileTime => 0x0040,
            VarType::Blob => 0x0041,
            VarType::ClipboardData => 0x0047,
            VarType::Clsid => 0x0048,
            VarType::VersionedStream => 0x0049,
        }
    }

    /// Encoded width of fixed-size types, `None` for length-prefixed ones.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            VarType::Empty | VarType::Null => Some(0),
            VarType::I1 | VarType::UI1 => Some(1),
            VarType::I2 | VarType::UI2 | VarType::Bool => Some(2),
            VarType::I4
            | VarType::UI4
            | VarType::Int
            | VarType::UInt
            | VarType::R4
            | VarType::Error => Some(4),
            VarType::R8
            | VarType::Currency
            | VarType::Date
            | VarType::I8
            | VarType::UI8
            | VarType::FileTime => Some(8),
            VarType::Decimal | VarType::Clsid => Some(16),
            _ => None,
        }
    }

    /// Types that may appear as `VT_VECTOR` elements.
    pub fn allowed_in_vector(self) -> bool {
        !matches!(
            self,
            VarType::Empty
                | VarType::Null
                | VarType::Decimal
                | VarType::Int
                | VarType::UInt
                | VarType::Blob
                | VarType::VersionedStream
        )
    }

    /// Types that may appear as `VT_ARRAY` elements.
    pub fn allowed_in_array(self) -> bool {
        matches!(
            self,
            VarType::I2
                | VarType::I4
                | VarType::R4
                | VarType::R8
                | VarType::Currency
                | VarType::Date
                | VarType::Bstr
                | VarType::Error
                | VarType::Bool
                | VarType::Variant
                | VarType::Decimal
                | VarType::I1
                | VarType::UI1
                | VarType::UI2
                | VarType::UI4
                | VarType::Int
                | VarType::UInt
        )
    }
}

/// A 96-bit scaled integer (`VT_DECIMAL`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Decimal {
    pub scale: u8,
    /// `0x80` for negative values.
    pub sign: u8,
    pub hi32: u32,
    pub lo64: u64,
}

impl Decimal {
    pub fn mantissa(&self) -> u128 {
        (u128::from(self.hi32) << 64) | u128::from(self.lo64)
    }

    pub fn to_f64(&self) -> f64 {
        let value = self.mantissa() as f64 / 10f64.powi(i32::from(self.scale));
        if self.sign & 0x80 != 0 { -value } else { value }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ArrayDimension {
    pub size: u32,
    pub index_offset: i32,
}

/// One decoded typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Empty,
    Null,
    I2(i16),
    I4(i32),
    R4(f32),
    R8(f64),
    /// Currency, as an integer scaled by 10000.
    Currency(i64),
    /// OLE automation date: fractional days since 1899-12-30.
    Date(f64),
    Bstr(String),
    Error(u32),
    Bool(bool),
    Decimal(Decimal),
    I1(i8),
    UI1(u8),
    UI2(u16),
    UI4(u32),
    I8(i64),
    UI8(u64),
    Int(i32),
    UInt(u32),
    Lpstr(String),
    Lpwstr(String),
    FileTime(FileTime),
    Blob(Vec<u8>),
    ClipboardData { format: i32, data: Vec<u8> },
    Clsid(Guid),
    VersionedStream { version: Guid, stream_name: String },
    Vector { element: VarType, items: Vec<TypedValue> },
    Array {
        element: VarType,
        dimensions: Vec<ArrayDimension>,
        items: Vec<TypedValue>,
    },
    /// A type tag this crate does not know, with the bytes that follow it.
    Raw { tag: u16, bytes: Vec<u8> },
}

impl TypedValue {
    /// The full type tag, including vector/array flags.
    pub fn tag(&self) -> u16 {
        match self {
            TypedValue::Empty => VarType::Empty.tag(),
            TypedValue::Null => VarType::Null.tag(),
            TypedValue::I2(_) => VarType::I2.tag(),
            TypedValue::I4(_) => VarType::I4.tag(),
            TypedValue::R4(_) => VarType::R4.tag(),
            TypedValue::R8(_) => VarType::R8.tag(),
            TypedValue::Currency(_) => VarType::Currency.tag(),
            TypedValue::Date(_) => VarType::Date.tag(),
            TypedValue::Bstr(_) => VarType::Bstr.tag(),
            TypedValue::Error(_) => VarType::Error.tag(),
            TypedValue::Bool(_) => VarType::Bool.tag(),
            TypedValue::Decimal(_) => VarType::Decimal.tag(),
            TypedValue::I1(_) => VarType::I1.tag(),
            TypedValue::UI1(_) => VarType::UI1.tag(),
            TypedValue::UI2(_) => VarType::UI2.tag(),
            TypedValue::UI4(_) => VarType::UI4.tag(),
            TypedValue::I8(_) => VarType::I8.tag(),
            TypedValue::UI8(_) => VarType::UI8.tag(),
            TypedValue::Int(_) => VarType::Int.tag(),
            TypedValue::UInt(_) => VarType::UInt.tag(),
            TypedValue::Lpstr(_) => VarType::Lpstr.tag(),
            TypedValue::Lpwstr(_) => VarType::Lpwstr.tag(),
            TypedValue::FileTime(_) => VarType::FileTime.tag(),
            TypedValue::Blob(_) => VarType::Blob.tag(),
            TypedValue::ClipboardData { .. } => VarType::ClipboardData.tag(),
            TypedValue::Clsid(_) => VarType::Clsid.tag(),
            TypedValue::VersionedStream { .. } => VarType::VersionedStream.tag(),
            TypedValue::Vector { element, .. } => VT_VECTOR | element.tag(),
            TypedValue::Array { element, .. } => VT_ARRAY | element.tag(),
            TypedValue::Raw { tag, .. } => *tag,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Lpstr(s) | TypedValue::Lpwstr(s) | TypedValue::Bstr(s) => Some(s),
            _ => None,
        }
    }

    /// Any integer type, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            TypedValue::I1(v) => Some(i64::from(v)),
            TypedValue::UI1(v) => Some(i64::from(v)),
            TypedValue::I2(v) => Some(i64::from(v)),
            TypedValue::UI2(v) => Some(i64::from(v)),
            TypedValue::I4(v) | TypedValue::Int(v) => Some(i64::from(v)),
            TypedValue::UI4(v) | TypedValue::UInt(v) => Some(i64::from(v)),
            TypedValue::I8(v) => Some(v),
            TypedValue::UI8(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            TypedValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_filetime(&self) -> Option<FileTime> {
        match *self {
            TypedValue::FileTime(ft) => Some(ft),
            _ => None,
        }
    }

    /// Point in time for `VT_FILETIME` (non-zero) and `VT_DATE` values.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match *self {
            TypedValue::FileTime(ft) => ft.timestamp(),
            TypedValue::Date(days) => ole_date_to_timestamp(days),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[TypedValue]> {
        match self {
            TypedValue::Vector { items, .. } | TypedValue::Array { items, .. } => Some(items),
            _ => None,
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, &b| {
            let _ = write!(acc, "{:02X}", b);
            acc
        })
}

impl From<&TypedValue> for Value {
    fn from(value: &TypedValue) -> Self {
        match value {
            TypedValue::Empty | TypedValue::Null => Value::Null,
            TypedValue::I2(v) => json!(v),
            TypedValue::I4(v) | TypedValue::Int(v) => json!(v),
            TypedValue::R4(v) => json!(v),
            TypedValue::R8(v) => json!(v),
            TypedValue::Currency(v) => json!(*v as f64 / 10_000.0),
            TypedValue::Date(days) => match ole_date_to_timestamp(*days) {
                Some(ts) => json!(ts.to_string()),
                None => json!(days),
            },
            TypedValue::Bstr(s) | TypedValue::Lpstr(s) | TypedValue::Lpwstr(s) => json!(s),
            TypedValue::Error(v) => json!(format!("{:#010x}", v)),
            TypedValue::Bool(v) => json!(v),
            TypedValue::Decimal(d) => json!(d.to_f64()),
            TypedValue::I1(v) => json!(v),
            TypedValue::UI1(v) => json!(v),
            TypedValue::UI2(v) => json!(v),
            TypedValue::UI4(v) | TypedValue::UInt(v) => json!(v),
            TypedValue::I8(v) => json!(v),
            TypedValue::UI8(v) => json!(v),
            TypedValue::FileTime(ft) => match ft.timestamp() {
                Some(ts) => json!(ts.to_string()),
                None => json!(ft.ticks()),
            },
            TypedValue::Blob(bytes) => json!(to_hex(bytes)),
            TypedValue::ClipboardData { format, data } => json!({
                "format": format,
                "size": data.len(),
            }),
            TypedValue::Clsid(guid) => json!(guid.to_string()),
            TypedValue::VersionedStream {
                version,
                stream_name,
            } => json!({
                "version": version.to_string(),
                "stream_name": stream_name,
            }),
            TypedValue::Vector { items, .. } => {
                Value::Array(items.iter().map(Value::from).collect())
            }
            TypedValue::Array {
                dimensions, items, ..
            } => json!({
                "dimensions": dimensions,
                "items": items.iter().map(Value::from).collect::<Vec<Value>>(),
            }),
            TypedValue::Raw { tag, bytes } => json!({
                "tag": format!("{:#06x}", tag),
                "bytes": to_hex(bytes),
            }),
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Value::from(self).serialize(serializer)
    }
}

/// Decodes typed property values from the body of one property set.
///
/// The cursor must be positioned relative to the start of the property set, since padding is
/// measured from there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueDecoder {
    code_page: u32,
}

impl ValueDecoder {
    pub(crate) fn new(code_page: u32) -> Self {
        ValueDecoder { code_page }
    }

    /// Decode a top-level property value. Unknown tags keep their bytes up to `extent_end`.
    pub(crate) fn read_property(
        &self,
        cursor: &mut ByteCursor<'_>,
        extent_end: usize,
    ) -> Result<TypedValue> {
        let start = cursor.pos();
        let tag = self.read_type_header(cursor)?;
        match self.read_tagged(cursor, tag, 0) {
            // Only the property's own tag degrades to raw bytes; nested unknown tags fail it.
            Err(CfbError::UnknownPropertyType { tag, offset }) if offset == start as u64 => {
                let body = start + 4;
                let len = extent_end.saturating_sub(body);
                warn!(
                    "unknown property type {:#06x} at offset {}, keeping {} raw bytes",
                    tag, offset, len
                );
                cursor.set_pos(body, "raw property value")?;
                let bytes = cursor.take_bytes(len, "raw property value")?.to_vec();
                Ok(TypedValue::Raw { tag, bytes })
            }
            other => other,
        }
    }

    fn read_type_header(&self, cursor: &mut ByteCursor<'_>) -> Result<u16> {
        let tag = cursor.u16_named("property type")?;
        let padding = cursor.u16_named("property type padding")?;
        if padding != 0 {
            warn!(
                "non-zero padding {:#06x} after property type {:#06x} at offset {}",
                padding,
                tag,
                cursor.pos() - 2
            );
        }
        Ok(tag)
    }

    fn unknown(tag: u16, cursor: &ByteCursor<'_>) -> CfbError {
        CfbError::UnknownPropertyType {
            tag,
            offset: cursor.position().saturating_sub(4),
        }
    }

    fn read_tagged(
        &self,
        cursor: &mut ByteCursor<'_>,
        tag: u16,
        depth: usize,
    ) -> Result<TypedValue> {
        if depth > MAX_VARIANT_DEPTH {
            return Err(CfbError::bad_property_stream(
                cursor.position(),
                "variants nested too deeply",
            ));
        }
        trace!("offset {}: value of type {:#06x}", cursor.pos(), tag);

        let base = VarType::from_u16(tag & VT_TYPE_MASK);
        match (tag & !VT_TYPE_MASK, base) {
            (0, Some(VarType::Variant)) => Err(Self::unknown(tag, cursor)),
            (0, Some(vt)) => {
                let value = self.read_scalar(cursor, vt, false, depth)?;
                cursor.align(4);
                Ok(value)
            }
            (VT_VECTOR, Some(vt)) if vt.allowed_in_vector() => self.read_vector(cursor, vt, depth),
            (VT_ARRAY, Some(vt)) if vt.allowed_in_array() => self.read_array(cursor, vt, depth),
            _ => Err(Self::unknown(tag, cursor)),
        }
    }

    /// Read one scalar. `packed` elements of vectors and arrays are stored at their natural width.
    fn read_scalar(
        &self,
        cursor: &mut ByteCursor<'_>,
        vt: VarType,
        packed: bool,
        depth: usize,
    ) -> Result<TypedValue> {
        let value = match vt {
            VarType::Empty => TypedValue::Empty,
            VarType::Null => TypedValue::Null,
            VarType::I1 => TypedValue::I1(cursor.u8_named("i1")? as i8),
            VarType::UI1 => TypedValue::UI1(cursor.u8_named("ui1")?),
            VarType::I2 => TypedValue::I2(i16::from_le_bytes(cursor.array::<2>("i2")?)),
            VarType::UI2 => TypedValue::UI2(cursor.u16_named("ui2")?),
            VarType::Bool => {
                let raw = cursor.u16_named("bool")?;
                if raw != 0 && raw != 0xFFFF {
                    warn!("unusual VT_BOOL value {:#06x}, treating it as true", raw);
                }
                TypedValue::Bool(raw != 0)
            }
            VarType::I4 => TypedValue::I4(i32::from_le_bytes(cursor.array::<4>("i4")?)),
            VarType::Int => TypedValue::Int(i32::from_le_bytes(cursor.array::<4>("int")?)),
            VarType::UI4 => TypedValue::UI4(cursor.u32_named("ui4")?),
            VarType::UInt => TypedValue::UInt(cursor.u32_named("uint")?),
            VarType::Error => TypedValue::Error(cursor.u32_named("hresult")?),
            VarType::R4 => TypedValue::R4(f32::from_le_bytes(cursor.array::<4>("r4")?)),
            VarType::R8 => TypedValue::R8(f64::from_le_bytes(cursor.array::<8>("r8")?)),
            VarType::Currency => {
                TypedValue::Currency(i64::from_le_bytes(cursor.array::<8>("currency")?))
            }
            VarType::Date => TypedValue::Date(f64::from_le_bytes(cursor.array::<8>("date")?)),
            VarType::I8 => TypedValue::I8(i64::from_le_bytes(cursor.array::<8>("i8")?)),
            VarType::UI8 => TypedValue::UI8(cursor.u64_named("ui8")?),
            VarType::FileTime => TypedValue::FileTime(FileTime(cursor.u64_named("filetime")?)),
            VarType::Decimal => {
                let _reserved = cursor.u16_named("decimal reserved")?;
                let scale = cursor.u8_named("decimal scale")?;
                let sign = cursor.u8_named("decimal sign")?;
                let hi32 = cursor.u32_named("decimal hi32")?;
                let lo64 = cursor.u64_named("decimal lo64")?;
                TypedValue::Decimal(Decimal {
                    scale,
                    sign,
                    hi32,
                    lo64,
                })
            }
            VarType::Clsid => TypedValue::Clsid(Guid::from_bytes(&cursor.array::<16>("clsid")?)),
            VarType::Lpstr => TypedValue::Lpstr(self.read_code_page_string(cursor, packed)?),
            VarType::Bstr => TypedValue::Bstr(self.read_code_page_string(cursor, packed)?),
            VarType::Lpwstr => TypedValue::Lpwstr(read_unicode_string(cursor)?),
            VarType::Blob => {
                let size = cursor.count_named(1, "blob size")?;
                let bytes = cursor.take_bytes(size, "blob")?.to_vec();
                cursor.align(4);
                TypedValue::Blob(bytes)
            }
            VarType::ClipboardData => {
                let at = cursor.position();
                let size = cursor.count_named(1, "clipboard data size")?;
                if size < 4 {
                    return Err(CfbError::bad_property_stream(
                        at,
                        format!("clipboard data size {} is smaller than its format field", size),
                    ));
                }
                let format = i32::from_le_bytes(cursor.array::<4>("clipboard format")?);
                let data = cursor.take_bytes(size - 4, "clipboard data")?.to_vec();
                cursor.align(4);
                TypedValue::ClipboardData { format, data }
            }
            VarType::VersionedStream => {
                let version = Guid::from_bytes(&cursor.array::<16>("stream version")?);
                let stream_name = self.read_code_page_string(cursor, false)?;
                TypedValue::VersionedStream {
                    version,
                    stream_name,
                }
            }
            VarType::Variant => {
                let tag = self.read_type_header(cursor)?;
                let value = self.read_tagged(cursor, tag, depth + 1)?;
                cursor.align(4);
                value
            }
        };
        Ok(value)
    }

    /// A length-prefixed 8-bit string in the set's code page.
    ///
    /// Stand-alone strings are padded to 4 bytes. Strings packed into vectors and arrays are
    /// only padded when the code page is UTF-16 (1200), which is how Office writes them.
    fn read_code_page_string(&self, cursor: &mut ByteCursor<'_>, packed: bool) -> Result<String> {
        let size = cursor.count_named(1, "string size")?;
        let bytes = cursor.take_bytes(size, "string")?;
        let decoded = codepage::decode_z(self.code_page, bytes)?;
        if !packed || self.code_page == CP_WINUNICODE {
            cursor.align(4);
        }
        Ok(decoded)
    }

    fn read_vector(
        &self,
        cursor: &mut ByteCursor<'_>,
        vt: VarType,
        depth: usize,
    ) -> Result<TypedValue> {
        let min_width = vt.fixed_width().unwrap_or(4);
        let count = cursor.count_named(min_width, "vector length")?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_scalar(cursor, vt, true, depth)?);
        }
        cursor.align(4);
        Ok(TypedValue::Vector { element: vt, items })
    }

    fn read_array(
        &self,
        cursor: &mut ByteCursor<'_>,
        vt: VarType,
        depth: usize,
    ) -> Result<TypedValue> {
        let header_at = cursor.position();
        let declared = cursor.u32_named("array element type")?;
        if declared != u32::from(vt.tag()) {
            warn!(
                "array header type {:#x} does not match property type {:#x}",
                declared,
                vt.tag()
            );
        }
        let num_dimensions = cursor.u32_named("array dimension count")?;
        if !(1..=MAX_ARRAY_DIMENSIONS).contains(&num_dimensions) {
            return Err(CfbError::bad_property_stream(
                header_at,
                format!("invalid array dimension count {}", num_dimensions),
            ));
        }

        let mut dimensions = Vec::with_capacity(num_dimensions as usize);
        let mut total: usize = 1;
        for _ in 0..num_dimensions {
            let size = cursor.u32_named("array dimension size")?;
            let index_offset = i32::from_le_bytes(cursor.array::<4>("array index offset")?);
            total = total.checked_mul(size as usize).ok_or_else(|| {
                CfbError::bad_property_stream(header_at, "array element count overflows")
            })?;
            dimensions.push(ArrayDimension { size, index_offset });
        }

        let min_width = vt.fixed_width().unwrap_or(4);
        if total.saturating_mul(min_width) > cursor.remaining() {
            return Err(CfbError::bad_property_stream(
                header_at,
                format!(
                    "array of {} elements overflows the remaining {} bytes",
                    total,
                    cursor.remaining()
                ),
            ));
        }

        let mut items = Vec::with_capacity(total);
        for _ in 0..total {
            items.push(self.read_scalar(cursor, vt, true, depth)?);
        }
        cursor.align(4);
        Ok(TypedValue::Array {
            element: vt,
            dimensions,
            items,
        })
    }
}

/// A character-counted UTF-16LE string, always padded to 4 bytes.
fn read_unicode_string(cursor: &mut ByteCursor<'_>) -> Result<String> {
    let chars = cursor.count_named(2, "unicode string length")?;
    let bytes = cursor.take_bytes(chars * 2, "unicode string")?;
    let decoded = decode_utf16le_bytes_z(bytes).map_err(|e| CfbError::DecodeError {
        code_page: CP_WINUNICODE,
        message: e.to_string(),
    })?;
    cursor.align(4);
    Ok(decoded)
}
