use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CfbError>;

/// Errors raised while reading a compound file or one of its property-set streams.
///
/// Structural errors (signature, geometry, chain cycles) are fatal for the whole container.
/// Directory-entry errors are only raised when the offending entry is accessed.
#[derive(Debug, Error)]
pub enum CfbError {
    #[error("Invalid compound file signature, expected `D0CF11E0A1B11AE1`, found `{magic:02X?}`")]
    BadSignature { magic: [u8; 8] },

    #[error("Invalid compound file geometry: {field} = {value:#x}")]
    BadGeometry { field: &'static str, value: u32 },

    #[error("Sector {sector:#x} is out of range ({reason})")]
    BadSector { sector: u32, reason: &'static str },

    #[error("Allocation chain `{chain}` revisits sector {sector:#x}")]
    CyclicChain { chain: &'static str, sector: u32 },

    #[error("Offset {offset}: truncated read of {what} (need {need} bytes, have {have})")]
    TruncatedRead {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("Directory entry {sid}: {reason}")]
    BadDirectoryEntry { sid: u32, reason: String },

    #[error("Offset {offset}: malformed property set stream: {reason}")]
    BadPropertyStream { offset: u64, reason: String },

    #[error("Offset {offset}: unknown property type {tag:#06x}")]
    UnknownPropertyType { tag: u16, offset: u64 },

    #[error("Failed to decode string using code page {code_page}: {message}")]
    DecodeError { code_page: u32, message: String },

    #[error("Directory entry {sid} is a storage and has no stream data")]
    NotAStream { sid: u32 },

    #[error("Directory entry {sid} does not exist (directory holds {count} entries)")]
    UnknownSid { sid: u32, count: usize },

    #[error("An I/O error has occurred while reading the byte source")]
    Io(#[from] io::Error),
}

impl CfbError {
    pub(crate) fn bad_property_stream(offset: u64, reason: impl Into<String>) -> Self {
        CfbError::BadPropertyStream {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn bad_entry(sid: u32, reason: impl Into<String>) -> Self {
        CfbError::BadDirectoryEntry {
            sid,
            reason: reason.into(),
        }
    }

    /// Whether this error was caused by the input being shorter than its structures claim.
    pub fn is_truncation(&self) -> bool {
        match self {
            CfbError::TruncatedRead { .. } => true,
            CfbError::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// A single property that failed to decode, recorded instead of failing the whole property set.
#[derive(Debug, Error)]
#[error("Property {pid:#x} at offset {offset}: {source}")]
pub struct PropertyError {
    pub pid: u32,
    /// Offset of the property value, relative to the start of the property set.
    pub offset: u32,
    #[source]
    pub source: CfbError,
}
