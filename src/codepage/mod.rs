//! Windows code page lookup for 8-bit property strings.
//!
//! Code pages are resolved through an explicit table: a handful of pages are matched here,
//! the DOS pages and ISO 8859-9 that `encoding` lacks come from bundled tables, and everything
//! else goes through `encoding`'s Windows code page labels. No process-wide state is involved.

mod tables;

use crate::err::{CfbError, Result};
use self::tables::OemTable;

use encoding::label::encoding_from_windows_code_page;
use encoding::{DecoderTrap, EncoderTrap, EncodingRef};

/// CP_WINUNICODE: 8-bit string properties actually hold UTF-16LE.
pub const CP_WINUNICODE: u32 = 1200;
pub const CP_UTF8: u32 = 65001;

enum Codec {
    Library(EncodingRef),
    Oem(&'static OemTable),
}

fn lookup(code_page: u32) -> Option<Codec> {
    let codec = match code_page {
        437 => Codec::Oem(&tables::CP437),
        720 => Codec::Oem(&tables::CP720),
        737 => Codec::Oem(&tables::CP737),
        775 => Codec::Oem(&tables::CP775),
        850 => Codec::Oem(&tables::CP850),
        852 => Codec::Oem(&tables::CP852),
        855 => Codec::Oem(&tables::CP855),
        857 => Codec::Oem(&tables::CP857),
        858 => Codec::Oem(&tables::CP858),
        862 => Codec::Oem(&tables::CP862),
        CP_WINUNICODE => Codec::Library(encoding::all::UTF_16LE),
        1201 => Codec::Library(encoding::all::UTF_16BE),
        CP_UTF8 => Codec::Library(encoding::all::UTF_8),
        20127 => Codec::Library(encoding::all::ASCII),
        28591 => Codec::Library(encoding::all::ISO_8859_1),
        28599 => Codec::Oem(&tables::ISO_8859_9),
        28600 => Codec::Library(encoding::all::ISO_8859_10),
        28604 => Codec::Library(encoding::all::ISO_8859_14),
        other => Codec::Library(encoding_from_windows_code_page(other as usize)?),
    };
    Some(codec)
}

fn unsupported(code_page: u32) -> CfbError {
    CfbError::DecodeError {
        code_page,
        message: "unsupported code page".to_owned(),
    }
}

pub fn is_supported(code_page: u32) -> bool {
    lookup(code_page).is_some()
}

/// Name of the codec used for `code_page`.
pub fn codec_name(code_page: u32) -> Option<&'static str> {
    lookup(code_page).map(|codec| match codec {
        Codec::Library(enc) => enc.name(),
        Codec::Oem(table) => table.name,
    })
}

/// Width in bytes of one code unit, used to find string terminators.
pub fn unit_width(code_page: u32) -> usize {
    match code_page {
        CP_WINUNICODE | 1201 => 2,
        _ => 1,
    }
}

/// Decode `bytes` strictly: unmapped bytes are an error, not a replacement character.
pub fn decode(code_page: u32, bytes: &[u8]) -> Result<String> {
    match lookup(code_page).ok_or_else(|| unsupported(code_page))? {
        Codec::Library(enc) => enc
            .decode(bytes, DecoderTrap::Strict)
            .map_err(|m| CfbError::DecodeError {
                code_page,
                message: m.into_owned(),
            }),
        Codec::Oem(table) => decode_oem(table, bytes),
    }
}

/// Decode up to the first terminator (a NUL code unit of the code page's width).
pub fn decode_z(code_page: u32, bytes: &[u8]) -> Result<String> {
    let width = unit_width(code_page);
    let end = bytes
        .chunks(width)
        .position(|unit| unit.iter().all(|&b| b == 0))
        .map_or(bytes.len(), |i| i * width);
    decode(code_page, &bytes[..end])
}

pub fn encode(code_page: u32, text: &str) -> Result<Vec<u8>> {
    match lookup(code_page).ok_or_else(|| unsupported(code_page))? {
        Codec::Library(enc) => {
            enc.encode(text, EncoderTrap::Strict)
                .map_err(|m| CfbError::DecodeError {
                    code_page,
                    message: m.into_owned(),
                })
        }
        Codec::Oem(table) => encode_oem(table, text),
    }
}

fn decode_oem(table: &OemTable, bytes: &[u8]) -> Result<String> {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b < 0x80 {
            out.push(char::from(b));
            continue;
        }
        let unit = table.high[usize::from(b - 0x80)];
        match char::from_u32(u32::from(unit)) {
            Some(c) if unit != 0 => out.push(c),
            _ => {
                return Err(CfbError::DecodeError {
                    code_page: table.code_page,
                    message: format!("byte {:#04x} has no mapping", b),
                });
            }
        }
    }
    Ok(out)
}

fn encode_oem(table: &OemTable, text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let position = table
            .high
            .iter()
            .position(|&unit| unit != 0 && u32::from(unit) == c as u32);
        match position {
            Some(i) => out.push(0x80 + i as u8),
            None => {
                return Err(CfbError::DecodeError {
                    code_page: table.code_page,
                    message: format!("{:?} cannot be encoded", c),
                });
            }
        }
    }
    Ok(out)
}
