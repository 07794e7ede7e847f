#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Utf16LeDecodeError {
    OddLength,
    InvalidData,
}

impl std::fmt::Display for Utf16LeDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Utf16LeDecodeError::OddLength => write!(f, "odd number of bytes in UTF-16LE data"),
            Utf16LeDecodeError::InvalidData => write!(f, "unpaired surrogate in UTF-16LE data"),
        }
    }
}

/// Collect UTF-16LE code units from raw bytes. A trailing odd byte is ignored.
pub(crate) fn utf16le_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

/// Decode a UTF-16LE byte slice until the first NUL (0x0000), if present.
pub(crate) fn decode_utf16le_bytes_z(bytes: &[u8]) -> Result<String, Utf16LeDecodeError> {
    if !bytes.len().is_multiple_of(2) {
        return Err(Utf16LeDecodeError::OddLength);
    }

    decode_utf16_units_z(&utf16le_units(bytes))
}

/// Decode UTF-16 code units until the first NUL (0x0000), if present.
pub(crate) fn decode_utf16_units_z(units: &[u16]) -> Result<String, Utf16LeDecodeError> {
    let end = units.iter().position(|&c| c == 0).unwrap_or(units.len());
    let slice = &units[..end];

    // Fast path: pure ASCII converts without surrogate handling.
    if slice.iter().all(|&c| c <= 0x7F) {
        return Ok(slice.iter().map(|&c| c as u8 as char).collect());
    }

    String::from_utf16(slice).map_err(|_| Utf16LeDecodeError::InvalidData)
}

/// Like [`decode_utf16_units_z`], but unpaired surrogates become U+FFFD.
///
/// Directory entry names are decoded this way: a damaged name should not hide the entry.
pub(crate) fn decode_utf16_units_z_lossy(units: &[u16]) -> String {
    let end = units.iter().position(|&c| c == 0).unwrap_or(units.len());
    String::from_utf16_lossy(&units[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_until_nul() {
        let bytes = [b'A', 0, b'b', 0, 0, 0, b'c', 0];
        assert_eq!(decode_utf16le_bytes_z(&bytes).unwrap(), "Ab");
    }

    #[test]
    fn test_rejects_odd_and_unpaired() {
        assert_eq!(
            decode_utf16le_bytes_z(&[b'A', 0, b'B']),
            Err(Utf16LeDecodeError::OddLength)
        );
        assert_eq!(
            decode_utf16_units_z(&[0xD800, 0x0041]),
            Err(Utf16LeDecodeError::InvalidData)
        );
        assert_eq!(decode_utf16_units_z_lossy(&[0xD800, 0x0041]), "\u{FFFD}A");
    }

    #[test]
    fn test_decodes_non_ascii() {
        assert_eq!(decode_utf16_units_z(&[0x00E9, 0x20AC]).unwrap(), "é€");
    }
}
