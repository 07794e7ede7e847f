pub(crate) mod byte_cursor;
pub(crate) mod bytes;
pub mod time;
pub(crate) mod utf16;

pub(crate) use self::byte_cursor::ByteCursor;
pub use self::time::{FileTime, filetime_to_timestamp, ole_date_to_timestamp};
pub(crate) use self::utf16::{decode_utf16_units_z_lossy, decode_utf16le_bytes_z, utf16le_units};
