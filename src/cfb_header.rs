use crate::allocation::is_regular_sector;
use crate::err::{CfbError, Result};
use crate::guid::Guid;
use crate::utils::bytes;

use log::{debug, warn};
use serde::Serialize;

pub const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
pub const CFB_HEADER_SIZE: usize = 512;
pub const HEADER_DIFAT_ENTRIES: usize = 109;
pub const BYTE_ORDER_MARK: u16 = 0xFFFE;
pub const DEFAULT_MINI_STREAM_CUTOFF: u32 = 0x1000;

/// Field offsets of the 512-byte header. Widths follow from the reader used for each field.
mod layout {
    pub const SIGNATURE: usize = 0x00;
    pub const CLSID: usize = 0x08;
    pub const MINOR_VERSION: usize = 0x18;
    pub const MAJOR_VERSION: usize = 0x1A;
    pub const BYTE_ORDER: usize = 0x1C;
    pub const SECTOR_SHIFT: usize = 0x1E;
    pub const MINI_SECTOR_SHIFT: usize = 0x20;
    // 6 reserved bytes at 0x22
    pub const DIR_SECT_COUNT: usize = 0x28;
    pub const FAT_SECT_COUNT: usize = 0x2C;
    pub const DIR_SECT_OFFSET: usize = 0x30;
    pub const TRANSACTION_SIGNATURE: usize = 0x34;
    pub const MINI_STREAM_CUTOFF: usize = 0x38;
    pub const MINI_FAT_SECT_OFFSET: usize = 0x3C;
    pub const MINI_FAT_SECT_COUNT: usize = 0x40;
    pub const DI_FAT_SECT_OFFSET: usize = 0x44;
    pub const DI_FAT_SECT_COUNT: usize = 0x48;
    pub const DI_FAT: usize = 0x4C;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CfbHeader {
    pub clsid: Guid,
    pub minor_version: u16,
    pub major_version: u16,
    pub byte_order: u16,
    pub sector_shift: u16,
    pub mini_sector_shift: u16,
    /// Only meaningful for version 4 files; version 3 writers leave it at zero.
    pub dir_sect_count: u32,
    pub fat_sect_count: u32,
    pub dir_sect_offset: u32,
    pub transaction_signature: u32,
    pub mini_stream_cutoff: u32,
    pub mini_fat_sect_offset: u32,
    pub mini_fat_sect_count: u32,
    pub di_fat_sect_offset: u32,
    pub di_fat_sect_count: u32,
    /// The first 109 DIFAT entries, stored inline in the header.
    #[serde(skip)]
    pub di_fat: Vec<u32>,
}

impl CfbHeader {
    /// Parse and validate the first 512 bytes of a compound file.
    pub fn from_bytes(buf: &[u8]) -> Result<CfbHeader> {
        let _ = bytes::slice_r(buf, 0, CFB_HEADER_SIZE, "compound file header")?;

        let magic = bytes::read_array_r::<8>(buf, layout::SIGNATURE, "header signature")?;
        if magic != CFB_SIGNATURE {
            return Err(CfbError::BadSignature { magic });
        }

        let clsid = Guid::from_bytes(&bytes::read_array_r::<16>(
            buf,
            layout::CLSID,
            "header clsid",
        )?);
        let minor_version = bytes::read_u16_le_r(buf, layout::MINOR_VERSION, "minor version")?;
        let major_version = bytes::read_u16_le_r(buf, layout::MAJOR_VERSION, "major version")?;
        let byte_order = bytes::read_u16_le_r(buf, layout::BYTE_ORDER, "byte order")?;
        let sector_shift = bytes::read_u16_le_r(buf, layout::SECTOR_SHIFT, "sector shift")?;
        let mini_sector_shift =
            bytes::read_u16_le_r(buf, layout::MINI_SECTOR_SHIFT, "mini sector shift")?;

        if byte_order != BYTE_ORDER_MARK {
            return Err(CfbError::BadGeometry {
                field: "byte_order",
                value: u32::from(byte_order),
            });
        }

        match (major_version, sector_shift) {
            (3, 9) | (4, 12) => {}
            (3, _) | (4, _) => {
                return Err(CfbError::BadGeometry {
                    field: "sector_shift",
                    value: u32::from(sector_shift),
                });
            }
            (other, 9) | (other, 12) => {
                warn!(
                    "unknown major version {}, trusting sector shift {}",
                    other, sector_shift
                );
            }
            (_, _) => {
                return Err(CfbError::BadGeometry {
                    field: "sector_shift",
                    value: u32::from(sector_shift),
                });
            }
        }

        if mini_sector_shift != 6 {
            return Err(CfbError::BadGeometry {
                field: "mini_sector_shift",
                value: u32::from(mini_sector_shift),
            });
        }

        let header = CfbHeader {
            clsid,
            minor_version,
            major_version,
            byte_order,
            sector_shift,
            mini_sector_shift,
            dir_sect_count: bytes::read_u32_le_r(buf, layout::DIR_SECT_COUNT, "dir count")?,
            fat_sect_count: bytes::read_u32_le_r(buf, layout::FAT_SECT_COUNT, "fat count")?,
            dir_sect_offset: bytes::read_u32_le_r(buf, layout::DIR_SECT_OFFSET, "dir start")?,
            transaction_signature: bytes::read_u32_le_r(
                buf,
                layout::TRANSACTION_SIGNATURE,
                "transaction signature",
            )?,
            mini_stream_cutoff: bytes::read_u32_le_r(
                buf,
                layout::MINI_STREAM_CUTOFF,
                "mini stream cutoff",
            )?,
            mini_fat_sect_offset: bytes::read_u32_le_r(
                buf,
                layout::MINI_FAT_SECT_OFFSET,
                "mini fat start",
            )?,
            mini_fat_sect_count: bytes::read_u32_le_r(
                buf,
                layout::MINI_FAT_SECT_COUNT,
                "mini fat count",
            )?,
            di_fat_sect_offset: bytes::read_u32_le_r(
                buf,
                layout::DI_FAT_SECT_OFFSET,
                "difat start",
            )?,
            di_fat_sect_count: bytes::read_u32_le_r(
                buf,
                layout::DI_FAT_SECT_COUNT,
                "difat count",
            )?,
            di_fat: bytes::read_u32_vec_le_r(
                buf,
                layout::DI_FAT,
                HEADER_DIFAT_ENTRIES,
                "header difat",
            )?,
        };

        if !header.clsid.is_null() {
            warn!("header CLSID is not null: {}", header.clsid);
        }
        if header.mini_stream_cutoff != DEFAULT_MINI_STREAM_CUTOFF {
            warn!(
                "unusual mini stream cutoff {:#x} (expected {:#x})",
                header.mini_stream_cutoff, DEFAULT_MINI_STREAM_CUTOFF
            );
        }
        if header.major_version == 3 && header.dir_sect_count != 0 {
            debug!(
                "version 3 header carries a directory sector count of {}, ignoring",
                header.dir_sect_count
            );
        }

        debug!("{:?}", header);
        Ok(header)
    }

    pub fn sector_size(&self) -> usize {
        1 << self.sector_shift
    }

    pub fn mini_sector_size(&self) -> usize {
        1 << self.mini_sector_shift
    }

    /// Physical offset of a regular sector. Sector 0 starts right after the header sector.
    pub fn sector_offset(&self, sector: u32) -> u64 {
        (u64::from(sector) + 1) << self.sector_shift
    }

    /// Inline DIFAT entries that name FAT sectors (`FREESECT` padding dropped).
    pub fn inline_fat_sectors(&self) -> impl Iterator<Item = u32> + '_ {
        self.di_fat.iter().copied().filter(|&s| is_regular_sector(s))
    }
}
