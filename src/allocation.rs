//! Sector identifiers and the three allocation tables of a compound file.
//!
//! - the **DIFAT** lists which sectors hold the FAT. Its first 109 entries live in the header,
//!   the rest in a linked list of DIFAT sectors.
//! - the **FAT** maps every regular sector to the next sector of its chain.
//! - the **mini-FAT** does the same for the 64-byte mini-sectors of the mini stream.
//!
//! Every chain walk keeps a visited set, so a damaged table can never make a walk loop forever.

use crate::cfb_header::CfbHeader;
use crate::container::ReadSeek;
use crate::err::{CfbError, Result};
use crate::utils::bytes;

use hashbrown::HashSet;
use log::{debug, trace, warn};
use std::io::{self, SeekFrom};

/// Largest value that is a regular sector index.
pub const MAXREGSECT: u32 = 0xFFFF_FFFA;
/// Marks a sector used by the DIFAT.
pub const DIFSECT: u32 = 0xFFFF_FFFC;
/// Marks a sector used by the FAT.
pub const FATSECT: u32 = 0xFFFF_FFFD;
/// Terminates a chain.
pub const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
/// Unallocated sector.
pub const FREESECT: u32 = 0xFFFF_FFFF;

#[inline]
pub fn is_regular_sector(sector: u32) -> bool {
    sector <= MAXREGSECT
}

/// Human readable name of a sector identifier, used in log messages and the CLI.
pub fn describe_sector(sector: u32) -> String {
    match sector {
        DIFSECT => "DIFSECT".to_owned(),
        FATSECT => "FATSECT".to_owned(),
        ENDOFCHAIN => "ENDOFCHAIN".to_owned(),
        FREESECT => "FREESECT".to_owned(),
        s if is_regular_sector(s) => format!("{:#x}", s),
        s => format!("reserved({:#x})", s),
    }
}

/// A FAT or mini-FAT: `entries[s]` is the sector that follows `s` in its chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationTable {
    name: &'static str,
    entries: Vec<u32>,
    /// Number of units that physically exist. Entries past this point describe data
    /// that is not present in the source.
    limit: u32,
}

impl AllocationTable {
    pub fn new(name: &'static str, entries: Vec<u32>, limit: u32) -> Self {
        AllocationTable {
            name,
            entries,
            limit,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Next sector in the chain of `sector`.
    pub fn next(&self, sector: u32) -> Result<u32> {
        self.entries
            .get(sector as usize)
            .copied()
            .ok_or(CfbError::BadSector {
                sector,
                reason: "no allocation table entry for this sector",
            })
    }

    /// Walk the chain that starts at `start`, returning the ordered list of sectors.
    ///
    /// A chain starting at `ENDOFCHAIN` or `FREESECT` is empty. A chain that runs into
    /// `FREESECT` (or another reserved value) is cut at that point.
    pub fn chain(&self, start: u32) -> Result<Vec<u32>> {
        let mut out = Vec::new();
        if start == ENDOFCHAIN || start == FREESECT {
            return Ok(out);
        }
        if !is_regular_sector(start) {
            return Err(CfbError::BadSector {
                sector: start,
                reason: "chain starts at a reserved sector id",
            });
        }

        let mut visited = HashSet::new();
        let mut current = start;
        loop {
            if current >= self.limit {
                return Err(CfbError::BadSector {
                    sector: current,
                    reason: "sector lies beyond the end of the source",
                });
            }
            if !visited.insert(current) {
                return Err(CfbError::CyclicChain {
                    chain: self.name,
                    sector: current,
                });
            }
            out.push(current);

            let next = self.next(current)?;
            trace!(
                "{}: {:#x} -> {}",
                self.name,
                current,
                describe_sector(next)
            );
            match next {
                ENDOFCHAIN => break,
                s if is_regular_sector(s) => current = s,
                other => {
                    warn!(
                        "{} chain starting at {:#x} ends with {} instead of ENDOFCHAIN",
                        self.name,
                        start,
                        describe_sector(other)
                    );
                    break;
                }
            }
        }

        Ok(out)
    }
}

/// Read `buf.len()` bytes at `offset`, stopping early at end of input.
///
/// Returns the number of bytes actually read.
pub(crate) fn read_at<T: ReadSeek + ?Sized>(
    source: &mut T,
    offset: u64,
    buf: &mut [u8],
) -> io::Result<usize> {
    source.seek(SeekFrom::Start(offset))?;
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reads whole sectors out of the byte source while the container is being built.
pub(crate) struct SectorReader<'a, T: ReadSeek + ?Sized> {
    source: &'a mut T,
    header: &'a CfbHeader,
    source_len: u64,
}

impl<'a, T: ReadSeek + ?Sized> SectorReader<'a, T> {
    pub(crate) fn new(source: &'a mut T, header: &'a CfbHeader, source_len: u64) -> Self {
        SectorReader {
            source,
            header,
            source_len,
        }
    }

    /// Number of regular sectors that start inside the source.
    pub(crate) fn sector_count(&self) -> u32 {
        sector_count(self.header, self.source_len)
    }

    pub(crate) fn read_sector(&mut self, sector: u32, what: &'static str) -> Result<Vec<u8>> {
        if !is_regular_sector(sector) {
            return Err(CfbError::BadSector {
                sector,
                reason: "reserved sector id used as a sector index",
            });
        }
        let offset = self.header.sector_offset(sector);
        if offset >= self.source_len {
            return Err(CfbError::BadSector {
                sector,
                reason: "sector lies beyond the end of the source",
            });
        }

        let mut buf = vec![0; self.header.sector_size()];
        let n = read_at(self.source, offset, &mut buf)?;
        if n < buf.len() {
            return Err(CfbError::TruncatedRead {
                what,
                offset,
                need: buf.len(),
                have: n,
            });
        }
        Ok(buf)
    }
}

/// Number of regular sectors that start inside a source of `source_len` bytes.
pub(crate) fn sector_count(header: &CfbHeader, source_len: u64) -> u32 {
    let sector_size = header.sector_size() as u64;
    let data_len = source_len.saturating_sub(sector_size);
    let count = data_len.div_ceil(sector_size);
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Collect the full DIFAT: the inline header entries followed by every extension sector.
pub(crate) fn load_difat<T: ReadSeek + ?Sized>(
    reader: &mut SectorReader<'_, T>,
) -> Result<Vec<u32>> {
    let header = reader.header;
    let mut fat_sectors: Vec<u32> = header.inline_fat_sectors().collect();

    let per_sector = header.sector_size() / 4 - 1;
    let mut visited = HashSet::new();
    let mut current = header.di_fat_sect_offset;
    let mut walked = 0u32;

    while walked < header.di_fat_sect_count && is_regular_sector(current) {
        if !visited.insert(current) {
            return Err(CfbError::CyclicChain {
                chain: "difat",
                sector: current,
            });
        }
        let data = reader.read_sector(current, "difat sector")?;
        let entries = bytes::read_u32_vec_le_r(&data, 0, per_sector + 1, "difat sector")?;

        fat_sectors.extend(
            entries[..per_sector]
                .iter()
                .copied()
                .filter(|&s| is_regular_sector(s)),
        );
        current = entries[per_sector];
        walked += 1;
    }

    if walked < header.di_fat_sect_count {
        warn!(
            "DIFAT chain ended after {} of {} declared sectors (next is {})",
            walked,
            header.di_fat_sect_count,
            describe_sector(current)
        );
    } else if is_regular_sector(current) {
        warn!(
            "DIFAT chain continues past its {} declared sectors (next is {})",
            header.di_fat_sect_count,
            describe_sector(current)
        );
    }

    if fat_sectors.len() != header.fat_sect_count as usize {
        warn!(
            "header declares {} FAT sectors, DIFAT lists {}",
            header.fat_sect_count,
            fat_sectors.len()
        );
    }

    Ok(fat_sectors)
}

/// Concatenate the FAT sectors named by the DIFAT into the FAT.
pub(crate) fn load_fat<T: ReadSeek + ?Sized>(
    reader: &mut SectorReader<'_, T>,
    difat: &[u32],
) -> Result<AllocationTable> {
    let mut seen = HashSet::with_capacity(difat.len());
    let mut entries = Vec::with_capacity(difat.len() * reader.header.sector_size() / 4);
    for &sector in difat {
        if !seen.insert(sector) {
            return Err(CfbError::CyclicChain {
                chain: "difat",
                sector,
            });
        }
        let data = reader.read_sector(sector, "fat sector")?;
        let count = data.len() / 4;
        entries.extend(bytes::read_u32_vec_le_r(&data, 0, count, "fat sector")?);
    }

    let limit = reader.sector_count();
    debug!(
        "FAT has {} entries from {} sectors, source holds {} sectors",
        entries.len(),
        difat.len(),
        limit
    );
    Ok(AllocationTable::new("fat", entries, limit))
}

/// Load the mini-FAT by walking its chain through the FAT.
///
/// `mini_stream_len` is the size of the root entry's stream; it bounds which mini-sectors exist.
pub(crate) fn load_mini_fat<T: ReadSeek + ?Sized>(
    reader: &mut SectorReader<'_, T>,
    fat: &AllocationTable,
    mini_stream_len: u64,
) -> Result<AllocationTable> {
    let header = reader.header;
    let mut chain = fat.chain(header.mini_fat_sect_offset)?;
    if chain.len() != header.mini_fat_sect_count as usize {
        warn!(
            "header declares {} mini-FAT sectors, chain holds {}",
            header.mini_fat_sect_count,
            chain.len()
        );
        if header.mini_fat_sect_count != 0 && chain.len() > header.mini_fat_sect_count as usize {
            chain.truncate(header.mini_fat_sect_count as usize);
        }
    }

    let mut entries = Vec::with_capacity(chain.len() * header.sector_size() / 4);
    for sector in chain {
        let data = reader.read_sector(sector, "mini fat sector")?;
        let count = data.len() / 4;
        entries.extend(bytes::read_u32_vec_le_r(&data, 0, count, "mini fat sector")?);
    }

    let limit = mini_stream_len.div_ceil(header.mini_sector_size() as u64);
    let limit = u32::try_from(limit).unwrap_or(u32::MAX);
    debug!(
        "mini-FAT has {} entries, mini stream holds {} mini-sectors",
        entries.len(),
        limit
    );
    Ok(AllocationTable::new("minifat", entries, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(entries: &[u32]) -> AllocationTable {
        AllocationTable::new("fat", entries.to_vec(), entries.len() as u32)
    }

    #[test]
    fn test_walks_chain_in_order() {
        let fat = table(&[FATSECT, 3, ENDOFCHAIN, 2]);
        assert_eq!(fat.chain(1).unwrap(), vec![1, 3, 2]);
        assert_eq!(fat.chain(2).unwrap(), vec![2]);
    }

    #[test]
    fn test_empty_chains() {
        let fat = table(&[ENDOFCHAIN]);
        assert!(fat.chain(ENDOFCHAIN).unwrap().is_empty());
        assert!(fat.chain(FREESECT).unwrap().is_empty());
    }

    #[test]
    fn test_self_loop_is_cyclic() {
        let fat = table(&[FATSECT, 2, 5, ENDOFCHAIN, ENDOFCHAIN, 5]);
        assert!(matches!(
            fat.chain(5),
            Err(CfbError::CyclicChain {
                chain: "fat",
                sector: 5
            })
        ));
        assert!(matches!(
            fat.chain(1),
            Err(CfbError::CyclicChain { sector: 5, .. })
        ));
        // Chains that never reach sector 5 are unaffected.
        assert_eq!(fat.chain(3).unwrap(), vec![3]);
    }

    #[test]
    fn test_longer_cycle() {
        let fat = table(&[1, 2, 0]);
        assert!(matches!(
            fat.chain(0),
            Err(CfbError::CyclicChain { sector: 0, .. })
        ));
    }

    #[test]
    fn test_out_of_range_is_bad_sector() {
        let fat = table(&[7]);
        assert!(matches!(
            fat.chain(0),
            Err(CfbError::BadSector { sector: 7, .. })
        ));

        let limited = AllocationTable::new("fat", vec![1, ENDOFCHAIN], 1);
        assert!(matches!(
            limited.chain(0),
            Err(CfbError::BadSector { sector: 1, .. })
        ));
    }

    #[test]
    fn test_free_sector_cuts_chain() {
        let fat = table(&[1, FREESECT]);
        assert_eq!(fat.chain(0).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_reserved_start_is_rejected() {
        let fat = table(&[ENDOFCHAIN]);
        assert!(matches!(
            fat.chain(FATSECT),
            Err(CfbError::BadSector { .. })
        ));
    }

    #[test]
    fn test_describe_sector() {
        assert_eq!(describe_sector(ENDOFCHAIN), "ENDOFCHAIN");
        assert_eq!(describe_sector(0x10), "0x10");
        assert_eq!(describe_sector(0xFFFF_FFFB), "reserved(0xfffffffb)");
    }
}
