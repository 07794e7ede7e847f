//! Directory entries and the red-black trees that link them.
//!
//! The directory stream is an array of 128-byte entries. An entry's index is its SID, and every
//! tree link (left sibling, right sibling, child) is a SID into the same array, so the whole
//! directory is kept as an arena indexed by SID. All traversals are iterative.

use crate::allocation::{AllocationTable, SectorReader};
use crate::container::ReadSeek;
use crate::err::{CfbError, Result};
use crate::guid::Guid;
use crate::utils::{FileTime, bytes, decode_utf16_units_z_lossy, utf16le_units};

use hashbrown::HashSet;
use log::{debug, trace, warn};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

pub const DIRECTORY_ENTRY_SIZE: usize = 128;
/// "No link" marker for sibling and child SIDs.
pub const NOSTREAM: u32 = 0xFFFF_FFFF;
/// Largest value that is a regular SID.
pub const MAXREGSID: u32 = 0xFFFF_FFFA;
/// Maximum byte length of a name, terminator included.
pub const MAX_NAME_BYTES: usize = 64;

mod layout {
    pub const NAME: usize = 0x00;
    pub const NAME_SIZE: usize = 0x40;
    pub const ENTRY_TYPE: usize = 0x42;
    pub const COLOR: usize = 0x43;
    pub const LEFT_SIBLING: usize = 0x44;
    pub const RIGHT_SIBLING: usize = 0x48;
    pub const CHILD: usize = 0x4C;
    pub const CLSID: usize = 0x50;
    pub const STATE_BITS: usize = 0x60;
    pub const CREATED: usize = 0x64;
    pub const MODIFIED: usize = 0x6C;
    pub const START_SECTOR: usize = 0x74;
    pub const STREAM_SIZE: usize = 0x78;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryType {
    Unknown,
    Storage,
    Stream,
    LockBytes,
    Property,
    Root,
    Invalid(u8),
}

impl EntryType {
    pub fn from_u8(value: u8) -> EntryType {
        match value {
            0 => EntryType::Unknown,
            1 => EntryType::Storage,
            2 => EntryType::Stream,
            3 => EntryType::LockBytes,
            4 => EntryType::Property,
            5 => EntryType::Root,
            other => EntryType::Invalid(other),
        }
    }

    /// Storages and the root hold children rather than stream data.
    pub fn is_storage(self) -> bool {
        matches!(self, EntryType::Storage | EntryType::Root)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntryType::Unknown => write!(f, "unknown"),
            EntryType::Storage => write!(f, "storage"),
            EntryType::Stream => write!(f, "stream"),
            EntryType::LockBytes => write!(f, "lockbytes"),
            EntryType::Property => write!(f, "property"),
            EntryType::Root => write!(f, "root"),
            EntryType::Invalid(v) => write!(f, "invalid({:#x})", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Color {
    Red,
    Black,
    Invalid(u8),
}

impl Color {
    pub fn from_u8(value: u8) -> Color {
        match value {
            0 => Color::Red,
            1 => Color::Black,
            other => Color::Invalid(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub sid: u32,
    pub name: String,
    /// Name as stored, clamped to the name field and cut at the first NUL.
    #[serde(skip)]
    pub name_units: Vec<u16>,
    pub name_size: u16,
    pub entry_type: EntryType,
    pub color: Color,
    pub left_sibling: u32,
    pub right_sibling: u32,
    pub child: u32,
    pub clsid: Guid,
    pub state_bits: u32,
    pub created: FileTime,
    pub modified: FileTime,
    pub start_sector: u32,
    pub stream_size: u64,
}

impl DirectoryEntry {
    /// Parse a raw 128-byte entry. This never rejects an entry; see [`DirectoryEntry::validate`].
    ///
    /// `major_version` 3 files only define the low 32 bits of the stream size.
    pub fn from_bytes(sid: u32, buf: &[u8], major_version: u16) -> Result<DirectoryEntry> {
        let _ = bytes::slice_r(buf, 0, DIRECTORY_ENTRY_SIZE, "directory entry")?;

        let name_size = bytes::read_u16_le_r(buf, layout::NAME_SIZE, "entry name size")?;
        let raw_name = bytes::slice_r(buf, layout::NAME, MAX_NAME_BYTES, "entry name")?;
        let usable = usize::from(name_size).min(MAX_NAME_BYTES);
        let mut name_units = utf16le_units(&raw_name[..usable]);
        if let Some(nul) = name_units.iter().position(|&u| u == 0) {
            name_units.truncate(nul);
        }
        let name = decode_utf16_units_z_lossy(&name_units);

        let mut stream_size =
            bytes::read_u64_le_r(buf, layout::STREAM_SIZE, "entry stream size")?;
        if major_version == 3 && stream_size > u64::from(u32::MAX) {
            trace!(
                "entry {}: ignoring high dword of version 3 stream size {:#x}",
                sid, stream_size
            );
            stream_size &= u64::from(u32::MAX);
        }

        Ok(DirectoryEntry {
            sid,
            name,
            name_units,
            name_size,
            entry_type: EntryType::from_u8(bytes::read_u8_r(
                buf,
                layout::ENTRY_TYPE,
                "entry type",
            )?),
            color: Color::from_u8(bytes::read_u8_r(buf, layout::COLOR, "entry color")?),
            left_sibling: bytes::read_u32_le_r(buf, layout::LEFT_SIBLING, "left sibling")?,
            right_sibling: bytes::read_u32_le_r(buf, layout::RIGHT_SIBLING, "right sibling")?,
            child: bytes::read_u32_le_r(buf, layout::CHILD, "child")?,
            clsid: Guid::from_bytes(&bytes::read_array_r::<16>(
                buf,
                layout::CLSID,
                "entry clsid",
            )?),
            state_bits: bytes::read_u32_le_r(buf, layout::STATE_BITS, "state bits")?,
            created: FileTime(bytes::read_u64_le_r(buf, layout::CREATED, "created")?),
            modified: FileTime(bytes::read_u64_le_r(buf, layout::MODIFIED, "modified")?),
            start_sector: bytes::read_u32_le_r(buf, layout::START_SECTOR, "start sector")?,
            stream_size,
        })
    }

    /// Check the fields that make an entry unusable.
    pub fn validate(&self, entry_count: usize) -> Result<()> {
        if let EntryType::Invalid(v) = self.entry_type {
            return Err(CfbError::bad_entry(
                self.sid,
                format!("invalid entry type {:#x}", v),
            ));
        }
        if usize::from(self.name_size) > MAX_NAME_BYTES {
            return Err(CfbError::bad_entry(
                self.sid,
                format!("impossible name length {}", self.name_size),
            ));
        }
        for (what, link) in [
            ("left sibling", self.left_sibling),
            ("right sibling", self.right_sibling),
            ("child", self.child),
        ] {
            if !link_in_range(link, entry_count) {
                return Err(CfbError::bad_entry(
                    self.sid,
                    format!("{} {:#x} is out of range", what, link),
                ));
            }
        }
        Ok(())
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.entry_type, EntryType::Stream | EntryType::Root)
    }

    /// Empty slot: never-used entry with no name.
    pub fn is_unused(&self) -> bool {
        self.entry_type == EntryType::Unknown && self.name_units.is_empty()
    }

    /// Property-set streams are conventionally named with a leading `\x05`.
    pub fn is_property_set_stream(&self) -> bool {
        self.entry_type == EntryType::Stream && self.name_units.first() == Some(&0x0005)
    }

    /// Name with control characters (such as the `\x05` prefix) escaped, for display.
    pub fn display_name(&self) -> String {
        self.name.escape_default().to_string()
    }
}

fn link_in_range(link: u32, entry_count: usize) -> bool {
    link == NOSTREAM || (link <= MAXREGSID && (link as usize) < entry_count)
}

fn upcase(unit: u16) -> u16 {
    match char::from_u32(u32::from(unit)) {
        Some(c) => {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) if (u as u32) <= 0xFFFF => u as u32 as u16,
                _ => unit,
            }
        }
        // Surrogate halves compare as-is.
        None => unit,
    }
}

/// Case-folded lookup key for a name, consistent with [`compare_names`].
pub fn name_key(name: &str) -> String {
    let units: Vec<u16> = name.encode_utf16().map(upcase).collect();
    String::from_utf16_lossy(&units)
}

/// Compare two names in compound file order: shorter names first, then code unit by code unit
/// after upper-casing.
pub fn compare_names(a: &[u16], b: &[u16]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        a.iter()
            .map(|&u| upcase(u))
            .cmp(b.iter().map(|&u| upcase(u)))
    })
}

/// Every directory entry, indexed by SID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn from_entries(entries: Vec<DirectoryEntry>) -> Result<Directory> {
        match entries.first() {
            Some(root) if root.entry_type == EntryType::Root => {}
            Some(other) => {
                return Err(CfbError::bad_entry(
                    0,
                    format!("first entry is a {}, not the root storage", other.entry_type),
                ));
            }
            None => return Err(CfbError::bad_entry(0, "directory holds no entries")),
        }
        Ok(Directory { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Raw entry access, without validation.
    pub fn get(&self, sid: u32) -> Option<&DirectoryEntry> {
        self.entries.get(sid as usize)
    }

    pub fn root(&self) -> &DirectoryEntry {
        &self.entries[0]
    }

    /// Validated entry access.
    pub fn entry(&self, sid: u32) -> Result<&DirectoryEntry> {
        let entry = self.get(sid).ok_or(CfbError::UnknownSid {
            sid,
            count: self.entries.len(),
        })?;
        entry.validate(self.entries.len())?;
        Ok(entry)
    }

    /// Follow a sibling or child link, dropping links that point outside the directory.
    fn follow(&self, from: u32, what: &str, link: u32) -> Option<u32> {
        if link == NOSTREAM {
            return None;
        }
        if link_in_range(link, self.entries.len()) {
            Some(link)
        } else {
            warn!(
                "entry {}: {} {:#x} is out of range, ignoring it",
                from, what, link
            );
            None
        }
    }

    /// Children of `parent` in tree order (an in-order walk of the red-black tree).
    pub fn children(&self, parent: u32) -> Result<Vec<u32>> {
        let parent_entry = self.get(parent).ok_or(CfbError::UnknownSid {
            sid: parent,
            count: self.entries.len(),
        })?;

        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        let mut current = self.follow(parent, "child", parent_entry.child);

        loop {
            while let Some(sid) = current {
                if !visited.insert(sid) {
                    return Err(CfbError::CyclicChain {
                        chain: "directory",
                        sector: sid,
                    });
                }
                stack.push(sid);
                current = self.follow(sid, "left sibling", self.entries[sid as usize].left_sibling);
            }
            match stack.pop() {
                Some(sid) => {
                    out.push(sid);
                    current =
                        self.follow(sid, "right sibling", self.entries[sid as usize].right_sibling);
                }
                None => break,
            }
        }

        trace!("entry {} has {} children", parent, out.len());
        Ok(out)
    }

    /// Find a direct child of `parent` by name, case-insensitively.
    ///
    /// Descends the tree using the name ordering; when the tree is not ordered the way its
    /// writer should have left it, falls back to a scan of every child.
    pub fn find_child(&self, parent: u32, name: &str) -> Result<Option<u32>> {
        let target: Vec<u16> = name.encode_utf16().collect();
        let parent_entry = self.get(parent).ok_or(CfbError::UnknownSid {
            sid: parent,
            count: self.entries.len(),
        })?;

        let mut visited = HashSet::new();
        let mut current = self.follow(parent, "child", parent_entry.child);
        while let Some(sid) = current {
            if !visited.insert(sid) {
                break;
            }
            let entry = &self.entries[sid as usize];
            current = match compare_names(&target, &entry.name_units) {
                Ordering::Equal => return Ok(Some(sid)),
                Ordering::Less => self.follow(sid, "left sibling", entry.left_sibling),
                Ordering::Greater => self.follow(sid, "right sibling", entry.right_sibling),
            };
        }

        let found = self.children(parent)?.into_iter().find(|&sid| {
            compare_names(&target, &self.entries[sid as usize].name_units) == Ordering::Equal
        });
        if let Some(sid) = found {
            debug!(
                "entry {} found by scanning children of {}, tree is mis-ordered",
                sid, parent
            );
        }
        Ok(found)
    }

    /// Pre-order walk of every entry reachable from the root.
    pub fn walk(&self) -> Result<Vec<WalkItem>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(0);
        let mut stack = vec![WalkItem {
            depth: 0,
            path: String::new(),
            sid: 0,
        }];

        while let Some(item) = stack.pop() {
            let entry = &self.entries[item.sid as usize];
            let children = if entry.entry_type.is_storage() {
                self.children(item.sid)?
            } else {
                Vec::new()
            };

            // Reverse so that children come out of the stack in tree order.
            for sid in children.into_iter().rev() {
                if !seen.insert(sid) {
                    return Err(CfbError::CyclicChain {
                        chain: "directory",
                        sector: sid,
                    });
                }
                let child = &self.entries[sid as usize];
                let path = if item.path.is_empty() {
                    child.name.clone()
                } else {
                    format!("{}/{}", item.path, child.name)
                };
                stack.push(WalkItem {
                    depth: item.depth + 1,
                    path,
                    sid,
                });
            }
            out.push(item);
        }

        Ok(out)
    }

    /// Entries that are in use but unreachable from the root, such as leftovers of deleted
    /// storages.
    pub fn orphans(&self) -> Result<Vec<u32>> {
        let reachable: HashSet<u32> = self.walk()?.into_iter().map(|item| item.sid).collect();
        Ok(self
            .entries
            .iter()
            .filter(|e| !reachable.contains(&e.sid) && !e.is_unused())
            .map(|e| e.sid)
            .collect())
    }
}

/// One entry of [`Directory::walk`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkItem {
    pub depth: usize,
    /// `/`-separated names from the root, empty for the root itself.
    pub path: String,
    pub sid: u32,
}

/// Read every directory entry from the chain at `dir_sect_offset`.
pub(crate) fn load_directory<T: ReadSeek + ?Sized>(
    reader: &mut SectorReader<'_, T>,
    fat: &AllocationTable,
    dir_sect_offset: u32,
    dir_sect_count: u32,
    major_version: u16,
    max_entries: usize,
) -> Result<Directory> {
    let chain = fat.chain(dir_sect_offset)?;
    if major_version >= 4 && dir_sect_count != 0 && chain.len() != dir_sect_count as usize {
        warn!(
            "header declares {} directory sectors, chain holds {}",
            dir_sect_count,
            chain.len()
        );
    }

    let mut entries = Vec::new();
    for sector in chain {
        let data = reader.read_sector(sector, "directory sector")?;
        for chunk in data.chunks_exact(DIRECTORY_ENTRY_SIZE) {
            if entries.len() >= max_entries {
                return Err(CfbError::BadGeometry {
                    field: "directory_entries",
                    value: u32::try_from(max_entries).unwrap_or(u32::MAX),
                });
            }
            let sid = entries.len() as u32;
            entries.push(DirectoryEntry::from_bytes(sid, chunk, major_version)?);
        }
    }

    debug!("directory holds {} entries", entries.len());
    Directory::from_entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn entry(
        sid: u32,
        name: &str,
        ty: EntryType,
        left: u32,
        right: u32,
        child: u32,
    ) -> DirectoryEntry {
        DirectoryEntry {
            sid,
            name: name.to_owned(),
            name_units: units(name),
            name_size: ((name.encode_utf16().count() + 1) * 2) as u16,
            entry_type: ty,
            color: Color::Black,
            left_sibling: left,
            right_sibling: right,
            child,
            clsid: Guid::NULL,
            state_bits: 0,
            created: FileTime(0),
            modified: FileTime(0),
            start_sector: 0,
            stream_size: 0,
        }
    }

    /// Root with children B (1), A (2), CC (3), where B is the tree root, A left, CC right.
    /// CC is a storage holding D (4). Entry 5 is an orphan.
    fn sample() -> Directory {
        Directory::from_entries(vec![
            entry(0, "Root Entry", EntryType::Root, NOSTREAM, NOSTREAM, 1),
            entry(1, "B", EntryType::Stream, 2, 3, NOSTREAM),
            entry(2, "a", EntryType::Stream, NOSTREAM, NOSTREAM, NOSTREAM),
            entry(3, "CC", EntryType::Storage, NOSTREAM, NOSTREAM, 4),
            entry(4, "D", EntryType::Stream, NOSTREAM, NOSTREAM, NOSTREAM),
            entry(5, "Lost", EntryType::Stream, NOSTREAM, NOSTREAM, NOSTREAM),
            entry(6, "", EntryType::Unknown, NOSTREAM, NOSTREAM, NOSTREAM),
        ])
        .unwrap()
    }

    #[test]
    fn test_compare_names_orders_by_length_then_upcase() {
        assert_eq!(compare_names(&units("b"), &units("AA")), Ordering::Less);
        assert_eq!(compare_names(&units("abc"), &units("ABC")), Ordering::Equal);
        assert_eq!(compare_names(&units("abd"), &units("ABC")), Ordering::Greater);
        assert_eq!(compare_names(&units("é"), &units("É")), Ordering::Equal);
    }

    #[test]
    fn test_children_in_order() {
        let dir = sample();
        assert_eq!(dir.children(0).unwrap(), vec![2, 1, 3]);
        assert_eq!(dir.children(3).unwrap(), vec![4]);
        assert!(dir.children(4).unwrap().is_empty());
    }

    #[test]
    fn test_find_child() {
        let dir = sample();
        assert_eq!(dir.find_child(0, "cc").unwrap(), Some(3));
        assert_eq!(dir.find_child(0, "A").unwrap(), Some(2));
        assert_eq!(dir.find_child(0, "missing").unwrap(), None);
    }

    #[test]
    fn test_find_child_falls_back_on_misordered_tree() {
        let mut entries = sample().entries;
        // Put the long name on the wrong side of the tree.
        entries[1].left_sibling = 3;
        entries[1].right_sibling = 2;
        let dir = Directory::from_entries(entries).unwrap();
        assert_eq!(dir.find_child(0, "CC").unwrap(), Some(3));
    }

    #[test]
    fn test_walk_and_orphans() {
        let dir = sample();
        let walked: Vec<(usize, String, u32)> = dir
            .walk()
            .unwrap()
            .into_iter()
            .map(|i| (i.depth, i.path, i.sid))
            .collect();
        assert_eq!(
            walked,
            vec![
                (0, "".to_owned(), 0),
                (1, "a".to_owned(), 2),
                (1, "B".to_owned(), 1),
                (1, "CC".to_owned(), 3),
                (2, "CC/D".to_owned(), 4),
            ]
        );
        assert_eq!(dir.orphans().unwrap(), vec![5]);
    }

    #[test]
    fn test_sibling_cycle_is_detected() {
        let mut entries = sample().entries;
        entries[2].left_sibling = 1;
        let dir = Directory::from_entries(entries).unwrap();
        assert!(matches!(
            dir.children(0),
            Err(CfbError::CyclicChain {
                chain: "directory",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_entries_degrade_only_themselves() {
        let mut entries = sample().entries;
        entries[2].entry_type = EntryType::Invalid(9);
        entries[4].right_sibling = 0x1000;
        entries[5].name_size = 80;
        let dir = Directory::from_entries(entries).unwrap();

        assert!(matches!(
            dir.entry(2),
            Err(CfbError::BadDirectoryEntry { sid: 2, .. })
        ));
        assert!(matches!(
            dir.entry(4),
            Err(CfbError::BadDirectoryEntry { sid: 4, .. })
        ));
        assert!(matches!(
            dir.entry(5),
            Err(CfbError::BadDirectoryEntry { sid: 5, .. })
        ));
        assert!(dir.entry(1).is_ok());
        // The out-of-range link is skipped during traversal.
        assert_eq!(dir.children(3).unwrap(), vec![4]);
        assert!(matches!(
            dir.entry(42),
            Err(CfbError::UnknownSid { sid: 42, count: 7 })
        ));
    }

    #[test]
    fn test_first_entry_must_be_root() {
        let entries = vec![entry(0, "x", EntryType::Stream, NOSTREAM, NOSTREAM, NOSTREAM)];
        assert!(matches!(
            Directory::from_entries(entries),
            Err(CfbError::BadDirectoryEntry { sid: 0, .. })
        ));
    }

    #[test]
    fn test_parses_raw_entry_and_clamps_name() {
        let mut buf = vec![0u8; DIRECTORY_ENTRY_SIZE];
        for (i, u) in "\u{5}SummaryInformation".encode_utf16().enumerate() {
            buf[i * 2..i * 2 + 2].copy_from_slice(&u.to_le_bytes());
        }
        buf[0x40..0x42].copy_from_slice(&0x28u16.to_le_bytes());
        buf[0x42] = 2;
        buf[0x43] = 1;
        buf[0x44..0x50].fill(0xFF);
        buf[0x74..0x78].copy_from_slice(&3u32.to_le_bytes());
        buf[0x78..0x80].copy_from_slice(&0xDEAD_0000_0000_0100u64.to_le_bytes());

        let e = DirectoryEntry::from_bytes(7, &buf, 3).unwrap();
        assert_eq!(e.name, "\u{5}SummaryInformation");
        assert_eq!(e.display_name(), "\\u{5}SummaryInformation");
        assert!(e.is_property_set_stream());
        assert_eq!(e.entry_type, EntryType::Stream);
        assert_eq!(e.child, NOSTREAM);
        assert_eq!(e.start_sector, 3);
        assert_eq!(e.stream_size, 0x100);

        // A lying name_size is clamped to the name field.
        buf[0x40..0x42].copy_from_slice(&0x200u16.to_le_bytes());
        let e = DirectoryEntry::from_bytes(7, &buf, 4).unwrap();
        assert_eq!(e.name, "\u{5}SummaryInformation");
        assert_eq!(e.stream_size, 0xDEAD_0000_0000_0100);
        assert!(e.validate(8).is_err());
    }

    #[test]
    fn test_field_offsets_tile_the_entry() {
        let offsets = [
            layout::NAME,
            layout::NAME_SIZE,
            layout::ENTRY_TYPE,
            layout::COLOR,
            layout::LEFT_SIBLING,
            layout::RIGHT_SIBLING,
            layout::CHILD,
            layout::CLSID,
            layout::STATE_BITS,
            layout::CREATED,
            layout::MODIFIED,
            layout::START_SECTOR,
            layout::STREAM_SIZE,
        ];
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(layout::NAME + MAX_NAME_BYTES, layout::NAME_SIZE);
        assert_eq!(layout::STREAM_SIZE + 8, DIRECTORY_ENTRY_SIZE);
    }
}
