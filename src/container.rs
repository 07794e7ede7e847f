use crate::allocation::{self, AllocationTable, SectorReader};
use crate::cfb_header::{CFB_HEADER_SIZE, CfbHeader};
use crate::directory::{self, Directory, DirectoryEntry, EntryType, WalkItem};
use crate::err::{CfbError, Result};
use crate::property_set::PropertySetStream;
use crate::stream_view::StreamView;

use hashbrown::HashMap;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Any seekable byte source a container can be read from.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

pub const DEFAULT_MAX_DIRECTORY_ENTRIES: usize = 1 << 20;
pub const DEFAULT_CODE_PAGE: u32 = 1252;

/// Settings used while opening a container and decoding its property sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    strict_clsid: bool,
    max_directory_entries: usize,
    default_code_page: u32,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            strict_clsid: false,
            max_directory_entries: DEFAULT_MAX_DIRECTORY_ENTRIES,
            default_code_page: DEFAULT_CODE_PAGE,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        OpenOptions::default()
    }

    /// Reject files whose header CLSID is not null instead of only logging it.
    pub fn strict_clsid(mut self, strict_clsid: bool) -> Self {
        self.strict_clsid = strict_clsid;
        self
    }

    /// Upper bound on the number of directory entries read from the directory chain.
    pub fn max_directory_entries(mut self, max_directory_entries: usize) -> Self {
        self.max_directory_entries = max_directory_entries.max(1);
        self
    }

    /// Code page used for 8-bit strings when a property set has no CodePage property.
    pub fn default_code_page(mut self, default_code_page: u32) -> Self {
        self.default_code_page = default_code_page;
        self
    }

    pub fn get_strict_clsid(&self) -> bool {
        self.strict_clsid
    }

    pub fn get_max_directory_entries(&self) -> usize {
        self.max_directory_entries
    }

    pub fn get_default_code_page(&self) -> u32 {
        self.default_code_page
    }
}

/// A parsed compound file.
///
/// Everything structural (header, allocation tables, directory) is read and validated by
/// [`Container::open`] and is immutable afterwards. Stream data is only read on demand through
/// [`StreamView`]s, which borrow the container and may coexist.
pub struct Container<T: ReadSeek> {
    source: Mutex<T>,
    source_len: u64,
    options: OpenOptions,
    header: CfbHeader,
    difat: Vec<u32>,
    fat: AllocationTable,
    mini_fat: AllocationTable,
    directory: Directory,
    /// Physical offset of every regular sector of the mini stream.
    mini_stream: Vec<u64>,
    root_index: OnceLock<HashMap<String, u32>>,
}

impl Container<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        Container::open(BufReader::new(f))
    }
}

impl<T: ReadSeek> Container<T> {
    pub fn open(source: T) -> Result<Self> {
        Container::open_with(source, OpenOptions::default())
    }

    pub fn open_with(mut source: T, options: OpenOptions) -> Result<Self> {
        let source_len = source.seek(SeekFrom::End(0))?;

        let mut header_buf = [0; CFB_HEADER_SIZE];
        let n = allocation::read_at(&mut source, 0, &mut header_buf)?;
        if n < CFB_HEADER_SIZE {
            return Err(CfbError::TruncatedRead {
                what: "compound file header",
                offset: 0,
                need: CFB_HEADER_SIZE,
                have: n,
            });
        }
        let header = CfbHeader::from_bytes(&header_buf)?;
        if options.strict_clsid && !header.clsid.is_null() {
            let clsid = header.clsid.to_bytes();
            return Err(CfbError::BadGeometry {
                field: "clsid",
                value: u32::from_le_bytes([clsid[0], clsid[1], clsid[2], clsid[3]]),
            });
        }

        let mut reader = SectorReader::new(&mut source, &header, source_len);
        let difat = allocation::load_difat(&mut reader)?;
        let fat = allocation::load_fat(&mut reader, &difat)?;
        let directory = directory::load_directory(
            &mut reader,
            &fat,
            header.dir_sect_offset,
            header.dir_sect_count,
            header.major_version,
            options.max_directory_entries,
        )?;

        let root = directory.root();
        if root.stream_size % header.mini_sector_size() as u64 != 0 {
            warn!(
                "mini stream size {} is not a multiple of {}",
                root.stream_size,
                header.mini_sector_size()
            );
        }
        let mini_chain = if root.stream_size == 0 {
            Vec::new()
        } else {
            fat.chain(root.start_sector)?
        };
        let mini_stream_len = root
            .stream_size
            .min(mini_chain.len() as u64 * header.sector_size() as u64);
        if mini_stream_len < root.stream_size {
            warn!(
                "mini stream declares {} bytes but its chain only covers {}",
                root.stream_size, mini_stream_len
            );
        }
        let mini_fat = allocation::load_mini_fat(&mut reader, &fat, mini_stream_len)?;
        let mini_stream = mini_chain
            .iter()
            .map(|&s| header.sector_offset(s))
            .collect();

        info!(
            "opened compound file v{}.{}: {} sectors of {} bytes, {} directory entries",
            header.major_version,
            header.minor_version,
            allocation::sector_count(&header, source_len),
            header.sector_size(),
            directory.len()
        );

        Ok(Container {
            source: Mutex::new(source),
            source_len,
            options,
            header,
            difat,
            fat,
            mini_fat,
            directory,
            mini_stream,
            root_index: OnceLock::new(),
        })
    }

    pub fn header(&self) -> &CfbHeader {
        &self.header
    }

    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    /// Every FAT sector named by the header and the DIFAT extension chain.
    pub fn difat(&self) -> &[u32] {
        &self.difat
    }

    pub fn fat(&self) -> &AllocationTable {
        &self.fat
    }

    pub fn mini_fat(&self) -> &AllocationTable {
        &self.mini_fat
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn root_sid(&self) -> u32 {
        0
    }

    /// Validated directory entry.
    pub fn entry(&self, sid: u32) -> Result<&DirectoryEntry> {
        self.directory.entry(sid)
    }

    /// Children of a storage, in tree order.
    pub fn children(&self, sid: u32) -> Result<Vec<u32>> {
        self.directory.children(sid)
    }

    pub fn find_child(&self, parent: u32, name: &str) -> Result<Option<u32>> {
        if parent == self.root_sid() {
            return Ok(self.root_index()?.get(&directory::name_key(name)).copied());
        }
        self.directory.find_child(parent, name)
    }

    /// Resolve a `/`-separated path of names starting at the root.
    pub fn find_path(&self, path: &str) -> Result<Option<u32>> {
        let mut current = self.root_sid();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let entry = self.directory.entry(current)?;
            if !entry.entry_type.is_storage() {
                return Ok(None);
            }
            match self.find_child(current, part)? {
                Some(sid) => current = sid,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Name index of the root storage's children, built on first use.
    pub fn root_index(&self) -> Result<&HashMap<String, u32>> {
        if let Some(index) = self.root_index.get() {
            return Ok(index);
        }
        let mut index = HashMap::new();
        for sid in self.directory.children(self.root_sid())? {
            if let Some(entry) = self.directory.get(sid) {
                index.entry(directory::name_key(&entry.name)).or_insert(sid);
            }
        }
        debug!("indexed {} children of the root storage", index.len());
        Ok(self.root_index.get_or_init(|| index))
    }

    /// Pre-order walk of every entry reachable from the root.
    pub fn walk(&self) -> Result<Vec<WalkItem>> {
        self.directory.walk()
    }

    /// In-use entries that are not reachable from the root.
    pub fn orphans(&self) -> Result<Vec<u32>> {
        self.directory.orphans()
    }

    /// Open a view of the stream of entry `sid`.
    ///
    /// With `include_slack`, the view extends to the end of the last unit of the chain.
    pub fn stream(&self, sid: u32, include_slack: bool) -> Result<StreamView<'_, T>> {
        let entry = self.directory.entry(sid)?;
        if entry.entry_type == EntryType::Storage {
            return Err(CfbError::NotAStream { sid });
        }

        let size = entry.stream_size;
        if size == 0 {
            return Ok(StreamView::new(self, sid, Vec::new(), self.header.sector_size(), 0, false));
        }

        let mini = sid != self.root_sid() && size < u64::from(self.header.mini_stream_cutoff);
        let (table, unit_size) = if mini {
            (&self.mini_fat, self.header.mini_sector_size())
        } else {
            (&self.fat, self.header.sector_size())
        };

        let mut chain = table.chain(entry.start_sector)?;
        let needed = size.div_ceil(unit_size as u64);
        let have = chain.len() as u64;
        if have < needed {
            return Err(CfbError::TruncatedRead {
                what: "stream chain",
                offset: have * unit_size as u64,
                need: usize::try_from(size).unwrap_or(usize::MAX),
                have: usize::try_from(have * unit_size as u64).unwrap_or(usize::MAX),
            });
        }
        if have > needed {
            warn!(
                "entry {}: chain holds {} units, {} bytes only need {}",
                sid, have, size, needed
            );
            chain.truncate(needed as usize);
        }

        let offsets = if mini {
            chain
                .iter()
                .map(|&s| self.mini_sector_offset(s))
                .collect::<Result<Vec<u64>>>()?
        } else {
            chain.iter().map(|&s| self.header.sector_offset(s)).collect()
        };

        let len = if include_slack {
            offsets.len() as u64 * unit_size as u64
        } else {
            size
        };
        Ok(StreamView::new(self, sid, offsets, unit_size, len, mini))
    }

    /// Read the whole stream of entry `sid`.
    pub fn read_stream(&self, sid: u32) -> Result<Vec<u8>> {
        self.stream(sid, false)?.read_all()
    }

    /// Parse the property-set stream of entry `sid`.
    pub fn property_set_stream(&self, sid: u32) -> Result<PropertySetStream> {
        let data = self.read_stream(sid)?;
        PropertySetStream::from_bytes_with(&data, self.options.default_code_page)
    }

    /// Physical offset of a mini-sector inside the mini stream.
    fn mini_sector_offset(&self, mini_sector: u32) -> Result<u64> {
        let position = u64::from(mini_sector) * self.header.mini_sector_size() as u64;
        let sector_size = self.header.sector_size() as u64;
        let index = (position / sector_size) as usize;
        self.mini_stream
            .get(index)
            .map(|&base| base + position % sector_size)
            .ok_or(CfbError::BadSector {
                sector: mini_sector,
                reason: "mini-sector lies beyond the end of the mini stream",
            })
    }

    /// Read at a physical offset of the byte source, stopping early at end of input.
    pub(crate) fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut source = self
            .source
            .lock()
            .map_err(|_| io::Error::other("byte source lock poisoned"))?;
        Ok(allocation::read_at(&mut *source, offset, buf)?)
    }

    /// Give back the byte source.
    pub fn into_inner(self) -> T {
        match self.source.into_inner() {
            Ok(source) => source,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
