
use fixtures::*;

use olecf::{CfbError, Container, EntryType, OpenOptions, WalkItem};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read, Seek, SeekFrom};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_minimal_v3_container() {
    ensure_env_logger_initialized();

    // FAT in sector 1, directory in sector 0, no streams at all.
    let mut bytes = header(3, 9, 0, &[1], 0, ENDOFCHAIN, 0, ENDOFCHAIN, 0, 4096);
    bytes.extend_from_slice(&directory_entry(
        "Root Entry",
        5,
        (NOSTREAM, NOSTREAM),
        NOSTREAM,
        ENDOFCHAIN,
        0,
    ));
    for _ in 0..3 {
        bytes.extend_from_slice(&unused_directory_entry());
    }
    let mut fat = vec![ENDOFCHAIN, FATSECT];
    fat.resize(128, FREESECT);
    for e in fat {
        bytes.extend_from_slice(&e.to_le_bytes());
    }

    let container = Container::open(Cursor::new(bytes)).unwrap();
    assert_eq!(container.header().major_version, 3);
    assert_eq!(container.header().sector_size(), 512);
    assert_eq!(container.root_sid(), 0);
    assert_eq!(container.children(0).unwrap(), Vec::<u32>::new());
    assert_eq!(container.entry(0).unwrap().entry_type, EntryType::Root);
    assert_eq!(container.directory().len(), 4);
    assert!(container.orphans().unwrap().is_empty());
}

#[test]
fn test_mini_and_regular_boundary() {
    ensure_env_logger_initialized();

    let small = pattern(4095);
    let large = pattern(4096);
    let mut builder = CfbBuilder::new(3);
    let small_sid = builder.stream(0, "Small", &small);
    let large_sid = builder.stream(0, "Large", &large);
    let built = builder.build();

    let container = Container::open(built.cursor()).unwrap();

    let view = container.stream(small_sid, false).unwrap();
    assert!(view.is_mini());
    assert_eq!(view.unit_size(), 64);
    assert_eq!(view.physical_offsets().len(), 64);
    assert_eq!(container.read_stream(small_sid).unwrap(), small);

    let view = container.stream(large_sid, false).unwrap();
    assert!(!view.is_mini());
    assert_eq!(view.unit_size(), 512);
    assert_eq!(view.physical_offsets().len(), 8);
    assert_eq!(container.read_stream(large_sid).unwrap(), large);
}

#[test]
fn test_slack_is_the_tail_of_the_last_sector() {
    ensure_env_logger_initialized();

    let data = pattern(100);
    let mut builder = CfbBuilder::new(3).mini_stream_cutoff(64);
    let sid = builder.stream(0, "Stream", &data);
    let mut built = builder.build();

    let tail_start = built.sector_offset(built.start_sectors[sid as usize]) + 100;
    for b in &mut built.bytes[tail_start..tail_start + 412] {
        *b = 0xAB;
    }

    let container = Container::open(built.cursor()).unwrap();
    assert_eq!(container.read_stream(sid).unwrap(), data);

    let mut view = container.stream(sid, true).unwrap();
    assert_eq!(view.len(), 512);
    let all = view.read_all().unwrap();
    assert_eq!(all.len(), 512);
    assert_eq!(&all[..100], &data[..]);
    assert!(all[100..].iter().all(|&b| b == 0xAB));
}

#[test]
fn test_cyclic_fat_is_rejected() {
    ensure_env_logger_initialized();

    let mut builder = CfbBuilder::new(3);
    let sid = builder.stream(0, "Stream", &pattern(4096));
    let mut built = builder.build();
    // The stream occupies sectors 2..=9.
    assert_eq!(built.start_sectors[sid as usize], 2);
    built.set_fat_entry(5, 5);

    let container = Container::open(built.cursor()).unwrap();
    match container.stream(sid, false) {
        Err(CfbError::CyclicChain { chain, sector }) => {
            assert_eq!(chain, "fat");
            assert_eq!(sector, 5);
        }
        other => panic!("expected a cyclic chain, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn test_zero_length_stream_never_touches_the_fat() {
    ensure_env_logger_initialized();

    let mut builder = CfbBuilder::new(3);
    let sid = builder.stream(0, "Empty", &[]);
    let mut built = builder.build();
    // A garbage start sector must not matter for an empty stream.
    let at = built.directory_entry_offset(sid) + 116;
    built.patch_u32(at, 0xDEAD_BEEF);

    let container = Container::open(built.cursor()).unwrap();
    let mut view = container.stream(sid, true).unwrap();
    assert!(view.is_empty());
    assert_eq!(view.read_all().unwrap(), Vec::<u8>::new());
}

#[test]
fn test_every_chain_matches_its_stream_size() {
    ensure_env_logger_initialized();

    let mut builder = CfbBuilder::new(3);
    let folder = builder.storage(0, "Folder");
    builder.stream(folder, "Inner", &pattern(1000));
    builder.stream(0, "A", &pattern(63));
    builder.stream(0, "B", &pattern(65));
    builder.stream(0, "Big", &pattern(10_000));
    let built = builder.build();
    let container = Container::open(built.cursor()).unwrap();

    assert_eq!(container.entry(0).unwrap().stream_size % 64, 0);
    for item in container.walk().unwrap() {
        let entry = container.entry(item.sid).unwrap();
        if !entry.is_stream() {
            continue;
        }
        let view = container.stream(item.sid, false).unwrap();
        let unit = view.unit_size() as u64;
        assert_eq!(
            view.physical_offsets().len() as u64,
            entry.stream_size.div_ceil(unit),
            "entry {}",
            item.path
        );
    }
}

#[test]
fn test_reads_are_deterministic() {
    ensure_env_logger_initialized();

    let mut builder = CfbBuilder::new(4);
    builder.stream(0, "One", &pattern(300));
    builder.stream(0, "Two", &pattern(9000));
    let built = builder.build();

    let read_everything = || -> Vec<Vec<u8>> {
        let container = Container::open(built.cursor()).unwrap();
        container
            .walk()
            .unwrap()
            .into_iter()
            .filter(|item| container.entry(item.sid).unwrap().entry_type == EntryType::Stream)
            .map(|item| container.read_stream(item.sid).unwrap())
            .collect()
    };
    let first = read_everything();
    assert_eq!(first.len(), 2);
    assert_eq!(first, read_everything());
}

#[test]
fn test_version_4_geometry() {
    ensure_env_logger_initialized();

    let small = pattern(2000);
    let large = pattern(20_000);
    let mut builder = CfbBuilder::new(4);
    let small_sid = builder.stream(0, "Small", &small);
    let large_sid = builder.stream(0, "Large", &large);
    let built = builder.build();
    assert_eq!(built.bytes.len() % 4096, 0);

    let container = Container::open(built.cursor()).unwrap();
    assert_eq!(container.header().major_version, 4);
    assert_eq!(container.header().sector_size(), 4096);
    assert_eq!(container.header().sector_offset(0), 4096);
    assert_eq!(container.read_stream(small_sid).unwrap(), small);
    assert_eq!(container.read_stream(large_sid).unwrap(), large);
}

#[test]
fn test_stream_view_seek_and_read() {
    ensure_env_logger_initialized();

    let data = pattern(5000);
    let mut builder = CfbBuilder::new(3);
    let sid = builder.stream(0, "Data", &data);
    let built = builder.build();
    let container = Container::open(built.cursor()).unwrap();

    let mut view = container.stream(sid, false).unwrap();
    view.seek(SeekFrom::Start(1000)).unwrap();
    let mut buf = vec![0; 600];
    view.read_exact(&mut buf).unwrap();
    assert_eq!(&buf[..], &data[1000..1600]);

    view.seek(SeekFrom::End(-10)).unwrap();
    let mut tail = Vec::new();
    view.read_to_end(&mut tail).unwrap();
    assert_eq!(&tail[..], &data[4990..]);

    assert!(view.seek(SeekFrom::Current(-100_000)).is_err());
    let mut buf = [0; 8];
    view.seek(SeekFrom::Start(10_000)).unwrap();
    assert_eq!(view.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_paths_walk_and_orphans() {
    ensure_env_logger_initialized();

    let mut builder = CfbBuilder::new(3);
    let folder = builder.storage(0, "Folder");
    let inner = builder.stream(folder, "Inner", b"inner");
    let nested = builder.storage(folder, "Nested");
    let deep = builder.stream(nested, "Deep", b"deep");
    let top = builder.stream(0, "Top", b"top");
    let built = builder.build();

    let container = Container::open(built.cursor()).unwrap();
    assert_eq!(container.find_path("Folder/Inner").unwrap(), Some(inner));
    assert_eq!(container.find_path("folder/NESTED/deep").unwrap(), Some(deep));
    assert_eq!(container.find_path("/Top").unwrap(), Some(top));
    assert_eq!(container.find_path("").unwrap(), Some(0));
    assert_eq!(container.find_path("Folder/Missing").unwrap(), None);
    assert_eq!(container.find_path("Top/Below").unwrap(), None);
    assert_eq!(container.find_child(0, "TOP").unwrap(), Some(top));
    assert!(container.root_index().unwrap().len() == 2);

    let walk = container.walk().unwrap();
    let item = |depth, path: &str, sid| WalkItem {
        depth,
        path: path.to_owned(),
        sid,
    };
    assert_eq!(
        walk,
        vec![
            item(0, "", 0),
            item(1, "Top", top),
            item(1, "Folder", folder),
            item(2, "Folder/Inner", inner),
            item(2, "Folder/Nested", nested),
            item(3, "Folder/Nested/Deep", deep),
        ]
    );
    assert!(container.orphans().unwrap().is_empty());

    // Unlink the nested storage: it and its stream become orphans.
    let mut built = built;
    let at = built.directory_entry_offset(folder) + 76;
    built.patch_u32(at, inner);
    let inner_links = built.directory_entry_offset(inner) + 68;
    built.patch_u32(inner_links, NOSTREAM);
    built.patch_u32(inner_links + 4, NOSTREAM);
    let container = Container::open(built.cursor()).unwrap();
    assert_eq!(container.children(folder).unwrap(), vec![inner]);
    assert_eq!(container.orphans().unwrap(), vec![nested, deep]);
}

#[test]
fn test_difat_extension_sectors() {
    ensure_env_logger_initialized();

    // More than 109 FAT sectors forces DIFAT extension sectors in a v3 file.
    let data = pattern(110 * 128 * 512);
    let mut builder = CfbBuilder::new(3);
    let sid = builder.stream(0, "Huge", &data);
    let built = builder.build();
    assert!(!built.difat_sectors.is_empty());

    let container = Container::open(built.cursor()).unwrap();
    assert_eq!(container.difat().len(), built.fat_sectors.len());
    assert!(container.difat().len() > 109);
    assert_eq!(container.read_stream(sid).unwrap(), data);
}

#[test]
fn test_entry_errors() {
    ensure_env_logger_initialized();

    let mut builder = CfbBuilder::new(3);
    let folder = builder.storage(0, "Folder");
    let built = builder.build();
    let container = Container::open(built.cursor()).unwrap();

    assert!(matches!(
        container.stream(folder, false),
        Err(CfbError::NotAStream { .. })
    ));
    assert!(matches!(
        container.entry(99),
        Err(CfbError::UnknownSid { sid: 99, .. })
    ));
    // Unused slots of the directory sector exist but are not streams.
    assert!(container.entry(3).unwrap().is_unused());
}

#[test]
fn test_bad_entry_degrades_only_that_entry() {
    ensure_env_logger_initialized();

    let mut builder = CfbBuilder::new(3);
    let good = builder.stream(0, "Good", b"good");
    let bad = builder.stream(0, "Bad", b"bad");
    let mut built = builder.build();
    let type_at = built.directory_entry_offset(bad) + 66;
    built.bytes[type_at] = 9;

    let container = Container::open(built.cursor()).unwrap();
    assert!(matches!(
        container.entry(bad),
        Err(CfbError::BadDirectoryEntry { .. })
    ));
    assert_eq!(container.read_stream(good).unwrap(), b"good");
}

#[test]
fn test_header_failures() {
    ensure_env_logger_initialized();

    let built = summary_information_container();

    let mut bytes = built.bytes.clone();
    bytes[0] = 0;
    assert!(matches!(
        Container::open(Cursor::new(bytes)),
        Err(CfbError::BadSignature { .. })
    ));

    let mut bytes = built.bytes.clone();
    bytes[0x1E] = 12;
    assert!(matches!(
        Container::open(Cursor::new(bytes)),
        Err(CfbError::BadGeometry {
            field: "sector_shift",
            ..
        })
    ));

    let short = built.bytes[..300].to_vec();
    let err = Container::open(Cursor::new(short)).err().unwrap();
    assert!(err.is_truncation());

    let mut bytes = built.bytes.clone();
    bytes[8] = 1;
    assert!(Container::open(Cursor::new(bytes.clone())).is_ok());
    assert!(matches!(
        Container::open_with(Cursor::new(bytes), OpenOptions::new().strict_clsid(true)),
        Err(CfbError::BadGeometry { field: "clsid", .. })
    ));
}

#[test]
fn test_truncated_stream_data() {
    ensure_env_logger_initialized();

    let data = pattern(8192);
    let mut builder = CfbBuilder::new(3);
    let sid = builder.stream(0, "Data", &data);
    let built = builder.build();

    // The last sector starts inside the file but ends past its end.
    let cut = built.bytes.len() - 100;
    let container = Container::open(Cursor::new(built.bytes[..cut].to_vec())).unwrap();
    let err = container.read_stream(sid).unwrap_err();
    assert!(err.is_truncation(), "{}", err);

    // Whole sectors missing: the chain itself points outside the file.
    let cut = built.bytes.len() - 1024;
    let container = Container::open(Cursor::new(built.bytes[..cut].to_vec())).unwrap();
    assert!(matches!(
        container.stream(sid, false),
        Err(CfbError::BadSector { .. })
    ));
}

#[test]
fn test_directory_entry_cap() {
    ensure_env_logger_initialized();

    let mut builder = CfbBuilder::new(3);
    for i in 0..10 {
        builder.stream(0, &format!("S{}", i), b"x");
    }
    let built = builder.build();
    assert!(matches!(
        Container::open_with(built.cursor(), OpenOptions::new().max_directory_entries(4)),
        Err(CfbError::BadGeometry {
            field: "directory_entries",
            ..
        })
    ));
}
