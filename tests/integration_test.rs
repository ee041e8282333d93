//! Integration tests for shsl-rs archives and asset sets

use shsl_rs::{ArchiveReader, ArchiveWriter, AssetSet, Role, ShslError};
use std::io::Write;
use tempfile::NamedTempFile;

/// Encode an archive by hand, independent of `ArchiveWriter`
fn raw_archive(
    version: (u32, u32),
    files: &[(&str, u64, u64)],
    dirs: &[(&str, &[(&str, bool)])],
    data: &[u8],
) -> Vec<u8> {
    fn string(out: &mut Vec<u8>, s: &str) {
        out.extend_from_slice(&(s.len() as u32).to_le_bytes());
        out.extend_from_slice(s.as_bytes());
    }

    let mut out = b"AGAR".to_vec();
    out.extend_from_slice(&version.0.to_le_bytes());
    out.extend_from_slice(&version.1.to_le_bytes());
    out.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

    out.extend_from_slice(&(files.len() as u32).to_le_bytes());
    for (path, size, offset) in files {
        string(&mut out, path);
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
    }

    out.extend_from_slice(&(dirs.len() as u32).to_le_bytes());
    for (path, subfiles) in dirs {
        string(&mut out, path);
        out.extend_from_slice(&(subfiles.len() as u32).to_le_bytes());
        for (name, is_dir) in subfiles.iter() {
            string(&mut out, name);
            out.push(*is_dir as u8);
        }
    }

    out.extend_from_slice(data);
    out
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_basic_archive_roundtrip() {
    let temp_file = NamedTempFile::new().unwrap();
    let archive_path = temp_file.path();

    // Create archive
    {
        let mut writer = ArchiveWriter::create(archive_path).unwrap();
        writer.add_file("test.txt", b"Hello, World!").unwrap();
        writer.add_file("data/nested.txt", b"Nested content").unwrap();
        writer.finalize().unwrap();
    }

    // Read archive
    {
        let mut reader = ArchiveReader::open(archive_path).unwrap();
        assert_eq!(reader.file_count(), 2);
        assert!(reader.contains("test.txt"));
        assert!(reader.contains("data/nested.txt"));
        assert!(reader.contains("data\\nested.txt"));

        assert_eq!(reader.read_path("test.txt").unwrap(), b"Hello, World!");
        assert_eq!(reader.read_path("data/nested.txt").unwrap(), b"Nested content");
        assert_eq!(reader.list_dir("", false).unwrap(), vec!["test.txt", "data"]);
        assert_eq!(reader.list_dir("", true).unwrap(), vec!["test.txt"]);
    }
}

#[test]
fn test_hand_encoded_archive() {
    let data = b"0123456789";
    let bytes = raw_archive(
        (7, 3),
        &[("a/first", 4, 0), ("a/second", 6, 4)],
        &[("", &[("a", true)][..]), ("a", &[("first", false), ("second", false)][..])],
        data,
    );
    let header_size = (bytes.len() - data.len()) as u64;
    let file = write_temp(&bytes);

    let mut reader = ArchiveReader::open(file.path()).unwrap();
    assert_eq!(reader.header_size(), header_size);
    assert_eq!(reader.version(), (7, 3));

    assert_eq!(reader.read_path("a/first").unwrap(), b"0123");
    assert_eq!(reader.read_path("a/second").unwrap(), b"456789");
    assert_eq!(reader.list_dir("a", false).unwrap(), vec!["a/first", "a/second"]);
}

#[test]
fn test_read_length_matches_file_size() {
    let mut writer = ArchiveWriter::in_memory();
    writer.add_file("empty", b"").unwrap();
    writer.add_file("one/byte", b"x").unwrap();
    writer.add_file("one/two/kilobyte", &vec![0xAB; 1024]).unwrap();
    writer.add_file("patterned.bin", &(0..=255).collect::<Vec<u8>>()).unwrap();
    let file = write_temp(&writer.to_bytes().unwrap());

    let mut reader = ArchiveReader::open(file.path()).unwrap();
    for index in 0..reader.file_count() {
        let data = reader.read_file(index).unwrap();
        assert_eq!(Some(data.len() as u64), reader.file_size(index));
    }
    assert!(matches!(
        reader.read_file(reader.file_count()),
        Err(ShslError::InvalidIndex(_))
    ));
}

#[test]
fn test_duplicate_paths_last_wins() {
    let bytes = raw_archive(
        (1, 1),
        &[("dup", 2, 0), ("dup", 3, 2)],
        &[("", &[("dup", false)][..])],
        b"aabbb",
    );
    let file = write_temp(&bytes);

    let mut reader = ArchiveReader::open(file.path()).unwrap();
    assert_eq!(reader.file_count(), 2);
    assert_eq!(reader.read_path("dup").unwrap(), b"bbb");
}

#[test]
fn test_asset_set_overlay_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let mut roles = Vec::new();
    for (role, name, content) in [
        (Role::Base, "base.wad", "from base"),
        (Role::Locale, "locale.wad", "from locale"),
        (Role::BaseAlt, "base_alt.wad", "from base alt"),
        (Role::LocaleAlt, "locale_alt.wad", "from locale alt"),
    ] {
        let path = dir.path().join(name);
        let mut writer = ArchiveWriter::create(&path).unwrap();
        writer.add_file("shared/file.txt", content.as_bytes()).unwrap();
        writer.add_file(&format!("{}/only.txt", role), content.as_bytes()).unwrap();
        writer.finalize().unwrap();
        roles.push((role, path));
    }

    let mut assets = AssetSet::open(roles).unwrap();
    assert_eq!(assets.read_file("shared/file.txt").unwrap(), b"from locale");
    assert_eq!(assets.read_file("base-alt/only.txt").unwrap(), b"from base alt");

    let root: Vec<String> = assets
        .list_directory("")
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(root, vec!["shared", "locale", "base", "locale-alt", "base-alt"]);

    for entry in assets.list_directory("shared").unwrap() {
        let path = format!("shared/{}", entry.name);
        let size = assets.file_size(&path);
        assert_eq!(entry.size, size);
        assert_eq!(Some(assets.read_file(&path).unwrap().len() as u64), size);
    }
}
