//! Path traversal prevention
//!
//! Archive paths are untrusted input: extraction must never write outside the
//! chosen output directory, and the writer must not produce contradictory
//! tables.

use shsl_rs::{
    extraction_path, ArchiveHeader, ArchiveReader, ArchiveWriter, DirEntry, FileEntry, ShslError,
    Subfile,
};
use std::path::Path;
use tempfile::TempDir;

/// Write an archive whose file table holds `paths` verbatim, each with 4 bytes of data
fn write_hostile_archive(dir: &Path, paths: &[&str]) -> std::path::PathBuf {
    let files: Vec<FileEntry> = paths
        .iter()
        .enumerate()
        .map(|(i, path)| FileEntry {
            path: path.to_string(),
            size: 4,
            offset: 4 * i as u64,
        })
        .collect();
    let header = ArchiveHeader {
        version_major: 1,
        version_minor: 1,
        files,
        dirs: vec![DirEntry {
            path: String::new(),
            subfiles: paths
                .iter()
                .map(|p| Subfile {
                    name: p.to_string(),
                    is_directory: false,
                })
                .collect(),
        }],
        size: 0,
    };

    let mut bytes = Vec::new();
    header.write_to(&mut bytes).unwrap();
    for _ in paths {
        bytes.extend_from_slice(b"evil");
    }

    let archive = dir.join("hostile.wad");
    std::fs::write(&archive, bytes).unwrap();
    archive
}

#[test]
fn test_extract_rejects_parent_dir() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("out");
    let archive = write_hostile_archive(root.path(), &["../escaped.txt"]);

    let mut reader = ArchiveReader::open(&archive).unwrap();
    let err = reader.extract("../escaped.txt", &out).unwrap_err();
    assert!(matches!(err, ShslError::UnsafePath(ref p) if p == "../escaped.txt"));
    assert!(!root.path().join("escaped.txt").exists());
}

#[test]
fn test_extract_rejects_absolute_path() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("out");
    let target = root.path().join("absolute.txt");
    let absolute = target.to_str().unwrap();
    let archive = write_hostile_archive(root.path(), &[absolute]);

    let mut reader = ArchiveReader::open(&archive).unwrap();
    assert!(matches!(
        reader.extract(absolute, &out),
        Err(ShslError::UnsafePath(_))
    ));
    assert!(!target.exists());
}

#[test]
fn test_root_extraction_is_all_or_nothing() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("out");
    let archive = write_hostile_archive(root.path(), &["safe.txt", "../escaped.txt"]);

    // One bad entry aborts the extraction before any file is written
    let mut reader = ArchiveReader::open(&archive).unwrap();
    assert!(matches!(
        reader.extract("", &out),
        Err(ShslError::UnsafePath(_))
    ));
    assert!(!out.join("safe.txt").exists());
    assert!(!root.path().join("escaped.txt").exists());
}

#[test]
fn test_extract_nested_paths_stay_inside() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("out");
    let archive = root.path().join("good.wad");

    let mut writer = ArchiveWriter::create(&archive).unwrap();
    writer.add_file("Dr2/data/us/script/e00.lin", b"lin").unwrap();
    writer.add_file("Dr2/data/us/bg/a.tga", b"tga").unwrap();
    writer.finalize().unwrap();

    let mut reader = ArchiveReader::open(&archive).unwrap();
    let written = reader.extract("", &out).unwrap();
    assert_eq!(written.len(), 2);
    assert!(written.iter().all(|p| p.starts_with(&out)));
    assert_eq!(
        std::fs::read(out.join("Dr2/data/us/script/e00.lin")).unwrap(),
        b"lin"
    );
}

#[test]
fn test_extraction_path_components() {
    let out = Path::new("/tmp/out");
    assert!(extraction_path(out, "a/./b.txt").is_ok());
    assert!(extraction_path(out, "a/../../b.txt").is_err());
    assert!(extraction_path(out, "..").is_err());
}

#[test]
fn test_writer_rejects_file_directory_collision() {
    let mut writer = ArchiveWriter::in_memory();
    writer.add_file("a", b"file").unwrap();
    assert!(matches!(
        writer.add_file("a/b", b"child"),
        Err(ShslError::Config(_))
    ));

    let mut writer = ArchiveWriter::in_memory();
    writer.add_file("a/b", b"child").unwrap();
    assert!(matches!(
        writer.add_file("a", b"file"),
        Err(ShslError::Config(_))
    ));
}
