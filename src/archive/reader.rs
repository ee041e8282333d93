use crate::archive::format::{ArchiveHeader, DirEntry, FileEntry, Subfile};
use crate::error::{Result, ShslError};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Normalize path to forward slashes (the separator used inside archives)
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Join a directory path and a child name the way the directory table does
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Where an archive entry lands when extracted under `out_dir`
///
/// Archive paths come from untrusted files; any path with a `..`, root or
/// drive component is refused instead of being joined.
pub fn extraction_path(out_dir: &Path, entry: &str) -> Result<PathBuf> {
    let relative = Path::new(entry);
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if entry.is_empty() || escapes {
        return Err(ShslError::UnsafePath(entry.to_string()));
    }
    Ok(out_dir.join(relative))
}

/// Read-only view of one WAD archive with O(1) path lookup
///
/// The archive file stays open for the lifetime of the reader and is closed
/// when it is dropped.
pub struct ArchiveReader {
    file: File,
    archive_path: PathBuf,
    header: ArchiveHeader,
    file_map: HashMap<String, usize>,
    dir_map: HashMap<String, usize>,
}

impl ArchiveReader {
    /// Open an archive file and parse its file and directory tables
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let archive_path = path.as_ref().to_path_buf();
        let mut file = File::open(&archive_path)?;

        // Buffer the many small header reads; the buffer is discarded afterwards
        let header = ArchiveHeader::read_from(BufReader::new(&mut file))?;

        // Later duplicates overwrite earlier ones
        let file_map = header
            .files
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.path.clone(), i))
            .collect();
        let dir_map = header
            .dirs
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.path.clone(), i))
            .collect();

        info!(
            "opened {} (version {}.{})",
            archive_path.display(),
            header.version_major,
            header.version_minor
        );
        debug!(
            files = header.files.len(),
            dirs = header.dirs.len(),
            header_size = header.size,
            "parsed archive tables"
        );

        Ok(Self {
            file,
            archive_path,
            header,
            file_map,
            dir_map,
        })
    }

    /// Path of the backing file
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Archive version as (major, minor)
    pub fn version(&self) -> (u32, u32) {
        (self.header.version_major, self.header.version_minor)
    }

    /// Number of header bytes in front of the file data
    pub fn header_size(&self) -> u64 {
        self.header.size
    }

    /// Number of entries in the file table
    pub fn file_count(&self) -> usize {
        self.header.files.len()
    }

    /// File table in declaration order
    pub fn files(&self) -> &[FileEntry] {
        &self.header.files
    }

    /// Directory table in declaration order
    pub fn dirs(&self) -> &[DirEntry] {
        &self.header.dirs
    }

    pub fn file_index(&self, path: &str) -> Option<usize> {
        self.file_map.get(path).copied().or_else(|| {
            let normalized = normalize_path(path);
            self.file_map.get(&normalized).copied()
        })
    }

    pub fn dir_index(&self, path: &str) -> Option<usize> {
        self.dir_map.get(path).copied().or_else(|| {
            let normalized = normalize_path(path);
            self.dir_map.get(&normalized).copied()
        })
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.file_index(path).is_some()
    }

    pub fn file_size(&self, index: usize) -> Option<u64> {
        self.header.files.get(index).map(|f| f.size)
    }

    /// Children of a directory in the order the archive lists them
    pub fn dir_subfiles(&self, index: usize) -> Option<&[Subfile]> {
        self.header.dirs.get(index).map(|d| d.subfiles.as_slice())
    }

    /// Full paths of the children of `dir`, optionally skipping subdirectories
    pub fn list_dir(&self, dir: &str, only_files: bool) -> Result<Vec<String>> {
        let index = self
            .dir_index(dir)
            .ok_or_else(|| ShslError::DirectoryNotFound(dir.to_string()))?;

        Ok(self.header.dirs[index]
            .subfiles
            .iter()
            .filter(|sf| !only_files || !sf.is_directory)
            .map(|sf| join_path(dir, &sf.name))
            .collect())
    }

    /// Read the complete contents of the file at `index`
    ///
    /// A file that extends past the end of the archive is reported as an I/O
    /// error rather than returned short.
    pub fn read_file(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self
            .header
            .files
            .get(index)
            .ok_or(ShslError::InvalidIndex(index))?;

        let offset = self
            .header
            .size
            .checked_add(entry.offset)
            .ok_or_else(|| ShslError::InvalidIndex(index))?;
        let size = usize::try_from(entry.size).map_err(|_| ShslError::InvalidIndex(index))?;
        debug!(path = %entry.path, offset, size, "reading file");

        self.file.seek(SeekFrom::Start(offset))?;
        let mut data = Vec::new();
        (&mut self.file).take(entry.size).read_to_end(&mut data)?;
        if data.len() != size {
            return Err(ShslError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "{}: read {} of {} bytes",
                    entry.path,
                    data.len(),
                    size
                ),
            )));
        }

        Ok(data)
    }

    /// Read a file by its path inside the archive
    pub fn read_path(&mut self, path: &str) -> Result<Vec<u8>> {
        let index = self
            .file_index(path)
            .ok_or_else(|| ShslError::FileNotFound(path.to_string()))?;
        self.read_file(index)
    }

    /// Extract a file, or every file below a directory, into `out_dir`
    ///
    /// All destinations are checked before anything is written, so one unsafe
    /// entry aborts the whole extraction. Returns the written paths.
    pub fn extract(&mut self, path: &str, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let indices: Vec<usize> = if let Some(index) = self.file_index(path) {
            vec![index]
        } else if self.dir_index(path).is_some() {
            let dir = normalize_path(path);
            let prefix = format!("{}/", dir.trim_end_matches('/'));
            self.header
                .files
                .iter()
                .enumerate()
                .filter(|(_, entry)| dir.is_empty() || entry.path.starts_with(&prefix))
                .map(|(i, _)| i)
                .collect()
        } else {
            return Err(ShslError::FileNotFound(path.to_string()));
        };

        let destinations = indices
            .iter()
            .map(|&i| extraction_path(out_dir, &self.header.files[i].path))
            .collect::<Result<Vec<_>>>()?;

        for (&index, dest) in indices.iter().zip(&destinations) {
            let data = self.read_file(index)?;
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(dest, &data)?;
        }

        info!(
            "extracted {} file(s) from {}",
            destinations.len(),
            self.archive_path.display()
        );
        Ok(destinations)
    }
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("archive_path", &self.archive_path)
            .field("files", &self.header.files.len())
            .field("dirs", &self.header.dirs.len())
            .field("header_size", &self.header.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;
    use tempfile::NamedTempFile;

    fn build_archive() -> tempfile::TempPath {
        let path = NamedTempFile::new().unwrap().into_temp_path();
        let mut writer = ArchiveWriter::create(&path).unwrap();
        writer.add_file("Dr2/data/all/bin/a.pak", b"first").unwrap();
        writer.add_file("Dr2/data/all/bin/b.pak", b"second file").unwrap();
        writer.add_file("readme.txt", b"").unwrap();
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_read_by_index_and_path() {
        let path = build_archive();
        let mut reader = ArchiveReader::open(&path).unwrap();

        assert_eq!(reader.file_count(), 3);
        let index = reader.file_index("Dr2/data/all/bin/b.pak").unwrap();
        assert_eq!(reader.file_size(index), Some(11));
        assert_eq!(reader.read_file(index).unwrap(), b"second file");
        assert_eq!(reader.read_path("Dr2/data/all/bin/a.pak").unwrap(), b"first");
        assert_eq!(reader.read_path("readme.txt").unwrap(), b"");
    }

    #[test]
    fn test_backslash_paths_are_normalized() {
        let path = build_archive();
        let reader = ArchiveReader::open(&path).unwrap();

        assert!(reader.contains("Dr2\\data\\all\\bin\\a.pak"));
        assert!(reader.dir_index("Dr2\\data").is_some());
    }

    #[test]
    fn test_directory_tables() {
        let path = build_archive();
        let reader = ArchiveReader::open(&path).unwrap();

        let root = reader.dir_index("").unwrap();
        let names: Vec<_> = reader
            .dir_subfiles(root)
            .unwrap()
            .iter()
            .map(|s| (s.name.as_str(), s.is_directory))
            .collect();
        assert_eq!(names, vec![("Dr2", true), ("readme.txt", false)]);

        assert_eq!(
            reader.list_dir("Dr2/data/all/bin", true).unwrap(),
            vec!["Dr2/data/all/bin/a.pak", "Dr2/data/all/bin/b.pak"]
        );
        assert!(matches!(
            reader.list_dir("missing", false),
            Err(ShslError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_extraction_path() {
        let out = Path::new("out");
        assert_eq!(
            extraction_path(out, "Dr2/data/a.pak").unwrap(),
            out.join("Dr2/data/a.pak")
        );
        for bad in ["", "../a", "Dr2/../../a", "/etc/passwd"] {
            assert!(
                matches!(extraction_path(out, bad), Err(ShslError::UnsafePath(_))),
                "{:?} should be refused",
                bad
            );
        }
    }

    #[test]
    fn test_extract_directory() {
        let path = build_archive();
        let mut reader = ArchiveReader::open(&path).unwrap();
        let out = tempfile::tempdir().unwrap();

        let written = reader.extract("Dr2/data", out.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(
            std::fs::read(out.path().join("Dr2/data/all/bin/b.pak")).unwrap(),
            b"second file"
        );
        assert!(!out.path().join("readme.txt").exists());
    }

    #[test]
    fn test_misses() {
        let path = build_archive();
        let mut reader = ArchiveReader::open(&path).unwrap();

        assert_eq!(reader.file_index("nope"), None);
        assert_eq!(reader.dir_index("nope"), None);
        assert_eq!(reader.file_size(99), None);
        assert!(reader.dir_subfiles(99).is_none());
        assert!(matches!(reader.read_file(99), Err(ShslError::InvalidIndex(99))));
        assert!(matches!(
            reader.read_path("nope"),
            Err(ShslError::FileNotFound(_))
        ));
    }
}
