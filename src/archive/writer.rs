use crate::archive::format::{
    ArchiveHeader, DirEntry, FileEntry, Subfile, FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR,
};
use crate::archive::reader::join_path;
use crate::error::{Result, ShslError};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Normalize path to forward slashes (cross-platform compatibility)
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

/// Builder for WAD archives
///
/// Files are buffered in memory and laid out back to back after the header.
/// The directory table is derived from the file paths: every path component
/// becomes a directory entry listing its children in first-insertion order.
pub struct ArchiveWriter {
    output: Option<PathBuf>,
    files: Vec<(String, Vec<u8>)>,
    file_map: HashMap<String, usize>,
    /// Every directory implied by the paths added so far
    dir_set: HashSet<String>,
    version: (u32, u32),
}

impl ArchiveWriter {
    /// Create a writer that will produce `path` on `finalize`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Fail early if the destination cannot be created
        File::create(path.as_ref())?;

        let mut writer = Self::in_memory();
        writer.output = Some(path.as_ref().to_path_buf());
        Ok(writer)
    }

    /// Create a writer whose image is retrieved with `to_bytes`
    pub fn in_memory() -> Self {
        Self {
            output: None,
            files: Vec::new(),
            file_map: HashMap::new(),
            dir_set: HashSet::new(),
            version: (FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR),
        }
    }

    /// Override the version numbers stored in the header
    pub fn with_version(mut self, major: u32, minor: u32) -> Self {
        self.version = (major, minor);
        self
    }

    /// Add a file; adding the same path again replaces its contents
    ///
    /// A path cannot be both a file and a directory of the same archive.
    pub fn add_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let normalized = normalize_path(path);
        if normalized.is_empty() || normalized.split('/').any(|c| c.is_empty()) {
            return Err(ShslError::Config(format!("invalid archive path: {:?}", path)));
        }

        if let Some(&index) = self.file_map.get(&normalized) {
            self.files[index].1 = data.to_vec();
            return Ok(());
        }

        let ancestors: Vec<&str> = normalized
            .match_indices('/')
            .map(|(i, _)| &normalized[..i])
            .collect();
        if self.dir_set.contains(&normalized) {
            return Err(ShslError::Config(format!(
                "{:?} is already a directory",
                normalized
            )));
        }
        if let Some(file) = ancestors.iter().find(|a| self.file_map.contains_key(**a)) {
            return Err(ShslError::Config(format!(
                "{:?} is already a file, cannot add {:?}",
                file, normalized
            )));
        }

        self.dir_set
            .extend(ancestors.into_iter().map(str::to_string));
        self.file_map.insert(normalized.clone(), self.files.len());
        self.files.push((normalized, data.to_vec()));
        Ok(())
    }

    /// Add a file read from disk
    pub fn add_file_from_disk(&mut self, path: &str, source: &Path) -> Result<()> {
        let data = std::fs::read(source)?;
        self.add_file(path, &data)
    }

    /// Number of files added so far
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn build_header(&self) -> ArchiveHeader {
        let mut offset = 0u64;
        let files = self
            .files
            .iter()
            .map(|(path, data)| {
                let entry = FileEntry {
                    path: path.clone(),
                    size: data.len() as u64,
                    offset,
                };
                offset += data.len() as u64;
                entry
            })
            .collect();

        let mut dirs = vec![DirEntry {
            path: String::new(),
            subfiles: Vec::new(),
        }];
        let mut dir_map: HashMap<String, usize> = HashMap::new();
        dir_map.insert(String::new(), 0);

        for (path, _) in &self.files {
            let components: Vec<&str> = path.split('/').collect();
            let mut parent = String::new();
            for (depth, name) in components.iter().enumerate() {
                let is_directory = depth + 1 < components.len();
                let parent_index = dir_map[&parent];
                let siblings = &mut dirs[parent_index].subfiles;
                if !siblings.iter().any(|s| s.name == *name) {
                    siblings.push(Subfile {
                        name: name.to_string(),
                        is_directory,
                    });
                }

                if is_directory {
                    let child = join_path(&parent, name);
                    if !dir_map.contains_key(&child) {
                        dir_map.insert(child.clone(), dirs.len());
                        dirs.push(DirEntry {
                            path: child.clone(),
                            subfiles: Vec::new(),
                        });
                    }
                    parent = child;
                }
            }
        }

        let mut header = ArchiveHeader {
            version_major: self.version.0,
            version_minor: self.version.1,
            files,
            dirs,
            size: 0,
        };
        header.size = header.encoded_size();
        header
    }

    /// Serialize the complete archive image
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let header = self.build_header();
        header.write_to(&mut writer)?;
        for (_, data) in &self.files {
            writer.write_all(data)?;
        }
        writer.flush()?;

        debug!(
            files = header.files.len(),
            dirs = header.dirs.len(),
            header_size = header.size,
            "wrote archive"
        );
        Ok(())
    }

    /// Write the archive to the path given to `create`
    pub fn finalize(self) -> Result<()> {
        let output = self.output.as_ref().ok_or_else(|| {
            ShslError::Config("in-memory archive writer has no output path".to_string())
        })?;
        let file = File::create(output)?;
        self.write_to(BufWriter::new(file))
    }
}
