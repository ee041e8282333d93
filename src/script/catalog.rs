use crate::archive::{join_path, ArchiveReader};
use crate::error::{Result, ShslError};
use serde::Serialize;

/// An event script found in an archive's script directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptEntry {
    /// File name, e.g. `e00_001_000.lin`
    pub name: String,
    /// Full path inside the archive
    pub path: String,
    /// File index in the archive
    pub index: usize,
    pub size: u64,
}

/// Whether `name` looks like `e??_???_???.lin`
pub fn is_event_script_name(name: &str) -> bool {
    name.len() == 15 && name.starts_with('e') && name.ends_with(".lin")
}

/// Event scripts directly inside `dir`, sorted by name
pub fn script_entries(archive: &ArchiveReader, dir: &str) -> Result<Vec<ScriptEntry>> {
    let subfiles = archive
        .dir_index(dir)
        .and_then(|index| archive.dir_subfiles(index))
        .ok_or_else(|| ShslError::DirectoryNotFound(dir.to_string()))?;

    let mut entries: Vec<ScriptEntry> = subfiles
        .iter()
        .filter(|subfile| !subfile.is_directory && is_event_script_name(&subfile.name))
        .filter_map(|subfile| {
            let path = join_path(dir, &subfile.name);
            let index = archive.file_index(&path)?;
            let size = archive.file_size(index)?;
            Some(ScriptEntry {
                name: subfile.name.clone(),
                path,
                index,
                size,
            })
        })
        .collect();

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;

    #[test]
    fn test_event_script_names() {
        assert!(is_event_script_name("e00_001_000.lin"));
        assert!(!is_event_script_name("e00_001_000.pak"));
        assert!(!is_event_script_name("s00_001_000.lin"));
        assert!(!is_event_script_name("e00_001.lin"));
    }

    #[test]
    fn test_script_entries_sorted_and_filtered() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(file.path()).unwrap();
        writer.add_file("script/e08_002_000.lin", b"bbbb").unwrap();
        writer.add_file("script/e00_001_000.lin", b"aa").unwrap();
        writer.add_file("script/readme.txt", b"x").unwrap();
        writer.add_file("script/e00_999_999.lin/inner", b"x").unwrap();
        writer.finalize().unwrap();

        let archive = ArchiveReader::open(file.path()).unwrap();
        let entries = script_entries(&archive, "script").unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["e00_001_000.lin", "e08_002_000.lin"]);
        assert_eq!(entries[0].path, "script/e00_001_000.lin");
        assert_eq!(entries[0].size, 2);
        assert_eq!(archive.file_index(&entries[1].path), Some(entries[1].index));

        assert!(matches!(
            script_entries(&archive, "missing"),
            Err(ShslError::DirectoryNotFound(_))
        ));
    }
}
