use crate::error::{FormatError, Result, ShslError};
use serde::Serialize;
use std::io::{self, Read, Write};

/// Magic number at the start of every WAD archive
pub const MAGIC_NUMBER: [u8; 4] = *b"AGAR";

/// Version written by `ArchiveWriter`; readers carry the version but never enforce it
pub const FORMAT_VERSION_MAJOR: u32 = 1;
pub const FORMAT_VERSION_MINOR: u32 = 1;

/// Size of magic + version + reserved bytes
pub const FIXED_HEADER_SIZE: u64 = 16;

/// Maximum length in bytes of a path or subfile name
pub const MAX_PATH_LENGTH: u32 = 0x1_0000;

/// Upper bound on table preallocation, so a corrupt count cannot reserve gigabytes
const MAX_PREALLOCATED_ENTRIES: usize = 4096;

/// One entry of the flat file table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
    /// Offset relative to the end of the header
    pub offset: u64,
}

/// A child of a directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subfile {
    pub name: String,
    pub is_directory: bool,
}

/// One entry of the directory table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// Directory path; the root directory is the empty string
    pub path: String,
    pub subfiles: Vec<Subfile>,
}

/// Everything stored in front of the file data
#[derive(Debug, Clone)]
pub struct ArchiveHeader {
    pub version_major: u32,
    pub version_minor: u32,
    pub files: Vec<FileEntry>,
    pub dirs: Vec<DirEntry>,
    /// Exact number of bytes consumed while parsing the header
    pub size: u64,
}

impl ArchiveHeader {
    /// Read the header from a reader positioned at the start of the archive
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut reader = CountingReader::new(reader);

        let mut magic = [0u8; 4];
        reader.fill(&mut magic)?;
        if magic != MAGIC_NUMBER {
            return Err(FormatError::BadMagic(magic).into());
        }

        let version_major = read_u32(&mut reader)?;
        let version_minor = read_u32(&mut reader)?;

        // Reserved, ignored
        let mut reserved = [0u8; 4];
        reader.fill(&mut reserved)?;

        let file_count = read_u32(&mut reader)? as usize;
        let mut files = Vec::with_capacity(file_count.min(MAX_PREALLOCATED_ENTRIES));
        for _ in 0..file_count {
            let path = read_string(&mut reader)?;
            let size = read_u64(&mut reader)?;
            let offset = read_u64(&mut reader)?;
            files.push(FileEntry { path, size, offset });
        }

        let dir_count = read_u32(&mut reader)? as usize;
        let mut dirs = Vec::with_capacity(dir_count.min(MAX_PREALLOCATED_ENTRIES));
        for _ in 0..dir_count {
            let path = read_string(&mut reader)?;
            let subfile_count = read_u32(&mut reader)? as usize;
            let mut subfiles = Vec::with_capacity(subfile_count.min(MAX_PREALLOCATED_ENTRIES));
            for _ in 0..subfile_count {
                let name = read_string(&mut reader)?;
                let is_directory = read_u8(&mut reader)? != 0;
                subfiles.push(Subfile { name, is_directory });
            }
            dirs.push(DirEntry { path, subfiles });
        }

        Ok(Self {
            version_major,
            version_minor,
            files,
            dirs,
            size: reader.consumed(),
        })
    }

    /// Write the header; file offsets are written as stored
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&MAGIC_NUMBER)?;
        writer.write_all(&self.version_major.to_le_bytes())?;
        writer.write_all(&self.version_minor.to_le_bytes())?;
        writer.write_all(&[0u8; 4])?;

        writer.write_all(&(self.files.len() as u32).to_le_bytes())?;
        for file in &self.files {
            write_string(&mut writer, &file.path)?;
            writer.write_all(&file.size.to_le_bytes())?;
            writer.write_all(&file.offset.to_le_bytes())?;
        }

        writer.write_all(&(self.dirs.len() as u32).to_le_bytes())?;
        for dir in &self.dirs {
            write_string(&mut writer, &dir.path)?;
            writer.write_all(&(dir.subfiles.len() as u32).to_le_bytes())?;
            for subfile in &dir.subfiles {
                write_string(&mut writer, &subfile.name)?;
                writer.write_all(&[subfile.is_directory as u8])?;
            }
        }

        Ok(())
    }

    /// Size the header will occupy once written
    pub fn encoded_size(&self) -> u64 {
        let files: u64 = self
            .files
            .iter()
            .map(|f| 4 + f.path.len() as u64 + 16)
            .sum();
        let dirs: u64 = self
            .dirs
            .iter()
            .map(|d| {
                4 + d.path.len() as u64
                    + 4
                    + d.subfiles
                        .iter()
                        .map(|s| 4 + s.name.len() as u64 + 1)
                        .sum::<u64>()
            })
            .sum();
        FIXED_HEADER_SIZE + 4 + files + 4 + dirs
    }
}

/// Reader adapter that tallies every byte handed out
struct CountingReader<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    fn consumed(&self) -> u64 {
        self.consumed
    }

    /// `read_exact` that reports running out of input as a truncated header
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let start = self.consumed as usize;
        match self.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FormatError::Truncated {
                what: "archive header",
                needed: start + buf.len(),
                available: self.consumed as usize,
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}

// Helper functions for reading primitive types
fn read_u8<R: Read>(reader: &mut CountingReader<R>) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.fill(&mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut CountingReader<R>) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.fill(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut CountingReader<R>) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.fill(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Length-prefixed UTF-8 string
fn read_string<R: Read>(reader: &mut CountingReader<R>) -> Result<String> {
    let len = read_u32(reader)?;
    if len > MAX_PATH_LENGTH {
        return Err(FormatError::PathTooLong(len).into());
    }

    let mut buf = vec![0u8; len as usize];
    reader.fill(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| ShslError::Format(FormatError::InvalidPath(e.to_string())))
}

fn write_string<W: Write>(mut writer: W, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() as u64 > MAX_PATH_LENGTH as u64 {
        return Err(FormatError::PathTooLong(bytes.len() as u32).into());
    }
    writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
    writer.write_all(bytes)?;
    Ok(())
}
