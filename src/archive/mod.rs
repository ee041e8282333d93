mod format;
mod reader;
mod writer;

pub use format::{
    ArchiveHeader, DirEntry, FileEntry, Subfile, FIXED_HEADER_SIZE, FORMAT_VERSION_MAJOR,
    FORMAT_VERSION_MINOR, MAGIC_NUMBER, MAX_PATH_LENGTH,
};
pub use reader::{extraction_path, ArchiveReader};
pub(crate) use reader::join_path;
pub use writer::ArchiveWriter;
