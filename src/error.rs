use std::io;
use thiserror::Error;

/// Result type for shsl operations
pub type Result<T> = std::result::Result<T, ShslError>;

/// Unified error type for all shsl operations
#[derive(Debug, Error)]
pub enum ShslError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Structural errors in archives and scripts
    #[error("Invalid format: {0}")]
    Format(#[from] FormatError),

    /// A compound operation failed because one of its parts did
    #[error("{context}: {source}")]
    Aggregate {
        context: String,
        #[source]
        source: Box<ShslError>,
    },

    // Lookup errors
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Entry index out of range: {0}")]
    InvalidIndex(usize),

    #[error("No game directory is loaded")]
    NotLoaded,

    #[error("Archive path escapes the output directory: {0}")]
    UnsafePath(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    TomlError(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ShslError {
    /// Wrap an error with the context of the operation that failed
    pub fn aggregate(context: impl Into<String>, source: ShslError) -> Self {
        ShslError::Aggregate {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error of an aggregate chain
    pub fn root_cause(&self) -> &ShslError {
        match self {
            ShslError::Aggregate { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<toml::de::Error> for ShslError {
    fn from(err: toml::de::Error) -> Self {
        ShslError::TomlError(err.to_string())
    }
}

impl From<toml::ser::Error> for ShslError {
    fn from(err: toml::ser::Error) -> Self {
        ShslError::TomlError(err.to_string())
    }
}

/// Structural problems found while decoding archives and scripts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    // Archive errors
    #[error("invalid magic number {0:02x?} (expected \"AGAR\")")]
    BadMagic([u8; 4]),

    #[error("path length {0} exceeds the maximum")]
    PathTooLong(u32),

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(String),

    // Truncation and offsets
    #[error("truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("unknown script type {0}")]
    UnknownType(u32),

    #[error("{what} offset {offset:#x} is outside the {len}-byte buffer")]
    OffsetOutOfRange {
        what: &'static str,
        offset: usize,
        len: usize,
    },

    #[error("string {index} at offset {offset:#x} is out of range or unterminated")]
    BadString { index: usize, offset: usize },

    #[error("string {index} is not valid UTF-16")]
    InvalidUtf16 { index: usize },

    #[error("pak entry {index} spans {start:#x}..{end:#x}, which is empty or reversed")]
    PakEntryBounds {
        index: usize,
        start: usize,
        end: usize,
    },

    // Instruction stream errors
    #[error("invalid opcode {opcode:#06x} at offset {offset:#x}")]
    InvalidOpcode { opcode: u16, offset: usize },

    #[error(
        "instruction {opcode:#06x} at offset {offset:#x} needs {needed} bytes, {available} remain"
    )]
    TruncatedInstruction {
        opcode: u16,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("opcode length table entry {key:#04x} is {len}, below the 2 opcode bytes")]
    InvalidTableEntry { key: usize, len: u8 },
}
