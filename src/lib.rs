//! shsl-rs: WAD archive reader and LIN script decompiler
//!
//! This library reads the asset containers of the PC release and renders the
//! event script bytecode they carry as text:
//! - AGAR (`.wad`) archive parsing with a byte-exact header size
//! - Override-aware lookup over the base, locale and keyboard archives
//! - PAK sub-containers nested inside the archives
//! - LIN script container, UTF-16 string table and instruction decoding
//! - A line-based decompiler plus a highlighter for its output
//!
//! # Example
//!
//! ```no_run
//! use shsl_rs::{ArchiveReader, OpcodeLengthTable, Script, DecompileOptions};
//!
//! let mut reader = ArchiveReader::open("dr2_data_us.wad")?;
//! let bytes = reader.read_path("Dr2/data/us/script/e00_001_000.lin")?;
//!
//! let script = Script::decode(&bytes, &OpcodeLengthTable::STANDARD)?;
//! println!("{}", script.decompile(&DecompileOptions::default()));
//! # Ok::<(), shsl_rs::ShslError>(())
//! ```

pub mod archive;
pub mod assets;
pub mod config;
pub mod error;
pub mod pak;
pub mod script;
pub mod workspace;

pub use archive::{
    extraction_path, ArchiveHeader, ArchiveReader, ArchiveWriter, DirEntry, FileEntry, Subfile,
    FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR, MAGIC_NUMBER, MAX_PATH_LENGTH,
};
pub use assets::{AssetSet, DirListing, Role};
pub use config::{Config, GameLayout};
pub use error::{FormatError, Result, ShslError};
pub use pak::Pak;
pub use script::{
    DecompileOptions, Decompiler, Instruction, InstructionDecoder, OpcodeLengthTable, Script,
    ScriptContainer, ScriptKind, StringTable,
};
pub use workspace::{Preview, Workspace};
