use crate::error::{FormatError, Result};
use crate::script::read_u32_le;
use serde::Serialize;

/// Script layout announced by the type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    /// Instructions only
    Instructions = 1,
    /// Instructions followed by a string table
    InstructionsAndStrings = 2,
}

impl ScriptKind {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::Instructions),
            2 => Ok(Self::InstructionsAndStrings),
            _ => Err(FormatError::UnknownType(value).into()),
        }
    }

    /// Bytes taken by the header for this layout
    pub fn header_len(self) -> usize {
        match self {
            Self::Instructions => 8,
            Self::InstructionsAndStrings => 12,
        }
    }
}

/// The sections of a script file, borrowed from the original bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptContainer<'a> {
    pub kind: ScriptKind,
    pub instructions_offset: usize,
    pub strings_offset: Option<usize>,
    instructions: &'a [u8],
    strings: Option<&'a [u8]>,
}

impl<'a> ScriptContainer<'a> {
    /// Split a script into its instruction and string regions
    ///
    /// The instruction region runs to the string table when the string table
    /// follows it, otherwise to the end of the file.
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        let truncated = |needed| FormatError::Truncated {
            what: "script header",
            needed,
            available: bytes.len(),
        };

        if bytes.len() < 8 {
            return Err(truncated(8).into());
        }
        let kind = ScriptKind::from_u32(read_u32_le(bytes, 0).ok_or_else(|| truncated(8))?)?;
        let instructions_offset = read_u32_le(bytes, 4).ok_or_else(|| truncated(8))? as usize;
        if instructions_offset > bytes.len() {
            return Err(FormatError::OffsetOutOfRange {
                what: "instructions",
                offset: instructions_offset,
                len: bytes.len(),
            }
            .into());
        }

        let (strings_offset, strings) = match kind {
            ScriptKind::Instructions => (None, None),
            ScriptKind::InstructionsAndStrings => {
                let offset = read_u32_le(bytes, 8)
                    .ok_or_else(|| truncated(kind.header_len()))?
                    as usize;
                let region = bytes.get(offset..).ok_or(FormatError::OffsetOutOfRange {
                    what: "strings",
                    offset,
                    len: bytes.len(),
                })?;
                (Some(offset), Some(region))
            }
        };

        let instructions_end = match strings_offset {
            Some(offset) if offset >= instructions_offset => offset,
            _ => bytes.len(),
        };

        Ok(Self {
            kind,
            instructions_offset,
            strings_offset,
            instructions: &bytes[instructions_offset..instructions_end],
            strings,
        })
    }

    /// Bytes of the instruction stream
    pub fn instructions(&self) -> &'a [u8] {
        self.instructions
    }

    /// Bytes of the string table, from its count field to the end of the file
    pub fn strings(&self) -> Option<&'a [u8]> {
        self.strings
    }
}
