//! LIN script files: container, string table, bytecode and decompiler
//!
//! ```text
//! ┌──────────────────────┐
//! │ type (u32)           │ 1 or 2
//! │ instructions (u32)   │ offset of the bytecode
//! │ strings (u32)        │ type 2 only
//! ├──────────────────────┤
//! │ bytecode             │ 0x70 <op> <operands>...
//! ├──────────────────────┤
//! │ string table         │ count, offsets, UTF-16LE strings
//! └──────────────────────┘
//! ```

mod catalog;
mod container;
mod decoder;
mod decompile;
mod highlight;
mod opcode;
mod strings;

pub use catalog::{is_event_script_name, script_entries, ScriptEntry};
pub use container::{ScriptContainer, ScriptKind};
pub use decoder::{
    decode_instructions, next_boundary, Instruction, InstructionDecoder, Instructions,
};
pub use decompile::{escape_literal, DecompileOptions, Decompiler, STRING_DELIMITER};
pub use highlight::{highlight_line, highlight_text, Highlighter, ScanMode, Span, TokenClass};
pub use opcode::{
    is_terminator, opcode_info, OpcodeFamily, OpcodeInfo, OpcodeLengthTable, OperandKind,
    UiSelector, CHANGE_UI, KNOWN_OPCODES, MAX_OPCODE_KEY, OPCODE_BASE, OPCODE_COUNT,
    OPCODE_PREFIX,
};
pub use strings::StringTable;

use crate::error::Result;
use serde::Serialize;

pub(crate) fn read_u32_le(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// A fully decoded script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script<'a> {
    pub kind: ScriptKind,
    pub instructions: Vec<Instruction<'a>>,
    pub strings: StringTable,
}

impl<'a> Script<'a> {
    /// Decode container, string table and instruction stream
    ///
    /// Fails as a whole if any part is malformed.
    pub fn decode(bytes: &'a [u8], table: &OpcodeLengthTable) -> Result<Self> {
        let container = ScriptContainer::decode(bytes)?;
        let strings = match container.strings() {
            Some(region) => StringTable::parse(region)?,
            None => StringTable::default(),
        };
        let instructions = decode_instructions(container.instructions(), table)?;

        Ok(Self {
            kind: container.kind,
            instructions,
            strings,
        })
    }

    /// Render the script as text
    pub fn decompile(&self, options: &DecompileOptions) -> String {
        Decompiler::new(options.clone()).decompile(&self.instructions, &self.strings)
    }

    /// Instructions and strings as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
