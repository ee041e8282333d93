use crate::script::decoder::Instruction;
use crate::script::opcode::{OpcodeInfo, OperandKind};
use crate::script::strings::StringTable;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Character opening and closing a string literal
pub const STRING_DELIMITER: char = '`';

/// Knobs for rendered output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompileOptions {
    /// Blank line after every terminator and breaking `change_ui`
    pub structural_breaks: bool,

    /// Replace string indices with the string itself
    pub resolve_strings: bool,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        Self {
            structural_breaks: true,
            resolve_strings: true,
        }
    }
}

/// Escape `text` for use between two [`STRING_DELIMITER`]s
///
/// Newlines are kept as they are, so long dialogue spans several output lines.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            STRING_DELIMITER => {
                out.push('\\');
                out.push(STRING_DELIMITER);
            }
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Renders decoded instructions as one line each
#[derive(Debug, Clone, Default)]
pub struct Decompiler {
    options: DecompileOptions,
}

impl Decompiler {
    pub fn new(options: DecompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecompileOptions {
        &self.options
    }

    /// Render a whole instruction stream
    ///
    /// Never fails: opcodes without a known schema come out as raw bytes.
    pub fn decompile(&self, instructions: &[Instruction<'_>], strings: &StringTable) -> String {
        let mut out = String::new();
        for (i, instruction) in instructions.iter().enumerate() {
            out.push_str(&self.render_instruction(instruction, strings));
            out.push('\n');

            let last = i + 1 == instructions.len();
            if self.options.structural_breaks && instruction.is_break() && !last {
                out.push('\n');
            }
        }
        out
    }

    /// Render a single instruction without a trailing newline
    ///
    /// Falls back to raw bytes when the operands do not fit the schema or the
    /// payload implies a length other than the one decoded.
    pub fn render_instruction(&self, instruction: &Instruction<'_>, strings: &StringTable) -> String {
        match instruction.info() {
            Some(info)
                if info.operand_len() == instruction.operands.len()
                    && instruction.effective_len() == instruction.size() =>
            {
                self.render_known(info, instruction, strings)
            }
            _ => render_raw(instruction),
        }
    }

    fn render_known(&self, info: &OpcodeInfo, instruction: &Instruction<'_>, strings: &StringTable) -> String {
        let mut line = info.mnemonic.to_string();
        let mut rest = instruction.operands;

        for (n, kind) in info.operands.iter().enumerate() {
            let (bytes, tail) = rest.split_at(kind.size());
            rest = tail;
            line.push_str(if n == 0 { " " } else { ", " });

            match kind {
                OperandKind::U8 => line.push_str(&bytes[0].to_string()),
                OperandKind::U16Le => {
                    line.push_str(&u16::from_le_bytes([bytes[0], bytes[1]]).to_string())
                }
                OperandKind::U16Be => {
                    line.push_str(&u16::from_be_bytes([bytes[0], bytes[1]]).to_string())
                }
                OperandKind::StringIndex => {
                    let index = u16::from_be_bytes([bytes[0], bytes[1]]);
                    self.render_string(&mut line, index, instruction.offset, strings);
                }
            }
        }

        line
    }

    fn render_string(&self, line: &mut String, index: u16, offset: usize, strings: &StringTable) {
        if !self.options.resolve_strings {
            line.push_str(&index.to_string());
            return;
        }

        match strings.get(index as usize) {
            Some(text) => {
                line.push(STRING_DELIMITER);
                line.push_str(&escape_literal(text));
                line.push(STRING_DELIMITER);
            }
            None => {
                warn!(index, offset, count = strings.len(), "string index out of range");
                line.push_str(&index.to_string());
            }
        }
    }
}

/// `raw 0x70, 0x99, 0x01`: opcode and operand bytes
fn render_raw(instruction: &Instruction<'_>) -> String {
    let [hi, lo] = instruction.opcode.to_be_bytes();
    let bytes: Vec<String> = [hi, lo]
        .iter()
        .chain(instruction.operands)
        .map(|b| format!("{:#04x}", b))
        .collect();
    format!("raw {}", bytes.join(", "))
}
