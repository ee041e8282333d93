use crate::error::{FormatError, Result};
use crate::script::opcode::{
    is_terminator, opcode_info, OpcodeFamily, OpcodeInfo, OpcodeLengthTable, UiSelector,
};
use serde::{Serialize, Serializer};
use tracing::debug;

/// One decoded instruction, borrowing its operands from the script bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instruction<'a> {
    pub opcode: u16,
    #[serde(serialize_with = "serialize_hex")]
    pub operands: &'a [u8],
    /// Offset of the opcode inside the instruction region
    pub offset: usize,
}

fn serialize_hex<S: Serializer>(bytes: &&[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

impl<'a> Instruction<'a> {
    /// Bytes the instruction occupies in the stream
    pub fn size(&self) -> usize {
        2 + self.operands.len()
    }

    pub fn family(&self) -> OpcodeFamily {
        OpcodeFamily::of(self.opcode)
    }

    /// Length implied by the payload itself, which may be shorter than the table entry
    pub fn effective_len(&self) -> usize {
        self.family().encoded_len(self.size(), self.operands)
    }

    pub fn info(&self) -> Option<&'static OpcodeInfo> {
        opcode_info(self.opcode)
    }

    /// Selector of a `change_ui` instruction
    pub fn ui_selector(&self) -> Option<UiSelector> {
        match self.family() {
            OpcodeFamily::ChangeUi => self.operands.first().map(|&s| UiSelector::classify(s)),
            OpcodeFamily::Fixed => None,
        }
    }

    /// Whether rendered output should start a new block after this instruction
    pub fn is_break(&self) -> bool {
        is_terminator(self.opcode) || self.ui_selector().map_or(false, |s| s.is_break())
    }
}

/// Compute where the instruction starting at `cursor` ends
///
/// Returns `Ok(None)` once fewer than two bytes remain. Nothing but the length
/// table is consulted.
pub fn next_boundary(region: &[u8], cursor: usize, table: &OpcodeLengthTable) -> Result<Option<usize>> {
    let (hi, lo) = match region.get(cursor..cursor.saturating_add(2)) {
        Some(&[hi, lo]) => (hi, lo),
        _ => return Ok(None),
    };
    let opcode = u16::from_be_bytes([hi, lo]);

    let len = table
        .length_of(opcode)
        .ok_or(FormatError::InvalidOpcode { opcode, offset: cursor })?;

    let available = region.len() - cursor;
    if len > available {
        return Err(FormatError::TruncatedInstruction {
            opcode,
            offset: cursor,
            needed: len,
            available,
        }
        .into());
    }

    Ok(Some(cursor + len))
}

/// Walks an instruction region with a given length table
#[derive(Debug, Clone, Copy)]
pub struct InstructionDecoder<'t> {
    table: &'t OpcodeLengthTable,
}

impl<'t> InstructionDecoder<'t> {
    pub fn new(table: &'t OpcodeLengthTable) -> Self {
        Self { table }
    }

    /// Lazily decode `region`
    pub fn iter<'a>(&self, region: &'a [u8]) -> Instructions<'a, 't> {
        Instructions {
            region,
            cursor: 0,
            table: self.table,
            failed: false,
        }
    }

    /// Decode the whole region, failing on the first malformed instruction
    pub fn decode<'a>(&self, region: &'a [u8]) -> Result<Vec<Instruction<'a>>> {
        let instructions = self.iter(region).collect::<Result<Vec<_>>>()?;
        debug!(
            count = instructions.len(),
            bytes = region.len(),
            "decoded instruction stream"
        );
        Ok(instructions)
    }
}

/// Iterator over the instructions of a region
///
/// Zero bytes running to the end of the region are alignment padding and end
/// the stream. After an error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Instructions<'a, 't> {
    region: &'a [u8],
    cursor: usize,
    table: &'t OpcodeLengthTable,
    failed: bool,
}

impl<'a, 't> Iterator for Instructions<'a, 't> {
    type Item = Result<Instruction<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let rest = &self.region[self.cursor..];
        if rest.iter().all(|&b| b == 0) {
            return None;
        }

        match next_boundary(self.region, self.cursor, self.table) {
            Ok(Some(end)) => {
                let instruction = Instruction {
                    opcode: u16::from_be_bytes([self.region[self.cursor], self.region[self.cursor + 1]]),
                    operands: &self.region[self.cursor + 2..end],
                    offset: self.cursor,
                };
                self.cursor = end;
                Some(Ok(instruction))
            }
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Decode a complete instruction region
pub fn decode_instructions<'a>(region: &'a [u8], table: &OpcodeLengthTable) -> Result<Vec<Instruction<'a>>> {
    InstructionDecoder::new(table).decode(region)
}
