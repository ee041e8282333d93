//! Opcode tables for LIN bytecode
//!
//! Every instruction starts with the prefix byte `0x70` followed by an opcode
//! byte. The only way to find the next instruction is the per-opcode length
//! table below, so it is kept exactly as the engine ships it.

use crate::error::{FormatError, Result};

/// First byte of every instruction
pub const OPCODE_PREFIX: u8 = 0x70;

/// Lowest valid 16-bit opcode
pub const OPCODE_BASE: u16 = 0x7000;

/// Number of entries in the length table
pub const OPCODE_COUNT: usize = 77;

/// Highest valid table key
pub const MAX_OPCODE_KEY: usize = OPCODE_COUNT - 1;

/// The opcode whose payload depends on a selector byte
pub const CHANGE_UI: u16 = 0x7025;

/// Total instruction length, opcode bytes included, indexed by `opcode - 0x7000`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeLengthTable {
    lengths: [u8; OPCODE_COUNT],
}

impl OpcodeLengthTable {
    /// Table of the PC release (argument lengths at 0xa72980, plus the two opcode bytes)
    pub const STANDARD: OpcodeLengthTable = OpcodeLengthTable {
        lengths: [
            4, 6, 4, 3, 6, 4, 10, 7, // 0x00
            7, 5, 5, 4, 4, 5, 4, 5, // 0x08
            5, 6, 4, 4, 8, 6, 4, 16, // 0x10
            16, 7, 2, 7, 2, 2, 7, 9, // 0x18
            7, 3, 5, 7, 6, 4, 5, 3, // 0x20
            6, 15, 14, 3, 4, 14, 7, 4, // 0x28
            4, 2, 3, 6, 5, 4, 3, 5, // 0x30
            4, 4, 6, 4, 6, 7, 4, 2, // 0x38
            2, 2, 2, 2, 2, 2, 2, 2, // 0x40
            2, 2, 2, 2, 2, // 0x48
        ],
    };

    /// Build a table, rejecting entries shorter than the opcode itself
    pub fn new(lengths: [u8; OPCODE_COUNT]) -> Result<Self> {
        if let Some((key, &len)) = lengths.iter().enumerate().find(|(_, len)| **len < 2) {
            return Err(FormatError::InvalidTableEntry { key, len }.into());
        }
        Ok(Self { lengths })
    }

    /// Copy of the table with one entry replaced
    pub fn with_entry(self, key: usize, len: u8) -> Result<Self> {
        let mut lengths = self.lengths;
        match lengths.get_mut(key) {
            Some(entry) => *entry = len,
            None => return Err(FormatError::InvalidTableEntry { key, len }.into()),
        }
        Self::new(lengths)
    }

    /// Table key of an opcode, if it is inside the table
    pub fn key(opcode: u16) -> Option<usize> {
        opcode
            .checked_sub(OPCODE_BASE)
            .map(usize::from)
            .filter(|&key| key <= MAX_OPCODE_KEY)
    }

    pub fn get(&self, key: usize) -> Option<usize> {
        self.lengths.get(key).map(|&len| len as usize)
    }

    /// Total encoded length of `opcode`
    pub fn length_of(&self, opcode: u16) -> Option<usize> {
        Self::key(opcode).and_then(|key| self.get(key))
    }

    pub fn entries(&self) -> &[u8; OPCODE_COUNT] {
        &self.lengths
    }
}

impl Default for OpcodeLengthTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// How an opcode's true encoded length is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeFamily {
    /// The table entry is the length
    Fixed,
    /// `0x7025`: the first operand byte selects the payload layout
    ChangeUi,
}

impl OpcodeFamily {
    pub fn of(opcode: u16) -> Self {
        if opcode == CHANGE_UI {
            OpcodeFamily::ChangeUi
        } else {
            OpcodeFamily::Fixed
        }
    }

    /// Length actually consumed by the instruction, opcode bytes included
    ///
    /// `table_len` is the flat table entry, which for selector-driven opcodes is
    /// the longest encoding.
    pub fn encoded_len(self, table_len: usize, operands: &[u8]) -> usize {
        match self {
            OpcodeFamily::Fixed => table_len,
            OpcodeFamily::ChangeUi => match operands.first() {
                Some(&selector) => 3 + UiSelector::classify(selector).value_len(),
                None => table_len,
            },
        }
    }
}

/// Selector byte of a `change_ui` instruction
///
/// The engine reads the selector only to decide whether its look-ahead stops
/// at this instruction. No selector changes how many bytes follow: every class,
/// unrecognized ones included, carries exactly one value byte, so the derived
/// length of a `change_ui` is always the flat table entry of 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiSelector {
    /// `0x09`
    Literal,
    /// `0x10`
    Sentinel,
    /// `0x12..=0x14`
    LowGroup(u8),
    /// `0x1f..=0x23`
    HighGroup(u8),
    /// `0x25`
    Marker,
    Other(u8),
}

impl UiSelector {
    pub fn classify(selector: u8) -> Self {
        match selector {
            0x09 => UiSelector::Literal,
            0x10 => UiSelector::Sentinel,
            0x12..=0x14 => UiSelector::LowGroup(selector),
            0x1f..=0x23 => UiSelector::HighGroup(selector),
            0x25 => UiSelector::Marker,
            other => UiSelector::Other(other),
        }
    }

    /// Bytes following the selector; one for every class
    pub fn value_len(self) -> usize {
        1
    }

    /// Whether the engine's look-ahead stops at this selector
    pub fn is_break(self) -> bool {
        matches!(
            self,
            UiSelector::Sentinel
                | UiSelector::LowGroup(_)
                | UiSelector::HighGroup(_)
                | UiSelector::Marker
        )
    }
}

/// Control opcodes at which the engine's look-ahead stops
pub fn is_terminator(opcode: u16) -> bool {
    matches!(
        opcode,
        0x7005
            | 0x701A..=0x701C
            | 0x702B
            | 0x7032
            | 0x7035
            | 0x703B
            | 0x7046..=0x704A
            | 0x704D
    )
}

/// Layout of one operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    U8,
    U16Le,
    U16Be,
    /// Big-endian u16 index into the string table
    StringIndex,
}

impl OperandKind {
    pub fn size(self) -> usize {
        match self {
            OperandKind::U8 => 1,
            OperandKind::U16Le | OperandKind::U16Be | OperandKind::StringIndex => 2,
        }
    }
}

/// Mnemonic and operand schema of a documented opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub opcode: u16,
    pub mnemonic: &'static str,
    pub operands: &'static [OperandKind],
}

impl OpcodeInfo {
    /// Sum of the operand sizes
    pub fn operand_len(&self) -> usize {
        self.operands.iter().map(|kind| kind.size()).sum()
    }
}

use OperandKind::*;

/// Opcodes whose meaning is known; everything else is rendered raw
pub const KNOWN_OPCODES: &[OpcodeInfo] = &[
    OpcodeInfo { opcode: 0x7000, mnemonic: "text_count", operands: &[U16Le] },
    OpcodeInfo { opcode: 0x7002, mnemonic: "text", operands: &[StringIndex] },
    OpcodeInfo { opcode: 0x7003, mnemonic: "format", operands: &[U8] },
    OpcodeInfo { opcode: 0x7025, mnemonic: "change_ui", operands: &[U8, U8] },
    OpcodeInfo { opcode: 0x702C, mnemonic: "end_of_jump", operands: &[U16Be] },
    OpcodeInfo { opcode: 0x703B, mnemonic: "start_of_jump", operands: &[U16Be] },
    OpcodeInfo { opcode: 0x704B, mnemonic: "wait_input", operands: &[] },
    OpcodeInfo { opcode: 0x704C, mnemonic: "wait_frame", operands: &[] },
];

pub fn opcode_info(opcode: u16) -> Option<&'static OpcodeInfo> {
    KNOWN_OPCODES.iter().find(|info| info.opcode == opcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entry_covers_the_opcode() {
        for key in 0..=MAX_OPCODE_KEY {
            assert!(OpcodeLengthTable::STANDARD.get(key).unwrap() >= 2, "key {:#x}", key);
        }
        assert!(OpcodeLengthTable::new(*OpcodeLengthTable::STANDARD.entries()).is_ok());
    }

    #[test]
    fn test_table_spot_checks() {
        let table = OpcodeLengthTable::STANDARD;
        assert_eq!(table.length_of(0x7000), Some(4));
        assert_eq!(table.length_of(0x7006), Some(10));
        assert_eq!(table.length_of(0x7017), Some(16));
        assert_eq!(table.length_of(0x701A), Some(2));
        assert_eq!(table.length_of(0x7029), Some(15));
        assert_eq!(table.length_of(0x704C), Some(2));
        assert_eq!(table.length_of(0x704D), None);
        assert_eq!(table.length_of(0x6FFF), None);
    }

    #[test]
    fn test_key_bounds() {
        assert_eq!(OpcodeLengthTable::key(0x7000), Some(0));
        assert_eq!(OpcodeLengthTable::key(0x704C), Some(0x4C));
        assert_eq!(OpcodeLengthTable::key(0x704D), None);
        assert_eq!(OpcodeLengthTable::key(0x0070), None);
    }

    #[test]
    fn test_short_entries_rejected() {
        let err = OpcodeLengthTable::STANDARD.with_entry(0x10, 1).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ShslError::Format(FormatError::InvalidTableEntry { key: 0x10, len: 1 })
        ));
        assert!(OpcodeLengthTable::STANDARD.with_entry(OPCODE_COUNT, 4).is_err());

        let patched = OpcodeLengthTable::STANDARD.with_entry(0x1A, 4).unwrap();
        assert_eq!(patched.length_of(0x701A), Some(4));
    }

    #[test]
    fn test_schemas_match_table() {
        for info in KNOWN_OPCODES {
            let len = OpcodeLengthTable::STANDARD.length_of(info.opcode).unwrap();
            assert_eq!(info.operand_len() + 2, len, "{}", info.mnemonic);
        }
    }

    #[test]
    fn test_change_ui_derived_length() {
        let table_len = OpcodeLengthTable::STANDARD.length_of(CHANGE_UI).unwrap();
        assert_eq!(table_len, 4);

        // One representative per selector class, unknown selectors included
        let cases = [
            (0x09, UiSelector::Literal),
            (0x10, UiSelector::Sentinel),
            (0x12, UiSelector::LowGroup(0x12)),
            (0x14, UiSelector::LowGroup(0x14)),
            (0x1f, UiSelector::HighGroup(0x1f)),
            (0x23, UiSelector::HighGroup(0x23)),
            (0x25, UiSelector::Marker),
            (0x00, UiSelector::Other(0x00)),
            (0x11, UiSelector::Other(0x11)),
            (0xff, UiSelector::Other(0xff)),
        ];
        for (selector, class) in cases {
            assert_eq!(UiSelector::classify(selector), class);
            assert_eq!(class.value_len(), 1, "selector {:#x}", selector);
            assert_eq!(
                OpcodeFamily::ChangeUi.encoded_len(table_len, &[selector, 7]),
                4,
                "selector {:#x}",
                selector
            );
        }

        // Without a selector byte there is nothing to derive from
        assert_eq!(OpcodeFamily::ChangeUi.encoded_len(table_len, &[]), table_len);
        assert_eq!(OpcodeFamily::ChangeUi.encoded_len(9, &[]), 9);
    }

    #[test]
    fn test_opcode_family() {
        assert_eq!(OpcodeFamily::of(CHANGE_UI), OpcodeFamily::ChangeUi);
        assert_eq!(OpcodeFamily::of(0x7002), OpcodeFamily::Fixed);
        assert_eq!(OpcodeFamily::Fixed.encoded_len(6, &[]), 6);
        assert_eq!(OpcodeFamily::Fixed.encoded_len(6, &[0x25]), 6);
    }

    #[test]
    fn test_selector_classes() {
        assert_eq!(UiSelector::classify(0x09), UiSelector::Literal);
        assert_eq!(UiSelector::classify(0x10), UiSelector::Sentinel);
        assert_eq!(UiSelector::classify(0x13), UiSelector::LowGroup(0x13));
        assert_eq!(UiSelector::classify(0x21), UiSelector::HighGroup(0x21));
        assert_eq!(UiSelector::classify(0x25), UiSelector::Marker);
        assert_eq!(UiSelector::classify(0x11), UiSelector::Other(0x11));

        assert!(!UiSelector::Literal.is_break());
        assert!(UiSelector::Sentinel.is_break());
        assert!(!UiSelector::Other(0x24).is_break());
    }

    #[test]
    fn test_terminators() {
        let count = (0x7000..=0x704D).filter(|&op| is_terminator(op)).count();
        assert_eq!(count, 14);
        assert!(is_terminator(0x702B));
        assert!(is_terminator(0x703B));
        assert!(!is_terminator(0x701D));
        assert!(!is_terminator(0x7002));
    }
}
