//! PAK sub-containers: an indexed bundle of byte blobs
//!
//! ```text
//! ┌──────────────────────┐
//! │ count (u32)          │
//! │ offsets (u32 x count)│ strictly ascending
//! ├──────────────────────┤
//! │ entry 0              │ offsets[0]..offsets[1]
//! │ ...                  │
//! │ entry count-1        │ offsets[count-1]..end of buffer
//! └──────────────────────┘
//! ```
//!
//! Most of the game's `.pak` files inside the WAD archives use this layout,
//! and pak entries nest freely.

use crate::error::{FormatError, Result};
use crate::script::read_u32_le;
use tracing::debug;

/// A decoded pak, borrowing its entries from the input buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pak<'a> {
    entries: Vec<&'a [u8]>,
}

impl<'a> Pak<'a> {
    /// Split `data` into its entries
    ///
    /// Every entry must be non-empty, start after the offset table and end
    /// where the next one starts (the last one at the end of the buffer).
    pub fn decode(data: &'a [u8]) -> Result<Self> {
        let count = read_u32_le(data, 0).ok_or(FormatError::Truncated {
            what: "pak count",
            needed: 4,
            available: data.len(),
        })? as usize;

        let table_end = count
            .checked_mul(4)
            .and_then(|n| n.checked_add(4))
            .filter(|&end| end <= data.len())
            .ok_or(FormatError::Truncated {
                what: "pak offset table",
                needed: count.saturating_mul(4).saturating_add(4),
                available: data.len(),
            })?;

        let mut offsets = Vec::with_capacity(count + 1);
        for i in 0..count {
            // In bounds: the table was checked above
            let offset = read_u32_le(data, 4 + 4 * i).unwrap_or_default() as usize;
            offsets.push(offset);
        }
        offsets.push(data.len());

        if let Some(&first) = offsets.first().filter(|_| count > 0) {
            if first < table_end {
                return Err(FormatError::OffsetOutOfRange {
                    what: "pak entry",
                    offset: first,
                    len: data.len(),
                }
                .into());
            }
        }

        let mut entries = Vec::with_capacity(count);
        for (index, pair) in offsets.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);
            if end <= start {
                return Err(FormatError::PakEntryBounds { index, start, end }.into());
            }
            entries.push(&data[start..end]);
        }

        debug!(entries = entries.len(), "decoded pak");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        self.entries.get(index).copied()
    }

    pub fn entries(&self) -> &[&'a [u8]] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.entries.iter().copied()
    }
}
