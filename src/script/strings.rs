use crate::error::{FormatError, Result};
use crate::script::read_u32_le;
use serde::Serialize;
use tracing::debug;

/// UTF-16LE byte-order mark, present in front of most strings
const BOM: [u8; 2] = [0xFF, 0xFE];

/// Strings referenced by index from `text` instructions
///
/// Any malformed entry fails the whole table; there are no placeholder strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StringTable {
    strings: Vec<String>,
}

impl StringTable {
    /// Parse a string table region: `count`, `count` offsets, then the strings
    pub fn parse(region: &[u8]) -> Result<Self> {
        let count = read_u32_le(region, 0).ok_or(FormatError::Truncated {
            what: "string table",
            needed: 4,
            available: region.len(),
        })? as usize;

        let needed = count
            .checked_mul(4)
            .and_then(|n| n.checked_add(4))
            .unwrap_or(usize::MAX);
        if region.len() < needed {
            return Err(FormatError::Truncated {
                what: "string offset table",
                needed,
                available: region.len(),
            }
            .into());
        }

        let mut strings = Vec::with_capacity(count);
        for index in 0..count {
            // In bounds: checked against `needed` above
            let offset = read_u32_le(region, 4 + index * 4).unwrap_or(u32::MAX) as usize;
            strings.push(decode_utf16_string(region, offset, index)?);
        }

        debug!(count, "parsed string table");
        Ok(Self { strings })
    }

    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strings: strings.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}

/// Null-terminated UTF-16LE string at `offset`, with an optional leading BOM
fn decode_utf16_string(region: &[u8], offset: usize, index: usize) -> Result<String> {
    let bad_string = || FormatError::BadString { index, offset };

    let mut data = region.get(offset..).ok_or_else(bad_string)?;
    if data.starts_with(&BOM) {
        data = &data[2..];
    }

    let mut code_units = Vec::new();
    loop {
        let unit = match data {
            [lo, hi, rest @ ..] => {
                data = rest;
                u16::from_le_bytes([*lo, *hi])
            }
            _ => return Err(bad_string().into()),
        };
        if unit == 0 {
            break;
        }
        code_units.push(unit);
    }

    String::from_utf16(&code_units).map_err(|_| FormatError::InvalidUtf16 { index }.into())
}
