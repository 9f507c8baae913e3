//! Container header: symbol count, original length and the code table.
//!
//! ```text
//! [symbol count: u16][original length: u32]
//! per symbol: [symbol: u8][code length: u8][code: u64]
//! ```
//!
//! All integers are little-endian. Only the low `code length` bits of a
//! code may be set.

use std::io::{self, Read, Write};

use bitstream_io::{ByteRead, ByteReader, ByteWrite, ByteWriter, LittleEndian};

use crate::error::{Error, Result};
use crate::symbols::{ALPHABET, SymbolTable};
use crate::tree::{HuffmanTree, MAX_CODE_LENGTH};

/// Size of the count and length fields.
pub const FIXED_BYTES: u64 = 6;
/// Size of one code table entry.
pub const ENTRY_BYTES: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEntry {
    pub symbol: u8,
    pub code_length: u8,
    pub code: u64,
}

impl HeaderEntry {
    /// The code as '0'/'1' characters in emission order.
    pub fn bit_string(&self) -> String {
        (0..self.code_length)
            .map(|i| if (self.code >> i) & 1 == 1 { '1' } else { '0' })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub original_length: u32,
    pub entries: Vec<HeaderEntry>,
}

impl Header {
    /// Describe a coded table. Fails if `original_length` does not fit the length field.
    pub fn from_table(table: &SymbolTable, original_length: u64) -> Result<Self> {
        let original_length =
            u32::try_from(original_length).map_err(|_| Error::CapacityExceeded {
                what: "input length",
                limit: u64::from(u32::MAX),
            })?;
        let entries = table
            .records()
            .iter()
            .map(|r| HeaderEntry {
                symbol: r.symbol,
                code_length: r.code_length,
                code: r.code,
            })
            .collect();
        Ok(Header {
            original_length,
            entries,
        })
    }

    /// Bytes taken by the serialized header.
    pub fn encoded_len(&self) -> u64 {
        FIXED_BYTES + ENTRY_BYTES * self.entries.len() as u64
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let count = u16::try_from(self.entries.len())
            .ok()
            .filter(|&n| usize::from(n) <= ALPHABET)
            .ok_or(Error::CapacityExceeded {
                what: "symbol count",
                limit: ALPHABET as u64,
            })?;

        let mut out = ByteWriter::endian(writer, LittleEndian);
        out.write::<u16>(count)?;
        out.write::<u32>(self.original_length)?;
        for entry in &self.entries {
            out.write::<u8>(entry.symbol)?;
            out.write::<u8>(entry.code_length)?;
            out.write::<u64>(entry.code)?;
        }
        Ok(())
    }

    /// Read and validate a header. Does not touch the payload.
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let mut input = ByteReader::endian(reader, LittleEndian);

        let count: u16 = input.read().map_err(truncated)?;
        if usize::from(count) > ALPHABET {
            return Err(Error::malformed(format!(
                "{count} symbols declared, at most {ALPHABET} exist"
            )));
        }
        let original_length: u32 = input.read().map_err(truncated)?;
        if count == 0 && original_length > 0 {
            return Err(Error::malformed(format!(
                "no symbols declared for {original_length} bytes of output"
            )));
        }

        let mut seen = [false; ALPHABET];
        let mut entries = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let symbol: u8 = input.read().map_err(truncated)?;
            let code_length: u8 = input.read().map_err(truncated)?;
            let code: u64 = input.read().map_err(truncated)?;

            if code_length > MAX_CODE_LENGTH {
                return Err(Error::malformed(format!(
                    "symbol {symbol:#04x} has a {code_length}-bit code"
                )));
            }
            if code_length < MAX_CODE_LENGTH && code >> code_length != 0 {
                return Err(Error::malformed(format!(
                    "code of symbol {symbol:#04x} has bits set above its length"
                )));
            }
            if std::mem::replace(&mut seen[usize::from(symbol)], true) {
                return Err(Error::malformed(format!(
                    "symbol {symbol:#04x} declared twice"
                )));
            }
            entries.push(HeaderEntry {
                symbol,
                code_length,
                code,
            });
        }

        Ok(Header {
            original_length,
            entries,
        })
    }

    /// Rebuild the decoding tree from the stored codes alone.
    pub fn rebuild_tree(&self) -> Result<HuffmanTree> {
        let mut tree = HuffmanTree::default();
        for entry in &self.entries {
            tree.insert_code(entry.symbol, entry.code, entry.code_length)?;
        }
        Ok(tree)
    }
}

fn truncated(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::malformed("header ends early")
    } else {
        Error::Io(e)
    }
}
