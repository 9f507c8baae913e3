use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom, Write};

use serde::Serialize;
use tracing::debug;

use crate::bitio::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::symbols::SymbolTable;
use crate::tree::HuffmanTree;

const CHUNK: usize = 8192;

/// Sizes of one compress or decompress run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    /// Distinct byte values in the original data.
    pub symbols: usize,
}

impl Summary {
    /// Compressed size over original size, `None` for empty data.
    pub fn ratio(&self) -> Option<f64> {
        if self.original_bytes == 0 {
            return None;
        }
        Some(self.compressed_bytes as f64 / self.original_bytes as f64)
    }
}

/// Compress everything from the current position of `input` to its end.
///
/// Reads the input twice: once to count symbols, once to emit codes.
pub fn compress<R, W>(mut input: R, mut output: W) -> Result<Summary>
where
    R: Read + Seek,
    W: Write,
{
    let start = input.stream_position()?;
    let (mut table, length) = SymbolTable::scan(&mut input)?;
    debug!(symbols = table.len(), bytes = length, "counted symbols");

    let tree = HuffmanTree::build(&table);
    tree.assign_codes(&mut table)?;
    debug!(nodes = tree.len(), "assigned prefix codes");

    let header = Header::from_table(&table, length)?;
    header.write(&mut output)?;

    input.seek(SeekFrom::Start(start))?;
    let mut source = input.take(length);
    let mut bits = BitWriter::new(&mut output);
    let mut buf = [0u8; CHUNK];
    let mut consumed = 0u64;

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        for &byte in &buf[..n] {
            let record = table.get(byte).ok_or_else(changed_input)?;
            bits.write_code(record.code, record.code_length)?;
        }
        consumed += n as u64;
    }
    if consumed != length {
        return Err(changed_input());
    }

    let payload = bits.bytes_written() + u64::from(bits.pending_bits() > 0);
    bits.finish()?;
    debug!(header = header.encoded_len(), payload, "wrote compressed stream");

    Ok(Summary {
        original_bytes: length,
        compressed_bytes: header.encoded_len() + payload,
        symbols: table.len(),
    })
}

fn changed_input() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::InvalidData,
        "input changed between the counting and encoding passes",
    ))
}

/// Decompress a stream produced by [`compress`].
///
/// A completely empty stream decodes to nothing. Bytes after the last
/// decoded symbol are ignored.
pub fn decompress<R, W>(mut input: R, mut output: W) -> Result<Summary>
where
    R: BufRead,
    W: Write,
{
    if input.fill_buf()?.is_empty() {
        debug!("empty compressed stream");
        return Ok(Summary {
            original_bytes: 0,
            compressed_bytes: 0,
            symbols: 0,
        });
    }

    let header = Header::read(&mut input)?;
    let tree = header.rebuild_tree()?;
    let length = u64::from(header.original_length);
    debug!(
        symbols = header.entries.len(),
        bytes = length,
        nodes = tree.len(),
        "rebuilt code tree"
    );

    let mut pending = Vec::with_capacity(CHUNK);
    let mut payload = 0u64;

    match tree.root() {
        None => {}
        Some(root) => match tree.node(root).symbol {
            // One distinct symbol: the header alone says what to emit.
            Some(symbol) => {
                for _ in 0..length {
                    emit(&mut output, &mut pending, symbol)?;
                }
            }
            None => {
                let mut bits = BitReader::new(&mut input);
                let mut at = root;
                let mut decoded = 0u64;
                while decoded < length {
                    let bit = bits.read_bit()?.ok_or_else(|| {
                        Error::malformed(format!(
                            "payload ends after {decoded} of {length} symbols"
                        ))
                    })?;
                    at = tree.step(at, bit).ok_or_else(|| {
                        Error::malformed("payload walks off the code tree")
                    })?;
                    if let Some(symbol) = tree.node(at).symbol {
                        emit(&mut output, &mut pending, symbol)?;
                        decoded += 1;
                        at = root;
                    }
                }
                payload = bits.bytes_read();
            }
        },
    }

    output.write_all(&pending)?;
    output.flush()?;

    Ok(Summary {
        original_bytes: length,
        compressed_bytes: header.encoded_len() + payload,
        symbols: header.entries.len(),
    })
}

fn emit<W: Write>(output: &mut W, pending: &mut Vec<u8>, symbol: u8) -> io::Result<()> {
    pending.push(symbol);
    if pending.len() == CHUNK {
        output.write_all(pending)?;
        pending.clear();
    }
    Ok(())
}

/// Compress an in-memory buffer.
pub fn compress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    compress(Cursor::new(data), &mut out)?;
    Ok(out)
}

/// Decompress an in-memory buffer.
pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decompress(data, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8]) -> Vec<u8> {
        let packed = compress_bytes(data).unwrap();
        let unpacked = decompress_bytes(&packed).unwrap();
        assert_eq!(unpacked, data);
        packed
    }

    #[test]
    fn empty_input_gives_bare_header() {
        let packed = roundtrip(b"");
        assert_eq!(packed, vec![0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn empty_stream_decodes_to_nothing() {
        let mut out = Vec::new();
        let summary = decompress(&b""[..], &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(summary.original_bytes, 0);
        assert_eq!(summary.ratio(), None);
    }

    #[test]
    fn single_symbol_has_no_payload() {
        let packed = roundtrip(b"aaaa");
        assert_eq!(packed, vec![1, 0, 4, 0, 0, 0, b'a', 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn single_symbol_ignores_trailing_bytes() {
        let mut packed = compress_bytes(b"zzz").unwrap();
        packed.extend_from_slice(&[0xDE, 0xAD]);
        assert_eq!(decompress_bytes(&packed).unwrap(), b"zzz");
    }

    #[test]
    fn three_equal_symbols() {
        let packed = roundtrip(b"abcabcabc");
        let header = Header::read(&packed[..]).unwrap();
        assert_eq!(header.entries.len(), 3);
        assert_eq!(header.original_length, 9);
        // 15 payload bits round up to two bytes.
        assert_eq!(packed.len() as u64, header.encoded_len() + 2);
    }

    #[test]
    fn summary_reports_both_sides() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut packed = Vec::new();
        let written = compress(Cursor::new(&data[..]), &mut packed).unwrap();
        assert_eq!(written.original_bytes, data.len() as u64);
        assert_eq!(written.compressed_bytes, packed.len() as u64);

        let mut out = Vec::new();
        let read = decompress(&packed[..], &mut out).unwrap();
        assert_eq!(read, written);
        let ratio = read.ratio().unwrap();
        assert_eq!(ratio, packed.len() as f64 / data.len() as f64);
    }

    #[test]
    fn compress_starts_at_current_position() {
        let mut input = Cursor::new(b"skipHELLO".to_vec());
        input.set_position(4);
        let mut packed = Vec::new();
        compress(&mut input, &mut packed).unwrap();
        assert_eq!(decompress_bytes(&packed).unwrap(), b"HELLO");
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let packed = compress_bytes(b"abcdefghabcdefgh").unwrap();
        let cut = &packed[..packed.len() - 1];
        assert!(matches!(
            decompress_bytes(cut),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn incomplete_tree_is_malformed() {
        // One symbol behind a 1-bit code leaves the 0 branch empty.
        let packed = [1, 0, 1, 0, 0, 0, b'q', 1, 1, 0, 0, 0, 0, 0, 0, 0, 0x00];
        assert!(matches!(
            decompress_bytes(&packed),
            Err(Error::MalformedHeader(_))
        ));

        let ok = [1, 0, 2, 0, 0, 0, b'q', 1, 1, 0, 0, 0, 0, 0, 0, 0, 0xC0];
        assert_eq!(decompress_bytes(&ok).unwrap(), b"qq");
    }

    #[test]
    fn two_runs_are_independent() {
        let first = compress_bytes(b"ab").unwrap();
        let second = compress_bytes(b"ab").unwrap();
        assert_eq!(first, second);
    }
}
