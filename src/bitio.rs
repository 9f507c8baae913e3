//! Bit-level writer and reader over byte streams.
//!
//! Bits fill each byte from the most significant end. Each writer and
//! reader owns its accumulator, so independent runs never share state.

use std::io::{self, Read, Write};

pub struct BitWriter<W: Write> {
    inner: W,
    buffer: u8,
    used: u8,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        BitWriter {
            inner,
            buffer: 0,
            used: 0,
            bytes_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.buffer = (self.buffer << 1) | u8::from(bit);
        self.used += 1;
        if self.used == 8 {
            self.flush_byte()?;
        }
        Ok(())
    }

    /// Append the low `length` bits of `code`, bit 0 first.
    pub fn write_code(&mut self, code: u64, length: u8) -> io::Result<()> {
        for i in 0..length {
            self.write_bit((code >> i) & 1 == 1)?;
        }
        Ok(())
    }

    fn flush_byte(&mut self) -> io::Result<()> {
        self.inner.write_all(&[self.buffer])?;
        self.bytes_written += 1;
        self.buffer = 0;
        self.used = 0;
        Ok(())
    }

    /// Bits waiting in the accumulator.
    pub fn pending_bits(&self) -> u8 {
        self.used
    }

    /// Whole bytes handed to the inner writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Pad the last partial byte with zero bits, write it, and return the
    /// inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.used > 0 {
            self.buffer <<= 8 - self.used;
            self.flush_byte()?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

pub struct BitReader<R: Read> {
    inner: R,
    buffer: u8,
    remaining: u8,
    bytes_read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        BitReader {
            inner,
            buffer: 0,
            remaining: 0,
            bytes_read: 0,
        }
    }

    /// Next bit of the stream, or `None` once the stream is exhausted.
    pub fn read_bit(&mut self) -> io::Result<Option<bool>> {
        if self.remaining == 0 {
            let mut byte = [0u8; 1];
            loop {
                match self.inner.read(&mut byte) {
                    Ok(0) => return Ok(None),
                    Ok(_) => break,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
            self.buffer = byte[0];
            self.remaining = 8;
            self.bytes_read += 1;
        }
        self.remaining -= 1;
        Ok(Some((self.buffer >> self.remaining) & 1 == 1))
    }

    /// Bytes pulled from the inner reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
