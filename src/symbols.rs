use std::io::{self, Read};

use crate::heap::Heap;

/// Number of distinct byte values.
pub const ALPHABET: usize = 256;

/// Frequency and prefix code of one byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRecord {
    pub symbol: u8,
    pub frequency: u64,
    /// Prefix code, bit 0 is the first bit emitted.
    pub code: u64,
    pub code_length: u8,
}

impl SymbolRecord {
    pub fn new(symbol: u8, frequency: u64) -> Self {
        SymbolRecord {
            symbol,
            frequency,
            code: 0,
            code_length: 0,
        }
    }
}

/// Heap ordering: lower frequency first.
pub fn by_frequency(a: &SymbolRecord, b: &SymbolRecord) -> bool {
    a.frequency < b.frequency
}

/// Heap ordering: lower byte value first.
pub fn by_symbol(a: &SymbolRecord, b: &SymbolRecord) -> bool {
    a.symbol < b.symbol
}

/// The distinct symbols of one input, kept in ascending symbol order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    records: Vec<SymbolRecord>,
}

impl SymbolTable {
    /// Count every byte of `reader`. Returns the table and the number of bytes read.
    pub fn scan<R: Read>(mut reader: R) -> io::Result<(Self, u64)> {
        let mut counts = [0u64; ALPHABET];
        let mut buf = [0u8; 8192];
        let mut total = 0u64;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for &byte in &buf[..n] {
                counts[byte as usize] += 1;
            }
            total += n as u64;
        }

        Ok((Self::from_counts(&counts), total))
    }

    /// Build from a full 256-entry count array, dropping unseen symbols.
    pub fn from_counts(counts: &[u64; ALPHABET]) -> Self {
        let records = counts
            .iter()
            .enumerate()
            .map(|(symbol, &frequency)| SymbolRecord::new(symbol as u8, frequency))
            .collect();
        let mut table = SymbolTable { records };
        table.compact();
        table
    }

    /// Build from records in any order. Zero-frequency records are dropped.
    pub fn from_records(records: Vec<SymbolRecord>) -> Self {
        let mut table = SymbolTable { records };
        table.compact();
        table.sort_by_symbol();
        table
    }

    fn compact(&mut self) {
        self.records.retain(|r| r.frequency > 0);
    }

    fn sort_by_symbol(&mut self) {
        let mut heap = Heap::build(std::mem::take(&mut self.records), by_symbol);
        heap.sort(by_symbol);
        self.records = heap.into_vec();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SymbolRecord] {
        &self.records
    }

    /// Sum of all frequencies.
    pub fn total(&self) -> u64 {
        self.records.iter().map(|r| r.frequency).sum()
    }

    pub fn get(&self, symbol: u8) -> Option<&SymbolRecord> {
        self.records
            .binary_search_by_key(&symbol, |r| r.symbol)
            .ok()
            .map(|i| &self.records[i])
    }

    pub(crate) fn get_mut(&mut self, symbol: u8) -> Option<&mut SymbolRecord> {
        match self.records.binary_search_by_key(&symbol, |r| r.symbol) {
            Ok(i) => Some(&mut self.records[i]),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_counts_and_compacts() {
        let (table, len) = SymbolTable::scan(&b"abracadabra"[..]).unwrap();
        assert_eq!(len, 11);
        assert_eq!(table.len(), 5);
        assert_eq!(table.total(), 11);

        let freqs: Vec<(u8, u64)> = table
            .records()
            .iter()
            .map(|r| (r.symbol, r.frequency))
            .collect();
        assert_eq!(
            freqs,
            vec![(b'a', 5), (b'b', 2), (b'c', 1), (b'd', 1), (b'r', 2)]
        );
    }

    #[test]
    fn scan_empty_input() {
        let (table, len) = SymbolTable::scan(io::empty()).unwrap();
        assert_eq!(len, 0);
        assert!(table.is_empty());
    }

    #[test]
    fn scan_reads_past_buffer_size() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 3) as u8).collect();
        let (table, len) = SymbolTable::scan(&data[..]).unwrap();
        assert_eq!(len, 20_000);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0).unwrap().frequency, 6667);
        assert_eq!(table.get(2).unwrap().frequency, 6666);
    }

    #[test]
    fn every_byte_value() {
        let data: Vec<u8> = (0..=255u8).collect();
        let (table, _) = SymbolTable::scan(&data[..]).unwrap();
        assert_eq!(table.len(), ALPHABET);
        assert!(table.records().iter().all(|r| r.frequency == 1));
    }

    #[test]
    fn from_records_sorts_by_symbol() {
        let table = SymbolTable::from_records(vec![
            SymbolRecord::new(b'z', 1),
            SymbolRecord::new(b'a', 4),
            SymbolRecord::new(b'q', 0),
            SymbolRecord::new(b'm', 2),
        ]);
        let symbols: Vec<u8> = table.records().iter().map(|r| r.symbol).collect();
        assert_eq!(symbols, vec![b'a', b'm', b'z']);
        assert!(table.get(b'q').is_none());
        assert_eq!(table.get(b'm').unwrap().frequency, 2);
    }
}
