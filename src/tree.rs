//! Huffman tree stored as an arena of nodes addressed by index.
//!
//! The encoder builds the tree from symbol frequencies with the two-queue
//! method; the decoder rebuilds an equivalent tree from the codes stored
//! in the container header.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::{Error, Result};
use crate::heap::Heap;
use crate::symbols::{SymbolRecord, SymbolTable, by_frequency};

/// Longest prefix code the container can store.
pub const MAX_CODE_LENGTH: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Node {
    /// Sum of the frequencies below this node. Zero in rebuilt trees.
    pub weight: u64,
    /// Set on leaves only.
    pub symbol: Option<u8>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl Node {
    fn leaf(symbol: u8, weight: u64) -> Self {
        Node {
            weight,
            symbol: Some(symbol),
            left: None,
            right: None,
        }
    }

    fn internal(weight: u64, left: Option<NodeId>, right: Option<NodeId>) -> Self {
        Node {
            weight,
            symbol: None,
            left,
            right,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl HuffmanTree {
    /// Build the tree for `table`.
    ///
    /// Leaves come from a frequency heap; merged nodes go to a FIFO whose
    /// weights never decrease, so the two lowest candidates are always at
    /// the two heads. On equal weight the leaf is taken first. An empty
    /// table gives a tree without a root, a single symbol gives a lone leaf.
    pub fn build(table: &SymbolTable) -> Self {
        let mut tree = HuffmanTree {
            nodes: Vec::with_capacity(table.len().saturating_mul(2)),
            root: None,
        };
        let mut leaves = Heap::build(table.records().to_vec(), by_frequency);
        let mut merged: VecDeque<NodeId> = VecDeque::with_capacity(table.len());

        loop {
            let Some(left) = tree.take_lowest(&mut leaves, &mut merged) else {
                break;
            };
            let Some(right) = tree.take_lowest(&mut leaves, &mut merged) else {
                tree.root = Some(left);
                break;
            };
            let weight = tree.nodes[left.0].weight + tree.nodes[right.0].weight;
            let parent = tree.push(Node::internal(weight, Some(left), Some(right)));
            merged.push_back(parent);
        }

        tree
    }

    fn take_lowest(
        &mut self,
        leaves: &mut Heap<SymbolRecord>,
        merged: &mut VecDeque<NodeId>,
    ) -> Option<NodeId> {
        let leaf_first = match (leaves.peek(), merged.front()) {
            (Some(leaf), Some(node)) => leaf.frequency <= self.nodes[node.0].weight,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if leaf_first {
            let record = leaves.extract_min(by_frequency)?;
            Some(self.push(Node::leaf(record.symbol, record.frequency)))
        } else {
            merged.pop_front()
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes, leaves included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Follow one payload bit from `id`: `false` goes left, `true` goes right.
    pub fn step(&self, id: NodeId, bit: bool) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if bit { node.right } else { node.left }
    }

    /// Write every leaf's code and code length into `table`.
    ///
    /// Left edges append a 0 bit, right edges a 1 bit, and the first edge
    /// from the root lands in bit 0. Fails if any leaf sits deeper than
    /// [`MAX_CODE_LENGTH`].
    pub fn assign_codes(&self, table: &mut SymbolTable) -> Result<()> {
        match self.root {
            Some(root) => self.assign_from(root, 0, 0, table),
            None => Ok(()),
        }
    }

    fn assign_from(&self, id: NodeId, code: u64, depth: u8, table: &mut SymbolTable) -> Result<()> {
        let node = &self.nodes[id.0];
        if let Some(symbol) = node.symbol {
            if let Some(record) = table.get_mut(symbol) {
                record.code = code;
                record.code_length = depth;
                trace!(symbol, code, length = depth, "assigned code");
            }
            return Ok(());
        }

        if depth >= MAX_CODE_LENGTH {
            return Err(Error::CapacityExceeded {
                what: "prefix code length",
                limit: u64::from(MAX_CODE_LENGTH),
            });
        }
        if let Some(left) = node.left {
            self.assign_from(left, code, depth + 1, table)?;
        }
        if let Some(right) = node.right {
            self.assign_from(right, code | (1 << depth), depth + 1, table)?;
        }
        Ok(())
    }

    /// Attach a leaf for `symbol` at the end of the path spelled by `code`,
    /// creating internal nodes on the way. `length` must not exceed
    /// [`MAX_CODE_LENGTH`].
    pub fn insert_code(&mut self, symbol: u8, code: u64, length: u8) -> Result<()> {
        let mut at = match self.root {
            Some(root) => root,
            None => {
                let root = self.push(Node::internal(0, None, None));
                self.root = Some(root);
                root
            }
        };

        for i in 0..length {
            if let Some(owner) = self.nodes[at.0].symbol {
                return Err(Error::malformed(format!(
                    "code of symbol {symbol:#04x} runs through the leaf of symbol {owner:#04x}"
                )));
            }
            let bit = (code >> i) & 1 == 1;
            at = match self.step(at, bit) {
                Some(next) => next,
                None => {
                    let next = self.push(Node::internal(0, None, None));
                    let node = &mut self.nodes[at.0];
                    if bit {
                        node.right = Some(next);
                    } else {
                        node.left = Some(next);
                    }
                    next
                }
            };
        }

        let node = &mut self.nodes[at.0];
        if let Some(owner) = node.symbol {
            return Err(Error::malformed(format!(
                "symbols {owner:#04x} and {symbol:#04x} share a code"
            )));
        }
        if !node.is_leaf() {
            return Err(Error::malformed(format!(
                "code of symbol {symbol:#04x} is a prefix of another code"
            )));
        }
        node.symbol = Some(symbol);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(data: &[u8]) -> SymbolTable {
        SymbolTable::scan(data).unwrap().0
    }

    fn coded(data: &[u8]) -> SymbolTable {
        let mut table = table_of(data);
        HuffmanTree::build(&table).assign_codes(&mut table).unwrap();
        table
    }

    fn is_prefix(short: &SymbolRecord, long: &SymbolRecord) -> bool {
        short.code_length <= long.code_length
            && (0..short.code_length).all(|i| (short.code >> i) & 1 == (long.code >> i) & 1)
    }

    #[test]
    fn empty_table_has_no_root() {
        let mut table = table_of(b"");
        let tree = HuffmanTree::build(&table);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        tree.assign_codes(&mut table).unwrap();
    }

    #[test]
    fn single_symbol_is_a_lone_leaf() {
        let mut table = table_of(b"aaaa");
        let tree = HuffmanTree::build(&table);
        let root = tree.root().unwrap();
        assert!(tree.node(root).is_leaf());
        assert_eq!(tree.node(root).symbol, Some(b'a'));
        assert_eq!(tree.node(root).weight, 4);

        tree.assign_codes(&mut table).unwrap();
        assert_eq!(table.get(b'a').unwrap().code_length, 0);
    }

    #[test]
    fn equal_frequencies_prefer_leaves() {
        let table = coded(b"abcabcabc");
        let mut lengths: Vec<u8> = table.records().iter().map(|r| r.code_length).collect();
        lengths.sort();
        assert_eq!(lengths, vec![1, 2, 2]);

        let bits: u64 = table
            .records()
            .iter()
            .map(|r| r.frequency * u64::from(r.code_length))
            .sum();
        assert_eq!(bits, 15);
    }

    #[test]
    fn root_weight_is_total_frequency() {
        let table = table_of(b"mississippi river");
        let tree = HuffmanTree::build(&table);
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).weight, table.total());
        assert_eq!(tree.len(), 2 * table.len() - 1);
    }

    #[test]
    fn codes_are_prefix_free_and_complete() {
        let table = coded(b"this is an example of a huffman tree");
        let records = table.records();
        for (i, a) in records.iter().enumerate() {
            for (j, b) in records.iter().enumerate() {
                if i != j {
                    assert!(!is_prefix(a, b), "{:?} prefixes {:?}", a, b);
                }
            }
        }
        // A full binary tree satisfies Kraft's equality.
        let max = records.iter().map(|r| r.code_length).max().unwrap();
        let kraft: u64 = records.iter().map(|r| 1u64 << (max - r.code_length)).sum();
        assert_eq!(kraft, 1u64 << max);
    }

    #[test]
    fn rarer_symbols_never_get_shorter_codes() {
        let table = coded(b"aaaaaaaabbbbccd");
        let len = |s: u8| table.get(s).unwrap().code_length;
        assert!(len(b'a') <= len(b'b'));
        assert!(len(b'b') <= len(b'c'));
        assert!(len(b'c') <= len(b'd'));
    }

    fn fibonacci_table(n: usize) -> SymbolTable {
        let mut records = Vec::with_capacity(n);
        let (mut a, mut b) = (1u64, 1u64);
        for symbol in 0..n {
            records.push(SymbolRecord::new(symbol as u8, a));
            (a, b) = (b, a + b);
        }
        SymbolTable::from_records(records)
    }

    #[test]
    fn deepest_code_fits_exactly() {
        let mut table = fibonacci_table(65);
        HuffmanTree::build(&table).assign_codes(&mut table).unwrap();
        let max = table.records().iter().map(|r| r.code_length).max();
        assert_eq!(max, Some(MAX_CODE_LENGTH));
    }

    #[test]
    fn overlong_code_is_rejected() {
        let mut table = fibonacci_table(70);
        let err = HuffmanTree::build(&table).assign_codes(&mut table).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { limit: 64, .. }));
    }

    #[test]
    fn rebuilt_tree_matches_codes() {
        let table = coded(b"abracadabra");
        let mut tree = HuffmanTree::default();
        for r in table.records() {
            tree.insert_code(r.symbol, r.code, r.code_length).unwrap();
        }
        for r in table.records() {
            let mut at = tree.root().unwrap();
            for i in 0..r.code_length {
                at = tree.step(at, (r.code >> i) & 1 == 1).unwrap();
            }
            assert_eq!(tree.node(at).symbol, Some(r.symbol));
        }
        assert_eq!(tree.len(), 2 * table.len() - 1);
    }

    #[test]
    fn insert_rejects_code_through_leaf() {
        let mut tree = HuffmanTree::default();
        tree.insert_code(b'a', 0b0, 1).unwrap();
        let err = tree.insert_code(b'b', 0b10, 2).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn insert_rejects_prefix_of_existing_code() {
        let mut tree = HuffmanTree::default();
        tree.insert_code(b'a', 0b01, 2).unwrap();
        assert!(tree.insert_code(b'b', 0b1, 1).is_err());
    }

    #[test]
    fn insert_rejects_duplicate_code() {
        let mut tree = HuffmanTree::default();
        tree.insert_code(b'a', 0b11, 2).unwrap();
        assert!(tree.insert_code(b'b', 0b11, 2).is_err());
    }
}
