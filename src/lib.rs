//! # huffpress
//!
//! Huffman compression of whole files.
//!
//! A compressed stream is a header holding the code of every distinct
//! byte value, followed by the bit-packed codes of the input. The decoder
//! rebuilds the code tree from the header alone.
//!
//! ```rust
//! let packed = huffpress::compress_bytes(b"abracadabra")?;
//! let unpacked = huffpress::decompress_bytes(&packed)?;
//! assert_eq!(unpacked, b"abracadabra");
//! # Ok::<(), huffpress::Error>(())
//! ```

pub mod bitio;
pub mod codec;
pub mod error;
pub mod header;
pub mod heap;
pub mod symbols;
pub mod tree;

pub use codec::{Summary, compress, compress_bytes, decompress, decompress_bytes};
pub use error::{Error, Result};
pub use header::{Header, HeaderEntry};
pub use symbols::{SymbolRecord, SymbolTable};
pub use tree::HuffmanTree;
