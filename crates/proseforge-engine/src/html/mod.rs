//! The HTML boundary: the persisted form of a document.
//!
//! HTML exists only at this edge. [`reader`] turns arbitrary markup into
//! the block tree and [`writer`] turns the tree back into a canonical
//! string; everything between the two works on blocks and runs, never on
//! tag soup.

pub mod reader;
pub mod writer;

pub use reader::{ReadError, read_document};
pub use writer::write_document;
