//! Provides support for reading the Go runtime's pclntab,
//! the PC/line table embedded in every Go binary.
//!
//! The pclntab is a single contiguous blob containing, for every function in
//! the program, a packed descriptor plus a set of varint-delta encoded
//! auxiliary tables. It is what the runtime itself uses to symbolize stack
//! traces, and it is self-contained: no DWARF or symbol table is needed to
//! walk it. See <https://golang.org/s/go12symtab> for the original format
//! description.
//!
//! # Functionality
//!
//! * Parse a pclntab blob with [`LineTable::parse`].
//! * Walk the per-function descriptors with [`LineTable::functions`],
//!   yielding one [`FuncRecord`] per function.
//! * Decode the varint-encoded auxiliary tables (pcsp, pcfile, pcln and the
//!   numbered pcdata tables) through [`PcValueTable`], including the exact
//!   number of encoded bytes each table occupies.
//! * Resolve program counters to the covering function with
//!   [`LineTable::func_for_pc`], and to file names and line numbers with
//!   [`LineTable::pc_to_file`], [`LineTable::pc_to_line`] and
//!   [`LineTable::line_to_pc`].
//!
//! # Structure of the table
//!
//! The blob starts with an 8-byte header: a 4-byte magic (which selects both
//! the byte order and the format generation), two zero bytes, the PC quantum
//! and the pointer width. Three generations are decoded here:
//!
//! * **1.2** (magic `0xFFFFFFFB`): a pointer-sized function count, then the
//!   function table (alternating entry PC and descriptor offset), then a
//!   4-byte offset to the file table. All descriptor, string and value-table
//!   offsets are relative to the start of the blob.
//! * **1.16** (magic `0xFFFFFFFA`): the header is followed by seven
//!   pointer-sized words giving the function and file counts and the offsets
//!   of the function name table, the compilation unit table, the file table,
//!   the value tables and the function data region. Offsets inside
//!   descriptors are relative to their respective regions.
//! * **1.20** (magic `0xFFFFFFF0`): like 1.16 with an additional
//!   pointer-sized `text start` word after the counts. Function table
//!   entries shrink to 4-byte pairs of text-relative entry offset and
//!   descriptor offset.
//!
//! Every auxiliary table is a sequence of (value delta, PC delta) varint
//! pairs terminated by a zero value delta; the value delta carries its sign
//! in the low bit, and the PC delta is scaled by the PC quantum.

#![warn(missing_docs)]

mod error;
mod funcs;
mod linetable;
mod lookup;
mod pcvalue;
mod raw;
mod read;

pub use error::{FormatError, FormatErrorKind};
pub use funcs::FuncRecord;
pub use linetable::{LineTable, Version};
pub use pcvalue::{PcValueTable, Step};
