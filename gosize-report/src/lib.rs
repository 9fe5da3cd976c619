//! Attributes every byte of a Go binary to a function and category.
//!
//! Works from a parsed [`LineTable`](gosize_pclntab::LineTable): for each
//! function the engine charges the fixed descriptor, the funcdata pointer
//! array, each varint-encoded auxiliary table, the machine code range and
//! the name string, and collects everything it cannot explain into a single
//! remainder row. The resulting rows render as SQL, TSV or JSON and can be
//! diffed against a JSON baseline for size regression tracking.

#![warn(missing_docs)]

mod attribution;
mod nameinfo;
mod nm;
mod output;
mod package;
mod row;

pub use attribution::attribute;
pub use nameinfo::{name_stats, NameStats};
pub use nm::symbol_package;
pub use output::{diff, read_baseline, write_json, write_sql, write_tsv, ReportError};
pub use package::package_name;
pub use row::{ParseWhatError, Row, What};
