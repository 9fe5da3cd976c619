use gosize_pclntab::{FuncRecord, LineTable, PcValueTable, Version};
use tracing::warn;

use crate::package::package_name;
use crate::row::{Row, What};

/// Size in bytes of the fixed descriptor part charged per function: the
/// entry word plus the 4-byte fields of the generation.
fn fixed_header_size(table: &LineTable<'_>) -> i64 {
    let fields = match table.version() {
        Version::V12 => 8,
        Version::V116 => 9,
        Version::V120 => 10,
    };
    i64::from(table.ptr_size()) + fields * 4
}

/// Attributes every byte of the binary to a function and category.
///
/// Produces one row per non-empty category per function, in function table
/// order, followed by a single remainder row holding whatever the walk
/// could not explain. The row sizes always sum to `binary_size` exactly.
pub fn attribute(table: &LineTable<'_>, funcs: &[FuncRecord<'_>], binary_size: i64) -> Vec<Row> {
    let values = table.pc_value_table();
    let mut rows = Vec::new();
    let mut unaccounted = binary_size;

    for func in funcs {
        let package = package_name(func.name);
        let mut emit = |what: What, size: i64| {
            unaccounted -= size;
            if size == 0 {
                return;
            }
            rows.push(Row {
                name: func.name.to_owned(),
                package: package.to_owned(),
                what,
                size,
            });
        };

        emit(What::FixedHeader, fixed_header_size(table));
        // Alignment padding that may precede the funcdata pointers is not
        // modeled; the remainder row absorbs it.
        emit(
            What::FuncData,
            i64::from(table.ptr_size()) * i64::from(func.num_funcdata),
        );
        emit(What::PcSp, table_size(&values, func, func.off_pcsp));
        emit(What::PcFile, table_size(&values, func, func.off_pcfile));
        emit(What::PcLn, table_size(&values, func, func.off_pcln));
        for (index, offset) in func.pcdata_offsets.iter().enumerate() {
            // The 4 covers the offset slot the descriptor stores for the
            // table, present even when the table itself is absent.
            emit(
                What::PcData(index as u32),
                4 + table_size(&values, func, *offset),
            );
        }
        emit(What::Text, (func.end - func.entry) as i64);
        emit(What::FuncName, func.name.len() as i64 + 1);
    }

    rows.push(Row {
        name: String::new(),
        package: String::new(),
        what: What::Todo,
        size: unaccounted,
    });
    rows
}

/// Encoded size of one auxiliary table, downgrading undecodable tables to
/// absent: a table that cannot be walked must not fail the whole report.
fn table_size(values: &PcValueTable<'_>, func: &FuncRecord<'_>, offset: u32) -> i64 {
    match values.size(offset, func.entry, func.end) {
        Ok(size) => size as i64,
        Err(error) => {
            warn!(
                function = func.name,
                offset,
                error = %error,
                "unreadable pc-value table treated as absent"
            );
            0
        }
    }
}
