use std::collections::HashMap;
use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

use crate::row::{Row, What};

/// An error produced while rendering or diffing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing the rendered report failed.
    #[error("failed to write report")]
    Io(#[from] io::Error),
    /// The baseline file does not hold valid records.
    #[error("malformed baseline records")]
    Json(#[from] serde_json::Error),
}

/// Renders rows as SQL statements rebuilding and filling a `Bin` table,
/// wrapped in a single transaction.
pub fn write_sql<W: Write>(writer: &mut W, rows: &[Row]) -> Result<(), ReportError> {
    writeln!(writer, "DROP TABLE IF EXISTS Bin;")?;
    writeln!(
        writer,
        "CREATE TABLE Bin (Func varchar, Pkg varchar, What varchar, Size int64);"
    )?;
    writeln!(writer, "BEGIN TRANSACTION;")?;
    for row in rows {
        if row.what == What::Todo {
            writeln!(
                writer,
                "INSERT INTO Bin (What, Size) VALUES ('TODO', {});",
                row.size
            )?;
        } else {
            writeln!(
                writer,
                "INSERT INTO Bin VALUES ({}, {}, \"{}\", {});",
                sql_string(&row.name),
                sql_string(&row.package),
                row.what,
                row.size
            )?;
        }
    }
    writeln!(writer, "END TRANSACTION;")?;
    Ok(())
}

/// Renders rows as tab-separated lines.
pub fn write_tsv<W: Write>(writer: &mut W, rows: &[Row]) -> Result<(), ReportError> {
    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            row.name, row.package, row.what, row.size
        )?;
    }
    Ok(())
}

/// Renders rows as a JSON array of records, tab-indented.
pub fn write_json<W: Write>(writer: W, rows: &[Row]) -> Result<(), ReportError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    rows.serialize(&mut serializer)?;
    Ok(())
}

/// Reads records produced by [`write_json`].
pub fn read_baseline<R: io::Read>(reader: R) -> Result<Vec<Row>, ReportError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Computes the record-wise difference between a baseline and the current
/// report.
///
/// Records match by name, package and category. Only nonzero changes are
/// kept; records present only in the baseline count as fully dropped. The
/// result is sorted ascending by delta, so shrinkage comes first.
pub fn diff(base: &[Row], current: &[Row]) -> Vec<Row> {
    let mut remaining: HashMap<(&str, &str, What), i64> = base
        .iter()
        .map(|row| ((row.name.as_str(), row.package.as_str(), row.what), row.size))
        .collect();

    let mut rows = Vec::new();
    for row in current {
        let key = (row.name.as_str(), row.package.as_str(), row.what);
        let change = row.size - remaining.remove(&key).unwrap_or(0);
        if change != 0 {
            rows.push(Row {
                size: change,
                ..row.clone()
            });
        }
    }
    for ((name, package, what), size) in remaining {
        if size != 0 {
            rows.push(Row {
                name: name.to_owned(),
                package: package.to_owned(),
                what,
                size: -size,
            });
        }
    }

    rows.sort_by(|a, b| {
        (a.size, &a.name, &a.package, a.what).cmp(&(b.size, &b.name, &b.package, b.what))
    });
    rows
}

fn sql_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push_str("''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, package: &str, what: What, size: i64) -> Row {
        Row {
            name: name.to_owned(),
            package: package.to_owned(),
            what,
            size,
        }
    }

    #[test]
    fn test_sql_escaping() {
        let rows = vec![row("main.(*T).String", "ma'in", What::Text, 5)];
        let mut out = Vec::new();
        write_sql(&mut out, &rows).unwrap();
        let sql = String::from_utf8(out).unwrap();
        assert!(sql.contains("INSERT INTO Bin VALUES ('main.(*T).String', 'ma''in', \"text\", 5);"));
    }

    #[test]
    fn test_json_round_trip() {
        let rows = vec![
            row("main.main", "main", What::Text, 100),
            row("", "", What::Todo, 12),
        ];
        let mut out = Vec::new();
        write_json(&mut out, &rows).unwrap();
        let back = read_baseline(out.as_slice()).unwrap();
        assert_eq!(back, rows);
        assert!(diff(&back, &rows).is_empty());
    }

    #[test]
    fn test_diff() {
        let base = vec![row("main.main", "main", What::Text, 100)];
        let current = vec![
            row("main.main", "main", What::Text, 120),
            row("other.f", "other", What::Text, 50),
        ];
        assert_eq!(
            diff(&base, &current),
            vec![
                row("main.main", "main", What::Text, 20),
                row("other.f", "other", What::Text, 50),
            ]
        );
    }

    #[test]
    fn test_diff_dropped_entries_are_negative() {
        let base = vec![
            row("gone.f", "gone", What::Text, 70),
            row("main.main", "main", What::Text, 100),
        ];
        let current = vec![row("main.main", "main", What::Text, 90)];
        assert_eq!(
            diff(&base, &current),
            vec![
                row("gone.f", "gone", What::Text, -70),
                row("main.main", "main", What::Text, -10),
            ]
        );
    }
}
