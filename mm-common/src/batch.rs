//! Single-file, batch and merged ALE conversion
//!
//! Single conversion fails fast. Batch and merge skip any file that cannot be
//! converted, log the reason, and fail only when nothing succeeded.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::ale::{read_ale, AleOptions};
use crate::table::ExportTable;
use crate::{Error, Result};

/// One uploaded ALE file
#[derive(Debug, Clone)]
pub struct AleInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl AleInput {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// CSV text produced for one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvOutput {
    pub filename: String,
    pub content: String,
}

/// `<stem>.csv` for an uploaded filename
pub fn csv_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "export".to_string());
    format!("{}.csv", stem)
}

/// Convert one file, failing with [`Error::InvalidFile`] on an invalid result
pub fn convert_one(filename: &str, bytes: &[u8], options: AleOptions) -> Result<ExportTable> {
    let report = read_ale(bytes, options);
    if !report.is_valid() {
        return Err(Error::InvalidFile(format!(
            "{}: {}",
            filename,
            report.issues().join("; ")
        )));
    }
    report
        .into_table()
        .map(|t| t.to_export_table())
        .ok_or_else(|| Error::InvalidFile(filename.to_string()))
}

/// Convert every input independently into its own CSV
pub fn convert_batch(inputs: &[AleInput], options: AleOptions) -> Result<Vec<CsvOutput>> {
    let outputs: Vec<CsvOutput> = successful_tables(inputs, options)
        .map(|(input, table)| CsvOutput {
            filename: csv_filename(&input.filename),
            content: table.to_csv(),
        })
        .collect();

    if outputs.is_empty() {
        return Err(Error::EmptyBatch);
    }
    info!(
        files = inputs.len(),
        converted = outputs.len(),
        "ALE batch converted"
    );
    Ok(outputs)
}

/// Convert every input and concatenate the tables row-wise
pub fn merge(inputs: &[AleInput], options: AleOptions) -> Result<ExportTable> {
    let tables: Vec<ExportTable> = successful_tables(inputs, options)
        .map(|(_, table)| table)
        .collect();

    if tables.is_empty() {
        return Err(Error::EmptyBatch);
    }
    let merged = merge_tables(&tables);
    info!(
        files = inputs.len(),
        merged = tables.len(),
        rows = merged.row_count(),
        "ALE files merged"
    );
    Ok(merged)
}

/// Outer row-wise concatenation
///
/// The header is the union of all headers in first-seen order. Cells for
/// columns a table lacks are empty strings.
pub fn merge_tables(tables: &[ExportTable]) -> ExportTable {
    let mut header: Vec<String> = Vec::new();
    for table in tables {
        for name in &table.header {
            if !header.contains(name) {
                header.push(name.clone());
            }
        }
    }

    let mut merged = ExportTable::new(header);
    for table in tables {
        let positions: Vec<Option<usize>> = merged
            .header
            .iter()
            .map(|name| table.column_index(name))
            .collect();

        for row in &table.rows {
            let cells = positions
                .iter()
                .map(|pos| match pos {
                    Some(i) => row.get(*i).cloned().flatten(),
                    None => Some(String::new()),
                })
                .collect();
            merged.push_row(cells);
        }
    }
    merged
}

fn successful_tables<'a>(
    inputs: &'a [AleInput],
    options: AleOptions,
) -> impl Iterator<Item = (&'a AleInput, ExportTable)> + 'a {
    inputs.iter().filter_map(move |input| {
        match convert_one(&input.filename, &input.bytes, options) {
            Ok(table) => Some((input, table)),
            Err(e) => {
                warn!(file = %input.filename, error = %e, "Skipping ALE file");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ale(columns: &str, rows: &[&str]) -> Vec<u8> {
        let mut text = format!("Heading\nFIELD_DELIM\tTABS\n\nColumn\n{}\n\nData\n", columns);
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text.into_bytes()
    }

    #[test]
    fn test_csv_filename() {
        assert_eq!(csv_filename("day1.ale"), "day1.csv");
        assert_eq!(csv_filename("camera.a.ALE"), "camera.a.csv");
        assert_eq!(csv_filename(""), "export.csv");
    }

    #[test]
    fn test_convert_one_invalid_is_client_error() {
        let err = convert_one("bad.ale", b"not an ale file", AleOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidFile(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_batch_skips_failures() {
        let inputs = vec![
            AleInput::new("a.ale", ale("Name\tTape", &["clip1\tA001"])),
            AleInput::new("broken.ale", b"garbage".to_vec()),
            AleInput::new("c.ale", ale("Name\tTape", &["clip2\tA002", "clip3\tA002"])),
        ];

        let outputs = convert_batch(&inputs, AleOptions::default()).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].filename, "a.csv");
        assert_eq!(outputs[1].filename, "c.csv");
        assert_eq!(outputs[1].content, "Name,Tape\r\nclip2,A002\r\nclip3,A002\r\n");
    }

    #[test]
    fn test_batch_all_fail() {
        let inputs = vec![AleInput::new("x.ale", b"junk".to_vec())];
        assert!(matches!(
            convert_batch(&inputs, AleOptions::default()),
            Err(Error::EmptyBatch)
        ));
        assert!(matches!(merge(&inputs, AleOptions::default()), Err(Error::EmptyBatch)));
        assert!(matches!(convert_batch(&[], AleOptions::default()), Err(Error::EmptyBatch)));
    }

    #[test]
    fn test_merge_preserves_row_count_and_order() {
        let inputs = vec![
            AleInput::new("a.ale", ale("Name\tTape", &["a1\tA", "a2\tA"])),
            AleInput::new("bad.ale", b"junk".to_vec()),
            AleInput::new("b.ale", ale("Name\tTape", &["b1\tB", "b2\tB", "b3\tB"])),
        ];

        let merged = merge(&inputs, AleOptions::default()).unwrap();
        assert_eq!(merged.row_count(), 5);
        let names: Vec<_> = merged.rows.iter().map(|r| r[0].clone().unwrap()).collect();
        assert_eq!(names, vec!["a1", "a2", "b1", "b2", "b3"]);
    }

    #[test]
    fn test_merge_divergent_columns_fill_empty() {
        let inputs = vec![
            AleInput::new("a.ale", ale("Name\tTape", &["a1\tA"])),
            AleInput::new("b.ale", ale("Name\tScene", &["b1\t12"])),
        ];

        let merged = merge(&inputs, AleOptions::default()).unwrap();
        assert_eq!(merged.header, vec!["Name", "Tape", "Scene"]);
        assert_eq!(merged.rows[0][2], Some(String::new()));
        assert_eq!(merged.rows[1][1], Some(String::new()));
        assert_eq!(merged.to_csv(), "Name,Tape,Scene\r\na1,A,\r\nb1,,12\r\n");
    }

    #[test]
    fn test_check_tape_length_forwarded() {
        let long = format!("clip\t{}", "T".repeat(40));
        let inputs = vec![AleInput::new("long.ale", ale("Name\tTape", &[long.as_str()]))];

        assert!(convert_batch(&inputs, AleOptions::default()).is_err());
        let outputs = convert_batch(
            &inputs,
            AleOptions {
                check_tape_length: false,
            },
        )
        .unwrap();
        assert_eq!(outputs.len(), 1);
    }
}
