//! Avid Log Exchange (ALE) reader
//!
//! An ALE file is tab-delimited text in three sections:
//!
//! ```text
//! Heading
//! FIELD_DELIM	TABS
//! VIDEO_FORMAT	1080
//! FPS	25
//!
//! Column
//! Name	Tape	Start	End
//!
//! Data
//! A001C001	A001	01:00:00:00	01:00:10:00
//! ```
//!
//! Reading never fails. Structural and content problems are collected as
//! issues, and a report with any issue withholds its table.

use serde::Serialize;

use crate::table::ExportTable;
use crate::text::decode_text;
pub use crate::text::normalize_line_endings;

/// Longest `Tape` value accepted when tape length checking is on
pub const MAX_TAPE_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AleOptions {
    /// Reject `Tape` values longer than [`MAX_TAPE_LENGTH`]
    pub check_tape_length: bool,
}

impl Default for AleOptions {
    fn default() -> Self {
        Self {
            check_tape_length: true,
        }
    }
}

/// Parsed ALE content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AleTable {
    pub heading: Vec<(String, String)>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl AleTable {
    /// Heading value by key (case-insensitive)
    pub fn heading_value(&self, key: &str) -> Option<&str> {
        self.heading
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn to_export_table(&self) -> ExportTable {
        let mut table = ExportTable::new(self.columns.iter().cloned());
        for row in &self.rows {
            table.push_row(row.iter().cloned().map(Some).collect());
        }
        table
    }
}

/// Outcome of reading one ALE file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AleReport {
    table: Option<AleTable>,
    issues: Vec<String>,
}

impl AleReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// The table, present only for a valid report
    pub fn table(&self) -> Option<&AleTable> {
        self.table.as_ref()
    }

    pub fn into_table(self) -> Option<AleTable> {
        self.table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Heading,
    Column,
    Data,
}

impl Section {
    fn from_keyword(line: &str) -> Option<Self> {
        match line.to_ascii_lowercase().as_str() {
            "heading" => Some(Section::Heading),
            "column" => Some(Section::Column),
            "data" => Some(Section::Data),
            _ => None,
        }
    }
}

/// Read ALE bytes
///
/// Line endings are normalized first, then text is decoded as UTF-8 with a
/// Latin-1 fallback.
pub fn read_ale(bytes: &[u8], options: AleOptions) -> AleReport {
    let bytes = normalize_line_endings(bytes);
    parse_ale(&decode_text(&bytes), options)
}

/// Read ALE text
pub fn parse_ale(input: &str, options: AleOptions) -> AleReport {
    let mut section = Section::Preamble;
    let mut heading = Vec::new();
    let mut columns: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut saw_data = false;
    let mut issues = Vec::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        if raw_line.trim().is_empty() {
            continue;
        }

        // Data runs to the end of the file; keywords there are cell values
        if section != Section::Data {
            if let Some(next) = Section::from_keyword(raw_line.trim()) {
                section = next;
                if next == Section::Data {
                    saw_data = true;
                }
                continue;
            }
        }

        match section {
            Section::Preamble => {
                issues.push(format!("line {}: content before Heading section", line_no));
            }
            Section::Heading => {
                let (key, value) = raw_line.split_once('\t').unwrap_or((raw_line, ""));
                heading.push((key.trim().to_string(), value.trim().to_string()));
            }
            Section::Column => {
                if columns.is_some() {
                    issues.push(format!("line {}: more than one column line", line_no));
                    continue;
                }
                let mut names: Vec<String> =
                    raw_line.split('\t').map(|s| s.trim().to_string()).collect();
                while names.last().is_some_and(|n| n.is_empty()) {
                    names.pop();
                }
                columns = Some(names);
            }
            Section::Data => {
                rows.push(raw_line.split('\t').map(str::to_string).collect());
            }
        }
    }

    let columns = match columns {
        Some(c) => c,
        None => {
            issues.push("missing Column section".to_string());
            Vec::new()
        }
    };
    if !saw_data {
        issues.push("missing Data section".to_string());
    }
    if columns.is_empty() {
        issues.push("no columns defined".to_string());
    }
    if columns.iter().any(String::is_empty) {
        issues.push("empty column name".to_string());
    }
    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            issues.push(format!("duplicate column '{}'", name));
        }
    }

    let tape_col = columns.iter().position(|c| c.eq_ignore_ascii_case("tape"));

    for (row_idx, row) in rows.iter_mut().enumerate() {
        while row.len() > columns.len() && row.last().is_some_and(|c| c.is_empty()) {
            row.pop();
        }
        if row.len() > columns.len() {
            issues.push(format!(
                "data row {}: {} fields for {} columns",
                row_idx + 1,
                row.len(),
                columns.len()
            ));
            continue;
        }
        row.resize(columns.len(), String::new());

        if options.check_tape_length {
            if let Some(tape) = tape_col.map(|i| &row[i]) {
                if tape.chars().count() > MAX_TAPE_LENGTH {
                    issues.push(format!(
                        "data row {}: Tape '{}' exceeds {} characters",
                        row_idx + 1,
                        tape,
                        MAX_TAPE_LENGTH
                    ));
                }
            }
        }
    }

    let table = issues.is_empty().then(|| AleTable {
        heading,
        columns,
        rows,
    });

    AleReport { table, issues }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    const SAMPLE: &str = "Heading\n\
FIELD_DELIM\tTABS\n\
VIDEO_FORMAT\t1080\n\
FPS\t25\n\
\n\
Column\n\
Name\tTape\tStart\tEnd\t\n\
\n\
Data\n\
A001C001\tA001\t01:00:00:00\t01:00:10:00\t\n\
A001C002\tA001\t01:00:10:00\n";

    #[test]
    fn test_parse_sample() {
        let report = parse_ale(SAMPLE, AleOptions::default());
        assert!(report.is_valid(), "issues: {:?}", report.issues());

        let table = report.table().unwrap();
        assert_eq!(table.heading_value("fps"), Some("25"));
        assert_eq!(table.columns, vec!["Name", "Tape", "Start", "End"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["A001C002", "A001", "01:00:10:00", ""]);
    }

    #[test]
    fn test_export_table_csv() {
        let table = parse_ale(SAMPLE, AleOptions::default())
            .into_table()
            .unwrap()
            .to_export_table();
        assert_eq!(
            table.to_csv(),
            "Name,Tape,Start,End\r\n\
A001C001,A001,01:00:00:00,01:00:10:00\r\n\
A001C002,A001,01:00:10:00,\r\n"
        );
    }

    #[test]
    fn test_missing_sections_invalid() {
        let report = parse_ale("Heading\nFPS\t25\n", AleOptions::default());
        assert!(!report.is_valid());
        assert!(report.table().is_none());
        assert!(report.issues().iter().any(|i| i.contains("Column")));
        assert!(report.issues().iter().any(|i| i.contains("Data")));
    }

    #[test]
    fn test_duplicate_columns_invalid() {
        let report = parse_ale("Heading\nColumn\nName\tName\nData\na\tb\n", AleOptions::default());
        assert!(!report.is_valid());
        assert!(report.issues()[0].contains("duplicate column 'Name'"));
    }

    #[test]
    fn test_overlong_row_invalid() {
        let report = parse_ale("Heading\nColumn\nName\nData\na\tb\n", AleOptions::default());
        assert!(!report.is_valid());
    }

    #[test]
    fn test_keyword_values_in_data_are_rows() {
        let report = parse_ale(
            "Heading\nColumn\nName\nData\nclip1\nData\nHeading\nColumn\nclip2\n",
            AleOptions::default(),
        );
        assert!(report.is_valid(), "issues: {:?}", report.issues());

        let names: Vec<&str> = report
            .table()
            .unwrap()
            .rows
            .iter()
            .map(|row| row[0].as_str())
            .collect();
        assert_eq!(names, vec!["clip1", "Data", "Heading", "Column", "clip2"]);
    }

    #[test]
    fn test_tape_length_check() {
        let long_tape = "T".repeat(MAX_TAPE_LENGTH + 1);
        let input = format!("Heading\nColumn\nName\tTape\nData\nclip\t{}\n", long_tape);

        let checked = parse_ale(&input, AleOptions::default());
        assert!(!checked.is_valid());

        let unchecked = parse_ale(
            &input,
            AleOptions {
                check_tape_length: false,
            },
        );
        assert!(unchecked.is_valid());
    }

    #[test]
    fn test_cr_only_rewritten() {
        let input = b"Heading\rColumn\rName\rData\rclip\r";
        let normalized = normalize_line_endings(input);
        assert!(matches!(normalized, Cow::Owned(_)));
        assert_eq!(&*normalized, b"Heading\nColumn\nName\nData\nclip\n");

        let report = read_ale(input, AleOptions::default());
        assert_eq!(report.table().unwrap().rows, vec![vec!["clip".to_string()]]);
    }

    #[test]
    fn test_lf_input_untouched() {
        let input = b"Heading\r\nColumn\r\nName\r\nData\r\nclip\r\n";
        let normalized = normalize_line_endings(input);
        assert!(matches!(normalized, Cow::Borrowed(_)));
        assert_eq!(&*normalized, &input[..]);
    }

    #[test]
    fn test_latin1_values() {
        let report = read_ale(b"Heading\nColumn\nName\nData\nCaf\xe9\n", AleOptions::default());
        assert_eq!(report.table().unwrap().rows[0][0], "Café");
    }
}
