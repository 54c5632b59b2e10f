//! Export tables and CSV rendering
//!
//! An [`ExportTable`] is a fixed header plus rows of optional cells. Absent
//! cells render as empty fields. CSV output follows RFC 4180: records end in
//! CRLF and fields containing a delimiter, quote or line break are quoted.

use serde::Serialize;

/// Header + rows table shared by all CSV exports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ExportTable {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padded or truncated to the header width
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.header.len(), None);
        self.rows.push(row);
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Render header and rows as CSV text
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        write_record(&mut out, self.header.iter().map(String::as_str));
        for row in &self.rows {
            write_record(&mut out, row.iter().map(|c| c.as_deref().unwrap_or("")));
        }
        out
    }
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, field);
    }
    out.push_str("\r\n");
}

fn write_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\r' | '\n'));

    if needs_quotes {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_header_and_rows() {
        let mut table = ExportTable::new(["Name", "Mob ID"]);
        table.push_row(vec![cell("Shot_01"), cell("urn:smpte:umid:01")]);
        table.push_row(vec![None, cell("urn:smpte:umid:02")]);

        assert_eq!(
            table.to_csv(),
            "Name,Mob ID\r\nShot_01,urn:smpte:umid:01\r\n,urn:smpte:umid:02\r\n"
        );
    }

    #[test]
    fn test_quoting() {
        let mut table = ExportTable::new(["A", "B", "C"]);
        table.push_row(vec![cell("a,b"), cell("say \"hi\""), cell("two\nlines")]);

        let csv = table.to_csv();
        assert_eq!(csv, "A,B,C\r\n\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n");
    }

    #[test]
    fn test_push_row_pads_to_width() {
        let mut table = ExportTable::new(["A", "B", "C"]);
        table.push_row(vec![cell("1")]);
        table.push_row(vec![cell("1"), cell("2"), cell("3"), cell("4")]);

        assert_eq!(table.rows[0], vec![cell("1"), None, None]);
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_empty_table_renders_header_only() {
        let table = ExportTable::new(["Event", "Reel"]);
        assert!(table.is_empty());
        assert_eq!(table.to_csv(), "Event,Reel\r\n");
    }

    #[test]
    fn test_column_index() {
        let table = ExportTable::new(["Name", "Tape"]);
        assert_eq!(table.column_index("Tape"), Some(1));
        assert_eq!(table.column_index("tape"), None);
    }
}
