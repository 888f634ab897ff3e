//! Raw delimited tables: ordered headers plus string cells, parsed from
//! CSV text and re-serialized for write-back. Header order is preserved
//! end to end so a corrected file diffs cleanly against its original.

use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse CSV text. Short rows are padded and long rows truncated to the
    /// header width; monthly exports routinely carry ragged trailing cells.
    pub fn from_csv_str(file: &str, text: &str) -> Result<Self, EngineError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| EngineError::Csv {
                file: file.into(),
                message: e.to_string(),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let width = headers.len();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| EngineError::Csv {
                file: file.into(),
                message: e.to_string(),
            })?;
            let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Serialize back to CSV text, headers first.
    pub fn to_csv_string(&self) -> Result<String, EngineError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| EngineError::Io(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| EngineError::Io(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| EngineError::Io(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| EngineError::Io(e.to_string()))
    }

    /// Exact-name column index.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Case- and whitespace-insensitive column index.
    pub fn column_ci(&self, name: &str) -> Option<usize> {
        let want = name.trim().to_ascii_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_ascii_lowercase() == want)
    }

    /// First column whose trimmed, lower-cased name starts with `prefix`.
    pub fn column_with_prefix(&self, prefix: &str) -> Option<usize> {
        let want = prefix.to_ascii_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_ascii_lowercase().starts_with(&want))
    }

    pub fn value(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_pads_ragged_rows() {
        let table = RawTable::from_csv_str(
            "t.csv",
            "A,B,C\n1,2,3\n4,5\n6,7,8,9\n",
        )
        .unwrap();
        assert_eq!(table.headers, vec!["A", "B", "C"]);
        assert_eq!(table.rows[1], vec!["4", "5", ""]);
        assert_eq!(table.rows[2], vec!["6", "7", "8"]);
    }

    #[test]
    fn round_trips_through_csv() {
        let text = "A,B\nx,\"y,z\"\n";
        let table = RawTable::from_csv_str("t.csv", text).unwrap();
        assert_eq!(table.to_csv_string().unwrap(), text);
    }

    #[test]
    fn case_insensitive_lookup() {
        let table = RawTable::from_csv_str("t.csv", " First Name ,Subject (M/E)\na,b\n").unwrap();
        assert_eq!(table.column_ci("first name"), Some(0));
        assert_eq!(table.column_with_prefix("subject"), Some(1));
        assert_eq!(table.column("First Name"), None);
    }
}
