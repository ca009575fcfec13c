//! Tabular dump decoding
//!
//! The audio tool writes its inventory as tab-separated text: one header row
//! naming the columns, one row per item, and a trailing empty line. Column
//! order is not fixed between tool versions, so every consumer resolves the
//! columns it needs by name once per decode pass.

use crate::error::DecodeError;
use tracing::{debug, trace};

/// Byte-order mark the tool may leave in front of the first header name
const BOM: char = '\u{FEFF}';

/// Column names emitted by the tool that the inventory understands
pub mod columns {
    pub const NAME: &str = "Name";
    pub const MUTED: &str = "Muted";
    pub const PROCESS_ID: &str = "Process ID";
    pub const PROCESS_PATH: &str = "Process Path";
    pub const ITEM_ID: &str = "Item ID";
    pub const DIRECTION: &str = "Direction";
    pub const TYPE: &str = "Type";
    pub const DEVICE_NAME: &str = "Device Name";
    pub const DEVICE_STATE: &str = "Device State";
}

/// Header of a dump: column names in the order the tool emitted them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnSchema {
    names: Vec<String>,
}

impl ColumnSchema {
    /// Build a schema from the header line, stripping a leading BOM
    pub fn from_header(line: &str) -> Self {
        let names = split_cells(line)
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                if i == 0 {
                    name.trim_start_matches(BOM).to_string()
                } else {
                    name
                }
            })
            .collect();
        Self { names }
    }

    /// Resolve a column name to its index.
    ///
    /// Exact, case-sensitive match. A BOM in front of `name` is ignored so
    /// callers that spell the first column the way the raw header does
    /// still resolve it. `None` means the current dump does not carry the
    /// column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim_start_matches(BOM);
        self.names.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One data row; every cell is an opaque string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    cells: Vec<String>,
}

impl Record {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell at a resolved column, `None` if the column is unavailable
    pub fn cell(&self, index: Option<usize>) -> Option<&str> {
        index.and_then(|i| self.cells.get(i)).map(String::as_str)
    }

    /// Whether the cell at `index` exists and equals `expected`
    pub fn cell_is(&self, index: Option<usize>, expected: &str) -> bool {
        self.cell(index) == Some(expected)
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// A decoded dump: schema plus data rows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dump {
    pub schema: ColumnSchema,
    pub records: Vec<Record>,
}

impl Dump {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.column_index(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Split a line on tabs, keeping empty trailing cells
fn split_cells(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}

/// Decode dump text into a schema and records.
///
/// The first line is the header and the last line is discarded (the tool
/// always terminates its output with an empty line). Every remaining line
/// must have exactly as many cells as the header.
pub fn decode(text: &str) -> Result<Dump, DecodeError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return Err(DecodeError::TooShort { lines: lines.len() });
    }

    let schema = ColumnSchema::from_header(lines[0]);
    let last = lines.len() - 1;
    if !lines[last].is_empty() {
        trace!(line = last + 1, "Discarding non-empty trailing dump line");
    }

    let mut records = Vec::with_capacity(last.saturating_sub(1));
    for (offset, line) in lines[1..last].iter().enumerate() {
        let cells = split_cells(line);
        if cells.len() != schema.len() {
            return Err(DecodeError::RowWidth {
                line: offset + 2,
                expected: schema.len(),
                found: cells.len(),
            });
        }
        records.push(Record::new(cells));
    }

    debug!(
        columns = schema.len(),
        rows = records.len(),
        "Dump decoded"
    );

    Ok(Dump { schema, records })
}

/// Decode the tool's raw UTF-16LE output into text, dropping a leading BOM
pub fn decode_utf16le(bytes: &[u8]) -> Result<String, DecodeError> {
    let (text, had_errors) = encoding_rs::UTF_16LE.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(DecodeError::Encoding);
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\u{FEFF}Name\tType\tDirection\tProcess ID\tItem ID";

    fn dump_text(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        text.push_str("\r\n");
        for row in rows {
            text.push_str(row);
            text.push_str("\r\n");
        }
        text.push_str("\r\n");
        text
    }

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_header_and_rows() {
        let text = dump_text(&["Chrome\tApplication\tRender\t100\tdev-a"]);
        let dump = decode(&text).unwrap();

        assert_eq!(dump.schema.len(), 5);
        assert_eq!(dump.len(), 1);
        assert_eq!(dump.records[0].cells()[0], "Chrome");
    }

    #[test]
    fn test_column_index_resolves_every_header_name() {
        let text = dump_text(&[]);
        let dump = decode(&text).unwrap();

        for (i, name) in dump.schema.names().iter().enumerate() {
            assert_eq!(dump.column_index(name), Some(i));
        }
    }

    #[test]
    fn test_column_index_bom_stripped_or_literal() {
        let schema = ColumnSchema::from_header(HEADER);
        assert_eq!(schema.column_index("Name"), Some(0));
        assert_eq!(schema.column_index("\u{FEFF}Name"), Some(0));
    }

    #[test]
    fn test_column_index_absent_and_case_sensitive() {
        let schema = ColumnSchema::from_header(HEADER);
        assert_eq!(schema.column_index("Device State"), None);
        assert_eq!(schema.column_index("name"), None);
    }

    #[test]
    fn test_trailing_empty_cells_preserved() {
        let text = dump_text(&["Chrome\tApplication\tRender\t\t"]);
        let dump = decode(&text).unwrap();
        let row = &dump.records[0];

        assert_eq!(row.cells().len(), 5);
        assert_eq!(row.cell(Some(3)), Some(""));
        assert_eq!(row.cell(Some(4)), Some(""));
    }

    #[test]
    fn test_last_line_discarded() {
        let text = format!("{}\nChrome\tApplication\tRender\t1\tx\nignored", HEADER);
        let dump = decode(&text).unwrap();
        assert_eq!(dump.len(), 1);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(decode(""), Err(DecodeError::TooShort { lines: 0 }));
        assert_eq!(decode(HEADER), Err(DecodeError::TooShort { lines: 1 }));
    }

    #[test]
    fn test_header_only_dump_is_empty() {
        let dump = decode(&dump_text(&[])).unwrap();
        assert!(dump.is_empty());
        assert!(!dump.schema.is_empty());
    }

    #[test]
    fn test_row_width_mismatch() {
        let text = dump_text(&["Chrome\tApplication\tRender\t100\tdev-a", "short\trow"]);
        assert_eq!(
            decode(&text),
            Err(DecodeError::RowWidth {
                line: 3,
                expected: 5,
                found: 2
            })
        );
    }

    #[test]
    fn test_record_cell_unresolved_column() {
        let record = Record::new(vec!["a".to_string()]);
        assert_eq!(record.cell(None), None);
        assert_eq!(record.cell(Some(7)), None);
        assert!(!record.cell_is(None, "a"));
        assert!(record.cell_is(Some(0), "a"));
    }

    #[test]
    fn test_decode_utf16le_strips_bom() {
        let bytes = utf16le(&dump_text(&["Chrome\tApplication\tRender\t100\tdev-a"]));
        let text = decode_utf16le(&bytes).unwrap();
        let dump = decode(&text).unwrap();

        assert_eq!(dump.schema.names()[0], "Name");
        assert_eq!(dump.len(), 1);
    }

    #[test]
    fn test_decode_utf16le_rejects_truncated_input() {
        let mut bytes = utf16le("Name");
        bytes.push(0x41);
        assert_eq!(decode_utf16le(&bytes), Err(DecodeError::Encoding));
    }
}
