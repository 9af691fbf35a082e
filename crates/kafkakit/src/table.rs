//! Column-aligned tabular text.
//!
//! ```text
//! name          , num_partitions, replication_factor
//! orders        , 3             , 2
//! payments      ,               ,
//! ```
//!
//! Cells are separated by commas and may be padded with whitespace. The
//! first non-blank line is the header. A blank cell is an absent value.
//! Lines starting with `#` are comments.
//!
//! A cell holding a comma, a double quote, a leading `#` or edge whitespace
//! is wrapped in double quotes, with inner quotes doubled:
//!
//! ```text
//! principal                     , operation
//! "User:CN=alice,OU=eng"        , READ
//! ```

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt::Write;

/// One data row keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    line: usize,
    cells: BTreeMap<String, String>,
}

impl Record {
    /// Line the row came from (1-indexed, relative to the whole document)
    pub fn line(&self) -> usize {
        self.line
    }

    /// Cell value for `column`, `None` when the cell is blank or missing
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// A parsed table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names in header order
    pub columns: Vec<String>,
    /// Header line (1-indexed), 0 when the text was empty
    pub header_line: usize,
    pub records: Vec<Record>,
}

/// Parse table text whose first line is line `first_line` of the document.
pub fn parse(text: &str, first_line: usize) -> Result<Table> {
    let mut table = Table::default();

    for (offset, raw) in text.lines().enumerate() {
        let line_num = first_line + offset;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let cells = split_cells(line, line_num)?;

        if table.columns.is_empty() {
            table.columns = parse_header(cells, line_num)?;
            table.header_line = line_num;
            continue;
        }

        if cells.len() > table.columns.len() {
            return Err(Error::parse(
                line_num,
                format!(
                    "row has {} cells but the header has {} columns",
                    cells.len(),
                    table.columns.len()
                ),
            ));
        }

        let mut record = Record {
            line: line_num,
            cells: BTreeMap::new(),
        };
        for (i, column) in table.columns.iter().enumerate() {
            let value = cells.get(i).cloned().unwrap_or_default();
            record.cells.insert(column.clone(), value);
        }
        table.records.push(record);
    }

    Ok(table)
}

/// Split one line into trimmed cells, honouring double-quoted cells.
fn split_cells(line: &str, line_num: usize) -> Result<Vec<String>> {
    let mut cells = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        if chars.next_if_eq(&'"').is_none() {
            let mut cell = String::new();
            let more = loop {
                match chars.next() {
                    Some(',') => break true,
                    Some(c) => cell.push(c),
                    None => break false,
                }
            };
            cells.push(cell.trim().to_string());
            if !more {
                return Ok(cells);
            }
            continue;
        }

        let mut cell = String::new();
        loop {
            match chars.next() {
                Some('"') if chars.next_if_eq(&'"').is_some() => cell.push('"'),
                Some('"') => break,
                Some(c) => cell.push(c),
                None => return Err(Error::parse(line_num, "unterminated quoted cell")),
            }
        }
        cells.push(cell);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') => {}
            None => return Ok(cells),
            Some(c) => {
                return Err(Error::parse(
                    line_num,
                    format!("unexpected '{c}' after a quoted cell"),
                ));
            }
        }
    }
}

/// Quote a cell that would not survive `split_cells` as written.
fn quote(cell: &str) -> String {
    let needs_quotes = cell.contains([',', '"'])
        || cell.starts_with('#')
        || cell.trim() != cell;
    if needs_quotes {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn parse_header(cells: Vec<String>, line_num: usize) -> Result<Vec<String>> {
    let mut columns: Vec<String> = Vec::with_capacity(cells.len());
    for cell in cells {
        if cell.is_empty() {
            return Err(Error::parse(line_num, "empty column name in header"));
        }
        let name = cell.to_lowercase();
        if columns.contains(&name) {
            return Err(Error::parse(line_num, format!("duplicate column '{name}'")));
        }
        columns.push(name);
    }
    Ok(columns)
}

/// Render rows under `headers`, padding every column to its widest cell.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| quote(cell)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
    write_row(&mut output, &header_cells, &widths);
    for row in &rows {
        write_row(&mut output, row, &widths);
    }
    output
}

fn write_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push_str(", ");
        }
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        write!(line, "{cell:<width$}").unwrap();
    }
    writeln!(output, "{}", line.trim_end()).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_table() {
        let text = "name, num_partitions\norders, 3\npayments, 1\n";
        let table = parse(text, 1).unwrap();

        assert_eq!(table.columns, vec!["name", "num_partitions"]);
        assert_eq!(table.header_line, 1);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].get("name"), Some("orders"));
        assert_eq!(table.records[0].get("num_partitions"), Some("3"));
        assert_eq!(table.records[1].line(), 3);
    }

    #[test]
    fn test_blank_and_missing_cells_are_absent() {
        let text = "a, b, c\nx,  ,\ny\n";
        let table = parse(text, 1).unwrap();

        assert_eq!(table.records[0].get("a"), Some("x"));
        assert_eq!(table.records[0].get("b"), None);
        assert_eq!(table.records[0].get("c"), None);
        assert_eq!(table.records[1].get("b"), None);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "\n# topics\nname\n\n# more\norders\n";
        let table = parse(text, 10).unwrap();

        assert_eq!(table.header_line, 12);
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].line(), 15);
    }

    #[test]
    fn test_too_many_cells_reports_line() {
        let text = "name\norders, 3\n";
        let err = parse(text, 5).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 6, .. }), "{err}");
    }

    #[test]
    fn test_quoted_cells() {
        let text = "principal, host\n\"User:CN=alice,OU=eng\" , *\n\"say \"\"hi\"\"\", \"# not a comment\"\n";
        let table = parse(text, 1).unwrap();

        assert_eq!(table.records[0].get("principal"), Some("User:CN=alice,OU=eng"));
        assert_eq!(table.records[0].get("host"), Some("*"));
        assert_eq!(table.records[1].get("principal"), Some("say \"hi\""));
        assert_eq!(table.records[1].get("host"), Some("# not a comment"));
    }

    #[test]
    fn test_unterminated_quote_reports_line() {
        let err = parse("principal\n\"User:CN=alice,OU=eng\n", 3).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }), "{err}");

        let err = parse("principal, host\n\"User:Bob\"x, *\n", 1).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_render_quotes_when_needed() {
        let rows = vec![vec!["User:CN=alice,OU=eng".to_string(), "*".to_string()]];
        let text = render(&["principal", "host"], &rows);

        assert_eq!(
            text,
            "principal             , host\n\"User:CN=alice,OU=eng\", *\n"
        );
        let table = parse(&text, 1).unwrap();
        assert_eq!(table.records[0].get("principal"), Some("User:CN=alice,OU=eng"));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = parse("name, Name\n", 1).unwrap_err();
        assert!(err.to_string().contains("duplicate column"));
    }

    #[test]
    fn test_header_is_lowercased() {
        let table = parse("Name, Host\nx, y\n", 1).unwrap();
        assert_eq!(table.records[0].get("host"), Some("y"));
    }

    #[test]
    fn test_empty_text_has_no_columns() {
        let table = parse("\n\n", 1).unwrap();
        assert!(table.columns.is_empty());
        assert!(table.records.is_empty());
    }

    #[test]
    fn test_render_pads_columns() {
        let rows = vec![
            vec!["orders".to_string(), "3".to_string()],
            vec!["a".to_string(), "12".to_string()],
        ];
        let text = render(&["name", "num_partitions"], &rows);

        assert_eq!(
            text,
            "name  , num_partitions\norders, 3\na     , 12\n"
        );
    }

    #[test]
    fn test_render_then_parse() {
        let rows = vec![vec!["orders".to_string(), String::new(), "2".to_string()]];
        let text = render(&["name", "num_partitions", "replication_factor"], &rows);
        let table = parse(&text, 1).unwrap();

        assert_eq!(table.records[0].get("name"), Some("orders"));
        assert_eq!(table.records[0].get("num_partitions"), None);
        assert_eq!(table.records[0].get("replication_factor"), Some("2"));
    }
}
