// Reading and writing the HTML table that holds the timesheet

use crate::error::{LedgerError, Result};
use crate::models::{Column, Entry};

const ROW_OPEN: &str = "<tr>";
const ROW_CLOSE: &str = "</tr>";
const CELL_OPEN: &str = "<td>";
const CELL_CLOSE: &str = "</td>";
const HEADER_CELL: &str = "<th>";
const TABLE_CLOSE: &str = "</table>";

const PAGE_HEAD: &str = "<!DOCTYPE html>
<html>
<head>
<meta charset=\"utf-8\">
<title>Timesheet</title>
<style>
table { border-collapse: collapse; font-family: sans-serif; }
th, td { border: 1px solid #999; padding: 2px 6px; }
th { background: #eee; }
</style>
</head>
<body>
<table>
";

const PAGE_TAIL: &str = "</table>
</body>
</html>
";

/// The parsed timesheet: the boilerplate around the table body, kept
/// verbatim, and the entry rows in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimesheetDocument {
    head: String,
    tail: String,
    pub entries: Vec<Entry>,
}

impl TimesheetDocument {
    /// A document with the standard boilerplate and no rows.
    pub fn empty() -> Self {
        Self {
            head: format!("{}{}\n", PAGE_HEAD, header_row()),
            tail: PAGE_TAIL.to_string(),
            entries: Vec::new(),
        }
    }

    /// Parse document text.
    ///
    /// The head runs up to and including the header row, the tail starts at
    /// the last `</table>`. Everything between must be entry rows.
    pub fn parse(text: &str) -> Result<Self> {
        let header_start = text
            .find(HEADER_CELL)
            .ok_or_else(|| LedgerError::structural("no header row found"))?;
        let header_end = text[header_start..]
            .find(ROW_CLOSE)
            .map(|pos| header_start + pos + ROW_CLOSE.len())
            .ok_or_else(|| LedgerError::structural("header row is not closed"))?;
        let body_start = match text[header_end..].strip_prefix('\n') {
            Some(_) => header_end + 1,
            None => header_end,
        };
        let tail_start = text
            .rfind(TABLE_CLOSE)
            .filter(|pos| *pos >= body_start)
            .ok_or_else(|| LedgerError::structural("missing </table> after the header"))?;

        let entries = parse_rows(&text[body_start..tail_start])?;
        Ok(Self {
            head: text[..body_start].to_string(),
            tail: text[tail_start..].to_string(),
            entries,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.head.len() + self.tail.len() + self.entries.len() * 200);
        out.push_str(&self.head);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        for entry in &self.entries {
            out.push_str(ROW_OPEN);
            for cell in entry.cells() {
                out.push_str(CELL_OPEN);
                out.push_str(&escape(&cell));
                out.push_str(CELL_CLOSE);
            }
            out.push_str(ROW_CLOSE);
            out.push('\n');
        }
        out.push_str(&self.tail);
        out
    }
}

fn header_row() -> String {
    let mut row = String::from(ROW_OPEN);
    for column in Column::ALL {
        row.push_str(HEADER_CELL);
        row.push_str(column.title());
        row.push_str("</th>");
    }
    row.push_str(ROW_CLOSE);
    row
}

fn parse_rows(body: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut rest = body;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let after_open = trimmed.strip_prefix(ROW_OPEN).ok_or_else(|| {
            LedgerError::structural(format!("unexpected content before row {}", entries.len()))
        })?;
        let close = after_open.find(ROW_CLOSE).ok_or_else(|| {
            LedgerError::structural(format!("row {} is not closed", entries.len()))
        })?;
        let cells = parse_cells(&after_open[..close], entries.len())?;
        entries.push(Entry::from_cells(&cells)?);
        rest = &after_open[close + ROW_CLOSE.len()..];
    }
    Ok(entries)
}

fn parse_cells(row: &str, index: usize) -> Result<Vec<String>> {
    let mut cells = Vec::with_capacity(Column::ALL.len());
    let mut rest = row;
    while let Some(open) = rest.find(CELL_OPEN) {
        let content_start = open + CELL_OPEN.len();
        let close = rest[content_start..].find(CELL_CLOSE).ok_or_else(|| {
            LedgerError::structural(format!("row {}: cell {} is not closed", index, cells.len()))
        })?;
        cells.push(unescape(&rest[content_start..content_start + close]));
        rest = &rest[content_start + close + CELL_CLOSE.len()..];
    }
    Ok(cells)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}
