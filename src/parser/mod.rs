//! CSV parser for employee roster uploads, with encoding and delimiter
//! auto-detection.
//!
//! Columns are resolved **by name**, never by position: the first non-empty
//! line is the header, and each recognized header maps the cells below it
//! onto [`EmployeeDraft`] fields. Unknown columns are ignored, column order
//! is flexible, and a data line shorter than the header simply leaves the
//! trailing fields absent. The parser is deliberately lenient: absent fields
//! are always preferred over failing.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{EmployeeDraft, Role};

/// Recognized header names, in the documented upload format.
pub const RECOGNIZED_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "phone",
    "position",
    "team",
    "role",
    "locale",
    "timezone",
    "employment_type",
];

/// One parsed data line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// 1-based position among the data lines.
    pub row_index: usize,
    pub draft: EmployeeDraft,
}

/// Result of parsing with metadata.
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub rows: Vec<ParsedRow>,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
    /// Header names as they appeared in the input.
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string())),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        _ => {
            // Fallback: UTF-8 with lossy conversion
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }
}

/// Detect the delimiter by counting occurrences in the first non-empty line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text into employee drafts with an explicit delimiter.
///
/// Line boundaries tolerate both LF and CRLF. Fewer than two non-empty
/// lines (no data rows) yields an empty result, not an error.
///
/// # Example
/// ```ignore
/// use rostersync::parse_text;
///
/// let csv = "email,team\nana@acme.com,Product";
/// let rows = parse_text(csv, ',');
///
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].draft.email.as_deref(), Some("ana@acme.com"));
/// ```
pub fn parse_text(content: &str, delimiter: char) -> Vec<ParsedRow> {
    parse_lines(content, delimiter).rows
}

/// Parse CSV text and return rows together with the headers encountered.
fn parse_lines(content: &str, delimiter: char) -> ParsedLines {
    // str::lines strips a trailing '\r', which covers CRLF input.
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());

    let header_line = match lines.next() {
        Some(line) => line,
        None => return ParsedLines::default(),
    };

    let headers: Vec<String> = header_line
        .split(delimiter)
        .map(|s| clean_cell(s).to_string())
        .collect();

    let mut rows = Vec::new();

    for (i, line) in lines.enumerate() {
        let values: Vec<&str> = line.split(delimiter).collect();
        let mut draft = EmployeeDraft::default();

        for (col, header) in headers.iter().enumerate() {
            // A line shorter than the header leaves trailing fields absent.
            let value = match values.get(col).map(|v| clean_cell(v)) {
                Some(v) if !v.is_empty() => v,
                _ => continue,
            };
            assign_field(&mut draft, &header.to_lowercase(), value);
        }

        rows.push(ParsedRow {
            row_index: i + 1,
            draft,
        });
    }

    ParsedLines { rows, headers }
}

#[derive(Default)]
struct ParsedLines {
    rows: Vec<ParsedRow>,
    headers: Vec<String>,
}

/// Trim whitespace and surrounding quotes from a cell.
fn clean_cell(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

/// Header names the parser will not map onto any draft field, preserving
/// input casing. Useful for warning the uploader about silently ignored
/// columns.
pub fn unrecognized_columns(headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .filter(|h| !RECOGNIZED_COLUMNS.contains(&h.to_lowercase().as_str()))
        .cloned()
        .collect()
}

/// Map one recognized header onto its draft field. Unknown headers are
/// ignored; an unparseable role cell is treated as absent.
fn assign_field(draft: &mut EmployeeDraft, header: &str, value: &str) {
    match header {
        "first_name" => draft.first_name = Some(value.to_string()),
        "last_name" => draft.last_name = Some(value.to_string()),
        "email" => draft.email = Some(value.to_string()),
        "phone" => draft.phone = Some(value.to_string()),
        "position" => draft.position = Some(value.to_string()),
        "team" => draft.team = Some(value.to_string()),
        "role" => draft.role = Role::from_code(value),
        "locale" => draft.locale = Some(value.to_string()),
        "timezone" => draft.timezone = Some(value.to_string()),
        "employment_type" => draft.employment_type = Some(value.to_string()),
        _ => {}
    }
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParsedCsv> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParsedCsv> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    let parsed = parse_lines(&content, delimiter);

    Ok(ParsedCsv {
        rows: parsed.rows,
        encoding,
        delimiter,
        headers: parsed.headers,
    })
}
