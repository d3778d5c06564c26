//! Preview construction: parse → validate → resolve.
//!
//! The preview never fails row-by-row: invalid rows become annotated
//! `error` rows while valid rows are still classified, so an import is
//! never all-or-nothing. Re-running a preview on unchanged input against an
//! unchanged roster yields identical rows.

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::CsvResult;
use crate::models::{ImportPreview, PreviewRow};
use crate::parser::{self, ParsedRow};
use crate::store::RosterStore;
use crate::validation::validate_draft;

use super::resolver::{resolve_status, RosterSnapshot};

/// Build a preview from CSV text.
pub fn preview_text(content: &str, store: &RosterStore, auto_create_team: bool) -> ImportPreview {
    let delimiter = parser::detect_delimiter(content);
    let rows = parser::parse_text(content, delimiter);
    preview_parsed(rows, store, auto_create_team)
}

/// Build a preview from raw CSV bytes, auto-detecting encoding and
/// delimiter.
pub fn preview_bytes(
    bytes: &[u8],
    store: &RosterStore,
    auto_create_team: bool,
) -> CsvResult<ImportPreview> {
    let parsed = parser::parse_bytes_auto(bytes)?;
    log_info(format!(
        "Parsed {} data rows (encoding: {}, delimiter: '{}')",
        parsed.rows.len(),
        parsed.encoding,
        parsed.delimiter
    ));

    let ignored = parser::unrecognized_columns(&parsed.headers);
    if !ignored.is_empty() {
        log_warning(format!("Ignoring unrecognized columns: {}", ignored.join(", ")));
    }

    Ok(preview_parsed(parsed.rows, store, auto_create_team))
}

/// Build a preview from already-parsed rows.
pub fn preview_parsed(
    parsed: Vec<ParsedRow>,
    store: &RosterStore,
    auto_create_team: bool,
) -> ImportPreview {
    let snapshot = RosterSnapshot::capture(store);

    let rows: Vec<PreviewRow> = parsed
        .into_iter()
        .map(|row| match validate_draft(&row.draft, auto_create_team) {
            Ok(()) => {
                let mut preview_row = PreviewRow::new(row.row_index, row.draft);
                preview_row.status = resolve_status(&snapshot, &preview_row.draft);
                preview_row
            }
            Err(message) => PreviewRow::error(row.row_index, row.draft, message),
        })
        .collect();

    let preview = ImportPreview {
        rows,
        auto_create_team,
        snapshot_generation: snapshot.generation(),
    };

    let stats = preview.stats();
    log_success(format!(
        "Preview ready: {} new, {} updates, {} errors",
        stats.new, stats.updated, stats.errors
    ));
    if stats.errors > 0 {
        log_warning(format!("{} rows will be skipped on apply", stats.errors));
    }

    preview
}
