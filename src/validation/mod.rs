//! Per-row validation rules for parsed employee drafts.
//!
//! Rules form an ordered chain; the first failing rule wins and its message
//! becomes the row's error. A verdict is data, never an exception: a failing
//! row is surfaced as an annotated preview row and never blocks the others.
//!
//! # Rules
//!
//! 1. `email` present and shaped like `local@domain.tld`
//! 2. `team` present, unless auto-create is enabled
//! 3. `phone`, when present, loosely E.164 (optional `+`, 8-15 digits)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::EmployeeDraft;
use crate::parser::ParsedRow;

/// Simple `local@domain.tld` shape. Not RFC 5322; matching the upload
/// format's tolerance is the point.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

/// Loose E.164: optional leading `+`, 8-15 digits, no embedded separators.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("invalid phone regex"));

pub const ERR_EMAIL: &str = "Invalid or missing email";
pub const ERR_TEAM: &str = "Team required (or enable auto-create)";
pub const ERR_PHONE: &str = "Invalid phone format";

/// Validate one draft against the rule chain.
///
/// `Ok(())` means the row is importable (tentatively `new`; final
/// classification is the resolver's job). `Err` carries the first failing
/// rule's message.
pub fn validate_draft(draft: &EmployeeDraft, auto_create_team: bool) -> Result<(), &'static str> {
    match draft.email.as_deref() {
        Some(email) if EMAIL_RE.is_match(email.trim()) => {}
        _ => return Err(ERR_EMAIL),
    }

    let team_blank = draft.team.as_deref().map_or(true, |t| t.trim().is_empty());
    if team_blank && !auto_create_team {
        return Err(ERR_TEAM);
    }

    if let Some(phone) = draft.phone.as_deref() {
        if !PHONE_RE.is_match(phone.trim()) {
            return Err(ERR_PHONE);
        }
    }

    Ok(())
}

/// Verdict for one parsed row, independent of any roster snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RowVerdict {
    /// 1-based position among the data lines.
    pub row_index: usize,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run the rule chain over parsed rows without touching a roster.
///
/// Pure validation: no dedup resolution, no store access. One verdict per
/// row, in input order.
pub fn validate_rows(rows: &[ParsedRow], auto_create_team: bool) -> Vec<RowVerdict> {
    rows.iter()
        .map(|row| match validate_draft(&row.draft, auto_create_team) {
            Ok(()) => RowVerdict {
                row_index: row.row_index,
                valid: true,
                error: None,
            },
            Err(message) => RowVerdict {
                row_index: row.row_index,
                valid: false,
                error: Some(message.to_string()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(email: Option<&str>, team: Option<&str>, phone: Option<&str>) -> EmployeeDraft {
        EmployeeDraft {
            email: email.map(String::from),
            team: team.map(String::from),
            phone: phone.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_row() {
        let d = draft(Some("ana@acme.com"), Some("Product"), Some("+34600111222"));
        assert_eq!(validate_draft(&d, false), Ok(()));
    }

    #[test]
    fn test_missing_email() {
        let d = draft(None, Some("Product"), None);
        assert_eq!(validate_draft(&d, false), Err(ERR_EMAIL));
    }

    #[test]
    fn test_malformed_email() {
        for bad in ["ana", "ana@acme", "@acme.com", "ana @acme.com", "a@b@c.io"] {
            let d = draft(Some(bad), Some("Product"), None);
            assert_eq!(validate_draft(&d, false), Err(ERR_EMAIL), "{}", bad);
        }
    }

    #[test]
    fn test_team_required_without_auto_create() {
        let d = draft(Some("ana@acme.com"), None, None);
        assert_eq!(validate_draft(&d, false), Err(ERR_TEAM));
        assert_eq!(validate_draft(&d, true), Ok(()));
    }

    #[test]
    fn test_blank_team_counts_as_missing() {
        let d = draft(Some("ana@acme.com"), Some("   "), None);
        assert_eq!(validate_draft(&d, false), Err(ERR_TEAM));
    }

    #[test]
    fn test_phone_too_short() {
        let d = draft(Some("ana@acme.com"), Some("Product"), Some("12345"));
        assert_eq!(validate_draft(&d, false), Err(ERR_PHONE));
    }

    #[test]
    fn test_phone_with_separators_rejected() {
        let d = draft(Some("ana@acme.com"), Some("Product"), Some("+34 600 111 222"));
        assert_eq!(validate_draft(&d, false), Err(ERR_PHONE));
    }

    #[test]
    fn test_phone_absent_is_fine() {
        let d = draft(Some("ana@acme.com"), Some("Product"), None);
        assert_eq!(validate_draft(&d, false), Ok(()));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        // Both email and phone are bad; the email rule fires first.
        let d = draft(Some("nope"), None, Some("12345"));
        assert_eq!(validate_draft(&d, false), Err(ERR_EMAIL));
    }

    #[test]
    fn test_validate_rows_reports_per_row_verdicts() {
        let rows = vec![
            ParsedRow {
                row_index: 1,
                draft: draft(Some("ana@acme.com"), Some("Product"), None),
            },
            ParsedRow {
                row_index: 2,
                draft: draft(Some("bad-email"), Some("Product"), None),
            },
            ParsedRow {
                row_index: 3,
                draft: draft(Some("bob@acme.com"), None, None),
            },
        ];

        let verdicts = validate_rows(&rows, false);

        assert_eq!(verdicts.len(), 3);
        assert!(verdicts[0].valid);
        assert_eq!(verdicts[0].error, None);
        assert!(!verdicts[1].valid);
        assert_eq!(verdicts[1].error.as_deref(), Some(ERR_EMAIL));
        assert!(!verdicts[2].valid);
        assert_eq!(verdicts[2].error.as_deref(), Some(ERR_TEAM));
        assert_eq!(verdicts[2].row_index, 3);

        // The team rule is relaxed by auto-create, row 3 flips to valid.
        let relaxed = validate_rows(&rows, true);
        assert!(relaxed[2].valid);
    }
}
