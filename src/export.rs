//! Spreadsheet export
//!
//! Serializes check-ins to CSV that spreadsheet software opens without an
//! import dialog: UTF-8 with a byte-order mark, CRLF line endings, and fields
//! quoted when they hold a separator, a quote or a line break.

use crate::model::{CheckIn, ProblemStatusEvent};
use crate::status::current_statuses;
use chrono::NaiveDate;
use std::borrow::Cow;
use std::path::Path;

/// Column headers, in output order
pub const CSV_COLUMNS: &[&str] = &[
    "id",
    "author",
    "site",
    "role",
    "date",
    "mood",
    "mood_level",
    "energy",
    "workload",
    "has_problem",
    "problem_type",
    "problem_description",
    "urgency",
    "patient_impact",
    "problem_status",
    "win",
    "help_needed",
    "comment",
    "created_at",
];

const BOM: char = '\u{feff}';

/// Escape one CSV field
fn escape_csv(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let escaped: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_csv(f.as_ref())).collect();
    out.push_str(&escaped.join(","));
    out.push_str("\r\n");
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Render check-ins as CSV. Problem rows carry their current status.
pub fn checkins_to_csv(checkins: &[&CheckIn], events: &[ProblemStatusEvent]) -> String {
    let statuses = current_statuses(events);
    let mut csv = String::new();
    csv.push(BOM);
    push_row(&mut csv, CSV_COLUMNS);

    for c in checkins {
        let problem_status = if c.has_problem {
            statuses
                .get(c.id.as_str())
                .map(|e| e.status)
                .unwrap_or(crate::model::ProblemStatus::Pending)
                .to_string()
        } else {
            String::new()
        };

        let row = [
            c.id.clone(),
            c.author.clone(),
            c.site.clone(),
            c.role.clone(),
            c.date.format("%Y-%m-%d").to_string(),
            c.mood.to_string(),
            c.mood.level().to_string(),
            c.energy.to_string(),
            c.workload.to_string(),
            c.has_problem.to_string(),
            opt(&c.problem_type),
            opt(&c.problem_description),
            opt(&c.urgency),
            c.patient_impact.to_string(),
            problem_status,
            opt(&c.win),
            opt(&c.help_needed),
            opt(&c.comment),
            c.created_at.to_rfc3339(),
        ];
        push_row(&mut csv, &row);
    }

    csv
}

/// Default download name, e.g. `checkins_2025-01-10.csv`
pub fn export_file_name(today: NaiveDate) -> String {
    format!("checkins_{}.csv", today.format("%Y-%m-%d"))
}

/// Write a rendered export to disk, creating parent directories
pub fn write_csv(path: &Path, csv: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mood, ProblemKind, ProblemStatus, Urgency, Workload};
    use chrono::{Local, TimeZone};

    fn sample(id: &str, has_problem: bool) -> CheckIn {
        CheckIn {
            id: id.to_string(),
            author: "Julie".to_string(),
            site: "Site C".to_string(),
            role: "Secretary".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            mood: Mood::Neutral,
            energy: 3,
            workload: Workload::Busy,
            has_problem,
            problem_type: has_problem.then_some(ProblemKind::It),
            problem_description: has_problem.then(|| "printer says \"no\", again\nand again".to_string()),
            urgency: has_problem.then_some(Urgency::Medium),
            patient_impact: false,
            win: None,
            help_needed: None,
            comment: Some("ok".to_string()),
            created_at: Local.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_header_and_bom() {
        let csv = checkins_to_csv(&[], &[]);
        assert!(csv.starts_with('\u{feff}'));
        let header = csv.trim_start_matches('\u{feff}').lines().next().unwrap();
        assert_eq!(header.split(',').count(), CSV_COLUMNS.len());
        assert!(header.starts_with("id,author,site"));
    }

    #[test]
    fn test_rows_and_problem_status() {
        let quiet = sample("Julie_1", false);
        let noisy = sample("Julie_2", true);
        let events = vec![ProblemStatusEvent {
            problem_id: "Julie_2".to_string(),
            status: ProblemStatus::InProgress,
            resolution_note: String::new(),
            updated_at: Local.with_ymd_and_hms(2025, 1, 10, 11, 0, 0).unwrap(),
        }];

        let csv = checkins_to_csv(&[&quiet, &noisy], &events);
        let body = csv.trim_start_matches('\u{feff}');
        let rows: Vec<&str> = body.split("\r\n").collect();

        assert!(rows[1].starts_with("Julie_1,Julie,Site C,Secretary,2025-01-10,neutral,3,3,busy,false,,,,false,,,,ok,"));
        assert!(rows[2].contains(",in-progress,"));
        assert!(rows[2].contains("\"printer says \"\"no\"\", again\nand again\""));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()),
            "checkins_2025-01-10.csv"
        );
    }

    #[test]
    fn test_write_csv_creates_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("x.csv");
        write_csv(&path, "a,b\r\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a,b\r\n");
    }
}
