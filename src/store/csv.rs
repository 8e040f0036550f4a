//! CSV export and import of tasks.

use chrono::Local;
use tracing::{info, warn};

use super::TodoStore;
use crate::{Error, NewTodo, Todo};

const BOM: char = '\u{feff}';
const HEADERS: [&str; 5] = ["标题", "描述", "状态", "创建时间", "更新时间"];
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Serialize tasks to a BOM-prefixed CSV document with every cell quoted.
pub fn export_csv(todos: &[Todo]) -> String {
    let header = HEADERS.map(str::to_string);
    let rows = todos.iter().map(|todo| {
        [
            todo.title.clone(),
            todo.description.clone(),
            if todo.completed { "已完成" } else { "未完成" }.to_string(),
            todo.created_at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
            todo.updated_at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
        ]
    });

    let body = std::iter::once(header)
        .chain(rows)
        .map(|row| {
            row.iter()
                .map(|cell| format!("\"{cell}\""))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{BOM}{body}")
}

/// Split one CSV line into cells. Every `"` toggles quoting; commas inside
/// quotes belong to the cell.
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    cells.push(current);
    cells
}

/// Parse an exported (or hand-written) CSV document into new tasks.
///
/// The first non-blank line is a header and is skipped. Rows with fewer than
/// two cells are ignored.
pub fn parse_csv(text: &str) -> Result<Vec<NewTodo>, Error> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(Error::import("CSV must contain a header row and at least one task"));
    }

    Ok(lines[1..]
        .iter()
        .map(|line| parse_csv_line(line))
        .filter(|cells| cells.len() >= 2)
        .map(|cells| NewTodo::new(cells[0].trim(), cells[1].trim()))
        .collect())
}

/// Check parsed rows before anything is written. Row numbers in messages
/// count the header as row 1.
pub fn validate_rows(rows: &[NewTodo]) -> Result<(), Error> {
    if rows.is_empty() {
        return Err(Error::import("CSV contains no valid tasks"));
    }

    for (index, row) in rows.iter().enumerate() {
        let line = index + 2;
        if row.title.trim().is_empty() {
            return Err(Error::import(format!("row {line}: title must not be empty")));
        }
        if row.title.chars().count() > MAX_TITLE_CHARS {
            return Err(Error::import(format!(
                "row {line}: title must not exceed {MAX_TITLE_CHARS} characters"
            )));
        }
        if row.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(Error::import(format!(
                "row {line}: description must not exceed {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
    }

    Ok(())
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Create the rows one by one; a failing row is logged and counted, not fatal.
pub async fn import_rows(store: &dyn TodoStore, rows: &[NewTodo]) -> ImportReport {
    let mut report = ImportReport::default();

    for row in rows {
        match store.create(row).await {
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                warn!(title = %row.title, error = %e, "failed to import task");
                report.failed += 1;
            }
        }
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "csv import finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn todo(title: &str, description: &str, completed: bool) -> Todo {
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 8, 30, 0).unwrap();
        Todo {
            id: "id-1".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            completed,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_export_layout() {
        let csv = export_csv(&[todo("写周报", "总结, 规划", true), todo("买菜", "", false)]);

        assert!(csv.starts_with(BOM));
        let lines: Vec<&str> = csv.trim_start_matches(BOM).lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "\"标题\",\"描述\",\"状态\",\"创建时间\",\"更新时间\"");
        assert!(lines[1].starts_with("\"写周报\",\"总结, 规划\",\"已完成\",\""));
        assert!(lines[2].starts_with("\"买菜\",\"\",\"未完成\",\""));
    }

    #[test]
    fn test_parse_exported_csv() {
        let csv = export_csv(&[todo("写周报", "总结, 规划", true), todo("买菜", "", false)]);
        let rows = parse_csv(&csv).unwrap();

        assert_eq!(
            rows,
            vec![NewTodo::new("写周报", "总结, 规划"), NewTodo::new("买菜", "")]
        );
    }

    #[test]
    fn test_parse_csv_line_state_machine() {
        assert_eq!(parse_csv_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_csv_line("\"a,b\",c"), vec!["a,b", "c"]);
        assert_eq!(parse_csv_line("\"\",x"), vec!["", "x"]);
        assert_eq!(parse_csv_line("single"), vec!["single"]);
    }

    #[test]
    fn test_parse_skips_short_rows_and_blank_lines() {
        let rows = parse_csv("标题,描述\r\n\r\n任务一,描述一\r\nonly-one-cell\r\n任务二,描述二").unwrap();
        assert_eq!(
            rows,
            vec![NewTodo::new("任务一", "描述一"), NewTodo::new("任务二", "描述二")]
        );

        assert!(matches!(parse_csv("标题,描述\n"), Err(Error::Import(_))));
        assert!(parse_csv("").is_err());
    }

    #[test]
    fn test_validate_rows() {
        assert!(validate_rows(&[NewTodo::new("ok", "fine")]).is_ok());
        assert!(validate_rows(&[]).is_err());

        let err = validate_rows(&[NewTodo::new("ok", ""), NewTodo::new(" ", "")]).unwrap_err();
        assert!(err.to_string().contains("row 3"));

        let long_title = "题".repeat(MAX_TITLE_CHARS + 1);
        assert!(validate_rows(&[NewTodo::new(long_title, "")]).is_err());
        assert!(validate_rows(&[NewTodo::new("题".repeat(MAX_TITLE_CHARS), "")]).is_ok());

        let long_description = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(validate_rows(&[NewTodo::new("ok", long_description)]).is_err());
    }
}
