//! Plain-text issue table.
//!
//! ```text
//! -------------------------------------------------
//! | ISC: Information Supply Chain                 |
//! =================================================
//! | Key     | Assignee | Status | Summary         |
//! =================================================
//! | ISC-463 | B07507   | Open   | Add in Jira API |
//! -------------------------------------------------
//! ```

use crate::jira::{IssueMap, Project};

/// Extra width added to every column beyond its widest cell.
pub const PADDING: usize = 3;

pub const HEADERS: [&str; 4] = ["Key", "Assignee", "Status", "Summary"];

type Row<'a> = [&'a str; 4];

fn rows(issues: &IssueMap) -> Vec<Row<'_>> {
  issues
    .iter()
    .map(|(key, issue)| {
      [
        key.as_str(),
        issue.assignee_name(),
        issue.status.as_str(),
        issue.summary.as_str(),
      ]
    })
    .collect()
}

fn width(s: &str) -> usize {
  s.chars().count()
}

/// Per-column width: the longer of the header label and the widest cell,
/// plus [`PADDING`].
pub fn column_widths(issues: &IssueMap) -> [usize; 4] {
  let rows = rows(issues);
  let mut widths = [0; 4];
  for (i, header) in HEADERS.iter().enumerate() {
    let longest = rows.iter().map(|row| width(row[i])).max().unwrap_or(0);
    widths[i] = width(header).max(longest) + PADDING;
  }
  widths
}

fn cell(value: &str, width: usize) -> String {
  format!("{:<width$}", format!("| {}", value), width = width)
}

fn line(values: &Row<'_>, widths: &[usize; 4]) -> String {
  let mut out: String = values
    .iter()
    .zip(widths)
    .map(|(value, width)| cell(value, *width))
    .collect();
  out.push('|');
  out
}

/// Render a bordered table of `issues` under a project title row.
pub fn render_issue_table(project: Option<&Project>, issues: &IssueMap) -> String {
  let widths = column_widths(issues);
  let header = line(&HEADERS, &widths);
  let total = width(&header);

  let title = match project {
    Some(p) => format!("{}: {}", p.key, p.name),
    None => "(no project)".to_string(),
  };

  let mut table = vec![
    "-".repeat(total),
    format!("{}|", cell(&title, total - 1)),
    "=".repeat(total),
    header,
    "=".repeat(total),
  ];
  table.extend(rows(issues).iter().map(|row| line(row, &widths)));
  table.push("-".repeat(total));
  table.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jira::fake::{issue, project};

  fn issues() -> IssueMap {
    [
      issue("ISC-463", Some("B07507"), "Open", "Add in Jira API"),
      issue("ISC-1000", None, "In Progress", "x"),
    ]
    .into_iter()
    .map(|i| (i.key.clone(), i))
    .collect()
  }

  #[test]
  fn test_widths_follow_longest_cell() {
    assert_eq!(
      column_widths(&issues()),
      [
        "ISC-1000".len() + PADDING,
        "Assignee".len() + PADDING,
        "In Progress".len() + PADDING,
        "Add in Jira API".len() + PADDING,
      ]
    );
  }

  #[test]
  fn test_empty_set_uses_header_widths() {
    let widths = column_widths(&IssueMap::new());
    let expected: Vec<usize> = HEADERS.iter().map(|h| h.len() + PADDING).collect();
    assert_eq!(widths.to_vec(), expected);
  }

  #[test]
  fn test_empty_table_is_header_only() {
    let p = project(11020, "ISC", "Information Supply Chain");
    let table = render_issue_table(Some(&p), &IssueMap::new());
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[3], "| Key | Assignee | Status | Summary |");
    assert!(lines[1].starts_with("| ISC: Information Supply Chain"));
  }

  #[test]
  fn test_rows_are_aligned() {
    let p = project(11020, "ISC", "Information Supply Chain");
    let table = render_issue_table(Some(&p), &issues());
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 8);
    let total = lines[0].len();
    assert!(lines.iter().all(|l| l.len() == total));
    // BTreeMap order: ISC-1000 sorts before ISC-463
    assert_eq!(
      lines[5],
      "| ISC-1000 |          | In Progress | x               |"
    );
    assert_eq!(
      lines[6],
      "| ISC-463  | B07507   | Open        | Add in Jira API |"
    );
  }

  #[test]
  fn test_long_title_is_not_truncated() {
    let p = project(1, "LONG", "A project name far wider than any column in the table");
    let table = render_issue_table(Some(&p), &IssueMap::new());
    assert!(table.contains("A project name far wider than any column in the table"));
  }

  #[test]
  fn test_no_project_title() {
    let table = render_issue_table(None, &issues());
    assert!(table.lines().nth(1).unwrap().starts_with("| (no project)"));
  }
}
