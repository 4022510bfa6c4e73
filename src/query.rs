//! JQL construction from structured filter options.
//!
//! [`QueryFilter`] is the loose, string-typed form callers fill in (CLI
//! flags, option structs). [`QueryFilter::to_jql`] validates every option
//! against its vocabulary and hands the typed values to [`JqlBuilder`],
//! which renders clauses in a fixed order:
//!
//! ```text
//! assignee = B07507 AND project = ISC AND status in (Open, 'In Progress')
//! ```

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Status filter accepted by issue queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
  Open,
  InProgress,
  Resolved,
  /// No status restriction
  All,
  /// Open or In Progress
  AllOpen,
}

impl StatusFilter {
  pub const ALL: [StatusFilter; 5] = [
    StatusFilter::Open,
    StatusFilter::InProgress,
    StatusFilter::Resolved,
    StatusFilter::All,
    StatusFilter::AllOpen,
  ];

  pub fn label(self) -> &'static str {
    match self {
      StatusFilter::Open => "Open",
      StatusFilter::InProgress => "In Progress",
      StatusFilter::Resolved => "Resolved",
      StatusFilter::All => "All",
      StatusFilter::AllOpen => "All Open",
    }
  }

  /// The JQL clause for this filter, or `None` when no restriction applies.
  pub fn clause(self) -> Option<String> {
    match self {
      StatusFilter::All => None,
      StatusFilter::AllOpen => Some("status in (Open, 'In Progress')".to_string()),
      other => Some(format!("status = {}", jql_value(other.label()))),
    }
  }
}

impl FromStr for StatusFilter {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim();
    Self::ALL
      .into_iter()
      .find(|status| status.label().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| {
        let choices: Vec<&str> = Self::ALL.iter().map(|s| s.label()).collect();
        Error::Validation(vec![format!(
          "status '{}' is not valid, choose from {}",
          s,
          choices.join(", ")
        )])
      })
  }
}

impl fmt::Display for StatusFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Issue lifecycle event a time window is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventType {
  #[default]
  Created,
  Resolved,
  Updated,
}

impl EventType {
  pub const ALL: [EventType; 3] = [EventType::Created, EventType::Resolved, EventType::Updated];

  pub fn field(self) -> &'static str {
    match self {
      EventType::Created => "created",
      EventType::Resolved => "resolved",
      EventType::Updated => "updated",
    }
  }
}

impl FromStr for EventType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim();
    Self::ALL
      .into_iter()
      .find(|event| event.field().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| {
        let choices: Vec<&str> = Self::ALL.iter().map(|e| e.field()).collect();
        Error::Validation(vec![format!(
          "event '{}' is not supported, choose from {}",
          s,
          choices.join(", ")
        )])
      })
  }
}

impl fmt::Display for EventType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.field())
  }
}

fn time_token_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^[-+]?[0-9]+[dhmwy]$").expect("valid time token regex"))
}

/// A relative time window such as `-1w` or `-2d -12h`.
///
/// Every whitespace-separated token must look like `[+-]<integer><unit>`
/// with unit one of `d h m w y`; one bad token rejects the whole window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
  tokens: Vec<String>,
}

impl FromStr for TimeWindow {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let tokens: Vec<String> = s.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
      return Err(Error::Validation(vec![
        "time window is empty, expected tokens like -1w or -2d".to_string(),
      ]));
    }

    let bad: Vec<String> = tokens
      .iter()
      .filter(|t| !time_token_re().is_match(t))
      .map(|t| format!("could not parse time token '{}'", t))
      .collect();
    if !bad.is_empty() {
      return Err(Error::Validation(bad));
    }

    Ok(Self { tokens })
  }
}

impl fmt::Display for TimeWindow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.tokens.join(" "))
  }
}

/// Quote a value when JQL would otherwise split it.
fn jql_value(value: &str) -> String {
  if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
    value.to_string()
  } else {
    format!("'{}'", value.replace('\'', "\\'"))
  }
}

/// Typed JQL builder. Clause order is fixed: assignee, project, status,
/// event window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JqlBuilder {
  assignee: Option<String>,
  project: Option<String>,
  status: Option<StatusFilter>,
  window: Option<(EventType, TimeWindow)>,
}

impl JqlBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Restrict to an assignee. Names are stored uppercase.
  pub fn assignee(mut self, assignee: &str) -> Self {
    self.assignee = Some(assignee.trim().to_uppercase());
    self
  }

  pub fn project(mut self, project: &str) -> Self {
    self.project = Some(project.trim().to_string());
    self
  }

  pub fn status(mut self, status: StatusFilter) -> Self {
    self.status = Some(status);
    self
  }

  pub fn window(mut self, event: EventType, time: TimeWindow) -> Self {
    self.window = Some((event, time));
    self
  }

  pub fn build(&self) -> String {
    let mut clauses = Vec::new();
    if let Some(assignee) = &self.assignee {
      clauses.push(format!("assignee = {}", jql_value(assignee)));
    }
    if let Some(project) = &self.project {
      clauses.push(format!("project = {}", jql_value(project)));
    }
    if let Some(clause) = self.status.and_then(StatusFilter::clause) {
      clauses.push(clause);
    }
    if let Some((event, time)) = &self.window {
      clauses.push(format!("{} <= '{}'", event, time));
    }
    clauses.join(" AND ")
  }
}

/// Loose filter options, validated as a whole by [`QueryFilter::to_jql`].
///
/// `event` only matters when `time` is set; it defaults to `created`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
  pub assignee: Option<String>,
  pub project: Option<String>,
  pub status: Option<String>,
  pub time: Option<String>,
  pub event: Option<String>,
}

impl QueryFilter {
  /// Validate every option and render the query.
  ///
  /// All problems are collected into a single [`Error::Validation`]; no
  /// query is produced if any option is invalid.
  pub fn to_jql(&self) -> Result<String> {
    let mut problems = Vec::new();
    let mut builder = JqlBuilder::new();

    if let Some(assignee) = self.assignee.as_deref() {
      if assignee.trim().is_empty() {
        problems.push("assignee must not be empty".to_string());
      } else {
        builder = builder.assignee(assignee);
      }
    }

    if let Some(project) = self.project.as_deref() {
      if project.trim().is_empty() {
        problems.push("project must not be empty".to_string());
      } else {
        builder = builder.project(project);
      }
    }

    if let Some(status) = self.status.as_deref() {
      match status.parse::<StatusFilter>() {
        Ok(status) => builder = builder.status(status),
        Err(e) => problems.extend(validation_messages(e)),
      }
    }

    let event = match self.event.as_deref() {
      Some(event) => match event.parse::<EventType>() {
        Ok(event) => Some(event),
        Err(e) => {
          problems.extend(validation_messages(e));
          None
        }
      },
      None => Some(EventType::default()),
    };

    if let Some(time) = self.time.as_deref() {
      match time.parse::<TimeWindow>() {
        Ok(window) => {
          if let Some(event) = event {
            builder = builder.window(event, window);
          }
        }
        Err(e) => problems.extend(validation_messages(e)),
      }
    }

    if problems.is_empty() {
      Ok(builder.build())
    } else {
      Err(Error::Validation(problems))
    }
  }
}

fn validation_messages(err: Error) -> Vec<String> {
  match err {
    Error::Validation(messages) => messages,
    other => vec![other.to_string()],
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_every_status_renders_its_clause() {
    let expected = [
      ("Open", Some("status = Open")),
      ("In Progress", Some("status = 'In Progress'")),
      ("Resolved", Some("status = Resolved")),
      ("All", None),
      ("All Open", Some("status in (Open, 'In Progress')")),
    ];
    for (label, clause) in expected {
      let status: StatusFilter = label.parse().unwrap();
      assert_eq!(status.clause().as_deref(), clause, "status {}", label);
    }
  }

  #[test]
  fn test_status_parse_is_case_insensitive() {
    assert_eq!("all open".parse::<StatusFilter>().unwrap(), StatusFilter::AllOpen);
  }

  #[test]
  fn test_invalid_status_produces_no_query() {
    let filter = QueryFilter {
      assignee: Some("b07507".into()),
      status: Some("Closed".into()),
      ..QueryFilter::default()
    };
    match filter.to_jql() {
      Err(Error::Validation(messages)) => {
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Closed"));
        assert!(messages[0].contains("All Open"));
      }
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn test_time_tokens_accepted() {
    for window in ["1d", "-1w", "+12h", "-30m", "2y", "-1w -2d", "  -5d  "] {
      assert!(window.parse::<TimeWindow>().is_ok(), "window {}", window);
    }
  }

  #[test]
  fn test_one_bad_token_rejects_window() {
    for window in [
      "-1w 2x", "w", "-1", "1.5d", "-1w|2d", "|1d", "", "1 d", "-\u{661}w", "\u{ff11}d",
    ] {
      assert!(window.parse::<TimeWindow>().is_err(), "window {:?}", window);
    }
  }

  #[test]
  fn test_bad_tokens_are_all_reported() {
    match "-1q 2d 3z".parse::<TimeWindow>() {
      Err(Error::Validation(messages)) => assert_eq!(messages.len(), 2),
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn test_event_vocabulary() {
    assert_eq!("resolved".parse::<EventType>().unwrap(), EventType::Resolved);
    assert!("deleted".parse::<EventType>().is_err());
  }

  #[test]
  fn test_clause_order() {
    let filter = QueryFilter {
      assignee: Some("b07507".into()),
      project: Some("ISC".into()),
      status: Some("All Open".into()),
      time: Some("-1w".into()),
      event: Some("updated".into()),
    };
    assert_eq!(
      filter.to_jql().unwrap(),
      "assignee = B07507 AND project = ISC AND status in (Open, 'In Progress') AND updated <= '-1w'"
    );
  }

  #[test]
  fn test_status_all_omits_clause() {
    let filter = QueryFilter {
      project: Some("ISC".into()),
      status: Some("All".into()),
      ..QueryFilter::default()
    };
    assert_eq!(filter.to_jql().unwrap(), "project = ISC");
  }

  #[test]
  fn test_event_defaults_to_created() {
    let filter = QueryFilter {
      time: Some("-2d".into()),
      ..QueryFilter::default()
    };
    assert_eq!(filter.to_jql().unwrap(), "created <= '-2d'");
  }

  #[test]
  fn test_all_problems_collected() {
    let filter = QueryFilter {
      status: Some("Nope".into()),
      time: Some("soon".into()),
      event: Some("closed".into()),
      ..QueryFilter::default()
    };
    match filter.to_jql() {
      Err(Error::Validation(messages)) => assert_eq!(messages.len(), 3),
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn test_values_with_spaces_are_quoted() {
    let jql = JqlBuilder::new().project("My Project").build();
    assert_eq!(jql, "project = 'My Project'");
  }
}
