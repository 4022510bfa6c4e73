//! In-memory tracker used by the unit tests.
//!
//! Understands the subset of JQL the query builder emits: clauses joined by
//! `AND`, `field = value`, `status in (...)`, and relative time clauses (which
//! match everything).

use serde_json::{Map, Value};
use std::sync::Mutex;

use super::tracker::Tracker;
use super::types::{Issue, IssueType, Project, SearchOptions, User};
use crate::error::{Error, Result};

#[derive(Default)]
struct State {
  issues: Vec<Issue>,
  next_number: u64,
  calls: Vec<&'static str>,
  queries: Vec<String>,
  fail_next: bool,
}

pub struct FakeTracker {
  projects: Vec<Project>,
  issue_types: Vec<IssueType>,
  state: Mutex<State>,
}

pub fn project(id: u64, key: &str, name: &str) -> Project {
  Project {
    id,
    key: key.to_string(),
    name: name.to_string(),
    url: None,
  }
}

pub fn issue_type(id: u64, name: &str) -> IssueType {
  IssueType {
    id,
    name: name.to_string(),
    description: format!("{} issues", name),
  }
}

pub fn issue(key: &str, assignee: Option<&str>, status: &str, summary: &str) -> Issue {
  Issue {
    key: key.to_string(),
    id: String::new(),
    summary: summary.to_string(),
    description: Some(format!("{} description", key)),
    status: status.to_string(),
    issue_type: None,
    assignee: assignee.map(|name| User {
      name: name.to_string(),
      email: None,
      display_name: None,
    }),
    fields: Map::new(),
  }
}

impl FakeTracker {
  /// Two projects (ISC, APEX), three issue types and a handful of issues.
  pub fn seeded() -> Self {
    Self::new(
      vec![
        project(11020, "ISC", "Information Supply Chain"),
        project(11030, "APEX", "Apex"),
      ],
      vec![
        issue_type(1, "Bug"),
        issue_type(4, "Improvement"),
        issue_type(7, "Requirement"),
      ],
      vec![
        issue("ISC-463", Some("B07507"), "Open", "Add in Jira API"),
        issue("ISC-470", Some("B07507"), "Resolved", "Fix login page"),
        issue("ISC-471", Some("X11111"), "In Progress", "Speed up sync"),
        issue("ISC-480", None, "Open", "Unassigned work"),
        issue("APEX-12", Some("X11111"), "Open", "Tune the pipeline"),
        issue("APEX-13", Some("X22222"), "In Progress", "Document release"),
      ],
    )
  }

  pub fn new(projects: Vec<Project>, issue_types: Vec<IssueType>, issues: Vec<Issue>) -> Self {
    Self {
      projects,
      issue_types,
      state: Mutex::new(State {
        issues,
        next_number: 1000,
        ..State::default()
      }),
    }
  }

  pub fn calls(&self) -> Vec<&'static str> {
    self.state.lock().unwrap().calls.clone()
  }

  pub fn queries(&self) -> Vec<String> {
    self.state.lock().unwrap().queries.clone()
  }

  /// Make the next remote call fail.
  pub fn fail_next(&self) {
    self.state.lock().unwrap().fail_next = true;
  }

  /// Add an issue behind the session's back.
  pub fn insert(&self, issue: Issue) {
    self.state.lock().unwrap().issues.push(issue);
  }

  fn record(&self, call: &'static str) -> Result<std::sync::MutexGuard<'_, State>> {
    let mut state = self.state.lock().unwrap();
    state.calls.push(call);
    if state.fail_next {
      state.fail_next = false;
      return Err(Error::remote(call, "connection reset"));
    }
    Ok(state)
  }

  fn project_key_for(&self, reference: &str) -> Option<String> {
    self
      .projects
      .iter()
      .find(|p| p.key == reference || p.id.to_string() == reference)
      .map(|p| p.key.clone())
  }
}

fn unquote(value: &str) -> &str {
  value.trim().trim_matches('\'').trim_matches('"')
}

fn issue_project(issue: &Issue) -> &str {
  issue.key.split('-').next().unwrap_or("")
}

fn clause_matches(fake: &FakeTracker, issue: &Issue, clause: &str) -> bool {
  if let Some(list) = clause.strip_prefix("status in (") {
    let list = list.trim_end_matches(')');
    return list.split(',').any(|s| unquote(s) == issue.status);
  }

  let Some((field, value)) = clause.split_once(" = ") else {
    // Relative time clauses such as `created <= '-1w'`
    return true;
  };
  let value = unquote(value);

  match field.trim() {
    "assignee" => issue.assignee_name().eq_ignore_ascii_case(value),
    "status" => issue.status == value,
    "project" => fake
      .project_key_for(value)
      .is_some_and(|key| key == issue_project(issue)),
    _ => false,
  }
}

fn field_str<'a>(fields: &'a Value, path: &[&str]) -> Option<&'a str> {
  path
    .iter()
    .try_fold(fields, |v, segment| v.get(segment))
    .and_then(|v| v.as_str())
}

impl Tracker for FakeTracker {
  async fn list_projects(&self) -> Result<Vec<Project>> {
    self.record("list_projects")?;
    Ok(self.projects.clone())
  }

  async fn list_issue_types(&self) -> Result<Vec<IssueType>> {
    self.record("list_issue_types")?;
    Ok(self.issue_types.clone())
  }

  async fn search(&self, jql: &str, options: &SearchOptions) -> Result<Vec<Issue>> {
    let mut state = self.record("search")?;
    state.queries.push(jql.to_string());
    let found = state
      .issues
      .iter()
      .filter(|issue| jql.split(" AND ").all(|c| clause_matches(self, issue, c)))
      .skip(options.start_at as usize)
      .take(options.max_results as usize)
      .cloned()
      .collect();
    Ok(found)
  }

  async fn create_issue(&self, fields: Value) -> Result<Issue> {
    let project = field_str(&fields, &["fields", "project", "key"])
      .or_else(|| field_str(&fields, &["fields", "project", "id"]))
      .and_then(|p| self.project_key_for(p))
      .ok_or_else(|| Error::remote("create_issue", "project is required"))?;
    let type_name = field_str(&fields, &["fields", "issuetype", "name"]).map(str::to_string);

    let mut state = self.record("create_issue")?;
    state.next_number += 1;
    let mut created = issue(
      &format!("{}-{}", project, state.next_number),
      field_str(&fields, &["fields", "assignee", "name"]),
      "Open",
      field_str(&fields, &["fields", "summary"]).unwrap_or_default(),
    );
    created.description = field_str(&fields, &["fields", "description"]).map(str::to_string);
    created.issue_type = type_name.and_then(|name| {
      self
        .issue_types
        .iter()
        .find(|t| t.name == name)
        .cloned()
    });
    if let Some(Value::Object(payload)) = fields.get("fields") {
      for (name, value) in payload {
        created.fields.insert(name.clone(), value.clone());
      }
    }
    state.issues.push(created.clone());
    Ok(created)
  }

  async fn save_issue(&self, issue: &Issue, fields: Value) -> Result<Issue> {
    let mut state = self.record("save_issue")?;
    let stored = state
      .issues
      .iter_mut()
      .find(|i| i.key == issue.key)
      .ok_or_else(|| Error::remote("save_issue", "issue does not exist"))?;
    if let Some(summary) = field_str(&fields, &["fields", "summary"]) {
      stored.summary = summary.to_string();
    }
    if let Some(description) = field_str(&fields, &["fields", "description"]) {
      stored.description = Some(description.to_string());
    }
    if let Some(name) = field_str(&fields, &["fields", "assignee", "name"]) {
      stored.assignee = Some(User {
        name: name.to_string(),
        email: None,
        display_name: None,
      });
    }
    Ok(stored.clone())
  }

  async fn delete_issue(&self, issue: &Issue) -> Result<bool> {
    let mut state = self.record("delete_issue")?;
    let before = state.issues.len();
    state.issues.retain(|i| i.key != issue.key);
    Ok(state.issues.len() < before)
  }
}
