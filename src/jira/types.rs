use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Issues keyed by issue key, iterated in key order.
pub type IssueMap = BTreeMap<String, Issue>;

/// Project snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
  pub id: u64,
  pub key: String,
  pub name: String,
  /// REST resource URL of the project, when the tracker reports one
  pub url: Option<String>,
}

/// Issue type snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueType {
  pub id: u64,
  pub name: String,
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  /// Login name (on-premise) or account id (cloud)
  pub name: String,
  pub email: Option<String>,
  pub display_name: Option<String>,
}

/// Full issue as returned by search, create and save
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
  pub key: String,
  pub id: String,
  pub summary: String,
  pub description: Option<String>,
  pub status: String,
  pub issue_type: Option<IssueType>,
  pub assignee: Option<User>,
  /// Every other field the tracker returned, untyped
  pub fields: Map<String, Value>,
}

impl Issue {
  pub fn assignee_name(&self) -> &str {
    self.assignee.as_ref().map(|u| u.name.as_str()).unwrap_or("")
  }
}

/// Options passed through to a search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
  /// Fields to return; empty means the tracker's default set
  pub fields: Vec<String>,
  pub start_at: u64,
  pub max_results: u64,
}

/// Upper bound on issues pulled by a single search.
pub const MAX_ISSUES: u64 = 100_000;

impl Default for SearchOptions {
  fn default() -> Self {
    Self {
      fields: Vec::new(),
      start_at: 0,
      max_results: MAX_ISSUES,
    }
  }
}

impl SearchOptions {
  pub fn with_max_results(max_results: u64) -> Self {
    Self {
      max_results,
      ..Self::default()
    }
  }
}
