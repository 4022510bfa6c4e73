//! The capability boundary between the session and a remote tracker.

use serde_json::Value;

use super::types::{Issue, IssueType, Project, SearchOptions};
use crate::error::Result;

/// Remote issue tracker operations consumed by [`crate::session::Session`].
///
/// Implementations map these onto a transport; the session only ever awaits
/// them one at a time.
#[allow(async_fn_in_trait)]
pub trait Tracker {
  /// All projects visible to the authenticated user
  async fn list_projects(&self) -> Result<Vec<Project>>;

  /// All issue types known to the tracker
  async fn list_issue_types(&self) -> Result<Vec<IssueType>>;

  /// Run a JQL search
  async fn search(&self, jql: &str, options: &SearchOptions) -> Result<Vec<Issue>>;

  /// Create an issue from an assembled `{"fields": {...}}` payload
  async fn create_issue(&self, fields: Value) -> Result<Issue>;

  /// Save an assembled `{"fields": {...}}` payload onto an existing issue
  async fn save_issue(&self, issue: &Issue, fields: Value) -> Result<Issue>;

  /// Delete an issue, returning whether the tracker reported success
  async fn delete_issue(&self, issue: &Issue) -> Result<bool>;
}
