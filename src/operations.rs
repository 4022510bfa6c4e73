//! Create, update and delete issues through a [`Session`].
//!
//! None of these touch the session's cached issue set; call
//! [`Session::refresh`] to observe their effects there.

use serde_json::{json, Map, Value};
use std::fmt;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::jira::{Issue, Tracker};
use crate::metadata::ProjectRef;
use crate::session::Session;

/// Priority id given to new issues when none is set.
pub const DEFAULT_PRIORITY: u32 = 3;

/// A component reference: numeric values are ids, anything else a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
  Id(u64),
  Name(String),
}

impl From<&str> for Component {
  fn from(s: &str) -> Self {
    let s = s.trim();
    match s.parse::<u64>() {
      Ok(id) => Component::Id(id),
      Err(_) => Component::Name(s.to_string()),
    }
  }
}

impl Component {
  fn to_field(&self) -> Value {
    match self {
      Component::Id(id) => json!({ "id": id.to_string() }),
      Component::Name(name) => json!({ "name": name }),
    }
  }
}

impl fmt::Display for Component {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Component::Id(id) => write!(f, "{}", id),
      Component::Name(name) => f.write_str(name),
    }
  }
}

/// Field values for a new or updated issue. Unset fields are left out of
/// the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueOptions {
  /// Project key, or numeric project id
  pub project: Option<String>,
  /// Issue type name; must exist in the session's metadata
  pub issue_type: Option<String>,
  pub summary: Option<String>,
  pub description: Option<String>,
  pub assignee: Option<String>,
  pub priority: Option<u32>,
  pub components: Vec<Component>,
}

fn expect_string(name: &str, value: &Value, problems: &mut Vec<String>) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    other => {
      problems.push(format!("issue option '{}' must be a string, got {}", name, other));
      None
    }
  }
}

fn component_from_value(value: &Value, problems: &mut Vec<String>) -> Option<Component> {
  match value {
    Value::String(s) => Some(Component::from(s.as_str())),
    Value::Number(n) => match n.as_u64() {
      Some(id) => Some(Component::Id(id)),
      None => {
        problems.push(format!("component id '{}' must be a positive integer", n));
        None
      }
    },
    other => {
      problems.push(format!(
        "component '{}' must be a string or an integer",
        other
      ));
      None
    }
  }
}

impl IssueOptions {
  /// Build options from loosely typed name/value pairs.
  ///
  /// Recognized names are type-checked and every mismatch is reported in one
  /// [`Error::Validation`]. Unrecognized names are logged and dropped.
  pub fn from_values<I, K>(values: I) -> Result<Self>
  where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
  {
    let mut options = IssueOptions::default();
    let mut problems = Vec::new();

    for (name, value) in values {
      let name = name.as_ref();
      match name {
        "project" => match &value {
          Value::Number(n) if n.is_u64() => options.project = Some(n.to_string()),
          other => options.project = expect_string(name, other, &mut problems),
        },
        "type" | "issuetype" => options.issue_type = expect_string(name, &value, &mut problems),
        "summary" => options.summary = expect_string(name, &value, &mut problems),
        "description" => options.description = expect_string(name, &value, &mut problems),
        "assignee" => options.assignee = expect_string(name, &value, &mut problems),
        "priority" => {
          let parsed = match &value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
          };
          match parsed {
            Some(priority) => options.priority = Some(priority),
            None => problems.push(format!("priority '{}' must be a positive integer", value)),
          }
        }
        "components" | "component" => {
          let items = match value {
            Value::Array(items) => items,
            single => vec![single],
          };
          options.components = items
            .iter()
            .filter_map(|item| component_from_value(item, &mut problems))
            .collect();
        }
        unknown => warn!("issue option '{}' is not recognized, dropping it", unknown),
      }
    }

    if problems.is_empty() {
      Ok(options)
    } else {
      Err(Error::Validation(problems))
    }
  }
}

/// The `project` payload entry: `{"id": ...}` or `{"key": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProjectField {
  attr: &'static str,
  value: String,
}

impl From<ProjectRef> for ProjectField {
  fn from(reference: ProjectRef) -> Self {
    match reference {
      ProjectRef::Id(id) => ProjectField {
        attr: "id",
        value: id.to_string(),
      },
      ProjectRef::Key(key) => ProjectField {
        attr: "key",
        value: key,
      },
    }
  }
}

/// Map options onto the nested shape the tracker expects under `fields`.
fn assemble_fields(options: &IssueOptions, project: Option<&ProjectField>) -> Value {
  let mut fields = Map::new();

  if let Some(project) = project {
    let mut reference = Map::new();
    reference.insert(project.attr.to_string(), json!(project.value));
    fields.insert("project".to_string(), Value::Object(reference));
  }
  if let Some(summary) = &options.summary {
    fields.insert("summary".to_string(), json!(summary));
  }
  if let Some(description) = &options.description {
    fields.insert("description".to_string(), json!(description));
  }
  if let Some(issue_type) = &options.issue_type {
    fields.insert("issuetype".to_string(), json!({ "name": issue_type }));
  }
  if let Some(assignee) = &options.assignee {
    fields.insert("assignee".to_string(), json!({ "name": assignee }));
  }
  if let Some(priority) = options.priority {
    fields.insert("priority".to_string(), json!({ "id": priority.to_string() }));
  }
  if !options.components.is_empty() {
    let components: Vec<Value> = options.components.iter().map(Component::to_field).collect();
    fields.insert("components".to_string(), Value::Array(components));
  }

  json!({ "fields": fields })
}

impl<T: Tracker> Session<T> {
  fn with_create_defaults(&self, options: &IssueOptions) -> IssueOptions {
    let defaults = self.defaults();
    let mut merged = options.clone();
    if merged.assignee.is_none() {
      merged.assignee = defaults.assignee.as_ref().map(|a| a.to_uppercase());
    }
    if merged.priority.is_none() {
      merged.priority = Some(DEFAULT_PRIORITY);
    }
    if merged.components.is_empty() {
      if let Some(component) = &defaults.component {
        merged.components.push(Component::from(component.as_str()));
      }
    }
    merged
  }

  /// Check field values against session metadata, collecting every problem.
  fn check_issue_args(
    &self,
    options: &IssueOptions,
    creating: bool,
    problems: &mut Vec<String>,
  ) -> Option<ProjectField> {
    let metadata = self.metadata();

    match &options.issue_type {
      Some(name) if metadata.issue_type(name).is_some() => {}
      Some(name) => problems.push(format!(
        "issue type '{}' is not valid, choose from {}",
        name,
        metadata.issue_type_names().join(", ")
      )),
      None if creating => problems.push(format!(
        "an issue type is required, choose from {}",
        metadata.issue_type_names().join(", ")
      )),
      None => {}
    }

    match &options.summary {
      Some(summary) if summary.trim().is_empty() => {
        problems.push("summary must not be empty".to_string())
      }
      None if creating => problems.push("a summary is required".to_string()),
      _ => {}
    }

    let reference = match (&options.project, self.current_project()) {
      (Some(project), _) => Some(ProjectRef::from(project.as_str())),
      (None, Some(current)) if creating => Some(ProjectRef::Id(current.id)),
      (None, _) if creating => {
        problems.push("a project must be given or a current project set".to_string());
        None
      }
      (None, _) => None,
    };

    let reference = reference?;
    let known = match &reference {
      ProjectRef::Key(key) => metadata.projects().contains_key(key),
      ProjectRef::Id(id) => metadata.projects().values().any(|p| p.id == *id),
    };
    if !known {
      problems.push(format!(
        "project '{}' is not valid, choose from {}",
        reference,
        metadata.project_keys().join(", ")
      ));
    }
    Some(ProjectField::from(reference))
  }

  fn cached_issue(&self, key: &str, action: &str) -> Result<Issue> {
    if self.current_project().is_none() {
      return Err(Error::precondition(format!(
        "cannot {} issue '{}', set the current project first",
        action, key
      )));
    }
    self.issue(key).cloned().ok_or_else(|| Error::Lookup {
      what: "issue",
      query: key.to_string(),
      candidates: self.issues().keys().cloned().collect(),
    })
  }

  /// Create an issue in the given project, or the current one.
  ///
  /// Defaults (assignee, priority, component) are merged first, then every
  /// field is validated; nothing is sent if any check fails.
  pub async fn create_issue(&self, options: &IssueOptions) -> Result<Issue> {
    let options = self.with_create_defaults(options);
    let mut problems = Vec::new();
    let project = self.check_issue_args(&options, true, &mut problems);
    if !problems.is_empty() {
      return Err(Error::Validation(problems));
    }
    let client = self.require_client()?;

    let payload = assemble_fields(&options, project.as_ref());
    let issue = client.create_issue(payload).await?;
    info!(key = %issue.key, "created issue");
    Ok(issue)
  }

  /// Save changed fields onto an issue from the cached set.
  pub async fn update_issue(&self, key: &str, options: &IssueOptions) -> Result<Issue> {
    let issue = self.cached_issue(key, "update")?;
    let mut problems = Vec::new();
    let project = self.check_issue_args(options, false, &mut problems);
    if !problems.is_empty() {
      return Err(Error::Validation(problems));
    }
    let client = self.require_client()?;

    let payload = assemble_fields(options, project.as_ref());
    let updated = client.save_issue(&issue, payload).await?;
    info!(key = %updated.key, "updated issue");
    Ok(updated)
  }

  /// Delete an issue from the cached set on the tracker.
  pub async fn delete_issue(&self, key: &str) -> Result<bool> {
    let issue = self.cached_issue(key, "delete")?;
    let client = self.require_client()?;
    let deleted = client.delete_issue(&issue).await?;
    info!(key = %key, deleted, "deleted issue");
    Ok(deleted)
  }
}
