//! Project and issue type snapshots pulled from the tracker.

use regex::RegexBuilder;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::jira::{IssueType, Project, Tracker};

/// Outcome of a metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
  Found(T),
  /// More than one entry matched; all matches in key order
  Ambiguous(Vec<T>),
  /// Nothing matched; `candidates` lists every known key
  NotFound { candidates: Vec<String> },
}

impl<T> Lookup<T> {
  pub fn found(self) -> Option<T> {
    match self {
      Lookup::Found(value) => Some(value),
      _ => None,
    }
  }

  pub fn is_found(&self) -> bool {
    matches!(self, Lookup::Found(_))
  }

  fn from_matches(mut matches: Vec<T>, candidates: impl FnOnce() -> Vec<String>) -> Self {
    match matches.len() {
      0 => Lookup::NotFound {
        candidates: candidates(),
      },
      1 => Lookup::Found(matches.remove(0)),
      _ => Lookup::Ambiguous(matches),
    }
  }
}

/// How a project is referred to: by key or by numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
  Key(String),
  Id(u64),
}

impl From<&str> for ProjectRef {
  /// Numeric strings are treated as ids.
  fn from(s: &str) -> Self {
    let s = s.trim();
    match s.parse::<u64>() {
      Ok(id) => ProjectRef::Id(id),
      Err(_) => ProjectRef::Key(s.to_string()),
    }
  }
}

impl From<String> for ProjectRef {
  fn from(s: String) -> Self {
    ProjectRef::from(s.as_str())
  }
}

impl From<u64> for ProjectRef {
  fn from(id: u64) -> Self {
    ProjectRef::Id(id)
  }
}

impl fmt::Display for ProjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProjectRef::Key(key) => f.write_str(key),
      ProjectRef::Id(id) => write!(f, "{}", id),
    }
  }
}

/// Case-insensitive regex match over `names`, falling back to a plain
/// substring match when `pattern` is not a valid regex.
fn matching_names<'a>(names: impl Iterator<Item = &'a String>, pattern: &str) -> Vec<&'a String> {
  match RegexBuilder::new(pattern).case_insensitive(true).build() {
    Ok(re) => names.filter(|name| re.is_match(name)).collect(),
    Err(_) => {
      let needle = pattern.to_lowercase();
      names
        .filter(|name| name.to_lowercase().contains(&needle))
        .collect()
    }
  }
}

/// Project map keyed by project key and issue type map keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
  projects: BTreeMap<String, Project>,
  issue_types: BTreeMap<String, IssueType>,
}

impl MetadataCache {
  pub fn new(projects: Vec<Project>, issue_types: Vec<IssueType>) -> Self {
    Self {
      projects: projects.into_iter().map(|p| (p.key.clone(), p)).collect(),
      issue_types: issue_types
        .into_iter()
        .map(|t| (t.name.clone(), t))
        .collect(),
    }
  }

  /// Pull fresh snapshots of both maps from the tracker.
  pub async fn load<T: Tracker>(client: &T) -> Result<Self> {
    let projects = client.list_projects().await?;
    let issue_types = client.list_issue_types().await?;
    debug!(
      projects = projects.len(),
      issue_types = issue_types.len(),
      "loaded tracker metadata"
    );
    Ok(Self::new(projects, issue_types))
  }

  pub fn projects(&self) -> &BTreeMap<String, Project> {
    &self.projects
  }

  pub fn issue_types(&self) -> &BTreeMap<String, IssueType> {
    &self.issue_types
  }

  pub fn project_keys(&self) -> Vec<String> {
    self.projects.keys().cloned().collect()
  }

  pub fn issue_type_names(&self) -> Vec<String> {
    self.issue_types.keys().cloned().collect()
  }

  /// Issue type name to numeric id.
  pub fn issue_type_mapping(&self) -> BTreeMap<String, u64> {
    self
      .issue_types
      .iter()
      .map(|(name, t)| (name.clone(), t.id))
      .collect()
  }

  /// Exact issue type name match.
  pub fn issue_type(&self, name: &str) -> Option<&IssueType> {
    self.issue_types.get(name)
  }

  /// Resolve a project by exact key or numeric id, falling back to a pattern
  /// match over keys when no key matches exactly.
  pub fn lookup_project(&self, reference: impl Into<ProjectRef>) -> Lookup<Project> {
    let reference = reference.into();
    let lookup = match &reference {
      ProjectRef::Key(key) if key.trim().is_empty() => Lookup::NotFound {
        candidates: self.project_keys(),
      },
      ProjectRef::Key(key) => match self.projects.get(key) {
        Some(project) => Lookup::Found(project.clone()),
        None => self.projects_matching(key),
      },
      ProjectRef::Id(id) => Lookup::from_matches(
        self
          .projects
          .values()
          .filter(|p| p.id == *id)
          .cloned()
          .collect(),
        || self.project_keys(),
      ),
    };
    self.warn_unresolved("project", &reference.to_string(), &lookup, |p| &p.key);
    lookup
  }

  /// Projects whose key matches `pattern` (case-insensitive regex).
  pub fn projects_matching(&self, pattern: &str) -> Lookup<Project> {
    let matches = matching_names(self.projects.keys(), pattern)
      .into_iter()
      .filter_map(|key| self.projects.get(key).cloned())
      .collect();
    Lookup::from_matches(matches, || self.project_keys())
  }

  /// Resolve an issue type by exact name, falling back to a pattern match.
  pub fn lookup_issue_type(&self, pattern: &str) -> Lookup<IssueType> {
    let lookup = if pattern.trim().is_empty() {
      Lookup::NotFound {
        candidates: self.issue_type_names(),
      }
    } else {
      match self.issue_types.get(pattern) {
        Some(issue_type) => Lookup::Found(issue_type.clone()),
        None => self.issue_types_matching(pattern),
      }
    };
    self.warn_unresolved("issue type", pattern, &lookup, |t| &t.name);
    lookup
  }

  /// Issue types whose name matches `pattern` (case-insensitive regex).
  pub fn issue_types_matching(&self, pattern: &str) -> Lookup<IssueType> {
    let matches = matching_names(self.issue_types.keys(), pattern)
      .into_iter()
      .filter_map(|name| self.issue_types.get(name).cloned())
      .collect();
    Lookup::from_matches(matches, || self.issue_type_names())
  }

  /// Resolve a project or fail with a lookup error naming the candidates.
  pub fn require_project(&self, reference: impl Into<ProjectRef>) -> Result<Project> {
    let reference = reference.into();
    let query = reference.to_string();
    match self.lookup_project(reference) {
      Lookup::Found(project) => Ok(project),
      Lookup::Ambiguous(matches) => Err(Error::Lookup {
        what: "unique project",
        query,
        candidates: matches.into_iter().map(|p| p.key).collect(),
      }),
      Lookup::NotFound { candidates } => Err(Error::Lookup {
        what: "project",
        query,
        candidates,
      }),
    }
  }

  fn warn_unresolved<T>(
    &self,
    what: &str,
    query: &str,
    lookup: &Lookup<T>,
    name: impl Fn(&T) -> &String,
  ) {
    match lookup {
      Lookup::Found(_) => {}
      Lookup::Ambiguous(matches) => {
        let names: Vec<&str> = matches.iter().map(|m| name(m).as_str()).collect();
        warn!(
          "found more than one {} using '{}', refine your search from {}",
          what,
          query,
          names.join(", ")
        );
      }
      Lookup::NotFound { candidates } => {
        warn!(
          "found no {} using '{}', choose from {}",
          what,
          query,
          candidates.join(", ")
        );
      }
    }
  }
}
