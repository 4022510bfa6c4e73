//! The session context: tracker client, metadata and the current project's
//! issue set.
//!
//! A [`Session`] is either in `NoProject` or `ProjectSelected`. The selected
//! project and its issues live together in one [`Selection`] value, so
//! switching or refreshing replaces both in a single assignment and a reader
//! can never observe issues from a project other than the current one.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::jira::{Issue, IssueMap, Project, SearchOptions, Tracker, MAX_ISSUES};
use crate::metadata::{Lookup, MetadataCache, ProjectRef};
use crate::query::{JqlBuilder, QueryFilter, StatusFilter};
use crate::report;

static NO_ISSUES: IssueMap = BTreeMap::new();

/// Values applied when an operation's options leave them unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
  /// Assignee for `my_issues`, `latest_issues` and new issues
  pub assignee: Option<String>,
  /// Component attached to new issues
  pub component: Option<String>,
  /// Bound passed to every search
  pub max_results: u64,
}

impl Default for SessionDefaults {
  fn default() -> Self {
    Self {
      assignee: None,
      component: None,
      max_results: MAX_ISSUES,
    }
  }
}

/// Options for [`Session::my_issues`].
#[derive(Debug, Clone, Default)]
pub struct MyIssuesOptions {
  /// Defaults to the session's default assignee
  pub assignee: Option<String>,
  /// Defaults to the current project, if any
  pub project: Option<String>,
  /// Defaults to `All Open`
  pub status: Option<String>,
  /// Print the result as a table
  pub verbose: bool,
}

/// Options for [`Session::latest_issues`].
#[derive(Debug, Clone, Default)]
pub struct LatestIssuesOptions {
  /// Defaults to the session's default assignee; omitted when neither is set
  pub assignee: Option<String>,
  /// Defaults to `created`
  pub event: Option<String>,
  pub verbose: bool,
}

#[derive(Debug, Clone, Default)]
enum Selection {
  #[default]
  NoProject,
  ProjectSelected { project: Project, issues: IssueMap },
}

fn into_issue_map(issues: Vec<Issue>) -> IssueMap {
  issues.into_iter().map(|i| (i.key.clone(), i)).collect()
}

pub struct Session<T> {
  client: Option<T>,
  site: Option<String>,
  metadata: MetadataCache,
  selection: Selection,
  defaults: SessionDefaults,
}

impl<T: Tracker> Session<T> {
  /// A session with no client attached yet.
  pub fn new(defaults: SessionDefaults) -> Self {
    Self {
      client: None,
      site: None,
      metadata: MetadataCache::default(),
      selection: Selection::NoProject,
      defaults,
    }
  }

  /// Attach `client` and load project and issue type metadata from it.
  pub async fn launch(
    client: T,
    site: impl Into<String>,
    defaults: SessionDefaults,
  ) -> Result<Self> {
    let mut session = Self::new(defaults);
    session.attach(client, site).await?;
    Ok(session)
  }

  /// Replace the client. Metadata is reloaded and the current project is
  /// cleared, since its issues came from the previous client.
  pub async fn attach(&mut self, client: T, site: impl Into<String>) -> Result<()> {
    let metadata = MetadataCache::load(&client).await?;
    let site = site.into();
    info!(site = %site, projects = metadata.projects().len(), "session attached");
    self.metadata = metadata;
    self.client = Some(client);
    self.site = Some(site);
    self.selection = Selection::NoProject;
    Ok(())
  }

  pub fn client(&self) -> Option<&T> {
    self.client.as_ref()
  }

  pub fn site(&self) -> Option<&str> {
    self.site.as_deref()
  }

  pub fn metadata(&self) -> &MetadataCache {
    &self.metadata
  }

  pub fn defaults(&self) -> &SessionDefaults {
    &self.defaults
  }

  pub fn current_project(&self) -> Option<&Project> {
    match &self.selection {
      Selection::NoProject => None,
      Selection::ProjectSelected { project, .. } => Some(project),
    }
  }

  /// The current project's cached issues; empty when no project is selected.
  pub fn issues(&self) -> &IssueMap {
    match &self.selection {
      Selection::NoProject => &NO_ISSUES,
      Selection::ProjectSelected { issues, .. } => issues,
    }
  }

  /// Same as [`Session::issues`], also printing the table when `verbose`.
  pub fn list_issues(&self, verbose: bool) -> &IssueMap {
    let issues = self.issues();
    if verbose {
      self.show(issues);
    }
    issues
  }

  pub fn issue(&self, key: &str) -> Option<&Issue> {
    self.issues().get(key)
  }

  /// Render `issues` as a table headed by the current project.
  pub fn render(&self, issues: &IssueMap) -> String {
    report::render_issue_table(self.current_project(), issues)
  }

  /// Print `issues` as a table on stdout.
  pub fn show(&self, issues: &IssueMap) {
    println!("{}", self.render(issues));
  }

  pub(crate) fn require_client(&self) -> Result<&T> {
    self
      .client
      .as_ref()
      .ok_or_else(|| Error::precondition("no tracker client connected"))
  }

  fn search_options(&self) -> SearchOptions {
    SearchOptions::with_max_results(self.defaults.max_results)
  }

  async fn project_issues(&self, client: &T, project: &Project) -> Result<IssueMap> {
    let jql = JqlBuilder::new().project(&project.key).build();
    debug!(jql = %jql, "loading project issues");
    let issues = client.search(&jql, &self.search_options()).await?;
    Ok(into_issue_map(issues))
  }

  /// Make `reference` the current project and load its issues.
  ///
  /// When the reference is unknown or ambiguous the session drops back to
  /// no project and the lookup result is returned as-is. A remote failure
  /// leaves the previous selection untouched.
  pub async fn select_project(
    &mut self,
    reference: impl Into<ProjectRef>,
  ) -> Result<Lookup<Project>> {
    let client = self.require_client()?;
    let lookup = self.metadata.lookup_project(reference);

    let Lookup::Found(project) = &lookup else {
      info!("no current project");
      self.selection = Selection::NoProject;
      return Ok(lookup);
    };

    let issues = self.project_issues(client, project).await?;
    info!(project = %project.key, issues = issues.len(), "current project set");
    self.selection = Selection::ProjectSelected {
      project: project.clone(),
      issues,
    };
    Ok(lookup)
  }

  /// Re-pull metadata and the current project's issues.
  pub async fn refresh(&mut self) -> Result<()> {
    let mut missing = Vec::new();
    if self.current_project().is_none() {
      missing.push("refresh needs a current project to be set".to_string());
    }
    if self.client.is_none() {
      missing.push("refresh needs a tracker client to be connected".to_string());
    }
    let (Some(project), Some(client)) = (self.current_project(), self.client.as_ref()) else {
      return Err(Error::Precondition(missing));
    };

    let metadata = MetadataCache::load(client).await?;
    let project = metadata
      .projects()
      .get(&project.key)
      .cloned()
      .unwrap_or_else(|| project.clone());
    let issues = self.project_issues(client, &project).await?;

    info!(project = %project.key, issues = issues.len(), "session refreshed");
    self.metadata = metadata;
    self.selection = Selection::ProjectSelected { project, issues };
    Ok(())
  }

  fn default_assignee(&self, explicit: Option<&String>) -> Option<String> {
    explicit.or(self.defaults.assignee.as_ref()).cloned()
  }

  /// Issues assigned to a user, restricted to the current project unless a
  /// project is given. The cached issue set is not touched.
  pub async fn my_issues(&self, options: &MyIssuesOptions) -> Result<IssueMap> {
    let assignee = self
      .default_assignee(options.assignee.as_ref())
      .ok_or_else(|| Error::Validation(vec!["an assignee is required".to_string()]))?;

    let filter = QueryFilter {
      assignee: Some(assignee),
      project: options
        .project
        .clone()
        .or_else(|| self.current_project().map(|p| p.key.clone())),
      status: Some(
        options
          .status
          .clone()
          .unwrap_or_else(|| StatusFilter::AllOpen.label().to_string()),
      ),
      ..QueryFilter::default()
    };
    let jql = filter.to_jql()?;
    let client = self.require_client()?;

    debug!(jql = %jql, "searching assigned issues");
    let issues = into_issue_map(client.search(&jql, &self.search_options()).await?);
    if options.verbose {
      self.show(&issues);
    }
    Ok(issues)
  }

  /// Issues in the current project whose `event` timestamp falls in `time`.
  pub async fn latest_issues(
    &self,
    time: &str,
    options: &LatestIssuesOptions,
  ) -> Result<IssueMap> {
    let mut missing = Vec::new();
    if self.current_project().is_none() {
      missing.push("latest issues needs a current project to be set".to_string());
    }
    if self.client.is_none() {
      missing.push("latest issues needs a tracker client to be connected".to_string());
    }
    let (Some(project), Some(client)) = (self.current_project(), self.client.as_ref()) else {
      return Err(Error::Precondition(missing));
    };

    let filter = QueryFilter {
      assignee: self.default_assignee(options.assignee.as_ref()),
      project: Some(project.key.clone()),
      time: Some(time.to_string()),
      event: options.event.clone(),
      ..QueryFilter::default()
    };
    let jql = filter.to_jql()?;

    debug!(jql = %jql, "searching latest issues");
    let issues = into_issue_map(client.search(&jql, &self.search_options()).await?);
    if options.verbose {
      self.show(&issues);
    }
    Ok(issues)
  }
}
