use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::jira::api_types::{
  ApiCreatedIssue, ApiIssue, ApiIssueType, ApiProject, ApiSearchRequest, ApiSearchResponse,
};
use crate::jira::tracker::Tracker;
use crate::jira::types::{Issue, IssueType, Project, SearchOptions};

/// How requests are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
  /// Username plus password or API token
  #[default]
  Basic,
  /// Personal access token
  Bearer,
  Anonymous,
}

/// Everything needed to open a connection to a tracker site.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub site: String,
  pub username: String,
  /// Password, API token or personal access token depending on `auth_type`
  pub secret: String,
  pub auth_type: AuthType,
  /// Scheme used when `site` does not carry one
  pub use_ssl: bool,
  /// Path prefix the tracker is mounted under, e.g. `/jira`
  pub context_path: String,
}

impl Credentials {
  /// Resolve the base URL requests are made against.
  pub fn base_url(&self) -> Result<Url> {
    let site = self.site.trim();
    let site = if site.contains("://") {
      site.to_string()
    } else if self.use_ssl {
      format!("https://{}", site)
    } else {
      format!("http://{}", site)
    };

    let invalid = |reason: String| Error::Validation(vec![format!("invalid site '{}': {}", site, reason)]);
    let mut url = Url::parse(&site).map_err(|e| invalid(e.to_string()))?;
    if url.host_str().map_or(true, str::is_empty) {
      return Err(invalid("no host".to_string()));
    }

    let context = self.context_path.trim_matches('/');
    if !context.is_empty() {
      let path = format!("{}/{}", url.path().trim_end_matches('/'), context);
      url.set_path(&path);
    }
    Ok(url)
  }

  fn to_gouqi(&self) -> gouqi::Credentials {
    match self.auth_type {
      AuthType::Basic => gouqi::Credentials::Basic(self.username.clone(), self.secret.clone()),
      AuthType::Bearer => gouqi::Credentials::Bearer(self.secret.clone()),
      AuthType::Anonymous => gouqi::Credentials::Anonymous,
    }
  }
}

/// Jira REST client
#[derive(Clone)]
pub struct JiraClient {
  client: gouqi::r#async::Jira,
  site: String,
}

impl JiraClient {
  pub fn connect(credentials: &Credentials) -> Result<Self> {
    let url = credentials.base_url()?;
    let site = url.as_str().trim_end_matches('/').to_string();

    let client = gouqi::r#async::Jira::new(site.as_str(), credentials.to_gouqi())
      .map_err(|e| Error::remote("connect", e))?;

    debug!(site = %site, auth = ?credentials.auth_type, "created Jira client");
    Ok(Self { client, site })
  }

  pub fn site(&self) -> &str {
    &self.site
  }

  async fn fetch_issue(&self, op: &'static str, key: &str) -> Result<Issue> {
    let endpoint = format!("/issue/{}", key);
    let issue: ApiIssue = self
      .client
      .get("api", &endpoint)
      .await
      .map_err(|e| Error::remote(op, e))?;
    Ok(issue.into())
  }
}

impl Tracker for JiraClient {
  async fn list_projects(&self) -> Result<Vec<Project>> {
    let projects: Vec<ApiProject> = self
      .client
      .get("api", "/project")
      .await
      .map_err(|e| Error::remote("list projects", e))?;

    Ok(projects.into_iter().map(Project::from).collect())
  }

  async fn list_issue_types(&self) -> Result<Vec<IssueType>> {
    let types: Vec<ApiIssueType> = self
      .client
      .get("api", "/issuetype")
      .await
      .map_err(|e| Error::remote("list issue types", e))?;

    Ok(types.into_iter().map(IssueType::from).collect())
  }

  async fn search(&self, jql: &str, options: &SearchOptions) -> Result<Vec<Issue>> {
    let body = ApiSearchRequest {
      jql,
      start_at: options.start_at,
      max_results: options.max_results,
      fields: &options.fields,
    };

    let response: ApiSearchResponse = self
      .client
      .post("api", "/search", body)
      .await
      .map_err(|e| Error::remote("search", e))?;

    debug!(
      jql,
      total = response.total,
      returned = response.issues.len(),
      "search complete"
    );
    Ok(response.issues.into_iter().map(Issue::from).collect())
  }

  async fn create_issue(&self, fields: Value) -> Result<Issue> {
    let created: ApiCreatedIssue = self
      .client
      .post("api", "/issue", fields)
      .await
      .map_err(|e| Error::remote("create issue", e))?;

    debug!(key = %created.key, id = %created.id, "created issue");
    self.fetch_issue("create issue", &created.key).await
  }

  async fn save_issue(&self, issue: &Issue, fields: Value) -> Result<Issue> {
    let endpoint = format!("/issue/{}", issue.key);
    self
      .client
      .put::<Value, _>("api", &endpoint, fields)
      .await
      .map_err(|e| Error::remote("save issue", e))?;

    self.fetch_issue("save issue", &issue.key).await
  }

  async fn delete_issue(&self, issue: &Issue) -> Result<bool> {
    let endpoint = format!("/issue/{}", issue.key);
    self
      .client
      .delete::<Value>("api", &endpoint)
      .await
      .map_err(|e| Error::remote("delete issue", e))?;

    Ok(true)
  }
}
