//! Serde-deserializable types matching Jira REST responses.
//!
//! These stay separate from the domain types in [`super::types`] so the wire
//! shape can drift (string ids, cloud vs. on-premise user objects, ADF
//! descriptions) without leaking into the session logic.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::types::{Issue, IssueType, Project, User};

/// Jira sends numeric ids as strings; accept either.
fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Num(u64),
    Str(String),
  }

  match RawId::deserialize(deserializer)? {
    RawId::Num(n) => Ok(n),
    RawId::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
  }
}

// ============================================================================
// Metadata endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiProject {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: u64,
  pub key: String,
  #[serde(default)]
  pub name: String,
  #[serde(rename = "self")]
  pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssueType {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub description: String,
}

// ============================================================================
// Issue fields
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiStatus {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub name: Option<String>,
  #[serde(rename = "accountId")]
  pub account_id: Option<String>,
  #[serde(rename = "emailAddress")]
  pub email_address: Option<String>,
  #[serde(rename = "displayName")]
  pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  #[serde(default)]
  pub summary: String,
  pub status: Option<ApiStatus>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiIssueType>,
  pub assignee: Option<ApiUser>,
  // Plain string (API v2) or ADF document (API v3)
  pub description: Option<Value>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  #[serde(default)]
  pub id: String,
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

// ============================================================================
// Search endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiSearchRequest<'a> {
  pub jql: &'a str,
  #[serde(rename = "startAt")]
  pub start_at: u64,
  #[serde(rename = "maxResults")]
  pub max_results: u64,
  #[serde(skip_serializing_if = "no_fields")]
  pub fields: &'a [String],
}

fn no_fields(fields: &&[String]) -> bool {
  fields.is_empty()
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub issues: Vec<ApiIssue>,
  #[serde(default)]
  pub total: u64,
}

// ============================================================================
// Create endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiCreatedIssue {
  #[serde(default)]
  pub id: String,
  pub key: String,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiProject> for Project {
  fn from(p: ApiProject) -> Self {
    Project {
      id: p.id,
      key: p.key,
      name: p.name,
      url: p.url,
    }
  }
}

impl From<ApiIssueType> for IssueType {
  fn from(t: ApiIssueType) -> Self {
    IssueType {
      id: t.id,
      name: t.name,
      description: t.description,
    }
  }
}

impl From<ApiUser> for User {
  fn from(u: ApiUser) -> Self {
    User {
      name: u.name.or(u.account_id).unwrap_or_default(),
      email: u.email_address,
      display_name: u.display_name,
    }
  }
}

impl From<ApiIssue> for Issue {
  fn from(issue: ApiIssue) -> Self {
    let f = issue.fields;
    Issue {
      key: issue.key,
      id: issue.id,
      summary: f.summary,
      description: f.description.as_ref().and_then(extract_description),
      status: f.status.map(|s| s.name).unwrap_or_default(),
      issue_type: f.issue_type.map(IssueType::from),
      assignee: f.assignee.map(User::from),
      fields: f.extra,
    }
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extract plain text description from Jira's ADF or plain text format
fn extract_description(value: &Value) -> Option<String> {
  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }

  if let Some(content) = value.get("content").and_then(|v| v.as_array()) {
    let mut text = String::new();
    extract_adf_text(content, &mut text);
    let text = text.trim_end().to_string();
    if !text.is_empty() {
      return Some(text);
    }
  }

  None
}

/// Recursively extract text from ADF content
fn extract_adf_text(content: &[Value], output: &mut String) {
  for node in content {
    let Some(node_type) = node.get("type").and_then(|v| v.as_str()) else {
      continue;
    };
    match node_type {
      "text" => {
        if let Some(text) = node.get("text").and_then(|v| v.as_str()) {
          output.push_str(text);
        }
      }
      "hardBreak" => output.push('\n'),
      _ => {
        if let Some(children) = node.get("content").and_then(|v| v.as_array()) {
          extract_adf_text(children, output);
        }
        if node_type == "paragraph" || node_type == "heading" {
          output.push('\n');
        }
      }
    }
  }
}
