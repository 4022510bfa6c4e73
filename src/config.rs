use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::jira::{AuthType, Credentials, MAX_ISSUES};
use crate::session::SessionDefaults;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub tracker: TrackerConfig,
  /// Project selected before any command runs
  pub default_project: Option<String>,
  /// Assignee used by `mine`, `latest` and new issues (defaults to the login)
  pub default_assignee: Option<String>,
  /// Component attached to new issues
  pub default_component: Option<String>,
  #[serde(default = "default_max_results")]
  pub max_results: u64,
  /// Also write logs to this file
  pub log_file: Option<PathBuf>,
}

fn default_max_results() -> u64 {
  MAX_ISSUES
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
  pub url: String,
  #[serde(default)]
  pub username: String,
  /// Authentication type: basic, bearer, or anonymous
  #[serde(default)]
  pub auth_type: AuthType,
  /// Use https when `url` has no scheme
  #[serde(default)]
  pub use_ssl: bool,
  #[serde(default)]
  pub context_path: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jirakit.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jirakit/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/jirakit/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("jirakit.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jirakit").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.max_results == 0 {
      return Err(eyre!("max_results must be at least 1"));
    }
    Ok(config)
  }

  /// Get the API token from environment variables.
  ///
  /// Checks JIRAKIT_TOKEN first, then JIRA_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("JIRAKIT_TOKEN")
      .or_else(|_| std::env::var("JIRA_API_TOKEN"))
      .map_err(|_| {
        eyre!("API token not found. Set JIRAKIT_TOKEN or JIRA_API_TOKEN environment variable.")
      })
  }

  /// Get the password from environment variables.
  ///
  /// Checks JIRAKIT_PASSWORD, then the token variables.
  pub fn get_password() -> Result<String> {
    std::env::var("JIRAKIT_PASSWORD")
      .or_else(|_| Self::get_api_token())
      .map_err(|_| eyre!("Password not found. Set JIRAKIT_PASSWORD environment variable."))
  }

  pub fn credentials(&self) -> Result<Credentials> {
    let secret = match self.tracker.auth_type {
      AuthType::Basic => Self::get_password()?,
      AuthType::Bearer => Self::get_api_token()?,
      AuthType::Anonymous => String::new(),
    };

    Ok(Credentials {
      site: self.tracker.url.clone(),
      username: self.tracker.username.clone(),
      secret,
      auth_type: self.tracker.auth_type,
      use_ssl: self.tracker.use_ssl,
      context_path: self.tracker.context_path.clone(),
    })
  }

  pub fn session_defaults(&self) -> SessionDefaults {
    let login = Some(self.tracker.username.clone()).filter(|u| !u.is_empty());
    SessionDefaults {
      assignee: self.default_assignee.clone().or(login),
      component: self.default_component.clone(),
      max_results: self.max_results,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  const MINIMAL: &str = "tracker:\n  url: http://my-jira.net\n";

  #[test]
  fn test_minimal_config_defaults() {
    let config = Config::parse(MINIMAL).unwrap();
    assert_eq!(config.tracker.auth_type, AuthType::Basic);
    assert!(!config.tracker.use_ssl);
    assert_eq!(config.tracker.context_path, "");
    assert_eq!(config.max_results, MAX_ISSUES);
    assert!(config.default_project.is_none());
  }

  #[test]
  fn test_full_config() {
    let config = Config::parse(
      r#"
tracker:
  url: my-jira.net
  username: b07507
  auth_type: bearer
  use_ssl: true
  context_path: /jira
default_project: ISC
default_component: Tooling
max_results: 500
log_file: /tmp/jirakit.log
"#,
    )
    .unwrap();
    assert_eq!(config.tracker.auth_type, AuthType::Bearer);
    assert_eq!(config.default_project.as_deref(), Some("ISC"));
    assert_eq!(config.max_results, 500);

    let defaults = config.session_defaults();
    assert_eq!(defaults.assignee.as_deref(), Some("b07507"));
    assert_eq!(defaults.component.as_deref(), Some("Tooling"));
    assert_eq!(defaults.max_results, 500);
  }

  #[test]
  fn test_default_assignee_beats_login() {
    let config = Config::parse(
      "tracker:\n  url: http://my-jira.net\n  username: login\ndefault_assignee: other\n",
    )
    .unwrap();
    assert_eq!(config.session_defaults().assignee.as_deref(), Some("other"));
  }

  #[test]
  fn test_unknown_auth_type_rejected() {
    assert!(Config::parse("tracker:\n  url: x\n  auth_type: kerberos\n").is_err());
  }

  #[test]
  fn test_zero_max_results_rejected() {
    assert!(Config::parse("tracker:\n  url: x\nmax_results: 0\n").is_err());
  }

  #[test]
  fn test_anonymous_credentials_need_no_secret() {
    let config = Config::parse(
      "tracker:\n  url: my-jira.net\n  auth_type: anonymous\n  use_ssl: true\n",
    )
    .unwrap();
    let credentials = config.credentials().unwrap();
    assert_eq!(credentials.secret, "");
    assert_eq!(credentials.base_url().unwrap().scheme(), "https");
  }

  #[test]
  fn test_load_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();
    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.tracker.url, "http://my-jira.net");
  }

  #[test]
  fn test_missing_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = Config::load(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
