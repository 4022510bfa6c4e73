//! Error taxonomy for session and issue operations.

use thiserror::Error;

/// Errors returned by session, query and issue operations.
///
/// Validation, lookup and precondition failures are raised before any remote
/// call is made, so the session's cached state is unchanged when one is
/// returned. Remote failures come straight from the tracker and are never
/// retried.
#[derive(Error, Debug)]
pub enum Error {
  /// One or more option values failed validation. Every failed check is
  /// listed, not just the first.
  #[error("invalid arguments: {}", .0.join("; "))]
  Validation(Vec<String>),

  /// A project, issue type or issue could not be resolved.
  #[error("{what} '{query}' not found, choose from: {}", .candidates.join(", "))]
  Lookup {
    what: &'static str,
    query: String,
    candidates: Vec<String>,
  },

  /// Session state required by the operation is missing (no client, no
  /// current project).
  #[error("{}", .0.join("; "))]
  Precondition(Vec<String>),

  /// The tracker rejected or failed a request.
  #[error("{op} failed: {message}")]
  Remote { op: &'static str, message: String },
}

impl Error {
  pub fn remote(op: &'static str, err: impl std::fmt::Display) -> Self {
    Error::Remote {
      op,
      message: err.to_string(),
    }
  }

  pub fn precondition(message: impl Into<String>) -> Self {
    Error::Precondition(vec![message.into()])
  }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validation_lists_every_problem() {
    let err = Error::Validation(vec!["bad status".into(), "bad event".into()]);
    assert_eq!(err.to_string(), "invalid arguments: bad status; bad event");
  }

  #[test]
  fn test_lookup_lists_candidates() {
    let err = Error::Lookup {
      what: "issue type",
      query: "Bgu".into(),
      candidates: vec!["Bug".into(), "Task".into()],
    };
    assert_eq!(
      err.to_string(),
      "issue type 'Bgu' not found, choose from: Bug, Task"
    );
  }

  #[test]
  fn test_remote_wraps_message() {
    let err = Error::remote("search", "401 Unauthorized");
    assert_eq!(err.to_string(), "search failed: 401 Unauthorized");
  }
}
