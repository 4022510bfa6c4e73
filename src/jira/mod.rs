pub mod api_types;
pub mod client;
#[cfg(test)]
pub mod fake;
pub mod tracker;
pub mod types;

pub use client::{AuthType, Credentials, JiraClient};
pub use tracker::Tracker;
pub use types::{Issue, IssueMap, IssueType, Project, SearchOptions, User, MAX_ISSUES};
