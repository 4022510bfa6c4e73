//! A session layer over the Jira REST API: cached project and issue type
//! metadata, a current project with its issues, JQL filters built from
//! structured options, and issue create/update/delete.

pub mod config;
pub mod error;
pub mod jira;
pub mod logging;
pub mod metadata;
pub mod operations;
pub mod query;
pub mod report;
pub mod session;

pub use error::{Error, Result};
pub use metadata::{Lookup, MetadataCache, ProjectRef};
pub use operations::{Component, IssueOptions};
pub use query::{EventType, JqlBuilder, QueryFilter, StatusFilter, TimeWindow};
pub use session::{LatestIssuesOptions, MyIssuesOptions, Session, SessionDefaults};
