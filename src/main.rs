use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::path::PathBuf;

use jirakit::config::Config;
use jirakit::jira::{JiraClient, Tracker};
use jirakit::{
  logging, IssueOptions, LatestIssuesOptions, Lookup, MyIssuesOptions, Session,
};

#[derive(Parser, Debug)]
#[command(name = "jirakit")]
#[command(about = "Query and edit Jira issues from the command line")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/jirakit/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Project key or id to make current before running the command
  #[arg(short, long, global = true)]
  project: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List projects
  #[command(alias = "p")]
  Projects,
  /// List issue types, optionally only those matching a pattern
  #[command(alias = "t")]
  IssueTypes { pattern: Option<String> },
  /// Show the current project's issues
  #[command(alias = "i")]
  Issues,
  /// Show issues assigned to you (or --assignee)
  #[command(alias = "m")]
  Mine {
    #[arg(short, long)]
    assignee: Option<String>,
    /// Open, In Progress, Resolved, All, All Open
    #[arg(short, long)]
    status: Option<String>,
  },
  /// Show issues whose event time falls in a window such as "-1w"
  #[command(alias = "l")]
  Latest {
    #[arg(allow_hyphen_values = true)]
    time: String,
    /// created, resolved, updated
    #[arg(short, long)]
    event: Option<String>,
    #[arg(short, long)]
    assignee: Option<String>,
  },
  /// Create an issue
  #[command(alias = "c")]
  Create(IssueArgs),
  /// Update an issue of the current project
  #[command(alias = "u")]
  Update {
    key: String,
    #[command(flatten)]
    fields: IssueArgs,
  },
  /// Delete an issue of the current project
  #[command(alias = "d")]
  Delete { key: String },
}

#[derive(ClapArgs, Debug, Default)]
struct IssueArgs {
  /// Issue type name
  #[arg(short = 't', long = "type")]
  issue_type: Option<String>,
  #[arg(short, long)]
  summary: Option<String>,
  #[arg(short, long)]
  description: Option<String>,
  #[arg(short, long)]
  assignee: Option<String>,
  /// Priority id
  #[arg(long)]
  priority: Option<u32>,
  /// Component name or id, repeatable
  #[arg(long = "component")]
  components: Vec<String>,
  /// Any other field as name=value; value may be JSON
  #[arg(long = "set", value_name = "NAME=VALUE")]
  set: Vec<String>,
}

impl IssueArgs {
  fn into_options(self) -> Result<IssueOptions> {
    let mut values: Vec<(String, Value)> = Vec::new();
    for raw in &self.set {
      let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| eyre!("--set expects NAME=VALUE, got '{}'", raw))?;
      let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
      values.push((name.trim().to_string(), value));
    }

    let named = [
      ("type", self.issue_type),
      ("summary", self.summary),
      ("description", self.description),
      ("assignee", self.assignee),
    ];
    for (name, value) in named {
      if let Some(value) = value {
        values.push((name.to_string(), Value::String(value)));
      }
    }
    if let Some(priority) = self.priority {
      values.push(("priority".to_string(), Value::from(priority)));
    }
    if !self.components.is_empty() {
      let components = self.components.into_iter().map(Value::String).collect();
      values.push(("components".to_string(), Value::Array(components)));
    }

    Ok(IssueOptions::from_values(values)?)
  }
}

async fn run<T: Tracker>(session: &Session<T>, command: Command) -> Result<()> {
  match command {
    Command::Projects => {
      for project in session.metadata().projects().values() {
        println!("{:<12} {:>8}  {}", project.key, project.id, project.name);
      }
    }
    Command::IssueTypes { pattern } => {
      let types = match pattern {
        None => session.metadata().issue_types().values().cloned().collect(),
        Some(pattern) => match session.metadata().issue_types_matching(&pattern) {
          Lookup::Found(t) => vec![t],
          Lookup::Ambiguous(types) => types,
          Lookup::NotFound { .. } => Vec::new(),
        },
      };
      for t in types {
        println!("{:<20} {:>6}  {}", t.name, t.id, t.description);
      }
    }
    Command::Issues => {
      if session.current_project().is_none() {
        return Err(eyre!("No current project, pass --project or set default_project"));
      }
      session.list_issues(true);
    }
    Command::Mine { assignee, status } => {
      let options = MyIssuesOptions {
        assignee,
        status,
        verbose: true,
        ..MyIssuesOptions::default()
      };
      session.my_issues(&options).await?;
    }
    Command::Latest {
      time,
      event,
      assignee,
    } => {
      let options = LatestIssuesOptions {
        assignee,
        event,
        verbose: true,
      };
      session.latest_issues(&time, &options).await?;
    }
    Command::Create(fields) => {
      let issue = session.create_issue(&fields.into_options()?).await?;
      match session.site() {
        Some(site) => println!("{}  {}/browse/{}", issue.key, site, issue.key),
        None => println!("{}", issue.key),
      }
    }
    Command::Update { key, fields } => {
      let issue = session.update_issue(&key, &fields.into_options()?).await?;
      println!("{}  {}", issue.key, issue.summary);
    }
    Command::Delete { key } => {
      if session.delete_issue(&key).await? {
        println!("deleted {}", key);
      } else {
        return Err(eyre!("Tracker did not delete {}", key));
      }
    }
  }
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(config.log_file.as_deref())?;

  let client = JiraClient::connect(&config.credentials()?)?;
  let site = client.site().to_string();
  let mut session = Session::launch(client, site, config.session_defaults()).await?;

  // Command line project overrides the configured one
  if let Some(project) = args.project.or(config.default_project) {
    if !session.select_project(project.as_str()).await?.is_found() {
      return Err(eyre!("Could not select project '{}'", project));
    }
  }

  run(&session, args.command).await
}
