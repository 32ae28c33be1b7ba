use crate::{
  aggregator::AggregatorConfig,
  github_api::{Credentials, HttpFetcher, GITHUB_API_ROOT},
};
use std::{str::FromStr, time::Duration};
use structopt::StructOpt;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(PartialEq, Eq, Debug, Error)]
pub enum ConfigError {
  #[error("{0} must be set")]
  Missing(&'static str),
  #[error("{var} has invalid value {value:?}")]
  Invalid { var: &'static str, value: String },
  #[error("GITHUB_USERNAME and GITHUB_API_TOKEN must be set together")]
  PartialCredentials,
}

/// Settings shared by the binaries, read from the environment (and `.env`).
/// Command line options take precedence.
#[derive(StructOpt, Debug, Default, Clone)]
pub struct ConfigOpt {
  /// Organization to collect from (GITHUB_ORG).
  #[structopt(long)]
  pub org: Option<String>,

  /// Comma separated repos to consider (GITHUB_REPOS).
  #[structopt(long, use_delimiter = true)]
  pub repos: Vec<String>,

  /// Number of requests in flight at once (GITHUB_JOBS).
  #[structopt(short, long)]
  pub jobs: Option<usize>,

  /// Timeout for a single request in seconds (GITHUB_TIMEOUT_SECS).
  #[structopt(long)]
  pub timeout_secs: Option<u64>,

  /// Log every request.
  #[structopt(short, long)]
  pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub api_root: String,
  pub org: String,
  pub repos: Vec<String>,
  pub credentials: Option<Credentials>,
  pub timeout: Duration,
  pub jobs: usize,
}

fn parse_var<T: FromStr>(
  var: &'static str,
  value: Option<String>,
  default: T,
) -> Result<T, ConfigError> {
  match value {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse()
      .map_err(|_| ConfigError::Invalid { var, value }),
  }
}

fn split_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

impl Config {
  pub fn from_env(opt: &ConfigOpt) -> Result<Self, ConfigError> {
    dotenv::dotenv().ok();

    Self::load(|var| std::env::var(var).ok(), opt)
  }

  pub fn load(
    lookup: impl Fn(&str) -> Option<String>,
    opt: &ConfigOpt,
  ) -> Result<Self, ConfigError> {
    let lookup =
      |var: &str| lookup(var).filter(|value: &String| !value.is_empty());

    let org = opt
      .org
      .clone()
      .or_else(|| lookup("GITHUB_ORG"))
      .ok_or(ConfigError::Missing("GITHUB_ORG"))?;

    let repos = if opt.repos.is_empty() {
      lookup("GITHUB_REPOS")
        .map(|value| split_list(&value))
        .unwrap_or_default()
    } else {
      opt.repos.clone()
    };

    let credentials =
      match (lookup("GITHUB_USERNAME"), lookup("GITHUB_API_TOKEN")) {
        (Some(username), Some(token)) => Some(Credentials { username, token }),
        (None, None) => None,
        _ => return Err(ConfigError::PartialCredentials),
      };

    let timeout_secs = match opt.timeout_secs {
      Some(secs) => secs,
      None => parse_var(
        "GITHUB_TIMEOUT_SECS",
        lookup("GITHUB_TIMEOUT_SECS"),
        DEFAULT_TIMEOUT_SECS,
      )?,
    };

    let jobs = match opt.jobs {
      Some(jobs) => jobs,
      None => parse_var("GITHUB_JOBS", lookup("GITHUB_JOBS"), 1)?,
    };
    if jobs == 0 {
      return Err(ConfigError::Invalid {
        var: "GITHUB_JOBS",
        value: jobs.to_string(),
      });
    }

    Ok(Self {
      api_root: lookup("GITHUB_API_ROOT")
        .unwrap_or_else(|| GITHUB_API_ROOT.to_owned()),
      org,
      repos,
      credentials,
      timeout: Duration::from_secs(timeout_secs),
      jobs,
    })
  }

  pub fn fetcher(&self) -> anyhow::Result<HttpFetcher> {
    HttpFetcher::new(&self.api_root, self.credentials.clone(), self.timeout)
  }

  pub fn aggregator_config(&self) -> AggregatorConfig {
    AggregatorConfig {
      org: self.org.clone(),
      repos: self.repos.clone(),
      jobs: self.jobs,
    }
  }
}
