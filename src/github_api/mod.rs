use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub mod contributors;
mod fetch;
pub mod pulls;
pub mod repos;
#[cfg(test)]
pub(crate) mod test_fetcher;

pub use contributors::{
  build_contributor_repo_map, collect_all, list_contributors, ContributorCount,
};
pub use fetch::{Credentials, HttpFetcher};
pub use pulls::{
  duration_days, get_commits, get_files_changed, get_pr_info,
  get_prs_authored_by, parse_timestamp, PrSearch,
};
pub use repos::{count_public_repos, list_repo_names};

pub const GITHUB_API_ROOT: &str = "https://api.github.com/";

#[derive(PartialEq, Eq, Debug, Clone, Error)]
pub enum ApiError {
  #[error("request to {url} failed: {message}")]
  Transport { url: String, message: String },
  #[error("request to {url} returned status {status}")]
  Status { url: String, status: u16 },
  #[error("unexpected response for {context}: {message}")]
  MalformedResponse { context: String, message: String },
  #[error("listing has {len} entries but entry {index} was requested")]
  OutOfRange { index: usize, len: usize },
  #[error("invalid timestamp {value:?}")]
  InvalidTimestamp { value: String },
}

/// Anything which can turn a path (relative to the api root) into json.
pub trait Fetch: Sync {
  fn fetch_json(&self, path: &str) -> Result<Value, ApiError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
  fn fetch_json(&self, path: &str) -> Result<Value, ApiError> {
    (**self).fetch_json(path)
  }
}

/// Deserialize some (sub) value of a response, reporting where it came from
/// on failure.
pub(crate) fn parse<T: DeserializeOwned>(
  value: Value,
  context: &str,
) -> Result<T, ApiError> {
  serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse {
    context: context.to_owned(),
    message: e.to_string(),
  })
}
