use super::{parse, ApiError, Fetch};
use crate::github_types::{is_bot, Contribution, ContributorRepoMap};
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContributorCount {
  pub login: String,
  pub contributions: u64,
}

/// A repo which responds with a non success status (archived, hidden) or with
/// no content (empty) has no contributors as far as we are concerned: that
/// case is indistinguishable from a repo with genuinely no contributors.
pub fn list_contributors(
  fetcher: &impl Fetch,
  org: &str,
  repo: &str,
) -> Result<Vec<ContributorCount>> {
  let path = format!("repos/{}/{}/contributors", org, repo);
  let value = match fetcher.fetch_json(&path) {
    Ok(Value::Null) => {
      debug!(repo, "empty contributor listing");
      return Ok(Vec::new());
    }
    Ok(value) => value,
    Err(ApiError::Status { status, .. }) => {
      debug!(repo, status, "no contributor listing");
      return Ok(Vec::new());
    }
    Err(err) => return Err(err.into()),
  };

  Ok(parse(value, &path)?)
}

pub fn collect_all(
  fetcher: &impl Fetch,
  org: &str,
  repos: &[String],
) -> Result<Vec<Contribution>> {
  let mut out = Vec::new();
  for repo in repos {
    let before = out.len();
    out.extend(
      list_contributors(fetcher, org, repo)?
        .into_iter()
        .filter(|contributor| !is_bot(&contributor.login))
        .map(|ContributorCount { login, contributions }| Contribution {
          repo: repo.clone(),
          login,
          contributions,
        }),
    );
    debug!(repo = repo.as_str(), count = out.len() - before, "contributors");
  }
  info!(repos = repos.len(), contributions = out.len(), "collected");

  Ok(out)
}

pub fn build_contributor_repo_map(
  contributions: &[Contribution],
) -> ContributorRepoMap {
  let mut map = ContributorRepoMap::new();
  for Contribution { repo, login, .. } in contributions {
    let repos = map.entry(login.clone()).or_insert_with(Vec::new);
    if !repos.contains(repo) {
      repos.push(repo.clone());
    }
  }
  map
}
