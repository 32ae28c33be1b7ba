use super::{parse, ApiError, Fetch};
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct OrgProfile {
  public_repos: u64,
}

#[derive(Deserialize)]
struct RepoEntry {
  name: String,
}

pub fn count_public_repos(fetcher: &impl Fetch, org: &str) -> Result<u64> {
  let path = format!("users/{}", org);
  let profile: OrgProfile = parse(fetcher.fetch_json(&path)?, &path)?;

  Ok(profile.public_repos)
}

/// Only the first page of the listing is fetched: an organization with more
/// public repos than fit on one page fails with `ApiError::OutOfRange`
/// instead of returning a truncated list.
pub fn list_repo_names(fetcher: &impl Fetch, org: &str) -> Result<Vec<String>> {
  let path = format!("users/{}/repos", org);
  let listing: Vec<Value> = parse(fetcher.fetch_json(&path)?, &path)?;
  let count = count_public_repos(fetcher, org)? as usize;

  (0..count)
    .map(|index| -> Result<String> {
      let entry = listing.get(index).ok_or(ApiError::OutOfRange {
        index,
        len: listing.len(),
      })?;
      let RepoEntry { name } = parse(entry.clone(), &path)?;
      Ok(name)
    })
    .collect()
}
