use super::{parse, ApiError, Fetch};
use crate::github_types::{
  Commit, FileChange, PrId, PrState, PullRequestInfo, PullRequestSummary,
};
use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Timestamps come as `2023-06-15T10:30:00Z`. The zone is thrown away, which
/// is fine for day granularity but nothing finer.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ApiError> {
  let invalid = || ApiError::InvalidTimestamp {
    value: value.to_owned(),
  };
  let naive = value
    .strip_suffix('Z')
    .ok_or_else(invalid)?
    .replacen('T', " ", 1);

  NaiveDateTime::parse_from_str(&naive, "%Y-%m-%d %H:%M:%S%.f")
    .map_err(|_| invalid())
}

/// Whole days between creation and closing (rounded down); a pr which is
/// still open counts as 0 days.
pub fn duration_days(
  created_at: &str,
  closed_at: Option<&str>,
) -> Result<i64, ApiError> {
  let closed_at = match closed_at {
    Some(closed_at) => closed_at,
    None => return Ok(0),
  };
  let elapsed = parse_timestamp(closed_at)? - parse_timestamp(created_at)?;

  Ok(elapsed.num_seconds().div_euclid(SECONDS_PER_DAY))
}

#[derive(Deserialize)]
struct SearchResponse {
  items: Vec<Value>,
}

#[derive(Deserialize)]
struct SearchItem {
  id: PrId,
  number: u64,
  title: String,
  created_at: String,
  updated_at: String,
  closed_at: Option<String>,
}

/// Result of searching the prs of one contributor in one repo.
#[derive(Debug, Default)]
pub struct PrSearch {
  pub prs: BTreeMap<PrId, PullRequestSummary>,
  /// Items which couldn't be turned into a summary.
  pub skipped: Vec<ApiError>,
}

fn search_item_to_summary(
  item: Value,
  login: &str,
  repo: &str,
  context: &str,
) -> Result<PullRequestSummary, ApiError> {
  let SearchItem {
    id,
    number,
    title,
    created_at,
    updated_at,
    closed_at,
  } = parse(item, context)?;
  let duration_days = duration_days(&created_at, closed_at.as_deref())?;

  Ok(PullRequestSummary {
    id,
    contributor_name: login.to_owned(),
    repo_name: repo.to_owned(),
    pr_number: number,
    title,
    created_at,
    updated_at,
    closed_at,
    duration_days,
  })
}

/// Failing to fetch is an error. A response without `items` (github answers
/// some searches with just a `message`) or a single malformed item is skipped.
pub fn get_prs_authored_by(
  fetcher: &impl Fetch,
  org: &str,
  login: &str,
  repo: &str,
) -> Result<PrSearch> {
  let path = format!(
    "search/issues?q=is:pr+repo:{}/{}+author:{}",
    org, repo, login
  );

  let mut out = PrSearch::default();
  let items = match parse(fetcher.fetch_json(&path)?, &path) {
    Ok(SearchResponse { items }) => items,
    Err(err) => {
      warn!(contributor = login, repo, error = %err, "skipping search");
      out.skipped.push(err);
      return Ok(out);
    }
  };

  for item in items {
    match search_item_to_summary(item, login, repo, &path) {
      Ok(summary) => {
        out.prs.entry(summary.id).or_insert(summary);
      }
      Err(err) => {
        warn!(contributor = login, repo, error = %err, "skipping pr");
        out.skipped.push(err);
      }
    }
  }

  Ok(out)
}

#[derive(Deserialize)]
struct PullResponse {
  title: String,
  state: PrState,
  created_at: String,
  updated_at: String,
  closed_at: Option<String>,
  merged_at: Option<String>,
}

pub fn get_pr_info(
  fetcher: &impl Fetch,
  org: &str,
  repo: &str,
  pr_number: u64,
) -> Result<PullRequestInfo> {
  let path = format!("repos/{}/{}/pulls/{}", org, repo, pr_number);
  let PullResponse {
    title,
    state,
    created_at,
    updated_at,
    closed_at,
    merged_at,
  } = parse(fetcher.fetch_json(&path)?, &path)?;
  let duration_days = duration_days(&created_at, closed_at.as_deref())?;

  Ok(PullRequestInfo {
    title,
    pr_number,
    state,
    created_at,
    updated_at,
    closed_at,
    merged_at,
    duration_days,
  })
}

#[derive(Deserialize)]
struct FileEntry {
  filename: String,
  status: String,
  additions: u64,
  deletions: u64,
  changes: u64,
}

fn base_name(path: &str) -> &str {
  path.rsplit('/').next().unwrap_or(path)
}

pub fn get_files_changed(
  fetcher: &impl Fetch,
  org: &str,
  repo: &str,
  pr_number: u64,
) -> Result<Vec<FileChange>> {
  let path = format!("repos/{}/{}/pulls/{}/files", org, repo, pr_number);
  let entries: Vec<FileEntry> = parse(fetcher.fetch_json(&path)?, &path)?;

  Ok(
    entries
      .into_iter()
      .map(|entry| FileChange {
        filename: base_name(&entry.filename).to_owned(),
        path_to_file: entry.filename,
        pr_number,
        repo: repo.to_owned(),
        status: entry.status,
        additions: entry.additions,
        deletions: entry.deletions,
        changes: entry.changes,
      })
      .collect(),
  )
}

#[derive(Deserialize)]
struct CommitEntry {
  commit: CommitBody,
}

#[derive(Deserialize)]
struct CommitBody {
  author: CommitAuthor,
  message: String,
  comment_count: u64,
}

#[derive(Deserialize)]
struct CommitAuthor {
  name: String,
  date: String,
}

pub fn get_commits(
  fetcher: &impl Fetch,
  org: &str,
  repo: &str,
  pr_number: u64,
) -> Result<Vec<Commit>> {
  let path = format!("repos/{}/{}/pulls/{}/commits", org, repo, pr_number);
  let entries: Vec<CommitEntry> = parse(fetcher.fetch_json(&path)?, &path)?;

  Ok(
    entries
      .into_iter()
      .map(|CommitEntry { commit }| Commit {
        author: commit.author.name,
        pr_number,
        date_commit: commit.author.date,
        message: commit.message,
        comment_count: commit.comment_count,
        repo: repo.to_owned(),
      })
      .collect(),
  )
}
