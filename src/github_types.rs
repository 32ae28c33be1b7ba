use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Platform assigned id of a pull request (unique across all of GitHub).
pub type PrId = u64;

/// Marker GitHub appends to the login of app/bot accounts.
pub const BOT_MARKER: &str = "[bot]";

pub fn is_bot(login: &str) -> bool {
  login.contains(BOT_MARKER)
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Contribution {
  pub repo: String,
  pub login: String,
  pub contributions: u64,
}

/// login -> distinct repos the login has contributed to, in the order they
/// were first seen.
pub type ContributorRepoMap = BTreeMap<String, Vec<String>>;

/// A pr number is only unique within a single repo.
#[derive(Hash, Ord, PartialOrd, Eq, PartialEq, Debug, Clone)]
pub struct PrKey {
  pub repo: String,
  pub pr_number: u64,
}

impl PrKey {
  pub fn new(repo: impl Into<String>, pr_number: u64) -> Self {
    Self {
      repo: repo.into(),
      pr_number,
    }
  }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct PullRequestSummary {
  #[serde(skip)]
  pub id: PrId,
  pub contributor_name: String,
  pub repo_name: String,
  pub pr_number: u64,
  pub title: String,
  pub created_at: String,
  pub updated_at: String,
  pub closed_at: Option<String>,
  pub duration_days: i64,
}

impl PullRequestSummary {
  pub fn key(&self) -> PrKey {
    PrKey::new(self.repo_name.clone(), self.pr_number)
  }

  /// Everything except `closed_at` has to be present for the row to be
  /// usable downstream.
  pub fn has_required_fields(&self) -> bool {
    ![
      &self.contributor_name,
      &self.repo_name,
      &self.title,
      &self.created_at,
      &self.updated_at,
    ]
    .iter()
    .any(|s| s.is_empty())
  }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
  Open,
  Closed,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct PullRequestInfo {
  pub title: String,
  pub pr_number: u64,
  pub state: PrState,
  pub created_at: String,
  pub updated_at: String,
  pub closed_at: Option<String>,
  pub merged_at: Option<String>,
  pub duration_days: i64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct FileChange {
  pub filename: String,
  pub path_to_file: String,
  pub pr_number: u64,
  pub repo: String,
  pub status: String,
  pub additions: u64,
  pub deletions: u64,
  pub changes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Commit {
  pub author: String,
  pub pr_number: u64,
  pub date_commit: String,
  pub message: String,
  pub comment_count: u64,
  pub repo: String,
}
