use crate::{
  github_api::{
    build_contributor_repo_map, collect_all, get_commits, get_files_changed,
    get_prs_authored_by, Fetch,
  },
  github_types::{
    Commit, ContributorRepoMap, FileChange, PrKey, PullRequestSummary,
  },
  progress_bar::get_bar,
};
use anyhow::Result;
use fnv::FnvHashSet as Set;
use indicatif::ParallelProgressIterator;
use itertools::{Either, Itertools};
use rayon::prelude::*;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
  pub org: String,
  /// The repos whose contributors are considered.
  pub repos: Vec<String>,
  /// Number of requests in flight at once.
  pub jobs: usize,
}

#[derive(Debug)]
pub struct DetailFailure {
  pub key: PrKey,
  pub error: anyhow::Error,
}

/// Rows from every pr whose details could be fetched, plus the prs which
/// couldn't.
#[derive(Debug)]
pub struct DetailOutcome<T> {
  pub rows: Vec<T>,
  pub failures: Vec<DetailFailure>,
}

#[derive(Debug)]
pub struct ActivityReport {
  pub summary: Vec<PullRequestSummary>,
  pub commits: DetailOutcome<Commit>,
  pub files: DetailOutcome<FileChange>,
}

/// Flatten into (login, repo) pairs, ordered by login and then by the order
/// the repo was first seen for that login.
pub fn contributor_repo_pairs(map: &ContributorRepoMap) -> Vec<(&str, &str)> {
  map
    .iter()
    .flat_map(|(login, repos)| {
      repos.iter().map(move |repo| (login.as_str(), repo.as_str()))
    })
    .collect()
}

/// Each distinct pr once, in the order it first appears in the summary.
pub fn detail_keys(summary: &[PullRequestSummary]) -> Vec<PrKey> {
  let mut seen = Set::default();
  summary
    .iter()
    .map(PullRequestSummary::key)
    .filter(|key| seen.insert(key.clone()))
    .collect()
}

pub struct ContributorPrAggregator<F> {
  fetcher: F,
  config: AggregatorConfig,
  pool: rayon::ThreadPool,
  show_progress: bool,
}

impl<F: Fetch> ContributorPrAggregator<F> {
  pub fn new(fetcher: F, config: AggregatorConfig) -> Result<Self> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(config.jobs.max(1))
      .build()?;

    Ok(Self {
      fetcher,
      config,
      pool,
      show_progress: false,
    })
  }

  pub fn show_progress(mut self, show_progress: bool) -> Self {
    self.show_progress = show_progress;
    self
  }

  /// Runs `f` on every item using the pool. Output order matches `items`
  /// regardless of the number of jobs.
  fn fan_out<I, T>(&self, items: &[I], f: impl Fn(&I) -> T + Sync) -> Vec<T>
  where
    I: Sync,
    T: Send,
  {
    let bar = get_bar(items.len() as u64, self.show_progress);

    let out = self.pool.install(|| {
      items
        .par_iter()
        .progress_with(bar.clone())
        .map(&f)
        .collect()
    });
    bar.finish_and_clear();

    out
  }

  /// Every pr authored by a contributor of one of the configured repos (in
  /// that repo), each pr once.
  ///
  /// A failed search request aborts the whole summary: without it the detail
  /// tables would silently be missing a contributor. A search answered
  /// without items only loses that contributor/repo pair.
  pub fn run_pr_summary(&self) -> Result<Vec<PullRequestSummary>> {
    let AggregatorConfig { org, repos, .. } = &self.config;

    let contributions = collect_all(&self.fetcher, org, repos)?;
    let contributor_repos = build_contributor_repo_map(&contributions);
    let pairs = contributor_repo_pairs(&contributor_repos);
    info!(
      "searching prs for {} contributors ({} contributor/repo pairs)",
      contributor_repos.len(),
      pairs.len()
    );

    let searches = self.fan_out(&pairs, |&(login, repo)| {
      get_prs_authored_by(&self.fetcher, org, login, repo)
    });

    let mut seen = Set::default();
    let mut summary = Vec::new();
    let mut skipped = 0;
    for search in searches {
      let search = search?;
      skipped += search.skipped.len();
      summary.extend(
        search
          .prs
          .into_iter()
          .filter(|(id, _)| seen.insert(*id))
          .map(|(_, pr)| pr),
      );
    }
    summary.retain(PullRequestSummary::has_required_fields);
    info!("found {} prs ({} malformed skipped)", summary.len(), skipped);

    Ok(summary)
  }

  fn run_detail<T: Send>(
    &self,
    summary: &[PullRequestSummary],
    what: &str,
    fetch: impl Fn(&F, &str, &PrKey) -> Result<Vec<T>> + Sync,
  ) -> DetailOutcome<T> {
    let keys = detail_keys(summary);
    let org = self.config.org.as_str();
    let results = self.fan_out(&keys, |key| fetch(&self.fetcher, org, key));

    let (rows, failures): (Vec<_>, Vec<_>) =
      keys
        .into_iter()
        .zip(results)
        .partition_map(|(key, result)| match result {
          Ok(rows) => Either::Left(rows),
          Err(error) => {
            warn!(
              "failed to fetch {} for {}#{}: {:#}",
              what, key.repo, key.pr_number, error
            );
            Either::Right(DetailFailure { key, error })
          }
        });
    let rows: Vec<T> = rows.into_iter().flatten().collect();
    info!("fetched {} {} ({} prs failed)", rows.len(), what, failures.len());

    DetailOutcome { rows, failures }
  }

  pub fn run_commit_detail(
    &self,
    summary: &[PullRequestSummary],
  ) -> DetailOutcome<Commit> {
    self.run_detail(summary, "commits", |fetcher, org, key| {
      get_commits(fetcher, org, &key.repo, key.pr_number)
    })
  }

  pub fn run_file_detail(
    &self,
    summary: &[PullRequestSummary],
  ) -> DetailOutcome<FileChange> {
    self.run_detail(summary, "files", |fetcher, org, key| {
      get_files_changed(fetcher, org, &key.repo, key.pr_number)
    })
  }

  pub fn run(&self) -> Result<ActivityReport> {
    let summary = self.run_pr_summary()?;
    let commits = self.run_commit_detail(&summary);
    let files = self.run_file_detail(&summary);

    Ok(ActivityReport {
      summary,
      commits,
      files,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::github_api::{test_fetcher::FakeFetcher, ApiError};
  use serde_json::{json, Value};

  fn contributors(logins: &[&str]) -> Value {
    Value::Array(
      logins
        .iter()
        .map(|login| json!({ "login": login, "contributions": 1 }))
        .collect(),
    )
  }

  fn search_path(repo: &str, login: &str) -> String {
    format!("search/issues?q=is:pr+repo:dyvenia/{}+author:{}", repo, login)
  }

  fn pr(id: u64, number: u64) -> Value {
    json!({
      "id": id,
      "number": number,
      "title": format!("pr {}", number),
      "created_at": "2023-01-01T00:00:00Z",
      "updated_at": "2023-01-03T00:00:00Z",
      "closed_at": "2023-01-03T00:00:00Z",
    })
  }

  fn commit(message: &str) -> Value {
    json!({
      "commit": {
        "author": { "name": "Alice", "date": "2023-01-02T00:00:00Z" },
        "message": message,
        "comment_count": 0,
      }
    })
  }

  fn file(path: &str) -> Value {
    json!({
      "filename": path,
      "status": "added",
      "additions": 1,
      "deletions": 0,
      "changes": 1,
    })
  }

  /// alice works on viadot and timeflow, bob on viadot. Both repos have a
  /// pr #1.
  fn org() -> FakeFetcher {
    FakeFetcher::new()
      .json(
        "repos/dyvenia/viadot/contributors",
        contributors(&["alice", "bob", "dependabot[bot]"]),
      )
      .json(
        "repos/dyvenia/timeflow/contributors",
        contributors(&["alice"]),
      )
      .json(
        &search_path("viadot", "alice"),
        json!({ "items": [pr(100, 1), pr(101, 2)] }),
      )
      .json(
        &search_path("timeflow", "alice"),
        json!({ "items": [pr(200, 1)] }),
      )
      .json(&search_path("viadot", "bob"), json!({ "items": [pr(102, 3)] }))
      .json(
        "repos/dyvenia/viadot/pulls/1/commits",
        json!([commit("viadot 1")]),
      )
      .json(
        "repos/dyvenia/viadot/pulls/2/commits",
        json!([commit("viadot 2a"), commit("viadot 2b")]),
      )
      .json(
        "repos/dyvenia/viadot/pulls/3/commits",
        json!([commit("viadot 3")]),
      )
      .json(
        "repos/dyvenia/timeflow/pulls/1/commits",
        json!([commit("timeflow 1")]),
      )
      .json(
        "repos/dyvenia/viadot/pulls/1/files",
        json!([file("src/flows/a.py")]),
      )
      .json("repos/dyvenia/viadot/pulls/2/files", json!([]))
      .json("repos/dyvenia/viadot/pulls/3/files", json!([file("b.py")]))
      .json(
        "repos/dyvenia/timeflow/pulls/1/files",
        json!([file("app/main.py")]),
      )
  }

  fn config(jobs: usize) -> AggregatorConfig {
    AggregatorConfig {
      org: "dyvenia".to_owned(),
      repos: vec!["viadot".to_owned(), "timeflow".to_owned()],
      jobs,
    }
  }

  fn keys(summary: &[PullRequestSummary]) -> Vec<(String, String, u64)> {
    summary
      .iter()
      .map(|pr| {
        (
          pr.contributor_name.clone(),
          pr.repo_name.clone(),
          pr.pr_number,
        )
      })
      .collect()
  }

  #[test]
  fn pairs_from_map() {
    let mut map = ContributorRepoMap::new();
    map.insert("bob".to_owned(), vec!["viadot".to_owned()]);
    map.insert(
      "alice".to_owned(),
      vec!["viadot".to_owned(), "timeflow".to_owned()],
    );

    assert_eq!(
      contributor_repo_pairs(&map),
      vec![
        ("alice", "viadot"),
        ("alice", "timeflow"),
        ("bob", "viadot")
      ]
    );
  }

  #[test]
  fn summary() -> Result<()> {
    let fetcher = org();
    let aggregator = ContributorPrAggregator::new(&fetcher, config(1))?;
    let summary = aggregator.run_pr_summary()?;

    assert_eq!(
      keys(&summary),
      vec![
        ("alice".to_owned(), "viadot".to_owned(), 1),
        ("alice".to_owned(), "viadot".to_owned(), 2),
        ("alice".to_owned(), "timeflow".to_owned(), 1),
        ("bob".to_owned(), "viadot".to_owned(), 3),
      ]
    );
    assert!(summary.iter().all(|pr| pr.duration_days == 2));
    // no search is ever issued for the bot
    assert!(fetcher.calls().iter().all(|path| !path.contains("[bot]")));

    Ok(())
  }

  #[test]
  fn summary_dedups_pr_ids_first_seen_wins() -> Result<()> {
    let fetcher = org()
      .json(
        &search_path("viadot", "bob"),
        json!({ "items": [pr(101, 2), pr(102, 3)] }),
      );
    let summary =
      ContributorPrAggregator::new(&fetcher, config(1))?.run_pr_summary()?;

    let owners: Vec<_> = summary
      .iter()
      .filter(|pr| pr.id == 101)
      .map(|pr| pr.contributor_name.as_str())
      .collect();
    assert_eq!(owners, vec!["alice"]);
    assert_eq!(summary.len(), 4);

    Ok(())
  }

  #[test]
  fn summary_search_failure_propagates() -> Result<()> {
    let fetcher = org().transport_failure(&search_path("viadot", "bob"));
    let err = ContributorPrAggregator::new(&fetcher, config(1))?
      .run_pr_summary()
      .unwrap_err();

    match err.downcast_ref::<ApiError>() {
      Some(ApiError::Transport { .. }) => Ok(()),
      _ => Err(err),
    }
  }

  #[test]
  fn summary_keeps_other_pairs_when_search_has_no_items() -> Result<()> {
    let fetcher = org().json(
      &search_path("viadot", "bob"),
      json!({ "message": "API rate limit exceeded" }),
    );
    let summary =
      ContributorPrAggregator::new(&fetcher, config(1))?.run_pr_summary()?;

    assert_eq!(
      keys(&summary),
      vec![
        ("alice".to_owned(), "viadot".to_owned(), 1),
        ("alice".to_owned(), "viadot".to_owned(), 2),
        ("alice".to_owned(), "timeflow".to_owned(), 1),
      ]
    );

    Ok(())
  }

  #[test]
  fn commit_detail_keys_by_repo_and_number() -> Result<()> {
    let fetcher = org();
    let aggregator = ContributorPrAggregator::new(&fetcher, config(1))?;
    let summary = aggregator.run_pr_summary()?;
    let commits = aggregator.run_commit_detail(&summary);

    assert!(commits.failures.is_empty());
    let messages: Vec<_> =
      commits.rows.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(
      messages,
      vec!["viadot 1", "viadot 2a", "viadot 2b", "timeflow 1", "viadot 3"]
    );
    assert_eq!(commits.rows[3].repo, "timeflow");
    assert_eq!(commits.rows[3].pr_number, 1);

    Ok(())
  }

  #[test]
  fn commit_detail_survives_failures() -> Result<()> {
    let fetcher = org()
      .transport_failure("repos/dyvenia/viadot/pulls/1/commits")
      .status("repos/dyvenia/timeflow/pulls/1/commits", 500);
    let aggregator = ContributorPrAggregator::new(&fetcher, config(1))?;
    let summary = aggregator.run_pr_summary()?;
    let commits = aggregator.run_commit_detail(&summary);

    let failed: Vec<_> = commits.failures.iter().map(|f| &f.key).collect();
    assert_eq!(
      failed,
      vec![&PrKey::new("viadot", 1), &PrKey::new("timeflow", 1)]
    );
    let messages: Vec<_> =
      commits.rows.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["viadot 2a", "viadot 2b", "viadot 3"]);

    Ok(())
  }

  #[test]
  fn commit_detail_all_failed_is_empty() -> Result<()> {
    let fetcher = FakeFetcher::new();
    let aggregator = ContributorPrAggregator::new(&fetcher, config(1))?;
    let summary = vec![PullRequestSummary {
      id: 1,
      contributor_name: "alice".to_owned(),
      repo_name: "viadot".to_owned(),
      pr_number: 9,
      title: "t".to_owned(),
      created_at: "2023-01-01T00:00:00Z".to_owned(),
      updated_at: "2023-01-01T00:00:00Z".to_owned(),
      closed_at: None,
      duration_days: 0,
    }];
    let commits = aggregator.run_commit_detail(&summary);

    assert!(commits.rows.is_empty());
    assert_eq!(commits.failures.len(), 1);

    Ok(())
  }

  #[test]
  fn file_detail_survives_failures() -> Result<()> {
    let fetcher =
      org().transport_failure("repos/dyvenia/viadot/pulls/3/files");
    let aggregator = ContributorPrAggregator::new(&fetcher, config(2))?;
    let summary = aggregator.run_pr_summary()?;
    let files = aggregator.run_file_detail(&summary);

    let failed: Vec<_> = files.failures.iter().map(|f| &f.key).collect();
    assert_eq!(failed, vec![&PrKey::new("viadot", 3)]);
    let names: Vec<_> =
      files.rows.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["a.py", "main.py"]);
    assert_eq!(files.rows[1].repo, "timeflow");

    Ok(())
  }

  #[test]
  fn each_pr_fetched_once() -> Result<()> {
    let fetcher = org();
    let aggregator = ContributorPrAggregator::new(&fetcher, config(1))?;
    let mut summary = aggregator.run_pr_summary()?;
    summary.extend(summary.clone());
    let files = aggregator.run_file_detail(&summary);

    assert_eq!(files.rows.len(), 3);
    assert_eq!(fetcher.call_count("repos/dyvenia/viadot/pulls/1/files"), 1);

    Ok(())
  }

  #[test]
  fn full_run_is_independent_of_jobs() -> Result<()> {
    let sequential = ContributorPrAggregator::new(org(), config(1))?.run()?;
    let parallel = ContributorPrAggregator::new(org(), config(4))?.run()?;

    assert_eq!(sequential.summary, parallel.summary);
    assert_eq!(sequential.commits.rows, parallel.commits.rows);
    assert_eq!(sequential.files.rows, parallel.files.rows);
    assert_eq!(
      parallel
        .files
        .rows
        .iter()
        .map(|f| f.filename.as_str())
        .collect::<Vec<_>>(),
      vec!["a.py", "main.py", "b.py"]
    );

    Ok(())
  }
}
