pub mod aggregator;
pub mod config;
pub mod github_api;
pub mod github_types;
pub mod logging;
pub mod output_data;
pub mod progress_bar;

pub use aggregator::{
  ActivityReport, AggregatorConfig, ContributorPrAggregator, DetailOutcome,
};
pub use config::{Config, ConfigOpt};
pub use github_types::{
  Commit, Contribution, ContributorRepoMap, FileChange, PrKey, PullRequestInfo,
  PullRequestSummary,
};

/// Check that `err` is (rooted in) exactly `expected`.
#[cfg(test)]
pub(crate) fn check_error<E>(
  err: anyhow::Error,
  expected: &E,
) -> anyhow::Result<()>
where
  E: std::error::Error + PartialEq + Send + Sync + 'static,
{
  match err.downcast_ref::<E>() {
    Some(actual) => {
      assert_eq!(actual, expected);
      Ok(())
    }
    None => Err(err),
  }
}
