use github_activity::{
  config::{Config, ConfigOpt},
  github_api::list_repo_names,
  logging,
  output_data::write_rows,
  ActivityReport, ContributorPrAggregator,
};
use itertools::Itertools;
use std::{fs, path::PathBuf};
use structopt::StructOpt;
use tracing::{info, warn};

#[derive(StructOpt)]
#[structopt(
  name = "collect_activity",
  about = "save pr summary, commit and file change csvs for the given repos \
           (commits.csv ends with a repo column, commits are keyed by repo \
           and pr number)"
)]
struct Opt {
  /// Directory for pr_summary.csv, commits.csv (with a trailing repo column)
  /// and files.csv.
  #[structopt(parse(from_os_str))]
  out_dir: PathBuf,

  /// Use every public repo of the organization instead of GITHUB_REPOS.
  #[structopt(long)]
  all_repos: bool,

  /// Don't draw progress bars.
  #[structopt(long)]
  quiet: bool,

  #[structopt(flatten)]
  config: ConfigOpt,
}

pub fn main() -> anyhow::Result<()> {
  let opt = Opt::from_args();
  logging::init(opt.config.verbose);

  let mut config = Config::from_env(&opt.config)?;
  let fetcher = config.fetcher()?;
  if opt.all_repos {
    config.repos = list_repo_names(&fetcher, &config.org)?;
  }
  if config.repos.is_empty() {
    anyhow::bail!("no repos given (set GITHUB_REPOS, --repos or --all-repos)");
  }
  info!("collecting {}: {}", config.org, config.repos.iter().join(", "));

  let aggregator =
    ContributorPrAggregator::new(fetcher, config.aggregator_config())?
      .show_progress(!opt.quiet);
  let ActivityReport {
    summary,
    commits,
    files,
  } = aggregator.run()?;

  for failure in commits.failures.iter().chain(&files.failures) {
    warn!(
      "incomplete: {}#{} ({:#})",
      failure.key.repo, failure.key.pr_number, failure.error
    );
  }

  fs::create_dir_all(&opt.out_dir)?;
  write_rows(&opt.out_dir.join("pr_summary.csv"), &summary)?;
  write_rows(&opt.out_dir.join("commits.csv"), &commits.rows)?;
  write_rows(&opt.out_dir.join("files.csv"), &files.rows)?;

  Ok(())
}
