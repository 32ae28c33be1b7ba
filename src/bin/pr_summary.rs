use github_activity::{
  config::{Config, ConfigOpt},
  logging,
  output_data::write_rows,
  ContributorPrAggregator,
};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
  name = "pr_summary",
  about = "save every pr of every contributor of the given repos to a csv"
)]
struct Opt {
  #[structopt(parse(from_os_str))]
  out_path: PathBuf,

  /// Don't draw progress bars.
  #[structopt(long)]
  quiet: bool,

  #[structopt(flatten)]
  config: ConfigOpt,
}

pub fn main() -> anyhow::Result<()> {
  let opt = Opt::from_args();
  logging::init(opt.config.verbose);

  let config = Config::from_env(&opt.config)?;
  let aggregator =
    ContributorPrAggregator::new(config.fetcher()?, config.aggregator_config())?
      .show_progress(!opt.quiet);

  write_rows(&opt.out_path, &aggregator.run_pr_summary()?)
}
