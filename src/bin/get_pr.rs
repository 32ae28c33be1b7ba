use github_activity::{
  config::{Config, ConfigOpt},
  github_api, logging,
};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
  name = "get_pr",
  about = "print out a pull request given a repo and number"
)]
struct Opt {
  repo: String,
  number: u64,

  /// Also list the commits and changed files.
  #[structopt(long)]
  details: bool,

  #[structopt(flatten)]
  config: ConfigOpt,
}

pub fn main() -> anyhow::Result<()> {
  let opt = Opt::from_args();
  logging::init(opt.config.verbose);

  let config = Config::from_env(&opt.config)?;
  let fetcher = config.fetcher()?;

  let Opt { repo, number, .. } = &opt;
  let org = config.org.as_str();

  println!("{:#?}", github_api::get_pr_info(&fetcher, org, repo, *number)?);

  if opt.details {
    for commit in github_api::get_commits(&fetcher, org, repo, *number)? {
      println!("{} {} {:?}", commit.date_commit, commit.author, commit.message);
    }
    for file in github_api::get_files_changed(&fetcher, org, repo, *number)? {
      println!(
        "{} +{} -{} {}",
        file.status, file.additions, file.deletions, file.path_to_file
      );
    }
  }

  Ok(())
}
