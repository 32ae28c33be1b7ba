use github_activity::{
  config::{Config, ConfigOpt},
  github_api, logging,
};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
  name = "list_repos",
  about = "print out the public repos of an organization"
)]
struct Opt {
  #[structopt(flatten)]
  config: ConfigOpt,
}

pub fn main() -> anyhow::Result<()> {
  let Opt { config } = Opt::from_args();
  logging::init(config.verbose);

  let config = Config::from_env(&config)?;
  let fetcher = config.fetcher()?;

  for name in github_api::list_repo_names(&fetcher, &config.org)? {
    println!("{}", name);
  }

  Ok(())
}
