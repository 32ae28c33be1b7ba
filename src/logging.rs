use tracing_subscriber::EnvFilter;

/// Log to stderr; `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(if verbose {
      "github_activity=debug"
    } else {
      "github_activity=info"
    })
  });

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}
