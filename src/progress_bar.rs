use indicatif::{ProgressBar, ProgressStyle};

/// A bar for `len` requests; hidden (but still counting) when not `visible`
/// so library callers and tests stay quiet.
#[must_use]
pub fn get_bar(len: u64, visible: bool) -> ProgressBar {
  if !visible {
    return ProgressBar::hidden();
  }

  let bar = ProgressBar::new(len);
  bar.set_style(ProgressStyle::default_bar().template(
    "[{elapsed_precise}] {bar} {pos:>5} / {len:>5} requests {eta_precise}",
  ));
  bar
}
