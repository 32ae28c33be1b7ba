use anyhow::Result;
use serde::Serialize;
use std::{fs::File, io::Write, path::Path};
use tracing::info;

pub fn csv_writer(path: &Path) -> Result<csv::Writer<File>> {
  let file = File::create(path)?;
  let out = csv::Writer::from_writer(file);
  Ok(out)
}

/// Header comes from the field names of `T`.
pub fn write_rows_to<W: Write, T: Serialize>(
  writer: &mut csv::Writer<W>,
  rows: &[T],
) -> Result<()> {
  for row in rows {
    writer.serialize(row)?;
  }
  writer.flush()?;

  Ok(())
}

pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
  write_rows_to(&mut csv_writer(path)?, rows)?;
  info!("wrote {} rows to {}", rows.len(), path.display());

  Ok(())
}
