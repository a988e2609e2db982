use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::shared_data::MetricsRecord;

/// Serializes records to any writer, with a header row when asked.
pub fn write_records<W: Write, T: Serialize>(
    writer: W,
    records: &[T],
    with_headers: bool,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(with_headers)
        .from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Appends metrics snapshots to a CSV file, writing the header only when the
/// file is first created.
#[derive(Debug, Clone)]
pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &MetricsRecord) -> Result<()> {
        let file_exists = self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        write_records(file, std::slice::from_ref(record), !file_exists)
    }

    pub fn read_all(&self) -> Result<Vec<MetricsRecord>> {
        let mut rdr = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}
