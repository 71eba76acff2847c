//! Histogram snapshots for persistence and interop.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// Plain record of a histogram's state.
///
/// `bin_counts` is index-aligned with the face ordering of the geometry the
/// histogram was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramSnapshot {
    pub overflow: u64,
    pub bin_counts: Vec<u64>,
}

impl HistogramSnapshot {
    /// Total number of directions recorded, overflow included.
    pub fn total(&self) -> u64 {
        self.overflow + self.bin_counts.iter().sum::<u64>()
    }

    /// Write as JSON, gzipped if the path ends in `.gz`.
    pub fn write_json(&self, path: &Path) -> Result<(), SnapshotError> {
        let file = File::create(path)?;
        if is_gzip(path) {
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
            serde_json::to_writer(&mut encoder, self)?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        log::debug!(
            "wrote snapshot with {} bins to {}",
            self.bin_counts.len(),
            path.display()
        );
        Ok(())
    }

    /// Read a snapshot written by [`write_json`](Self::write_json).
    pub fn read_json(path: &Path) -> Result<Self, SnapshotError> {
        let file = BufReader::new(File::open(path)?);
        let reader: Box<dyn Read> = if is_gzip(path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(serde_json::from_reader(reader)?)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|ext| ext == "gz").unwrap_or(false)
}
