//! Append-only CSV log of benchmark timings.
//!
//! One row per timed run: `solution,version,query_no,duration[s],success`.
//! The header is written when the file is empty so repeated sweeps across
//! engines accumulate into one file.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER: &str = "solution,version,query_no,duration[s],success\n";

pub struct TimingsLog {
    path: PathBuf,
}

impl TimingsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timing row, creating the file (and header) on first use.
    pub fn append(
        &self,
        solution: &str,
        version: &str,
        query_no: u8,
        seconds: f64,
        success: bool,
    ) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open timings log {}", self.path.display()))?;

        if file.seek(SeekFrom::End(0))? == 0 {
            file.write_all(HEADER.as_bytes())?;
        }

        writeln!(
            file,
            "{},{},{},{},{}",
            solution, version, query_no, seconds, success
        )
        .with_context(|| format!("Failed to append to timings log {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = TimingsLog::new(dir.path().join("time.csv"));

        log.append("duckdb", "v1.1.1", 1, 0.25, true).unwrap();
        log.append("duckdb", "v1.1.1", 2, 0.0, false).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "solution,version,query_no,duration[s],success");
        assert_eq!(lines[1], "duckdb,v1.1.1,1,0.25,true");
        assert_eq!(lines[2], "duckdb,v1.1.1,2,0,false");
    }
}
