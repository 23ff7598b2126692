//! Wrapper around the external `dbgen` data generator.
//!
//! dbgen writes its output into its own working directory: `<table>.tbl`
//! for whole-table runs, `<table>.tbl.<n>` for piece runs. Callers are
//! expected to decode and then delete the produced file.

use crate::datagen::DatagenError;
use crate::schema::TpchTable;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Invokes `dbgen` from a fixed directory at a fixed scale factor.
#[derive(Debug, Clone)]
pub struct Dbgen {
    dir: PathBuf,
    scale_factor: f64,
}

impl Dbgen {
    pub fn new(dir: impl Into<PathBuf>, scale_factor: f64) -> Self {
        Self {
            dir: dir.into(),
            scale_factor,
        }
    }

    /// Check that the dbgen binary exists before starting a long run.
    pub fn check_binary(&self) -> Result<(), DatagenError> {
        let binary = self.dir.join("dbgen");
        if !binary.is_file() {
            return Err(DatagenError::Spawn(format!(
                "dbgen binary not found at {}",
                binary.display()
            )));
        }
        Ok(())
    }

    /// Generate an entire table. Returns the path of the produced .tbl file.
    pub fn generate_table(&self, table: TpchTable) -> Result<PathBuf, DatagenError> {
        let output = self.dir.join(format!("{}.tbl", table.name()));
        remove_if_exists(&output)?;
        self.run(&[
            "-f".to_string(),
            "-s".to_string(),
            self.scale_factor.to_string(),
            "-T".to_string(),
            table.dbgen_selector().to_string(),
        ])?;
        Ok(output)
    }

    /// Generate one piece of a table (1-based piece index, as dbgen counts).
    /// Returns the path of the produced .tbl file.
    pub fn generate_piece(
        &self,
        table: TpchTable,
        piece: usize,
        num_pieces: usize,
    ) -> Result<PathBuf, DatagenError> {
        let output = self.dir.join(format!("{}.tbl.{}", table.name(), piece));
        remove_if_exists(&output)?;
        self.run(&[
            "-f".to_string(),
            "-s".to_string(),
            self.scale_factor.to_string(),
            "-S".to_string(),
            piece.to_string(),
            "-C".to_string(),
            num_pieces.to_string(),
            "-T".to_string(),
            table.dbgen_selector().to_string(),
        ])?;
        Ok(output)
    }

    fn run(&self, args: &[String]) -> Result<(), DatagenError> {
        debug!("Running dbgen {}", args.join(" "));
        // resolve before setting the working directory so a relative
        // dbgen_dir does not change what gets executed
        let dir = self
            .dir
            .canonicalize()
            .map_err(|e| DatagenError::Spawn(format!("{}: {}", self.dir.display(), e)))?;
        let output = Command::new(dir.join("dbgen"))
            .args(args)
            .current_dir(&dir)
            .output()
            .map_err(|e| DatagenError::Spawn(e.to_string()))?;

        if !output.status.success() {
            return Err(DatagenError::Generator {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Remove a stale generator output if present.
pub fn remove_if_exists(path: &Path) -> Result<(), DatagenError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DatagenError::Storage(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dbgen = Dbgen::new(dir.path(), 1.0);
        let err = dbgen.check_binary().unwrap_err();
        assert!(err.to_string().contains("dbgen binary not found"));
    }

    #[test]
    fn test_remove_if_exists_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        remove_if_exists(&dir.path().join("nope.tbl")).unwrap();

        let present = dir.path().join("orders.tbl");
        std::fs::write(&present, "1|x|\n").unwrap();
        remove_if_exists(&present).unwrap();
        assert!(!present.exists());
    }
}
