use crate::articles::OutputRow;
use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Suffix appended to the destination path to derive the checkpoint path.
pub const CHECKPOINT_SUFFIX: &str = ".tmp";
/// Suffix appended to an unreadable checkpoint when it is set aside.
const CORRUPT_SUFFIX: &str = ".corrupt";

/// Durable storage for partial and final results. The checkpoint lives next
/// to the destination and is safe to delete between runs (doing so forces
/// full reprocessing).
pub struct CheckpointStore {
    destination: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: Into<PathBuf>>(destination: P) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        let mut path = self.destination.clone().into_os_string();
        path.push(CHECKPOINT_SUFFIX);
        PathBuf::from(path)
    }

    /// Reconstruct (rows-so-far, already-processed ids) from a prior
    /// interrupted run. Missing checkpoint means a fresh start. An unreadable
    /// checkpoint is set aside for inspection and also treated as a fresh
    /// start rather than aborting the run.
    pub fn load(&self) -> crate::Result<(Vec<OutputRow>, HashSet<String>)> {
        let checkpoint = self.checkpoint_path();
        if !checkpoint.exists() {
            return Ok((Vec::new(), HashSet::new()));
        }

        match read_rows(&checkpoint) {
            Ok(rows) => {
                let processed_ids = rows
                    .iter()
                    .filter(|row| !row.id.is_empty())
                    .map(|row| row.id.clone())
                    .collect();
                crate::info!(
                    "Resuming from {} with {} existing rows",
                    checkpoint.display(),
                    rows.len()
                );
                Ok((rows, processed_ids))
            }
            Err(e) => {
                crate::warn!(
                    "Checkpoint {} is unreadable ({e}); discarding prior progress",
                    checkpoint.display()
                );
                self.set_aside_corrupt(&checkpoint);
                Ok((Vec::new(), HashSet::new()))
            }
        }
    }

    /// Overwrite the checkpoint with the full row sequence. No-op when there
    /// is nothing to save.
    pub fn save(&self, rows: &[OutputRow]) -> crate::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let checkpoint = self.checkpoint_path();
        write_rows(&checkpoint, rows)?;
        crate::info!("Progress saved to {} ({} rows)", checkpoint.display(), rows.len());
        Ok(())
    }

    /// Write the final output artifact and remove the checkpoint. This is the
    /// only operation that deletes the checkpoint.
    pub fn finalize(&self, rows: &[OutputRow]) -> crate::Result<()> {
        if rows.is_empty() {
            crate::info!("No results to save");
            return Ok(());
        }
        write_rows(&self.destination, rows)?;
        crate::info!(
            "Final results saved to {} ({} rows)",
            self.destination.display(),
            rows.len()
        );

        let checkpoint = self.checkpoint_path();
        if checkpoint.exists() {
            std::fs::remove_file(&checkpoint).with_context(|| {
                format!("failed to remove checkpoint {}", checkpoint.display())
            })?;
            crate::info!("Cleaned up checkpoint {}", checkpoint.display());
        }
        Ok(())
    }

    /// Rename an unreadable checkpoint aside so the next periodic save cannot
    /// overwrite the only evidence of what went wrong. Best effort.
    fn set_aside_corrupt(&self, checkpoint: &Path) {
        let mut aside = checkpoint.to_path_buf().into_os_string();
        aside.push(CORRUPT_SUFFIX);
        let aside = PathBuf::from(aside);
        match std::fs::rename(checkpoint, &aside) {
            Ok(()) => crate::warn!(
                "Unreadable checkpoint preserved at {}",
                aside.display()
            ),
            Err(e) => crate::warn!(
                "Failed to set aside unreadable checkpoint {}: {e}",
                checkpoint.display()
            ),
        }
    }
}

fn read_rows(path: &Path) -> crate::Result<Vec<OutputRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: OutputRow =
            record.with_context(|| format!("failed to parse row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

fn write_rows(path: &Path, rows: &[OutputRow]) -> crate::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;

    fn row(id: &str, neighborhood: &str, confidence: f64) -> OutputRow {
        OutputRow {
            id: id.to_string(),
            title: format!("title-{id}"),
            content: format!("content-{id}"),
            tags: String::new(),
            categories: "news".to_string(),
            neighborhood: neighborhood.to_string(),
            confidence,
            rationale: "mentions 24th St".to_string(),
        }
    }

    #[test]
    fn load_without_checkpoint_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("classified.csv"));
        let (rows, ids) = store.load().unwrap();
        assert!(rows.is_empty());
        assert!(ids.is_empty());
    }

    #[test]
    fn save_then_load_round_trips_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("classified.csv"));
        let rows = vec![row("a", "Mission", 0.85), row("b", "unknown", 0.0)];

        store.save(&rows).unwrap();
        let (loaded, ids) = store.load().unwrap();

        assert_eq!(loaded, rows);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("a") && ids.contains("b"));
    }

    #[test]
    fn save_with_no_rows_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("classified.csv"));
        store.save(&[]).unwrap();
        assert!(!store.checkpoint_path().exists());
    }

    #[test]
    fn corrupt_checkpoint_is_set_aside_and_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("classified.csv"));
        std::fs::write(store.checkpoint_path(), "not,a\ncheckpoint,file\n").unwrap();

        let (rows, ids) = store.load().unwrap();
        assert!(rows.is_empty());
        assert!(ids.is_empty());
        assert!(!store.checkpoint_path().exists());
        assert!(dir.path().join("classified.csv.tmp.corrupt").exists());
    }

    #[test]
    fn finalize_writes_destination_and_removes_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("classified.csv");
        let store = CheckpointStore::new(&destination);
        let rows = vec![row("a", "Mission", 0.85)];

        store.save(&rows).unwrap();
        assert!(store.checkpoint_path().exists());

        store.finalize(&rows).unwrap();
        assert!(destination.exists());
        assert!(!store.checkpoint_path().exists());

        let read = read_rows(&destination).unwrap();
        assert_eq!(read, rows);
    }
}
