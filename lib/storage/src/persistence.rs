use anyhow::{anyhow, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use georank_core::{Business, Catalog, Review, StageStatus};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static LAST_SAVE_TIME: AtomicU64 = AtomicU64::new(0);

pub const SNAPSHOT_FILENAME: &str = "catalog.json";

/// Everything needed to rebuild a catalog without rerunning the batch stages
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub businesses: Vec<Business>,
    pub reviews: Vec<Review>,
    pub stages: StageStatus,
    pub timestamp: u64,
}

impl CatalogSnapshot {
    pub fn capture(catalog: &Catalog) -> Result<Self> {
        let (businesses, reviews, stages) = catalog.snapshot();
        Ok(Self {
            businesses,
            reviews,
            stages,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)?
                .as_secs(),
        })
    }
}

/// Whole-catalog JSON snapshots, replaced atomically on each save
pub struct SnapshotPersistence {
    snapshot_path: PathBuf,
}

impl SnapshotPersistence {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            snapshot_path: data_dir.as_ref().join(SNAPSHOT_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Write the snapshot (synchronous, blocks until complete)
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let snapshot = CatalogSnapshot::capture(catalog)?;
        AtomicFile::new(&self.snapshot_path, AllowOverwrite)
            .write(|file| {
                let mut writer = BufWriter::new(file);
                serde_json::to_writer(&mut writer, &snapshot)?;
                writer.flush()?;
                Ok::<(), anyhow::Error>(())
            })
            .map_err(|e| anyhow!("writing {}: {}", self.snapshot_path.display(), e))?;

        LAST_SAVE_TIME.store(snapshot.timestamp, Ordering::Release);
        Ok(())
    }

    /// Load snapshot from disk (on startup)
    pub fn load(&self) -> Result<Option<CatalogSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }

        let file = std::fs::File::open(&self.snapshot_path)?;
        let snapshot: CatalogSnapshot = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| anyhow!("Deserialization error: {}", e))?;
        Ok(Some(snapshot))
    }

    /// Seconds since the epoch of the last successful save, 0 if none
    pub fn last_save_time() -> u64 {
        LAST_SAVE_TIME.load(Ordering::Acquire)
    }
}
