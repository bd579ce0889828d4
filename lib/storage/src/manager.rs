use crate::ingest::{read_businesses, read_reviews};
use crate::persistence::SnapshotPersistence;
use georank_core::{Catalog, CatalogConfig, Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Owns the shared catalog and its on-disk snapshot
pub struct StorageManager {
    catalog: Arc<Catalog>,
    data_dir: PathBuf,
    persistence: SnapshotPersistence,
}

impl StorageManager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        Self::with_config(data_dir, CatalogConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(data_dir: P, config: CatalogConfig) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let persistence = SnapshotPersistence::new(&data_dir);
        let catalog = Arc::new(Catalog::new(config));

        if let Some(snapshot) = persistence
            .load()
            .map_err(|e| Error::Storage(e.to_string()))?
        {
            info!("Loading snapshot from {:?}", persistence.path());
            let (businesses, reviews) = (snapshot.businesses.len(), snapshot.reviews.len());
            catalog.restore(snapshot.businesses, snapshot.reviews, snapshot.stages)?;
            info!(businesses, reviews, "Snapshot loaded");
        }

        Ok(Self {
            catalog,
            data_dir,
            persistence,
        })
    }

    #[inline]
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    #[inline]
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load a business JSON Lines export into the catalog
    pub fn ingest_businesses<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let businesses = read_businesses(path.as_ref()).map_err(|e| Error::Storage(format!("{:#}", e)))?;
        let count = self.catalog.batch_upsert_businesses(businesses)?;
        info!(count, path = ?path.as_ref(), "Businesses ingested");
        Ok(count)
    }

    /// Load a review JSON Lines export into the catalog
    pub fn ingest_reviews<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let reviews = read_reviews(path.as_ref()).map_err(|e| Error::Storage(format!("{:#}", e)))?;
        let count = self.catalog.batch_upsert_reviews(reviews)?;
        info!(count, path = ?path.as_ref(), "Reviews ingested");
        Ok(count)
    }

    /// Force save
    pub fn save(&self) -> Result<()> {
        self.persistence
            .save(&self.catalog)
            .map_err(|e| Error::Storage(e.to_string()))?;
        info!("Snapshot saved to {:?}", self.persistence.path());
        Ok(())
    }

    /// Get last save time
    pub fn last_save_time(&self) -> u64 {
        SnapshotPersistence::last_save_time()
    }
}
