use super::{Dataset, DatasetLoader};
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceKey {
    path: PathBuf,
    modified: SystemTime,
    len: u64,
}

impl SourceKey {
    fn of(path: &Path) -> Result<Self> {
        let wrap = |e: io::Error| Error::Io(io::Error::new(e.kind(), format!("{}: {}", path.display(), e)));
        let path = fs::canonicalize(path).map_err(wrap)?;
        let meta = fs::metadata(&path).map_err(wrap)?;
        Ok(Self {
            modified: meta.modified().map_err(wrap)?,
            len: meta.len(),
            path,
        })
    }
}

#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// The source is unchanged since the last load.
    Hit(Arc<Dataset>),
    /// The source was read (first load, or it changed).
    Loaded(Arc<Dataset>),
}

impl CacheLookup {
    pub fn dataset(&self) -> &Arc<Dataset> {
        match self {
            CacheLookup::Hit(ds) | CacheLookup::Loaded(ds) => ds,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheLookup::Loaded(_))
    }
}

/// Keeps the last loaded dataset and reloads it only when the source file's
/// path, modification time or size changes.
pub struct DatasetCache {
    loader: DatasetLoader,
    entry: Option<(SourceKey, Arc<Dataset>)>,
}

impl DatasetCache {
    pub fn new(loader: DatasetLoader) -> Self {
        Self {
            loader,
            entry: None,
        }
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<CacheLookup> {
        let key = SourceKey::of(path.as_ref())?;

        if let Some((cached_key, dataset)) = &self.entry {
            if *cached_key == key {
                log::debug!("Dataset cache hit for {}", key.path.display());
                return Ok(CacheLookup::Hit(dataset.clone()));
            }
            log::info!("{} changed, reloading", key.path.display());
        }

        let dataset = Arc::new(self.loader.load(&key.path)?);
        self.entry = Some((key, dataset.clone()));
        Ok(CacheLookup::Loaded(dataset))
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
