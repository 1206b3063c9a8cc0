use crate::derive::DerivedTable;
use crate::error::LoadError;
use crate::load::load_and_derive;
use once_cell::sync::OnceCell;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, error};

/// What the load boundary hands to the rest of the pipeline: either a ready
/// table, or the error that replaces the dashboard with a banner.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(DerivedTable),
    Failed(LoadError),
}

impl LoadOutcome {
    pub fn table(&self) -> Option<&DerivedTable> {
        match self {
            LoadOutcome::Loaded(t) => Some(t),
            LoadOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            LoadOutcome::Loaded(_) => None,
            LoadOutcome::Failed(e) => Some(e),
        }
    }
}

impl From<Result<DerivedTable, LoadError>> for LoadOutcome {
    fn from(res: Result<DerivedTable, LoadError>) -> Self {
        match res {
            Ok(t) => LoadOutcome::Loaded(t),
            Err(e) => LoadOutcome::Failed(e),
        }
    }
}

/// Session-scoped memo of one source's load result.
///
/// The first `get` reads the file; every later call, from any thread, returns
/// the same `Arc`. Failures are memoised too, and nothing ever invalidates
/// the cell.
#[derive(Debug)]
pub struct LoadCache {
    source: PathBuf,
    cell: OnceCell<Arc<LoadOutcome>>,
}

impl LoadCache {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            cell: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> Arc<LoadOutcome> {
        self.get_with(load_and_derive)
    }

    /// Like [`get`](Self::get) but with a caller-supplied loader, which only
    /// runs if the cell is still empty.
    pub fn get_with<F>(&self, loader: F) -> Arc<LoadOutcome>
    where
        F: FnOnce(&Path) -> Result<DerivedTable, LoadError>,
    {
        if let Some(hit) = self.cell.get() {
            debug!(source = %self.source.display(), "load cache hit");
            return Arc::clone(hit);
        }
        let outcome = self.cell.get_or_init(|| {
            let outcome = LoadOutcome::from(loader(&self.source));
            if let LoadOutcome::Failed(e) = &outcome {
                error!(source = %self.source.display(), "{}", e.banner());
            }
            Arc::new(outcome)
        });
        Arc::clone(outcome)
    }
}
