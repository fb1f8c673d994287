//! Initialize-once catalog loading.
//!
//! Workers start concurrently and all need the same table. The first
//! [`CatalogLoader::load`] builds it; every other call, racing or later,
//! gets the same `Arc`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{error, info};

use rhadron_core::traits::ParticleCatalog;

use crate::slha::parse_file;
use crate::table::ParticleTable;

/// Lazily built, shared particle table.
#[derive(Debug, Default)]
pub struct CatalogLoader {
    path: Option<PathBuf>,
    table: OnceLock<Arc<ParticleTable>>,
}

impl CatalogLoader {
    /// Loader for the standard-model table merged with `path`.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            table: OnceLock::new(),
        }
    }

    /// Loader for the standard-model table alone.
    pub fn standard_model_only() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The table, built on first call.
    ///
    /// An unreadable or malformed particle file is logged and the
    /// standard-model table is used.
    pub fn load(&self) -> Arc<ParticleTable> {
        Arc::clone(self.table.get_or_init(|| Arc::new(build(self.path.as_deref()))))
    }

    /// The table as a trait object, for decayers.
    pub fn catalog(&self) -> Arc<dyn ParticleCatalog> {
        self.load()
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }
}

fn build(path: Option<&Path>) -> ParticleTable {
    let mut table = ParticleTable::standard_model();
    let Some(path) = path else {
        info!(particles = table.len(), "loaded standard-model particle table");
        return table;
    };

    info!(path = %path.display(), "reading custom particles and decay tables");
    match parse_file(path) {
        Ok(doc) => table.apply_slha(&doc),
        Err(e) => error!(path = %path.display(), error = %e, "could not load particle file, using standard-model table"),
    }
    table
}
