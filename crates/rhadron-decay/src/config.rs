//! Decayer configuration.
//!
//! One [`DecayerConfig`] covers every decayer setup: built-in default
//! directives, a directive file, or an inline list, optionally combined with
//! a particle-definitions (SLHA) file handed to the generator. Missing files
//! never abort: they are logged and the defaults are used instead.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use rhadron_core::constants::{
    DEFAULT_DIRECTIVES, ENERGY_TOLERANCE, MASS_RESAMPLE_LIMIT, MASS_RESAMPLE_WARN,
};

use rhadron_core::types::SecondaryOrder;

use crate::flavor::HeavyPartonIds;

/// Where the generator directives come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DirectiveSource {
    /// The built-in [`DEFAULT_DIRECTIVES`].
    #[default]
    Defaults,
    /// One directive per line; `!` and `#` start comment lines.
    File(PathBuf),
    /// Directives supplied programmatically.
    Inline(Vec<String>),
}

/// Configuration for a decayer instance.
#[derive(Debug, Clone)]
pub struct DecayerConfig {
    pub directives: DirectiveSource,
    /// SLHA particle-definitions file passed to the generator.
    pub catalog_file: Option<PathBuf>,
    /// Heavy parton ids restored from composites. Overridden by
    /// `RHadrons:idGluino`, `RHadrons:idStop`, `RHadrons:idSbottom` directives.
    pub heavy_ids: HeavyPartonIds,
    /// Relative band for the energy-conservation check.
    pub energy_tolerance: f64,
    /// Mass resample attempt that triggers a warning.
    pub mass_warn_attempts: u32,
    /// Mass resample attempts after which a decay is abandoned.
    pub mass_max_attempts: u32,
    /// How the host orders secondaries handed to `correct_positions`.
    pub secondary_order: SecondaryOrder,
}

impl Default for DecayerConfig {
    fn default() -> Self {
        Self {
            directives: DirectiveSource::Defaults,
            catalog_file: None,
            heavy_ids: HeavyPartonIds::default(),
            energy_tolerance: ENERGY_TOLERANCE,
            mass_warn_attempts: MASS_RESAMPLE_WARN,
            mass_max_attempts: MASS_RESAMPLE_LIMIT,
            secondary_order: SecondaryOrder::Forward,
        }
    }
}

impl DecayerConfig {
    /// Default directives plus a particle-definitions file.
    pub fn with_catalog_file(path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Directives read from `path` instead of the defaults.
    pub fn with_directive_file(path: impl Into<PathBuf>) -> Self {
        Self {
            directives: DirectiveSource::File(path.into()),
            ..Self::default()
        }
    }

    /// The full, ordered directive list to hand to the generator.
    ///
    /// The particle-definitions file (if any) comes first; a missing one is
    /// logged and left out. An unreadable directive file falls back to
    /// [`DEFAULT_DIRECTIVES`].
    pub fn resolve_directives(&self) -> Vec<String> {
        let mut out = Vec::new();

        match &self.catalog_file {
            Some(path) if is_readable_file(path) => {
                info!(path = %path.display(), "using particle definitions file");
                out.push(format!("SLHA:file = {}", path.display()));
            }
            Some(path) => {
                error!(path = %path.display(), "particle definitions file missing or unreadable, generator defaults apply");
            }
            None => warn!("no particle definitions file, generator defaults apply"),
        }

        match &self.directives {
            DirectiveSource::Defaults => {
                info!("no directive file, using default decayer directives");
                out.extend(default_directives());
            }
            DirectiveSource::File(path) => match read_directive_file(path) {
                Ok(lines) => {
                    info!(path = %path.display(), count = lines.len(), "using directive file");
                    out.extend(lines);
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "could not read directive file, using defaults");
                    out.extend(default_directives());
                }
            },
            DirectiveSource::Inline(lines) => out.extend(lines.iter().cloned()),
        }

        out
    }

    /// Apply heavy-id overrides found in `directives`.
    pub fn apply_overrides(&mut self, directives: &[String]) {
        for d in directives {
            let Some((key, value)) = d.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let target = match key.as_str() {
                "rhadrons:idgluino" => &mut self.heavy_ids.gluino,
                "rhadrons:idstop" => &mut self.heavy_ids.stop,
                "rhadrons:idsbottom" => &mut self.heavy_ids.sbottom,
                _ => continue,
            };
            match value.trim().parse::<i32>() {
                Ok(id) => {
                    debug!(%key, id, "heavy parton id override");
                    *target = id;
                }
                Err(_) => warn!(directive = %d, "ignoring malformed heavy parton id"),
            }
        }
    }
}

fn is_readable_file(path: &Path) -> bool {
    fs::File::open(path).and_then(|f| f.metadata()).is_ok_and(|m| m.is_file())
}

fn default_directives() -> impl Iterator<Item = String> {
    DEFAULT_DIRECTIVES.iter().map(|d| d.to_string())
}

/// Read directives from a file, one per line.
pub fn read_directive_file(path: &Path) -> std::io::Result<Vec<String>> {
    Ok(parse_directives(&fs::read_to_string(path)?))
}

/// Split directive text into directives, dropping blanks and comment lines.
pub fn parse_directives(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('!') && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
