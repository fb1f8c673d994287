//! Error types for the R-hadron decay engine.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("generator not initialized")] NotInitialized,
    #[error("initialization failed: {0}")] InitFailed(String),
    #[error("directive rejected: {0}")] InvalidDirective(String),
    #[error("event generation failed: {0}")] GenerationFailed(String),
    #[error("forced decay failed: {0}")] ForcedDecayFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecayError {
    #[error("no composite at index {0} of the scratch event")] MissingComposite(usize),
    #[error("no mass available for parton {0}")] UnknownMass(i32),
    #[error("parton {parton} mass {parton_mass} GeV above composite {composite} mass {composite_mass} GeV after {attempts} attempts")]
    MassInversion { parton: i32, parton_mass: f64, composite: i32, composite_mass: f64, attempts: u32 },
    #[error("generation and forced decay both failed: {0}")] Generation(#[from] GeneratorError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    #[error("record for track {track_id} stamped with cycle {record_cycle}, store is at cycle {store_cycle}")]
    StaleCycle { track_id: i32, record_cycle: u64, store_cycle: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("io: {0}")] Io(String),
    #[error("line {line}: {message}")] Parse { line: usize, message: String },
}

#[derive(Error, Debug)]
pub enum RHadronError {
    #[error(transparent)] Generator(#[from] GeneratorError),
    #[error(transparent)] Decay(#[from] DecayError),
    #[error(transparent)] RecordStore(#[from] RecordStoreError),
    #[error(transparent)] Catalog(#[from] CatalogError),
}
