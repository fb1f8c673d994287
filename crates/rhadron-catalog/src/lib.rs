//! # rhadron-catalog — Particle types known to the host simulation.
//!
//! - [`slha`]: reader for SLHA-style mass and decay tables
//! - [`table`]: the particle table, a standard-model baseline merged with
//!   the custom particles of a particle file
//! - [`loader`]: initialize-once loading shared by every worker

pub mod loader;
pub mod slha;
pub mod table;

pub use loader::CatalogLoader;
pub use slha::{parse_file, parse_str, SlhaDocument};
pub use table::ParticleTable;
