//! # rhadron-decay — Decay orchestration for R-hadrons.
//!
//! The host simulation cannot decay color-charged heavy composites itself,
//! so each decay is handed to an external generator:
//! - **Flavor splitting**: a composite PDG code is broken into its heavy
//!   parton and light quark or diquark ([`flavor`]).
//! - **Bridge**: tracks are marshaled into the generator's scratch event and
//!   final-state products are harvested back in MeV ([`bridge`]).
//! - **Orchestration**: constituents are emitted with momentum fractions,
//!   the generator runs with a single forced-decay fallback, and energy
//!   conservation is checked ([`decayer`]).
//! - **Record store**: one vertex record per decay, shared across workers
//!   and drained once per cycle ([`store`]).
//! - **Process hook**: the capability the host scheduler calls ([`process`]).

pub mod bridge;
pub mod config;
pub mod decayer;
pub mod flavor;
pub mod process;
pub mod store;

pub use config::{DecayerConfig, DirectiveSource};
pub use decayer::RHadronDecayer;
pub use flavor::{is_gluino_type, split_gluino, split_squark, HeavyPartonIds};
pub use process::{DecayCallback, DecayProcess, Secondary};
pub use store::DecayRecordStore;
