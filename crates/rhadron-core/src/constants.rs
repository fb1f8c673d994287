//! Engine constants: unit scales, PDG identifiers, status codes, and tuning.
//!
//! The host simulation works in MeV / mm / ns. The decay generator works in
//! GeV / mm. Every crossing between the two goes through the scales below.

/// Simulation energy units (MeV) per generator energy unit (GeV).
pub const SIM_ENERGY_PER_GENERATOR_ENERGY: f64 = 1000.0;

/// Simulation length units (mm) per generator length unit (mm).
pub const SIM_LENGTH_PER_GENERATOR_LENGTH: f64 = 1.0;

/// Reduced Planck constant in GeV·ns, used to turn a decay width into a lifetime.
pub const HBAR_GEV_NS: f64 = 6.582122e-16;

// --- PDG identifiers ---

/// Gluino.
pub const PDG_GLUINO: i32 = 1_000_021;

/// Lighter stop squark.
pub const PDG_STOP: i32 = 1_000_006;

/// Lighter sbottom squark.
pub const PDG_SBOTTOM: i32 = 1_000_005;

/// The fully gluonic gluino composite (gluino-gluon bound state).
pub const PDG_GLUINOBALL: i32 = 1_000_993;

/// Lightest neutralino.
pub const PDG_NEUTRALINO: i32 = 1_000_022;

/// Offset marking the SUSY partner range of the PDG numbering scheme.
pub const SUSY_OFFSET: i32 = 1_000_000;

// --- Generator event status codes ---

/// Status of the system entry at index 0 of a reset event.
pub const STATUS_SYSTEM: i32 = -11;

/// Status of the freshly filled, not yet decayed composite.
pub const STATUS_UNDECAYED: i32 = 1;

/// Status of constituents emitted when the composite is broken up.
pub const STATUS_CONSTITUENT: i32 = 106;

/// PDG code the generator uses for the event-system pseudo particle.
pub const PDG_SYSTEM: i32 = 90;

/// First color tag handed out after an event reset.
pub const FIRST_COLOR_TAG: i32 = 100;

// --- Orchestrator tuning ---

/// Relative band within which outgoing energy must match incoming energy.
pub const ENERGY_TOLERANCE: f64 = 0.01;

/// Heavy-parton mass resample attempt at which a warning is logged.
pub const MASS_RESAMPLE_WARN: u32 = 10;

/// Heavy-parton mass resample attempts after which the decay is abandoned.
pub const MASS_RESAMPLE_LIMIT: u32 = 100;

/// Offset (GeV) added to light constituent masses when sharing the cloud
/// momentum of a gluino composite.
pub const CLOUD_MASS_OFFSET: f64 = 0.2;

/// Probability that a diquark of unequal flavors is chosen in its spin-0 state.
pub const DIQUARK_SPIN0_PROB: f64 = 0.25;

/// Directives applied to the generator when no directive file is configured.
pub const DEFAULT_DIRECTIVES: [&str; 6] = [
    "ProcessLevel:all = off",
    "SUSY:all = on",
    "RHadrons:all = on",
    "RHadrons:allowDecay = on",
    "RHadrons:probGluinoball = 0.1",
    "PartonLevel:FSR = off",
];
