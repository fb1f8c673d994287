//! Trait interfaces between the decay engine and its collaborators.
//!
//! - [`DecayGenerator`]: the external general-purpose decay generator
//! - [`ParticleCatalog`]: the host's particle table (rhadron-catalog implements)
//! - [`DecayEngine`]: what the host scheduler calls to decay a track
//!   (rhadron-decay implements)

use rand::RngCore;

use crate::error::GeneratorError;
use crate::event::GeneratorEvent;
use crate::types::{DecayProduct, ParticleDefinition, ThreeVector, TrackedParticle};

/// An external decay generator with its own scratch event and particle data.
///
/// Internal event state is not reentrant, so instances are `Send` but never
/// shared: every worker owns one. All randomness is drawn from the
/// caller-supplied `rng` so that the host seeding policy stays in control.
pub trait DecayGenerator: Send {
    /// Apply one settings directive (`Key:name = value`).
    fn apply_directive(&mut self, directive: &str) -> Result<(), GeneratorError>;

    /// Finish configuration. Called once, after all directives.
    fn init(&mut self) -> Result<(), GeneratorError>;

    /// Read access to the scratch event.
    fn event(&self) -> &GeneratorEvent;

    /// Write access to the scratch event.
    fn event_mut(&mut self) -> &mut GeneratorEvent;

    /// Process the scratch event in a single generation step.
    fn next(&mut self, rng: &mut dyn RngCore) -> Result<(), GeneratorError>;

    /// Recovery path that forces the pending heavy partons to decay after a
    /// failed [`next`](Self::next).
    fn force_decays(&mut self, rng: &mut dyn RngCore) -> Result<(), GeneratorError>;

    /// Draw a mass (GeV) for `pdg_id` from its line shape.
    fn select_mass(&self, pdg_id: i32, rng: &mut dyn RngCore) -> Option<f64>;

    /// Constituent mass (GeV) of a quark or diquark.
    fn constituent_mass(&self, pdg_id: i32) -> f64;
}

/// Lookup of particle types known to the host simulation.
pub trait ParticleCatalog: Send + Sync {
    /// Find a particle type by PDG id. Returns `None` when unknown.
    fn find(&self, pdg_id: i32) -> Option<&ParticleDefinition>;

    /// Whether `pdg_id` is known.
    ///
    /// Default implementation delegates to [`find`](Self::find).
    fn contains(&self, pdg_id: i32) -> bool {
        self.find(pdg_id).is_some()
    }

    /// Number of known particle types.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability the host scheduler invokes to decay one tracked particle.
pub trait DecayEngine: Send {
    /// Decay `track` and return its products in simulation units.
    ///
    /// Never fails: an abandoned decay returns an empty list.
    fn import_products(
        &mut self,
        track: &TrackedParticle,
        rng: &mut dyn RngCore,
    ) -> Vec<DecayProduct>;

    /// Shift secondary positions by the displacements recorded during the
    /// last [`import_products`](Self::import_products) call. Consumes the
    /// recorded displacements.
    ///
    /// `positions` is in the order the host materialized the secondaries.
    /// Implementations pair it with the product list according to a
    /// configured [`SecondaryOrder`](crate::types::SecondaryOrder):
    /// `Forward` when the host keeps the returned order, `Reversed` when
    /// it pops products last-first.
    fn correct_positions(&mut self, positions: &mut [ThreeVector]);
}
