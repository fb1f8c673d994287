//! Host-facing decay process.
//!
//! The host scheduler knows nothing about generators: it asks whether a
//! particle type is handled, then asks for the secondaries of one decay.
//! [`DecayProcess`] answers both on top of any [`DecayEngine`].

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rhadron_core::traits::DecayEngine;
use rhadron_core::types::{CompositeCode, DecayProduct, ThreeVector, TrackedParticle};

/// A secondary ready to be pushed onto the host's track stack.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Secondary {
    pub pdg_id: i32,
    /// Three-momentum (MeV).
    pub momentum: ThreeVector,
    /// Rest mass (MeV).
    pub mass: f64,
    /// Lab position (mm).
    pub position: ThreeVector,
    /// Global time (ns).
    pub time: f64,
}

impl Secondary {
    fn at_parent(product: &DecayProduct, track: &TrackedParticle) -> Self {
        Self {
            pdg_id: product.pdg_id,
            momentum: product.momentum,
            mass: product.mass,
            position: track.position,
            time: track.global_time,
        }
    }
}

/// Boxed decay hook for registration with a host scheduler.
pub type DecayCallback = Box<dyn FnMut(&TrackedParticle, &mut dyn RngCore) -> Vec<Secondary> + Send>;

/// Decay process for gluino, stop, and sbottom hadrons.
pub struct DecayProcess<E: DecayEngine> {
    engine: E,
}

impl<E: DecayEngine> DecayProcess<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Whether `pdg_id` is an R-hadron this process decays.
    pub fn applies_to(&self, pdg_id: i32) -> bool {
        CompositeCode(pdg_id).heavy_flavor().is_some()
    }

    /// Decay `track` into secondaries placed at the decay point, shifted by
    /// the displacements the engine recorded. Secondaries keep product
    /// order, matching `SecondaryOrder::Forward`.
    pub fn decay_it(&mut self, track: &TrackedParticle, rng: &mut dyn RngCore) -> Vec<Secondary> {
        if !self.applies_to(track.pdg_id) {
            warn!(pdg_id = track.pdg_id, track_id = track.track_id, "not an R-hadron, ignoring");
            return Vec::new();
        }

        let products = self.engine.import_products(track, rng);
        let mut secondaries: Vec<Secondary> = products
            .iter()
            .map(|p| Secondary::at_parent(p, track))
            .collect();

        let mut positions: Vec<ThreeVector> = secondaries.iter().map(|s| s.position).collect();
        self.engine.correct_positions(&mut positions);
        for (s, pos) in secondaries.iter_mut().zip(positions) {
            s.position = pos;
        }

        debug!(
            track_id = track.track_id,
            secondaries = secondaries.len(),
            "decay process finished"
        );
        secondaries
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_inner(self) -> E {
        self.engine
    }
}

impl<E: DecayEngine + 'static> DecayProcess<E> {
    /// Turn the process into a boxed callback.
    pub fn into_callback(mut self) -> DecayCallback {
        Box::new(move |track: &TrackedParticle, rng: &mut dyn RngCore| {
            self.decay_it(track, rng)
        })
    }
}
