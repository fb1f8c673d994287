//! Marshaling between host tracks and the generator's scratch event.
//!
//! The host speaks MeV and the generator GeV; lengths are mm on both sides.
//! [`fill_particle`] goes host → generator, [`harvest_products`] goes back.

use tracing::{debug, warn};

use rhadron_core::constants::{
    SIM_ENERGY_PER_GENERATOR_ENERGY, SIM_LENGTH_PER_GENERATOR_LENGTH, STATUS_UNDECAYED,
};
use rhadron_core::event::{GeneratorEvent, GeneratorParticle};
use rhadron_core::traits::ParticleCatalog;
use rhadron_core::types::{DecayProduct, FourVector, ThreeVector, TrackedParticle};

/// Index of the composite in a freshly filled event (index 0 is the system entry).
pub const PARENT_INDEX: usize = 1;

/// MeV → GeV.
pub fn to_generator_energy(mev: f64) -> f64 {
    mev / SIM_ENERGY_PER_GENERATOR_ENERGY
}

/// GeV → MeV.
pub fn to_sim_energy(gev: f64) -> f64 {
    gev * SIM_ENERGY_PER_GENERATOR_ENERGY
}

pub fn to_generator_momentum(p: FourVector) -> FourVector {
    p * (1.0 / SIM_ENERGY_PER_GENERATOR_ENERGY)
}

pub fn to_sim_momentum(p: FourVector) -> ThreeVector {
    p.momentum() * SIM_ENERGY_PER_GENERATOR_ENERGY
}

/// Reset `event` and put `track` in it as an undecayed entry with no
/// mothers or daughters. Returns the entry index (always [`PARENT_INDEX`]).
pub fn fill_particle(track: &TrackedParticle, event: &mut GeneratorEvent) -> usize {
    event.reset();
    event.append(GeneratorParticle::new(
        track.pdg_id,
        STATUS_UNDECAYED,
        to_generator_momentum(track.momentum),
        to_generator_energy(track.mass),
    ))
}

/// Collect the final-state entries of `event` as host products.
///
/// Entries with negative status are skipped. Entries whose PDG id is
/// unknown to `catalog` are dropped with a warning. When the generator
/// reports production vertices, each product carries its displacement from
/// the parent's production vertex.
pub fn harvest_products<C: ParticleCatalog + ?Sized>(
    event: &GeneratorEvent,
    catalog: &C,
) -> Vec<DecayProduct> {
    let parent_vertex = event
        .get(PARENT_INDEX)
        .map(|p| p.v_prod)
        .unwrap_or_default();

    let mut products = Vec::new();
    for (i, entry) in event.iter().enumerate() {
        debug!(
            index = i,
            id = entry.id,
            status = entry.status,
            v_prod = %entry.v_prod,
            "generator entry"
        );
        if !entry.is_final() {
            continue;
        }

        let Some(definition) = catalog.find(entry.id) else {
            warn!(pdg_id = entry.id, index = i, "no particle definition, skipping product");
            continue;
        };

        let momentum = to_sim_momentum(entry.p);
        let displacement = event
            .has_vertices()
            .then(|| (entry.v_prod - parent_vertex) * SIM_LENGTH_PER_GENERATOR_LENGTH);

        debug!(
            name = %definition.name,
            pdg_id = entry.id,
            momentum = %momentum,
            "adding product"
        );
        products.push(DecayProduct {
            pdg_id: entry.id,
            momentum,
            mass: definition.mass,
            displacement,
        });
    }
    products
}

/// Total energy (MeV) of a product list.
pub fn total_energy(products: &[DecayProduct]) -> f64 {
    products.iter().map(DecayProduct::total_energy).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhadron_core::types::ParticleDefinition;
    use std::collections::HashMap;

    struct Table(HashMap<i32, ParticleDefinition>);

    impl ParticleCatalog for Table {
        fn find(&self, pdg_id: i32) -> Option<&ParticleDefinition> {
            self.0.get(&pdg_id)
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    fn table() -> Table {
        let mut m = HashMap::new();
        for def in [
            ParticleDefinition::stable(211, "pi+", 139.57, 1.0),
            ParticleDefinition::stable(-211, "pi-", 139.57, -1.0),
            ParticleDefinition::stable(1_000_022, "~chi_10", 1_500_000.0, 0.0),
            ParticleDefinition::stable(1_009_213, "~g_rho+", 1_800_650.0, 1.0),
        ] {
            m.insert(def.pdg_id, def);
        }
        Table(m)
    }

    fn moving_track() -> TrackedParticle {
        TrackedParticle::moving(
            5,
            1_009_213,
            1_800_650.0,
            ThreeVector::new(12_345.0, -6_789.0, 250_000.0),
        )
    }

    #[test]
    fn fill_converts_units_and_sets_status() {
        let mut event = GeneratorEvent::new();
        let idx = fill_particle(&moving_track(), &mut event);
        assert_eq!(idx, PARENT_INDEX);
        let entry = event.get(idx).unwrap();
        assert_eq!(entry.id, 1_009_213);
        assert_eq!(entry.status, STATUS_UNDECAYED);
        assert_eq!((entry.mother1, entry.mother2), (0, 0));
        assert_eq!((entry.daughter1, entry.daughter2), (0, 0));
        assert!((entry.m - 1800.65).abs() < 1e-9);
        assert!((entry.p.pz - 250.0).abs() < 1e-9);
    }

    #[test]
    fn fill_resets_previous_contents() {
        let mut event = GeneratorEvent::new();
        event.append(GeneratorParticle::new(211, 1, FourVector::ZERO, 0.14));
        event.append(GeneratorParticle::new(211, 1, FourVector::ZERO, 0.14));
        fill_particle(&moving_track(), &mut event);
        assert_eq!(event.len(), 2);
    }

    #[test]
    fn round_trip_preserves_id_and_momentum() {
        let track = moving_track();
        let mut event = GeneratorEvent::new();
        fill_particle(&track, &mut event);
        let products = harvest_products(&event, &table());
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].pdg_id, track.pdg_id);
        let p = products[0].momentum;
        let q = track.momentum.momentum();
        assert!((p - q).mag() < 1e-6, "{p} vs {q}");
        assert_eq!(products[0].displacement, None);
    }

    #[test]
    fn harvest_skips_decayed_entries() {
        let mut event = GeneratorEvent::new();
        fill_particle(&moving_track(), &mut event);
        event.get_mut(PARENT_INDEX).unwrap().status_neg();
        event.append(GeneratorParticle::new(211, 91, FourVector::new(0.3, 0.0, 0.0, 0.33), 0.13957));
        let products = harvest_products(&event, &table());
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].pdg_id, 211);
        assert!((products[0].momentum.x - 300.0).abs() < 1e-9);
    }

    #[test]
    fn harvest_drops_unknown_ids() {
        let mut event = GeneratorEvent::new();
        event.append(GeneratorParticle::new(9_999_999, 91, FourVector::ZERO, 1.0));
        event.append(GeneratorParticle::new(-211, 91, FourVector::ZERO, 0.13957));
        let products = harvest_products(&event, &table());
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].pdg_id, -211);
    }

    #[test]
    fn harvest_records_displacement_relative_to_parent() {
        let mut event = GeneratorEvent::new();
        fill_particle(&moving_track(), &mut event);
        event.get_mut(PARENT_INDEX).unwrap().status_neg();
        event.get_mut(PARENT_INDEX).unwrap().v_prod = ThreeVector::new(1.0, 1.0, 1.0);
        event.append(
            GeneratorParticle::new(1_000_022, 91, FourVector::new(0.0, 0.0, 0.0, 1500.0), 1500.0)
                .with_vertex(ThreeVector::new(1.5, 1.0, 3.0), 0.0),
        );
        event.set_has_vertices(true);
        let products = harvest_products(&event, &table());
        assert_eq!(products[0].displacement, Some(ThreeVector::new(0.5, 0.0, 2.0)));
    }

    #[test]
    fn unit_conversions_invert() {
        assert!((to_sim_energy(to_generator_energy(1234.5)) - 1234.5).abs() < 1e-9);
        assert!((to_generator_energy(1000.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn total_energy_sums_products() {
        let products = vec![
            DecayProduct { pdg_id: 22, momentum: ThreeVector::new(3.0, 0.0, 0.0), mass: 4.0, displacement: None },
            DecayProduct { pdg_id: 22, momentum: ThreeVector::new(0.0, 6.0, 0.0), mass: 8.0, displacement: None },
        ];
        assert!((total_energy(&products) - 15.0).abs() < 1e-12);
    }
}
