//! The decay orchestrator.
//!
//! [`RHadronDecayer`] drives one composite decay end to end:
//!
//! 1. fill the generator's scratch event with the composite
//! 2. split it into constituents and emit them with momentum fractions
//! 3. run the generator, falling back to a forced decay once
//! 4. harvest products, check energy conservation
//! 5. record the vertex in the shared [`DecayRecordStore`]
//!
//! Every failure is absorbed here: the host always gets a (possibly empty)
//! product list.

use std::sync::Arc;

use rand::RngCore;
use tracing::{debug, error, info, warn};

use rhadron_core::constants::{CLOUD_MASS_OFFSET, STATUS_CONSTITUENT};
use rhadron_core::error::{DecayError, GeneratorError};
use rhadron_core::event::{GeneratorEvent, GeneratorParticle};
use rhadron_core::traits::{DecayEngine, DecayGenerator, ParticleCatalog};
use rhadron_core::types::{
    CompositeCode, CompositeKind, CycleId, DecayProduct, DecayVertexRecord, SecondaryOrder,
    ThreeVector, TrackedParticle,
};

use crate::bridge::{fill_particle, harvest_products, total_energy, PARENT_INDEX};
use crate::config::DecayerConfig;
use crate::flavor;
use crate::store::DecayRecordStore;

/// Momentum fractions of the two light partons of a gluino composite.
///
/// The gluino carries `frac_r`; the light partons share the remainder in
/// proportion to their constituent masses (GeV) plus [`CLOUD_MASS_OFFSET`].
pub fn cloud_fractions(frac_r: f64, m1: f64, m2: f64) -> (f64, f64) {
    let w1 = m1 + CLOUD_MASS_OFFSET;
    let w2 = m2 + CLOUD_MASS_OFFSET;
    let cloud = 1.0 - frac_r;
    (cloud * w1 / (w1 + w2), cloud * w2 / (w1 + w2))
}

/// Whether outgoing energy matches incoming energy within `tolerance`,
/// relative to the incoming energy.
pub fn energy_within_tolerance(e_in: f64, e_out: f64, tolerance: f64) -> bool {
    (e_out - e_in).abs() <= tolerance * e_in.abs()
}

/// Add `displacements` (product order) to `positions` (host order). Extra
/// entries on either side are left alone.
pub fn apply_displacements(
    positions: &mut [ThreeVector],
    displacements: &[ThreeVector],
    order: SecondaryOrder,
) {
    match order {
        SecondaryOrder::Forward => {
            for (pos, d) in positions.iter_mut().zip(displacements) {
                *pos += *d;
            }
        }
        SecondaryOrder::Reversed => {
            for (pos, d) in positions.iter_mut().zip(displacements.iter().rev()) {
                *pos += *d;
            }
        }
    }
}

/// Decays heavy composites through an external generator.
///
/// One instance per worker; the generator it owns is not reentrant. The
/// catalog and record store are shared.
pub struct RHadronDecayer<G: DecayGenerator> {
    generator: G,
    catalog: Arc<dyn ParticleCatalog>,
    store: Arc<DecayRecordStore>,
    config: DecayerConfig,
    /// Displacements of the last call's products, in product order.
    displacements: Vec<ThreeVector>,
    cycle: CycleId,
}

impl<G: DecayGenerator> RHadronDecayer<G> {
    /// Configure `generator` from `config` and initialize it.
    ///
    /// A directive the generator rejects is logged and skipped. Only a
    /// failed `init` is fatal. Records are stamped with the store's current
    /// cycle until [`begin_cycle`](Self::begin_cycle) is called.
    pub fn new(
        mut config: DecayerConfig,
        mut generator: G,
        catalog: Arc<dyn ParticleCatalog>,
        store: Arc<DecayRecordStore>,
    ) -> Result<Self, GeneratorError> {
        let directives = config.resolve_directives();
        config.apply_overrides(&directives);

        for directive in &directives {
            if let Err(e) = generator.apply_directive(directive) {
                warn!(%directive, error = %e, "generator rejected directive");
            }
        }
        generator.init()?;

        let cycle = store.current_cycle();
        info!(
            directives = directives.len(),
            catalog_size = catalog.len(),
            %cycle,
            "decayer initialized"
        );

        Ok(Self {
            generator,
            catalog,
            store,
            config,
            displacements: Vec::new(),
            cycle,
        })
    }

    /// Stamp subsequent records with `cycle`.
    pub fn begin_cycle(&mut self, cycle: CycleId) {
        debug!(%cycle, "decayer entering cycle");
        self.cycle = cycle;
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn config(&self) -> &DecayerConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn store(&self) -> &Arc<DecayRecordStore> {
        &self.store
    }

    /// Displacements recorded by the last decay, not yet consumed.
    pub fn pending_displacements(&self) -> &[ThreeVector] {
        &self.displacements
    }

    /// Decay `track`, surfacing why a decay was abandoned.
    ///
    /// [`DecayEngine::import_products`] wraps this and logs the error.
    pub fn decay(
        &mut self,
        track: &TrackedParticle,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<DecayProduct>, DecayError> {
        self.displacements.clear();

        fill_particle(track, self.generator.event_mut());
        self.build_constituents(rng)?;
        self.generate(rng)?;
        debug!(
            e_final_gev = self.generator.event().final_state_momentum().e,
            entries = self.generator.event().len(),
            "generator finished"
        );

        let products = harvest_products(self.generator.event(), self.catalog.as_ref());
        if products.is_empty() {
            warn!(
                track_id = track.track_id,
                pdg_id = track.pdg_id,
                "generator returned no known final-state products"
            );
            return Ok(products);
        }

        self.check_energy(track, &products);
        self.displacements = products
            .iter()
            .map(|p| p.displacement.unwrap_or_default())
            .collect();
        self.record(track, &products);

        Ok(products)
    }

    /// Break the composite at [`PARENT_INDEX`] into constituents.
    fn build_constituents(&mut self, rng: &mut dyn RngCore) -> Result<(), DecayError> {
        let parent = self
            .generator
            .event()
            .get(PARENT_INDEX)
            .cloned()
            .ok_or(DecayError::MissingComposite(PARENT_INDEX))?;

        let ids = self.config.heavy_ids;
        let (kind, pair) = flavor::split(parent.id, &ids, rng);
        let heavy = ids.heavy_for(CompositeCode(parent.id));
        let m_rhad = parent.m;
        let m_heavy = self.select_heavy_mass(heavy, parent.id, m_rhad, rng)?;
        let frac_r = m_heavy / m_rhad;

        debug!(
            composite = parent.id,
            ?kind,
            first = pair.first,
            second = pair.second,
            frac_r,
            "splitting composite"
        );

        let (m1, m2) = (
            self.generator.constituent_mass(pair.first),
            self.generator.constituent_mass(pair.second),
        );
        let event = self.generator.event_mut();
        let first = event.len();

        match kind {
            CompositeKind::Squark => {
                let col = event.next_col_tag();
                let (heavy_col, light_col) = if pair.first > 0 {
                    ((col, 0), (0, col))
                } else {
                    ((0, col), (col, 0))
                };
                emit(event, &parent, pair.first, frac_r, heavy_col);
                emit(event, &parent, pair.second, 1.0 - frac_r, light_col);
            }
            CompositeKind::Gluino => {
                let col1 = event.next_col_tag();
                let col2 = event.next_col_tag();
                let (frac1, frac2) = cloud_fractions(frac_r, m1, m2);
                emit(event, &parent, heavy, frac_r, (col2, col1));
                emit(event, &parent, pair.first, frac1, (col1, 0));
                emit(event, &parent, pair.second, frac2, (0, col2));
            }
        }

        let last = event.len() - 1;
        if let Some(p) = event.get_mut(PARENT_INDEX) {
            p.status_neg();
            p.daughter1 = first;
            p.daughter2 = last;
        }
        Ok(())
    }

    /// Draw the heavy parton mass (GeV), resampling while it does not fit
    /// inside the composite.
    fn select_heavy_mass(
        &self,
        heavy: i32,
        composite: i32,
        m_rhad: f64,
        rng: &mut dyn RngCore,
    ) -> Result<f64, DecayError> {
        let id = heavy.abs();
        let mut mass = self.draw_mass(id, rng)?;
        let mut attempts = 0;
        while mass >= m_rhad {
            attempts += 1;
            if attempts == self.config.mass_warn_attempts {
                warn!(parton = id, mass, composite, m_rhad, attempts, "parton heavier than composite, resampling");
            }
            if attempts > self.config.mass_max_attempts {
                return Err(DecayError::MassInversion {
                    parton: id,
                    parton_mass: mass,
                    composite,
                    composite_mass: m_rhad,
                    attempts,
                });
            }
            mass = self.draw_mass(id, rng)?;
        }
        Ok(mass)
    }

    fn draw_mass(&self, id: i32, rng: &mut dyn RngCore) -> Result<f64, DecayError> {
        self.generator
            .select_mass(id, rng)
            .ok_or(DecayError::UnknownMass(id))
    }

    /// Run the generator, forcing the decays once if the regular step fails.
    fn generate(&mut self, rng: &mut dyn RngCore) -> Result<(), DecayError> {
        if let Err(e) = self.generator.next(rng) {
            warn!(error = %e, "generation failed, forcing decays");
            self.generator.force_decays(rng)?;
        }
        Ok(())
    }

    fn check_energy(&self, track: &TrackedParticle, products: &[DecayProduct]) {
        let e_in = track.total_energy();
        let e_out = total_energy(products);
        if !energy_within_tolerance(e_in, e_out, self.config.energy_tolerance) {
            warn!(
                track_id = track.track_id,
                pdg_id = track.pdg_id,
                e_in,
                e_out,
                tolerance = self.config.energy_tolerance,
                "energy not conserved in decay"
            );
        }
    }

    fn record(&self, track: &TrackedParticle, products: &[DecayProduct]) {
        let record = DecayVertexRecord {
            cycle: self.cycle,
            parent_track_id: track.track_id,
            parent_pdg_id: track.pdg_id,
            position: track.position,
            time: track.global_time,
            parent_momentum: track.momentum,
            products: products.to_vec(),
        };
        if let Err(e) = self.store.append(record) {
            warn!(track_id = track.track_id, error = %e, "decay record dropped, products still returned");
        }
    }
}

/// Append one constituent carrying `frac` of the parent four-momentum.
fn emit(
    event: &mut GeneratorEvent,
    parent: &GeneratorParticle,
    id: i32,
    frac: f64,
    (col, acol): (i32, i32),
) {
    event.append(
        GeneratorParticle::new(id, STATUS_CONSTITUENT, parent.p * frac, parent.m * frac)
            .with_mothers(PARENT_INDEX, 0)
            .with_colors(col, acol)
            .with_vertex(parent.v_prod, parent.t_prod),
    );
}

impl<G: DecayGenerator> DecayEngine for RHadronDecayer<G> {
    fn import_products(
        &mut self,
        track: &TrackedParticle,
        rng: &mut dyn RngCore,
    ) -> Vec<DecayProduct> {
        match self.decay(track, rng) {
            Ok(products) => products,
            Err(e) => {
                error!(
                    track_id = track.track_id,
                    pdg_id = track.pdg_id,
                    error = %e,
                    "decay abandoned"
                );
                self.displacements.clear();
                Vec::new()
            }
        }
    }

    fn correct_positions(&mut self, positions: &mut [ThreeVector]) {
        if positions.len() != self.displacements.len() {
            warn!(
                positions = positions.len(),
                displacements = self.displacements.len(),
                "secondary count does not match recorded displacements"
            );
        }
        apply_displacements(
            positions,
            &self.displacements,
            self.config.secondary_order,
        );
        self.displacements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectiveSource;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rhadron_core::constants::{PDG_GLUINO, PDG_NEUTRALINO, PDG_STOP};
    use rhadron_core::types::ParticleDefinition;
    use std::cell::Cell;
    use std::collections::HashMap;

    const M_RHAD_MEV: f64 = 1_800_000.0;

    /// Generator that decays every pending constituent into one neutralino
    /// carrying the composite's full four-momentum.
    struct MockGenerator {
        event: GeneratorEvent,
        directives: Vec<String>,
        initialized: bool,
        fail_init: bool,
        fail_next: u32,
        fail_forced: bool,
        forced_calls: u32,
        heavy_masses: Vec<f64>,
        draws: Cell<usize>,
        vertex_offset: Option<ThreeVector>,
    }

    impl Default for MockGenerator {
        fn default() -> Self {
            Self {
                event: GeneratorEvent::new(),
                directives: Vec::new(),
                initialized: false,
                fail_init: false,
                fail_next: 0,
                fail_forced: false,
                forced_calls: 0,
                heavy_masses: vec![1500.0],
                draws: Cell::new(0),
                vertex_offset: None,
            }
        }
    }

    impl MockGenerator {
        fn decay_constituents(&mut self) {
            let Some(parent) = self.event.get(PARENT_INDEX).cloned() else {
                return;
            };
            for i in 1..self.event.len() {
                if let Some(p) = self.event.get_mut(i) {
                    p.status_neg();
                }
            }
            let mut product = GeneratorParticle::new(PDG_NEUTRALINO, 91, parent.p, parent.m);
            if let Some(offset) = self.vertex_offset {
                product = product.with_vertex(parent.v_prod + offset, 0.0);
                self.event.set_has_vertices(true);
            }
            self.event.append(product);
        }
    }

    impl DecayGenerator for MockGenerator {
        fn apply_directive(&mut self, directive: &str) -> Result<(), GeneratorError> {
            if directive.starts_with("Bad") {
                return Err(GeneratorError::InvalidDirective(directive.to_string()));
            }
            self.directives.push(directive.to_string());
            Ok(())
        }

        fn init(&mut self) -> Result<(), GeneratorError> {
            if self.fail_init {
                return Err(GeneratorError::InitFailed("mock".into()));
            }
            self.initialized = true;
            Ok(())
        }

        fn event(&self) -> &GeneratorEvent {
            &self.event
        }

        fn event_mut(&mut self) -> &mut GeneratorEvent {
            &mut self.event
        }

        fn next(&mut self, _rng: &mut dyn RngCore) -> Result<(), GeneratorError> {
            if self.fail_next > 0 {
                self.fail_next -= 1;
                return Err(GeneratorError::GenerationFailed("mock".into()));
            }
            self.decay_constituents();
            Ok(())
        }

        fn force_decays(&mut self, _rng: &mut dyn RngCore) -> Result<(), GeneratorError> {
            self.forced_calls += 1;
            if self.fail_forced {
                return Err(GeneratorError::ForcedDecayFailed("mock".into()));
            }
            self.decay_constituents();
            Ok(())
        }

        fn select_mass(&self, _pdg_id: i32, _rng: &mut dyn RngCore) -> Option<f64> {
            let i = self.draws.get();
            self.draws.set(i + 1);
            self.heavy_masses
                .get(i)
                .or(self.heavy_masses.last())
                .copied()
        }

        fn constituent_mass(&self, pdg_id: i32) -> f64 {
            match pdg_id.abs() {
                1 | 2 => 0.33,
                3 => 0.5,
                _ => 0.77,
            }
        }
    }

    struct Table(HashMap<i32, ParticleDefinition>);

    impl ParticleCatalog for Table {
        fn find(&self, pdg_id: i32) -> Option<&ParticleDefinition> {
            self.0.get(&pdg_id)
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    fn catalog() -> Arc<dyn ParticleCatalog> {
        let mut m = HashMap::new();
        m.insert(
            PDG_NEUTRALINO,
            ParticleDefinition::stable(PDG_NEUTRALINO, "~chi_10", M_RHAD_MEV, 0.0),
        );
        Arc::new(Table(m))
    }

    fn decayer(generator: MockGenerator) -> RHadronDecayer<MockGenerator> {
        decayer_with_config(DecayerConfig::default(), generator)
    }

    fn decayer_with_config(
        config: DecayerConfig,
        generator: MockGenerator,
    ) -> RHadronDecayer<MockGenerator> {
        RHadronDecayer::new(
            config,
            generator,
            catalog(),
            Arc::new(DecayRecordStore::new()),
        )
        .unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn constituents(d: &RHadronDecayer<MockGenerator>) -> Vec<GeneratorParticle> {
        d.generator()
            .event()
            .iter()
            .filter(|p| p.status.abs() == STATUS_CONSTITUENT)
            .cloned()
            .collect()
    }

    // --- construction ---

    #[test]
    fn new_applies_default_directives_and_inits() {
        let d = decayer(MockGenerator::default());
        assert!(d.generator().initialized);
        assert_eq!(d.generator().directives.len(), 6);
        assert_eq!(d.cycle(), CycleId(0));
    }

    #[test]
    fn rejected_directive_is_skipped() {
        let config = DecayerConfig {
            directives: DirectiveSource::Inline(vec![
                "Bad:setting = 1".into(),
                "RHadrons:allowDecay = on".into(),
            ]),
            ..DecayerConfig::default()
        };
        let d = RHadronDecayer::new(
            config,
            MockGenerator::default(),
            catalog(),
            Arc::new(DecayRecordStore::new()),
        )
        .unwrap();
        assert_eq!(d.generator().directives, vec!["RHadrons:allowDecay = on"]);
    }

    #[test]
    fn init_failure_is_fatal() {
        let generator = MockGenerator { fail_init: true, ..MockGenerator::default() };
        let result = RHadronDecayer::new(
            DecayerConfig::default(),
            generator,
            catalog(),
            Arc::new(DecayRecordStore::new()),
        );
        assert!(matches!(result, Err(GeneratorError::InitFailed(_))));
    }

    #[test]
    fn heavy_id_directive_reaches_config() {
        let config = DecayerConfig {
            directives: DirectiveSource::Inline(vec!["RHadrons:idStop = 2000006".into()]),
            ..DecayerConfig::default()
        };
        let d = RHadronDecayer::new(
            config,
            MockGenerator::default(),
            catalog(),
            Arc::new(DecayRecordStore::new()),
        )
        .unwrap();
        assert_eq!(d.config().heavy_ids.stop, 2_000_006);
    }

    #[test]
    fn starts_at_store_cycle() {
        let d = RHadronDecayer::new(
            DecayerConfig::default(),
            MockGenerator::default(),
            catalog(),
            Arc::new(DecayRecordStore::starting_at(CycleId(5))),
        )
        .unwrap();
        assert_eq!(d.cycle(), CycleId(5));
    }

    // --- constituents ---

    #[test]
    fn gluino_meson_constituents() {
        let mut d = decayer(MockGenerator::default());
        let track = TrackedParticle::at_rest(1, 1_009_213, M_RHAD_MEV);
        d.import_products(&track, &mut rng());

        let c = constituents(&d);
        let ids: Vec<i32> = c.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![PDG_GLUINO, 2, -1]);

        // gluino (col2, col1), quark (col1, 0), antiquark (0, col2)
        let (col1, col2) = (c[1].col, c[2].acol);
        assert_ne!(col1, col2);
        assert_eq!((c[0].col, c[0].acol), (col2, col1));
        assert_eq!(c[1].acol, 0);
        assert_eq!(c[2].col, 0);

        let energy: f64 = c.iter().map(|p| p.p.e).sum();
        assert!((energy - 1800.0).abs() < 1e-9);
        assert!((c[0].p.e - 1500.0).abs() < 1e-9);
        assert!(c.iter().all(|p| p.mother1 == PARENT_INDEX));
    }

    #[test]
    fn parent_points_at_constituents() {
        let mut d = decayer(MockGenerator::default());
        d.import_products(&TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV), &mut rng());
        let parent = d.generator().event().get(PARENT_INDEX).unwrap();
        assert!(parent.status < 0);
        assert_eq!((parent.daughter1, parent.daughter2), (2, 4));
    }

    #[test]
    fn stop_meson_colors() {
        let mut d = decayer(MockGenerator::default());
        d.import_products(&TrackedParticle::at_rest(1, 1_000_612, M_RHAD_MEV), &mut rng());
        let c = constituents(&d);
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].id, PDG_STOP);
        assert_eq!(c[1].id, -1);
        assert!(c[0].col > 0 && c[0].acol == 0);
        assert_eq!(c[1].acol, c[0].col);
        assert!((c[0].m - 1500.0).abs() < 1e-9);
        assert!((c[1].m - 300.0).abs() < 1e-9);
    }

    #[test]
    fn anti_stop_meson_colors() {
        let mut d = decayer(MockGenerator::default());
        d.import_products(&TrackedParticle::at_rest(1, -1_000_612, M_RHAD_MEV), &mut rng());
        let c = constituents(&d);
        assert_eq!(c[0].id, -PDG_STOP);
        assert!(c[0].acol > 0 && c[0].col == 0);
        assert_eq!(c[1].col, c[0].acol);
    }

    // --- mass selection ---

    #[test]
    fn resample_until_mass_fits() {
        let generator = MockGenerator {
            heavy_masses: vec![1900.0, 1800.0, 1500.0],
            ..MockGenerator::default()
        };
        let mut d = decayer(generator);
        let products = d.import_products(&TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV), &mut rng());
        assert_eq!(products.len(), 1);
        assert_eq!(d.generator().draws.get(), 3);
    }

    #[test]
    fn mass_inversion_abandons_decay() {
        let generator = MockGenerator { heavy_masses: vec![2000.0], ..MockGenerator::default() };
        let mut d = decayer(generator);
        let track = TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV);
        let err = d.decay(&track, &mut rng()).unwrap_err();
        assert!(matches!(err, DecayError::MassInversion { attempts: 101, .. }), "{err:?}");
        assert_eq!(d.generator().draws.get(), 101);
        assert!(d.import_products(&track, &mut rng()).is_empty());
        assert!(d.store().is_empty());
    }

    #[test]
    fn unknown_heavy_mass_abandons_decay() {
        let generator = MockGenerator { heavy_masses: vec![], ..MockGenerator::default() };
        let mut d = decayer(generator);
        let err = d
            .decay(&TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV), &mut rng())
            .unwrap_err();
        assert_eq!(err, DecayError::UnknownMass(PDG_GLUINO));
    }

    // --- generation ---

    #[test]
    fn at_rest_decay_conserves_energy_and_records() {
        let mut d = decayer(MockGenerator::default());
        let track = TrackedParticle::at_rest(3, 1_009_213, M_RHAD_MEV);
        let products = d.import_products(&track, &mut rng());
        assert_eq!(products.len(), 1);
        assert!(energy_within_tolerance(track.total_energy(), total_energy(&products), 0.01));

        let records = d.store().drain_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parent_track_id, 3);
        assert_eq!(records[0].parent_pdg_id, 1_009_213);
        assert_eq!(records[0].products, products);
    }

    #[test]
    fn failed_generation_falls_back_once() {
        let generator = MockGenerator { fail_next: 1, ..MockGenerator::default() };
        let mut d = decayer(generator);
        let products = d.import_products(&TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV), &mut rng());
        assert_eq!(products.len(), 1);
        assert_eq!(d.generator().forced_calls, 1);
    }

    #[test]
    fn failed_fallback_yields_nothing() {
        let generator = MockGenerator { fail_next: 1, fail_forced: true, ..MockGenerator::default() };
        let mut d = decayer(generator);
        let track = TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV);
        assert!(d.import_products(&track, &mut rng()).is_empty());
        assert_eq!(d.generator().forced_calls, 1);
        assert!(d.store().is_empty());
    }

    #[test]
    fn stale_cycle_keeps_products() {
        let mut d = decayer(MockGenerator::default());
        d.begin_cycle(CycleId(9));
        let products = d.import_products(&TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV), &mut rng());
        assert_eq!(products.len(), 1);
        assert!(d.store().is_empty());
        assert_eq!(d.store().rejected(), 1);
    }

    // --- displacements ---

    #[test]
    fn correct_positions_applies_and_consumes() {
        let generator = MockGenerator {
            vertex_offset: Some(ThreeVector::new(0.0, 0.0, 2.5)),
            ..MockGenerator::default()
        };
        let mut d = decayer(generator);
        let products = d.import_products(&TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV), &mut rng());
        assert_eq!(products[0].displacement, Some(ThreeVector::new(0.0, 0.0, 2.5)));

        let mut positions = [ThreeVector::new(1.0, 1.0, 1.0)];
        d.correct_positions(&mut positions);
        assert_eq!(positions[0], ThreeVector::new(1.0, 1.0, 3.5));
        assert!(d.pending_displacements().is_empty());

        d.correct_positions(&mut positions);
        assert_eq!(positions[0], ThreeVector::new(1.0, 1.0, 3.5));
    }

    #[test]
    fn displacements_follow_host_order() {
        let d = [
            ThreeVector::new(1.0, 0.0, 0.0),
            ThreeVector::new(0.0, 2.0, 0.0),
            ThreeVector::new(0.0, 0.0, 3.0),
        ];

        let mut forward = [ThreeVector::ZERO; 3];
        apply_displacements(&mut forward, &d, SecondaryOrder::Forward);
        assert_eq!(forward, d);

        let mut reversed = [ThreeVector::ZERO; 3];
        apply_displacements(&mut reversed, &d, SecondaryOrder::Reversed);
        assert_eq!(reversed, [d[2], d[1], d[0]]);
    }

    #[test]
    fn short_host_list_takes_leading_displacements() {
        let d = [ThreeVector::new(1.0, 0.0, 0.0), ThreeVector::new(0.0, 2.0, 0.0)];
        let mut positions = [ThreeVector::ZERO];
        apply_displacements(&mut positions, &d, SecondaryOrder::Reversed);
        assert_eq!(positions[0], d[1]);
    }

    #[test]
    fn reversed_decayer_consumes_displacements() {
        let generator = MockGenerator {
            vertex_offset: Some(ThreeVector::new(0.0, 0.0, 2.5)),
            ..MockGenerator::default()
        };
        let mut d = decayer_with_config(
            DecayerConfig {
                secondary_order: SecondaryOrder::Reversed,
                ..DecayerConfig::default()
            },
            generator,
        );
        d.import_products(&TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV), &mut rng());
        let mut positions = [ThreeVector::ZERO];
        d.correct_positions(&mut positions);
        assert_eq!(positions[0], ThreeVector::new(0.0, 0.0, 2.5));
        assert!(d.pending_displacements().is_empty());
    }

    #[test]
    fn displacements_are_overwritten_per_call() {
        let generator = MockGenerator {
            vertex_offset: Some(ThreeVector::new(1.0, 0.0, 0.0)),
            ..MockGenerator::default()
        };
        let mut d = decayer(generator);
        let track = TrackedParticle::at_rest(1, 1_000_993, M_RHAD_MEV);
        d.import_products(&track, &mut rng());
        d.import_products(&track, &mut rng());
        assert_eq!(d.pending_displacements().len(), 1);
    }

    #[test]
    fn moving_composite_keeps_direction() {
        let mut d = decayer(MockGenerator::default());
        let track = TrackedParticle::moving(1, 1_009_213, M_RHAD_MEV, ThreeVector::new(0.0, 0.0, 900_000.0));
        let products = d.import_products(&track, &mut rng());
        assert!((products[0].momentum - track.momentum.momentum()).mag() < 1e-3);
    }

    // --- energy check ---

    #[test]
    fn energy_tolerance_band() {
        assert!(energy_within_tolerance(100.0, 100.9, 0.01));
        assert!(energy_within_tolerance(100.0, 99.1, 0.01));
        assert!(!energy_within_tolerance(100.0, 101.5, 0.01));
        assert!(!energy_within_tolerance(100.0, 98.0, 0.01));
    }

    proptest! {
        #[test]
        fn fractions_sum_to_one(
            frac_r in 0.0f64..1.0,
            m1 in 0.0f64..2.0,
            m2 in 0.0f64..2.0,
        ) {
            let (f1, f2) = cloud_fractions(frac_r, m1, m2);
            prop_assert!((frac_r + f1 + f2 - 1.0).abs() < 1e-12);
            prop_assert!(f1 >= 0.0 && f2 >= 0.0);
        }
    }
}
