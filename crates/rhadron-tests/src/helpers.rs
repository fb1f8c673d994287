//! Shared helpers for the integration tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Once};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use rhadron_catalog::{parse_str, ParticleTable};
use rhadron_core::constants::{PDG_GLUINO, PDG_NEUTRALINO, PDG_SBOTTOM, PDG_STOP};
use rhadron_core::error::GeneratorError;
use rhadron_core::event::{GeneratorEvent, GeneratorParticle};
use rhadron_core::traits::{DecayGenerator, ParticleCatalog};
use rhadron_core::types::{FourVector, ThreeVector};
use rhadron_decay::bridge::PARENT_INDEX;

/// Neutralino mass (GeV) in [`PARTICLE_FILE`].
pub const NEUTRALINO_MASS_GEV: f64 = 1500.0;

/// Charged pion mass (GeV) the scripted generator decays into.
pub const PION_MASS_GEV: f64 = 0.13957039;

/// Status the scripted generator gives its final-state products.
pub const STATUS_PRODUCT: i32 = 91;

/// A compact spectrum: gluino, stop, sbottom, the lightest neutralino, and
/// a handful of R-hadrons of each family.
pub const PARTICLE_FILE: &str = "\
BLOCK MASS  # Mass spectrum
#  PDG code      mass       particle
   1000021     1.80000000E+03   # ~g
   1000022     1.50000000E+03   # ~chi_10
   1000006     1.70000000E+03   # ~t_1
   1000005     1.60000000E+03   # ~b_1
   1000993     1.80070000E+03   # ~g_glueball
   1009213     1.80065000E+03   # ~g_rho+
  -1009213     1.80065000E+03   # ~g_rho-
   1009113     1.80065000E+03   # ~g_rho0
   1092214     1.80090000E+03   # ~g_Deltap
  -1092214     1.80090000E+03   # ~g_Deltabarm
   1000612     1.70033000E+03   # ~T1+
  -1000612     1.70033000E+03   # ~T1-
   1006211     1.70065000E+03   # ~T_dd1+
   1000512     1.60033000E+03   # ~B10
#
DECAY   1000021     6.58211900E-16   # gluino decays
#          BR         NDA      ID1       ID2       ID3
     1.00000000E+00    3     1000022        -1         1
DECAY   1000006     1.31642380E-15   # stop decays
     1.00000000E+00    2     1000022         6
";

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Standard-model table merged with [`PARTICLE_FILE`].
pub fn particle_table() -> ParticleTable {
    let mut table = ParticleTable::standard_model();
    table.apply_slha(&parse_str(PARTICLE_FILE).unwrap());
    table
}

pub fn catalog() -> Arc<dyn ParticleCatalog> {
    Arc::new(particle_table())
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A stand-in for the external generator.
///
/// `next` decays the pending composite into a neutralino and a charged pion,
/// isotropic in the composite rest frame and boosted into the lab. Failures
/// of `next` and `force_decays` can be scripted, as can the heavy-parton
/// masses returned by `select_mass`.
pub struct ScriptedGenerator {
    event: GeneratorEvent,
    directives: Vec<String>,
    reject_prefix: Option<String>,
    initialized: bool,
    fail_next: u32,
    fail_forced: bool,
    next_calls: u32,
    forced_calls: u32,
    masses: HashMap<i32, f64>,
    mass_script: RefCell<VecDeque<f64>>,
    decay_length: Option<f64>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        let masses = HashMap::from([
            (PDG_GLUINO, 1800.0),
            (PDG_STOP, 1700.0),
            (PDG_SBOTTOM, 1600.0),
            (PDG_NEUTRALINO, NEUTRALINO_MASS_GEV),
        ]);
        Self {
            event: GeneratorEvent::new(),
            directives: Vec::new(),
            reject_prefix: None,
            initialized: false,
            fail_next: 0,
            fail_forced: false,
            next_calls: 0,
            forced_calls: 0,
            masses,
            mass_script: RefCell::new(VecDeque::new()),
            decay_length: None,
        }
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` calls to `next`.
    pub fn failing_next(mut self, n: u32) -> Self {
        self.fail_next = n;
        self
    }

    /// Fail every call to `force_decays`.
    pub fn failing_forced(mut self) -> Self {
        self.fail_forced = true;
        self
    }

    /// Reject directives starting with `prefix`.
    pub fn rejecting(mut self, prefix: &str) -> Self {
        self.reject_prefix = Some(prefix.to_string());
        self
    }

    /// Pole mass (GeV) returned for `pdg_id` once the script runs out.
    pub fn with_mass(mut self, pdg_id: i32, gev: f64) -> Self {
        self.masses.insert(pdg_id, gev);
        self
    }

    /// Masses (GeV) returned by the next `select_mass` calls, in order.
    pub fn with_mass_script(self, masses: impl IntoIterator<Item = f64>) -> Self {
        self.mass_script.borrow_mut().extend(masses);
        self
    }

    /// Place products `mm` away from the composite, along its flight
    /// direction (or +z at rest).
    pub fn with_decay_length(mut self, mm: f64) -> Self {
        self.decay_length = Some(mm);
        self
    }

    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn next_calls(&self) -> u32 {
        self.next_calls
    }

    pub fn forced_calls(&self) -> u32 {
        self.forced_calls
    }

    fn decay_composite(&mut self, rng: &mut dyn RngCore) -> Result<(), GeneratorError> {
        let parent = self
            .event
            .get(PARENT_INDEX)
            .cloned()
            .ok_or_else(|| GeneratorError::GenerationFailed("empty event".into()))?;

        let m = parent.p.mass();
        let (m1, m2) = (NEUTRALINO_MASS_GEV, PION_MASS_GEV);
        if m <= m1 + m2 {
            return Err(GeneratorError::GenerationFailed(format!(
                "composite mass {m} GeV below threshold"
            )));
        }

        let p_star = ((m * m - (m1 + m2).powi(2)) * (m * m - (m1 - m2).powi(2))).sqrt() / (2.0 * m);
        let cos_theta: f64 = rng.gen_range(-1.0..1.0);
        let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        let dir = ThreeVector::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

        let beta = parent.p.beta();
        let lsp = FourVector::from_momentum_and_mass(dir * p_star, m1).boost(beta);
        let pion = FourVector::from_momentum_and_mass(dir * -p_star, m2).boost(beta);

        for i in 1..self.event.len() {
            if let Some(entry) = self.event.get_mut(i) {
                entry.status_neg();
            }
        }

        let vertex = match self.decay_length {
            Some(mm) => {
                let flight = parent.p.momentum();
                let axis = if flight.mag() > 0.0 {
                    flight * (1.0 / flight.mag())
                } else {
                    ThreeVector::new(0.0, 0.0, 1.0)
                };
                self.event.set_has_vertices(true);
                parent.v_prod + axis * mm
            }
            None => parent.v_prod,
        };

        let first = self.event.len();
        for (id, p, mass) in [(PDG_NEUTRALINO, lsp, m1), (211, pion, m2)] {
            self.event.append(
                GeneratorParticle::new(id, STATUS_PRODUCT, p, mass)
                    .with_mothers(first - 1, 0)
                    .with_vertex(vertex, parent.t_prod),
            );
        }
        Ok(())
    }
}

impl DecayGenerator for ScriptedGenerator {
    fn apply_directive(&mut self, directive: &str) -> Result<(), GeneratorError> {
        if let Some(prefix) = &self.reject_prefix {
            if directive.starts_with(prefix.as_str()) {
                return Err(GeneratorError::InvalidDirective(directive.to_string()));
            }
        }
        self.directives.push(directive.to_string());
        Ok(())
    }

    fn init(&mut self) -> Result<(), GeneratorError> {
        self.initialized = true;
        Ok(())
    }

    fn event(&self) -> &GeneratorEvent {
        &self.event
    }

    fn event_mut(&mut self) -> &mut GeneratorEvent {
        &mut self.event
    }

    fn next(&mut self, rng: &mut dyn RngCore) -> Result<(), GeneratorError> {
        if !self.initialized {
            return Err(GeneratorError::NotInitialized);
        }
        self.next_calls += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(GeneratorError::GenerationFailed("scripted failure".into()));
        }
        self.decay_composite(rng)
    }

    fn force_decays(&mut self, rng: &mut dyn RngCore) -> Result<(), GeneratorError> {
        self.forced_calls += 1;
        if self.fail_forced {
            return Err(GeneratorError::ForcedDecayFailed("scripted failure".into()));
        }
        self.decay_composite(rng)
    }

    fn select_mass(&self, pdg_id: i32, _rng: &mut dyn RngCore) -> Option<f64> {
        self.mass_script
            .borrow_mut()
            .pop_front()
            .or_else(|| self.masses.get(&pdg_id).copied())
    }

    fn constituent_mass(&self, pdg_id: i32) -> f64 {
        match pdg_id.abs() {
            1 | 2 => 0.33,
            3 => 0.5,
            4 => 1.5,
            5 => 4.8,
            id if id > 1000 => 0.77,
            _ => 0.0,
        }
    }
}
