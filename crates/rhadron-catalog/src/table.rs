//! The particle table: a standard-model baseline plus custom particles.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use rhadron_core::constants::{
    HBAR_GEV_NS, PDG_GLUINO, PDG_GLUINOBALL, PDG_STOP, SIM_ENERGY_PER_GENERATOR_ENERGY,
    SUSY_OFFSET,
};
use rhadron_core::traits::ParticleCatalog;
use rhadron_core::types::{
    CompositeCode, DecayChannel, HeavyFlavor, ParticleDefinition, ParticleKind,
};

use crate::slha::SlhaDocument;

/// PDG ids outside this range get a charge-conjugated decay table for their
/// antiparticle. Sparticles inside it are handled by the generator.
const CONJUGATE_TABLE_RANGE: std::ops::RangeInclusive<i32> = 999_999..=2_000_015;

const PDG_GRAVITINO: i32 = 1_000_039;

/// Lifetime (ns) of a state with total width `width` (GeV).
pub fn lifetime_from_width(width: f64) -> f64 {
    HBAR_GEV_NS / width
}

/// Electric charge of a quark flavor `1..=6`, in units of e.
fn quark_charge(q: i32) -> f64 {
    match q.abs() {
        2 | 4 | 6 => 2.0 / 3.0,
        1 | 3 | 5 => -1.0 / 3.0,
        _ => 0.0,
    }
}

/// Electric charge of a custom particle, derived from its PDG digits.
pub fn custom_charge(pdg_id: i32) -> f64 {
    let code = CompositeCode(pdg_id);
    let sign = f64::from(code.sign());

    let charge = match code.heavy_flavor() {
        Some(HeavyFlavor::Gluino) => {
            if code.abs() == PDG_GLUINOBALL {
                0.0
            } else if code.digit(5) == 9 {
                quark_charge(code.digit(4)) + quark_charge(code.digit(3)) + quark_charge(code.digit(2))
            } else {
                let (q1, q2) = (code.digit(3), code.digit(2));
                // meson: up-type quark with a down-type antiquark, or the reverse
                if q1 % 2 == 0 {
                    quark_charge(q1) - quark_charge(q2)
                } else {
                    quark_charge(q2) - quark_charge(q1)
                }
            }
        }
        Some(HeavyFlavor::Stop | HeavyFlavor::Sbottom) => {
            let squark = if code.digit(4) == 0 { code.digit(3) } else { code.digit(4) };
            if code.digit(4) == 0 {
                quark_charge(squark) - quark_charge(code.digit(2))
            } else {
                quark_charge(squark) + quark_charge(code.digit(3)) + quark_charge(code.digit(2))
            }
        }
        None => sparticle_charge(code.abs() % 100),
    };
    (charge * sign).round()
}

/// Charge of a sparticle from the id of its standard-model partner.
fn sparticle_charge(partner: i32) -> f64 {
    match partner {
        1..=6 => quark_charge(partner),
        11 | 13 | 15 => -1.0,
        24 | 37 => 1.0,
        _ => 0.0,
    }
}

/// Whether the standard-model partner has a distinct antiparticle.
fn partner_has_antiparticle(partner: i32) -> bool {
    matches!(partner, 1..=6 | 11..=16 | 24 | 37)
}

fn kind_of(pdg_id: i32) -> ParticleKind {
    match CompositeCode(pdg_id).heavy_flavor() {
        Some(flavor) => ParticleKind::RHadron(flavor),
        None if matches!(pdg_id.abs() / SUSY_OFFSET, 1 | 2) => ParticleKind::Sparticle,
        None => ParticleKind::Standard,
    }
}

/// Particle types known to the host, keyed by PDG id.
#[derive(Debug, Clone, Default)]
pub struct ParticleTable {
    particles: HashMap<i32, ParticleDefinition>,
}

impl ParticleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable and long-lived standard-model particles the host tracks.
    pub fn standard_model() -> Self {
        let mut table = Self::new();
        for (pdg, name, mass, charge) in [
            (22, "gamma", 0.0, 0.0),
            (11, "e-", 0.510_998_95, -1.0),
            (-11, "e+", 0.510_998_95, 1.0),
            (13, "mu-", 105.658_375_5, -1.0),
            (-13, "mu+", 105.658_375_5, 1.0),
            (15, "tau-", 1_776.86, -1.0),
            (-15, "tau+", 1_776.86, 1.0),
            (12, "nu_e", 0.0, 0.0),
            (-12, "anti_nu_e", 0.0, 0.0),
            (14, "nu_mu", 0.0, 0.0),
            (-14, "anti_nu_mu", 0.0, 0.0),
            (16, "nu_tau", 0.0, 0.0),
            (-16, "anti_nu_tau", 0.0, 0.0),
            (211, "pi+", 139.570_39, 1.0),
            (-211, "pi-", 139.570_39, -1.0),
            (111, "pi0", 134.976_8, 0.0),
            (321, "kaon+", 493.677, 1.0),
            (-321, "kaon-", 493.677, -1.0),
            (130, "kaon0L", 497.611, 0.0),
            (310, "kaon0S", 497.611, 0.0),
            (221, "eta", 547.862, 0.0),
            (2212, "proton", 938.272_088, 1.0),
            (-2212, "anti_proton", 938.272_088, -1.0),
            (2112, "neutron", 939.565_42, 0.0),
            (-2112, "anti_neutron", 939.565_42, 0.0),
            (3122, "lambda", 1_115.683, 0.0),
            (-3122, "anti_lambda", 1_115.683, 0.0),
        ] {
            table.insert(ParticleDefinition::stable(pdg, name, mass, charge));
        }
        table
    }

    pub fn insert(&mut self, definition: ParticleDefinition) {
        self.particles.insert(definition.pdg_id, definition);
    }

    pub fn get(&self, pdg_id: i32) -> Option<&ParticleDefinition> {
        self.particles.get(&pdg_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticleDefinition> {
        self.particles.values()
    }

    /// Every R-hadron of `flavor` in the table.
    pub fn rhadrons(&self, flavor: HeavyFlavor) -> impl Iterator<Item = &ParticleDefinition> {
        self.particles
            .values()
            .filter(move |d| d.kind == ParticleKind::RHadron(flavor))
    }

    /// PDG id of the antiparticle: `-pdg_id` when known, else `pdg_id`
    /// (self-conjugate).
    pub fn anti_of(&self, pdg_id: i32) -> i32 {
        if self.particles.contains_key(&-pdg_id) {
            -pdg_id
        } else {
            pdg_id
        }
    }

    /// Merge a parsed particle file into the table.
    ///
    /// - mass rows add particles not already present (GeV → MeV), plus the
    ///   antiparticle of sparticles whose partner has one
    /// - widths become lifetimes; the gluino and stop widths are applied to
    ///   every gluino and stop hadron instead of to the partons
    /// - other unstable particles get their decay table, and their
    ///   antiparticle the conjugated one outside the sparticle range
    pub fn apply_slha(&mut self, doc: &SlhaDocument) {
        let before = self.particles.len();
        for entry in &doc.masses {
            self.add_custom(entry.pdg_id, entry.mass, &entry.name);
        }

        let mut gluino_lifetime = None;
        let mut stop_lifetime = None;

        for block in &doc.decays {
            if block.width == 0.0 || !self.particles.contains_key(&block.pdg_id) {
                debug!(pdg_id = block.pdg_id, width = block.width, "stable or unknown, skipping decay table");
                continue;
            }
            let lifetime = lifetime_from_width(block.width);
            match block.pdg_id {
                PDG_GLUINO => {
                    gluino_lifetime = Some((block.width, lifetime));
                    continue;
                }
                PDG_STOP => {
                    stop_lifetime = Some((block.width, lifetime));
                    continue;
                }
                _ => {}
            }

            self.set_decays(block.pdg_id, block.width, lifetime, block.channels.clone());

            if !CONJUGATE_TABLE_RANGE.contains(&block.pdg_id) {
                let anti = self.anti_of(block.pdg_id);
                if anti != block.pdg_id {
                    let channels = block
                        .channels
                        .iter()
                        .map(|c| self.conjugate_channel(c))
                        .collect();
                    self.set_decays(anti, block.width, lifetime, channels);
                }
            }
        }

        for (flavor, lifetime) in [
            (HeavyFlavor::Gluino, gluino_lifetime),
            (HeavyFlavor::Stop, stop_lifetime),
        ] {
            let Some((width, lifetime)) = lifetime else {
                continue;
            };
            for def in self.particles.values_mut() {
                if def.kind == ParticleKind::RHadron(flavor) {
                    def.stable = false;
                    def.width = width;
                    def.lifetime = Some(lifetime);
                    debug!(name = %def.name, lifetime_ns = lifetime, ?flavor, "R-hadron lifetime from parton width");
                }
            }
        }

        info!(
            added = self.particles.len() - before,
            total = self.particles.len(),
            "applied particle file"
        );
    }

    fn add_custom(&mut self, pdg_id: i32, mass_gev: f64, name: &str) {
        if self.particles.contains_key(&pdg_id) {
            return;
        }
        if pdg_id.abs() / SUSY_OFFSET == 0 {
            warn!(pdg_id, %name, "PDG id outside the custom range, skipping");
            return;
        }

        let kind = kind_of(pdg_id);
        self.insert(ParticleDefinition {
            pdg_id,
            name: name.to_string(),
            mass: mass_gev * SIM_ENERGY_PER_GENERATOR_ENERGY,
            charge: custom_charge(pdg_id),
            width: 0.0,
            lifetime: None,
            stable: true,
            kind,
            channels: Vec::new(),
        });
        debug!(pdg_id, %name, mass_gev, ?kind, "added custom particle");

        let partner = pdg_id.abs() % 100;
        let wants_anti = kind == ParticleKind::Sparticle
            && pdg_id.abs() != PDG_STOP
            && pdg_id != PDG_GRAVITINO
            && partner_has_antiparticle(partner);
        if wants_anti && !self.particles.contains_key(&-pdg_id) {
            self.add_custom(-pdg_id, mass_gev, &format!("anti_{name}"));
        }
    }

    fn set_decays(&mut self, pdg_id: i32, width: f64, lifetime: f64, channels: Vec<DecayChannel>) {
        if let Some(def) = self.particles.get_mut(&pdg_id) {
            def.stable = false;
            def.width = width;
            def.lifetime = Some(lifetime);
            def.channels = channels;
            debug!(pdg_id, lifetime_ns = lifetime, channels = def.channels.len(), "decay table set");
        }
    }

    fn conjugate_channel(&self, channel: &DecayChannel) -> DecayChannel {
        DecayChannel {
            branching_ratio: channel.branching_ratio,
            daughters: channel.daughters.iter().map(|&d| self.anti_of(d)).collect(),
        }
    }
}

impl ParticleCatalog for ParticleTable {
    fn find(&self, pdg_id: i32) -> Option<&ParticleDefinition> {
        self.particles.get(&pdg_id)
    }

    fn len(&self) -> usize {
        self.particles.len()
    }
}
