//! Core data types: kinematics, composite codes, tracks, products, records.
//!
//! Simulation-side quantities are in MeV / mm / ns. Generator-side quantities
//! live in [`crate::event`] and are in GeV / mm.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::constants::{PDG_GLUINOBALL, SUSY_OFFSET};

/// Cartesian three-vector (position, displacement, 3-momentum, or velocity).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct ThreeVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ThreeVector {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn mag2(&self) -> f64 {
        self.dot(self)
    }

    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }
}

impl Add for ThreeVector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for ThreeVector {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for ThreeVector {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for ThreeVector {
    type Output = Self;
    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl fmt::Display for ThreeVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}

/// Energy-momentum four-vector `(px, py, pz, e)`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct FourVector {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourVector {
    pub const ZERO: Self = Self { px: 0.0, py: 0.0, pz: 0.0, e: 0.0 };

    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Four-vector of a particle with 3-momentum `p` and rest mass `mass`.
    pub fn from_momentum_and_mass(p: ThreeVector, mass: f64) -> Self {
        Self::new(p.x, p.y, p.z, (p.mag2() + mass * mass).sqrt())
    }

    pub fn momentum(&self) -> ThreeVector {
        ThreeVector::new(self.px, self.py, self.pz)
    }

    /// Invariant mass; negative squared masses (rounding) clamp to zero.
    pub fn mass(&self) -> f64 {
        (self.e * self.e - self.momentum().mag2()).max(0.0).sqrt()
    }

    /// Velocity `p / E` in units of c.
    pub fn beta(&self) -> ThreeVector {
        if self.e <= 0.0 {
            return ThreeVector::ZERO;
        }
        self.momentum() * (1.0 / self.e)
    }

    /// Lorentz boost by velocity `beta` (units of c, `|beta| < 1`).
    pub fn boost(&self, beta: ThreeVector) -> Self {
        let b2 = beta.mag2();
        if b2 <= 0.0 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let bp = beta.dot(&self.momentum());
        let gamma2 = (gamma - 1.0) / b2;
        let p = self.momentum() + beta * (gamma2 * bp + gamma * self.e);
        Self::new(p.x, p.y, p.z, gamma * (self.e + bp))
    }
}

impl Add for FourVector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.px + rhs.px, self.py + rhs.py, self.pz + rhs.pz, self.e + rhs.e)
    }
}

impl Mul<f64> for FourVector {
    type Output = Self;
    fn mul(self, k: f64) -> Self {
        Self::new(self.px * k, self.py * k, self.pz * k, self.e * k)
    }
}

/// Order in which the host materializes secondaries, relative to the
/// product list returned by a decay.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SecondaryOrder {
    /// Same order as the returned products.
    #[default]
    Forward,
    /// Last product first, as hosts that pop products off a stack do.
    Reversed,
}

/// Identifier of one physics-event processing cycle.
///
/// Stamped on every [`DecayVertexRecord`] so that records written by one
/// cycle cannot silently land in another.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct CycleId(pub u64);

impl CycleId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle#{}", self.0)
    }
}

/// Which heavy colored particle sits inside a composite.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    /// Color octet core: gluino-gluon, gluino-meson, or gluino-baryon.
    Gluino,
    /// Color triplet core: squark-meson or squark-baryon.
    Squark,
}

/// Heavy-parton family of an R-hadron.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeavyFlavor {
    Gluino,
    Stop,
    Sbottom,
}

/// PDG identifier of a heavy composite.
///
/// Digits are counted from the right starting at 1, so for `1009213`
/// digit 1 is the spin digit `3` and digit 4 is `9`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompositeCode(pub i32);

impl CompositeCode {
    pub fn new(code: i32) -> Self {
        Self(code)
    }

    pub fn id(&self) -> i32 {
        self.0
    }

    pub fn abs(&self) -> i32 {
        self.0.abs()
    }

    pub fn is_anti(&self) -> bool {
        self.0 < 0
    }

    /// `+1` for particles, `-1` for antiparticles.
    pub fn sign(&self) -> i32 {
        if self.0 < 0 { -1 } else { 1 }
    }

    pub fn conjugate(&self) -> Self {
        Self(-self.0)
    }

    /// The `n`-th decimal digit from the right (1-based) of `|code|`.
    pub fn digit(&self, n: u32) -> i32 {
        (self.abs() / 10_i32.pow(n - 1)) % 10
    }

    /// Gluino composites have a 9 in digit 5 (`109xxxx`, baryons) or a 0 in
    /// digit 5 and a 9 in digit 4 (`1009xxx`, mesons). The gluinoball
    /// `1000993` matches neither and is listed explicitly.
    pub fn is_gluino_type(&self) -> bool {
        if self.abs() == PDG_GLUINOBALL {
            return true;
        }
        let d5 = self.digit(5);
        let d4 = self.digit(4);
        d5 == 9 || (d5 == 0 && d4 == 9)
    }

    pub fn kind(&self) -> CompositeKind {
        if self.is_gluino_type() {
            CompositeKind::Gluino
        } else {
            CompositeKind::Squark
        }
    }

    /// Heavy-parton family, or `None` for anything that is not an R-hadron
    /// (standard-model particles and bare sparticles included).
    pub fn heavy_flavor(&self) -> Option<HeavyFlavor> {
        let abs = self.abs();
        if abs / SUSY_OFFSET != 1 || abs % SUSY_OFFSET < 100 {
            return None;
        }
        if self.is_gluino_type() {
            return Some(HeavyFlavor::Gluino);
        }
        match (self.digit(4), self.digit(3)) {
            (6, _) | (0, 6) => Some(HeavyFlavor::Stop),
            (5, _) | (0, 5) => Some(HeavyFlavor::Sbottom),
            _ => None,
        }
    }
}

impl fmt::Display for CompositeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A composite broken into its heavy parton and its light quark or diquark.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstituentPair {
    /// Heavy parton for squark composites; for gluino composites the first
    /// light parton (the gluino itself is added by the orchestrator).
    pub first: i32,
    /// Light quark, antiquark, or diquark.
    pub second: i32,
}

impl ConstituentPair {
    pub fn new(first: i32, second: i32) -> Self {
        Self { first, second }
    }

    /// Pair of the charge-conjugate composite: `(a, b) -> (-b, -a)` for
    /// gluino composites, `(a, b) -> (-a, -b)` for squark composites.
    pub fn conjugate(&self, kind: CompositeKind) -> Self {
        match kind {
            CompositeKind::Gluino => Self::new(-self.second, -self.first),
            CompositeKind::Squark => Self::new(-self.first, -self.second),
        }
    }
}

/// Kinematic state of a tracked particle, supplied by the host per decay.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackedParticle {
    pub track_id: i32,
    pub pdg_id: i32,
    /// Rest mass (MeV).
    pub mass: f64,
    /// Four-momentum (MeV).
    pub momentum: FourVector,
    /// Lab position (mm).
    pub position: ThreeVector,
    /// Global time (ns).
    pub global_time: f64,
    /// Proper time (ns).
    pub proper_time: f64,
    /// Velocity in units of c.
    pub velocity: ThreeVector,
}

impl TrackedParticle {
    /// A particle at rest at the origin.
    pub fn at_rest(track_id: i32, pdg_id: i32, mass: f64) -> Self {
        Self {
            track_id,
            pdg_id,
            mass,
            momentum: FourVector::new(0.0, 0.0, 0.0, mass),
            position: ThreeVector::ZERO,
            global_time: 0.0,
            proper_time: 0.0,
            velocity: ThreeVector::ZERO,
        }
    }

    /// A particle moving with 3-momentum `p` (MeV), velocity derived from it.
    pub fn moving(track_id: i32, pdg_id: i32, mass: f64, p: ThreeVector) -> Self {
        let momentum = FourVector::from_momentum_and_mass(p, mass);
        Self {
            velocity: momentum.beta(),
            momentum,
            ..Self::at_rest(track_id, pdg_id, mass)
        }
    }

    pub fn total_energy(&self) -> f64 {
        self.momentum.e
    }
}

/// One final-state particle handed back to the host.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DecayProduct {
    pub pdg_id: i32,
    /// Three-momentum (MeV).
    pub momentum: ThreeVector,
    /// Rest mass from the particle catalog (MeV).
    pub mass: f64,
    /// Production vertex relative to the parent (mm), when the generator
    /// reports vertices.
    pub displacement: Option<ThreeVector>,
}

impl DecayProduct {
    pub fn total_energy(&self) -> f64 {
        (self.momentum.mag2() + self.mass * self.mass).sqrt()
    }

    pub fn four_momentum(&self) -> FourVector {
        FourVector::from_momentum_and_mass(self.momentum, self.mass)
    }
}

/// Per-decay bookkeeping consumed by the downstream event-history stage.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DecayVertexRecord {
    pub cycle: CycleId,
    pub parent_track_id: i32,
    pub parent_pdg_id: i32,
    /// Decay position (mm).
    pub position: ThreeVector,
    /// Global time of the decay (ns).
    pub time: f64,
    /// Parent four-momentum at decay (MeV).
    pub parent_momentum: FourVector,
    pub products: Vec<DecayProduct>,
}

impl DecayVertexRecord {
    pub fn outgoing_energy(&self) -> f64 {
        self.products.iter().map(DecayProduct::total_energy).sum()
    }
}

/// Broad category of a catalog entry.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    Standard,
    Sparticle,
    RHadron(HeavyFlavor),
}

/// One decay channel of a catalog entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DecayChannel {
    pub branching_ratio: f64,
    pub daughters: Vec<i32>,
}

/// A particle type known to the host simulation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ParticleDefinition {
    pub pdg_id: i32,
    pub name: String,
    /// Rest mass (MeV).
    pub mass: f64,
    /// Electric charge in units of e.
    pub charge: f64,
    /// Total width (GeV); zero for stable particles.
    pub width: f64,
    /// Mean lifetime (ns); `None` when stable.
    pub lifetime: Option<f64>,
    pub stable: bool,
    pub kind: ParticleKind,
    pub channels: Vec<DecayChannel>,
}

impl ParticleDefinition {
    /// A stable particle with no decay table.
    pub fn stable(pdg_id: i32, name: &str, mass: f64, charge: f64) -> Self {
        Self {
            pdg_id,
            name: name.to_string(),
            mass,
            charge,
            width: 0.0,
            lifetime: None,
            stable: true,
            kind: ParticleKind::Standard,
            channels: Vec::new(),
        }
    }
}
