//! Generator-native scratch event.
//!
//! The decay generator reads and writes this buffer. Entries are addressed by
//! index; index 0 is a system pseudo-particle inserted by [`GeneratorEvent::reset`],
//! so the first real entry lands at index 1. Momenta and masses are in GeV,
//! vertices in mm.

use serde::{Deserialize, Serialize};

use crate::constants::{FIRST_COLOR_TAG, PDG_SYSTEM, STATUS_SYSTEM};
use crate::types::{FourVector, ThreeVector};

/// One entry of the generator event record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeneratorParticle {
    pub id: i32,
    /// Positive for final/undecayed entries, negative once decayed or
    /// otherwise superseded.
    pub status: i32,
    pub mother1: usize,
    pub mother2: usize,
    pub daughter1: usize,
    pub daughter2: usize,
    pub col: i32,
    pub acol: i32,
    /// Four-momentum (GeV).
    pub p: FourVector,
    /// Mass (GeV).
    pub m: f64,
    /// Production vertex `(x, y, z)` in mm and time in mm/c.
    pub v_prod: ThreeVector,
    pub t_prod: f64,
}

impl GeneratorParticle {
    pub fn new(id: i32, status: i32, p: FourVector, m: f64) -> Self {
        Self {
            id,
            status,
            mother1: 0,
            mother2: 0,
            daughter1: 0,
            daughter2: 0,
            col: 0,
            acol: 0,
            p,
            m,
            v_prod: ThreeVector::ZERO,
            t_prod: 0.0,
        }
    }

    pub fn with_mothers(mut self, mother1: usize, mother2: usize) -> Self {
        self.mother1 = mother1;
        self.mother2 = mother2;
        self
    }

    pub fn with_colors(mut self, col: i32, acol: i32) -> Self {
        self.col = col;
        self.acol = acol;
        self
    }

    pub fn with_vertex(mut self, v_prod: ThreeVector, t_prod: f64) -> Self {
        self.v_prod = v_prod;
        self.t_prod = t_prod;
        self
    }

    pub fn is_final(&self) -> bool {
        self.status > 0
    }

    /// Flip a positive status negative, marking the entry as decayed.
    pub fn status_neg(&mut self) {
        self.status = -self.status.abs();
    }
}

/// Scratch event record owned by one generator instance.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeneratorEvent {
    particles: Vec<GeneratorParticle>,
    next_col: i32,
    /// Whether the generator fills production vertices of its products.
    has_vertices: bool,
}

impl Default for GeneratorEvent {
    fn default() -> Self {
        let mut event = Self {
            particles: Vec::new(),
            next_col: FIRST_COLOR_TAG,
            has_vertices: false,
        };
        event.reset();
        event
    }
}

impl GeneratorEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all entries, restore the system entry, and restart color tags.
    pub fn reset(&mut self) {
        self.particles.clear();
        self.particles.push(GeneratorParticle::new(
            PDG_SYSTEM,
            STATUS_SYSTEM,
            FourVector::ZERO,
            0.0,
        ));
        self.next_col = FIRST_COLOR_TAG;
        self.has_vertices = false;
    }

    /// Append an entry and return its index.
    pub fn append(&mut self, particle: GeneratorParticle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    /// Hand out a color tag not used earlier in this event.
    pub fn next_col_tag(&mut self) -> i32 {
        self.next_col += 1;
        self.next_col
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True when only the system entry is present.
    pub fn is_empty(&self) -> bool {
        self.particles.len() <= 1
    }

    pub fn get(&self, index: usize) -> Option<&GeneratorParticle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut GeneratorParticle> {
        self.particles.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratorParticle> {
        self.particles.iter()
    }

    pub fn has_vertices(&self) -> bool {
        self.has_vertices
    }

    pub fn set_has_vertices(&mut self, has_vertices: bool) {
        self.has_vertices = has_vertices;
    }

    /// Sum of four-momenta of all entries with positive status.
    pub fn final_state_momentum(&self) -> FourVector {
        self.particles
            .iter()
            .filter(|p| p.is_final())
            .fold(FourVector::ZERO, |acc, p| acc + p.p)
    }
}
