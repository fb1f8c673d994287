//! Flavor splitting of R-hadron codes into constituent partons.
//!
//! A composite code has the shape `100 q1 q2 q3 j` (with leading digits
//! shifted for mesons). Stripping the `1000000` offset and the spin digit
//! leaves `idLight`, whose digits name the heavy parton and the light quarks:
//!
//! | composite        | example   | `idLight` | split                     |
//! |------------------|-----------|-----------|---------------------------|
//! | gluinoball       | `1000993` | `99`      | `d dbar` or `u ubar`      |
//! | gluino-meson     | `1009213` | `921`     | `u dbar`                  |
//! | gluino-baryon    | `1092214` | `9221`    | quark + diquark           |
//! | squark-meson     | `1000612` | `61`      | `~t dbar`                 |
//! | squark-baryon    | `1006211` | `621`     | `~t ud_0`                 |
//!
//! Codes are not validated here. A malformed code yields nonsense partons
//! that the generator rejects downstream.

use rand::Rng;

use rhadron_core::constants::{DIQUARK_SPIN0_PROB, PDG_GLUINO, PDG_SBOTTOM, PDG_STOP, SUSY_OFFSET};
use rhadron_core::types::{CompositeCode, CompositeKind, ConstituentPair};

/// PDG ids used for the heavy parton restored from a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeavyPartonIds {
    pub gluino: i32,
    pub stop: i32,
    pub sbottom: i32,
}

impl Default for HeavyPartonIds {
    fn default() -> Self {
        Self {
            gluino: PDG_GLUINO,
            stop: PDG_STOP,
            sbottom: PDG_SBOTTOM,
        }
    }
}

impl HeavyPartonIds {
    /// Heavy squark id for a squark composite, signed like the composite.
    pub fn squark_for(&self, code: CompositeCode) -> i32 {
        let id_light = light_content(code);
        let id_sq = if id_light < 100 { id_light / 10 } else { id_light / 100 };
        let id = if id_sq == 6 { self.stop } else { self.sbottom };
        id * code.sign()
    }

    /// The heavy parton carried by `code`, signed for squarks.
    pub fn heavy_for(&self, code: CompositeCode) -> i32 {
        match code.kind() {
            CompositeKind::Gluino => self.gluino,
            CompositeKind::Squark => self.squark_for(code),
        }
    }
}

/// `(|code| - 1000000) / 10`: the flavor digits without spin.
fn light_content(code: CompositeCode) -> i32 {
    (code.abs() - SUSY_OFFSET) / 10
}

/// Whether `code` is a gluino composite. See [`CompositeCode::is_gluino_type`].
pub fn is_gluino_type(code: i32) -> bool {
    CompositeCode(code).is_gluino_type()
}

/// Split a squark composite into (heavy squark, light quark or diquark).
///
/// Two-body composites carry a single light antiquark (quark for the
/// anti-composite). Three-body composites carry a diquark whose spin state
/// is the composite's own spin digit; unlike [`split_gluino`], no random
/// spin is drawn.
pub fn split_squark(code: i32, ids: &HeavyPartonIds) -> ConstituentPair {
    let code = CompositeCode(code);
    let id_light = light_content(code);
    let heavy = ids.squark_for(code);

    let mut light = if id_light < 100 { id_light % 10 } else { id_light % 100 };
    if light > 10 {
        light = 100 * light + code.abs() % 10;
    }
    if (light < 10 && !code.is_anti()) || (light > 10 && code.is_anti()) {
        light = -light;
    }

    ConstituentPair::new(heavy, light)
}

/// Split the light cloud of a gluino composite into two partons.
///
/// - gluinoball: `d dbar` or `u ubar`, equally likely
/// - gluino-meson: quark + antiquark, reordered so the first is up-type
/// - gluino-baryon: quark + diquark, the quark chosen uniformly among the
///   three unless a charm or bottom quark forces it; the diquark gets spin 1
///   with probability `1 - DIQUARK_SPIN0_PROB` (always for equal flavors)
///
/// Anti-composites map `(a, b)` to `(-b, -a)`.
pub fn split_gluino<R: Rng + ?Sized>(code: i32, rng: &mut R) -> ConstituentPair {
    let code = CompositeCode(code);
    let id_light = light_content(code);

    let (mut id1, mut id2) = if id_light < 100 {
        let q = if rng.gen_bool(0.5) { 1 } else { 2 };
        (q, -q)
    } else if id_light < 1000 {
        let q1 = (id_light / 10) % 10;
        let q2 = id_light % 10;
        if q1 % 2 == 1 { (q2, -q1) } else { (q1, -q2) }
    } else {
        let iq1 = (id_light / 100) % 10;
        let iq2 = (id_light / 10) % 10;
        let iq3 = id_light % 10;

        let mut pick: f64 = rng.gen_range(0.0..3.0);
        if iq1 > 3 {
            pick = 0.5;
        }
        if iq2 > 3 {
            pick = 1.5;
        }
        if iq3 > 3 {
            pick = 2.5;
        }

        let (quark, a, b) = if pick < 1.0 {
            (iq1, iq2, iq3)
        } else if pick < 2.0 {
            (iq2, iq1, iq3)
        } else {
            (iq3, iq1, iq2)
        };
        let (hi, lo) = (a.max(b), a.min(b));
        let mut diquark = 1000 * hi + 100 * lo;
        if hi != lo && rng.gen_range(0.0..1.0) > 1.0 - DIQUARK_SPIN0_PROB {
            diquark += 1;
        } else {
            diquark += 3;
        }
        (quark, diquark)
    };

    if code.is_anti() {
        (id1, id2) = (-id2, -id1);
    }

    ConstituentPair::new(id1, id2)
}

/// Classify and split in one step.
pub fn split<R: Rng + ?Sized>(
    code: i32,
    ids: &HeavyPartonIds,
    rng: &mut R,
) -> (CompositeKind, ConstituentPair) {
    match CompositeCode(code).kind() {
        CompositeKind::Gluino => (CompositeKind::Gluino, split_gluino(code, rng)),
        CompositeKind::Squark => (CompositeKind::Squark, split_squark(code, ids)),
    }
}
