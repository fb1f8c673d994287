//! Reader for SLHA-style particle files.
//!
//! Only the two parts the catalog needs are read:
//!
//! ```text
//! BLOCK MASS
//!    1000021     1.80000000E+03   # ~g
//!    1009213     1.80065000E+03   # ~g_rho+
//! DECAY   1000021     6.58211900E-16   # gluino decays
//! #          BR         NDA      ID1       ID2       ID3
//!      1.00000000E+00    3     1000022        -1         1
//! ```
//!
//! Masses and widths stay in GeV here. Every other block is skipped.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use rhadron_core::error::CatalogError;
use rhadron_core::types::DecayChannel;

/// Maximum number of daughters in one decay channel.
pub const MAX_DAUGHTERS: usize = 4;

/// One `BLOCK MASS` row.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MassEntry {
    pub pdg_id: i32,
    /// Mass (GeV), never negative.
    pub mass: f64,
    pub name: String,
}

/// One `DECAY` header and the channels listed under it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DecayBlock {
    pub pdg_id: i32,
    /// Total width (GeV).
    pub width: f64,
    pub channels: Vec<DecayChannel>,
}

/// Parsed contents of a particle file, in file order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SlhaDocument {
    pub masses: Vec<MassEntry>,
    pub decays: Vec<DecayBlock>,
}

impl SlhaDocument {
    pub fn mass_of(&self, pdg_id: i32) -> Option<f64> {
        self.masses.iter().find(|m| m.pdg_id == pdg_id).map(|m| m.mass)
    }

    pub fn decay_of(&self, pdg_id: i32) -> Option<&DecayBlock> {
        self.decays.iter().find(|d| d.pdg_id == pdg_id)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Other,
    Mass,
    Decay,
    /// A decay block closed by a bad channel; rows are ignored until the
    /// next header.
    Abandoned,
}

fn is_mass_header(lower: &str) -> bool {
    lower.contains("block") && lower.contains("mass")
}

fn is_decay_header(lower: &str) -> bool {
    lower.starts_with("decay")
}

fn parse_error(line: usize, message: impl Into<String>) -> CatalogError {
    CatalogError::Parse {
        line,
        message: message.into(),
    }
}

/// Parse particle-file text.
///
/// Negative masses clamp to zero. A channel with more than
/// [`MAX_DAUGHTERS`] daughters or a non-positive branching ratio ends its
/// decay block with an error log; the rest of the file is still read.
/// Unparseable numbers are hard errors.
pub fn parse_str(text: &str) -> Result<SlhaDocument, CatalogError> {
    let mut doc = SlhaDocument::default();
    let mut section = Section::Other;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        let lower = line.to_ascii_lowercase();

        if is_decay_header(&lower) {
            doc.decays.push(parse_decay_header(line, line_no)?);
            section = Section::Decay;
            continue;
        }
        if lower.contains("block") {
            section = if is_mass_header(&lower) {
                debug!(line = line_no, "reading mass table");
                Section::Mass
            } else {
                Section::Other
            };
            continue;
        }

        match section {
            Section::Other | Section::Abandoned => {}
            Section::Mass => {
                if line == "#" {
                    section = Section::Other;
                    continue;
                }
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                doc.masses.push(parse_mass_row(line, line_no)?);
            }
            Section::Decay => {
                if line.is_empty() {
                    continue;
                }
                if line.starts_with('#') {
                    if lower.contains("br") && lower.contains("nda") {
                        continue;
                    }
                    section = Section::Other;
                    continue;
                }
                let Some(block) = doc.decays.last_mut() else {
                    continue;
                };
                match parse_channel(line, line_no, block.pdg_id)? {
                    Some(channel) => block.channels.push(channel),
                    None => section = Section::Abandoned,
                }
            }
        }
    }

    debug!(masses = doc.masses.len(), decays = doc.decays.len(), "parsed particle file");
    Ok(doc)
}

/// Read and parse a particle file.
pub fn parse_file(path: &Path) -> Result<SlhaDocument, CatalogError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
    parse_str(&text)
}

/// `pdg mass # name`
fn parse_mass_row(line: &str, line_no: usize) -> Result<MassEntry, CatalogError> {
    let (data, comment) = line.split_once('#').unwrap_or((line, ""));
    let mut fields = data.split_whitespace();

    let pdg_id = fields
        .next()
        .and_then(|f| f.parse::<i32>().ok())
        .ok_or_else(|| parse_error(line_no, "mass row without a PDG id"))?;
    let mass = fields
        .next()
        .and_then(|f| f.parse::<f64>().ok())
        .ok_or_else(|| parse_error(line_no, format!("no mass for {pdg_id}")))?;

    let name = comment.split_whitespace().next().unwrap_or_default().to_string();
    Ok(MassEntry {
        pdg_id,
        mass: mass.max(0.0),
        name,
    })
}

/// `DECAY pdg width`
fn parse_decay_header(line: &str, line_no: usize) -> Result<DecayBlock, CatalogError> {
    let mut fields = line.split_whitespace().skip(1);
    let pdg_id = fields
        .next()
        .and_then(|f| f.parse::<i32>().ok())
        .ok_or_else(|| parse_error(line_no, "DECAY without a PDG id"))?;
    let width = fields
        .next()
        .and_then(|f| f.parse::<f64>().ok())
        .ok_or_else(|| parse_error(line_no, format!("DECAY {pdg_id} without a width")))?;
    debug!(pdg_id, width, "decay block");
    Ok(DecayBlock {
        pdg_id,
        width,
        channels: Vec::new(),
    })
}

/// `br nda id1 .. idN`. Returns `None` when the channel ends the block.
fn parse_channel(
    line: &str,
    line_no: usize,
    parent: i32,
) -> Result<Option<DecayChannel>, CatalogError> {
    let data = line.split('#').next().unwrap_or_default();
    let mut fields = data.split_whitespace();

    let branching_ratio = fields
        .next()
        .and_then(|f| f.parse::<f64>().ok())
        .ok_or_else(|| parse_error(line_no, "channel without a branching ratio"))?;
    let nda = fields
        .next()
        .and_then(|f| f.parse::<usize>().ok())
        .ok_or_else(|| parse_error(line_no, "channel without a daughter count"))?;

    if nda > MAX_DAUGHTERS {
        error!(pdg_id = parent, nda, line = line_no, "too many daughters (max 4), decay table ends here");
        return Ok(None);
    }
    if branching_ratio <= 0.0 {
        error!(pdg_id = parent, branching_ratio, line = line_no, "non-positive branching ratio, decay table ends here");
        return Ok(None);
    }

    let daughters = fields
        .take(nda)
        .map(|f| f.parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| parse_error(line_no, format!("bad daughter id: {e}")))?;
    if daughters.len() != nda {
        return Err(parse_error(
            line_no,
            format!("expected {nda} daughters, found {}", daughters.len()),
        ));
    }

    Ok(Some(DecayChannel {
        branching_ratio,
        daughters,
    }))
}
