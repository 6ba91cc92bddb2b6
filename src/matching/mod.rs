use serde::Serialize;
use thiserror::Error;

use crate::geometry::{rmsd, superpose, GeometryError, Point, SuperposeOptions};

pub mod mapping;

pub use mapping::AtomMapping;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("mapping failure: {0}")]
    MappingFailure(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// RMSD on the coordinates as given.
    NoFit,
    /// Superpose the reference onto the candidate before measuring.
    Fit,
}

impl MatchMode {
    pub fn column_name(&self) -> &'static str {
        match self {
            MatchMode::NoFit => "RMSD_NOFIT",
            MatchMode::Fit => "RMSD_FIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryMatch {
    pub rmsd: f64,
    /// Position of the winning automorphism in the list that was searched.
    pub automorphism: usize,
}

/// Lowest RMSD between `reference` and `candidate` over every automorphism of the reference.
///
/// `correspondence` maps candidate atom indices onto reference atom indices and is used to put
/// the candidate into reference order first. An empty automorphism list is treated as the
/// identity alone. Ties keep the earliest automorphism.
///
/// In fit mode each automorphism scores the lower of its direct and its superposed deviation.
pub fn symmetric_rmsd(
    reference: &[Point],
    candidate: &[Point],
    correspondence: &AtomMapping,
    automorphisms: &[AtomMapping],
    mode: MatchMode,
) -> Result<SymmetryMatch, MatchError> {
    if candidate.len() != reference.len() {
        return Err(MatchError::MappingFailure(format!(
            "candidate has {} atoms, reference has {}",
            candidate.len(),
            reference.len()
        )));
    }
    let ordered = correspondence.scatter(candidate)?;

    let identity = [AtomMapping::identity(reference.len())];
    let automorphisms = if automorphisms.is_empty() {
        &identity[..]
    } else {
        automorphisms
    };

    let mut best: Option<SymmetryMatch> = None;
    for (index, automorphism) in automorphisms.iter().enumerate() {
        let permuted = automorphism.gather(reference).map_err(|_| {
            GeometryError::LengthMismatch {
                expected: reference.len(),
                found: automorphism.len(),
            }
        })?;

        let mut score = rmsd(&ordered, &permuted)?;
        if mode == MatchMode::Fit {
            let fitted = superpose(&permuted, &ordered, &SuperposeOptions::default())?;
            score = score.min(fitted.rmsd);
        }

        if best.map_or(true, |b| score < b.rmsd) {
            best = Some(SymmetryMatch {
                rmsd: score,
                automorphism: index,
            });
        }
    }

    // the list is never empty here
    best.ok_or_else(|| MatchError::MappingFailure("no automorphism evaluated".to_string()))
}
