use rayon::prelude::*;
use serde::Serialize;

use crate::geometry::{GeometryError, Point};
use crate::matching::{symmetric_rmsd, AtomMapping, MatchError, MatchMode, SymmetryMatch};
use crate::molecule::{find_automorphisms, find_correspondence, MolGraph, Molecule, SdfError};

pub mod report;

pub use report::{write_header, write_score, OutputFormat};

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub mode: MatchMode,
    /// Remove hydrogens from the reference and every pose before matching.
    pub strip_hydrogens: bool,
    /// Cap on enumerated reference automorphisms; `None` searches all of them.
    pub max_automorphisms: Option<usize>,
    pub match_bond_orders: bool,
    /// Poses read from the input before a parallel scoring round.
    pub chunk_size: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            mode: MatchMode::NoFit,
            strip_hydrogens: true,
            max_automorphisms: None,
            match_bond_orders: false,
            chunk_size: 1000,
        }
    }
}

/// Everything about the reference that is shared by all poses.
#[derive(Debug, Clone)]
pub struct ReferenceModel {
    coordinates: Vec<Point>,
    graph: MolGraph,
    automorphisms: Vec<AtomMapping>,
    mode: MatchMode,
    strip_hydrogens: bool,
    match_bond_orders: bool,
}

impl ReferenceModel {
    pub fn new(molecule: &Molecule, config: &ScoringConfig) -> Self {
        let molecule = prepare(molecule, config.strip_hydrogens);
        let graph = MolGraph::from_molecule(&molecule).with_bond_orders(config.match_bond_orders);
        let automorphisms = find_automorphisms(&graph, config.max_automorphisms);

        log::debug!("reference {:?} prepared", molecule.name);

        ReferenceModel {
            coordinates: molecule.coordinates(),
            graph,
            automorphisms,
            mode: config.mode,
            strip_hydrogens: config.strip_hydrogens,
            match_bond_orders: config.match_bond_orders,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.coordinates.len()
    }

    pub fn automorphisms(&self) -> &[AtomMapping] {
        &self.automorphisms
    }

    pub fn score(&self, pose: &Molecule) -> Result<SymmetryMatch, MatchError> {
        let pose = prepare(pose, self.strip_hydrogens);
        let graph = MolGraph::from_molecule(&pose).with_bond_orders(self.match_bond_orders);
        let correspondence = find_correspondence(&self.graph, &graph)?;

        symmetric_rmsd(
            &self.coordinates,
            &pose.coordinates(),
            &correspondence,
            &self.automorphisms,
            self.mode,
        )
    }
}

fn prepare(molecule: &Molecule, strip_hydrogens: bool) -> Molecule {
    if strip_hydrogens {
        molecule.without_hydrogens()
    } else {
        molecule.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PoseOutcome {
    Scored { rmsd: f64 },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseScore {
    /// 1-based position of the pose in its file.
    pub pose: usize,
    pub name: String,
    #[serde(flatten)]
    pub outcome: PoseOutcome,
}

impl PoseScore {
    pub fn rmsd(&self) -> Option<f64> {
        match self.outcome {
            PoseOutcome::Scored { rmsd } => Some(rmsd),
            PoseOutcome::Failed { .. } => None,
        }
    }
}

fn score_entry(
    reference: &ReferenceModel,
    pose: usize,
    entry: Result<Molecule, SdfError>,
) -> Result<PoseScore, MatchError> {
    let molecule = match entry {
        Ok(molecule) => molecule,
        Err(e) => {
            return Ok(PoseScore {
                pose,
                name: String::new(),
                outcome: PoseOutcome::Failed {
                    error: e.to_string(),
                },
            })
        }
    };

    let outcome = match reference.score(&molecule) {
        Ok(found) => {
            log::debug!(
                "pose {}: rmsd {:.3} via automorphism {:?}",
                pose,
                found.rmsd,
                reference.automorphisms()[found.automorphism].as_slice()
            );
            PoseOutcome::Scored { rmsd: found.rmsd }
        }
        // the mapping was validated, so this is a bug rather than a bad pose
        Err(e @ MatchError::Geometry(GeometryError::LengthMismatch { .. })) => return Err(e),
        Err(e) => PoseOutcome::Failed {
            error: e.to_string(),
        },
    };

    Ok(PoseScore {
        pose,
        name: molecule.name,
        outcome,
    })
}

fn score_chunk<F>(
    reference: &ReferenceModel,
    chunk: &mut Vec<(usize, Result<Molecule, SdfError>)>,
    sink: &mut F,
) -> eyre::Result<usize>
where
    F: FnMut(&PoseScore) -> eyre::Result<()>,
{
    let scores = std::mem::take(chunk)
        .into_par_iter()
        .map(|(pose, entry)| score_entry(reference, pose, entry))
        .collect::<Vec<_>>();

    let count = scores.len();
    for score in scores {
        let score = score.map_err(|e| eyre::eyre!("internal matching error: {}", e))?;
        if let PoseOutcome::Failed { error } = &score.outcome {
            log::error!("pose {} ({:?}): {}", score.pose, score.name, error);
        }
        sink(&score)?;
    }

    Ok(count)
}

/// Scores every pose against the reference, handing results to `sink` in input order.
///
/// Poses are read in chunks and each chunk is scored in parallel. Unreadable or unmatched poses
/// become [`PoseOutcome::Failed`] records; only internal inconsistencies stop the run.
/// Returns the number of poses seen.
pub fn score_poses<I, F>(
    reference: &ReferenceModel,
    poses: I,
    config: &ScoringConfig,
    mut sink: F,
) -> eyre::Result<usize>
where
    I: IntoIterator<Item = Result<Molecule, SdfError>>,
    F: FnMut(&PoseScore) -> eyre::Result<()>,
{
    let chunk_size = config.chunk_size.max(1);
    let mut chunk = Vec::with_capacity(chunk_size);
    let mut counter = 0;

    for (index, entry) in poses.into_iter().enumerate() {
        chunk.push((index + 1, entry));

        if chunk.len() == chunk_size {
            counter += score_chunk(reference, &mut chunk, &mut sink)?;
            log::debug!("{} poses scored so far", counter);
        }
    }

    if !chunk.is_empty() {
        counter += score_chunk(reference, &mut chunk, &mut sink)?;
    }

    Ok(counter)
}
