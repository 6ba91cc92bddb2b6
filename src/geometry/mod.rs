use bitvec::vec::BitVec;
use nalgebra::Point3;
use thiserror::Error;

pub mod distance;
pub mod superposition;

pub use distance::{rmsd, squared_distance};
pub use superposition::{superpose, AlignmentResult, SuperposeOptions};

pub type Point = Point3<f64>;

/// Index-aligned selector over a point set. `true` means the point takes part in the fit.
pub type Mask = BitVec;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("point sets differ in length: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("singular value decomposition failed: {0}")]
    NumericalDecomposition(String),

    #[error("no points selected for superposition")]
    EmptySelection,

    #[error("invalid weight {weight} at index {index}")]
    InvalidWeight { index: usize, weight: f64 },
}

pub(crate) fn check_lengths(expected: usize, found: usize) -> Result<(), GeometryError> {
    if expected != found {
        return Err(GeometryError::LengthMismatch { expected, found });
    }
    Ok(())
}
