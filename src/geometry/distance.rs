use super::{check_lengths, GeometryError, Point};

pub fn squared_distance(a: &Point, b: &Point) -> f64 {
    (a - b).norm_squared()
}

/// Root-mean-square deviation between two index-aligned point sets, without any fitting.
///
/// An empty pair of sets has an RMSD of zero.
pub fn rmsd(set_a: &[Point], set_b: &[Point]) -> Result<f64, GeometryError> {
    check_lengths(set_a.len(), set_b.len())?;

    if set_a.is_empty() {
        return Ok(0.0);
    }

    let deviation: f64 = set_a
        .iter()
        .zip(set_b)
        .map(|(a, b)| squared_distance(a, b))
        .sum();

    Ok((deviation / set_a.len() as f64).sqrt())
}
