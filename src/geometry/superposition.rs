use bitvec::slice::BitSlice;
use nalgebra::{Matrix3, Vector3, SVD};

use super::{check_lengths, GeometryError, Point};

const MAX_SVD_ITERATIONS: usize = 1000;

/// Settings for [`superpose`].
///
/// `weights: None` means uniform weights of 1.0, and a `None` mask selects every point.
#[derive(Debug, Clone)]
pub struct SuperposeOptions<'a> {
    pub weights: Option<&'a [f64]>,
    pub reference_mask: Option<&'a BitSlice>,
    pub target_mask: Option<&'a BitSlice>,
    pub return_rotation: bool,
    /// Retry once with uniform weights when the weighted decomposition fails.
    pub retry_unweighted: bool,
}

impl Default for SuperposeOptions<'_> {
    fn default() -> Self {
        SuperposeOptions {
            weights: None,
            reference_mask: None,
            target_mask: None,
            return_rotation: false,
            retry_unweighted: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// The full reference set, rotated and moved onto the target.
    pub coordinates: Vec<Point>,
    /// Deviation over the masked points only.
    pub rmsd: f64,
    /// Rotation applied to the centered reference, acting on row vectors (`p' = p * U`).
    pub rotation: Option<Matrix3<f64>>,
}

struct KabschFit {
    rotation: Matrix3<f64>,
    rmsd: f64,
    reference_centroid: Point,
    target_centroid: Point,
}

/// Weighted Kabsch superposition of `reference` onto `target`.
///
/// The masks restrict which points drive the fit; the k-th selected reference point is paired
/// with the k-th selected target point. Every reference point is moved, masked or not.
pub fn superpose(
    reference: &[Point],
    target: &[Point],
    options: &SuperposeOptions,
) -> Result<AlignmentResult, GeometryError> {
    let n = reference.len();
    check_lengths(n, target.len())?;

    if let Some(weights) = options.weights {
        check_lengths(n, weights.len())?;
        if let Some((index, &weight)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(GeometryError::InvalidWeight { index, weight });
        }
    }

    let reference_selection = selected_indices(options.reference_mask, n)?;
    let target_selection = selected_indices(options.target_mask, n)?;
    check_lengths(reference_selection.len(), target_selection.len())?;
    if reference_selection.is_empty() {
        return Err(GeometryError::EmptySelection);
    }

    let fit = match kabsch(
        reference,
        target,
        &reference_selection,
        &target_selection,
        options.weights,
    ) {
        Err(GeometryError::NumericalDecomposition(reason))
            if options.weights.is_some() && options.retry_unweighted =>
        {
            log::warn!(
                "weighted superposition failed ({}), retrying with uniform weights",
                reason
            );
            kabsch(
                reference,
                target,
                &reference_selection,
                &target_selection,
                None,
            )?
        }
        other => other?,
    };

    let rotation_t = fit.rotation.transpose();
    let coordinates = reference
        .iter()
        .map(|p| fit.target_centroid + rotation_t * (p - fit.reference_centroid))
        .collect();

    Ok(AlignmentResult {
        coordinates,
        rmsd: fit.rmsd,
        rotation: options.return_rotation.then_some(fit.rotation),
    })
}

fn selected_indices(mask: Option<&BitSlice>, n: usize) -> Result<Vec<usize>, GeometryError> {
    match mask {
        Some(mask) => {
            check_lengths(n, mask.len())?;
            Ok(mask.iter_ones().collect())
        }
        None => Ok((0..n).collect()),
    }
}

fn weight_at(weights: Option<&[f64]>, index: usize) -> f64 {
    weights.map_or(1.0, |w| w[index])
}

fn centroid(
    points: &[Point],
    selection: &[usize],
    weights: Option<&[f64]>,
) -> Result<Point, GeometryError> {
    let mut sum = Vector3::<f64>::zeros();
    let mut total_weight = 0.0;
    for &i in selection {
        let w = weight_at(weights, i);
        sum += points[i].coords * w;
        total_weight += w;
    }

    if total_weight <= 0.0 {
        return Err(GeometryError::EmptySelection);
    }

    Ok(Point::from(sum / total_weight))
}

fn kabsch(
    reference: &[Point],
    target: &[Point],
    reference_selection: &[usize],
    target_selection: &[usize],
    weights: Option<&[f64]>,
) -> Result<KabschFit, GeometryError> {
    let reference_centroid = centroid(reference, reference_selection, weights)?;
    let target_centroid = centroid(target, target_selection, weights)?;

    // initial residual
    let mut e0 = 0.0;
    for &i in reference_selection {
        e0 += weight_at(weights, i) * (reference[i] - reference_centroid).norm_squared();
    }
    for &j in target_selection {
        e0 += weight_at(weights, j) * (target[j] - target_centroid).norm_squared();
    }

    let mut covariance = Matrix3::<f64>::zeros();
    for (&i, &j) in reference_selection.iter().zip(target_selection) {
        let r = reference[i] - reference_centroid;
        let t = (target[j] - target_centroid) * weight_at(weights, j);
        covariance += r * t.transpose();
    }

    if covariance.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::NumericalDecomposition(
            "cross-covariance matrix has non-finite entries".to_string(),
        ));
    }

    let svd = SVD::try_new(covariance, true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or_else(|| {
            GeometryError::NumericalDecomposition("SVD did not converge".to_string())
        })?;
    let mut v = svd
        .u
        .ok_or_else(|| GeometryError::NumericalDecomposition("no left singular vectors".into()))?;
    let w_t = svd
        .v_t
        .ok_or_else(|| GeometryError::NumericalDecomposition("no right singular vectors".into()))?;
    let mut singular_values = svd.singular_values;

    // V and W^T are orthonormal; a negative determinant product means a reflection.
    if v.determinant() * w_t.determinant() < 0.0 {
        let smallest = singular_values.imin();
        singular_values[smallest] = -singular_values[smallest];
        for row in 0..3 {
            v[(row, smallest)] = -v[(row, smallest)];
        }
    }

    let count = reference_selection.len() as f64;
    let rmsd = ((e0 - 2.0 * singular_values.sum()).abs() / count).sqrt();

    Ok(KabschFit {
        rotation: v * w_t,
        rmsd,
        reference_centroid,
        target_centroid,
    })
}
