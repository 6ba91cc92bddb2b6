use bitvec::prelude::*;
use nalgebra::{Rotation3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smart_rmsd::geometry::{rmsd, superpose, Mask, Point, SuperposeOptions};

fn random_points(rng: &mut StdRng, n: usize) -> Vec<Point> {
    (0..n)
        .map(|_| {
            Point::new(
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
            )
        })
        .collect()
}

fn random_motion(rng: &mut StdRng, points: &[Point]) -> Vec<Point> {
    let rotation = Rotation3::from_euler_angles(
        rng.gen_range(-3.1..3.1),
        rng.gen_range(-1.5..1.5),
        rng.gen_range(-3.1..3.1),
    );
    let shift = Vector3::new(
        rng.gen_range(-20.0..20.0),
        rng.gen_range(-20.0..20.0),
        rng.gen_range(-20.0..20.0),
    );
    points.iter().map(|p| rotation * p + shift).collect()
}

#[test]
fn rigid_motions_are_undone() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let n = rng.gen_range(3..30);
        let reference = random_points(&mut rng, n);
        let target = random_motion(&mut rng, &reference);

        let options = SuperposeOptions {
            return_rotation: true,
            ..Default::default()
        };
        let result = superpose(&reference, &target, &options).unwrap();

        assert!(result.rmsd < 1e-6, "rmsd {}", result.rmsd);
        assert!(rmsd(&result.coordinates, &target).unwrap() < 1e-6);
        assert!((result.rotation.unwrap().determinant() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn noisy_targets_give_proper_rotations() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..50 {
        let n = rng.gen_range(4..20);
        let reference = random_points(&mut rng, n);
        let target = random_points(&mut rng, n);

        let options = SuperposeOptions {
            return_rotation: true,
            ..Default::default()
        };
        let result = superpose(&reference, &target, &options).unwrap();

        assert!(result.rmsd >= 0.0);
        assert!((result.rotation.unwrap().determinant() - 1.0).abs() < 1e-9);
        // fitting never makes things worse than leaving the points where they are
        assert!(result.rmsd <= rmsd(&reference, &target).unwrap() + 1e-9);
    }
}

#[test]
fn masks_select_matching_subsets() {
    let mut rng = StdRng::seed_from_u64(3);
    let core = random_points(&mut rng, 6);
    let moved = random_motion(&mut rng, &core);

    // reference carries two extra points at the front, target two at the back
    let mut reference = random_points(&mut rng, 2);
    reference.extend(&core);
    let mut target = moved.clone();
    target.extend(random_points(&mut rng, 2));

    let reference_mask: Mask = bitvec![0, 0, 1, 1, 1, 1, 1, 1];
    let target_mask: Mask = bitvec![1, 1, 1, 1, 1, 1, 0, 0];
    let options = SuperposeOptions {
        reference_mask: Some(&reference_mask),
        target_mask: Some(&target_mask),
        ..Default::default()
    };
    let result = superpose(&reference, &target, &options).unwrap();

    assert!(result.rmsd < 1e-6);
    assert_eq!(result.coordinates.len(), 8);
    assert!(rmsd(&result.coordinates[2..], &moved).unwrap() < 1e-6);
}
