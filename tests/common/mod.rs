#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Heavy atoms of isopropanol (central carbon, two methyls, hydroxyl) plus the hydroxyl hydrogen.
pub const ISOPROPANOL: [(&str, [f64; 3]); 5] = [
    ("C", [0.0, 0.0, 0.0]),
    ("C", [1.5, 0.0, 0.0]),
    ("C", [-0.5, 1.4, 0.0]),
    ("O", [-0.5, -0.7, 1.2]),
    ("H", [-1.4, -0.7, 1.5]),
];

pub const ISOPROPANOL_BONDS: [(usize, usize); 4] = [(1, 2), (1, 3), (1, 4), (4, 5)];

pub fn mol_block(name: &str, atoms: &[(&str, [f64; 3])], bonds: &[(usize, usize)]) -> String {
    let mut block = format!("{name}\n  test\n\n");
    block.push_str(&format!(
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000\n",
        atoms.len(),
        bonds.len()
    ));
    for (symbol, [x, y, z]) in atoms {
        block.push_str(&format!(
            "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0\n",
            x, y, z, symbol
        ));
    }
    for (begin, end) in bonds {
        block.push_str(&format!("{:>3}{:>3}  1  0\n", begin, end));
    }
    block.push_str("M  END\n$$$$\n");
    block
}

pub fn isopropanol(name: &str, transform: impl Fn([f64; 3]) -> [f64; 3]) -> String {
    let atoms: Vec<(&str, [f64; 3])> = ISOPROPANOL
        .iter()
        .map(|&(symbol, position)| (symbol, transform(position)))
        .collect();
    mol_block(name, &atoms, &ISOPROPANOL_BONDS)
}

/// Isopropanol written with its two methyl carbons in swapped file positions.
pub fn isopropanol_swapped_methyls(name: &str) -> String {
    let mut atoms = ISOPROPANOL;
    atoms.swap(1, 2);
    mol_block(name, &atoms, &ISOPROPANOL_BONDS)
}

pub fn broken_record(name: &str) -> String {
    format!("{name}\n  test\n\n  2  0  0  0  0  0  0  0  0  0999 V2000\nnot an atom line\n    0.0000    0.0000    0.0000 C   0  0\nM  END\n$$$$\n")
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
