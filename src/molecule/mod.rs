use std::collections::BTreeMap;

use crate::geometry::Point;

pub mod graph;
pub mod sdf;

pub use graph::{find_automorphisms, find_correspondence, MolGraph};
pub use sdf::{open_sdf, SdfError, SdfReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
    Other(u8),
}

impl BondOrder {
    pub fn from_mdl(code: u8) -> Self {
        match code {
            1 => BondOrder::Single,
            2 => BondOrder::Double,
            3 => BondOrder::Triple,
            4 => BondOrder::Aromatic,
            other => BondOrder::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub symbol: String,
    pub position: Point,
}

impl Atom {
    pub fn new(symbol: &str, position: Point) -> Self {
        Atom {
            symbol: normalize_symbol(symbol),
            position,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self.symbol.as_str(), "H" | "D" | "T")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub name: String,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    pub properties: BTreeMap<String, String>,
}

impl Molecule {
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn coordinates(&self) -> Vec<Point> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Copy with hydrogen atoms and their bonds removed. Heavy atoms keep their relative order.
    pub fn without_hydrogens(&self) -> Molecule {
        let mut new_index = vec![None; self.atoms.len()];
        let mut atoms = Vec::with_capacity(self.atoms.len());
        for (idx, atom) in self.atoms.iter().enumerate() {
            if !atom.is_hydrogen() {
                new_index[idx] = Some(atoms.len());
                atoms.push(atom.clone());
            }
        }

        let bonds = self
            .bonds
            .iter()
            .filter_map(|bond| {
                Some(Bond {
                    begin: new_index[bond.begin]?,
                    end: new_index[bond.end]?,
                    order: bond.order,
                })
            })
            .collect();

        Molecule {
            name: self.name.clone(),
            atoms,
            bonds,
            properties: self.properties.clone(),
        }
    }
}

fn normalize_symbol(symbol: &str) -> String {
    let mut chars = symbol.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn methanol() -> Molecule {
        let symbols = ["C", "O", "H", "H", "H", "H"];
        let atoms = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| Atom::new(s, Point::new(i as f64, 0.0, 0.0)))
            .collect();
        let bonds = [(0, 1), (0, 2), (0, 3), (0, 4), (1, 5)]
            .iter()
            .map(|&(begin, end)| Bond {
                begin,
                end,
                order: BondOrder::Single,
            })
            .collect();

        Molecule {
            name: "methanol".to_string(),
            atoms,
            bonds,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn test_without_hydrogens() {
        let heavy = methanol().without_hydrogens();

        assert_eq!(heavy.num_atoms(), 2);
        assert_eq!(heavy.bonds.len(), 1);
        assert_eq!((heavy.bonds[0].begin, heavy.bonds[0].end), (0, 1));
        assert_eq!(heavy.coordinates()[1], Point::new(1.0, 0.0, 0.0));
        assert_eq!(heavy.name, "methanol");
    }

    #[test]
    fn test_hydrogens_between_heavy_atoms_keep_indices_straight() {
        let mut mol = methanol();
        // move the oxygen behind the hydrogens
        let oxygen = mol.atoms.remove(1);
        mol.atoms.push(oxygen);
        mol.bonds = vec![
            Bond {
                begin: 0,
                end: 5,
                order: BondOrder::Single,
            },
            Bond {
                begin: 5,
                end: 4,
                order: BondOrder::Single,
            },
        ];

        let heavy = mol.without_hydrogens();
        assert_eq!(heavy.atoms[1].symbol, "O");
        assert_eq!(heavy.bonds.len(), 1);
        assert_eq!((heavy.bonds[0].begin, heavy.bonds[0].end), (0, 1));
    }

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Atom::new(" CL", Point::origin()).symbol, "Cl");
        assert_eq!(Atom::new("br", Point::origin()).symbol, "Br");
        assert!(Atom::new("D", Point::origin()).is_hydrogen());
        assert!(!Atom::new("Hg", Point::origin()).is_hydrogen());
    }

    #[test]
    fn test_bond_order_codes() {
        assert_eq!(BondOrder::from_mdl(2), BondOrder::Double);
        assert_eq!(BondOrder::from_mdl(4), BondOrder::Aromatic);
        assert_eq!(BondOrder::from_mdl(8), BondOrder::Other(8));
    }
}
