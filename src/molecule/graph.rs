use petgraph::algo::subgraph_isomorphisms_iter;
use petgraph::graph::UnGraph;

use super::{BondOrder, Molecule};
use crate::matching::{AtomMapping, MatchError};

/// Connectivity of a molecule: atoms are nodes labelled by element, bonds are edges labelled by
/// bond order. Node indices equal atom indices.
#[derive(Debug, Clone)]
pub struct MolGraph {
    graph: UnGraph<String, BondOrder>,
    match_bond_orders: bool,
}

impl MolGraph {
    pub fn from_molecule(molecule: &Molecule) -> Self {
        let mut graph = UnGraph::with_capacity(molecule.atoms.len(), molecule.bonds.len());
        let nodes: Vec<_> = molecule
            .atoms
            .iter()
            .map(|atom| graph.add_node(atom.symbol.clone()))
            .collect();

        for bond in &molecule.bonds {
            graph.add_edge(nodes[bond.begin], nodes[bond.end], bond.order);
        }

        MolGraph {
            graph,
            match_bond_orders: false,
        }
    }

    /// Require bond orders to agree when matching, on top of elements and connectivity.
    pub fn with_bond_orders(mut self, match_bond_orders: bool) -> Self {
        self.match_bond_orders = match_bond_orders;
        self
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }
}

// mapping[i] is the node of `to` matched with node i of `from`
fn isomorphisms(from: &MolGraph, to: &MolGraph, limit: usize) -> Vec<Vec<usize>> {
    if from.atom_count() != to.atom_count() || from.bond_count() != to.bond_count() {
        return Vec::new();
    }

    let (g0, g1) = (&from.graph, &to.graph);
    let match_bond_orders = from.match_bond_orders || to.match_bond_orders;
    let mut node_match = |a: &String, b: &String| a == b;
    let mut edge_match = |a: &BondOrder, b: &BondOrder| !match_bond_orders || a == b;

    let found = match subgraph_isomorphisms_iter(&g0, &g1, &mut node_match, &mut edge_match) {
        Some(found) => found.take(limit).collect(),
        None => Vec::new(),
    };
    found
}

/// Every relabelling of the graph onto itself that keeps elements and bonds, identity first.
///
/// With `limit` set, at most that many are returned and a warning is logged when more exist.
pub fn find_automorphisms(graph: &MolGraph, limit: Option<usize>) -> Vec<AtomMapping> {
    let n = graph.atom_count();
    if n == 0 {
        return vec![AtomMapping::identity(0)];
    }

    let cap = limit.map_or(usize::MAX, |l| l.max(1));
    let found = isomorphisms(graph, graph, cap.saturating_add(1));
    if found.len() > cap {
        log::warn!(
            "molecule has more than {} automorphisms, only the first {} are searched",
            cap,
            cap
        );
    }

    let mut automorphisms = vec![AtomMapping::identity(n)];
    automorphisms.extend(
        found
            .into_iter()
            .filter_map(|targets| AtomMapping::new(targets).ok())
            .filter(|mapping| !mapping.is_identity()),
    );
    automorphisms.truncate(cap);

    automorphisms
}

/// Maps each candidate atom onto the reference atom it corresponds to.
///
/// Fails unless the two graphs are isomorphic. When several correspondences exist any one will
/// do, since the automorphism search covers the rest.
pub fn find_correspondence(
    reference: &MolGraph,
    candidate: &MolGraph,
) -> Result<AtomMapping, MatchError> {
    if reference.atom_count() != candidate.atom_count() {
        return Err(MatchError::MappingFailure(format!(
            "candidate has {} heavy atoms, reference has {}",
            candidate.atom_count(),
            reference.atom_count()
        )));
    }
    if reference.bond_count() != candidate.bond_count() {
        return Err(MatchError::MappingFailure(format!(
            "candidate has {} bonds, reference has {}",
            candidate.bond_count(),
            reference.bond_count()
        )));
    }
    if reference.atom_count() == 0 {
        return Ok(AtomMapping::identity(0));
    }

    let reference_to_candidate = isomorphisms(reference, candidate, 1)
        .into_iter()
        .next()
        .ok_or_else(|| {
            MatchError::MappingFailure(
                "candidate is not the same molecule as the reference".to_string(),
            )
        })?;

    Ok(AtomMapping::new(reference_to_candidate)?.inverse())
}
