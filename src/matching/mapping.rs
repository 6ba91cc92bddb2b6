use super::MatchError;

/// A validated bijection between two index spaces of equal size (`from -> to`).
///
/// Used both for candidate-to-reference correspondences and for reference automorphisms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomMapping {
    targets: Vec<usize>,
}

impl AtomMapping {
    /// `targets[from]` is the index `from` maps to. Every target must be hit exactly once.
    pub fn new(targets: Vec<usize>) -> Result<Self, MatchError> {
        let n = targets.len();
        let mut seen = vec![false; n];
        for (from, &to) in targets.iter().enumerate() {
            if to >= n {
                return Err(MatchError::MappingFailure(format!(
                    "index {from} maps to {to}, outside 0..{n}"
                )));
            }
            if seen[to] {
                return Err(MatchError::MappingFailure(format!(
                    "index {to} is the image of more than one atom"
                )));
            }
            seen[to] = true;
        }

        Ok(AtomMapping { targets })
    }

    /// Builds a mapping over `0..len` from `(from, to)` pairs, which must cover every index once.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (usize, usize)>,
        len: usize,
    ) -> Result<Self, MatchError> {
        let mut targets: Vec<Option<usize>> = vec![None; len];
        for (from, to) in pairs {
            let slot = targets.get_mut(from).ok_or_else(|| {
                MatchError::MappingFailure(format!("index {from} outside 0..{len}"))
            })?;
            if slot.replace(to).is_some() {
                return Err(MatchError::MappingFailure(format!(
                    "index {from} is mapped more than once"
                )));
            }
        }

        let targets = targets
            .into_iter()
            .enumerate()
            .map(|(from, to)| {
                to.ok_or_else(|| MatchError::MappingFailure(format!("index {from} is unmapped")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(targets)
    }

    pub fn identity(len: usize) -> Self {
        AtomMapping {
            targets: (0..len).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.targets
    }

    pub fn is_identity(&self) -> bool {
        self.targets.iter().enumerate().all(|(from, &to)| from == to)
    }

    pub fn inverse(&self) -> Self {
        let mut targets = vec![0; self.targets.len()];
        for (from, &to) in self.targets.iter().enumerate() {
            targets[to] = from;
        }
        AtomMapping { targets }
    }

    /// Moves `values[from]` to position `to`: puts a candidate into reference order.
    pub fn scatter<T: Copy>(&self, values: &[T]) -> Result<Vec<T>, MatchError> {
        self.check_len(values.len())?;
        let mut out = values.to_vec();
        for (from, &to) in self.targets.iter().enumerate() {
            out[to] = values[from];
        }
        Ok(out)
    }

    /// Position `from` takes `values[to]`: relabels a point set by an automorphism.
    pub fn gather<T: Copy>(&self, values: &[T]) -> Result<Vec<T>, MatchError> {
        self.check_len(values.len())?;
        Ok(self.targets.iter().map(|&to| values[to]).collect())
    }

    fn check_len(&self, len: usize) -> Result<(), MatchError> {
        if len != self.targets.len() {
            return Err(MatchError::MappingFailure(format!(
                "mapping covers {} atoms, got {}",
                self.targets.len(),
                len
            )));
        }
        Ok(())
    }
}
