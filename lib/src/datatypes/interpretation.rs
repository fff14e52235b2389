//! Interpretations are sets of ground atoms, identified by their ground atom address in the
//! [Registry][super::Registry].
use super::{OrdinaryAtom, Registry};
use roaring::RoaringBitmap;
use std::{
    fmt::Display,
    ops::{BitOr, BitOrAssign},
};

/// A set of ground atoms, represented by a [RoaringBitmap] over ground atom addresses.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Interpretation(RoaringBitmap);

impl Eq for Interpretation {}

impl FromIterator<u32> for Interpretation {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl BitOr for &Interpretation {
    type Output = Interpretation;
    fn bitor(self, rhs: Self) -> Self::Output {
        Interpretation(&self.0 | &rhs.0)
    }
}

impl BitOrAssign<&Interpretation> for Interpretation {
    fn bitor_assign(&mut self, rhs: &Interpretation) {
        self.0 |= &rhs.0;
    }
}

impl Interpretation {
    /// Creates an empty interpretation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a ground atom. Returns true if the atom was not contained before.
    pub fn insert(&mut self, atom: u32) -> bool {
        self.0.insert(atom)
    }

    /// Removes a ground atom.
    pub fn remove(&mut self, atom: u32) -> bool {
        self.0.remove(atom)
    }

    /// Checks whether the ground atom is true in the interpretation.
    pub fn contains(&self, atom: u32) -> bool {
        self.0.contains(atom)
    }

    /// Number of true atoms.
    pub fn len(&self) -> u64 {
        self.0.len()
    }

    /// Returns true if no atom is true.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds all atoms of another interpretation.
    pub fn union_with(&mut self, other: &Interpretation) {
        *self |= other;
    }

    /// Checks whether every true atom of `self` is also true in `other`.
    pub fn is_subset(&self, other: &Interpretation) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Removes all atoms.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Iterates over the addresses of the true ground atoms in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter()
    }

    /// Resolves the true atoms with the help of the registry.
    pub fn atoms(&self, registry: &Registry) -> Vec<OrdinaryAtom> {
        self.iter()
            .filter_map(|addr| registry.ground_atom(addr))
            .collect()
    }

    /// Creates a [PrintableInterpretation] for output purposes.
    pub fn printable<'a>(&'a self, registry: &'a Registry) -> PrintableInterpretation<'a> {
        PrintableInterpretation::new(self, registry)
    }
}

/// A struct to print an [Interpretation] as a set of atoms.
/// Atoms are sorted in natural lexical order, auxiliary atoms are hidden.
#[derive(Debug, Clone, Copy)]
pub struct PrintableInterpretation<'a> {
    interpretation: &'a Interpretation,
    registry: &'a Registry,
    show_auxiliary: bool,
}

impl<'a> PrintableInterpretation<'a> {
    pub(crate) fn new(interpretation: &'a Interpretation, registry: &'a Registry) -> Self {
        Self {
            interpretation,
            registry,
            show_auxiliary: false,
        }
    }

    /// Also print atoms of auxiliary predicates.
    pub fn with_auxiliary(mut self) -> Self {
        self.show_auxiliary = true;
        self
    }

    /// The printed atoms in output order.
    pub fn atom_strings(&self) -> Vec<String> {
        let mut atoms: Vec<String> = self
            .interpretation
            .atoms(self.registry)
            .into_iter()
            .filter(|atom| self.show_auxiliary || !self.registry.is_auxiliary(&atom.predicate))
            .map(|atom| atom.to_string())
            .collect();
        atoms.sort_by(|a, b| lexical_sort::natural_lexical_cmp(a, b));
        atoms
    }
}

impl Display for PrintableInterpretation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.atom_strings().join(","))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;
    use test_log::test;

    #[test]
    fn print() {
        let registry = Registry::default();
        let interpretation: Interpretation = [
            OrdinaryAtom::new("q", &["a"]),
            OrdinaryAtom::new("p", &["b"]),
            OrdinaryAtom::new("p", &["a"]),
        ]
        .iter()
        .map(|atom| registry.intern_ground(atom))
        .collect();
        assert_eq!(
            format!("{}", interpretation.printable(&registry)),
            "{p(a),p(b),q(a)}"
        );
        assert_eq!(format!("{}", Interpretation::new().printable(&registry)), "{}");
    }

    #[quickcheck]
    fn union_laws(left: Vec<u32>, right: Vec<u32>) -> bool {
        let left: Interpretation = left.into_iter().collect();
        let right: Interpretation = right.into_iter().collect();
        let joined = &left | &right;
        let mut copy = left.clone();
        copy.union_with(&right);
        joined == copy
            && joined == &right | &left
            && left.is_subset(&joined)
            && right.is_subset(&joined)
            && left.is_subset(&left)
    }

    #[quickcheck]
    fn subset_of_union_only(atoms: Vec<u32>, extra: u32) -> bool {
        let base: Interpretation = atoms.into_iter().collect();
        let mut bigger = base.clone();
        let added = bigger.insert(extra);
        base.is_subset(&bigger) && (bigger.is_subset(&base) != added)
    }
}
