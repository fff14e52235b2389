//! Identifiers of the objects stored in a [Registry][super::Registry].
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Discriminates the kind of object an [Id] refers to.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub enum IdKind {
    /// An ordinary (possibly non-ground) atom.
    OrdinaryAtom,
    /// An external atom call site.
    ExternalAtom,
    /// A rule with exactly one head atom.
    RegularRule,
    /// A rule with more than one head atom.
    DisjunctiveRule,
    /// A rule without head atoms.
    Constraint,
}

/// Handle to an object stored in a [Registry][super::Registry].
/// It consists of the [kind][IdKind] of the object and its address in the arena of that kind.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct Id {
    /// Kind of the referred object.
    pub kind: IdKind,
    /// Position in the arena of the kind.
    pub address: usize,
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.kind {
            IdKind::OrdinaryAtom => "a",
            IdKind::ExternalAtom => "e",
            IdKind::RegularRule => "r",
            IdKind::DisjunctiveRule => "d",
            IdKind::Constraint => "c",
        };
        write!(f, "{}{}", tag, self.address)
    }
}

impl Id {
    /// Creates a new [Id].
    pub fn new(kind: IdKind, address: usize) -> Self {
        Self { kind, address }
    }

    /// Returns true if the [Id] refers to any kind of rule.
    pub fn is_rule(&self) -> bool {
        matches!(
            self.kind,
            IdKind::RegularRule | IdKind::DisjunctiveRule | IdKind::Constraint
        )
    }

    /// Returns true if the [Id] refers to a rule with a non-empty head.
    pub fn is_regular_rule(&self) -> bool {
        matches!(self.kind, IdKind::RegularRule | IdKind::DisjunctiveRule)
    }

    /// Returns true if the [Id] refers to a rule with an empty head.
    pub fn is_constraint(&self) -> bool {
        self.kind == IdKind::Constraint
    }

    /// Returns true if the [Id] refers to a rule with more than one head atom.
    pub fn is_disjunctive(&self) -> bool {
        self.kind == IdKind::DisjunctiveRule
    }

    /// Returns true if the [Id] refers to an ordinary or external atom.
    pub fn is_atom(&self) -> bool {
        self.is_ordinary_atom() || self.is_external_atom()
    }

    /// Returns true if the [Id] refers to an ordinary atom.
    pub fn is_ordinary_atom(&self) -> bool {
        self.kind == IdKind::OrdinaryAtom
    }

    /// Returns true if the [Id] refers to an external atom.
    pub fn is_external_atom(&self) -> bool {
        self.kind == IdKind::ExternalAtom
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;
    use test_log::test;

    #[test]
    fn kinds() {
        let rule = Id::new(IdKind::RegularRule, 0);
        let disj = Id::new(IdKind::DisjunctiveRule, 1);
        let constraint = Id::new(IdKind::Constraint, 2);
        let atom = Id::new(IdKind::OrdinaryAtom, 0);
        let eatom = Id::new(IdKind::ExternalAtom, 0);

        assert!(rule.is_rule() && rule.is_regular_rule() && !rule.is_disjunctive());
        assert!(disj.is_rule() && disj.is_regular_rule() && disj.is_disjunctive());
        assert!(constraint.is_rule() && constraint.is_constraint());
        assert!(!constraint.is_regular_rule());
        assert!(atom.is_atom() && atom.is_ordinary_atom() && !atom.is_rule());
        assert!(eatom.is_atom() && eatom.is_external_atom() && !eatom.is_ordinary_atom());
    }

    #[quickcheck]
    fn display_address(address: usize) -> bool {
        format!("{}", Id::new(IdKind::RegularRule, address)) == format!("r{}", address)
            && format!("{}", Id::new(IdKind::ExternalAtom, address)) == format!("e{}", address)
    }
}
