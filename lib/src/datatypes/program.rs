//! Syntactical building blocks of a HEX program.
use super::Id;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

/// A term of a flat (function-free) program.
///
/// Terms serialize to plain strings; a string starting with an uppercase letter or an
/// underscore denotes a [variable][Term::Variable].
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Term {
    /// A constant symbol (or integer).
    Constant(String),
    /// A variable.
    Variable(String),
}

impl From<String> for Term {
    fn from(val: String) -> Self {
        match val.chars().next() {
            Some(first) if first.is_uppercase() || first == '_' => Term::Variable(val),
            _ => Term::Constant(val),
        }
    }
}

impl From<&str> for Term {
    fn from(val: &str) -> Self {
        Term::from(val.to_string())
    }
}

impl From<Term> for String {
    fn from(val: Term) -> Self {
        match val {
            Term::Constant(name) | Term::Variable(name) => name,
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Term {
    /// Returns the symbol of the term.
    pub fn name(&self) -> &str {
        match self {
            Term::Constant(name) | Term::Variable(name) => name,
        }
    }

    /// Returns true if the term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }
}

/// Mapping from variable names to constants.
pub type Substitution = HashMap<String, String>;

/// An ordinary atom `predicate(args..)`.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
pub struct OrdinaryAtom {
    /// Name of the predicate.
    pub predicate: String,
    /// Arguments of the atom.
    #[serde(default)]
    pub args: Vec<Term>,
}

impl Display for OrdinaryAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.predicate)?;
        write_tuple(f, "(", &self.args, ")")
    }
}

impl OrdinaryAtom {
    /// Creates a new atom, classifying each argument by [Term::from].
    pub fn new(predicate: &str, args: &[&str]) -> Self {
        Self {
            predicate: predicate.to_string(),
            args: args.iter().map(|arg| Term::from(*arg)).collect(),
        }
    }

    /// Returns true if the atom has no variables.
    pub fn is_ground(&self) -> bool {
        !self.args.iter().any(Term::is_variable)
    }

    /// Iterates over the names of the variables in the atom (with repetitions).
    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.args
            .iter()
            .filter(|term| term.is_variable())
            .map(Term::name)
    }

    /// Applies a substitution. Unbound variables stay untouched.
    pub fn substitute(&self, substitution: &Substitution) -> OrdinaryAtom {
        OrdinaryAtom {
            predicate: self.predicate.clone(),
            args: substitute_terms(&self.args, substitution),
        }
    }

    /// Checks whether both atoms can be made equal.
    ///
    /// The variables of both atoms are renamed apart before unifying, i.e. `p(X,a)` and
    /// `p(b,X)` do unify.
    pub fn unifies(&self, other: &OrdinaryAtom) -> bool {
        if self.predicate != other.predicate || self.args.len() != other.args.len() {
            return false;
        }
        let mut unifier = Unifier::default();
        self.args
            .iter()
            .zip(other.args.iter())
            .all(|(left, right)| unifier.unify((0, left), (1, right)))
    }

    /// Matches the atom against a ground atom and extends the substitution accordingly.
    /// Returns [None] if the atoms do not match under the given substitution.
    pub fn match_ground(&self, ground: &OrdinaryAtom, substitution: &Substitution) -> Option<Substitution> {
        if self.predicate != ground.predicate || self.args.len() != ground.args.len() {
            return None;
        }
        let mut result = substitution.clone();
        for (term, value) in self.args.iter().zip(ground.args.iter()) {
            match term {
                Term::Constant(name) => {
                    if name != value.name() {
                        return None;
                    }
                }
                Term::Variable(var) => match result.get(var) {
                    Some(bound) if bound != value.name() => return None,
                    Some(_) => {}
                    None => {
                        result.insert(var.clone(), value.name().to_string());
                    }
                },
            }
        }
        Some(result)
    }
}

/// A term identified together with the side (atom) it stems from.
type Side<'a> = (u8, &'a Term);

/// Union-find style unifier over flat terms of two renamed-apart atoms.
#[derive(Default)]
struct Unifier<'a> {
    bindings: HashMap<(u8, &'a str), Side<'a>>,
}

impl<'a> Unifier<'a> {
    fn resolve(&self, mut term: Side<'a>) -> Side<'a> {
        while let Term::Variable(name) = term.1 {
            match self.bindings.get(&(term.0, name.as_str())) {
                Some(next) => term = *next,
                None => break,
            }
        }
        term
    }

    fn unify(&mut self, left: Side<'a>, right: Side<'a>) -> bool {
        let left = self.resolve(left);
        let right = self.resolve(right);
        match (left.1, right.1) {
            (Term::Constant(a), Term::Constant(b)) => a == b,
            (Term::Variable(a), _) => {
                if left != right {
                    self.bindings.insert((left.0, a.as_str()), right);
                }
                true
            }
            (_, Term::Variable(b)) => {
                self.bindings.insert((right.0, b.as_str()), left);
                true
            }
        }
    }
}

/// An external atom `&name[inputs..](outputs..)`.
///
/// Predicate inputs are given as constant terms naming the predicate.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
pub struct ExternalAtom {
    /// Name of the external source.
    pub name: String,
    /// Input list.
    #[serde(default)]
    pub inputs: Vec<Term>,
    /// Output list.
    #[serde(default)]
    pub outputs: Vec<Term>,
}

impl Display for ExternalAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "&{}", self.name)?;
        write_tuple(f, "[", &self.inputs, "]")?;
        write!(f, "(")?;
        write_list(f, &self.outputs)?;
        write!(f, ")")
    }
}

impl ExternalAtom {
    /// Iterates over the names of the variables in the input and output lists.
    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .filter(|term| term.is_variable())
            .map(Term::name)
    }

    /// Returns the input list after applying a substitution.
    pub fn substituted_inputs(&self, substitution: &Substitution) -> Vec<Term> {
        substitute_terms(&self.inputs, substitution)
    }

    /// Returns the output list after applying a substitution.
    pub fn substituted_outputs(&self, substitution: &Substitution) -> Vec<Term> {
        substitute_terms(&self.outputs, substitution)
    }
}

/// A body literal; `atom` refers to an ordinary or an external atom.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct Literal {
    /// Negation as failure.
    pub naf: bool,
    /// The atom of the literal.
    pub atom: Id,
}

impl Literal {
    /// A literal without default negation.
    pub fn positive(atom: Id) -> Self {
        Self { naf: false, atom }
    }

    /// A default negated literal.
    pub fn negative(atom: Id) -> Self {
        Self { naf: true, atom }
    }
}

/// A rule `head_1 v .. v head_n :- body_1, .., body_m.`
#[derive(Debug, Eq, PartialEq, Hash, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    /// Ordinary atoms of the head.
    pub head: Vec<Id>,
    /// Body literals.
    pub body: Vec<Literal>,
}

fn substitute_terms(terms: &[Term], substitution: &Substitution) -> Vec<Term> {
    terms
        .iter()
        .map(|term| match term {
            Term::Variable(var) => substitution
                .get(var)
                .map(|value| Term::Constant(value.clone()))
                .unwrap_or_else(|| term.clone()),
            Term::Constant(_) => term.clone(),
        })
        .collect()
}

fn write_list(f: &mut std::fmt::Formatter<'_>, terms: &[Term]) -> std::fmt::Result {
    for (idx, term) in terms.iter().enumerate() {
        if idx > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", term)?;
    }
    Ok(())
}

fn write_tuple(
    f: &mut std::fmt::Formatter<'_>,
    open: &str,
    terms: &[Term],
    close: &str,
) -> std::fmt::Result {
    if terms.is_empty() {
        return Ok(());
    }
    write!(f, "{}", open)?;
    write_list(f, terms)?;
    write!(f, "{}", close)
}
