//! The [Registry] stores rules, atoms and external sources of a program and hands out [Ids][Id].
use super::{ExternalAtom, Id, IdKind, Literal, OrdinaryAtom, Rule};
use crate::{
    error::Error,
    sources::{self, ExternalSource, InputType},
};
use derivative::Derivative;
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

/// Append-only arenas of the objects of a program.
///
/// Ordinary atoms are interned, so equal atoms share their [Id]. External atoms are call
/// sites and are never shared. Ground atoms, which make up
/// [Interpretations][super::Interpretation], are interned in a separate table which may be
/// extended through a shared reference.
#[derive(Derivative)]
#[derivative(Debug, Default)]
pub struct Registry {
    rules: Vec<Rule>,
    rule_ids: Vec<Id>,
    ordinary_atoms: Vec<OrdinaryAtom>,
    ordinary_index: HashMap<OrdinaryAtom, usize>,
    external_atoms: Vec<ExternalAtom>,
    #[derivative(Debug = "ignore")]
    sources: HashMap<String, Rc<dyn ExternalSource>>,
    auxiliary: HashSet<String>,
    ground: RefCell<GroundTable>,
}

#[derive(Debug, Default)]
struct GroundTable {
    atoms: Vec<OrdinaryAtom>,
    index: HashMap<OrdinaryAtom, u32>,
}

impl Registry {
    /// Creates an empty registry without external sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry which knows the [built-in sources][sources::builtin].
    pub fn with_builtin_sources() -> Self {
        let mut result = Self::new();
        sources::builtin()
            .into_iter()
            .for_each(|source| result.register_source(source));
        result
    }

    /// Registers an external source under its name, replacing an earlier one of the same name.
    pub fn register_source(&mut self, source: Rc<dyn ExternalSource>) {
        self.sources.insert(source.name().to_string(), source);
    }

    /// Returns the source which evaluates the given external atom.
    pub fn source_of(&self, eatom: Id) -> Result<Rc<dyn ExternalSource>, Error> {
        let name = &self.external_atom(eatom).name;
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSource {
                name: name.clone(),
                id: eatom,
            })
    }

    /// Stores an ordinary atom, returning the [Id] of an equal atom if there is one.
    pub fn store_ordinary_atom(&mut self, atom: OrdinaryAtom) -> Id {
        if let Some(address) = self.ordinary_index.get(&atom) {
            return Id::new(IdKind::OrdinaryAtom, *address);
        }
        let address = self.ordinary_atoms.len();
        self.ordinary_index.insert(atom.clone(), address);
        self.ordinary_atoms.push(atom);
        Id::new(IdKind::OrdinaryAtom, address)
    }

    /// Stores a new external atom call site.
    ///
    /// The atom has to refer to a registered source and match its input and output lists;
    /// predicate inputs have to be constants.
    pub fn store_external_atom(&mut self, atom: ExternalAtom) -> Result<Id, Error> {
        let id = Id::new(IdKind::ExternalAtom, self.external_atoms.len());
        let source = self
            .sources
            .get(&atom.name)
            .ok_or_else(|| Error::UnknownSource {
                name: atom.name.clone(),
                id,
            })?;
        if source.input_types().len() != atom.inputs.len() {
            return Err(Error::MalformedProgram(format!(
                "{} expects {} inputs",
                atom,
                source.input_types().len()
            )));
        }
        if let Some(arity) = source.output_arity() {
            if arity != atom.outputs.len() {
                return Err(Error::MalformedProgram(format!(
                    "{} expects {} outputs",
                    atom, arity
                )));
            }
        }
        if let Some(term) = source
            .input_types()
            .iter()
            .zip(atom.inputs.iter())
            .find(|(ty, term)| **ty == InputType::Predicate && term.is_variable())
            .map(|(_, term)| term)
        {
            return Err(Error::MalformedProgram(format!(
                "predicate input {} of {} must not be a variable",
                term, atom
            )));
        }
        self.external_atoms.push(atom);
        Ok(id)
    }

    /// Stores a rule. The kind of the returned [Id] is derived from the size of the head.
    pub fn store_rule(&mut self, rule: Rule) -> Result<Id, Error> {
        if rule.head.iter().any(|atom| !atom.is_ordinary_atom()) {
            return Err(Error::MalformedProgram(
                "rule heads consist of ordinary atoms only".to_string(),
            ));
        }
        if rule.body.iter().any(|lit| !lit.atom.is_atom()) {
            return Err(Error::MalformedProgram(
                "rule bodies consist of atoms only".to_string(),
            ));
        }
        let kind = match rule.head.len() {
            0 => IdKind::Constraint,
            1 => IdKind::RegularRule,
            _ => IdKind::DisjunctiveRule,
        };
        let id = Id::new(kind, self.rules.len());
        self.rules.push(rule);
        self.rule_ids.push(id);
        Ok(id)
    }

    /// All stored rules, in order of insertion.
    pub fn rules(&self) -> &[Id] {
        &self.rule_ids
    }

    /// Returns the rule behind the [Id].
    pub fn rule(&self, id: Id) -> &Rule {
        debug_assert!(id.is_rule());
        &self.rules[id.address]
    }

    /// Returns the ordinary atom behind the [Id].
    pub fn ordinary_atom(&self, id: Id) -> &OrdinaryAtom {
        debug_assert!(id.is_ordinary_atom());
        &self.ordinary_atoms[id.address]
    }

    /// Returns the external atom behind the [Id].
    pub fn external_atom(&self, id: Id) -> &ExternalAtom {
        debug_assert!(id.is_external_atom());
        &self.external_atoms[id.address]
    }

    /// Returns the head of a rule.
    pub fn head(&self, id: Id) -> &[Id] {
        &self.rule(id).head
    }

    /// Returns the body of a rule.
    pub fn body(&self, id: Id) -> &[Literal] {
        &self.rule(id).body
    }

    /// Checks whether two ordinary atoms unify (after renaming their variables apart).
    pub fn unifies(&self, left: Id, right: Id) -> bool {
        self.ordinary_atom(left)
            .unifies(self.ordinary_atom(right))
    }

    /// Checks whether the external source of the call site is monotonic.
    pub fn is_monotonic(&self, eatom: Id) -> Result<bool, Error> {
        Ok(self.source_of(eatom)?.is_monotonic())
    }

    /// Marks a predicate as auxiliary. Atoms of auxiliary predicates are hidden in output.
    pub fn mark_auxiliary(&mut self, predicate: &str) {
        self.auxiliary.insert(predicate.to_string());
    }

    /// Checks whether a predicate is auxiliary.
    pub fn is_auxiliary(&self, predicate: &str) -> bool {
        self.auxiliary.contains(predicate)
    }

    /// Returns the ground atom address of a ground atom, registering the atom if needed.
    pub fn intern_ground(&self, atom: &OrdinaryAtom) -> u32 {
        debug_assert!(atom.is_ground());
        let mut table = self.ground.borrow_mut();
        if let Some(address) = table.index.get(atom) {
            return *address;
        }
        let address: u32 = table
            .atoms
            .len()
            .try_into()
            .expect("interpretations are based on the assumption that only u32::MAX-many ground atoms exist");
        table.atoms.push(atom.clone());
        table.index.insert(atom.clone(), address);
        address
    }

    /// Returns the ground atom behind a ground atom address.
    pub fn ground_atom(&self, address: u32) -> Option<OrdinaryAtom> {
        self.ground.borrow().atoms.get(address as usize).cloned()
    }

    /// Renders a rule in the usual logic programming notation.
    pub fn rule_to_string(&self, id: Id) -> String {
        let rule = self.rule(id);
        let head = rule
            .head
            .iter()
            .map(|atom| self.atom_to_string(*atom))
            .collect::<Vec<_>>()
            .join(" v ");
        let body = rule
            .body
            .iter()
            .map(|lit| {
                let atom = self.atom_to_string(lit.atom);
                if lit.naf {
                    format!("not {}", atom)
                } else {
                    atom
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        match (head.is_empty(), body.is_empty()) {
            (_, true) => format!("{}.", head),
            (true, false) => format!(":- {}.", body),
            (false, false) => format!("{} :- {}.", head, body),
        }
    }

    /// Renders an ordinary or external atom.
    pub fn atom_to_string(&self, id: Id) -> String {
        if id.is_external_atom() {
            self.external_atom(id).to_string()
        } else {
            self.ordinary_atom(id).to_string()
        }
    }
}
