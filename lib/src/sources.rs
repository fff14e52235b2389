/*!
External sources compute the truth value of external atoms.

An external atom `&name[inputs](outputs)` is evaluated by the [ExternalSource] registered
under `name`. The source receives the ground input list together with the current
interpretation and answers with all output tuples which make the external atom true.

Three sources are provided and registered by [Registry::with_builtin_sources]:
- `&id[p](X..)` returns the extension of the predicate `p` (monotonic).
- `&setminus[p,q](X)` returns all `X` with `p(X)` true and `q(X)` false (non-monotonic in `q`).
- `&lt[A,B]()` is true if `A < B`, comparing integers numerically and other constants
  lexically. Both inputs are constants.
*/
use crate::{
    datatypes::{Interpretation, Registry},
    error::Error,
};
use std::rc::Rc;

/// Type of an external atom input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    /// The input names a predicate whose extension is passed to the source.
    Predicate,
    /// The input is a constant (possibly bound through a variable).
    Constant,
}

/// Interface of an external computation.
pub trait ExternalSource: std::fmt::Debug {
    /// Name under which the source is referred to in external atoms.
    fn name(&self) -> &str;
    /// Types of the input positions.
    fn input_types(&self) -> &[InputType];
    /// Length of the output list, [None] if any length is accepted.
    fn output_arity(&self) -> Option<usize>;
    /// Returns true if more true input atoms never make fewer output tuples true.
    fn is_monotonic(&self) -> bool;
    /// Computes all output tuples which are true for the given query.
    fn retrieve(&self, query: &Query<'_>) -> Result<Vec<Vec<String>>, Error>;
}

/// A ground call of an external source.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    inputs: &'a [String],
    interpretation: &'a Interpretation,
    registry: &'a Registry,
}

impl<'a> Query<'a> {
    /// Creates a new query.
    pub fn new(inputs: &'a [String], interpretation: &'a Interpretation, registry: &'a Registry) -> Self {
        Self {
            inputs,
            interpretation,
            registry,
        }
    }

    /// Ground input list.
    pub fn inputs(&self) -> &[String] {
        self.inputs
    }

    /// Argument tuples of all true atoms with the given predicate.
    pub fn extension(&self, predicate: &str) -> Vec<Vec<String>> {
        self.interpretation
            .atoms(self.registry)
            .into_iter()
            .filter(|atom| atom.predicate == predicate)
            .map(|atom| atom.args.into_iter().map(String::from).collect())
            .collect()
    }
}

/// All external sources shipped with the crate.
pub fn builtin() -> Vec<Rc<dyn ExternalSource>> {
    vec![Rc::new(Identity), Rc::new(SetMinus), Rc::new(Less)]
}

/// `&id[p](X..)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl ExternalSource for Identity {
    fn name(&self) -> &str {
        "id"
    }

    fn input_types(&self) -> &[InputType] {
        &[InputType::Predicate]
    }

    fn output_arity(&self) -> Option<usize> {
        None
    }

    fn is_monotonic(&self) -> bool {
        true
    }

    fn retrieve(&self, query: &Query<'_>) -> Result<Vec<Vec<String>>, Error> {
        Ok(query.extension(&query.inputs()[0]))
    }
}

/// `&setminus[p,q](X)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetMinus;

impl ExternalSource for SetMinus {
    fn name(&self) -> &str {
        "setminus"
    }

    fn input_types(&self) -> &[InputType] {
        &[InputType::Predicate, InputType::Predicate]
    }

    fn output_arity(&self) -> Option<usize> {
        Some(1)
    }

    fn is_monotonic(&self) -> bool {
        false
    }

    fn retrieve(&self, query: &Query<'_>) -> Result<Vec<Vec<String>>, Error> {
        let removed = query.extension(&query.inputs()[1]);
        Ok(query
            .extension(&query.inputs()[0])
            .into_iter()
            .filter(|tuple| tuple.len() == 1 && !removed.contains(tuple))
            .collect())
    }
}

/// `&lt[A,B]()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Less;

impl ExternalSource for Less {
    fn name(&self) -> &str {
        "lt"
    }

    fn input_types(&self) -> &[InputType] {
        &[InputType::Constant, InputType::Constant]
    }

    fn output_arity(&self) -> Option<usize> {
        Some(0)
    }

    fn is_monotonic(&self) -> bool {
        true
    }

    fn retrieve(&self, query: &Query<'_>) -> Result<Vec<Vec<String>>, Error> {
        let (left, right) = (&query.inputs()[0], &query.inputs()[1]);
        let less = match (left.parse::<i64>(), right.parse::<i64>()) {
            (Ok(l), Ok(r)) => l < r,
            _ => left < right,
        };
        Ok(if less { vec![Vec::new()] } else { Vec::new() })
    }
}
