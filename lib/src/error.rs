//! Crate-wide error type.
//!
//! Structural errors report a violated contract of one of the graphs. They are
//! distinguishable from errors which are raised by heuristics or model generators, so a
//! caller can tell a programming mistake apart from a failing evaluation.

use crate::datatypes::Id;

/// Errors raised while building or evaluating an evaluation graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Collapsing a set of components would have introduced a cycle.
    /// The component graph is left unchanged.
    #[error("tried to create a cycle while collapsing components {members:?} (component {via} is both predecessor and successor)")]
    CollapseCycle {
        /// Indices of the components which were requested to be collapsed.
        members: Vec<usize>,
        /// The component outside of the set which would be on the cycle.
        via: usize,
    },
    /// An evaluation unit was requested before the unit of one of its dependencies exists.
    #[error("component {component} depends on component {dependency}, which has no evaluation unit yet")]
    MissingDependencyUnit {
        /// Component which should become part of the new unit.
        component: usize,
        /// Component without an evaluation unit.
        dependency: usize,
    },
    /// The input model of a unit was replaced while its model generator was still running.
    #[error("cannot set the input model of unit {0} while its model generator is running")]
    GeneratorRunning(usize),
    /// Any other violated structural contract.
    #[error("structural error: {0}")]
    Structure(String),
    /// Error reported by an evaluation heuristic.
    #[error("{0}")]
    General(String),
    /// Error reported by a model generator or an external source.
    #[error("model generator failed: {0}")]
    Generator(String),
    /// The given program can not be evaluated.
    #[error("malformed program: {0}")]
    MalformedProgram(String),
    /// The given external atom refers to an unknown external source.
    #[error("no external source named '{name}' registered (used by {id})")]
    UnknownSource {
        /// Name of the external source.
        name: String,
        /// Call site.
        id: Id,
    },
    /// Decoding of a JSON program failed.
    #[error("unable to read program: {0}")]
    Json(#[from] serde_json::Error),
}
