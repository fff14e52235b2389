//! A collection of all program-level datatypes.
//! Rules, ordinary atoms, and external atoms are stored in a [Registry] and referred to by [Ids][Id].
mod id;
mod input;
mod interpretation;
mod program;
mod registry;

pub use id::{Id, IdKind};
pub use input::{LiteralInput, Program, RuleInput};
pub use interpretation::{Interpretation, PrintableInterpretation};
pub use program::{ExternalAtom, Literal, OrdinaryAtom, Rule, Substitution, Term};
pub use registry::Registry;
