//! Interfaces between the [online model builder][crate::builder::OnlineModelBuilder] and the
//! solvers computing the models of single evaluation units.
use crate::{compgraph::ComponentInfo, datatypes::{Id, Interpretation}, error::Error};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, rc::Rc};
use strum::{Display, EnumString};

/// Kind of model generator an evaluation unit is equipped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum FactoryKind {
    /// No inner external atoms; all external atoms are evaluated on the input.
    Plain,
    /// Inner external atoms, all monotonic and only positive cycles.
    WellFounded,
    /// Arbitrary units, models are guessed and checked.
    GuessAndCheck,
}

impl FactoryKind {
    /// Chooses the kind of model generator which is able to solve the component.
    pub fn for_component(info: &ComponentInfo) -> Self {
        if info.inner_eatoms.is_empty() {
            FactoryKind::Plain
        } else if info.is_wellfounded() {
            FactoryKind::WellFounded
        } else {
            FactoryKind::GuessAndCheck
        }
    }
}

/// The rules and external atoms of an evaluation unit, including the copied constraints of
/// shared constraint components.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitProgram {
    /// Rules with a non-empty head.
    pub rules: Vec<Id>,
    /// Constraints, including the shared constraints.
    pub constraints: Vec<Id>,
    /// External atoms depending on the unit itself.
    pub inner_eatoms: Vec<Id>,
    /// External atoms depending on the input only.
    pub outer_eatoms: Vec<Id>,
}

impl UnitProgram {
    /// Collects the program of a component and its shared constraint components.
    pub fn new(component: &ComponentInfo, shared: &[&ComponentInfo]) -> Self {
        let mut constraints = component.inner_constraints.clone();
        shared
            .iter()
            .for_each(|info| constraints.extend_from_slice(&info.inner_constraints));
        Self {
            rules: component.inner_rules.clone(),
            constraints,
            inner_eatoms: component.inner_eatoms.clone(),
            outer_eatoms: component.outer_eatoms.clone(),
        }
    }

    /// All rules and constraints.
    pub fn all_rules(&self) -> impl Iterator<Item = &Id> + '_ {
        self.rules.iter().chain(self.constraints.iter())
    }
}

/// Computes the models of an evaluation unit for one input interpretation.
///
/// The sequence of models is finite, consists of distinct interpretations, and is not
/// restartable: after the first [None] every further call returns [None].
pub trait ModelGenerator: Debug {
    /// Returns the next model, or [None] if all models have been returned.
    fn generate_next_model(&mut self) -> Result<Option<Interpretation>, Error>;
}

/// Creates [model generators][ModelGenerator] for an evaluation unit.
pub trait ModelGeneratorFactory: Debug {
    /// Kind of the created generators.
    fn kind(&self) -> FactoryKind;
    /// Creates a generator bound to the input. [None] denotes the input of a unit without
    /// predecessors.
    fn create_model_generator(
        &self,
        input: Option<Rc<Interpretation>>,
    ) -> Result<Box<dyn ModelGenerator>, Error>;
}

/// Provides the [factories][ModelGeneratorFactory] for evaluation units.
pub trait Backend: Debug {
    /// Creates a factory of the given kind for the program of a unit.
    fn create_factory(
        &self,
        kind: FactoryKind,
        program: UnitProgram,
    ) -> Result<Rc<dyn ModelGeneratorFactory>, Error>;
}
