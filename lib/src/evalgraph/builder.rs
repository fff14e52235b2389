//! Creation of evaluation units from components.
use super::{EvalGraph, EvalUnit, EvalUnitInfo};
use crate::{
    compgraph::{Component, ComponentGraph},
    error::Error,
    modelgen::{Backend, FactoryKind, UnitProgram},
};
use derivative::Derivative;
use std::{collections::HashMap, rc::Rc};

/// Builds an [EvalGraph] out of a [ComponentGraph].
///
/// Heuristics collapse components of the not yet assigned part of the component graph and
/// create evaluation units, dependencies first.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct EvalGraphBuilder {
    compgraph: ComponentGraph,
    evalgraph: EvalGraph,
    unit_of: HashMap<Component, EvalUnit>,
    #[derivative(Debug = "ignore")]
    backend: Rc<dyn Backend>,
}

impl EvalGraphBuilder {
    /// Creates a builder; the backend provides the model generator factories of the units.
    pub fn new(compgraph: ComponentGraph, backend: Rc<dyn Backend>) -> Self {
        Self {
            compgraph,
            evalgraph: EvalGraph::new(),
            unit_of: HashMap::new(),
            backend,
        }
    }

    /// The component graph, including components which already belong to units.
    pub fn component_graph(&self) -> &ComponentGraph {
        &self.compgraph
    }

    /// Components which do not belong to a unit yet, in ascending order.
    pub fn component_graph_rest(&self) -> Vec<Component> {
        self.compgraph
            .components()
            .into_iter()
            .filter(|comp| !self.unit_of.contains_key(comp))
            .collect()
    }

    /// The evaluation graph created so far.
    pub fn eval_graph(&self) -> &EvalGraph {
        &self.evalgraph
    }

    /// Returns the unit which has been created for the component.
    pub fn unit_of(&self, component: Component) -> Option<EvalUnit> {
        self.unit_of.get(&component).copied()
    }

    /// Collapses components which do not belong to a unit yet.
    pub fn collapse_components(&mut self, components: &[Component]) -> Result<Component, Error> {
        if let Some(assigned) = components.iter().find(|comp| self.unit_of.contains_key(comp)) {
            return Err(Error::Structure(format!(
                "component {} already belongs to unit {}",
                assigned.index(),
                self.unit_of[assigned].index()
            )));
        }
        self.compgraph.collapse_components(components)
    }

    /// Creates a unit for the given components (which are collapsed into one if needed) and
    /// copies the constraints of the shared constraint components into it.
    ///
    /// All dependencies have to belong to units already. The dependencies of the new unit are
    /// ordered as they get discovered.
    pub fn create_eval_unit(
        &mut self,
        components: &[Component],
        shared_constraints: &[Component],
    ) -> Result<EvalUnit, Error> {
        if let Some(shared) = shared_constraints
            .iter()
            .find(|comp| !self.compgraph.contains(**comp) || !self.compgraph.component_info(**comp).is_constraint_only())
        {
            return Err(Error::Structure(format!(
                "component {} is not a constraint-only component",
                shared.index()
            )));
        }
        let mut predecessors: Vec<EvalUnit> = Vec::new();
        for component in components.iter().chain(shared_constraints.iter()) {
            if !self.compgraph.contains(*component) {
                return Err(Error::Structure(format!(
                    "component {} does not exist",
                    component.index()
                )));
            }
            for (dependency, _) in self.compgraph.dependencies(*component) {
                if components.contains(&dependency) {
                    continue;
                }
                match self.unit_of.get(&dependency) {
                    Some(unit) if !predecessors.contains(unit) => predecessors.push(*unit),
                    Some(_) => {}
                    None => {
                        return Err(Error::MissingDependencyUnit {
                            component: component.index(),
                            dependency: dependency.index(),
                        })
                    }
                }
            }
        }

        let component = match components {
            [single] => {
                if let Some(unit) = self.unit_of.get(single) {
                    return Err(Error::Structure(format!(
                        "component {} already belongs to unit {}",
                        single.index(),
                        unit.index()
                    )));
                }
                *single
            }
            _ => self.collapse_components(components)?,
        };
        let info = self.compgraph.component_info(component);
        let shared: Vec<_> = shared_constraints
            .iter()
            .map(|comp| self.compgraph.component_info(*comp))
            .collect();
        let program = UnitProgram::new(info, &shared);
        let kind = FactoryKind::for_component(info);
        let factory = self.backend.create_factory(kind, program.clone())?;
        let unit = self.evalgraph.add_unit(EvalUnitInfo {
            component: Some(component),
            shared_components: shared_constraints.to_vec(),
            program,
            factory: Some(factory),
        });
        for (join_order, predecessor) in predecessors.iter().enumerate() {
            self.evalgraph
                .add_dependency(unit, *predecessor, join_order)?;
        }
        self.unit_of.insert(component, unit);
        log::debug!(
            "created unit {} for component {} ({}) with predecessors {:?}",
            unit.index(),
            component.index(),
            kind,
            predecessors.iter().map(|unit| unit.index()).collect::<Vec<_>>()
        );
        Ok(unit)
    }

    /// Adds the final unit, which depends on all other units in order of their creation.
    /// The input models of the final unit are the models of the whole program.
    ///
    /// Fails with a general error if a component has not been assigned to a unit.
    pub fn finalize(&mut self) -> Result<EvalUnit, Error> {
        let rest = self.component_graph_rest();
        if !rest.is_empty() {
            return Err(Error::General(format!(
                "components {:?} have not been assigned to an evaluation unit",
                rest.iter().map(|comp| comp.index()).collect::<Vec<_>>()
            )));
        }
        let units = self.evalgraph.units();
        let result = self.evalgraph.add_unit(EvalUnitInfo {
            component: None,
            shared_components: Vec::new(),
            program: UnitProgram::default(),
            factory: None,
        });
        for (join_order, unit) in units.into_iter().enumerate() {
            self.evalgraph.add_dependency(result, unit, join_order)?;
        }
        log::debug!("created final unit {}", result.index());
        Ok(result)
    }

    /// Returns the evaluation graph.
    pub fn into_eval_graph(self) -> EvalGraph {
        self.evalgraph
    }
}
