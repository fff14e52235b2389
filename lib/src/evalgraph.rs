/*!
The evaluation graph is a DAG of evaluation units.

A unit wraps one component of the [component graph][crate::compgraph::ComponentGraph]
together with copies of shared constraint components, and carries the
[factory][crate::modelgen::ModelGeneratorFactory] of the model generators computing its models.
An edge `u -> v` records that `v` is a predecessor of `u`; its join order is the position of
`v` among the predecessors of `u`.

Evaluation graphs are created by the [builder][builder::EvalGraphBuilder], which is driven by
a [heuristic][heuristics::Heuristic].
*/
pub mod builder;
pub mod heuristics;

use crate::{
    compgraph::Component,
    error::Error,
    modelgen::{FactoryKind, ModelGeneratorFactory, UnitProgram},
};
use derivative::Derivative;
use petgraph::{
    dot::{Config, Dot},
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
    Direction,
};
use std::{fmt::Display, rc::Rc};

/// Handle of an evaluation unit.
pub type EvalUnit = NodeIndex;

/// Contents of an evaluation unit.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct EvalUnitInfo {
    /// The component of the unit at the time of creation, [None] for the final unit.
    pub component: Option<Component>,
    /// Shared constraint components copied into the unit.
    pub shared_components: Vec<Component>,
    /// Rules and external atoms of the unit.
    pub program: UnitProgram,
    /// Creates the model generators, [None] for the final unit.
    #[derivative(Debug = "ignore")]
    pub factory: Option<Rc<dyn ModelGeneratorFactory>>,
}

impl Display for EvalUnitInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.factory {
            Some(factory) => write!(
                f,
                "{} rules {} constraints ({})",
                self.program.rules.len(),
                self.program.constraints.len(),
                factory.kind()
            ),
            None => write!(f, "final"),
        }
    }
}

impl EvalUnitInfo {
    /// Kind of the model generators of the unit.
    pub fn kind(&self) -> Option<FactoryKind> {
        self.factory.as_ref().map(|factory| factory.kind())
    }
}

/// Dependency between evaluation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalUnitDep {
    /// Position of the predecessor among all predecessors of the dependent unit.
    pub join_order: usize,
}

impl Display for EvalUnitDep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.join_order)
    }
}

/// DAG of evaluation units.
#[derive(Debug, Default)]
pub struct EvalGraph {
    graph: DiGraph<EvalUnitInfo, EvalUnitDep>,
}

impl EvalGraph {
    /// Creates an empty evaluation graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit without dependencies.
    pub fn add_unit(&mut self, info: EvalUnitInfo) -> EvalUnit {
        self.graph.add_node(info)
    }

    /// Records `predecessor` as the next predecessor of `unit`.
    /// The join order has to be the number of predecessors recorded so far.
    pub fn add_dependency(
        &mut self,
        unit: EvalUnit,
        predecessor: EvalUnit,
        join_order: usize,
    ) -> Result<(), Error> {
        let predecessors = self.graph.edges_directed(unit, Direction::Outgoing).count();
        if join_order != predecessors {
            return Err(Error::Structure(format!(
                "join order {} does not match the {} existing predecessors of unit {}",
                join_order,
                predecessors,
                unit.index()
            )));
        }
        if unit == predecessor || self.graph.find_edge(unit, predecessor).is_some() {
            return Err(Error::Structure(format!(
                "unit {} already depends on unit {}",
                unit.index(),
                predecessor.index()
            )));
        }
        self.graph.add_edge(unit, predecessor, EvalUnitDep { join_order });
        Ok(())
    }

    /// All units in order of creation.
    pub fn units(&self) -> Vec<EvalUnit> {
        self.graph.node_indices().collect()
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if there is no unit.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the unit contents.
    pub fn unit_info(&self, unit: EvalUnit) -> &EvalUnitInfo {
        &self.graph[unit]
    }

    /// Predecessors of a unit, ordered by join order.
    pub fn predecessors(&self, unit: EvalUnit) -> Vec<EvalUnit> {
        let mut edges: Vec<(usize, EvalUnit)> = self
            .graph
            .edges_directed(unit, Direction::Outgoing)
            .map(|edge| (edge.weight().join_order, edge.target()))
            .collect();
        edges.sort();
        edges.into_iter().map(|(_, unit)| unit).collect()
    }

    /// Units which have the given unit as predecessor.
    pub fn successors(&self, unit: EvalUnit) -> Vec<EvalUnit> {
        let mut result: Vec<EvalUnit> = self
            .graph
            .neighbors_directed(unit, Direction::Incoming)
            .collect();
        result.sort();
        result
    }

    /// Renders the graph in the graphviz dot language.
    pub fn to_dot(&self) -> String {
        format!(
            "{}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &|_, edge| format!("label=\"{}\"", edge.weight().join_order),
                &|_, (unit, info)| format!("label=\"{}: {}\" shape=box", unit.index(), info),
            )
        )
    }
}
