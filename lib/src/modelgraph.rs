/*!
The model graph stores the input and output models of all evaluation units.

An input model of a unit is the join of one output model of every predecessor, ordered by join
order. An output model of a unit extends exactly one input model of the same unit. Edges point
from a model to the models it has been built from.
*/
use crate::{
    datatypes::Interpretation,
    error::Error,
    evalgraph::{EvalGraph, EvalUnit},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display, ops::Deref, rc::Rc};

/// Handle of a model in the [ModelGraph].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Model(pub usize);

impl Deref for Model {
    type Target = usize;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<usize> for Model {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model({})", self.0)
    }
}

/// Whether a model is an input or an output model of its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// Join of predecessor output models.
    In,
    /// Result of a model generator.
    Out,
}

/// Contents of a model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Unit the model belongs to.
    pub location: EvalUnit,
    /// Input or output model.
    pub kind: ModelType,
    /// The interpretation, [None] for dummy models and models whose payload has been freed.
    pub interpretation: Option<Rc<Interpretation>>,
    /// True for the input model of a unit without predecessors.
    pub dummy: bool,
    /// Set once all output models of this input model have been created.
    pub child_models_generated: bool,
    predecessors: Vec<Model>,
    successors: Vec<Model>,
    cache_start: usize,
}

impl ModelInfo {
    /// Models this model has been built from, ordered by join order.
    pub fn predecessors(&self) -> &[Model] {
        &self.predecessors
    }

    /// Models which have been built from this model, in order of creation.
    pub fn successors(&self) -> &[Model] {
        &self.successors
    }
}

/// Graph of all models created so far.
#[derive(Debug, Default)]
pub struct ModelGraph {
    models: Vec<ModelInfo>,
    by_unit: HashMap<(EvalUnit, ModelType), Vec<Model>>,
}

impl ModelGraph {
    /// Creates an empty model graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of models created so far.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if no model has been created.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Returns the model contents.
    pub fn model(&self, model: Model) -> &ModelInfo {
        &self.models[*model]
    }

    /// Models of the given unit and type, in order of creation.
    pub fn models_at(&self, unit: EvalUnit, kind: ModelType) -> &[Model] {
        self.by_unit
            .get(&(unit, kind))
            .map(|models| models.as_slice())
            .unwrap_or(&[])
    }

    /// Adds a model.
    ///
    /// An input model depends on one output model of every predecessor of `location`, in join
    /// order; the dummy input model of a unit without predecessors depends on nothing.
    /// An output model depends on exactly one input model of `location`.
    pub fn add_model(
        &mut self,
        evalgraph: &EvalGraph,
        location: EvalUnit,
        kind: ModelType,
        dependencies: &[Model],
    ) -> Result<Model, Error> {
        match kind {
            ModelType::In => {
                let predecessors = evalgraph.predecessors(location);
                if predecessors.len() != dependencies.len() {
                    return Err(Error::Structure(format!(
                        "input model of unit {} needs {} dependencies, got {}",
                        location.index(),
                        predecessors.len(),
                        dependencies.len()
                    )));
                }
                for (join_order, (unit, dep)) in predecessors.iter().zip(dependencies).enumerate() {
                    let info = self.checked(*dep)?;
                    if info.kind != ModelType::Out || info.location != *unit {
                        return Err(Error::Structure(format!(
                            "dependency {} of an input model of unit {} with join order {} has to be an output model of unit {}",
                            dep,
                            location.index(),
                            join_order,
                            unit.index()
                        )));
                    }
                }
            }
            ModelType::Out => {
                let valid = match dependencies {
                    [dep] => {
                        let info = self.checked(*dep)?;
                        info.kind == ModelType::In && info.location == location
                    }
                    _ => false,
                };
                if !valid {
                    return Err(Error::Structure(format!(
                        "an output model of unit {} has to depend on one input model of the same unit",
                        location.index()
                    )));
                }
            }
        }
        let model = Model(self.models.len());
        self.models.push(ModelInfo {
            location,
            kind,
            interpretation: None,
            dummy: kind == ModelType::In && dependencies.is_empty(),
            child_models_generated: false,
            predecessors: dependencies.to_vec(),
            successors: Vec::new(),
            cache_start: 0,
        });
        for dep in dependencies {
            self.models[**dep].successors.push(model);
        }
        self.by_unit.entry((location, kind)).or_default().push(model);
        log::trace!(
            "added {:?} model {} at unit {} from {:?}",
            kind,
            model,
            location.index(),
            dependencies
        );
        Ok(model)
    }

    fn checked(&self, model: Model) -> Result<&ModelInfo, Error> {
        self.models
            .get(*model)
            .ok_or_else(|| Error::Structure(format!("{} does not exist", model)))
    }

    /// Returns the model at `unit` which has exactly the given dependencies, if present.
    ///
    /// This is the intersection of the successor sets of the dependencies, restricted to the
    /// models which are still live at `unit`.
    pub fn successor_intersection(&self, unit: EvalUnit, dependencies: &[Model]) -> Option<Model> {
        let (first, rest) = dependencies.split_first()?;
        self.live_successors(*first)
            .iter()
            .copied()
            .filter(|candidate| self.models[**candidate].location == unit)
            .find(|candidate| {
                rest.iter()
                    .all(|dep| self.models[**dep].successors.contains(candidate))
                    && self.models[**candidate].predecessors == dependencies
            })
    }

    /// Successors of a model which have not been retired.
    pub fn live_successors(&self, model: Model) -> &[Model] {
        let info = &self.models[*model];
        &info.successors[info.cache_start.min(info.successors.len())..]
    }

    /// Retires all successors created so far; they are not reused any more.
    pub fn retire_successors(&mut self, model: Model) {
        let info = &mut self.models[*model];
        info.cache_start = info.successors.len();
    }

    /// Sets the interpretation of a model.
    pub fn set_interpretation(&mut self, model: Model, interpretation: Option<Rc<Interpretation>>) {
        self.models[*model].interpretation = interpretation;
    }

    /// Marks whether all output models of an input model have been created.
    pub fn set_child_models_generated(&mut self, model: Model, value: bool) {
        self.models[*model].child_models_generated = value;
    }

    /// Frees the interpretation of a model. Returns true if there was one.
    pub fn free(&mut self, model: Model) -> bool {
        self.models[*model].interpretation.take().is_some()
    }

    /// Renders the graph in the graphviz dot language.
    pub fn to_dot(&self) -> String {
        let mut result = String::from("digraph {\n");
        for (idx, info) in self.models.iter().enumerate() {
            result.push_str(&format!(
                "    {} [ label=\"{}: {:?}@{}{}\" ]\n",
                idx,
                idx,
                info.kind,
                info.location.index(),
                if info.dummy { " dummy" } else { "" }
            ));
        }
        for (idx, info) in self.models.iter().enumerate() {
            for dep in info.predecessors.iter() {
                result.push_str(&format!("    {} -> {}\n", idx, **dep));
            }
        }
        result.push('}');
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{evalgraph::EvalUnitInfo, modelgen::UnitProgram};
    use test_log::test;

    fn unit() -> EvalUnitInfo {
        EvalUnitInfo {
            component: None,
            shared_components: Vec::new(),
            program: UnitProgram::default(),
            factory: None,
        }
    }

    /// Units a and b are the predecessors of c, in this order.
    fn join() -> (EvalGraph, EvalUnit, EvalUnit, EvalUnit) {
        let mut graph = EvalGraph::new();
        let a = graph.add_unit(unit());
        let b = graph.add_unit(unit());
        let c = graph.add_unit(unit());
        graph.add_dependency(c, a, 0).unwrap();
        graph.add_dependency(c, b, 1).unwrap();
        (graph, a, b, c)
    }

    #[test]
    fn join_order_and_location() {
        let (evalgraph, a, b, c) = join();
        let mut graph = ModelGraph::new();
        let ia = graph.add_model(&evalgraph, a, ModelType::In, &[]).unwrap();
        assert!(graph.model(ia).dummy);
        let oa = graph.add_model(&evalgraph, a, ModelType::Out, &[ia]).unwrap();
        let ib = graph.add_model(&evalgraph, b, ModelType::In, &[]).unwrap();
        let ob = graph.add_model(&evalgraph, b, ModelType::Out, &[ib]).unwrap();

        assert!(graph.add_model(&evalgraph, c, ModelType::In, &[ob, oa]).is_err());
        assert!(graph.add_model(&evalgraph, c, ModelType::In, &[oa]).is_err());
        assert!(graph.add_model(&evalgraph, c, ModelType::In, &[oa, ib]).is_err());
        assert!(graph.add_model(&evalgraph, b, ModelType::Out, &[ia]).is_err());
        assert!(graph.add_model(&evalgraph, b, ModelType::Out, &[ib, ib]).is_err());
        assert!(graph.add_model(&evalgraph, b, ModelType::Out, &[Model(42)]).is_err());

        let ic = graph.add_model(&evalgraph, c, ModelType::In, &[oa, ob]).unwrap();
        assert!(!graph.model(ic).dummy);
        assert_eq!(graph.model(ic).predecessors(), &[oa, ob]);
        assert_eq!(graph.model(oa).successors(), &[ic]);
        assert_eq!(graph.models_at(c, ModelType::In), &[ic]);
        assert!(graph.models_at(c, ModelType::Out).is_empty());
        assert_eq!(graph.len(), 5);
        assert_eq!(format!("{}", ic), "Model(4)");
        assert!(graph.to_dot().contains("4 -> 1"));
    }

    #[test]
    fn intersection_respects_retirement() {
        let (evalgraph, a, b, c) = join();
        let mut graph = ModelGraph::new();
        let ia = graph.add_model(&evalgraph, a, ModelType::In, &[]).unwrap();
        let oa1 = graph.add_model(&evalgraph, a, ModelType::Out, &[ia]).unwrap();
        let oa2 = graph.add_model(&evalgraph, a, ModelType::Out, &[ia]).unwrap();
        let ib = graph.add_model(&evalgraph, b, ModelType::In, &[]).unwrap();
        let ob = graph.add_model(&evalgraph, b, ModelType::Out, &[ib]).unwrap();
        let ic1 = graph.add_model(&evalgraph, c, ModelType::In, &[oa1, ob]).unwrap();
        let ic2 = graph.add_model(&evalgraph, c, ModelType::In, &[oa2, ob]).unwrap();

        assert_eq!(graph.successor_intersection(c, &[oa1, ob]), Some(ic1));
        assert_eq!(graph.successor_intersection(c, &[oa2, ob]), Some(ic2));
        assert_eq!(graph.successor_intersection(c, &[]), None);
        assert_eq!(graph.live_successors(ia), &[oa1, oa2]);

        graph.retire_successors(oa1);
        assert_eq!(graph.successor_intersection(c, &[oa1, ob]), None);
        assert!(graph.live_successors(oa1).is_empty());
        assert_eq!(graph.model(oa1).successors(), &[ic1]);
    }

    #[test]
    fn payloads() {
        let (evalgraph, a, _, _) = join();
        let mut graph = ModelGraph::new();
        let ia = graph.add_model(&evalgraph, a, ModelType::In, &[]).unwrap();
        let oa = graph.add_model(&evalgraph, a, ModelType::Out, &[ia]).unwrap();
        assert!(!graph.free(oa));
        graph.set_interpretation(oa, Some(Rc::new([1, 2].into_iter().collect())));
        assert_eq!(graph.model(oa).interpretation.as_ref().map(|i| i.len()), Some(2));
        assert!(graph.free(oa));
        assert!(graph.model(oa).interpretation.is_none());
        graph.set_child_models_generated(ia, true);
        assert!(graph.model(ia).child_models_generated);
    }
}
