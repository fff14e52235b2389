/*!
The online model builder computes the models of an [EvalGraph] on demand.

Every unit keeps one current input model and one current output model. Input models of a unit
are enumerated like an odometer over the output models of its predecessors in join order, the
last predecessor moving fastest. Output models are pulled from the model generator of the unit,
bound to the current input model.

An output model which is shared by more than one consumer is reference counted: a consumer
which asks for the next output model while others still use the current one gets [None], and
the consumer on the left of the odometer advances it instead.
*/
use crate::{
    datatypes::{Interpretation, Registry},
    error::Error,
    evalgraph::{EvalGraph, EvalUnit},
    modelgen::ModelGenerator,
    modelgraph::{Model, ModelGraph, ModelType},
};
use crossbeam_channel::Sender;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, rc::Rc};

/// Configuration of the [OnlineModelBuilder].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBuilderConfig {
    /// Reuse an existing input model which has been built from the same predecessor models.
    pub redundancy_elimination: bool,
    /// Free the payload of models as soon as they are superseded.
    /// Output models of a superseded input model are regenerated when it is visited again.
    pub constant_space: bool,
}

impl Default for ModelBuilderConfig {
    fn default() -> Self {
        Self {
            redundancy_elimination: true,
            constant_space: false,
        }
    }
}

/// Counters of the model building process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Model generators created.
    pub generators_created: usize,
    /// Output models created.
    pub output_models: usize,
    /// Input models created.
    pub input_models: usize,
    /// Joins answered by an existing input model.
    pub joins_reused: usize,
    /// Model payloads freed.
    pub payloads_freed: usize,
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "generators created: {}", self.generators_created)?;
        writeln!(f, "output models:      {}", self.output_models)?;
        writeln!(f, "input models:       {}", self.input_models)?;
        writeln!(f, "joins reused:       {}", self.joins_reused)?;
        write!(f, "payloads freed:     {}", self.payloads_freed)
    }
}

/// Model building state of one unit.
#[derive(Derivative)]
#[derivative(Debug)]
struct UnitState {
    /// False for units without predecessors, which get a dummy input model.
    need_input: bool,
    predecessors: Vec<EvalUnit>,
    #[derivative(Debug = "ignore")]
    current_mg: Option<Box<dyn ModelGenerator>>,
    imodel: Option<Model>,
    /// Current output model, a successor of `imodel`.
    current_isuccessor: Option<Model>,
    /// Number of consumers of `current_isuccessor`.
    orefcount: usize,
}

/// Pull-based model builder over an [EvalGraph].
#[derive(Debug)]
pub struct OnlineModelBuilder {
    evalgraph: EvalGraph,
    models: ModelGraph,
    units: Vec<UnitState>,
    config: ModelBuilderConfig,
    stats: Statistics,
}

impl OnlineModelBuilder {
    /// Creates a model builder; no model is computed before the first request.
    pub fn new(evalgraph: EvalGraph, config: ModelBuilderConfig) -> Self {
        let units = evalgraph
            .units()
            .into_iter()
            .map(|unit| {
                let predecessors = evalgraph.predecessors(unit);
                UnitState {
                    need_input: !predecessors.is_empty(),
                    predecessors,
                    current_mg: None,
                    imodel: None,
                    current_isuccessor: None,
                    orefcount: 0,
                }
            })
            .collect();
        Self {
            evalgraph,
            models: ModelGraph::new(),
            units,
            config,
            stats: Statistics::default(),
        }
    }

    /// The evaluation graph the models are built for.
    pub fn eval_graph(&self) -> &EvalGraph {
        &self.evalgraph
    }

    /// All models created so far.
    pub fn model_graph(&self) -> &ModelGraph {
        &self.models
    }

    /// Counters of the model building so far.
    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// The current input model of a unit.
    pub fn imodel(&self, unit: EvalUnit) -> Option<Model> {
        self.units[unit.index()].imodel
    }

    /// The current output model of a unit.
    pub fn omodel(&self, unit: EvalUnit) -> Option<Model> {
        self.units[unit.index()].current_isuccessor
    }

    /// Number of consumers of the current output model of a unit.
    pub fn orefcount(&self, unit: EvalUnit) -> usize {
        self.units[unit.index()].orefcount
    }

    /// The interpretation of a model.
    pub fn interpretation(&self, model: Model) -> Option<Rc<Interpretation>> {
        self.models.model(model).interpretation.clone()
    }

    /// Sets or unsets the current input model of a unit.
    ///
    /// Setting an input model fails with [Error::GeneratorRunning] while the model generator of
    /// the unit is running. Unsetting it discards a running generator.
    pub fn set_imodel(&mut self, unit: EvalUnit, imodel: Option<Model>) -> Result<(), Error> {
        let state = &mut self.units[unit.index()];
        match imodel {
            Some(_) if state.current_mg.is_some() => Err(Error::GeneratorRunning(unit.index())),
            Some(_) => {
                state.imodel = imodel;
                Ok(())
            }
            None => {
                if state.current_mg.take().is_some() {
                    log::warn!(
                        "discarding the running model generator of unit {}",
                        unit.index()
                    );
                    if let Some(old) = state.imodel {
                        // the cached output models are incomplete
                        self.models.retire_successors(old);
                    }
                }
                state.imodel = None;
                state.current_isuccessor = None;
                state.orefcount = 0;
                Ok(())
            }
        }
    }

    /// Computes the next input model of a unit, or [None] if all input models have been
    /// enumerated. The next call after [None] starts over.
    pub fn get_next_imodel(&mut self, unit: EvalUnit) -> Result<Option<Model>, Error> {
        log::trace!("get_next_imodel({})", unit.index());
        let old = self.units[unit.index()].imodel;
        if !self.units[unit.index()].need_input {
            return match old {
                Some(dummy) => {
                    self.set_imodel(unit, None)?;
                    if self.config.constant_space {
                        self.retire(dummy);
                    }
                    Ok(None)
                }
                None => {
                    let existing = self.models.models_at(unit, ModelType::In).first().copied();
                    let dummy = match existing {
                        Some(dummy) => dummy,
                        None => {
                            self.stats.input_models += 1;
                            self.models
                                .add_model(&self.evalgraph, unit, ModelType::In, &[])?
                        }
                    };
                    self.set_imodel(unit, Some(dummy))?;
                    Ok(Some(dummy))
                }
            };
        }

        let predecessors = self.units[unit.index()].predecessors.clone();
        let mut cursor = match old {
            Some(old) => {
                self.set_imodel(unit, None)?;
                if self.config.constant_space {
                    self.retire(old);
                }
                match self.ensure_model_increment(&predecessors, predecessors.len() - 1)? {
                    Some(idx) => idx + 1,
                    None => return Ok(None),
                }
            }
            None => 0,
        };
        while cursor < predecessors.len() {
            let predecessor = predecessors[cursor];
            let state = &mut self.units[predecessor.index()];
            if state.current_isuccessor.is_some() {
                state.orefcount += 1;
                log::trace!(
                    "unit {} reuses the output model of unit {} (refcount {})",
                    unit.index(),
                    predecessor.index(),
                    state.orefcount
                );
                cursor += 1;
            } else if self.get_next_omodel(predecessor)?.is_some() {
                cursor += 1;
            } else if cursor == 0 {
                return Ok(None);
            } else {
                match self.ensure_model_increment(&predecessors, cursor - 1)? {
                    Some(idx) => cursor = idx + 1,
                    None => return Ok(None),
                }
            }
        }

        let dependencies: Vec<Model> = predecessors
            .iter()
            .map(|pred| {
                self.units[pred.index()]
                    .current_isuccessor
                    .expect("every predecessor holds an output model after the odometer step")
            })
            .collect();
        let imodel = self.create_imodel_from_predecessor_omodels(unit, &dependencies)?;
        self.set_imodel(unit, Some(imodel))?;
        log::trace!("unit {} has input model {}", unit.index(), imodel);
        Ok(Some(imodel))
    }

    /// Advances the predecessor at `idx`, carrying to the left on exhaustion.
    /// Returns the position which could be advanced.
    fn ensure_model_increment(
        &mut self,
        predecessors: &[EvalUnit],
        idx: usize,
    ) -> Result<Option<usize>, Error> {
        let mut idx = idx;
        loop {
            if self.get_next_omodel(predecessors[idx])?.is_some() {
                return Ok(Some(idx));
            }
            if idx == 0 {
                return Ok(None);
            }
            idx -= 1;
        }
    }

    fn create_imodel_from_predecessor_omodels(
        &mut self,
        unit: EvalUnit,
        dependencies: &[Model],
    ) -> Result<Model, Error> {
        if self.config.redundancy_elimination {
            if let Some(existing) = self.models.successor_intersection(unit, dependencies) {
                if self.models.model(existing).interpretation.is_none() {
                    let interpretation = self.join(dependencies)?;
                    self.models.set_interpretation(existing, Some(interpretation));
                }
                self.stats.joins_reused += 1;
                log::trace!("reusing input model {} at unit {}", existing, unit.index());
                return Ok(existing);
            }
        }
        let interpretation = self.join(dependencies)?;
        let imodel = self
            .models
            .add_model(&self.evalgraph, unit, ModelType::In, dependencies)?;
        self.models.set_interpretation(imodel, Some(interpretation));
        self.stats.input_models += 1;
        Ok(imodel)
    }

    /// A single predecessor model is linked, several are copied and merged.
    fn join(&self, dependencies: &[Model]) -> Result<Rc<Interpretation>, Error> {
        let payload = |model: &Model| {
            self.models
                .model(*model)
                .interpretation
                .clone()
                .ok_or_else(|| Error::Structure(format!("payload of {} has been freed", model)))
        };
        match dependencies {
            [single] => payload(single),
            _ => {
                let mut result = Interpretation::new();
                for dep in dependencies {
                    result |= &*payload(dep)?;
                }
                Ok(Rc::new(result))
            }
        }
    }

    /// Computes the next output model of a unit, or [None] if all output models have been
    /// enumerated or the current one is still used by other consumers.
    pub fn get_next_omodel(&mut self, unit: EvalUnit) -> Result<Option<Model>, Error> {
        log::trace!("get_next_omodel({})", unit.index());
        let state = &mut self.units[unit.index()];
        if state.orefcount > 1 {
            state.orefcount -= 1;
            log::trace!(
                "output model of unit {} is still in use (refcount {})",
                unit.index(),
                state.orefcount
            );
            return Ok(None);
        }
        if state.imodel.is_none() && self.get_next_imodel(unit)?.is_none() {
            return Ok(None);
        }
        loop {
            if self.advance_omodel_for_imodel(unit)? {
                return Ok(self.units[unit.index()].current_isuccessor);
            }
            if self.get_next_imodel(unit)?.is_none() {
                return Ok(None);
            }
        }
    }

    /// Moves the current output model to the next successor of the current input model,
    /// generating it if needed. Returns false if there is none.
    fn advance_omodel_for_imodel(&mut self, unit: EvalUnit) -> Result<bool, Error> {
        let imodel = self.units[unit.index()]
            .imodel
            .ok_or_else(|| Error::Structure(format!("unit {} has no input model", unit.index())))?;
        let live = self.models.live_successors(imodel).to_vec();
        let next = match self.units[unit.index()].current_isuccessor {
            Some(current) => {
                if self.config.constant_space && self.models.free(current) {
                    self.stats.payloads_freed += 1;
                }
                live.iter()
                    .position(|model| *model == current)
                    .and_then(|pos| live.get(pos + 1))
                    .copied()
            }
            None => live.first().copied(),
        };
        let next = match next {
            Some(model) => Some(model),
            None if !self.models.model(imodel).child_models_generated => {
                self.create_next_model(unit, imodel)?
            }
            None => None,
        };
        let state = &mut self.units[unit.index()];
        state.current_isuccessor = next;
        state.orefcount = usize::from(next.is_some());
        Ok(next.is_some())
    }

    /// Pulls the next model out of the generator of the unit, creating the generator first if
    /// necessary.
    fn create_next_model(&mut self, unit: EvalUnit, imodel: Model) -> Result<Option<Model>, Error> {
        if self.units[unit.index()].current_mg.is_none() {
            let factory = self
                .evalgraph
                .unit_info(unit)
                .factory
                .clone()
                .ok_or_else(|| {
                    Error::Structure(format!(
                        "unit {} has no model generator factory",
                        unit.index()
                    ))
                })?;
            let info = self.models.model(imodel);
            let input = if info.dummy {
                None
            } else {
                Some(info.interpretation.clone().ok_or_else(|| {
                    Error::Structure(format!("payload of {} has been freed", imodel))
                })?)
            };
            self.units[unit.index()].current_mg = Some(factory.create_model_generator(input)?);
            self.stats.generators_created += 1;
            log::trace!("created model generator for unit {} on {}", unit.index(), imodel);
        }
        let generated = self.units[unit.index()]
            .current_mg
            .as_mut()
            .expect("the model generator has just been created")
            .generate_next_model()?;
        match generated {
            Some(interpretation) => {
                let model =
                    self.models
                        .add_model(&self.evalgraph, unit, ModelType::Out, &[imodel])?;
                self.models
                    .set_interpretation(model, Some(Rc::new(interpretation)));
                self.stats.output_models += 1;
                Ok(Some(model))
            }
            None => {
                self.models.set_child_models_generated(imodel, true);
                self.units[unit.index()].current_mg = None;
                Ok(None)
            }
        }
    }

    /// Frees the payload of a superseded input model and forgets its output models.
    fn retire(&mut self, imodel: Model) {
        if self.models.free(imodel) {
            self.stats.payloads_freed += 1;
        }
        self.models.set_child_models_generated(imodel, false);
        self.models.retire_successors(imodel);
    }

    /// Enumerates the input models of the final unit, which are the answer sets of the program.
    pub fn answer_sets(
        &mut self,
        final_unit: EvalUnit,
        limit: Option<usize>,
    ) -> Result<Vec<Interpretation>, Error> {
        let mut result = Vec::new();
        log::info!("[Start] model building");
        while limit.map_or(true, |limit| result.len() < limit) {
            match self.get_next_imodel(final_unit)? {
                Some(model) => result.push(self.answer_set(model)),
                None => break,
            }
        }
        log::info!("[Done] model building: {} answer sets", result.len());
        Ok(result)
    }

    /// Enumerates the answer sets like [answer_sets][Self::answer_sets] and sends the printed
    /// atoms of each one through the channel. Stops early if the receiver has been dropped.
    /// Returns the number of answer sets sent.
    pub fn answer_sets_channel(
        &mut self,
        final_unit: EvalUnit,
        registry: &Registry,
        sender: Sender<Vec<String>>,
        limit: Option<usize>,
    ) -> Result<usize, Error> {
        let mut count = 0;
        log::info!("[Start] model building");
        while limit.map_or(true, |limit| count < limit) {
            let model = match self.get_next_imodel(final_unit)? {
                Some(model) => model,
                None => break,
            };
            let atoms = self.answer_set(model).printable(registry).atom_strings();
            if sender.send(atoms).is_err() {
                log::debug!("answer set receiver is gone");
                break;
            }
            count += 1;
        }
        log::info!("[Done] model building: {} answer sets", count);
        Ok(count)
    }

    fn answer_set(&self, model: Model) -> Interpretation {
        self.models
            .model(model)
            .interpretation
            .as_deref()
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        evalgraph::EvalUnitInfo,
        modelgen::{FactoryKind, ModelGeneratorFactory, UnitProgram},
    };
    use test_log::test;

    /// Generators return the input extended by each of the given atom sets.
    #[derive(Debug)]
    struct ListFactory(Vec<Vec<u32>>);

    #[derive(Debug)]
    struct ListGenerator(std::vec::IntoIter<Interpretation>);

    impl ModelGenerator for ListGenerator {
        fn generate_next_model(&mut self) -> Result<Option<Interpretation>, Error> {
            Ok(self.0.next())
        }
    }

    impl ModelGeneratorFactory for ListFactory {
        fn kind(&self) -> FactoryKind {
            FactoryKind::Plain
        }

        fn create_model_generator(
            &self,
            input: Option<Rc<Interpretation>>,
        ) -> Result<Box<dyn ModelGenerator>, Error> {
            let input = input.map(|input| (*input).clone()).unwrap_or_default();
            let models: Vec<Interpretation> = self
                .0
                .iter()
                .map(|atoms| {
                    let mut model = input.clone();
                    atoms.iter().for_each(|atom| {
                        model.insert(*atom);
                    });
                    model
                })
                .collect();
            Ok(Box::new(ListGenerator(models.into_iter())))
        }
    }

    #[derive(Debug)]
    struct FailingFactory;

    #[derive(Debug)]
    struct Failing;

    impl ModelGenerator for Failing {
        fn generate_next_model(&mut self) -> Result<Option<Interpretation>, Error> {
            Err(Error::Generator("external source unavailable".to_string()))
        }
    }

    impl ModelGeneratorFactory for FailingFactory {
        fn kind(&self) -> FactoryKind {
            FactoryKind::GuessAndCheck
        }

        fn create_model_generator(
            &self,
            _input: Option<Rc<Interpretation>>,
        ) -> Result<Box<dyn ModelGenerator>, Error> {
            Ok(Box::new(Failing))
        }
    }

    fn unit(factory: Option<Rc<dyn ModelGeneratorFactory>>) -> EvalUnitInfo {
        EvalUnitInfo {
            component: None,
            shared_components: Vec::new(),
            program: UnitProgram::default(),
            factory,
        }
    }

    fn list(models: &[&[u32]]) -> Option<Rc<dyn ModelGeneratorFactory>> {
        Some(Rc::new(ListFactory(
            models.iter().map(|atoms| atoms.to_vec()).collect(),
        )))
    }

    /// Two leaves with two models each, joined by a unit without factory.
    fn odometer() -> (EvalGraph, EvalUnit) {
        let mut graph = EvalGraph::new();
        let a = graph.add_unit(unit(list(&[&[1], &[2]])));
        let b = graph.add_unit(unit(list(&[&[3], &[4]])));
        let c = graph.add_unit(unit(None));
        graph.add_dependency(c, a, 0).unwrap();
        graph.add_dependency(c, b, 1).unwrap();
        (graph, c)
    }

    fn imodels(builder: &mut OnlineModelBuilder, unit: EvalUnit) -> Vec<Vec<u32>> {
        let mut result = Vec::new();
        while let Some(model) = builder.get_next_imodel(unit).unwrap() {
            result.push(builder.interpretation(model).unwrap().iter().collect());
        }
        result
    }

    #[test]
    fn odometer_order() {
        for constant_space in [false, true] {
            let (graph, c) = odometer();
            let mut builder = OnlineModelBuilder::new(
                graph,
                ModelBuilderConfig {
                    constant_space,
                    ..Default::default()
                },
            );
            let expected = vec![vec![1, 3], vec![1, 4], vec![2, 3], vec![2, 4]];
            assert_eq!(imodels(&mut builder, c), expected);
            assert!(builder.imodel(c).is_none());
            // a second cycle yields the same models
            assert_eq!(imodels(&mut builder, c), expected);
            let stats = builder.statistics();
            if constant_space {
                assert!(stats.payloads_freed > 0);
                assert!(stats.generators_created > 2);
            } else {
                assert_eq!(stats.generators_created, 2);
                assert_eq!(stats.output_models, 4);
                assert_eq!(stats.joins_reused, 4);
            }
        }
    }

    #[test]
    fn without_redundancy_elimination() {
        let (graph, c) = odometer();
        let mut builder = OnlineModelBuilder::new(
            graph,
            ModelBuilderConfig {
                redundancy_elimination: false,
                constant_space: false,
            },
        );
        assert_eq!(imodels(&mut builder, c).len(), 4);
        assert_eq!(imodels(&mut builder, c).len(), 4);
        assert_eq!(builder.statistics().joins_reused, 0);
        assert_eq!(builder.model_graph().models_at(c, ModelType::In).len(), 8);
    }

    #[test]
    fn leaf_toggles_dummy() {
        let mut graph = EvalGraph::new();
        let leaf = graph.add_unit(unit(list(&[&[1]])));
        let mut builder = OnlineModelBuilder::new(graph, ModelBuilderConfig::default());
        let dummy = builder.get_next_imodel(leaf).unwrap().unwrap();
        assert!(builder.model_graph().model(dummy).dummy);
        assert!(builder.get_next_imodel(leaf).unwrap().is_none());
        assert_eq!(builder.get_next_imodel(leaf).unwrap(), Some(dummy));
        assert!(builder.get_next_imodel(leaf).unwrap().is_none());
        assert_eq!(builder.model_graph().len(), 1);
    }

    /// 0 is shared by 1 and 2, which are joined by 3.
    fn diamond() -> (EvalGraph, Vec<EvalUnit>) {
        let mut graph = EvalGraph::new();
        let u0 = graph.add_unit(unit(list(&[&[1], &[2]])));
        let u1 = graph.add_unit(unit(list(&[&[10]])));
        let u2 = graph.add_unit(unit(list(&[&[20]])));
        let u3 = graph.add_unit(unit(None));
        graph.add_dependency(u1, u0, 0).unwrap();
        graph.add_dependency(u2, u0, 0).unwrap();
        graph.add_dependency(u3, u1, 0).unwrap();
        graph.add_dependency(u3, u2, 1).unwrap();
        (graph, vec![u0, u1, u2, u3])
    }

    #[test]
    fn shared_predecessor_stays_consistent() {
        let (graph, units) = diamond();
        let mut builder = OnlineModelBuilder::new(graph, ModelBuilderConfig::default());
        assert_eq!(
            imodels(&mut builder, units[3]),
            vec![vec![1, 10, 20], vec![2, 10, 20]]
        );
    }

    #[test]
    fn refcount_gating() {
        let (graph, units) = diamond();
        let mut builder = OnlineModelBuilder::new(graph, ModelBuilderConfig::default());
        builder.get_next_imodel(units[3]).unwrap().unwrap();
        assert_eq!(builder.orefcount(units[0]), 2);
        let current = builder.omodel(units[0]);
        assert!(builder.get_next_omodel(units[0]).unwrap().is_none());
        assert_eq!(builder.orefcount(units[0]), 1);
        assert_eq!(builder.omodel(units[0]), current);
        let next = builder.get_next_omodel(units[0]).unwrap();
        assert!(next.is_some());
        assert_ne!(next, current);
    }

    #[test]
    fn running_generator_blocks_rebinding() {
        let mut graph = EvalGraph::new();
        let leaf = graph.add_unit(unit(list(&[&[1], &[2]])));
        let mut builder = OnlineModelBuilder::new(graph, ModelBuilderConfig::default());
        builder.get_next_omodel(leaf).unwrap().unwrap();
        let dummy = builder.imodel(leaf);
        assert!(matches!(
            builder.set_imodel(leaf, dummy),
            Err(Error::GeneratorRunning(0))
        ));
        builder.set_imodel(leaf, None).unwrap();
        assert!(builder.units[leaf.index()].current_mg.is_none());
        builder.set_imodel(leaf, dummy).unwrap();
        // the discarded generator's models are generated again
        let mut models: Vec<Vec<u32>> = Vec::new();
        while let Some(model) = builder.get_next_omodel(leaf).unwrap() {
            models.push(builder.interpretation(model).unwrap().iter().collect());
        }
        assert_eq!(models, vec![vec![1], vec![2]]);
    }

    #[test]
    fn generator_errors_propagate() {
        let mut graph = EvalGraph::new();
        let leaf = graph.add_unit(unit(Some(Rc::new(FailingFactory))));
        let last = graph.add_unit(unit(None));
        graph.add_dependency(last, leaf, 0).unwrap();
        let mut builder = OnlineModelBuilder::new(graph, ModelBuilderConfig::default());
        assert!(matches!(
            builder.answer_sets(last, None),
            Err(Error::Generator(_))
        ));

        // units without factory only have input models
        let (graph, c) = odometer();
        let mut builder = OnlineModelBuilder::new(graph, ModelBuilderConfig::default());
        assert!(matches!(builder.get_next_omodel(c), Err(Error::Structure(_))));
    }

    #[test]
    fn answer_set_limit_and_channel() {
        let (graph, c) = odometer();
        let mut builder = OnlineModelBuilder::new(graph, ModelBuilderConfig::default());
        assert_eq!(builder.answer_sets(c, Some(3)).unwrap().len(), 3);

        let (graph, c) = odometer();
        let mut builder = OnlineModelBuilder::new(graph, ModelBuilderConfig::default());
        let registry = Registry::default();
        let (sender, receiver) = crossbeam_channel::unbounded();
        assert_eq!(
            builder
                .answer_sets_channel(c, &registry, sender, None)
                .unwrap(),
            4
        );
        assert_eq!(receiver.iter().count(), 4);
        assert!(format!("{}", builder.statistics()).contains("generators created: 2"));
    }
}
