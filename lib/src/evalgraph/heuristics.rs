/*!
This module contains all the crate-wide defined evaluation heuristics.
In addition there is the public enum [Heuristic], which allows to choose a heuristic with the public API.

A heuristic decides which components of the component graph are collapsed, and creates the
evaluation units in an order in which every unit comes after its dependencies.
 */
use super::builder::EvalGraphBuilder;
use crate::{
    compgraph::{Component, ComponentGraph, ComponentInfo},
    datatypes::Id,
    error::Error,
};
use std::collections::BTreeSet;
use strum::{EnumString, EnumVariantNames};

/// Signature for custom heuristic functions.
pub type HeuristicFn = dyn Fn(&mut EvalGraphBuilder) -> Result<(), Error>;

/// Creates one unit per component.
pub(crate) fn heu_trivial(builder: &mut EvalGraphBuilder) -> Result<(), Error> {
    create_units_in_order(builder)
}

/// Collapses all components into one unit.
pub(crate) fn heu_monolithic(builder: &mut EvalGraphBuilder) -> Result<(), Error> {
    let rest = builder.component_graph_rest();
    if !rest.is_empty() {
        builder.create_eval_unit(&rest, &[])?;
    }
    Ok(())
}

/// Merges external components with their successors, components with children depending on
/// them only, and components with equal dependencies.
pub(crate) fn heu_easy(builder: &mut EvalGraphBuilder) -> Result<(), Error> {
    loop {
        let changed = merge_external_components(builder)?
            || merge_single_dependency_children(builder)?
            || merge_equal_dependencies(builder)?;
        if !changed {
            break;
        }
    }
    create_units_in_order(builder)
}

/// Merges external components with their successors, then greedily merges pairs of
/// components of compatible kind as long as no cycle can arise.
pub(crate) fn heu_greedy(builder: &mut EvalGraphBuilder) -> Result<(), Error> {
    while merge_external_components(builder)? {}
    loop {
        let order = builder.component_graph().topological_order()?;
        let graph = builder.component_graph();
        let pair = order.iter().enumerate().find_map(|(idx, c1)| {
            order[idx + 1..]
                .iter()
                .find(|c2| {
                    merge_ok(graph, *c1, **c2)
                        && !long_path(graph, *c1, **c2)
                        && !long_path(graph, **c2, *c1)
                })
                .map(|c2| (*c1, *c2))
        });
        match pair {
            Some((c1, c2)) => {
                builder.collapse_components(&[c1, c2])?;
            }
            None => break,
        }
    }
    create_units_in_order(builder)
}

/// Collapses the components containing the rules of each group into one unit.
pub(crate) fn heu_manual(builder: &mut EvalGraphBuilder, groups: &[Vec<Id>]) -> Result<(), Error> {
    let mut assigned: BTreeSet<Component> = BTreeSet::new();
    let mut sets: Vec<Vec<Component>> = Vec::new();
    for (idx, group) in groups.iter().enumerate() {
        let mut set: Vec<Component> = Vec::new();
        for rule in group {
            let component = builder
                .component_graph_rest()
                .into_iter()
                .find(|comp| {
                    let info = builder.component_graph().component_info(*comp);
                    info.inner_rules.contains(rule) || info.inner_constraints.contains(rule)
                })
                .ok_or_else(|| {
                    Error::General(format!("rule {} of group {} is not part of any component", rule, idx))
                })?;
            if set.contains(&component) {
                continue;
            }
            if !assigned.insert(component) {
                return Err(Error::General(format!(
                    "component {} is assigned to more than one unit (group {})",
                    component.index(),
                    idx
                )));
            }
            set.push(component);
        }
        sets.push(set);
    }
    let unassigned: Vec<usize> = builder
        .component_graph_rest()
        .into_iter()
        .filter(|comp| !assigned.contains(comp))
        .map(|comp| comp.index())
        .collect();
    if !unassigned.is_empty() {
        return Err(Error::General(format!(
            "components {:?} are not assigned to any unit",
            unassigned
        )));
    }
    for set in sets.into_iter().filter(|set| set.len() > 1) {
        builder.collapse_components(&set)?;
    }
    create_units_in_order(builder)
}

/// Creates a unit for every unassigned component, in topological order.
fn create_units_in_order(builder: &mut EvalGraphBuilder) -> Result<(), Error> {
    let order = builder.component_graph().topological_order()?;
    for component in order {
        if builder.unit_of(component).is_none() {
            builder.create_eval_unit(&[component], &[])?;
        }
    }
    Ok(())
}

fn has_outer_eatoms(graph: &ComponentGraph, component: Component) -> bool {
    !graph.component_info(component).outer_eatoms.is_empty()
}

/// Merges a component with outer external atoms with all successors without outer external
/// atoms which only depend on components the merged component depends on.
fn merge_external_components(builder: &mut EvalGraphBuilder) -> Result<bool, Error> {
    let graph = builder.component_graph();
    for component in graph.topological_order()? {
        if !has_outer_eatoms(graph, component) {
            continue;
        }
        let mut predecessors = graph.transitive_dependencies(component);
        predecessors.insert(component);
        let mut set = vec![component];
        for successor in graph.dependents(component) {
            if has_outer_eatoms(graph, successor) {
                continue;
            }
            if graph
                .dependencies(successor)
                .iter()
                .all(|(dep, _)| predecessors.contains(dep))
            {
                predecessors.insert(successor);
                set.push(successor);
            }
        }
        if set.len() > 1 {
            builder.collapse_components(&set)?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Merges a component without outer external atoms with its children without outer external
/// atoms which do not depend on anything else.
fn merge_single_dependency_children(builder: &mut EvalGraphBuilder) -> Result<bool, Error> {
    let graph = builder.component_graph();
    for component in graph.topological_order()? {
        if has_outer_eatoms(graph, component) {
            continue;
        }
        let mut set = vec![component];
        set.extend(graph.dependents(component).into_iter().filter(|child| {
            !has_outer_eatoms(graph, *child)
                && graph
                    .dependencies(*child)
                    .iter()
                    .all(|(dep, _)| *dep == component)
        }));
        if set.len() > 1 {
            builder.collapse_components(&set)?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Merges components without outer external atoms which depend on the same components.
fn merge_equal_dependencies(builder: &mut EvalGraphBuilder) -> Result<bool, Error> {
    let graph = builder.component_graph();
    let order = graph.topological_order()?;
    let dependencies = |comp: Component| -> BTreeSet<Component> {
        graph
            .dependencies(comp)
            .into_iter()
            .map(|(dep, _)| dep)
            .collect()
    };
    for (idx, component) in order.iter().enumerate() {
        let deps = dependencies(*component);
        if deps.is_empty() || has_outer_eatoms(graph, *component) {
            continue;
        }
        let mut set = vec![*component];
        set.extend(
            order[idx + 1..]
                .iter()
                .filter(|other| !has_outer_eatoms(graph, **other) && dependencies(**other) == deps),
        );
        if set.len() > 1 {
            builder.collapse_components(&set)?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Checks whether merging two components keeps a unit solvable by the same kind of model
/// generator, and does not add a negative dependency to a well-founded unit.
fn merge_ok(graph: &ComponentGraph, c1: Component, c2: Component) -> bool {
    let (i1, i2) = (graph.component_info(c1), graph.component_info(c2));
    let external_free = |info: &ComponentInfo| {
        info.inner_eatoms.is_empty() && info.outer_eatoms.is_empty()
    };
    if external_free(i1) && external_free(i2) {
        return true;
    }
    let negative_between = [(c1, c2), (c2, c1)].iter().any(|(from, to)| {
        graph
            .dependency(*from, *to)
            .map(|dep| dep.negative_rule || dep.negative_external)
            .unwrap_or(false)
    });
    i1.is_wellfounded()
        && i2.is_wellfounded()
        && i1.outer_eatoms.is_empty()
        && i2.outer_eatoms.is_empty()
        && !negative_between
}

/// Checks whether `from` reaches `to` by a path of length at least two.
fn long_path(graph: &ComponentGraph, from: Component, to: Component) -> bool {
    graph
        .dependencies(from)
        .iter()
        .filter(|(dep, _)| *dep != to)
        .any(|(dep, _)| graph.transitive_dependencies(*dep).contains(&to))
}

/// Enumeration of all currently implemented heuristics.
/// It represents a public view on the crate-wide implementations of heuristics.
#[derive(EnumString, EnumVariantNames, Copy, Clone)]
pub enum Heuristic<'a> {
    /// One evaluation unit per component.
    Trivial,
    /// One evaluation unit for the whole program.
    Monolithic,
    /// Merges external components with their successors, children with their single parent, and
    /// siblings with equal dependencies.
    Easy,
    /// Merges pairs of compatible components as long as no cycle can arise.
    Greedy,
    /// Groups of rules, each group forms one evaluation unit. Every component has to be
    /// covered by exactly one group, including the components of auxiliary input rules.
    #[strum(disabled)]
    Manual(&'a [Vec<Id>]),
    /// Allows passing in an own heuristic function.
    #[strum(disabled)]
    Custom(&'a HeuristicFn),
}

impl Default for Heuristic<'_> {
    fn default() -> Self {
        Self::Greedy
    }
}

impl std::fmt::Debug for Heuristic<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trivial => write!(f, "Trivial"),
            Self::Monolithic => write!(f, "Monolithic"),
            Self::Easy => write!(f, "Easy"),
            Self::Greedy => write!(f, "Greedy"),
            Self::Manual(groups) => write!(f, "Manual ({} groups)", groups.len()),
            Self::Custom(_) => f.debug_tuple("Custom function").finish(),
        }
    }
}

impl Heuristic<'_> {
    /// Runs the heuristic, which creates evaluation units for all components.
    pub fn build(&self, builder: &mut EvalGraphBuilder) -> Result<(), Error> {
        log::info!("[Start] evaluation heuristic {:?}", self);
        match self {
            Heuristic::Trivial => heu_trivial(builder),
            Heuristic::Monolithic => heu_monolithic(builder),
            Heuristic::Easy => heu_easy(builder),
            Heuristic::Greedy => heu_greedy(builder),
            Heuristic::Manual(groups) => heu_manual(builder, groups),
            Heuristic::Custom(function) => function(builder),
        }?;
        log::info!(
            "[Done] evaluation heuristic created {} units",
            builder.eval_graph().len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        compgraph::ComponentDependency,
        datatypes::IdKind,
        evalgraph::builder::test::EchoBackend,
    };
    use std::{rc::Rc, str::FromStr};
    use test_log::test;

    fn positive() -> ComponentDependency {
        ComponentDependency {
            positive_regular_rule: true,
            ..Default::default()
        }
    }

    fn rule(idx: usize) -> ComponentInfo {
        ComponentInfo {
            inner_rules: vec![Id::new(IdKind::RegularRule, idx)],
            ..Default::default()
        }
    }

    fn external(idx: usize) -> ComponentInfo {
        ComponentInfo {
            outer_eatoms: vec![Id::new(IdKind::ExternalAtom, idx)],
            ..Default::default()
        }
    }

    fn setup(infos: Vec<ComponentInfo>, deps: &[(usize, usize)]) -> EvalGraphBuilder {
        let deps: Vec<_> = deps.iter().map(|(a, b)| (*a, *b, positive())).collect();
        EvalGraphBuilder::new(
            ComponentGraph::from_parts(infos, &deps),
            Rc::new(EchoBackend),
        )
    }

    /// 0 and 1 are independent, 2 depends on both
    fn facts() -> EvalGraphBuilder {
        setup(vec![rule(0), rule(1), rule(2)], &[(2, 0), (2, 1)])
    }

    fn check_topological(builder: &EvalGraphBuilder) {
        let graph = builder.eval_graph();
        for unit in graph.units() {
            for pred in graph.predecessors(unit) {
                assert!(pred < unit);
            }
        }
    }

    #[test]
    fn trivial() {
        let mut builder = facts();
        Heuristic::Trivial.build(&mut builder).unwrap();
        assert_eq!(builder.eval_graph().len(), 3);
        check_topological(&builder);
        assert!(builder.component_graph_rest().is_empty());
    }

    #[test]
    fn monolithic() {
        let mut builder = facts();
        Heuristic::Monolithic.build(&mut builder).unwrap();
        assert_eq!(builder.eval_graph().len(), 1);
        let unit = builder.eval_graph().units()[0];
        assert_eq!(builder.eval_graph().unit_info(unit).program.rules.len(), 3);
    }

    #[test]
    fn greedy() {
        let mut builder = facts();
        Heuristic::Greedy.build(&mut builder).unwrap();
        assert_eq!(builder.eval_graph().len(), 1);

        // 3 -> 2 -> 0 and 3 -> 0: merging 3 and 0 would create a cycle through 2
        let mut ext = rule(2);
        ext.inner_eatoms = vec![Id::new(IdKind::ExternalAtom, 9)];
        ext.inner_eatoms_nonmonotonic = true;
        let mut builder = setup(vec![rule(0), rule(1), ext, rule(3)], &[(3, 2), (2, 0), (3, 0)]);
        Heuristic::Greedy.build(&mut builder).unwrap();
        check_topological(&builder);
        // 0, 1, and 3 could be merged pairwise, but 3 and 0 only via 2
        let graph = builder.eval_graph();
        assert_eq!(graph.len(), 3);
        assert!(graph
            .units()
            .iter()
            .any(|unit| graph.unit_info(*unit).program.inner_eatoms.len() == 1));
    }

    #[test]
    fn easy() {
        // external component 1 depends on 0, rules 2 depend on 1 (and 0)
        // 3 depends on 2 only and 4 depends on 2 only
        let mut builder = setup(
            vec![rule(0), external(1), rule(2), rule(3), rule(4)],
            &[(1, 0), (2, 1), (2, 0), (3, 2), (4, 2)],
        );
        Heuristic::Easy.build(&mut builder).unwrap();
        check_topological(&builder);
        let graph = builder.eval_graph();
        assert_eq!(graph.len(), 2);
        let last = *graph.units().last().unwrap();
        let info = graph.unit_info(last);
        assert_eq!(info.program.outer_eatoms.len(), 1);
        assert_eq!(info.program.rules.len(), 3);
    }

    #[test]
    fn easy_equal_dependencies() {
        let mut builder = setup(
            vec![rule(0), rule(1), rule(2), rule(3)],
            &[(2, 0), (2, 1), (3, 0), (3, 1)],
        );
        Heuristic::Easy.build(&mut builder).unwrap();
        let graph = builder.eval_graph();
        assert_eq!(graph.len(), 3);
        let last = *graph.units().last().unwrap();
        assert_eq!(graph.unit_info(last).program.rules.len(), 2);
        assert_eq!(graph.predecessors(last).len(), 2);
    }

    #[test]
    fn manual() {
        let r = |idx| Id::new(IdKind::RegularRule, idx);
        let groups = vec![vec![r(2)], vec![r(0), r(1)]];
        let mut builder = facts();
        Heuristic::Manual(&groups).build(&mut builder).unwrap();
        let graph = builder.eval_graph();
        assert_eq!(graph.units().len(), 2);
        assert_eq!(graph.unit_info(graph.units()[0]).program.rules.len(), 2);

        let twice = vec![vec![r(0), r(2)], vec![r(1), r(2)]];
        let mut builder = facts();
        assert!(matches!(
            Heuristic::Manual(&twice).build(&mut builder),
            Err(Error::General(_))
        ));

        let missing = vec![vec![r(0), r(2)]];
        let mut builder = facts();
        assert!(matches!(
            Heuristic::Manual(&missing).build(&mut builder),
            Err(Error::General(_))
        ));
    }

    #[test]
    fn custom() {
        let function: &HeuristicFn = &|builder: &mut EvalGraphBuilder| -> Result<(), Error> {
            for comp in builder.component_graph().topological_order()? {
                builder.create_eval_unit(&[comp], &[])?;
            }
            Ok(())
        };
        let mut builder = facts();
        Heuristic::Custom(function).build(&mut builder).unwrap();
        assert_eq!(builder.eval_graph().len(), 3);
    }

    #[test]
    fn from_str_and_debug() {
        assert!(matches!(Heuristic::from_str("Easy"), Ok(Heuristic::Easy)));
        assert!(Heuristic::from_str("Manual").is_err());
        assert!(matches!(Heuristic::default(), Heuristic::Greedy));
        let function: &HeuristicFn = &|_builder: &mut EvalGraphBuilder| -> Result<(), Error> { Ok(()) };
        dbg!(Heuristic::Trivial);
        dbg!(Heuristic::Monolithic);
        dbg!(Heuristic::Custom(function));
        assert_eq!(format!("{:?}", Heuristic::Manual(&[])), "Manual (0 groups)");
    }
}
