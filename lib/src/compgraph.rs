/*!
The component graph is the condensation of the [dependency graph][crate::depgraph::DependencyGraph].

Every strongly connected subgraph which contains a rule or an external atom becomes a
[component][ComponentInfo]. Subgraphs consisting of ordinary atoms only are transparent:
dependencies through them are bridged, so that component edges connect components with
evaluable content only. The flags of a bridged edge are taken from the dependency which leaves
the source component.

An external atom which forms a subgraph on its own is an *outer* external atom of its own
component. It only depends on other components and can be evaluated before its dependent
rules. External atoms on a cycle are *inner* external atoms.

The graph is acyclic, [collapsing][ComponentGraph::collapse_components] components never
introduces a cycle.
*/
use crate::{
    datatypes::{Id, Registry},
    depgraph::{DependencyGraph, DependencyInfo},
    error::Error,
};
use petgraph::{
    algo::{tarjan_scc, toposort},
    dot::{Config, Dot},
    graph::NodeIndex,
    stable_graph::StableDiGraph,
    visit::{Dfs, EdgeRef, Walker},
    Direction,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt::Display,
    ops::BitOrAssign,
};

/// Handle of a component in the [ComponentGraph].
pub type Component = NodeIndex;

/// Contents of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Rules with a non-empty head.
    pub inner_rules: Vec<Id>,
    /// Rules with an empty head.
    pub inner_constraints: Vec<Id>,
    /// External atoms which depend on the component itself.
    pub inner_eatoms: Vec<Id>,
    /// External atoms which only depend on other components.
    pub outer_eatoms: Vec<Id>,
    /// Some rule has more than one head atom.
    pub disjunctive_heads: bool,
    /// Rules of the component depend on each other through default negation.
    pub negative_dependency_between_rules: bool,
    /// Some inner external atom is non-monotonic.
    pub inner_eatoms_nonmonotonic: bool,
    /// Some outer external atom is non-monotonic.
    pub outer_eatoms_nonmonotonic: bool,
    /// All inner external atoms are monotonic and all cycles of the component are positive.
    pub inner_eatoms_monotonic_and_only_positive_cycles: bool,
}

impl Default for ComponentInfo {
    fn default() -> Self {
        Self {
            inner_rules: Vec::new(),
            inner_constraints: Vec::new(),
            inner_eatoms: Vec::new(),
            outer_eatoms: Vec::new(),
            disjunctive_heads: false,
            negative_dependency_between_rules: false,
            inner_eatoms_nonmonotonic: false,
            outer_eatoms_nonmonotonic: false,
            inner_eatoms_monotonic_and_only_positive_cycles: true,
        }
    }
}

impl Display for ComponentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let list = |ids: &[Id]| {
            ids.iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        write!(
            f,
            "rules [{}] constraints [{}] inner [{}] outer [{}]",
            list(&self.inner_rules),
            list(&self.inner_constraints),
            list(&self.inner_eatoms),
            list(&self.outer_eatoms)
        )
    }
}

impl ComponentInfo {
    /// Returns true if the component consists of constraints only.
    pub fn is_constraint_only(&self) -> bool {
        self.inner_rules.is_empty()
            && self.inner_eatoms.is_empty()
            && self.outer_eatoms.is_empty()
            && !self.inner_constraints.is_empty()
    }

    /// Returns true if the component can be solved by a well-founded fixpoint iteration:
    /// it has inner external atoms, which are all monotonic, and neither negative
    /// dependencies nor disjunctive heads.
    pub fn is_wellfounded(&self) -> bool {
        !self.inner_eatoms.is_empty()
            && !self.inner_eatoms_nonmonotonic
            && !self.negative_dependency_between_rules
            && !self.disjunctive_heads
    }
}

/// Flags of a dependency between components.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentDependency {
    /// A regular rule depends positively on an atom.
    pub positive_regular_rule: bool,
    /// A constraint depends positively on an atom.
    pub positive_constraint: bool,
    /// A rule depends negatively on an atom.
    pub negative_rule: bool,
    /// A rule depends on an external atom which may become true by additional atoms.
    pub positive_external: bool,
    /// A rule depends on an external atom which may become false by additional atoms.
    pub negative_external: bool,
    /// An external atom gets a constant input.
    pub external_constant_input: bool,
    /// An external atom gets a predicate input.
    pub external_predicate_input: bool,
    /// Rules with unifying heads; never occurs between components.
    pub unifying_head: bool,
    /// Disjunctive head dependency; never occurs between components.
    pub disjunctive: bool,
}

impl BitOrAssign for ComponentDependency {
    fn bitor_assign(&mut self, rhs: Self) {
        self.positive_regular_rule |= rhs.positive_regular_rule;
        self.positive_constraint |= rhs.positive_constraint;
        self.negative_rule |= rhs.negative_rule;
        self.positive_external |= rhs.positive_external;
        self.negative_external |= rhs.negative_external;
        self.external_constant_input |= rhs.external_constant_input;
        self.external_predicate_input |= rhs.external_predicate_input;
        self.unifying_head |= rhs.unifying_head;
        self.disjunctive |= rhs.disjunctive;
    }
}

impl Display for ComponentDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags = [
            (self.positive_regular_rule, "posR"),
            (self.positive_constraint, "posC"),
            (self.negative_rule, "negR"),
            (self.positive_external, "posExt"),
            (self.negative_external, "negExt"),
            (self.external_constant_input, "extCI"),
            (self.external_predicate_input, "extPI"),
            (self.unifying_head, "unifH"),
            (self.disjunctive, "disj"),
        ];
        let active: Vec<&str> = flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", active.join(" "))
    }
}

impl ComponentDependency {
    fn is_internal_only(&self) -> bool {
        self.unifying_head || self.disjunctive
    }

    /// Translates the dependency leaving a component into component dependency flags.
    fn from_hop(
        depgraph: &DependencyGraph,
        source: NodeIndex,
        target: NodeIndex,
        info: &DependencyInfo,
        usage: &impl Fn(NodeIndex) -> ComponentDependency,
    ) -> Self {
        let (from, to) = (depgraph.node_info(source).id, depgraph.node_info(target).id);
        let mut result = Self::default();
        if from.is_rule() && info.involves_rule {
            if to.is_rule() {
                result.unifying_head = info.unifying;
                result.disjunctive = info.disjunctive;
            } else if to.is_external_atom() {
                result.positive_external = info.positive;
                result.negative_external = info.negative;
            } else {
                result.positive_constraint = info.positive && info.constraint;
                result.positive_regular_rule = info.positive && !info.constraint;
                result.negative_rule = info.negative;
            }
        } else if from.is_external_atom() && info.external {
            result.external_constant_input = info.external_constant_input;
            result.external_predicate_input = info.external_predicate_input;
        } else {
            result = usage(source);
        }
        if result == Self::default() {
            result.positive_regular_rule = true;
        }
        result
    }
}

/// Acyclic graph of components; an edge `a -> b` states that `a` depends on `b`.
#[derive(Debug, Default, Clone)]
pub struct ComponentGraph {
    graph: StableDiGraph<ComponentInfo, ComponentDependency>,
    monotonic: HashMap<Id, bool>,
}

impl ComponentGraph {
    /// Computes the component graph of a dependency graph.
    ///
    /// Components are numbered such that dependencies come first.
    pub fn new(depgraph: &DependencyGraph, registry: &Registry) -> Result<Self, Error> {
        log::info!("[Start] creating component graph");
        let dg = depgraph.graph();
        let mut result = Self::default();
        for node in dg.node_indices() {
            let id = dg[node].id;
            if id.is_external_atom() {
                result.monotonic.insert(id, registry.is_monotonic(id)?);
            }
        }

        let sccs = tarjan_scc(dg);
        let mut component_of: HashMap<NodeIndex, Component> = HashMap::new();
        let mut members: Vec<(Component, Vec<NodeIndex>)> = Vec::new();
        for scc in sccs {
            if !scc.iter().any(|node| !dg[*node].id.is_ordinary_atom()) {
                continue;
            }
            let info = result.classify(depgraph, &scc);
            let component = result.graph.add_node(info);
            log::debug!("component {}: {}", component.index(), result.graph[component]);
            scc.iter().for_each(|node| {
                component_of.insert(*node, component);
            });
            members.push((component, scc));
        }

        for (component, nodes) in members.iter() {
            let node_set: HashSet<NodeIndex> = nodes.iter().copied().collect();
            let usage = |atom: NodeIndex| {
                let mut result = ComponentDependency::default();
                dg.edges_directed(atom, Direction::Incoming)
                    .filter(|edge| node_set.contains(&edge.source()) && dg[edge.source()].id.is_rule())
                    .for_each(|edge| {
                        let info = edge.weight();
                        result.positive_constraint |= info.positive && info.constraint;
                        result.positive_regular_rule |= info.positive && !info.constraint;
                        result.negative_rule |= info.negative;
                    });
                result
            };
            let mut outgoing: BTreeMap<Component, ComponentDependency> = BTreeMap::new();
            for node in nodes {
                for edge in dg.edges_directed(*node, Direction::Outgoing) {
                    if node_set.contains(&edge.target()) {
                        continue;
                    }
                    let flags = ComponentDependency::from_hop(
                        depgraph,
                        *node,
                        edge.target(),
                        edge.weight(),
                        &usage,
                    );
                    for target in bridged_targets(depgraph, edge.target(), &component_of) {
                        *outgoing.entry(target).or_default() |= flags;
                    }
                }
            }
            for (target, flags) in outgoing {
                debug_assert!(
                    !flags.is_internal_only(),
                    "unifying head and disjunctive dependencies never cross components"
                );
                result.graph.add_edge(*component, target, flags);
            }
        }
        log::info!(
            "[Done] component graph with {} components and {} dependencies",
            result.graph.node_count(),
            result.graph.edge_count()
        );
        Ok(result)
    }

    fn classify(&self, depgraph: &DependencyGraph, scc: &[NodeIndex]) -> ComponentInfo {
        let dg = depgraph.graph();
        let mut info = ComponentInfo::default();
        let lone_eatom = scc.len() == 1 && dg[scc[0]].id.is_external_atom();
        for node in scc {
            let id = dg[*node].id;
            if id.is_constraint() {
                info.inner_constraints.push(id);
            } else if id.is_rule() {
                info.inner_rules.push(id);
                info.disjunctive_heads |= id.is_disjunctive();
            } else if id.is_external_atom() {
                let nonmonotonic = !self.is_monotonic(id);
                if lone_eatom {
                    info.outer_eatoms.push(id);
                    info.outer_eatoms_nonmonotonic |= nonmonotonic;
                } else {
                    info.inner_eatoms.push(id);
                    info.inner_eatoms_nonmonotonic |= nonmonotonic;
                }
            }
        }
        info.inner_rules.sort_by_key(|id| id.address);
        info.inner_constraints.sort_by_key(|id| id.address);
        info.inner_eatoms.sort_by_key(|id| id.address);

        let mut negative_cycle = false;
        for node in scc {
            for edge in dg.edges_directed(*node, Direction::Outgoing) {
                if !scc.contains(&edge.target()) || !edge.weight().negative {
                    continue;
                }
                negative_cycle = true;
                if dg[edge.target()].id.is_ordinary_atom() {
                    info.negative_dependency_between_rules = true;
                }
            }
        }
        info.inner_eatoms_monotonic_and_only_positive_cycles =
            !info.inner_eatoms_nonmonotonic && !negative_cycle;
        info
    }

    fn is_monotonic(&self, eatom: Id) -> bool {
        self.monotonic.get(&eatom).copied().unwrap_or(false)
    }

    /// Direct access to the underlying graph.
    pub fn graph(&self) -> &StableDiGraph<ComponentInfo, ComponentDependency> {
        &self.graph
    }

    /// All components in ascending index order.
    pub fn components(&self) -> Vec<Component> {
        self.graph.node_indices().collect()
    }

    /// Returns the contents of a component.
    pub fn component_info(&self, component: Component) -> &ComponentInfo {
        &self.graph[component]
    }

    /// Checks whether the component exists.
    pub fn contains(&self, component: Component) -> bool {
        self.graph.contains_node(component)
    }

    /// Returns the components the given component depends on, together with the flags.
    pub fn dependencies(&self, component: Component) -> Vec<(Component, ComponentDependency)> {
        let mut result: Vec<(Component, ComponentDependency)> = self
            .graph
            .edges_directed(component, Direction::Outgoing)
            .map(|edge| (edge.target(), *edge.weight()))
            .collect();
        result.sort_by_key(|(target, _)| *target);
        result
    }

    /// Returns the components which depend on the given component.
    pub fn dependents(&self, component: Component) -> Vec<Component> {
        let mut result: Vec<Component> = self
            .graph
            .neighbors_directed(component, Direction::Incoming)
            .collect();
        result.sort();
        result
    }

    /// Returns the flags of the dependency `from -> to`.
    pub fn dependency(&self, from: Component, to: Component) -> Option<ComponentDependency> {
        self.graph
            .find_edge(from, to)
            .map(|edge| self.graph[edge])
    }

    /// All components the given component depends on, directly or transitively.
    pub fn transitive_dependencies(&self, component: Component) -> BTreeSet<Component> {
        let mut result: BTreeSet<Component> = Dfs::new(&self.graph, component)
            .iter(&self.graph)
            .collect();
        result.remove(&component);
        result
    }

    /// Returns all components ordered such that every component comes after its dependencies.
    pub fn topological_order(&self) -> Result<Vec<Component>, Error> {
        let mut order = toposort(&self.graph, None).map_err(|cycle| {
            Error::Structure(format!(
                "component graph has a cycle through component {}",
                cycle.node_id().index()
            ))
        })?;
        order.reverse();
        Ok(order)
    }

    /// Merges the given components into one new component and returns it.
    ///
    /// Dependencies of the members on other components are merged, dependencies between
    /// the members vanish. Outer external atoms of a member which depends on another member
    /// become inner external atoms of the new component.
    ///
    /// Returns [Error::CollapseCycle] without changing the graph if the new component would
    /// be on a cycle.
    pub fn collapse_components(&mut self, components: &[Component]) -> Result<Component, Error> {
        if components.is_empty() {
            return Err(Error::Structure("cannot collapse an empty set of components".to_string()));
        }
        if let Some(missing) = components.iter().find(|comp| !self.graph.contains_node(**comp)) {
            return Err(Error::Structure(format!(
                "cannot collapse unknown component {}",
                missing.index()
            )));
        }
        let set: BTreeSet<Component> = components.iter().copied().collect();
        let mut outgoing: BTreeMap<Component, ComponentDependency> = BTreeMap::new();
        let mut incoming: BTreeMap<Component, ComponentDependency> = BTreeMap::new();
        let mut internally_depends: HashSet<Component> = HashSet::new();
        let mut internal_negative = false;
        for member in set.iter() {
            for edge in self.graph.edges_directed(*member, Direction::Outgoing) {
                if set.contains(&edge.target()) {
                    internally_depends.insert(*member);
                    internal_negative |= edge.weight().negative_rule;
                } else {
                    *outgoing.entry(edge.target()).or_default() |= *edge.weight();
                }
            }
            for edge in self.graph.edges_directed(*member, Direction::Incoming) {
                if !set.contains(&edge.source()) {
                    *incoming.entry(edge.source()).or_default() |= *edge.weight();
                }
            }
        }
        if let Some(via) = self.cycle_through(&set, outgoing.keys()) {
            return Err(Error::CollapseCycle {
                members: set.iter().map(|comp| comp.index()).collect(),
                via: via.index(),
            });
        }

        let mut info = ComponentInfo {
            negative_dependency_between_rules: internal_negative,
            ..Default::default()
        };
        let mut promoted_nonmonotonic = false;
        for member in set.iter() {
            let member_info = &self.graph[*member];
            info.inner_rules.extend_from_slice(&member_info.inner_rules);
            info.inner_constraints
                .extend_from_slice(&member_info.inner_constraints);
            info.inner_eatoms.extend_from_slice(&member_info.inner_eatoms);
            info.disjunctive_heads |= member_info.disjunctive_heads;
            info.negative_dependency_between_rules |= member_info.negative_dependency_between_rules;
            info.inner_eatoms_nonmonotonic |= member_info.inner_eatoms_nonmonotonic;
            info.inner_eatoms_monotonic_and_only_positive_cycles &=
                member_info.inner_eatoms_monotonic_and_only_positive_cycles;
            if internally_depends.contains(member) {
                for eatom in member_info.outer_eatoms.iter() {
                    let nonmonotonic = !self.is_monotonic(*eatom);
                    promoted_nonmonotonic |= nonmonotonic;
                    info.inner_eatoms_nonmonotonic |= nonmonotonic;
                    info.inner_eatoms.push(*eatom);
                }
            } else {
                for eatom in member_info.outer_eatoms.iter() {
                    info.outer_eatoms_nonmonotonic |= !self.is_monotonic(*eatom);
                    info.outer_eatoms.push(*eatom);
                }
            }
        }
        info.inner_eatoms_monotonic_and_only_positive_cycles &= !promoted_nonmonotonic;

        let result = self.graph.add_node(info);
        for (target, flags) in outgoing {
            self.graph.add_edge(result, target, flags);
        }
        for (source, flags) in incoming {
            self.graph.add_edge(source, result, flags);
        }
        for member in set.iter() {
            self.graph.remove_node(*member);
        }
        log::debug!(
            "collapsed components {:?} into {}: {}",
            set.iter().map(|comp| comp.index()).collect::<Vec<_>>(),
            result.index(),
            self.graph[result]
        );
        Ok(result)
    }

    /// Searches a path from one of the `starts` back into `members`.
    /// Returns the last component outside of `members` on such a path.
    fn cycle_through<'a>(
        &self,
        members: &BTreeSet<Component>,
        starts: impl Iterator<Item = &'a Component>,
    ) -> Option<Component> {
        let mut visited: HashSet<Component> = HashSet::new();
        let mut stack: Vec<Component> = starts.copied().collect();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if members.contains(&next) {
                    return Some(current);
                }
                stack.push(next);
            }
        }
        None
    }

    /// Renders the graph in the graphviz dot language.
    pub fn to_dot(&self, registry: &Registry) -> String {
        format!(
            "{}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &|_, edge| format!("label=\"{}\"", edge.weight()),
                &|_, (component, info)| {
                    let rules = info
                        .inner_rules
                        .iter()
                        .chain(info.inner_constraints.iter())
                        .map(|rule| registry.rule_to_string(*rule))
                        .chain(
                            info.inner_eatoms
                                .iter()
                                .map(|eatom| format!("inner {}", registry.atom_to_string(*eatom))),
                        )
                        .chain(
                            info.outer_eatoms
                                .iter()
                                .map(|eatom| format!("outer {}", registry.atom_to_string(*eatom))),
                        )
                        .collect::<Vec<_>>()
                        .join("\\n");
                    format!("label=\"{}:\\n{}\" shape=box", component.index(), rules)
                },
            )
        )
    }

    /// Creates a graph from explicit contents, used to exercise heuristics and collapsing
    /// without a program.
    #[cfg(test)]
    pub(crate) fn from_parts(
        components: Vec<ComponentInfo>,
        dependencies: &[(usize, usize, ComponentDependency)],
    ) -> Self {
        let mut result = Self::default();
        let nodes: Vec<Component> = components
            .into_iter()
            .map(|info| result.graph.add_node(info))
            .collect();
        for (from, to, flags) in dependencies {
            result.graph.add_edge(nodes[*from], nodes[*to], *flags);
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn set_monotonic(&mut self, eatom: Id, monotonic: bool) {
        self.monotonic.insert(eatom, monotonic);
    }
}

/// Follows dependencies through transparent (atom-only) nodes until nodes of components are
/// reached.
fn bridged_targets(
    depgraph: &DependencyGraph,
    start: NodeIndex,
    component_of: &HashMap<NodeIndex, Component>,
) -> BTreeSet<Component> {
    let mut result = BTreeSet::new();
    let mut visited = HashSet::new();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        match component_of.get(&node) {
            Some(component) => {
                result.insert(*component);
            }
            None => stack.extend(depgraph.dependencies(node).map(|(target, _)| target)),
        }
    }
    result
}
