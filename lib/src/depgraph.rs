/*!
The dependency graph relates rules, ordinary atoms, and external atom call sites.

An edge `a -> b` states that `a` depends on `b`. There is at most one edge per ordered pair of
nodes, adding another dependency between the same pair merges the [flags][DependencyInfo].

Edges are created as follows:
- every head atom depends on its rule (positive),
- atoms in the same head depend on each other (disjunctive),
- a rule depends on its body atoms (positive or negative, external atoms by monotonicity),
- a body atom depends on every head atom it unifies with, unifying head atoms depend on each other,
- rules with unifying heads depend on each other,
- an external atom depends on every head atom whose predicate is one of its predicate inputs,
- an external atom depends on the positive body literals binding its constant input variables.

For the last kind an auxiliary input rule is synthesized, which collects the bindings of the
input variables. These rules are named `aux_i_<rule>_<eatom>` and are reported to the caller.
*/
use crate::{
    datatypes::{Id, Literal, OrdinaryAtom, Registry, Rule, Term},
    error::Error,
    sources::InputType,
};
use petgraph::{
    dot::{Config, Dot},
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
    Direction,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display, ops::BitOrAssign};

/// Node of the [DependencyGraph].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    /// The rule, ordinary atom, or external atom of the node.
    pub id: Id,
    /// The (ordinary) atom occurs in some rule body.
    pub in_body: bool,
    /// The (ordinary) atom occurs in some rule head.
    pub in_head: bool,
}

impl Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Flags of an edge of the [DependencyGraph].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// Positive dependency.
    pub positive: bool,
    /// Dependency through default negation (or on a non-monotonic external atom).
    pub negative: bool,
    /// Dependency of an external atom on its input.
    pub external: bool,
    /// Sub-flag of `external`: the dependency binds a constant input.
    pub external_constant_input: bool,
    /// Sub-flag of `external`: the dependency provides a predicate input.
    pub external_predicate_input: bool,
    /// The edge touches a rule node.
    pub involves_rule: bool,
    /// Sub-flag of `involves_rule`: the rule is a constraint.
    pub constraint: bool,
    /// The connected atoms (or rule heads) unify.
    pub unifying: bool,
    /// The connected atoms occur in a common disjunctive head.
    pub disjunctive: bool,
}

impl BitOrAssign for DependencyInfo {
    fn bitor_assign(&mut self, rhs: Self) {
        self.positive |= rhs.positive;
        self.negative |= rhs.negative;
        self.external |= rhs.external;
        self.external_constant_input |= rhs.external_constant_input;
        self.external_predicate_input |= rhs.external_predicate_input;
        self.involves_rule |= rhs.involves_rule;
        self.constraint |= rhs.constraint;
        self.unifying |= rhs.unifying;
        self.disjunctive |= rhs.disjunctive;
    }
}

impl Display for DependencyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags = [
            (self.positive, "pos"),
            (self.negative, "neg"),
            (self.external, "ext"),
            (self.external_constant_input, "cin"),
            (self.external_predicate_input, "pin"),
            (self.involves_rule, "rule"),
            (self.constraint, "cons"),
            (self.unifying, "unif"),
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

impl DependencyInfo {
    fn head_rule() -> Self {
        Self {
            positive: true,
            involves_rule: true,
            ..Default::default()
        }
    }

    fn external_input(constant: bool) -> Self {
        Self {
            positive: true,
            external: true,
            external_constant_input: constant,
            external_predicate_input: !constant,
            ..Default::default()
        }
    }
}

/// A request for an auxiliary input rule, collected while creating rule/body dependencies.
#[derive(Debug)]
struct AuxiliaryRequest {
    rule: Id,
    eatom: Id,
    variables: Vec<String>,
    literals: Vec<Literal>,
    nonmonotonic: bool,
}

/// Dependency graph over rules, atoms, and external atoms.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<NodeInfo, DependencyInfo>,
    nodes: HashMap<Id, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the dependency graph of the given rules.
    ///
    /// Auxiliary input rules are stored in the registry and become part of the graph; their
    /// [Ids][Id] are returned next to the graph.
    pub fn new(registry: &mut Registry, rules: &[Id]) -> Result<(Self, Vec<Id>), Error> {
        log::info!("[Start] creating dependency graph of {} rules", rules.len());
        let mut result = Self::default();
        let mut requests = Vec::new();
        for rule in rules {
            result.create_node(*rule, false, false);
            result.create_head_dependencies(registry, *rule);
            result.create_body_dependencies(registry, *rule, &mut requests)?;
        }
        result.create_unifying_dependencies(registry);
        result.create_head_sharing_dependencies(registry, rules);
        result.create_external_predicate_input_dependencies(registry)?;
        let auxiliary = result.create_auxiliary_rules(registry, requests)?;
        log::info!(
            "[Done] dependency graph with {} nodes and {} edges ({} auxiliary rules)",
            result.graph.node_count(),
            result.graph.edge_count(),
            auxiliary.len()
        );
        Ok((result, auxiliary))
    }

    /// Direct access to the underlying graph.
    pub fn graph(&self) -> &DiGraph<NodeInfo, DependencyInfo> {
        &self.graph
    }

    /// Returns the node of the rule or atom.
    pub fn node(&self, id: Id) -> Option<NodeIndex> {
        self.nodes.get(&id).copied()
    }

    /// Returns the node information.
    pub fn node_info(&self, node: NodeIndex) -> &NodeInfo {
        &self.graph[node]
    }

    /// Returns the flags of the edge `from -> to`, if the dependency exists.
    pub fn dependency(&self, from: Id, to: Id) -> Option<DependencyInfo> {
        let from = self.node(from)?;
        let to = self.node(to)?;
        self.graph.find_edge(from, to).map(|edge| self.graph[edge])
    }

    /// Iterates over the dependencies of a node.
    pub fn dependencies(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, DependencyInfo)> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.target(), *edge.weight()))
    }

    /// Renders the graph in the graphviz dot language.
    pub fn to_dot(&self, registry: &Registry) -> String {
        format!(
            "{}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &|_, edge| format!("label=\"{}\"", edge.weight()),
                &|_, (_, info)| {
                    if info.id.is_rule() {
                        format!("label=\"{}\" shape=box", registry.rule_to_string(info.id))
                    } else {
                        format!("label=\"{}\"", registry.atom_to_string(info.id))
                    }
                },
            )
        )
    }

    fn create_node(&mut self, id: Id, in_body: bool, in_head: bool) -> NodeIndex {
        let node = match self.nodes.get(&id) {
            Some(node) => *node,
            None => {
                let node = self.graph.add_node(NodeInfo {
                    id,
                    in_body: false,
                    in_head: false,
                });
                self.nodes.insert(id, node);
                node
            }
        };
        let info = &mut self.graph[node];
        info.in_body |= in_body;
        info.in_head |= in_head;
        node
    }

    fn add_dependency(&mut self, from: NodeIndex, to: NodeIndex, info: DependencyInfo) {
        debug_assert!(
            info.involves_rule
                == (self.graph[from].id.is_rule() || self.graph[to].id.is_rule()),
            "an edge touches a rule node if and only if it involves a rule"
        );
        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph[edge] |= info,
            None => {
                self.graph.add_edge(from, to, info);
            }
        }
    }

    fn create_head_dependencies(&mut self, registry: &Registry, rule: Id) {
        let rule_node = self.create_node(rule, false, false);
        let heads: Vec<NodeIndex> = registry
            .head(rule)
            .iter()
            .map(|atom| self.create_node(*atom, false, true))
            .collect();
        for (idx, head) in heads.iter().enumerate() {
            self.add_dependency(*head, rule_node, DependencyInfo::head_rule());
            for other in heads.iter().skip(idx + 1) {
                let disjunctive = DependencyInfo {
                    disjunctive: true,
                    ..Default::default()
                };
                self.add_dependency(*head, *other, disjunctive);
                self.add_dependency(*other, *head, disjunctive);
            }
        }
    }

    fn create_body_dependencies(
        &mut self,
        registry: &Registry,
        rule: Id,
        requests: &mut Vec<AuxiliaryRequest>,
    ) -> Result<(), Error> {
        let rule_node = self.create_node(rule, false, false);
        for lit in registry.body(rule) {
            let mut info = DependencyInfo {
                involves_rule: true,
                constraint: rule.is_constraint(),
                ..Default::default()
            };
            if lit.atom.is_external_atom() {
                let monotonic = registry.is_monotonic(lit.atom)?;
                info.positive = !monotonic || !lit.naf;
                info.negative = !monotonic || lit.naf;
                let node = self.create_node(lit.atom, true, false);
                self.add_dependency(rule_node, node, info);
                if let Some(request) = constant_input_request(registry, rule, lit.atom, monotonic)? {
                    requests.push(request);
                }
            } else {
                info.positive = !lit.naf;
                info.negative = lit.naf;
                let node = self.create_node(lit.atom, true, false);
                self.add_dependency(rule_node, node, info);
            }
        }
        Ok(())
    }

    fn create_unifying_dependencies(&mut self, registry: &Registry) {
        let atoms: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|node| self.graph[*node].id.is_ordinary_atom())
            .collect();
        for (idx, left) in atoms.iter().enumerate() {
            for right in atoms.iter().skip(idx + 1) {
                let (l, r) = (self.graph[*left], self.graph[*right]);
                if !(l.in_head || r.in_head) || !registry.unifies(l.id, r.id) {
                    continue;
                }
                let unifying = DependencyInfo {
                    unifying: true,
                    ..Default::default()
                };
                if l.in_head {
                    self.add_dependency(*right, *left, unifying);
                }
                if r.in_head {
                    self.add_dependency(*left, *right, unifying);
                }
            }
        }
    }

    fn create_head_sharing_dependencies(&mut self, registry: &Registry, rules: &[Id]) {
        for (idx, left) in rules.iter().enumerate() {
            for right in rules.iter().skip(idx + 1) {
                let shared = registry.head(*left).iter().any(|l| {
                    registry
                        .head(*right)
                        .iter()
                        .any(|r| l == r || registry.unifies(*l, *r))
                });
                if !shared {
                    continue;
                }
                let info = DependencyInfo {
                    involves_rule: true,
                    unifying: true,
                    disjunctive: left.is_disjunctive() || right.is_disjunctive(),
                    ..Default::default()
                };
                let (l, r) = (self.create_node(*left, false, false), self.create_node(*right, false, false));
                self.add_dependency(l, r, info);
                self.add_dependency(r, l, info);
            }
        }
    }

    fn create_external_predicate_input_dependencies(&mut self, registry: &Registry) -> Result<(), Error> {
        let eatoms: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|node| self.graph[*node].id.is_external_atom())
            .collect();
        let heads: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|node| self.graph[*node].in_head)
            .collect();
        for eatom_node in eatoms {
            let eatom = self.graph[eatom_node].id;
            let source = registry.source_of(eatom)?;
            let predicates: Vec<&str> = source
                .input_types()
                .iter()
                .zip(registry.external_atom(eatom).inputs.iter())
                .filter(|(ty, _)| **ty == InputType::Predicate)
                .map(|(_, term)| term.name())
                .collect();
            for head in heads.iter() {
                if predicates.contains(&registry.ordinary_atom(self.graph[*head].id).predicate.as_str()) {
                    self.add_dependency(eatom_node, *head, DependencyInfo::external_input(false));
                }
            }
        }
        Ok(())
    }

    fn create_auxiliary_rules(
        &mut self,
        registry: &mut Registry,
        requests: Vec<AuxiliaryRequest>,
    ) -> Result<Vec<Id>, Error> {
        let mut result = Vec::new();
        for request in requests {
            let rule_node = self.create_node(request.rule, false, false);
            let eatom_node = self.create_node(request.eatom, true, false);
            if request.nonmonotonic {
                self.add_dependency(
                    rule_node,
                    eatom_node,
                    DependencyInfo {
                        negative: true,
                        involves_rule: true,
                        constraint: request.rule.is_constraint(),
                        ..Default::default()
                    },
                );
            }
            for lit in request.literals.iter() {
                let node = self.create_node(lit.atom, true, false);
                self.add_dependency(eatom_node, node, DependencyInfo::external_input(true));
            }
            let predicate = format!("aux_i_{}_{}", request.rule, request.eatom);
            registry.mark_auxiliary(&predicate);
            let head = registry.store_ordinary_atom(OrdinaryAtom {
                predicate,
                args: request.variables.into_iter().map(Term::Variable).collect(),
            });
            let aux = registry.store_rule(Rule {
                head: vec![head],
                body: request.literals,
            })?;
            log::debug!("created auxiliary input rule {}", registry.rule_to_string(aux));
            self.create_head_dependencies(registry, aux);
            let aux_node = self.create_node(aux, false, false);
            for lit in registry.body(aux).to_vec() {
                let node = self.create_node(lit.atom, true, false);
                self.add_dependency(
                    aux_node,
                    node,
                    DependencyInfo {
                        positive: true,
                        involves_rule: true,
                        ..Default::default()
                    },
                );
            }
            let head_node = self.create_node(head, false, true);
            self.add_dependency(eatom_node, head_node, DependencyInfo::external_input(true));
            result.push(aux);
        }
        Ok(result)
    }
}

/// Collects the positive ordinary body literals which bind the constant input variables of
/// the external atom in the rule.
fn constant_input_request(
    registry: &Registry,
    rule: Id,
    eatom: Id,
    monotonic: bool,
) -> Result<Option<AuxiliaryRequest>, Error> {
    let source = registry.source_of(eatom)?;
    let external = registry.external_atom(eatom);
    let mut variables: Vec<String> = Vec::new();
    source
        .input_types()
        .iter()
        .zip(external.inputs.iter())
        .filter(|(ty, term)| **ty == InputType::Constant && term.is_variable())
        .for_each(|(_, term)| {
            if !variables.iter().any(|var| var == term.name()) {
                variables.push(term.name().to_string());
            }
        });
    if variables.is_empty() {
        return Ok(None);
    }
    let mut literals: Vec<Literal> = Vec::new();
    for var in variables.iter() {
        let binding: Vec<Literal> = registry
            .body(rule)
            .iter()
            .filter(|lit| {
                !lit.naf
                    && lit.atom.is_ordinary_atom()
                    && registry.ordinary_atom(lit.atom).variables().any(|v| v == var)
            })
            .copied()
            .collect();
        if binding.is_empty() {
            return Err(Error::MalformedProgram(format!(
                "input variable {} of {} in rule {} is not bound by a positive ordinary body literal",
                var,
                external,
                registry.rule_to_string(rule)
            )));
        }
        for lit in binding {
            if !literals.contains(&lit) {
                literals.push(lit);
            }
        }
    }
    Ok(Some(AuxiliaryRequest {
        rule,
        eatom,
        variables,
        literals,
        nonmonotonic: !monotonic,
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datatypes::{ExternalAtom, Program};
    use test_log::test;

    fn setup(json: &str) -> (Registry, Vec<Id>) {
        let mut registry = Registry::with_builtin_sources();
        let rules = Program::from_json(json).unwrap().store(&mut registry).unwrap();
        (registry, rules)
    }

    fn atom(registry: &mut Registry, predicate: &str, args: &[&str]) -> Id {
        registry.store_ordinary_atom(OrdinaryAtom::new(predicate, args))
    }

    #[test]
    fn head_body_and_unifying() {
        let (mut registry, rules) = setup(
            r#"{"rules": [
                {"head": [{"predicate": "p", "args": ["a"]}]},
                {"head": [{"predicate": "q", "args": ["X"]}], "body": [{"atom": {"predicate": "p", "args": ["X"]}}]},
                {"head": [{"predicate": "r"}, {"predicate": "s"}], "body": [{"naf": true, "atom": {"predicate": "q", "args": ["b"]}}]},
                {"body": [{"atom": {"predicate": "r"}}]}
            ]}"#,
        );
        let (graph, auxiliary) = DependencyGraph::new(&mut registry, &rules).unwrap();
        assert!(auxiliary.is_empty());
        let pa = atom(&mut registry, "p", &["a"]);
        let px = atom(&mut registry, "p", &["X"]);
        let qx = atom(&mut registry, "q", &["X"]);
        let qb = atom(&mut registry, "q", &["b"]);
        let r = atom(&mut registry, "r", &[]);
        let s = atom(&mut registry, "s", &[]);

        let head = graph.dependency(pa, rules[0]).unwrap();
        assert!(head.positive && head.involves_rule && !head.negative);
        let body = graph.dependency(rules[1], px).unwrap();
        assert!(body.positive && body.involves_rule && !body.constraint);
        // body atom depends on the unifying head atom, not the other way around
        assert!(graph.dependency(px, pa).unwrap().unifying);
        assert!(graph.dependency(pa, px).is_none());
        // q(b) is a body occurrence, q(X) a head occurrence
        assert!(graph.dependency(qb, qx).unwrap().unifying);
        let naf = graph.dependency(rules[2], qb).unwrap();
        assert!(naf.negative && !naf.positive);
        assert!(graph.dependency(r, s).unwrap().disjunctive);
        assert!(graph.dependency(s, r).unwrap().disjunctive);
        let cons = graph.dependency(rules[3], r).unwrap();
        assert!(cons.constraint && cons.positive && cons.involves_rule);
        assert!(!graph.node_info(graph.node(pa).unwrap()).in_body);
        assert!(graph.node_info(graph.node(px).unwrap()).in_body);
    }

    #[test]
    fn head_sharing_rules() {
        let (mut registry, rules) = setup(
            r#"{"rules": [
                {"head": [{"predicate": "a"}, {"predicate": "b"}]},
                {"head": [{"predicate": "a"}], "body": [{"atom": {"predicate": "b"}}]},
                {"head": [{"predicate": "c"}]}
            ]}"#,
        );
        let (graph, _) = DependencyGraph::new(&mut registry, &rules).unwrap();
        let shared = graph.dependency(rules[0], rules[1]).unwrap();
        assert!(shared.unifying && shared.disjunctive && shared.involves_rule);
        assert_eq!(graph.dependency(rules[1], rules[0]), Some(shared));
        assert!(graph.dependency(rules[0], rules[2]).is_none());
    }

    #[test]
    fn external_dependencies() {
        let mut registry = Registry::with_builtin_sources();
        let num_x = atom(&mut registry, "num", &["X"]);
        let num_1 = atom(&mut registry, "num", &["1"]);
        let small_x = atom(&mut registry, "small", &["X"]);
        let big_x = atom(&mut registry, "big", &["X"]);
        let fact = registry
            .store_rule(Rule {
                head: vec![num_1],
                body: vec![],
            })
            .unwrap();
        let lt = registry
            .store_external_atom(ExternalAtom {
                name: "lt".to_string(),
                inputs: vec![Term::from("X"), Term::from("5")],
                outputs: vec![],
            })
            .unwrap();
        let small = registry
            .store_rule(Rule {
                head: vec![small_x],
                body: vec![Literal::positive(num_x), Literal::positive(lt)],
            })
            .unwrap();
        let minus = registry
            .store_external_atom(ExternalAtom {
                name: "setminus".to_string(),
                inputs: vec![Term::from("num"), Term::from("small")],
                outputs: vec![Term::from("X")],
            })
            .unwrap();
        let big = registry
            .store_rule(Rule {
                head: vec![big_x],
                body: vec![Literal::positive(minus)],
            })
            .unwrap();
        let rules = vec![fact, small, big];
        let (graph, auxiliary) = DependencyGraph::new(&mut registry, &rules).unwrap();

        // monotonic positive external atom
        let to_lt = graph.dependency(small, lt).unwrap();
        assert!(to_lt.positive && !to_lt.negative);
        // non-monotonic external atom
        let to_minus = graph.dependency(big, minus).unwrap();
        assert!(to_minus.positive && to_minus.negative);
        // predicate inputs
        let pin = graph.dependency(minus, num_1).unwrap();
        assert!(pin.external && pin.external_predicate_input);
        assert!(graph.dependency(minus, small_x).unwrap().external_predicate_input);
        assert!(graph.dependency(minus, big_x).is_none());
        // constant input
        let cin = graph.dependency(lt, num_x).unwrap();
        assert!(cin.external && cin.external_constant_input);
        assert_eq!(auxiliary.len(), 1);
        let aux = auxiliary[0];
        assert_eq!(
            registry.rule_to_string(aux),
            format!("aux_i_{}_{}(X) :- num(X).", small, lt)
        );
        let aux_head = registry.head(aux)[0];
        assert!(registry.is_auxiliary(&registry.ordinary_atom(aux_head).predicate));
        assert!(graph.dependency(lt, aux_head).unwrap().external_constant_input);
        assert!(graph.dependency(aux_head, aux).unwrap().involves_rule);
        assert!(graph.dependency(aux, num_x).unwrap().positive);
        assert!(graph.to_dot(&registry).contains("digraph"));
    }

    #[test]
    fn unbound_constant_input() {
        let mut registry = Registry::with_builtin_sources();
        let p = atom(&mut registry, "p", &["X"]);
        let q = atom(&mut registry, "q", &["X"]);
        let lt = registry
            .store_external_atom(ExternalAtom {
                name: "lt".to_string(),
                inputs: vec![Term::from("X"), Term::from("5")],
                outputs: vec![],
            })
            .unwrap();
        let rule = registry
            .store_rule(Rule {
                head: vec![p],
                body: vec![Literal::negative(q), Literal::positive(lt)],
            })
            .unwrap();
        assert!(matches!(
            DependencyGraph::new(&mut registry, &[rule]),
            Err(Error::MalformedProgram(_))
        ));
    }
}
