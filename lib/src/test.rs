use crate::{
    builder::{ModelBuilderConfig, OnlineModelBuilder},
    compgraph::ComponentGraph,
    datatypes::{Program, Registry},
    depgraph::DependencyGraph,
    error::Error,
    evalgraph::{builder::EvalGraphBuilder, heuristics::Heuristic},
    modelgen::FactoryKind,
    naive::NaiveBackend,
};
use std::rc::Rc;
use test_log::test;

const FACTS: &str = r#"{"rules": [
    {"head": [{"predicate": "p", "args": ["a"]}]},
    {"head": [{"predicate": "p", "args": ["b"]}]},
    {"head": [{"predicate": "q", "args": ["X"]}],
     "body": [{"atom": {"predicate": "p", "args": ["X"]}}]}
]}"#;

fn answer_sets(
    input: &str,
    heuristic: Heuristic<'_>,
    config: ModelBuilderConfig,
) -> Result<Vec<String>, Error> {
    let mut registry = Registry::with_builtin_sources();
    let rules = Program::from_json(input)?.store(&mut registry)?;
    let (depgraph, _) = DependencyGraph::new(&mut registry, &rules)?;
    let compgraph = ComponentGraph::new(&depgraph, &registry)?;
    let registry = Rc::new(registry);
    let mut builder =
        EvalGraphBuilder::new(compgraph, Rc::new(NaiveBackend::new(registry.clone())));
    heuristic.build(&mut builder)?;
    let final_unit = builder.finalize()?;
    let mut models = OnlineModelBuilder::new(builder.into_eval_graph(), config);
    let mut result: Vec<String> = models
        .answer_sets(final_unit, None)?
        .iter()
        .map(|answer_set| answer_set.printable(&registry).to_string())
        .collect();
    result.sort();
    Ok(result)
}

fn all_configs() -> Vec<ModelBuilderConfig> {
    let mut result = Vec::new();
    for redundancy_elimination in [true, false] {
        for constant_space in [true, false] {
            result.push(ModelBuilderConfig {
                redundancy_elimination,
                constant_space,
            });
        }
    }
    result
}

#[test]
fn facts_and_projection() {
    for heuristic in [
        Heuristic::Trivial,
        Heuristic::Monolithic,
        Heuristic::Easy,
        Heuristic::Greedy,
    ] {
        for config in all_configs() {
            assert_eq!(
                answer_sets(FACTS, heuristic, config).unwrap(),
                vec!["{p(a),p(b),q(a),q(b)}"],
                "{:?} {:?}",
                heuristic,
                config
            );
        }
    }
}

#[test]
fn guesses_are_joined() {
    // two independent choices, combined by a rule
    let input = r#"{"rules": [
        {"head": [{"predicate": "a"}], "body": [{"naf": true, "atom": {"predicate": "b"}}]},
        {"head": [{"predicate": "b"}], "body": [{"naf": true, "atom": {"predicate": "a"}}]},
        {"head": [{"predicate": "c"}], "body": [{"naf": true, "atom": {"predicate": "d"}}]},
        {"head": [{"predicate": "d"}], "body": [{"naf": true, "atom": {"predicate": "c"}}]},
        {"head": [{"predicate": "e"}], "body": [
            {"atom": {"predicate": "a"}}, {"atom": {"predicate": "c"}}
        ]},
        {"head": [], "body": [{"atom": {"predicate": "b"}}, {"atom": {"predicate": "d"}}]}
    ]}"#;
    let expected = vec!["{a,c,e}", "{a,d}", "{b,c}"];
    for heuristic in [Heuristic::Trivial, Heuristic::Monolithic, Heuristic::Greedy] {
        for config in all_configs() {
            assert_eq!(answer_sets(input, heuristic, config).unwrap(), expected);
        }
    }
}

#[test]
fn external_atoms() {
    // q(X) :- &setminus[p, r](X).   with p(a), p(b), r(b)
    // s(X) :- &id[q](X), p(X).
    let input = r#"{"rules": [
        {"head": [{"predicate": "p", "args": ["a"]}]},
        {"head": [{"predicate": "p", "args": ["b"]}]},
        {"head": [{"predicate": "r", "args": ["b"]}]},
        {"head": [{"predicate": "q", "args": ["X"]}], "body": [
            {"external": {"name": "setminus", "inputs": ["p", "r"], "outputs": ["X"]}}
        ]},
        {"head": [{"predicate": "s", "args": ["X"]}], "body": [
            {"external": {"name": "id", "inputs": ["q"], "outputs": ["X"]}},
            {"atom": {"predicate": "p", "args": ["X"]}}
        ]}
    ]}"#;
    for heuristic in [
        Heuristic::Trivial,
        Heuristic::Monolithic,
        Heuristic::Easy,
        Heuristic::Greedy,
    ] {
        assert_eq!(
            answer_sets(input, heuristic, ModelBuilderConfig::default()).unwrap(),
            vec!["{p(a),p(b),q(a),r(b),s(a)}"]
        );
    }
}

#[test]
fn constant_inputs_are_hidden() {
    // small(X) :- n(X), &lt[X, 3]().
    let input = r#"{"rules": [
        {"head": [{"predicate": "n", "args": ["1"]}]},
        {"head": [{"predicate": "n", "args": ["5"]}]},
        {"head": [{"predicate": "small", "args": ["X"]}], "body": [
            {"atom": {"predicate": "n", "args": ["X"]}},
            {"external": {"name": "lt", "inputs": ["X", "3"], "outputs": []}}
        ]}
    ]}"#;
    for heuristic in [Heuristic::Trivial, Heuristic::Greedy] {
        assert_eq!(
            answer_sets(input, heuristic, ModelBuilderConfig::default()).unwrap(),
            vec!["{n(1),n(5),small(1)}"]
        );
    }
}

#[test]
fn inner_external_cycle() {
    // p(a). q(X) :- &id[p](X). p(X) :- q(X).   and   r :- &setminus[p, q](a), not r.
    let input = r#"{"rules": [
        {"head": [{"predicate": "p", "args": ["a"]}]},
        {"head": [{"predicate": "q", "args": ["X"]}], "body": [
            {"external": {"name": "id", "inputs": ["p"], "outputs": ["X"]}}
        ]},
        {"head": [{"predicate": "p", "args": ["X"]}], "body": [
            {"atom": {"predicate": "q", "args": ["X"]}}
        ]}
    ]}"#;
    let mut registry = Registry::with_builtin_sources();
    let rules = Program::from_json(input)
        .unwrap()
        .store(&mut registry)
        .unwrap();
    let (depgraph, _) = DependencyGraph::new(&mut registry, &rules).unwrap();
    let compgraph = ComponentGraph::new(&depgraph, &registry).unwrap();
    assert!(compgraph.components().iter().any(|comp| {
        FactoryKind::for_component(compgraph.component_info(*comp)) == FactoryKind::WellFounded
    }));
    for heuristic in [Heuristic::Trivial, Heuristic::Monolithic, Heuristic::Greedy] {
        assert_eq!(
            answer_sets(input, heuristic, ModelBuilderConfig::default()).unwrap(),
            vec!["{p(a),q(a)}"]
        );
    }
}

#[test]
fn inconsistent_program() {
    let input = r#"{"rules": [
        {"head": [{"predicate": "a"}]},
        {"head": [], "body": [{"atom": {"predicate": "a"}}]}
    ]}"#;
    assert!(answer_sets(input, Heuristic::Trivial, ModelBuilderConfig::default())
        .unwrap()
        .is_empty());
    assert_eq!(
        answer_sets(r#"{"rules": []}"#, Heuristic::Greedy, ModelBuilderConfig::default())
            .unwrap(),
        vec!["{}"]
    );
}

#[test]
fn unknown_source() {
    let input = r#"{"rules": [
        {"head": [{"predicate": "a"}], "body": [
            {"external": {"name": "nope", "inputs": [], "outputs": []}}
        ]}
    ]}"#;
    assert!(matches!(
        answer_sets(input, Heuristic::Greedy, ModelBuilderConfig::default()),
        Err(Error::UnknownSource { .. })
    ));
}
