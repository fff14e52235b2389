/*!
This library evaluates HEX programs, i.e. answer set programs with external atoms, by splitting
them into evaluation units and building their answer sets online.

# Evaluation pipeline
1. The rules are stored in a [Registry][datatypes::Registry], which interns atoms and
   external atom call sites and knows the [external sources][sources::ExternalSource].
2. The [dependency graph][depgraph::DependencyGraph] relates rules, atoms, and external atoms.
   External atoms with variable constant inputs get auxiliary input rules.
3. The [component graph][compgraph::ComponentGraph] is the acyclic condensation of the
   dependency graph. Each component is classified by its external atoms and cycles.
4. A [heuristic][evalgraph::heuristics::Heuristic] drives the
   [evaluation graph builder][evalgraph::builder::EvalGraphBuilder], which collapses components
   and creates [evaluation units][evalgraph::EvalGraph], each with a
   [model generator factory][modelgen::ModelGeneratorFactory].
5. The [online model builder][builder::OnlineModelBuilder] enumerates the input models of the
   final unit, which are the answer sets of the program.

The [naive backend][naive::NaiveBackend] is a small reference implementation of the model
generators, based on grounding over the active domain.

# Input format
Programs are given in JSON. Terms starting with an uppercase letter or an underscore are
variables.
```json
{"rules": [
  {"head": [{"predicate": "p", "args": ["a"]}]},
  {"head": [{"predicate": "q", "args": ["X"]}],
   "body": [{"atom": {"predicate": "p", "args": ["X"]}},
            {"naf": true, "external": {"name": "setminus", "inputs": ["p", "r"], "outputs": ["X"]}}]}
]}
```
*/

/*!
# Usage example
```rust
use std::rc::Rc;
use hex_eval::builder::{ModelBuilderConfig, OnlineModelBuilder};
use hex_eval::compgraph::ComponentGraph;
use hex_eval::datatypes::{Program, Registry};
use hex_eval::depgraph::DependencyGraph;
use hex_eval::evalgraph::{builder::EvalGraphBuilder, heuristics::Heuristic};
use hex_eval::naive::NaiveBackend;

let input = r#"{"rules": [
    {"head": [{"predicate": "p", "args": ["a"]}]},
    {"head": [{"predicate": "p", "args": ["b"]}]},
    {"head": [{"predicate": "q", "args": ["X"]}],
     "body": [{"atom": {"predicate": "p", "args": ["X"]}}]}
]}"#;
let mut registry = Registry::with_builtin_sources();
let rules = Program::from_json(input)?.store(&mut registry)?;
let (depgraph, _auxiliary_rules) = DependencyGraph::new(&mut registry, &rules)?;
let compgraph = ComponentGraph::new(&depgraph, &registry)?;
let registry = Rc::new(registry);
let backend = Rc::new(NaiveBackend::new(registry.clone()));
let mut builder = EvalGraphBuilder::new(compgraph, backend);
Heuristic::Greedy.build(&mut builder)?;
let final_unit = builder.finalize()?;
let mut models = OnlineModelBuilder::new(builder.into_eval_graph(), ModelBuilderConfig::default());
for answer_set in models.answer_sets(final_unit, None)? {
    println!("{}", answer_set.printable(&registry));
#   assert_eq!(answer_set.printable(&registry).to_string(), "{p(a),p(b),q(a),q(b)}");
}
# Ok::<(), hex_eval::error::Error>(())
```

### Streaming answer sets through a [`crossbeam-channel`]
The model builder is single threaded; the printed answer sets can be consumed by another
thread while they are computed.
```rust
# use std::rc::Rc;
# use hex_eval::builder::{ModelBuilderConfig, OnlineModelBuilder};
# use hex_eval::compgraph::ComponentGraph;
# use hex_eval::datatypes::{Program, Registry};
# use hex_eval::depgraph::DependencyGraph;
# use hex_eval::evalgraph::{builder::EvalGraphBuilder, heuristics::Heuristic};
# use hex_eval::naive::NaiveBackend;
let (s, r) = crossbeam_channel::unbounded();
let solving = std::thread::spawn(move || -> Result<usize, hex_eval::error::Error> {
    let input = r#"{"rules": [
        {"head": [{"predicate": "a"}], "body": [{"naf": true, "atom": {"predicate": "b"}}]},
        {"head": [{"predicate": "b"}], "body": [{"naf": true, "atom": {"predicate": "a"}}]}
    ]}"#;
    let mut registry = Registry::with_builtin_sources();
    let rules = Program::from_json(input)?.store(&mut registry)?;
    let (depgraph, _) = DependencyGraph::new(&mut registry, &rules)?;
    let compgraph = ComponentGraph::new(&depgraph, &registry)?;
    let registry = Rc::new(registry);
    let mut builder = EvalGraphBuilder::new(compgraph, Rc::new(NaiveBackend::new(registry.clone())));
    Heuristic::Trivial.build(&mut builder)?;
    let final_unit = builder.finalize()?;
    OnlineModelBuilder::new(builder.into_eval_graph(), ModelBuilderConfig::default())
        .answer_sets_channel(final_unit, &registry, s, None)
});

// print results as they are computed
while let Ok(result) = r.recv() {
    println!("answer set: {:?}", result);
}
// waiting for the other thread to close
# assert_eq!(solving.join().unwrap().unwrap(), 2);
```
*/
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences
)]

pub mod builder;
pub mod compgraph;
pub mod datatypes;
pub mod depgraph;
pub mod error;
pub mod evalgraph;
pub mod modelgen;
pub mod modelgraph;
pub mod naive;
pub mod sources;
#[cfg(test)]
mod test;
