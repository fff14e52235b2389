//! Grounding of the rules of a unit over the active domain.
use crate::{
    datatypes::{Id, Interpretation, OrdinaryAtom, Registry, Substitution, Term},
    error::Error,
    sources::{InputType, Query},
};
use std::collections::{BTreeSet, HashSet};

/// A ground external atom literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct GroundExternal {
    pub eatom: Id,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub naf: bool,
}

impl GroundExternal {
    /// Evaluates the external atom (without default negation) on the interpretation.
    pub fn evaluate(&self, registry: &Registry, interpretation: &Interpretation) -> Result<bool, Error> {
        let source = registry.source_of(self.eatom)?;
        let query = Query::new(&self.inputs, interpretation, registry);
        Ok(source.retrieve(&query)?.contains(&self.outputs))
    }

    /// Evaluates the literal on the interpretation.
    pub fn holds(&self, registry: &Registry, interpretation: &Interpretation) -> Result<bool, Error> {
        Ok(self.evaluate(registry, interpretation)? != self.naf)
    }
}

/// A ground rule over ground atom addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct GroundRule {
    pub head: Vec<u32>,
    pub positive: Vec<u32>,
    pub negative: Vec<u32>,
    pub external: Vec<GroundExternal>,
}

impl GroundRule {
    /// Checks the ordinary body literals on `ordinary` and the external ones on `external`.
    pub fn body_holds(
        &self,
        registry: &Registry,
        ordinary: &Interpretation,
        external: &Interpretation,
    ) -> Result<bool, Error> {
        if !self.positive.iter().all(|atom| ordinary.contains(*atom))
            || self.negative.iter().any(|atom| ordinary.contains(*atom))
        {
            return Ok(false);
        }
        for literal in self.external.iter() {
            if !literal.holds(registry, external)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Checks whether the rule is satisfied by the interpretation.
    pub fn satisfied(&self, registry: &Registry, interpretation: &Interpretation) -> Result<bool, Error> {
        Ok(self.head.iter().any(|atom| interpretation.contains(*atom))
            || !self.body_holds(registry, interpretation, interpretation)?)
    }
}

/// Instantiates the rules over the constants of the rules and the input.
///
/// Positive ordinary body literals are matched against an over-approximation of the derivable
/// atoms; variables which are bound by none of them range over the whole domain. Fails if more
/// than `max_rules` ground rules arise.
pub(crate) fn ground(
    registry: &Registry,
    rules: &[Id],
    input: &Interpretation,
    max_rules: usize,
) -> Result<Vec<GroundRule>, Error> {
    let mut known: HashSet<OrdinaryAtom> = input.atoms(registry).into_iter().collect();
    let mut domain: BTreeSet<String> = known
        .iter()
        .flat_map(|atom| atom.args.iter().map(|term| term.name().to_string()))
        .collect();
    for rule in rules {
        domain.extend(rule_constants(registry, *rule)?);
    }

    let mut result: Vec<GroundRule> = Vec::new();
    let mut seen: HashSet<GroundRule> = HashSet::new();
    loop {
        let before = (known.len(), domain.len());
        for rule in rules {
            let mut derived: Vec<OrdinaryAtom> = Vec::new();
            for substitution in substitutions(registry, *rule, &known, &domain, max_rules)? {
                let (ground_rule, heads) = instantiate(registry, *rule, &substitution);
                derived.extend(heads);
                if seen.insert(ground_rule.clone()) {
                    result.push(ground_rule);
                    if result.len() > max_rules {
                        return Err(Error::Generator(format!(
                            "grounding exceeds {} rules",
                            max_rules
                        )));
                    }
                }
            }
            for atom in derived {
                domain.extend(atom.args.iter().map(|term| term.name().to_string()));
                known.insert(atom);
            }
        }
        if before == (known.len(), domain.len()) {
            break;
        }
    }
    log::trace!("grounded {} rules into {} ground rules", rules.len(), result.len());
    Ok(result)
}

/// Constants of the rule, without the predicate inputs of external atoms.
fn rule_constants(registry: &Registry, rule: Id) -> Result<Vec<String>, Error> {
    let mut result: Vec<String> = Vec::new();
    let constants = |terms: &[Term]| -> Vec<String> {
        terms
            .iter()
            .filter(|term| !term.is_variable())
            .map(|term| term.name().to_string())
            .collect()
    };
    for atom in registry.head(rule) {
        result.extend(constants(&registry.ordinary_atom(*atom).args));
    }
    for literal in registry.body(rule) {
        if literal.atom.is_ordinary_atom() {
            result.extend(constants(&registry.ordinary_atom(literal.atom).args));
        } else {
            let external = registry.external_atom(literal.atom);
            let source = registry.source_of(literal.atom)?;
            result.extend(
                source
                    .input_types()
                    .iter()
                    .zip(external.inputs.iter())
                    .filter(|(ty, term)| **ty == InputType::Constant && !term.is_variable())
                    .map(|(_, term)| term.name().to_string()),
            );
            result.extend(constants(&external.outputs));
        }
    }
    Ok(result)
}

/// All substitutions of the variables of the rule.
fn substitutions(
    registry: &Registry,
    rule: Id,
    known: &HashSet<OrdinaryAtom>,
    domain: &BTreeSet<String>,
    max_rules: usize,
) -> Result<Vec<Substitution>, Error> {
    let mut result = vec![Substitution::new()];
    let mut variables: BTreeSet<String> = BTreeSet::new();
    for literal in registry.body(rule) {
        if literal.atom.is_ordinary_atom() {
            let atom = registry.ordinary_atom(literal.atom);
            variables.extend(atom.variables().map(String::from));
            if !literal.naf {
                result = result
                    .iter()
                    .flat_map(|substitution| {
                        known
                            .iter()
                            .filter_map(move |ground| atom.match_ground(ground, substitution))
                    })
                    .collect();
            }
        } else {
            variables.extend(registry.external_atom(literal.atom).variables().map(String::from));
        }
    }
    for atom in registry.head(rule) {
        variables.extend(registry.ordinary_atom(*atom).variables().map(String::from));
    }

    for variable in variables {
        if result.iter().all(|substitution| substitution.contains_key(&variable)) {
            continue;
        }
        let mut extended: Vec<Substitution> = Vec::new();
        for substitution in result {
            if substitution.contains_key(&variable) {
                extended.push(substitution);
                continue;
            }
            for constant in domain {
                let mut next = substitution.clone();
                next.insert(variable.clone(), constant.clone());
                extended.push(next);
            }
            if extended.len() > max_rules {
                return Err(Error::Generator(format!(
                    "rule {} has more than {} instances",
                    registry.rule_to_string(rule),
                    max_rules
                )));
            }
        }
        result = extended;
    }
    Ok(result)
}

/// Applies a complete substitution to the rule. Returns the ground rule and its head atoms.
fn instantiate(
    registry: &Registry,
    rule: Id,
    substitution: &Substitution,
) -> (GroundRule, Vec<OrdinaryAtom>) {
    let mut result = GroundRule::default();
    let heads: Vec<OrdinaryAtom> = registry
        .head(rule)
        .iter()
        .map(|atom| registry.ordinary_atom(*atom).substitute(substitution))
        .collect();
    result.head = heads.iter().map(|atom| registry.intern_ground(atom)).collect();
    for literal in registry.body(rule) {
        if literal.atom.is_ordinary_atom() {
            let atom = registry
                .ordinary_atom(literal.atom)
                .substitute(substitution);
            let address = registry.intern_ground(&atom);
            if literal.naf {
                result.negative.push(address);
            } else {
                result.positive.push(address);
            }
        } else {
            let external = registry.external_atom(literal.atom);
            let names = |terms: Vec<Term>| -> Vec<String> {
                terms.iter().map(|term| term.name().to_string()).collect()
            };
            result.external.push(GroundExternal {
                eatom: literal.atom,
                inputs: names(external.substituted_inputs(substitution)),
                outputs: names(external.substituted_outputs(substitution)),
                naf: literal.naf,
            });
        }
    }
    (result, heads)
}
