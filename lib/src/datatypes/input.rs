//! JSON representation of programs.
//!
//! ```json
//! {"rules": [
//!   {"head": [{"predicate": "p", "args": ["a"]}]},
//!   {"head": [{"predicate": "q", "args": ["X"]}],
//!    "body": [{"atom": {"predicate": "p", "args": ["X"]}},
//!             {"naf": true, "external": {"name": "setminus", "inputs": ["p", "r"], "outputs": ["X"]}}]}
//! ]}
//! ```
use super::{ExternalAtom, Id, Literal, OrdinaryAtom, Registry, Rule};
use crate::error::Error;
use serde::{Deserialize, Serialize};

/// A program as read from JSON.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Program {
    /// The rules (facts are rules with an empty body).
    #[serde(default)]
    pub rules: Vec<RuleInput>,
}

/// A rule as read from JSON.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RuleInput {
    /// Head atoms.
    #[serde(default)]
    pub head: Vec<OrdinaryAtom>,
    /// Body literals.
    #[serde(default)]
    pub body: Vec<LiteralInput>,
}

/// A body literal as read from JSON; exactly one of `atom` and `external` has to be given.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LiteralInput {
    /// Default negation.
    #[serde(default)]
    pub naf: bool,
    /// Ordinary atom of the literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom: Option<OrdinaryAtom>,
    /// External atom of the literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalAtom>,
}

impl Program {
    /// Reads a program from a JSON string.
    pub fn from_json(input: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(input)?)
    }

    /// Stores all rules in the registry and returns their [Ids][Id] in order.
    pub fn store(&self, registry: &mut Registry) -> Result<Vec<Id>, Error> {
        log::info!("[Start] storing {} rules", self.rules.len());
        let result = self
            .rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                let head = rule
                    .head
                    .iter()
                    .map(|atom| registry.store_ordinary_atom(atom.clone()))
                    .collect();
                let body = rule
                    .body
                    .iter()
                    .map(|lit| {
                        let atom = match (&lit.atom, &lit.external) {
                            (Some(atom), None) => registry.store_ordinary_atom(atom.clone()),
                            (None, Some(eatom)) => registry.store_external_atom(eatom.clone())?,
                            _ => {
                                return Err(Error::MalformedProgram(format!(
                                    "literal of rule {} needs either an atom or an external atom",
                                    idx
                                )))
                            }
                        };
                        Ok(Literal {
                            naf: lit.naf,
                            atom,
                        })
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                registry.store_rule(Rule { head, body })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        log::info!("[Done] storing rules");
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn read_and_store() {
        let program = Program::from_json(
            r#"{"rules": [
                {"head": [{"predicate": "p", "args": ["a"]}]},
                {"head": [{"predicate": "q", "args": ["X"]}],
                 "body": [{"atom": {"predicate": "p", "args": ["X"]}},
                          {"naf": true, "external": {"name": "setminus", "inputs": ["p", "r"], "outputs": ["X"]}}]}
            ]}"#,
        )
        .unwrap();
        let mut registry = Registry::with_builtin_sources();
        let rules = program.store(&mut registry).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(
            registry.rule_to_string(rules[1]),
            "q(X) :- p(X), not &setminus[p,r](X)."
        );
        assert_eq!(registry.rule_to_string(rules[0]), "p(a).");
    }

    #[test]
    fn invalid_literal() {
        let program = Program::from_json(r#"{"rules": [{"head": [], "body": [{"naf": true}]}]}"#).unwrap();
        let mut registry = Registry::new();
        assert!(matches!(
            program.store(&mut registry),
            Err(Error::MalformedProgram(_))
        ));
        assert!(matches!(Program::from_json("{\"rules\": 3}"), Err(Error::Json(_))));
    }
}
