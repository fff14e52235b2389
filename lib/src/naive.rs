/*!
A naive reference [Backend], which grounds the rules of a unit over the active domain and
computes answer sets by fixpoint iteration or exhaustive search.

- [Plain][FactoryKind::Plain] units evaluate their external atoms on the input. Definite
  programs get their least model, all others are searched exhaustively.
- [WellFounded][FactoryKind::WellFounded] units iterate the immediate consequence operator,
  evaluating the (monotonic) external atoms on the current interpretation.
- [GuessAndCheck][FactoryKind::GuessAndCheck] units guess interpretations and check them to
  be FLP answer sets.

Every generated model contains the input model. The backend does not support value
invention: output values of external atoms outside of the active domain are ignored.
*/
mod ground;

use self::ground::GroundRule;
use crate::{
    datatypes::{Interpretation, Registry},
    error::Error,
    modelgen::{Backend, FactoryKind, ModelGenerator, ModelGeneratorFactory, UnitProgram},
};
use derivative::Derivative;
use std::{collections::BTreeSet, rc::Rc};

/// Default bound on the number of atoms which are guessed.
pub const DEFAULT_MAX_GUESS_ATOMS: usize = 20;
/// Default bound on the number of ground rules of a unit.
pub const DEFAULT_MAX_GROUND_RULES: usize = 100_000;

/// Creates [naive factories][NaiveFactory] over a shared [Registry].
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct NaiveBackend {
    #[derivative(Debug = "ignore")]
    registry: Rc<Registry>,
    max_guess_atoms: usize,
    max_ground_rules: usize,
}

impl NaiveBackend {
    /// Creates a new backend with the default bounds.
    pub fn new(registry: Rc<Registry>) -> Self {
        Self {
            registry,
            max_guess_atoms: DEFAULT_MAX_GUESS_ATOMS,
            max_ground_rules: DEFAULT_MAX_GROUND_RULES,
        }
    }

    /// Sets the maximal number of atoms a generator may guess.
    pub fn with_max_guess_atoms(mut self, max: usize) -> Self {
        self.max_guess_atoms = max;
        self
    }

    /// Sets the maximal number of ground rules of a unit.
    pub fn with_max_ground_rules(mut self, max: usize) -> Self {
        self.max_ground_rules = max;
        self
    }
}

impl Backend for NaiveBackend {
    fn create_factory(
        &self,
        kind: FactoryKind,
        program: UnitProgram,
    ) -> Result<Rc<dyn ModelGeneratorFactory>, Error> {
        log::debug!(
            "naive {} factory for {} rules and {} constraints",
            kind,
            program.rules.len(),
            program.constraints.len()
        );
        Ok(Rc::new(NaiveFactory {
            kind,
            program,
            backend: self.clone(),
        }))
    }
}

/// Factory of the naive backend.
#[derive(Debug)]
pub struct NaiveFactory {
    kind: FactoryKind,
    program: UnitProgram,
    backend: NaiveBackend,
}

impl ModelGeneratorFactory for NaiveFactory {
    fn kind(&self) -> FactoryKind {
        self.kind
    }

    fn create_model_generator(
        &self,
        input: Option<Rc<Interpretation>>,
    ) -> Result<Box<dyn ModelGenerator>, Error> {
        let input = input.map(|input| (*input).clone()).unwrap_or_default();
        let registry = self.backend.registry.as_ref();
        let rules: Vec<_> = self.program.all_rules().copied().collect();
        let ground_rules = ground::ground(registry, &rules, &input, self.backend.max_ground_rules)?;
        let solver = Solver {
            registry,
            input: &input,
            max_guess_atoms: self.backend.max_guess_atoms,
        };
        let models = match self.kind {
            FactoryKind::Plain => solver.plain(&ground_rules)?,
            FactoryKind::WellFounded => solver.wellfounded(&ground_rules)?,
            FactoryKind::GuessAndCheck => solver.guess_and_check(&ground_rules)?,
        };
        log::trace!("naive {} generator found {} models", self.kind, models.len());
        Ok(Box::new(NaiveGenerator(models.into_iter())))
    }
}

/// Returns the models which have been computed on creation.
#[derive(Debug)]
struct NaiveGenerator(std::vec::IntoIter<Interpretation>);

impl ModelGenerator for NaiveGenerator {
    fn generate_next_model(&mut self) -> Result<Option<Interpretation>, Error> {
        Ok(self.0.next())
    }
}

struct Solver<'a> {
    registry: &'a Registry,
    input: &'a Interpretation,
    max_guess_atoms: usize,
}

impl Solver<'_> {
    /// Removes body literals whose truth value is fixed by the input, since their atom
    /// cannot be derived. Rules with a fixed false body are dropped.
    fn simplify(&self, rules: &[GroundRule], evaluate_externals: bool) -> Result<Vec<GroundRule>, Error> {
        let heads: BTreeSet<u32> = rules.iter().flat_map(|rule| rule.head.iter().copied()).collect();
        let fixed = |atom: &u32| self.input.contains(*atom) || !heads.contains(atom);
        let mut result = Vec::new();
        'rules: for rule in rules {
            let mut simplified = GroundRule {
                head: rule.head.clone(),
                ..Default::default()
            };
            for atom in rule.positive.iter() {
                if !fixed(atom) {
                    simplified.positive.push(*atom);
                } else if !self.input.contains(*atom) {
                    continue 'rules;
                }
            }
            for atom in rule.negative.iter() {
                if !fixed(atom) {
                    simplified.negative.push(*atom);
                } else if self.input.contains(*atom) {
                    continue 'rules;
                }
            }
            for literal in rule.external.iter() {
                if !evaluate_externals {
                    simplified.external.push(literal.clone());
                } else if !literal.holds(self.registry, self.input)? {
                    continue 'rules;
                }
            }
            result.push(simplified);
        }
        Ok(result)
    }

    fn plain(&self, rules: &[GroundRule]) -> Result<Vec<Interpretation>, Error> {
        let rules = self.simplify(rules, true)?;
        if rules
            .iter()
            .all(|rule| rule.head.len() <= 1 && rule.negative.is_empty())
        {
            self.least_model(&rules)
        } else {
            self.guess_and_check(&rules)
        }
    }

    fn wellfounded(&self, rules: &[GroundRule]) -> Result<Vec<Interpretation>, Error> {
        let rules = self.simplify(rules, false)?;
        self.least_model(&rules)
    }

    /// Least fixpoint of the immediate consequence operator, external atoms are evaluated on
    /// the current interpretation. Returns no model if a constraint is violated.
    fn least_model(&self, rules: &[GroundRule]) -> Result<Vec<Interpretation>, Error> {
        let mut model = self.input.clone();
        loop {
            let mut next = model.clone();
            for rule in rules.iter().filter(|rule| !rule.head.is_empty()) {
                if rule.body_holds(self.registry, &model, &model)? {
                    rule.head.iter().for_each(|atom| {
                        next.insert(*atom);
                    });
                }
            }
            if next == model {
                break;
            }
            model = next;
        }
        for rule in rules {
            if !rule.satisfied(self.registry, &model)? {
                return Ok(Vec::new());
            }
        }
        Ok(vec![model])
    }

    /// Enumerates all interpretations over the head atoms and keeps the FLP answer sets.
    fn guess_and_check(&self, rules: &[GroundRule]) -> Result<Vec<Interpretation>, Error> {
        let rules = self.simplify(rules, false)?;
        let candidates: Vec<u32> = rules
            .iter()
            .flat_map(|rule| rule.head.iter().copied())
            .filter(|atom| !self.input.contains(*atom))
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect();
        if candidates.len() > self.max_guess_atoms {
            return Err(Error::Generator(format!(
                "guessing {} atoms exceeds the limit of {}",
                candidates.len(),
                self.max_guess_atoms
            )));
        }
        let interpretation = |mask: u64| -> Interpretation {
            let mut result = self.input.clone();
            candidates
                .iter()
                .enumerate()
                .filter(|(idx, _)| mask & (1 << idx) != 0)
                .for_each(|(_, atom)| {
                    result.insert(*atom);
                });
            result
        };
        let mut result = Vec::new();
        for mask in 0..(1u64 << candidates.len()) {
            let model = interpretation(mask);
            if self.is_flp_answer_set(&rules, mask, &model, &interpretation)? {
                result.push(model);
            }
        }
        Ok(result)
    }

    fn is_flp_answer_set(
        &self,
        rules: &[GroundRule],
        mask: u64,
        model: &Interpretation,
        interpretation: &impl Fn(u64) -> Interpretation,
    ) -> Result<bool, Error> {
        for rule in rules {
            if !rule.satisfied(self.registry, model)? {
                return Ok(false);
            }
        }
        let mut reduct = Vec::new();
        for rule in rules {
            if rule.body_holds(self.registry, model, model)? {
                reduct.push(rule);
            }
        }
        // proper submasks in descending order, ending with 0
        let mut sub = mask;
        while sub != 0 {
            sub = (sub - 1) & mask;
            let smaller = interpretation(sub);
            let mut satisfied = true;
            for rule in reduct.iter() {
                if !rule.satisfied(self.registry, &smaller)? {
                    satisfied = false;
                    break;
                }
            }
            if satisfied {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
