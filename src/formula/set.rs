//! Dependency-ordered evaluation of all formulas in one scope.

use std::collections::{BTreeSet, HashMap};

use indexmap::{IndexMap, IndexSet};

use super::eval::evaluate;
use super::parser::Formula;
use super::{constant, FormulaError};

/// The parameters of one scope, ready for evaluation.
///
/// Parameters without a formula keep their amount; parameters with a formula
/// are evaluated after every in-scope parameter they reference. Symbols that
/// are not defined in the scope are resolved from the supplied globals.
#[derive(Debug, Clone)]
pub struct FormulaSet {
    amounts: IndexMap<String, f64>,
    formulas: IndexMap<String, Formula>,
    globals: HashMap<String, f64>,
}

impl FormulaSet {
    /// Builds a set from `(name, amount, formula)` triples.
    ///
    /// Blank formulas are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `FormulaError::InvalidFormula` naming the first parameter whose
    /// formula does not parse.
    pub fn new<'a, I>(parameters: I, globals: HashMap<String, f64>) -> Result<Self, FormulaError>
    where
        I: IntoIterator<Item = (&'a str, f64, Option<&'a str>)>,
    {
        let mut amounts = IndexMap::new();
        let mut formulas = IndexMap::new();
        for (name, amount, formula) in parameters {
            amounts.insert(name.to_string(), amount);
            let Some(source) = formula.map(str::trim).filter(|f| !f.is_empty()) else {
                continue;
            };
            let parsed = Formula::parse(source).map_err(|e| FormulaError::InvalidFormula {
                parameter: name.to_string(),
                reason: Box::new(e),
            })?;
            formulas.insert(name.to_string(), parsed);
        }
        Ok(Self {
            amounts,
            formulas,
            globals,
        })
    }

    /// Replaces the globals symbols outside the set resolve against.
    #[must_use]
    pub fn with_globals(mut self, globals: HashMap<String, f64>) -> Self {
        self.globals = globals;
        self
    }

    /// Symbols referenced by any formula that are not defined in this set.
    ///
    /// Constant names are included: a global of the same name shadows the
    /// constant.
    #[must_use]
    pub fn new_symbols(&self) -> BTreeSet<String> {
        self.formulas
            .values()
            .flat_map(Formula::symbols)
            .filter(|s| !self.amounts.contains_key(*s))
            .map(str::to_string)
            .collect()
    }

    /// New symbols that `globals` does not provide and no constant covers.
    #[must_use]
    pub fn missing_symbols(&self, globals: &HashMap<String, f64>) -> Vec<String> {
        self.new_symbols()
            .into_iter()
            .filter(|s| !globals.contains_key(s) && constant(s).is_none())
            .collect()
    }

    /// Returns the formula parameters in evaluation order.
    ///
    /// Uses Kahn's algorithm over in-scope references; ties keep the
    /// insertion order of the parameters.
    ///
    /// # Errors
    ///
    /// Returns `FormulaError::Cycle` listing every parameter that could not
    /// be scheduled.
    pub fn evaluation_order(&self) -> Result<Vec<&str>, FormulaError> {
        let mut in_degree: IndexMap<&str, usize> = IndexMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for (name, formula) in &self.formulas {
            let deps: IndexSet<&str> = formula
                .symbols()
                .into_iter()
                .filter(|s| self.formulas.contains_key(*s))
                .collect();
            in_degree.insert(name.as_str(), deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(name.as_str());
            }
        }

        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());
        let mut cursor = 0;
        while cursor < ready.len() {
            let name = ready[cursor];
            cursor += 1;
            order.push(name);
            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(*dependent);
                    }
                }
            }
        }

        if order.len() != in_degree.len() {
            let names = in_degree
                .iter()
                .filter(|(_, d)| **d > 0)
                .map(|(n, _)| (*n).to_string())
                .collect();
            return Err(FormulaError::Cycle { names });
        }
        Ok(order)
    }

    /// Evaluates every formula and returns the final amount of every
    /// parameter in the set, in insertion order.
    ///
    /// Nothing is written anywhere on failure.
    pub fn evaluate(&self) -> Result<IndexMap<String, f64>, FormulaError> {
        let order = self.evaluation_order()?;
        let mut amounts = self.amounts.clone();

        for name in order {
            let formula = &self.formulas[name];
            let value = {
                let lookup = |symbol: &str| {
                    amounts
                        .get(symbol)
                        .or_else(|| self.globals.get(symbol))
                        .copied()
                };
                evaluate(formula.expr(), &lookup)?
            };
            if !value.is_finite() {
                return Err(FormulaError::NonFinite {
                    parameter: name.to_string(),
                    formula: formula.source().to_string(),
                });
            }
            amounts.insert(name.to_string(), value);
        }
        Ok(amounts)
    }

    /// Number of parameters in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// Returns true if the set holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(params: &[(&str, f64, Option<&str>)], globals: &[(&str, f64)]) -> FormulaSet {
        let globals = globals.iter().map(|(k, v)| ((*k).to_string(), *v)).collect();
        FormulaSet::new(params.iter().copied(), globals).unwrap()
    }

    #[test]
    fn evaluates_in_dependency_order_regardless_of_insertion() {
        let s = set(
            &[
                ("c", 0.0, Some("b * 2")),
                ("b", 0.0, Some("a + 1")),
                ("a", 3.0, None),
            ],
            &[],
        );
        assert_eq!(s.evaluation_order().unwrap(), vec!["b", "c"]);
        let out = s.evaluate().unwrap();
        assert_eq!(out["a"], 3.0);
        assert_eq!(out["b"], 4.0);
        assert_eq!(out["c"], 8.0);
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
    }

    #[test]
    fn globals_fill_symbols_outside_scope() {
        let s = set(&[("x", 1.0, Some("glo * 10"))], &[("glo", 0.5)]);
        assert_eq!(s.evaluate().unwrap()["x"], 5.0);
    }

    #[test]
    fn new_symbols_exclude_scope_names_only() {
        let s = set(
            &[
                ("x", 1.0, Some("y + outer * pi")),
                ("y", 2.0, Some("")),
                ("z", 3.0, Some("sqrt(other) + e")),
            ],
            &[],
        );
        let symbols: Vec<String> = s.new_symbols().into_iter().collect();
        assert_eq!(symbols, vec!["e", "other", "outer", "pi"]);
        let globals = HashMap::from([("outer".to_string(), 1.0)]);
        assert_eq!(s.missing_symbols(&globals), vec!["other".to_string()]);
    }

    #[test]
    fn globals_shadow_constants() {
        let s = set(&[("d", 0.0, Some("e * 2 + pi"))], &[("e", 5.0)]);
        let out = s.evaluate().unwrap();
        assert!((out["d"] - (10.0 + std::f64::consts::PI)).abs() < 1e-12);
    }

    #[test]
    fn detects_cycles() {
        let s = set(
            &[
                ("a", 1.0, Some("b + 1")),
                ("b", 1.0, Some("a + 1")),
                ("c", 1.0, Some("2")),
                ("d", 1.0, Some("d")),
            ],
            &[],
        );
        let err = s.evaluate().unwrap_err();
        assert_eq!(
            err,
            FormulaError::Cycle {
                names: vec!["a".to_string(), "b".to_string(), "d".to_string()]
            }
        );
    }

    #[test]
    fn rejects_invalid_and_non_finite_formulas() {
        let err = FormulaSet::new([("p", 1.0, Some("1 +"))], HashMap::new()).unwrap_err();
        assert!(matches!(err, FormulaError::InvalidFormula { ref parameter, .. } if parameter == "p"));

        let deep = format!("{}1", "-".repeat(100_000));
        let err = FormulaSet::new([("p", 0.0, Some(deep.as_str()))], HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            FormulaError::InvalidFormula { ref reason, .. } if matches!(**reason, FormulaError::TooDeep { .. })
        ));

        let s = set(&[("q", 1.0, Some("sqrt(-1)"))], &[]);
        assert!(matches!(s.evaluate().unwrap_err(), FormulaError::NonFinite { .. }));
    }
}
