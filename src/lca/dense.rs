//! Dense reference engine.
//!
//! Matrices are small dense `ndarray` arrays and the technosphere system is
//! solved with an `nalgebra` LU decomposition. Scenario columns replace
//! individual technosphere or biosphere entries.

use std::collections::HashMap;

use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::debug;

use crate::lca::engine::{EngineError, LcaEngine, LcaEngineFactory};
use crate::lca::{ActivityKey, FunctionalUnit, MethodId};
use crate::scenario::ScenarioResource;

/// Matrix a substitution applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Technosphere,
    Biosphere,
}

/// Per-column replacement values for one matrix entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSubstitution {
    /// Target matrix.
    pub matrix: MatrixKind,
    /// Row of the entry.
    pub row: usize,
    /// Column of the entry.
    pub col: usize,
    /// One value per scenario column.
    pub values: Vec<f64>,
}

impl MatrixSubstitution {
    /// Creates a substitution.
    #[must_use]
    pub const fn new(matrix: MatrixKind, row: usize, col: usize, values: Vec<f64>) -> Self {
        Self {
            matrix,
            row,
            col,
            values,
        }
    }
}

fn check_shape(
    what: &'static str,
    actual: &[usize],
    expected: (usize, usize),
) -> Result<(), EngineError> {
    let actual = (actual[0], actual[1]);
    if actual == expected {
        Ok(())
    } else {
        Err(EngineError::ShapeMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Static description of a product system: matrices, methods and scenario
/// substitutions per resource name.
#[derive(Debug, Clone)]
pub struct DenseLcaModel {
    activities: IndexMap<ActivityKey, usize>,
    technosphere: Array2<f64>,
    biosphere: Array2<f64>,
    methods: IndexMap<MethodId, Array1<f64>>,
    scenarios: HashMap<String, Vec<MatrixSubstitution>>,
}

impl DenseLcaModel {
    /// Creates a model from a square technosphere and a biosphere with one
    /// column per activity.
    ///
    /// # Errors
    /// `ShapeMismatch` if the matrices do not fit the activity list.
    pub fn new(
        activities: Vec<ActivityKey>,
        technosphere: Array2<f64>,
        biosphere: Array2<f64>,
    ) -> Result<Self, EngineError> {
        let n = activities.len();
        check_shape("technosphere matrix", technosphere.shape(), (n, n))?;
        check_shape(
            "biosphere matrix",
            biosphere.shape(),
            (biosphere.nrows(), n),
        )?;
        Ok(Self {
            activities: activities.into_iter().enumerate().map(|(i, k)| (k, i)).collect(),
            technosphere,
            biosphere,
            methods: IndexMap::new(),
            scenarios: HashMap::new(),
        })
    }

    /// Adds a method with one characterization factor per flow.
    ///
    /// # Errors
    /// `ShapeMismatch` if the factor count differs from the flow count.
    pub fn with_method(mut self, method: MethodId, factors: Vec<f64>) -> Result<Self, EngineError> {
        check_shape(
            "characterization factors",
            &[factors.len(), 1],
            (self.flow_count(), 1),
        )?;
        self.methods.insert(method, Array1::from(factors));
        Ok(self)
    }

    /// Registers the substitutions applied for a scenario resource.
    #[must_use]
    pub fn with_scenario(
        mut self,
        resource: impl Into<String>,
        substitutions: Vec<MatrixSubstitution>,
    ) -> Self {
        self.scenarios.insert(resource.into(), substitutions);
        self
    }

    /// Number of activities.
    #[must_use]
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    /// Number of elementary flows.
    #[must_use]
    pub fn flow_count(&self) -> usize {
        self.biosphere.nrows()
    }

    fn characterization(&self, method: &MethodId) -> Result<Array2<f64>, EngineError> {
        self.methods
            .get(method)
            .map(|factors| Array2::from_diag(factors))
            .ok_or_else(|| EngineError::UnknownMethod(method.clone()))
    }

    fn checked_substitutions(
        &self,
        resource: &ScenarioResource,
    ) -> Result<Vec<MatrixSubstitution>, EngineError> {
        let substitutions = self
            .scenarios
            .get(&resource.name)
            .ok_or_else(|| EngineError::UnknownResource(resource.name.clone()))?;
        for sub in substitutions {
            if sub.values.len() != resource.ncols() {
                return Err(EngineError::ScenarioColumnCount {
                    row: sub.row,
                    col: sub.col,
                    expected: resource.ncols(),
                    actual: sub.values.len(),
                });
            }
            let bounds = match sub.matrix {
                MatrixKind::Technosphere => self.technosphere.dim(),
                MatrixKind::Biosphere => self.biosphere.dim(),
            };
            if sub.row >= bounds.0 || sub.col >= bounds.1 {
                return Err(EngineError::Backend(format!(
                    "substitution ({}, {}) outside {:?} matrix of shape {bounds:?}",
                    sub.row, sub.col, sub.matrix
                )));
            }
        }
        Ok(substitutions.clone())
    }
}

impl LcaEngineFactory for DenseLcaModel {
    type Engine = DenseLca;

    fn build(
        &self,
        demand: &[FunctionalUnit],
        method: &MethodId,
        resource: Option<&ScenarioResource>,
    ) -> Result<DenseLca, EngineError> {
        if let Some(missing) = demand
            .iter()
            .find(|fu| !self.activities.contains_key(&fu.activity))
        {
            return Err(EngineError::UnknownActivity(missing.activity.clone()));
        }
        let (substitutions, ncols) = match resource {
            Some(resource) => (self.checked_substitutions(resource)?, resource.ncols().max(1)),
            None => (Vec::new(), 1),
        };
        let (flows, activities) = self.biosphere.dim();
        let mut engine = DenseLca {
            activities: self.activities.clone(),
            technosphere: self.technosphere.clone(),
            biosphere: self.biosphere.clone(),
            methods: self.methods.clone(),
            substitutions,
            ncols,
            cursor: 0,
            supply: Array1::zeros(activities),
            inventory: Array2::zeros((flows, activities)),
            characterization: self.characterization(method)?,
            characterized: Array2::zeros((flows, activities)),
            score: 0.0,
        };
        engine.apply_column();
        debug!(
            activities,
            flows,
            columns = ncols,
            "built dense LCA engine"
        );
        Ok(engine)
    }
}

/// Calculation context produced by [`DenseLcaModel`].
#[derive(Debug, Clone)]
pub struct DenseLca {
    activities: IndexMap<ActivityKey, usize>,
    technosphere: Array2<f64>,
    biosphere: Array2<f64>,
    methods: IndexMap<MethodId, Array1<f64>>,
    substitutions: Vec<MatrixSubstitution>,
    ncols: usize,
    cursor: usize,
    supply: Array1<f64>,
    inventory: Array2<f64>,
    characterization: Array2<f64>,
    characterized: Array2<f64>,
    score: f64,
}

impl DenseLca {
    /// Scenario column currently applied to the matrices.
    #[must_use]
    pub const fn scenario_column(&self) -> usize {
        self.cursor
    }

    fn apply_column(&mut self) {
        for sub in &self.substitutions {
            let target = match sub.matrix {
                MatrixKind::Technosphere => &mut self.technosphere,
                MatrixKind::Biosphere => &mut self.biosphere,
            };
            if let Some(value) = sub.values.get(self.cursor) {
                target[[sub.row, sub.col]] = *value;
            }
        }
    }
}

impl LcaEngine for DenseLca {
    fn technosphere_matrix(&self) -> ArrayView2<'_, f64> {
        self.technosphere.view()
    }

    fn biosphere_matrix(&self) -> ArrayView2<'_, f64> {
        self.biosphere.view()
    }

    fn redo_lci(&mut self, demand: &FunctionalUnit) -> Result<(), EngineError> {
        let index = *self
            .activities
            .get(&demand.activity)
            .ok_or_else(|| EngineError::UnknownActivity(demand.activity.clone()))?;
        let n = self.activities.len();
        let a = DMatrix::from_fn(n, n, |r, c| self.technosphere[[r, c]]);
        let mut f = DVector::zeros(n);
        f[index] = demand.amount;
        let s = a.lu().solve(&f).ok_or(EngineError::SingularTechnosphere)?;

        self.supply = Array1::from_iter(s.iter().copied());
        self.inventory = &self.biosphere * &self.supply.view().insert_axis(Axis(0));
        Ok(())
    }

    fn supply_array(&self) -> ArrayView1<'_, f64> {
        self.supply.view()
    }

    fn inventory(&self) -> ArrayView2<'_, f64> {
        self.inventory.view()
    }

    fn characterization_matrix(&self) -> ArrayView2<'_, f64> {
        self.characterization.view()
    }

    fn set_characterization_matrix(&mut self, matrix: Array2<f64>) -> Result<(), EngineError> {
        let flows = self.biosphere.nrows();
        check_shape("characterization matrix", matrix.shape(), (flows, flows))?;
        self.characterization = matrix;
        Ok(())
    }

    fn switch_method(&mut self, method: &MethodId) -> Result<(), EngineError> {
        let factors = self
            .methods
            .get(method)
            .ok_or_else(|| EngineError::UnknownMethod(method.clone()))?;
        self.characterization = Array2::from_diag(factors);
        Ok(())
    }

    fn lcia_calculation(&mut self) -> Result<(), EngineError> {
        self.characterized = self.characterization.dot(&self.inventory);
        self.score = self.characterized.sum();
        Ok(())
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn characterized_inventory(&self) -> ArrayView2<'_, f64> {
        self.characterized.view()
    }

    fn apply_next_scenario(&mut self) -> Result<(), EngineError> {
        self.cursor = (self.cursor + 1) % self.ncols;
        self.apply_column();
        Ok(())
    }
}
