//! Engine traits.

use ndarray::{Array2, ArrayView1, ArrayView2};
use thiserror::Error;

use crate::lca::{ActivityKey, FunctionalUnit, MethodId};
use crate::scenario::ScenarioResource;

/// Errors raised by an LCA engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown activity {0}")]
    UnknownActivity(ActivityKey),

    #[error("Unknown impact assessment method ({0})")]
    UnknownMethod(MethodId),

    #[error("No scenario data registered for resource '{0}'")]
    UnknownResource(String),

    #[error("Technosphere matrix is singular")]
    SingularTechnosphere,

    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Substitution at ({row}, {col}) has {actual} values for {expected} scenario columns")]
    ScenarioColumnCount {
        row: usize,
        col: usize,
        expected: usize,
        actual: usize,
    },

    #[error("LCA engine backend error: {0}")]
    Backend(String),
}

/// A stateful LCA calculation context with scenario support.
///
/// Matrix accessors reflect the scenario column most recently applied.
/// Implementations are driven by one owner at a time; mutation takes
/// `&mut self`.
pub trait LcaEngine {
    /// Technosphere matrix `A` (activities x activities).
    fn technosphere_matrix(&self) -> ArrayView2<'_, f64>;

    /// Biosphere matrix `B` (flows x activities).
    fn biosphere_matrix(&self) -> ArrayView2<'_, f64>;

    /// Solves the inventory for a new demand.
    ///
    /// # Errors
    /// Fails for an unknown activity or an unsolvable system.
    fn redo_lci(&mut self, demand: &FunctionalUnit) -> Result<(), EngineError>;

    /// Supply (scaling) vector of the last inventory.
    fn supply_array(&self) -> ArrayView1<'_, f64>;

    /// Inventory `B * diag(s)` of the last inventory.
    fn inventory(&self) -> ArrayView2<'_, f64>;

    /// Active characterization matrix (flows x flows).
    fn characterization_matrix(&self) -> ArrayView2<'_, f64>;

    /// Replaces the characterization matrix.
    ///
    /// # Errors
    /// Fails when the shape does not match the biosphere.
    fn set_characterization_matrix(&mut self, matrix: Array2<f64>) -> Result<(), EngineError>;

    /// Loads the characterization matrix of `method`.
    ///
    /// # Errors
    /// Fails for an unknown method.
    fn switch_method(&mut self, method: &MethodId) -> Result<(), EngineError>;

    /// Characterizes the last inventory.
    ///
    /// # Errors
    /// Backend specific.
    fn lcia_calculation(&mut self) -> Result<(), EngineError>;

    /// Score of the last impact assessment.
    fn score(&self) -> f64;

    /// Characterized inventory of the last impact assessment.
    fn characterized_inventory(&self) -> ArrayView2<'_, f64>;

    /// Moves to the next scenario column and updates the matrices from it.
    ///
    /// # Errors
    /// Backend specific.
    fn apply_next_scenario(&mut self) -> Result<(), EngineError>;
}

/// Builds engines for a demand, a starting method and a scenario resource.
pub trait LcaEngineFactory {
    /// Engine type produced.
    type Engine: LcaEngine;

    /// Builds an engine with the first scenario column applied.
    ///
    /// # Errors
    /// Fails when the demand, method or resource is unknown to the backend.
    fn build(
        &self,
        demand: &[FunctionalUnit],
        method: &MethodId,
        resource: Option<&ScenarioResource>,
    ) -> Result<Self::Engine, EngineError>;
}
