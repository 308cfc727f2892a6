//! Scenario-aware multi-LCA.
//!
//! Drives one engine context through the columns of a scenario resource and
//! records scores, contributions and inventories per
//! `(functional unit, method, scenario)`.

use ndarray::Array2;
use tracing::{debug, info};

use crate::config::{EngineConfig, RecomputeMode};
use crate::error::{ExecutionError, LcaResult};
use crate::lca::{FunctionalUnit, LcaEngine, LcaEngineFactory, MethodId};
use crate::scenario::indexer::ScenarioIndexer;
use crate::scenario::names::scenario_names;
use crate::scenario::resource::ScenarioResource;
use crate::scenario::results::ScenarioResults;
use crate::storage::{ScenarioRegistry, SetupStore};

/// Multi-LCA over every scenario column of a resource.
///
/// The engine only moves forward through the columns; reaching an earlier
/// column wraps around past the last one. `calculate_scenario` takes
/// `&mut self`, so one pass runs at a time.
#[derive(Debug)]
pub struct ScenarioMatrixEngine<E> {
    setup_name: String,
    resource: ScenarioResource,
    functional_units: Vec<FunctionalUnit>,
    methods: Vec<MethodId>,
    method_matrices: Vec<Array2<f64>>,
    engine: E,
    indexer: ScenarioIndexer,
    results: ScenarioResults,
    mode: RecomputeMode,
}

impl<E: LcaEngine> ScenarioMatrixEngine<E> {
    /// Resolves the setup and resource and builds the engine context.
    ///
    /// No column is computed yet.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::ScenarioResourceNotFound` / `CalculationSetupNotFound`.
    /// - `ValidationError::EmptyCalculationSetup` for a setup without
    ///   functional units or methods.
    /// - `ValidationError::EmptyScenarioSet` for a resource with no columns.
    /// - `ExecutionError::Engine` if the factory or engine fails.
    pub fn build<F>(
        factory: &F,
        setups: &dyn SetupStore,
        registry: &dyn ScenarioRegistry,
        setup_name: &str,
        resource_name: &str,
        config: &EngineConfig,
    ) -> LcaResult<Self>
    where
        F: LcaEngineFactory<Engine = E>,
    {
        let resource = registry.get_by_name(resource_name)?.ok_or_else(|| {
            ExecutionError::ScenarioResourceNotFound {
                name: resource_name.to_string(),
            }
        })?;
        let setup = setups
            .get(setup_name)?
            .ok_or_else(|| ExecutionError::CalculationSetupNotFound {
                name: setup_name.to_string(),
            })?;
        setup.validate()?;
        let indexer = ScenarioIndexer::new(resource.ncols())?;

        let mut engine = factory.build(&setup.functional_units, &setup.methods[0], Some(&resource))?;
        let mut method_matrices = Vec::with_capacity(setup.methods.len());
        for method in &setup.methods {
            engine.switch_method(method)?;
            method_matrices.push(engine.characterization_matrix().to_owned());
        }

        let results = ScenarioResults::new(
            setup.functional_units.len(),
            setup.methods.len(),
            indexer.total(),
            engine.biosphere_matrix().nrows(),
            engine.technosphere_matrix().nrows(),
        );

        info!(
            setup = setup_name,
            resource = resource_name,
            functional_units = setup.functional_units.len(),
            methods = setup.methods.len(),
            scenarios = indexer.total(),
            "built scenario engine"
        );
        Ok(Self {
            setup_name: setup.name,
            resource,
            functional_units: setup.functional_units,
            methods: setup.methods,
            method_matrices,
            engine,
            indexer,
            results,
            mode: config.recompute,
        })
    }

    /// Moves `steps` columns forward and recomputes according to the
    /// configured [`RecomputeMode`].
    ///
    /// # Errors
    ///
    /// `ExecutionError::Engine` if a transition or calculation fails. Columns
    /// computed before the failure keep their new results.
    pub fn calculate_scenario(&mut self, steps: usize) -> LcaResult<()> {
        match self.mode {
            RecomputeMode::AdvancedOnly => {
                if steps == 0 {
                    self.compute_current()?;
                }
                for _ in 0..steps {
                    self.next_scenario()?;
                    self.compute_current()?;
                }
            }
            RecomputeMode::Full => {
                for _ in 0..steps {
                    self.next_scenario()?;
                }
                for _ in 0..self.indexer.total() {
                    self.compute_current()?;
                    self.next_scenario()?;
                }
            }
        }
        Ok(())
    }

    /// Moves forward to column `target` and recomputes.
    ///
    /// # Errors
    ///
    /// `ValidationError` for a negative or out-of-range target, otherwise as
    /// [`ScenarioMatrixEngine::calculate_scenario`].
    pub fn calculate_to(&mut self, target: i64) -> LcaResult<()> {
        let steps = self.indexer.steps_to(target)?;
        self.calculate_scenario(steps)
    }

    /// Forward steps from the current column to `target`.
    ///
    /// # Errors
    ///
    /// `ValidationError` for a negative or out-of-range target.
    pub fn steps_to(&self, target: i64) -> LcaResult<usize> {
        Ok(self.indexer.steps_to(target)?)
    }

    fn next_scenario(&mut self) -> LcaResult<()> {
        self.engine.apply_next_scenario()?;
        self.indexer.advance();
        Ok(())
    }

    fn compute_current(&mut self) -> LcaResult<()> {
        let scenario = self.indexer.current();
        for (row, unit) in self.functional_units.iter().enumerate() {
            self.engine.redo_lci(unit)?;
            self.results.record_inventory(
                row,
                scenario,
                self.engine.supply_array(),
                self.engine.technosphere_matrix(),
                self.engine.inventory(),
            )?;

            for (col, matrix) in self.method_matrices.iter().enumerate() {
                self.engine.set_characterization_matrix(matrix.clone())?;
                self.engine.lcia_calculation()?;
                self.results.record_impact(
                    (row, col, scenario),
                    self.engine.score(),
                    self.engine.characterized_inventory(),
                )?;
            }
        }
        debug!(scenario, "computed scenario column");
        Ok(())
    }

    /// Scenario names from the resource description.
    ///
    /// Falls back to `Scenario0..` with a warning when the description is
    /// absent or not a tuple, list or dict literal.
    #[must_use]
    pub fn scenario_names(&self) -> Vec<String> {
        scenario_names(self.resource.description(), self.indexer.total())
    }

    /// Current column.
    #[must_use]
    pub const fn current(&self) -> usize {
        self.indexer.current()
    }

    /// Number of columns.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.indexer.total()
    }

    /// Result tensors.
    #[must_use]
    pub const fn results(&self) -> &ScenarioResults {
        &self.results
    }

    /// Functional units, in result-row order.
    #[must_use]
    pub fn functional_units(&self) -> &[FunctionalUnit] {
        &self.functional_units
    }

    /// Methods, in result-column order.
    #[must_use]
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// The driven engine context.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// The scenario resource.
    #[must_use]
    pub const fn resource(&self) -> &ScenarioResource {
        &self.resource
    }

    /// Name of the calculation setup.
    #[must_use]
    pub fn setup_name(&self) -> &str {
        &self.setup_name
    }

    /// Configured recompute mode.
    #[must_use]
    pub const fn recompute_mode(&self) -> RecomputeMode {
        self.mode
    }
}
