use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lca_scenarios::lca::EngineError;
use lca_scenarios::storage::{InMemoryScenarioRegistry, InMemorySetupStore};
use lca_scenarios::{
    ActivityKey, CalculationSetup, EngineConfig, FunctionalUnit, LcaEngine, LcaEngineFactory,
    MethodId, RecomputeMode, ScenarioMatrixEngine, ScenarioResource,
};
use ndarray::{array, Array1, Array2, ArrayView1, ArrayView2};

/// `(demand amount, method index, column)` -> number of LCIA calculations.
type Counter = Arc<Mutex<HashMap<(i64, i64, usize), usize>>>;

const METHODS: [&str; 2] = ["GWP", "SOx"];

/// Engine whose score encodes what it was asked to compute:
/// `amount * 100 + method * 10 + column`.
#[derive(Debug)]
struct CountingEngine {
    counter: Counter,
    column: usize,
    ncols: usize,
    amount: f64,
    technosphere: Array2<f64>,
    biosphere: Array2<f64>,
    supply: Array1<f64>,
    inventory: Array2<f64>,
    characterization: Array2<f64>,
    characterized: Array2<f64>,
    score: f64,
}

impl LcaEngine for CountingEngine {
    fn technosphere_matrix(&self) -> ArrayView2<'_, f64> {
        self.technosphere.view()
    }

    fn biosphere_matrix(&self) -> ArrayView2<'_, f64> {
        self.biosphere.view()
    }

    fn redo_lci(&mut self, demand: &FunctionalUnit) -> Result<(), EngineError> {
        self.amount = demand.amount;
        self.supply = array![demand.amount, 0.0];
        self.inventory = array![[demand.amount, 0.0]];
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
        self.characterization = matrix;
        Ok(())
    }

    fn switch_method(&mut self, method: &MethodId) -> Result<(), EngineError> {
        let index = METHODS
            .iter()
            .position(|m| method.parts() == [m.to_string()])
            .ok_or_else(|| EngineError::UnknownMethod(method.clone()))?;
        self.characterization = array![[index as f64]];
        Ok(())
    }

    fn lcia_calculation(&mut self) -> Result<(), EngineError> {
        let cf = self.characterization[[0, 0]];
        self.characterized = &self.inventory * cf;
        self.score = self.amount * 100.0 + cf * 10.0 + self.column as f64;
        *self
            .counter
            .lock()
            .unwrap()
            .entry((self.amount as i64, cf as i64, self.column))
            .or_insert(0) += 1;
        Ok(())
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn characterized_inventory(&self) -> ArrayView2<'_, f64> {
        self.characterized.view()
    }

    fn apply_next_scenario(&mut self) -> Result<(), EngineError> {
        self.column = (self.column + 1) % self.ncols;
        Ok(())
    }
}

struct CountingFactory {
    counter: Counter,
}

impl LcaEngineFactory for CountingFactory {
    type Engine = CountingEngine;

    fn build(
        &self,
        _demand: &[FunctionalUnit],
        method: &MethodId,
        resource: Option<&ScenarioResource>,
    ) -> Result<CountingEngine, EngineError> {
        let mut engine = CountingEngine {
            counter: Arc::clone(&self.counter),
            column: 0,
            ncols: resource.map_or(1, ScenarioResource::ncols),
            amount: 0.0,
            technosphere: Array2::eye(2),
            biosphere: array![[1.0, 1.0]],
            supply: Array1::zeros(2),
            inventory: Array2::zeros((1, 2)),
            characterization: Array2::zeros((1, 1)),
            characterized: Array2::zeros((1, 2)),
            score: 0.0,
        };
        engine.switch_method(method)?;
        Ok(engine)
    }
}

struct Fixture {
    factory: CountingFactory,
    setups: InMemorySetupStore,
    registry: InMemoryScenarioRegistry,
}

impl Fixture {
    fn new(description: Option<&str>) -> Self {
        let setups = InMemorySetupStore::new();
        setups
            .insert(CalculationSetup::new(
                "three-units",
                (1..=3u8)
                    .map(|i| FunctionalUnit::new(ActivityKey::new("db", format!("a{i}")), f64::from(i)))
                    .collect(),
                METHODS.iter().map(|m| MethodId::new([*m])).collect(),
            ))
            .unwrap();
        let registry = InMemoryScenarioRegistry::new();
        let mut resource = ScenarioResource::new("four", "/unused", 4);
        if let Some(description) = description {
            resource = resource.with_description(description);
        }
        registry.register(resource).unwrap();
        Self {
            factory: CountingFactory {
                counter: Counter::default(),
            },
            setups,
            registry,
        }
    }

    fn engine(&self, mode: RecomputeMode) -> ScenarioMatrixEngine<CountingEngine> {
        ScenarioMatrixEngine::build(
            &self.factory,
            &self.setups,
            &self.registry,
            "three-units",
            "four",
            &EngineConfig::with_recompute(mode),
        )
        .unwrap()
    }

    fn counts(&self) -> HashMap<(i64, i64, usize), usize> {
        self.factory.counter.lock().unwrap().clone()
    }
}

fn assert_every_slot(fixture: &Fixture, mlca: &ScenarioMatrixEngine<CountingEngine>, times: usize) {
    let counts = fixture.counts();
    assert_eq!(counts.len(), 3 * 2 * 4);
    for unit in 0..3 {
        for method in 0..2 {
            for column in 0..4 {
                let amount = unit as i64 + 1;
                assert_eq!(counts[&(amount, method as i64, column)], times);
                let expected = (amount * 100 + method as i64 * 10 + column as i64) as f64;
                assert_eq!(mlca.results().lca_scores()[[unit, method, column]], expected);
            }
        }
    }
    assert!(mlca.results().is_complete());
}

#[test]
fn build_computes_nothing() {
    let fixture = Fixture::new(None);
    let mlca = fixture.engine(RecomputeMode::AdvancedOnly);
    assert!(fixture.counts().is_empty());
    assert_eq!(mlca.current(), 0);
    assert_eq!(mlca.total(), 4);
    assert!(!mlca.results().computed().iter().any(|c| *c));
}

#[test]
fn wraparound_pass_writes_every_slot_once() {
    let fixture = Fixture::new(None);
    let mut mlca = fixture.engine(RecomputeMode::AdvancedOnly);
    mlca.calculate_scenario(4).unwrap();
    assert_eq!(mlca.current(), 0);
    assert_every_slot(&fixture, &mlca, 1);
}

#[test]
fn stepping_backwards_wraps_around() {
    let fixture = Fixture::new(None);
    let mut mlca = fixture.engine(RecomputeMode::AdvancedOnly);
    mlca.calculate_to(3).unwrap();
    assert_eq!(fixture.counts().get(&(1, 0, 0)), None);
    assert_eq!(mlca.steps_to(1).unwrap(), 2);
    mlca.calculate_to(1).unwrap();
    assert_eq!(mlca.current(), 1);

    let counts = fixture.counts();
    assert_eq!(counts.get(&(1, 0, 0)), Some(&1));
    assert_eq!(counts.get(&(1, 0, 1)), Some(&2));
    assert_eq!(counts.get(&(1, 0, 2)), Some(&1));
    assert_eq!(counts.get(&(1, 0, 3)), Some(&1));
}

#[test]
fn full_mode_recomputes_every_column() {
    let fixture = Fixture::new(None);
    let mut mlca = fixture.engine(RecomputeMode::Full);
    mlca.calculate_scenario(0).unwrap();
    assert_eq!(mlca.current(), 0);
    assert_every_slot(&fixture, &mlca, 1);

    mlca.calculate_to(2).unwrap();
    assert_eq!(mlca.current(), 2);
    assert_every_slot(&fixture, &mlca, 2);
}

#[test]
fn invalid_targets_are_rejected() {
    let fixture = Fixture::new(None);
    let mut mlca = fixture.engine(RecomputeMode::AdvancedOnly);
    assert!(mlca.calculate_to(-1).unwrap_err().is_validation());
    assert!(mlca.calculate_to(4).unwrap_err().is_validation());
    assert!(fixture.counts().is_empty());
}

#[test]
fn unknown_names_are_not_found() {
    let fixture = Fixture::new(None);
    let config = EngineConfig::default();
    let missing_resource = ScenarioMatrixEngine::build(
        &fixture.factory,
        &fixture.setups,
        &fixture.registry,
        "three-units",
        "five",
        &config,
    )
    .unwrap_err();
    assert!(missing_resource.is_not_found());
    assert!(missing_resource.to_string().contains("five"));

    let missing_setup = ScenarioMatrixEngine::build(
        &fixture.factory,
        &fixture.setups,
        &fixture.registry,
        "two-units",
        "four",
        &config,
    )
    .unwrap_err();
    assert!(missing_setup.is_not_found());
}

#[test]
fn scenario_names_fall_back_to_numbered() {
    let fixture = Fixture::new(Some("four scenarios of the grid mix"));
    let mlca = fixture.engine(RecomputeMode::AdvancedOnly);
    assert_eq!(
        mlca.scenario_names(),
        vec!["Scenario0", "Scenario1", "Scenario2", "Scenario3"]
    );

    let fixture = Fixture::new(Some("['2020', '2030', '2040', '2050']"));
    let mlca = fixture.engine(RecomputeMode::AdvancedOnly);
    assert_eq!(mlca.scenario_names(), vec!["2020", "2030", "2040", "2050"]);
}
