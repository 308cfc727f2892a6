//! Result tensors filled by a scenario pass.

use std::collections::HashMap;

use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::lca::EngineError;

/// Key of per-functional-unit results: `(functional unit index, scenario)`.
pub type UnitScenario = (usize, usize);

/// Key of characterized inventories: `(functional unit, method, scenario)`.
pub type UnitMethodScenario = (usize, usize, usize);

/// Dense results over functional units (F), methods (M) and scenarios (S).
///
/// Slots of a scenario column are overwritten every time the column is
/// computed; `is_computed` tells which slots hold results at all.
#[derive(Debug, Clone)]
pub struct ScenarioResults {
    lca_scores: Array3<f64>,
    elementary_flow_contributions: Array4<f64>,
    process_contributions: Array4<f64>,
    scaling_factors: HashMap<UnitScenario, Array1<f64>>,
    technosphere_flows: HashMap<UnitScenario, Array1<f64>>,
    inventory: HashMap<UnitScenario, Array1<f64>>,
    inventories: HashMap<UnitScenario, Array2<f64>>,
    characterized_inventories: HashMap<UnitMethodScenario, Array2<f64>>,
    computed: Array3<bool>,
}

impl ScenarioResults {
    /// Allocates zeroed results for `flows` elementary flows and
    /// `activities` technosphere activities.
    #[must_use]
    pub fn new(
        functional_units: usize,
        methods: usize,
        scenarios: usize,
        flows: usize,
        activities: usize,
    ) -> Self {
        let fms = (functional_units, methods, scenarios);
        Self {
            lca_scores: Array3::zeros(fms),
            elementary_flow_contributions: Array4::zeros((
                functional_units,
                methods,
                scenarios,
                flows,
            )),
            process_contributions: Array4::zeros((functional_units, methods, scenarios, activities)),
            scaling_factors: HashMap::new(),
            technosphere_flows: HashMap::new(),
            inventory: HashMap::new(),
            inventories: HashMap::new(),
            characterized_inventories: HashMap::new(),
            computed: Array3::from_elem(fms, false),
        }
    }

    /// Scores, shape `(F, M, S)`.
    #[must_use]
    pub fn lca_scores(&self) -> ArrayView3<'_, f64> {
        self.lca_scores.view()
    }

    /// Scores of one scenario, shape `(F, M)`.
    #[must_use]
    pub fn scenario_scores(&self, scenario: usize) -> ArrayView2<'_, f64> {
        self.lca_scores.slice(s![.., .., scenario])
    }

    /// Per-flow contributions, shape `(F, M, S, B)`.
    #[must_use]
    pub fn elementary_flow_contributions(&self) -> ndarray::ArrayView4<'_, f64> {
        self.elementary_flow_contributions.view()
    }

    /// Per-process contributions, shape `(F, M, S, T)`.
    #[must_use]
    pub fn process_contributions(&self) -> ndarray::ArrayView4<'_, f64> {
        self.process_contributions.view()
    }

    /// Supply vector of a functional unit in a scenario.
    #[must_use]
    pub fn scaling_factors(&self, unit: usize, scenario: usize) -> Option<ArrayView1<'_, f64>> {
        self.scaling_factors.get(&(unit, scenario)).map(Array1::view)
    }

    /// Supply times the technosphere diagonal.
    #[must_use]
    pub fn technosphere_flows(&self, unit: usize, scenario: usize) -> Option<ArrayView1<'_, f64>> {
        self.technosphere_flows.get(&(unit, scenario)).map(Array1::view)
    }

    /// Inventory summed per elementary flow.
    #[must_use]
    pub fn inventory(&self, unit: usize, scenario: usize) -> Option<ArrayView1<'_, f64>> {
        self.inventory.get(&(unit, scenario)).map(Array1::view)
    }

    /// Raw inventory matrix.
    #[must_use]
    pub fn inventories(&self, unit: usize, scenario: usize) -> Option<ArrayView2<'_, f64>> {
        self.inventories.get(&(unit, scenario)).map(Array2::view)
    }

    /// Characterized inventory of a functional unit and method in a scenario.
    #[must_use]
    pub fn characterized_inventory(
        &self,
        unit: usize,
        method: usize,
        scenario: usize,
    ) -> Option<ArrayView2<'_, f64>> {
        self.characterized_inventories
            .get(&(unit, method, scenario))
            .map(Array2::view)
    }

    /// Returns true once the slot has been computed.
    #[must_use]
    pub fn is_computed(&self, unit: usize, method: usize, scenario: usize) -> bool {
        self.computed
            .get((unit, method, scenario))
            .copied()
            .unwrap_or(false)
    }

    /// The computed mask, shape `(F, M, S)`.
    #[must_use]
    pub fn computed(&self) -> ArrayView3<'_, bool> {
        self.computed.view()
    }

    /// Returns true once every column of every slot has been computed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.computed.iter().all(|c| *c)
    }

    pub(crate) fn record_inventory(
        &mut self,
        unit: usize,
        scenario: usize,
        supply: ArrayView1<'_, f64>,
        technosphere: ArrayView2<'_, f64>,
        inventory: ArrayView2<'_, f64>,
    ) -> Result<(), EngineError> {
        let diagonal = technosphere.diag();
        if diagonal.len() != supply.len() {
            return Err(EngineError::ShapeMismatch {
                what: "supply array",
                expected: (diagonal.len(), 1),
                actual: (supply.len(), 1),
            });
        }
        let key = (unit, scenario);
        self.technosphere_flows.insert(key, &supply * &diagonal);
        self.scaling_factors.insert(key, supply.to_owned());
        self.inventory.insert(key, inventory.sum_axis(Axis(1)));
        self.inventories.insert(key, inventory.to_owned());
        Ok(())
    }

    pub(crate) fn record_impact(
        &mut self,
        (unit, method, scenario): UnitMethodScenario,
        score: f64,
        characterized: ArrayView2<'_, f64>,
    ) -> Result<(), EngineError> {
        let flows = self.elementary_flow_contributions.shape()[3];
        let activities = self.process_contributions.shape()[3];
        if characterized.dim() != (flows, activities) {
            return Err(EngineError::ShapeMismatch {
                what: "characterized inventory",
                expected: (flows, activities),
                actual: characterized.dim(),
            });
        }
        self.lca_scores[[unit, method, scenario]] = score;
        self.elementary_flow_contributions
            .slice_mut(s![unit, method, scenario, ..])
            .assign(&characterized.sum_axis(Axis(1)));
        self.process_contributions
            .slice_mut(s![unit, method, scenario, ..])
            .assign(&characterized.sum_axis(Axis(0)));
        self.characterized_inventories
            .insert((unit, method, scenario), characterized.to_owned());
        self.computed[[unit, method, scenario]] = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn records_inventory_and_contributions() {
        let mut results = ScenarioResults::new(1, 1, 2, 2, 2);
        assert!(!results.is_computed(0, 0, 1));

        let supply = array![1.0, 0.5];
        let technosphere = array![[1.0, 0.0], [-0.5, 2.0]];
        let inventory = array![[1.0, 1.0], [0.0, 3.0]];
        results
            .record_inventory(0, 1, supply.view(), technosphere.view(), inventory.view())
            .unwrap();
        assert_eq!(results.technosphere_flows(0, 1).unwrap().to_vec(), vec![1.0, 1.0]);
        assert_eq!(results.inventory(0, 1).unwrap().to_vec(), vec![2.0, 3.0]);
        assert!(results.scaling_factors(0, 0).is_none());

        let characterized = array![[2.0, 2.0], [0.0, 6.0]];
        results.record_impact((0, 0, 1), 10.0, characterized.view()).unwrap();
        assert_eq!(results.lca_scores()[[0, 0, 1]], 10.0);
        assert_eq!(results.scenario_scores(1)[[0, 0]], 10.0);
        assert_eq!(
            results.elementary_flow_contributions().slice(s![0, 0, 1, ..]).to_vec(),
            vec![4.0, 6.0]
        );
        assert_eq!(
            results.process_contributions().slice(s![0, 0, 1, ..]).to_vec(),
            vec![2.0, 8.0]
        );
        assert!(results.is_computed(0, 0, 1));
        assert!(!results.is_complete());
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let mut results = ScenarioResults::new(1, 1, 1, 2, 2);
        let wrong = Array2::<f64>::zeros((3, 2));
        assert!(matches!(
            results.record_impact((0, 0, 0), 1.0, wrong.view()),
            Err(EngineError::ShapeMismatch { .. })
        ));
        assert!(!results.is_computed(0, 0, 0));
    }
}
