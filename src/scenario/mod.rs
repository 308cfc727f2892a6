//! Scenario resources, scenario-aware multi-LCA and scenario tables.

mod batch;
mod engine;
mod indexer;
mod names;
mod resource;
mod results;
mod table;

pub use batch::{ResolvedScopes, ScenarioBatch};
pub use engine::ScenarioMatrixEngine;
pub use indexer::ScenarioIndexer;
pub use names::{default_names, scenario_names};
pub use resource::{ResourceId, ResourceMetadata, ScenarioResource};
pub use results::{ScenarioResults, UnitMethodScenario, UnitScenario};
pub use table::{ScenarioTable, TableRow};
