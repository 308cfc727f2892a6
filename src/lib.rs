//! # lca-scenarios - Scenario-aware LCA recalculation
//!
//! Two engines sit at the core of this crate:
//!
//! - **`ParameterRecalculator`**: evaluates formula parameters scope by scope
//!   (project, database, activity group), optionally with a positional
//!   scenario vector substituted for the persisted amounts.
//! - **`ScenarioMatrixEngine`**: drives an LCA engine context through the
//!   columns of a scenario resource and records scores, contributions and
//!   inventories per `(functional unit, method, scenario)`.
//!
//! The LCA computation itself sits behind the [`LcaEngine`] and
//! [`LcaEngineFactory`] traits; [`DenseLcaModel`] is a small dense
//! implementation of both.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lca_scenarios::{ParameterRecalculator, ParameterRecord, ParameterScope};
//! use lca_scenarios::storage::InMemoryParameterStore;
//!
//! let store = Arc::new(InMemoryParameterStore::from_records([
//!     ParameterRecord::new("p", ParameterScope::Project, 2.0),
//!     ParameterRecord::new("q", ParameterScope::Project, 0.0).with_formula("p * 3"),
//! ])?);
//!
//! let recalc = ParameterRecalculator::build(store, Some(&[5.0, 0.0]))?;
//! let project = recalc.recalculate_project()?.unwrap_or_default();
//! assert_eq!(project["q"], 15.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod error;
pub mod formula;
pub mod scope;

// Collaborators and backends
pub mod config;
pub mod lca;
pub mod storage;

// Recalculation
pub mod parameter;
pub mod scenario;

// Re-export primary types at crate root for convenience
pub use config::{EngineConfig, LcaConfig, RecomputeMode};
pub use error::{ExecutionError, LcaError, LcaResult, ValidationError};
pub use formula::{FormulaError, FormulaSet};
pub use lca::{
    ActivityKey, CalculationSetup, DenseLcaModel, EngineError, FunctionalUnit, LcaEngine,
    LcaEngineFactory, MethodId,
};
pub use parameter::{ParameterRecalculator, ParameterValue, ParameterValueStore};
pub use scenario::{
    ScenarioBatch, ScenarioIndexer, ScenarioMatrixEngine, ScenarioResource, ScenarioResults,
    ScenarioTable,
};
pub use scope::{ParameterScope, ScopeKind};
pub use storage::{
    ParameterDefinition, ParameterRecord, ParameterStore, ScenarioRegistry, SetupStore,
    StorageError,
};
