//! Storage layer for parameters, scenario resources and calculation setups.
//!
//! The recalculation core talks to storage only through the traits
//! re-exported here; the backends here are the in-memory reference implementation,
//! a JSON file store and a filesystem scenario package directory.

mod document;
mod json;
mod memory;
mod packages;
mod traits;

pub use json::JsonParameterStore;
pub use memory::{InMemoryParameterStore, InMemoryScenarioRegistry, InMemorySetupStore};
pub use packages::{PackageDirectory, MANIFEST};
pub use traits::{
    is_valid_parameter_name, ParameterDefinition, ParameterRecord, ParameterStore,
    ScenarioRegistry, SetupStore, StorageError,
};
