//! Parameter values and scope recalculation.

mod recalculator;
mod values;

pub use recalculator::ParameterRecalculator;
pub use values::{ParameterValue, ParameterValueStore};
