//! Action declaration and choice resolution.
//!
//! - `action`: typed action definitions and their type-erased engine view
//! - `choice`: fixed / flat / recursive choice declarations
//! - `resolver`: the explicit tree walk expanding choices into actions

pub mod action;
pub mod choice;
pub mod resolver;

pub use action::{ActionDef, ActionEntry, ActionParameter, Actionable};
pub use choice::{ChoiceScope, ChoiceSpec, RecursiveChoice, SampleSizes};
pub use resolver::ChoiceInfo;
