//! # Covenant Node
//!
//! Hosts one in-memory covenant deployment and replays JSON call scripts
//! against it, reporting every call's result or revert reason.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod runner;
pub mod script;

pub use runner::{RunReport, Runner, ScriptService, StepReport};
pub use script::{parse_address, parse_script, Script, Step};
