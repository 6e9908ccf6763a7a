//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `run.rs`: the monitoring pass.
//! - `inspect.rs`: categories/snapshot/render, local read-mostly commands.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Keep behavior and output schema stable.

pub mod inspect;
pub mod run;

pub use inspect::handle_inspect_commands;
pub use run::handle_run_command;
