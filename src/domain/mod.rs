//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep records, tables, categories and report structs in one place.
//! - Avoid cyclic imports and duplicated type definitions.
//! - Make JSON output schema changes explicit and reviewable.
//!
//! ## Files
//! - `models.rs`: records, tables, categories, settings, run reports.
//! - `constants.rs`: field names, endpoint and header constants.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/network side effects.
//!
//! ## Compatibility note
//! `RunReport` is the `--json` output of `run`. Keep schema-impacting changes
//! synchronized with `docs/contracts/run-report.schema.json`.

pub mod constants;
pub mod models;
