//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `pipeline.rs`: per-category fetch/filter/diff/notify/persist pass.
//! - `recency.rs`: event-date parsing and the trailing-window filter.
//! - `differ.rs`: business-key delta between two tables.
//! - `message.rs`: text/markdown/card rendering of a delta.
//! - `notifier.rs`: webhook delivery.
//! - `snapshot.rs`: per-category CSV snapshot persistence.
//! - `settings.rs`: TOML settings loading and validation.
//! - `output.rs`: JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible (`recency`, `differ`, `message`).
//! - Side effects should be explicit and localized (`snapshot`, `notifier`).
//! - Keep command handlers thin; delegate to services.

pub mod differ;
pub mod message;
pub mod notifier;
pub mod output;
pub mod pipeline;
pub mod recency;
pub mod settings;
pub mod snapshot;
