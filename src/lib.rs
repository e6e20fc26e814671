//! orgctl: organization hierarchy editor with budget and headcount roll-ups
//!
//! The organization is one rooted tree of typed, cost-center-tagged units,
//! persisted as a single JSON document. Layers:
//!
//! - `domain`: entities, validation, tree mutation, and metric aggregation
//! - `application`: services orchestrating domain logic over the store
//! - `infrastructure`: filesystem boundary, document store, DI container
//! - `cli`: argument parsing, dispatch, and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
