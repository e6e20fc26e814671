//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod aggregation;
pub mod entities;
pub mod error;
pub mod mutator;
pub mod query;
pub mod validator;

pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use mutator::OrgMutator;
pub use validator::{OrgValidator, ValidationOutcome};
