//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements I/O boundary traits, the document store, and
//! wires up services.

pub mod di;
pub mod store;
pub mod traits;

pub use store::OrgStore;
