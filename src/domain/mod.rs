//! Domain aggregates exposed by the client registry.

pub mod client;
pub mod rut;
pub mod types;
