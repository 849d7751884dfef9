//! Database row models and configuration types.

pub mod client;
pub mod config;
