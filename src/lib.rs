//! Client record validation and access layer for a tax-consulting firm's
//! client registry.
//!
//! The crate is organized around four pieces: the tax-identifier validator
//! ([`domain::rut`]), the record schema gating every write ([`forms`]), the
//! record store gateway ([`repository`] plus [`services`]), and the
//! per-view collection controller ([`controller`]) that keeps a local page
//! of records synchronized with the store under optimistic edits.

pub mod controller;
pub mod db;
pub mod domain;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod schema;
pub mod services;
