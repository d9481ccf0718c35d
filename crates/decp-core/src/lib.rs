//! # decp-core
//!
//! Core types and error types for the DECP import pipeline.
//!
//! This crate provides the foundational types shared across all DECP crates:
//! - Entity structs for the persisted procurement model (contracts, concessions,
//!   organizations, places, malformed records)
//! - Code tables mapping feed labels to compact persisted codes
//! - CPV-based contract categorisation
//! - Cross-cutting error types
//! - Run statistics returned by the importer

pub mod categorisation;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod responses;
