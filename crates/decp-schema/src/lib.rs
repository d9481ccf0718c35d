//! # decp-schema
//!
//! Validation of raw DECP records.
//!
//! This crate provides:
//! - `SchemaRegistry`: central store of the input schemas (one per record
//!   variant) and of the output schemas generated from `decp-core` types
//! - Two-stage dispatch of contract records to the variant matching their
//!   notification year
//! - Repairs for known feed quirks (`"NC"` placeholders)
//! - Typed records handed to the transformer once a raw object validates
//! - `ValidationFailure`, the structured error list kept for rejected items
//!
//! ## Architecture
//!
//! Input schemas are plain JSON Schema documents built in `definitions`, with
//! enum vocabularies taken from the `decp-core` code tables so the two can never
//! drift apart. Validation runs the compiled schema first and only then
//! deserializes into the typed records, so serde never sees an invalid shape.

pub mod definitions;
pub mod error;
pub mod failure;
pub mod records;
pub mod registry;
pub mod repair;

pub use error::SchemaError;
pub use failure::{FieldError, LocSegment, ValidationFailure};
pub use registry::{MarcheVariant, SchemaRegistry};
