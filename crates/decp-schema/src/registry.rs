//! Central schema registry.
//!
//! The `SchemaRegistry` holds the input schemas used to validate raw DECP
//! records (compiled once at construction) and the output schemas of the
//! `decp-core` types generated with [`schemars::schema_for!`], for export.

use std::collections::HashMap;

use jsonschema::error::ValidationErrorKind;
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::definitions;
use crate::error::SchemaError;
use crate::failure::{FieldError, LocSegment, ValidationFailure, pointer_to_loc};
use crate::records::{ConcessionRecord, MarcheRecord};
use crate::repair;

/// Input schema of contract awards notified from 2024 on.
pub const MARCHE: &str = "decp_marche";
/// Input schema of older contract awards.
pub const MARCHE_LENIENT: &str = "decp_marche_ancien";
/// Input schema of concessions.
pub const CONCESSION: &str = "decp_concession";

/// First notification year using the current contract format.
pub const CURRENT_FORMAT_YEAR: i32 = 2024;

/// The two contract award formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarcheVariant {
    Current,
    Lenient,
}

impl MarcheVariant {
    /// Pick the format from the raw record's notification year.
    ///
    /// A missing or unreadable date selects the lenient format, whose schema
    /// then reports the date itself.
    #[must_use]
    pub fn for_record(raw: &Value) -> Self {
        let year = raw
            .get("dateNotification")
            .and_then(Value::as_str)
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok());
        match year {
            Some(y) if y >= CURRENT_FORMAT_YEAR => Self::Current,
            _ => Self::Lenient,
        }
    }

    #[must_use]
    pub const fn schema_name(self) -> &'static str {
        match self {
            Self::Current => MARCHE,
            Self::Lenient => MARCHE_LENIENT,
        }
    }

    #[must_use]
    pub const fn is_current(self) -> bool {
        matches!(self, Self::Current)
    }
}

/// Insert a schemars-generated schema into the map.
macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        $map.insert(
            $name,
            serde_json::to_value(schema_for!($ty))
                .map_err(|e| SchemaError::Generation(format!("{}: {e}", $name)))?,
        );
    };
}

/// Central store of every JSON Schema used or produced by the pipeline.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, Value>,
    validators: HashMap<&'static str, jsonschema::Validator>,
}

impl SchemaRegistry {
    /// Build the registry and compile the input schemas.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Generation` if a schema fails to compile.
    pub fn new() -> Result<Self, SchemaError> {
        let mut schemas = HashMap::new();

        // --- Input records (3) ---
        schemas.insert(MARCHE, definitions::marche(true));
        schemas.insert(MARCHE_LENIENT, definitions::marche(false));
        schemas.insert(CONCESSION, definitions::concession());

        let mut validators = HashMap::new();
        for name in [MARCHE, MARCHE_LENIENT, CONCESSION] {
            let validator = jsonschema::validator_for(&schemas[name])
                .map_err(|e| SchemaError::Generation(format!("{name}: {e}")))?;
            validators.insert(name, validator);
        }

        // --- Persisted entities (6) ---
        register!(schemas, "organization", decp_core::entities::Organization);
        register!(schemas, "place", decp_core::entities::Place);
        register!(
            schemas,
            "organization_financials",
            decp_core::entities::OrganizationFinancials
        );
        register!(schemas, "contract", decp_core::entities::Contract);
        register!(schemas, "concession", decp_core::entities::Concession);
        register!(
            schemas,
            "malformed_record",
            decp_core::entities::MalformedRecord
        );

        // --- CLI responses (5) ---
        register!(schemas, "run_stats", decp_core::responses::RunStats);
        register!(
            schemas,
            "enrichment_report",
            decp_core::responses::EnrichmentReport
        );
        register!(schemas, "reset_response", decp_core::responses::ResetResponse);
        register!(
            schemas,
            "cpv_import_report",
            decp_core::responses::CpvImportReport
        );
        register!(
            schemas,
            "financials_import_report",
            decp_core::responses::FinancialsImportReport
        );

        Ok(Self {
            schemas,
            validators,
        })
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// Input schemas use their precompiled validator; output schemas are
    /// compiled on demand.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if the schema name is unknown, or
    /// `SchemaError::Failed` carrying every field error.
    pub fn validate(&self, name: &str, instance: &Value) -> Result<(), SchemaError> {
        let errors = if let Some(validator) = self.validators.get(name) {
            collect_errors(validator, instance)
        } else {
            let schema = self
                .get(name)
                .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;
            let validator = jsonschema::validator_for(schema)
                .map_err(|e| SchemaError::Generation(format!("{e}")))?;
            collect_errors(&validator, instance)
        };

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Failed(ValidationFailure::new(errors)))
        }
    }

    /// Validate a raw contract award and read it as a typed record.
    ///
    /// The format is chosen from the notification year before anything else
    /// is checked, and exactly one schema is applied.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Failed` when the record is invalid.
    pub fn parse_marche(&self, raw: &Value) -> Result<MarcheRecord, SchemaError> {
        let variant = MarcheVariant::for_record(raw);
        let mut value = raw.clone();
        repair::repair_marche(&mut value, variant.is_current());
        self.validate(variant.schema_name(), &value)?;
        typed(value)
    }

    /// Validate a raw concession and read it as a typed record.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Failed` when the record is invalid.
    pub fn parse_concession(&self, raw: &Value) -> Result<ConcessionRecord, SchemaError> {
        self.validate(CONCESSION, raw)?;
        typed(raw.clone())
    }

    /// List all registered schema names.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

fn typed<T: DeserializeOwned>(value: Value) -> Result<T, SchemaError> {
    serde_json::from_value(value).map_err(|e| SchemaError::Failed(ValidationFailure::parsing(&e)))
}

fn collect_errors(validator: &jsonschema::Validator, instance: &Value) -> Vec<FieldError> {
    validator
        .iter_errors(instance)
        .map(|e| {
            let mut loc = pointer_to_loc(&e.instance_path.to_string(), instance);
            let kind = match &e.kind {
                ValidationErrorKind::Required { property } => {
                    loc.push(LocSegment::Key(
                        property.to_string().trim_matches('"').to_string(),
                    ));
                    "missing"
                }
                ValidationErrorKind::Type { .. } => "type_error",
                ValidationErrorKind::Pattern { .. } => "string_pattern_mismatch",
                ValidationErrorKind::Minimum { .. } => "greater_than_equal",
                ValidationErrorKind::Maximum { .. } => "less_than_equal",
                ValidationErrorKind::MinLength { .. } => "string_too_short",
                ValidationErrorKind::MaxLength { .. } => "string_too_long",
                ValidationErrorKind::Enum { .. } => "enum",
                _ => "value_error",
            };
            FieldError::new(kind, loc, e.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().unwrap()
    }

    #[test]
    fn registry_has_expected_count() {
        // 3 inputs + 6 entities + 5 responses
        assert_eq!(registry().schema_count(), 14);
    }

    #[test]
    fn registry_list_is_sorted() {
        let names = registry().list();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn unknown_schema_is_not_found() {
        let err = registry().validate("nope", &json!({})).unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(_)));
    }

    #[test]
    fn variant_follows_notification_year() {
        assert_eq!(
            MarcheVariant::for_record(&json!({ "dateNotification": "2024-01-01" })),
            MarcheVariant::Current
        );
        assert_eq!(
            MarcheVariant::for_record(&json!({ "dateNotification": "2023-12-31" })),
            MarcheVariant::Lenient
        );
        assert_eq!(MarcheVariant::for_record(&json!({})), MarcheVariant::Lenient);
        assert_eq!(
            MarcheVariant::for_record(&json!({ "dateNotification": "n/a" })),
            MarcheVariant::Lenient
        );
    }

    #[test]
    fn output_schema_validates_entities() {
        let stats = decp_core::responses::RunStats::new(
            decp_core::enums::RecordKind::Marche,
            1,
            0,
            1,
            3,
        );
        let instance = serde_json::to_value(stats).unwrap();
        assert!(registry().validate("run_stats", &instance).is_ok());
    }

    #[test]
    fn missing_property_path_names_the_property() {
        let err = registry()
            .validate(CONCESSION, &json!({ "autoriteConcedante": {} }))
            .unwrap_err();
        let SchemaError::Failed(failure) = err else {
            panic!("expected a validation failure");
        };
        let locations: Vec<String> = failure.errors.iter().map(FieldError::location).collect();
        assert!(locations.contains(&"autoriteConcedante.id".to_string()));
        assert!(locations.contains(&"id".to_string()));
        assert!(failure.errors.iter().all(|e| e.kind == "missing"));
    }
}
