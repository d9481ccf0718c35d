//! Malformed-record capture.
//!
//! A rejected item is stored verbatim with its field errors, linked to its
//! buyer when the buyer identifier can be read from the raw value.

use chrono::NaiveDate;
use serde_json::Value;
use serde_json::value::RawValue;
use tracing::debug;

use decp_core::entities::{MalformedRecord, RecordError};
use decp_core::enums::{IdentifierKind, RecordKind};
use decp_schema::ValidationFailure;

use super::transformer::RecordTransformer;
use crate::helpers::DATE_FORMAT;

impl RecordTransformer {
    /// Stage a malformed record for a rejected item.
    pub(super) fn reject(
        &mut self,
        kind: RecordKind,
        raw: &RawValue,
        value: &Value,
        failure: &ValidationFailure,
    ) {
        let organization_uid = value
            .get(kind.buyer_field())
            .and_then(|buyer| buyer.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(|id| self.resolver.organization(id, IdentifierKind::Siret, None));
        let created_on = value
            .get(kind.date_field())
            .and_then(Value::as_str)
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok());

        if let Some(first) = failure.errors.first() {
            debug!(
                kind = kind.as_str(),
                location = %first.location(),
                error = %first.kind,
                "record rejected"
            );
        }

        let errors = failure
            .errors
            .iter()
            .map(|e| RecordError {
                kind: e.kind.clone(),
                location: e.location(),
                message: e.message.clone(),
            })
            .collect();
        let uid = self.malformed_uids.next();
        self.malformed.push(MalformedRecord {
            uid,
            kind,
            payload: raw.get().to_string(),
            organization_uid,
            created_on,
            errors,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::EntityResolver;
    use decp_schema::FieldError;
    use pretty_assertions::assert_eq;

    fn failure() -> ValidationFailure {
        ValidationFailure::new(vec![
            FieldError::new("missing", Vec::new(), "first"),
            FieldError::new("enum", Vec::new(), "second"),
        ])
    }

    fn reject(t: &mut RecordTransformer, kind: RecordKind, text: &str) {
        let raw = RawValue::from_string(text.to_string()).unwrap();
        let value: Value = serde_json::from_str(text).unwrap();
        t.reject(kind, &raw, &value, &failure());
    }

    #[test]
    fn payload_is_kept_verbatim() {
        let text = r#"{ "id" : "X",  "acheteur": {"id": "21750001600019"}, "dateNotification": "2024-02-30" }"#;
        let mut t = RecordTransformer::new(EntityResolver::default());
        reject(&mut t, RecordKind::Marche, text);

        let record = &t.staged_malformed()[0];
        assert_eq!(record.payload, text);
        assert_eq!(record.created_on, None);
        assert_eq!(record.errors.len(), 2);
        assert_eq!(record.errors[1].message, "second");

        let buyer = t
            .resolver()
            .get_organization("21750001600019", IdentifierKind::Siret)
            .unwrap();
        assert_eq!(record.organization_uid, Some(buyer.uid));
        assert!(!buyer.is_buyer);
        assert!(!buyer.is_seller);
    }

    #[test]
    fn concession_uses_authority_and_signature_date() {
        let text = r#"{"autoriteConcedante": {"id": "20005478100022"}, "dateSignature": "2021-06-30"}"#;
        let mut t = RecordTransformer::new(EntityResolver::default());
        reject(&mut t, RecordKind::Concession, text);

        let record = &t.staged_malformed()[0];
        assert_eq!(record.kind, RecordKind::Concession);
        assert_eq!(record.created_on, NaiveDate::from_ymd_opt(2021, 6, 30));
        assert!(record.organization_uid.is_some());
    }

    #[test]
    fn unreadable_buyer_links_nothing() {
        let mut t = RecordTransformer::new(EntityResolver::default());
        reject(&mut t, RecordKind::Marche, r#"{"acheteur": {"id": 42}}"#);
        reject(&mut t, RecordKind::Marche, r#"{"acheteur": {"id": ""}}"#);
        reject(&mut t, RecordKind::Marche, "[1, 2]");

        assert!(t.staged_malformed().iter().all(|m| m.organization_uid.is_none()));
        assert_eq!(t.resolver().organization_count(), 0);
        let uids: Vec<i64> = t.staged_malformed().iter().map(|m| m.uid).collect();
        assert_eq!(uids, vec![1, 2, 3]);
    }
}
