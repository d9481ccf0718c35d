//! Repairs for known quirks of the DECP feed.
//!
//! Publishers write `"NC"` ("non communiqué") where a count is unknown, and
//! sometimes send counts as strings. Both are normalized on a working copy of
//! the record before validation; the stored raw payload is never touched.

use serde_json::Value;

const NOT_DISCLOSED: &str = "NC";

/// Read `"NC"` as null and a numeric string as an integer.
///
/// Anything else is left for the schema to reject.
fn normalize_count(value: &mut Value) {
    let Value::String(s) = value else {
        return;
    };
    if s == NOT_DISCLOSED {
        *value = Value::Null;
    } else if let Ok(n) = s.trim().parse::<i64>() {
        *value = Value::from(n);
    }
}

/// Repair a contract award record in place.
///
/// `offresRecues` is only repaired for the lenient format; the current format
/// requires a real count.
pub fn repair_marche(record: &mut Value, current_format: bool) {
    if !current_format {
        if let Some(offers) = record.get_mut("offresRecues") {
            normalize_count(offers);
        }
    }

    if let Some(Value::Array(amendments)) = record.get_mut("modificationsActesSousTraitance") {
        for item in amendments {
            if let Some(duration) = item
                .get_mut("modificationActeSousTraitance")
                .and_then(|a| a.get_mut("dureeMois"))
            {
                normalize_count(duration);
            }
        }
    }
}
