//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. Dates are stored as ISO `YYYY-MM-DD` text, booleans as 0/1 and
//! code-table values as their integer code.

use chrono::NaiveDate;
use decp_core::errors::CoreError;

use crate::error::DatabaseError;

/// Storage format of every date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a required TEXT column as `NaiveDate`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string is not an ISO date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| DatabaseError::Query(format!("Failed to parse date '{s}': {e}")))
}

/// Read a required date column.
///
/// # Errors
///
/// Returns `DatabaseError` if the column is NULL or not an ISO date.
pub fn get_date(row: &libsql::Row, idx: i32) -> Result<NaiveDate, DatabaseError> {
    parse_date(&row.get::<String>(idx)?)
}

/// Read a nullable date column.
///
/// # Errors
///
/// Returns `DatabaseError` if a non-empty value is not an ISO date.
pub fn get_opt_date(row: &libsql::Row, idx: i32) -> Result<Option<NaiveDate>, DatabaseError> {
    get_opt_string(row, idx)?
        .map(|s| parse_date(&s))
        .transpose()
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
/// You must use `get::<Option<String>>()` for nullable columns.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read a 0/1 INTEGER column as `bool`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Read a nullable code-table column through its decoder.
///
/// # Errors
///
/// Returns `DatabaseError::Core` if the stored code is unknown to the table.
pub fn get_opt_code<T>(
    row: &libsql::Row,
    idx: i32,
    decode: fn(i64) -> Result<T, CoreError>,
) -> Result<Option<T>, DatabaseError> {
    Ok(row.get::<Option<i64>>(idx)?.map(decode).transpose()?)
}

/// Bind an optional date as TEXT or NULL.
#[must_use]
pub fn date_value(date: Option<NaiveDate>) -> libsql::Value {
    date.map_or(libsql::Value::Null, |d| libsql::Value::Text(d.to_string()))
}

/// Bind an optional integer as INTEGER or NULL.
#[must_use]
pub fn int_value(n: Option<i64>) -> libsql::Value {
    n.map_or(libsql::Value::Null, libsql::Value::Integer)
}

/// Bind an optional float as REAL or NULL.
#[must_use]
pub fn real_value(x: Option<f64>) -> libsql::Value {
    x.map_or(libsql::Value::Null, libsql::Value::Real)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_iso_date() {
        let d = parse_date("2024-03-12").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
    }

    #[test]
    fn parse_date_rejects_datetime() {
        assert!(parse_date("2024-03-12 10:00:00").is_err());
    }

    #[test]
    fn date_value_round_trips_through_text() {
        let d = NaiveDate::from_ymd_opt(2019, 9, 2).unwrap();
        assert!(matches!(date_value(Some(d)), libsql::Value::Text(s) if s == "2019-09-02"));
        assert!(matches!(date_value(None), libsql::Value::Null));
    }

    #[test]
    fn optional_numbers_bind_null() {
        assert!(matches!(int_value(None), libsql::Value::Null));
        assert!(matches!(int_value(Some(3)), libsql::Value::Integer(3)));
        assert!(matches!(real_value(Some(0.5)), libsql::Value::Real(x) if (x - 0.5).abs() < f64::EPSILON));
    }
}
