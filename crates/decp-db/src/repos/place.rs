//! Place repository.

use decp_core::entities::Place;
use decp_core::enums::PlaceKind;

use crate::DecpDb;
use crate::error::DatabaseError;

fn row_to_place(row: &libsql::Row) -> Result<Place, DatabaseError> {
    Ok(Place {
        uid: row.get::<i64>(0)?,
        code: row.get::<String>(1)?,
        kind: PlaceKind::from_code(row.get::<i64>(2)?)?,
    })
}

pub(crate) async fn insert_place(
    conn: &libsql::Connection,
    place: &Place,
) -> Result<(), DatabaseError> {
    let kind = place.kind.code().ok_or_else(|| {
        DatabaseError::InvalidState(format!("place kind '{}' has no code", place.kind))
    })?;
    conn.execute(
        "INSERT INTO places (uid, code, kind) VALUES (?1, ?2, ?3)",
        libsql::params![place.uid, place.code.as_str(), kind],
    )
    .await?;
    Ok(())
}

impl DecpDb {
    /// Every place, for the resolver preload.
    pub async fn load_places(&self) -> Result<Vec<Place>, DatabaseError> {
        let mut rows = self
            .query("SELECT uid, code, kind FROM places ORDER BY uid", ())
            .await?;
        let mut places = Vec::new();
        while let Some(row) = rows.next().await? {
            places.push(row_to_place(&row)?);
        }
        Ok(places)
    }

    pub async fn get_place(&self, uid: i64) -> Result<Place, DatabaseError> {
        let mut rows = self
            .query("SELECT uid, code, kind FROM places WHERE uid = ?1", [uid])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_place(&row)
    }

    pub async fn count_places(&self) -> Result<i64, DatabaseError> {
        self.query_i64("SELECT COUNT(*) FROM places", ()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn insert_and_load() {
        let db = DecpDb::open_local(":memory:").await.unwrap();
        let place = Place {
            uid: 7,
            code: "75056".to_string(),
            kind: PlaceKind::Municipality,
        };
        insert_place(db.conn(), &place).await.unwrap();
        assert_eq!(db.get_place(7).await.unwrap(), place);
        assert_eq!(db.load_places().await.unwrap(), vec![place]);
    }

    #[tokio::test]
    async fn unknown_kind_code_is_fatal() {
        let db = DecpDb::open_local(":memory:").await.unwrap();
        db.execute("INSERT INTO places (uid, code, kind) VALUES (1, '75', 99)", ())
            .await
            .unwrap();
        let err = db.load_places().await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(_)));
    }
}
