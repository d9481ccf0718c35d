//! Repository modules for the DECP store.
//!
//! Each module adds methods to `DecpDb` via `impl DecpDb` blocks. Row writers
//! used by the import batch take a plain `&libsql::Connection` so they run
//! unchanged inside a transaction.

pub mod concession;
pub mod contract;
pub mod cpv;
pub mod financials;
pub mod maintenance;
pub mod malformed;
pub mod organization;
pub mod place;

/// Write an ordered list of integer codes for one owner row.
pub(crate) async fn insert_codes(
    conn: &libsql::Connection,
    table: &str,
    owner_column: &str,
    owner_uid: i64,
    code_table: &str,
    codes: impl IntoIterator<Item = Option<i64>>,
) -> Result<(), crate::error::DatabaseError> {
    let sql = format!(
        "INSERT INTO {table} ({owner_column}, code_table, position, code) VALUES (?1, ?2, ?3, ?4)"
    );
    for (position, code) in codes.into_iter().flatten().enumerate() {
        conn.execute(
            &sql,
            libsql::params![owner_uid, code_table, position as i64, code],
        )
        .await?;
    }
    Ok(())
}

/// Read back an ordered list of integer codes for one owner row.
pub(crate) async fn load_codes(
    conn: &libsql::Connection,
    table: &str,
    owner_column: &str,
    owner_uid: i64,
    code_table: &str,
) -> Result<Vec<i64>, crate::error::DatabaseError> {
    let sql = format!(
        "SELECT code FROM {table} WHERE {owner_column} = ?1 AND code_table = ?2 ORDER BY position"
    );
    let mut rows = conn
        .query(&sql, libsql::params![owner_uid, code_table])
        .await?;
    let mut codes = Vec::new();
    while let Some(row) = rows.next().await? {
        codes.push(row.get::<i64>(0)?);
    }
    Ok(codes)
}

/// Write an ordered organization list (sellers, concessionaires).
pub(crate) async fn insert_members(
    conn: &libsql::Connection,
    table: &str,
    owner_column: &str,
    owner_uid: i64,
    organization_uids: &[i64],
) -> Result<(), crate::error::DatabaseError> {
    let sql = format!(
        "INSERT INTO {table} ({owner_column}, position, organization_uid) VALUES (?1, ?2, ?3)"
    );
    for (position, org_uid) in organization_uids.iter().enumerate() {
        conn.execute(&sql, libsql::params![owner_uid, position as i64, *org_uid])
            .await?;
    }
    Ok(())
}

/// Read back an ordered organization list.
pub(crate) async fn load_members(
    conn: &libsql::Connection,
    table: &str,
    owner_column: &str,
    owner_uid: i64,
) -> Result<Vec<i64>, crate::error::DatabaseError> {
    let sql = format!(
        "SELECT organization_uid FROM {table} WHERE {owner_column} = ?1 ORDER BY position"
    );
    let mut rows = conn.query(&sql, [owner_uid]).await?;
    let mut uids = Vec::new();
    while let Some(row) = rows.next().await? {
        uids.push(row.get::<i64>(0)?);
    }
    Ok(uids)
}
