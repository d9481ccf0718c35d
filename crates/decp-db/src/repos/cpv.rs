//! CPV nomenclature: reference table of procurement vocabulary labels.

use crate::DecpDb;
use crate::error::DatabaseError;

/// One CPV code and its French label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpvEntry {
    pub code: String,
    pub label: String,
}

/// Length of a CPV code without its check digit.
const CODE_LEN: usize = 8;

/// Parse the published nomenclature file.
///
/// The file is Latin-1, semicolon-separated, with a header line. The first
/// column holds the code (check digit dropped), the second the label.
///
/// # Errors
///
/// Returns `csv::Error` if a line cannot be read as CSV.
pub fn parse_cpv_file(bytes: &[u8]) -> Result<Vec<CpvEntry>, csv::Error> {
    let text: String = bytes.iter().map(|&b| char::from(b)).collect();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let (Some(code), Some(label)) = (record.get(0), record.get(1)) else {
            continue;
        };
        let code: String = code.trim().chars().take(CODE_LEN).collect();
        if code.is_empty() {
            continue;
        }
        entries.push(CpvEntry {
            code,
            label: label.trim().to_string(),
        });
    }
    Ok(entries)
}

impl DecpDb {
    /// Replace the whole CPV table in one transaction.
    ///
    /// A code listed twice keeps its last label.
    pub async fn replace_cpv(&self, entries: &[CpvEntry]) -> Result<u64, DatabaseError> {
        let tx = self.conn().transaction().await?;
        tx.execute("DELETE FROM cpv", ()).await?;
        for entry in entries {
            tx.execute(
                "INSERT OR REPLACE INTO cpv (code, label) VALUES (?1, ?2)",
                libsql::params![entry.code.as_str(), entry.label.as_str()],
            )
            .await?;
        }
        tx.commit().await?;
        self.count_cpv()
            .await
            .map(|n| u64::try_from(n).unwrap_or_default())
    }

    pub async fn cpv_label(&self, code: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .query("SELECT label FROM cpv WHERE code = ?1", [code])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    pub async fn count_cpv(&self) -> Result<i64, DatabaseError> {
        self.query_i64("SELECT COUNT(*) FROM cpv", ()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // "Équipements" with É encoded as Latin-1 0xC9.
    const FILE: &[u8] = b"CODE;FR\n45000000-7;Travaux de construction\n\
        30200000-1;\xC9quipement et fournitures informatiques\n\
        \"79400000-8\";\"Conseil; gestion\"\n";

    #[test]
    fn parses_latin1_semicolon_file() {
        let entries = parse_cpv_file(FILE).unwrap();
        assert_eq!(
            entries,
            vec![
                CpvEntry {
                    code: "45000000".to_string(),
                    label: "Travaux de construction".to_string(),
                },
                CpvEntry {
                    code: "30200000".to_string(),
                    label: "Équipement et fournitures informatiques".to_string(),
                },
                CpvEntry {
                    code: "79400000".to_string(),
                    label: "Conseil; gestion".to_string(),
                },
            ]
        );
    }

    #[test]
    fn header_only_file_is_empty() {
        assert!(parse_cpv_file(b"CODE;FR\n").unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_clears_previous_codes() {
        let db = DecpDb::open_local(":memory:").await.unwrap();
        let first = parse_cpv_file(FILE).unwrap();
        assert_eq!(db.replace_cpv(&first).await.unwrap(), 3);

        let second = vec![CpvEntry {
            code: "60100000".to_string(),
            label: "Services de transport routier".to_string(),
        }];
        assert_eq!(db.replace_cpv(&second).await.unwrap(), 1);
        assert_eq!(db.cpv_label("45000000").await.unwrap(), None);
        assert_eq!(
            db.cpv_label("60100000").await.unwrap().as_deref(),
            Some("Services de transport routier")
        );
    }
}
