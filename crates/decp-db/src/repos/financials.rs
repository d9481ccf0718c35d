//! Registry key figures (Infogreffe): yearly turnover, result and headcount
//! of organizations, matched by SIRET.
//!
//! The export is semicolon-separated with a header line. Each line describes
//! one establishment (SIREN and NIC columns) and carries up to three financial
//! years, each as a block of six columns starting with the year
//! (`millesime_N`): year, closing date, duration, turnover, result, headcount.

use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

use decp_core::entities::OrganizationFinancials;
use decp_core::enums::IdentifierKind;
use decp_core::responses::FinancialsImportReport;
use thiserror::Error;
use tracing::info;

use crate::DecpDb;
use crate::error::DatabaseError;
use crate::helpers::{int_value, real_value};
use crate::import::Utf8FilterReader;

const SIREN_COLUMN: usize = 1;
const NIC_COLUMN: usize = 2;

/// First column of each year block, with the header it must carry.
const YEAR_BLOCKS: [(usize, &str); 3] = [
    (19, "millesime_1"),
    (25, "millesime_2"),
    (31, "millesime_3"),
];

const TURNOVER_OFFSET: usize = 3;
const NET_INCOME_OFFSET: usize = 4;
const HEADCOUNT_OFFSET: usize = 5;

/// Errors raised while loading a key-figures export.
#[derive(Debug, Error)]
pub enum FinancialsError {
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The header line does not match the expected export layout.
    #[error("unexpected file layout: column {column} should be '{expected}', found '{found}'")]
    Layout {
        column: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}, column {column}: '{value}' is not a valid {what}")]
    Value {
        line: u64,
        column: usize,
        value: String,
        what: &'static str,
    },

    /// Figures can only be attached to organizations already imported.
    #[error("no SIRET organization in the store, import DECP records first")]
    NoOrganizations,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Figures of one financial year, before matching.
#[derive(Debug, Clone, PartialEq)]
pub struct YearFigures {
    pub year: i32,
    pub turnover: Option<f64>,
    pub net_income: Option<f64>,
    pub headcount: Option<i64>,
}

/// One line of the export.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialsLine {
    pub siret: String,
    /// Only the years with at least one figure.
    pub years: Vec<YearFigures>,
}

/// Line-by-line reader over a key-figures export.
///
/// Bytes that are not valid UTF-8 are dropped before parsing.
pub struct FinancialsReader<R> {
    records: csv::StringRecordsIntoIter<Utf8FilterReader<R>>,
}

impl<R: Read> FinancialsReader<R> {
    /// Check the header line and position the reader on the first data line.
    ///
    /// # Errors
    ///
    /// Returns `FinancialsError::Layout` if a year column is missing or
    /// misplaced.
    pub fn new(reader: R) -> Result<Self, FinancialsError> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(Utf8FilterReader::new(reader));

        let headers = csv.headers()?;
        for (column, expected) in YEAR_BLOCKS {
            let found = headers.get(column).unwrap_or_default().trim();
            if found != expected {
                return Err(FinancialsError::Layout {
                    column,
                    expected,
                    found: found.to_string(),
                });
            }
        }

        Ok(Self {
            records: csv.into_records(),
        })
    }
}

impl<R: Read> Iterator for FinancialsReader<R> {
    type Item = Result<FinancialsLine, FinancialsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(parse_line(&record))
    }
}

fn parse_line(record: &csv::StringRecord) -> Result<FinancialsLine, FinancialsError> {
    let field = |column: usize| record.get(column).map_or("", str::trim);
    let line = record.position().map_or(0, csv::Position::line);

    let mut years = Vec::new();
    for (start, _) in YEAR_BLOCKS {
        let (turnover_col, net_income_col, headcount_col) = (
            start + TURNOVER_OFFSET,
            start + NET_INCOME_OFFSET,
            start + HEADCOUNT_OFFSET,
        );
        let turnover: Option<f64> = parse_opt(field(turnover_col), line, turnover_col, "amount")?;
        let net_income: Option<f64> =
            parse_opt(field(net_income_col), line, net_income_col, "amount")?;
        let headcount: Option<i64> =
            parse_opt(field(headcount_col), line, headcount_col, "headcount")?;
        if turnover.is_none() && net_income.is_none() && headcount.is_none() {
            continue;
        }

        let year = parse_opt(field(start), line, start, "year")?.ok_or_else(|| {
            FinancialsError::Value {
                line,
                column: start,
                value: String::new(),
                what: "year",
            }
        })?;
        years.push(YearFigures {
            year,
            turnover,
            net_income,
            headcount,
        });
    }

    Ok(FinancialsLine {
        siret: format!("{}{}", field(SIREN_COLUMN), field(NIC_COLUMN)),
        years,
    })
}

/// Empty is absent; anything else must parse.
fn parse_opt<T: FromStr>(
    value: &str,
    line: u64,
    column: usize,
    what: &'static str,
) -> Result<Option<T>, FinancialsError> {
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| FinancialsError::Value {
        line,
        column,
        value: value.to_string(),
        what,
    })
}

fn row_to_financials(row: &libsql::Row) -> Result<OrganizationFinancials, DatabaseError> {
    Ok(OrganizationFinancials {
        organization_uid: row.get::<i64>(0)?,
        year: i32::try_from(row.get::<i64>(1)?)
            .map_err(|e| DatabaseError::InvalidState(format!("financial year: {e}")))?,
        turnover: row.get::<Option<f64>>(2)?,
        net_income: row.get::<Option<f64>>(3)?,
        headcount: row.get::<Option<i64>>(4)?,
    })
}

impl DecpDb {
    /// SIRET of every SIRET-identified organization, mapped to its uid.
    pub async fn siret_index(&self) -> Result<HashMap<String, i64>, DatabaseError> {
        let mut rows = self
            .query(
                "SELECT identifier, uid FROM organizations WHERE identifier_kind = ?1",
                [IdentifierKind::Siret.as_str()],
            )
            .await?;
        let mut index = HashMap::new();
        while let Some(row) = rows.next().await? {
            index.insert(row.get::<String>(0)?, row.get::<i64>(1)?);
        }
        Ok(index)
    }

    /// Write a batch of figures in one transaction.
    pub async fn insert_financials(
        &self,
        figures: &[OrganizationFinancials],
    ) -> Result<(), DatabaseError> {
        let tx = self.conn().transaction().await?;
        for f in figures {
            tx.execute(
                "INSERT INTO organization_financials
                     (organization_uid, year, turnover, net_income, headcount)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params_from_iter(vec![
                    libsql::Value::Integer(f.organization_uid),
                    libsql::Value::Integer(i64::from(f.year)),
                    real_value(f.turnover),
                    real_value(f.net_income),
                    int_value(f.headcount),
                ]),
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Figures of one organization, oldest year first.
    pub async fn financials_for(
        &self,
        organization_uid: i64,
    ) -> Result<Vec<OrganizationFinancials>, DatabaseError> {
        let mut rows = self
            .query(
                "SELECT organization_uid, year, turnover, net_income, headcount
                 FROM organization_financials WHERE organization_uid = ?1 ORDER BY year, uid",
                [organization_uid],
            )
            .await?;
        let mut figures = Vec::new();
        while let Some(row) = rows.next().await? {
            figures.push(row_to_financials(&row)?);
        }
        Ok(figures)
    }

    pub async fn count_financials(&self) -> Result<i64, DatabaseError> {
        self.query_i64("SELECT COUNT(*) FROM organization_financials", ())
            .await
    }

    /// Replace every stored figure with those of a key-figures export.
    ///
    /// Lines whose SIRET is not a known organization are skipped. Figures are
    /// committed every `batch_size` matched lines. The header is checked, and
    /// at least one SIRET organization must exist, before anything is cleared.
    ///
    /// # Errors
    ///
    /// Returns `FinancialsError` on a layout mismatch, an unreadable value,
    /// an empty organization table or a storage failure. Batches committed
    /// before a failure stay.
    pub async fn load_financials<R: Read + Send>(
        &self,
        reader: R,
        batch_size: usize,
    ) -> Result<FinancialsImportReport, FinancialsError> {
        let lines = FinancialsReader::new(reader)?;
        let organizations = self.siret_index().await?;
        if organizations.is_empty() {
            return Err(FinancialsError::NoOrganizations);
        }
        info!(organizations = organizations.len(), "loading registry key figures");

        self.execute("DELETE FROM organization_financials", ())
            .await?;

        let batch_size = batch_size.max(1);
        let mut report = FinancialsImportReport {
            rows: 0,
            matched: 0,
            years: 0,
            batches_committed: 0,
        };
        let mut pending = Vec::new();

        for line in lines {
            let line = line?;
            report.rows += 1;
            let Some(&organization_uid) = organizations.get(&line.siret) else {
                continue;
            };
            report.matched += 1;
            pending.extend(line.years.into_iter().map(|y| OrganizationFinancials {
                organization_uid,
                year: y.year,
                turnover: y.turnover,
                net_income: y.net_income,
                headcount: y.headcount,
            }));

            if report.matched % batch_size as u64 == 0 {
                self.flush_financials(&mut pending, &mut report).await?;
            }
        }
        self.flush_financials(&mut pending, &mut report).await?;

        info!(
            rows = report.rows,
            matched = report.matched,
            years = report.years,
            "registry key figures loaded"
        );
        Ok(report)
    }

    async fn flush_financials(
        &self,
        pending: &mut Vec<OrganizationFinancials>,
        report: &mut FinancialsImportReport,
    ) -> Result<(), DatabaseError> {
        if pending.is_empty() {
            return Ok(());
        }
        self.insert_financials(pending).await?;
        report.years += pending.len() as u64;
        report.batches_committed += 1;
        info!(years = pending.len(), "committed key figures batch");
        pending.clear();
        Ok(())
    }
}
