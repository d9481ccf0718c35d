use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use decp_core::enums::RecordKind;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Import a DECP document from disk.
    Import(ImportArgs),
    /// Download every configured source and import it.
    Fetch(FetchArgs),
    /// Clear imported data.
    Reset(ResetArgs),
    /// Fill in organization names from the company registry.
    Enrich,
    /// List the registered JSON Schemas, or print one.
    Schema(SchemaArgs),
    /// Load the CPV nomenclature.
    Cpv(CpvArgs),
    /// Load yearly key figures from an Infogreffe export.
    Infogreffe(InfogreffeArgs),
}

/// Record arrays to read from a document.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ImportKind {
    Marche,
    Concession,
    /// Contract awards, then concessions.
    #[default]
    All,
}

impl ImportKind {
    #[must_use]
    pub fn record_kinds(self) -> Vec<RecordKind> {
        match self {
            Self::Marche => vec![RecordKind::Marche],
            Self::Concession => vec![RecordKind::Concession],
            Self::All => vec![RecordKind::Marche, RecordKind::Concession],
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct ImportArgs {
    /// DECP JSON document.
    pub file: PathBuf,

    #[arg(long, value_enum, default_value_t = ImportKind::All)]
    pub kind: ImportKind,

    /// Items per commit (defaults to `database.batch_size`).
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Clone, Debug, Args)]
pub struct FetchArgs {
    /// Clear organizations, places and the CPV table too.
    #[arg(long)]
    pub from_scratch: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ResetArgs {
    /// Also clear organizations, places and the CPV table.
    #[arg(long)]
    pub all: bool,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Schema name; omit to list every name.
    pub name: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct CpvArgs {
    /// Semicolon-separated CPV nomenclature (Latin-1).
    pub file: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct InfogreffeArgs {
    /// Semicolon-separated "chiffres clés" export with three year blocks.
    pub file: PathBuf,
}
