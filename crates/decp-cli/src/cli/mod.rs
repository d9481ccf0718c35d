use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `decp` binary.
#[derive(Debug, Parser)]
#[command(name = "decp", version, about = "DECP public procurement importer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only, no progress)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::root_commands::ImportKind;
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn import_defaults() {
        let cli = Cli::try_parse_from(["decp", "import", "data.json"]).expect("cli should parse");
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.file.to_str(), Some("data.json"));
        assert_eq!(args.kind, ImportKind::All);
        assert_eq!(args.batch_size, None);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn import_kind_and_batch_size() {
        let cli = Cli::try_parse_from([
            "decp",
            "import",
            "data.json",
            "--kind",
            "concession",
            "--batch-size",
            "500",
        ])
        .expect("cli should parse");
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.kind, ImportKind::Concession);
        assert_eq!(args.batch_size, Some(500));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["decp", "reset", "--all", "--format", "raw", "--quiet"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Reset(ref args) if args.all));
    }

    #[test]
    fn fetch_from_scratch_flag() {
        let cli = Cli::try_parse_from(["decp", "--verbose", "fetch", "--from-scratch"])
            .expect("cli should parse");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Fetch(ref args) if args.from_scratch));
    }

    #[test]
    fn infogreffe_takes_a_file() {
        let cli = Cli::try_parse_from(["decp", "infogreffe", "chiffres-cles-2023.csv"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Infogreffe(ref args) if args.file.ends_with("chiffres-cles-2023.csv")
        ));
        assert!(Cli::try_parse_from(["decp", "infogreffe"]).is_err());
    }

    #[test]
    fn schema_name_is_optional() {
        let cli = Cli::try_parse_from(["decp", "schema"]).expect("cli should parse");
        assert!(matches!(cli.command, Commands::Schema(ref args) if args.name.is_none()));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["decp", "--format", "table", "enrich"]).is_err());
        assert!(Cli::try_parse_from(["decp", "import", "f.json", "--kind", "accord"]).is_err());
        assert!(Cli::try_parse_from(["decp", "cpv"]).is_err());
    }

    #[test]
    fn all_kinds_import_contracts_first() {
        use decp_core::enums::RecordKind;
        assert_eq!(
            ImportKind::All.record_kinds(),
            vec![RecordKind::Marche, RecordKind::Concession]
        );
    }
}
