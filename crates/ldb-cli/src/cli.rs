use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ldb", about = "Layout database inspection and ECO tool", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with database settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the memory report of a saved database
    Report(DbArgs),
    /// Print entity counts of a saved database
    Info(DbArgs),
    /// Check that a saved database re-serializes to an equal database
    Verify(DbArgs),
    /// Apply or revert a saved ECO journal
    Eco(EcoArgs),
}

#[derive(Args)]
pub struct DbArgs {
    pub db: PathBuf,
}

#[derive(Args)]
pub struct EcoArgs {
    #[command(subcommand)]
    pub action: EcoAction,
}

#[derive(Subcommand)]
pub enum EcoAction {
    /// Replay the journal forward
    Commit(EcoFiles),
    /// Replay the journal backward
    Undo(EcoFiles),
}

#[derive(Args)]
pub struct EcoFiles {
    #[arg(long)]
    pub db: PathBuf,
    #[arg(long)]
    pub eco: PathBuf,
    /// Target block; the top block when omitted
    #[arg(long)]
    pub block: Option<String>,
    #[arg(long)]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_report() {
        let cli = Cli::try_parse_from(["ldb", "report", "design.db"]).unwrap();
        if let Command::Report(args) = cli.command {
            assert_eq!(args.db, PathBuf::from("design.db"));
        } else { panic!("wrong command"); }
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_info_with_config() {
        let cli = Cli::try_parse_from(["ldb", "info", "a.db", "--config", "ldb.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Info(_)));
        assert_eq!(cli.config, Some(PathBuf::from("ldb.toml")));
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["ldb", "verify", "a.db"]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn parse_eco_commit() {
        let cli = Cli::try_parse_from([
            "ldb", "eco", "commit", "--db", "in.db", "--eco", "x.eco", "--block", "die2", "--out", "out.db",
        ])
        .unwrap();
        let Command::Eco(EcoArgs { action: EcoAction::Commit(files) }) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(files.block.as_deref(), Some("die2"));
        assert_eq!(files.out, PathBuf::from("out.db"));
    }

    #[test]
    fn parse_eco_undo_defaults_to_top_block() {
        let cli = Cli::try_parse_from([
            "ldb", "eco", "undo", "--db", "in.db", "--eco", "x.eco", "--out", "out.db",
        ])
        .unwrap();
        let Command::Eco(EcoArgs { action: EcoAction::Undo(files) }) = cli.command else {
            panic!("wrong command");
        };
        assert!(files.block.is_none());
    }

    #[test]
    fn eco_requires_output() {
        assert!(Cli::try_parse_from(["ldb", "eco", "commit", "--db", "a", "--eco", "b"]).is_err());
    }
}
