use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prov",
    about = "Provenance ledger: chain-of-custody tracking over a key-value store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Ledger state file
    #[arg(long, global = true, default_value = "ledger.json")]
    pub store: PathBuf,

    /// Ledger configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a command on behalf of an actor
    Invoke(InvokeArgs),
    /// Run a read-only command
    Query(QueryArgs),
    /// List the registered commands
    Commands,
}

#[derive(Args)]
pub struct InvokeArgs {
    /// Calling party's name
    #[arg(long)]
    pub actor: String,
    /// Calling party's role
    #[arg(long)]
    pub role: String,
    pub command: String,
    /// Positional arguments, in declared order
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct QueryArgs {
    pub command: String,
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_invoke() {
        let cli = Cli::try_parse_from([
            "prov", "invoke", "--actor", "FarmerA", "--role", "farmer", "transferItem", "T01",
            "", "truck", "FarmerA", "Processor", "",
        ])
        .unwrap();
        if let Command::Invoke(args) = cli.command {
            assert_eq!(args.actor, "FarmerA");
            assert_eq!(args.role, "farmer");
            assert_eq!(args.command, "transferItem");
            assert_eq!(args.args.len(), 6);
            assert_eq!(args.args[1], "");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_invoke_requires_identity() {
        assert!(Cli::try_parse_from(["prov", "invoke", "createAnimal"]).is_err());
    }

    #[test]
    fn parse_query() {
        let cli = Cli::try_parse_from(["prov", "query", "getChain", "T01"]).unwrap();
        if let Command::Query(args) = cli.command {
            assert_eq!(args.command, "getChain");
            assert_eq!(args.args, vec!["T01"]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "prov", "--store", "/tmp/l.json", "--format", "json", "-v", "commands",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Commands));
        assert_eq!(cli.store, PathBuf::from("/tmp/l.json"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn default_store_path() {
        let cli = Cli::try_parse_from(["prov", "commands"]).unwrap();
        assert_eq!(cli.store, PathBuf::from("ledger.json"));
        assert_eq!(cli.format, OutputFormat::Text);
    }
}
