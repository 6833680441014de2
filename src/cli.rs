//! CLI argument parsing for the leadbook-worker binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "leadbook-worker", about = "Property CRM lead import worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP and NATS servers (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Import a lead spreadsheet into the configured store and print the summary
    Import {
        /// Path to an .xlsx / .xls workbook
        file: PathBuf,
        /// User the imported records are attributed to
        #[arg(long)]
        user: Uuid,
    },
    /// Print a signed access token for local testing
    Token {
        #[arg(long)]
        user: Uuid,
        #[arg(long, default_value = "dev@localhost")]
        email: String,
        /// Token lifetime in hours
        #[arg(long, default_value_t = 8)]
        hours: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_migrate_command_parses() {
        let cli = Cli::parse_from(["leadbook-worker", "migrate"]);
        assert!(matches!(cli.command, Some(Command::Migrate)));
    }

    #[test]
    fn test_cli_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["leadbook-worker"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_serve_command_parses() {
        let cli = Cli::parse_from(["leadbook-worker", "serve"]);
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn test_cli_import_command_parses() {
        let user = Uuid::new_v4();
        let user_arg = user.to_string();
        let cli = Cli::parse_from(["leadbook-worker", "import", "leads.xlsx", "--user", user_arg.as_str()]);
        match cli.command {
            Some(Command::Import { file, user: parsed }) => {
                assert_eq!(file, PathBuf::from("leads.xlsx"));
                assert_eq!(parsed, user);
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn test_cli_import_requires_user() {
        assert!(Cli::try_parse_from(["leadbook-worker", "import", "leads.xlsx"]).is_err());
    }

    #[test]
    fn test_cli_token_defaults() {
        let user_arg = Uuid::nil().to_string();
        let cli = Cli::parse_from(["leadbook-worker", "token", "--user", user_arg.as_str()]);
        match cli.command {
            Some(Command::Token { email, hours, .. }) => {
                assert_eq!(email, "dev@localhost");
                assert_eq!(hours, 8);
            }
            _ => panic!("expected token command"),
        }
    }
}
