//! CLI interface for Recall
//!
//! Command-line interface using clap's derive API. With no subcommand the
//! binary starts an interactive chat session.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recall: a tool-calling assistant with long-term memory
///
/// Answers questions by calling a calculator, a date helper, a text analyzer
/// and a weather lookup, and remembers earlier conversations per user.
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// User whose memory is read and written (overrides session.user_id)
    #[arg(long, global = true, value_name = "ID")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive chat session (default)
    Chat,

    /// Answer a single question and exit
    Ask {
        /// The question to answer
        query: String,
    },

    /// Run the built-in example queries
    Demo,

    /// List the available tools
    Tools,

    /// Evaluate an arithmetic expression without contacting any service
    Eval {
        /// Expression using numbers, parentheses and + - * / % **
        expression: String,
    },

    /// Manage API keys in the system keychain
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

/// Keychain management actions
#[derive(Subcommand, Debug)]
pub enum SecretAction {
    /// Store an API key
    Set {
        /// Key name (GEMINI_API_KEY, WEATHER_API_KEY, MEM0_API_KEY)
        name: String,
        /// Key value
        value: String,
    },

    /// Remove a stored API key
    Remove {
        /// Key name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_chat() {
        let cli = Cli::parse_from(["recall"]);
        assert!(cli.command.is_none());
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
        assert!(cli.user.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["recall", "--json", "--log", "debug", "--user", "alice", "tools"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert_eq!(cli.user, Some("alice".to_string()));
        assert!(matches!(cli.command, Some(Command::Tools)));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        assert!(Cli::try_parse_from(["recall", "--log", "verbose", "tools"]).is_err());
        assert!(Cli::try_parse_from(["recall", "--log", "trace", "tools"]).is_ok());
    }

    #[test]
    fn test_ask_command() {
        let cli = Cli::parse_from(["recall", "ask", "What is (234*12)+98?"]);
        if let Some(Command::Ask { query }) = cli.command {
            assert_eq!(query, "What is (234*12)+98?");
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_eval_command_after_flag() {
        let cli = Cli::parse_from(["recall", "eval", "2 ** 10", "--json"]);
        assert!(cli.json);
        if let Some(Command::Eval { expression }) = cli.command {
            assert_eq!(expression, "2 ** 10");
        } else {
            panic!("Expected Eval command");
        }
    }

    #[test]
    fn test_secret_set() {
        let cli = Cli::parse_from(["recall", "secret", "set", "GEMINI_API_KEY", "abc"]);
        if let Some(Command::Secret {
            action: SecretAction::Set { name, value },
        }) = cli.command
        {
            assert_eq!(name, "GEMINI_API_KEY");
            assert_eq!(value, "abc");
        } else {
            panic!("Expected Secret set command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["recall", "--config", "/tmp/recall.toml", "demo"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/recall.toml")));
        assert!(matches!(cli.command, Some(Command::Demo)));
    }
}
