use crate::handlers::password;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Smart Utility Bot: a keyboard launcher for small everyday tools", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch TUI interface
    Tui,
    /// Print the current date and time
    Time,
    /// Current weather for a city
    Weather {
        #[arg(value_name = "CITY", num_args = 1.., required = true)]
        city: Vec<String>,
    },
    /// Two-sentence encyclopedia summary
    Wiki {
        #[arg(value_name = "QUERY", num_args = 1.., required = true)]
        query: Vec<String>,
    },
    /// Rate a password and suggest a random one
    Password {
        #[arg(value_name = "PASSWORD")]
        password: String,
    },
    /// Generate a random password
    Generate {
        /// Password length (defaults to the configured length)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=password::MAX_LENGTH as i64))]
        length: Option<u16>,
    },
    /// Evaluate an arithmetic expression
    Calc {
        #[arg(value_name = "EXPRESSION", num_args = 1.., required = true, allow_hyphen_values = true)]
        expression: Vec<String>,
    },
    /// Convert a temperature such as 25C or 77F
    Convert {
        #[arg(value_name = "VALUE", allow_hyphen_values = true)]
        value: String,
    },
    /// Word and character counts plus case conversions
    Text {
        #[arg(value_name = "TEXT", num_args = 1.., required = true)]
        text: Vec<String>,
    },
    /// Schedule a reminder ("HH:MM - message") and wait until it fires
    Remind {
        #[arg(value_name = "REMINDER")]
        reminder: String,
    },
    /// List all tasks
    TodoList,
    /// Add a task to the to-do list
    TodoAdd {
        #[arg(value_name = "TEXT", num_args = 1.., required = true)]
        text: Vec<String>,
    },
    /// Toggle a task by its number or by (fuzzy) text
    TodoToggle {
        #[arg(value_name = "TASK")]
        task: String,
    },
    /// Set a configuration value
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Get a configuration value
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// List all configuration values
    ConfigList,
    /// Reset a configuration value to its default
    ConfigDelete {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["utilbot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn multi_word_arguments() {
        let cli = Cli::try_parse_from(["utilbot", "weather", "New", "York"]).unwrap();
        match cli.command {
            Some(Commands::Weather { city }) => assert_eq!(city.join(" "), "New York"),
            _ => panic!("expected weather"),
        }
    }

    #[test]
    fn negative_numbers_are_values() {
        let cli = Cli::try_parse_from(["utilbot", "convert", "-40C"]).unwrap();
        match cli.command {
            Some(Commands::Convert { value }) => assert_eq!(value, "-40C"),
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn generate_length_flag() {
        let cli = Cli::try_parse_from(["utilbot", "generate", "--length", "20"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Generate { length: Some(20) })
        ));
    }

    #[test]
    fn generate_length_is_bounded() {
        assert!(Cli::try_parse_from(["utilbot", "generate", "--length", "10000000000"]).is_err());
        assert!(Cli::try_parse_from(["utilbot", "generate", "--length", "129"]).is_err());
        assert!(Cli::try_parse_from(["utilbot", "generate", "--length", "0"]).is_err());
        assert!(Cli::try_parse_from(["utilbot", "generate", "--length", "128"]).is_ok());
    }
}
