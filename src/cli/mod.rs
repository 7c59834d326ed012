//! Command-line interface.
//!
//! Without a subcommand the server starts. `config check` validates a
//! configuration file and prints the effective settings.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "kind")]
#[command(author, version, about = "Backend for the KIND local-services marketplace", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "KIND_CONFIG", default_value = "kind.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate the configuration file
    Check,
}

/// Run a subcommand
pub fn run_command(cli: &Cli, command: &Commands) -> Result<()> {
    match command {
        Commands::Config(ConfigCommands::Check) => check_config(cli),
    }
}

fn check_config(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;

    println!("Configuration OK: {}", cli.config.display());
    println!("  listen:         {}:{}", config.server.host, config.server.port);
    println!("  data dir:       {}", config.server.data_dir.display());
    println!("  session hours:  {}", config.auth.session_hours);
    println!(
        "  bootstrap admin: {}",
        config.auth.admin_email.as_deref().unwrap_or("(none)")
    );
    println!(
        "  sms gateway:    {}",
        config
            .notifications
            .gateway_url
            .as_deref()
            .unwrap_or("(none, notifications are logged)")
    );
    if config.notifications.admin_phone.is_none() {
        println!("  warning: notifications.admin_phone is not set, admin SMS will be skipped");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_server() {
        let cli = Cli::try_parse_from(["kind"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_parse_config_check() {
        let cli = Cli::try_parse_from(["kind", "-c", "other.toml", "config", "check"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(
            cli.command,
            Some(Commands::Config(ConfigCommands::Check))
        ));
    }

    #[test]
    fn test_config_check_reports_bad_session_hours() {
        let path = std::env::temp_dir().join(format!("kind-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[auth]\nsession_hours = 0\n").unwrap();

        let cli = Cli::try_parse_from(["kind", "-c", path.to_str().unwrap(), "config", "check"])
            .unwrap();
        let result = run_command(&cli, cli.command.as_ref().unwrap());
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("session_hours"), "{}", err);
    }
}
