use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Update/reboot manager, with distributed locking based on etcd3.
#[derive(Debug, Parser)]
#[command(name = "airlock", version, about)]
pub struct Cli {
	/// Path to configuration file
	#[arg(short, long, default_value = "/etc/airlock/config.toml")]
	pub config: PathBuf,

	/// Increase verbosity level
	#[arg(short, long, action = ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Run the HTTP services and the reconciler
	Serve,
	/// Experimental commands
	Ex {
		#[command(subcommand)]
		command: ExCommand,
	},
}

#[derive(Debug, Subcommand)]
pub enum ExCommand {
	/// Introspect live state
	Get {
		#[command(subcommand)]
		command: GetCommand,
	},
}

#[derive(Debug, Subcommand)]
pub enum GetCommand {
	/// Introspect groups/slots state
	Slots,
}

/// Maps the `-v` flag count to a tracing level directive.
#[must_use]
pub const fn verbosity_level(count: u8) -> &'static str {
	match count {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_verbosity_level() {
		assert_eq!(verbosity_level(0), "warn");
		assert_eq!(verbosity_level(1), "info");
		assert_eq!(verbosity_level(2), "debug");
		assert_eq!(verbosity_level(3), "trace");
		assert_eq!(verbosity_level(9), "trace");
	}

	#[test]
	fn test_parse_serve() {
		let cli = Cli::try_parse_from(["airlock", "-vv", "--config", "/tmp/airlock.toml", "serve"]).unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.config, PathBuf::from("/tmp/airlock.toml"));
		assert!(matches!(cli.command, Command::Serve));
	}

	#[test]
	fn test_parse_get_slots() {
		let cli = Cli::try_parse_from(["airlock", "ex", "get", "slots"]).unwrap();
		assert_eq!(cli.config, PathBuf::from("/etc/airlock/config.toml"));
		assert!(matches!(
			cli.command,
			Command::Ex {
				command: ExCommand::Get { command: GetCommand::Slots }
			}
		));
	}
}
