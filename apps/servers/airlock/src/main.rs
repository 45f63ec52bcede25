use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use airlock::cli::{verbosity_level, Cli, Command, ExCommand, GetCommand};
use airlock::config::Settings;
use airlock::{get_slots, serve};

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	let settings = Settings::parse(&cli.config)?;
	tracing::debug!(endpoints = ?settings.etcd_endpoints, "etcd3 configuration");

	match cli.command {
		Command::Serve => serve::run(settings).await,
		Command::Ex {
			command: ExCommand::Get { command: GetCommand::Slots },
		} => get_slots::run(&settings).await,
	}
}

// `RUST_LOG` wins over the `-v` flag when set.
fn init_tracing(verbosity: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity_level(verbosity)));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}
