pub mod query;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Resolves DNS names directly, forwarding to a configured upstream or
/// walking the delegation chain itself -- no local daemon required.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "/etc/dnsresolve/dnsresolve.toml", env = "CONFIG_PATH")]
    config_path: PathBuf,
    #[command(subcommand)]
    inner: Commands,
}

impl Args {
    pub fn config(&self) -> crate::config::Config {
        crate::config::Config::load(&self.config_path)
    }

    pub async fn run(self, config: crate::config::Config) -> Result<(), crate::error::CliError> {
        match self.inner {
            Commands::Query(inner) => inner.run(config).await,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Query(query::Command),
}
