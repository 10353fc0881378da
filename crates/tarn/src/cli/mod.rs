pub mod fetch;
pub mod remote;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tarn", version, about = "Mirrored repository tool")]
pub struct Cli {
    /// Enable debug logging (overridden by TARN_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage remote definitions
    #[command(subcommand)]
    Remote(remote::RemoteCmd),

    /// Fetch one file from an ordered list of candidate mirrors
    Fetch(fetch::Fetch),

    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

impl Cli {
    pub fn init_tracing(&self) {
        let default = if self.verbose { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_env("TARN_LOG").unwrap_or_else(|_| EnvFilter::new(default));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Remote(cmd) => cmd.run(),
            Command::Fetch(cmd) => cmd.run(),
            Command::Completions { shell } => {
                generate(shell, &mut Cli::command(), "tarn", &mut std::io::stdout());
                Ok(())
            }
        }
    }
}
