use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tarn_fetch::{FetchOpts, HttpEngine, Location, ReqwestClient, fetch_mirrored, fetch_uri};
use tokio_util::sync::CancellationToken;

/// Fetch one file from an ordered list of candidate mirrors
#[derive(Debug, clap::Args)]
pub struct Fetch {
    /// Candidate mirror URLs, highest priority first
    #[arg(required = true)]
    pub mirrors: Vec<String>,

    /// Filename appended to each mirror URL (each URL is a complete
    /// locator when omitted)
    #[arg(long, value_name = "NAME")]
    pub filename: Option<String>,

    /// Write the content to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Refuse content larger than this many bytes (0 = unlimited)
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    pub max_size: u64,

    /// Exit cleanly when the file is absent from every mirror
    #[arg(long)]
    pub allow_missing: bool,
}

impl Fetch {
    pub fn run(self) -> Result<()> {
        let mirrors = self
            .mirrors
            .iter()
            .map(|m| m.parse::<Location>())
            .collect::<Result<Vec<_>, _>>()?;

        let engine = HttpEngine::new(ReqwestClient::new()?);
        let opts = FetchOpts {
            max_size: self.max_size,
            nul_terminate: false,
            allow_not_found: self.allow_missing,
        };
        let cancel = CancellationToken::new();
        let filename = self.filename.as_deref();

        let content = match mirrors.as_slice() {
            [single] => fetch_uri(&engine, single, filename, opts, &cancel)?,
            many => fetch_mirrored(&engine, many, filename, opts, &cancel)?,
        };

        let Some(content) = content else {
            eprintln!("tarn: no such file on any mirror");
            return Ok(());
        };
        tracing::debug!(bytes = content.len(), "fetch complete");

        match &self.output {
            Some(path) => std::fs::write(path, &content)
                .with_context(|| format!("writing {}", path.display()))?,
            None => std::io::stdout().write_all(&content)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::try_parse_from(["tarn", "fetch", "https://a.example/repo"]).unwrap();
        let crate::cli::Command::Fetch(fetch) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(fetch.mirrors, ["https://a.example/repo"]);
        assert_eq!(fetch.max_size, 0);
        assert!(!fetch.allow_missing);
        assert!(fetch.filename.is_none());
    }

    #[test]
    fn test_fetch_requires_at_least_one_mirror() {
        assert!(Cli::try_parse_from(["tarn", "fetch"]).is_err());
    }

    #[test]
    fn test_fetch_flags() {
        let cli = Cli::try_parse_from([
            "tarn",
            "fetch",
            "--filename",
            "summary",
            "--max-size",
            "4096",
            "--allow-missing",
            "https://a.example/repo",
            "https://b.example/repo",
        ])
        .unwrap();
        let crate::cli::Command::Fetch(fetch) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(fetch.mirrors.len(), 2);
        assert_eq!(fetch.filename.as_deref(), Some("summary"));
        assert_eq!(fetch.max_size, 4096);
        assert!(fetch.allow_missing);
    }
}
