use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tarn_remote::{ChangeMode, Remote, RemoteStore};

#[derive(Debug, clap::Subcommand)]
pub enum RemoteCmd {
    Add(Add),
    List(List),
    Delete(Delete),
}

impl RemoteCmd {
    pub fn run(self) -> Result<()> {
        match self {
            RemoteCmd::Add(cmd) => cmd.run(),
            RemoteCmd::List(cmd) => cmd.run(),
            RemoteCmd::Delete(cmd) => cmd.run(),
        }
    }
}

/// Add a new remote
#[derive(Debug, clap::Args)]
pub struct Add {
    /// Name of the new remote
    pub name: String,

    /// Base URL, optionally [metalink=|mirrorlist=]URL
    pub url: String,

    /// Branches to track (all branches if omitted)
    pub branches: Vec<String>,

    /// Set config option KEY=VALUE for the remote
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Disable GPG verification
    #[arg(long)]
    pub no_gpg_verify: bool,

    /// Do nothing if the provided remote exists
    #[arg(long, conflicts_with = "force")]
    pub if_not_exists: bool,

    /// Replace the provided remote if it exists
    #[arg(long)]
    pub force: bool,

    /// Import GPG keys from FILE
    #[arg(long, value_name = "FILE")]
    pub gpg_import: Option<PathBuf>,

    /// Use URL when fetching content
    #[arg(long, value_name = "URL")]
    pub contenturl: Option<String>,

    /// Globally unique ID for this repository as a collection of refs
    #[arg(long, value_name = "COLLECTION-ID")]
    pub collection_id: Option<String>,

    /// Store root (defaults to ~/.tarn)
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,
}

impl Add {
    pub fn run(self) -> Result<()> {
        let store = open_store(self.root.as_deref())?;

        let mut remote = Remote::new(&self.name, &self.url)?;
        remote.branches = self.branches;
        remote.contenturl = self.contenturl;
        remote.collection_id = self.collection_id;
        remote.gpg_verify = !self.no_gpg_verify;
        for entry in &self.set {
            let (key, value) = parse_keyvalue(entry)?;
            remote.set_option(key, value)?;
        }

        let mode = if self.if_not_exists {
            ChangeMode::AddIfNotExists
        } else if self.force {
            ChangeMode::Replace
        } else {
            ChangeMode::Add
        };
        store.change(mode, &remote)?;

        if let Some(path) = &self.gpg_import {
            let keyring =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let imported = store.import_keyring(&remote.name, keyring)?;
            println!(
                "Imported {imported} GPG key{} to remote \"{}\"",
                if imported == 1 { "" } else { "s" },
                remote.name
            );
        }

        Ok(())
    }
}

/// List configured remotes
#[derive(Debug, clap::Args)]
pub struct List {
    /// Show the remote's URL next to its name
    #[arg(long)]
    pub show_urls: bool,

    /// Store root (defaults to ~/.tarn)
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,
}

impl List {
    pub fn run(self) -> Result<()> {
        let store = open_store(self.root.as_deref())?;
        for remote in store.list()? {
            if self.show_urls {
                println!("{}\t{}", remote.name, remote.url);
            } else {
                println!("{}", remote.name);
            }
        }
        Ok(())
    }
}

/// Delete a configured remote
#[derive(Debug, clap::Args)]
pub struct Delete {
    /// Name of the remote to delete
    pub name: String,

    /// Do nothing if the provided remote does not exist
    #[arg(long)]
    pub if_exists: bool,

    /// Store root (defaults to ~/.tarn)
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,
}

impl Delete {
    pub fn run(self) -> Result<()> {
        let store = open_store(self.root.as_deref())?;
        if self.if_exists {
            store.delete_if_exists(&self.name)?;
        } else {
            store.delete(&self.name)?;
        }
        Ok(())
    }
}

fn open_store(root: Option<&Path>) -> Result<RemoteStore> {
    let root = match root {
        Some(path) => path.to_path_buf(),
        None => home::home_dir()
            .context("cannot determine home directory")?
            .join(".tarn"),
    };
    Ok(RemoteStore::open(root)?)
}

fn parse_keyvalue(entry: &str) -> Result<(&str, &str)> {
    entry
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .with_context(|| format!("malformed KEY=VALUE option {entry:?}"))
}
