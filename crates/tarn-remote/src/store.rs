//! Persistent remote-configuration store.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{RemoteError, Result};
use crate::keyring;
use crate::remote::{Remote, validate_name};

const CONFIG_FILE: &str = "remotes.toml";

/// How [`RemoteStore::change`] treats a name collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    /// Commit the definition; error if the name is already taken.
    Add,
    /// Keep an existing definition untouched, commit otherwise.
    AddIfNotExists,
    /// Commit the definition whether or not the name exists.
    Replace,
}

/// Remote definitions committed to `remotes.toml` under a root directory,
/// one table per remote; imported keyrings live next to it. All writes go
/// through a sibling temp file and a rename, so a crash never leaves a
/// half-written config behind.
pub struct RemoteStore {
    root: PathBuf,
}

impl RemoteStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn keyring_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.trustedkeys.gpg"))
    }

    pub fn change(&self, mode: ChangeMode, remote: &Remote) -> Result<()> {
        let mut remotes = self.load()?;
        let exists = remotes.contains_key(&remote.name);
        match mode {
            ChangeMode::Add if exists => {
                return Err(RemoteError::AlreadyExists(remote.name.clone()));
            }
            ChangeMode::AddIfNotExists if exists => {
                debug!(remote = %remote.name, "remote exists, keeping current definition");
                return Ok(());
            }
            _ => {}
        }
        remotes.insert(remote.name.clone(), remote.clone());
        self.commit(&remotes)?;
        info!(remote = %remote.name, url = %remote.url, replaced = exists, "committed remote");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Remote> {
        self.load()?
            .remove(name)
            .ok_or_else(|| RemoteError::NotFound(name.to_string()))
    }

    /// All remotes, name-sorted.
    pub fn list(&self) -> Result<Vec<Remote>> {
        Ok(self.load()?.into_values().collect())
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        if !self.delete_if_exists(name)? {
            return Err(RemoteError::NotFound(name.to_string()));
        }
        Ok(())
    }

    pub fn delete_if_exists(&self, name: &str) -> Result<bool> {
        let mut remotes = self.load()?;
        if remotes.remove(name).is_none() {
            return Ok(false);
        }
        self.commit(&remotes)?;
        match fs::remove_file(self.keyring_path(name)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => return Err(err.into()),
            _ => {}
        }
        info!(remote = name, "deleted remote");
        Ok(true)
    }

    /// Import a binary OpenPGP keyring for `name`, replacing any previous
    /// one. Returns the number of primary public keys the keyring carries.
    pub fn import_keyring(&self, name: &str, mut source: impl Read) -> Result<u32> {
        self.get(name)?;

        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        let count = keyring::count_public_keys(&data)?;

        self.write_atomic(&self.keyring_path(name), &data)?;
        info!(remote = name, keys = count, "imported keyring");
        Ok(count)
    }

    fn load(&self) -> Result<BTreeMap<String, Remote>> {
        let path = self.root.join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        let mut remotes: BTreeMap<String, Remote> = toml::from_str(&text)?;
        // The table key is authoritative for the name.
        for (name, remote) in &mut remotes {
            validate_name(name)?;
            remote.name = name.clone();
        }
        Ok(remotes)
    }

    fn commit(&self, remotes: &BTreeMap<String, Remote>) -> Result<()> {
        let text = toml::to_string_pretty(remotes)?;
        self.write_atomic(&self.root.join(CONFIG_FILE), text.as_bytes())
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
