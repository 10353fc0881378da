//! Remote repository definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, Result};

/// Keys owned by named fields; free-form options may not shadow them.
const RESERVED_KEYS: &[&str] = &["url", "contenturl", "gpg-verify", "collection-id", "branches"];

fn default_true() -> bool { true }

fn is_true(v: &bool) -> bool { *v }

/// One configured remote: a name, a base URL, and the options the
/// remote-management commands accept. Serialized as a table in the
/// store's `remotes.toml`; the name is the table key, not a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remote {
    #[serde(skip)]
    pub name: String,

    pub url: String,

    /// Separate URL used when fetching content (objects) rather than
    /// metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contenturl: Option<String>,

    /// Written out only when disabled; absent means verification stays on.
    #[serde(rename = "gpg-verify", default = "default_true", skip_serializing_if = "is_true")]
    pub gpg_verify: bool,

    /// Globally unique ID for this repository as a collection of refs.
    #[serde(rename = "collection-id", skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,

    /// Branch filter; empty means all branches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    /// Free-form `KEY=VALUE` settings. Flattened, so they live next to
    /// the named options in the config table.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Remote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            url: url.into(),
            contenturl: None,
            gpg_verify: true,
            collection_id: None,
            branches: Vec::new(),
            extra: BTreeMap::new(),
        })
    }

    /// Attach a free-form option. Keys owned by named fields are rejected
    /// so a stray `--set url=...` cannot silently shadow the real URL.
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(RemoteError::ReservedKey(key));
        }
        self.extra.insert(key, value.into());
        Ok(())
    }
}

/// Remote names become file names on disk, so path-ish names are refused.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.chars().any(char::is_whitespace);
    if bad {
        return Err(RemoteError::InvalidName(name.to_string()));
    }
    Ok(())
}
