use std::io;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote \"{0}\" already exists")]
    AlreadyExists(String),

    #[error("remote \"{0}\" not found")]
    NotFound(String),

    #[error("invalid remote name {0:?}")]
    InvalidName(String),

    #[error("option key {0:?} is reserved")]
    ReservedKey(String),

    #[error("keyring contains no public keys")]
    NoKeys,

    #[error("malformed keyring: {0}")]
    MalformedKeyring(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed remote config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode remote config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, RemoteError>;
