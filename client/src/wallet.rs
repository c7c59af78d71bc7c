//! Persistent signing identities, one JSON file per `(name, cluster)` pair.
//!
//! ```json
//! {
//!   "publicKey": "<base58 public key>",
//!   "privateKey": "<base64 of the 64 keypair bytes>"
//! }
//! ```

use std::{
    fs,
    io,
    path::{
        Path,
        PathBuf,
    },
};

use base64::{
    engine::general_purpose::STANDARD,
    Engine,
};
use serde::{
    Deserialize,
    Serialize,
};
use solana_sdk::{
    signature::Keypair,
    signer::Signer,
};

use crate::{
    config::{
        ClientConfig,
        Cluster,
    },
    logs::{
        log_error,
        log_warning,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("wallet file not found: {0}")]
    NotFound(PathBuf),

    #[error("wallet file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("wallet file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("private key is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("private key bytes don't form a keypair")]
    InvalidKeypair,

    #[error("stored public key {stored} doesn't match the private key's {derived}")]
    PublicKeyMismatch { stored: String, derived: String },
}

/// The persisted form of a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub public_key: String,
    pub private_key: String,
}

impl WalletRecord {
    pub fn encode(keypair: &Keypair) -> Self {
        Self {
            public_key: keypair.pubkey().to_string(),
            private_key: STANDARD.encode(keypair.to_bytes()),
        }
    }

    pub fn decode(&self) -> Result<Keypair, WalletError> {
        let bytes = STANDARD.decode(&self.private_key)?;
        let keypair =
            Keypair::try_from(bytes.as_slice()).map_err(|_| WalletError::InvalidKeypair)?;
        let derived = keypair.pubkey().to_string();
        if derived != self.public_key {
            return Err(WalletError::PublicKeyMismatch {
                stored: self.public_key.clone(),
                derived,
            });
        }
        Ok(keypair)
    }
}

#[derive(Clone, Debug)]
pub struct WalletStore {
    dir: PathBuf,
}

impl WalletStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.keypair_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str, cluster: Cluster) -> PathBuf {
        self.dir.join(format!("{name}_{cluster}.wallet.json"))
    }

    /// Generates a fresh keypair and writes it under `(name, cluster)`, replacing any previous
    /// record.
    pub fn create(&self, name: &str, cluster: Cluster) -> Result<Keypair, WalletError> {
        let keypair = Keypair::new();
        self.save(name, cluster, &keypair)?;
        Ok(keypair)
    }

    pub fn save(&self, name: &str, cluster: Cluster, keypair: &Keypair) -> Result<(), WalletError> {
        let path = self.path_for(name, cluster);
        let io_err = |source| WalletError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let json = serde_json::to_string_pretty(&WalletRecord::encode(keypair))?;
        fs::write(&path, json).map_err(io_err)?;
        Ok(())
    }

    /// Loads the wallet stored under `(name, cluster)`.
    ///
    /// Absent, unreadable and malformed files all yield `None`; the cause is logged first so
    /// absence and corruption can still be told apart. Use [`WalletStore::try_load`] to branch
    /// on the cause.
    pub fn load(&self, name: &str, cluster: Cluster) -> Option<Keypair> {
        match self.try_load(name, cluster) {
            Ok(keypair) => Some(keypair),
            Err(WalletError::NotFound(path)) => {
                log_warning("Wallet not found", path.display());
                None
            }
            Err(e) => {
                log_error(
                    "Failed to read wallet file",
                    format!("{}: {e}", self.path_for(name, cluster).display()),
                );
                None
            }
        }
    }

    pub fn try_load(&self, name: &str, cluster: Cluster) -> Result<Keypair, WalletError> {
        let path = self.path_for(name, cluster);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WalletError::NotFound(path))
            }
            Err(source) => return Err(WalletError::Io { path, source }),
        };
        let record: WalletRecord = serde_json::from_str(&contents)?;
        record.decode()
    }

    /// Loads `(name, cluster)`, creating it when no record exists yet. Corrupt records are not
    /// overwritten.
    pub fn load_or_create(&self, name: &str, cluster: Cluster) -> Result<Keypair, WalletError> {
        match self.try_load(name, cluster) {
            Err(WalletError::NotFound(_)) => self.create(name, cluster),
            res => res,
        }
    }
}
