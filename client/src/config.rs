//! Network selection and the explicit configuration handed to the wallet store and the recipe
//! runner.

use std::{
    fmt::Display,
    path::PathBuf,
};

use solana_commitment_config::CommitmentConfig;

pub const DEFAULT_KEYPAIR_DIR: &str = "./keypair";

const LOCALHOST_RPC_URL: &str = "http://localhost:8899";
const EXPLORER_BASE_URL: &str = "https://explorer.solana.com";

/// The cluster a command targets. Its lowercase name doubles as the environment tag used to
/// scope wallet files.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
    Localhost,
}

impl Cluster {
    pub const fn rpc_url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
            Self::Mainnet => "https://api.mainnet-beta.solana.com",
            Self::Localhost => LOCALHOST_RPC_URL,
        }
    }

    /// The query string the block explorer needs to resolve ids on this cluster.
    pub const fn explorer_query(&self) -> &'static str {
        match self {
            Self::Devnet => "?cluster=devnet",
            Self::Testnet => "?cluster=testnet",
            Self::Mainnet => "",
            Self::Localhost => "?cluster=custom&customUrl=http%3A%2F%2Flocalhost%3A8899",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub cluster: Cluster,
    /// Overrides the cluster's well-known endpoint when set.
    pub rpc_url: Option<String>,
    pub keypair_dir: PathBuf,
    pub commitment: CommitmentConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            rpc_url: None,
            keypair_dir: PathBuf::from(DEFAULT_KEYPAIR_DIR),
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

impl ClientConfig {
    pub fn new(cluster: Cluster) -> Self {
        Self {
            cluster,
            ..Default::default()
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: Option<String>) -> Self {
        self.rpc_url = rpc_url;
        self
    }

    pub fn with_keypair_dir(mut self, keypair_dir: impl Into<PathBuf>) -> Self {
        self.keypair_dir = keypair_dir.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.cluster.rpc_url())
    }

    pub fn tx_link(&self, signature: impl Display) -> String {
        self.explorer_link("tx", signature)
    }

    pub fn address_link(&self, address: impl Display) -> String {
        self.explorer_link("address", address)
    }

    fn explorer_link(&self, kind: &str, id: impl Display) -> String {
        format!(
            "{EXPLORER_BASE_URL}/{kind}/{id}{}",
            self.cluster.explorer_query()
        )
    }
}
