use std::{
    path::PathBuf,
    time::Duration,
};

use clap::{
    Args,
    Parser,
    Subcommand,
};
use tkx_client::{
    config::{
        ClientConfig,
        Cluster,
        DEFAULT_KEYPAIR_DIR,
    },
    recipes::{
        default_account_state::DefaultState,
        interest_bearing::InterestParams,
        token_metadata::MetadataParams,
        transfer_fee::{
            FeeCollection,
            FeeParams,
        },
    },
};

/// Walk through Token-2022 extensions on a Solana cluster.
#[derive(Debug, Parser)]
#[command(name = "tkx", version)]
pub struct Cli {
    /// The cluster to target. Also scopes which wallet files are used.
    #[arg(long, value_enum, global = true, default_value_t = Cluster::Devnet)]
    pub cluster: Cluster,

    /// Overrides the cluster's default RPC endpoint.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Directory holding `{name}_{cluster}.wallet.json` files.
    #[arg(long, global = true, default_value = DEFAULT_KEYPAIR_DIR)]
    pub keypair_dir: PathBuf,

    /// Don't print the instruction list before each submission.
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.cluster)
            .with_rpc_url(self.url.clone())
            .with_keypair_dir(&self.keypair_dir)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, fund and inspect wallet files.
    #[command(subcommand)]
    Wallet(WalletCommand),
    #[command(flatten)]
    Demo(DemoCommand),
}

/// The extension walkthroughs. Each one pays with the `payer` wallet.
#[derive(Debug, Subcommand)]
pub enum DemoCommand {
    /// A mint that can be closed and its rent reclaimed.
    ClosingMint,
    /// A mint whose new token accounts start frozen (or initialized).
    DefaultAccountState {
        #[arg(long, value_enum, default_value_t = DefaultState::Frozen)]
        state: DefaultState,
    },
    /// A token account whose owner can't be changed.
    ImmutableOwner,
    /// A mint that accrues interest, polled until Ctrl-C.
    InterestBearing(InterestArgs),
    /// A mint whose tokens can't be transferred.
    NonTransferable,
    /// A mint with a permanent delegate.
    PermanentDelegate,
    /// Grow a token account to hold the memo-transfer extension.
    Reallocate,
    /// A mint carrying its own metadata.
    TokenMetadata(MetadataArgs),
    /// A mint that withholds a fee on every transfer.
    TransferFees(TransferFeeArgs),
}

#[derive(Debug, Subcommand)]
pub enum WalletCommand {
    /// Generate a new keypair and store it, overwriting any existing one.
    Create {
        name: String,
        /// Request this many SOL from the faucet once created.
        #[arg(long)]
        airdrop: Option<f64>,
    },
    /// Request SOL from the faucet for a stored wallet.
    Airdrop {
        name: String,
        /// Amounts of zero or less request 1 SOL.
        #[arg(long, default_value_t = 1.0)]
        amount: f64,
        /// Create the wallet first if it doesn't exist.
        #[arg(long)]
        create_missing: bool,
    },
    /// Print a stored wallet's address and balance.
    Show { name: String },
}

#[derive(Debug, Args)]
pub struct InterestArgs {
    /// Annual rate in basis points.
    #[arg(long, default_value_t = 32_000, allow_negative_numbers = true)]
    pub rate: i16,
    /// The raw amount whose UI amount is polled.
    #[arg(long, default_value_t = 1_000)]
    pub balance: u64,
    #[arg(long, default_value_t = 1_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,
    /// Stop after this many polls instead of waiting for Ctrl-C.
    #[arg(long)]
    pub ticks: Option<usize>,
    /// Change the rate to this value before polling.
    #[arg(long, allow_negative_numbers = true)]
    pub update_rate: Option<i16>,
}

impl From<InterestArgs> for InterestParams {
    fn from(args: InterestArgs) -> Self {
        Self {
            rate: args.rate,
            balance: args.balance,
            interval: Duration::from_millis(args.interval_ms),
            ticks: args.ticks,
            update_rate: args.update_rate,
        }
    }
}

#[derive(Debug, Args)]
pub struct MetadataArgs {
    /// Falls back to `TOKEN_NAME`.
    #[arg(long)]
    pub name: Option<String>,
    /// Falls back to `TOKEN_SYMBOL`.
    #[arg(long)]
    pub symbol: Option<String>,
    /// Falls back to `TOKEN_URI`.
    #[arg(long)]
    pub uri: Option<String>,
}

impl From<MetadataArgs> for MetadataParams {
    fn from(args: MetadataArgs) -> Self {
        MetadataParams::from_env_or(args.name, args.symbol, args.uri)
    }
}

#[derive(Debug, Args)]
pub struct TransferFeeArgs {
    #[arg(long, default_value_t = 50)]
    pub basis_points: u16,
    #[arg(long, default_value_t = 5_000)]
    pub max_fee: u64,
    /// Harvest withheld fees into the mint and withdraw from there, instead of withdrawing
    /// from the token accounts directly.
    #[arg(long)]
    pub harvest: bool,
}

impl TransferFeeArgs {
    pub fn fees(&self) -> FeeParams {
        FeeParams {
            basis_points: self.basis_points,
            maximum_fee: self.max_fee,
        }
    }

    pub fn collection(&self) -> FeeCollection {
        if self.harvest {
            FeeCollection::HarvestToMint
        } else {
            FeeCollection::FromAccounts
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "tkx",
            "transfer-fees",
            "--harvest",
            "--cluster",
            "localhost",
            "--keypair-dir",
            "/tmp/keys",
        ])
        .unwrap();
        assert_eq!(cli.cluster, Cluster::Localhost);
        assert_eq!(cli.keypair_dir, PathBuf::from("/tmp/keys"));
        let Command::Demo(DemoCommand::TransferFees(args)) = cli.command else {
            panic!("Expected transfer-fees");
        };
        assert_eq!(args.collection(), FeeCollection::HarvestToMint);
        assert_eq!(args.fees(), FeeParams::default());
    }

    #[test]
    fn wallet_subcommands() {
        let cli = Cli::try_parse_from(["tkx", "wallet", "create", "owner", "--airdrop", "2"])
            .unwrap();
        assert_eq!(cli.cluster, Cluster::Devnet);
        assert!(matches!(
            cli.command,
            Command::Wallet(WalletCommand::Create { ref name, airdrop: Some(amount) })
                if name == "owner" && amount == 2.0
        ));
    }

    #[test]
    fn interest_defaults() {
        let cli = Cli::try_parse_from(["tkx", "interest-bearing", "--ticks", "3"]).unwrap();
        let Command::Demo(DemoCommand::InterestBearing(args)) = cli.command else {
            panic!("Expected interest-bearing");
        };
        let params = InterestParams::from(args);
        assert_eq!(params.rate, 32_000);
        assert_eq!(params.balance, 1_000);
        assert_eq!(params.interval, Duration::from_secs(1));
        assert_eq!(params.ticks, Some(3));
    }

    #[test]
    fn zero_interest_interval_is_rejected() {
        let err = Cli::try_parse_from(["tkx", "interest-bearing", "--interval-ms", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(Cli::try_parse_from(["tkx", "interest-bearing", "--interval-ms", "1"]).is_ok());
    }
}
