//! `tkx`: Token-2022 extension walkthroughs and wallet utilities.

use std::process::ExitCode;

use anyhow::{
    bail,
    Context,
};
use clap::Parser;
use solana_sdk::{
    signature::Keypair,
    signer::Signer,
};
use tkx_client::{
    config::ClientConfig,
    faucet::{
        airdrop,
        LAMPORTS_PER_SOL,
    },
    ledger::{
        LedgerClient,
        RpcLedger,
    },
    logs::{
        display_wallet,
        info_pair,
        log_error,
    },
    print_kv,
    recipe::SendConfig,
    recipes::{
        closing_mint,
        default_account_state,
        immutable_owner,
        interest_bearing,
        non_transferable,
        permanent_delegate,
        reallocate,
        token_metadata::{
            self,
            MetadataParams,
        },
        transfer_fee,
        Demo,
    },
    wallet::WalletStore,
};
use tokio::sync::watch;

use crate::cli::{
    Cli,
    Command,
    DemoCommand,
    WalletCommand,
};

pub mod cli;
pub mod load_env;

/// The wallet every walkthrough pays with.
const PAYER: &str = "payer";

#[tokio::main]
async fn main() -> ExitCode {
    load_env::load();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error("Failed", format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.client_config();
    let store = WalletStore::from_config(&config);
    let ledger = RpcLedger::new(&config);

    match cli.command {
        Command::Wallet(command) => run_wallet(command, &store, &ledger, &config).await,
        Command::Demo(command) => {
            // Loaded before anything touches the network.
            let payer = load_payer(&store, &config)?;
            let demo = Demo::new(&ledger, &config, &payer).with_send_config(SendConfig {
                debug_logs: !cli.quiet,
            });
            run_demo(command, &demo).await
        }
    }
}

fn load_payer(store: &WalletStore, config: &ClientConfig) -> anyhow::Result<Keypair> {
    match store.load(PAYER, config.cluster) {
        Some(payer) => Ok(payer),
        None => bail!(
            "No `{PAYER}` wallet for {}. Create one with `tkx --cluster {} wallet create {PAYER} --airdrop 1`",
            config.cluster,
            config.cluster
        ),
    }
}

async fn run_wallet<L: LedgerClient>(
    command: WalletCommand,
    store: &WalletStore,
    ledger: &L,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    match command {
        WalletCommand::Create { name, airdrop: sol } => {
            let keypair = store
                .create(&name, config.cluster)
                .with_context(|| format!("Couldn't create wallet `{name}`"))?;
            display_wallet(&name, &keypair);
            print_kv!("File", store.path_for(&name, config.cluster).display());
            if let Some(sol) = sol {
                airdrop(ledger, config, &name, &keypair.pubkey(), sol).await?;
            }
        }
        WalletCommand::Airdrop {
            name,
            amount,
            create_missing,
        } => {
            let keypair = if create_missing {
                store.load_or_create(&name, config.cluster)?
            } else {
                match store.load(&name, config.cluster) {
                    Some(keypair) => keypair,
                    None => bail!("No `{name}` wallet for {}", config.cluster),
                }
            };
            display_wallet(&name, &keypair);
            airdrop(ledger, config, &name, &keypair.pubkey(), amount).await?;
        }
        WalletCommand::Show { name } => {
            let keypair = store.try_load(&name, config.cluster)?;
            display_wallet(&name, &keypair);
            let lamports = ledger.balance(&keypair.pubkey())?;
            info_pair("Balance", format!("{} SOL", lamports as f64 / LAMPORTS_PER_SOL as f64));
            info_pair("Explorer", config.address_link(keypair.pubkey()));
        }
    }
    Ok(())
}

async fn run_demo<L: LedgerClient>(command: DemoCommand, demo: &Demo<'_, L>) -> anyhow::Result<()> {
    match command {
        DemoCommand::ClosingMint => {
            closing_mint::run(demo)?;
        }
        DemoCommand::DefaultAccountState { state } => {
            default_account_state::run(demo, state)?;
        }
        DemoCommand::ImmutableOwner => {
            immutable_owner::run(demo)?;
        }
        DemoCommand::InterestBearing(args) => {
            let (stop_tx, stop_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = stop_tx.send(true);
                }
            });
            interest_bearing::run(demo, args.into(), stop_rx).await?;
        }
        DemoCommand::NonTransferable => {
            non_transferable::run(demo)?;
        }
        DemoCommand::PermanentDelegate => {
            permanent_delegate::run(demo)?;
        }
        DemoCommand::Reallocate => {
            reallocate::run(demo)?;
        }
        DemoCommand::TokenMetadata(args) => {
            token_metadata::run(demo, &MetadataParams::from(args))?;
        }
        DemoCommand::TransferFees(args) => {
            transfer_fee::run(demo, args.fees(), args.collection())?;
        }
    }
    Ok(())
}
