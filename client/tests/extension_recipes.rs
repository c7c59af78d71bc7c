use std::time::Duration;

use solana_sdk::{
    signature::Keypair,
    signer::Signer,
};
use spl_token_2022_interface::{
    extension::{
        memo_transfer::MemoTransfer,
        BaseStateWithExtensions,
        ExtensionType,
        StateWithExtensions,
    },
    instruction::initialize_mint2,
    state::{
        Account as TokenAccount,
        AccountState,
    },
};
use tkx_client::{
    config::{
        ClientConfig,
        Cluster,
    },
    faucet::LAMPORTS_PER_SOL,
    ledger::{
        LedgerClient,
        LedgerError,
    },
    mollusk_helpers::{
        create_mock_user_account,
        MolluskLedger,
    },
    recipe::{
        RecipeError,
        SendConfig,
    },
    recipes::{
        closing_mint,
        default_account_state::{
            self,
            DefaultState,
        },
        immutable_owner,
        interest_bearing::{
            self,
            InterestParams,
        },
        non_transferable,
        permanent_delegate,
        reallocate,
        token_accounts::{
            create_mint,
            create_token_account,
            mint_extension_types,
            token_balance,
        },
        token_metadata::{
            self,
            MetadataParams,
        },
        transfer_fee::{
            self,
            withheld_amount,
            FeeCollection,
            FeeParams,
            MINT_AMOUNT,
            TRANSFER_AMOUNT,
        },
        Demo,
    },
};
use tokio::sync::watch;

const SECONDS_PER_YEAR: i64 = 31_556_736;

fn funded_ledger(payer: &Keypair) -> MolluskLedger {
    MolluskLedger::new(vec![create_mock_user_account(
        payer.pubkey(),
        100 * LAMPORTS_PER_SOL,
    )])
}

fn demo<'a>(
    ledger: &'a MolluskLedger,
    config: &'a ClientConfig,
    payer: &'a Keypair,
) -> Demo<'a, MolluskLedger> {
    Demo::new(ledger, config, payer).with_send_config(SendConfig { debug_logs: false })
}

fn extensions_of(ledger: &MolluskLedger, mint: &solana_sdk::pubkey::Pubkey) -> Vec<ExtensionType> {
    let account = ledger.get_account(mint).expect("Mint should exist");
    mint_extension_types(&account).expect("Should be a Token-2022 mint")
}

#[test]
fn closing_mint_reclaims_the_rent() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);

    let outcome = closing_mint::run(&demo)?;
    assert_ne!(outcome.created, outcome.closed);
    assert!(ledger.account(&outcome.mint)?.is_none());
    assert_eq!(ledger.confirmed_signatures(), [outcome.created, outcome.closed]);
    Ok(())
}

#[test]
fn default_account_state_freezes_new_accounts() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);

    let (mint, _) = default_account_state::run(&demo, DefaultState::Frozen)?;
    assert!(extensions_of(&ledger, &mint).contains(&ExtensionType::DefaultAccountState));

    let account = Keypair::new();
    demo.run(
        create_token_account(
            &payer,
            &account,
            &mint,
            &payer.pubkey(),
            &[ExtensionType::DefaultAccountState],
        )?,
        "Account",
    )?;
    let data = ledger.get_account(&account.pubkey()).unwrap().data;
    let state = StateWithExtensions::<TokenAccount>::unpack(&data)?;
    assert_eq!(state.base.state, AccountState::Frozen);
    Ok(())
}

#[test]
fn immutable_owner_account_is_owned_and_locked() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);

    let outcome = immutable_owner::run(&demo)?;
    let data = ledger.get_account(&outcome.account).unwrap().data;
    let state = StateWithExtensions::<TokenAccount>::unpack(&data)?;
    assert_eq!(state.base.owner, outcome.owner);
    assert_eq!(state.base.mint, outcome.mint);
    assert!(state
        .get_extension_types()?
        .contains(&ExtensionType::ImmutableOwner));
    Ok(())
}

#[test]
fn non_transferable_and_permanent_delegate_mints() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);

    let (non_transferable, _) = non_transferable::run(&demo)?;
    assert_eq!(
        extensions_of(&ledger, &non_transferable),
        [ExtensionType::NonTransferable]
    );

    let (delegated, _) = permanent_delegate::run(&demo)?;
    assert_eq!(
        extensions_of(&ledger, &delegated),
        [ExtensionType::PermanentDelegate]
    );
    Ok(())
}

#[test]
fn reallocate_adds_required_memos() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);

    let outcome = reallocate::run(&demo)?;
    let data = ledger.get_account(&outcome.account).unwrap().data;
    let state = StateWithExtensions::<TokenAccount>::unpack(&data)?;
    assert_eq!(state.base.mint, outcome.mint);
    let memo_transfer = state.get_extension::<MemoTransfer>()?;
    assert!(bool::from(memo_transfer.require_incoming_transfer_memos));
    Ok(())
}

#[test]
fn token_metadata_is_readable_from_the_mint() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);
    let params = MetadataParams {
        name: "Solana Gold".into(),
        symbol: "GOLDSOL".into(),
        uri: "https://example.com/gold.json".into(),
        additional: vec![("key".into(), "value".into())],
    };

    let outcome = token_metadata::run(&demo, &params)?;
    assert_eq!(outcome.metadata.mint, outcome.mint);
    assert_eq!(outcome.metadata.name, params.name);
    assert_eq!(outcome.metadata.symbol, params.symbol);
    assert_eq!(outcome.metadata.uri, params.uri);
    assert_eq!(outcome.metadata.additional_metadata, params.additional);

    let on_chain = token_metadata::read_metadata(&ledger.get_account(&outcome.mint).unwrap())?;
    assert_eq!(on_chain, outcome.metadata);
    Ok(())
}

#[test]
fn transfer_fees_are_withheld_then_withdrawn() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);

    let outcome = transfer_fee::run(&demo, FeeParams::default(), FeeCollection::FromAccounts)?;
    assert_eq!(outcome.fee, 5_000);
    assert_eq!(outcome.withheld_accounts, [outcome.destination]);
    assert!(outcome.collection.is_some());

    let source = ledger.get_account(&outcome.source).unwrap();
    let destination = ledger.get_account(&outcome.destination).unwrap();
    assert_eq!(token_balance(&source)?, MINT_AMOUNT - TRANSFER_AMOUNT);
    // The withheld fee was withdrawn back into the account it was withheld from.
    assert_eq!(token_balance(&destination)?, TRANSFER_AMOUNT);
    assert_eq!(withheld_amount(&destination)?, 0);
    Ok(())
}

#[test]
fn transfer_fees_can_be_harvested_through_the_mint() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);

    let outcome = transfer_fee::run(&demo, FeeParams::default(), FeeCollection::HarvestToMint)?;
    let source = ledger.get_account(&outcome.source).unwrap();
    let destination = ledger.get_account(&outcome.destination).unwrap();
    assert_eq!(
        token_balance(&source)?,
        MINT_AMOUNT - TRANSFER_AMOUNT + outcome.fee
    );
    assert_eq!(token_balance(&destination)?, TRANSFER_AMOUNT - outcome.fee);
    assert_eq!(withheld_amount(&destination)?, 0);
    Ok(())
}

#[tokio::test]
async fn interest_bearing_polls_until_the_tick_limit() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);
    // Held for the duration of the run so the stop signal never fires.
    let (_stop_tx, stop_rx) = watch::channel(false);

    let params = InterestParams {
        interval: Duration::from_millis(1),
        ticks: Some(3),
        update_rate: Some(500),
        ..Default::default()
    };
    let outcome = interest_bearing::run(&demo, params, stop_rx).await?;
    assert!(outcome.rate_updated.is_some());
    assert_eq!(outcome.observed.len(), 3);
    // The clock doesn't move between polls, so no interest has accrued yet.
    for ui_amount in &outcome.observed {
        assert_eq!(ui_amount.parse::<f64>()?, 1_000.0);
    }

    ledger.advance_clock(SECONDS_PER_YEAR);
    let grown = interest_bearing::ui_amount(&ledger, &payer, &outcome.mint, 1_000)?;
    assert!(grown.parse::<f64>()? > 1_000.0);
    Ok(())
}

#[tokio::test]
async fn interest_polling_stops_on_signal() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);
    let mint_authority = Keypair::new();
    let mint = Keypair::new();
    demo.run(
        interest_bearing::create_mint_recipe(
            &payer,
            &mint,
            &mint_authority.pubkey(),
            &mint_authority.pubkey(),
            32_000,
            0,
        )?,
        "Signature",
    )?;

    let (stop_tx, stop_rx) = watch::channel(false);
    stop_tx.send(true)?;
    let observed = interest_bearing::poll_ui_amount(
        &ledger,
        &payer,
        &mint.pubkey(),
        1_000,
        Duration::from_millis(1),
        stop_rx,
        None,
    )
    .await?;
    assert!(observed.is_empty());
    Ok(())
}

#[tokio::test]
async fn zero_poll_interval_still_ticks() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);
    let mint_authority = Keypair::new();
    let mint = Keypair::new();
    demo.run(
        interest_bearing::create_mint_recipe(
            &payer,
            &mint,
            &mint_authority.pubkey(),
            &mint_authority.pubkey(),
            32_000,
            0,
        )?,
        "Signature",
    )?;

    let (_stop_tx, stop_rx) = watch::channel(false);
    let observed = interest_bearing::poll_ui_amount(
        &ledger,
        &payer,
        &mint.pubkey(),
        1_000,
        Duration::ZERO,
        stop_rx,
        Some(2),
    )
    .await?;
    assert_eq!(observed.len(), 2);
    Ok(())
}

#[test]
fn failing_chain_commits_nothing() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = funded_ledger(&payer);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);
    let mint = Keypair::new();
    let balance_before = ledger.balance(&payer.pubkey())?;

    // Initializing the same mint twice fails on the last instruction.
    let recipe = create_mint(&payer, &mint, &payer.pubkey(), None, 6)?.then(
        "Initialize again",
        initialize_mint2(
            &spl_token_2022_interface::ID,
            &mint.pubkey(),
            &payer.pubkey(),
            None,
            6,
        )?,
    );
    let result = demo.runner().execute(recipe, "Signature");

    assert!(matches!(
        result.rejection(),
        Some(LedgerError::Rejected {
            instruction: Some(2),
            ..
        })
    ));
    assert!(ledger.get_account(&mint.pubkey()).is_none());
    assert_eq!(ledger.balance(&payer.pubkey())?, balance_before);
    assert!(ledger.confirmed_signatures().is_empty());
    Ok(())
}

#[test]
fn underfunded_payer_is_rejected() -> anyhow::Result<()> {
    let payer = Keypair::new();
    let ledger = MolluskLedger::new(vec![create_mock_user_account(payer.pubkey(), 1_000)]);
    let config = ClientConfig::new(Cluster::Localhost);
    let demo = demo(&ledger, &config, &payer);
    let mint = Keypair::new();

    let result = demo
        .runner()
        .execute(create_mint(&payer, &mint, &payer.pubkey(), None, 0)?, "Signature");
    assert!(matches!(
        result.failure(),
        Some(RecipeError::Ledger(LedgerError::Rejected {
            instruction: Some(0),
            ..
        }))
    ));
    assert_eq!(ledger.balance(&payer.pubkey())?, 1_000);
    Ok(())
}
