//! A mint whose UI amounts accrue interest continuously, and a cancellable poller that watches
//! a balance grow.

use std::time::Duration;

use solana_sdk::{
    message::Message,
    pubkey::Pubkey,
    signature::{
        Keypair,
        Signature,
    },
    signer::Signer,
    transaction::Transaction,
};
use spl_token_2022_interface::{
    extension::{
        interest_bearing_mint::instruction::{
            initialize,
            update_rate,
        },
        ExtensionType,
    },
    instruction::{
        amount_to_ui_amount,
        initialize_mint2,
    },
};
use tokio::sync::watch;

use super::{
    Demo,
    TOKEN_PROGRAM_ID,
};
use crate::{
    ledger::{
        LedgerClient,
        LedgerError,
    },
    logs::{
        display_wallet,
        info,
        info_pair,
        sub_title,
        title,
    },
    recipe::{
        Recipe,
        RecipeError,
    },
    space::{
        AccountKind,
        AccountSpace,
    },
};

pub const DECIMALS: u8 = 0;

/// Shorter polling periods are raised to this.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterestParams {
    /// Annual rate in basis points.
    pub rate: i16,
    /// The raw amount whose UI amount is polled.
    pub balance: u64,
    pub interval: Duration,
    /// Stop after this many polls. `None` polls until the stop signal.
    pub ticks: Option<usize>,
    /// When set, the rate is changed to this value before polling starts.
    pub update_rate: Option<i16>,
}

impl Default for InterestParams {
    fn default() -> Self {
        Self {
            rate: 32_000,
            balance: 1_000,
            interval: Duration::from_secs(1),
            ticks: None,
            update_rate: None,
        }
    }
}

pub fn create_mint_recipe<'a>(
    payer: &'a Keypair,
    mint: &'a Keypair,
    mint_authority: &Pubkey,
    rate_authority: &Pubkey,
    rate: i16,
    decimals: u8,
) -> Result<Recipe<'a>, RecipeError> {
    let space =
        AccountSpace::for_extensions(AccountKind::Mint, &[ExtensionType::InterestBearingConfig])?;
    Ok(Recipe::new("interest-bearing-mint", payer)
        .signer(mint)
        .create_account("Create account", mint.pubkey(), TOKEN_PROGRAM_ID, space)
        .then(
            "Interest bearing init.",
            initialize(&TOKEN_PROGRAM_ID, &mint.pubkey(), Some(*rate_authority), rate)?,
        )
        .then(
            "Initialize mint",
            initialize_mint2(
                &TOKEN_PROGRAM_ID,
                &mint.pubkey(),
                mint_authority,
                Some(mint_authority),
                decimals,
            )?,
        ))
}

pub fn update_rate_recipe<'a>(
    payer: &'a Keypair,
    mint: &Pubkey,
    rate_authority: &'a Keypair,
    rate: i16,
) -> Result<Recipe<'a>, RecipeError> {
    Ok(Recipe::new("update-interest-rate", payer)
        .signer(rate_authority)
        .then(
            "Update rate",
            update_rate(
                &TOKEN_PROGRAM_ID,
                mint,
                &rate_authority.pubkey(),
                &[],
                rate,
            )?,
        ))
}

/// The UI amount `amount` of `mint` is worth right now, as reported by the token program.
pub fn ui_amount<L: LedgerClient>(
    ledger: &L,
    payer: &Keypair,
    mint: &Pubkey,
    amount: u64,
) -> Result<String, RecipeError> {
    let instruction = amount_to_ui_amount(&TOKEN_PROGRAM_ID, mint, amount)?;
    let message = Message::new(&[instruction], Some(&payer.pubkey()));
    let transaction = Transaction::new(&[payer], message, ledger.latest_blockhash()?);

    let return_data = ledger
        .simulate_return_data(&transaction)?
        .ok_or_else(|| LedgerError::rejected("AmountToUiAmount returned no data"))?;
    Ok(String::from_utf8_lossy(&return_data).into_owned())
}

/// Polls the UI amount of `amount` every `period`, printing each observation, until `stop`
/// flips to `true` (or its sender goes away) or `max_ticks` polls have been made. The first
/// poll happens immediately. `period` is at least [`MIN_POLL_PERIOD`].
pub async fn poll_ui_amount<L: LedgerClient>(
    ledger: &L,
    payer: &Keypair,
    mint: &Pubkey,
    amount: u64,
    period: Duration,
    mut stop: watch::Receiver<bool>,
    max_ticks: Option<usize>,
) -> Result<Vec<String>, RecipeError> {
    let mut interval = tokio::time::interval(period.max(MIN_POLL_PERIOD));
    let mut observed = vec![];

    loop {
        if *stop.borrow() || max_ticks.is_some_and(|max| observed.len() >= max) {
            break;
        }

        tokio::select! {
            _ = interval.tick() => {
                let ui = ui_amount(ledger, payer, mint, amount)?;
                println!("- {ui}");
                observed.push(ui);
            }
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    Ok(observed)
}

pub struct InterestBearingOutcome {
    pub mint: Pubkey,
    pub created: Signature,
    pub rate_updated: Option<Signature>,
    pub observed: Vec<String>,
}

pub async fn run<L: LedgerClient>(
    demo: &Demo<'_, L>,
    params: InterestParams,
    stop: watch::Receiver<bool>,
) -> anyhow::Result<InterestBearingOutcome> {
    title("Solana Token Extensions (Interest Bearing)");

    info("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint_authority = Keypair::new();
    display_wallet("Mint auth.", &mint_authority);
    let rate_authority = Keypair::new();
    display_wallet("Rate auth.", &rate_authority);
    let mint = Keypair::new();
    display_wallet("Mint", &mint);
    println!();

    info_pair("Rate (bps)", params.rate);
    info_pair("Decimals", DECIMALS);
    sub_title("Proceed to transactions");
    let created = demo.run(
        create_mint_recipe(
            payer,
            &mint,
            &mint_authority.pubkey(),
            &rate_authority.pubkey(),
            params.rate,
            DECIMALS,
        )?,
        "Signature",
    )?;

    let rate_updated = match params.update_rate {
        Some(rate) => {
            info_pair("New rate", rate);
            Some(demo.run(
                update_rate_recipe(payer, &mint.pubkey(), &rate_authority, rate)?,
                "Rate update",
            )?)
        }
        None => None,
    };

    info_pair("Balance", params.balance);
    println!();
    let observed = poll_ui_amount(
        demo.ledger(),
        payer,
        &mint.pubkey(),
        params.balance,
        params.interval,
        stop,
        params.ticks,
    )
    .await?;

    Ok(InterestBearingOutcome {
        mint: mint.pubkey(),
        created,
        rate_updated,
        observed,
    })
}
