//! A mint whose new token accounts start in a chosen state, usually frozen until the freeze
//! authority thaws them.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{
        Keypair,
        Signature,
    },
    signer::Signer,
};
use spl_token_2022_interface::{
    extension::{
        default_account_state::instruction::initialize_default_account_state,
        ExtensionType,
    },
    instruction::initialize_mint2,
    state::AccountState,
};

use super::{
    Demo,
    TOKEN_PROGRAM_ID,
};
use crate::{
    ledger::LedgerClient,
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

pub const DECIMALS: u8 = 9;

/// The states a token account can be created in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, strum_macros::Display,
)]
pub enum DefaultState {
    #[default]
    Frozen,
    Initialized,
}

impl From<DefaultState> for AccountState {
    fn from(state: DefaultState) -> Self {
        match state {
            DefaultState::Frozen => AccountState::Frozen,
            DefaultState::Initialized => AccountState::Initialized,
        }
    }
}

/// The mint authority doubles as freeze authority, without which frozen accounts could never
/// be thawed.
pub fn create_mint_recipe<'a>(
    payer: &'a Keypair,
    mint: &'a Keypair,
    mint_authority: &Pubkey,
    state: DefaultState,
    decimals: u8,
) -> Result<Recipe<'a>, RecipeError> {
    let space =
        AccountSpace::for_extensions(AccountKind::Mint, &[ExtensionType::DefaultAccountState])?;
    Ok(Recipe::new("default-account-state-mint", payer)
        .signer(mint)
        .create_account("Create account", mint.pubkey(), TOKEN_PROGRAM_ID, space)
        .then(
            format!("Set default state ({state})"),
            initialize_default_account_state(
                &TOKEN_PROGRAM_ID,
                &mint.pubkey(),
                &AccountState::from(state),
            )?,
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

pub fn run<L: LedgerClient>(
    demo: &Demo<'_, L>,
    state: DefaultState,
) -> anyhow::Result<(Pubkey, Signature)> {
    title("Solana Token Extensions (Default Account State)");

    info("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint = Keypair::new();
    display_wallet("Mint", &mint);
    let mint_authority = Keypair::new();
    display_wallet("Mint auth.", &mint_authority);
    info_pair("State", state);
    info_pair("Decimals", DECIMALS);
    println!();

    sub_title("Proceed to transactions");
    let signature = demo.run(
        create_mint_recipe(payer, &mint, &mint_authority.pubkey(), state, DECIMALS)?,
        "Signature",
    )?;
    Ok((mint.pubkey(), signature))
}
