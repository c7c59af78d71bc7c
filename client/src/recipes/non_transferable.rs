//! A mint whose tokens can be minted and burned but never moved between owners.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{
        Keypair,
        Signature,
    },
    signer::Signer,
};
use spl_token_2022_interface::{
    extension::ExtensionType,
    instruction::{
        initialize_mint2,
        initialize_non_transferable_mint,
    },
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

/// The mint has no freeze authority.
pub fn create_mint_recipe<'a>(
    payer: &'a Keypair,
    mint: &'a Keypair,
    mint_authority: &Pubkey,
    decimals: u8,
) -> Result<Recipe<'a>, RecipeError> {
    let space = AccountSpace::for_extensions(AccountKind::Mint, &[ExtensionType::NonTransferable])?;
    Ok(Recipe::new("non-transferable-mint", payer)
        .signer(mint)
        .create_account("Create account", mint.pubkey(), TOKEN_PROGRAM_ID, space)
        .then(
            "Non-transferable init.",
            initialize_non_transferable_mint(&TOKEN_PROGRAM_ID, &mint.pubkey())?,
        )
        .then(
            "Initialize mint",
            initialize_mint2(&TOKEN_PROGRAM_ID, &mint.pubkey(), mint_authority, None, decimals)?,
        ))
}

pub fn run<L: LedgerClient>(demo: &Demo<'_, L>) -> anyhow::Result<(Pubkey, Signature)> {
    title("Solana Token Extensions (Non-transferable Tokens)");

    info("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint = Keypair::new();
    display_wallet("Mint", &mint);
    info_pair("Decimals", DECIMALS);
    println!();

    sub_title("Proceed to transactions");
    let signature = demo.run(
        create_mint_recipe(payer, &mint, &payer.pubkey(), DECIMALS)?,
        "Signature",
    )?;
    Ok((mint.pubkey(), signature))
}
