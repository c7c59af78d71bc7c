//! A mint that can be closed once its supply is zero, reclaiming its rent.

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
        close_account,
        initialize_mint2,
        initialize_mint_close_authority,
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

pub const DECIMALS: u8 = 0;

pub fn create_mint_recipe<'a>(
    payer: &'a Keypair,
    mint: &'a Keypair,
    mint_authority: &Pubkey,
    close_authority: &Pubkey,
    decimals: u8,
) -> Result<Recipe<'a>, RecipeError> {
    let space = AccountSpace::for_extensions(AccountKind::Mint, &[ExtensionType::MintCloseAuthority])?;
    Ok(Recipe::new("closable-mint", payer)
        .signer(mint)
        .create_account("Create account", mint.pubkey(), TOKEN_PROGRAM_ID, space)
        .then(
            "Close authority init.",
            initialize_mint_close_authority(&TOKEN_PROGRAM_ID, &mint.pubkey(), Some(close_authority))?,
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

/// Closes `mint` and sends its lamports to `destination`.
pub fn close_mint_recipe<'a>(
    payer: &'a Keypair,
    mint: &Pubkey,
    close_authority: &'a Keypair,
    destination: &Pubkey,
) -> Result<Recipe<'a>, RecipeError> {
    Ok(Recipe::new("close-mint", payer)
        .signer(close_authority)
        .then(
            "Close mint",
            close_account(
                &TOKEN_PROGRAM_ID,
                mint,
                destination,
                &close_authority.pubkey(),
                &[],
            )?,
        ))
}

pub struct ClosingMintOutcome {
    pub mint: Pubkey,
    pub created: Signature,
    pub closed: Signature,
}

pub fn run<L: LedgerClient>(demo: &Demo<'_, L>) -> anyhow::Result<ClosingMintOutcome> {
    title("Solana Token Extensions (Closing Token Mint)");

    info("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint = Keypair::new();
    display_wallet("Mint", &mint);
    let mint_authority = Keypair::new();
    display_wallet("Mint auth.", &mint_authority);
    let close_authority = Keypair::new();
    display_wallet("Close auth.", &close_authority);
    info_pair("Decimals", DECIMALS);
    println!();

    sub_title("Proceed to transactions");
    let created = demo.run(
        create_mint_recipe(
            payer,
            &mint,
            &mint_authority.pubkey(),
            &close_authority.pubkey(),
            DECIMALS,
        )?,
        "Signature",
    )?;

    let closed = demo.run(
        close_mint_recipe(payer, &mint.pubkey(), &close_authority, &payer.pubkey())?,
        "Signature (close)",
    )?;

    Ok(ClosingMintOutcome {
        mint: mint.pubkey(),
        created,
        closed,
    })
}
