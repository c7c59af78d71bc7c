//! A mint with a delegate that can transfer or burn from any of its token accounts.

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
        initialize_permanent_delegate,
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

pub fn create_mint_recipe<'a>(
    payer: &'a Keypair,
    mint: &'a Keypair,
    mint_authority: &Pubkey,
    delegate: &Pubkey,
    decimals: u8,
) -> Result<Recipe<'a>, RecipeError> {
    let space =
        AccountSpace::for_extensions(AccountKind::Mint, &[ExtensionType::PermanentDelegate])?;
    Ok(Recipe::new("permanent-delegate-mint", payer)
        .signer(mint)
        .create_account("Create account", mint.pubkey(), TOKEN_PROGRAM_ID, space)
        .then(
            "Permanent delegate init.",
            initialize_permanent_delegate(&TOKEN_PROGRAM_ID, &mint.pubkey(), delegate)?,
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

pub fn run<L: LedgerClient>(demo: &Demo<'_, L>) -> anyhow::Result<(Pubkey, Signature)> {
    title("Solana Token Extensions (Permanent Delegate)");

    info("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint = Keypair::new();
    display_wallet("Mint", &mint);
    let mint_authority = Keypair::new();
    display_wallet("Mint auth.", &mint_authority);
    let delegate = Keypair::new();
    display_wallet("Delegate", &delegate);
    info_pair("Decimals", DECIMALS);
    println!();

    sub_title("Proceed to transactions");
    let signature = demo.run(
        create_mint_recipe(
            payer,
            &mint,
            &mint_authority.pubkey(),
            &delegate.pubkey(),
            DECIMALS,
        )?,
        "Signature",
    )?;
    Ok((mint.pubkey(), signature))
}
