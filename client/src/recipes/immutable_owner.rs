//! A token account whose owner can never be reassigned.

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
        initialize_account3,
        initialize_immutable_owner,
    },
};

use super::{
    token_accounts::{
        create_mint,
        token_account_space,
    },
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
};

pub const DECIMALS: u8 = 0;

/// `mint` must carry no extensions that require account extensions of their own.
pub fn create_account_recipe<'a>(
    payer: &'a Keypair,
    account: &'a Keypair,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<Recipe<'a>, RecipeError> {
    let space = token_account_space(&[], &[ExtensionType::ImmutableOwner])?;
    Ok(Recipe::new("immutable-owner-account", payer)
        .signer(account)
        .create_account("Create account", account.pubkey(), TOKEN_PROGRAM_ID, space)
        .then(
            "Immutable owner init.",
            initialize_immutable_owner(&TOKEN_PROGRAM_ID, &account.pubkey())?,
        )
        .then(
            "Initialize account",
            initialize_account3(&TOKEN_PROGRAM_ID, &account.pubkey(), mint, owner)?,
        ))
}

pub struct ImmutableOwnerOutcome {
    pub mint: Pubkey,
    pub account: Pubkey,
    pub owner: Pubkey,
    pub signature: Signature,
}

pub fn run<L: LedgerClient>(demo: &Demo<'_, L>) -> anyhow::Result<ImmutableOwnerOutcome> {
    title("Solana Token Extensions (Immutable Owner)");

    sub_title("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint_authority = Keypair::new();
    display_wallet("Mint auth.", &mint_authority);
    let owner = Keypair::new();
    display_wallet("Owner", &owner);
    let account = Keypair::new();
    display_wallet("Account", &account);
    info_pair("Decimals", DECIMALS);
    println!();

    sub_title("Proceed to transactions");
    let mint = Keypair::new();
    demo.run(
        create_mint(
            payer,
            &mint,
            &mint_authority.pubkey(),
            Some(&mint_authority.pubkey()),
            DECIMALS,
        )?,
        "Mint",
    )?;

    info("Create the immutable owner account");
    let signature = demo.run(
        create_account_recipe(payer, &account, &mint.pubkey(), &owner.pubkey())?,
        "Signature",
    )?;

    Ok(ImmutableOwnerOutcome {
        mint: mint.pubkey(),
        account: account.pubkey(),
        owner: owner.pubkey(),
        signature,
    })
}
