//! Growing an existing token account so it can hold an extension it wasn't created with.

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
        memo_transfer::instruction::enable_required_transfer_memos,
        ExtensionType,
    },
    instruction::reallocate,
};

use super::{
    token_accounts::{
        associated_token_address,
        create_associated_token_account_recipe,
        create_mint,
    },
    Demo,
    TOKEN_PROGRAM_ID,
};
use crate::{
    ledger::LedgerClient,
    logs::{
        display_wallet,
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

/// Reallocates `account` to fit a memo-transfer extension, paid by the payer, and turns that
/// extension on. The owner signs both.
pub fn reallocate_recipe<'a>(
    payer: &'a Keypair,
    account: &Pubkey,
    owner: &'a Keypair,
) -> Result<Recipe<'a>, RecipeError> {
    Ok(Recipe::new("reallocate", payer)
        .signer(owner)
        .then(
            "Reallocate",
            reallocate(
                &TOKEN_PROGRAM_ID,
                account,
                &payer.pubkey(),
                &owner.pubkey(),
                &[],
                &[ExtensionType::MemoTransfer],
            )?,
        )
        .then(
            "Require transfer memos",
            enable_required_transfer_memos(&TOKEN_PROGRAM_ID, account, &owner.pubkey(), &[])?,
        ))
}

pub struct ReallocateOutcome {
    pub mint: Pubkey,
    pub account: Pubkey,
    pub signature: Signature,
}

pub fn run<L: LedgerClient>(demo: &Demo<'_, L>) -> anyhow::Result<ReallocateOutcome> {
    title("Solana Token Extensions (Reallocate Token Account Sizes)");

    sub_title("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint_authority = Keypair::new();
    display_wallet("Mint auth.", &mint_authority);
    let owner = Keypair::new();
    display_wallet("Owner", &owner);
    info_pair("Decimals", DECIMALS);
    println!();

    sub_title("Initialize mint");
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

    sub_title("Create account");
    let account = associated_token_address(&owner.pubkey(), &mint.pubkey());
    demo.run(
        create_associated_token_account_recipe(payer, &owner.pubkey(), &mint.pubkey()),
        "Account",
    )?;

    sub_title("Proceed to transactions");
    let signature = demo.run(reallocate_recipe(payer, &account, &owner)?, "Signature")?;

    Ok(ReallocateOutcome {
        mint: mint.pubkey(),
        account,
        signature,
    })
}
