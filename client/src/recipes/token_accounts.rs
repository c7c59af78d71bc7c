//! Plain mints and token accounts the extension recipes build on.

use solana_account::Account;
use solana_instruction::Instruction;
use solana_program_error::ProgramError;
use solana_sdk::{
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
};
use spl_associated_token_account_interface::{
    address::get_associated_token_address_with_program_id,
    instruction::create_associated_token_account,
};
use spl_token_2022_interface::{
    extension::{
        BaseStateWithExtensions,
        ExtensionType,
        StateWithExtensions,
    },
    instruction::{
        initialize_account3,
        initialize_mint2,
    },
    state::{
        Account as TokenAccount,
        Mint,
    },
};

use super::TOKEN_PROGRAM_ID;
use crate::{
    recipe::{
        Recipe,
        RecipeError,
    },
    space::{
        AccountKind,
        AccountSpace,
    },
};

/// A mint with no extensions.
pub fn create_mint<'a>(
    payer: &'a Keypair,
    mint: &'a Keypair,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
    decimals: u8,
) -> Result<Recipe<'a>, RecipeError> {
    Ok(Recipe::new("create-mint", payer)
        .signer(mint)
        .create_account(
            "Create mint account",
            mint.pubkey(),
            TOKEN_PROGRAM_ID,
            AccountSpace::for_extensions(AccountKind::Mint, &[])?,
        )
        .then(
            "Initialize mint",
            initialize_mint2(
                &TOKEN_PROGRAM_ID,
                &mint.pubkey(),
                mint_authority,
                freeze_authority,
                decimals,
            )?,
        ))
}

/// Space for a token account of a mint carrying `mint_extensions`, plus any account extensions
/// the caller wants on top of the ones the mint requires.
pub fn token_account_space(
    mint_extensions: &[ExtensionType],
    account_extensions: &[ExtensionType],
) -> Result<AccountSpace, ProgramError> {
    let mut extensions = ExtensionType::get_required_init_account_extensions(mint_extensions);
    for extension in account_extensions {
        if !extensions.contains(extension) {
            extensions.push(*extension);
        }
    }
    AccountSpace::for_extensions(AccountKind::TokenAccount, &extensions)
}

/// A keypair-addressed token account for `mint`, sized for the extensions that mint requires.
pub fn create_token_account<'a>(
    payer: &'a Keypair,
    account: &'a Keypair,
    mint: &Pubkey,
    owner: &Pubkey,
    mint_extensions: &[ExtensionType],
) -> Result<Recipe<'a>, RecipeError> {
    Ok(Recipe::new("create-token-account", payer)
        .signer(account)
        .create_account(
            "Create token account",
            account.pubkey(),
            TOKEN_PROGRAM_ID,
            token_account_space(mint_extensions, &[])?,
        )
        .then(
            "Initialize account",
            initialize_account3(&TOKEN_PROGRAM_ID, &account.pubkey(), mint, owner)?,
        ))
}

pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &TOKEN_PROGRAM_ID)
}

pub fn create_associated_token_account_instruction(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    create_associated_token_account(payer, owner, mint, &TOKEN_PROGRAM_ID)
}

/// The associated token account of `owner` for `mint`. The payer funds it; the owner doesn't
/// need to sign.
pub fn create_associated_token_account_recipe<'a>(
    payer: &'a Keypair,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Recipe<'a> {
    Recipe::new("create-associated-token-account", payer).then(
        "Create associated token account",
        create_associated_token_account_instruction(&payer.pubkey(), owner, mint),
    )
}

/// The extensions initialized on a Token-2022 mint account.
pub fn mint_extension_types(account: &Account) -> Result<Vec<ExtensionType>, ProgramError> {
    StateWithExtensions::<Mint>::unpack(&account.data)?.get_extension_types()
}

/// The token amount held by a Token-2022 token account.
pub fn token_balance(account: &Account) -> Result<u64, ProgramError> {
    Ok(StateWithExtensions::<TokenAccount>::unpack(&account.data)?
        .base
        .amount)
}
