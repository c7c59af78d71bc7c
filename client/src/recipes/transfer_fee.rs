//! A mint that withholds a fee on every transfer, and the two ways of collecting those fees.

use solana_account::Account;
use solana_program_error::ProgramError;
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
        transfer_fee::{
            instruction::{
                harvest_withheld_tokens_to_mint,
                initialize_transfer_fee_config,
                transfer_checked_with_fee,
                withdraw_withheld_tokens_from_accounts,
                withdraw_withheld_tokens_from_mint,
            },
            TransferFeeAmount,
            TransferFeeConfig,
        },
        BaseStateWithExtensions,
        ExtensionType,
        StateWithExtensions,
    },
    instruction::{
        initialize_mint2,
        mint_to,
    },
    state::{
        Account as TokenAccount,
        Mint,
    },
};

use super::{
    token_accounts::{
        associated_token_address,
        create_associated_token_account_instruction,
        create_token_account,
        token_balance,
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
    space::{
        AccountKind,
        AccountSpace,
    },
};

pub const DECIMALS: u8 = 9;
pub const MINT_AMOUNT: u64 = 1_000_000_000;
pub const TRANSFER_AMOUNT: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeParams {
    /// Fee rate in hundredths of a percent.
    pub basis_points: u16,
    /// Upper bound on the fee of a single transfer, in base units.
    pub maximum_fee: u64,
}

impl Default for FeeParams {
    fn default() -> Self {
        Self {
            basis_points: 50,
            maximum_fee: 5_000,
        }
    }
}

/// The fee `mint_account` withholds on a transfer of `amount`, under the newest fee schedule in
/// its transfer fee config.
pub fn transfer_fee_for(mint_account: &Account, amount: u64) -> Result<u64, ProgramError> {
    let state = StateWithExtensions::<Mint>::unpack(&mint_account.data)?;
    let config = state.get_extension::<TransferFeeConfig>()?;
    let epoch = u64::from(config.newer_transfer_fee.epoch);
    config
        .calculate_epoch_fee(epoch, amount)
        .ok_or(ProgramError::ArithmeticOverflow)
}

/// The fee currently withheld in a Token-2022 token account. Zero when the account doesn't
/// carry the extension.
pub fn withheld_amount(account: &Account) -> Result<u64, ProgramError> {
    let state = StateWithExtensions::<TokenAccount>::unpack(&account.data)?;
    Ok(state
        .get_extension::<TransferFeeAmount>()
        .map(|fee_amount| u64::from(fee_amount.withheld_amount))
        .unwrap_or(0))
}

/// The mint's token accounts that hold withheld fees, in the order the ledger returns them.
pub fn accounts_with_withheld_fees<L: LedgerClient>(
    ledger: &L,
    mint: &Pubkey,
) -> anyhow::Result<Vec<Pubkey>> {
    let accounts = ledger.token_accounts_for_mint(&TOKEN_PROGRAM_ID, mint)?;
    Ok(accounts
        .into_iter()
        .filter(|(_, account)| withheld_amount(account).is_ok_and(|withheld| withheld > 0))
        .map(|(address, _)| address)
        .collect())
}

pub fn create_mint_recipe<'a>(
    payer: &'a Keypair,
    mint: &'a Keypair,
    mint_authority: &Pubkey,
    config_authority: &Pubkey,
    withdraw_authority: &Pubkey,
    fees: FeeParams,
    decimals: u8,
) -> Result<Recipe<'a>, RecipeError> {
    let space =
        AccountSpace::for_extensions(AccountKind::Mint, &[ExtensionType::TransferFeeConfig])?;
    Ok(Recipe::new("transfer-fee-mint", payer)
        .signer(mint)
        .create_account("Create account", mint.pubkey(), TOKEN_PROGRAM_ID, space)
        .then(
            "Transfer fee config init.",
            initialize_transfer_fee_config(
                &TOKEN_PROGRAM_ID,
                &mint.pubkey(),
                Some(config_authority),
                Some(withdraw_authority),
                fees.basis_points,
                fees.maximum_fee,
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

/// Creates `owner`'s associated token account and mints `amount` into it.
pub fn fund_source_recipe<'a>(
    payer: &'a Keypair,
    mint: &Pubkey,
    mint_authority: &'a Keypair,
    owner: &Pubkey,
    amount: u64,
) -> Result<Recipe<'a>, RecipeError> {
    let source = associated_token_address(owner, mint);
    Ok(Recipe::new("fund-source", payer)
        .signer(mint_authority)
        .then(
            "Create account (source)",
            create_associated_token_account_instruction(&payer.pubkey(), owner, mint),
        )
        .then(
            "Mint to source",
            mint_to(
                &TOKEN_PROGRAM_ID,
                mint,
                &source,
                &mint_authority.pubkey(),
                &[],
                amount,
            )?,
        ))
}

#[allow(clippy::too_many_arguments)]
pub fn transfer_recipe<'a>(
    payer: &'a Keypair,
    mint: &Pubkey,
    source: &Pubkey,
    destination: &Pubkey,
    owner: &'a Keypair,
    amount: u64,
    decimals: u8,
    fee: u64,
) -> Result<Recipe<'a>, RecipeError> {
    Ok(Recipe::new("transfer-with-fee", payer)
        .signer(owner)
        .then(
            "Transfer checked with fee",
            transfer_checked_with_fee(
                &TOKEN_PROGRAM_ID,
                source,
                mint,
                destination,
                &owner.pubkey(),
                &[],
                amount,
                decimals,
                fee,
            )?,
        ))
}

/// Moves the fees withheld in `sources` straight into `destination`.
pub fn withdraw_from_accounts_recipe<'a>(
    payer: &'a Keypair,
    mint: &Pubkey,
    destination: &Pubkey,
    withdraw_authority: &'a Keypair,
    sources: &[Pubkey],
) -> Result<Recipe<'a>, RecipeError> {
    let sources: Vec<&Pubkey> = sources.iter().collect();
    Ok(Recipe::new("withdraw-withheld-from-accounts", payer)
        .signer(withdraw_authority)
        .then(
            "Withdraw withheld tokens from accounts",
            withdraw_withheld_tokens_from_accounts(
                &TOKEN_PROGRAM_ID,
                mint,
                destination,
                &withdraw_authority.pubkey(),
                &[],
                &sources,
            )?,
        ))
}

/// Sweeps the fees withheld in `sources` into the mint (permissionless), then withdraws the
/// mint's withheld fees into `destination`.
pub fn harvest_and_withdraw_recipe<'a>(
    payer: &'a Keypair,
    mint: &Pubkey,
    destination: &Pubkey,
    withdraw_authority: &'a Keypair,
    sources: &[Pubkey],
) -> Result<Recipe<'a>, RecipeError> {
    let sources: Vec<&Pubkey> = sources.iter().collect();
    Ok(Recipe::new("harvest-and-withdraw-withheld", payer)
        .signer(withdraw_authority)
        .then(
            "Harvest withheld tokens to mint",
            harvest_withheld_tokens_to_mint(&TOKEN_PROGRAM_ID, mint, &sources)?,
        )
        .then(
            "Withdraw withheld tokens from mint",
            withdraw_withheld_tokens_from_mint(
                &TOKEN_PROGRAM_ID,
                mint,
                destination,
                &withdraw_authority.pubkey(),
                &[],
            )?,
        ))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeeCollection {
    /// Withdraw directly from the token accounts holding withheld fees.
    #[default]
    FromAccounts,
    /// Harvest into the mint first, then withdraw from the mint.
    HarvestToMint,
}

pub struct TransferFeeOutcome {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
    pub fee: u64,
    pub withheld_accounts: Vec<Pubkey>,
    pub transfer: Signature,
    /// `None` when no account held withheld fees.
    pub collection: Option<Signature>,
}

pub fn run<L: LedgerClient>(
    demo: &Demo<'_, L>,
    fees: FeeParams,
    collection: FeeCollection,
) -> anyhow::Result<TransferFeeOutcome> {
    title("Solana Token Extensions (Token Transfer Fee)");

    info("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint = Keypair::new();
    display_wallet("Mint", &mint);
    let mint_authority = Keypair::new();
    display_wallet("Mint auth.", &mint_authority);
    let config_authority = Keypair::new();
    display_wallet("Fee auth.", &config_authority);
    let withdraw_authority = Keypair::new();
    display_wallet("Withdraw auth.", &withdraw_authority);
    let owner = Keypair::new();
    display_wallet("Owner", &owner);
    let destination = Keypair::new();
    display_wallet("Account (dest)", &destination);
    println!();

    info_pair("Fee (bps)", fees.basis_points);
    info_pair("Max fee", fees.maximum_fee);
    info_pair("Decimals", DECIMALS);
    sub_title("Proceed to transactions");
    demo.run(
        create_mint_recipe(
            payer,
            &mint,
            &mint_authority.pubkey(),
            &config_authority.pubkey(),
            &withdraw_authority.pubkey(),
            fees,
            DECIMALS,
        )?,
        "Signature",
    )?;

    sub_title("Transfering tokens...");
    let source = associated_token_address(&owner.pubkey(), &mint.pubkey());
    info_pair("Mint amount", MINT_AMOUNT);
    demo.run(
        fund_source_recipe(
            payer,
            &mint.pubkey(),
            &mint_authority,
            &owner.pubkey(),
            MINT_AMOUNT,
        )?,
        "Source",
    )?;
    demo.run(
        create_token_account(
            payer,
            &destination,
            &mint.pubkey(),
            &owner.pubkey(),
            &[ExtensionType::TransferFeeConfig],
        )?,
        "Destination",
    )?;

    let mint_account = demo
        .ledger()
        .account(&mint.pubkey())?
        .ok_or_else(|| anyhow::anyhow!("Mint {} not found after creation", mint.pubkey()))?;
    let fee = transfer_fee_for(&mint_account, TRANSFER_AMOUNT)?;
    info_pair("Tx amount", TRANSFER_AMOUNT);
    info_pair("Fee", fee);
    let transfer = demo.run(
        transfer_recipe(
            payer,
            &mint.pubkey(),
            &source,
            &destination.pubkey(),
            &owner,
            TRANSFER_AMOUNT,
            DECIMALS,
            fee,
        )?,
        "Transfer",
    )?;

    sub_title("Find and withdraw withheld tokens from accounts...");
    let withheld_accounts = accounts_with_withheld_fees(demo.ledger(), &mint.pubkey())?;
    info_pair("Withheld in", withheld_accounts.len());

    let collection = if withheld_accounts.is_empty() {
        info("No withheld fees to collect");
        None
    } else {
        let recipe = match collection {
            FeeCollection::FromAccounts => withdraw_from_accounts_recipe(
                payer,
                &mint.pubkey(),
                &destination.pubkey(),
                &withdraw_authority,
                &withheld_accounts,
            )?,
            FeeCollection::HarvestToMint => harvest_and_withdraw_recipe(
                payer,
                &mint.pubkey(),
                &source,
                &withdraw_authority,
                &withheld_accounts,
            )?,
        };
        Some(demo.run(recipe, "Withdraw")?)
    };

    if let Some(account) = demo.ledger().account(&destination.pubkey())? {
        info_pair("Dest. balance", token_balance(&account)?);
    }

    Ok(TransferFeeOutcome {
        mint: mint.pubkey(),
        source,
        destination: destination.pubkey(),
        fee,
        withheld_accounts,
        transfer,
        collection,
    })
}

#[cfg(test)]
mod tests {
    use solana_sdk::program_pack::Pack;
    use spl_token_2022_interface::extension::{
        transfer_fee::TransferFee,
        BaseStateWithExtensionsMut,
        StateWithExtensionsMut,
    };

    use super::*;

    fn mint_charging(fees: FeeParams) -> Account {
        let len =
            ExtensionType::try_calculate_account_len::<Mint>(&[ExtensionType::TransferFeeConfig])
                .unwrap();
        let mut data = vec![0; len];
        let mut state = StateWithExtensionsMut::<Mint>::unpack_uninitialized(&mut data).unwrap();
        let config = state.init_extension::<TransferFeeConfig>(true).unwrap();
        let schedule = TransferFee {
            epoch: 0.into(),
            maximum_fee: fees.maximum_fee.into(),
            transfer_fee_basis_points: fees.basis_points.into(),
        };
        config.older_transfer_fee = schedule;
        config.newer_transfer_fee = schedule;
        state.base = Mint {
            decimals: DECIMALS,
            is_initialized: true,
            ..Default::default()
        };
        state.pack_base();
        state.init_account_type().unwrap();

        Account {
            lamports: 1,
            data,
            owner: TOKEN_PROGRAM_ID,
            ..Default::default()
        }
    }

    #[test]
    fn fee_is_read_from_the_mint() {
        let mint = mint_charging(FeeParams::default());
        assert_eq!(transfer_fee_for(&mint, TRANSFER_AMOUNT), Ok(5_000));
        assert_eq!(transfer_fee_for(&mint, 10 * TRANSFER_AMOUNT), Ok(5_000));
        assert_eq!(transfer_fee_for(&mint, 1), Ok(1));
        assert_eq!(transfer_fee_for(&mint, 201), Ok(2));
        assert_eq!(transfer_fee_for(&mint, 0), Ok(0));

        let free = mint_charging(FeeParams {
            basis_points: 0,
            maximum_fee: 5_000,
        });
        assert_eq!(transfer_fee_for(&free, TRANSFER_AMOUNT), Ok(0));
    }

    #[test]
    fn mints_without_fees_are_rejected() {
        let mut data = vec![0; Mint::LEN];
        Mint {
            decimals: DECIMALS,
            is_initialized: true,
            ..Default::default()
        }
        .pack_into_slice(&mut data);
        let plain = Account {
            lamports: 1,
            data,
            owner: TOKEN_PROGRAM_ID,
            ..Default::default()
        };
        assert!(transfer_fee_for(&plain, TRANSFER_AMOUNT).is_err());
    }
}
