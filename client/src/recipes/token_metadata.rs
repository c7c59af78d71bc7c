//! A mint that stores its own name, symbol, URI and custom fields, pointed at by its metadata
//! pointer.

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
        metadata_pointer,
        BaseStateWithExtensions,
        ExtensionType,
        StateWithExtensions,
    },
    instruction::initialize_mint2,
    state::Mint,
};
use spl_token_metadata_interface::{
    instruction::{
        initialize as initialize_metadata,
        update_field,
    },
    state::{
        Field,
        TokenMetadata,
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
        compute_space,
        metadata_space,
        AccountKind,
        AccountSpace,
    },
};

pub const DECIMALS: u8 = 2;

pub const NAME_VAR: &str = "TOKEN_NAME";
pub const SYMBOL_VAR: &str = "TOKEN_SYMBOL";
pub const URI_VAR: &str = "TOKEN_URI";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataParams {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// Custom fields written after the base metadata, in order.
    pub additional: Vec<(String, String)>,
}

impl MetadataParams {
    /// Missing values fall back to `TOKEN_NAME`, `TOKEN_SYMBOL` and `TOKEN_URI`, then to an
    /// empty string.
    pub fn from_env_or(
        name: Option<String>,
        symbol: Option<String>,
        uri: Option<String>,
    ) -> Self {
        let or_env = |value: Option<String>, var: &str| {
            value
                .or_else(|| std::env::var(var).ok())
                .unwrap_or_default()
        };
        Self {
            name: or_env(name, NAME_VAR),
            symbol: or_env(symbol, SYMBOL_VAR),
            uri: or_env(uri, URI_VAR),
            additional: vec![("key".into(), "value".into())],
        }
    }

    pub fn to_token_metadata(&self, mint: &Pubkey, update_authority: &Pubkey) -> TokenMetadata {
        TokenMetadata {
            update_authority: Some(*update_authority).try_into().unwrap_or_default(),
            mint: *mint,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            additional_metadata: self.additional.clone(),
        }
    }
}

/// The mint is allocated for its fixed-size extensions only, but funded for the metadata that
/// the token program appends (and reallocates for) later in the same transaction.
pub fn create_mint_recipe<'a>(
    payer: &'a Keypair,
    mint: &'a Keypair,
    params: &MetadataParams,
    decimals: u8,
) -> Result<Recipe<'a>, RecipeError> {
    let authority = payer.pubkey();
    let metadata = params.to_token_metadata(&mint.pubkey(), &authority);
    let space = AccountSpace::with_growth(
        compute_space(AccountKind::Mint, &[ExtensionType::MetadataPointer])?,
        metadata_space(&metadata)?,
    );

    let mut recipe = Recipe::new("token-metadata-mint", payer)
        .signer(mint)
        .create_account("Create account", mint.pubkey(), TOKEN_PROGRAM_ID, space)
        .then(
            "Metadata pointer init.",
            metadata_pointer::instruction::initialize(
                &TOKEN_PROGRAM_ID,
                &mint.pubkey(),
                Some(authority),
                Some(mint.pubkey()),
            )?,
        )
        .then(
            "Initialize mint",
            initialize_mint2(&TOKEN_PROGRAM_ID, &mint.pubkey(), &authority, None, decimals)?,
        )
        .then(
            "Metadata init.",
            initialize_metadata(
                &TOKEN_PROGRAM_ID,
                &mint.pubkey(),
                &authority,
                &mint.pubkey(),
                &authority,
                params.name.clone(),
                params.symbol.clone(),
                params.uri.clone(),
            ),
        );

    for (key, value) in &params.additional {
        recipe = recipe.then(
            format!("Update field `{key}`"),
            update_field(
                &TOKEN_PROGRAM_ID,
                &mint.pubkey(),
                &authority,
                Field::Key(key.clone()),
                value.clone(),
            ),
        );
    }

    Ok(recipe)
}

/// The metadata stored inside a Token-2022 mint account.
pub fn read_metadata(mint_account: &Account) -> Result<TokenMetadata, ProgramError> {
    StateWithExtensions::<Mint>::unpack(&mint_account.data)?
        .get_variable_len_extension::<TokenMetadata>()
}

pub struct TokenMetadataOutcome {
    pub mint: Pubkey,
    pub signature: Signature,
    pub metadata: TokenMetadata,
}

pub fn run<L: LedgerClient>(
    demo: &Demo<'_, L>,
    params: &MetadataParams,
) -> anyhow::Result<TokenMetadataOutcome> {
    title("Solana Token Extensions (Token Metadata)");

    info("Get keys...");
    let payer = demo.payer();
    display_wallet("Payer", payer);
    let mint = Keypair::new();
    display_wallet("Mint", &mint);
    println!();

    sub_title("Build Metadata");
    info_pair("Name", &params.name);
    info_pair("Symbol", &params.symbol);
    info_pair("Uri", &params.uri);
    info_pair("Decimals", DECIMALS);
    println!();

    sub_title("Proceed to transactions");
    let signature = demo.run(
        create_mint_recipe(payer, &mint, params, DECIMALS)?,
        "Signature",
    )?;

    let account = demo
        .ledger()
        .account(&mint.pubkey())?
        .ok_or_else(|| anyhow::anyhow!("Mint {} not found after creation", mint.pubkey()))?;
    let metadata = read_metadata(&account)?;
    println!();
    println!("{metadata:#?}");

    Ok(TokenMetadataOutcome {
        mint: mint.pubkey(),
        signature,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win_over_the_environment() {
        let params = MetadataParams::from_env_or(
            Some("Name".into()),
            Some("SYM".into()),
            Some("https://example.com/meta.json".into()),
        );
        assert_eq!(params.name, "Name");
        assert_eq!(params.symbol, "SYM");
        assert_eq!(params.uri, "https://example.com/meta.json");
        assert_eq!(params.additional, vec![("key".into(), "value".into())]);
    }

    #[test]
    fn mint_is_funded_for_the_metadata_it_will_hold() {
        let payer = Keypair::new();
        let mint = Keypair::new();
        let params = MetadataParams {
            name: "Name".into(),
            symbol: "SYM".into(),
            uri: "uri".into(),
            additional: vec![("key".into(), "value".into())],
        };
        let recipe = create_mint_recipe(&payer, &mint, &params, DECIMALS).unwrap();

        let labels: Vec<&str> = recipe.steps().iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            [
                "Create account",
                "Metadata pointer init.",
                "Initialize mint",
                "Metadata init.",
                "Update field `key`",
            ]
        );

        let crate::recipe::Step::CreateAccount { space, .. } = &recipe.steps()[0] else {
            panic!("The first step should create the mint");
        };
        let metadata = params.to_token_metadata(&mint.pubkey(), &payer.pubkey());
        assert_eq!(
            space.allocated,
            compute_space(AccountKind::Mint, &[ExtensionType::MetadataPointer]).unwrap()
        );
        assert_eq!(
            space.funded,
            space.allocated + metadata.tlv_size_of().unwrap()
        );
    }
}
