//! Byte sizes for new Token-2022 accounts. The layout rules belong to the token program's
//! interface crates; this module only picks which rule applies.

use solana_program_error::ProgramError;
use spl_token_2022_interface::{
    extension::ExtensionType,
    state::{
        Account,
        Mint,
    },
};
use spl_token_metadata_interface::state::TokenMetadata;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum AccountKind {
    Mint,
    TokenAccount,
}

/// The size of a new `kind` account that carries `extensions`.
pub fn compute_space(kind: AccountKind, extensions: &[ExtensionType]) -> Result<usize, ProgramError> {
    match kind {
        AccountKind::Mint => ExtensionType::try_calculate_account_len::<Mint>(extensions),
        AccountKind::TokenAccount => ExtensionType::try_calculate_account_len::<Account>(extensions),
    }
}

/// The TLV size `metadata` takes once it's written into the mint, type and length headers
/// included.
pub fn metadata_space(metadata: &TokenMetadata) -> Result<usize, ProgramError> {
    metadata.tlv_size_of()
}

/// Space requirements of an account created by a recipe.
///
/// `allocated` is what the create instruction reserves; `funded` is what rent is paid for.
/// They differ when a later instruction in the same transaction grows the account, which is
/// how variable-length metadata gets appended to a mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountSpace {
    pub allocated: usize,
    pub funded: usize,
}

impl AccountSpace {
    pub const fn exact(len: usize) -> Self {
        Self {
            allocated: len,
            funded: len,
        }
    }

    pub fn for_extensions(
        kind: AccountKind,
        extensions: &[ExtensionType],
    ) -> Result<Self, ProgramError> {
        compute_space(kind, extensions).map(Self::exact)
    }

    /// Reserves `allocated` bytes now while funding `allocated + extra` bytes.
    pub fn with_growth(allocated: usize, extra: usize) -> Self {
        Self {
            allocated,
            funded: allocated.saturating_add(extra),
        }
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::{
        program_pack::Pack,
        pubkey::Pubkey,
    };

    use super::*;

    #[test]
    fn base_sizes_match_the_token_layouts() {
        assert_eq!(compute_space(AccountKind::Mint, &[]).unwrap(), Mint::LEN);
        assert_eq!(
            compute_space(AccountKind::TokenAccount, &[]).unwrap(),
            Account::LEN
        );
    }

    #[test]
    fn extensions_grow_the_account() {
        let plain = compute_space(AccountKind::Mint, &[]).unwrap();
        let close = compute_space(AccountKind::Mint, &[ExtensionType::MintCloseAuthority]).unwrap();
        let fees = compute_space(AccountKind::Mint, &[ExtensionType::TransferFeeConfig]).unwrap();
        assert!(close > plain);
        assert!(fees > close);

        let immutable =
            compute_space(AccountKind::TokenAccount, &[ExtensionType::ImmutableOwner]).unwrap();
        assert!(immutable > Account::LEN);
    }

    #[test]
    fn metadata_space_grows_with_content() {
        let short = TokenMetadata {
            mint: Pubkey::new_unique(),
            name: "a".into(),
            symbol: "b".into(),
            uri: "c".into(),
            ..Default::default()
        };
        let mut long = short.clone();
        long.additional_metadata.push(("key".into(), "value".into()));

        let short_len = metadata_space(&short).unwrap();
        let long_len = metadata_space(&long).unwrap();
        assert_eq!(long_len - short_len, 4 + "key".len() + 4 + "value".len());
    }

    #[test]
    fn growth_funds_more_than_it_allocates() {
        let space = AccountSpace::with_growth(234, 100);
        assert_eq!(space.allocated, 234);
        assert_eq!(space.funded, 334);
        assert_eq!(AccountSpace::exact(82).funded, 82);
    }
}
