//! The network boundary: every request this workspace makes to a ledger goes through
//! [`LedgerClient`].

use solana_account::Account;
use solana_client::{
    client_error::{
        ClientError,
        ClientErrorKind,
    },
    rpc_client::RpcClient,
    rpc_config::{
        RpcAccountInfoConfig,
        RpcProgramAccountsConfig,
        UiAccountEncoding,
    },
    rpc_filter::{
        Memcmp,
        RpcFilterType,
    },
    rpc_request::{
        RpcError,
        RpcResponseErrorData,
    },
    rpc_response::{
        RpcSimulateTransactionResult,
        UiAccount,
    },
};
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use solana_transaction_error::TransactionError;

use crate::config::ClientConfig;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The request never got a verdict: unreachable endpoint, timeout, malformed response.
    #[error("network failure: {0}")]
    Network(String),

    /// The transaction was well formed but the network's program logic refused it.
    #[error("rejected by network: {reason}")]
    Rejected {
        reason: String,
        /// Index of the failing instruction within the submitted transaction, when known.
        instruction: Option<u8>,
    },
}

impl LedgerError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
            instruction: None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<TransactionError> for LedgerError {
    fn from(error: TransactionError) -> Self {
        let instruction = match &error {
            TransactionError::InstructionError(index, _) => Some(*index),
            _ => None,
        };
        Self::Rejected {
            reason: error.to_string(),
            instruction,
        }
    }
}

impl From<ClientError> for LedgerError {
    fn from(error: ClientError) -> Self {
        let Some(tx_error) = error.get_transaction_error() else {
            return Self::Network(error.to_string());
        };

        let mut rejected = LedgerError::from(tx_error);
        if let (LedgerError::Rejected { reason, .. }, Some(logs)) =
            (&mut rejected, preflight_logs(&error))
        {
            reason.push_str("\n  ");
            reason.push_str(&logs.join("\n  "));
        }
        rejected
    }
}

fn preflight_logs(error: &ClientError) -> Option<Vec<String>> {
    match error.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data:
                RpcResponseErrorData::SendTransactionPreflightFailure(RpcSimulateTransactionResult {
                    logs: Some(logs),
                    ..
                }),
            ..
        }) if !logs.is_empty() => Some(logs.clone()),
        _ => None,
    }
}

/// Decodes a base64 or base58 encoded RPC account. Parsed JSON accounts yield `None`.
fn decode_ui_account(ui_account: &UiAccount) -> Option<Account> {
    ui_account.decode::<Account>()
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// The four request shapes a recipe needs (rent query, account enumeration, atomic submission,
/// confirmation) plus the reads and faucet calls the demos use around them.
pub trait LedgerClient {
    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> LedgerResult<u64>;

    fn latest_blockhash(&self) -> LedgerResult<Hash>;

    /// Submits `transaction` as one atomic unit and blocks until it is confirmed or fails.
    fn send_and_confirm(&self, transaction: &Transaction) -> LedgerResult<Signature>;

    fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> LedgerResult<Signature>;

    fn confirm(&self, signature: &Signature) -> LedgerResult<bool>;

    fn balance(&self, address: &Pubkey) -> LedgerResult<u64>;

    fn account(&self, address: &Pubkey) -> LedgerResult<Option<Account>>;

    /// All accounts owned by `program` whose first 32 bytes are `mint`, i.e. the mint's token
    /// accounts.
    fn token_accounts_for_mint(
        &self,
        program: &Pubkey,
        mint: &Pubkey,
    ) -> LedgerResult<Vec<(Pubkey, Account)>>;

    /// Simulates `transaction` and returns the program's return data, if any was set.
    fn simulate_return_data(&self, transaction: &Transaction) -> LedgerResult<Option<Vec<u8>>>;
}

/// [`LedgerClient`] backed by a JSON RPC endpoint.
pub struct RpcLedger {
    pub client: RpcClient,
}

impl RpcLedger {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(config.endpoint().to_string(), config.commitment),
        }
    }
}

impl LedgerClient for RpcLedger {
    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> LedgerResult<u64> {
        Ok(self.client.get_minimum_balance_for_rent_exemption(data_len)?)
    }

    fn latest_blockhash(&self) -> LedgerResult<Hash> {
        Ok(self.client.get_latest_blockhash()?)
    }

    fn send_and_confirm(&self, transaction: &Transaction) -> LedgerResult<Signature> {
        Ok(self.client.send_and_confirm_transaction(transaction)?)
    }

    fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> LedgerResult<Signature> {
        Ok(self.client.request_airdrop(to, lamports)?)
    }

    fn confirm(&self, signature: &Signature) -> LedgerResult<bool> {
        Ok(self.client.confirm_transaction(signature)?)
    }

    fn balance(&self, address: &Pubkey) -> LedgerResult<u64> {
        Ok(self.client.get_balance(address)?)
    }

    fn account(&self, address: &Pubkey) -> LedgerResult<Option<Account>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())?;
        Ok(response.value)
    }

    fn token_accounts_for_mint(
        &self,
        program: &Pubkey,
        mint: &Pubkey,
    ) -> LedgerResult<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                0,
                mint.to_bytes().to_vec(),
            ))]),
            account_config: RpcAccountInfoConfig {
                commitment: Some(self.client.commitment()),
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: None,
                min_context_slot: None,
            },
            with_context: Some(false),
            sort_results: Some(true),
        };
        self.client
            .get_program_ui_accounts_with_config(program, config)?
            .into_iter()
            .map(|(address, ui_account)| {
                decode_ui_account(&ui_account)
                    .map(|account| (address, account))
                    .ok_or_else(|| LedgerError::Network(format!("Undecodable account {address}")))
            })
            .collect()
    }

    fn simulate_return_data(&self, transaction: &Transaction) -> LedgerResult<Option<Vec<u8>>> {
        use base64::{
            engine::general_purpose::STANDARD,
            Engine,
        };

        let result = self.client.simulate_transaction(transaction)?.value;
        if let Some(err) = result.err {
            return Err(TransactionError::from(err).into());
        }

        result
            .return_data
            .map(|return_data| {
                STANDARD
                    .decode(&return_data.data.0)
                    .map_err(|e| LedgerError::Network(format!("Bad return data encoding: {e}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use base64::{
        engine::general_purpose::STANDARD,
        Engine,
    };
    use solana_client::rpc_response::UiAccountData;
    use solana_instruction_error::InstructionError;

    use super::*;

    #[test]
    fn rpc_accounts_decode_from_base64() {
        let owner = Pubkey::new_unique();
        let data = vec![7u8; 165];
        let ui_account = UiAccount {
            lamports: 2_039_280,
            data: UiAccountData::Binary(STANDARD.encode(&data), UiAccountEncoding::Base64),
            owner: owner.to_string(),
            executable: false,
            rent_epoch: u64::MAX,
            space: Some(data.len() as u64),
        };

        let account = decode_ui_account(&ui_account).unwrap();
        assert_eq!(account.lamports, 2_039_280);
        assert_eq!(account.owner, owner);
        assert_eq!(account.data, data);

        let parsed = UiAccount {
            data: UiAccountData::Binary(String::new(), UiAccountEncoding::JsonParsed),
            ..ui_account
        };
        assert!(decode_ui_account(&parsed).is_none());
    }

    #[test]
    fn instruction_errors_keep_their_index() {
        let error = LedgerError::from(TransactionError::InstructionError(
            2,
            InstructionError::Custom(1),
        ));
        match error {
            LedgerError::Rejected {
                instruction,
                reason,
            } => {
                assert_eq!(instruction, Some(2));
                assert!(!reason.is_empty());
            }
            other => panic!("Expected a rejection, got {other:?}"),
        }
    }

    #[test]
    fn transaction_level_errors_have_no_index() {
        let error = LedgerError::from(TransactionError::InsufficientFundsForFee);
        assert!(error.is_rejection());
        assert!(matches!(
            error,
            LedgerError::Rejected {
                instruction: None,
                ..
            }
        ));
    }
}
