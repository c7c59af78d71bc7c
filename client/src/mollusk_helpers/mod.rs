//! An in-process [`LedgerClient`] that executes transactions with Mollusk against the real
//! Token-2022, SPL Token and Associated Token Account programs.
//!
//! Transactions are all-or-nothing: instructions run one after another against a scratch copy
//! of the account store, and the copy is only committed once every instruction has succeeded.

use std::{
    cell::RefCell,
    collections::{
        HashMap,
        HashSet,
    },
};

use agave_feature_set::{
    account_data_direct_mapping,
    stricter_abi_and_runtime_constraints,
};
use mollusk_svm::{
    program::ProgramCache,
    Mollusk,
};
use solana_account::Account;
use solana_instruction::{
    AccountMeta,
    Instruction,
};
use solana_sdk::{
    hash::Hash,
    message::Message,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};

use crate::ledger::{
    LedgerClient,
    LedgerError,
    LedgerResult,
};

pub mod utils;

pub use utils::create_mock_user_account;

type AccountStore = HashMap<Pubkey, Account>;

/// Runtime features `Mollusk::default()` enables that aren't active on any cluster yet.
const PENDING_ABI_FEATURES: [Pubkey; 2] = [
    stricter_abi_and_runtime_constraints::ID,
    account_data_direct_mapping::ID,
];

pub struct MolluskLedger {
    mollusk: RefCell<Mollusk>,
    accounts: RefCell<AccountStore>,
    confirmed: RefCell<Vec<Signature>>,
    rejected: RefCell<Vec<LedgerError>>,
}

impl Default for MolluskLedger {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl MolluskLedger {
    /// Creates a ledger with the system, SPL Token, Token-2022 and Associated Token Account
    /// programs loaded, plus the accounts passed.
    pub fn new(accounts: Vec<(Pubkey, Account)>) -> Self {
        let mut mollusk = Mollusk::default();
        // Programs that grow an account and then write into the new bytes without a CPI in
        // between (token metadata) only run under the account ABI the clusters use today.
        for feature in PENDING_ABI_FEATURES {
            mollusk.feature_set.deactivate(&feature);
        }
        mollusk.program_cache =
            ProgramCache::new(&mollusk.feature_set, &mollusk.compute_budget, false);
        mollusk_svm_programs_token::token::add_program(&mut mollusk);
        mollusk_svm_programs_token::token2022::add_program(&mut mollusk);
        mollusk_svm_programs_token::associated_token::add_program(&mut mollusk);

        // Program accounts are passed explicitly whenever an instruction lists them (e.g. the
        // system program in `create_associated_token_account`), so they need to be in the store.
        let mut store: AccountStore = [
            mollusk_svm::program::keyed_account_for_system_program(),
            mollusk_svm_programs_token::token::keyed_account(),
            mollusk_svm_programs_token::token2022::keyed_account(),
            mollusk_svm_programs_token::associated_token::keyed_account(),
        ]
        .into_iter()
        .collect();
        store.extend(accounts);

        Self {
            mollusk: RefCell::new(mollusk),
            accounts: RefCell::new(store),
            confirmed: Default::default(),
            rejected: Default::default(),
        }
    }

    pub fn get_account(&self, address: &Pubkey) -> Option<Account> {
        self.accounts.borrow().get(address).cloned()
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.accounts.borrow_mut().insert(address, account);
    }

    /// Signatures of every transaction committed so far, in order.
    pub fn confirmed_signatures(&self) -> Vec<Signature> {
        self.confirmed.borrow().clone()
    }

    /// Every rejection returned so far, in order.
    pub fn rejections(&self) -> Vec<LedgerError> {
        self.rejected.borrow().clone()
    }

    /// Moves the clock sysvar's unix timestamp forward by `seconds`.
    pub fn advance_clock(&self, seconds: i64) {
        self.mollusk.borrow_mut().sysvars.clock.unix_timestamp += seconds;
    }

    /// Runs `instructions` in order against a scratch copy of the store. Returns the copy and the
    /// last return data on success; nothing is committed here.
    fn execute(&self, instructions: &[Instruction]) -> LedgerResult<(AccountStore, Vec<u8>)> {
        let mollusk = self.mollusk.borrow();
        let mut scratch = self.accounts.borrow().clone();
        let mut return_data = vec![];

        for (index, instruction) in instructions.iter().enumerate() {
            let mut keys = HashSet::new();
            let accounts: Vec<(Pubkey, Account)> = instruction
                .accounts
                .iter()
                .filter(|meta| keys.insert(meta.pubkey))
                .map(|meta| {
                    let account = scratch.get(&meta.pubkey).cloned().unwrap_or_default();
                    (meta.pubkey, account)
                })
                .collect();

            let result = mollusk.process_instruction(instruction, &accounts);
            if !result.program_result.is_ok() {
                return Err(LedgerError::Rejected {
                    reason: format!("{:?}", result.program_result),
                    instruction: Some(index as u8),
                });
            }

            scratch.extend(result.resulting_accounts);
            return_data = result.return_data;
        }

        Ok((scratch, return_data))
    }

    fn reject<T>(&self, error: LedgerError) -> LedgerResult<T> {
        self.rejected.borrow_mut().push(error.clone());
        Err(error)
    }
}

impl LedgerClient for MolluskLedger {
    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> LedgerResult<u64> {
        Ok(self.mollusk.borrow().sysvars.rent.minimum_balance(data_len))
    }

    fn latest_blockhash(&self) -> LedgerResult<Hash> {
        Ok(Hash::new_unique())
    }

    fn send_and_confirm(&self, transaction: &Transaction) -> LedgerResult<Signature> {
        if let Err(e) = transaction.verify() {
            return self.reject(e.into());
        }

        let fee_payer = transaction.message.account_keys.first().copied();
        let payer_is_funded = fee_payer
            .and_then(|payer| self.get_account(&payer))
            .is_some_and(|account| account.lamports > 0);
        if !payer_is_funded {
            return self.reject(LedgerError::rejected("fee payer account not found"));
        }

        let instructions = decompile(&transaction.message);
        match self.execute(&instructions) {
            Ok((scratch, _)) => {
                *self.accounts.borrow_mut() = scratch;
                let signature = transaction.signatures[0];
                self.confirmed.borrow_mut().push(signature);
                Ok(signature)
            }
            Err(e) => self.reject(e),
        }
    }

    fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> LedgerResult<Signature> {
        let mut accounts = self.accounts.borrow_mut();
        let account = accounts
            .entry(*to)
            .or_insert_with(|| Account::new(0, 0, &solana_system_interface::program::ID));
        account.lamports = account.lamports.saturating_add(lamports);

        let signature = Signature::new_unique();
        self.confirmed.borrow_mut().push(signature);
        Ok(signature)
    }

    fn confirm(&self, signature: &Signature) -> LedgerResult<bool> {
        Ok(self.confirmed.borrow().contains(signature))
    }

    fn balance(&self, address: &Pubkey) -> LedgerResult<u64> {
        Ok(self.get_account(address).map_or(0, |account| account.lamports))
    }

    fn account(&self, address: &Pubkey) -> LedgerResult<Option<Account>> {
        Ok(self
            .get_account(address)
            .filter(|account| account.lamports > 0))
    }

    fn token_accounts_for_mint(
        &self,
        program: &Pubkey,
        mint: &Pubkey,
    ) -> LedgerResult<Vec<(Pubkey, Account)>> {
        let mut matches: Vec<(Pubkey, Account)> = self
            .accounts
            .borrow()
            .iter()
            .filter(|(_, account)| {
                account.owner == *program
                    && account.data.len() >= 32
                    && account.data[..32] == mint.to_bytes()
            })
            .map(|(address, account)| (*address, account.clone()))
            .collect();
        matches.sort_by_key(|(address, _)| *address);
        Ok(matches)
    }

    fn simulate_return_data(&self, transaction: &Transaction) -> LedgerResult<Option<Vec<u8>>> {
        let instructions = decompile(&transaction.message);
        let (_, return_data) = self.execute(&instructions)?;
        Ok((!return_data.is_empty()).then_some(return_data))
    }
}

/// Rebuilds the instruction list of a legacy message.
fn decompile(message: &Message) -> Vec<Instruction> {
    let header = &message.header;
    let num_keys = message.account_keys.len();
    let num_signed = header.num_required_signatures as usize;
    let is_writable = |i: usize| {
        if i < num_signed {
            i < num_signed - header.num_readonly_signed_accounts as usize
        } else {
            i < num_keys - header.num_readonly_unsigned_accounts as usize
        }
    };

    message
        .instructions
        .iter()
        .map(|compiled| Instruction {
            program_id: message.account_keys[compiled.program_id_index as usize],
            accounts: compiled
                .accounts
                .iter()
                .map(|&index| {
                    let i = index as usize;
                    AccountMeta {
                        pubkey: message.account_keys[i],
                        is_signer: i < num_signed,
                        is_writable: is_writable(i),
                    }
                })
                .collect(),
            data: compiled.data.clone(),
        })
        .collect()
}
