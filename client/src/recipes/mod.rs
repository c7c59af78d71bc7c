//! One parameterized recipe per Token-2022 extension walkthrough.
//!
//! Each module exposes the recipe builders on their own (so they can be built and inspected
//! without a network) and a `run` flow that executes them against a [`LedgerClient`] and
//! prints the walkthrough.

use anyhow::Context;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{
        Keypair,
        Signature,
    },
};

use crate::{
    config::ClientConfig,
    ledger::LedgerClient,
    recipe::{
        Recipe,
        RecipeRunner,
        SendConfig,
    },
};

pub mod closing_mint;
pub mod default_account_state;
pub mod immutable_owner;
pub mod interest_bearing;
pub mod non_transferable;
pub mod permanent_delegate;
pub mod reallocate;
pub mod token_accounts;
pub mod token_metadata;
pub mod transfer_fee;

/// Every recipe in this module targets the Token-2022 program.
pub const TOKEN_PROGRAM_ID: Pubkey = spl_token_2022_interface::ID;

/// The context every walkthrough runs in: where to submit, how to report, and who pays.
pub struct Demo<'a, L> {
    runner: RecipeRunner<'a, L>,
    payer: &'a Keypair,
}

impl<'a, L: LedgerClient> Demo<'a, L> {
    pub fn new(ledger: &'a L, config: &'a ClientConfig, payer: &'a Keypair) -> Self {
        Self {
            runner: RecipeRunner::new(ledger, config),
            payer,
        }
    }

    pub fn with_send_config(mut self, send_config: SendConfig) -> Self {
        self.runner = self.runner.with_send_config(send_config);
        self
    }

    pub fn payer(&self) -> &'a Keypair {
        self.payer
    }

    pub fn ledger(&self) -> &'a L {
        self.runner.ledger()
    }

    pub fn config(&self) -> &'a ClientConfig {
        self.runner.config()
    }

    pub fn runner(&self) -> &RecipeRunner<'a, L> {
        &self.runner
    }

    /// Executes `recipe` and reports it under `label`.
    pub fn run(&self, recipe: Recipe<'_>, label: &str) -> anyhow::Result<Signature> {
        let name = recipe.name().to_string();
        self.runner
            .execute(recipe, label)
            .into_result()
            .with_context(|| format!("recipe `{name}` failed"))
    }
}
