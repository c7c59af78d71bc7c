//! Recipes: ordered instruction steps that are built, signed and submitted as one atomic
//! transaction.
//!
//! A recipe moves through `Built -> Submitted -> {Confirmed | Failed}` exactly once.
//! [`RecipeRunner::build`] consumes the [`Recipe`] and [`RecipeRunner::submit`] consumes the
//! [`BuiltRecipe`], so no state can be re-entered.

use std::collections::{
    HashMap,
    HashSet,
};

use solana_instruction::Instruction;
use solana_program_error::ProgramError;
use solana_sdk::{
    message::Message,
    pubkey::Pubkey,
    signature::{
        Keypair,
        Signature,
    },
    signer::{
        Signer,
        SignerError,
    },
    transaction::Transaction,
};
use solana_system_interface::instruction::create_account;
use spl_token_2022_interface::extension::ExtensionType;

use crate::{
    config::ClientConfig,
    ledger::{
        LedgerClient,
        LedgerError,
        LedgerResult,
    },
    logs::{
        log_error,
        log_info,
        log_success,
        pad_label,
        DEFAULT_PAD,
    },
    pretty::PrettyInstructions,
    space::{
        self,
        AccountKind,
        AccountSpace,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{0} must sign but isn't in the signer set")]
    MissingSigner(Pubkey),

    #[error("recipe `{0}` has no instructions")]
    Empty(String),

    #[error("failed to sign the transaction: {0}")]
    Signing(#[from] SignerError),

    #[error("failed to encode an instruction: {0}")]
    Instruction(#[from] ProgramError),
}

/// One entry of a recipe.
#[derive(Clone, Debug)]
pub enum Step {
    /// Allocates a new account owned by `owner`. The runner resolves the rent-exempt balance
    /// for `space.funded` bytes when the recipe is built.
    CreateAccount {
        label: String,
        address: Pubkey,
        owner: Pubkey,
        space: AccountSpace,
    },
    Instructions {
        label: String,
        instructions: Vec<Instruction>,
    },
}

impl Step {
    pub fn create_account(
        label: impl Into<String>,
        address: Pubkey,
        owner: Pubkey,
        space: AccountSpace,
    ) -> Self {
        Self::CreateAccount {
            label: label.into(),
            address,
            owner,
            space,
        }
    }

    pub fn instruction(label: impl Into<String>, instruction: Instruction) -> Self {
        Self::Instructions {
            label: label.into(),
            instructions: vec![instruction],
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::CreateAccount { label, .. } | Self::Instructions { label, .. } => label,
        }
    }
}

/// A named, ordered sequence of steps plus the keypairs that authorize them. The payer signs
/// first and pays the fees.
pub struct Recipe<'a> {
    name: String,
    payer: &'a Keypair,
    signers: Vec<&'a Keypair>,
    steps: Vec<Step>,
}

impl<'a> Recipe<'a> {
    pub fn new(name: impl Into<String>, payer: &'a Keypair) -> Self {
        Self {
            name: name.into(),
            payer,
            signers: vec![],
            steps: vec![],
        }
    }

    pub fn signer(mut self, signer: &'a Keypair) -> Self {
        self.signers.push(signer);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn create_account(
        self,
        label: impl Into<String>,
        address: Pubkey,
        owner: Pubkey,
        space: AccountSpace,
    ) -> Self {
        self.step(Step::create_account(label, address, owner, space))
    }

    /// Appends an instruction as its own step.
    pub fn then(self, label: impl Into<String>, instruction: Instruction) -> Self {
        self.step(Step::instruction(label, instruction))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn payer(&self) -> &Keypair {
        self.payer
    }

    /// Payer first, then every other signer once, in the order they were added.
    fn signer_set(&self) -> Vec<&'a Keypair> {
        let mut seen = HashSet::new();
        std::iter::once(self.payer)
            .chain(self.signers.iter().copied())
            .filter(|kp| seen.insert(kp.pubkey()))
            .collect()
    }
}

/// A recipe whose steps have been resolved into the exact instruction sequence to submit.
pub struct BuiltRecipe<'a> {
    name: String,
    payer: &'a Keypair,
    signers: Vec<&'a Keypair>,
    instructions: Vec<Instruction>,
    /// The label of the step each instruction came from, index aligned with `instructions`.
    step_labels: Vec<String>,
}

impl BuiltRecipe<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn signers(&self) -> Vec<Pubkey> {
        self.signers.iter().map(|kp| kp.pubkey()).collect()
    }

    pub fn step_for_instruction(&self, index: usize) -> Option<&str> {
        self.step_labels.get(index).map(String::as_str)
    }

    fn sign(&self, blockhash: solana_sdk::hash::Hash) -> Result<Transaction, RecipeError> {
        let message = Message::new(&self.instructions, Some(&self.payer.pubkey()));
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(&self.signers, blockhash)?;
        Ok(tx)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum RecipeState {
    Built,
    Submitted,
    Confirmed,
    Failed,
}

/// The outcome of one recipe execution: a signature or the reason it failed, never both.
#[derive(Debug)]
pub struct SubmissionResult {
    pub recipe: String,
    pub outcome: Result<Signature, RecipeError>,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn state(&self) -> RecipeState {
        match self.outcome {
            Ok(_) => RecipeState::Confirmed,
            Err(_) => RecipeState::Failed,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&RecipeError> {
        self.outcome.as_ref().err()
    }

    /// The network's verdict when it refused the transaction.
    pub fn rejection(&self) -> Option<&LedgerError> {
        match &self.outcome {
            Err(RecipeError::Ledger(e)) if e.is_rejection() => Some(e),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<Signature, RecipeError> {
        self.outcome
    }

    /// One report line: the explorer link on success, the failure detail otherwise.
    pub fn render(&self, label: &str, config: &ClientConfig) -> String {
        let label = pad_label(label, DEFAULT_PAD);
        match &self.outcome {
            Ok(signature) => format!("🚀 {label} : {}", config.tx_link(signature)),
            Err(e) => format!("❌ {label} : {} failed: {e}", self.recipe),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SendConfig {
    /// Print the built instruction list before submitting it.
    pub debug_logs: bool,
}

impl Default for SendConfig {
    fn default() -> Self {
        SendConfig { debug_logs: true }
    }
}

pub struct RecipeRunner<'a, L> {
    ledger: &'a L,
    config: &'a ClientConfig,
    send_config: SendConfig,
}

impl<'a, L: LedgerClient> RecipeRunner<'a, L> {
    pub fn new(ledger: &'a L, config: &'a ClientConfig) -> Self {
        Self {
            ledger,
            config,
            send_config: SendConfig::default(),
        }
    }

    pub fn with_send_config(mut self, send_config: SendConfig) -> Self {
        self.send_config = send_config;
        self
    }

    pub fn ledger(&self) -> &'a L {
        self.ledger
    }

    pub fn config(&self) -> &'a ClientConfig {
        self.config
    }

    pub fn compute_space(
        kind: AccountKind,
        extensions: &[ExtensionType],
    ) -> Result<usize, ProgramError> {
        space::compute_space(kind, extensions)
    }

    /// One network round trip; failures are surfaced as is.
    pub fn compute_rent_exemption(&self, data_len: usize) -> LedgerResult<u64> {
        self.ledger.minimum_balance_for_rent_exemption(data_len)
    }

    /// Resolves every step into instructions, preserving the recipe's order exactly, and checks
    /// that the signer set covers every account that must sign.
    pub fn build<'r>(&self, recipe: Recipe<'r>) -> Result<BuiltRecipe<'r>, RecipeError> {
        let signers = recipe.signer_set();
        let payer = recipe.payer;
        let mut rent_by_len: HashMap<usize, u64> = HashMap::new();
        let mut instructions = vec![];
        let mut step_labels = vec![];

        for step in recipe.steps {
            match step {
                Step::CreateAccount {
                    label,
                    address,
                    owner,
                    space,
                } => {
                    let lamports = match rent_by_len.get(&space.funded) {
                        Some(lamports) => *lamports,
                        None => {
                            let lamports = self.compute_rent_exemption(space.funded)?;
                            rent_by_len.insert(space.funded, lamports);
                            lamports
                        }
                    };
                    instructions.push(create_account(
                        &payer.pubkey(),
                        &address,
                        lamports,
                        space.allocated as u64,
                        &owner,
                    ));
                    step_labels.push(label);
                }
                Step::Instructions {
                    label,
                    instructions: step_instructions,
                } => {
                    step_labels.extend(std::iter::repeat(label).take(step_instructions.len()));
                    instructions.extend(step_instructions);
                }
            }
        }

        if instructions.is_empty() {
            return Err(RecipeError::Empty(recipe.name));
        }

        let signer_keys: HashSet<Pubkey> = signers.iter().map(|kp| kp.pubkey()).collect();
        if let Some(missing) = instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter())
            .find(|meta| meta.is_signer && !signer_keys.contains(&meta.pubkey))
        {
            return Err(RecipeError::MissingSigner(missing.pubkey));
        }

        Ok(BuiltRecipe {
            name: recipe.name,
            payer,
            signers,
            instructions,
            step_labels,
        })
    }

    /// Signs `built` with exactly its signers, submits it once and waits for confirmation.
    pub fn submit(&self, built: BuiltRecipe<'_>) -> SubmissionResult {
        if self.send_config.debug_logs {
            println!(
                "{}",
                PrettyInstructions {
                    indent_size: 2,
                    instructions: built.instructions(),
                }
            );
        }

        let outcome = self
            .ledger
            .latest_blockhash()
            .map_err(RecipeError::from)
            .and_then(|blockhash| built.sign(blockhash))
            .and_then(|tx| {
                log_info(RecipeState::Submitted, &built.name);
                self.ledger.send_and_confirm(&tx).map_err(RecipeError::from)
            });

        if outcome.is_ok() {
            log_success(RecipeState::Confirmed, &built.name);
        }

        if let Err(RecipeError::Ledger(LedgerError::Rejected {
            instruction: Some(index),
            ..
        })) = &outcome
        {
            if let Some(step) = built.step_for_instruction(*index as usize) {
                log_error("Failed step", format!("#{} ({step})", *index as usize + 1));
            }
        }

        SubmissionResult {
            recipe: built.name,
            outcome,
        }
    }

    pub fn report(&self, result: &SubmissionResult, label: &str) {
        println!("{}", result.render(label, self.config));
    }

    /// Builds, submits and reports `recipe` under `label`.
    pub fn execute(&self, recipe: Recipe<'_>, label: &str) -> SubmissionResult {
        let name = recipe.name().to_string();
        let result = match self.build(recipe) {
            Ok(built) => self.submit(built),
            Err(e) => SubmissionResult {
                recipe: name,
                outcome: Err(e),
            },
        };
        self.report(&result, label);
        result
    }
}
