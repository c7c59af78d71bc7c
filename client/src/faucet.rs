use std::time::Duration;

use solana_sdk::{
    pubkey::Pubkey,
    signature::Signature,
};

use crate::{
    config::ClientConfig,
    ledger::{
        LedgerClient,
        LedgerError,
    },
    logs::{
        pad_label,
        DEFAULT_PAD,
    },
};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const MAX_CONFIRMATION_POLLS: usize = 30;
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum AirdropError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("airdrop {0} was not confirmed in time")]
    Unconfirmed(Signature),
}

/// Non-positive (and non-finite) amounts fall back to 1 SOL.
pub fn airdrop_lamports(sol: f64) -> u64 {
    let sol = if sol.is_finite() && sol > 0.0 { sol } else { 1.0 };
    (sol * LAMPORTS_PER_SOL as f64) as u64
}

/// Requests `sol` SOL from the cluster faucet for `address` and waits for the airdrop to land.
pub async fn airdrop<L: LedgerClient>(
    ledger: &L,
    config: &ClientConfig,
    name: &str,
    address: &Pubkey,
    sol: f64,
) -> Result<Signature, AirdropError> {
    let lamports = airdrop_lamports(sol);
    println!(
        "🏧 {} : {} SOL to {address}",
        pad_label("Airdrop", DEFAULT_PAD),
        lamports as f64 / LAMPORTS_PER_SOL as f64
    );

    let signature = ledger.request_airdrop(address, lamports)?;
    wait_for_confirmation(ledger, &signature).await?;

    println!(
        "✅ {} : {}",
        pad_label(name, DEFAULT_PAD),
        config.address_link(address)
    );
    Ok(signature)
}

async fn wait_for_confirmation<L: LedgerClient>(
    ledger: &L,
    signature: &Signature,
) -> Result<(), AirdropError> {
    for _ in 0..MAX_CONFIRMATION_POLLS {
        if ledger.confirm(signature)? {
            return Ok(());
        }
        tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
    }
    Err(AirdropError::Unconfirmed(*signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mollusk_helpers::MolluskLedger;

    #[test]
    fn non_positive_amounts_become_one_sol() {
        assert_eq!(airdrop_lamports(0.0), LAMPORTS_PER_SOL);
        assert_eq!(airdrop_lamports(-3.0), LAMPORTS_PER_SOL);
        assert_eq!(airdrop_lamports(f64::NAN), LAMPORTS_PER_SOL);
        assert_eq!(airdrop_lamports(2.0), 2 * LAMPORTS_PER_SOL);
        assert_eq!(airdrop_lamports(0.5), LAMPORTS_PER_SOL / 2);
    }

    #[tokio::test]
    async fn airdrop_funds_the_address() {
        let ledger = MolluskLedger::default();
        let config = ClientConfig::default();
        let address = Pubkey::new_unique();

        airdrop(&ledger, &config, "payer", &address, 2.0)
            .await
            .unwrap();
        assert_eq!(ledger.balance(&address).unwrap(), 2 * LAMPORTS_PER_SOL);
    }
}
