use solana_account::Account;
use solana_sdk::pubkey::Pubkey;

/// Create the data necessary to send to [`super::MolluskLedger`] to mock a funded account.
pub fn create_mock_user_account(address: Pubkey, lamport_balance: u64) -> (Pubkey, Account) {
    (
        address,
        Account {
            lamports: lamport_balance,
            data: vec![],
            owner: solana_system_interface::program::ID,
            executable: false,
            rent_epoch: 0,
        },
    )
}
