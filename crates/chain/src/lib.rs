//! Vault account-state layer.
//!
//! This crate provides:
//! - Raw account records (vault, depositors, spot markets, user accounts)
//! - The `VaultStateProvider` read interface and an HTTP gateway implementation
//! - The cached "virtual user" handle for the vault's own trading account

mod accounts;
mod error;
mod provider;
mod virtual_user;

pub use accounts::{
    decode_name, deserialize_u256, AccountId, SpotMarketAccount, UserAccount, VaultAccount,
    VaultDepositorAccount, WithdrawRequestAccount,
};
pub use error::FetchError;
pub use provider::{HttpStateProvider, VaultStateProvider};
pub use virtual_user::{VirtualUser, WithdrawalLimits, VAULT_SUB_ACCOUNT_ID};
