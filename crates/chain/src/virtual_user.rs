//! Cached handle to the vault's own trading account.
//!
//! The vault trades through a regular user account whose authority is the
//! vault. The handle is subscribed once and refreshed in place afterwards.

use alloy::primitives::U256;
use tracing::{debug, info};

use crate::accounts::{AccountId, UserAccount};
use crate::error::FetchError;
use crate::provider::VaultStateProvider;

/// Vaults only trade from sub-account 0.
pub const VAULT_SUB_ACCOUNT_ID: u16 = 0;

/// Both withdrawal-limit estimates for one spot market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalLimits {
    /// Initial-margin limit (conservative)
    pub with_margin_buffer: U256,
    /// Limit without the margin buffer (permissive)
    pub without_margin_buffer: U256,
}

/// Subscribed virtual user.
#[derive(Debug, Clone)]
pub struct VirtualUser {
    authority: AccountId,
    account: UserAccount,
    refreshes: u64,
}

impl VirtualUser {
    /// Resolve and load the vault's trading account.
    pub async fn subscribe<P>(provider: &P, vault: AccountId) -> Result<Self, FetchError>
    where
        P: VaultStateProvider + ?Sized,
    {
        let account = provider.fetch_user(vault, VAULT_SUB_ACCOUNT_ID).await?;
        info!(
            vault = %vault,
            user = %account.pubkey,
            slot = account.slot,
            "Subscribed to vault user account"
        );

        Ok(Self {
            authority: vault,
            account,
            refreshes: 0,
        })
    }

    /// Re-read the cached account.
    pub async fn fetch_accounts<P>(&mut self, provider: &P) -> Result<(), FetchError>
    where
        P: VaultStateProvider + ?Sized,
    {
        let account = provider
            .fetch_user(self.authority, self.account.sub_account_id)
            .await?;

        if account.pubkey != self.account.pubkey {
            return Err(FetchError::malformed(
                "user account",
                format!(
                    "vault user changed from {} to {}",
                    self.account.pubkey, account.pubkey
                ),
            ));
        }

        debug!(user = %account.pubkey, slot = account.slot, "Refreshed vault user account");
        self.account = account;
        self.refreshes += 1;
        Ok(())
    }

    /// Current account state.
    pub fn account(&self) -> &UserAccount {
        &self.account
    }

    /// Number of in-place refreshes since subscribing.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Fetch both withdrawal-limit estimates for a spot market.
    pub async fn withdrawal_limits<P>(
        &self,
        provider: &P,
        market_index: u16,
    ) -> Result<WithdrawalLimits, FetchError>
    where
        P: VaultStateProvider + ?Sized,
    {
        let (with_margin_buffer, without_margin_buffer) = tokio::try_join!(
            provider.withdrawal_limit(&self.account, market_index, true),
            provider.withdrawal_limit(&self.account, market_index, false),
        )?;

        Ok(WithdrawalLimits {
            with_margin_buffer,
            without_margin_buffer,
        })
    }
}
