//! Per-cycle evaluation snapshot and its assembly from provider state.

use alloy::primitives::U256;
use tracing::debug;
use vault_monitor_chain::{
    FetchError, SpotMarketAccount, VaultAccount, VaultDepositorAccount, VaultStateProvider,
    VirtualUser, WithdrawalLimits,
};

use crate::amount;
use crate::vault::{DepositorRecord, SettlementAssetMeta, Vault};

/// Point-in-time input to the evaluator. Built fresh every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSnapshot {
    pub vault: Vault,
    /// Depositors in provider order
    pub depositors: Vec<DepositorRecord>,
    /// Vault equity in settlement base units
    pub vault_equity: U256,
    /// Maximum the vault can pay out right now, in settlement base units
    pub withdraw_capacity: U256,
    pub asset: SettlementAssetMeta,
}

/// The operative withdrawal ceiling: the least restrictive of the
/// margin-buffered and unbuffered limits.
pub fn withdraw_capacity(limits: &WithdrawalLimits) -> U256 {
    amount::max(limits.with_margin_buffer, limits.without_margin_buffer)
}

impl EvaluationSnapshot {
    /// Assemble a snapshot from raw provider state.
    pub fn assemble(
        vault: &VaultAccount,
        depositors: &[VaultDepositorAccount],
        vault_equity: U256,
        limits: &WithdrawalLimits,
        spot_market: &SpotMarketAccount,
    ) -> Result<Self, FetchError> {
        if spot_market.market_index != vault.spot_market_index {
            return Err(FetchError::malformed(
                "spot market",
                format!(
                    "vault settles in market {} but market {} was returned",
                    vault.spot_market_index, spot_market.market_index
                ),
            ));
        }

        Ok(Self {
            vault: Vault::from(vault),
            depositors: depositors.iter().map(DepositorRecord::from).collect(),
            vault_equity,
            withdraw_capacity: withdraw_capacity(limits),
            asset: SettlementAssetMeta::from(spot_market),
        })
    }

    /// Fetch everything beyond the vault record and assemble a snapshot.
    pub async fn fetch<P>(
        provider: &P,
        virtual_user: &VirtualUser,
        vault: &VaultAccount,
    ) -> Result<Self, FetchError>
    where
        P: VaultStateProvider + ?Sized,
    {
        let limits = virtual_user
            .withdrawal_limits(provider, vault.spot_market_index)
            .await?;
        let depositors = provider.fetch_depositors(vault.pubkey).await?;
        let vault_equity = provider.vault_equity_in_deposit_asset(vault).await?;
        let spot_market = provider.fetch_spot_market(vault.spot_market_index).await?;

        debug!(
            vault = %vault.pubkey,
            depositors = depositors.len(),
            equity = %vault_equity,
            limit_with_buffer = %limits.with_margin_buffer,
            limit_without_buffer = %limits.without_margin_buffer,
            "Snapshot fetched"
        );

        Self::assemble(vault, &depositors, vault_equity, &limits, &spot_market)
    }

    /// Depositors with an outstanding withdraw request.
    pub fn pending_depositors(&self) -> impl Iterator<Item = &DepositorRecord> {
        self.depositors
            .iter()
            .filter(|d| d.last_withdraw_request.is_pending())
    }
}
