//! Domain model for vault withdrawal-risk evaluation.

use alloy::primitives::U256;
use tracing::debug;
use vault_monitor_chain::{
    AccountId, SpotMarketAccount, VaultAccount, VaultDepositorAccount, WithdrawRequestAccount,
};

use crate::amount;

/// Whether the vault is currently being liquidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationStatus {
    NotLiquidating,
    Liquidating {
        /// Unix seconds the liquidation began
        started_at: i64,
        /// Account allowed to unwind the vault
        delegate: AccountId,
    },
}

impl LiquidationStatus {
    /// Lift the on-chain sentinel pair (zero timestamp, all-zero delegate).
    ///
    /// Both fields must be set for the vault to count as liquidating.
    pub fn from_raw(start_ts: i64, delegate: AccountId) -> Self {
        match (start_ts != 0, !delegate.is_default()) {
            (true, true) => Self::Liquidating {
                started_at: start_ts,
                delegate,
            },
            (false, false) => Self::NotLiquidating,
            (has_ts, has_delegate) => {
                debug!(
                    liquidation_start_ts = start_ts,
                    delegate = %delegate,
                    has_ts,
                    has_delegate,
                    "Inconsistent liquidation fields, treating vault as not liquidating"
                );
                Self::NotLiquidating
            }
        }
    }

    pub fn is_liquidating(&self) -> bool {
        matches!(self, Self::Liquidating { .. })
    }
}

/// Vault state relevant to withdrawal risk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    pub address: AccountId,
    /// Total claim units outstanding
    pub total_shares: U256,
    /// Pending withdrawals in settlement base units
    pub total_withdraw_requested: U256,
    /// Seconds a request must age before it is payable
    pub redeem_period: i64,
    pub liquidation: LiquidationStatus,
    pub spot_market_index: u16,
}

impl From<&VaultAccount> for Vault {
    fn from(account: &VaultAccount) -> Self {
        Self {
            address: account.pubkey,
            total_shares: account.total_shares,
            total_withdraw_requested: account.total_withdraw_requested,
            redeem_period: account.redeem_period,
            liquidation: LiquidationStatus::from_raw(
                account.liquidation_start_ts,
                account.liquidation_delegate,
            ),
            spot_market_index: account.spot_market_index,
        }
    }
}

/// A depositor's most recent withdraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WithdrawRequest {
    pub shares: U256,
    /// Unix seconds
    pub ts: i64,
}

impl WithdrawRequest {
    /// Zero shares means no request is outstanding.
    pub fn is_pending(&self) -> bool {
        !self.shares.is_zero()
    }
}

impl From<&WithdrawRequestAccount> for WithdrawRequest {
    fn from(account: &WithdrawRequestAccount) -> Self {
        Self {
            shares: account.shares,
            ts: account.ts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositorRecord {
    pub authority: AccountId,
    pub last_withdraw_request: WithdrawRequest,
}

impl From<&VaultDepositorAccount> for DepositorRecord {
    fn from(account: &VaultDepositorAccount) -> Self {
        Self {
            authority: account.authority,
            last_withdraw_request: WithdrawRequest::from(&account.last_withdraw_request),
        }
    }
}

/// Display metadata of the asset withdrawals settle in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementAssetMeta {
    pub symbol: String,
    pub decimals: u8,
}

impl SettlementAssetMeta {
    /// Scale a base-unit amount of this asset for display.
    pub fn display(&self, amount: U256) -> f64 {
        amount::to_display(amount, self.decimals)
    }
}

impl From<&SpotMarketAccount> for SettlementAssetMeta {
    fn from(market: &SpotMarketAccount) -> Self {
        Self {
            symbol: market.symbol(),
            decimals: market.decimals,
        }
    }
}
