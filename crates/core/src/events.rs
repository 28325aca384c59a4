//! Risk events and the sinks that receive them.

use alloy::primitives::U256;
use parking_lot::Mutex;
use tracing::{info, warn};
use vault_monitor_chain::AccountId;

/// Severity of a reported event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
}

/// Why a pending withdraw request could not be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpricedReason {
    /// The vault has no shares outstanding
    ZeroTotalShares,
    /// `shares * equity` does not fit in 256 bits
    Overflow,
}

impl UnpricedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroTotalShares => "vault has zero total shares",
            Self::Overflow => "share value overflows",
        }
    }
}

/// Structured event emitted by a monitoring cycle.
///
/// Amounts are already scaled for display.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskEvent {
    /// Aggregate pending withdrawals exceed what the vault can pay out.
    WithdrawalsExceedCapacity {
        requested: f64,
        capacity: f64,
        symbol: String,
    },
    /// Honoring this depositor's request would (or already does) make the
    /// vault liquidatable.
    DepositorLiquidatable {
        authority: AccountId,
        withdraw_amount: f64,
        capacity: f64,
        symbol: String,
        vault_in_liquidation: bool,
    },
    /// A pending request could not be priced.
    UnpricedWithdrawRequest {
        authority: AccountId,
        shares: U256,
        reason: UnpricedReason,
    },
    /// One-time summary logged by the first cycle.
    MonitorStarted {
        vault: AccountId,
        requested: f64,
        capacity: Option<f64>,
        symbol: Option<String>,
    },
}

impl RiskEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            Self::MonitorStarted { .. } => EventLevel::Info,
            Self::WithdrawalsExceedCapacity { .. }
            | Self::DepositorLiquidatable { .. }
            | Self::UnpricedWithdrawRequest { .. } => EventLevel::Warn,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::WithdrawalsExceedCapacity { .. } => {
                "Total withdrawals requested exceed current withdraw limit, withdrawal attempts will fail"
            }
            Self::DepositorLiquidatable { .. } => "Vault is liquidatable",
            Self::UnpricedWithdrawRequest { .. } => "Cannot price withdraw request",
            Self::MonitorStarted { .. } => "Withdrawal monitor started",
        }
    }
}

/// Receiver of leveled risk events.
pub trait ReportSink: Send + Sync {
    fn report(&self, event: &RiskEvent);
}

/// Sink that writes every event to the tracing log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

/// Emit a tracing event at a level chosen at runtime.
macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            EventLevel::Warn => warn!($($arg)+),
            EventLevel::Info => info!($($arg)+),
        }
    };
}

impl ReportSink for TracingSink {
    fn report(&self, event: &RiskEvent) {
        let level = event.level();
        let message = event.message();
        match event {
            RiskEvent::WithdrawalsExceedCapacity {
                requested,
                capacity,
                symbol,
            } => {
                emit!(level, requested = *requested, capacity = *capacity, symbol = %symbol, "{}", message);
            }
            RiskEvent::DepositorLiquidatable {
                authority,
                withdraw_amount,
                capacity,
                symbol,
                vault_in_liquidation,
            } => {
                emit!(
                    level,
                    user = %authority,
                    withdraw_amount = *withdraw_amount,
                    free_collateral = *capacity,
                    symbol = %symbol,
                    vault_in_liquidation = *vault_in_liquidation,
                    "{}",
                    message
                );
            }
            RiskEvent::UnpricedWithdrawRequest {
                authority,
                shares,
                reason,
            } => {
                emit!(
                    level,
                    user = %authority,
                    shares = %shares,
                    reason = reason.as_str(),
                    "{}",
                    message
                );
            }
            RiskEvent::MonitorStarted {
                vault,
                requested,
                capacity,
                symbol,
            } => {
                emit!(
                    level,
                    vault = %vault,
                    withdrawals_requested = *requested,
                    free_collateral = ?capacity,
                    symbol = symbol.as_deref().unwrap_or("-"),
                    "{}",
                    message
                );
            }
        }
    }
}

/// Sink that buffers events in memory (embedding and tests).
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<RiskEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered event, leaving the buffer empty.
    pub fn drain(&self) -> Vec<RiskEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for CollectingSink {
    fn report(&self, event: &RiskEvent) {
        self.events.lock().push(event.clone());
    }
}

impl<S: ReportSink + ?Sized> ReportSink for std::sync::Arc<S> {
    fn report(&self, event: &RiskEvent) {
        (**self).report(event)
    }
}
