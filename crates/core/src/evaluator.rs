//! Liquidation-risk evaluation.
//!
//! Pure functions over an [`EvaluationSnapshot`]:
//! - Vault-level check: do aggregate pending withdrawals exceed capacity?
//! - Per-depositor check: would honoring this request (or does the vault's
//!   current state already) make the vault liquidatable?
//!
//! See <https://github.com/drift-labs/drift-vaults/wiki#liquidations>.

use alloy::primitives::U256;
use vault_monitor_chain::AccountId;

use crate::amount;
use crate::events::{RiskEvent, UnpricedReason};
use crate::snapshot::EvaluationSnapshot;
use crate::vault::{DepositorRecord, Vault};

/// Outcome of the per-depositor predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositorVerdict {
    pub authority: AccountId,
    /// Requested amount in settlement base units; `None` if it cannot be
    /// priced (no shares outstanding, or the product overflows)
    pub withdraw_amount: Option<U256>,
    pub redeem_period_elapsed: bool,
    pub vault_cannot_cover: bool,
    pub already_in_liquidation: bool,
    pub liquidatable: bool,
}

/// Result of evaluating one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Aggregate pending withdrawals exceed capacity
    pub exceeds_capacity: bool,
    /// One verdict per depositor with a pending request, in snapshot order
    pub verdicts: Vec<DepositorVerdict>,
    /// Events to report, in emission order
    pub events: Vec<RiskEvent>,
}

impl Evaluation {
    /// Verdicts that flagged the vault liquidatable.
    pub fn liquidatable(&self) -> impl Iterator<Item = &DepositorVerdict> {
        self.verdicts.iter().filter(|v| v.liquidatable)
    }

    pub fn verdict(&self, authority: &AccountId) -> Option<&DepositorVerdict> {
        self.verdicts.iter().find(|v| &v.authority == authority)
    }
}

/// Aggregate pending withdrawals strictly exceed capacity.
#[inline]
pub fn exceeds_capacity(total_withdraw_requested: U256, withdraw_capacity: U256) -> bool {
    total_withdraw_requested > withdraw_capacity
}

/// A request made at `request_ts` has aged at least `redeem_period` by `now`.
#[inline]
pub fn redeem_period_elapsed(request_ts: i64, now: i64, redeem_period: i64) -> bool {
    now.saturating_sub(request_ts) >= redeem_period
}

/// Settlement-asset value of `shares`: `shares * equity / total_shares`.
///
/// Truncates, so it never overstates what the depositor can withdraw.
#[inline]
pub fn withdraw_amount(shares: U256, vault_equity: U256, total_shares: U256) -> Option<U256> {
    amount::mul_div(shares, vault_equity, total_shares)
}

/// Evaluate one depositor. Returns `None` when there is no pending request.
pub fn evaluate_depositor(
    depositor: &DepositorRecord,
    vault: &Vault,
    vault_equity: U256,
    withdraw_capacity: U256,
    now: i64,
) -> Option<DepositorVerdict> {
    let request = &depositor.last_withdraw_request;
    if !request.is_pending() {
        return None;
    }

    let redeem_period_elapsed = redeem_period_elapsed(request.ts, now, vault.redeem_period);
    let withdraw_amount = withdraw_amount(request.shares, vault_equity, vault.total_shares);
    let vault_cannot_cover = withdraw_amount.is_some_and(|amount| amount >= withdraw_capacity);
    let already_in_liquidation = vault.liquidation.is_liquidating();

    let liquidatable =
        already_in_liquidation || (redeem_period_elapsed && vault_cannot_cover);

    Some(DepositorVerdict {
        authority: depositor.authority,
        withdraw_amount,
        redeem_period_elapsed,
        vault_cannot_cover,
        already_in_liquidation,
        liquidatable,
    })
}

/// Evaluate a snapshot at unix time `now`.
///
/// Nothing is evaluated while no withdrawals are requested.
pub fn evaluate(snapshot: &EvaluationSnapshot, now: i64) -> Evaluation {
    let vault = &snapshot.vault;
    if vault.total_withdraw_requested.is_zero() {
        return Evaluation::default();
    }

    let asset = &snapshot.asset;
    let capacity = snapshot.withdraw_capacity;
    let mut evaluation = Evaluation {
        exceeds_capacity: exceeds_capacity(vault.total_withdraw_requested, capacity),
        ..Default::default()
    };

    if evaluation.exceeds_capacity {
        evaluation.events.push(RiskEvent::WithdrawalsExceedCapacity {
            requested: asset.display(vault.total_withdraw_requested),
            capacity: asset.display(capacity),
            symbol: asset.symbol.clone(),
        });
    }

    for depositor in snapshot.pending_depositors() {
        let Some(verdict) =
            evaluate_depositor(depositor, vault, snapshot.vault_equity, capacity, now)
        else {
            continue;
        };

        if verdict.liquidatable {
            evaluation.events.push(RiskEvent::DepositorLiquidatable {
                authority: verdict.authority,
                withdraw_amount: asset.display(verdict.withdraw_amount.unwrap_or(U256::ZERO)),
                capacity: asset.display(capacity),
                symbol: asset.symbol.clone(),
                vault_in_liquidation: verdict.already_in_liquidation,
            });
        } else if verdict.withdraw_amount.is_none() {
            let reason = if vault.total_shares.is_zero() {
                UnpricedReason::ZeroTotalShares
            } else {
                UnpricedReason::Overflow
            };
            evaluation.events.push(RiskEvent::UnpricedWithdrawRequest {
                authority: verdict.authority,
                shares: depositor.last_withdraw_request.shares,
                reason,
            });
        }

        evaluation.verdicts.push(verdict);
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{LiquidationStatus, SettlementAssetMeta, WithdrawRequest};

    const NOW: i64 = 1_700_000_000;

    fn id(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    fn depositor(byte: u8, shares: u64, age_secs: i64) -> DepositorRecord {
        DepositorRecord {
            authority: id(byte),
            last_withdraw_request: WithdrawRequest {
                shares: U256::from(shares),
                ts: NOW - age_secs,
            },
        }
    }

    /// Scenario A baseline: 100 of 1000 shares over 10_000 equity, aged 700s
    /// against a 600s redeem period, capacity 900.
    fn scenario_a() -> EvaluationSnapshot {
        EvaluationSnapshot {
            vault: Vault {
                address: id(1),
                total_shares: U256::from(1000u64),
                total_withdraw_requested: U256::from(1000u64),
                redeem_period: 600,
                liquidation: LiquidationStatus::NotLiquidating,
                spot_market_index: 0,
            },
            depositors: vec![depositor(2, 100, 700)],
            vault_equity: U256::from(10_000u64),
            withdraw_capacity: U256::from(900u64),
            asset: SettlementAssetMeta {
                symbol: "USDC".to_string(),
                decimals: 6,
            },
        }
    }

    fn liquidatable(snapshot: &EvaluationSnapshot, authority: u8) -> bool {
        evaluate(snapshot, NOW)
            .verdict(&id(authority))
            .map(|v| v.liquidatable)
            .unwrap_or(false)
    }

    #[test]
    fn test_scenario_a_liquidatable() {
        let evaluation = evaluate(&scenario_a(), NOW);
        let verdict = evaluation.verdict(&id(2)).unwrap();

        assert_eq!(verdict.withdraw_amount, Some(U256::from(1000u64)));
        assert!(verdict.redeem_period_elapsed);
        assert!(verdict.vault_cannot_cover);
        assert!(!verdict.already_in_liquidation);
        assert!(verdict.liquidatable);

        // requested 1000 > capacity 900 also trips the vault-level check
        assert!(evaluation.exceeds_capacity);
        assert_eq!(evaluation.events.len(), 2);
        assert!(matches!(
            evaluation.events[1],
            RiskEvent::DepositorLiquidatable { authority, .. } if authority == id(2)
        ));
    }

    #[test]
    fn test_scenario_b_capacity_covers_request() {
        let mut snapshot = scenario_a();
        snapshot.withdraw_capacity = U256::from(1500u64);

        let evaluation = evaluate(&snapshot, NOW);
        let verdict = evaluation.verdict(&id(2)).unwrap();
        assert!(!verdict.vault_cannot_cover);
        assert!(!verdict.liquidatable);
        assert!(!evaluation.exceeds_capacity);
        assert!(evaluation.events.is_empty());
    }

    #[test]
    fn test_scenario_c_redeem_period_not_elapsed() {
        let mut snapshot = scenario_a();
        snapshot.depositors = vec![depositor(2, 100, 500)];

        let evaluation = evaluate(&snapshot, NOW);
        let verdict = evaluation.verdict(&id(2)).unwrap();
        assert!(verdict.vault_cannot_cover);
        assert!(!verdict.redeem_period_elapsed);
        assert!(!verdict.liquidatable);
        assert_eq!(evaluation.liquidatable().count(), 0);
    }

    #[test]
    fn test_scenario_d_already_liquidating() {
        let mut snapshot = scenario_a();
        snapshot.vault.liquidation = LiquidationStatus::Liquidating {
            started_at: 12345,
            delegate: id(9),
        };
        snapshot.withdraw_capacity = U256::MAX;
        snapshot.depositors = vec![depositor(2, 1, 0)];

        let evaluation = evaluate(&snapshot, NOW);
        let verdict = evaluation.verdict(&id(2)).unwrap();
        assert!(verdict.already_in_liquidation);
        assert!(!verdict.redeem_period_elapsed);
        assert!(!verdict.vault_cannot_cover);
        assert!(verdict.liquidatable);
        assert!(matches!(
            evaluation.events[0],
            RiskEvent::DepositorLiquidatable { vault_in_liquidation: true, .. }
        ));
    }

    #[test]
    fn test_scenario_e_nothing_requested() {
        let mut snapshot = scenario_a();
        snapshot.vault.total_withdraw_requested = U256::ZERO;
        snapshot.depositors = vec![depositor(2, 100, 10_000), depositor(3, 900, 10_000)];
        snapshot.withdraw_capacity = U256::ZERO;

        let evaluation = evaluate(&snapshot, NOW);
        assert!(evaluation.events.is_empty());
        assert!(evaluation.verdicts.is_empty());
        assert!(!evaluation.exceeds_capacity);
    }

    #[test]
    fn test_zero_share_requests_are_skipped() {
        let mut snapshot = scenario_a();
        snapshot.vault.liquidation = LiquidationStatus::Liquidating {
            started_at: 1,
            delegate: id(9),
        };
        snapshot.depositors = vec![depositor(2, 0, 10_000), depositor(3, 100, 700)];

        let evaluation = evaluate(&snapshot, NOW);
        assert!(evaluation.verdict(&id(2)).is_none());
        assert!(evaluation.verdict(&id(3)).unwrap().liquidatable);
        assert!(evaluation.events.iter().all(|e| !matches!(
            e,
            RiskEvent::DepositorLiquidatable { authority, .. } if *authority == id(2)
        )));
    }

    #[test]
    fn test_liquidation_is_sticky_for_every_pending_request() {
        let mut snapshot = scenario_a();
        snapshot.vault.liquidation = LiquidationStatus::Liquidating {
            started_at: 12345,
            delegate: id(9),
        };
        snapshot.withdraw_capacity = U256::from(u64::MAX);
        snapshot.depositors = (2..12).map(|b| depositor(b, b as u64, -60)).collect();

        let evaluation = evaluate(&snapshot, NOW);
        assert_eq!(evaluation.verdicts.len(), 10);
        assert_eq!(evaluation.liquidatable().count(), 10);
    }

    #[test]
    fn test_raising_capacity_never_creates_liquidations() {
        let mut previous = true;
        for capacity in [0u64, 500, 999, 1000, 1001, 5000] {
            let mut snapshot = scenario_a();
            snapshot.withdraw_capacity = U256::from(capacity);
            let current = liquidatable(&snapshot, 2);
            assert!(previous || !current, "capacity {} flipped to liquidatable", capacity);
            previous = current;
        }
        // boundary: amount 1000 >= capacity 1000 still cannot be covered
        let mut snapshot = scenario_a();
        snapshot.withdraw_capacity = U256::from(1000u64);
        assert!(liquidatable(&snapshot, 2));
    }

    #[test]
    fn test_time_gate_is_monotonic() {
        let mut previous = false;
        for age in [-100i64, 0, 599, 600, 601, 86_400] {
            let mut snapshot = scenario_a();
            snapshot.depositors = vec![depositor(2, 100, age)];
            let current = liquidatable(&snapshot, 2);
            assert!(!previous || current, "age {} flipped back", age);
            previous = current;
        }
        assert!(redeem_period_elapsed(NOW - 600, NOW, 600));
        assert!(!redeem_period_elapsed(NOW + 10, NOW, 0));
    }

    #[test]
    fn test_zero_total_shares_is_reported_not_fatal() {
        let mut snapshot = scenario_a();
        snapshot.vault.total_shares = U256::ZERO;

        let evaluation = evaluate(&snapshot, NOW);
        let verdict = evaluation.verdict(&id(2)).unwrap();
        assert_eq!(verdict.withdraw_amount, None);
        assert!(!verdict.liquidatable);
        assert!(evaluation.events.iter().any(|e| matches!(
            e,
            RiskEvent::UnpricedWithdrawRequest { authority, reason, .. }
                if *authority == id(2) && *reason == UnpricedReason::ZeroTotalShares
        )));
    }

    #[test]
    fn test_overflowing_share_value_is_unpriced() {
        let mut snapshot = scenario_a();
        snapshot.depositors = vec![DepositorRecord {
            authority: id(2),
            last_withdraw_request: WithdrawRequest {
                shares: U256::MAX,
                ts: NOW - 700,
            },
        }];

        let evaluation = evaluate(&snapshot, NOW);
        assert_eq!(evaluation.verdict(&id(2)).unwrap().withdraw_amount, None);
        assert!(evaluation.events.iter().any(|e| matches!(
            e,
            RiskEvent::UnpricedWithdrawRequest { reason: UnpricedReason::Overflow, .. }
        )));
    }

    #[test]
    fn test_vault_level_check_is_independent() {
        // aggregate exceeds capacity, but no single request is old enough
        let mut snapshot = scenario_a();
        snapshot.depositors = vec![depositor(2, 100, 10), depositor(3, 100, 10)];

        let evaluation = evaluate(&snapshot, NOW);
        assert!(evaluation.exceeds_capacity);
        assert_eq!(evaluation.liquidatable().count(), 0);
        assert_eq!(evaluation.events.len(), 1);
        match &evaluation.events[0] {
            RiskEvent::WithdrawalsExceedCapacity {
                requested,
                capacity,
                symbol,
            } => {
                assert!((requested - 0.001).abs() < 1e-12);
                assert!((capacity - 0.0009).abs() < 1e-12);
                assert_eq!(symbol, "USDC");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_requested_equal_to_capacity_does_not_exceed() {
        assert!(!exceeds_capacity(U256::from(900u64), U256::from(900u64)));
        assert!(exceeds_capacity(U256::from(901u64), U256::from(900u64)));
    }

    #[test]
    fn test_withdraw_amount_truncates() {
        // 1 of 3 shares over 10 equity = 3.33.. -> 3
        assert_eq!(
            withdraw_amount(U256::from(1u64), U256::from(10u64), U256::from(3u64)),
            Some(U256::from(3u64))
        );
    }

    #[test]
    fn test_events_follow_snapshot_order() {
        let mut snapshot = scenario_a();
        snapshot.withdraw_capacity = U256::ZERO;
        snapshot.depositors = vec![
            depositor(5, 10, 700),
            depositor(3, 10, 700),
            depositor(4, 10, 700),
        ];

        let evaluation = evaluate(&snapshot, NOW);
        let order: Vec<_> = evaluation
            .events
            .iter()
            .filter_map(|e| match e {
                RiskEvent::DepositorLiquidatable { authority, .. } => Some(*authority),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![id(5), id(3), id(4)]);
    }
}
