//! Cycle driver for the withdrawal monitor.
//!
//! Runs "fetch snapshot -> evaluate -> report" once immediately and then on a
//! fixed interval. Cycles never overlap; a slow cycle delays the next tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use vault_monitor_chain::{AccountId, VaultStateProvider, VirtualUser};

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::evaluator::{self, Evaluation};
use crate::events::{ReportSink, RiskEvent};
use crate::snapshot::EvaluationSnapshot;

/// Driver settings.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Interval between cycle starts
    pub interval: Duration,
    /// Consecutive failed cycles tolerated before giving up
    pub max_consecutive_failures: u32,
    /// Watchdog for a single cycle
    pub cycle_timeout: Option<Duration>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            interval: config.interval(),
            max_consecutive_failures: config.max_consecutive_failures,
            cycle_timeout: config.cycle_timeout(),
        }
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No withdrawals requested; nothing beyond the vault record was fetched.
    NoPendingWithdrawals,
    Evaluated(Evaluation),
}

/// Tracks consecutive failures against the configured limit.
#[derive(Debug, Clone)]
pub struct FailurePolicy {
    max_consecutive: u32,
    consecutive: u32,
}

impl FailurePolicy {
    pub fn new(max_consecutive: u32) -> Self {
        Self {
            max_consecutive: max_consecutive.max(1),
            consecutive: 0,
        }
    }

    /// Record a cycle result. Returns an error once the limit is reached.
    pub fn record<T>(&mut self, result: Result<T, MonitorError>) -> Result<(), MonitorError> {
        match result {
            Ok(_) => {
                self.consecutive = 0;
                Ok(())
            }
            Err(e) => {
                self.consecutive += 1;
                if self.consecutive >= self.max_consecutive {
                    return Err(MonitorError::TooManyFailures {
                        failures: self.consecutive,
                        last: Box::new(e),
                    });
                }
                warn!(
                    error = %e,
                    failures = self.consecutive,
                    max = self.max_consecutive,
                    "Monitoring cycle failed, retrying at next interval"
                );
                Ok(())
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Withdrawal monitor for one vault.
pub struct Monitor<P: ?Sized, S> {
    provider: Arc<P>,
    sink: S,
    vault: AccountId,
    settings: MonitorSettings,
    /// Subscribed on first use, refreshed afterwards
    virtual_user: Option<VirtualUser>,
    first_run: bool,
    clock: fn() -> i64,
}

impl<P, S> Monitor<P, S>
where
    P: VaultStateProvider + ?Sized,
    S: ReportSink,
{
    /// Create a new monitor.
    pub fn new(provider: Arc<P>, sink: S, vault: AccountId, settings: MonitorSettings) -> Self {
        Self {
            provider,
            sink,
            vault,
            settings,
            virtual_user: None,
            first_run: true,
            clock: unix_now,
        }
    }

    /// Replace the wall clock used to age withdraw requests.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn virtual_user(&self) -> Option<&VirtualUser> {
        self.virtual_user.as_ref()
    }

    /// Run one monitoring cycle.
    #[instrument(skip(self), fields(vault = %self.vault))]
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, MonitorError> {
        let provider = &*self.provider;
        let account = provider.fetch_vault(self.vault).await?;

        if account.total_withdraw_requested.is_zero() {
            debug!("No withdrawals requested");
            if self.first_run {
                self.first_run = false;
                self.sink.report(&RiskEvent::MonitorStarted {
                    vault: self.vault,
                    requested: 0.0,
                    capacity: None,
                    symbol: None,
                });
            }
            return Ok(CycleOutcome::NoPendingWithdrawals);
        }

        let user: &VirtualUser = match &mut self.virtual_user {
            Some(user) => {
                user.fetch_accounts(provider).await?;
                user
            }
            slot @ None => slot.insert(VirtualUser::subscribe(provider, self.vault).await?),
        };

        let snapshot = EvaluationSnapshot::fetch(provider, user, &account).await?;
        let now = (self.clock)();
        let evaluation = evaluator::evaluate(&snapshot, now);

        // the vault-level warning, if any, precedes the startup summary
        let (vault_level, per_depositor) = evaluation
            .events
            .split_at(usize::from(evaluation.exceeds_capacity));
        for event in vault_level {
            self.sink.report(event);
        }

        if self.first_run {
            self.first_run = false;
            self.sink.report(&RiskEvent::MonitorStarted {
                vault: self.vault,
                requested: snapshot.asset.display(snapshot.vault.total_withdraw_requested),
                capacity: Some(snapshot.asset.display(snapshot.withdraw_capacity)),
                symbol: Some(snapshot.asset.symbol.clone()),
            });
        }

        for event in per_depositor {
            self.sink.report(event);
        }

        debug!(
            pending = evaluation.verdicts.len(),
            liquidatable = evaluation.liquidatable().count(),
            exceeds_capacity = evaluation.exceeds_capacity,
            "Monitoring cycle complete"
        );

        Ok(CycleOutcome::Evaluated(evaluation))
    }

    /// Run one cycle under the configured watchdog.
    pub async fn run_cycle_with_timeout(&mut self) -> Result<CycleOutcome, MonitorError> {
        match self.settings.cycle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run_cycle()).await {
                Ok(result) => result,
                Err(_) => Err(MonitorError::CycleTimeout(limit)),
            },
            None => self.run_cycle().await,
        }
    }

    /// Run cycles forever. Returns only when the failure policy gives up.
    pub async fn run(mut self) -> Result<(), MonitorError> {
        info!(
            vault = %self.vault,
            interval_secs = self.settings.interval.as_secs(),
            max_consecutive_failures = self.settings.max_consecutive_failures,
            "Starting withdrawal monitor loop"
        );

        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures = FailurePolicy::new(self.settings.max_consecutive_failures);

        loop {
            ticker.tick().await;

            let result = self.run_cycle_with_timeout().await;
            if let Err(e) = failures.record(result) {
                error!(error = %e, "Withdrawal monitor stopping");
                return Err(e);
            }
        }
    }
}
