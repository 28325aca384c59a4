//! Vault withdrawal-risk monitor core.
//!
//! This crate provides:
//! - Fixed-point amount arithmetic over U256 base units
//! - The vault/depositor domain model with explicit liquidation status
//! - Snapshot assembly from the state provider
//! - The liquidation-risk evaluator (pure, per-cycle)
//! - Risk events and reporting sinks
//! - The fixed-interval cycle driver with a failure policy

pub mod amount;
pub mod config;
mod error;
pub mod evaluator;
mod events;
mod monitor;
mod snapshot;
mod vault;

pub use config::{LogFormat, MonitorConfig};
pub use error::MonitorError;
pub use evaluator::{evaluate, DepositorVerdict, Evaluation};
pub use events::{
    CollectingSink, EventLevel, ReportSink, RiskEvent, TracingSink, UnpricedReason,
};
pub use monitor::{unix_now, CycleOutcome, FailurePolicy, Monitor, MonitorSettings};
pub use snapshot::{withdraw_capacity, EvaluationSnapshot};
pub use vault::{DepositorRecord, LiquidationStatus, SettlementAssetMeta, Vault, WithdrawRequest};
