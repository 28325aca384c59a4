//! Vault state provider: the read interface the monitor consumes, plus an
//! HTTP implementation backed by a JSON state gateway.

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::accounts::{
    deserialize_u256, AccountId, SpotMarketAccount, UserAccount, VaultAccount,
    VaultDepositorAccount,
};
use crate::error::FetchError;

/// Read-only access to vault, depositor, market and risk-engine state.
#[async_trait]
pub trait VaultStateProvider: Send + Sync + Debug {
    /// Fetch the vault account.
    async fn fetch_vault(&self, vault: AccountId) -> Result<VaultAccount, FetchError>;

    /// Fetch every depositor account of a vault, in provider order.
    async fn fetch_depositors(
        &self,
        vault: AccountId,
    ) -> Result<Vec<VaultDepositorAccount>, FetchError>;

    /// Vault equity denominated in its deposit asset (base units).
    async fn vault_equity_in_deposit_asset(&self, vault: &VaultAccount)
        -> Result<U256, FetchError>;

    /// Resolve the trading account owned by `authority`.
    async fn fetch_user(
        &self,
        authority: AccountId,
        sub_account_id: u16,
    ) -> Result<UserAccount, FetchError>;

    /// Risk-engine withdrawal limit for `user` in a spot market.
    ///
    /// `margin_buffer = true` asks for the initial-margin (conservative) limit.
    async fn withdrawal_limit(
        &self,
        user: &UserAccount,
        market_index: u16,
        margin_buffer: bool,
    ) -> Result<U256, FetchError>;

    /// Fetch spot market metadata.
    async fn fetch_spot_market(&self, market_index: u16) -> Result<SpotMarketAccount, FetchError>;
}

#[derive(Debug, Deserialize)]
struct DepositorsResponse {
    results: Vec<VaultDepositorAccount>,
}

#[derive(Debug, Deserialize)]
struct EquityResponse {
    #[serde(deserialize_with = "deserialize_u256")]
    equity: U256,
}

#[derive(Debug, Deserialize)]
struct WithdrawalLimitResponse {
    #[serde(deserialize_with = "deserialize_u256")]
    limit: U256,
}

/// State provider talking to a JSON-over-HTTP state gateway.
#[derive(Debug, Clone)]
pub struct HttpStateProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStateProvider {
    /// Create a provider with a per-request timeout.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                url: base_url.clone(),
                source,
            })?;

        info!(base_url = %base_url, timeout_ms = request_timeout.as_millis() as u64, "State provider configured");

        Ok(Self { client, base_url })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl VaultStateProvider for HttpStateProvider {
    #[instrument(skip(self))]
    async fn fetch_vault(&self, vault: AccountId) -> Result<VaultAccount, FetchError> {
        let account: VaultAccount = self.get_json(&format!("/vaults/{}", vault), &[]).await?;
        if account.pubkey != vault {
            return Err(FetchError::malformed(
                "vault account",
                format!("requested {} but received {}", vault, account.pubkey),
            ));
        }
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn fetch_depositors(
        &self,
        vault: AccountId,
    ) -> Result<Vec<VaultDepositorAccount>, FetchError> {
        let response: DepositorsResponse = self
            .get_json(&format!("/vaults/{}/depositors", vault), &[])
            .await?;

        debug!(count = response.results.len(), "Fetched vault depositors");
        Ok(response.results)
    }

    #[instrument(skip(self, vault), fields(vault = %vault.pubkey))]
    async fn vault_equity_in_deposit_asset(
        &self,
        vault: &VaultAccount,
    ) -> Result<U256, FetchError> {
        let response: EquityResponse = self
            .get_json(&format!("/vaults/{}/equity", vault.pubkey), &[])
            .await?;
        Ok(response.equity)
    }

    #[instrument(skip(self))]
    async fn fetch_user(
        &self,
        authority: AccountId,
        sub_account_id: u16,
    ) -> Result<UserAccount, FetchError> {
        let user: UserAccount = self
            .get_json(
                "/users",
                &[
                    ("authority", authority.to_string()),
                    ("sub_account_id", sub_account_id.to_string()),
                ],
            )
            .await?;

        if user.authority != authority {
            return Err(FetchError::malformed(
                "user account",
                format!("expected authority {} but received {}", authority, user.authority),
            ));
        }
        Ok(user)
    }

    #[instrument(skip(self, user), fields(user = %user.pubkey))]
    async fn withdrawal_limit(
        &self,
        user: &UserAccount,
        market_index: u16,
        margin_buffer: bool,
    ) -> Result<U256, FetchError> {
        let response: WithdrawalLimitResponse = self
            .get_json(
                &format!("/users/{}/withdrawal-limit", user.pubkey),
                &[
                    ("market_index", market_index.to_string()),
                    ("margin_buffer", margin_buffer.to_string()),
                ],
            )
            .await?;
        Ok(response.limit)
    }

    #[instrument(skip(self))]
    async fn fetch_spot_market(&self, market_index: u16) -> Result<SpotMarketAccount, FetchError> {
        self.get_json(&format!("/spot-markets/{}", market_index), &[])
            .await
    }
}
