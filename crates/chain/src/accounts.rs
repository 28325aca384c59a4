//! Raw account records as served by the vault state gateway.
//!
//! These mirror the on-chain layout closely (sentinel zero values included);
//! the core crate lifts them into its domain model.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-byte account identity (vault, depositor authority, delegate, user account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct AccountId(pub B256);

impl AccountId {
    /// The all-zero identity, used on-chain as "unset".
    pub const DEFAULT: Self = Self(B256::ZERO);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(B256::new(bytes))
    }

    /// Whether this is the all-zero "unset" identity.
    pub fn is_default(&self) -> bool {
        self.0 == B256::ZERO
    }
}

impl FromStr for AccountId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s.trim())
            .map(Self)
            .map_err(|e| format!("invalid account id '{}': {}", s, e))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Vault account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VaultAccount {
    /// Vault address
    pub pubkey: AccountId,

    /// Total claim units outstanding
    #[serde(deserialize_with = "deserialize_u256")]
    pub total_shares: U256,

    /// Sum of pending withdrawals (deposit-asset base units)
    #[serde(deserialize_with = "deserialize_u256")]
    pub total_withdraw_requested: U256,

    /// Minimum age (seconds) before a withdraw request is payable
    pub redeem_period: i64,

    /// 0 unless the vault is being liquidated
    #[serde(default)]
    pub liquidation_start_ts: i64,

    /// All-zero unless a liquidation delegate is assigned
    #[serde(default)]
    pub liquidation_delegate: AccountId,

    /// Settlement (deposit) spot market
    pub spot_market_index: u16,
}

/// Pending withdraw request embedded in a depositor account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct WithdrawRequestAccount {
    #[serde(deserialize_with = "deserialize_u256")]
    pub shares: U256,

    /// Value of the request at the time it was made (deposit-asset units)
    #[serde(default, deserialize_with = "deserialize_u256")]
    pub value: U256,

    /// Request time (unix seconds)
    pub ts: i64,
}

/// One depositor's position in a vault.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VaultDepositorAccount {
    /// Depositor account address
    pub pubkey: AccountId,

    /// Owner of the depositor account
    pub authority: AccountId,

    /// Shares currently held
    #[serde(default, deserialize_with = "deserialize_u256")]
    pub vault_shares: U256,

    #[serde(default)]
    pub last_withdraw_request: WithdrawRequestAccount,
}

/// Spot market metadata needed for display scaling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpotMarketAccount {
    pub market_index: u16,

    /// Raw market name (may be right-padded to a fixed width)
    pub name: String,

    /// Token decimals
    pub decimals: u8,
}

impl SpotMarketAccount {
    /// Market name with fixed-width padding removed.
    pub fn symbol(&self) -> String {
        decode_name(&self.name)
    }
}

/// Trading account owned by the vault ("virtual user").
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserAccount {
    /// User account address
    pub pubkey: AccountId,

    /// Authority (the vault)
    pub authority: AccountId,

    #[serde(default)]
    pub sub_account_id: u16,

    /// Slot the state was read at
    #[serde(default)]
    pub slot: u64,
}

/// Strip fixed-width padding (spaces and NULs) from an on-chain name.
pub fn decode_name(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_string()
}

/// Deserialize a U256 from a decimal string, 0x-hex string, or JSON integer.
pub fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => U256::from_str(s.trim()).map_err(serde::de::Error::custom),
        StringOrNumber::Number(n) => Ok(U256::from(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAULT: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    #[test]
    fn test_deserialize_vault() {
        let json = format!(
            r#"{{
                "pubkey": "{VAULT}",
                "total_shares": "1000000000000000000000000",
                "total_withdraw_requested": 2500000,
                "redeem_period": 604800,
                "spot_market_index": 0
            }}"#
        );

        let vault: VaultAccount = serde_json::from_str(&json).unwrap();
        assert_eq!(vault.total_shares, U256::from(10u64).pow(U256::from(24u64)));
        assert_eq!(vault.total_withdraw_requested, U256::from(2_500_000u64));
        assert_eq!(vault.redeem_period, 604_800);
        assert_eq!(vault.liquidation_start_ts, 0);
        assert!(vault.liquidation_delegate.is_default());
    }

    #[test]
    fn test_deserialize_depositor() {
        let json = format!(
            r#"{{
                "pubkey": "0x2222222222222222222222222222222222222222222222222222222222222222",
                "authority": "{VAULT}",
                "vault_shares": "500",
                "last_withdraw_request": {{ "shares": "100", "value": "1000", "ts": 1700000000 }}
            }}"#
        );

        let depositor: VaultDepositorAccount = serde_json::from_str(&json).unwrap();
        assert_eq!(depositor.last_withdraw_request.shares, U256::from(100u64));
        assert_eq!(depositor.last_withdraw_request.ts, 1_700_000_000);
        assert_eq!(depositor.authority.to_string(), VAULT);
    }

    #[test]
    fn test_missing_withdraw_request_defaults_to_empty() {
        let json = r#"{
            "pubkey": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "authority": "0x3333333333333333333333333333333333333333333333333333333333333333"
        }"#;

        let depositor: VaultDepositorAccount = serde_json::from_str(json).unwrap();
        assert!(depositor.last_withdraw_request.shares.is_zero());
    }

    #[test]
    fn test_rejects_bad_amount() {
        let json = r#"{ "shares": "12abc", "ts": 0 }"#;
        assert!(serde_json::from_str::<WithdrawRequestAccount>(json).is_err());
    }

    #[test]
    fn test_account_id_parse() {
        assert!("0x12".parse::<AccountId>().is_err());
        let id: AccountId = VAULT.parse().unwrap();
        assert!(!id.is_default());
        assert!(AccountId::DEFAULT.is_default());
    }

    #[test]
    fn test_decode_name() {
        assert_eq!(decode_name("USDC                            "), "USDC");
        assert_eq!(decode_name("SOL\0\0\0"), "SOL");
        assert_eq!(decode_name("jitoSOL"), "jitoSOL");
    }
}
