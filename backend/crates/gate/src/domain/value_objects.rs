//! Domain Value Objects
//!
//! Immutable value types for the gate domain.

use crate::error::{GateError, GateResult};
use platform::client::UNKNOWN_CLIENT;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Chat account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Create a user id; surrounding whitespace is dropped, blank ids are rejected
    pub fn new(id: impl Into<String>) -> GateResult<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(GateError::InvalidUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Network address used as a throttling key
///
/// A blank address collapses to the `"unknown"` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpIdentity(String);

impl IpIdentity {
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        let trimmed = address.trim();
        if trimmed.is_empty() {
            Self::unknown()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_CLIENT.to_string())
    }

    /// Unattributable addresses are never throttled
    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_CLIENT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IpIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which daily counter (and limit) applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaKind {
    User,
    Ip,
}

impl QuotaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::User => "user",
            QuotaKind::Ip => "ip",
        }
    }
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Throttling key: a user or an address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    User(UserId),
    Ip(IpIdentity),
}

impl Identity {
    pub fn kind(&self) -> QuotaKind {
        match self {
            Identity::User(_) => QuotaKind::User,
            Identity::Ip(_) => QuotaKind::Ip,
        }
    }

    /// Storage key within the kind's counter
    pub fn key(&self) -> &str {
        match self {
            Identity::User(user) => user.as_str(),
            Identity::Ip(ip) => ip.as_str(),
        }
    }
}

impl From<UserId> for Identity {
    fn from(user: UserId) -> Self {
        Identity::User(user)
    }
}

impl From<IpIdentity> for Identity {
    fn from(ip: IpIdentity) -> Self {
        Identity::Ip(ip)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.key())
    }
}

/// Checks left today
///
/// `Limited` is signed: a count pushed past the limit (a race,
/// a hand-edited ledger) shows up as a negative number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Unlimited,
    Limited(i64),
}

impl Remaining {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Remaining::Limited(n) if *n <= 0)
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Unlimited => f.write_str("unlimited"),
            Remaining::Limited(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for Remaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Remaining::Unlimited => serializer.serialize_str("unlimited"),
            Remaining::Limited(n) => serializer.serialize_i64(*n),
        }
    }
}

/// Bank account number: 9 to 14 ASCII digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub const MIN_DIGITS: usize = 9;
    pub const MAX_DIGITS: usize = 14;

    pub fn new(value: impl Into<String>) -> GateResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let valid_len = (Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&trimmed.len());
        if !valid_len || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GateError::InvalidAccountNumber);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_trims_and_rejects_blank() {
        assert_eq!(UserId::new(" 42 ").unwrap().as_str(), "42");
        assert!(matches!(UserId::new("   "), Err(GateError::InvalidUserId)));
    }

    #[test]
    fn test_ip_identity_unknown() {
        assert!(IpIdentity::new("").is_unknown());
        assert!(IpIdentity::new("unknown").is_unknown());
        assert!(!IpIdentity::new("10.0.0.1").is_unknown());
    }

    #[test]
    fn test_identity_kind_and_key() {
        let user = Identity::from(UserId::new("7").unwrap());
        assert_eq!(user.kind(), QuotaKind::User);
        assert_eq!(user.key(), "7");
        assert_eq!(user.to_string(), "user:7");

        let ip = Identity::from(IpIdentity::new("10.0.0.1"));
        assert_eq!(ip.kind(), QuotaKind::Ip);
        assert_eq!(ip.to_string(), "ip:10.0.0.1");
    }

    #[test]
    fn test_remaining_display_and_json() {
        assert_eq!(Remaining::Unlimited.to_string(), "unlimited");
        assert_eq!(Remaining::Limited(-2).to_string(), "-2");
        assert_eq!(
            serde_json::to_string(&Remaining::Unlimited).unwrap(),
            r#""unlimited""#
        );
        assert_eq!(serde_json::to_string(&Remaining::Limited(3)).unwrap(), "3");
        assert!(Remaining::Limited(0).is_exhausted());
        assert!(!Remaining::Unlimited.is_exhausted());
    }

    #[test]
    fn test_account_number_bounds() {
        assert!(AccountNumber::new("123456789").is_ok());
        assert!(AccountNumber::new("12345678901234").is_ok());
        assert!(AccountNumber::new(" 0123456789 ").is_ok());
        assert!(AccountNumber::new("12345678").is_err());
        assert!(AccountNumber::new("123456789012345").is_err());
        assert!(AccountNumber::new("12345a789").is_err());
        assert!(AccountNumber::new("１２３４５６７８９").is_err());
    }
}
