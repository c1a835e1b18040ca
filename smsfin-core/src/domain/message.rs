//! Raw SMS message as delivered by the platform

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A text message exactly as the platform bridge hands it over
///
/// Field names follow the platform's JSON shape (`date` is the receipt
/// time in unix milliseconds, `read` whether the user has opened it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: String,
    pub address: String,
    pub body: String,
    #[serde(rename = "date")]
    pub timestamp_millis: i64,
    #[serde(rename = "read", default)]
    pub already_read: bool,
}

impl RawMessage {
    pub fn new(
        id: impl Into<String>,
        address: impl Into<String>,
        body: impl Into<String>,
        timestamp_millis: i64,
    ) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            body: body.into(),
            timestamp_millis,
            already_read: false,
        }
    }

    /// Receipt time; out-of-range values fall back to now
    pub fn received_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp_millis)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// True if the address belongs to one of the monitored sender ids
    ///
    /// An address is monitored when its uppercase form contains any of the
    /// (uppercased) filter ids, so "KCB" also catches "KCB-MPESA".
    pub fn matches_sender_filter(&self, senders: &[String]) -> bool {
        let address = self.address.to_uppercase();
        senders
            .iter()
            .any(|s| !s.is_empty() && address.contains(&s.to_uppercase()))
    }

    /// Short, stable hash of the body for diagnostics
    ///
    /// Bodies carry names, phone numbers and balances, so logs refer to a
    /// message by this fingerprint and never by its content.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.address.as_bytes());
        hasher.update(b"|");
        hasher.update(self.body.as_bytes());
        hex::encode(&hasher.finalize()[..6])
    }
}
