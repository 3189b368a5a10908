//! Verification Ledger
//!
//! Append-only record of every disclosed commitment in a session.
//! Any record can be re-checked later against a user-supplied key and
//! value, and the whole ledger can be exported as JSON for offline audit.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::rng::SecretKey;
use crate::proof::commitment::{self, hex_upper, Disclosure, KeyError, MacDigest};

/// One disclosed commitment round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Round label, unique within a session.
    pub context: String,
    /// Disclosed secret key.
    #[serde(with = "hex_upper")]
    pub key: SecretKey,
    /// Disclosed committed value.
    pub value: u32,
    /// Digest published before the counterpart's input.
    #[serde(with = "hex_upper")]
    pub digest: MacDigest,
}

impl LedgerRecord {
    /// Secret key as uppercase hex.
    pub fn key_hex(&self) -> String {
        hex::encode_upper(self.key)
    }

    /// Digest as uppercase hex.
    pub fn digest_hex(&self) -> String {
        hex::encode_upper(self.digest)
    }
}

/// Result of checking a disclosed key/value pair against a record.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Key and value reproduce the recorded digest.
    Success,
    /// Record exists but key or value do not match.
    Mismatch,
    /// No record for the requested context or index.
    NotFound,
    /// Supplied key is not a valid 32-byte hex string.
    MalformedKey(KeyError),
}

impl VerificationOutcome {
    /// True only for [`VerificationOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "HMAC verification SUCCESSFUL"),
            Self::Mismatch => write!(f, "HMAC verification FAILED"),
            Self::NotFound => write!(f, "No record found for this context"),
            Self::MalformedKey(err) => write!(f, "Invalid key format: {}", err),
        }
    }
}

/// Ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A record with this context already exists.
    #[error("duplicate ledger context: {0}")]
    DuplicateContext(String),
}

/// Session-owned, append-only commitment ledger.
#[derive(Clone, Debug, Default)]
pub struct VerificationLedger {
    records: Vec<LedgerRecord>,
}

impl VerificationLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Contexts must be unique.
    pub fn add_record(
        &mut self,
        context: impl Into<String>,
        key: SecretKey,
        value: u32,
        digest: MacDigest,
    ) -> Result<(), LedgerError> {
        let context = context.into();
        if self.find(&context).is_some() {
            return Err(LedgerError::DuplicateContext(context));
        }

        self.records.push(LedgerRecord {
            context,
            key,
            value,
            digest,
        });
        Ok(())
    }

    /// Append a disclosed commitment under `context`.
    pub fn record_disclosure(&mut self, context: impl Into<String>, disclosure: &Disclosure) -> Result<(), LedgerError> {
        self.add_record(context, disclosure.key, disclosure.value, disclosure.digest)
    }

    /// Look up a record by context label.
    pub fn find(&self, context: &str) -> Option<&LedgerRecord> {
        self.records.iter().find(|r| r.context == context)
    }

    /// Look up a record by 1-based display index or context label.
    pub fn resolve(&self, selector: &str) -> Option<&LedgerRecord> {
        let selector = selector.trim();
        match selector.parse::<usize>() {
            Ok(index) => index.checked_sub(1).and_then(|i| self.records.get(i)),
            Err(_) => self.find(selector),
        }
    }

    /// Check a disclosed key and value against the record for `context`.
    pub fn verify(&self, context: &str, key_hex: &str, value: u32) -> VerificationOutcome {
        match self.find(context) {
            Some(record) => verify_record(record, key_hex, value),
            None => VerificationOutcome::NotFound,
        }
    }


    /// `(display_index, context)` pairs in insertion order, 1-based.
    pub fn list_records(&self) -> Vec<(usize, &str)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (i + 1, r.context.as_str()))
            .collect()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot the ledger for export.
    pub fn export(&self, session_id: Uuid) -> LedgerExport {
        LedgerExport {
            session_id,
            exported_at: Utc::now(),
            records: self.records.clone(),
        }
    }
}

fn verify_record(record: &LedgerRecord, key_hex: &str, value: u32) -> VerificationOutcome {
    match commitment::verify(key_hex, value, &record.digest_hex()) {
        Ok(true) => VerificationOutcome::Success,
        Ok(false) => VerificationOutcome::Mismatch,
        Err(err) => VerificationOutcome::MalformedKey(err),
    }
}

/// Serialized ledger for audit after the session ends.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerExport {
    /// Session the records belong to.
    pub session_id: Uuid,
    /// When the snapshot was taken.
    pub exported_at: DateTime<Utc>,
    /// Records in round order.
    pub records: Vec<LedgerRecord>,
}

impl LedgerExport {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Re-check every record against its own disclosed key and value.
    pub fn audit(&self) -> Vec<(&str, VerificationOutcome)> {
        self.records
            .iter()
            .map(|r| (r.context.as_str(), verify_record(r, &r.key_hex(), r.value)))
            .collect()
    }
}
