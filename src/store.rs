//! # Rule Catalog Store
//!
//! Record lifecycle operations for the signature rule catalog: seed,
//! create, fetch, enumerate and ownership transfer. Each operation is a
//! single atomic request/response against the supplied ledger; no state
//! persists in this layer between calls.

use log::{debug, info};
use thiserror::Error;

use crate::ledger::{KeyValueLedger, LedgerError, ScanCursor};
use crate::types::{ListedRecord, Rule, RuleListing, RuleParams};

/// Prefix for seed-batch record keys.
const SEED_KEY_PREFIX: &str = "RULE";

/// Half-open key window enumerated by `query_all_rules`.
///
/// Keys lexicographically at or beyond `RULE9999` fall outside the window
/// and are never listed, even though point reads on them still work. This
/// cap on four-digit-suffixed keys is documented behavior of the key
/// design, not something the enumeration logic compensates for.
const SCAN_START_KEY: &str = "RULE0";
const SCAN_END_KEY: &str = "RULE9999";

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key absent or mapped to an empty value.
    #[error("{0} does not exist")]
    NotFound(String),

    /// Value present but not decodable as a rule record.
    #[error("record at {key} is not a decodable rule: {reason}")]
    Decode { key: String, reason: String },

    /// Record failed to encode for write-back.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// Underlying ledger failure, propagated unmodified.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Baseline catalog written by `init_ledger`, keyed `RULE0..`.
///
/// Two community backdoor signatures; the second ships with an owner
/// already assigned, the first is unowned.
fn seed_rules() -> Vec<RuleParams> {
    vec![
        RuleParams {
            rule_action: "alert".to_string(),
            protocol: "tcp".to_string(),
            source_ip: "$HOME_NET".to_string(),
            source_port: "2589".to_string(),
            direction: "->".to_string(),
            dest_ip: "$EXTERNAL_NET".to_string(),
            dest_port: "any".to_string(),
            msg: "MALWARE-BACKDOOR - Dagger_1.4.0\"; flow:to_client,established; \
                  content:\"2|00 00 00 06 00 00 00|Drives|24 00|\",depth 16"
                .to_string(),
            sid: "105".to_string(),
            revision: "14".to_string(),
            class_type: "misc-activity".to_string(),
            reference: "ruleset_community".to_string(),
            rule_owner: String::new(),
        },
        RuleParams {
            rule_action: "alert".to_string(),
            protocol: "tcp".to_string(),
            source_ip: "$EXTERNAL_NET".to_string(),
            source_port: "any".to_string(),
            direction: "->".to_string(),
            dest_ip: "$HOME_NET".to_string(),
            dest_port: "7597".to_string(),
            msg: "MALWARE-BACKDOOR QAZ Worm Client Login access\"; \
                  flow:to_server,established; content:\"qazwsx.hsq\""
                .to_string(),
            sid: "108".to_string(),
            revision: "11".to_string(),
            class_type: "misc-activity".to_string(),
            reference: "ruleset_community".to_string(),
            rule_owner: "mcafee,98775".to_string(),
        },
    ]
}

/// Catalog store bound to a ledger capability.
///
/// The ledger handle is supplied explicitly at construction; there is no
/// ambient transaction context. Isolation between concurrent operations
/// comes entirely from the ledger's transaction discipline.
pub struct RuleStore<L: KeyValueLedger> {
    ledger: L,
}

impl<L: KeyValueLedger> RuleStore<L> {
    /// Binds a store to the given ledger handle.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Returns the underlying ledger handle.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Seeds the baseline catalog at keys `RULE0..RULE{n-1}`, each
    /// stamped with the seed-batch discriminator.
    ///
    /// Re-invocation overwrites the same keys with the same content; no
    /// pre-existence check is made. Write failures propagate, not retried.
    pub fn init_ledger(&self) -> Result<(), StoreError> {
        let seeds = seed_rules();
        let count = seeds.len();

        for (index, params) in seeds.into_iter().enumerate() {
            let key = format!("{}{}", SEED_KEY_PREFIX, index);
            let rule = Rule::from_params(Rule::DOC_TYPE_SEED, params);
            self.put_rule(&key, &rule)?;
        }

        info!("Seeded {} baseline rules", count);
        Ok(())
    }

    /// Stores a new rule at `key`, unconditionally overwriting any
    /// existing value (last-write-wins).
    ///
    /// Callers supply a non-empty key; nothing at this layer validates
    /// address or port syntax.
    pub fn create_rule(&self, key: &str, params: RuleParams) -> Result<(), StoreError> {
        let rule = Rule::from_params(Rule::DOC_TYPE_SINGLE, params);
        self.put_rule(key, &rule)?;

        debug!("Stored rule at {}", key);
        Ok(())
    }

    /// Fetches the raw stored value at `key` as an opaque string.
    ///
    /// Fails with `NotFound` when the key is absent or holds an empty
    /// value.
    pub fn query_rule(&self, key: &str) -> Result<String, StoreError> {
        let bytes = self.fetch_raw(key)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Enumerates every record in the catalog key window, in key order,
    /// and returns the JSON-encoded array of `{Key, Record}` pairs.
    ///
    /// Values that fail to decode are listed as the raw stored string;
    /// empty values are skipped entirely. The scan cursor is closed on
    /// every exit path, including early enumeration errors.
    pub fn query_all_rules(&self) -> Result<String, StoreError> {
        let mut cursor = self.ledger.range_scan(SCAN_START_KEY, SCAN_END_KEY)?;
        let collected = Self::collect_listings(cursor.as_mut());
        let closed = cursor.close();

        let listings = collected?;
        closed?;

        debug!("Enumerated {} catalog entries", listings.len());
        serde_json::to_string(&listings).map_err(|e| StoreError::Encode(e.to_string()))
    }

    /// Replaces the ownership field of the record at `key`.
    ///
    /// Read-modify-write: the record is decoded, only `ruleOwner` is
    /// replaced, and the re-encoded record is written back. Nothing is
    /// written if the read or decode fails.
    pub fn change_owner(&self, key: &str, new_owner: &str) -> Result<(), StoreError> {
        let bytes = self.fetch_raw(key)?;
        let mut rule: Rule =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        rule.rule_owner = new_owner.to_string();
        self.put_rule(key, &rule)?;

        info!("Transferred ownership of {} to {}", key, new_owner);
        Ok(())
    }

    /// Drains the cursor, decoding each non-empty value.
    fn collect_listings(cursor: &mut dyn ScanCursor) -> Result<Vec<RuleListing>, StoreError> {
        let mut listings = Vec::new();

        while let Some((key, value)) = cursor.next()? {
            if value.is_empty() {
                continue;
            }
            let record = match serde_json::from_slice::<Rule>(&value) {
                Ok(rule) => ListedRecord::Decoded(rule),
                Err(err) => {
                    debug!("Listing {} undecoded: {}", key, err);
                    ListedRecord::Raw(String::from_utf8_lossy(&value).into_owned())
                }
            };
            listings.push(RuleListing { key, record });
        }

        Ok(listings)
    }

    fn fetch_raw(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        match self.ledger.get(key)? {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(StoreError::NotFound(key.to_string())),
        }
    }

    fn put_rule(&self, key: &str, rule: &Rule) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(rule).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.ledger.put(key, &bytes)?;
        Ok(())
    }
}
