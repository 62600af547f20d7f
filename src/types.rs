//! # Rule Record Types
//!
//! Core record definitions for the signature rule catalog.
//!
//! This module provides:
//! - The `Rule` record with its external JSON field mapping
//! - `RuleParams` input struct for rule creation
//! - Listing types returned by catalog enumeration

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A network intrusion-detection signature record.
///
/// The external field names are fixed by the persisted JSON encoding and
/// must stay stable. Stored values carrying extra unknown fields still
/// decode; the known fields below are what the catalog round-trips.
///
/// A record is addressed by its storage key, which is caller-supplied and
/// distinct from the `sid` signature identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Discriminator between seed-batch records and individually created
    /// ones. Metadata only; foreign values are not rejected.
    #[serde(rename = "docType")]
    pub doc_type: String,
    /// Action taken when the signature triggers (e.g. alert/drop).
    #[serde(rename = "ruleAction")]
    pub rule_action: String,
    pub protocol: String,
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    #[serde(rename = "sourcePort")]
    pub source_port: String,
    /// Directional operator between source and destination.
    pub direction: String,
    #[serde(rename = "destIP")]
    pub dest_ip: String,
    #[serde(rename = "destPort")]
    pub dest_port: String,
    /// Free-text signature description; may embed structured sub-fields
    /// as raw text.
    pub msg: String,
    /// Signature identifier. Distinct from the storage key.
    pub sid: String,
    pub revision: String,
    #[serde(rename = "classType")]
    pub class_type: String,
    pub reference: String,
    /// Owning identity; empty string means unassigned.
    #[serde(rename = "ruleOwner")]
    pub rule_owner: String,
}

impl Rule {
    /// `docType` stamped on individually created records.
    pub const DOC_TYPE_SINGLE: &'static str = "rule";
    /// `docType` stamped on seed-batch records.
    pub const DOC_TYPE_SEED: &'static str = "rules";

    /// Builds a record from caller-supplied fields under the given
    /// discriminator.
    pub fn from_params(doc_type: &str, params: RuleParams) -> Self {
        Rule {
            doc_type: doc_type.to_string(),
            rule_action: params.rule_action,
            protocol: params.protocol,
            source_ip: params.source_ip,
            source_port: params.source_port,
            direction: params.direction,
            dest_ip: params.dest_ip,
            dest_port: params.dest_port,
            msg: params.msg,
            sid: params.sid,
            revision: params.revision,
            class_type: params.class_type,
            reference: params.reference,
            rule_owner: params.rule_owner,
        }
    }
}

/// Caller-supplied fields for rule creation.
///
/// Everything except `docType`, which the store stamps. No syntactic
/// validation of addresses or ports happens at this layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleParams {
    pub rule_action: String,
    pub protocol: String,
    pub source_ip: String,
    pub source_port: String,
    pub direction: String,
    pub dest_ip: String,
    pub dest_port: String,
    pub msg: String,
    pub sid: String,
    pub revision: String,
    pub class_type: String,
    pub reference: String,
    pub rule_owner: String,
}

/// Record payload for one enumerated catalog entry.
///
/// Values that fail to decode as a [`Rule`] are passed through as the raw
/// stored string so foreign data still lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListedRecord {
    Decoded(Rule),
    Raw(String),
}

/// One `{Key, Record}` pair in the enumeration result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleListing {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Record")]
    pub record: ListedRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_roundtrip_matches_schema() {
        let value = json!({
            "docType": "rule",
            "ruleAction": "alert",
            "protocol": "tcp",
            "sourceIP": "$HOME_NET",
            "sourcePort": "2589",
            "direction": "->",
            "destIP": "$EXTERNAL_NET",
            "destPort": "any",
            "msg": "MALWARE-BACKDOOR probe",
            "sid": "105",
            "revision": "14",
            "classType": "misc-activity",
            "reference": "ruleset_community",
            "ruleOwner": ""
        });

        let rule: Rule = serde_json::from_value(value).unwrap();
        assert_eq!(rule.doc_type, "rule");
        assert_eq!(rule.source_ip, "$HOME_NET");
        assert_eq!(rule.sid, "105");
        assert_eq!(rule.rule_owner, "");

        let back = serde_json::to_value(&rule).unwrap();
        let reparsed: Rule = serde_json::from_value(back).unwrap();
        assert_eq!(rule, reparsed);
    }

    #[test]
    fn rule_decode_tolerates_unknown_fields() {
        let value = json!({
            "docType": "rule",
            "ruleAction": "drop",
            "protocol": "udp",
            "sourceIP": "any",
            "sourcePort": "any",
            "direction": "<>",
            "destIP": "any",
            "destPort": "53",
            "msg": "DNS anomaly",
            "sid": "2001",
            "revision": "1",
            "classType": "attempted-recon",
            "reference": "local",
            "ruleOwner": "secops",
            "threatLevel": "high"
        });

        let rule: Rule = serde_json::from_value(value).unwrap();
        assert_eq!(rule.sid, "2001");
        assert_eq!(rule.rule_owner, "secops");
    }

    #[test]
    fn from_params_stamps_doc_type() {
        let params = RuleParams {
            rule_action: "alert".to_string(),
            sid: "42".to_string(),
            ..RuleParams::default()
        };

        let rule = Rule::from_params(Rule::DOC_TYPE_SINGLE, params);
        assert_eq!(rule.doc_type, "rule");
        assert_eq!(rule.rule_action, "alert");
        assert_eq!(rule.sid, "42");
    }

    #[test]
    fn listing_serializes_key_and_record_names() {
        let listing = RuleListing {
            key: "RULE7".to_string(),
            record: ListedRecord::Raw("plain text".to_string()),
        };

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["Key"], "RULE7");
        assert_eq!(value["Record"], "plain text");
    }

    #[test]
    fn listing_serializes_decoded_record_as_object() {
        let rule = Rule::from_params(Rule::DOC_TYPE_SEED, RuleParams::default());
        let listing = RuleListing {
            key: "RULE0".to_string(),
            record: ListedRecord::Decoded(rule),
        };

        let value = serde_json::to_value(&listing).unwrap();
        assert!(value["Record"].is_object());
        assert_eq!(value["Record"]["docType"], "rules");
    }
}
