use super::policy::Policy;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// The 4-tuple that keys an EDR lookup. `queryChecksum` and `policyChecksum`
/// are pure functions of their inputs (SHA3-256 of a canonical
/// serialization), so an EDR keyed off them survives a process restart once
/// the persistence mirror reloads the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdrKey {
  pub counter_party_id: String,
  pub counter_party_address: String,
  pub query_checksum: String,
  pub policy_checksum: String,
}

impl EdrKey {
  pub fn new(
    counter_party_id: impl Into<String>,
    counter_party_address: impl Into<String>,
    filter_expression: &serde_json::Value,
    policies: &[Policy],
  ) -> Self {
    Self {
      counter_party_id: counter_party_id.into(),
      counter_party_address: counter_party_address.into(),
      query_checksum: checksum_filter_expression(filter_expression),
      policy_checksum: checksum_policies(policies),
    }
  }
}

/// SHA3-256 of a canonical serialization of the filter expression.
pub fn checksum_filter_expression(filter_expression: &serde_json::Value) -> String {
  let canonical = serde_json::to_string(filter_expression).unwrap_or_default();
  hex_sha3(canonical.as_bytes())
}

/// SHA3-256 of a canonical serialization of the policy list. Order matters
/// since the list itself is part of what's being negotiated; callers must
/// keep policy order stable across calls that should reuse the same EDR.
pub fn checksum_policies(policies: &[Policy]) -> String {
  let canonical: Vec<&serde_json::Value> = policies.iter().map(Policy::as_value).collect();
  let canonical = serde_json::to_string(&canonical).unwrap_or_default();
  hex_sha3(canonical.as_bytes())
}

fn hex_sha3(bytes: &[u8]) -> String {
  let mut hasher = Sha3_256::new();
  hasher.update(bytes);
  format!("{:x}", hasher.finalize())
}

/// `(transferId, counterPartyId, counterPartyAddress, queryChecksum,
/// policyChecksum, dataplaneURL, accessToken)`. Identity is `transfer_id`;
/// lookup is by `EdrKey`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edr {
  pub transfer_id: String,
  pub key: EdrKey,
  pub dataplane_url: String,
  pub access_token: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn checksum_is_pure_function_of_inputs() {
    let expr = json!({"key": "dct:type", "operator": "=", "value": "DTR"});
    assert_eq!(checksum_filter_expression(&expr), checksum_filter_expression(&expr));
  }

  #[test]
  fn different_inputs_yield_different_checksums() {
    let a = json!({"key": "dct:type"});
    let b = json!({"key": "other"});
    assert_ne!(checksum_filter_expression(&a), checksum_filter_expression(&b));
  }

  #[test]
  fn policy_checksum_stable_across_clones() {
    let policies = vec![Policy::clean(json!({"use": "any"}))];
    assert_eq!(checksum_policies(&policies), checksum_policies(&policies.clone()));
  }

  #[test]
  fn edr_key_equality_is_structural() {
    let expr = json!({"key": "dct:type"});
    let policies = vec![];
    let a = EdrKey::new("bpn1", "https://c1", &expr, &policies);
    let b = EdrKey::new("bpn1", "https://c1", &expr, &policies);
    assert_eq!(a, b);
  }
}
