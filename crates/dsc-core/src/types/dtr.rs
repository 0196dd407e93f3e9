use super::policy::Policy;
use super::{Bpn, ConnectorUrl};
use chrono::{DateTime, Utc};
use sha3::{Digest, Sha3_256};
use std::collections::{HashMap, HashSet};

/// A Digital Twin Registry discovered from a connector's DCAT catalog.
/// Identity within a BPN is `assetId`.
#[derive(Debug, Clone)]
pub struct Dtr {
  pub asset_id: String,
  pub connector_url: ConnectorUrl,
  pub policies: Vec<Policy>,
}

impl Dtr {
  pub fn new(asset_id: impl Into<String>, connector_url: ConnectorUrl, policies: Vec<Policy>) -> Self {
    Self { asset_id: asset_id.into(), connector_url, policies }
  }

  /// Stable hash of `(bpnl, connectorUrl, assetId)`, used as the natural
  /// dedupe key of the persisted row. Not part of the logical identity,
  /// which remains `(bpn, assetId)`.
  pub fn persistence_key(&self, bpn: &Bpn) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(format!("{}-{}-{}", bpn.as_str(), self.connector_url.as_str(), self.asset_id));
    format!("{:x}", hasher.finalize())
  }
}

/// `(BPN, connectors, expiresAt)`. Empty set is a valid entry; TTL refresh
/// replaces rather than extends.
#[derive(Debug, Clone)]
pub struct ConnectorCacheEntry {
  pub bpn: Bpn,
  pub connectors: HashSet<ConnectorUrl>,
  pub expires_at: DateTime<Utc>,
}

impl ConnectorCacheEntry {
  pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
    now <= self.expires_at
  }
}

/// `(BPN, dtrs, expiresAt)`. Every DTR's connector_url is expected to
/// appear in the sibling ConnectorCacheEntry at ingestion time; this is not
/// enforced post-hoc.
#[derive(Debug, Clone)]
pub struct DtrCacheEntry {
  pub bpn: Bpn,
  pub dtrs: HashMap<String, Dtr>,
  pub expires_at: DateTime<Utc>,
}

impl DtrCacheEntry {
  pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
    now <= self.expires_at
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn persistence_key_is_deterministic() {
    let bpn = Bpn::from("BPNL1");
    let url = ConnectorUrl::parse("https://c1").unwrap();
    let dtr = Dtr::new("asset-A", url, vec![]);
    assert_eq!(dtr.persistence_key(&bpn), dtr.persistence_key(&bpn));
  }

  #[test]
  fn connector_cache_entry_freshness() {
    let entry = ConnectorCacheEntry {
      bpn: Bpn::from("BPNL1"),
      connectors: HashSet::new(),
      expires_at: Utc::now() + Duration::seconds(60),
    };
    assert!(entry.is_fresh(Utc::now()));
    assert!(!entry.is_fresh(Utc::now() + Duration::seconds(120)));
  }
}
