/*
 * MIT License
 * Copyright (c) 2026 Dataspace Discovery Contributors
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! [`PersistenceMirror`]: loads the connector/DTR/EDR caches from Postgres
//! at startup, and periodically flushes them back, skipping a write
//! whenever the canonical content hash is unchanged since the last save.

use dsc_core::types::{ConnectorCacheEntry, Dtr, DtrCacheEntry};
use dsc_core::{ConnectorUrl, Edr, EdrKey, Policy, Result};
use dsc_db::{ConnectorRow, ConnectorStore, DtrRow, DtrStore, EdrRow, EdrStore};
use dsc_net::HttpNegotiationPort;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::connector_cache::ConnectorCache;
use crate::dirty::DirtyFlag;
use crate::dtr_cache::DtrCache;
use crate::error::IntoPersistenceFailed;

pub struct PersistenceMirror {
  connector_cache: Arc<ConnectorCache>,
  dtr_cache: Arc<DtrCache>,
  negotiation: Arc<HttpNegotiationPort>,
  connector_store: Arc<dyn ConnectorStore>,
  dtr_store: Arc<dyn DtrStore>,
  edr_store: Arc<dyn EdrStore>,
  cache_dirty: DirtyFlag,
  last_saved_cache_hash: Mutex<Option<String>>,
  last_saved_edr_hash: Mutex<Option<String>>,
}

impl PersistenceMirror {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    connector_cache: Arc<ConnectorCache>,
    dtr_cache: Arc<DtrCache>,
    negotiation: Arc<HttpNegotiationPort>,
    connector_store: Arc<dyn ConnectorStore>,
    dtr_store: Arc<dyn DtrStore>,
    edr_store: Arc<dyn EdrStore>,
    cache_dirty: DirtyFlag,
  ) -> Self {
    Self {
      connector_cache,
      dtr_cache,
      negotiation,
      connector_store,
      dtr_store,
      edr_store,
      cache_dirty,
      last_saved_cache_hash: Mutex::new(None),
      last_saved_edr_hash: Mutex::new(None),
    }
  }

  #[instrument(skip(self))]
  pub async fn load_from_store(&self) -> Result<()> {
    let connector_rows = self.connector_store.load_all().await.into_persistence_failed()?;
    self.connector_cache.restore(connector_entries_from_rows(connector_rows));

    let dtr_rows = self.dtr_store.load_all().await.into_persistence_failed()?;
    self.dtr_cache.restore(dtr_entries_from_rows(dtr_rows));

    let edr_rows = self.edr_store.load_all().await.into_persistence_failed()?;
    self.negotiation.restore(edr_rows.into_iter().map(edr_from_row).collect()).await;

    info!("loaded persisted state");
    Ok(())
  }

  #[instrument(skip(self))]
  pub async fn save_to_store(&self) -> Result<()> {
    if self.cache_dirty.take() {
      let connectors = self.connector_cache.snapshot();
      let dtrs = self.dtr_cache.snapshot();
      let hash = hash_caches(&connectors, &dtrs);

      let unchanged =
        self.last_saved_cache_hash.lock().expect("mirror lock poisoned").as_deref() == Some(hash.as_str());
      if !unchanged {
        self.connector_store.replace_all(connector_rows_from_entries(&connectors)).await.into_persistence_failed()?;
        self.dtr_store.replace_all(dtr_rows_from_entries(&dtrs)).await.into_persistence_failed()?;
        *self.last_saved_cache_hash.lock().expect("mirror lock poisoned") = Some(hash);
        info!("flushed connector and dtr caches");
      }
    }

    // EDRs are negotiated by HttpNegotiationPort, which carries no
    // DirtyFlag of its own, so this block must run unconditionally and
    // rely solely on its own hash comparison below.
    let edrs = self.negotiation.snapshot().await;
    let edr_hash = hash_edrs(&edrs);
    let edr_unchanged =
      self.last_saved_edr_hash.lock().expect("mirror lock poisoned").as_deref() == Some(edr_hash.as_str());
    if !edr_unchanged {
      self.edr_store.replace_all(edrs.iter().map(edr_row_from).collect()).await.into_persistence_failed()?;
      *self.last_saved_edr_hash.lock().expect("mirror lock poisoned") = Some(edr_hash);
      info!("flushed edr store");
    }

    Ok(())
  }

  /// Runs `save` then `load` on every tick until `cancel` fires, then does
  /// one final `save` before returning.
  pub async fn run_sync_loop(&self, interval: Duration, mut cancel: tokio::sync::watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // first tick fires immediately; skip it
    loop {
      tokio::select! {
        _ = ticker.tick() => {
          if let Err(e) = self.save_to_store().await {
            warn!(error = %e, "sync loop save failed");
          }
          if let Err(e) = self.load_from_store().await {
            warn!(error = %e, "sync loop load failed");
          }
        }
        _ = cancel.changed() => {
          if let Err(e) = self.save_to_store().await {
            warn!(error = %e, "final flush failed");
          }
          break;
        }
      }
    }
  }
}

fn hash_caches(connectors: &[ConnectorCacheEntry], dtrs: &[DtrCacheEntry]) -> String {
  let body = json!({
    "connectors": canonical_connectors(connectors),
    "dtrs": canonical_dtrs(dtrs),
  });
  sha256_hex(serde_json::to_string(&body).unwrap_or_default().as_bytes())
}

fn hash_edrs(edrs: &[Edr]) -> String {
  let mut sorted = edrs.to_vec();
  sorted.sort_by(|a, b| a.transfer_id.cmp(&b.transfer_id));
  sha256_hex(serde_json::to_string(&sorted).unwrap_or_default().as_bytes())
}

fn sha256_hex(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  format!("{:x}", hasher.finalize())
}

fn canonical_connectors(entries: &[ConnectorCacheEntry]) -> Value {
  let mut items: Vec<Value> = entries
    .iter()
    .map(|e| {
      let mut urls: Vec<String> = e.connectors.iter().map(|c| c.as_str().to_string()).collect();
      urls.sort();
      json!({ "bpnl": e.bpn.as_str(), "connectors": urls, "expires_at": e.expires_at.to_rfc3339() })
    })
    .collect();
  items.sort_by(|a, b| a["bpnl"].as_str().cmp(&b["bpnl"].as_str()));
  Value::Array(items)
}

fn canonical_dtrs(entries: &[DtrCacheEntry]) -> Value {
  let mut items: Vec<Value> = entries
    .iter()
    .flat_map(|e| {
      e.dtrs.values().map(move |dtr| {
        json!({
          "bpnl": e.bpn.as_str(),
          "asset_id": dtr.asset_id,
          "edc_url": dtr.connector_url.as_str(),
          "policies": dtr.policies.iter().map(Policy::as_value).collect::<Vec<_>>(),
          "expires_at": e.expires_at.to_rfc3339(),
        })
      })
    })
    .collect();
  items.sort_by(|a, b| {
    (a["bpnl"].as_str(), a["asset_id"].as_str()).cmp(&(b["bpnl"].as_str(), b["asset_id"].as_str()))
  });
  Value::Array(items)
}

fn connector_rows_from_entries(entries: &[ConnectorCacheEntry]) -> Vec<ConnectorRow> {
  entries
    .iter()
    .map(|e| ConnectorRow {
      bpnl: e.bpn.as_str().to_string(),
      connectors: Value::Array(
        e.connectors.iter().map(|c| Value::String(c.as_str().to_string())).collect(),
      ),
      expires_at: e.expires_at,
    })
    .collect()
}

fn connector_entries_from_rows(rows: Vec<ConnectorRow>) -> Vec<ConnectorCacheEntry> {
  rows
    .into_iter()
    .map(|row| {
      let connectors = row
        .connectors
        .as_array()
        .map(|arr| {
          arr
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|s| match ConnectorUrl::parse(s) {
              Ok(url) => Some(url),
              Err(e) => {
                warn!(error = %e, "dropping malformed persisted connector url");
                None
              }
            })
            .collect()
        })
        .unwrap_or_default();
      ConnectorCacheEntry { bpn: row.bpnl.into(), connectors, expires_at: row.expires_at }
    })
    .collect()
}

fn dtr_rows_from_entries(entries: &[DtrCacheEntry]) -> Vec<DtrRow> {
  let mut rows = Vec::new();
  for entry in entries {
    for dtr in entry.dtrs.values() {
      rows.push(DtrRow {
        bpnl: entry.bpn.as_str().to_string(),
        edc_url: dtr.connector_url.as_str().to_string(),
        asset_id: dtr.asset_id.clone(),
        policies: Value::Array(dtr.policies.iter().map(|p| p.as_value().clone()).collect()),
        expires_at: entry.expires_at,
      });
    }
  }
  rows
}

fn dtr_entries_from_rows(rows: Vec<DtrRow>) -> Vec<DtrCacheEntry> {
  use std::collections::HashMap;
  let mut by_bpn: HashMap<String, DtrCacheEntry> = HashMap::new();
  for row in rows {
    let connector_url = match ConnectorUrl::parse(&row.edc_url) {
      Ok(url) => url,
      Err(e) => {
        warn!(error = %e, "dropping dtr row with malformed connector url");
        continue;
      }
    };
    let policies = row
      .policies
      .as_array()
      .map(|arr| arr.iter().cloned().map(Policy::clean).collect())
      .unwrap_or_default();
    let dtr = Dtr::new(row.asset_id.clone(), connector_url, policies);
    let entry = by_bpn.entry(row.bpnl.clone()).or_insert_with(|| DtrCacheEntry {
      bpn: row.bpnl.clone().into(),
      dtrs: HashMap::new(),
      expires_at: row.expires_at,
    });
    entry.expires_at = entry.expires_at.max(row.expires_at);
    entry.dtrs.insert(row.asset_id, dtr);
  }
  by_bpn.into_values().collect()
}

fn edr_row_from(edr: &Edr) -> EdrRow {
  EdrRow {
    transfer_id: edr.transfer_id.clone(),
    counter_party_id: edr.key.counter_party_id.clone(),
    counter_party_address: edr.key.counter_party_address.clone(),
    query_checksum: edr.key.query_checksum.clone(),
    policy_checksum: edr.key.policy_checksum.clone(),
    edr_data: json!({ "dataplane_url": edr.dataplane_url, "access_token": edr.access_token }),
  }
}

fn edr_from_row(row: EdrRow) -> Edr {
  Edr {
    transfer_id: row.transfer_id,
    key: EdrKey {
      counter_party_id: row.counter_party_id,
      counter_party_address: row.counter_party_address,
      query_checksum: row.query_checksum,
      policy_checksum: row.policy_checksum,
    },
    dataplane_url: row.edr_data.get("dataplane_url").and_then(Value::as_str).unwrap_or_default().to_string(),
    access_token: row.edr_data.get("access_token").and_then(Value::as_str).unwrap_or_default().to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use dsc_core::types::Bpn;
  use std::collections::{HashMap, HashSet};

  #[test]
  fn hash_is_stable_across_equivalent_entries() {
    let entry = ConnectorCacheEntry {
      bpn: Bpn::from("BPNL1"),
      connectors: HashSet::from([ConnectorUrl::parse("https://c1").unwrap()]),
      expires_at: Utc::now(),
    };
    let a = hash_caches(&[entry.clone()], &[]);
    let b = hash_caches(&[entry], &[]);
    assert_eq!(a, b);
  }

  #[test]
  fn hash_changes_when_connectors_differ() {
    let base_time = Utc::now();
    let entry_a = ConnectorCacheEntry {
      bpn: Bpn::from("BPNL1"),
      connectors: HashSet::from([ConnectorUrl::parse("https://c1").unwrap()]),
      expires_at: base_time,
    };
    let entry_b = ConnectorCacheEntry {
      bpn: Bpn::from("BPNL1"),
      connectors: HashSet::from([ConnectorUrl::parse("https://c2").unwrap()]),
      expires_at: base_time,
    };
    assert_ne!(hash_caches(&[entry_a], &[]), hash_caches(&[entry_b], &[]));
  }

  #[test]
  fn connector_row_roundtrips_through_entries() {
    let entry = ConnectorCacheEntry {
      bpn: Bpn::from("BPNL1"),
      connectors: HashSet::from([ConnectorUrl::parse("https://c1").unwrap()]),
      expires_at: Utc::now(),
    };
    let rows = connector_rows_from_entries(std::slice::from_ref(&entry));
    let restored = connector_entries_from_rows(rows);
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].bpn, entry.bpn);
    assert_eq!(restored[0].connectors, entry.connectors);
  }

  #[test]
  fn dtr_rows_group_back_into_one_entry_per_bpn() {
    let mut dtrs = HashMap::new();
    dtrs.insert(
      "asset-A".to_string(),
      Dtr::new("asset-A", ConnectorUrl::parse("https://c1").unwrap(), vec![]),
    );
    let entry = DtrCacheEntry { bpn: Bpn::from("BPNL1"), dtrs, expires_at: Utc::now() };
    let rows = dtr_rows_from_entries(std::slice::from_ref(&entry));
    let restored = dtr_entries_from_rows(rows);
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].dtrs.len(), 1);
  }

  #[test]
  fn edr_row_roundtrips() {
    let edr = Edr {
      transfer_id: "t1".to_string(),
      key: EdrKey {
        counter_party_id: "bpnl".to_string(),
        counter_party_address: "https://c1".to_string(),
        query_checksum: "q".to_string(),
        policy_checksum: "p".to_string(),
      },
      dataplane_url: "https://dp".to_string(),
      access_token: "tok".to_string(),
    };
    let row = edr_row_from(&edr);
    let restored = edr_from_row(row);
    assert_eq!(restored.transfer_id, edr.transfer_id);
    assert_eq!(restored.dataplane_url, edr.dataplane_url);
    assert_eq!(restored.access_token, edr.access_token);
  }
}
