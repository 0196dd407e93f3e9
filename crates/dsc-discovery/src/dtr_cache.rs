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

//! [`DtrCache`]: BPN to map of asset-id to DTR, discovered from DCAT
//! catalogs harvested across a BPN's connectors.

use chrono::{Duration as ChronoDuration, Utc};
use dsc_core::types::{Bpn, Dtr, DtrCacheEntry, Policy};
use dsc_core::{Config, DtrTypeFilter};
use dsc_net::CatalogHarvester;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::connector_cache::ConnectorCache;
use crate::dirty::DirtyFlag;

pub struct DtrCache {
  entries: RwLock<HashMap<Bpn, DtrCacheEntry>>,
  connector_cache: Arc<ConnectorCache>,
  filter: DtrTypeFilter,
  ttl: ChronoDuration,
  catalog_timeout: Duration,
  dirty: DirtyFlag,
}

impl DtrCache {
  pub fn new(connector_cache: Arc<ConnectorCache>, config: &Config, dirty: DirtyFlag) -> Self {
    Self {
      entries: RwLock::new(HashMap::new()),
      connector_cache,
      filter: config.dtr_type_filter.clone(),
      ttl: ChronoDuration::seconds(config.dtr_ttl_secs as i64),
      catalog_timeout: Duration::from_secs(config.catalog_timeout_secs),
      dirty,
    }
  }

  #[instrument(skip(self), fields(bpn = %bpn))]
  pub async fn get_dtrs(&self, bpn: &Bpn) -> dsc_core::Result<Vec<Dtr>> {
    let now = Utc::now();
    if let Some(entry) = self.entries.read().expect("dtr cache lock poisoned").get(bpn) {
      if entry.is_fresh(now) && !entry.dtrs.is_empty() {
        debug!("dtr cache hit");
        return Ok(entry.dtrs.values().cloned().collect());
      }
    }

    let connectors = self.connector_cache.get_connectors(bpn).await?;
    if connectors.is_empty() {
      return Ok(Vec::new());
    }

    let filter_expression = CatalogHarvester::dtr_filter_expression(
      &self.filter.key,
      &self.filter.operator,
      &self.filter.value,
    );
    let catalogs = CatalogHarvester::harvest(
      bpn.as_str(),
      &connectors,
      &filter_expression,
      self.catalog_timeout,
    )
    .await;

    let mut discovered = HashMap::new();
    for (connector_url, catalog) in catalogs {
      for dataset in extract_datasets(&catalog) {
        if !dataset_is_dtr(dataset, &self.filter) {
          continue;
        }
        let Some(asset_id) = dataset.get("@id").and_then(Value::as_str) else {
          warn!("dtr dataset missing @id, skipping");
          continue;
        };
        let policies = extract_policies(dataset);
        discovered
          .entry(asset_id.to_string())
          .or_insert_with(|| Dtr::new(asset_id, connector_url.clone(), policies));
      }
    }

    if discovered.is_empty() {
      return Ok(Vec::new());
    }

    let entry = DtrCacheEntry { bpn: bpn.clone(), dtrs: discovered, expires_at: Utc::now() + self.ttl };
    let result = entry.dtrs.values().cloned().collect();
    self.entries.write().expect("dtr cache lock poisoned").insert(bpn.clone(), entry);
    self.dirty.mark();
    info!("installed dtr cache entry");
    Ok(result)
  }

  /// Idempotent on `(bpn, assetId)`: the first insertion wins.
  pub fn add_dtr(&self, bpn: &Bpn, asset_id: String, dtr: Dtr) {
    let mut guard = self.entries.write().expect("dtr cache lock poisoned");
    let entry = guard.entry(bpn.clone()).or_insert_with(|| DtrCacheEntry {
      bpn: bpn.clone(),
      dtrs: HashMap::new(),
      expires_at: Utc::now() + self.ttl,
    });
    entry.dtrs.entry(asset_id).or_insert(dtr);
    drop(guard);
    self.dirty.mark();
  }

  /// Removes a single DTR, used as negative caching on repeated negotiation
  /// or shell-lookup failure.
  pub fn delete_dtr(&self, bpn: &Bpn, asset_id: &str) {
    if let Some(entry) = self.entries.write().expect("dtr cache lock poisoned").get_mut(bpn) {
      entry.dtrs.remove(asset_id);
    }
    self.dirty.mark();
  }

  pub fn snapshot(&self) -> Vec<DtrCacheEntry> {
    self.entries.read().expect("dtr cache lock poisoned").values().cloned().collect()
  }

  pub fn restore(&self, entries: Vec<DtrCacheEntry>) {
    let map = entries.into_iter().map(|e| (e.bpn.clone(), e)).collect();
    *self.entries.write().expect("dtr cache lock poisoned") = map;
  }
}

/// `dcat:dataset` may be a single object or an array in JSON-LD; this
/// tolerates both.
fn extract_datasets(catalog: &Value) -> Vec<&Value> {
  match catalog.get("dcat:dataset") {
    Some(Value::Array(items)) => items.iter().collect(),
    Some(single @ Value::Object(_)) => vec![single],
    _ => Vec::new(),
  }
}

/// A dataset is a DTR iff its type matches the configured triple, accepting
/// the compact (`dct:type`) and expanded (`http://purl.org/dc/terms/type`)
/// JSON-LD shapes, each of which may itself be `{"@id": "..."}` or a bare
/// string.
fn dataset_is_dtr(dataset: &Value, filter: &DtrTypeFilter) -> bool {
  let candidates = [dataset.get("dct:type"), dataset.get(filter.key.as_str())];
  candidates.into_iter().flatten().any(|type_value| type_uri_matches(type_value, &filter.value))
}

fn type_uri_matches(type_value: &Value, expected: &str) -> bool {
  match type_value {
    Value::String(s) => s == expected,
    Value::Object(_) => type_value.get("@id").and_then(Value::as_str) == Some(expected),
    _ => false,
  }
}

/// Extracts `odrl:hasPolicy` (single object or array), stripping JSON-LD
/// metadata from each entry via [`Policy::clean`].
fn extract_policies(dataset: &Value) -> Vec<Policy> {
  match dataset.get("odrl:hasPolicy") {
    Some(Value::Array(items)) => items.iter().cloned().map(Policy::clean).collect(),
    Some(single @ Value::Object(_)) => vec![Policy::clean(single.clone())],
    _ => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn filter() -> DtrTypeFilter {
    DtrTypeFilter::default()
  }

  #[test]
  fn compact_shape_type_matches() {
    let dataset = json!({"@id": "asset-A", "dct:type": {"@id": filter().value}});
    assert!(dataset_is_dtr(&dataset, &filter()));
  }

  #[test]
  fn expanded_shape_type_matches() {
    let f = filter();
    let dataset = json!({"@id": "asset-A", f.key.clone(): {"@id": f.value.clone()}});
    assert!(dataset_is_dtr(&dataset, &f));
  }

  #[test]
  fn bare_string_type_matches() {
    let dataset = json!({"@id": "asset-A", "dct:type": filter().value});
    assert!(dataset_is_dtr(&dataset, &filter()));
  }

  #[test]
  fn mismatched_type_is_not_a_dtr() {
    let dataset = json!({"@id": "asset-A", "dct:type": {"@id": "https://example/OtherType"}});
    assert!(!dataset_is_dtr(&dataset, &filter()));
  }

  #[test]
  fn extract_datasets_tolerates_single_object_shape() {
    let catalog = json!({"dcat:dataset": {"@id": "asset-A"}});
    assert_eq!(extract_datasets(&catalog).len(), 1);
  }

  #[test]
  fn extract_policies_strips_ld_metadata() {
    let dataset = json!({"odrl:hasPolicy": {"@id": "policy-1", "@type": "Set", "use": "any"}});
    let policies = extract_policies(&dataset);
    assert_eq!(policies.len(), 1);
    assert!(!policies[0].contains_ld_metadata());
  }
}
