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

//! [`ConnectorCache`]: BPN to set of connector URLs, TTL'd, with discovery
//! fallback.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use dsc_core::types::{Bpn, ConnectorCacheEntry, ConnectorUrl};
use dsc_core::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::dirty::DirtyFlag;

/// `findConnectorsByBPN`: the discovery port consumed on cache miss.
#[async_trait]
pub trait ConnectorDiscoveryPort: Send + Sync {
  async fn find_connectors_by_bpn(&self, bpn: &Bpn) -> Result<Vec<ConnectorUrl>>;
}

pub struct ConnectorCache {
  entries: RwLock<HashMap<Bpn, ConnectorCacheEntry>>,
  discovery: std::sync::Arc<dyn ConnectorDiscoveryPort>,
  ttl: ChronoDuration,
  dirty: DirtyFlag,
}

impl ConnectorCache {
  pub fn new(
    discovery: std::sync::Arc<dyn ConnectorDiscoveryPort>,
    ttl_secs: i64,
    dirty: DirtyFlag,
  ) -> Self {
    Self {
      entries: RwLock::new(HashMap::new()),
      discovery,
      ttl: ChronoDuration::seconds(ttl_secs),
      dirty,
    }
  }

  /// Step 1: shared-lock check. Step 2: uncached discovery call, no lock
  /// held. Step 3: exclusive-lock install on a non-empty result. A
  /// non-empty result never caches a poison entry; the next call retries.
  #[instrument(skip(self), fields(bpn = %bpn))]
  pub async fn get_connectors(&self, bpn: &Bpn) -> Result<Vec<ConnectorUrl>> {
    let now = Utc::now();
    if let Some(entry) = self.entries.read().expect("connector cache lock poisoned").get(bpn) {
      if entry.is_fresh(now) && !entry.connectors.is_empty() {
        debug!("connector cache hit");
        return Ok(entry.connectors.iter().cloned().collect());
      }
    }

    debug!("connector cache miss, invoking discovery port");
    let discovered = self.discovery.find_connectors_by_bpn(bpn).await?;
    if discovered.is_empty() {
      return Ok(Vec::new());
    }

    self.add_connectors(bpn.clone(), discovered.clone());
    Ok(discovered)
  }

  /// Installs or refreshes one BPN's entry. Refresh REPLACES, never
  /// extends, the existing TTL window.
  pub fn add_connectors(&self, bpn: Bpn, connectors: Vec<ConnectorUrl>) {
    let entry = ConnectorCacheEntry {
      bpn: bpn.clone(),
      connectors: connectors.into_iter().collect::<HashSet<_>>(),
      expires_at: Utc::now() + self.ttl,
    };
    self.entries.write().expect("connector cache lock poisoned").insert(bpn, entry);
    self.dirty.mark();
    info!("installed connector cache entry");
  }

  pub fn purge_bpn(&self, bpn: &Bpn) {
    self.entries.write().expect("connector cache lock poisoned").remove(bpn);
    self.dirty.mark();
  }

  pub fn purge_all(&self) {
    self.entries.write().expect("connector cache lock poisoned").clear();
    self.dirty.mark();
  }

  /// Defensive-copy snapshot of all entries, for the persistence mirror.
  pub fn snapshot(&self) -> Vec<ConnectorCacheEntry> {
    self.entries.read().expect("connector cache lock poisoned").values().cloned().collect()
  }

  /// Replaces the entire in-memory map, used by `loadFromStore`.
  pub fn restore(&self, entries: Vec<ConnectorCacheEntry>) {
    let map = entries.into_iter().map(|e| (e.bpn.clone(), e)).collect();
    *self.entries.write().expect("connector cache lock poisoned") = map;
  }
}

/// A no-op port returning `NotFound`, useful as a placeholder before a real
/// discovery service is wired in.
pub struct UnconfiguredDiscoveryPort;

#[async_trait]
impl ConnectorDiscoveryPort for UnconfiguredDiscoveryPort {
  async fn find_connectors_by_bpn(&self, _bpn: &Bpn) -> Result<Vec<ConnectorUrl>> {
    Err(Error::NotFound)
  }
}
