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

//! [`ShellDiscovery`]: paginated shell lookup across a BPN's DTRs, and the
//! unpaginated single-shell point lookup.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dsc_core::types::{Bpn, DtrCursor, PageState, ShellDescriptor};
use dsc_core::{pagination, Error, Result};
use dsc_net::NegotiationPort;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

use crate::dtr_cache::DtrCache;
use crate::shell_store::ShellStore;

const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerDtrStatus {
  Success,
  Failed,
}

#[derive(Debug, Clone)]
pub struct PerDtrResult {
  pub connector_url: String,
  pub asset_id: String,
  pub shells_found: usize,
  pub status: PerDtrStatus,
  pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Pagination {
  pub page: u32,
  pub next: Option<String>,
  pub previous: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoverResult {
  pub shell_descriptors: Vec<ShellDescriptor>,
  pub per_dtr_results: Vec<PerDtrResult>,
  pub shells_found: usize,
  pub pagination: Option<Pagination>,
}

pub struct ShellDiscovery {
  dtr_cache: Arc<DtrCache>,
  shell_store: Arc<ShellStore>,
  negotiation: Arc<dyn NegotiationPort>,
  max_retries: u32,
  dtr_timeout: Duration,
}

impl ShellDiscovery {
  pub fn new(
    dtr_cache: Arc<DtrCache>,
    shell_store: Arc<ShellStore>,
    negotiation: Arc<dyn NegotiationPort>,
    max_retries: u32,
    dtr_timeout: Duration,
  ) -> Self {
    Self { dtr_cache, shell_store, negotiation, max_retries, dtr_timeout }
  }

  #[instrument(skip(self, query_spec), fields(bpn = %bpn))]
  pub async fn discover_shells(
    &self,
    bpn: &Bpn,
    query_spec: &Value,
    limit: Option<usize>,
    cursor: Option<&str>,
  ) -> Result<DiscoverResult> {
    let dtrs = self.dtr_cache.get_dtrs(bpn).await?;
    if dtrs.is_empty() {
      return Ok(DiscoverResult::default());
    }

    let previous_state = cursor.map(pagination::decode);
    if let Some(ref state) = previous_state {
      if !pagination::is_compatible(state, limit) {
        return Err(Error::LimitMismatch);
      }
    }
    let state = previous_state.clone().unwrap_or_else(|| PageState { limit, ..Default::default() });

    let active_dtrs: Vec<_> = dtrs
      .iter()
      .filter(|dtr| !state.dtr_states.get(&dtr.asset_id).map(|c| c.exhausted).unwrap_or(false))
      .collect();

    let requested_limit = limit.unwrap_or(DEFAULT_LIMIT);
    let per_dtr_limit = pagination::distribute_limit(requested_limit, active_dtrs.len());

    let mut new_dtr_states = state.dtr_states.clone();
    let mut shell_descriptors = Vec::new();
    let mut per_dtr_results = Vec::new();
    let mut shells_found = 0usize;

    for dtr in active_dtrs {
      if shells_found >= requested_limit {
        break;
      }

      let dtr_cursor = state.dtr_states.get(&dtr.asset_id).and_then(|c| c.cursor.clone());
      match self.fetch_one_page(bpn, dtr, per_dtr_limit, dtr_cursor.as_deref()).await {
        Ok((descriptors, next_cursor)) => {
          let found = descriptors.len();
          shells_found += found;
          for descriptor in &descriptors {
            self.shell_store.put(descriptor.clone());
          }
          shell_descriptors.extend(descriptors);
          new_dtr_states.insert(
            dtr.asset_id.clone(),
            DtrCursor { exhausted: next_cursor.is_none(), cursor: next_cursor },
          );
          per_dtr_results.push(PerDtrResult {
            connector_url: dtr.connector_url.as_str().to_string(),
            asset_id: dtr.asset_id.clone(),
            shells_found: found,
            status: PerDtrStatus::Success,
            error: None,
          });
        }
        Err(e) => {
          warn!(asset_id = %dtr.asset_id, error = %e, "dtr exhausted retries, negative-caching");
          self.dtr_cache.delete_dtr(bpn, &dtr.asset_id);
          new_dtr_states.insert(dtr.asset_id.clone(), DtrCursor { cursor: None, exhausted: true });
          per_dtr_results.push(PerDtrResult {
            connector_url: dtr.connector_url.as_str().to_string(),
            asset_id: dtr.asset_id.clone(),
            shells_found: 0,
            status: PerDtrStatus::Failed,
            error: Some(e.to_string()),
          });
        }
      }
    }

    let new_state = state.advance(new_dtr_states);
    let pagination = if limit.is_some() || cursor.is_some() {
      Some(Pagination {
        page: new_state.page_number,
        next: pagination::has_more_data(&new_state.dtr_states).then(|| pagination::encode(&new_state)),
        previous: cursor.map(|_| pagination::encode(&state)),
      })
    } else {
      None
    };

    Ok(DiscoverResult { shell_descriptors, per_dtr_results, shells_found, pagination })
  }

  /// One page from one DTR: negotiate, POST the shell-by-asset-link
  /// lookup, then fetch every returned shell's descriptor in parallel.
  /// Retries up to `max_retries`, invalidating the EDR between attempts.
  async fn fetch_one_page(
    &self,
    bpn: &Bpn,
    dtr: &dsc_core::types::Dtr,
    per_dtr_limit: usize,
    dtr_cursor: Option<&str>,
  ) -> Result<(Vec<ShellDescriptor>, Option<String>)> {
    let mut last_error = None;
    for attempt in 0..=self.max_retries {
      match self.fetch_one_page_once(bpn, dtr, per_dtr_limit, dtr_cursor).await {
        Ok(page) => return Ok(page),
        Err(e) => {
          // Mirrors `do_dsp_by_asset_id`'s own key construction so the
          // invalidation actually targets the EDR it installed.
          let filter_expression = serde_json::json!({ "assetId": dtr.asset_id });
          let key = dsc_core::EdrKey::new(
            bpn.as_str(),
            dtr.connector_url.as_str(),
            &filter_expression,
            &dtr.policies,
          );
          self.negotiation.delete_connection(&key).await;
          warn!(asset_id = %dtr.asset_id, attempt, error = %e, "shell lookup failed, retrying");
          last_error = Some(e);
        }
      }
    }
    Err(last_error.unwrap_or_else(|| Error::UpstreamHttp("retries exhausted".to_string())))
  }

  async fn fetch_one_page_once(
    &self,
    bpn: &Bpn,
    dtr: &dsc_core::types::Dtr,
    per_dtr_limit: usize,
    dtr_cursor: Option<&str>,
  ) -> Result<(Vec<ShellDescriptor>, Option<String>)> {
    let edr = self
      .negotiation
      .do_dsp_by_asset_id(bpn.as_str(), dtr.connector_url.as_str(), &dtr.asset_id, &dtr.policies)
      .await?;

    let transport = dsc_net::Transport::new(self.dtr_timeout);
    let url = format!(
      "{}/lookup/shellsByAssetLink?limit={}&cursor={}",
      edr.dataplane_url,
      per_dtr_limit,
      dtr_cursor.unwrap_or("")
    );
    let response: Value =
      transport.post_json(&url, &Value::Null, Some(&edr.access_token)).await?;

    let shell_ids: Vec<String> = response
      .get("result")
      .and_then(Value::as_array)
      .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
      .unwrap_or_default();

    let next_cursor = response
      .get("paging_metadata")
      .and_then(|m| m.get("cursor"))
      .and_then(Value::as_str)
      .map(str::to_string);

    let fetches = shell_ids.into_iter().map(|shell_id| {
      let transport = dsc_net::Transport::new(self.dtr_timeout);
      let dataplane_url = edr.dataplane_url.clone();
      let access_token = edr.access_token.clone();
      async move {
        let encoded = STANDARD.encode(&shell_id);
        let url = format!("{}/shell-descriptors/{}", dataplane_url, encoded);
        let raw: Value = transport.get_json(&url, Some(&access_token)).await?;
        Ok::<_, Error>(ShellDescriptor::from_raw(raw))
      }
    });

    let descriptors =
      futures::future::join_all(fetches).await.into_iter().filter_map(Result::ok).flatten().collect();

    Ok((descriptors, next_cursor))
  }

  /// Unpaginated point lookup: scans every cached DTR for `bpn`, first DTR
  /// to return a descriptor wins. No retry.
  #[instrument(skip(self), fields(bpn = %bpn, shell_id = %shell_id))]
  pub async fn discover_shell(&self, bpn: &Bpn, shell_id: &str) -> Result<Option<ShellDescriptor>> {
    Ok(self.discover_shell_with_dtr(bpn, shell_id).await?.map(|(descriptor, _)| descriptor))
  }

  /// As [`Self::discover_shell`], but also returns the DTR that resolved
  /// the shell, so callers like submodel discovery can reuse its
  /// connector and policies without re-scanning.
  pub async fn discover_shell_with_dtr(
    &self,
    bpn: &Bpn,
    shell_id: &str,
  ) -> Result<Option<(ShellDescriptor, dsc_core::types::Dtr)>> {
    let dtrs = self.dtr_cache.get_dtrs(bpn).await?;
    for dtr in dtrs {
      let edr = match self
        .negotiation
        .do_dsp_by_asset_id(bpn.as_str(), dtr.connector_url.as_str(), &dtr.asset_id, &dtr.policies)
        .await
      {
        Ok(edr) => edr,
        Err(_) => continue,
      };
      let transport = dsc_net::Transport::new(self.dtr_timeout);
      let encoded = STANDARD.encode(shell_id);
      let url = format!("{}/shell-descriptors/{}", edr.dataplane_url, encoded);
      if let Ok(raw) = transport.get_json::<Value>(&url, Some(&edr.access_token)).await {
        if let Some(descriptor) = ShellDescriptor::from_raw(raw) {
          self.shell_store.put(descriptor.clone());
          return Ok(Some((descriptor, dtr)));
        }
      }
    }
    Ok(None)
  }
}
