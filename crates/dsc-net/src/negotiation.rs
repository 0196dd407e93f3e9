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

//! [`NegotiationPort`]: the port over the dataspace SDK's contract
//! negotiation, EDR issuance, and raw catalog fetch.

use async_trait::async_trait;
use dsc_core::{Edr, EdrKey, Error, Policy, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::transport::Transport;

/// Abstracts the dataspace SDK: catalog, contract, EDR, token.
#[async_trait]
pub trait NegotiationPort: Send + Sync {
  async fn do_dsp(
    &self,
    counter_party_id: &str,
    counter_party_address: &str,
    policies: &[Policy],
    filter_expression: &Value,
  ) -> Result<Edr>;

  async fn do_dsp_by_asset_id(
    &self,
    counter_party_id: &str,
    counter_party_address: &str,
    asset_id: &str,
    policies: &[Policy],
  ) -> Result<Edr>;

  async fn delete_connection(&self, key: &EdrKey);

  async fn get_catalog(&self, request: &Value, timeout: Duration) -> Result<Value>;
}

/// HTTP-backed `NegotiationPort`. EDRs already active for a key are reused;
/// `delete_connection` evicts a key, forcing renegotiation on next use.
pub struct HttpNegotiationPort {
  transport: Transport,
  control_plane_url: String,
  edrs: Arc<RwLock<HashMap<EdrKey, Edr>>>,
}

impl HttpNegotiationPort {
  pub fn new(control_plane_url: String, timeout: Duration) -> Self {
    Self {
      transport: Transport::new(timeout),
      control_plane_url,
      edrs: Arc::new(RwLock::new(HashMap::new())),
    }
  }

  /// Snapshot of currently active EDRs, for the persistence mirror.
  pub async fn snapshot(&self) -> Vec<Edr> {
    self.edrs.read().await.values().cloned().collect()
  }

  /// Reinstalls EDRs loaded from the persistence mirror at startup.
  pub async fn restore(&self, edrs: Vec<Edr>) {
    let mut guard = self.edrs.write().await;
    for edr in edrs {
      guard.insert(edr.key.clone(), edr);
    }
  }

  async fn negotiate(
    &self,
    key: EdrKey,
    counter_party_id: &str,
    counter_party_address: &str,
    filter_expression: &Value,
  ) -> Result<Edr> {
    if let Some(existing) = self.edrs.read().await.get(&key) {
      return Ok(existing.clone());
    }

    let negotiation_request = json!({
      "counterPartyId": counter_party_id,
      "counterPartyAddress": counter_party_address,
      "policy": filter_expression,
    });

    let response: Value = self
      .transport
      .post_json(
        &format!("{}/v2/contractnegotiations", self.control_plane_url),
        &negotiation_request,
        None,
      )
      .await
      .map_err(|e| Error::NegotiationFailed(e.to_string()))?;

    let transfer_id = response
      .get("transferId")
      .or_else(|| response.get("@id"))
      .and_then(Value::as_str)
      .ok_or_else(|| Error::NegotiationFailed("response carries no transfer id".to_string()))?
      .to_string();

    let dataplane_url = response
      .get("dataplaneUrl")
      .and_then(Value::as_str)
      .ok_or_else(|| Error::NegotiationFailed("response carries no dataplane url".to_string()))?
      .to_string();

    let access_token = response
      .get("authorization")
      .or_else(|| response.get("accessToken"))
      .and_then(Value::as_str)
      .ok_or_else(|| Error::NegotiationFailed("response carries no access token".to_string()))?
      .to_string();

    let edr = Edr { transfer_id, key: key.clone(), dataplane_url, access_token };
    self.edrs.write().await.insert(key, edr.clone());
    info!(counter_party_id, "negotiated new edr");
    Ok(edr)
  }
}

#[async_trait]
impl NegotiationPort for HttpNegotiationPort {
  #[instrument(skip(self, policies, filter_expression), fields(counter_party_id))]
  async fn do_dsp(
    &self,
    counter_party_id: &str,
    counter_party_address: &str,
    policies: &[Policy],
    filter_expression: &Value,
  ) -> Result<Edr> {
    let key = EdrKey::new(counter_party_id, counter_party_address, filter_expression, policies);
    self.negotiate(key, counter_party_id, counter_party_address, filter_expression).await
  }

  #[instrument(skip(self, policies), fields(counter_party_id, asset_id))]
  async fn do_dsp_by_asset_id(
    &self,
    counter_party_id: &str,
    counter_party_address: &str,
    asset_id: &str,
    policies: &[Policy],
  ) -> Result<Edr> {
    let filter_expression = json!({ "assetId": asset_id });
    let key = EdrKey::new(counter_party_id, counter_party_address, &filter_expression, policies);
    self.negotiate(key, counter_party_id, counter_party_address, &filter_expression).await
  }

  async fn delete_connection(&self, key: &EdrKey) {
    warn!("invalidating edr");
    self.edrs.write().await.remove(key);
  }

  #[instrument(skip(self, request))]
  async fn get_catalog(&self, request: &Value, timeout: Duration) -> Result<Value> {
    let transport = Transport::new(timeout);
    transport
      .post_json(&format!("{}/v2/catalog/request", self.control_plane_url), request, None)
      .await
  }
}

impl std::fmt::Debug for HttpNegotiationPort {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HttpNegotiationPort")
      .field("control_plane_url", &self.control_plane_url)
      .field("edrs", &"[REDACTED]")
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use dsc_core::types::Policy as DscPolicy;

  fn port() -> HttpNegotiationPort {
    HttpNegotiationPort::new("https://consumer.example".to_string(), Duration::from_secs(5))
  }

  #[tokio::test]
  async fn delete_connection_on_unknown_key_is_a_no_op() {
    let port = port();
    let key = EdrKey::new("bpnl", "https://provider.example", &json!({}), &[] as &[DscPolicy]);
    port.delete_connection(&key).await;
    assert!(port.snapshot().await.is_empty());
  }

  #[tokio::test]
  async fn restore_reinstalls_snapshotted_edrs() {
    let port = port();
    let key = EdrKey::new("bpnl", "https://provider.example", &json!({}), &[] as &[DscPolicy]);
    let edr = Edr {
      transfer_id: "transfer-1".to_string(),
      key,
      dataplane_url: "https://dp".to_string(),
      access_token: "tok".to_string(),
    };
    port.restore(vec![edr.clone()]).await;
    let snapshot = port.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].transfer_id, "transfer-1");
  }

  #[test]
  fn debug_redacts_edr_map() {
    let port = port();
    let debug = format!("{:?}", port);
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("tok"));
  }
}
