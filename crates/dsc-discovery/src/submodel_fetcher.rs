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

//! [`SubmodelFetcher`]: resolves a shell's submodels, negotiating one EDR
//! per unique asset and fetching each submodel's payload.

use dsc_core::types::{Dtr, Policy, SubmodelDescriptor, SubmodelStatus};
use dsc_core::{Error, Result};
use dsc_net::NegotiationPort;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::fanout::run_bounded;
use crate::shell_discovery::ShellDiscovery;

#[derive(Debug, Clone)]
pub struct SubmodelEntry {
  pub submodel_id: String,
  pub status: SubmodelStatus,
}

#[derive(Debug, Clone, Default)]
pub struct SubmodelsResult {
  pub submodel_descriptors: HashMap<String, SubmodelEntry>,
  pub submodels: HashMap<String, Value>,
  pub submodels_found: usize,
  pub dtr: Option<Dtr>,
}

pub struct SubmodelFetcher {
  shell_discovery: Arc<ShellDiscovery>,
  negotiation: Arc<dyn NegotiationPort>,
  negotiation_cap: usize,
  fetch_cap: usize,
  timeout: Duration,
}

impl SubmodelFetcher {
  pub fn new(
    shell_discovery: Arc<ShellDiscovery>,
    negotiation: Arc<dyn NegotiationPort>,
    negotiation_cap: usize,
    fetch_cap: usize,
    timeout: Duration,
  ) -> Self {
    Self { shell_discovery, negotiation, negotiation_cap, fetch_cap, timeout }
  }

  #[instrument(skip(self, governance), fields(bpn = %bpn.as_str(), shell_id = %shell_id))]
  pub async fn discover_submodels(
    &self,
    bpn: &dsc_core::types::Bpn,
    shell_id: &str,
    governance: Option<&HashMap<String, Vec<Policy>>>,
  ) -> Result<SubmodelsResult> {
    let Some((shell, dtr)) = self.shell_discovery.discover_shell_with_dtr(bpn, shell_id).await?
    else {
      return Err(Error::NotFound);
    };

    let mut descriptors = HashMap::new();
    let mut pending = Vec::new();

    for raw in shell.submodel_entries() {
      let Some(submodel) = SubmodelDescriptor::from_raw(raw) else { continue };
      let status = initial_status(&submodel, governance);
      descriptors.insert(
        submodel.submodel_id.clone(),
        SubmodelEntry { submodel_id: submodel.submodel_id.clone(), status },
      );
      if status == SubmodelStatus::Pending {
        pending.push(submodel);
      }
    }

    // One negotiation per unique (connectorUrl, assetId): every submodel
    // sharing an asset reuses its EDR, negotiated with the governance
    // policies of whichever pending submodel is first grouped under that
    // key.
    let mut unique_assets: HashMap<(String, String), Vec<String>> = HashMap::new();
    let mut asset_policies: HashMap<(String, String), Vec<Policy>> = HashMap::new();
    for submodel in &pending {
      if let (Some(connector_url), Some(asset_id), Some(semantic_id)) =
        (submodel.connector_url.clone(), submodel.asset_id.clone(), submodel.semantic_id.as_deref())
      {
        let key = (connector_url, asset_id);
        unique_assets.entry(key.clone()).or_default().push(submodel.submodel_id.clone());
        asset_policies
          .entry(key)
          .or_insert_with(|| governance.and_then(|g| g.get(semantic_id)).cloned().unwrap_or_default());
      }
    }

    let bpn_owned = bpn.as_str().to_string();
    let negotiation = self.negotiation.clone();
    let asset_keys: Vec<(String, String)> = unique_assets.keys().cloned().collect();
    let negotiated: Vec<((String, String), std::result::Result<dsc_core::Edr, String>)> =
      run_bounded(asset_keys, self.negotiation_cap, move |(connector_url, asset_id)| {
        let bpn_owned = bpn_owned.clone();
        let policies =
          asset_policies.get(&(connector_url.clone(), asset_id.clone())).cloned().unwrap_or_default();
        let negotiation = negotiation.clone();
        Box::pin(async move {
          let result = negotiation
            .do_dsp_by_asset_id(&bpn_owned, &connector_url, &asset_id, &policies)
            .await
            .map_err(|e| e.to_string());
          ((connector_url, asset_id), result)
        })
      })
      .await;

    let mut fetch_targets = Vec::new();
    for (key, result) in negotiated {
      let submodel_ids = unique_assets.remove(&key).unwrap_or_default();
      match result {
        Ok(edr) => {
          for submodel in &pending {
            if submodel.connector_url.as_deref() == Some(key.0.as_str())
              && submodel.asset_id.as_deref() == Some(key.1.as_str())
            {
              if let Some(href) = submodel.href.clone() {
                fetch_targets.push((submodel.submodel_id.clone(), href, edr.access_token.clone()));
              } else {
                descriptors.insert(
                  submodel.submodel_id.clone(),
                  SubmodelEntry { submodel_id: submodel.submodel_id.clone(), status: SubmodelStatus::Error },
                );
              }
            }
          }
        }
        Err(_) => {
          for submodel_id in submodel_ids {
            descriptors.insert(
              submodel_id.clone(),
              SubmodelEntry { submodel_id, status: SubmodelStatus::Error },
            );
          }
        }
      }
    }

    let timeout = self.timeout;
    let fetched: Vec<(String, std::result::Result<Value, String>)> =
      run_bounded(fetch_targets, self.fetch_cap, move |(submodel_id, href, access_token)| {
        Box::pin(async move {
          let transport = dsc_net::Transport::new(timeout);
          let result =
            transport.get_json::<Value>(&href, Some(&access_token)).await.map_err(|e| e.to_string());
          (submodel_id, result)
        })
      })
      .await;

    let mut submodels = HashMap::new();
    for (submodel_id, result) in fetched {
      match result {
        Ok(payload) => {
          submodels.insert(submodel_id.clone(), payload);
          descriptors.insert(
            submodel_id.clone(),
            SubmodelEntry { submodel_id, status: SubmodelStatus::Success },
          );
        }
        Err(_) => {
          descriptors.insert(
            submodel_id.clone(),
            SubmodelEntry { submodel_id, status: SubmodelStatus::Error },
          );
        }
      }
    }

    let submodels_found = descriptors.len();
    Ok(SubmodelsResult { submodel_descriptors: descriptors, submodels, submodels_found, dtr: Some(dtr) })
  }
}

/// No semanticId is always an error. Otherwise: no governance map supplied,
/// or the semanticId absent from it, yields `governance_not_found`;
/// presence as a key yields `pending`, carrying that semanticId's policies
/// into negotiation.
fn initial_status(
  submodel: &SubmodelDescriptor,
  governance: Option<&HashMap<String, Vec<Policy>>>,
) -> SubmodelStatus {
  let Some(semantic_id) = submodel.semantic_id.as_deref() else {
    return SubmodelStatus::Error;
  };
  if submodel.href.is_none() || submodel.asset_id.is_none() || submodel.connector_url.is_none() {
    return SubmodelStatus::Error;
  }
  match governance {
    Some(approved) if approved.contains_key(semantic_id) => SubmodelStatus::Pending,
    _ => SubmodelStatus::GovernanceNotFound,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn submodel(semantic_id: Option<&str>) -> SubmodelDescriptor {
    let mut raw = json!({"id": "sm-1"});
    if let Some(sid) = semantic_id {
      raw["semanticId"] = json!({"keys": [{"value": sid}]});
      raw["endpoints"] = json!([{
        "interface": "SUBMODEL-3.0",
        "protocolInformation": {
          "href": "https://dataplane/sm-1",
          "subprotocolBody": "id=asset-1;dspEndpoint=https://connector.example"
        }
      }]);
    }
    SubmodelDescriptor::from_raw(&raw).unwrap()
  }

  #[test]
  fn no_semantic_id_is_error() {
    assert_eq!(initial_status(&submodel(None), None), SubmodelStatus::Error);
  }

  #[test]
  fn semantic_id_without_governance_is_governance_not_found() {
    assert_eq!(initial_status(&submodel(Some("urn:x")), None), SubmodelStatus::GovernanceNotFound);
  }

  #[test]
  fn semantic_id_absent_from_governance_map_is_governance_not_found() {
    let governance: HashMap<String, Vec<Policy>> =
      [("urn:other".to_string(), vec![])].into_iter().collect();
    assert_eq!(
      initial_status(&submodel(Some("urn:x")), Some(&governance)),
      SubmodelStatus::GovernanceNotFound
    );
  }

  #[test]
  fn semantic_id_approved_by_governance_is_pending() {
    let governance: HashMap<String, Vec<Policy>> =
      [("urn:x".to_string(), vec![])].into_iter().collect();
    assert_eq!(initial_status(&submodel(Some("urn:x")), Some(&governance)), SubmodelStatus::Pending);
  }
}
