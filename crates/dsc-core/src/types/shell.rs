use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque structured document retrieved from a DTR, identified by a
/// UUID (`shellId`). The same shellId seen from different DTRs is the same
/// logical shell; last writer wins in the process-wide shell store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellDescriptor {
  pub shell_id: String,
  pub raw: Value,
}

impl ShellDescriptor {
  pub fn from_raw(raw: Value) -> Option<Self> {
    let shell_id = raw.get("id")?.as_str()?.to_string();
    Some(Self { shell_id, raw })
  }

  /// Parses `submodelDescriptors[]` off the raw document; see
  /// [`SubmodelDescriptor::from_raw`] for per-entry parsing rules.
  pub fn submodel_entries(&self) -> Vec<&Value> {
    self
      .raw
      .get("submodelDescriptors")
      .and_then(Value::as_array)
      .map(|arr| arr.iter().collect())
      .unwrap_or_default()
  }
}

/// Status of one submodel within a `discoverSubmodels` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmodelStatus {
  Pending,
  Success,
  Error,
  GovernanceNotFound,
}

/// Child of a ShellDescriptor: `(submodelId, semanticId, assetId,
/// connectorURL, href)`, parsed out of the SUBMODEL-3.0 endpoint's
/// `subprotocolBody`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmodelDescriptor {
  pub submodel_id: String,
  pub semantic_id: Option<String>,
  pub asset_id: Option<String>,
  pub connector_url: Option<String>,
  pub href: Option<String>,
}

impl SubmodelDescriptor {
  /// Parses one `submodelDescriptors[]` entry. Looks up the endpoint whose
  /// `interface == "SUBMODEL-3.0"` and decodes its `;`-delimited
  /// `key=value` `subprotocolBody` into `id` (assetId) and `dspEndpoint`
  /// (connectorUrl); `href` comes from the same endpoint's
  /// `protocolInformation.href`. Absence of a semanticId is tolerated
  /// (surfaces as `None`, the caller assigns `status=error`).
  pub fn from_raw(raw: &Value) -> Option<Self> {
    let submodel_id = raw.get("id")?.as_str()?.to_string();
    let semantic_id = raw
      .get("semanticId")
      .and_then(|sid| sid.get("keys"))
      .and_then(Value::as_array)
      .and_then(|keys| keys.first())
      .and_then(|key| key.get("value"))
      .and_then(Value::as_str)
      .map(|s| s.to_string());

    let endpoint = raw
      .get("endpoints")
      .and_then(Value::as_array)
      .and_then(|endpoints| {
        endpoints.iter().find(|e| e.get("interface").and_then(Value::as_str) == Some("SUBMODEL-3.0"))
      });

    let (asset_id, connector_url, href) = match endpoint {
      Some(endpoint) => {
        let protocol_information = endpoint.get("protocolInformation");
        let href = protocol_information
          .and_then(|p| p.get("href"))
          .and_then(Value::as_str)
          .map(|s| s.to_string());
        let subprotocol_body = protocol_information
          .and_then(|p| p.get("subprotocolBody"))
          .and_then(Value::as_str)
          .map(parse_subprotocol_body)
          .unwrap_or_default();
        (subprotocol_body.get("id").cloned(), subprotocol_body.get("dspEndpoint").cloned(), href)
      }
      None => (None, None, None),
    };

    Some(Self { submodel_id, semantic_id, asset_id, connector_url, href })
  }
}

/// Decodes a `;`-delimited `key=value` subprotocolBody string, e.g.
/// `"id=asset-123;dspEndpoint=https://connector.example"`.
fn parse_subprotocol_body(body: &str) -> std::collections::HashMap<String, String> {
  body
    .split(';')
    .filter_map(|pair| {
      let mut parts = pair.splitn(2, '=');
      let key = parts.next()?.trim();
      let value = parts.next()?.trim();
      if key.is_empty() {
        None
      } else {
        Some((key.to_string(), value.to_string()))
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn shell_descriptor_requires_id() {
    assert!(ShellDescriptor::from_raw(json!({"noId": true})).is_none());
  }

  #[test]
  fn shell_descriptor_extracts_submodel_entries() {
    let raw = json!({"id": "shell-1", "submodelDescriptors": [{"id": "sm-1"}]});
    let shell = ShellDescriptor::from_raw(raw).unwrap();
    assert_eq!(shell.submodel_entries().len(), 1);
  }

  #[test]
  fn submodel_parses_subprotocol_body() {
    let raw = json!({
      "id": "sm-1",
      "semanticId": {"keys": [{"value": "urn:semantic:PartType"}]},
      "endpoints": [{
        "interface": "SUBMODEL-3.0",
        "protocolInformation": {
          "href": "https://dataplane/submodel/sm-1",
          "subprotocolBody": "id=asset-123;dspEndpoint=https://connector.example"
        }
      }]
    });
    let submodel = SubmodelDescriptor::from_raw(&raw).unwrap();
    assert_eq!(submodel.semantic_id.as_deref(), Some("urn:semantic:PartType"));
    assert_eq!(submodel.asset_id.as_deref(), Some("asset-123"));
    assert_eq!(submodel.connector_url.as_deref(), Some("https://connector.example"));
    assert_eq!(submodel.href.as_deref(), Some("https://dataplane/submodel/sm-1"));
  }

  #[test]
  fn submodel_without_semantic_id_is_tolerated() {
    let raw = json!({"id": "sm-2"});
    let submodel = SubmodelDescriptor::from_raw(&raw).unwrap();
    assert!(submodel.semantic_id.is_none());
  }
}
