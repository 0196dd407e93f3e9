#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use base64::{engine::general_purpose::STANDARD, Engine as _};
  use chrono::{Duration as ChronoDuration, Utc};
  use dsc_core::types::{Bpn, ConnectorUrl, Dtr, DtrCacheEntry};
  use dsc_core::Config;
  use dsc_discovery::connector_cache::{ConnectorCache, ConnectorDiscoveryPort};
  use dsc_discovery::dirty::DirtyFlag;
  use dsc_discovery::dtr_cache::DtrCache;
  use dsc_discovery::shell_discovery::ShellDiscovery;
  use dsc_discovery::shell_store::ShellStore;
  use dsc_net::HttpNegotiationPort;
  use serde_json::json;
  use std::collections::HashMap;
  use std::sync::Arc;
  use std::time::Duration;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  struct NoConnectors;

  #[async_trait]
  impl ConnectorDiscoveryPort for NoConnectors {
    async fn find_connectors_by_bpn(&self, _bpn: &Bpn) -> dsc_core::Result<Vec<ConnectorUrl>> {
      Ok(vec![])
    }
  }

  /// Seeds a `DtrCache` directly, bypassing catalog harvest, with one DTR
  /// pointed at `connector_url`.
  fn seeded_dtr_cache(bpn: &Bpn, connector_url: &str) -> Arc<DtrCache> {
    let connector_cache = Arc::new(ConnectorCache::new(Arc::new(NoConnectors), 3600, DirtyFlag::new()));
    let config = Config::default_with_database_url("postgres://unused".to_string());
    let dtr_cache = Arc::new(DtrCache::new(connector_cache, &config, DirtyFlag::new()));

    let dtr = Dtr::new("registry-asset", ConnectorUrl::parse(connector_url).unwrap(), vec![]);
    let mut dtrs = HashMap::new();
    dtrs.insert(dtr.asset_id.clone(), dtr);
    dtr_cache.restore(vec![DtrCacheEntry {
      bpn: bpn.clone(),
      dtrs,
      expires_at: Utc::now() + ChronoDuration::seconds(3600),
    }]);
    dtr_cache
  }

  #[tokio::test]
  async fn discover_shells_paginates_across_two_pages() {
    let control_plane = MockServer::start().await;
    let dataplane = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v2/contractnegotiations"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "transferId": "transfer-1",
        "dataplaneUrl": dataplane.uri(),
        "authorization": "token-1",
      })))
      .mount(&control_plane)
      .await;

    Mock::given(method("POST"))
      .and(path("/lookup/shellsByAssetLink"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "result": ["shell-1", "shell-2"],
        "paging_metadata": {"cursor": null},
      })))
      .mount(&dataplane)
      .await;

    for shell_id in ["shell-1", "shell-2"] {
      let encoded = STANDARD.encode(shell_id);
      Mock::given(method("GET"))
        .and(path(format!("/shell-descriptors/{encoded}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "id": shell_id,
          "submodelDescriptors": [],
        })))
        .mount(&dataplane)
        .await;
    }

    let bpn = Bpn::from("BPNL000000000001");
    let dtr_cache = seeded_dtr_cache(&bpn, &control_plane.uri());
    let shell_store = Arc::new(ShellStore::new());
    let negotiation =
      Arc::new(HttpNegotiationPort::new(control_plane.uri(), Duration::from_secs(5)));

    let discovery = ShellDiscovery::new(dtr_cache, shell_store.clone(), negotiation, 1, Duration::from_secs(5));

    let result = discovery.discover_shells(&bpn, &json!({}), Some(10), None).await.unwrap();

    assert_eq!(result.shells_found, 2);
    assert_eq!(result.shell_descriptors.len(), 2);
    assert_eq!(shell_store.len(), 2);
    let pagination = result.pagination.expect("pagination present when limit is set");
    assert!(pagination.next.is_none(), "single exhausted page should not carry a next cursor");
  }

  #[tokio::test]
  async fn discover_shell_by_id_negotiates_and_fetches_one_descriptor() {
    let control_plane = MockServer::start().await;
    let dataplane = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v2/contractnegotiations"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "transferId": "transfer-2",
        "dataplaneUrl": dataplane.uri(),
        "authorization": "token-2",
      })))
      .mount(&control_plane)
      .await;

    let encoded = STANDARD.encode("shell-target");
    Mock::given(method("GET"))
      .and(path(format!("/shell-descriptors/{encoded}")))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "shell-target"})))
      .mount(&dataplane)
      .await;

    let bpn = Bpn::from("BPNL000000000002");
    let dtr_cache = seeded_dtr_cache(&bpn, &control_plane.uri());
    let shell_store = Arc::new(ShellStore::new());
    let negotiation =
      Arc::new(HttpNegotiationPort::new(control_plane.uri(), Duration::from_secs(5)));

    let discovery = ShellDiscovery::new(dtr_cache, shell_store.clone(), negotiation, 1, Duration::from_secs(5));

    let found = discovery.discover_shell(&bpn, "shell-target").await.unwrap();
    assert!(found.is_some());
    assert_eq!(shell_store.get("shell-target").unwrap().shell_id, "shell-target");
  }
}
