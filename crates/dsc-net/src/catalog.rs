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

//! [`CatalogHarvester`]: parallel, filtered DCAT catalog fetch across a set
//! of connectors. One worker per connector, all launched simultaneously,
//! joined before returning; a failing worker writes no entry.

use dsc_core::ConnectorUrl;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use crate::transport::Transport;

/// Fetches DCAT catalogs from many connectors concurrently.
pub struct CatalogHarvester;

impl CatalogHarvester {
  /// Launches one task per connector, all at once, and joins them all
  /// before returning. A worker that fails writes no entry into the map;
  /// callers tolerate missing keys.
  #[instrument(skip(filter_expression), fields(connector_count = connector_urls.len()))]
  pub async fn harvest(
    bpn: &str,
    connector_urls: &[ConnectorUrl],
    filter_expression: &Value,
    timeout: Duration,
  ) -> HashMap<ConnectorUrl, Value> {
    let results = Arc::new(Mutex::new(HashMap::new()));
    let mut handles = Vec::with_capacity(connector_urls.len());

    for connector_url in connector_urls {
      let connector_url = connector_url.clone();
      let filter_expression = filter_expression.clone();
      let results = results.clone();
      let bpn = bpn.to_string();

      handles.push(tokio::spawn(async move {
        let transport = Transport::new(timeout);
        let request = json!({
          "@context": { "dspace": "https://w3id.org/dspace/v0.8/" },
          "protocol": "dataspace-protocol-http",
          "counterPartyAddress": connector_url.as_str(),
          "querySpec": { "filterExpression": filter_expression },
        });

        match transport
          .post_json::<Value>(&format!("{}/v2/catalog/request", connector_url.as_str()), &request, None)
          .await
        {
          Ok(catalog) => {
            results.lock().await.insert(connector_url, catalog);
          }
          Err(e) => {
            warn!(bpn = %bpn, connector_url = %connector_url, error = %e, "catalog harvest failed");
          }
        }
      }));
    }

    futures::future::join_all(handles).await;

    // Every spawned task has completed (or panicked, which tokio contains
    // within the JoinHandle) by this point, so `results` is the sole owner.
    Arc::try_unwrap(results).map(Mutex::into_inner).unwrap_or_default()
  }

  /// The default DTR-type filter expression triple, built from config.
  pub fn dtr_filter_expression(key: &str, operator: &str, value: &str) -> Value {
    json!({ "key": key, "operator": operator, "value": value })
  }
}
