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

//! Shared HTTP transport for the negotiation port and catalog harvester.
//!
//! Retry with exponential backoff, bearer-token redaction in `Debug`, a
//! per-call timeout. Errors are mapped to strings rather than wrapped via
//! `#[from]`, keeping `dsc-core` free of a `reqwest` dependency.

use dsc_core::Error;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_MAX_RETRIES: u32 = 3;

/// Thin wrapper over `reqwest::Client` carrying the retry/backoff policy
/// shared by every outbound call this crate makes.
pub struct Transport {
  client: Client,
}

impl Transport {
  pub fn new(timeout: Duration) -> Self {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent("dsc-net/0.1")
      .build()
      .expect("failed to build http client");
    Self { client }
  }

  pub fn client(&self) -> &Client {
    &self.client
  }

  /// GET a URL and deserialize the JSON body, retrying with exponential
  /// backoff on transport-level or non-2xx failures.
  #[instrument(skip(self, bearer_token), fields(url = %url))]
  pub async fn get_json<T>(&self, url: &str, bearer_token: Option<&str>) -> Result<T, Error>
  where
    T: DeserializeOwned,
  {
    let mut last_error = None;
    for attempt in 1..=DEFAULT_MAX_RETRIES {
      let mut req = self.client.get(url);
      if let Some(token) = bearer_token {
        req = req.bearer_auth(token);
      }
      match req.send().await {
        Ok(response) if response.status().is_success() => {
          let text = response
            .text()
            .await
            .map_err(|e| Error::UpstreamHttp(format!("failed to read body: {}", e)))?;
          return serde_json::from_str(&text)
            .map_err(|e| Error::UpstreamHttp(format!("malformed response body: {}", e)));
        }
        Ok(response) => {
          last_error = Some(Error::UpstreamHttp(format!("http {}", response.status())));
        }
        Err(e) => {
          last_error = Some(Error::UpstreamHttp(e.to_string()));
        }
      }
      warn!(attempt, "request failed, will retry if attempts remain");
      if attempt < DEFAULT_MAX_RETRIES {
        backoff(attempt).await;
      }
    }
    Err(last_error.unwrap_or_else(|| Error::UpstreamHttp("max retries exceeded".to_string())))
  }

  /// POST a JSON body and deserialize the JSON response, same retry policy.
  #[instrument(skip(self, body, bearer_token), fields(url = %url))]
  pub async fn post_json<T>(
    &self,
    url: &str,
    body: &Value,
    bearer_token: Option<&str>,
  ) -> Result<T, Error>
  where
    T: DeserializeOwned,
  {
    let mut last_error = None;
    for attempt in 1..=DEFAULT_MAX_RETRIES {
      let mut req = self.client.post(url).json(body);
      if let Some(token) = bearer_token {
        req = req.bearer_auth(token);
      }
      match req.send().await {
        Ok(response) if response.status().is_success() => {
          let text = response
            .text()
            .await
            .map_err(|e| Error::UpstreamHttp(format!("failed to read body: {}", e)))?;
          debug!(body = %text, "received response");
          return serde_json::from_str(&text)
            .map_err(|e| Error::UpstreamHttp(format!("malformed response body: {}", e)));
        }
        Ok(response) => {
          last_error = Some(Error::UpstreamHttp(format!("http {}", response.status())));
        }
        Err(e) => {
          last_error = Some(Error::UpstreamHttp(e.to_string()));
        }
      }
      warn!(attempt, "request failed, will retry if attempts remain");
      if attempt < DEFAULT_MAX_RETRIES {
        backoff(attempt).await;
      }
    }
    Err(last_error.unwrap_or_else(|| Error::UpstreamHttp("max retries exceeded".to_string())))
  }
}

async fn backoff(attempt: u32) {
  let delay = Duration::from_millis(1000 * 2_u64.pow(attempt - 1));
  tokio::time::sleep(delay).await;
}

impl std::fmt::Debug for Transport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Transport").field("client", &"reqwest::Client").finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transport_debug_does_not_expose_internals() {
    let transport = Transport::new(Duration::from_secs(5));
    let debug = format!("{:?}", transport);
    assert_eq!(debug, "Transport { client: \"reqwest::Client\" }");
  }

  #[tokio::test]
  async fn get_json_against_unreachable_host_exhausts_retries() {
    let transport = Transport::new(Duration::from_millis(50));
    let result: Result<Value, Error> =
      transport.get_json("http://127.0.0.1:1/does-not-exist", None).await;
    assert!(result.is_err());
  }
}
