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

use crate::error::{Error, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// The DTR type filter triple used to pick out registry assets from a DCAT
/// catalog (`dct:type`'s value, the comparison operator, and the expected
/// taxonomy URI).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DtrTypeFilter {
  pub key: String,
  pub operator: String,
  pub value: String,
}

impl Default for DtrTypeFilter {
  fn default() -> Self {
    Self {
      key: "http://purl.org/dc/terms/type".to_string(),
      operator: "=".to_string(),
      value: "https://w3id.org/catenax/taxonomy#DigitalTwinRegistry".to_string(),
    }
  }
}

/// Top-level configuration for the discovery core, loaded once at process
/// startup and shared by reference through the composition root.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
  /// Postgres connection string for the persistence mirror.
  pub database_url: String,

  /// The consumer's own control-plane base URL, used for contract
  /// negotiation requests (`POST {control_plane_url}/v2/contractnegotiations`
  /// and `/v2/catalog/request`). Distinct from any counterparty's
  /// ConnectorURL, which is passed per call as `counterPartyAddress`.
  pub control_plane_url: String,

  /// TTL for a ConnectorCacheEntry.
  pub connector_ttl_secs: u64,

  /// TTL for a DtrCacheEntry.
  pub dtr_ttl_secs: u64,

  /// Filter triple used by the catalog harvester to recognize DTR assets.
  pub dtr_type_filter: DtrTypeFilter,

  /// Timeout for a single catalog harvest worker.
  pub catalog_timeout_secs: u64,

  /// Timeout for a single DTR lookup round-trip.
  pub dtr_timeout_secs: u64,

  /// Retry attempts per DTR per page in `discoverShells`.
  pub shell_retry_attempts: u32,

  /// Bounded worker pool size for submodel contract negotiation.
  pub submodel_negotiation_cap: usize,

  /// Bounded worker pool size for submodel payload fetch.
  pub submodel_fetch_cap: usize,

  /// Interval between persistence mirror sync ticks.
  pub sync_interval_secs: u64,

  pub db_pool_max_size: u32,
  pub db_pool_min_idle: u32,
  pub db_connection_timeout_secs: u64,
}

impl Config {
  /// Load configuration from environment variables, defaulting whatever the
  /// spec leaves optional.
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let database_url = env::var("DSC_DATABASE_URL")
      .map_err(|_| Error::Config("DSC_DATABASE_URL not set".to_string()))?;

    let control_plane_url = env::var("DSC_CONTROL_PLANE_URL")
      .map_err(|_| Error::Config("DSC_CONTROL_PLANE_URL not set".to_string()))?;

    let connector_ttl_secs = parse_env("DSC_CONNECTOR_TTL_SECS", 3600)?;
    let dtr_ttl_secs = parse_env("DSC_DTR_TTL_SECS", 3600)?;

    let dtr_type_filter = DtrTypeFilter {
      key: env::var("DSC_DTR_TYPE_KEY")
        .unwrap_or_else(|_| DtrTypeFilter::default().key),
      operator: env::var("DSC_DTR_TYPE_OPERATOR")
        .unwrap_or_else(|_| DtrTypeFilter::default().operator),
      value: env::var("DSC_DTR_TYPE_VALUE")
        .unwrap_or_else(|_| DtrTypeFilter::default().value),
    };

    let catalog_timeout_secs = parse_env("DSC_CATALOG_TIMEOUT_SECS", 60)?;
    let dtr_timeout_secs = parse_env("DSC_DTR_TIMEOUT_SECS", 30)?;
    let shell_retry_attempts = parse_env("DSC_SHELL_RETRY_ATTEMPTS", 2)?;
    let submodel_negotiation_cap = parse_env("DSC_SUBMODEL_NEGOTIATION_CAP", 10)?;
    let submodel_fetch_cap = parse_env("DSC_SUBMODEL_FETCH_CAP", 20)?;
    let sync_interval_secs = parse_env("DSC_SYNC_INTERVAL_SECS", 300)?;
    let db_pool_max_size = parse_env("DSC_DB_POOL_MAX_SIZE", 50)?;
    let db_pool_min_idle = parse_env("DSC_DB_POOL_MIN_IDLE", 10)?;
    let db_connection_timeout_secs = parse_env("DSC_DB_CONNECTION_TIMEOUT_SECS", 30)?;

    Ok(Config {
      database_url,
      control_plane_url,
      connector_ttl_secs,
      dtr_ttl_secs,
      dtr_type_filter,
      catalog_timeout_secs,
      dtr_timeout_secs,
      shell_retry_attempts,
      submodel_negotiation_cap,
      submodel_fetch_cap,
      sync_interval_secs,
      db_pool_max_size,
      db_pool_min_idle,
      db_connection_timeout_secs,
    })
  }

  /// Config with sane defaults over an explicit database URL, for tests.
  pub fn default_with_database_url(database_url: String) -> Self {
    Config {
      database_url,
      control_plane_url: "https://consumer.example".to_string(),
      connector_ttl_secs: 3600,
      dtr_ttl_secs: 3600,
      dtr_type_filter: DtrTypeFilter::default(),
      catalog_timeout_secs: 60,
      dtr_timeout_secs: 30,
      shell_retry_attempts: 2,
      submodel_negotiation_cap: 10,
      submodel_fetch_cap: 20,
      sync_interval_secs: 300,
      db_pool_max_size: 50,
      db_pool_min_idle: 10,
      db_connection_timeout_secs: 30,
    }
  }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
  match env::var(key) {
    Ok(v) => v.parse().map_err(|_| Error::Config(format!("invalid {key}"))),
    Err(_) => Ok(default),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_config_from_env_defaults() {
    env::set_var("DSC_DATABASE_URL", "postgres://localhost/dsc_test");
    env::set_var("DSC_CONTROL_PLANE_URL", "https://consumer.example");
    env::remove_var("DSC_CONNECTOR_TTL_SECS");
    let config = Config::from_env().unwrap();
    assert_eq!(config.database_url, "postgres://localhost/dsc_test");
    assert_eq!(config.connector_ttl_secs, 3600);
    assert_eq!(config.shell_retry_attempts, 2);
  }

  #[test]
  fn test_config_missing_database_url() {
    env::remove_var("DSC_DATABASE_URL");
    // dotenv() may pick up a local .env in CI; only assert the error shape
    // when truly absent from the environment.
    if env::var("DSC_DATABASE_URL").is_err() {
      assert!(Config::from_env().is_err());
    }
  }

  #[test]
  fn test_dtr_type_filter_default() {
    let filter = DtrTypeFilter::default();
    assert_eq!(filter.operator, "=");
    assert!(filter.value.contains("DigitalTwinRegistry"));
  }
}
