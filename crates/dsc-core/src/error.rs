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

use thiserror::Error;

/// The error kinds a discovery-core component can surface.
///
/// Most of these never escape as an `Err` to a caller of `ShellDiscovery` or
/// `SubmodelFetcher` — per-DTR and per-submodel failures are carried inside
/// the structured result types instead. Only `LimitMismatch` and malformed
/// call-site arguments are call-terminating.
#[derive(Error, Debug)]
pub enum Error {
  #[error("environment variable error: {0}")]
  EnvVar(#[from] std::env::VarError),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("no connectors known for bpn")]
  NotFound,

  #[error("dtr {0} has no cached policies")]
  NoPolicies(String),

  #[error("contract negotiation failed: {0}")]
  NegotiationFailed(String),

  #[error("upstream http error: {0}")]
  UpstreamHttp(String),

  #[error("cursor limit does not match request limit; restart pagination")]
  LimitMismatch,

  #[error("malformed cursor: {0}")]
  Malformed(String),

  #[error("persistence failure: {0}")]
  PersistenceFailed(String),

  #[error("serialization error")]
  Serde(#[from] serde_json::Error),

  #[error("invalid connector url: {0}")]
  InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display_config() {
    let err = Error::Config("missing DSC_DATABASE_URL".to_string());
    assert_eq!(err.to_string(), "configuration error: missing DSC_DATABASE_URL");
  }

  #[test]
  fn test_error_display_not_found() {
    let err = Error::NotFound;
    assert_eq!(err.to_string(), "no connectors known for bpn");
  }

  #[test]
  fn test_error_display_no_policies() {
    let err = Error::NoPolicies("asset-A".to_string());
    assert_eq!(err.to_string(), "dtr asset-A has no cached policies");
  }

  #[test]
  fn test_error_display_limit_mismatch() {
    let err = Error::LimitMismatch;
    assert_eq!(err.to_string(), "cursor limit does not match request limit; restart pagination");
  }

  #[test]
  fn test_error_from_env_var() {
    let env_err = std::env::VarError::NotPresent;
    let err = Error::from(env_err);
    assert!(matches!(err, Error::EnvVar(_)));
  }

  #[test]
  fn test_error_from_serde_json() {
    let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
    let err = Error::from(json_err);
    assert!(matches!(err, Error::Serde(_)));
  }

  #[test]
  fn test_result_type_alias() {
    fn returns_ok() -> Result<i32> {
      Ok(42)
    }
    fn returns_err() -> Result<i32> {
      Err(Error::NotFound)
    }
    assert_eq!(returns_ok().unwrap(), 42);
    assert!(returns_err().is_err());
  }
}
