//! Domain entities shared across the discovery core.

mod dtr;
mod edr;
mod page;
mod policy;
mod shell;

pub use dtr::{ConnectorCacheEntry, Dtr, DtrCacheEntry};
pub use edr::{Edr, EdrKey};
pub use page::{DtrCursor, PageState};
pub use policy::Policy;
pub use shell::{ShellDescriptor, SubmodelDescriptor, SubmodelStatus};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Business Partner Number. Opaque, case-sensitive, the primary
/// partitioning key of every cache in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bpn(String);

impl Bpn {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Bpn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for Bpn {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

impl From<String> for Bpn {
  fn from(value: String) -> Self {
    Self(value)
  }
}

/// An absolute URL identifying a counterparty's control-plane endpoint.
/// Identity is the full string; no normalization is performed since the
/// spec treats it as opaque beyond "absolute URL".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorUrl(String);

impl ConnectorUrl {
  pub fn parse(value: impl Into<String>) -> crate::Result<Self> {
    let value = value.into();
    url::Url::parse(&value)?;
    Ok(Self(value))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ConnectorUrl {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bpn_display_roundtrip() {
    let bpn = Bpn::from("BPNL00000003AYRE");
    assert_eq!(bpn.to_string(), "BPNL00000003AYRE");
    assert_eq!(bpn.as_str(), "BPNL00000003AYRE");
  }

  #[test]
  fn bpn_is_case_sensitive() {
    assert_ne!(Bpn::from("bpnl1"), Bpn::from("BPNL1"));
  }

  #[test]
  fn connector_url_rejects_non_absolute() {
    assert!(ConnectorUrl::parse("not-a-url").is_err());
  }

  #[test]
  fn connector_url_accepts_absolute() {
    let url = ConnectorUrl::parse("https://connector.example/api").unwrap();
    assert_eq!(url.as_str(), "https://connector.example/api");
  }
}
