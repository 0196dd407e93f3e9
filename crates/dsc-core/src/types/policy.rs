use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ODRL access/usage rule. Opaque to the core except that the JSON-LD
/// metadata keys `@id` and `@type` MUST be stripped before storage; two
/// policies are equal iff their cleaned forms are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy(Value);

impl Policy {
  /// Wrap a raw ODRL policy value, stripping `@id` and `@type` at the top
  /// level. Matches the original's `_extract_policies`: only the top-level
  /// object is scrubbed, nested constraints are left untouched.
  pub fn clean(raw: Value) -> Self {
    let cleaned = match raw {
      Value::Object(mut map) => {
        map.remove("@id");
        map.remove("@type");
        Value::Object(map)
      }
      other => other,
    };
    Self(cleaned)
  }

  pub fn as_value(&self) -> &Value {
    &self.0
  }

  pub fn into_value(self) -> Value {
    self.0
  }

  /// Canonical serialization used for equality and for checksum inputs:
  /// serde_json already sorts object keys when the `preserve_order`
  /// feature is absent, so this is stable across processes.
  pub fn canonical(&self) -> String {
    serde_json::to_string(&self.0).unwrap_or_default()
  }

  pub fn contains_ld_metadata(&self) -> bool {
    match &self.0 {
      Value::Object(map) => map.contains_key("@id") || map.contains_key("@type"),
      _ => false,
    }
  }
}

impl PartialEq for Policy {
  fn eq(&self, other: &Self) -> bool {
    self.canonical() == other.canonical()
  }
}

impl Eq for Policy {}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn clean_strips_id_and_type() {
    let raw = json!({"@id": "urn:1", "@type": "odrl:Offer", "odrl:permission": []});
    let policy = Policy::clean(raw);
    assert!(!policy.contains_ld_metadata());
    assert!(policy.as_value().get("odrl:permission").is_some());
  }

  #[test]
  fn clean_leaves_non_object_untouched() {
    let policy = Policy::clean(json!("opaque-string-policy"));
    assert_eq!(policy.as_value(), &json!("opaque-string-policy"));
  }

  #[test]
  fn equality_is_by_cleaned_value() {
    let a = Policy::clean(json!({"@id": "urn:1", "use": "any"}));
    let b = Policy::clean(json!({"@id": "urn:2", "use": "any"}));
    assert_eq!(a, b);
  }

  #[test]
  fn nested_constraints_are_not_recursed_into() {
    let raw = json!({
      "odrl:constraint": {"@id": "urn:nested", "leftOperand": "x"}
    });
    let policy = Policy::clean(raw);
    let constraint = policy.as_value().get("odrl:constraint").unwrap();
    assert!(constraint.get("@id").is_some());
  }
}
