//! PaginationCodec: opaque cursor encoding/decoding carrying per-DTR
//! sub-cursors. A pair of pure functions; decoding never fails, it
//! degrades to an empty PageState.

use crate::types::PageState;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encodes a PageState as base64 of its canonical JSON.
pub fn encode(state: &PageState) -> String {
  let json = serde_json::to_string(state).unwrap_or_default();
  STANDARD.encode(json)
}

/// Decodes a cursor token. Any base64 or JSON failure yields an empty
/// PageState rather than propagating an error, matching the reference
/// implementation's blanket `except Exception` fallback.
pub fn decode(token: &str) -> PageState {
  STANDARD
    .decode(token)
    .ok()
    .and_then(|bytes| String::from_utf8(bytes).ok())
    .and_then(|json| serde_json::from_str(&json).ok())
    .unwrap_or_default()
}

/// Divides a total limit equally across the active (non-exhausted) DTRs.
/// Integer division, floored to at least 1 whenever there is at least one
/// active DTR.
pub fn distribute_limit(total_limit: usize, active_dtrs: usize) -> usize {
  if active_dtrs > 0 {
    (total_limit / active_dtrs).max(1)
  } else {
    total_limit
  }
}

/// True iff at least one DTR in the map has not yet been marked exhausted.
pub fn has_more_data(dtr_states: &std::collections::BTreeMap<String, crate::types::DtrCursor>) -> bool {
  dtr_states.values().any(|state| !state.exhausted)
}

/// A cursor is compatible with a request's limit iff the cursor carries no
/// limit at all, or both limits are present and equal. A cursor with a
/// limit paired against a limit-less request is never compatible: the
/// per-DTR sub-limits baked into the cursor have no new limit to validate
/// against.
pub fn is_compatible(state: &PageState, request_limit: Option<usize>) -> bool {
  match (state.limit, request_limit) {
    (None, _) => true,
    (Some(_), None) => false,
    (Some(cursor_limit), Some(request_limit)) => cursor_limit == request_limit,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::DtrCursor;
  use std::collections::BTreeMap;

  #[test]
  fn decode_of_garbage_is_empty_page_state() {
    let state = decode("not-valid-base64-json!!!");
    assert_eq!(state, PageState::default());
  }

  #[test]
  fn encode_decode_roundtrips_modulo_previous_state_identity() {
    let mut dtr_states = BTreeMap::new();
    dtr_states.insert("asset-A".to_string(), DtrCursor { cursor: Some("c1".to_string()), exhausted: false });
    let state = PageState { dtr_states, page_number: 2, limit: Some(3), previous_state: None };
    let token = encode(&state);
    let decoded = decode(&token);
    assert_eq!(decoded, state);
  }

  #[test]
  fn distribute_limit_floors_to_one() {
    assert_eq!(distribute_limit(3, 7), 1);
    assert_eq!(distribute_limit(10, 3), 3);
    assert_eq!(distribute_limit(10, 0), 10);
  }

  #[test]
  fn has_more_data_true_when_any_active() {
    let mut states = BTreeMap::new();
    states.insert("a".to_string(), DtrCursor { cursor: None, exhausted: true });
    states.insert("b".to_string(), DtrCursor { cursor: Some("x".to_string()), exhausted: false });
    assert!(has_more_data(&states));
  }

  #[test]
  fn has_more_data_false_when_all_exhausted() {
    let mut states = BTreeMap::new();
    states.insert("a".to_string(), DtrCursor { cursor: None, exhausted: true });
    assert!(!has_more_data(&states));
  }

  #[test]
  fn is_compatible_true_when_cursor_has_no_limit() {
    let state = PageState { limit: None, ..Default::default() };
    assert!(is_compatible(&state, Some(5)));
    assert!(is_compatible(&state, None));
  }

  #[test]
  fn is_compatible_false_when_request_drops_limit() {
    let state = PageState { limit: Some(3), ..Default::default() };
    assert!(!is_compatible(&state, None));
  }

  #[test]
  fn is_compatible_requires_equal_limits() {
    let state = PageState { limit: Some(3), ..Default::default() };
    assert!(is_compatible(&state, Some(3)));
    assert!(!is_compatible(&state, Some(5)));
  }
}
