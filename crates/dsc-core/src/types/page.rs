use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-DTR pagination state: `(assetId, cursor?, exhausted)`. The absence
/// of a cursor on the most recent page marks the DTR exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DtrCursor {
  pub cursor: Option<String>,
  pub exhausted: bool,
}

/// `(dtrStates, pageNumber, limit, previousState?)`. `previousState` is at
/// most one level deep; it is never itself given a `previous_state`.
///
/// `dtr_states` is a `BTreeMap` rather than a `HashMap` so that the DTR
/// map's canonical ordering (by assetId) is stable across encode/decode,
/// per the ordering guarantee in the concurrency model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageState {
  pub dtr_states: BTreeMap<String, DtrCursor>,
  pub page_number: u32,
  pub limit: Option<usize>,
  pub previous_state: Option<Box<PreviousPageState>>,
}

/// A flattened snapshot of a prior `PageState`, with no further nesting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreviousPageState {
  pub dtr_states: BTreeMap<String, DtrCursor>,
  pub page_number: u32,
  pub limit: Option<usize>,
}

impl From<&PageState> for PreviousPageState {
  fn from(state: &PageState) -> Self {
    Self {
      dtr_states: state.dtr_states.clone(),
      page_number: state.page_number,
      limit: state.limit,
    }
  }
}

impl PageState {
  /// Returns a new PageState that records `self` as its `previous_state`,
  /// flattening away any history `self` itself carried.
  pub fn advance(&self, dtr_states: BTreeMap<String, DtrCursor>) -> PageState {
    PageState {
      dtr_states,
      page_number: self.page_number + 1,
      limit: self.limit,
      previous_state: Some(Box::new(PreviousPageState::from(self))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn advance_flattens_history_to_one_level() {
    let first = PageState { limit: Some(3), ..Default::default() };
    let second = first.advance(BTreeMap::new());
    let third = second.advance(BTreeMap::new());
    assert_eq!(third.previous_state.as_ref().unwrap().page_number, 1);
  }
}
