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

//! Process-wide [`ShellDescriptor`] store, keyed by shellId. Independent
//! lock from the connector and DTR caches; last writer wins; no automatic
//! eviction.

use dsc_core::types::ShellDescriptor;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct ShellStore {
  shells: RwLock<HashMap<String, ShellDescriptor>>,
}

impl ShellStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, shell_id: &str) -> Option<ShellDescriptor> {
    self.shells.read().expect("shell store lock poisoned").get(shell_id).cloned()
  }

  /// Last writer wins: a concurrent store of the same shellId always
  /// overwrites whatever is already there.
  pub fn put(&self, descriptor: ShellDescriptor) {
    self
      .shells
      .write()
      .expect("shell store lock poisoned")
      .insert(descriptor.shell_id.clone(), descriptor);
  }

  pub fn len(&self) -> usize {
    self.shells.read().expect("shell store lock poisoned").len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn purge(&self) {
    self.shells.write().expect("shell store lock poisoned").clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn shell(id: &str) -> ShellDescriptor {
    ShellDescriptor::from_raw(json!({"id": id})).unwrap()
  }

  #[test]
  fn put_then_get_roundtrips() {
    let store = ShellStore::new();
    store.put(shell("shell-1"));
    assert!(store.get("shell-1").is_some());
    assert!(store.get("shell-2").is_none());
  }

  #[test]
  fn put_overwrites_existing_entry() {
    let store = ShellStore::new();
    store.put(ShellDescriptor::from_raw(json!({"id": "shell-1", "v": 1})).unwrap());
    store.put(ShellDescriptor::from_raw(json!({"id": "shell-1", "v": 2})).unwrap());
    assert_eq!(store.get("shell-1").unwrap().raw["v"], 2);
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn purge_empties_the_store() {
    let store = ShellStore::new();
    store.put(shell("shell-1"));
    store.purge();
    assert!(store.is_empty());
  }
}
