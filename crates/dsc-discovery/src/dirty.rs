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

//! A lock-free, idempotent dirty signal shared between a cache and the
//! persistence mirror that snapshots it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
  pub fn new() -> Self {
    Self(Arc::new(AtomicBool::new(false)))
  }

  pub fn mark(&self) {
    self.0.store(true, Ordering::Release);
  }

  /// Reads and clears the flag in one step, so a concurrent `mark()` that
  /// races with a save is never lost.
  pub fn take(&self) -> bool {
    self.0.swap(false, Ordering::AcqRel)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn take_clears_the_flag() {
    let flag = DirtyFlag::new();
    assert!(!flag.take());
    flag.mark();
    assert!(flag.take());
    assert!(!flag.take());
  }

  #[test]
  fn clones_share_the_same_underlying_flag() {
    let flag = DirtyFlag::new();
    let clone = flag.clone();
    clone.mark();
    assert!(flag.take());
  }
}
