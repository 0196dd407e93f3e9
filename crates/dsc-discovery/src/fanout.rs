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

//! Bounded-concurrency fan-out, shared by submodel negotiation (cap 10) and
//! submodel fetch (cap 20).

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};

/// Runs `items` through `task`, at most `cap` concurrently, and returns the
/// results in the same order as `items` (not completion order).
pub async fn run_bounded<T, F, O>(items: Vec<T>, cap: usize, task: F) -> Vec<O>
where
  T: Send + 'static,
  F: Fn(T) -> BoxFuture<'static, O> + Send + Sync + Clone + 'static,
  O: Send + 'static,
{
  let cap = cap.max(1);
  stream::iter(items.into_iter().enumerate())
    .map(move |(idx, item)| {
      let task = task.clone();
      async move { (idx, task(item).await) }
    })
    .buffer_unordered(cap)
    .collect::<Vec<_>>()
    .await
    .into_iter()
    .fold(Vec::new(), |mut acc, (idx, out)| {
      if acc.len() <= idx {
        acc.resize_with(idx + 1, || None);
      }
      acc[idx] = Some(out);
      acc
    })
    .into_iter()
    .flatten()
    .collect()
}
