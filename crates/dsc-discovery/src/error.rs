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

//! Conversion glue between [`dsc_db::RepositoryError`] and
//! [`dsc_core::Error`]. Lives here rather than as a `#[from]` on
//! `dsc_core::Error` itself, since `dsc-core` stays free of a dependency on
//! `dsc-db` (the orchestration layer is the only place both types are in
//! scope).

use dsc_core::Error;
use dsc_db::RepositoryError;

pub trait IntoPersistenceFailed<T> {
  fn into_persistence_failed(self) -> Result<T, Error>;
}

impl<T> IntoPersistenceFailed<T> for Result<T, RepositoryError> {
  fn into_persistence_failed(self) -> Result<T, Error> {
    self.map_err(|e| Error::PersistenceFailed(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn repository_error_maps_to_persistence_failed() {
    let result: Result<(), RepositoryError> =
      Err(RepositoryError::NotFound("known_connectors".to_string()));
    let mapped = result.into_persistence_failed();
    assert!(matches!(mapped, Err(Error::PersistenceFailed(_))));
  }
}
