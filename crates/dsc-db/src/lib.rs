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

//! # dsc-db
//!
//! PostgreSQL persistence mirror for the dataspace discovery core's caches.
//!
//! Synchronous Diesel under `tokio::task::spawn_blocking`, r2d2 pooling, a
//! fail-fast connection check at startup. Three tables, three stores:
//! [`ConnectorStore`], [`DtrStore`], [`EdrStore`], all reachable off one
//! shared [`DatabaseContext`].

pub mod connection;
pub mod repository;
pub mod schema;

pub use connection::establish_connection;
pub use repository::{
  ConnectorRow, ConnectorStore, DatabaseContext, DbConnection, DbPool, DtrRow, DtrStore, EdrRow,
  EdrStore, RepositoryError, RepositoryResult,
};

pub mod prelude {
  pub use crate::repository::{
    ConnectorRow, ConnectorStore, DatabaseContext, DtrRow, DtrStore, EdrRow, EdrStore,
    RepositoryError, RepositoryResult,
  };
}
