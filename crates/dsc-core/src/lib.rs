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

//! # dsc-core
//!
//! Domain types, configuration, error handling, and the pagination codec
//! shared across the dataspace discovery core:
//!
//! - [`Config`] - runtime configuration (TTLs, fan-out caps, filter triple)
//! - [`Error`] and [`Result`] - the discovery core's error taxonomy
//! - [`types`] - BPN, ConnectorUrl, Policy, Dtr, ShellDescriptor, Edr, PageState
//! - [`pagination`] - opaque cursor encode/decode

pub mod config;
pub mod error;
pub mod pagination;
pub mod types;

pub use config::{Config, DtrTypeFilter};
pub use error::{Error, Result};
pub use types::{
  Bpn, ConnectorCacheEntry, ConnectorUrl, Dtr, DtrCacheEntry, DtrCursor, Edr, EdrKey, PageState,
  Policy, ShellDescriptor, SubmodelDescriptor, SubmodelStatus,
};

pub mod prelude {
  pub use crate::config::{Config, DtrTypeFilter};
  pub use crate::error::{Error, Result};
  pub use crate::pagination;
  pub use crate::types::{
    Bpn, ConnectorCacheEntry, ConnectorUrl, Dtr, DtrCacheEntry, DtrCursor, Edr, EdrKey, PageState,
    Policy, ShellDescriptor, SubmodelDescriptor, SubmodelStatus,
  };
}
