// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Core components for signing object storage requests.
//!
//! This crate provides the service-agnostic types that the qsign signers
//! are built on.
//!
//! ## Overview
//!
//! - [`SigningRequest`]: description of a request (method, uri, parameter
//!   tree, headers, credential) that a signer reads and mutates.
//! - [`SignRequest`]: the signer capability. Given a request it computes a
//!   [`SignatureResult`] and writes it back in the configured
//!   [`SignatureMode`].
//! - [`Context`]: environment access used when loading configuration.
//!
//! ## Example
//!
//! ```
//! use qsign_core::{Credential, SigningRequest};
//! use http::Method;
//!
//! # fn main() -> qsign_core::Result<()> {
//! let req = SigningRequest::new(Method::GET, "/bucket/photo.jpg")
//!     .with_param("image", "")
//!     .with_header("Date", "Thu, 01 Jan 1970 00:00:00 GMT")?
//!     .with_credential(Credential::new("access_key_id", "secret_access_key"));
//!
//! assert_eq!(req.path_and_query(), "/bucket/photo.jpg?image");
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`escape`]: percent-encoding used by canonicalization
//! - [`params`]: parameter tree flattening and the canonical query builder
//! - [`hash`]: cryptographic hashing utilities
//! - [`time`]: time manipulation utilities
//! - [`utils`]: general utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod escape;
pub mod hash;
pub mod params;
pub mod time;
pub mod utils;

mod context;
pub use context::{Context, Env, OsEnv, StaticEnv};
mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{SignRequest, SignatureMode, SignatureResult};
mod request;
pub use request::{Credential, ParamEncoding, SigningRequest};
