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

//! QingStor signing implementation for qsign.
//!
//! QingStor authenticates requests with an HMAC-SHA256 signature over a
//! canonical string built from the method, `Content-MD5`, `Content-Type`,
//! the date (or expiry), every `x-qs-` header and the canonical resource.
//!
//! ## Signing modes
//!
//! - [`SignatureMode::Header`](qsign_core::SignatureMode::Header) writes
//!   `Authorization: QS <access_key_id>:<signature>`.
//! - [`SignatureMode::Query`](qsign_core::SignatureMode::Query) appends
//!   `access_key_id`, `expires` and `signature` to the query so the URL can
//!   be shared without credentials.
//!
//! ## Quick Start
//!
//! ```
//! use qsign_core::{Context, SignRequest, SignatureMode, SigningRequest};
//! use qsign_qingstor::{Config, RequestSigner};
//! use http::Method;
//!
//! # fn main() -> qsign_core::Result<()> {
//! let config = Config::new()
//!     .with_access_key_id("ACCESS_KEY_ID_EXAMPLE")
//!     .with_secret_access_key("SECRET_ACCESS_KEY_EXAMPLE")
//!     .from_env(&Context::new());
//! let (signer, cred) = RequestSigner::from_config(&config, SignatureMode::Header);
//!
//! let mut req = SigningRequest::new(Method::GET, "/bucket/object.txt?acl")
//!     .with_credential(cred);
//! signer.write_signature(&mut req)?;
//!
//! let auth = req.headers["authorization"].to_str().unwrap_or_default();
//! assert!(auth.starts_with("QS ACCESS_KEY_ID_EXAMPLE:"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Delegated signing
//!
//! [`CustomizedSigner`] builds the same string to sign and hands it to a
//! [`SignatureHandler`], which can forward it to a signing service that
//! holds the secret key.

#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

pub mod canonical;

mod sign_request;
pub use sign_request::RequestSigner;

mod customized;
pub use customized::CustomizedSigner;
pub use customized::SignatureCallback;
pub use customized::SignatureHandler;
