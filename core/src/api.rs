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

use std::fmt::Debug;
use std::time::Duration;

use crate::{Result, SigningRequest};

/// SignatureMode decides how the signature is delivered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignatureMode {
    /// Sign once and attach the result as an `Authorization` header.
    Header,
    /// Embed the signature into the url query, valid for the given duration.
    ///
    /// Only whole seconds are used.
    Query(Duration),
}

/// SignatureResult is what a signer produces for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureResult {
    /// Signature for a signed url.
    Query {
        /// Base64 signature, not escaped.
        signature: String,
        /// Access key id the signature was made with.
        access_key_id: String,
        /// Unix timestamp after which the url is rejected.
        expires: i64,
    },
    /// Signature for the `Authorization` header.
    Header {
        /// Base64 signature.
        signature: String,
        /// Access key id the signature was made with.
        access_key_id: String,
    },
    /// A complete `Authorization` header value.
    Authorization(String),
}

impl SignatureResult {
    /// Check whether this result can be delivered in `mode`.
    ///
    /// `Header` mode accepts `Header` and `Authorization` results, `Query`
    /// mode only accepts `Query` results.
    pub fn matches(&self, mode: SignatureMode) -> bool {
        match (self, mode) {
            (SignatureResult::Query { .. }, SignatureMode::Query(_)) => true,
            (SignatureResult::Header { .. }, SignatureMode::Header) => true,
            (SignatureResult::Authorization(_), SignatureMode::Header) => true,
            _ => false,
        }
    }
}

/// SignRequest is the capability of signing a [`SigningRequest`].
///
/// Implementations compute signatures and know how to attach them back
/// onto the request. A failed call must leave the request untouched.
pub trait SignRequest: Debug + Send + Sync + 'static {
    /// Mode used by [`SignRequest::write_signature`].
    fn signature_mode(&self) -> SignatureMode;

    /// Compute the header mode signature of `req`.
    fn header_signature(&self, req: &SigningRequest) -> Result<SignatureResult>;

    /// Compute the query mode signature of `req`, expiring `expires_in`
    /// after the request date.
    fn query_signature(&self, req: &SigningRequest, expires_in: Duration)
        -> Result<SignatureResult>;

    /// Sign `req` in the configured mode and write the result into it.
    fn write_signature(&self, req: &mut SigningRequest) -> Result<()>;

    /// Create an independent signer with the same mode and keys.
    ///
    /// Use this to hand one signer to each in-flight request.
    fn duplicate(&self) -> Box<dyn SignRequest>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_result_matches() {
        let query = SignatureResult::Query {
            signature: "sig".to_string(),
            access_key_id: "ak".to_string(),
            expires: 500,
        };
        let header = SignatureResult::Header {
            signature: "sig".to_string(),
            access_key_id: "ak".to_string(),
        };
        let raw = SignatureResult::Authorization("QS ak:sig".to_string());
        let query_mode = SignatureMode::Query(Duration::from_secs(500));

        assert!(query.matches(query_mode));
        assert!(!query.matches(SignatureMode::Header));
        assert!(header.matches(SignatureMode::Header));
        assert!(!header.matches(query_mode));
        assert!(raw.matches(SignatureMode::Header));
        assert!(!raw.matches(query_mode));
    }
}
