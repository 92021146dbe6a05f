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

//! QingStor request signer
use std::time::Duration;

use http::header::AUTHORIZATION;
use http::header::DATE;
use http::HeaderValue;
use log::debug;
use qsign_core::escape::escape_query;
use qsign_core::hash::base64_hmac_sha256;
use qsign_core::time::{format_http_date, now, DateTime};
use qsign_core::{
    Credential, Error, Result, SignRequest, SignatureMode, SignatureResult, SigningRequest,
};

use crate::canonical::{
    escape_vendor_headers, expires_at, header_string_to_sign, query_string_to_sign,
};
use crate::constants::*;
use crate::Config;

/// RequestSigner signs requests with HMAC-SHA256 over the request's own
/// secret access key.
///
/// It carries no per-request state, so one signer can be shared by
/// concurrently signed requests.
///
/// ## Example
///
/// ```
/// use qsign_core::{Credential, SignRequest, SigningRequest};
/// use qsign_qingstor::RequestSigner;
/// use http::Method;
///
/// # fn main() -> qsign_core::Result<()> {
/// let signer = RequestSigner::header();
/// let mut req = SigningRequest::new(Method::GET, "/bucket/object.txt")
///     .with_credential(Credential::new("access_key_id", "secret_access_key"));
///
/// signer.write_signature(&mut req)?;
/// assert!(req.headers.contains_key("authorization"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestSigner {
    mode: SignatureMode,
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a signer with given signature mode.
    pub fn new(mode: SignatureMode) -> Self {
        Self { mode, time: None }
    }

    /// Create a signer that writes the `Authorization` header.
    pub fn header() -> Self {
        Self::new(SignatureMode::Header)
    }

    /// Create a signer that produces signed urls valid for `expires_in`.
    pub fn query(expires_in: Duration) -> Self {
        Self::new(SignatureMode::Query(expires_in))
    }

    /// Create a signer from config, returning the credential to attach to
    /// requests alongside it.
    pub fn from_config(config: &Config, mode: SignatureMode) -> (Self, Credential) {
        (Self::new(mode), config.credential())
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    fn now(&self) -> DateTime {
        self.time.unwrap_or_else(now)
    }
}

impl SignRequest for RequestSigner {
    fn signature_mode(&self) -> SignatureMode {
        self.mode
    }

    fn header_signature(&self, req: &SigningRequest) -> Result<SignatureResult> {
        check_credential(&req.credential)?;

        let string_to_sign = header_string_to_sign(req, self.now())?;
        let signature = base64_hmac_sha256(
            req.credential.secret_access_key.as_bytes(),
            string_to_sign.as_bytes(),
        )?;

        Ok(SignatureResult::Header {
            signature,
            access_key_id: req.credential.access_key_id.clone(),
        })
    }

    fn query_signature(
        &self,
        req: &SigningRequest,
        expires_in: Duration,
    ) -> Result<SignatureResult> {
        check_credential(&req.credential)?;

        let expires = expires_at(req, self.now(), expires_in)?;
        let string_to_sign = query_string_to_sign(req, expires)?;
        let signature = base64_hmac_sha256(
            req.credential.secret_access_key.as_bytes(),
            string_to_sign.as_bytes(),
        )?;

        Ok(SignatureResult::Query {
            signature,
            access_key_id: req.credential.access_key_id.clone(),
            expires,
        })
    }

    fn write_signature(&self, req: &mut SigningRequest) -> Result<()> {
        let staged = stage_request(req, self.mode, self.now())?;
        let result = match self.mode {
            SignatureMode::Header => self.header_signature(&staged)?,
            SignatureMode::Query(expires_in) => self.query_signature(&staged, expires_in)?,
        };

        apply_signature(req, staged, self.mode, result)
    }

    fn duplicate(&self) -> Box<dyn SignRequest> {
        Box::new(self.clone())
    }
}

fn check_credential(cred: &Credential) -> Result<()> {
    if cred.access_key_id.is_empty() {
        return Err(Error::signature_configuration("access key id is empty"));
    }
    if cred.secret_access_key.is_empty() {
        return Err(Error::signature_configuration("secret access key is empty"));
    }
    Ok(())
}

/// Prepare a copy of `req` for signing.
///
/// `x-qs-` header values are escaped and, in header mode, a `Date` header
/// is added when missing so the signed date is the one sent.
pub(crate) fn stage_request(
    req: &SigningRequest,
    mode: SignatureMode,
    now: DateTime,
) -> Result<SigningRequest> {
    let mut staged = req.clone();
    escape_vendor_headers(&mut staged.headers)?;

    if mode == SignatureMode::Header && !staged.headers.contains_key(DATE) {
        staged
            .headers
            .insert(DATE, HeaderValue::from_str(&format_http_date(now))?);
    }

    Ok(staged)
}

/// Write `result` into `staged` and commit it into `req`.
///
/// `req` is only replaced once everything succeeded.
pub(crate) fn apply_signature(
    req: &mut SigningRequest,
    mut staged: SigningRequest,
    mode: SignatureMode,
    result: SignatureResult,
) -> Result<()> {
    if !result.matches(mode) {
        return Err(Error::signature_result_mismatch(format!(
            "signer in {} mode returned a {} signature",
            mode_name(mode),
            result_name(&result)
        )));
    }

    match result {
        SignatureResult::Header {
            signature,
            access_key_id,
        } => {
            let value = format!("{AUTHORIZATION_SCHEME} {access_key_id}:{signature}");
            staged.headers.insert(AUTHORIZATION, sensitive_value(&value)?);
        }
        SignatureResult::Authorization(value) => {
            staged.headers.insert(AUTHORIZATION, sensitive_value(&value)?);
        }
        SignatureResult::Query {
            signature,
            access_key_id,
            expires,
        } => {
            let access_key_id = escape_query(&access_key_id);
            let expires = expires.to_string();
            let signature = escape_query(&signature);
            // Signing pairs always end the url.
            staged.fold_params_into_query();
            staged.query_replace(&[
                (QUERY_ACCESS_KEY_ID, access_key_id.as_str()),
                (QUERY_EXPIRES, expires.as_str()),
                (QUERY_SIGNATURE, signature.as_str()),
            ]);
        }
    }

    debug!("request signed in {} mode", mode_name(mode));
    *req = staged;
    Ok(())
}

fn sensitive_value(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)?;
    value.set_sensitive(true);
    Ok(value)
}

fn mode_name(mode: SignatureMode) -> &'static str {
    match mode {
        SignatureMode::Header => "header",
        SignatureMode::Query(_) => "query",
    }
}

fn result_name(result: &SignatureResult) -> &'static str {
    match result {
        SignatureResult::Query { .. } => "query",
        SignatureResult::Header { .. } => "header",
        SignatureResult::Authorization(_) => "authorization",
    }
}
