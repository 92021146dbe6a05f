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

use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use http::header::HeaderName;
use http::uri::PathAndQuery;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::escape::{escape_path, unescape};
use crate::params::{build_query_string, ParamValue, Params};
use crate::utils::Redact;
use crate::Result;

/// Credential that holds the access key id and secret access key.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key, only ever used as HMAC key material.
    pub secret_access_key: String,
}

impl Credential {
    /// Create a new credential.
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
        }
    }

    /// Check if both the access key id and the secret access key are set.
    pub fn is_valid(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .finish()
    }
}

/// Where request parameters travel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ParamEncoding {
    /// Parameters are sent in the url query and take part in signing.
    #[default]
    Query,
    /// Parameters are sent as a JSON body and are ignored by signing.
    Json,
}

/// SigningRequest describes one request that is about to be signed.
///
/// It is created per call, mutated once by a signer and then handed to
/// the transport. Callers must not modify it while signing is running.
#[derive(Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// Raw (unescaped) path.
    pub path: String,
    /// Literal query without the leading `?`, already transport-encoded.
    pub query: String,
    /// Request parameters.
    pub params: Params,
    /// How `params` travel.
    pub encoding: ParamEncoding,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// Whether the request carries a body.
    pub has_body: bool,
    /// Credential used to sign this request.
    pub credential: Credential,
}

impl Debug for SigningRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("encoding", &self.encoding)
            .field("headers", &self.headers)
            .field("has_body", &self.has_body)
            .field("credential", &self.credential)
            .finish()
    }
}

impl SigningRequest {
    /// Create a new request description without params, headers or body.
    ///
    /// `uri` is a raw path, optionally followed by `?` and a literal query.
    /// It is split at the first `?`, so a path containing `?` must be set
    /// through [`SigningRequest::path`] directly.
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        Self {
            method,
            path: path.to_string(),
            query: query.to_string(),
            params: Params::new(),
            encoding: ParamEncoding::default(),
            headers: HeaderMap::new(),
            has_body: false,
            credential: Credential::default(),
        }
    }

    /// Set a request parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the parameter encoding.
    pub fn with_encoding(mut self, encoding: ParamEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set a header.
    ///
    /// The value may contain raw UTF-8; vendor headers are escaped during
    /// signing.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.headers.insert(
            HeaderName::from_str(name)?,
            HeaderValue::from_bytes(value.as_bytes())?,
        );
        Ok(self)
    }

    /// Mark the request as carrying a body.
    pub fn with_body(mut self, has_body: bool) -> Self {
        self.has_body = has_body;
        self
    }

    /// Set the credential.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Get header value by name.
    ///
    /// Returns `None` if header not found. Non UTF-8 bytes are replaced.
    pub fn header_str(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
    }

    /// Append `key=value` pairs to the literal query.
    ///
    /// Keys and values must already be escaped. Existing pairs with the
    /// same keys are removed first so the result stays unique.
    pub fn query_replace(&mut self, pairs: &[(&str, &str)]) {
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        let mut query: Vec<String> = self
            .query
            .split('&')
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let key = p.split_once('=').map_or(*p, |(k, _)| k);
                !keys.contains(&key)
            })
            .map(|p| p.to_string())
            .collect();
        query.extend(pairs.iter().map(|(k, v)| {
            if v.is_empty() {
                k.to_string()
            } else {
                format!("{k}={v}")
            }
        }));

        self.query = query.join("&");
    }

    /// Move query encoded params into the literal query.
    ///
    /// Params are escaped and appended, then cleared. Does nothing when
    /// params travel in the body.
    pub fn fold_params_into_query(&mut self) {
        if self.encoding != ParamEncoding::Query || self.params.is_empty() {
            return;
        }

        let (_, params) = build_query_string(&self.params, true);
        if !params.is_empty() {
            if !self.query.is_empty() {
                self.query.push('&');
            }
            self.query.push_str(&params);
        }
        self.params.clear();
    }

    /// Build the path and query sent on the wire.
    ///
    /// The path is escaped, the literal query is kept and escaped params are
    /// appended when they travel in the query.
    pub fn path_and_query(&self) -> String {
        let mut s = escape_path(&self.path);

        let mut query = self.query.clone();
        if self.encoding == ParamEncoding::Query {
            let (_, params) = build_query_string(&self.params, true);
            if !params.is_empty() {
                if !query.is_empty() {
                    query.push('&');
                }
                query.push_str(&params);
            }
        }

        if !query.is_empty() {
            s.push('?');
            s.push_str(&query);
        }
        s
    }

    /// Build a signing request from http::request::Parts.
    ///
    /// The path is percent decoded and the query is kept as is. Params and
    /// credential are left empty.
    pub fn build(parts: &http::request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: unescape(parts.uri.path()),
            query: parts.uri.query().unwrap_or_default().to_string(),
            params: Params::new(),
            encoding: ParamEncoding::Query,
            headers: parts.headers.clone(),
            has_body: false,
            credential: Credential::default(),
        }
    }

    /// Apply the signing request back to http::request::Parts.
    ///
    /// Scheme and authority of `parts.uri` are kept.
    pub fn apply(&self, parts: &mut http::request::Parts) -> Result<()> {
        parts.method = self.method.clone();
        parts.headers = self.headers.clone();
        parts.uri = {
            let mut uri_parts = std::mem::take(&mut parts.uri).into_parts();
            uri_parts.path_and_query = Some(PathAndQuery::from_str(&self.path_and_query())?);
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }
}
