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

//! Canonicalization and string to sign for QingStor requests.

use std::collections::HashSet;
use std::fmt::Write;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use http::header::DATE;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use log::debug;
use once_cell::sync::Lazy;
use qsign_core::escape::{escape_non_ascii_bytes, escape_path, unescape};
use qsign_core::params::build_query_string;
use qsign_core::time::{format_http_date, parse_http_date, DateTime};
use qsign_core::{Error, ParamEncoding, Result, SigningRequest};

use crate::constants::*;

/// Construct string to sign for header mode.
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// Content-MD5 + "\n" +
/// Content-Type + "\n" +
/// Date + "\n" +
/// CanonicalizedHeaders +
/// CanonicalizedResource;
/// ```
///
/// `now` is only used when the request has no `Date` header.
pub fn header_string_to_sign(req: &SigningRequest, now: DateTime) -> Result<String> {
    let mut s = String::new();
    writeln!(&mut s, "{}", req.method.as_str())?;
    writeln!(&mut s, "{}", req.header_str(CONTENT_MD5).unwrap_or_default())?;
    writeln!(&mut s, "{}", req.header_str(CONTENT_TYPE.as_str()).unwrap_or_default())?;
    match req.header_str(DATE.as_str()) {
        Some(date) => writeln!(&mut s, "{date}")?,
        None => writeln!(&mut s, "{}", format_http_date(now))?,
    }
    s.write_str(&canonicalize_headers(&req.headers))?;
    s.write_str(&canonicalize_resource(req))?;

    debug!("header string to sign: {}", &s);
    Ok(s)
}

/// Construct string to sign for query mode.
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// "\n" +
/// "\n" +
/// Expires + "\n" +
/// CanonicalizedHeaders +
/// CanonicalizedResource;
/// ```
///
/// Content-MD5 and Content-Type are always left blank so signed urls work
/// without them.
pub fn query_string_to_sign(req: &SigningRequest, expires: i64) -> Result<String> {
    let mut s = String::new();
    writeln!(&mut s, "{}", req.method.as_str())?;
    s.write_str("\n\n")?;
    writeln!(&mut s, "{expires}")?;
    s.write_str(&canonicalize_headers(&req.headers))?;
    s.write_str(&canonicalize_resource(req))?;

    debug!("query string to sign: {}", &s);
    Ok(s)
}

/// Compute the expiry timestamp of a signed url.
///
/// Counted from the `Date` header if present, otherwise from `now`.
pub fn expires_at(req: &SigningRequest, now: DateTime, expires_in: Duration) -> Result<i64> {
    let start = match req.header_str(DATE.as_str()) {
        Some(date) => parse_http_date(&date)?,
        None => now,
    };

    i64::try_from(expires_in.as_secs())
        .ok()
        .and_then(|secs| start.timestamp().checked_add(secs))
        .ok_or_else(|| Error::request_invalid("signature expires time overflows"))
}

/// Build the canonicalized headers block.
///
/// Only `x-qs-` headers take part. Each one becomes `name:value\n` with
/// the value trimmed and its non-ASCII bytes escaped, sorted by name.
/// Repeated headers are folded into one line, values joined by `,` in the
/// order they were added.
pub fn canonicalize_headers(headers: &HeaderMap) -> String {
    let mut names: Vec<&str> = headers
        .keys()
        .map(|k| k.as_str())
        .filter(|k| k.starts_with(X_QS_PREFIX))
        .collect();
    names.sort_unstable();

    let mut s = String::with_capacity(16);
    for name in names {
        let value = headers
            .get_all(name)
            .iter()
            .map(|v| escape_non_ascii_bytes(v.as_bytes()).trim().to_string())
            .collect::<Vec<_>>()
            .join(",");

        s.push_str(name);
        s.push(':');
        s.push_str(&value);
        s.push('\n');
    }
    s
}

/// Escape the non-ASCII bytes of every `x-qs-` header value in place.
///
/// Headers leave signing already encoded for transport.
pub fn escape_vendor_headers(headers: &mut HeaderMap) -> Result<()> {
    let names: Vec<HeaderName> = headers
        .keys()
        .filter(|k| k.as_str().starts_with(X_QS_PREFIX))
        .filter(|k| headers.get_all(*k).iter().any(|v| !v.as_bytes().is_ascii()))
        .cloned()
        .collect();

    for name in names {
        let values = headers
            .get_all(&name)
            .iter()
            .map(|v| HeaderValue::from_str(&escape_non_ascii_bytes(v.as_bytes())))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        headers.remove(&name);
        for value in values {
            headers.append(name.clone(), value);
        }
    }
    Ok(())
}

/// Build the canonicalized resource.
///
/// The query is filtered down to the keys in [`SUBRESOURCES`], keeping
/// their original order, and percent decoded. Only the path is escaped.
pub fn canonicalize_resource(req: &SigningRequest) -> String {
    let mut query = req.query.clone();
    if req.encoding == ParamEncoding::Query {
        let (_, params) = build_query_string(&req.params, false);
        if !params.is_empty() {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&params);
        }
    }

    let signed = query
        .split('&')
        .filter(|p| is_sub_resource(p.split_once('=').map_or(*p, |(k, _)| k)))
        .collect::<Vec<_>>()
        .join("&");
    let signed = unescape(&signed);
    let path = escape_path(&req.path);

    if signed.is_empty() {
        path
    } else {
        format!("{path}?{signed}")
    }
}

fn is_sub_resource(param: &str) -> bool {
    SUBRESOURCES.contains(param)
}

/// Query keys that take part in the canonicalized resource.
///
/// Please attention: the subresources are case sensitive.
pub static SUBRESOURCES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "acl",
        "cors",
        "delete",
        "mirror",
        "part_number",
        "policy",
        "stats",
        "upload_id",
        "uploads",
        "logging",
        "notification",
        "image",
        "response-expires",
        "response-cache-control",
        "response-content-type",
        "response-content-language",
        "response-content-encoding",
        "response-content-disposition",
    ])
});
