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

//! Percent-encoding utils used by canonicalization.

use percent_encoding::percent_decode_str;
use percent_encoding::percent_encode_byte;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

/// Characters left untouched in query keys and values.
///
/// This is the URL query-safe set with every general and sub delimiter
/// (`:#[]@!$&'()*+,;=`) removed, so `&` and `=` can never leak into a
/// signed query unescaped.
pub static QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/')
    .remove(b'?');

/// Characters left untouched in the path of a canonical resource.
pub static PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b'-')
    .remove(b'.')
    .remove(b'/')
    .remove(b':')
    .remove(b'=')
    .remove(b'@')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a query key or value.
pub fn escape_query(s: &str) -> String {
    utf8_percent_encode(s, &QUERY_ENCODE_SET).to_string()
}

/// Percent-encode a resource path.
pub fn escape_path(s: &str) -> String {
    utf8_percent_encode(s, &PATH_ENCODE_SET).to_string()
}

/// Percent-encode only the non-ASCII bytes of `s`.
///
/// Header values may carry UTF-8 text but have to stay ASCII on the wire.
/// ASCII input, `%` included, is returned unchanged.
pub fn escape_non_ascii_only(s: &str) -> String {
    escape_non_ascii_bytes(s.as_bytes())
}

/// Percent-encode only the non-ASCII bytes of a raw header value.
///
/// Bytes are escaped one by one, so values that are not valid UTF-8 are
/// kept exactly.
pub fn escape_non_ascii_bytes(v: &[u8]) -> String {
    let mut out = String::with_capacity(v.len() * 3);
    for &b in v {
        if b.is_ascii() {
            out.push(b as char);
        } else {
            out.push_str(percent_encode_byte(b));
        }
    }
    out
}

/// Percent-decode `s`.
///
/// Malformed escapes are kept as they are and invalid UTF-8 is replaced
/// lossily, so this never fails.
pub fn unescape(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}
