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

//! Request parameter tree and the canonical query builder.

use std::collections::BTreeMap;

use crate::escape::escape_query;

/// Request parameters keyed by name.
pub type Params = BTreeMap<String, ParamValue>;

/// Flattened parameters, sorted by key.
pub type FlatParams = BTreeMap<String, String>;

/// A single request parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    Float(f64),
    /// A boolean value, serialized as `1` or `0`.
    Bool(bool),
    /// A list flattened as `key.1`, `key.2`, ...
    Array(Vec<ParamValue>),
    /// A nested map flattened as `key.nested`.
    Map(Params),
}

impl ParamValue {
    fn flatten_into(&self, key: String, out: &mut FlatParams) {
        match self {
            ParamValue::String(v) => {
                out.insert(key, v.clone());
            }
            ParamValue::Integer(v) => {
                out.insert(key, v.to_string());
            }
            ParamValue::Float(v) => {
                out.insert(key, v.to_string());
            }
            ParamValue::Bool(v) => {
                out.insert(key, if *v { "1" } else { "0" }.to_string());
            }
            ParamValue::Array(values) => {
                for (idx, v) in values.iter().enumerate() {
                    v.flatten_into(format!("{key}.{}", idx + 1), out);
                }
            }
            ParamValue::Map(params) => {
                for (k, v) in params {
                    v.flatten_into(format!("{key}.{k}"), out);
                }
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Params> for ParamValue {
    fn from(v: Params) -> Self {
        ParamValue::Map(v)
    }
}

/// Flatten a parameter tree into scalar `key=value` pairs.
///
/// Nested maps produce `parent.child` keys and arrays produce 1-based
/// `parent.1`, `parent.2`, ... keys.
pub fn flatten(params: &Params) -> FlatParams {
    let mut out = FlatParams::new();
    for (k, v) in params {
        v.flatten_into(k.clone(), &mut out);
    }
    out
}

/// Build the canonical query string of `params`.
///
/// Returns the flattened parameters together with the query string so the
/// caller can reuse them; the input is never modified.
///
/// Keys are sorted by byte order. `=value` is omitted when the value is
/// empty. With `escaped` set, keys and values go through [`escape_query`],
/// otherwise they are joined raw.
///
/// ```shell
/// {"a": ["x", "y"], "b": {"c": "1"}} => "a.1=x&a.2=y&b.c=1"
/// ```
pub fn build_query_string(params: &Params, escaped: bool) -> (FlatParams, String) {
    let flat = flatten(params);

    let mut s = String::with_capacity(16);
    for (idx, (k, v)) in flat.iter().enumerate() {
        if idx != 0 {
            s.push('&');
        }

        if escaped {
            s.push_str(&escape_query(k));
            let v = escape_query(v);
            if !v.is_empty() {
                s.push('=');
                s.push_str(&v);
            }
        } else {
            s.push_str(k);
            if !v.is_empty() {
                s.push('=');
                s.push_str(v);
            }
        }
    }

    (flat, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_query_string_nested() {
        let params = Params::from([
            ("a".to_string(), ParamValue::from(vec!["x", "y"])),
            (
                "b".to_string(),
                ParamValue::from(Params::from([("c".to_string(), ParamValue::from("1"))])),
            ),
        ]);

        let (flat, query) = build_query_string(&params, false);
        assert_eq!(query, "a.1=x&a.2=y&b.c=1");
        assert_eq!(flat.len(), 3);
        assert_eq!(flat.get("a.2").map(String::as_str), Some("y"));
    }

    #[test]
    fn test_build_query_string_scalars() {
        let params = Params::from([
            ("limit".to_string(), ParamValue::from(100i64)),
            ("ratio".to_string(), ParamValue::from(0.5f64)),
            ("acl".to_string(), ParamValue::from("")),
            ("versioned".to_string(), ParamValue::from(true)),
            ("deleted".to_string(), ParamValue::from(false)),
        ]);

        let (_, query) = build_query_string(&params, false);
        assert_eq!(query, "acl&deleted=0&limit=100&ratio=0.5&versioned=1");
    }

    #[test]
    fn test_build_query_string_escaped() {
        let params = Params::from([
            ("prefix".to_string(), ParamValue::from("photos/2024 summer")),
            ("marker".to_string(), ParamValue::from("a&b=c")),
        ]);

        let (flat, query) = build_query_string(&params, true);
        assert_eq!(query, "marker=a%26b%3Dc&prefix=photos/2024%20summer");
        // The flattened form is always raw.
        assert_eq!(flat.get("marker").map(String::as_str), Some("a&b=c"));
    }

    #[test]
    fn test_build_query_string_sorts_after_flattening() {
        let params = Params::from([(
            "list".to_string(),
            ParamValue::from((1..=10).map(|v| v as i64).collect::<Vec<_>>()),
        )]);

        let (_, query) = build_query_string(&params, false);
        // Byte order: "list.10" sorts before "list.2".
        assert!(query.starts_with("list.1=1&list.10=10&list.2=2"));
    }

    #[test]
    fn test_build_query_string_empty() {
        let (flat, query) = build_query_string(&Params::new(), true);
        assert!(flat.is_empty());
        assert_eq!(query, "");
    }

    #[test]
    fn test_flatten_deeply_nested() {
        let inner = Params::from([(
            "rules".to_string(),
            ParamValue::Array(vec![ParamValue::Map(Params::from([(
                "id".to_string(),
                ParamValue::from("r1"),
            )]))]),
        )]);
        let params = Params::from([("lifecycle".to_string(), ParamValue::Map(inner))]);

        let flat = flatten(&params);
        assert_eq!(
            flat.into_iter().collect::<Vec<_>>(),
            vec![("lifecycle.rules.1.id".to_string(), "r1".to_string())]
        );
    }
}
