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

use std::fmt::{Debug, Formatter};

use qsign_core::utils::Redact;
use qsign_core::{Context, Credential};

use crate::constants::*;

/// Config carries all the configuration for QingStor signing.
#[derive(Clone, Default)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINGSTOR_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINGSTOR_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .finish()
    }
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set access_key_id
    pub fn with_access_key_id(mut self, access_key_id: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self
    }

    /// Set secret_access_key
    pub fn with_secret_access_key(mut self, secret_access_key: impl Into<String>) -> Self {
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(QINGSTOR_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(QINGSTOR_SECRET_ACCESS_KEY) {
            self.secret_access_key.get_or_insert(v);
        }

        self
    }

    /// Build the credential to attach to requests.
    ///
    /// Missing values become empty strings; signing such a request fails
    /// with a signature configuration error.
    pub fn credential(&self) -> Credential {
        Credential {
            access_key_id: self.access_key_id.clone().unwrap_or_default(),
            secret_access_key: self.secret_access_key.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsign_core::StaticEnv;
    use std::collections::HashMap;

    fn static_ctx(envs: &[(&str, &str)]) -> Context {
        Context::new().with_env(StaticEnv {
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
    }

    #[test]
    fn test_config_from_env() {
        let ctx = static_ctx(&[
            (QINGSTOR_ACCESS_KEY_ID, "env_access_key"),
            (QINGSTOR_SECRET_ACCESS_KEY, "env_secret_key"),
        ]);

        let config = Config::new().from_env(&ctx);
        assert_eq!(config.access_key_id.as_deref(), Some("env_access_key"));
        assert_eq!(config.secret_access_key.as_deref(), Some("env_secret_key"));
        assert!(config.credential().is_valid());
    }

    #[test]
    fn test_config_fields_take_precedence() {
        let ctx = static_ctx(&[
            (QINGSTOR_ACCESS_KEY_ID, "env_access_key"),
            (QINGSTOR_SECRET_ACCESS_KEY, "env_secret_key"),
        ]);

        let config = Config::new()
            .with_access_key_id("field_access_key")
            .from_env(&ctx);
        assert_eq!(config.access_key_id.as_deref(), Some("field_access_key"));
        assert_eq!(config.secret_access_key.as_deref(), Some("env_secret_key"));
    }

    #[test]
    fn test_config_missing_secret() {
        let ctx = static_ctx(&[(QINGSTOR_ACCESS_KEY_ID, "env_access_key")]);

        let config = Config::new().from_env(&ctx);
        let cred = config.credential();
        assert_eq!(cred.access_key_id, "env_access_key");
        assert_eq!(cred.secret_access_key, "");
        assert!(!cred.is_valid());
    }

    #[test]
    fn test_config_debug_is_redacted() {
        let config = Config::new()
            .with_access_key_id("ACCESS_KEY_ID_EXAMPLE")
            .with_secret_access_key("SECRET_ACCESS_KEY_EXAMPLE");
        let s = format!("{config:?}");
        assert!(!s.contains("SECRET_ACCESS_KEY_EXAMPLE"));
    }
}
