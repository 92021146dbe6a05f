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

// Env values used in qingstor services.
pub const QINGSTOR_ACCESS_KEY_ID: &str = "QINGSTOR_ACCESS_KEY_ID";
pub const QINGSTOR_SECRET_ACCESS_KEY: &str = "QINGSTOR_SECRET_ACCESS_KEY";

// Headers used in qingstor services.
pub const X_QS_PREFIX: &str = "x-qs-";
pub const CONTENT_MD5: &str = "content-md5";

// Scheme of the `Authorization` header value.
pub const AUTHORIZATION_SCHEME: &str = "QS";

// Query keys written by query signing.
pub const QUERY_ACCESS_KEY_ID: &str = "access_key_id";
pub const QUERY_EXPIRES: &str = "expires";
pub const QUERY_SIGNATURE: &str = "signature";
