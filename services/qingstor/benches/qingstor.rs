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

use std::time::Duration;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use once_cell::sync::Lazy;
use qsign_core::hash::base64_hmac_sha256;
use qsign_core::{Credential, SignRequest, SignatureMode, SignatureResult, SigningRequest};
use qsign_qingstor::{CustomizedSigner, RequestSigner, SignatureCallback};

criterion_group!(benches, bench);
criterion_main!(benches);

static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("must success")
});

fn request() -> SigningRequest {
    SigningRequest::new(http::Method::GET, "/bucket/hello?acl&upload_id=abc&other=1")
        .with_header("Date", "Mon, 15 Aug 2022 16:50:12 GMT")
        .expect("header must be valid")
        .with_header("X-QS-Meta-Name", "hello")
        .expect("header must be valid")
        .with_credential(Credential::new("access_key_id", "secret_access_key"))
}

fn local_handler(_: &CustomizedSigner, s: String, _: &SigningRequest, done: SignatureCallback) {
    let result = base64_hmac_sha256(b"secret_access_key", s.as_bytes()).map(|signature| {
        SignatureResult::Header {
            signature,
            access_key_id: "access_key_id".to_string(),
        }
    });
    done.finish(result);
}

pub fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("qingstor");

    group.bench_function("header", |b| {
        let s = RequestSigner::header();
        b.iter(|| {
            let mut req = request();
            s.write_signature(&mut req).expect("must success")
        })
    });

    group.bench_function("query", |b| {
        let s = RequestSigner::query(Duration::from_secs(3600));
        b.iter(|| {
            let mut req = request();
            s.write_signature(&mut req).expect("must success")
        })
    });

    group.bench_function("customized", |b| {
        let s = CustomizedSigner::new(SignatureMode::Header, local_handler);
        b.to_async(&*RUNTIME).iter(|| async {
            let mut req = request();
            s.write_signature_async(&mut req).await.expect("must success")
        })
    });

    group.finish();
}
