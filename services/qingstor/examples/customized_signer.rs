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

//! Sign a request through a signing service that holds the secret key.
//!
//! The "service" here is a worker thread fed through a channel.

use std::sync::mpsc;
use std::thread;

use anyhow::Result;
use http::Method;
use qsign_core::hash::base64_hmac_sha256;
use qsign_core::{SignRequest, SignatureMode, SignatureResult, SigningRequest};
use qsign_qingstor::{CustomizedSigner, SignatureCallback};

fn main() -> Result<()> {
    env_logger::init();

    let (tx, rx) = mpsc::channel::<(String, SignatureCallback)>();
    let worker = thread::spawn(move || {
        for (string_to_sign, done) in rx {
            let result = base64_hmac_sha256(b"SECRET_ACCESS_KEY_EXAMPLE", string_to_sign.as_bytes())
                .map(|signature| SignatureResult::Header {
                    signature,
                    access_key_id: "ACCESS_KEY_ID_EXAMPLE".to_string(),
                });
            done.finish(result);
        }
    });

    let signer = CustomizedSigner::new(
        SignatureMode::Header,
        move |_: &CustomizedSigner, s: String, _: &SigningRequest, done: SignatureCallback| {
            if let Err(mpsc::SendError((_, done))) = tx.send((s, done)) {
                done.finish(Err(qsign_core::Error::delegated_signer(
                    "signing service is gone",
                )));
            }
        },
    );

    let mut req = SigningRequest::new(Method::GET, "/bucket/object.txt?acl")
        .with_header("X-QS-Meta-Owner", "example")?;
    signer.write_signature(&mut req)?;

    println!("{}", req.path_and_query());
    for (name, value) in req.headers.iter() {
        println!("{}: {}", name, value.to_str()?);
    }

    drop(signer);
    let _ = worker.join();
    Ok(())
}
