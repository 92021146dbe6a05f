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

//! Signer that delegates signature computation to the host application.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use qsign_core::time::{now, DateTime};
use qsign_core::{Error, Result, SignRequest, SignatureMode, SignatureResult, SigningRequest};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::canonical::{expires_at, header_string_to_sign, query_string_to_sign};
use crate::sign_request::{apply_signature, stage_request};

/// SignatureCallback completes one delegated signing operation.
///
/// Call [`SignatureCallback::finish`] exactly once, from any thread. Dropping
/// it without finishing fails the operation.
pub struct SignatureCallback {
    tx: oneshot::Sender<Result<SignatureResult>>,
    expires: Option<i64>,
}

impl SignatureCallback {
    /// Expiry timestamp embedded in the string to sign.
    ///
    /// Only set for query mode; handlers need it to build a
    /// [`SignatureResult::Query`].
    pub fn expires(&self) -> Option<i64> {
        self.expires
    }

    /// Deliver the signing result.
    pub fn finish(self, result: Result<SignatureResult>) {
        if self.tx.send(result).is_err() {
            debug!("signature delivered after the signing request was dropped");
        }
    }
}

impl Debug for SignatureCallback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureCallback")
            .field("expires", &self.expires)
            .finish()
    }
}

/// SignatureHandler turns a string to sign into a [`SignatureResult`].
///
/// The handler may answer inline or hand the work to another thread or a
/// remote service and call `done` later. It can be invoked concurrently
/// for different requests when the signer is shared.
pub trait SignatureHandler: Send + Sync + 'static {
    /// Sign `string_to_sign` for `req` and report through `done`.
    fn handle(
        &self,
        signer: &CustomizedSigner,
        string_to_sign: String,
        req: &SigningRequest,
        done: SignatureCallback,
    );
}

impl<F> SignatureHandler for F
where
    F: Fn(&CustomizedSigner, String, &SigningRequest, SignatureCallback) + Send + Sync + 'static,
{
    fn handle(
        &self,
        signer: &CustomizedSigner,
        string_to_sign: String,
        req: &SigningRequest,
        done: SignatureCallback,
    ) {
        self(signer, string_to_sign, req, done)
    }
}

/// CustomizedSigner builds the string to sign like [`crate::RequestSigner`]
/// but leaves the signature itself to a [`SignatureHandler`], so the secret
/// key can stay off this process.
///
/// The credential's secret access key is never read.
///
/// ## Blocking
///
/// The [`SignRequest`] methods block the calling thread until the handler
/// calls back. They must not be called from the thread that is expected to
/// deliver the callback. Called from a thread inside a tokio runtime they
/// fail with [`ErrorKind::DelegatedSigner`](qsign_core::ErrorKind) without
/// invoking the handler. Use the `*_async` variants from async code.
///
/// ## Example
///
/// ```
/// use qsign_core::hash::base64_hmac_sha256;
/// use qsign_core::{SignRequest, SignatureMode, SignatureResult, SigningRequest};
/// use qsign_qingstor::{CustomizedSigner, SignatureCallback};
/// use http::Method;
///
/// # fn main() -> qsign_core::Result<()> {
/// let handler = |_: &CustomizedSigner, s: String, _: &SigningRequest, done: SignatureCallback| {
///     // Usually a call to a remote signing service.
///     let result = base64_hmac_sha256(b"remote_secret", s.as_bytes()).map(|signature| {
///         SignatureResult::Header {
///             signature,
///             access_key_id: "remote_access_key".to_string(),
///         }
///     });
///     done.finish(result);
/// };
/// let signer = CustomizedSigner::new(SignatureMode::Header, handler);
///
/// let mut req = SigningRequest::new(Method::GET, "/bucket/object.txt");
/// signer.write_signature(&mut req)?;
/// assert!(req.headers.contains_key("authorization"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CustomizedSigner {
    mode: SignatureMode,
    handler: Arc<dyn SignatureHandler>,
    time: Option<DateTime>,
}

impl Debug for CustomizedSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomizedSigner")
            .field("mode", &self.mode)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

impl CustomizedSigner {
    /// Create a signer that delegates to `handler`.
    pub fn new(mode: SignatureMode, handler: impl SignatureHandler) -> Self {
        Self {
            mode,
            handler: Arc::new(handler),
            time: None,
        }
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

    fn dispatch(
        &self,
        string_to_sign: String,
        expires: Option<i64>,
        req: &SigningRequest,
    ) -> oneshot::Receiver<Result<SignatureResult>> {
        let (tx, rx) = oneshot::channel();
        self.handler.handle(self, string_to_sign, req, SignatureCallback { tx, expires });
        rx
    }

    fn dispatch_header(
        &self,
        req: &SigningRequest,
    ) -> Result<oneshot::Receiver<Result<SignatureResult>>> {
        let string_to_sign = header_string_to_sign(req, self.now())?;
        Ok(self.dispatch(string_to_sign, None, req))
    }

    fn dispatch_query(
        &self,
        req: &SigningRequest,
        expires_in: Duration,
    ) -> Result<oneshot::Receiver<Result<SignatureResult>>> {
        let expires = expires_at(req, self.now(), expires_in)?;
        let string_to_sign = query_string_to_sign(req, expires)?;
        Ok(self.dispatch(string_to_sign, Some(expires), req))
    }

    /// Async version of [`SignRequest::header_signature`].
    pub async fn header_signature_async(&self, req: &SigningRequest) -> Result<SignatureResult> {
        let rx = self.dispatch_header(req)?;
        received(rx.await)
    }

    /// Async version of [`SignRequest::query_signature`].
    pub async fn query_signature_async(
        &self,
        req: &SigningRequest,
        expires_in: Duration,
    ) -> Result<SignatureResult> {
        let rx = self.dispatch_query(req, expires_in)?;
        received(rx.await)
    }

    /// Async version of [`SignRequest::write_signature`].
    pub async fn write_signature_async(&self, req: &mut SigningRequest) -> Result<()> {
        let staged = stage_request(req, self.mode, self.now())?;
        let result = match self.mode {
            SignatureMode::Header => self.header_signature_async(&staged).await?,
            SignatureMode::Query(expires_in) => {
                self.query_signature_async(&staged, expires_in).await?
            }
        };

        apply_signature(req, staged, self.mode, result)
    }
}

impl SignRequest for CustomizedSigner {
    fn signature_mode(&self) -> SignatureMode {
        self.mode
    }

    fn header_signature(&self, req: &SigningRequest) -> Result<SignatureResult> {
        check_blocking_allowed()?;
        let rx = self.dispatch_header(req)?;
        received(rx.blocking_recv())
    }

    fn query_signature(
        &self,
        req: &SigningRequest,
        expires_in: Duration,
    ) -> Result<SignatureResult> {
        check_blocking_allowed()?;
        let rx = self.dispatch_query(req, expires_in)?;
        received(rx.blocking_recv())
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

/// Blocking on the callback would panic inside a tokio runtime.
fn check_blocking_allowed() -> Result<()> {
    if Handle::try_current().is_ok() {
        return Err(Error::delegated_signer(
            "blocking signature called inside a tokio runtime, use the async variant",
        ));
    }
    Ok(())
}

/// Handler errors are returned as is.
fn received(
    result: std::result::Result<Result<SignatureResult>, oneshot::error::RecvError>,
) -> Result<SignatureResult> {
    match result {
        Ok(result) => result,
        Err(err) => Err(
            Error::delegated_signer("signature handler dropped the callback without a result")
                .with_source(err),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use http::header::AUTHORIZATION;
    use http::Method;
    use pretty_assertions::assert_eq;
    use qsign_core::hash::base64_hmac_sha256;
    use qsign_core::{Credential, ErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::RequestSigner;

    const SECRET: &str = "123456";

    fn signed_time() -> DateTime {
        Utc.with_ymd_and_hms(2022, 8, 15, 16, 50, 12).unwrap()
    }

    fn test_request() -> Result<SigningRequest> {
        Ok(SigningRequest::new(Method::GET, "/bucket/object.txt?acl")
            .with_header("Date", "Mon, 15 Aug 2022 16:50:12 GMT")?
            .with_header("X-QS-Test", "1")?)
    }

    /// Signs locally the way a remote signing service would.
    fn local_handler(
        _: &CustomizedSigner,
        s: String,
        _: &SigningRequest,
        done: SignatureCallback,
    ) {
        let expires = done.expires();
        let result = base64_hmac_sha256(SECRET.as_bytes(), s.as_bytes()).map(|signature| {
            match expires {
                Some(expires) => SignatureResult::Query {
                    signature,
                    access_key_id: "access_key".to_string(),
                    expires,
                },
                None => SignatureResult::Header {
                    signature,
                    access_key_id: "access_key".to_string(),
                },
            }
        });
        done.finish(result);
    }

    #[test]
    fn test_matches_request_signer() -> Result<()> {
        let req = test_request()?;
        let local = RequestSigner::header();
        let delegated = CustomizedSigner::new(SignatureMode::Header, local_handler);

        let expected = local.header_signature(
            &req.clone()
                .with_credential(Credential::new("access_key", SECRET)),
        )?;
        // The secret never reaches the customized signer.
        assert_eq!(delegated.header_signature(&req)?, expected);

        let expected = local.query_signature(
            &req.clone()
                .with_credential(Credential::new("access_key", SECRET)),
            Duration::from_secs(500),
        )?;
        assert_eq!(
            delegated.query_signature(&req, Duration::from_secs(500))?,
            expected
        );
        Ok(())
    }

    #[test]
    fn test_callback_from_other_thread() -> Result<()> {
        let signer = CustomizedSigner::new(
            SignatureMode::Header,
            |_: &CustomizedSigner, s: String, _: &SigningRequest, done: SignatureCallback| {
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(20));
                    done.finish(Ok(SignatureResult::Authorization(format!(
                        "QS remote:{}",
                        s.len()
                    ))));
                });
            },
        )
        .with_time(signed_time());

        let mut req = test_request()?;
        signer.write_signature(&mut req)?;
        assert!(req.headers[AUTHORIZATION]
            .to_str()
            .unwrap()
            .starts_with("QS remote:"));
        Ok(())
    }

    #[test]
    fn test_mode_mismatch() -> Result<()> {
        let signer = CustomizedSigner::new(
            SignatureMode::Header,
            |_: &CustomizedSigner, _: String, _: &SigningRequest, done: SignatureCallback| {
                done.finish(Ok(SignatureResult::Query {
                    signature: "sig".to_string(),
                    access_key_id: "access_key".to_string(),
                    expires: 500,
                }));
            },
        );

        let mut req = test_request()?;
        let before = req.clone();
        let err = signer.write_signature(&mut req).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SignatureResultMismatch);
        assert_eq!(req.headers, before.headers);
        assert_eq!(req.path_and_query(), before.path_and_query());
        Ok(())
    }

    #[test]
    fn test_handler_error_is_propagated() -> Result<()> {
        let signer = CustomizedSigner::new(
            SignatureMode::Query(Duration::from_secs(60)),
            |_: &CustomizedSigner, _: String, _: &SigningRequest, done: SignatureCallback| {
                done.finish(Err(Error::delegated_signer("remote signer rejected key")));
            },
        );

        let mut req = test_request()?;
        let before = req.clone();
        let err = signer.write_signature(&mut req).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DelegatedSigner);
        assert!(err.to_string().contains("remote signer rejected key"));
        assert_eq!(req.path_and_query(), before.path_and_query());
        Ok(())
    }

    #[test]
    fn test_handler_drops_callback() -> Result<()> {
        let signer = CustomizedSigner::new(
            SignatureMode::Header,
            |_: &CustomizedSigner, _: String, _: &SigningRequest, _: SignatureCallback| {},
        );

        let err = signer.header_signature(&test_request()?).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DelegatedSigner);
        Ok(())
    }

    #[test]
    fn test_duplicate_shares_handler() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let signer = CustomizedSigner::new(
            SignatureMode::Header,
            move |_: &CustomizedSigner, _: String, _: &SigningRequest, done: SignatureCallback| {
                counter.fetch_add(1, Ordering::SeqCst);
                done.finish(Ok(SignatureResult::Authorization("QS a:b".to_string())));
            },
        );

        let dup = signer.duplicate();
        dup.write_signature(&mut test_request()?)?;
        signer.write_signature(&mut test_request()?)?;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(dup.signature_mode(), SignatureMode::Header);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_signature_async() -> Result<()> {
        let signer = CustomizedSigner::new(
            SignatureMode::Query(Duration::from_secs(500)),
            |_: &CustomizedSigner, s: String, _: &SigningRequest, done: SignatureCallback| {
                tokio::spawn(async move {
                    let expires = done.expires().unwrap_or_default();
                    let result = base64_hmac_sha256(SECRET.as_bytes(), s.as_bytes()).map(
                        |signature| SignatureResult::Query {
                            signature,
                            access_key_id: "access_key".to_string(),
                            expires,
                        },
                    );
                    done.finish(result);
                });
            },
        );

        let mut req = test_request()?;
        signer.write_signature_async(&mut req).await?;

        let expires = signed_time().timestamp() + 500;
        assert!(req.path_and_query().starts_with(&format!(
            "/bucket/object.txt?acl&access_key_id=access_key&expires={expires}&signature="
        )));
        Ok(())
    }

    #[tokio::test]
    async fn test_blocking_signature_inside_runtime() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let signer: Box<dyn SignRequest> = CustomizedSigner::new(
            SignatureMode::Header,
            move |_: &CustomizedSigner, _: String, _: &SigningRequest, done: SignatureCallback| {
                counter.fetch_add(1, Ordering::SeqCst);
                done.finish(Ok(SignatureResult::Authorization("QS a:b".to_string())));
            },
        )
        .duplicate();

        let mut req = test_request()?;
        let before = req.clone();
        let err = signer.write_signature(&mut req).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DelegatedSigner);
        assert_eq!(req.headers, before.headers);

        let err = signer
            .query_signature(&req, Duration::from_secs(60))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DelegatedSigner);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // The same signer works from a plain thread.
        let handle = std::thread::spawn(move || signer.write_signature(&mut req).map(|_| req));
        let req = handle.join().expect("signing thread must not panic")?;
        assert_eq!(req.headers[AUTHORIZATION], "QS a:b");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
