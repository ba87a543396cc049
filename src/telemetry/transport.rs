//! # Cellular Transport
//!
//! Network transport collaborator: brings up the mobile data link once at
//! startup and carries the heartbeat form POSTs. Both operations block the
//! control loop until they return; the tracker does no other work meanwhile.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Mobile network credentials (APN, username, password)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub apn: &'static str,
    pub username: &'static str,
    pub password: &'static str,
}

/// Credentials for the SIM's carrier
pub const APN_CREDENTIALS: Credentials = Credentials {
    apn: "smart",
    username: "web",
    password: "web",
};

/// Request could not be sent at all (no route, DNS, timeout)
const CODE_SEND: i32 = 1;
/// Server answered with a non-success HTTP status
const CODE_HTTP: i32 = 2;
/// Response arrived but its body could not be read
const CODE_BODY: i32 = 3;

/// Transport failures, carrying the transport's numeric error code and the
/// HTTP status when a response was received at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Mobile link bring-up failure
    #[error("Could not connect: {0}")]
    Connect(String),

    /// POST failed after a response arrived
    #[error("Error: {code}, HTTP return code: {status}")]
    Post { code: i32, status: u16 },

    /// POST failed before any response arrived
    #[error("Error: {code}, no HTTP response")]
    PostNoResponse { code: i32 },
}

impl TransportError {
    /// The transport's numeric error code (0 for connect failures)
    pub fn code(&self) -> i32 {
        match self {
            TransportError::Connect(_) => 0,
            TransportError::Post { code, .. } => *code,
            TransportError::PostNoResponse { code } => *code,
        }
    }

    /// The HTTP status code, when a response was received
    pub fn http_status(&self) -> Option<u16> {
        match self {
            TransportError::Post { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Network transport collaborator contract.
///
/// `connect` is called repeatedly by the tracker until it succeeds; its
/// internal retry semantics are its own business. `post_form` submits an
/// ordered urlencoded form and returns the raw response body.
#[async_trait]
pub trait Transport: Send {
    /// Bring up the data link. Blocking; the caller retries on failure.
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError>;

    /// Form-POST `form` to `url`, returning the response body
    async fn post_form(
        &mut self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<String, TransportError>;
}

/// URL fetched once after link bring-up to confirm the data path works
const LINK_CHECK_URL: &str = "http://httpbin.org/get";

/// Transport over the cellular modem's data link.
///
/// The PPP session itself is managed by the OS once the modem enumerates;
/// `connect` records the credentials and verifies end-to-end reachability
/// with a probe request.
pub struct CellularTransport {
    client: reqwest::Client,
}

impl CellularTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for CellularTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for CellularTransport {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        info!("Connecting to mobile network (APN: {})", credentials.apn);

        let response = self
            .client
            .get(LINK_CHECK_URL)
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Connect(format!(
                "link check returned HTTP {}",
                response.status().as_u16()
            )));
        }

        Ok(())
    }

    async fn post_form(
        &mut self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<String, TransportError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                debug!("POST transport failure: {}", e);
                TransportError::PostNoResponse { code: CODE_SEND }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Post {
                code: CODE_HTTP,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            debug!("POST body read failure: {}", e);
            TransportError::PostNoResponse { code: CODE_BODY }
        })
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted transport for control-loop and publisher tests.
    ///
    /// Connect outcomes are popped from `connect_script` (empty queue means
    /// success); POST outcomes from `post_script`. Every POST is recorded
    /// with its URL and form pairs.
    pub struct MockTransport {
        pub connect_script: VecDeque<Result<(), TransportError>>,
        pub post_script: VecDeque<Result<String, TransportError>>,
        pub connect_calls: usize,
        pub posts: Vec<(String, Vec<(String, String)>)>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                connect_script: VecDeque::new(),
                post_script: VecDeque::new(),
                connect_calls: 0,
                posts: Vec::new(),
            }
        }

        /// Script `count` connect failures before the eventual success
        pub fn fail_connects(&mut self, count: usize) {
            for _ in 0..count {
                self.connect_script
                    .push_back(Err(TransportError::Connect("no carrier".to_string())));
            }
        }

        /// Script the next POST to succeed with the given response body
        pub fn respond_with(&mut self, body: &str) {
            self.post_script.push_back(Ok(body.to_string()));
        }

        /// Script the next POST to fail
        pub fn fail_next_post(&mut self, error: TransportError) {
            self.post_script.push_back(Err(error));
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn connect(&mut self, _credentials: &Credentials) -> Result<(), TransportError> {
            self.connect_calls += 1;
            self.connect_script.pop_front().unwrap_or(Ok(()))
        }

        async fn post_form(
            &mut self,
            url: &str,
            form: &[(&'static str, String)],
        ) -> Result<String, TransportError> {
            self.posts.push((
                url.to_string(),
                form.iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
            self.post_script
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }
}
