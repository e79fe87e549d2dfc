use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use url::Url;

use crate::FetchError;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// An opened response body and the length the server declared for it.
pub struct ResponseBody {
    content_length: Option<u64>,
    stream:         BoxStream<'static, io::Result<Bytes>>,
}

impl ResponseBody {
    pub fn new(content_length: Option<u64>, stream: BoxStream<'static, io::Result<Bytes>>) -> Self {
        Self {
            content_length,
            stream,
        }
    }

    /// `None` when the server did not declare a length.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.stream
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// What a single request produced.
#[derive(Debug)]
pub enum HttpResponse {
    /// A followable redirect; `location` is the raw header value.
    Redirect { status: u16, location: String },
    /// A successful response whose body is ready to stream.
    Body(ResponseBody),
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations issue exactly one GET per call and must not follow
/// redirects themselves; [`NetworkAccess`](crate::NetworkAccess) owns the
/// redirect chain so the hop limit holds for every client. `timeout` bounds
/// both connecting and each read.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - [`MockHttpClient`](crate::MockHttpClient): scripted responses for tests
pub trait HttpClient: Send + Sync {
    fn get(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse, FetchError>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use futures_util::StreamExt;
    use reqwest::header::LOCATION;
    use reqwest::redirect::Policy;
    use tracing::debug;

    use super::*;
    use crate::TlsPolicy;
    use crate::core::is_redirect;

    /// Production HTTP client implementation using reqwest.
    ///
    /// One underlying client is built per distinct timeout, since reqwest
    /// fixes connect and read timeouts at build time.
    #[derive(Debug, Default)]
    pub struct ReqwestClient {
        tls:     TlsPolicy,
        clients: Mutex<HashMap<Duration, reqwest::Client>>,
    }

    impl ReqwestClient {
        pub fn new(tls: TlsPolicy) -> Self {
            Self {
                tls,
                clients: Mutex::new(HashMap::new()),
            }
        }

        pub fn tls(&self) -> TlsPolicy {
            self.tls
        }

        fn client(&self, url: &Url, timeout: Duration) -> Result<reqwest::Client, FetchError> {
            let mut clients = self
                .clients
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(client) = clients.get(&timeout) {
                return Ok(client.clone());
            }

            let mut builder = reqwest::Client::builder()
                .redirect(Policy::none())
                .connect_timeout(timeout)
                .read_timeout(timeout);
            if self.tls == TlsPolicy::AcceptAll {
                builder = builder
                    .danger_accept_invalid_certs(true)
                    .danger_accept_invalid_hostnames(true);
            }

            let client = builder.build().map_err(|e| transport_error(url, e))?;
            debug!(timeout_ms = timeout.as_millis() as u64, tls = ?self.tls, "built HTTP client");
            clients.insert(timeout, client.clone());
            Ok(client)
        }
    }

    impl HttpClient for ReqwestClient {
        async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, FetchError> {
            let client = self.client(url, timeout)?;
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| transport_error(url, e))?;

            let status = response.status();
            if is_redirect(status.as_u16()) {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| FetchError::InvalidRedirect {
                        url:      url.clone(),
                        location: String::new(),
                    })?;
                return Ok(HttpResponse::Redirect {
                    status:   status.as_u16(),
                    location: location.to_string(),
                });
            }
            // Unfollowed 3xx included: such a body is never content.
            if !status.is_success() {
                return Err(FetchError::Status {
                    url:    url.clone(),
                    status: status.as_u16(),
                });
            }

            let content_length = response.content_length();
            let stream = response.bytes_stream().map(|chunk| {
                chunk.map_err(|e| {
                    if e.is_timeout() {
                        io::Error::new(io::ErrorKind::TimedOut, e)
                    } else {
                        io::Error::other(e)
                    }
                })
            });

            Ok(HttpResponse::Body(ResponseBody::new(
                content_length,
                Box::pin(stream),
            )))
        }
    }

    fn transport_error(url: &Url, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::TimedOut { url: url.clone() }
        } else {
            FetchError::Transport {
                url:    url.clone(),
                source: Box::new(err),
            }
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
