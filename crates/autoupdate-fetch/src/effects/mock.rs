use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use super::http::{HttpClient, HttpResponse, ResponseBody};
use crate::FetchError;

/// Scripted response for one URL of a [`MockHttpClient`].
#[derive(Debug, Clone)]
pub enum MockRoute {
    /// Serve `chunks`, declaring `content_length` (`None` for unknown).
    Body {
        chunks:         Vec<Bytes>,
        content_length: Option<u64>,
    },
    Redirect {
        status:   u16,
        location: String,
    },
    Status(u16),
    /// Fail to connect with the given message.
    Fail(String),
    /// Never answer.
    Stall,
    /// Wait, then answer with the inner route.
    Delayed(Duration, Box<MockRoute>),
}

impl MockRoute {
    /// A body with a correctly declared length.
    pub fn body(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        MockRoute::Body {
            content_length: Some(data.len() as u64),
            chunks:         vec![data],
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    routes:     Mutex<HashMap<String, MockRoute>>,
    hits:       Mutex<HashMap<String, usize>>,
    in_flight:  AtomicUsize,
    peak:       AtomicUsize,
}

/// Mock HTTP client for testing.
///
/// Clones share routes and counters, so a test can keep a handle after
/// moving the client into a [`NetworkAccess`](crate::NetworkAccess). Routes
/// can be replaced at any time. Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    state: Arc<MockState>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, route: MockRoute) {
        lock(&self.state.routes).insert(normalize(url), route);
    }

    pub fn serve(&self, url: &str, body: impl Into<Bytes>) {
        self.route(url, MockRoute::body(body));
    }

    /// Answer `url` with a 302 pointing at `location`.
    pub fn redirect(&self, url: &str, location: &str) {
        self.route(
            url,
            MockRoute::Redirect {
                status:   302,
                location: location.to_string(),
            },
        );
    }

    /// Requests made for `url` so far.
    pub fn hits(&self, url: &str) -> usize {
        lock(&self.state.hits).get(&normalize(url)).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        lock(&self.state.hits).values().sum()
    }

    /// Highest number of requests that were in progress at once.
    pub fn peak_in_flight(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }
}

impl HttpClient for MockHttpClient {
    async fn get(&self, url: &Url, _timeout: Duration) -> Result<HttpResponse, FetchError> {
        let _in_flight = InFlight::enter(&self.state);

        *lock(&self.state.hits).entry(url.as_str().to_string()).or_default() += 1;
        let mut route = lock(&self.state.routes)
            .get(url.as_str())
            .cloned()
            .unwrap_or(MockRoute::Status(404));

        loop {
            route = match route {
                MockRoute::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    *inner
                }
                MockRoute::Stall => std::future::pending::<MockRoute>().await,
                MockRoute::Status(status) => {
                    return Err(FetchError::Status {
                        url: url.clone(),
                        status,
                    });
                }
                MockRoute::Fail(message) => {
                    return Err(FetchError::Transport {
                        url:    url.clone(),
                        source: Box::new(io::Error::new(io::ErrorKind::ConnectionRefused, message)),
                    });
                }
                MockRoute::Redirect { status, location } => {
                    return Ok(HttpResponse::Redirect { status, location });
                }
                MockRoute::Body {
                    chunks,
                    content_length,
                } => {
                    let stream = futures_util::stream::iter(chunks.into_iter().map(Ok));
                    return Ok(HttpResponse::Body(ResponseBody::new(
                        content_length,
                        Box::pin(stream),
                    )));
                }
            };
        }
    }
}

struct InFlight<'a>(&'a MockState);

impl<'a> InFlight<'a> {
    fn enter(state: &'a MockState) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.peak.fetch_max(now, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
