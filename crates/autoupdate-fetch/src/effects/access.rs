use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use super::http::{HttpClient, HttpResponse, ResponseBody};
use crate::core::{MAX_REDIRECTS, is_redirect, resolve_redirect};
use crate::{FetchError, FetchOutcome, FetchRequest};

/// Fetches allowed to connect and read at the same time.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Consumes the body of a successfully opened response.
///
/// Called at most once per fetch, on the worker task. Whatever it returns
/// becomes the fetch's [`FetchOutcome::Opened`] value; an error becomes
/// [`FetchOutcome::Failed`].
pub trait FetchListener: Send + 'static {
    type Output: Send + 'static;

    fn stream_opened(
        self,
        url: &Url,
        body: ResponseBody,
    ) -> impl Future<Output = Result<Self::Output, FetchError>> + Send;
}

/// Runs single-shot fetches on a bounded pool of worker tasks.
///
/// No retries happen here; callers decide what to do with a timeout, a
/// cancellation or a failure.
pub struct NetworkAccess<C> {
    client:  Arc<C>,
    permits: Arc<Semaphore>,
}

impl<C> Clone for NetworkAccess<C> {
    fn clone(&self) -> Self {
        Self {
            client:  Arc::clone(&self.client),
            permits: Arc::clone(&self.permits),
        }
    }
}

impl<C: HttpClient + 'static> NetworkAccess<C> {
    pub fn new(client: C) -> Self {
        Self::with_max_concurrent(client, DEFAULT_MAX_CONCURRENT)
    }

    pub fn with_max_concurrent(client: C, max_concurrent: usize) -> Self {
        Self {
            client:  Arc::new(client),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Start one fetch. Never fails here: every error is delivered through
    /// the returned task's outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<L: FetchListener>(&self, request: FetchRequest, listener: L) -> FetchTask<L::Output> {
        let url = request.url.clone();
        let cancel = Arc::new(Notify::new());
        debug!(%url, timeout_ms = request.timeout.as_millis() as u64, "submitting fetch");

        let handle = tokio::spawn(run(
            Arc::clone(&self.client),
            Arc::clone(&self.permits),
            request,
            listener,
            Arc::clone(&cancel),
        ));

        FetchTask {
            url,
            cancel,
            handle,
        }
    }

    /// Submit and wait, converting the outcome into a `Result`.
    pub async fn fetch<L: FetchListener>(
        &self,
        request: FetchRequest,
        listener: L,
    ) -> Result<L::Output, FetchError> {
        let task = self.submit(request, listener);
        let url = task.url().clone();
        task.wait().await.into_result(&url)
    }
}

/// Handle to one submitted fetch.
///
/// Dropping the handle detaches the fetch; it still runs to completion.
#[derive(Debug)]
pub struct FetchTask<T> {
    url:    Url,
    cancel: Arc<Notify>,
    handle: JoinHandle<FetchOutcome<T>>,
}

impl<T> FetchTask<T> {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Abort the connect or copy in progress. The outcome becomes
    /// [`FetchOutcome::Cancelled`] unless the fetch already finished.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait until the fetch has finished and take its outcome.
    pub async fn wait(self) -> FetchOutcome<T> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) => FetchOutcome::Failed(FetchError::Worker(err.to_string())),
        }
    }
}

async fn run<C: HttpClient, L: FetchListener>(
    client: Arc<C>,
    permits: Arc<Semaphore>,
    request: FetchRequest,
    listener: L,
    cancel: Arc<Notify>,
) -> FetchOutcome<L::Output> {
    let FetchRequest { url, timeout } = request;

    // Waiting for a pool slot counts against the deadline, like waiting for
    // the connection itself.
    let open = async {
        let permit = permits
            .acquire_owned()
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))?;
        let body = open_following_redirects(client.as_ref(), &url, timeout).await?;
        Ok::<_, FetchError>((permit, body))
    };

    let (_permit, body) = tokio::select! {
        _ = cancel.notified() => {
            debug!(%url, "fetch cancelled while connecting");
            return FetchOutcome::Cancelled;
        }
        opened = tokio::time::timeout(timeout, open) => match opened {
            Err(_) => {
                debug!(%url, "fetch timed out while connecting");
                return FetchOutcome::TimedOut;
            }
            Ok(Err(err)) => {
                debug!(%url, error = %err, "fetch failed while connecting");
                return FetchOutcome::from_error(err);
            }
            Ok(Ok(opened)) => opened,
        },
    };

    debug!(%url, content_length = ?body.content_length(), "stream opened");

    tokio::select! {
        _ = cancel.notified() => {
            debug!(%url, "fetch cancelled while reading");
            FetchOutcome::Cancelled
        }
        copied = listener.stream_opened(&url, body) => match copied {
            Ok(value) => FetchOutcome::Opened(value),
            Err(err) => {
                debug!(%url, error = %err, "fetch failed while reading");
                FetchOutcome::from_error(err)
            }
        },
    }
}

async fn open_following_redirects<C: HttpClient>(
    client: &C,
    url: &Url,
    timeout: Duration,
) -> Result<ResponseBody, FetchError> {
    let mut current = url.clone();

    for hop in 0..=MAX_REDIRECTS {
        match client.get(&current, timeout).await? {
            HttpResponse::Body(body) => return Ok(body),
            HttpResponse::Redirect { status, .. } if !is_redirect(status) => {
                return Err(FetchError::Status {
                    url: current,
                    status,
                });
            }
            HttpResponse::Redirect { status, location } => {
                let next = resolve_redirect(&current, &location)?;
                debug!(from = %current, to = %next, status, hop = hop + 1, "following redirect");
                current = next;
            }
        }
    }

    warn!(%url, "giving up after {MAX_REDIRECTS} redirects");
    Err(FetchError::TooManyRedirects { url: url.clone() })
}
