//! Bounded, cancellable HTTP fetches for autoupdate catalogs.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable requests, TLS policy and fetch outcomes
//! - [`core`] - Pure decisions: redirects, length validation
//! - [`effects`] - I/O: the [`HttpClient`] seam, [`NetworkAccess`], [`DownloadSink`]
//!
//! # Key Features
//!
//! - **Single outcome**: every submitted fetch ends in exactly one of opened,
//!   cancelled, timed out or failed, delivered through a [`FetchTask`]
//! - **Bounded**: a fixed number of fetches connect and read at once
//! - **Redirect cap**: 301/302 chains are followed for at most
//!   [`MAX_REDIRECTS`] hops, on HTTP(S) only
//! - **Mechanism-only**: no retries; callers decide what a failure means

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use crate::core::{MAX_REDIRECTS, check_copied_length, is_redirect, resolve_redirect};
pub use data::{DEFAULT_TIMEOUT, FetchOutcome, FetchRequest, TlsPolicy};
pub use effects::{
    BoxStream, COPY_BUFFER_SIZE, DEFAULT_MAX_CONCURRENT, DownloadSink, FetchListener, FetchTask,
    HttpClient, HttpResponse, MockHttpClient, MockRoute, NetworkAccess, ResponseBody,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{BoxError, FetchError};
