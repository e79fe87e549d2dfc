use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single retrieval: where to fetch from and how long to wait.
///
/// The timeout applies to the socket (connect and read) and to opening the
/// response, including every redirect hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url:     Url,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Certificate and hostname acceptance for HTTPS connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TlsPolicy {
    /// Validate certificates and hostnames.
    #[default]
    Strict,
    /// Accept any server certificate and any hostname.
    ///
    /// Keeps catalogs reachable behind broken or intercepting TLS setups at
    /// the cost of all transport authentication.
    AcceptAll,
}
