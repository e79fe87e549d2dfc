use crate::FetchError;
use url::Url;

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Returns `true` if the HTTP status code is a redirect this crate follows.
///
/// Only 301 (Moved Permanently) and 302 (Found) are followed. Any other
/// non-2xx response, 3xx included, fails with
/// [`FetchError::Status`](crate::FetchError::Status).
///
/// ```
/// use autoupdate_fetch::is_redirect;
///
/// assert!(is_redirect(301));
/// assert!(is_redirect(302));
/// assert!(!is_redirect(307));
/// assert!(!is_redirect(200));
/// ```
pub fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302)
}

/// Resolve a `Location` header against the URL that produced it.
///
/// The target must stay on HTTP(S); anything else ends the chain.
pub fn resolve_redirect(current: &Url, location: &str) -> Result<Url, FetchError> {
    let invalid = || FetchError::InvalidRedirect {
        url:      current.clone(),
        location: location.to_string(),
    };

    let next = current.join(location.trim()).map_err(|_| invalid())?;
    match next.scheme() {
        "http" | "https" => Ok(next),
        _ => Err(invalid()),
    }
}
