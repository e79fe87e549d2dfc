use crate::FetchError;
use url::Url;

/// Validate the number of bytes copied from a response.
///
/// A known `declared` length that differs from `copied` means the transfer
/// was cut short. An empty body is rejected unless `allow_zero_length`.
pub fn check_copied_length(
    url: &Url,
    declared: Option<u64>,
    copied: u64,
    allow_zero_length: bool,
) -> Result<(), FetchError> {
    if let Some(expected) = declared
        && expected != copied
    {
        return Err(FetchError::Truncated {
            url: url.clone(),
            expected,
            actual: copied,
        });
    }

    if copied == 0 && !allow_zero_length {
        return Err(FetchError::EmptyBody { url: url.clone() });
    }

    Ok(())
}
