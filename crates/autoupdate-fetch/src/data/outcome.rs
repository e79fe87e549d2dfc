use crate::FetchError;
use url::Url;

/// The single terminal result of one fetch.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// The response was opened and the listener consumed it.
    Opened(T),
    /// [`FetchTask::cancel`](crate::FetchTask::cancel) was called first.
    Cancelled,
    /// The deadline passed while connecting or reading.
    TimedOut,
    /// Connecting, reading or the listener failed.
    Failed(FetchError),
}

impl<T> FetchOutcome<T> {
    pub(crate) fn from_error(err: FetchError) -> Self {
        match err {
            FetchError::TimedOut { .. } => FetchOutcome::TimedOut,
            FetchError::Cancelled { .. } => FetchOutcome::Cancelled,
            err => FetchOutcome::Failed(err),
        }
    }

    pub fn is_opened(&self) -> bool {
        matches!(self, FetchOutcome::Opened(_))
    }

    /// Convert into a `Result`, naming `url` in cancellation and timeout errors.
    pub fn into_result(self, url: &Url) -> Result<T, FetchError> {
        match self {
            FetchOutcome::Opened(value) => Ok(value),
            FetchOutcome::Cancelled => Err(FetchError::Cancelled { url: url.clone() }),
            FetchOutcome::TimedOut => Err(FetchError::TimedOut { url: url.clone() }),
            FetchOutcome::Failed(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://updates.example.org/catalog").unwrap()
    }

    #[test]
    fn test_from_error_keeps_timeout_and_cancel_distinct() {
        let timed_out = FetchOutcome::<()>::from_error(FetchError::TimedOut { url: url() });
        assert!(matches!(timed_out, FetchOutcome::TimedOut));

        let cancelled = FetchOutcome::<()>::from_error(FetchError::Cancelled { url: url() });
        assert!(matches!(cancelled, FetchOutcome::Cancelled));

        let failed = FetchOutcome::<()>::from_error(FetchError::EmptyBody { url: url() });
        assert!(matches!(failed, FetchOutcome::Failed(FetchError::EmptyBody { .. })));
    }

    #[test]
    fn test_into_result_names_url() {
        let err = FetchOutcome::<u64>::TimedOut.into_result(&url()).unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("updates.example.org"));

        let err = FetchOutcome::<u64>::Cancelled.into_result(&url()).unwrap_err();
        assert!(err.is_cancelled());

        assert_eq!(FetchOutcome::Opened(7u64).into_result(&url()).unwrap(), 7);
    }
}
