//! I/O: the HTTP client seam, the bounded fetch executor and the download
//! sink that streams a response to disk.

mod access;
mod http;
mod mock;
mod sink;

pub use access::{DEFAULT_MAX_CONCURRENT, FetchListener, FetchTask, NetworkAccess};
pub use http::{BoxStream, HttpClient, HttpResponse, ResponseBody};
pub use mock::{MockHttpClient, MockRoute};
pub use sink::{COPY_BUFFER_SIZE, DownloadSink};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
