use std::future::Future;

use crate::engine::ByteStream;
use crate::error::Result;

/// Minimal HTTP surface an [`HttpEngine`] needs: open one URL, report the
/// advertised length, stream the body.
///
/// [`HttpEngine`]: crate::engine::HttpEngine
///
/// Implementations classify their native failures into the crate's error
/// taxonomy themselves; only the client can see whether an HTTP status
/// means "absent" or "broken".
pub trait HttpClient: Send + Sync {
    /// Open a streaming connection to `url`.
    ///
    /// Returns the Content-Length when the server advertises one, plus the
    /// body stream. A missing resource must surface as
    /// [`FetchError::NotFound`], any other request failure as
    /// [`FetchError::Transport`].
    ///
    /// [`FetchError::NotFound`]: crate::FetchError::NotFound
    /// [`FetchError::Transport`]: crate::FetchError::Transport
    fn open(&self, url: &str) -> impl Future<Output = Result<(Option<u64>, ByteStream)>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_client {
    use super::*;
    use crate::error::FetchError;
    use futures_util::StreamExt;
    use reqwest::{Client, StatusCode};

    /// Production HTTP client implementation using reqwest.
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self> {
            let client = Client::builder()
                .build()
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            Ok(Self { client })
        }
    }

    fn classify(err: reqwest::Error) -> FetchError {
        match err.status() {
            Some(StatusCode::NOT_FOUND | StatusCode::GONE) => FetchError::NotFound,
            _ => FetchError::Transport(err.to_string()),
        }
    }

    impl HttpClient for ReqwestClient {
        async fn open(&self, url: &str) -> Result<(Option<u64>, ByteStream)> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(classify)?;

            let content_length = response.content_length();
            let stream = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| FetchError::Transport(e.to_string())));

            Ok((content_length, Box::pin(stream) as ByteStream))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;
