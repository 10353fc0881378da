//! The asynchronous fetch engine seam.
//!
//! [`FetchEngine`] is the contract the blocking bridge consumes: one
//! submission, one resolution. [`HttpEngine`] is the production
//! implementation over a plain [`HttpClient`], owning the walk across the
//! mirror list.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::{FetchRequest, Location};
use crate::error::{FetchError, Result};

mod http;

pub use http::HttpClient;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;

/// Result stream handed over by an engine. Exclusively owned by the
/// receiver from the moment it is returned.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Asynchronous fetch engine abstraction.
///
/// An engine schedules exactly one fetch per [`submit`] call and resolves
/// exactly once: with the result stream on success, or with a classified
/// error. Mirror selection and fallback across the priority-ordered list
/// belong to the engine, never to its callers. Engines are expected to
/// observe `cancel` and fail promptly with [`FetchError::Cancelled`].
///
/// [`submit`]: FetchEngine::submit
pub trait FetchEngine: Send + Sync {
    fn submit(
        &self,
        request: FetchRequest<'_>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ByteStream>> + Send;
}

/// HTTP-backed [`FetchEngine`].
///
/// Walks the request's mirrors strictly in list order and returns the
/// first stream that opens. Every failure falls through to the next
/// mirror except cancellation and an oversized Content-Length, which
/// abort the walk; when all mirrors fail, the last mirror's error is
/// surfaced.
pub struct HttpEngine<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> HttpEngine<C> {
    pub fn new(client: C) -> Self { Self { client } }
}

impl<C: HttpClient> FetchEngine for HttpEngine<C> {
    async fn submit(
        &self,
        request: FetchRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<ByteStream> {
        let mut last_err = None;

        for mirror in request.mirrors {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let target = match request.filename {
                Some(name) => mirror.join(name),
                None => mirror.clone(),
            };

            debug!(url = %target, priority = request.priority.0, "trying mirror");
            match self.open_bounded(&target, request.max_size, cancel).await {
                Ok(stream) => return Ok(stream),
                Err(err @ (FetchError::Cancelled | FetchError::SizeExceeded { .. })) => {
                    return Err(err);
                }
                Err(err) => {
                    debug!(url = %target, %err, "mirror failed");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| FetchError::Other("no mirrors to try".into())))
    }
}

impl<C: HttpClient> HttpEngine<C> {
    async fn open_bounded(
        &self,
        target: &Location,
        max_size: u64,
        cancel: &CancellationToken,
    ) -> Result<ByteStream> {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            opened = self.client.open(target.as_str()) => opened,
        };
        let (content_length, stream) = opened?;

        // Advertised length lets us refuse oversized content without
        // consuming the body; the bridge still enforces the ceiling on
        // the actual bytes.
        if max_size > 0
            && let Some(len) = content_length
            && len > max_size
        {
            return Err(FetchError::SizeExceeded { limit: max_size });
        }

        Ok(stream)
    }
}
