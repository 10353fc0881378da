//! Blocking operations over the asynchronous engine seam.
//!
//! Most of the surrounding tooling is written against plain synchronous
//! call conventions while the engine side is async; these two operations
//! are the seam between the models. Each call drives exactly one engine
//! submission to completion on a runtime private to the call, so unrelated
//! async work elsewhere in the process is neither starved nor depended on.

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::runtime;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::{FetchRequest, Location, Priority};
use crate::engine::{ByteStream, FetchEngine};
use crate::error::{FetchError, Result};

/// Knobs for one blocking fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOpts {
    /// Byte ceiling for the fetched content. Zero disables the ceiling.
    pub max_size: u64,
    /// Append a single zero byte after the content, for text payloads
    /// later handed to C-string consumers. The terminator is not counted
    /// against `max_size`.
    pub nul_terminate: bool,
    /// Treat "content absent at all mirrors" as a tolerated outcome:
    /// the call returns `Ok(None)` instead of [`FetchError::NotFound`].
    /// Every other error still propagates.
    pub allow_not_found: bool,
}

/// Fetch `filename` from an ordered list of candidate mirrors, blocking
/// until the content is buffered in memory.
///
/// The mirror list is tried by the engine in list order; which mirror
/// serves the content and how failures fall back across mirrors is engine
/// policy. With `filename` absent, each mirror entry is itself a complete
/// locator. The returned buffer is sealed: its length is final and, when
/// content was fetched, at most `opts.max_size` (plus the optional
/// terminator).
///
/// Cancellation is cooperative. A token already cancelled at entry fails
/// with [`FetchError::Cancelled`] before any resource is allocated or any
/// I/O happens; cancellation during the transfer aborts the copy and the
/// partial buffer is discarded, never returned.
///
/// Blocks the calling thread; must not be called from a thread that is
/// already driving an async runtime.
pub fn fetch_mirrored<E: FetchEngine>(
    engine: &E,
    mirrors: &[Location],
    filename: Option<&str>,
    opts: FetchOpts,
    cancel: &CancellationToken,
) -> Result<Option<Bytes>> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    if mirrors.is_empty() {
        return Err(FetchError::Other("empty mirror list".into()));
    }

    // Context private to this call: one submission runs to completion
    // here and nothing else is ever scheduled onto it.
    let rt = runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| FetchError::Other(format!("runtime setup failed: {e}")))?;

    let request = FetchRequest {
        mirrors,
        filename,
        max_size: opts.max_size,
        priority: Priority::DEFAULT,
    };

    debug!(mirrors = mirrors.len(), ?filename, max_size = opts.max_size, "fetching to membuf");

    rt.block_on(async {
        let stream = match engine.submit(request, cancel).await {
            Ok(stream) => stream,
            Err(FetchError::NotFound) if opts.allow_not_found => return Ok(None),
            Err(err) => return Err(err),
        };
        copy_bounded(stream, opts, cancel).await.map(Some)
    })
    // rt (and any stream still alive in an error path) drops here,
    // tearing the private context down on every exit.
}

/// Single-location convenience wrapper over [`fetch_mirrored`], for the
/// common case of one URI. No logic of its own.
pub fn fetch_uri<E: FetchEngine>(
    engine: &E,
    location: &Location,
    filename: Option<&str>,
    opts: FetchOpts,
    cancel: &CancellationToken,
) -> Result<Option<Bytes>> {
    fetch_mirrored(engine, std::slice::from_ref(location), filename, opts, cancel)
}

/// Drain `stream` into a growable buffer, enforcing the ceiling while
/// streaming: the copy fails as soon as the next chunk would push the
/// buffer past `opts.max_size`, never after buffering an oversized
/// payload.
async fn copy_bounded(
    mut stream: ByteStream,
    opts: FetchOpts,
    cancel: &CancellationToken,
) -> Result<Bytes> {
    let mut buf = BytesMut::new();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            chunk = stream.next() => chunk,
        };
        let Some(chunk) = chunk else { break };
        let chunk = chunk?;

        if opts.max_size > 0 && buf.len() as u64 + chunk.len() as u64 > opts.max_size {
            return Err(FetchError::SizeExceeded { limit: opts.max_size });
        }
        buf.extend_from_slice(&chunk);
    }

    if opts.nul_terminate {
        buf.put_u8(0);
    }

    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Script {
        Chunks(Vec<&'static [u8]>),
        NotFound,
        Refused(&'static str),
    }

    struct FakeEngine {
        script: Script,
        submits: AtomicUsize,
        chunks_served: Arc<AtomicUsize>,
        seen: Mutex<Vec<(usize, Option<String>)>>,
    }

    impl FakeEngine {
        fn new(script: Script) -> Self {
            Self {
                script,
                submits: AtomicUsize::new(0),
                chunks_served: Arc::new(AtomicUsize::new(0)),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn submits(&self) -> usize { self.submits.load(Ordering::SeqCst) }

        fn chunks_served(&self) -> usize { self.chunks_served.load(Ordering::SeqCst) }
    }

    impl FetchEngine for FakeEngine {
        async fn submit(
            &self,
            request: FetchRequest<'_>,
            _cancel: &CancellationToken,
        ) -> Result<ByteStream> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((request.mirrors.len(), request.filename.map(String::from)));

            match &self.script {
                Script::Chunks(chunks) => {
                    let served = Arc::clone(&self.chunks_served);
                    let stream = futures_util::stream::iter(chunks.clone())
                        .inspect(move |_| {
                            served.fetch_add(1, Ordering::SeqCst);
                        })
                        .map(|c| Ok(Bytes::from_static(c)));
                    Ok(Box::pin(stream) as ByteStream)
                }
                Script::NotFound => Err(FetchError::NotFound),
                Script::Refused(msg) => Err(FetchError::Transport(msg.to_string())),
            }
        }
    }

    fn mirrors(uris: &[&str]) -> Vec<Location> {
        uris.iter().map(|u| u.parse().unwrap()).collect()
    }

    fn opts(max_size: u64) -> FetchOpts {
        FetchOpts {
            max_size,
            ..FetchOpts::default()
        }
    }

    const PAYLOAD: &[u8] = b"summary: six commits, two branches, delta!"; // 42 bytes

    #[test]
    fn test_fetch_returns_complete_buffer() {
        let engine = FakeEngine::new(Script::Chunks(vec![&PAYLOAD[..20], &PAYLOAD[20..]]));
        let list = mirrors(&["https://a/"]);

        let out = fetch_mirrored(&engine, &list, Some("summary"), opts(1000), &CancellationToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(out.len(), 42);
        assert_eq!(&out[..], PAYLOAD);
        assert_eq!(engine.submits(), 1);
    }

    #[test]
    fn test_nul_termination_appends_single_zero() {
        let engine = FakeEngine::new(Script::Chunks(vec![PAYLOAD]));
        let list = mirrors(&["https://a/"]);
        let opts = FetchOpts {
            max_size: 1000,
            nul_terminate: true,
            ..FetchOpts::default()
        };

        let out = fetch_mirrored(&engine, &list, Some("summary"), opts, &CancellationToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(out.len(), 43);
        assert_eq!(&out[..PAYLOAD.len()], PAYLOAD);
        assert_eq!(out[PAYLOAD.len()], 0x00);
    }

    #[test]
    fn test_missing_content_tolerated() {
        let engine = FakeEngine::new(Script::NotFound);
        let list = mirrors(&["https://a/"]);
        let opts = FetchOpts {
            allow_not_found: true,
            ..opts(1000)
        };

        let out = fetch_mirrored(&engine, &list, Some("summary"), opts, &CancellationToken::new());

        assert!(matches!(out, Ok(None)));
    }

    #[test]
    fn test_missing_content_surfaces_without_tolerance() {
        let engine = FakeEngine::new(Script::NotFound);
        let list = mirrors(&["https://a/"]);

        let err =
            fetch_mirrored(&engine, &list, Some("summary"), opts(1000), &CancellationToken::new())
                .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_tolerance_keeps_other_errors() {
        let engine = FakeEngine::new(Script::Refused("tls handshake failed"));
        let list = mirrors(&["https://a/"]);
        let opts = FetchOpts {
            allow_not_found: true,
            ..opts(1000)
        };

        let err = fetch_mirrored(&engine, &list, Some("summary"), opts, &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_size_ceiling_aborts_streaming() {
        static CHUNK: [u8; 250] = [7u8; 250];
        let engine = FakeEngine::new(Script::Chunks(vec![&CHUNK[..]; 8])); // 2000 bytes
        let list = mirrors(&["https://a/"]);

        let err = fetch_mirrored(&engine, &list, Some("big"), opts(1000), &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(err, FetchError::SizeExceeded { limit: 1000 }));
        // The copy stopped at the chunk that crossed the ceiling; the
        // remaining source bytes were never pulled, let alone buffered.
        assert_eq!(engine.chunks_served(), 5);
    }

    #[test]
    fn test_content_exactly_at_ceiling_passes() {
        static CHUNK: [u8; 500] = [1u8; 500];
        let engine = FakeEngine::new(Script::Chunks(vec![&CHUNK[..]; 2]));
        let list = mirrors(&["https://a/"]);

        let out = fetch_mirrored(&engine, &list, None, opts(1000), &CancellationToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(out.len(), 1000);
    }

    #[test]
    fn test_zero_ceiling_means_unbounded() {
        static CHUNK: [u8; 1024] = [2u8; 1024];
        let engine = FakeEngine::new(Script::Chunks(vec![&CHUNK[..]; 64]));
        let list = mirrors(&["https://a/"]);

        let out = fetch_mirrored(&engine, &list, None, opts(0), &CancellationToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(out.len(), 64 * 1024);
    }

    #[test]
    fn test_pre_cancelled_token_fails_before_any_io() {
        let engine = FakeEngine::new(Script::Chunks(vec![PAYLOAD]));
        let list = mirrors(&["https://a/"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetch_mirrored(&engine, &list, Some("summary"), opts(1000), &cancel).unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
        assert_eq!(engine.submits(), 0);
    }

    #[test]
    fn test_cancellation_mid_copy_discards_partial_content() {
        struct CancelAfterFirstChunk;

        impl FetchEngine for CancelAfterFirstChunk {
            async fn submit(
                &self,
                _request: FetchRequest<'_>,
                cancel: &CancellationToken,
            ) -> Result<ByteStream> {
                let cancel = cancel.clone();
                let stream = futures_util::stream::iter(vec![
                    Bytes::from_static(b"first"),
                    Bytes::from_static(b"second"),
                ])
                .inspect(move |_| cancel.cancel())
                .map(Ok);
                Ok(Box::pin(stream) as ByteStream)
            }
        }

        let list = mirrors(&["https://a/"]);

        let err = fetch_mirrored(
            &CancelAfterFirstChunk,
            &list,
            None,
            opts(1000),
            &CancellationToken::new(),
        )
        .unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
    }

    #[test]
    fn test_identical_fetches_yield_identical_buffers() {
        let engine = FakeEngine::new(Script::Chunks(vec![&PAYLOAD[..7], &PAYLOAD[7..]]));
        let list = mirrors(&["https://a/", "https://b/"]);

        let first = fetch_mirrored(&engine, &list, Some("summary"), opts(1000), &CancellationToken::new())
            .unwrap()
            .unwrap();
        let second = fetch_mirrored(&engine, &list, Some("summary"), opts(1000), &CancellationToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.submits(), 2);
    }

    #[test]
    fn test_empty_mirror_list_is_rejected() {
        let engine = FakeEngine::new(Script::Chunks(vec![PAYLOAD]));

        let err = fetch_mirrored(&engine, &[], None, opts(1000), &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(err, FetchError::Other(_)));
        assert_eq!(engine.submits(), 0);
    }

    #[test]
    fn test_single_location_wrapper_delegates() {
        let engine = FakeEngine::new(Script::Chunks(vec![PAYLOAD]));
        let location: Location = "https://a.example/repo".parse().unwrap();

        let out = fetch_uri(&engine, &location, Some("config"), opts(1000), &CancellationToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(&out[..], PAYLOAD);
        assert_eq!(
            engine.seen.lock().unwrap().as_slice(),
            &[(1, Some("config".to_string()))]
        );
    }
}
