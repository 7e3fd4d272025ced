//! Body size limits.
//!
//! # Responsibilities
//! - Reject declared `content-length` values at or above the cap up front
//! - Count streamed request bytes and abort the stream at the cap
//! - Collect bodies into memory without ever exceeding the cap
//!
//! # Design Decisions
//! - A body *reaching* the cap is rejected, so the largest accepted body is `cap - 1`
//! - The streaming counter signals a trip through a shared flag, since the
//!   resulting transport error loses the original cause
//! - Request and response are limited independently

use axum::http::{header, HeaderMap};
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::error::ProxyError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Whether `len` bytes reach the cap.
pub fn reaches_limit(len: usize, limit: usize) -> bool {
    len >= limit
}

/// Reject a declared `content-length` that already reaches the cap.
pub fn check_declared_length(headers: &HeaderMap, limit: usize) -> Result<(), ProxyError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(len) if len >= limit as u64 => Err(ProxyError::PayloadTooLarge { limit }),
        _ => Ok(()),
    }
}

/// Error yielded by a size-limited body stream.
#[derive(Debug, Error)]
pub enum LimitedBodyError {
    #[error("body reached the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("body stream failed: {0}")]
    Stream(BoxError),
}

/// Set once a limited stream has hit its cap.
#[derive(Debug, Clone, Default)]
pub struct LimitTrip(Arc<AtomicBool>);

impl LimitTrip {
    /// Fresh, untripped flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stream sharing this flag reached its cap.
    pub fn is_tripped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn trip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Wrap a body stream with a byte counter.
///
/// Chunks pass through untouched until the running total reaches `limit`;
/// that chunk is replaced by an error, which makes the HTTP client abandon
/// the outbound request.
pub fn limit_stream<S, E>(
    stream: S,
    limit: usize,
    trip: LimitTrip,
) -> impl Stream<Item = Result<Bytes, LimitedBodyError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError>,
{
    let mut seen = 0usize;
    stream.map(move |chunk| {
        let chunk = chunk.map_err(|e| LimitedBodyError::Stream(e.into()))?;
        seen += chunk.len();
        if reaches_limit(seen, limit) {
            trip.trip();
            tracing::debug!(limit, seen, "Request body reached size limit");
            return Err(LimitedBodyError::TooLarge { limit });
        }
        Ok(chunk)
    })
}

/// Read a whole stream into memory, failing as soon as the cap is reached.
pub async fn collect_limited<S, E>(stream: S, limit: usize) -> Result<Bytes, ProxyError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    futures_util::pin_mut!(stream);
    let mut buf = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ProxyError::stream)?;
        if reaches_limit(buf.len() + chunk.len(), limit) {
            return Err(ProxyError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use futures_util::stream;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
        let items: Vec<Result<Bytes, std::io::Error>> =
            parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect();
        stream::iter(items)
    }

    #[test]
    fn test_declared_length() {
        let mut headers = HeaderMap::new();
        assert!(check_declared_length(&headers, 10).is_ok());

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("9"));
        assert!(check_declared_length(&headers, 10).is_ok());

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        assert!(matches!(
            check_declared_length(&headers, 10),
            Err(ProxyError::PayloadTooLarge { limit: 10 })
        ));
    }

    #[tokio::test]
    async fn test_limit_stream_passes_small_bodies() {
        let trip = LimitTrip::new();
        let out: Vec<_> = limit_stream(chunks(&["abc", "def"]), 10, trip.clone()).collect().await;
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.is_ok()));
        assert!(!trip.is_tripped());
    }

    #[tokio::test]
    async fn test_limit_stream_trips() {
        let trip = LimitTrip::new();
        let out: Vec<_> = limit_stream(chunks(&["abcd", "efgh", "ijkl"]), 8, trip.clone())
            .collect()
            .await;
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(LimitedBodyError::TooLarge { limit: 8 })));
        assert!(trip.is_tripped());
    }

    #[tokio::test]
    async fn test_collect_limited() {
        let body = collect_limited(chunks(&["hello", " ", "world"]), 100).await.unwrap();
        assert_eq!(&body[..], b"hello world");

        let err = collect_limited(chunks(&["hello", " ", "world"]), 11).await.unwrap_err();
        assert!(matches!(err, ProxyError::PayloadTooLarge { limit: 11 }));

        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"ok")),
            Err(std::io::Error::other("reset")),
        ]);
        let err = collect_limited(failing, 100).await.unwrap_err();
        assert!(matches!(err, ProxyError::Stream(_)));
    }
}
