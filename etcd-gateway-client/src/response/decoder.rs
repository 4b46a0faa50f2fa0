//! Incremental decoding of streaming response bodies.
//!
//! This module provides [`JsonStreamDecoder`]: a stream adapter that frames
//! a raw byte stream into the gateway's concatenated JSON objects and
//! yields one decoded model per object.
//!
//! The decoder is strictly pull-based. Nothing reads ahead: the underlying
//! byte source is polled only when the buffer does not already hold a
//! complete object, so backpressure falls out of the consumer's pace. When
//! several objects arrive in one network read they are still yielded one
//! per poll.

use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use etcd_gateway_core::ObjectScanner;
use futures::Stream;
use serde::de::DeserializeOwned;

use crate::ClientError;
use crate::response::decode_json;

/// Stream adapter decoding concatenated JSON objects into typed models.
///
/// Wraps a byte stream (the chunked HTTP response body) and yields one `T`
/// per complete top-level JSON object, buffering partial data across chunk
/// boundaries. The source stream is owned exclusively for the life of the
/// decoder and is released when the decoder is dropped or [`close`]d.
///
/// After the source ends, a buffer holding only whitespace means a clean
/// end of stream; anything else fails with
/// [`ClientError::TruncatedStream`]. Errors end the stream: once an item
/// has yielded `Err`, every later poll returns `None`.
///
/// [`close`]: JsonStreamDecoder::close
pub struct JsonStreamDecoder<S, T> {
    /// The underlying byte stream. `None` once closed.
    source: Option<S>,
    /// Buffered bytes not yet framed into an object.
    buffer: BytesMut,
    /// Boundary scanner state, resumed across chunks.
    scanner: ObjectScanner,
    /// Whether the stream has finished (source end, error, or close).
    finished: bool,
    /// Type marker for the decoded model.
    _marker: PhantomData<T>,
}

impl<S, T> JsonStreamDecoder<S, T> {
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            buffer: BytesMut::new(),
            scanner: ObjectScanner::new(),
            finished: false,
            _marker: PhantomData,
        }
    }

    /// Release the underlying source eagerly.
    ///
    /// Dropping the source closes the transport connection, so a consumer
    /// abandoning the stream mid-iteration stops the peer promptly instead
    /// of waiting for the decoder itself to go out of scope. Idempotent;
    /// safe before exhaustion and after. Later polls return `None` and
    /// never touch the source again.
    pub fn close(&mut self) {
        self.source = None;
        self.buffer.clear();
        self.finished = true;
    }

    /// Whether the stream has finished (exhausted, failed, or closed).
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Split the next complete object off the buffer, if one is there.
    fn try_split_object(&mut self) -> Result<Option<Bytes>, ClientError> {
        match self.scanner.scan(&self.buffer)? {
            Some(end) => {
                let object = self.buffer.split_to(end).freeze();
                self.scanner.consume(end);
                Ok(Some(object))
            }
            None => Ok(None),
        }
    }
}

impl<S, T> Unpin for JsonStreamDecoder<S, T> where S: Unpin {}

impl<S, T> Stream for JsonStreamDecoder<S, T>
where
    S: Stream<Item = Result<Bytes, ClientError>> + Unpin,
    T: DeserializeOwned,
{
    type Item = Result<T, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            // Frame and decode from the buffer before touching the source.
            match this.try_split_object() {
                Ok(Some(object)) => {
                    return match decode_json::<T>(&object) {
                        Ok(model) => Poll::Ready(Some(Ok(model))),
                        Err(e) => {
                            this.finished = true;
                            Poll::Ready(Some(Err(e)))
                        }
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
            }

            let Some(source) = this.source.as_mut() else {
                this.finished = true;
                return Poll::Ready(None);
            };

            match Pin::new(source).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.buffer.extend_from_slice(&chunk);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    this.source = None;
                    if this.scanner.in_value() {
                        let residue =
                            this.buffer.len() - this.scanner.value_start().unwrap_or(0);
                        return Poll::Ready(Some(Err(ClientError::TruncatedStream { residue })));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    return Poll::Pending;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::stream;
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn chunked(chunks: Vec<&[u8]>) -> impl Stream<Item = Result<Bytes, ClientError>> + Unpin {
        stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn three_objects_in_one_chunk() {
        let source = chunked(vec![br#"{"a":1}{"a":2}{"a":3}"#]);
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

        for expected in 1..=3 {
            let value = decoder.next().await.unwrap().unwrap();
            assert_eq!(value["a"], expected);
        }
        assert!(decoder.next().await.is_none());
        assert!(decoder.is_finished());
    }

    #[tokio::test]
    async fn objects_split_at_every_offset() {
        let input: &[u8] = br#"{"a":1}{"a":2}{"a":3}"#;
        for split in 1..input.len() {
            let source = chunked(vec![&input[..split], &input[split..]]);
            let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

            for expected in 1..=3 {
                let value = decoder.next().await.unwrap().unwrap();
                assert_eq!(value["a"], expected, "split at {split}");
            }
            assert!(decoder.next().await.is_none(), "split at {split}");
        }
    }

    #[tokio::test]
    async fn split_inside_string_value() {
        // The brace inside the string must not close the object, and the
        // split lands in the middle of that string.
        let source = chunked(vec![br#"{"a":"x}"#, br#"y"}{"b":2}"#]);
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

        assert_eq!(decoder.next().await.unwrap().unwrap()["a"], "x}y");
        assert_eq!(decoder.next().await.unwrap().unwrap()["b"], 2);
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn whitespace_only_chunks_between_objects() {
        let source = chunked(vec![br#"{"a":1}"#, b"  \r\n", b"\t", br#"{"a":2}"#, b"\n"]);
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

        assert_eq!(decoder.next().await.unwrap().unwrap()["a"], 1);
        assert_eq!(decoder.next().await.unwrap().unwrap()["a"], 2);
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_source_ends_cleanly() {
        let source = chunked(vec![]);
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn truncated_stream_fails_after_complete_objects() {
        let source = chunked(vec![br#"{"a":1}{"a":2"#]);
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

        assert_eq!(decoder.next().await.unwrap().unwrap()["a"], 1);
        let err = decoder.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::TruncatedStream { residue: 6 }));
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn source_error_propagates() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(br#"{"a":1}"#)),
            Err(ClientError::Transport("connection reset".into())),
        ]);
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

        assert_eq!(decoder.next().await.unwrap().unwrap()["a"], 1);
        let err = decoder.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn garbage_between_objects_fails() {
        let source = chunked(vec![br#"{"a":1}: not json"#]);
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

        assert_eq!(decoder.next().await.unwrap().unwrap()["a"], 1);
        let err = decoder.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn wrong_shape_object_is_schema_error() {
        #[derive(serde::Deserialize)]
        struct Typed {
            #[allow(dead_code)]
            a: String,
        }
        let source = chunked(vec![br#"{"a":1}"#]);
        let mut decoder = JsonStreamDecoder::<_, Typed>::new(source);
        let err = decoder.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Schema(_)));
    }

    /// Stream wrapper flagging when it is dropped.
    struct DropFlag<S> {
        inner: S,
        dropped: Arc<AtomicBool>,
    }

    impl<S> Drop for DropFlag<S> {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl<S: Stream + Unpin> Stream for DropFlag<S> {
        type Item = S::Item;

        fn poll_next(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
        ) -> Poll<Option<Self::Item>> {
            Pin::new(&mut self.inner).poll_next(cx)
        }
    }

    #[tokio::test]
    async fn close_releases_source_and_stops_yielding() {
        let dropped = Arc::new(AtomicBool::new(false));
        // The source would keep pending forever after the first object.
        let source = DropFlag {
            inner: chunked(vec![br#"{"a":1}{"a":2}"#]).chain(stream::pending()),
            dropped: dropped.clone(),
        };
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

        assert_eq!(decoder.next().await.unwrap().unwrap()["a"], 1);

        decoder.close();
        assert!(dropped.load(Ordering::SeqCst), "close must drop the source");
        assert!(decoder.is_finished());

        // Buffered and future data are gone; no poll reaches the source.
        assert!(decoder.next().await.is_none());

        decoder.close(); // idempotent
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn one_object_per_poll_even_when_buffered() {
        // Both objects arrive in one read; the second must not be decoded
        // until the consumer asks for it.
        let source = chunked(vec![br#"{"a":1}{"a":2}"#]);
        let mut decoder = JsonStreamDecoder::<_, Value>::new(source);

        let first = decoder.next().await.unwrap().unwrap();
        assert_eq!(first["a"], 1);
        // The undecoded remainder is still buffered.
        assert!(!decoder.is_finished());

        let second = decoder.next().await.unwrap().unwrap();
        assert_eq!(second["a"], 2);
    }
}
