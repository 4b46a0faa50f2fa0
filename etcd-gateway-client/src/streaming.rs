//! Streaming session wrappers.
//!
//! A streaming call returns a [`Streaming`]: a lazy, single-pass sequence
//! of decoded models over one exclusively owned transport connection. The
//! session is open while it yields and closed once the peer ends the
//! stream, an error surfaces, or the caller invokes
//! [`close`](Streaming::close); a closed session never yields again and a
//! new call is needed to watch again.
//!
//! Dropping the session also releases the connection (the decoder owns the
//! response body), so abandoning iteration cannot leak a socket; `close()`
//! exists to cut the peer off explicitly before the wrapper goes out of
//! scope.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

use crate::ClientError;
use crate::response::JsonStreamDecoder;
use crate::rpc::{RawFrame, ResponseKind, RpcResponse};

/// Boxed byte stream handed from the transport to a stream decoder.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// Wrapper for streaming response messages.
///
/// Forwards the decoder's `Stream` implementation and exposes session
/// lifecycle methods.
pub struct Streaming<S> {
    inner: S,
}

impl<S> Streaming<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, T> Streaming<JsonStreamDecoder<S, T>> {
    /// Close the session, releasing the transport connection eagerly.
    ///
    /// Idempotent; safe mid-iteration. Further polls return `None`.
    pub fn close(&mut self) {
        self.inner.close();
    }

    /// Whether the session has finished (exhausted, failed, or closed).
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl<S, T> Streaming<S>
where
    S: Stream<Item = Result<T, ClientError>> + Unpin,
{
    /// Consume the remainder of the stream, discarding messages.
    ///
    /// Returns the number of messages drained (errors are not counted).
    pub async fn drain(&mut self) -> usize {
        use futures::StreamExt;
        let mut count = 0;
        while let Some(result) = self.inner.next().await {
            if result.is_ok() {
                count += 1;
            }
        }
        count
    }
}

impl<S, T> Stream for Streaming<S>
where
    S: Stream<Item = Result<T, ClientError>> + Unpin,
{
    type Item = Result<T, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Streaming session for the dynamic [`call_rpc_stream`] surface.
///
/// Each pulled frame is unwrapped from the gateway's stream envelope
/// (`{"result": ...}` on success, `{"error": ...}` on a mid-stream
/// failure) and materialized through the method's response schema. An
/// error frame yields `Err` at that point in the iteration; models already
/// yielded stay valid.
///
/// [`call_rpc_stream`]: crate::GatewayClient::call_rpc_stream
pub struct RpcStream {
    frames: Streaming<JsonStreamDecoder<ByteStream, RawFrame>>,
    /// Response schema, `None` for paths outside the method table.
    kind: Option<ResponseKind>,
}

impl RpcStream {
    pub(crate) fn new(
        frames: Streaming<JsonStreamDecoder<ByteStream, RawFrame>>,
        kind: Option<ResponseKind>,
    ) -> Self {
        Self { frames, kind }
    }

    /// Close the session, releasing the transport connection eagerly.
    pub fn close(&mut self) {
        self.frames.close();
    }

    /// Whether the session has finished (exhausted, failed, or closed).
    pub fn is_finished(&self) -> bool {
        self.frames.is_finished()
    }

    fn build(&self, frame: RawFrame) -> Result<RpcResponse, ClientError> {
        if let Some(error) = frame.error {
            return Err(error.into_client_error());
        }
        let Some(result) = frame.result else {
            return Err(ClientError::Schema(
                "stream frame carries neither result nor error".into(),
            ));
        };
        match self.kind {
            Some(kind) => kind.build(result),
            None => Ok(RpcResponse::Raw(result)),
        }
    }
}

impl Stream for RpcStream {
    type Item = Result<RpcResponse, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        match Pin::new(&mut this.frames).poll_next(cx) {
            Poll::Ready(Some(Ok(frame))) => Poll::Ready(Some(this.build(frame))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
