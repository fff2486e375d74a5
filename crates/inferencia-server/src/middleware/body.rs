use std::{
    pin::Pin,
    task::{Context, Poll},
};

use axum::{body::Body, response::Response};
use bytes::Bytes;
use http_body::{Frame, SizeHint};

/// Status recorded for a request whose response never materialized
///
/// 500 while unwinding from a panic, otherwise 499 (client closed request).
pub fn abandoned_status() -> u16 {
    if std::thread::panicking() { 500 } else { 499 }
}

/// Attach `on_complete` to a response body
///
/// The callback runs once, with the number of body bytes handed to the
/// connection, when the body is finished or dropped. For streamed bodies
/// this is the end of the stream, not the moment headers were sent.
pub fn observe(response: Response, on_complete: impl FnOnce(u64) + Send + 'static) -> Response {
    response.map(|inner| {
        Body::new(Observed {
            inner,
            bytes: 0,
            on_complete: Some(Box::new(on_complete)),
        })
    })
}

struct Observed {
    inner: Body,
    bytes: u64,
    on_complete: Option<Box<dyn FnOnce(u64) + Send>>,
}

impl http_body::Body for Observed {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        if let Poll::Ready(Some(Ok(ref frame))) = polled
            && let Some(data) = frame.data_ref()
        {
            this.bytes += data.len() as u64;
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for Observed {
    fn drop(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(self.bytes);
        }
    }
}
