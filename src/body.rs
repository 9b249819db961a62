//! The response body type.
//!
//! All responses the engine produces are fully buffered (property trees,
//! lock acknowledgements, file contents), so the body is a single
//! optional `Bytes` chunk. It implements both `Stream` and
//! `http_body::Body` so it plugs into hyper-style servers directly.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::stream::Stream;
use http::header::HeaderMap;
use http_body::Body as HttpBody;

/// Body returned by the webdav handler.
pub struct Body {
    bytes: Option<Bytes>,
}

impl Body {
    /// Return an empty body.
    pub fn empty() -> Body {
        Body { bytes: None }
    }

    /// Length of the body in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.as_ref().map(|b| b.len() as u64).unwrap_or(0)
    }

    /// Is the body empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Stream for Body {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.bytes.take().map(Ok))
    }
}

impl HttpBody for Body {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_data(
        self: Pin<&mut Self>,
        cx: &mut Context,
    ) -> Poll<Option<Result<Self::Data, Self::Error>>> {
        self.poll_next(cx)
    }

    fn poll_trailers(
        self: Pin<&mut Self>,
        _cx: &mut Context,
    ) -> Poll<Result<Option<HeaderMap>, Self::Error>> {
        Poll::Ready(Ok(None))
    }
}

impl From<String> for Body {
    fn from(t: String) -> Body {
        Body {
            bytes: Some(Bytes::from(t)),
        }
    }
}

impl From<&str> for Body {
    fn from(t: &str) -> Body {
        Body {
            bytes: Some(Bytes::from(t.to_string())),
        }
    }
}

impl From<Bytes> for Body {
    fn from(t: Bytes) -> Body {
        Body { bytes: Some(t) }
    }
}
