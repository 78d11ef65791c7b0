//! Body type handed downstream after authentication.
//!
//! [`AkskBody`] has two modes:
//!
//! - **Buffered**: the body was read into memory to be hashed, and its bytes
//!   are replayed as a fresh body. Also used for locally generated responses.
//! - **Passthrough**: the original body, never polled by the validator.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::Full;
use pin_project_lite::pin_project;

pin_project! {
    /// A request or response body that is either buffered or passed through.
    ///
    /// Implements [`http_body::Body`] so it can be used directly with hyper.
    #[project = AkskBodyProj]
    #[derive(Debug)]
    pub enum AkskBody<B> {
        /// Bytes held in memory.
        Buffered {
            #[pin]
            inner: Full<Bytes>,
        },
        /// The untouched original body.
        Passthrough {
            #[pin]
            inner: B,
        },
    }
}

impl<B> AkskBody<B> {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn buffered(data: impl Into<Bytes>) -> Self {
        Self::Buffered {
            inner: Full::new(data.into()),
        }
    }

    /// Wrap an existing [`Full`] body.
    #[must_use]
    pub fn from_full(inner: Full<Bytes>) -> Self {
        Self::Buffered { inner }
    }

    /// Wrap the original body without reading it.
    #[must_use]
    pub fn passthrough(inner: B) -> Self {
        Self::Passthrough { inner }
    }

    /// Whether the body was buffered in memory.
    #[must_use]
    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::Buffered { .. })
    }
}

impl<B> Body for AkskBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            AkskBodyProj::Buffered { inner } => {
                inner.poll_frame(cx).map_err(|never| match never {})
            }
            AkskBodyProj::Passthrough { inner } => inner.poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered { inner } => inner.is_end_stream(),
            Self::Passthrough { inner } => inner.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Buffered { inner } => inner.size_hint(),
            Self::Passthrough { inner } => inner.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn test_should_report_buffered_size() {
        let body: AkskBody<Full<Bytes>> = AkskBody::buffered("hello");
        assert!(body.is_buffered());
        assert!(!body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(5));
    }

    #[test]
    fn test_should_treat_empty_buffer_as_end_of_stream() {
        let body: AkskBody<Full<Bytes>> = AkskBody::buffered(Bytes::new());
        assert!(body.is_end_stream());
    }

    #[tokio::test]
    async fn test_should_replay_buffered_bytes() {
        let body: AkskBody<Full<Bytes>> = AkskBody::buffered("helloworld");
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"helloworld");
    }

    #[tokio::test]
    async fn test_should_pass_inner_body_through() {
        let body = AkskBody::passthrough(Full::new(Bytes::from_static(b"untouched")));
        assert!(!body.is_buffered());
        assert_eq!(body.size_hint().exact(), Some(9));
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"untouched");
    }
}
