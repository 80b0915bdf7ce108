//! Consumer handle for a batch job's progress events.

use crate::types::ProgressEvent;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Ordered, finite stream of a batch job's [`ProgressEvent`]s
///
/// The stream ends after a `Done` or `Error` event. Ending without either means
/// the job terminated abnormally. Dropping the stream (or calling
/// [`close`](Self::close)) tells the job to stop starting new tracks.
#[derive(Debug)]
pub struct BatchStream {
    inner: ReceiverStream<ProgressEvent>,
}

impl BatchStream {
    pub(crate) fn new(rx: mpsc::Receiver<ProgressEvent>) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
        }
    }

    /// Cancel the job while still draining events it already produced
    pub fn close(&mut self) {
        self.inner.close();
    }
}

impl Stream for BatchStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
