//! # Live event stream returned by `run_as_completed`.
//!
//! [`EventStream`] is a one-shot, finite stream of [`Event`]s produced in
//! dispatch order as tasks progress. It terminates once every registered
//! task has reached its terminal state and the dispatcher has drained;
//! termination is signalled by channel closure, not by any sentinel event.
//!
//! Events are forwarded only after their callback handler has run, so a
//! consumer that observes a terminal event may rely on the shared state
//! already reflecting it.
//!
//! Dropping the stream early does not interrupt the run: the dispatcher
//! keeps invoking callbacks until all tasks settle.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use super::event::Event;

/// Ordered-by-emission sequence of lifecycle events for one run.
///
/// Obtained from `Runner::run_as_completed`; implements
/// [`Stream`](tokio_stream::Stream) with `Item = Event`.
#[derive(Debug)]
pub struct EventStream {
    inner: ReceiverStream<Event>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::Receiver<Event>) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
        }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
