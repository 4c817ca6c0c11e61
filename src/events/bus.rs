//! # Event bus: bounded channel from task actors to the dispatcher.
//!
//! [`Bus`] is a thin wrapper around a bounded [`tokio::sync::mpsc`] channel.
//! Every actor holds a clone of the sending half; the single dispatcher owns
//! the receiving half.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                Consumer (one):
//!   Actor 1 ──┐
//!   Actor 2 ──┼──────► Bus ───────► dispatcher (callbacks + stream)
//!   Actor N ──┘   (bounded mpsc)
//! ```
//!
//! ## Rules
//! - **No loss**: `publish()` awaits channel capacity; a full channel
//!   applies backpressure to the publishing actor instead of dropping.
//! - **Per-task FIFO**: each actor emits its events sequentially, so one
//!   task's events arrive at the dispatcher in lifecycle order.
//! - **Close signal**: the channel closes once every actor has dropped its
//!   sender; the dispatcher observes `None` and terminates.

use tokio::sync::mpsc;

use super::event::Event;

/// Sending half of the event channel, shared by all task actors.
///
/// Cheap to clone; the channel closes when the last clone is dropped.
#[derive(Clone, Debug)]
pub(crate) struct Bus {
    tx: mpsc::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given capacity (min 1, clamped) and returns
    /// it together with the receiving half for the dispatcher.
    pub(crate) fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel::<Event>(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Publishes an event, waiting for channel capacity if necessary.
    ///
    /// A send error means the dispatcher is gone; the event is discarded
    /// because there is nobody left to observe it.
    pub(crate) async fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev).await;
    }
}
