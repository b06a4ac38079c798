//! Outbound message queue
//!
//! Messages submitted while no connection is writable are buffered here
//! in submission order and drained oldest-first when a connection comes
//! up. The queue is owned by the supervisor task, which serializes
//! enqueues from the send path against flushes from the open path.
//!
//! The queue is unbounded: the transport offers no backpressure signal,
//! so callers needing a cap must impose one externally.

use std::collections::VecDeque;

use futures::{Sink, SinkExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::trace;

use crate::traits::WsMessage;

/// FIFO buffer of encoded messages awaiting a writable connection
pub(crate) struct OutboundQueue {
    entries: VecDeque<WsMessage>,
}

impl OutboundQueue {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append a message to the tail
    pub(crate) fn enqueue(&mut self, message: WsMessage) {
        self.entries.push_back(message);
        trace!("queued outbound message, depth {}", self.entries.len());
    }

    /// Return a message to the head (a live write failed before delivery)
    pub(crate) fn push_front(&mut self, message: WsMessage) {
        self.entries.push_front(message);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard all entries, returning how many were dropped
    ///
    /// Only the terminal disconnect path calls this.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    /// Drain entries oldest-first into the sink
    ///
    /// An entry is removed only after its write succeeds, so a failure
    /// mid-drain leaves the in-flight entry at the head and everything
    /// behind it untouched, in original relative order, for the next
    /// flush. Returns the number of messages written.
    pub(crate) async fn flush<S>(&mut self, sink: &mut S) -> std::result::Result<usize, S::Error>
    where
        S: Sink<Message> + Unpin,
    {
        let mut flushed = 0;
        while let Some(front) = self.entries.front() {
            let frame = front.clone().into_tungstenite();
            sink.send(frame).await?;
            self.entries.pop_front();
            flushed += 1;
        }
        Ok(flushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Sink that records frames and optionally fails after N writes
    #[derive(Default)]
    struct ScriptedSink {
        sent: Vec<Message>,
        fail_after: Option<usize>,
    }

    impl Sink<Message> for ScriptedSink {
        type Error = &'static str;

        fn poll_ready(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
            let this = self.get_mut();
            if this.fail_after.is_some_and(|limit| this.sent.len() >= limit) {
                return Err("sink closed");
            }
            this.sent.push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    fn texts(sink: &ScriptedSink) -> Vec<String> {
        sink.sent
            .iter()
            .map(|m| match m {
                Message::Text(t) => t.clone(),
                other => panic!("unexpected frame: {other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn flush_preserves_submission_order() {
        let mut queue = OutboundQueue::new();
        queue.enqueue(WsMessage::Text("first".into()));
        queue.enqueue(WsMessage::Text("second".into()));
        queue.enqueue(WsMessage::Text("third".into()));

        let mut sink = ScriptedSink::default();
        let flushed = queue.flush(&mut sink).await.unwrap();

        assert_eq!(flushed, 3);
        assert!(queue.is_empty());
        assert_eq!(texts(&sink), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn flush_of_empty_queue_writes_nothing() {
        let mut queue = OutboundQueue::new();
        let mut sink = ScriptedSink::default();

        let flushed = queue.flush(&mut sink).await.unwrap();

        assert_eq!(flushed, 0);
        assert!(sink.sent.is_empty());
    }

    #[tokio::test]
    async fn failed_write_keeps_remaining_entries_in_order() {
        let mut queue = OutboundQueue::new();
        for label in ["a", "b", "c", "d"] {
            queue.enqueue(WsMessage::Text(label.into()));
        }

        let mut sink = ScriptedSink {
            fail_after: Some(2),
            ..Default::default()
        };

        let result = queue.flush(&mut sink).await;

        assert!(result.is_err());
        assert_eq!(texts(&sink), vec!["a", "b"]);
        // The entry whose write failed is still at the head
        assert_eq!(queue.len(), 2);

        let mut retry = ScriptedSink::default();
        let flushed = queue.flush(&mut retry).await.unwrap();
        assert_eq!(flushed, 2);
        assert_eq!(texts(&retry), vec!["c", "d"]);
    }

    #[tokio::test]
    async fn clear_reports_discarded_count() {
        let mut queue = OutboundQueue::new();
        queue.enqueue(WsMessage::Text("pending".into()));
        queue.enqueue(WsMessage::Binary(vec![1, 2, 3]));

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }

    #[tokio::test]
    async fn push_front_takes_priority_over_older_entries() {
        let mut queue = OutboundQueue::new();
        queue.enqueue(WsMessage::Text("queued".into()));
        queue.push_front(WsMessage::Text("retried".into()));

        let mut sink = ScriptedSink::default();
        queue.flush(&mut sink).await.unwrap();

        assert_eq!(texts(&sink), vec!["retried", "queued"]);
    }
}
