//! Request/response correlator - the pending-call table.
//!
//! Every outbound request registers a pending call keyed by a fresh,
//! monotonically increasing sequence id. Completion (a matching response
//! frame), timeout, cancellation, and connection teardown all race for
//! the same entry; whichever removes it from the table under the lock
//! delivers the terminal outcome, so a waiter sees exactly one of them.
//!
//! The lock is a `std::sync::Mutex` held only for map operations, never
//! across an await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tokio::sync::oneshot;

use crate::error::ProtoError;
use crate::message::WireMessage;

/// Terminal outcome delivered to a waiter.
#[derive(Debug)]
pub enum Delivery {
    /// The peer's response, type-checked against the declared reply.
    Reply(Box<dyn WireMessage>),
    /// The call failed; the error says how.
    Failed(ProtoError),
}

/// One in-flight request.
struct PendingCall {
    /// Header the response must carry.
    expected_header: u32,
    /// When the request was registered.
    created_at: Instant,
    /// Single-delivery channel to the waiter.
    tx: oneshot::Sender<Delivery>,
}

/// Pending-call table scoped to one connection.
#[derive(Default)]
pub struct Correlator {
    next_seq: AtomicU64,
    pending: Mutex<HashMap<u64, PendingCall>>,
}

impl Correlator {
    /// Create an empty correlator.
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<u64, PendingCall>> {
        // Poisoning implies a panic mid-map-operation; nothing to salvage.
        self.pending.lock().expect("pending call table poisoned")
    }

    /// Allocate a fresh sequence id and register a pending call expecting
    /// a response with `expected_header`.
    ///
    /// Sequence ids start at 1; 0 is reserved for uncorrelated frames.
    pub fn register(&self, expected_header: u32) -> (u64, oneshot::Receiver<Delivery>) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        self.table().insert(
            seq,
            PendingCall {
                expected_header,
                created_at: Instant::now(),
                tx,
            },
        );
        (seq, rx)
    }

    /// Deliver a decoded response to the pending call for `seq`.
    ///
    /// A response whose header does not match the declared reply type
    /// fails the call with `ResponseTypeMismatch`; dispatch itself stays
    /// healthy. Returns `false` for stale or unknown sequence ids (the
    /// call already timed out, was cancelled, or never existed) - the
    /// frame is logged and dropped.
    pub fn complete(&self, seq: u64, reply: Box<dyn WireMessage>) -> bool {
        let call = match self.table().remove(&seq) {
            Some(call) => call,
            None => {
                tracing::warn!(seq, header = reply.header_code(), "stale response dropped");
                return false;
            }
        };

        let actual = reply.header_code();
        let delivery = if actual == call.expected_header {
            tracing::debug!(
                seq,
                elapsed_ms = call.created_at.elapsed().as_millis() as u64,
                "call completed"
            );
            Delivery::Reply(reply)
        } else {
            Delivery::Failed(ProtoError::ResponseTypeMismatch {
                expected: call.expected_header,
                actual,
            })
        };

        // The waiter may have vanished between removal and delivery;
        // that is its cancellation, not our problem.
        let _ = call.tx.send(delivery);
        true
    }

    /// Remove the pending call for `seq` without delivering anything.
    ///
    /// Used by waiter-side timeout and cancellation. Returns whether the
    /// entry was still present (i.e. this caller won the race).
    pub fn abandon(&self, seq: u64) -> bool {
        self.table().remove(&seq).is_some()
    }

    /// Fail one pending call with an explicit error.
    pub fn fail(&self, seq: u64, error: ProtoError) -> bool {
        match self.table().remove(&seq) {
            Some(call) => {
                let _ = call.tx.send(Delivery::Failed(error));
                true
            }
            None => false,
        }
    }

    /// Connection teardown: fail every outstanding call with
    /// `ConnectionClosed`, exactly once each. Returns how many calls were
    /// swept.
    pub fn fail_all(&self) -> usize {
        let drained: Vec<(u64, PendingCall)> = self.table().drain().collect();
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "failing outstanding calls on close");
        }
        let count = drained.len();
        for (_, call) in drained {
            let _ = call.tx.send(Delivery::Failed(ProtoError::ConnectionClosed));
        }
        count
    }

    /// Number of calls currently in flight.
    pub fn outstanding(&self) -> usize {
        self.table().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SeqDate, VoidReply};
    use crate::message::MessageType;

    fn seq_date(seq: i32) -> Box<dyn WireMessage> {
        Box::new(SeqDate {
            seq,
            state: None,
            date: 1,
        })
    }

    #[test]
    fn test_sequence_ids_are_fresh_and_increasing() {
        let correlator = Correlator::new();
        let (a, _rx_a) = correlator.register(SeqDate::HEADER);
        let (b, _rx_b) = correlator.register(SeqDate::HEADER);
        assert!(a >= 1);
        assert!(b > a);
        assert_eq!(correlator.outstanding(), 2);
    }

    #[tokio::test]
    async fn test_complete_delivers_reply() {
        let correlator = Correlator::new();
        let (seq, rx) = correlator.register(SeqDate::HEADER);

        assert!(correlator.complete(seq, seq_date(5)));
        assert_eq!(correlator.outstanding(), 0);

        match rx.await.unwrap() {
            Delivery::Reply(msg) => assert_eq!(msg.header_code(), SeqDate::HEADER),
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_reply_type_fails_call() {
        let correlator = Correlator::new();
        let (seq, rx) = correlator.register(SeqDate::HEADER);

        assert!(correlator.complete(seq, Box::new(VoidReply)));

        match rx.await.unwrap() {
            Delivery::Failed(ProtoError::ResponseTypeMismatch { expected, actual }) => {
                assert_eq!(expected, SeqDate::HEADER);
                assert_eq!(actual, VoidReply::HEADER);
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let correlator = Correlator::new();
        assert!(!correlator.complete(999, seq_date(1)));
    }

    #[test]
    fn test_abandon_wins_only_once() {
        let correlator = Correlator::new();
        let (seq, _rx) = correlator.register(SeqDate::HEADER);
        assert!(correlator.abandon(seq));
        assert!(!correlator.abandon(seq));
        assert!(!correlator.complete(seq, seq_date(1)));
    }

    #[tokio::test]
    async fn test_fail_all_sweeps_everything() {
        let correlator = Correlator::new();
        let (_, rx_a) = correlator.register(SeqDate::HEADER);
        let (_, rx_b) = correlator.register(VoidReply::HEADER);

        assert_eq!(correlator.fail_all(), 2);
        assert_eq!(correlator.outstanding(), 0);

        for rx in [rx_a, rx_b] {
            match rx.await.unwrap() {
                Delivery::Failed(ProtoError::ConnectionClosed) => {}
                other => panic!("expected ConnectionClosed, got {other:?}"),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_events_deliver_exactly_once() {
        use std::sync::Arc;

        for _ in 0..64 {
            let correlator = Arc::new(Correlator::new());
            let (seq, rx) = correlator.register(SeqDate::HEADER);

            let mut tasks = Vec::new();
            for i in 0..6u32 {
                let correlator = correlator.clone();
                tasks.push(tokio::spawn(async move {
                    match i % 3 {
                        0 => usize::from(correlator.complete(seq, seq_date(1))),
                        1 => usize::from(correlator.fail(seq, ProtoError::TimedOut)),
                        _ => correlator.fail_all(),
                    }
                }));
            }

            let mut wins = 0;
            for task in tasks {
                wins += task.await.unwrap();
            }

            // Exactly one of the racing events removed the entry and
            // delivered; the waiter observed that single outcome.
            assert_eq!(wins, 1);
            assert_eq!(correlator.outstanding(), 0);
            assert!(rx.await.is_ok());
        }
    }
}
