//! Reply handle - the caller's side of a pending call.
//!
//! [`ReplyHandle::recv`] suspends until the correlator delivers the
//! response or the configured deadline passes. Timeout, explicit
//! cancellation, and a plain drop all remove the pending entry; if a
//! response races in first, the response wins and the waiter gets it.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use super::correlator::{Correlator, Delivery};
use crate::error::{ProtoError, Result};
use crate::message::{MessageType, WireMessage};

/// Handle to an in-flight request, resolving to its typed reply.
pub struct ReplyHandle<T> {
    seq: u64,
    rx: oneshot::Receiver<Delivery>,
    correlator: Arc<Correlator>,
    timeout: Duration,
    _reply: PhantomData<fn() -> T>,
}

impl<T: MessageType> ReplyHandle<T> {
    pub(crate) fn new(
        seq: u64,
        rx: oneshot::Receiver<Delivery>,
        correlator: Arc<Correlator>,
        timeout: Duration,
    ) -> Self {
        Self {
            seq,
            rx,
            correlator,
            timeout,
            _reply: PhantomData,
        }
    }

    /// Sequence id this call was sent under.
    pub fn sequence_id(&self) -> u64 {
        self.seq
    }

    /// Wait for the reply, the deadline, or a terminal failure.
    ///
    /// A timeout removes the pending entry; losing that race to a
    /// concurrently arriving response delivers the response instead.
    pub async fn recv(mut self) -> Result<T> {
        match tokio::time::timeout(self.timeout, &mut self.rx).await {
            Ok(Ok(delivery)) => resolve::<T>(delivery),
            // Sender dropped without a delivery: the entry was abandoned.
            Ok(Err(_)) => Err(ProtoError::Cancelled),
            Err(_elapsed) => {
                if self.correlator.abandon(self.seq) {
                    Err(ProtoError::TimedOut)
                } else {
                    // A completion beat the sweep; take its outcome.
                    match self.rx.try_recv() {
                        Ok(delivery) => resolve::<T>(delivery),
                        Err(_) => Err(ProtoError::TimedOut),
                    }
                }
            }
        }
    }

    /// Cancel the call, removing its pending entry.
    ///
    /// Cancellation is caller-initiated and is not a wire error; the
    /// correlator simply forgets the sequence id and a late response is
    /// logged and dropped.
    pub fn cancel(self) {
        // Drop does the removal.
    }
}

impl<T> Drop for ReplyHandle<T> {
    fn drop(&mut self) {
        // No-op when the call already resolved; removal when the caller
        // walked away early.
        self.correlator.abandon(self.seq);
    }
}

fn resolve<T: MessageType>(delivery: Delivery) -> Result<T> {
    match delivery {
        Delivery::Reply(msg) => downcast::<T>(msg),
        Delivery::Failed(error) => Err(error),
    }
}

fn downcast<T: MessageType>(msg: Box<dyn WireMessage>) -> Result<T> {
    let actual = msg.header_code();
    match msg.into_any().downcast::<T>() {
        Ok(boxed) => Ok(*boxed),
        Err(_) => Err(ProtoError::ResponseTypeMismatch {
            expected: T::HEADER,
            actual,
        }),
    }
}
