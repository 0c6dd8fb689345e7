//! Outbound queue - hand-off of encoded frames to the transport.
//!
//! Callers enqueue fully encoded frames; the transport drains them from
//! the receiving half at its own pace. A shared pending counter bounds
//! how far the queue may run ahead: past the high-water mark, senders
//! wait (bounded by a timeout) for the transport to catch up instead of
//! growing the queue without limit.
//!
//! ```text
//! caller 1 ─┐
//! caller 2 ─┼─► OutboundQueue ─► mpsc ─► OutboundReceiver ─► transport
//! caller N ─┘
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{ProtoError, Result};

/// Default maximum frames in flight before senders start waiting.
pub const DEFAULT_MAX_PENDING_FRAMES: usize = 1024;

/// Default wait for the queue to drain below the high-water mark.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between high-water checks while waiting.
const CHECK_INTERVAL: Duration = Duration::from_micros(100);

/// A frame ready for the transport, tagged with its sequence id.
///
/// `seq` is 0 for uncorrelated frames (pushes); the transport's session
/// envelope carries it however that layer chooses.
#[derive(Debug)]
pub struct OutboundFrame {
    /// Sequence id, 0 when no response is expected.
    pub seq: u64,
    /// Complete encoded frame (length prefix, header, body).
    pub frame: Bytes,
}

/// Configuration for the outbound queue.
#[derive(Debug, Clone)]
pub struct OutboundConfig {
    /// Frames in flight before senders wait.
    pub max_pending_frames: usize,
    /// Channel capacity.
    pub channel_capacity: usize,
    /// How long a sender waits for the queue to drain.
    pub enqueue_timeout: Duration,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            max_pending_frames: DEFAULT_MAX_PENDING_FRAMES,
            channel_capacity: DEFAULT_MAX_PENDING_FRAMES,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }
}

/// Create a connected queue/receiver pair.
pub fn outbound_channel(config: OutboundConfig) -> (OutboundQueue, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let pending = Arc::new(AtomicUsize::new(0));
    (
        OutboundQueue {
            tx,
            pending: pending.clone(),
            max_pending: config.max_pending_frames,
            timeout: config.enqueue_timeout,
        },
        OutboundReceiver { rx, pending },
    )
}

/// Sending half; cheaply cloneable, shared across caller tasks.
#[derive(Clone)]
pub struct OutboundQueue {
    tx: mpsc::Sender<OutboundFrame>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
    timeout: Duration,
}

impl OutboundQueue {
    /// Enqueue a frame, waiting below the high-water mark if needed.
    ///
    /// # Errors
    ///
    /// `QueueFull` if the transport does not drain within the configured
    /// timeout, `ConnectionClosed` if the receiving half is gone.
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        if self.pending.load(Ordering::Acquire) >= self.max_pending {
            self.wait_for_capacity().await?;
        }

        self.pending.fetch_add(1, Ordering::AcqRel);
        self.tx.send(frame).await.map_err(|_| {
            self.pending.fetch_sub(1, Ordering::Release);
            ProtoError::ConnectionClosed
        })
    }

    /// Enqueue without waiting; `QueueFull` immediately at capacity.
    pub fn try_send(&self, frame: OutboundFrame) -> Result<()> {
        if self.pending.load(Ordering::Acquire) >= self.max_pending {
            return Err(ProtoError::QueueFull);
        }

        self.pending.fetch_add(1, Ordering::AcqRel);
        self.tx.try_send(frame).map_err(|e| {
            self.pending.fetch_sub(1, Ordering::Release);
            match e {
                mpsc::error::TrySendError::Full(_) => ProtoError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => ProtoError::ConnectionClosed,
            }
        })
    }

    async fn wait_for_capacity(&self) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.pending.load(Ordering::Acquire) < self.max_pending {
                return Ok(());
            }
            if start.elapsed() > self.timeout {
                return Err(ProtoError::QueueFull);
            }
            tokio::time::sleep(CHECK_INTERVAL).await;
        }
    }

    /// Frames enqueued but not yet taken by the transport.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether the queue is at or past its high-water mark.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.pending.load(Ordering::Acquire) >= self.max_pending
    }
}

/// Receiving half, owned by the transport drain loop.
pub struct OutboundReceiver {
    rx: mpsc::Receiver<OutboundFrame>,
    pending: Arc<AtomicUsize>,
}

impl OutboundReceiver {
    /// Take the next frame; `None` when every queue handle is dropped.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        let frame = self.rx.recv().await?;
        self.pending.fetch_sub(1, Ordering::Release);
        Some(frame)
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<OutboundFrame> {
        let frame = self.rx.try_recv().ok()?;
        self.pending.fetch_sub(1, Ordering::Release);
        Some(frame)
    }
}
