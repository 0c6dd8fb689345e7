//! Endpoint - registry, correlator, and outbound queue glued together.
//!
//! One endpoint serves one connection. Caller tasks `send()` typed
//! requests and await their [`ReplyHandle`]s; the transport drains
//! encoded frames from the [`OutboundReceiver`] and feeds received
//! frames into `handle_inbound()`. Frames that arrive with a sequence id
//! are responses and go to the correlator; frames without one are pushes
//! and land on the push channel for the application to consume.
//!
//! A frame that fails to decode is logged and dropped; the connection and
//! every other pending call stay healthy. `close()` tears the endpoint
//! down and fails all outstanding calls exactly once.
//!
//! # Example
//!
//! ```no_run
//! use tagwire::api::{GroupOutPeer, SeqDate, TransferOwnership, UserOutPeer};
//! use tagwire::message::MessageRegistry;
//! use tagwire::rpc::{Endpoint, EndpointConfig};
//!
//! # async fn run() -> tagwire::Result<()> {
//! let mut registry = MessageRegistry::new();
//! registry.register_call::<TransferOwnership>();
//! registry.register::<SeqDate>();
//!
//! let (endpoint, _channels) = Endpoint::new(registry, EndpointConfig::default());
//!
//! let request = TransferOwnership::new(
//!     GroupOutPeer::new(42, 0x5eed),
//!     UserOutPeer::new(7, 0xcafe),
//! );
//! let reply: SeqDate = endpoint.send(&request).await?.recv().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use super::call::ReplyHandle;
use super::correlator::Correlator;
use super::outbound::{outbound_channel, OutboundConfig, OutboundFrame, OutboundQueue, OutboundReceiver};
use crate::error::{ProtoError, Result};
use crate::message::{encode_frame, Call, MessageRegistry, MessageType, WireMessage};

/// Default reply deadline.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the push-message channel.
pub const DEFAULT_PUSH_CAPACITY: usize = 256;

/// Per-call configuration.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// How long a caller waits for a response.
    pub response_timeout: Duration,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    /// Call deadlines.
    pub call: CallConfig,
    /// Outbound queue sizing.
    pub outbound: OutboundConfig,
}

/// Transport-facing halves produced alongside an endpoint.
pub struct EndpointChannels {
    /// Encoded frames for the transport to put on the wire.
    pub outbound: OutboundReceiver,
    /// Decoded uncorrelated (push) messages for the application.
    pub pushes: mpsc::Receiver<Box<dyn WireMessage>>,
}

struct Inner {
    registry: MessageRegistry,
    correlator: Arc<Correlator>,
    outbound: OutboundQueue,
    pushes: mpsc::Sender<Box<dyn WireMessage>>,
    closed: AtomicBool,
    call_config: CallConfig,
}

/// One connection's RPC surface. Cheaply cloneable.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<Inner>,
}

impl Endpoint {
    /// Build an endpoint over a fully registered catalog.
    ///
    /// Registration must be complete before this point; the registry is
    /// read-only from here on.
    pub fn new(registry: MessageRegistry, config: EndpointConfig) -> (Self, EndpointChannels) {
        let (outbound, outbound_rx) = outbound_channel(config.outbound);
        let (push_tx, push_rx) = mpsc::channel(DEFAULT_PUSH_CAPACITY);

        let endpoint = Self {
            inner: Arc::new(Inner {
                registry,
                correlator: Arc::new(Correlator::new()),
                outbound,
                pushes: push_tx,
                closed: AtomicBool::new(false),
                call_config: config.call,
            }),
        };
        let channels = EndpointChannels {
            outbound: outbound_rx,
            pushes: push_rx,
        };
        (endpoint, channels)
    }

    /// Send a typed request; the handle resolves to its declared reply.
    ///
    /// Serialization happens before anything is enqueued, so a
    /// `MissingRequiredField` produces no pending call and no bytes.
    pub async fn send<C: Call>(&self, call: &C) -> Result<ReplyHandle<C::Reply>> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(ProtoError::ConnectionClosed);
        }

        let frame = encode_frame(call)?;
        let (seq, rx) = self.inner.correlator.register(C::Reply::HEADER);
        tracing::debug!(seq, header = C::HEADER, "sending call");

        if let Err(e) = self.inner.outbound.send(OutboundFrame { seq, frame }).await {
            self.inner.correlator.abandon(seq);
            return Err(e);
        }

        Ok(ReplyHandle::new(
            seq,
            rx,
            self.inner.correlator.clone(),
            self.inner.call_config.response_timeout,
        ))
    }

    /// Send an uncorrelated message (no reply expected).
    pub async fn send_push<M: MessageType>(&self, msg: &M) -> Result<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(ProtoError::ConnectionClosed);
        }
        let frame = encode_frame(msg)?;
        self.inner.outbound.send(OutboundFrame { seq: 0, frame }).await
    }

    /// Feed one complete received frame into the endpoint.
    ///
    /// `seq` comes from the transport's session envelope: `Some` marks a
    /// response to a pending call, `None` a server push. Decode failures
    /// are returned for the transport to report, after being logged; they
    /// never tear the endpoint down.
    pub async fn handle_inbound(&self, seq: Option<u64>, bytes: Bytes) -> Result<()> {
        let msg = match self.inner.registry.decode_frame(bytes) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable frame");
                return Err(e);
            }
        };

        match seq {
            Some(seq) => {
                self.inner.correlator.complete(seq, msg);
            }
            None => {
                if self.inner.pushes.send(msg).await.is_err() {
                    tracing::debug!("push consumer gone, dropping message");
                }
            }
        }
        Ok(())
    }

    /// Tear the endpoint down: all outstanding calls fail with
    /// `ConnectionClosed`, later sends are rejected. Idempotent.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            self.inner.correlator.fail_all();
        }
    }

    /// Calls currently awaiting a response.
    pub fn outstanding_calls(&self) -> usize {
        self.inner.correlator.outstanding()
    }

    /// The registered catalog backing this endpoint.
    pub fn registry(&self) -> &MessageRegistry {
        &self.inner.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{GroupOutPeer, SeqDate, TransferOwnership, UserOutPeer};
    use crate::protocol::Frame;

    fn test_endpoint() -> (Endpoint, EndpointChannels) {
        let mut registry = MessageRegistry::new();
        registry.register_call::<TransferOwnership>();
        registry.register::<SeqDate>();
        Endpoint::new(
            registry,
            EndpointConfig {
                call: CallConfig {
                    response_timeout: Duration::from_millis(200),
                },
                outbound: OutboundConfig::default(),
            },
        )
    }

    fn transfer(group: i32) -> TransferOwnership {
        TransferOwnership::new(GroupOutPeer::new(group, 11), UserOutPeer::new(5, 22))
    }

    fn seq_date_frame(seq: i32) -> Bytes {
        crate::message::encode_frame(&SeqDate {
            seq,
            state: None,
            date: 1_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_call_roundtrip_through_channels() {
        let (endpoint, mut channels) = test_endpoint();

        let handle = endpoint.send(&transfer(1)).await.unwrap();
        let out = channels.outbound.recv().await.unwrap();
        assert_eq!(Frame::decode(out.frame).unwrap().header, 0xae5);

        endpoint
            .handle_inbound(Some(out.seq), seq_date_frame(9))
            .await
            .unwrap();

        assert_eq!(handle.recv().await.unwrap().seq, 9);
        assert_eq!(endpoint.outstanding_calls(), 0);
    }

    #[tokio::test]
    async fn test_reordered_responses_match_by_sequence() {
        let (endpoint, mut channels) = test_endpoint();

        let first = endpoint.send(&transfer(1)).await.unwrap();
        let second = endpoint.send(&transfer(2)).await.unwrap();

        let out_first = channels.outbound.recv().await.unwrap();
        let out_second = channels.outbound.recv().await.unwrap();

        // Responses arrive in reverse order.
        endpoint
            .handle_inbound(Some(out_second.seq), seq_date_frame(200))
            .await
            .unwrap();
        endpoint
            .handle_inbound(Some(out_first.seq), seq_date_frame(100))
            .await
            .unwrap();

        assert_eq!(first.recv().await.unwrap().seq, 100);
        assert_eq!(second.recv().await.unwrap().seq, 200);
    }

    #[tokio::test]
    async fn test_no_response_times_out_and_clears() {
        let (endpoint, mut channels) = test_endpoint();

        let handle = endpoint.send(&transfer(1)).await.unwrap();
        let _ = channels.outbound.recv().await.unwrap(); // wire eats it

        assert!(matches!(handle.recv().await, Err(ProtoError::TimedOut)));
        assert_eq!(endpoint.outstanding_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_header_does_not_kill_dispatch() {
        let (endpoint, mut channels) = test_endpoint();

        let handle = endpoint.send(&transfer(1)).await.unwrap();
        let out = channels.outbound.recv().await.unwrap();

        // Garbage frame first; the pending call must survive it.
        let garbage = Frame::new(0xbeef, Bytes::from_static(b"")).encode();
        assert!(matches!(
            endpoint.handle_inbound(Some(out.seq), garbage).await,
            Err(ProtoError::UnknownHeader(0xbeef))
        ));
        assert_eq!(endpoint.outstanding_calls(), 1);

        endpoint
            .handle_inbound(Some(out.seq), seq_date_frame(1))
            .await
            .unwrap();
        assert_eq!(handle.recv().await.unwrap().seq, 1);
    }

    #[tokio::test]
    async fn test_close_fails_outstanding_and_rejects_new() {
        let (endpoint, _channels) = test_endpoint();

        let handle = endpoint.send(&transfer(1)).await.unwrap();
        endpoint.close();

        assert!(matches!(
            handle.recv().await,
            Err(ProtoError::ConnectionClosed)
        ));
        assert!(matches!(
            endpoint.send(&transfer(2)).await,
            Err(ProtoError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_push_lands_on_push_channel() {
        let (endpoint, mut channels) = test_endpoint();

        endpoint
            .handle_inbound(None, seq_date_frame(77))
            .await
            .unwrap();

        let push = channels.pushes.recv().await.unwrap();
        let push = push.into_any().downcast::<SeqDate>().unwrap();
        assert_eq!(push.seq, 77);
    }

    #[tokio::test]
    async fn test_send_push_is_uncorrelated() {
        let (endpoint, mut channels) = test_endpoint();

        endpoint
            .send_push(&SeqDate {
                seq: 1,
                state: None,
                date: 2,
            })
            .await
            .unwrap();

        let out = channels.outbound.recv().await.unwrap();
        assert_eq!(out.seq, 0);
        assert_eq!(endpoint.outstanding_calls(), 0);
    }
}
