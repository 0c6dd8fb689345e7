//! RPC module - request/response correlation over a connection.
//!
//! Provides:
//! - [`Correlator`] - the pending-call table with exactly-once delivery
//! - [`ReplyHandle`] - the caller's awaitable side of a call
//! - [`OutboundQueue`] / [`OutboundReceiver`] - frame hand-off to the
//!   transport with a bounded high-water mark
//! - [`Endpoint`] - the per-connection surface tying it all together

mod call;
mod correlator;
mod endpoint;
mod outbound;

pub use call::ReplyHandle;
pub use correlator::{Correlator, Delivery};
pub use endpoint::{
    CallConfig, Endpoint, EndpointChannels, EndpointConfig, DEFAULT_PUSH_CAPACITY,
    DEFAULT_RESPONSE_TIMEOUT,
};
pub use outbound::{
    outbound_channel, OutboundConfig, OutboundFrame, OutboundQueue, OutboundReceiver,
    DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_MAX_PENDING_FRAMES,
};
