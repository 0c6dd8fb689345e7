//! # tagwire
//!
//! Binary serialization engine and request/response dispatch layer for a
//! generated RPC message catalog.
//!
//! Message types are mechanically generated glue: a struct, a field
//! schema, a fixed numeric header. Everything they lean on lives here:
//!
//! - **Codec** (`codec`): varint/fixed64/length-delimited payloads and
//!   the closed value variant set.
//! - **Protocol** (`protocol`): field-tagged bodies via [`ValueWriter`]
//!   and [`ValueReader`], length-prefixed frames, and a frame splitter
//!   for byte-stream transports.
//! - **Messages** (`message`): the generated-code traits, the header
//!   registry, and the catalog export.
//! - **RPC** (`rpc`): sequence-id correlation of requests to typed
//!   responses with timeouts, cancellation, and exactly-once delivery.
//!
//! ## Example
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
//! let (endpoint, mut channels) = Endpoint::new(registry, EndpointConfig::default());
//! // channels.outbound drains to the transport; channels.pushes to the app.
//! tokio::spawn(async move { while channels.outbound.recv().await.is_some() {} });
//!
//! let request = TransferOwnership::new(
//!     GroupOutPeer::new(42, 0x5eed),
//!     UserOutPeer::new(7, 0xcafe),
//! );
//! let reply: SeqDate = endpoint.send(&request).await?.recv().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod codec;
pub mod error;
pub mod message;
pub mod protocol;
pub mod rpc;

pub use error::{ProtoError, Result};
pub use protocol::{Frame, FrameBuffer, ValueReader, ValueWriter};
