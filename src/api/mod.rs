//! Generated-style message catalog sample.
//!
//! In a full deployment this module is emitted by the schema generator,
//! one type per message; the handful here is the slice the rest of the
//! crate exercises. Each type declares its field schema, its fixed
//! header, and - for requests - its reply type.

mod peers;
mod seq_date;
mod transfer_ownership;

pub use peers::{GroupOutPeer, UserOutPeer};
pub use seq_date::{Ping, SeqDate, VoidReply};
pub use transfer_ownership::TransferOwnership;
