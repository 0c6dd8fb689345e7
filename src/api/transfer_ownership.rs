//! Group ownership transfer request.

use super::peers::{GroupOutPeer, UserOutPeer};
use super::seq_date::SeqDate;
use crate::codec::Kind;
use crate::error::Result;
use crate::message::{Call, FieldSpec, MessageType, WireObject};
use crate::protocol::{ValueReader, ValueWriter};

/// Hand a group's ownership to another member.
///
/// Both fields are required; the reply is the [`SeqDate`] of the applied
/// ownership change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOwnership {
    /// Group whose ownership changes hands.
    pub group_peer: GroupOutPeer,
    /// Member receiving ownership.
    pub new_owner: UserOutPeer,
}

impl TransferOwnership {
    /// Create a transfer request.
    pub fn new(group_peer: GroupOutPeer, new_owner: UserOutPeer) -> Self {
        Self {
            group_peer,
            new_owner,
        }
    }
}

impl MessageType for TransferOwnership {
    const HEADER: u32 = 0xae5;
    const NAME: &'static str = "TransferOwnership";
}

impl Call for TransferOwnership {
    type Reply = SeqDate;
}

impl WireObject for TransferOwnership {
    fn schema(&self) -> &'static [FieldSpec] {
        const SCHEMA: &[FieldSpec] = &[
            FieldSpec::required(1, Kind::Object, "group_peer"),
            FieldSpec::required(2, Kind::Object, "new_owner"),
        ];
        SCHEMA
    }

    fn write_fields(&self, w: &mut ValueWriter) -> Result<()> {
        w.write_object(1, &self.group_peer)?;
        w.write_object(2, &self.new_owner)?;
        Ok(())
    }

    fn read_fields(&mut self, r: &mut ValueReader) -> Result<()> {
        self.group_peer = r.get_object(1)?;
        self.new_owner = r.get_object(2)?;
        Ok(())
    }
}
