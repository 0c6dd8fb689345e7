//! Peer reference objects.
//!
//! Out-peers pair an entity id with the access hash proving the caller
//! may address it. They appear nested inside many request bodies and
//! never travel as top-level messages.

use crate::codec::Kind;
use crate::error::Result;
use crate::message::{FieldSpec, WireObject};
use crate::protocol::{ValueReader, ValueWriter};

/// Reference to a group the caller can act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOutPeer {
    /// Group id.
    pub group_id: i32,
    /// Access hash for this group, scoped to the caller.
    pub access_hash: i64,
}

impl GroupOutPeer {
    /// Create a group out-peer.
    pub fn new(group_id: i32, access_hash: i64) -> Self {
        Self {
            group_id,
            access_hash,
        }
    }
}

impl WireObject for GroupOutPeer {
    fn schema(&self) -> &'static [FieldSpec] {
        const SCHEMA: &[FieldSpec] = &[
            FieldSpec::required(1, Kind::Int32, "group_id"),
            FieldSpec::required(2, Kind::Int64, "access_hash"),
        ];
        SCHEMA
    }

    fn write_fields(&self, w: &mut ValueWriter) -> Result<()> {
        w.write_i32(1, self.group_id);
        w.write_i64(2, self.access_hash);
        Ok(())
    }

    fn read_fields(&mut self, r: &mut ValueReader) -> Result<()> {
        self.group_id = r.get_i32(1)?;
        self.access_hash = r.get_i64(2)?;
        Ok(())
    }
}

/// Reference to a user the caller can act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserOutPeer {
    /// User id.
    pub uid: i32,
    /// Access hash for this user, scoped to the caller.
    pub access_hash: i64,
}

impl UserOutPeer {
    /// Create a user out-peer.
    pub fn new(uid: i32, access_hash: i64) -> Self {
        Self { uid, access_hash }
    }
}

impl WireObject for UserOutPeer {
    fn schema(&self) -> &'static [FieldSpec] {
        const SCHEMA: &[FieldSpec] = &[
            FieldSpec::required(1, Kind::Int32, "uid"),
            FieldSpec::required(2, Kind::Int64, "access_hash"),
        ];
        SCHEMA
    }

    fn write_fields(&self, w: &mut ValueWriter) -> Result<()> {
        w.write_i32(1, self.uid);
        w.write_i64(2, self.access_hash);
        Ok(())
    }

    fn read_fields(&mut self, r: &mut ValueReader) -> Result<()> {
        self.uid = r.get_i32(1)?;
        self.access_hash = r.get_i64(2)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{decode_body, encode_body};

    #[test]
    fn test_group_peer_roundtrip() {
        let peer = GroupOutPeer::new(1234, -987654321);
        let decoded: GroupOutPeer = decode_body(encode_body(&peer).unwrap()).unwrap();
        assert_eq!(decoded, peer);
    }

    #[test]
    fn test_user_peer_roundtrip() {
        let peer = UserOutPeer::new(77, i64::MIN);
        let decoded: UserOutPeer = decode_body(encode_body(&peer).unwrap()).unwrap();
        assert_eq!(decoded, peer);
    }
}
