//! Catalog export - a serializable snapshot of the registered types.
//!
//! Peers and tooling occasionally need to see what a process can speak:
//! which headers are registered and how requests pair with replies. The
//! catalog is that snapshot, with a JSON rendering for logs and schema
//! diff tools.

use serde::Serialize;

use crate::error::Result;

/// One registered message type.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    /// Type name.
    pub name: &'static str,
    /// Fixed numeric header.
    pub header: u32,
    /// Declared reply header, for request types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<u32>,
}

/// Snapshot of a registry's catalog, sorted by header.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    /// Every registered type.
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Render as a single JSON line.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let catalog = Catalog {
            entries: vec![
                CatalogEntry {
                    name: "TransferOwnership",
                    header: 0xae5,
                    reply: Some(0x66),
                },
                CatalogEntry {
                    name: "SeqDate",
                    header: 0x66,
                    reply: None,
                },
            ],
        };

        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"TransferOwnership\""));
        assert!(json.contains("2789")); // 0xae5 as decimal
        assert!(!json.contains("\"reply\":null"));
    }

    #[test]
    fn test_empty_catalog() {
        let json = Catalog::default().to_json().unwrap();
        assert_eq!(json, "{\"entries\":[]}");
    }
}
