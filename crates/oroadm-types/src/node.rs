//! Per-node port-mapping documents as stored by the controller.

use crate::{DeviceCategory, ParseError, PortMappingEntry, SchemaVersion, SwitchingPool};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope keys under which the controller returns port-mapping nodes.
const NODE_LIST_KEYS: [&str; 3] = ["transportpce-portmapping:nodes", "nodes", "node"];

/// `node-info` container of a port-mapping node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openroadm_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_clli: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_vendor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_model: Option<String>,
}

/// Port-mapping of one network element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodePortMapping {
    pub node_id: String,

    #[serde(default)]
    pub node_info: NodeInfo,

    #[serde(default)]
    pub mapping: Vec<PortMappingEntry>,

    #[serde(default)]
    pub switching_pool_lcp: Vec<SwitchingPool>,
}

impl NodePortMapping {
    /// Device category declared in `node-info`, if any.
    pub fn category(&self) -> Option<DeviceCategory> {
        self.node_info.node_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// Model version declared in `node-info`, if any.
    pub fn version(&self) -> Option<SchemaVersion> {
        self.node_info.openroadm_version.as_deref().map(SchemaVersion::new)
    }

    /// Looks up a row by logical connection point.
    pub fn entry(&self, lcp: &str) -> Option<&PortMappingEntry> {
        self.mapping.iter().find(|e| e.lcp() == lcp)
    }

    /// Parses every node found in a port-mapping document.
    ///
    /// Accepts the controller envelope (`transportpce-portmapping:nodes` or
    /// `nodes`, holding a list), the same lists wrapped in a `data` object,
    /// or a single bare node object.
    pub fn from_document(doc: &Value) -> Result<Vec<NodePortMapping>, ParseError> {
        let doc = doc.get("data").unwrap_or(doc);

        let nodes = NODE_LIST_KEYS.iter().find_map(|key| doc.get(*key));
        let nodes = match nodes {
            Some(Value::Array(list)) => list.clone(),
            Some(single @ Value::Object(_)) => vec![single.clone()],
            Some(other) => {
                return Err(ParseError::InvalidPortMapping(format!(
                    "node list is not an array: {}",
                    other
                )))
            }
            None if doc.get("node-id").is_some() => vec![doc.clone()],
            None => {
                return Err(ParseError::InvalidPortMapping(
                    "no port-mapping nodes found".to_string(),
                ))
            }
        };

        nodes
            .into_iter()
            .map(|node| {
                serde_json::from_value(node)
                    .map_err(|e| ParseError::InvalidPortMapping(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_controller_envelope() {
        let doc = json!({
            "transportpce-portmapping:nodes": [{
                "node-id": "XPDR-A1",
                "node-info": {"node-type": "xpdr", "openroadm-version": "7.1"},
                "mapping": [
                    {"logical-connection-point": "XPDR1-NETWORK1", "port-qual": "xpdr-network"}
                ]
            }]
        });
        let nodes = NodePortMapping::from_document(&doc).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_id, "XPDR-A1");
        assert_eq!(nodes[0].category(), Some(DeviceCategory::Xponder));
        assert_eq!(nodes[0].version(), Some(SchemaVersion::new("7.1")));
        assert!(nodes[0].entry("XPDR1-NETWORK1").is_some());
        assert!(nodes[0].switching_pool_lcp.is_empty());
    }

    #[test]
    fn test_parse_bare_node() {
        let doc = json!({"node-id": "ROADM-A1", "node-info": {"node-type": "rdm"}});
        let nodes = NodePortMapping::from_document(&doc).unwrap();
        assert_eq!(nodes[0].category(), Some(DeviceCategory::Roadm));
    }

    #[test]
    fn test_parse_rejects_unknown_document() {
        assert!(NodePortMapping::from_document(&json!({"foo": 1})).is_err());
        assert!(NodePortMapping::from_document(&json!({"nodes": 3})).is_err());
    }
}
