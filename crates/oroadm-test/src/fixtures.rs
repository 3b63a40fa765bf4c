//! Test fixtures for common OpenROADM node shapes
//!
//! Port mappings and device configuration documents for a transponder, a
//! switchponder (muxponder plus switch xponders) and a two-degree ROADM.

use serde_json::{json, Value};

use oroadm_types::{
    NodeInfo, NodePortMapping, NonBlockingGroup, PoolType, PortMappingEntry, PortQual,
    SwitchingPool, XponderType,
};
use oroadm_verify::session::DEVICE_ROOT;

pub const XPDR_NODE: &str = "XPDR-A1";
pub const SPDR_NODE: &str = "SPDR-SA1";
pub const ROADM_NODE: &str = "ROADM-A1";

const CAP_OTU4: &str = "org-openroadm-port-types:if-OCH-OTU4-ODU4";
const CAP_OTSI: &str = "org-openroadm-port-types:if-otsi-otsigroup";
const CAP_100GE: &str = "org-openroadm-port-types:if-100GE";
const CAP_10GE_ODU2E: &str = "org-openroadm-port-types:if-10GE-ODU2e";
const CAP_100GE_ODU4: &str = "org-openroadm-port-types:if-100GE-ODU4";

/// 10G interconnect bandwidth unit, in bits per second.
pub const BANDWIDTH_10G: u64 = 10_000_000_000;

fn node(node_id: &str, node_type: &str, version: &str) -> NodePortMapping {
    NodePortMapping {
        node_id: node_id.to_string(),
        node_info: NodeInfo {
            node_type: Some(node_type.to_string()),
            openroadm_version: Some(version.to_string()),
            node_clli: Some("NodeA".to_string()),
            node_vendor: Some("vendorA".to_string()),
            node_model: None,
        },
        mapping: Vec::new(),
        switching_pool_lcp: Vec::new(),
    }
}

fn xpdr_port(lcp: &str, qual: PortQual, xpdr: XponderType, cp: &str, port: &str, cap: &str) -> PortMappingEntry {
    PortMappingEntry::new(lcp)
        .with_qual(qual)
        .with_xpdr_type(xpdr)
        .with_supporting(cp, port)
        .with_capabilities([cap])
}

fn roadm_port(lcp: &str, cp: &str, port: &str) -> PortMappingEntry {
    PortMappingEntry::new(lcp)
        .with_qual(PortQual::RoadmExternal)
        .with_supporting(cp, port)
}

/// Port mapping fixtures
pub mod mapping_fixtures {
    use super::*;

    /// 100G transponder: one network port paired with one client port
    pub fn transponder() -> NodePortMapping {
        let mut node = node(XPDR_NODE, "xpdr", "2.2.1");
        node.mapping = vec![
            xpdr_port(
                "XPDR1-NETWORK1",
                PortQual::XpdrNetwork,
                XponderType::Tpdr,
                "1/0/1-PLUG-NET",
                "1",
                CAP_OTU4,
            )
            .with_connection_map("XPDR1-CLIENT1"),
            xpdr_port(
                "XPDR1-CLIENT1",
                PortQual::XpdrClient,
                XponderType::Tpdr,
                "1/0/C1-PLUG-CLIENT",
                "C1",
                CAP_100GE,
            )
            .with_connection_map("XPDR1-NETWORK1"),
        ];
        node
    }

    /// Switchponder with a 4x10G muxponder (XPDR1) and a 2x100G switch (XPDR2)
    pub fn switchponder() -> NodePortMapping {
        let mut node = node(SPDR_NODE, "xpdr", "7.1");
        node.mapping = vec![
            xpdr_port(
                "XPDR1-NETWORK1",
                PortQual::SwitchNetwork,
                XponderType::Mpdr,
                "CP1-CFP0",
                "CP1-CFP0-P1",
                CAP_OTU4,
            ),
            xpdr_port(
                "XPDR2-NETWORK1",
                PortQual::SwitchNetwork,
                XponderType::Switch,
                "CP5-CFP",
                "CP5-CFP-P1",
                CAP_OTSI,
            ),
        ];
        for i in 1..=4 {
            node.mapping.push(xpdr_port(
                &format!("XPDR1-CLIENT{}", i),
                PortQual::SwitchClient,
                XponderType::Mpdr,
                &format!("CP1-SFP{}", i),
                &format!("CP1-SFP{}-P1", i),
                CAP_10GE_ODU2E,
            ));
        }
        for i in 1..=2 {
            node.mapping.push(xpdr_port(
                &format!("XPDR2-CLIENT{}", i),
                PortQual::SwitchClient,
                XponderType::Switch,
                &format!("CP{}-QSFP1", i + 1),
                &format!("CP{}-QSFP1-P1", i + 1),
                CAP_100GE_ODU4,
            ));
        }
        node.switching_pool_lcp = vec![
            SwitchingPool::new(
                1,
                PoolType::NonBlocking,
                vec![NonBlockingGroup::new(
                    1,
                    [
                        "XPDR1-NETWORK1",
                        "XPDR1-CLIENT1",
                        "XPDR1-CLIENT2",
                        "XPDR1-CLIENT3",
                        "XPDR1-CLIENT4",
                    ],
                )
                .with_bandwidth_unit(BANDWIDTH_10G)],
            ),
            SwitchingPool::new(
                2,
                PoolType::Blocking,
                vec![NonBlockingGroup::new(
                    1,
                    ["XPDR2-NETWORK1", "XPDR2-CLIENT1", "XPDR2-CLIENT2"],
                )],
            ),
        ];
        node
    }

    /// Two-degree ROADM with one add/drop port
    pub fn roadm() -> NodePortMapping {
        let mut node = node(ROADM_NODE, "rdm", "2.2.1");
        node.mapping = vec![
            roadm_port("DEG1-TTP-TXRX", "1/0", "L1"),
            roadm_port("DEG2-TTP-TXRX", "2/0", "L1"),
            roadm_port("SRG1-PP1-TXRX", "3/0", "C1"),
        ];
        node
    }

    /// Controller envelope holding the given nodes
    pub fn document(nodes: &[NodePortMapping]) -> Value {
        json!({ "transportpce-portmapping:nodes": nodes })
    }
}

/// Device configuration fixtures
pub mod device_fixtures {
    use super::*;

    fn info(node_id: &str, node_type: &str) -> Value {
        json!({
            "node-id": node_id,
            "node-number": 1,
            "node-type": node_type,
            "clli": "NodeA",
            "vendor": "vendorA",
            "model": "model1",
            "serial-id": "0000001",
            "softwareVersion": "openroadm2.2.1",
        })
    }

    fn shelf(circuit_packs: &[&str]) -> Value {
        let slots: Vec<Value> = circuit_packs
            .iter()
            .enumerate()
            .map(|(i, cp)| {
                json!({
                    "slot-name": (i + 1).to_string(),
                    "label": (i + 1).to_string(),
                    "provisioned-circuit-pack": cp,
                })
            })
            .collect();
        json!({
            "shelf-name": "1",
            "shelf-type": "Shelf",
            "rack": "rack1",
            "shelf-position": "1",
            "administrative-state": "inService",
            "vendor": "vendorA",
            "model": "Shelf",
            "serial-id": "S0001",
            "operational-state": "inService",
            "slots": slots,
        })
    }

    fn port(name: &str, qual: &str, caps: &[&str]) -> Value {
        let caps: Vec<Value> = caps.iter().map(|c| json!({"if-cap-type": c})).collect();
        json!({
            "port-name": name,
            "port-type": "port",
            "port-qual": qual,
            "port-direction": "bidirectional",
            "administrative-state": "inService",
            "operational-state": "inService",
            "supported-interface-capability": caps,
        })
    }

    fn circuit_pack(name: &str, slot: usize, ports: Vec<Value>) -> Value {
        json!({
            "circuit-pack-name": name,
            "circuit-pack-type": "port",
            "shelf": "1",
            "slot": slot.to_string(),
            "vendor": "vendorA",
            "model": "CP",
            "serial-id": format!("CP{:04}", slot),
            "administrative-state": "inService",
            "operational-state": "inService",
            "equipment-state": "not-reserved-inuse",
            "ports": ports,
        })
    }

    fn wrap(device: Value) -> Value {
        let mut document = serde_json::Map::new();
        document.insert(DEVICE_ROOT.to_string(), device);
        Value::Object(document)
    }

    /// Conformant 2.2.1 transponder configuration
    pub fn transponder() -> Value {
        wrap(json!({
            "info": info(XPDR_NODE, "xpdr"),
            "shelves": [shelf(&["1/0/1-PLUG-NET", "1/0/C1-PLUG-CLIENT"])],
            "circuit-packs": [
                circuit_pack("1/0/1-PLUG-NET", 1, vec![port("1", "xpdr-network", &[CAP_OTU4])]),
                circuit_pack("1/0/C1-PLUG-CLIENT", 2, vec![port("C1", "xpdr-client", &[CAP_100GE])]),
            ],
            "xponder": [{
                "xpdr-number": 1,
                "xpdr-type": "tpdr",
                "xpdr-port": [
                    {"index": 1, "circuit-pack-name": "1/0/1-PLUG-NET", "port-name": "1"},
                    {"index": 2, "circuit-pack-name": "1/0/C1-PLUG-CLIENT", "port-name": "C1"},
                ],
            }],
        }))
    }

    /// Transponder configuration whose `info` lacks `serial-id`
    pub fn transponder_without_serial_id() -> Value {
        let mut document = transponder();
        if let Some(info) = document
            .get_mut(DEVICE_ROOT)
            .and_then(|d| d.get_mut("info"))
            .and_then(Value::as_object_mut)
        {
            info.remove("serial-id");
        }
        document
    }

    /// Conformant 2.2.1 ROADM configuration
    pub fn roadm() -> Value {
        wrap(json!({
            "info": info(ROADM_NODE, "rdm"),
            "shelves": [shelf(&["1/0", "2/0", "3/0"])],
            "circuit-packs": [
                circuit_pack("1/0", 1, vec![port("L1", "roadm-external", &[])]),
                circuit_pack("2/0", 2, vec![port("L1", "roadm-external", &[])]),
                circuit_pack("3/0", 3, vec![port("C1", "roadm-external", &[])]),
            ],
            "degree": [
                {
                    "degree-number": 1,
                    "max-wavelengths": 96,
                    "circuit-packs": [{"index": 1, "circuit-pack-name": "1/0"}],
                    "connection-ports": [{"index": 1, "circuit-pack-name": "1/0", "port-name": "L1"}],
                },
                {
                    "degree-number": 2,
                    "max-wavelengths": 96,
                    "circuit-packs": [{"index": 1, "circuit-pack-name": "2/0"}],
                    "connection-ports": [{"index": 1, "circuit-pack-name": "2/0", "port-name": "L1"}],
                },
            ],
            "shared-risk-group": [{
                "srg-number": 1,
                "max-add-drop-ports": 16,
                "wavelength-duplication": "one-per-srg",
                "circuit-packs": [{"index": 1, "circuit-pack-name": "3/0"}],
                "current-provisioned-add-drop-ports": 1,
            }],
        }))
    }
}
