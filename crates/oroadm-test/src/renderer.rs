//! Device-side rendering of renderer RPCs
//!
//! Turns a `service-path` or `otn-service-path` request into the interfaces
//! and cross-connections an OpenROADM device holds afterwards. Names and
//! bodies are written out here from the device model; frequencies and
//! tributary allocations are taken from the request, the way a device
//! receives them.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use thiserror::Error;

use oroadm_types::{NodePortMapping, PortMappingEntry, PortRole, SignalRate};
use oroadm_verify::envelope::{as_list, field, str_field};

pub const SERVICE_PATH: &str = "transportpce-device-renderer:service-path";
pub const OTN_SERVICE_PATH: &str = "transportpce-device-renderer:otn-service-path";

/// 1.25G tributary slots of an ODU4 payload.
const ODU4_TRIB_SLOTS: u64 = 80;

/// 5G tributary slots per 100G slice of an OPUCn payload.
const OPUCN_SLICE_SLOTS: u64 = 20;

/// Why a request produced nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("unknown operation {0}")]
    UnknownRpc(String),

    /// The device refuses the request; answered with `success: false`.
    #[error("{0}")]
    Rejected(String),
}

type RenderResult<T> = Result<T, RenderError>;

fn rejected(message: impl Into<String>) -> RenderError {
    RenderError::Rejected(message.into())
}

/// One interface or cross-connection held by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResource {
    pub name: String,
    /// Key under which the renderer reports this resource in `node-interface`.
    pub output_key: &'static str,
    pub config: Value,
}

impl RenderedResource {
    pub fn is_connection(&self) -> bool {
        self.output_key == "connection-id"
    }
}

/// Resources one request touches, in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    pub description: String,
    pub resources: Vec<RenderedResource>,
}

impl Rendering {
    /// `node-interface` entry reported after a successful create.
    pub fn node_interface(&self, node_id: &str) -> Value {
        let mut entry = Map::new();
        entry.insert("node-id".to_string(), json!(node_id));
        for resource in &self.resources {
            let names = entry
                .entry(resource.output_key.to_string())
                .or_insert_with(|| json!([]));
            if let Value::Array(names) = names {
                names.push(json!(resource.name));
            }
        }
        Value::Object(entry)
    }

    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Spectrum parameters of an optical request.
struct Spectrum<'a> {
    suffix: String,
    center: &'a Value,
    min: &'a Value,
    max: &'a Value,
    width: &'a Value,
    modulation: &'a Value,
}

impl<'a> Spectrum<'a> {
    fn from_input(input: &'a Value) -> RenderResult<Self> {
        let number = |name: &str| field(input, name).ok_or_else(|| rejected(format!("missing {}", name)));
        let slot = |name: &str| {
            number(name)?
                .as_u64()
                .ok_or_else(|| rejected(format!("{} is not a slot number", name)))
        };
        Ok(Self {
            suffix: format!(
                "{}:{}",
                slot("lower-spectral-slot-number")?,
                slot("higher-spectral-slot-number")?
            ),
            center: number("center-freq")?,
            min: number("min-freq")?,
            max: number("max-freq")?,
            width: number("nmc-width")?,
            modulation: number("modulation-format")?,
        })
    }
}

/// Renders requests against one node's port mapping.
pub struct Renderer<'a> {
    mapping: &'a NodePortMapping,
    rates: &'a BTreeMap<String, SignalRate>,
}

impl<'a> Renderer<'a> {
    pub fn new(mapping: &'a NodePortMapping, rates: &'a BTreeMap<String, SignalRate>) -> Self {
        Self { mapping, rates }
    }

    /// Line rate a network port runs at: explicit override, else its
    /// advertised capability, else 100G.
    pub fn rate_for(&self, port: &PortMappingEntry) -> SignalRate {
        if let Some(rate) = self.rates.get(port.lcp()) {
            return *rate;
        }
        SignalRate::from_capabilities(port)
            .first()
            .copied()
            .unwrap_or(SignalRate::R100G)
    }

    pub fn render(&self, rpc: &str, input: &Value) -> RenderResult<Rendering> {
        let node_id = &self.mapping.node_id;
        let node = field(input, "nodes")
            .map(as_list)
            .unwrap_or_default()
            .iter()
            .find(|n| str_field(n, "node-id") == Some(node_id.as_str()))
            .ok_or_else(|| rejected(format!("node {} is not on the path", node_id)))?;

        match rpc {
            SERVICE_PATH => self.optical(input, node),
            OTN_SERVICE_PATH => self.otn(input, node),
            other => Err(RenderError::UnknownRpc(other.to_string())),
        }
    }

    fn port(&self, node: &Value, key: &str) -> RenderResult<&'a PortMappingEntry> {
        let lcp = str_field(node, key).ok_or_else(|| rejected(format!("missing {}", key)))?;
        self.mapping
            .entry(lcp)
            .ok_or_else(|| rejected(format!("unknown logical connection point {}", lcp)))
    }

    fn optical(&self, input: &Value, node: &Value) -> RenderResult<Rendering> {
        let spectrum = Spectrum::from_input(input)?;
        let dst = self.port(node, "dest-tp")?;
        let src = match str_field(node, "src-tp") {
            Some(_) => Some(self.port(node, "src-tp")?),
            None => None,
        };

        match (src.map(PortMappingEntry::role), dst.role()) {
            (None | Some(Some(PortRole::XponderClient)), Some(PortRole::XponderNetwork)) => {
                Ok(self.xponder(dst, src, &spectrum))
            }
            (Some(Some(PortRole::Srg)), Some(PortRole::Degree)) => match src {
                Some(src) => Ok(roadm(src, dst, dst, src, &spectrum)),
                None => Err(rejected("missing src-tp")),
            },
            (Some(Some(PortRole::Degree)), Some(PortRole::Srg)) => match src {
                Some(src) => Ok(roadm(src, dst, src, dst, &spectrum)),
                None => Err(rejected("missing src-tp")),
            },
            _ => Err(rejected(format!("cannot render a path to {}", dst.lcp()))),
        }
    }

    fn xponder(
        &self,
        network: &PortMappingEntry,
        client: Option<&PortMappingEntry>,
        spectrum: &Spectrum<'_>,
    ) -> Rendering {
        let rate = self.rate_for(network);
        let mut resources = line_stack(network, rate, spectrum);
        if let Some(client) = client {
            let name = format!("{}-ETHERNET", client.lcp());
            let speed = rate.gbps() * 1000;
            resources.push(interface(
                &name,
                "eth-interface-id",
                "ethernetCsmacd",
                client,
                None,
                "org-openroadm-ethernet-interfaces:ethernet",
                json!({"speed": speed, "fec": "off", "duplex": "full", "mtu": 9000}),
            ));
        }
        Rendering {
            description: format!("optical service on {}", network.lcp()),
            resources,
        }
    }

    fn otn(&self, input: &Value, node: &Value) -> RenderResult<Rendering> {
        let client = self.port(node, "client-tp")?;
        let network = self.port(node, "network-tp")?;
        let (eth_suffix, odu, odu_rate, slots_needed) = match field(input, "service-rate").and_then(Value::as_u64) {
            Some(10) => ("ETHERNET10G", "ODU2e", "org-openroadm-otn-common-types:ODU2e", 8),
            Some(100) => ("ETHERNET100G", "ODU4", "org-openroadm-otn-common-types:ODU4", 80),
            other => return Err(rejected(format!("unsupported service-rate {:?}", other))),
        };
        let speed = if odu == "ODU2e" { 10_000 } else { 100_000 };

        let network_rate = self.rate_for(network);
        let parent = match network_rate {
            SignalRate::R100G => format!("{}-ODU4", network.lcp()),
            SignalRate::R200G => format!("{}-ODUC2", network.lcp()),
            SignalRate::R300G => format!("{}-ODUC3", network.lcp()),
            SignalRate::R400G => format!("{}-ODUC4", network.lcp()),
        };
        let allocation = parent_allocation(input, network_rate, slots_needed)?;

        let eth = format!("{}-{}", client.lcp(), eth_suffix);
        let client_odu = format!("{}-{}", client.lcp(), odu);
        let tributary = format!("{}-{}-{}", network.lcp(), odu, client.lcp());
        let resources = vec![
            interface(
                &eth,
                "eth-interface-id",
                "ethernetCsmacd",
                client,
                None,
                "org-openroadm-ethernet-interfaces:ethernet",
                json!({"speed": speed, "fec": "off", "duplex": "full", "mtu": 9000}),
            ),
            interface(
                &client_odu,
                "odu-interface-id",
                "otnOdu",
                client,
                Some(&eth),
                "org-openroadm-otn-odu-interfaces:odu",
                json!({
                    "rate": odu_rate,
                    "odu-function": "org-openroadm-otn-common-types:ODU-TTP-CTP",
                    "monitoring-mode": "terminated",
                    "tx-sapi": "AA",
                }),
            ),
            interface(
                &tributary,
                "odu-interface-id",
                "otnOdu",
                network,
                Some(&parent),
                "org-openroadm-otn-odu-interfaces:odu",
                json!({
                    "rate": odu_rate,
                    "odu-function": "org-openroadm-otn-common-types:ODU-CTP",
                    "monitoring-mode": "monitored",
                    "parent-odu-allocation": allocation,
                }),
            ),
        ];
        Ok(Rendering {
            description: format!("{} client service {} on {}", odu, client.lcp(), network.lcp()),
            resources,
        })
    }
}

/// Reads the tributary allocation of a client service and checks it fits
/// the parent payload.
fn parent_allocation(input: &Value, network_rate: SignalRate, slots_needed: usize) -> RenderResult<Value> {
    let trib_port = field(input, "trib-port-number")
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .ok_or_else(|| rejected("missing trib-port-number"))?;

    if let Some(slices) = network_rate.slices() {
        let slots = field(input, "opucn-trib-slots")
            .and_then(Value::as_array)
            .ok_or_else(|| rejected("missing opucn-trib-slots"))?;
        for slot in slots {
            let (slice, index) = slot
                .as_str()
                .and_then(|s| s.split_once('.'))
                .and_then(|(a, b)| Some((a.parse::<u64>().ok()?, b.parse::<u64>().ok()?)))
                .ok_or_else(|| rejected(format!("malformed opucn slot {}", slot)))?;
            if slice == 0 || slice > u64::from(slices) || index == 0 || index > OPUCN_SLICE_SLOTS {
                return Err(rejected(format!("opucn slot {} outside the payload", slot)));
            }
        }
        if slots.len() != slots_needed / 4 {
            return Err(rejected(format!("{} opucn slots, expected {}", slots.len(), slots_needed / 4)));
        }
        Ok(json!({"trib-port-number": trib_port, "opucn-trib-slots": slots}))
    } else {
        let slots = field(input, "trib-slot")
            .and_then(Value::as_array)
            .ok_or_else(|| rejected("missing trib-slot"))?;
        if slots
            .iter()
            .any(|s| s.as_u64().map_or(true, |n| n == 0 || n > ODU4_TRIB_SLOTS))
        {
            return Err(rejected(format!("trib-slot {:?} outside the ODU4 payload", slots)));
        }
        if slots.len() != slots_needed {
            return Err(rejected(format!("{} trib slots, expected {}", slots.len(), slots_needed)));
        }
        Ok(json!({"trib-port-number": trib_port, "trib-slots": slots}))
    }
}

/// Line-side interfaces of an xponder network port, lowest layer first.
fn line_stack(port: &PortMappingEntry, rate: SignalRate, spectrum: &Spectrum<'_>) -> Vec<RenderedResource> {
    let lcp = port.lcp();
    let terminated_odu = |rate_name: &str| {
        json!({
            "rate": format!("org-openroadm-otn-common-types:{}", rate_name),
            "odu-function": "org-openroadm-otn-common-types:ODU-TTP",
            "monitoring-mode": "terminated",
            "tx-sapi": "AA",
        })
    };

    let (otsi_rate, n) = match rate {
        SignalRate::R100G => {
            let otu = format!("{}-OTU", lcp);
            let odu = format!("{}-ODU4", lcp);
            return vec![
                interface(
                    &otu,
                    "otu-interface-id",
                    "otnOtu",
                    port,
                    None,
                    "org-openroadm-otn-otu-interfaces:otu",
                    json!({
                        "rate": "org-openroadm-otn-common-types:OTU4",
                        "fec": "org-openroadm-common-types:scfec",
                        "degm-intervals": 2,
                    }),
                ),
                interface(
                    &odu,
                    "odu-interface-id",
                    "otnOdu",
                    port,
                    Some(&otu),
                    "org-openroadm-otn-odu-interfaces:odu",
                    terminated_odu("ODU4"),
                ),
            ];
        }
        SignalRate::R200G => ("R200G-otsi", 2),
        SignalRate::R300G => ("R300G-otsi", 3),
        SignalRate::R400G => ("R400G-otsi", 4),
    };
    let otsi_rate = format!("org-openroadm-common-optical-channel-types:{}", otsi_rate);

    let otsi = format!("{}-{}", lcp, spectrum.suffix);
    let group = format!("{}-OTSIGROUP-{}G", lcp, n * 100);
    let otu = format!("{}-OTUC{}", lcp, n);
    let odu = format!("{}-ODUC{}", lcp, n);
    let oducn = {
        let mut body = terminated_odu("ODUCn");
        body["oducn-n-rate"] = json!(n);
        body
    };
    vec![
        interface(
            &otsi,
            "och-interface-id",
            "otsi",
            port,
            None,
            "org-openroadm-optical-tributary-signal-interfaces:otsi",
            json!({
                "frequency": spectrum.center,
                "otsi-rate": otsi_rate,
                "modulation-format": spectrum.modulation,
                "fec": "org-openroadm-common-types:ofec",
                "provision-mode": "explicit",
                "transmit-power": -5,
            }),
        ),
        interface(
            &group,
            "och-interface-id",
            "otsi-group",
            port,
            Some(&otsi),
            "org-openroadm-otsi-group-interfaces:otsi-group",
            json!({"group-id": 1, "group-rate": otsi_rate}),
        ),
        interface(
            &otu,
            "otu-interface-id",
            "otnOtu",
            port,
            Some(&group),
            "org-openroadm-otn-otu-interfaces:otu",
            json!({"rate": "org-openroadm-otn-common-types:OTUCn", "otucn-n-rate": n}),
        ),
        interface(
            &odu,
            "odu-interface-id",
            "otnOdu",
            port,
            Some(&otu),
            "org-openroadm-otn-odu-interfaces:odu",
            oducn,
        ),
    ]
}

/// Media channel on the degree, network media channels on both ends and the
/// cross-connection between them.
fn roadm(
    src: &PortMappingEntry,
    dst: &PortMappingEntry,
    degree: &PortMappingEntry,
    srg: &PortMappingEntry,
    spectrum: &Spectrum<'_>,
) -> Rendering {
    let suffix = &spectrum.suffix;
    let mc = format!("{}-mc-{}", degree.lcp(), suffix);
    let degree_nmc = format!("{}-nmc-{}", degree.lcp(), suffix);
    let srg_nmc = format!("{}-nmc-{}", srg.lcp(), suffix);
    let nmc_of = |port: &PortMappingEntry| format!("{}-nmc-{}", port.lcp(), suffix);
    let connection = format!("{}-{}-{}", src.lcp(), dst.lcp(), suffix);
    let nmc_body = json!({"frequency": spectrum.center, "width": spectrum.width});

    let resources = vec![
        interface(
            &mc,
            "och-interface-id",
            "mediaChannelTrailTerminationPoint",
            degree,
            None,
            "org-openroadm-media-channel-interfaces:mc-ttp",
            json!({"min-freq": spectrum.min, "max-freq": spectrum.max}),
        ),
        interface(
            &degree_nmc,
            "och-interface-id",
            "networkMediaChannelConnectionTerminationPoint",
            degree,
            Some(&mc),
            "org-openroadm-network-media-channel-interfaces:nmc-ctp",
            nmc_body.clone(),
        ),
        interface(
            &srg_nmc,
            "och-interface-id",
            "networkMediaChannelConnectionTerminationPoint",
            srg,
            None,
            "org-openroadm-network-media-channel-interfaces:nmc-ctp",
            nmc_body,
        ),
        RenderedResource {
            config: json!({
                "connection-name": connection,
                "opticalControlMode": "off",
                "target-output-power": -3.0,
                "source": {"src-if": nmc_of(src)},
                "destination": {"dst-if": nmc_of(dst)},
            }),
            name: connection,
            output_key: "connection-id",
        },
    ];
    Rendering {
        description: format!("add/drop {} -> {}", src.lcp(), dst.lcp()),
        resources,
    }
}

fn interface(
    name: &str,
    output_key: &'static str,
    if_type: &str,
    port: &PortMappingEntry,
    supporting: Option<&str>,
    layer_key: &str,
    layer: Value,
) -> RenderedResource {
    let mut config = json!({
        "name": name,
        "type": format!("org-openroadm-interfaces:{}", if_type),
        "administrative-state": "inService",
        "operational-state": "inService",
        "supporting-circuit-pack-name": port.supporting_circuit_pack_name,
        "supporting-port": port.supporting_port,
    });
    if let Some(parent) = supporting {
        config["supporting-interface-list"] = json!([parent]);
    }
    config[layer_key] = layer;
    RenderedResource {
        name: name.to_string(),
        output_key,
        config,
    }
}
