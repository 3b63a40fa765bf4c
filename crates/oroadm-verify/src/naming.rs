//! Deterministic interface naming and renderer call plans.
//!
//! Every name is derived from a port's logical connection point plus a rate
//! or spectrum suffix, so repeated runs converge on the same resources.
//! A [`CyclePlan`] bundles the RPC input for one create/delete cycle with the
//! resources it is expected to produce and their expected partial
//! configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use oroadm_types::{PortMappingEntry, SignalRate};

/// Optical (wavelength) path set-up RPC.
pub const SERVICE_PATH: &str = "transportpce-device-renderer:service-path";

/// Digital (OTN) path set-up RPC.
pub const OTN_SERVICE_PATH: &str = "transportpce-device-renderer:otn-service-path";

const ANCHOR_THZ: f64 = 191.325;
const SLOT_THZ: f64 = 0.006_25;

const IF_TYPES: &str = "org-openroadm-interfaces";
const OTN_TYPES: &str = "org-openroadm-otn-common-types";
const OCH_TYPES: &str = "org-openroadm-common-optical-channel-types";

/// 1.25G tributary slots in an ODU4 payload.
const ODU4_TRIB_SLOTS: u32 = 80;
/// 5G tributary slots per 100G slice of an OPUCn payload.
const OPUCN_SLICE_SLOTS: u32 = 20;

/// A contiguous range of 6.25 GHz spectral slots, e.g. `761:768`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spectrum {
    pub min_slot: u32,
    pub max_slot: u32,
}

impl Default for Spectrum {
    fn default() -> Self {
        Self::new(761, 768)
    }
}

impl Spectrum {
    pub const fn new(min_slot: u32, max_slot: u32) -> Self {
        Self { min_slot, max_slot }
    }

    /// Lower edge frequency in THz.
    pub fn min_freq(&self) -> f64 {
        round_thz(ANCHOR_THZ + f64::from(self.min_slot.saturating_sub(1)) * SLOT_THZ)
    }

    /// Upper edge frequency in THz.
    pub fn max_freq(&self) -> f64 {
        round_thz(ANCHOR_THZ + f64::from(self.max_slot) * SLOT_THZ)
    }

    /// Center frequency in THz.
    pub fn center_freq(&self) -> f64 {
        round_thz((self.min_freq() + self.max_freq()) / 2.0)
    }

    /// Width in GHz.
    pub fn width(&self) -> f64 {
        f64::from(self.max_slot + 1 - self.min_slot) * 6.25
    }

    pub fn is_valid(&self) -> bool {
        self.min_slot >= 1 && self.min_slot <= self.max_slot
    }
}

impl fmt::Display for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.min_slot, self.max_slot)
    }
}

fn round_thz(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

/// Renderer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
}

impl Operation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
        }
    }
}

/// Kind of a created resource, as listed in the renderer's `node-interface` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Och,
    Otu,
    Odu,
    Eth,
    Connection,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Och,
        ResourceKind::Otu,
        ResourceKind::Odu,
        ResourceKind::Eth,
        ResourceKind::Connection,
    ];

    /// Key of this kind in a `node-interface` entry.
    pub const fn output_key(&self) -> &'static str {
        match self {
            ResourceKind::Och => "och-interface-id",
            ResourceKind::Otu => "otu-interface-id",
            ResourceKind::Odu => "odu-interface-id",
            ResourceKind::Eth => "eth-interface-id",
            ResourceKind::Connection => "connection-id",
        }
    }
}

/// Client service carried over a switching network port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// 10GE over ODU2e (muxponder).
    Ethernet10G,
    /// 100GE over ODU4 (switch).
    Ethernet100G,
}

impl ClientKind {
    pub const fn service_rate(&self) -> u32 {
        match self {
            ClientKind::Ethernet10G => 10,
            ClientKind::Ethernet100G => 100,
        }
    }

    pub const fn odu(&self) -> &'static str {
        match self {
            ClientKind::Ethernet10G => "ODU2e",
            ClientKind::Ethernet100G => "ODU4",
        }
    }

    /// 1.25G tributary slots taken on an ODU4 parent.
    const fn odu4_slots(&self) -> u32 {
        match self {
            ClientKind::Ethernet10G => 8,
            ClientKind::Ethernet100G => 80,
        }
    }

    /// 5G tributary slots taken on an ODUCn parent.
    const fn oducn_slots(&self) -> u32 {
        match self {
            ClientKind::Ethernet10G => 2,
            ClientKind::Ethernet100G => 20,
        }
    }

    /// Clients of this kind that fit on a network port running `network_rate`.
    pub fn capacity(&self, network_rate: SignalRate) -> u32 {
        match network_rate.slices() {
            Some(n) => u32::from(n) * OPUCN_SLICE_SLOTS / self.oducn_slots(),
            None => ODU4_TRIB_SLOTS / self.odu4_slots(),
        }
    }
}

pub fn otsi_name(lcp: &str, spectrum: &Spectrum) -> String {
    format!("{}-{}", lcp, spectrum)
}

pub fn otsi_group_name(lcp: &str, rate: SignalRate) -> String {
    format!("{}-OTSIGROUP-{}", lcp, rate)
}

pub fn otu_name(lcp: &str, rate: SignalRate) -> String {
    match rate.slices() {
        None => format!("{}-OTU", lcp),
        Some(n) => format!("{}-OTUC{}", lcp, n),
    }
}

pub fn odu_name(lcp: &str, rate: SignalRate) -> String {
    match rate.slices() {
        None => format!("{}-ODU4", lcp),
        Some(n) => format!("{}-ODUC{}", lcp, n),
    }
}

pub fn ethernet_name(lcp: &str) -> String {
    format!("{}-ETHERNET", lcp)
}

pub fn client_ethernet_name(lcp: &str, kind: ClientKind) -> String {
    format!("{}-ETHERNET{}G", lcp, kind.service_rate())
}

pub fn client_odu_name(lcp: &str, kind: ClientKind) -> String {
    format!("{}-{}", lcp, kind.odu())
}

/// Network-side tributary ODU carrying one client, e.g. `NET-ODU2e-CLI`.
pub fn tributary_odu_name(network_lcp: &str, kind: ClientKind, client_lcp: &str) -> String {
    format!("{}-{}-{}", network_lcp, kind.odu(), client_lcp)
}

pub fn nmc_name(lcp: &str, spectrum: &Spectrum) -> String {
    format!("{}-nmc-{}", lcp, spectrum)
}

pub fn mc_name(lcp: &str, spectrum: &Spectrum) -> String {
    format!("{}-mc-{}", lcp, spectrum)
}

pub fn connection_name(src: &str, dst: &str, spectrum: &Spectrum) -> String {
    format!("{}-{}-{}", src, dst, spectrum)
}

/// One resource a cycle is expected to create.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedResource {
    pub name: String,
    pub kind: ResourceKind,
    /// Partial configuration the observed resource must contain.
    pub expected: Value,
}

impl PlannedResource {
    pub fn is_connection(&self) -> bool {
        self.kind == ResourceKind::Connection
    }
}

/// Identity shared by every plan of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanContext {
    pub node_id: String,
    pub service_name: String,
    pub spectrum: Spectrum,
}

/// Input and expectations of one create/delete cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclePlan {
    /// Human-readable label used in logs.
    pub label: String,
    /// RPC invoked for both create and delete.
    pub rpc: &'static str,
    /// Resources in creation order.
    pub resources: Vec<PlannedResource>,
    /// Interface checked for PM samples and alarms.
    pub primary: String,
    node_id: String,
    input: Map<String, Value>,
}

impl CyclePlan {
    /// RPC input for the given operation.
    pub fn input(&self, operation: Operation) -> Value {
        let mut input = self.input.clone();
        input.insert("operation".to_string(), json!(operation.as_str()));
        json!({ "input": Value::Object(input) })
    }

    /// Expected `node-interface` entry of a successful create.
    pub fn expected_node_interface(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("node-id".to_string(), json!(self.node_id));
        for kind in ResourceKind::ALL {
            let names: Vec<&str> = self
                .resources
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.name.as_str())
                .collect();
            if !names.is_empty() {
                entry.insert(kind.output_key().to_string(), json!(names));
            }
        }
        Value::Object(entry)
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn resource(&self, name: &str) -> Option<&PlannedResource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

fn interface(name: &str, if_type: &str, port: &PortMappingEntry, supporting: Option<&str>) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert("name".to_string(), json!(name));
    object.insert("type".to_string(), json!(format!("{}:{}", IF_TYPES, if_type)));
    object.insert("administrative-state".to_string(), json!("inService"));
    object.insert(
        "supporting-circuit-pack-name".to_string(),
        json!(port.supporting_circuit_pack_name),
    );
    object.insert("supporting-port".to_string(), json!(port.supporting_port));
    if let Some(parent) = supporting {
        object.insert("supporting-interface-list".to_string(), json!([parent]));
    }
    object
}

fn resource(name: String, kind: ResourceKind, mut body: Map<String, Value>, extra: Value) -> PlannedResource {
    if let Value::Object(extra) = extra {
        body.extend(extra);
    }
    PlannedResource {
        name,
        kind,
        expected: Value::Object(body),
    }
}

fn otsi_rate(rate: SignalRate) -> String {
    format!("{}:R{}-otsi", OCH_TYPES, rate)
}

/// Network-side stack of an xponder port, lowest layer first.
fn network_stack(ctx: &PlanContext, port: &PortMappingEntry, rate: SignalRate) -> Vec<PlannedResource> {
    let lcp = port.lcp();
    let otu = otu_name(lcp, rate);
    let odu = odu_name(lcp, rate);

    match rate.slices() {
        None => vec![
            resource(
                otu.clone(),
                ResourceKind::Otu,
                interface(&otu, "otnOtu", port, None),
                json!({"org-openroadm-otn-otu-interfaces:otu": {
                    "rate": format!("{}:OTU4", OTN_TYPES),
                    "fec": format!("org-openroadm-common-types:{}", rate.fec()),
                }}),
            ),
            resource(
                odu.clone(),
                ResourceKind::Odu,
                interface(&odu, "otnOdu", port, Some(&otu)),
                json!({"org-openroadm-otn-odu-interfaces:odu": {
                    "rate": format!("{}:ODU4", OTN_TYPES),
                    "odu-function": format!("{}:ODU-TTP", OTN_TYPES),
                    "monitoring-mode": "terminated",
                }}),
            ),
        ],
        Some(n) => {
            let otsi = otsi_name(lcp, &ctx.spectrum);
            let group = otsi_group_name(lcp, rate);
            vec![
                resource(
                    otsi.clone(),
                    ResourceKind::Och,
                    interface(&otsi, "otsi", port, None),
                    json!({"org-openroadm-optical-tributary-signal-interfaces:otsi": {
                        "frequency": ctx.spectrum.center_freq(),
                        "otsi-rate": otsi_rate(rate),
                        "modulation-format": rate.modulation_format(),
                        "fec": format!("org-openroadm-common-types:{}", rate.fec()),
                        "provision-mode": "explicit",
                    }}),
                ),
                resource(
                    group.clone(),
                    ResourceKind::Och,
                    interface(&group, "otsi-group", port, Some(&otsi)),
                    json!({"org-openroadm-otsi-group-interfaces:otsi-group": {
                        "group-id": 1,
                        "group-rate": otsi_rate(rate),
                    }}),
                ),
                resource(
                    otu.clone(),
                    ResourceKind::Otu,
                    interface(&otu, "otnOtu", port, Some(&group)),
                    json!({"org-openroadm-otn-otu-interfaces:otu": {
                        "rate": format!("{}:OTUCn", OTN_TYPES),
                        "otucn-n-rate": n,
                    }}),
                ),
                resource(
                    odu.clone(),
                    ResourceKind::Odu,
                    interface(&odu, "otnOdu", port, Some(&otu)),
                    json!({"org-openroadm-otn-odu-interfaces:odu": {
                        "rate": format!("{}:ODUCn", OTN_TYPES),
                        "oducn-n-rate": n,
                        "odu-function": format!("{}:ODU-TTP", OTN_TYPES),
                        "monitoring-mode": "terminated",
                    }}),
                ),
            ]
        }
    }
}

fn optical_input(ctx: &PlanContext, service_name: String, modulation: &str, node: Value) -> Map<String, Value> {
    let spectrum = &ctx.spectrum;
    let input = json!({
        "service-name": service_name,
        "modulation-format": modulation,
        "center-freq": spectrum.center_freq(),
        "nmc-width": spectrum.width(),
        "min-freq": spectrum.min_freq(),
        "max-freq": spectrum.max_freq(),
        "lower-spectral-slot-number": spectrum.min_slot,
        "higher-spectral-slot-number": spectrum.max_slot,
        "nodes": [node],
    });
    match input {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Optical path on an xponder network port.
///
/// With a client this is a full transponder path (network stack plus client
/// Ethernet). Without one it brings up only the network stack, which
/// switching roles then use as the parent of their client services.
pub fn optical_xponder(
    ctx: &PlanContext,
    network: &PortMappingEntry,
    client: Option<&PortMappingEntry>,
    rate: SignalRate,
) -> CyclePlan {
    let mut resources = network_stack(ctx, network, rate);
    let primary = otu_name(network.lcp(), rate);

    let mut node = json!({"node-id": ctx.node_id, "dest-tp": network.lcp()});
    if let Some(client) = client {
        node["src-tp"] = json!(client.lcp());
        let eth = ethernet_name(client.lcp());
        resources.push(resource(
            eth.clone(),
            ResourceKind::Eth,
            interface(&eth, "ethernetCsmacd", client, None),
            json!({"org-openroadm-ethernet-interfaces:ethernet": {
                "speed": rate.gbps() * 1000,
            }}),
        ));
    }

    let label = match client {
        Some(c) => format!("{} {} <- {}", network.lcp(), rate, c.lcp()),
        None => format!("{} {}", network.lcp(), rate),
    };
    CyclePlan {
        label,
        rpc: SERVICE_PATH,
        resources,
        primary,
        node_id: ctx.node_id.clone(),
        input: optical_input(
            ctx,
            format!("{}-{}", ctx.service_name, network.lcp()),
            rate.modulation_format(),
            node,
        ),
    }
}

/// Parent ODU allocation of the `index`-th client on a network port,
/// `None` once the parent payload is full.
fn parent_allocation(
    network_rate: SignalRate,
    kind: ClientKind,
    index: usize,
) -> Option<(Value, Map<String, Value>)> {
    let slot = u32::try_from(index)
        .ok()
        .filter(|slot| *slot < kind.capacity(network_rate))?;
    let trib_port = slot + 1;
    let mut input = Map::new();
    input.insert("trib-port-number".to_string(), json!(trib_port));

    let allocation = if network_rate.is_otucn() {
        let per_client = kind.oducn_slots();
        let slots: Vec<String> = (1..=per_client)
            .map(|s| {
                let absolute = slot * per_client + s;
                format!(
                    "{}.{}",
                    (absolute - 1) / OPUCN_SLICE_SLOTS + 1,
                    (absolute - 1) % OPUCN_SLICE_SLOTS + 1
                )
            })
            .collect();
        input.insert("opucn-trib-slots".to_string(), json!(slots));
        json!({"trib-port-number": trib_port, "opucn-trib-slots": slots})
    } else {
        let per_client = kind.odu4_slots();
        let slots: Vec<u32> = (1..=per_client).map(|s| slot * per_client + s).collect();
        input.insert("trib-slot".to_string(), json!(slots));
        json!({"trib-port-number": trib_port, "trib-slots": slots})
    };
    Some((allocation, input))
}

/// Digital client service between `client` and `network`.
///
/// `index` is the client's position among the network port's linked
/// clients and selects its tributary slots. Returns `None` when that
/// position is past the parent's [`ClientKind::capacity`].
pub fn otn_client(
    ctx: &PlanContext,
    network: &PortMappingEntry,
    network_rate: SignalRate,
    client: &PortMappingEntry,
    kind: ClientKind,
    index: usize,
) -> Option<CyclePlan> {
    let eth = client_ethernet_name(client.lcp(), kind);
    let client_odu = client_odu_name(client.lcp(), kind);
    let tributary = tributary_odu_name(network.lcp(), kind, client.lcp());
    let odu_rate = format!("{}:{}", OTN_TYPES, kind.odu());
    let (allocation, mut input) = parent_allocation(network_rate, kind, index)?;

    let resources = vec![
        resource(
            eth.clone(),
            ResourceKind::Eth,
            interface(&eth, "ethernetCsmacd", client, None),
            json!({"org-openroadm-ethernet-interfaces:ethernet": {
                "speed": kind.service_rate() * 1000,
            }}),
        ),
        resource(
            client_odu.clone(),
            ResourceKind::Odu,
            interface(&client_odu, "otnOdu", client, Some(&eth)),
            json!({"org-openroadm-otn-odu-interfaces:odu": {
                "rate": odu_rate,
                "odu-function": format!("{}:ODU-TTP-CTP", OTN_TYPES),
                "monitoring-mode": "terminated",
            }}),
        ),
        resource(
            tributary.clone(),
            ResourceKind::Odu,
            interface(&tributary, "otnOdu", network, Some(&odu_name(network.lcp(), network_rate))),
            json!({"org-openroadm-otn-odu-interfaces:odu": {
                "rate": odu_rate,
                "odu-function": format!("{}:ODU-CTP", OTN_TYPES),
                "monitoring-mode": "monitored",
                "parent-odu-allocation": allocation,
            }}),
        ),
    ];

    input.insert(
        "service-name".to_string(),
        json!(format!("{}-{}", ctx.service_name, client.lcp())),
    );
    input.insert("service-format".to_string(), json!("Ethernet"));
    input.insert("service-rate".to_string(), json!(kind.service_rate()));
    input.insert("ethernet-encoding".to_string(), json!("eth TTP"));
    input.insert(
        "nodes".to_string(),
        json!([{"node-id": ctx.node_id, "client-tp": client.lcp(), "network-tp": network.lcp()}]),
    );

    Some(CyclePlan {
        label: format!("{} {}G <- {}", network.lcp(), kind.service_rate(), client.lcp()),
        rpc: OTN_SERVICE_PATH,
        resources,
        primary: eth,
        node_id: ctx.node_id.clone(),
        input,
    })
}

/// One direction of a ROADM add/drop path.
///
/// Exactly one of `src`/`dst` is the degree port; it carries the media
/// channel and is the primary interface.
pub fn roadm_path(
    ctx: &PlanContext,
    src: &PortMappingEntry,
    dst: &PortMappingEntry,
    degree_is_src: bool,
) -> CyclePlan {
    let spectrum = &ctx.spectrum;
    let degree = if degree_is_src { src } else { dst };
    let srg = if degree_is_src { dst } else { src };

    let mc = mc_name(degree.lcp(), spectrum);
    let degree_nmc = nmc_name(degree.lcp(), spectrum);
    let srg_nmc = nmc_name(srg.lcp(), spectrum);
    let connection = connection_name(src.lcp(), dst.lcp(), spectrum);
    let nmc_body = json!({"org-openroadm-network-media-channel-interfaces:nmc-ctp": {
        "frequency": spectrum.center_freq(),
        "width": spectrum.width(),
    }});

    let resources = vec![
        resource(
            mc.clone(),
            ResourceKind::Och,
            interface(&mc, "mediaChannelTrailTerminationPoint", degree, None),
            json!({"org-openroadm-media-channel-interfaces:mc-ttp": {
                "min-freq": spectrum.min_freq(),
                "max-freq": spectrum.max_freq(),
            }}),
        ),
        resource(
            degree_nmc.clone(),
            ResourceKind::Och,
            interface(
                &degree_nmc,
                "networkMediaChannelConnectionTerminationPoint",
                degree,
                Some(&mc),
            ),
            nmc_body.clone(),
        ),
        resource(
            srg_nmc.clone(),
            ResourceKind::Och,
            interface(&srg_nmc, "networkMediaChannelConnectionTerminationPoint", srg, None),
            nmc_body,
        ),
        PlannedResource {
            expected: json!({
                "connection-name": connection,
                "opticalControlMode": "off",
                "source": {"src-if": nmc_name(src.lcp(), spectrum)},
                "destination": {"dst-if": nmc_name(dst.lcp(), spectrum)},
            }),
            name: connection,
            kind: ResourceKind::Connection,
        },
    ];

    let node = json!({"node-id": ctx.node_id, "src-tp": src.lcp(), "dest-tp": dst.lcp()});
    CyclePlan {
        label: format!("{} -> {}", src.lcp(), dst.lcp()),
        rpc: SERVICE_PATH,
        resources,
        primary: mc,
        node_id: ctx.node_id.clone(),
        input: optical_input(
            ctx,
            format!("{}-{}-{}", ctx.service_name, src.lcp(), dst.lcp()),
            SignalRate::R100G.modulation_format(),
            node,
        ),
    }
}
