//! Port-mapping rows and their role classification.

use crate::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static DEGREE_LCP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DEG\d+-TTP(-|$)").expect("valid degree lcp regex"));
static SRG_LCP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SRG\d+-PP\d+(-|$)").expect("valid srg lcp regex"));
static NETWORK_LCP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^XPDR\d+-NETWORK\d+$").expect("valid network lcp regex"));
static CLIENT_LCP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^XPDR\d+-CLIENT\d+$").expect("valid client lcp regex"));

/// Port qualifier as reported in the `port-qual` leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortQual {
    /// Line side of a transponder or muxponder.
    XpdrNetwork,
    /// Client side of a transponder or muxponder.
    XpdrClient,
    /// Line side of a switchponder.
    SwitchNetwork,
    /// Client side of a switchponder.
    SwitchClient,
    /// ROADM port facing outside the node (degree TTP or SRG PP).
    RoadmExternal,
    /// ROADM port internal to the node.
    RoadmInternal,
}

impl PortQual {
    /// Returns true for line-side xponder qualifiers.
    pub const fn is_network(&self) -> bool {
        matches!(self, PortQual::XpdrNetwork | PortQual::SwitchNetwork)
    }

    /// Returns true for client-side xponder qualifiers.
    pub const fn is_client(&self) -> bool {
        matches!(self, PortQual::XpdrClient | PortQual::SwitchClient)
    }
}

impl fmt::Display for PortQual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortQual::XpdrNetwork => "xpdr-network",
            PortQual::XpdrClient => "xpdr-client",
            PortQual::SwitchNetwork => "switch-network",
            PortQual::SwitchClient => "switch-client",
            PortQual::RoadmExternal => "roadm-external",
            PortQual::RoadmInternal => "roadm-internal",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PortQual {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xpdr-network" => Ok(PortQual::XpdrNetwork),
            "xpdr-client" => Ok(PortQual::XpdrClient),
            "switch-network" => Ok(PortQual::SwitchNetwork),
            "switch-client" => Ok(PortQual::SwitchClient),
            "roadm-external" => Ok(PortQual::RoadmExternal),
            "roadm-internal" => Ok(PortQual::RoadmInternal),
            _ => Err(ParseError::InvalidPortQual(s.to_string())),
        }
    }
}

/// Kind of xponder a network port belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XponderType {
    /// Transponder: fixed 1:1 client to network pairing.
    Tpdr,
    /// Muxponder: several low-rate clients on one network port.
    Mpdr,
    /// Switchponder: clients cross-connected through a switching fabric.
    Switch,
}

impl fmt::Display for XponderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            XponderType::Tpdr => "tpdr",
            XponderType::Mpdr => "mpdr",
            XponderType::Switch => "switch",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for XponderType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tpdr" => Ok(XponderType::Tpdr),
            "mpdr" => Ok(XponderType::Mpdr),
            "switch" => Ok(XponderType::Switch),
            _ => Err(ParseError::InvalidXponderType(s.to_string())),
        }
    }
}

/// Role of a port-mapping row in the reconstructed topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortRole {
    /// Xponder line-side port.
    XponderNetwork,
    /// Xponder client-side port.
    XponderClient,
    /// ROADM degree termination point.
    Degree,
    /// ROADM shared-risk-group add/drop port.
    Srg,
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortRole::XponderNetwork => "xponder-network",
            PortRole::XponderClient => "xponder-client",
            PortRole::Degree => "degree",
            PortRole::Srg => "srg",
        };
        write!(f, "{}", s)
    }
}

/// One row of the controller's flat port-mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortMappingEntry {
    /// Unique logical connection point (e.g. `XPDR1-NETWORK1`).
    pub logical_connection_point: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_qual: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpdr_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_direction: Option<String>,

    #[serde(default)]
    pub supporting_circuit_pack_name: String,

    #[serde(default)]
    pub supporting_port: String,

    /// Cross-reference to the paired port on the same xponder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_map_lcp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_lcp: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_interface_capability: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_admin_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_oper_state: Option<String>,
}

impl PortMappingEntry {
    /// Creates a bare row for the given logical connection point.
    pub fn new(lcp: impl Into<String>) -> Self {
        Self {
            logical_connection_point: lcp.into(),
            port_qual: None,
            xpdr_type: None,
            port_direction: None,
            supporting_circuit_pack_name: String::new(),
            supporting_port: String::new(),
            connection_map_lcp: None,
            partner_lcp: None,
            supported_interface_capability: Vec::new(),
            port_admin_state: None,
            port_oper_state: None,
        }
    }

    pub fn with_qual(mut self, qual: PortQual) -> Self {
        self.port_qual = Some(qual.to_string());
        self
    }

    pub fn with_xpdr_type(mut self, xpdr_type: XponderType) -> Self {
        self.xpdr_type = Some(xpdr_type.to_string());
        self
    }

    pub fn with_supporting(mut self, circuit_pack: impl Into<String>, port: impl Into<String>) -> Self {
        self.supporting_circuit_pack_name = circuit_pack.into();
        self.supporting_port = port.into();
        self
    }

    pub fn with_connection_map(mut self, lcp: impl Into<String>) -> Self {
        self.connection_map_lcp = Some(lcp.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, caps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_interface_capability = caps.into_iter().map(Into::into).collect();
        self
    }

    /// Logical connection point of this row.
    pub fn lcp(&self) -> &str {
        &self.logical_connection_point
    }

    /// Parsed port qualifier, `None` when absent or unknown.
    pub fn qual(&self) -> Option<PortQual> {
        self.port_qual.as_deref().and_then(|q| q.parse().ok())
    }

    /// Parsed xponder type, `None` for ROADM rows or unknown values.
    pub fn xponder_type(&self) -> Option<XponderType> {
        self.xpdr_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// Capability names with their YANG module prefix stripped.
    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.supported_interface_capability
            .iter()
            .map(|cap| cap.rsplit_once(':').map_or(cap.as_str(), |(_, name)| name))
    }

    /// Returns true if the capability set contains `name` (prefix-insensitive).
    pub fn supports(&self, name: &str) -> bool {
        let wanted = name.rsplit_once(':').map_or(name, |(_, n)| n);
        self.capabilities().any(|cap| cap == wanted)
    }

    /// Role of this row, see [`classify`].
    pub fn role(&self) -> Option<PortRole> {
        classify(self)
    }
}

/// Classifies a port-mapping row into its topology role.
///
/// The port qualifier decides xponder roles; ROADM external ports are split
/// into degree and SRG ports by their logical connection point. When the
/// qualifier is missing the logical connection point alone is used. Rows with
/// no applicable role (internal ROADM ports, unknown qualifiers) yield `None`.
pub fn classify(entry: &PortMappingEntry) -> Option<PortRole> {
    let lcp = entry.lcp();
    match entry.qual() {
        Some(q) if q.is_network() => Some(PortRole::XponderNetwork),
        Some(q) if q.is_client() => Some(PortRole::XponderClient),
        Some(PortQual::RoadmExternal) => roadm_role(lcp),
        Some(PortQual::RoadmInternal) => None,
        Some(_) => None,
        None if entry.port_qual.is_some() => None,
        None => {
            if NETWORK_LCP.is_match(lcp) {
                Some(PortRole::XponderNetwork)
            } else if CLIENT_LCP.is_match(lcp) {
                Some(PortRole::XponderClient)
            } else {
                roadm_role(lcp)
            }
        }
    }
}

fn roadm_role(lcp: &str) -> Option<PortRole> {
    if DEGREE_LCP.is_match(lcp) {
        Some(PortRole::Degree)
    } else if SRG_LCP.is_match(lcp) {
        Some(PortRole::Srg)
    } else {
        None
    }
}
