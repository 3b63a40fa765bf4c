//! Line rates exercised on network ports.

use crate::{ParseError, PortMappingEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network-side signal rate.
///
/// 100G uses a single OTU4/ODU4 stack; the higher rates use the OTSI-group
/// and OTUCn/ODUCn stack where `n` is the number of 100G slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalRate {
    #[serde(rename = "100G")]
    R100G,
    #[serde(rename = "200G")]
    R200G,
    #[serde(rename = "300G")]
    R300G,
    #[serde(rename = "400G")]
    R400G,
}

impl SignalRate {
    pub const ALL: [SignalRate; 4] = [
        SignalRate::R100G,
        SignalRate::R200G,
        SignalRate::R300G,
        SignalRate::R400G,
    ];

    /// Rate in Gbit/s.
    pub const fn gbps(&self) -> u32 {
        match self {
            SignalRate::R100G => 100,
            SignalRate::R200G => 200,
            SignalRate::R300G => 300,
            SignalRate::R400G => 400,
        }
    }

    /// Number of 100G slices for OTUCn rates, `None` for OTU4.
    pub const fn slices(&self) -> Option<u8> {
        match self {
            SignalRate::R100G => None,
            SignalRate::R200G => Some(2),
            SignalRate::R300G => Some(3),
            SignalRate::R400G => Some(4),
        }
    }

    /// Returns true if this rate uses the OTSI-group/OTUCn stack.
    pub const fn is_otucn(&self) -> bool {
        self.slices().is_some()
    }

    /// Modulation format expected on the optical layer.
    pub const fn modulation_format(&self) -> &'static str {
        match self {
            SignalRate::R100G | SignalRate::R200G => "dp-qpsk",
            SignalRate::R300G => "dp-qam8",
            SignalRate::R400G => "dp-qam16",
        }
    }

    /// Forward error correction expected on the OTU layer.
    pub const fn fec(&self) -> &'static str {
        match self {
            SignalRate::R100G => "scfec",
            _ => "ofec",
        }
    }

    /// Rates advertised by a network port's capability set.
    pub fn from_capabilities(entry: &PortMappingEntry) -> Vec<SignalRate> {
        let mut rates = Vec::new();
        if entry.supports("if-OCH-OTU4-ODU4") || entry.supports("if-OTU4-ODU4") {
            rates.push(SignalRate::R100G);
        }
        if entry.supports("if-otsi-otsigroup") || entry.supports("if-OTUCn-ODUCn") {
            rates.push(SignalRate::R400G);
        }
        rates
    }
}

impl fmt::Display for SignalRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}G", self.gbps())
    }
}

impl FromStr for SignalRate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "100G" | "100" => Ok(SignalRate::R100G),
            "200G" | "200" => Ok(SignalRate::R200G),
            "300G" | "300" => Ok(SignalRate::R300G),
            "400G" | "400" => Ok(SignalRate::R400G),
            _ => Err(ParseError::InvalidSignalRate(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_parse_and_display() {
        assert_eq!("400g".parse::<SignalRate>().unwrap(), SignalRate::R400G);
        assert_eq!(SignalRate::R200G.to_string(), "200G");
        assert!("10G".parse::<SignalRate>().is_err());
    }

    #[test]
    fn test_rate_layers() {
        assert!(!SignalRate::R100G.is_otucn());
        assert_eq!(SignalRate::R300G.slices(), Some(3));
        assert_eq!(SignalRate::R100G.fec(), "scfec");
        assert_eq!(SignalRate::R400G.modulation_format(), "dp-qam16");
    }

    #[test]
    fn test_rates_from_capabilities() {
        let entry = PortMappingEntry::new("XPDR1-NETWORK1").with_capabilities([
            "org-openroadm-port-types:if-OCH-OTU4-ODU4",
            "org-openroadm-port-types:if-otsi-otsigroup",
        ]);
        assert_eq!(
            SignalRate::from_capabilities(&entry),
            vec![SignalRate::R100G, SignalRate::R400G]
        );
        assert!(SignalRate::from_capabilities(&PortMappingEntry::new("XPDR1-NETWORK2")).is_empty());
    }
}
