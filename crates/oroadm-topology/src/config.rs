//! Reconstructed port-role topology.

use std::collections::BTreeMap;

use serde::Serialize;

use oroadm_types::{PortMappingEntry, XponderType};

use crate::defect::ReconstructionDefect;

/// An xponder network port and the client ports that can reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkPortRecord {
    pub port: PortMappingEntry,
    pub xponder_type: Option<XponderType>,
    /// Linked client rows, each carrying its own capability set.
    pub linked_clients: Vec<PortMappingEntry>,
    /// Interconnect bandwidth unit of the switching pool, if any.
    pub bandwidth_unit: Option<u64>,
}

impl NetworkPortRecord {
    pub(crate) fn seed(port: PortMappingEntry) -> Self {
        Self {
            xponder_type: port.xponder_type(),
            port,
            linked_clients: Vec::new(),
            bandwidth_unit: None,
        }
    }

    pub(crate) fn link_client(&mut self, client: &PortMappingEntry) -> bool {
        if self.is_linked(client.lcp()) {
            return false;
        }
        self.linked_clients.push(client.clone());
        true
    }

    /// Returns true if `lcp` is already a linked client.
    pub fn is_linked(&self, lcp: &str) -> bool {
        self.linked_clients.iter().any(|c| c.lcp() == lcp)
    }

    /// Logical connection points of the linked clients, in link order.
    pub fn client_lcps(&self) -> impl Iterator<Item = &str> {
        self.linked_clients.iter().map(PortMappingEntry::lcp)
    }
}

/// A ROADM degree port and the SRG ports that can be added/dropped on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreePortRecord {
    pub port: PortMappingEntry,
    pub linked_srgs: Vec<PortMappingEntry>,
}

impl DegreePortRecord {
    pub(crate) fn seed(port: PortMappingEntry) -> Self {
        Self {
            port,
            linked_srgs: Vec::new(),
        }
    }
}

/// One reconstructed record, keyed by its port's logical connection point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "role")]
pub enum PortRecord {
    Network(NetworkPortRecord),
    Degree(DegreePortRecord),
}

impl PortRecord {
    /// The seed port of this record.
    pub fn port(&self) -> &PortMappingEntry {
        match self {
            PortRecord::Network(r) => &r.port,
            PortRecord::Degree(r) => &r.port,
        }
    }

    pub fn as_network(&self) -> Option<&NetworkPortRecord> {
        match self {
            PortRecord::Network(r) => Some(r),
            PortRecord::Degree(_) => None,
        }
    }

    pub fn as_degree(&self) -> Option<&DegreePortRecord> {
        match self {
            PortRecord::Degree(r) => Some(r),
            PortRecord::Network(_) => None,
        }
    }
}

/// Reconstructed topology of one network element.
///
/// Built once by [`crate::reconstruct`] and read-only afterwards. Records are
/// kept in logical-connection-point order so that two reconstructions of the
/// same input compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PortRoleConfig {
    records: BTreeMap<String, PortRecord>,
}

impl PortRoleConfig {
    pub(crate) fn insert(&mut self, record: PortRecord) -> bool {
        let lcp = record.port().lcp().to_string();
        if self.records.contains_key(&lcp) {
            return false;
        }
        self.records.insert(lcp, record);
        true
    }

    pub(crate) fn network_mut(&mut self, lcp: &str) -> Option<&mut NetworkPortRecord> {
        match self.records.get_mut(lcp) {
            Some(PortRecord::Network(r)) => Some(r),
            _ => None,
        }
    }

    pub(crate) fn degrees_mut(&mut self) -> impl Iterator<Item = &mut DegreePortRecord> {
        self.records.values_mut().filter_map(|r| match r {
            PortRecord::Degree(d) => Some(d),
            PortRecord::Network(_) => None,
        })
    }

    pub fn get(&self, lcp: &str) -> Option<&PortRecord> {
        self.records.get(lcp)
    }

    pub fn network(&self, lcp: &str) -> Option<&NetworkPortRecord> {
        self.get(lcp).and_then(PortRecord::as_network)
    }

    pub fn degree(&self, lcp: &str) -> Option<&DegreePortRecord> {
        self.get(lcp).and_then(PortRecord::as_degree)
    }

    pub fn is_network(&self, lcp: &str) -> bool {
        self.network(lcp).is_some()
    }

    pub fn network_ports(&self) -> impl Iterator<Item = &NetworkPortRecord> {
        self.records.values().filter_map(PortRecord::as_network)
    }

    pub fn degree_ports(&self) -> impl Iterator<Item = &DegreePortRecord> {
        self.records.values().filter_map(PortRecord::as_degree)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PortRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records violating linkage totality.
    ///
    /// Every network port must have at least one linked client and every
    /// degree port at least one linked SRG port; an empty list is a
    /// reconstruction or device-configuration defect.
    pub fn linkage_defects(&self) -> Vec<ReconstructionDefect> {
        self.records
            .values()
            .filter_map(|record| match record {
                PortRecord::Network(r) if r.linked_clients.is_empty() => {
                    Some(ReconstructionDefect::NoLinkedClients {
                        network_port: r.port.lcp().to_string(),
                    })
                }
                PortRecord::Degree(r) if r.linked_srgs.is_empty() => {
                    Some(ReconstructionDefect::NoLinkedSrgs {
                        degree_port: r.port.lcp().to_string(),
                    })
                }
                _ => None,
            })
            .collect()
    }
}
