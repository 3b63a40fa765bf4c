//! Reconstruction defects.

use serde::Serialize;
use thiserror::Error;

/// A port-mapping input that cannot be turned into a consistent topology.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "kebab-case", tag = "defect")]
pub enum ReconstructionDefect {
    /// Two rows share one logical connection point; the first one wins.
    #[error("Logical connection point '{lcp}' appears in more than one port-mapping row")]
    DuplicateLcp { lcp: String },

    /// A pool's type tag is neither `blocking` nor `non-blocking`.
    #[error("Switching pool {pool} has invalid type '{value}'")]
    InvalidPoolType { pool: u32, value: String },

    /// A non-blocking pool must hold exactly one group.
    #[error("Non-blocking switching pool {pool} has {groups} groups, expected exactly one")]
    PoolGroupCount { pool: u32, groups: usize },

    /// A group does not contain exactly one seeded network port.
    #[error("Switching pool {pool} group {group} resolves to {} network ports {network_ports:?}, expected one", network_ports.len())]
    UnresolvedGroup {
        pool: u32,
        group: u32,
        network_ports: Vec<String>,
    },

    /// A group member has no port-mapping row.
    #[error("Switching pool {pool} group {group} lists unknown port '{lcp}'")]
    UnknownMember { pool: u32, group: u32, lcp: String },

    /// A port is listed in more than one switching-pool group.
    #[error("Port '{lcp}' is listed in more than one switching-pool group {groups:?}")]
    DuplicateMembership { lcp: String, groups: Vec<(u32, u32)> },

    /// An xponder network port ended up without any client port.
    #[error("Network port '{network_port}' has no linked client port")]
    NoLinkedClients { network_port: String },

    /// A degree port ended up without any shared-risk-group port.
    #[error("Degree port '{degree_port}' has no linked shared-risk-group port")]
    NoLinkedSrgs { degree_port: String },
}
