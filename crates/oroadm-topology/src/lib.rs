//! Port-role topology reconstruction.
//!
//! Turns the controller's flat port-mapping rows and switching pools into a
//! [`PortRoleConfig`]: one record per xponder network port (with its linked
//! client ports and pool bandwidth unit) and per ROADM degree port (with its
//! linked shared-risk-group ports).
//!
//! Reconstruction runs in ordered passes; later passes look up the records
//! seeded by earlier ones:
//!
//! 1. seed network and degree ports
//! 2. link clients through their `connection-map-lcp`
//! 3. resolve switching-pool groups into implied clients
//! 4. link every SRG port to every degree port
//!
//! Input contract violations are collected as [`ReconstructionDefect`]s
//! rather than aborting. Linkage totality (every network port has a client,
//! every degree an SRG) is checked by the caller with
//! [`PortRoleConfig::linkage_defects`].

mod config;
mod defect;
mod reconstruct;

pub use config::{DegreePortRecord, NetworkPortRecord, PortRecord, PortRoleConfig};
pub use defect::ReconstructionDefect;
pub use reconstruct::{reconstruct, reconstruct_node, Reconstruction};
