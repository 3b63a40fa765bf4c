//! Common OpenROADM types for device conformance and topology checks.
//!
//! This crate provides type-safe representations of the data read from a
//! network element and from the controller's port-mapping store:
//!
//! - [`PortMappingEntry`]: one row of the flat port-mapping table
//! - [`PortRole`]: explicit role of a row (network, client, degree, SRG)
//! - [`SwitchingPool`]: blocking / non-blocking cross-connect groupings
//! - [`NodePortMapping`]: one node's port-mapping document
//! - [`SignalRate`]: line rates exercised by the lifecycle verifier
//! - [`SchemaVersion`] / [`DeviceCategory`]: externally supplied tags

mod node;
mod pool;
mod port;
mod rate;
mod version;

pub use node::{NodeInfo, NodePortMapping};
pub use pool::{NonBlockingGroup, PoolType, SwitchingPool};
pub use port::{classify, PortMappingEntry, PortQual, PortRole, XponderType};
pub use rate::SignalRate;
pub use version::{DeviceCategory, SchemaVersion};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid port qualifier: {0}")]
    InvalidPortQual(String),

    #[error("invalid xponder type: {0}")]
    InvalidXponderType(String),

    #[error("invalid switching pool type: {0}")]
    InvalidPoolType(String),

    #[error("invalid signal rate: {0}")]
    InvalidSignalRate(String),

    #[error("invalid device category: {0}")]
    InvalidDeviceCategory(String),

    #[error("invalid port-mapping document: {0}")]
    InvalidPortMapping(String),
}
