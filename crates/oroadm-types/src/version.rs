//! Externally supplied tags selecting schema and validation branch.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OpenROADM device model version tag (e.g. `2.2.1`).
///
/// Kept as an opaque, normalized string so that new versions can be added to
/// a schema registry without touching this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SchemaVersion(String);

impl SchemaVersion {
    pub const V1_2_1: &'static str = "1.2.1";
    pub const V2_2_1: &'static str = "2.2.1";
    pub const V7_1: &'static str = "7.1";

    /// Creates a version tag, stripping a leading `v` and surrounding space.
    pub fn new(tag: impl AsRef<str>) -> Self {
        let tag = tag.as_ref().trim();
        let tag = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);
        // "7.1.0" and "7.1" name the same model
        let tag = tag.strip_suffix(".0").filter(|t| t.contains('.')).unwrap_or(tag);
        Self(tag.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SchemaVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SchemaVersion {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<SchemaVersion> for String {
    fn from(v: SchemaVersion) -> Self {
        v.0
    }
}

/// Device category, selecting the xponder or the ROADM validation branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    /// Transponder, muxponder or switchponder (`node-type` `xpdr`).
    Xponder,
    /// Reconfigurable add/drop multiplexer (`node-type` `rdm`).
    Roadm,
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCategory::Xponder => write!(f, "xponder"),
            DeviceCategory::Roadm => write!(f, "roadm"),
        }
    }
}

impl FromStr for DeviceCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xponder" | "xpdr" => Ok(DeviceCategory::Xponder),
            "roadm" | "rdm" => Ok(DeviceCategory::Roadm),
            _ => Err(ParseError::InvalidDeviceCategory(s.to_string())),
        }
    }
}
