//! Switching pools: which ports of an xponder may be cross-connected.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Switching pool type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolType {
    /// Groups are mutually exclusive; each group is its own fabric.
    Blocking,
    /// Any member may be connected to any other; exactly one group.
    NonBlocking,
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolType::Blocking => write!(f, "blocking"),
            PoolType::NonBlocking => write!(f, "non-blocking"),
        }
    }
}

impl FromStr for PoolType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blocking" => Ok(PoolType::Blocking),
            "non-blocking" => Ok(PoolType::NonBlocking),
            _ => Err(ParseError::InvalidPoolType(s.to_string())),
        }
    }
}

/// One member group of a switching pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NonBlockingGroup {
    pub nbl_number: u32,

    /// Logical connection points of the member ports.
    #[serde(default)]
    pub lcp_list: Vec<String>,

    /// Bandwidth unit of the interconnect, in bits per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interconnect_bandwidth_unit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interconnect_bandwidth: Option<u64>,
}

impl NonBlockingGroup {
    pub fn new<I, S>(nbl_number: u32, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nbl_number,
            lcp_list: members.into_iter().map(Into::into).collect(),
            interconnect_bandwidth_unit: None,
            interconnect_bandwidth: None,
        }
    }

    pub fn with_bandwidth_unit(mut self, unit: u64) -> Self {
        self.interconnect_bandwidth_unit = Some(unit);
        self
    }
}

/// A switching pool of one xponder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SwitchingPool {
    pub switching_pool_number: u32,

    /// Raw pool type tag, see [`SwitchingPool::pool_type`].
    pub switching_pool_type: String,

    #[serde(default)]
    pub non_blocking_list: Vec<NonBlockingGroup>,
}

impl SwitchingPool {
    pub fn new(number: u32, pool_type: PoolType, groups: Vec<NonBlockingGroup>) -> Self {
        Self {
            switching_pool_number: number,
            switching_pool_type: pool_type.to_string(),
            non_blocking_list: groups,
        }
    }

    /// Parsed pool type.
    pub fn pool_type(&self) -> Result<PoolType, ParseError> {
        self.switching_pool_type.parse()
    }

    /// Iterates over every member lcp of every group.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.non_blocking_list
            .iter()
            .flat_map(|g| g.lcp_list.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_pool() {
        let json = r#"{
            "switching-pool-number": 1,
            "switching-pool-type": "non-blocking",
            "non-blocking-list": [{
                "nbl-number": 1,
                "lcp-list": ["XPDR1-NETWORK1", "XPDR1-CLIENT1", "XPDR1-CLIENT2"],
                "interconnect-bandwidth-unit": 1000000000,
                "interconnect-bandwidth": 0
            }]
        }"#;
        let pool: SwitchingPool = serde_json::from_str(json).unwrap();
        assert_eq!(pool.pool_type().unwrap(), PoolType::NonBlocking);
        assert_eq!(pool.non_blocking_list.len(), 1);
        assert_eq!(
            pool.non_blocking_list[0].interconnect_bandwidth_unit,
            Some(1_000_000_000)
        );
        assert_eq!(pool.members().count(), 3);
    }

    #[test]
    fn test_pool_type_round_trip() {
        let pool = SwitchingPool::new(2, PoolType::Blocking, vec![]);
        assert_eq!(pool.switching_pool_type, "blocking");
        assert_eq!(pool.pool_type().unwrap(), PoolType::Blocking);
        assert!("partial".parse::<PoolType>().is_err());
    }
}
