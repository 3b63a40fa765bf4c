//! Multi-pass reconstruction of the port-role topology.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info, instrument, warn};

use oroadm_types::{
    NodePortMapping, NonBlockingGroup, PoolType, PortMappingEntry, PortRole, SwitchingPool,
};

use crate::config::{DegreePortRecord, NetworkPortRecord, PortRecord, PortRoleConfig};
use crate::defect::ReconstructionDefect;

/// Output of [`reconstruct`]: the topology plus any input defects found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub config: PortRoleConfig,
    pub defects: Vec<ReconstructionDefect>,
}

impl Reconstruction {
    /// Input defects followed by linkage-totality defects.
    pub fn all_defects(&self) -> Vec<ReconstructionDefect> {
        let mut defects = self.defects.clone();
        defects.extend(self.config.linkage_defects());
        defects
    }

    /// Returns true if neither input nor linkage defects were found.
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty() && self.config.linkage_defects().is_empty()
    }
}

/// Reconstructs the topology of one node's port-mapping document.
pub fn reconstruct_node(node: &NodePortMapping) -> Reconstruction {
    reconstruct(&node.mapping, &node.switching_pool_lcp)
}

/// Reconstructs the port-role topology from flat rows and switching pools.
#[instrument(skip_all, fields(rows = entries.len(), pools = pools.len()))]
pub fn reconstruct(entries: &[PortMappingEntry], pools: &[SwitchingPool]) -> Reconstruction {
    let mut defects = Vec::new();
    let index = index_rows(entries, &mut defects);
    let mut config = PortRoleConfig::default();

    seed_ports(entries, &mut config);
    link_direct_clients(entries, &mut config);
    resolve_pools(pools, &index, &mut config, &mut defects);
    link_srgs(entries, &mut config);

    info!(
        "Reconstructed {} network ports and {} degree ports ({} input defects)",
        config.network_ports().count(),
        config.degree_ports().count(),
        defects.len()
    );
    Reconstruction { config, defects }
}

/// Indexes rows by logical connection point; the first row wins.
fn index_rows<'a>(
    entries: &'a [PortMappingEntry],
    defects: &mut Vec<ReconstructionDefect>,
) -> HashMap<&'a str, &'a PortMappingEntry> {
    let mut index = HashMap::with_capacity(entries.len());
    for entry in entries {
        match index.entry(entry.lcp()) {
            Entry::Occupied(_) => {
                warn!("Duplicate port-mapping row for {}, keeping the first", entry.lcp());
                defects.push(ReconstructionDefect::DuplicateLcp {
                    lcp: entry.lcp().to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }
    index
}

/// Pass 1: seed a record for every xponder network port and degree port.
fn seed_ports(entries: &[PortMappingEntry], config: &mut PortRoleConfig) {
    for entry in entries {
        let record = match entry.role() {
            Some(PortRole::XponderNetwork) => {
                PortRecord::Network(NetworkPortRecord::seed(entry.clone()))
            }
            Some(PortRole::Degree) => PortRecord::Degree(DegreePortRecord::seed(entry.clone())),
            Some(PortRole::XponderClient) | Some(PortRole::Srg) | None => continue,
        };
        if config.insert(record) {
            debug!("Seeded record for {}", entry.lcp());
        }
    }
}

/// Pass 2: link xponder clients through their explicit cross-reference.
fn link_direct_clients(entries: &[PortMappingEntry], config: &mut PortRoleConfig) {
    for entry in entries.iter().filter(|e| e.role() == Some(PortRole::XponderClient)) {
        let Some(target) = entry.connection_map_lcp.as_deref() else {
            continue;
        };
        match config.network_mut(target) {
            Some(network) => {
                if network.link_client(entry) {
                    debug!("Linked client {} to network port {}", entry.lcp(), target);
                }
            }
            None => debug!(
                "Client {} maps to {} which is not a network port",
                entry.lcp(),
                target
            ),
        }
    }
}

/// Pass 3: resolve every switching-pool group into implied clients.
fn resolve_pools(
    pools: &[SwitchingPool],
    index: &HashMap<&str, &PortMappingEntry>,
    config: &mut PortRoleConfig,
    defects: &mut Vec<ReconstructionDefect>,
) {
    let conflicting = conflicting_members(pools, defects);

    for pool in pools {
        let pool_number = pool.switching_pool_number;
        match pool.pool_type() {
            Ok(PoolType::NonBlocking) if pool.non_blocking_list.len() != 1 => {
                warn!(
                    "Non-blocking pool {} has {} groups",
                    pool_number,
                    pool.non_blocking_list.len()
                );
                defects.push(ReconstructionDefect::PoolGroupCount {
                    pool: pool_number,
                    groups: pool.non_blocking_list.len(),
                });
                continue;
            }
            Ok(_) => {}
            Err(_) => {
                warn!("Pool {} has invalid type {}", pool_number, pool.switching_pool_type);
                defects.push(ReconstructionDefect::InvalidPoolType {
                    pool: pool_number,
                    value: pool.switching_pool_type.clone(),
                });
                continue;
            }
        }

        for group in &pool.non_blocking_list {
            resolve_group(pool_number, group, index, &conflicting, config, defects);
        }
    }
}

fn resolve_group(
    pool_number: u32,
    group: &NonBlockingGroup,
    index: &HashMap<&str, &PortMappingEntry>,
    conflicting: &HashSet<String>,
    config: &mut PortRoleConfig,
    defects: &mut Vec<ReconstructionDefect>,
) {
    let network_ports: Vec<&str> = group
        .lcp_list
        .iter()
        .map(String::as_str)
        .filter(|lcp| config.is_network(lcp))
        .collect();

    let network_lcp = match network_ports.as_slice() {
        [single] if !conflicting.contains(*single) => *single,
        [_] => {
            warn!(
                "Pool {} group {}: network port {} is listed in several groups, skipping group",
                pool_number, group.nbl_number, network_ports[0]
            );
            return;
        }
        _ => {
            warn!(
                "Pool {} group {} resolves to network ports {:?}",
                pool_number, group.nbl_number, network_ports
            );
            defects.push(ReconstructionDefect::UnresolvedGroup {
                pool: pool_number,
                group: group.nbl_number,
                network_ports: network_ports.iter().map(|s| s.to_string()).collect(),
            });
            return;
        }
    };

    let mut clients = Vec::new();
    for lcp in group.lcp_list.iter().filter(|lcp| lcp.as_str() != network_lcp) {
        if conflicting.contains(lcp) {
            continue;
        }
        match index.get(lcp.as_str()) {
            Some(client) => clients.push(*client),
            None => {
                warn!("Pool {} group {} lists unknown port {}", pool_number, group.nbl_number, lcp);
                defects.push(ReconstructionDefect::UnknownMember {
                    pool: pool_number,
                    group: group.nbl_number,
                    lcp: lcp.clone(),
                });
            }
        }
    }

    if let Some(network) = config.network_mut(network_lcp) {
        for client in clients {
            if network.link_client(client) {
                debug!(
                    "Pool {} group {}: linked client {} to {}",
                    pool_number,
                    group.nbl_number,
                    client.lcp(),
                    network_lcp
                );
            }
        }
        if group.interconnect_bandwidth_unit.is_some() {
            network.bandwidth_unit = group.interconnect_bandwidth_unit;
        }
    }
}

/// Ports listed in more than one group, across all pools.
///
/// Such ports violate the input contract: they are reported once and are not
/// linked from any of their groups.
fn conflicting_members(
    pools: &[SwitchingPool],
    defects: &mut Vec<ReconstructionDefect>,
) -> HashSet<String> {
    let mut memberships: BTreeMap<&str, Vec<(u32, u32)>> = BTreeMap::new();
    for pool in pools {
        for group in &pool.non_blocking_list {
            let key = (pool.switching_pool_number, group.nbl_number);
            for lcp in &group.lcp_list {
                let groups = memberships.entry(lcp.as_str()).or_default();
                if !groups.contains(&key) {
                    groups.push(key);
                }
            }
        }
    }

    memberships
        .into_iter()
        .filter(|(_, groups)| groups.len() > 1)
        .map(|(lcp, groups)| {
            warn!("Port {} is listed in switching-pool groups {:?}", lcp, groups);
            defects.push(ReconstructionDefect::DuplicateMembership {
                lcp: lcp.to_string(),
                groups,
            });
            lcp.to_string()
        })
        .collect()
}

/// Pass 4: every SRG port can be added/dropped on every degree port.
fn link_srgs(entries: &[PortMappingEntry], config: &mut PortRoleConfig) {
    let srgs: Vec<&PortMappingEntry> = entries
        .iter()
        .filter(|e| e.role() == Some(PortRole::Srg))
        .collect();

    for degree in config.degrees_mut() {
        for srg in &srgs {
            if !degree.linked_srgs.iter().any(|s| s.lcp() == srg.lcp()) {
                degree.linked_srgs.push((*srg).clone());
            }
        }
        debug!("Degree {} linked to {} SRG ports", degree.port.lcp(), degree.linked_srgs.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oroadm_types::{PortQual, XponderType};
    use pretty_assertions::assert_eq;

    fn network(lcp: &str, xpdr_type: XponderType) -> PortMappingEntry {
        PortMappingEntry::new(lcp)
            .with_qual(PortQual::XpdrNetwork)
            .with_xpdr_type(xpdr_type)
            .with_supporting("CP-NET", "N1")
            .with_capabilities(["org-openroadm-port-types:if-OCH-OTU4-ODU4"])
    }

    fn client(lcp: &str, cap: &str) -> PortMappingEntry {
        PortMappingEntry::new(lcp)
            .with_qual(PortQual::XpdrClient)
            .with_supporting("CP-CLI", lcp)
            .with_capabilities([cap])
    }

    fn roadm(lcp: &str) -> PortMappingEntry {
        PortMappingEntry::new(lcp).with_qual(PortQual::RoadmExternal)
    }

    #[test]
    fn test_direct_client_association() {
        let entries = vec![
            network("XPDR1-NETWORK1", XponderType::Tpdr),
            client("XPDR1-CLIENT1", "if-100GE").with_connection_map("XPDR1-NETWORK1"),
            client("XPDR1-CLIENT2", "if-100GE"),
        ];
        let result = reconstruct(&entries, &[]);

        let net = result.config.network("XPDR1-NETWORK1").unwrap();
        assert_eq!(net.client_lcps().collect::<Vec<_>>(), vec!["XPDR1-CLIENT1"]);
        assert_eq!(net.xponder_type, Some(XponderType::Tpdr));
        assert!(result.is_clean());
    }

    #[test]
    fn test_non_blocking_pool_resolution() {
        let entries = vec![
            network("XPDR1-NETWORK1", XponderType::Mpdr),
            client("XPDR1-CLIENT1", "if-10GE-ODU2e"),
            client("XPDR1-CLIENT2", "if-10GE-ODU2"),
            client("XPDR1-CLIENT3", "if-10GE-ODU2e"),
            client("XPDR1-CLIENT4", "if-1GE-ODU0"),
        ];
        let pools = vec![SwitchingPool::new(
            1,
            PoolType::NonBlocking,
            vec![NonBlockingGroup::new(
                1,
                [
                    "XPDR1-NETWORK1",
                    "XPDR1-CLIENT1",
                    "XPDR1-CLIENT2",
                    "XPDR1-CLIENT3",
                    "XPDR1-CLIENT4",
                ],
            )
            .with_bandwidth_unit(10_000_000_000)],
        )];

        let result = reconstruct(&entries, &pools);
        assert!(result.defects.is_empty());

        let net = result.config.network("XPDR1-NETWORK1").unwrap();
        assert_eq!(net.linked_clients.len(), 4);
        assert_eq!(net.bandwidth_unit, Some(10_000_000_000));
        // each client keeps its own capability set
        assert_eq!(
            net.linked_clients[1].supported_interface_capability,
            vec!["if-10GE-ODU2".to_string()]
        );
        assert_eq!(
            net.linked_clients[3].supported_interface_capability,
            vec!["if-1GE-ODU0".to_string()]
        );
    }

    #[test]
    fn test_pool_does_not_duplicate_direct_clients() {
        let entries = vec![
            network("XPDR1-NETWORK1", XponderType::Tpdr),
            client("XPDR1-CLIENT1", "if-100GE").with_connection_map("XPDR1-NETWORK1"),
        ];
        let pools = vec![SwitchingPool::new(
            1,
            PoolType::NonBlocking,
            vec![NonBlockingGroup::new(1, ["XPDR1-CLIENT1", "XPDR1-NETWORK1"])],
        )];
        let result = reconstruct(&entries, &pools);
        assert_eq!(result.config.network("XPDR1-NETWORK1").unwrap().linked_clients.len(), 1);
    }

    #[test]
    fn test_blocking_pool_groups_resolved_independently() {
        let entries = vec![
            network("XPDR2-NETWORK1", XponderType::Switch),
            network("XPDR2-NETWORK2", XponderType::Switch),
            client("XPDR2-CLIENT1", "if-100GE-ODU4"),
            client("XPDR2-CLIENT2", "if-100GE-ODU4"),
        ];
        let pools = vec![SwitchingPool::new(
            2,
            PoolType::Blocking,
            vec![
                NonBlockingGroup::new(1, ["XPDR2-NETWORK1", "XPDR2-CLIENT1"]),
                NonBlockingGroup::new(2, ["XPDR2-CLIENT2", "XPDR2-NETWORK2"]),
            ],
        )];

        let result = reconstruct(&entries, &pools);
        assert!(result.is_clean());
        let n1 = result.config.network("XPDR2-NETWORK1").unwrap();
        let n2 = result.config.network("XPDR2-NETWORK2").unwrap();
        assert_eq!(n1.client_lcps().collect::<Vec<_>>(), vec!["XPDR2-CLIENT1"]);
        assert_eq!(n2.client_lcps().collect::<Vec<_>>(), vec!["XPDR2-CLIENT2"]);
    }

    #[test]
    fn test_non_blocking_pool_with_two_groups_is_defect() {
        let entries = vec![
            network("XPDR1-NETWORK1", XponderType::Switch),
            client("XPDR1-CLIENT1", "if-100GE"),
        ];
        let pools = vec![SwitchingPool::new(
            1,
            PoolType::NonBlocking,
            vec![
                NonBlockingGroup::new(1, ["XPDR1-NETWORK1"]),
                NonBlockingGroup::new(2, ["XPDR1-CLIENT1"]),
            ],
        )];
        let result = reconstruct(&entries, &pools);
        assert_eq!(
            result.defects,
            vec![ReconstructionDefect::PoolGroupCount { pool: 1, groups: 2 }]
        );
        assert_eq!(
            result.config.linkage_defects(),
            vec![ReconstructionDefect::NoLinkedClients {
                network_port: "XPDR1-NETWORK1".to_string()
            }]
        );
    }

    #[test]
    fn test_group_with_two_network_ports_is_unresolved() {
        let entries = vec![
            network("XPDR1-NETWORK1", XponderType::Switch),
            network("XPDR1-NETWORK2", XponderType::Switch),
            client("XPDR1-CLIENT1", "if-100GE"),
        ];
        let pools = vec![SwitchingPool::new(
            1,
            PoolType::NonBlocking,
            vec![NonBlockingGroup::new(
                1,
                ["XPDR1-NETWORK1", "XPDR1-NETWORK2", "XPDR1-CLIENT1"],
            )],
        )];
        let result = reconstruct(&entries, &pools);
        assert!(matches!(
            &result.defects[..],
            [ReconstructionDefect::UnresolvedGroup { network_ports, .. }] if network_ports.len() == 2
        ));
    }

    #[test]
    fn test_port_in_two_groups_is_reported_not_resolved() {
        let entries = vec![
            network("XPDR1-NETWORK1", XponderType::Switch),
            network("XPDR1-NETWORK2", XponderType::Switch),
            client("XPDR1-CLIENT1", "if-100GE"),
            client("XPDR1-CLIENT2", "if-100GE"),
        ];
        let pools = vec![
            SwitchingPool::new(
                1,
                PoolType::Blocking,
                vec![NonBlockingGroup::new(1, ["XPDR1-NETWORK1", "XPDR1-CLIENT1", "XPDR1-CLIENT2"])],
            ),
            SwitchingPool::new(
                2,
                PoolType::NonBlocking,
                vec![NonBlockingGroup::new(1, ["XPDR1-NETWORK2", "XPDR1-CLIENT1"])],
            ),
        ];
        let result = reconstruct(&entries, &pools);
        assert_eq!(
            result.defects,
            vec![ReconstructionDefect::DuplicateMembership {
                lcp: "XPDR1-CLIENT1".to_string(),
                groups: vec![(1, 1), (2, 1)],
            }]
        );
        let n1 = result.config.network("XPDR1-NETWORK1").unwrap();
        assert_eq!(n1.client_lcps().collect::<Vec<_>>(), vec!["XPDR1-CLIENT2"]);
        assert!(result.config.network("XPDR1-NETWORK2").unwrap().linked_clients.is_empty());
    }

    #[test]
    fn test_unknown_member_and_invalid_pool_type() {
        let entries = vec![network("XPDR1-NETWORK1", XponderType::Mpdr)];
        let mut bad = SwitchingPool::new(2, PoolType::Blocking, vec![]);
        bad.switching_pool_type = "partial".to_string();
        let pools = vec![
            SwitchingPool::new(
                1,
                PoolType::NonBlocking,
                vec![NonBlockingGroup::new(1, ["XPDR1-NETWORK1", "XPDR1-CLIENT9"])],
            ),
            bad,
        ];
        let result = reconstruct(&entries, &pools);
        assert_eq!(
            result.defects,
            vec![
                ReconstructionDefect::UnknownMember {
                    pool: 1,
                    group: 1,
                    lcp: "XPDR1-CLIENT9".to_string()
                },
                ReconstructionDefect::InvalidPoolType {
                    pool: 2,
                    value: "partial".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_srg_linked_to_every_degree() {
        let entries = vec![
            roadm("DEG1-TTP-TXRX"),
            roadm("DEG2-TTP-TXRX"),
            roadm("SRG1-PP1-TXRX"),
            roadm("SRG3-PP2-TXRX"),
            PortMappingEntry::new("DEG1-CTP-TXRX").with_qual(PortQual::RoadmInternal),
        ];
        let result = reconstruct(&entries, &[]);
        assert_eq!(result.config.len(), 2);
        for degree in result.config.degree_ports() {
            let srgs: Vec<&str> = degree.linked_srgs.iter().map(|s| s.lcp()).collect();
            assert_eq!(srgs, vec!["SRG1-PP1-TXRX", "SRG3-PP2-TXRX"]);
        }
        assert!(result.is_clean());
    }

    #[test]
    fn test_degree_without_srg_fails_linkage() {
        let result = reconstruct(&[roadm("DEG1-TTP-TXRX")], &[]);
        assert!(!result.is_clean());
        assert_eq!(
            result.all_defects(),
            vec![ReconstructionDefect::NoLinkedSrgs {
                degree_port: "DEG1-TTP-TXRX".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_rows_keep_first() {
        let entries = vec![
            network("XPDR1-NETWORK1", XponderType::Tpdr),
            client("XPDR1-CLIENT1", "if-100GE"),
            client("XPDR1-CLIENT1", "if-OTU4"),
        ];
        let pools = vec![SwitchingPool::new(
            1,
            PoolType::NonBlocking,
            vec![NonBlockingGroup::new(1, ["XPDR1-NETWORK1", "XPDR1-CLIENT1"])],
        )];
        let result = reconstruct(&entries, &pools);
        assert_eq!(
            result.defects,
            vec![ReconstructionDefect::DuplicateLcp {
                lcp: "XPDR1-CLIENT1".to_string()
            }]
        );
        let net = result.config.network("XPDR1-NETWORK1").unwrap();
        assert!(net.linked_clients[0].supports("if-100GE"));
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let entries = vec![
            network("XPDR1-NETWORK1", XponderType::Mpdr),
            client("XPDR1-CLIENT1", "if-10GE-ODU2e"),
            client("XPDR1-CLIENT2", "if-10GE-ODU2e").with_connection_map("XPDR1-NETWORK1"),
            roadm("DEG1-TTP-TXRX"),
            roadm("SRG1-PP1-TXRX"),
        ];
        let pools = vec![SwitchingPool::new(
            1,
            PoolType::NonBlocking,
            vec![NonBlockingGroup::new(1, ["XPDR1-NETWORK1", "XPDR1-CLIENT1", "XPDR1-CLIENT2"])],
        )];
        assert_eq!(reconstruct(&entries, &pools), reconstruct(&entries, &pools));
    }
}
