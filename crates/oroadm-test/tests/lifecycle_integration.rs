//! Lifecycle integration tests
//!
//! Runs the verifier against simulated elements and checks the verdict and
//! the element's residual state.

use oroadm_test::{
    assert_clean, assert_finding, assert_flags, device_fixtures, mapping_fixtures, Faults,
    SimulatedElement, ALL_PASS,
};
use oroadm_topology::{reconstruct_node, PortRoleConfig};
use oroadm_types::{NodePortMapping, PortRole};
use oroadm_verify::{
    Check, DefectCategory, LifecycleParams, LifecycleVerifier, Operation, ValidationVerdict,
    VerifierError, VerifierResult,
};
use pretty_assertions::assert_eq;

fn transponder() -> SimulatedElement {
    SimulatedElement::new(mapping_fixtures::transponder(), device_fixtures::transponder())
}

fn topology(element: &SimulatedElement) -> PortRoleConfig {
    let reconstruction = reconstruct_node(element.mapping());
    assert!(reconstruction.is_clean(), "{:?}", reconstruction.all_defects());
    reconstruction.config
}

async fn run(element: &SimulatedElement) -> VerifierResult<ValidationVerdict> {
    let config = topology(element);
    let verifier = LifecycleVerifier::new(element, element, LifecycleParams::new(element.node_id()));
    verifier.verify(&config).await
}

/// Transponder round trip
///
/// Scenario:
/// 1. Create the 100G path XPDR1-CLIENT1 -> XPDR1-NETWORK1
/// 2. Check OTU, ODU4 and client Ethernet configuration, PM and alarms
/// 3. Delete and check every interface is gone
#[tokio::test]
async fn test_transponder_round_trip() {
    let element = transponder();
    let verdict = run(&element).await.unwrap();

    assert_flags(&verdict, ALL_PASS).unwrap();
    assert!(verdict.findings().is_empty());
    assert_eq!(element.rpc_count(Operation::Create), 1);
    assert_eq!(element.rpc_count(Operation::Delete), 1);
    assert_clean(&element).unwrap();
    // one session each for the PM and the alarm read
    assert_eq!(element.sessions_opened(), 2);
}

/// Muxponder and switch nesting
///
/// The network service is brought up once per network port, every client
/// service runs a full cycle inside it, then the network service is removed.
#[tokio::test]
async fn test_switchponder_nests_client_cycles() {
    let element = SimulatedElement::new(mapping_fixtures::switchponder(), serde_json::Value::Null);
    let verdict = run(&element).await.unwrap();

    assert_flags(&verdict, ALL_PASS).unwrap();
    // XPDR1: network + 4 clients, XPDR2: network + 2 clients
    assert_eq!(element.rpc_count(Operation::Create), 8);
    assert_eq!(element.rpc_count(Operation::Delete), 8);
    assert_clean(&element).unwrap();
}

/// ROADM add and drop in both directions on every degree
#[tokio::test]
async fn test_roadm_add_drop_both_directions() {
    let element = SimulatedElement::new(mapping_fixtures::roadm(), device_fixtures::roadm());
    let verdict = run(&element).await.unwrap();

    assert_flags(&verdict, ALL_PASS).unwrap();
    // 2 degrees x 1 SRG x 2 directions
    assert_eq!(element.rpc_count(Operation::Create), 4);
    assert_clean(&element).unwrap();
}

/// Runs the verifier on a node whose mapping lost every row matching `drop`.
async fn run_without(
    mut mapping: NodePortMapping,
    drop: PortRole,
) -> (SimulatedElement, ValidationVerdict, usize) {
    mapping.mapping.retain(|row| row.role() != Some(drop));
    let element = SimulatedElement::new(mapping, serde_json::Value::Null);
    let reconstruction = reconstruct_node(element.mapping());
    let defects = reconstruction.all_defects().len();

    let verifier = LifecycleVerifier::new(&element, &element, LifecycleParams::new(element.node_id()));
    let verdict = verifier.verify(&reconstruction.config).await.unwrap();
    (element, verdict, defects)
}

#[tokio::test]
async fn test_network_port_without_clients_fails_create() {
    let (element, verdict, defects) =
        run_without(mapping_fixtures::transponder(), PortRole::XponderClient).await;

    assert_eq!(defects, 1);
    assert_flags(&verdict, (false, true, true, true, true)).unwrap();
    assert_finding(&verdict, Check::Create, DefectCategory::Reconstruction, "XPDR1-NETWORK1").unwrap();
    assert_eq!(element.rpc_count(Operation::Create), 0);
}

#[tokio::test]
async fn test_degree_without_srgs_fails_create() {
    let (element, verdict, defects) = run_without(mapping_fixtures::roadm(), PortRole::Srg).await;

    assert_eq!(defects, 2);
    assert!(!verdict.passed());
    assert_finding(&verdict, Check::Create, DefectCategory::Reconstruction, "DEG1-TTP-TXRX").unwrap();
    assert_finding(&verdict, Check::Create, DefectCategory::Reconstruction, "DEG2-TTP-TXRX").unwrap();
    assert_eq!(element.rpc_count(Operation::Create), 0);
}

#[tokio::test]
async fn test_interface_surviving_delete_fails_only_delete() {
    let element = transponder();
    element.set_faults(Faults {
        survive_delete: true,
        ..Faults::default()
    });
    let verdict = run(&element).await.unwrap();

    assert_flags(&verdict, (true, true, true, true, false)).unwrap();
    assert_finding(
        &verdict,
        Check::Delete,
        DefectCategory::LifecycleInconsistency,
        "XPDR1-NETWORK1-OTU",
    )
    .unwrap();
    assert!(assert_clean(&element).is_err());
}

#[tokio::test]
async fn test_wrong_config_fails_only_config() {
    let element = transponder();
    element.set_faults(Faults {
        wrong_state: Some("XPDR1-NETWORK1-ODU4".to_string()),
        ..Faults::default()
    });
    let verdict = run(&element).await.unwrap();

    assert_flags(&verdict, (true, false, true, true, true)).unwrap();
    assert_finding(
        &verdict,
        Check::Config,
        DefectCategory::AssertionMismatch,
        "XPDR1-NETWORK1-ODU4",
    )
    .unwrap();
    let finding = verdict
        .findings()
        .iter()
        .find(|f| f.check == Check::Config)
        .unwrap();
    assert!(finding.detail.contains("administrative-state"), "{}", finding.detail);
}

#[tokio::test]
async fn test_missing_interface_fails_create_and_config() {
    let element = transponder();
    element.set_faults(Faults {
        skip_resource: Some("XPDR1-CLIENT1-ETHERNET".to_string()),
        ..Faults::default()
    });
    let verdict = run(&element).await.unwrap();

    assert_flags(&verdict, (false, false, true, true, true)).unwrap();
    assert_finding(
        &verdict,
        Check::Create,
        DefectCategory::LifecycleInconsistency,
        "XPDR1-CLIENT1-ETHERNET",
    )
    .unwrap();
}

#[tokio::test]
async fn test_missing_telemetry_fails_pm_and_alarm() {
    let element = transponder();
    element.set_faults(Faults {
        drop_pm: true,
        ..Faults::default()
    });
    let verdict = run(&element).await.unwrap();
    assert_flags(&verdict, (true, true, false, true, true)).unwrap();

    let element = transponder();
    element.set_faults(Faults {
        drop_alarms: true,
        ..Faults::default()
    });
    let verdict = run(&element).await.unwrap();
    assert_flags(&verdict, (true, true, true, false, true)).unwrap();
    assert_finding(
        &verdict,
        Check::Alarm,
        DefectCategory::TelemetryUnavailable,
        "XPDR1-NETWORK1-OTU",
    )
    .unwrap();
}

#[tokio::test]
async fn test_session_failures_are_not_fatal() {
    let element = transponder();
    element.set_faults(Faults {
        sessions_offline: true,
        ..Faults::default()
    });
    let verdict = run(&element).await.unwrap();

    assert_flags(&verdict, (true, true, false, false, true)).unwrap();
    assert_clean(&element).unwrap();
}

#[tokio::test]
async fn test_rejected_create() {
    let element = transponder();
    element.set_faults(Faults {
        reject_create: true,
        ..Faults::default()
    });
    let verdict = run(&element).await.unwrap();

    // nothing was created, so nothing can survive the delete
    assert_flags(&verdict, (false, false, false, false, true)).unwrap();
    assert!(verdict
        .findings()
        .iter()
        .any(|f| f.check == Check::Create && f.detail.contains("rejected")));
}

#[tokio::test]
async fn test_unreachable_controller_aborts_run() {
    let element = transponder();
    element.set_faults(Faults {
        control_offline: true,
        ..Faults::default()
    });
    let err = run(&element).await.unwrap_err();
    assert!(matches!(err, VerifierError::ControlUnavailable { .. }));
    assert_eq!(element.rpc_count(Operation::Create), 0);
}

#[tokio::test]
async fn test_configured_rates_override_capabilities() {
    let element = SimulatedElement::new(mapping_fixtures::switchponder(), serde_json::Value::Null)
        .with_rate("XPDR2-NETWORK1", oroadm_types::SignalRate::R200G);
    let config = topology(&element);
    let params = LifecycleParams::new(element.node_id())
        .with_rates([oroadm_types::SignalRate::R200G]);
    let verifier = LifecycleVerifier::new(&element, &element, params);

    let record = config.network("XPDR2-NETWORK1").unwrap();
    let mut verdict = ValidationVerdict::new();
    verifier.verify_network_port(record, &mut verdict).await.unwrap();

    assert_flags(&verdict, ALL_PASS).unwrap();
    assert_clean(&element).unwrap();
}

/// Switch clients beyond the parent payload
///
/// At 100G the switch network port's ODU4 holds a single 100GE client, so
/// the second linked client is reported instead of being sent to the device.
#[tokio::test]
async fn test_clients_past_tributary_capacity_fail_create() {
    let element = SimulatedElement::new(mapping_fixtures::switchponder(), serde_json::Value::Null)
        .with_rate("XPDR2-NETWORK1", oroadm_types::SignalRate::R100G);
    let config = topology(&element);
    let params = LifecycleParams::new(element.node_id())
        .with_rates([oroadm_types::SignalRate::R100G]);
    let verifier = LifecycleVerifier::new(&element, &element, params);

    let record = config.network("XPDR2-NETWORK1").unwrap();
    let mut verdict = ValidationVerdict::new();
    verifier.verify_network_port(record, &mut verdict).await.unwrap();

    assert_flags(&verdict, (false, true, true, true, true)).unwrap();
    assert_finding(&verdict, Check::Create, DefectCategory::Reconstruction, "XPDR2-CLIENT2").unwrap();
    assert_eq!(verdict.findings().len(), 1);
    // network service plus the one client that fits
    assert_eq!(element.rpc_count(Operation::Create), 2);
    assert!(element.interface("XPDR2-NETWORK1-ODU4-XPDR2-CLIENT2").is_none());
    assert_clean(&element).unwrap();
}
