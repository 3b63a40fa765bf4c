//! In-memory network element behind a controller
//!
//! [`SimulatedElement`] answers renderer RPCs through the device-side
//! [`Renderer`](crate::renderer::Renderer), stores what it renders, and serves
//! lookups, current PM and active alarms for whatever is present. Faults can
//! be injected to drive each verdict flag down independently.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use oroadm_types::{NodePortMapping, SignalRate};
use oroadm_verify::envelope::{str_field, unwrap};
use oroadm_verify::Operation;
use oroadm_verify::session::{
    ControlApi, InterfaceLookup, ManagementSession, ReadRequest, ResourceId, RpcResponse,
    SessionFactory,
};
use oroadm_verify::{TransportError, TransportResult};

use crate::renderer::{RenderError, Renderer, Rendering};

/// Fixed raise time of simulated alarms.
const RAISE_TIME: &str = "2024-01-01T00:00:00+00:00";

/// Injectable misbehaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Faults {
    /// Every control API call fails as unreachable.
    pub control_offline: bool,
    /// Management sessions cannot be opened.
    pub sessions_offline: bool,
    /// Create calls answer `success: false`.
    pub reject_create: bool,
    /// This resource is silently not created.
    pub skip_resource: Option<String>,
    /// This interface is created out of service.
    pub wrong_state: Option<String>,
    /// Delete calls succeed but remove nothing.
    pub survive_delete: bool,
    /// No PM is served.
    pub drop_pm: bool,
    /// No alarm is raised.
    pub drop_alarms: bool,
}

#[derive(Debug, Default)]
struct ElementState {
    interfaces: BTreeMap<String, Value>,
    connections: BTreeMap<String, Value>,
    faults: Faults,
    rpc_log: Vec<(String, Operation)>,
    sessions_opened: usize,
    sessions_closed: usize,
}

/// One simulated node.
#[derive(Debug, Clone)]
pub struct SimulatedElement {
    mapping: NodePortMapping,
    device: Value,
    rates: BTreeMap<String, SignalRate>,
    state: Arc<Mutex<ElementState>>,
}

impl SimulatedElement {
    pub fn new(mapping: NodePortMapping, device: Value) -> Self {
        Self {
            mapping,
            device,
            rates: BTreeMap::new(),
            state: Arc::new(Mutex::new(ElementState::default())),
        }
    }

    /// Overrides the rate a network port runs at.
    pub fn with_rate(mut self, lcp: impl Into<String>, rate: SignalRate) -> Self {
        self.rates.insert(lcp.into(), rate);
        self
    }

    pub fn node_id(&self) -> &str {
        &self.mapping.node_id
    }

    pub fn mapping(&self) -> &NodePortMapping {
        &self.mapping
    }

    pub fn set_faults(&self, faults: Faults) {
        self.lock().faults = faults;
    }

    pub fn interface(&self, name: &str) -> Option<Value> {
        self.lock().interfaces.get(name).cloned()
    }

    pub fn interface_names(&self) -> Vec<String> {
        self.lock().interfaces.keys().cloned().collect()
    }

    pub fn connection_names(&self) -> Vec<String> {
        self.lock().connections.keys().cloned().collect()
    }

    /// Number of renderer calls per operation.
    pub fn rpc_count(&self, operation: Operation) -> usize {
        self.lock()
            .rpc_log
            .iter()
            .filter(|(_, op)| *op == operation)
            .count()
    }

    /// Sessions opened but not yet closed.
    pub fn open_sessions(&self) -> usize {
        let state = self.lock();
        state.sessions_opened - state.sessions_closed
    }

    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }

    fn lock(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn renderer(&self) -> Renderer<'_> {
        Renderer::new(&self.mapping, &self.rates)
    }

    fn create(&self, rendering: &Rendering, state: &mut ElementState) -> Value {
        if state.faults.reject_create {
            return failure("device rejected the configuration");
        }

        for resource in &rendering.resources {
            if state.faults.skip_resource.as_deref() == Some(resource.name.as_str()) {
                debug!("Not creating {}", resource.name);
                continue;
            }
            let mut stored = resource.config.clone();
            if let Value::Object(object) = &mut stored {
                if !resource.is_connection() {
                    object.insert("description".to_string(), json!(rendering.description));
                    if state.faults.wrong_state.as_deref() == Some(resource.name.as_str()) {
                        object.insert("administrative-state".to_string(), json!("outOfService"));
                    }
                }
            }

            let table = if resource.is_connection() {
                &mut state.connections
            } else {
                &mut state.interfaces
            };
            table.insert(resource.name.clone(), stored);
        }

        let node_id = self.node_id();
        json!({"output": {
            "success": true,
            "result": format!("Interfaces created successfully for nodes: {}", node_id),
            "node-interface": [rendering.node_interface(node_id)],
        }})
    }

    fn delete(&self, rendering: &Rendering, state: &mut ElementState) -> Value {
        if !state.faults.survive_delete {
            for resource in &rendering.resources {
                state.interfaces.remove(&resource.name);
                state.connections.remove(&resource.name);
            }
        }
        json!({"output": {"success": true, "result": "Request processed"}})
    }

    fn offline(&self) -> TransportResult<()> {
        if self.lock().faults.control_offline {
            return Err(TransportError::unavailable(self.node_id(), "controller unreachable"));
        }
        Ok(())
    }

    fn lookup_in(&self, node_id: &str, name: &str, connections: bool) -> TransportResult<InterfaceLookup> {
        self.offline()?;
        if node_id != self.node_id() {
            return Ok(InterfaceLookup::Absent(409));
        }
        let state = self.lock();
        let table = if connections {
            &state.connections
        } else {
            &state.interfaces
        };
        Ok(match table.get(name) {
            Some(config) => InterfaceLookup::Present(config.clone()),
            None => InterfaceLookup::Absent(404),
        })
    }
}

fn failure(result: &str) -> Value {
    json!({"output": {"success": false, "result": result}})
}

#[async_trait]
impl ControlApi for SimulatedElement {
    async fn invoke(&self, operation: &str, input: Value) -> TransportResult<RpcResponse> {
        self.offline()?;
        let input = unwrap(&input, "input");
        let op = match str_field(input, "operation") {
            Some("create") => Operation::Create,
            Some("delete") => Operation::Delete,
            other => {
                return Ok(RpcResponse::new(
                    400,
                    json!({"errors": {"error": [{"error-message": format!("bad operation {:?}", other)}]}}),
                ))
            }
        };

        let rendering = match self.renderer().render(operation, input) {
            Ok(rendering) => rendering,
            Err(err @ RenderError::UnknownRpc(_)) => {
                return Ok(RpcResponse::new(
                    404,
                    json!({"errors": {"error": [{"error-message": err.to_string()}]}}),
                ))
            }
            Err(RenderError::Rejected(reason)) => return Ok(RpcResponse::new(200, failure(&reason))),
        };

        let mut state = self.lock();
        state.rpc_log.push((operation.to_string(), op));
        let output = match op {
            Operation::Create => self.create(&rendering, &mut state),
            Operation::Delete => self.delete(&rendering, &mut state),
        };
        Ok(RpcResponse::new(200, output))
    }

    async fn get_interface(&self, node_id: &str, name: &str) -> TransportResult<InterfaceLookup> {
        self.lookup_in(node_id, name, false)
    }

    async fn get_roadm_connection(
        &self,
        node_id: &str,
        name: &str,
    ) -> TransportResult<InterfaceLookup> {
        self.lookup_in(node_id, name, true)
    }
}

/// Session over a [`SimulatedElement`].
#[derive(Debug)]
pub struct SimulatedSession {
    element: SimulatedElement,
    open: bool,
}

impl SimulatedSession {
    fn current_pm(&self, resource: &ResourceId) -> TransportResult<Value> {
        let target = resource.to_string();
        let state = self.element.lock();
        let present = match resource {
            ResourceId::Interface { interface_name } => state.interfaces.contains_key(interface_name),
            ResourceId::Port { .. } => true,
        };
        if state.faults.drop_pm || !present {
            return Err(TransportError::status(target, 404));
        }
        Ok(json!({"org-openroadm-pm:current-pm-entry": [{
            "pm-resource-type": resource.resource_type().as_str(),
            "pm-resource-type-extension": "",
            "pm-resource-instance": resource.instance_path(),
            "retrieval-time": RAISE_TIME,
            "current-pm": [{
                "type": "opticalPowerInput",
                "extension": "",
                "location": "nearEnd",
                "direction": "rx",
                "measurement": [{
                    "granularity": "15min",
                    "pmParameterValue": "-40.0",
                    "pmParameterUnit": "dBm",
                    "validity": "complete",
                }],
            }],
        }]}))
    }

    fn active_alarms(&self) -> Value {
        let state = self.element.lock();
        let alarms: Vec<Value> = if state.faults.drop_alarms {
            Vec::new()
        } else {
            state
                .interfaces
                .keys()
                .enumerate()
                .map(|(i, name)| {
                    json!({
                        "id": (i + 1).to_string(),
                        "resource": {
                            "resource": {"interface": {"interface-name": name}},
                            "resourceType": {"type": "interface"},
                        },
                        "probableCause": {"cause": "lossOfSignal", "direction": "rx"},
                        "raiseTime": RAISE_TIME,
                        "severity": "critical",
                    })
                })
                .collect()
        };
        let mut list = Map::new();
        list.insert("activeAlarms".to_string(), Value::Array(alarms));
        json!({"org-openroadm-alarm:active-alarm-list": Value::Object(list)})
    }
}

#[async_trait]
impl ManagementSession for SimulatedSession {
    async fn read(&mut self, request: &ReadRequest) -> TransportResult<Value> {
        if !self.open {
            return Err(TransportError::unavailable(self.element.node_id(), "session closed"));
        }
        match request {
            ReadRequest::DeviceConfig => Ok(self.element.device.clone()),
            ReadRequest::CurrentPm(resource) => self.current_pm(resource),
            ReadRequest::ActiveAlarms => Ok(self.active_alarms()),
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        if self.open {
            self.open = false;
            self.element.lock().sessions_closed += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for SimulatedElement {
    async fn open(&self, node_id: &str) -> TransportResult<Box<dyn ManagementSession>> {
        let mut state = self.lock();
        if state.faults.sessions_offline {
            return Err(TransportError::unavailable(node_id, "NETCONF session refused"));
        }
        if node_id != self.node_id() {
            return Err(TransportError::status(node_id, 404));
        }
        state.sessions_opened += 1;
        drop(state);
        Ok(Box::new(SimulatedSession {
            element: self.clone(),
            open: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{device_fixtures, mapping_fixtures};
    use crate::renderer::{OTN_SERVICE_PATH, SERVICE_PATH};
    use pretty_assertions::assert_eq;

    fn transponder() -> SimulatedElement {
        SimulatedElement::new(mapping_fixtures::transponder(), device_fixtures::transponder())
    }

    fn path_input(operation: &str) -> Value {
        json!({"input": {
            "service-name": "svc",
            "operation": operation,
            "modulation-format": "dp-qpsk",
            "center-freq": 196.1,
            "nmc-width": 50.0,
            "min-freq": 196.075,
            "max-freq": 196.125,
            "lower-spectral-slot-number": 761,
            "higher-spectral-slot-number": 768,
            "nodes": [{"node-id": "XPDR-A1", "src-tp": "XPDR1-CLIENT1", "dest-tp": "XPDR1-NETWORK1"}],
        }})
    }

    #[tokio::test]
    async fn test_create_then_delete() {
        let element = transponder();
        let response = element.invoke(SERVICE_PATH, path_input("create")).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.output["output"]["success"], true);
        assert_eq!(
            element.interface_names(),
            vec!["XPDR1-CLIENT1-ETHERNET", "XPDR1-NETWORK1-ODU4", "XPDR1-NETWORK1-OTU"]
        );

        element.invoke(SERVICE_PATH, path_input("delete")).await.unwrap();
        assert!(element.interface_names().is_empty());
        assert_eq!(element.rpc_count(Operation::Create), 1);
        assert_eq!(element.rpc_count(Operation::Delete), 1);
    }

    #[tokio::test]
    async fn test_stored_line_interfaces() {
        let element = transponder();
        element.invoke(SERVICE_PATH, path_input("create")).await.unwrap();

        let otu = element.interface("XPDR1-NETWORK1-OTU").unwrap();
        assert_eq!(otu["type"], "org-openroadm-interfaces:otnOtu");
        assert_eq!(otu["supporting-circuit-pack-name"], "1/0/1-PLUG-NET");
        assert_eq!(otu["supporting-port"], "1");
        assert_eq!(
            otu["org-openroadm-otn-otu-interfaces:otu"]["rate"],
            "org-openroadm-otn-common-types:OTU4"
        );
        let odu = element.interface("XPDR1-NETWORK1-ODU4").unwrap();
        assert_eq!(odu["supporting-interface-list"], json!(["XPDR1-NETWORK1-OTU"]));
        assert_eq!(
            odu["org-openroadm-otn-odu-interfaces:odu"]["odu-function"],
            "org-openroadm-otn-common-types:ODU-TTP"
        );
        let eth = element.interface("XPDR1-CLIENT1-ETHERNET").unwrap();
        assert_eq!(eth["org-openroadm-ethernet-interfaces:ethernet"]["speed"], 100_000);
    }

    #[tokio::test]
    async fn test_stored_roadm_connection() {
        let element = SimulatedElement::new(mapping_fixtures::roadm(), device_fixtures::roadm());
        let mut input = path_input("create");
        input["input"]["nodes"] =
            json!([{"node-id": "ROADM-A1", "src-tp": "SRG1-PP1-TXRX", "dest-tp": "DEG1-TTP-TXRX"}]);
        element.invoke(SERVICE_PATH, input).await.unwrap();

        assert_eq!(
            element.connection_names(),
            vec!["SRG1-PP1-TXRX-DEG1-TTP-TXRX-761:768"]
        );
        assert_eq!(
            element.interface_names(),
            vec![
                "DEG1-TTP-TXRX-mc-761:768",
                "DEG1-TTP-TXRX-nmc-761:768",
                "SRG1-PP1-TXRX-nmc-761:768",
            ]
        );
        let mc = element.interface("DEG1-TTP-TXRX-mc-761:768").unwrap();
        assert_eq!(
            mc["org-openroadm-media-channel-interfaces:mc-ttp"],
            json!({"min-freq": 196.075, "max-freq": 196.125})
        );
    }

    #[tokio::test]
    async fn test_muxponder_tributary_allocation() {
        let element = SimulatedElement::new(mapping_fixtures::switchponder(), device_fixtures::transponder());
        let input = json!({"input": {
            "operation": "create",
            "service-rate": 10,
            "trib-port-number": 2,
            "trib-slot": [9, 10, 11, 12, 13, 14, 15, 16],
            "nodes": [{"node-id": "SPDR-SA1", "client-tp": "XPDR1-CLIENT2", "network-tp": "XPDR1-NETWORK1"}],
        }});
        let response = element.invoke(OTN_SERVICE_PATH, input).await.unwrap();
        assert_eq!(response.output["output"]["success"], true);

        let tributary = element.interface("XPDR1-NETWORK1-ODU2e-XPDR1-CLIENT2").unwrap();
        assert_eq!(tributary["supporting-interface-list"], json!(["XPDR1-NETWORK1-ODU4"]));
        assert_eq!(
            tributary["org-openroadm-otn-odu-interfaces:odu"]["parent-odu-allocation"],
            json!({"trib-port-number": 2, "trib-slots": [9, 10, 11, 12, 13, 14, 15, 16]})
        );
        assert!(element.interface("XPDR1-CLIENT2-ETHERNET10G").is_some());
        assert!(element.interface("XPDR1-CLIENT2-ODU2e").is_some());
    }

    #[tokio::test]
    async fn test_unknown_port_is_a_renderer_failure() {
        let element = transponder();
        let mut input = path_input("create");
        input["input"]["nodes"][0]["dest-tp"] = json!("XPDR9-NETWORK1");
        let response = element.invoke(SERVICE_PATH, input).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.output["output"]["success"], false);
        assert!(element.interface_names().is_empty());
    }

    #[tokio::test]
    async fn test_offline_control_is_unavailable() {
        let element = transponder();
        element.set_faults(Faults {
            control_offline: true,
            ..Faults::default()
        });
        let err = element.get_interface("XPDR-A1", "x").await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_sessions_are_counted() {
        let element = transponder();
        let mut session = element.open("XPDR-A1").await.unwrap();
        assert_eq!(element.open_sessions(), 1);
        let alarms = session.read(&ReadRequest::ActiveAlarms).await.unwrap();
        assert_eq!(
            alarms["org-openroadm-alarm:active-alarm-list"]["activeAlarms"],
            json!([])
        );
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(element.open_sessions(), 0);
        assert!(element.open("ROADM-A1").await.is_err());
    }
}
