//! Collaborator seams: management sessions and the control API.
//!
//! - [`ManagementSession`] / [`SessionFactory`]: read-only access to a node's
//!   datastore (device configuration, current PM, active alarms)
//! - [`ControlApi`]: renderer RPCs plus interface lookups on a node
//! - [`ReadRequest`]: what a session is asked to read, renderable as a
//!   NETCONF subtree filter or as RESTCONF path segments

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportResult;

/// Root container of the OpenROADM device model.
pub const DEVICE_ROOT: &str = "org-openroadm-device:org-openroadm-device";

const DEVICE_NS: &str = "http://org/openroadm/device";
const PM_NS: &str = "http://org/openroadm/pm";
const ALARM_NS: &str = "http://org/openroadm/alarm";

/// Statuses meaning "this resource does not exist (any more)".
pub const ABSENT_STATUSES: [u16; 3] = [404, 409, 503];

/// Resource type tag of PM entries and alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Port,
    Interface,
}

impl ResourceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Port => "port",
            ResourceType::Interface => "interface",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of a monitored resource.
///
/// Serializes in the alarm model's shape, e.g.
/// `{"interface": {"interface-name": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum ResourceId {
    Interface {
        interface_name: String,
    },
    Port {
        circuit_pack_name: String,
        port_name: String,
    },
}

impl ResourceId {
    pub fn interface(name: impl Into<String>) -> Self {
        Self::Interface {
            interface_name: name.into(),
        }
    }

    pub fn port(circuit_pack: impl Into<String>, port: impl Into<String>) -> Self {
        Self::Port {
            circuit_pack_name: circuit_pack.into(),
            port_name: port.into(),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceId::Interface { .. } => ResourceType::Interface,
            ResourceId::Port { .. } => ResourceType::Port,
        }
    }

    /// Instance identifier used as `pm-resource-instance`.
    pub fn instance_path(&self) -> String {
        match self {
            ResourceId::Interface { interface_name } => {
                format!("/{}/interface[name='{}']", DEVICE_ROOT, interface_name)
            }
            ResourceId::Port {
                circuit_pack_name,
                port_name,
            } => format!(
                "/{}/circuit-packs[circuit-pack-name='{}']/ports[port-name='{}']",
                DEVICE_ROOT, circuit_pack_name, port_name
            ),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Interface { interface_name } => write!(f, "interface {}", interface_name),
            ResourceId::Port {
                circuit_pack_name,
                port_name,
            } => write!(f, "port {}/{}", circuit_pack_name, port_name),
        }
    }
}

/// A read submitted over a management session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadRequest {
    /// The whole device configuration tree.
    DeviceConfig,
    /// Current PM entry of one resource.
    CurrentPm(ResourceId),
    /// The active alarm list.
    ActiveAlarms,
}

impl ReadRequest {
    /// NETCONF subtree filter selecting this request's data.
    pub fn subtree_filter(&self) -> String {
        match self {
            ReadRequest::DeviceConfig => {
                format!("<org-openroadm-device xmlns=\"{}\"/>", DEVICE_NS)
            }
            ReadRequest::CurrentPm(resource) => {
                let instance = resource
                    .instance_path()
                    .replace(DEVICE_ROOT, "d:org-openroadm-device")
                    .replace("/interface[name=", "/d:interface[d:name=")
                    .replace("/circuit-packs[circuit-pack-name=", "/d:circuit-packs[d:circuit-pack-name=")
                    .replace("/ports[port-name=", "/d:ports[d:port-name=");
                format!(
                    "<current-pm-list xmlns=\"{pm}\"><current-pm-entry>\
                     <pm-resource-type>{ty}</pm-resource-type>\
                     <pm-resource-type-extension></pm-resource-type-extension>\
                     <pm-resource-instance xmlns:d=\"{dev}\">{inst}</pm-resource-instance>\
                     </current-pm-entry></current-pm-list>",
                    pm = PM_NS,
                    ty = resource.resource_type(),
                    dev = DEVICE_NS,
                    inst = xml_escape(&instance),
                )
            }
            ReadRequest::ActiveAlarms => {
                format!("<active-alarm-list xmlns=\"{}\"/>", ALARM_NS)
            }
        }
    }

    /// RESTCONF path segments below a node's mount point (unencoded).
    pub fn restconf_segments(&self) -> Vec<String> {
        match self {
            ReadRequest::DeviceConfig => vec![DEVICE_ROOT.to_string()],
            ReadRequest::CurrentPm(resource) => vec![
                "org-openroadm-pm:current-pm-list".to_string(),
                format!(
                    "current-pm-entry={},,{}",
                    resource.resource_type(),
                    resource.instance_path()
                ),
            ],
            ReadRequest::ActiveAlarms => vec!["org-openroadm-alarm:active-alarm-list".to_string()],
        }
    }
}

impl fmt::Display for ReadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadRequest::DeviceConfig => write!(f, "device config"),
            ReadRequest::CurrentPm(resource) => write!(f, "current PM of {}", resource),
            ReadRequest::ActiveAlarms => write!(f, "active alarms"),
        }
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// An open management session to one node.
#[async_trait]
pub trait ManagementSession: Send {
    /// Submits a read and returns the response document.
    async fn read(&mut self, request: &ReadRequest) -> TransportResult<Value>;

    /// Releases the session.
    async fn close(&mut self) -> TransportResult<()>;
}

/// Opens management sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, node_id: &str) -> TransportResult<Box<dyn ManagementSession>>;
}

/// Response of a control-plane RPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub status: u16,
    pub output: Value,
}

impl RpcResponse {
    pub fn new(status: u16, output: Value) -> Self {
        Self { status, output }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of looking up an interface or connection on a node.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceLookup {
    /// The resource exists; carries its configuration.
    Present(Value),
    /// The resource does not exist; carries the status that said so.
    Absent(u16),
}

impl InterfaceLookup {
    pub fn is_present(&self) -> bool {
        matches!(self, InterfaceLookup::Present(_))
    }
}

/// Control-plane collaborator: renderer RPCs and resource lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// Invokes an RPC such as `transportpce-device-renderer:service-path`.
    async fn invoke(&self, operation: &str, input: Value) -> TransportResult<RpcResponse>;

    /// Looks up an interface on a node.
    async fn get_interface(&self, node_id: &str, name: &str) -> TransportResult<InterfaceLookup>;

    /// Looks up a ROADM cross-connection on a node.
    async fn get_roadm_connection(
        &self,
        node_id: &str,
        name: &str,
    ) -> TransportResult<InterfaceLookup>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instance_paths() {
        assert_eq!(
            ResourceId::interface("XPDR1-NETWORK1-OTU").instance_path(),
            "/org-openroadm-device:org-openroadm-device/interface[name='XPDR1-NETWORK1-OTU']"
        );
        assert_eq!(
            ResourceId::port("1/0/1-PLUG-NET", "1").instance_path(),
            "/org-openroadm-device:org-openroadm-device/circuit-packs[circuit-pack-name='1/0/1-PLUG-NET']/ports[port-name='1']"
        );
    }

    #[test]
    fn test_pm_subtree_filter() {
        let filter = ReadRequest::CurrentPm(ResourceId::interface("XPDR1-NETWORK1-OTU")).subtree_filter();
        assert!(filter.starts_with("<current-pm-list xmlns=\"http://org/openroadm/pm\">"));
        assert!(filter.contains("<pm-resource-type>interface</pm-resource-type>"));
        assert!(filter.contains("/d:org-openroadm-device/d:interface[d:name='XPDR1-NETWORK1-OTU']"));
    }

    #[test]
    fn test_port_pm_subtree_filter() {
        let filter = ReadRequest::CurrentPm(ResourceId::port("CP1", "P1")).subtree_filter();
        assert!(filter.contains("<pm-resource-type>port</pm-resource-type>"));
        assert!(filter.contains("/d:circuit-packs[d:circuit-pack-name='CP1']/d:ports[d:port-name='P1']"));
    }

    #[test]
    fn test_restconf_segments() {
        let segments = ReadRequest::CurrentPm(ResourceId::interface("X")).restconf_segments();
        assert_eq!(segments[0], "org-openroadm-pm:current-pm-list");
        assert_eq!(
            segments[1],
            "current-pm-entry=interface,,/org-openroadm-device:org-openroadm-device/interface[name='X']"
        );
        assert_eq!(
            ReadRequest::ActiveAlarms.restconf_segments(),
            vec!["org-openroadm-alarm:active-alarm-list".to_string()]
        );
    }

    #[test]
    fn test_rpc_response_success() {
        assert!(RpcResponse::new(200, Value::Null).is_success());
        assert!(RpcResponse::new(204, Value::Null).is_success());
        assert!(!RpcResponse::new(500, Value::Null).is_success());
    }
}
