//! Telemetry access: current PM samples and active alarms.
//!
//! Every access opens a management session, submits one read and closes the
//! session again on both success and failure paths. Failures never propagate:
//! a missing session, a malformed envelope or a missing field is logged and
//! reported as "not found".

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::{as_list, field, str_field, unwrap_data};
use crate::session::{ReadRequest, ResourceId, SessionFactory};

/// One performance-monitoring sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PmMeasurement {
    pub resource: ResourceId,
    pub pm_type: String,
    pub extension: Option<String>,
    pub location: Option<String>,
    pub direction: Option<String>,
    pub granularity: Option<String>,
    pub value: String,
    pub unit: Option<String>,
    pub validity: Option<String>,
}

/// One entry of the active alarm list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AlarmRecord {
    pub id: String,
    /// Raw `resourceType/type` tag (`interface`, `port`, ...).
    pub resource_type: Option<String>,
    /// Resource identity, when it is an interface or a port.
    pub resource: Option<ResourceId>,
    pub probable_cause: Option<String>,
    pub severity: Option<String>,
    pub raise_time: Option<DateTime<FixedOffset>>,
}

impl AlarmRecord {
    /// Exact match on resource type and identity.
    pub fn concerns(&self, resource: &ResourceId) -> bool {
        self.resource_type.as_deref() == Some(resource.resource_type().as_str())
            && self.resource.as_ref() == Some(resource)
    }
}

/// Reads telemetry from one node.
pub struct TelemetryClient<'a> {
    sessions: &'a dyn SessionFactory,
    node_id: String,
}

impl<'a> TelemetryClient<'a> {
    pub fn new(sessions: &'a dyn SessionFactory, node_id: impl Into<String>) -> Self {
        Self {
            sessions,
            node_id: node_id.into(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Returns one current PM sample of a resource, or `None`.
    pub async fn current_pm(&self, resource: &ResourceId) -> Option<PmMeasurement> {
        let document = self.read(ReadRequest::CurrentPm(resource.clone())).await?;
        let sample = parse_current_pm(&document, resource);
        if sample.is_none() {
            warn!("No PM measurement for {} on {}", resource, self.node_id);
        }
        sample
    }

    /// Returns the active alarm list, or `None` if it could not be read.
    pub async fn active_alarms(&self) -> Option<Vec<AlarmRecord>> {
        let document = self.read(ReadRequest::ActiveAlarms).await?;
        let alarms = parse_active_alarms(&document);
        if alarms.is_none() {
            warn!("Malformed active alarm list from {}", self.node_id);
        }
        alarms
    }

    /// Returns true if an active alarm is raised on the resource.
    pub async fn has_alarm(&self, resource: &ResourceId) -> bool {
        match self.active_alarms().await {
            Some(alarms) => alarms.iter().any(|a| a.concerns(resource)),
            None => false,
        }
    }

    async fn read(&self, request: ReadRequest) -> Option<Value> {
        let mut session = match self.sessions.open(&self.node_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Cannot open session to {}: {}", self.node_id, e);
                return None;
            }
        };

        debug!("Reading {} from {}", request, self.node_id);
        let result = session.read(&request).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close session to {}: {}", self.node_id, e);
        }

        match result {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("Reading {} from {} failed: {}", request, self.node_id, e);
                None
            }
        }
    }
}

/// Extracts the first measurement of a current PM document.
///
/// Only an entry whose `pm-resource-instance` is the resource's own instance
/// path counts.
pub fn parse_current_pm(document: &Value, resource: &ResourceId) -> Option<PmMeasurement> {
    let root = unwrap_data(document);
    let entries = field(root, "current-pm-list")
        .and_then(|list| field(list, "current-pm-entry"))
        .or_else(|| field(root, "current-pm-entry"))?;

    let instance = resource.instance_path();
    let entry = as_list(entries).iter().find(|entry| {
        let type_matches = str_field(entry, "pm-resource-type")
            .map_or(true, |ty| ty == resource.resource_type().as_str());
        type_matches && str_field(entry, "pm-resource-instance") == Some(instance.as_str())
    })?;

    as_list(field(entry, "current-pm")?).iter().find_map(|pm| {
        let measurement = as_list(field(pm, "measurement")?).first()?;
        let value = match field(measurement, "pmParameterValue")? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(PmMeasurement {
            resource: resource.clone(),
            pm_type: str_field(pm, "type")?.to_string(),
            extension: str_field(pm, "extension").map(str::to_string),
            location: str_field(pm, "location").map(str::to_string),
            direction: str_field(pm, "direction").map(str::to_string),
            granularity: str_field(measurement, "granularity").map(str::to_string),
            value,
            unit: str_field(measurement, "pmParameterUnit").map(str::to_string),
            validity: str_field(measurement, "validity").map(str::to_string),
        })
    })
}

/// Parses an active alarm list document.
///
/// Returns `None` if the list container is missing, an empty vector if the
/// container holds no alarms.
pub fn parse_active_alarms(document: &Value) -> Option<Vec<AlarmRecord>> {
    let root = unwrap_data(document);
    let list = field(root, "active-alarm-list")?;
    let alarms = match field(list, "activeAlarms") {
        Some(alarms) => as_list(alarms),
        None => return Some(Vec::new()),
    };
    Some(alarms.iter().filter_map(parse_alarm).collect())
}

fn parse_alarm(alarm: &Value) -> Option<AlarmRecord> {
    let id = match str_field(alarm, "id") {
        Some(id) => id.to_string(),
        None => {
            debug!("Skipping alarm without id");
            return None;
        }
    };

    let resource_node = field(alarm, "resource");
    let resource = resource_node
        .and_then(|r| field(r, "resource"))
        .and_then(|r| serde_json::from_value::<ResourceId>(strip_prefixes(r)).ok());
    let resource_type = resource_node
        .and_then(|r| field(r, "resourceType"))
        .and_then(|t| str_field(t, "type"))
        .map(str::to_string);

    let raise_time = str_field(alarm, "raiseTime").and_then(|t| {
        DateTime::parse_from_rfc3339(t)
            .map_err(|e| debug!("Alarm {} has unparsable raiseTime {}: {}", id, t, e))
            .ok()
    });

    Some(AlarmRecord {
        resource_type,
        resource,
        probable_cause: field(alarm, "probableCause")
            .and_then(|c| str_field(c, "cause"))
            .map(str::to_string),
        severity: str_field(alarm, "severity").map(str::to_string),
        raise_time,
        id,
    })
}

/// Drops YANG module prefixes from object keys, recursively.
fn strip_prefixes(value: &Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(k, v)| {
                    let local = k.rsplit_once(':').map_or(k.as_str(), |(_, l)| l);
                    (local.to_string(), strip_prefixes(v))
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
