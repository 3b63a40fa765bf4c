//! Recursive structural conformance checker.
//!
//! Each structural [`Role`] has its own validator. A validator walks the
//! role's checklist, records a [`StructuralDefect`] for every missing
//! attribute, dispatches nested roles to their validators (single instance or
//! list fan-out) and finally applies role-specific value checks. Defects are
//! never raised: they downgrade the local validity flag and are collected in
//! the [`ConformanceReport`].

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use oroadm_types::{DeviceCategory, SchemaVersion};

use crate::error::{RegistryError, RegistryResult};
use crate::registry::{Checklist, Role, SchemaRegistry};

/// Envelope keys under which a device returns its configuration tree.
const DEVICE_ROOT_KEYS: [&str; 2] = ["org-openroadm-device:org-openroadm-device", "org-openroadm-device"];

const ADMIN_STATES: &[&str] = &["inService", "outOfService", "maintenance"];
const PORT_DIRECTIONS: &[&str] = &["tx", "rx", "bidirectional"];
const PORT_QUALS: &[&str] = &[
    "roadm-internal",
    "roadm-external",
    "xpdr-network",
    "xpdr-client",
    "switch-network",
    "switch-client",
    "otdr",
    "ila-external",
    "ila-internal",
];
const NODE_TYPES: &[&str] = &["rdm", "xpdr", "ila", "extplug"];
const XPDR_TYPES: &[&str] = &["tpdr", "mpdr", "switch", "regen", "regen-uni"];

/// Top-level subtree of a device configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceTree {
    Info,
    Shelves,
    CircuitPacks,
    Xponders,
    Degrees,
    SharedRiskGroups,
}

impl DeviceTree {
    /// Key of the subtree under the device root.
    pub const fn key(&self) -> &'static str {
        match self {
            DeviceTree::Info => "info",
            DeviceTree::Shelves => "shelves",
            DeviceTree::CircuitPacks => "circuit-packs",
            DeviceTree::Xponders => "xponder",
            DeviceTree::Degrees => "degree",
            DeviceTree::SharedRiskGroups => "shared-risk-group",
        }
    }

    /// Role of each instance in the subtree.
    pub const fn role(&self) -> Role {
        match self {
            DeviceTree::Info => Role::Info,
            DeviceTree::Shelves => Role::Shelf,
            DeviceTree::CircuitPacks => Role::CircuitPack,
            DeviceTree::Xponders => Role::Xponder,
            DeviceTree::Degrees => Role::Degree,
            DeviceTree::SharedRiskGroups => Role::SharedRiskGroup,
        }
    }

    /// Subtrees evaluated for a device category.
    pub fn required_for(category: Option<DeviceCategory>) -> Vec<DeviceTree> {
        let mut trees = vec![DeviceTree::Info, DeviceTree::Shelves, DeviceTree::CircuitPacks];
        match category {
            Some(DeviceCategory::Xponder) => trees.push(DeviceTree::Xponders),
            Some(DeviceCategory::Roadm) => {
                trees.push(DeviceTree::Degrees);
                trees.push(DeviceTree::SharedRiskGroups);
            }
            None => {}
        }
        trees
    }
}

impl fmt::Display for DeviceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Severity of a structural defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fails the enclosing role.
    Error,
    /// Logged only (soft attributes).
    Warning,
}

/// What is wrong at a defect location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum DefectKind {
    /// A checklist attribute is absent.
    MissingAttribute,
    /// A required top-level subtree is absent.
    MissingTree,
    /// A role instance is not a JSON object.
    NotAnObject,
    /// A leaf holds a value outside its allowed set.
    InvalidValue { value: String },
    /// The device category could not be determined.
    UnknownCategory,
}

/// One structural defect, located by a path such as
/// `circuit-packs[1/0/1-PLUG-NET]/ports[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralDefect {
    pub path: String,
    pub role: Option<Role>,
    pub attribute: String,
    #[serde(flatten)]
    pub kind: DefectKind,
    pub severity: Severity,
}

impl StructuralDefect {
    fn error(path: &str, role: Option<Role>, attribute: &str, kind: DefectKind) -> Self {
        Self {
            path: path.to_string(),
            role,
            attribute: attribute.to_string(),
            kind,
            severity: Severity::Error,
        }
    }
}

impl fmt::Display for StructuralDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        match &self.kind {
            DefectKind::MissingAttribute => write!(f, "{}: missing '{}'", path, self.attribute),
            DefectKind::MissingTree => write!(f, "missing subtree '{}'", self.attribute),
            DefectKind::NotAnObject => write!(f, "{}: '{}' is not an object", path, self.attribute),
            DefectKind::InvalidValue { value } => {
                write!(f, "{}: invalid '{}' value '{}'", path, self.attribute, value)
            }
            DefectKind::UnknownCategory => write!(f, "device category could not be determined"),
        }
    }
}

/// Outcome of one top-level subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryResult {
    pub tree: DeviceTree,
    pub valid: bool,
    /// Number of role instances found in the subtree.
    pub instances: usize,
}

/// Result of checking a whole device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceReport {
    pub version: String,
    pub category: Option<DeviceCategory>,
    pub results: Vec<CategoryResult>,
    pub defects: Vec<StructuralDefect>,
}

impl ConformanceReport {
    /// Returns true if the category is known and every subtree is valid.
    pub fn is_valid(&self) -> bool {
        self.category.is_some() && self.results.iter().all(|r| r.valid)
    }

    /// Validity of one subtree, `None` if it was not evaluated.
    pub fn tree_valid(&self, tree: DeviceTree) -> Option<bool> {
        self.results.iter().find(|r| r.tree == tree).map(|r| r.valid)
    }

    pub fn errors(&self) -> impl Iterator<Item = &StructuralDefect> {
        self.defects.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StructuralDefect> {
        self.defects.iter().filter(|d| d.severity == Severity::Warning)
    }
}

/// Recursive validator for one model version.
#[derive(Debug, Clone)]
pub struct StructuralChecker<'a> {
    registry: &'a SchemaRegistry,
    version: SchemaVersion,
}

impl<'a> StructuralChecker<'a> {
    /// Creates a checker; fails if the registry has no checklists for
    /// `version`.
    pub fn new(registry: &'a SchemaRegistry, version: SchemaVersion) -> RegistryResult<Self> {
        if !registry.contains_version(&version) {
            return Err(RegistryError::unknown_version(version.as_str()));
        }
        Ok(Self { registry, version })
    }

    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    /// Checks a full device configuration document.
    ///
    /// `category` selects the xponder or ROADM branch; when `None` it is read
    /// from `info/node-type`. Every subtree is evaluated even after a failure
    /// so that the report lists all defects.
    pub fn check_device(&self, doc: &Value, category: Option<DeviceCategory>) -> ConformanceReport {
        let device = device_root(doc);
        let mut defects = Vec::new();

        let category = category.or_else(|| declared_category(device));
        if category.is_none() {
            error!("Device category could not be determined from info/node-type");
            defects.push(StructuralDefect::error(
                "info",
                Some(Role::Info),
                "node-type",
                DefectKind::UnknownCategory,
            ));
        }

        let results: Vec<CategoryResult> = DeviceTree::required_for(category)
            .into_iter()
            .filter_map(|tree| self.check_tree(device, tree, &mut defects))
            .collect();

        let report = ConformanceReport {
            version: self.version.to_string(),
            category,
            results,
            defects,
        };
        info!(
            "Structural check for version {}: {} ({} errors, {} warnings)",
            self.version,
            if report.is_valid() { "valid" } else { "INVALID" },
            report.errors().count(),
            report.warnings().count()
        );
        report
    }

    /// Checks one top-level subtree, `None` if this version has no checklist
    /// for its role.
    pub fn check_tree(
        &self,
        device: &Value,
        tree: DeviceTree,
        defects: &mut Vec<StructuralDefect>,
    ) -> Option<CategoryResult> {
        let role = tree.role();
        if self.registry.checklist(&self.version, role).is_none() {
            debug!("No {} checklist in version {}, skipping {}", role, self.version, tree);
            return None;
        }

        let Some(value) = device.get(tree.key()) else {
            warn!("Device configuration has no '{}' subtree", tree.key());
            defects.push(StructuralDefect::error("", None, tree.key(), DefectKind::MissingTree));
            return Some(CategoryResult {
                tree,
                valid: false,
                instances: 0,
            });
        };

        let instances = match value {
            Value::Array(items) => items.len(),
            _ => 1,
        };
        let valid = self.fan_out(role, value, tree.key(), defects);
        debug!("{} {}: {} instances, valid={}", self.version, tree, instances, valid);

        Some(CategoryResult {
            tree,
            valid,
            instances,
        })
    }

    /// Validates `node` as an instance of `role`.
    pub fn check_role(
        &self,
        role: Role,
        node: &Value,
        path: &str,
        defects: &mut Vec<StructuralDefect>,
    ) -> bool {
        let Some(checklist) = self.registry.checklist(&self.version, role) else {
            debug!("No {} checklist in version {}, nothing required", role, self.version);
            return true;
        };

        match role {
            Role::Info => self.check_info(checklist, node, path, defects),
            Role::Shelf => self.check_shelf(checklist, node, path, defects),
            Role::Slot => self.check_slot(checklist, node, path, defects),
            Role::CircuitPack => self.check_circuit_pack(checklist, node, path, defects),
            Role::Port => self.check_port(checklist, node, path, defects),
            Role::Capabilities | Role::Capability => {
                self.check_capability(checklist, node, path, defects)
            }
            Role::Xponder => self.check_xponder(checklist, node, path, defects),
            Role::XponderPort => self.check_xponder_port(checklist, node, path, defects),
            Role::Degree => self.check_degree(checklist, node, path, defects),
            Role::SharedRiskGroup => self.check_srg(checklist, node, path, defects),
        }
    }

    fn check_info(&self, cl: &Checklist, node: &Value, path: &str, d: &mut Vec<StructuralDefect>) -> bool {
        let mut valid = self.check_attributes(cl, node, path, d);
        valid &= check_enum(node, Role::Info, "node-type", NODE_TYPES, path, d);
        valid
    }

    fn check_shelf(&self, cl: &Checklist, node: &Value, path: &str, d: &mut Vec<StructuralDefect>) -> bool {
        let mut valid = self.check_attributes(cl, node, path, d);
        valid &= check_enum(node, Role::Shelf, "administrative-state", ADMIN_STATES, path, d);
        valid
    }

    fn check_slot(&self, cl: &Checklist, node: &Value, path: &str, d: &mut Vec<StructuralDefect>) -> bool {
        self.check_attributes(cl, node, path, d)
    }

    fn check_circuit_pack(
        &self,
        cl: &Checklist,
        node: &Value,
        path: &str,
        d: &mut Vec<StructuralDefect>,
    ) -> bool {
        let mut valid = self.check_attributes(cl, node, path, d);
        valid &= check_enum(node, Role::CircuitPack, "administrative-state", ADMIN_STATES, path, d);
        valid
    }

    fn check_port(&self, cl: &Checklist, node: &Value, path: &str, d: &mut Vec<StructuralDefect>) -> bool {
        let mut valid = self.check_attributes(cl, node, path, d);
        valid &= check_enum(node, Role::Port, "port-direction", PORT_DIRECTIONS, path, d);
        valid &= check_enum(node, Role::Port, "port-qual", PORT_QUALS, path, d);
        valid &= check_enum(node, Role::Port, "administrative-state", ADMIN_STATES, path, d);
        valid
    }

    fn check_capability(
        &self,
        cl: &Checklist,
        node: &Value,
        path: &str,
        d: &mut Vec<StructuralDefect>,
    ) -> bool {
        self.check_attributes(cl, node, path, d)
    }

    fn check_xponder(&self, cl: &Checklist, node: &Value, path: &str, d: &mut Vec<StructuralDefect>) -> bool {
        let mut valid = self.check_attributes(cl, node, path, d);
        valid &= check_enum(node, Role::Xponder, "xpdr-type", XPDR_TYPES, path, d);
        valid
    }

    fn check_xponder_port(
        &self,
        cl: &Checklist,
        node: &Value,
        path: &str,
        d: &mut Vec<StructuralDefect>,
    ) -> bool {
        self.check_attributes(cl, node, path, d)
    }

    fn check_degree(&self, cl: &Checklist, node: &Value, path: &str, d: &mut Vec<StructuralDefect>) -> bool {
        let mut valid = self.check_attributes(cl, node, path, d);
        valid &= check_positive(node, Role::Degree, "max-wavelengths", path, d);
        valid
    }

    fn check_srg(&self, cl: &Checklist, node: &Value, path: &str, d: &mut Vec<StructuralDefect>) -> bool {
        let mut valid = self.check_attributes(cl, node, path, d);
        valid &= check_positive(node, Role::SharedRiskGroup, "max-add-drop-ports", path, d);
        valid
    }

    /// Walks a checklist over one object, recursing into nested roles.
    fn check_attributes(
        &self,
        checklist: &Checklist,
        node: &Value,
        path: &str,
        defects: &mut Vec<StructuralDefect>,
    ) -> bool {
        let role = checklist.role;
        let Some(object) = node.as_object() else {
            warn!("{}: {} instance is not an object", display_path(path), role);
            defects.push(StructuralDefect::error(path, Some(role), &role.to_string(), DefectKind::NotAnObject));
            return false;
        };

        let mut valid = true;
        for attr in &checklist.attributes {
            match (object.get(&attr.name), attr.nested) {
                (None, _) if attr.soft => {
                    warn!(
                        "{}: optional {} attribute '{}' not present, skipping",
                        display_path(path),
                        role,
                        attr.name
                    );
                    defects.push(StructuralDefect {
                        severity: Severity::Warning,
                        ..StructuralDefect::error(path, Some(role), &attr.name, DefectKind::MissingAttribute)
                    });
                }
                (None, _) => {
                    warn!("{}: {} attribute '{}' is missing", display_path(path), role, attr.name);
                    defects.push(StructuralDefect::error(
                        path,
                        Some(role),
                        &attr.name,
                        DefectKind::MissingAttribute,
                    ));
                    valid = false;
                }
                (Some(value), Some(nested)) => {
                    let child = join(path, &attr.name);
                    if attr.soft {
                        let mut scratch = Vec::new();
                        if !self.fan_out(nested, value, &child, &mut scratch) {
                            warn!("{}: optional {} subtree has defects", child, nested);
                        }
                        defects.extend(scratch.into_iter().map(|mut defect| {
                            defect.severity = Severity::Warning;
                            defect
                        }));
                    } else {
                        valid &= self.fan_out(nested, value, &child, defects);
                    }
                }
                (Some(_), None) => {}
            }
        }
        valid
    }

    /// Validates a single instance or every instance of a list.
    fn fan_out(
        &self,
        role: Role,
        value: &Value,
        path: &str,
        defects: &mut Vec<StructuralDefect>,
    ) -> bool {
        match value {
            Value::Array(items) => items.iter().enumerate().fold(true, |valid, (idx, item)| {
                let item_path = instance_path(path, role, item, idx);
                self.check_role(role, item, &item_path, defects) && valid
            }),
            Value::Object(_) => self.check_role(role, value, path, defects),
            other => {
                warn!("{}: expected {} object, found {}", display_path(path), role, other);
                defects.push(StructuralDefect::error(path, Some(role), &role.to_string(), DefectKind::NotAnObject));
                false
            }
        }
    }
}

/// Unwraps the optional `data` wrapper and the device container.
fn device_root(doc: &Value) -> &Value {
    let doc = doc.get("data").unwrap_or(doc);
    DEVICE_ROOT_KEYS
        .iter()
        .find_map(|key| doc.get(*key))
        .unwrap_or(doc)
}

fn declared_category(device: &Value) -> Option<DeviceCategory> {
    let node_type = device.get("info")?.get("node-type")?.as_str()?;
    strip_module(node_type).parse().ok()
}

fn strip_module(value: &str) -> &str {
    value.rsplit_once(':').map_or(value, |(_, v)| v)
}

fn check_enum(
    node: &Value,
    role: Role,
    attribute: &str,
    allowed: &[&str],
    path: &str,
    defects: &mut Vec<StructuralDefect>,
) -> bool {
    let Some(value) = node.get(attribute) else {
        return true;
    };
    if value.as_str().is_some_and(|v| allowed.contains(&strip_module(v))) {
        return true;
    }
    let value = leaf_text(value);
    warn!("{}: {} '{}' has invalid value '{}'", display_path(path), role, attribute, value);
    defects.push(StructuralDefect::error(path, Some(role), attribute, DefectKind::InvalidValue { value }));
    false
}

fn check_positive(
    node: &Value,
    role: Role,
    attribute: &str,
    path: &str,
    defects: &mut Vec<StructuralDefect>,
) -> bool {
    let Some(value) = node.get(attribute) else {
        return true;
    };
    let number = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    };
    if number.is_some_and(|n| n > 0) {
        return true;
    }
    let value = leaf_text(value);
    warn!("{}: {} '{}' must be a positive integer, got '{}'", display_path(path), role, attribute, value);
    defects.push(StructuralDefect::error(path, Some(role), attribute, DefectKind::InvalidValue { value }));
    false
}

fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", path, name)
    }
}

fn instance_path(path: &str, role: Role, item: &Value, idx: usize) -> String {
    let key = role
        .key_leaf()
        .and_then(|leaf| item.as_object().and_then(|o: &Map<String, Value>| o.get(leaf)))
        .map(leaf_text)
        .unwrap_or_else(|| idx.to_string());
    format!("{}[{}]", path, key)
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn port(name: &str) -> Value {
        json!({
            "port-name": name,
            "port-type": "CFP2",
            "port-qual": "xpdr-network",
            "port-direction": "bidirectional",
            "administrative-state": "inService",
            "operational-state": "inService",
            "supported-interface-capability": [
                {"if-cap-type": "org-openroadm-port-types:if-OCH-OTU4-ODU4"}
            ]
        })
    }

    fn circuit_pack(name: &str) -> Value {
        json!({
            "circuit-pack-name": name,
            "circuit-pack-type": "line-card",
            "shelf": "1",
            "slot": "1",
            "vendor": "vendorA",
            "model": "model1",
            "serial-id": "SN-0001",
            "administrative-state": "inService",
            "operational-state": "inService",
            "equipment-state": "reserved-for-facility-available",
            "ports": [port("1")]
        })
    }

    fn xponder_device() -> Value {
        json!({
            "org-openroadm-device:org-openroadm-device": {
                "info": {
                    "node-id": "XPDR-A1", "node-number": 1, "node-type": "xpdr",
                    "clli": "NodeA", "vendor": "vendorA", "model": "model1",
                    "serial-id": "0", "softwareVersion": "1.0"
                },
                "shelves": [{
                    "shelf-name": "1", "shelf-type": "chassis", "rack": "R1",
                    "shelf-position": "1", "administrative-state": "inService",
                    "vendor": "vendorA", "model": "m", "serial-id": "S1",
                    "operational-state": "inService",
                    "slots": [{"slot-name": "1", "label": "1", "provisioned-circuit-pack": "1/0/1-PLUG-NET"}]
                }],
                "circuit-packs": [circuit_pack("1/0/1-PLUG-NET")],
                "xponder": [{
                    "xpdr-number": 1, "xpdr-type": "tpdr",
                    "xpdr-port": [{"index": 1, "circuit-pack-name": "1/0/1-PLUG-NET", "port-name": "1"}]
                }]
            }
        })
    }

    fn checker(registry: &SchemaRegistry) -> StructuralChecker<'_> {
        StructuralChecker::new(registry, SchemaVersion::new("2.2.1")).unwrap()
    }

    #[test]
    fn test_unknown_version_rejected() {
        let registry = SchemaRegistry::builtin();
        assert!(StructuralChecker::new(&registry, SchemaVersion::new("3.0")).is_err());
    }

    #[test]
    fn test_valid_xponder_device() {
        let registry = SchemaRegistry::builtin();
        let report = checker(&registry).check_device(&xponder_device(), None);
        assert_eq!(report.category, Some(DeviceCategory::Xponder));
        assert!(report.is_valid(), "{:?}", report.defects);
        assert_eq!(report.tree_valid(DeviceTree::Xponders), Some(true));
        assert_eq!(report.tree_valid(DeviceTree::Degrees), None);
    }

    #[test]
    fn test_missing_serial_id_only_fails_circuit_packs() {
        let registry = SchemaRegistry::builtin();
        let mut doc = xponder_device();
        doc["org-openroadm-device:org-openroadm-device"]["circuit-packs"][0]
            .as_object_mut()
            .unwrap()
            .remove("serial-id");

        let report = checker(&registry).check_device(&doc, Some(DeviceCategory::Xponder));
        assert!(!report.is_valid());
        assert_eq!(report.tree_valid(DeviceTree::CircuitPacks), Some(false));
        assert_eq!(report.tree_valid(DeviceTree::Xponders), Some(true));
        assert_eq!(report.tree_valid(DeviceTree::Shelves), Some(true));

        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "circuit-packs[1/0/1-PLUG-NET]");
        assert_eq!(errors[0].attribute, "serial-id");
    }

    #[test]
    fn test_nested_port_defect_is_located() {
        let registry = SchemaRegistry::builtin();
        let mut doc = xponder_device();
        doc["org-openroadm-device:org-openroadm-device"]["circuit-packs"][0]["ports"][0]
            .as_object_mut()
            .unwrap()
            .remove("port-qual");

        let report = checker(&registry).check_device(&doc, None);
        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "circuit-packs[1/0/1-PLUG-NET]/ports[1]");
        assert_eq!(errors[0].role, Some(Role::Port));
    }

    #[test]
    fn test_soft_capability_absence_is_warning() {
        let registry = SchemaRegistry::builtin();
        let mut doc = xponder_device();
        doc["org-openroadm-device:org-openroadm-device"]["circuit-packs"][0]["ports"][0]
            .as_object_mut()
            .unwrap()
            .remove("supported-interface-capability");

        let report = checker(&registry).check_device(&doc, None);
        assert!(report.is_valid());
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].attribute, "supported-interface-capability");
    }

    #[test]
    fn test_soft_subtree_defects_are_warnings() {
        let registry = SchemaRegistry::builtin();
        let mut doc = xponder_device();
        doc["org-openroadm-device:org-openroadm-device"]["circuit-packs"][0]["ports"][0]
            ["supported-interface-capability"] = json!([{"unexpected": true}]);

        let report = checker(&registry).check_device(&doc, None);
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_all_trees_evaluated_after_failure() {
        let registry = SchemaRegistry::builtin();
        let mut doc = xponder_device();
        let device = doc["org-openroadm-device:org-openroadm-device"].as_object_mut().unwrap();
        device.remove("shelves");
        device["xponder"][0].as_object_mut().unwrap().remove("xpdr-type");

        let report = checker(&registry).check_device(&doc, None);
        assert_eq!(report.tree_valid(DeviceTree::Shelves), Some(false));
        assert_eq!(report.tree_valid(DeviceTree::CircuitPacks), Some(true));
        assert_eq!(report.tree_valid(DeviceTree::Xponders), Some(false));
        assert_eq!(report.errors().count(), 2);
    }

    #[test]
    fn test_single_object_fan_out() {
        let registry = SchemaRegistry::builtin();
        let checker = checker(&registry);
        let mut defects = Vec::new();
        let mut cp = circuit_pack("CP1");
        cp["ports"] = port("P1");
        assert!(checker.check_role(Role::CircuitPack, &cp, "circuit-packs[CP1]", &mut defects));
        assert!(defects.is_empty());
    }

    #[test]
    fn test_invalid_enum_value() {
        let registry = SchemaRegistry::builtin();
        let checker = checker(&registry);
        let mut defects = Vec::new();
        let mut p = port("1");
        p["port-direction"] = json!("sideways");
        assert!(!checker.check_role(Role::Port, &p, "ports[1]", &mut defects));
        assert_eq!(
            defects[0].kind,
            DefectKind::InvalidValue {
                value: "sideways".to_string()
            }
        );
    }

    #[test]
    fn test_roadm_branch_and_positive_counts() {
        let registry = SchemaRegistry::builtin();
        let checker = StructuralChecker::new(&registry, SchemaVersion::new("1.2.1")).unwrap();
        let doc = json!({
            "data": {"org-openroadm-device": {
                "info": {
                    "node-id": "ROADM-A1", "node-number": 2, "node-type": "org-openroadm-device-types:rdm",
                    "clli": "NodeA", "vendor": "v", "model": "m", "serial-id": "0"
                },
                "shelves": [],
                "circuit-packs": [],
                "degree": [{
                    "degree-number": 1, "max-wavelengths": 0,
                    "circuit-packs": [], "connection-ports": []
                }],
                "shared-risk-group": [{
                    "srg-number": 1, "max-add-drop-ports": "16", "wavelength-duplication": "one-per-srg",
                    "circuit-packs": [], "current-provisioned-add-drop-ports": 0
                }]
            }}
        });

        let report = checker.check_device(&doc, None);
        assert_eq!(report.category, Some(DeviceCategory::Roadm));
        assert_eq!(report.tree_valid(DeviceTree::Degrees), Some(false));
        assert_eq!(report.tree_valid(DeviceTree::SharedRiskGroups), Some(true));
        assert_eq!(report.tree_valid(DeviceTree::Xponders), None);
    }

    #[test]
    fn test_unknown_category_is_invalid() {
        let registry = SchemaRegistry::builtin();
        let mut doc = xponder_device();
        doc["org-openroadm-device:org-openroadm-device"]["info"]
            .as_object_mut()
            .unwrap()
            .remove("node-type");

        let report = checker(&registry).check_device(&doc, None);
        assert_eq!(report.category, None);
        assert!(!report.is_valid());
        assert!(report
            .defects
            .iter()
            .any(|d| d.kind == DefectKind::UnknownCategory));
    }
}
