//! Version-keyed checklists of required attributes.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use oroadm_types::SchemaVersion;

use crate::builtin;
use crate::error::{RegistryError, RegistryResult};

/// Structural role of a subtree in an OpenROADM device configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Device `info` container.
    Info,
    /// Entry of the `shelves` list.
    Shelf,
    /// Entry of a shelf's `slots` list.
    Slot,
    /// Entry of the `circuit-packs` list.
    CircuitPack,
    /// Entry of a circuit pack's `ports` list.
    Port,
    /// `port-capabilities` container of a port.
    Capabilities,
    /// Entry of a `supported-interface-capability` list.
    Capability,
    /// Entry of the `xponder` list.
    Xponder,
    /// Entry of an xponder's `xpdr-port` list.
    XponderPort,
    /// Entry of the `degree` list.
    Degree,
    /// Entry of the `shared-risk-group` list.
    SharedRiskGroup,
}

impl Role {
    /// Leaf used to name an instance of this role in defect paths.
    pub const fn key_leaf(&self) -> Option<&'static str> {
        match self {
            Role::Info | Role::Capabilities => None,
            Role::Shelf => Some("shelf-name"),
            Role::Slot => Some("slot-name"),
            Role::CircuitPack => Some("circuit-pack-name"),
            Role::Port => Some("port-name"),
            Role::Capability => Some("if-cap-type"),
            Role::Xponder => Some("xpdr-number"),
            Role::XponderPort => Some("index"),
            Role::Degree => Some("degree-number"),
            Role::SharedRiskGroup => Some("srg-number"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Info => "info",
            Role::Shelf => "shelf",
            Role::Slot => "slot",
            Role::CircuitPack => "circuit-pack",
            Role::Port => "port",
            Role::Capabilities => "capabilities",
            Role::Capability => "capability",
            Role::Xponder => "xponder",
            Role::XponderPort => "xponder-port",
            Role::Degree => "degree",
            Role::SharedRiskGroup => "shared-risk-group",
        };
        write!(f, "{}", s)
    }
}

/// One required attribute of a checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute (leaf, container or list) name.
    pub name: String,

    /// Role of the attribute's value when it is itself a structural role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Role>,

    /// Soft attributes are optional: absence is only a warning.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub soft: bool,
}

impl Attribute {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nested: None,
            soft: false,
        }
    }

    pub fn nested(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            nested: Some(role),
            soft: false,
        }
    }

    pub fn soft(mut self) -> Self {
        self.soft = true;
        self
    }
}

/// Ordered list of attributes required on an instance of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub role: Role,
    pub attributes: Vec<Attribute>,
}

impl Checklist {
    pub fn new(role: Role, attributes: Vec<Attribute>) -> Self {
        Self { role, attributes }
    }

    /// Attribute names in checklist order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }
}

/// All checklists of one model version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub version: SchemaVersion,
    #[serde(rename = "checklist", default)]
    pub checklists: Vec<Checklist>,
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    #[serde(rename = "version", default)]
    versions: Vec<VersionDescriptor>,
}

/// Append-only registry of checklists keyed by version and role.
///
/// Built once at start-up and passed by reference to every checker.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<SchemaVersion, BTreeMap<Role, Checklist>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in `1.2.1`, `2.2.1` and `7.1`
    /// descriptors.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin::descriptors() {
            registry.insert(descriptor);
        }
        registry
    }

    /// Appends every checklist of a version descriptor.
    ///
    /// Fails without modifying the registry if any (version, role) pair is
    /// already registered.
    pub fn register(&mut self, descriptor: VersionDescriptor) -> RegistryResult<()> {
        self.register_all(vec![descriptor])
    }

    /// Appends a batch of descriptors, all or nothing.
    ///
    /// Every (version, role) pair is checked against the registry and the
    /// rest of the batch before the first one is inserted.
    pub fn register_all(&mut self, descriptors: Vec<VersionDescriptor>) -> RegistryResult<()> {
        let mut seen: Vec<(&SchemaVersion, Role)> = Vec::new();
        for descriptor in &descriptors {
            let existing = self.tables.get(&descriptor.version);
            for checklist in &descriptor.checklists {
                let taken = existing.is_some_and(|t| t.contains_key(&checklist.role));
                let pair = (&descriptor.version, checklist.role);
                if taken || seen.contains(&pair) {
                    return Err(RegistryError::DuplicateChecklist {
                        version: descriptor.version.to_string(),
                        role: checklist.role.to_string(),
                    });
                }
                seen.push(pair);
            }
        }

        for descriptor in descriptors {
            self.insert(descriptor);
        }
        Ok(())
    }

    fn insert(&mut self, descriptor: VersionDescriptor) {
        debug!(
            "Registering {} checklists for version {}",
            descriptor.checklists.len(),
            descriptor.version
        );
        let table = self.tables.entry(descriptor.version).or_default();
        for checklist in descriptor.checklists {
            table.insert(checklist.role, checklist);
        }
    }

    /// Appends the descriptors found in a TOML or JSON file.
    ///
    /// The format is chosen by extension (`.toml`, anything else is JSON).
    /// Both hold a top-level `version` array of [`VersionDescriptor`]s. A
    /// file with any conflicting checklist leaves the registry unchanged.
    pub fn load_descriptors(&mut self, path: impl AsRef<Path>) -> RegistryResult<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let file: DescriptorFile = if is_toml {
            toml::from_str(&content)
                .map_err(|e| RegistryError::descriptor(path.display().to_string(), e.to_string()))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| RegistryError::descriptor(path.display().to_string(), e.to_string()))?
        };

        let count = file.versions.len();
        self.register_all(file.versions)?;
        info!("Loaded {} schema versions from {}", count, path.display());
        Ok(count)
    }

    /// Returns the checklist for a role, if the version defines one.
    pub fn checklist(&self, version: &SchemaVersion, role: Role) -> Option<&Checklist> {
        self.tables.get(version).and_then(|t| t.get(&role))
    }

    /// Returns true if any checklist is registered for `version`.
    pub fn contains_version(&self, version: &SchemaVersion) -> bool {
        self.tables.contains_key(version)
    }

    /// Registered versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = &SchemaVersion> {
        self.tables.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_versions() {
        let registry = SchemaRegistry::builtin();
        let versions: Vec<&str> = registry.versions().map(SchemaVersion::as_str).collect();
        assert_eq!(versions, vec!["1.2.1", "2.2.1", "7.1"]);
    }

    #[test]
    fn test_circuit_pack_checklist_requires_serial_id() {
        let registry = SchemaRegistry::builtin();
        for version in ["1.2.1", "2.2.1", "7.1"] {
            let checklist = registry
                .checklist(&SchemaVersion::new(version), Role::CircuitPack)
                .unwrap();
            assert!(checklist.names().any(|n| n == "serial-id"));
            assert!(checklist
                .attributes
                .iter()
                .any(|a| a.nested == Some(Role::Port)));
        }
    }

    #[test]
    fn test_xponder_checklist_absent_in_1_2_1() {
        let registry = SchemaRegistry::builtin();
        assert!(registry
            .checklist(&SchemaVersion::new("1.2.1"), Role::Xponder)
            .is_none());
        assert!(registry
            .checklist(&SchemaVersion::new("2.2.1"), Role::Xponder)
            .is_some());
    }

    #[test]
    fn test_register_is_append_only() {
        let mut registry = SchemaRegistry::builtin();
        let dup = VersionDescriptor {
            version: SchemaVersion::new("2.2.1"),
            checklists: vec![Checklist::new(Role::Shelf, vec![Attribute::leaf("x")])],
        };
        assert!(matches!(
            registry.register(dup),
            Err(RegistryError::DuplicateChecklist { .. })
        ));

        let shelf = registry
            .checklist(&SchemaVersion::new("2.2.1"), Role::Shelf)
            .unwrap();
        assert!(shelf.names().any(|n| n == "shelf-name"));
    }

    #[test]
    fn test_register_rejects_duplicate_roles_atomically() {
        let mut registry = SchemaRegistry::new();
        let descriptor = VersionDescriptor {
            version: SchemaVersion::new("8.1"),
            checklists: vec![
                Checklist::new(Role::Shelf, vec![Attribute::leaf("a")]),
                Checklist::new(Role::Shelf, vec![Attribute::leaf("b")]),
            ],
        };
        assert!(registry.register(descriptor).is_err());
        assert!(!registry.contains_version(&SchemaVersion::new("8.1")));
    }

    #[test]
    fn test_load_toml_descriptors() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[[version]]
version = "10.1"

[[version.checklist]]
role = "shelf"
attributes = [{{ name = "shelf-name" }}, {{ name = "slots", nested = "slot" }}]

[[version.checklist]]
role = "port"
attributes = [{{ name = "port-name" }}, {{ name = "port-capabilities", nested = "capabilities", soft = true }}]
"#
        )
        .unwrap();

        let mut registry = SchemaRegistry::builtin();
        assert_eq!(registry.load_descriptors(file.path()).unwrap(), 1);

        let version = SchemaVersion::new("10.1");
        let port = registry.checklist(&version, Role::Port).unwrap();
        assert!(port.attributes[1].soft);
        assert_eq!(port.attributes[1].nested, Some(Role::Capabilities));
    }

    #[test]
    fn test_load_json_descriptors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"version": [{{"version": "v11.0.1", "checklist": [
                {{"role": "degree", "attributes": [{{"name": "degree-number"}}]}}
            ]}}]}}"#
        )
        .unwrap();

        let mut registry = SchemaRegistry::new();
        registry.load_descriptors(file.path()).unwrap();
        assert!(registry
            .checklist(&SchemaVersion::new("11.0.1"), Role::Degree)
            .is_some());
    }

    #[test]
    fn test_builtin_descriptors_do_not_overlap() {
        let mut registry = SchemaRegistry::new();
        registry.register_all(builtin::descriptors()).unwrap();
        let versions: Vec<&str> = registry.versions().map(SchemaVersion::as_str).collect();
        assert_eq!(versions, vec!["1.2.1", "2.2.1", "7.1"]);
    }

    #[test]
    fn test_conflicting_file_leaves_registry_unchanged() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"version": [
                {{"version": "12.1", "checklist": [{{"role": "shelf", "attributes": [{{"name": "shelf-name"}}]}}]}},
                {{"version": "2.2.1", "checklist": [{{"role": "shelf", "attributes": [{{"name": "x"}}]}}]}}
            ]}}"#
        )
        .unwrap();

        let mut registry = SchemaRegistry::builtin();
        assert!(matches!(
            registry.load_descriptors(file.path()),
            Err(RegistryError::DuplicateChecklist { .. })
        ));
        assert!(!registry.contains_version(&SchemaVersion::new("12.1")));
        let shelf = registry
            .checklist(&SchemaVersion::new("2.2.1"), Role::Shelf)
            .unwrap();
        assert!(shelf.names().any(|n| n == "shelf-name"));
    }

    #[test]
    fn test_same_version_twice_in_one_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"version": [
                {{"version": "13.1", "checklist": [{{"role": "port", "attributes": [{{"name": "port-name"}}]}}]}},
                {{"version": "13.1", "checklist": [
                    {{"role": "degree", "attributes": [{{"name": "degree-number"}}]}},
                    {{"role": "port", "attributes": [{{"name": "x"}}]}}
                ]}}
            ]}}"#
        )
        .unwrap();

        let mut registry = SchemaRegistry::new();
        assert!(registry.load_descriptors(file.path()).is_err());
        assert_eq!(registry.versions().count(), 0);
    }

    #[test]
    fn test_load_invalid_descriptor() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.load_descriptors(file.path()),
            Err(RegistryError::Descriptor { .. })
        ));
    }
}
