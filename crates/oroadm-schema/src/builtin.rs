//! Built-in checklists for the OpenROADM device models in use.

use oroadm_types::SchemaVersion;

use crate::registry::{Attribute, Checklist, Role, VersionDescriptor};

fn leaf(name: &str) -> Attribute {
    Attribute::leaf(name)
}

fn nested(name: &str, role: Role) -> Attribute {
    Attribute::nested(name, role)
}

fn leaves(names: &[&str]) -> Vec<Attribute> {
    names.iter().map(|n| leaf(n)).collect()
}

fn with(mut base: Vec<Attribute>, extra: impl IntoIterator<Item = Attribute>) -> Vec<Attribute> {
    base.extend(extra);
    base
}

const INFO: &[&str] = &[
    "node-id",
    "node-number",
    "node-type",
    "clli",
    "vendor",
    "model",
    "serial-id",
];

const SHELF: &[&str] = &[
    "shelf-name",
    "shelf-type",
    "rack",
    "shelf-position",
    "administrative-state",
    "vendor",
    "model",
    "serial-id",
    "operational-state",
];

const CIRCUIT_PACK: &[&str] = &[
    "circuit-pack-name",
    "circuit-pack-type",
    "shelf",
    "slot",
    "vendor",
    "model",
    "serial-id",
    "administrative-state",
    "operational-state",
    "equipment-state",
];

const PORT: &[&str] = &[
    "port-name",
    "port-type",
    "port-qual",
    "port-direction",
    "administrative-state",
    "operational-state",
];

const DEGREE: &[&str] = &[
    "degree-number",
    "max-wavelengths",
    "circuit-packs",
    "connection-ports",
];

const SRG: &[&str] = &[
    "srg-number",
    "max-add-drop-ports",
    "wavelength-duplication",
    "circuit-packs",
    "current-provisioned-add-drop-ports",
];

fn v1_2_1() -> VersionDescriptor {
    VersionDescriptor {
        version: SchemaVersion::new(SchemaVersion::V1_2_1),
        checklists: vec![
            Checklist::new(Role::Info, leaves(INFO)),
            Checklist::new(Role::Shelf, leaves(SHELF)),
            Checklist::new(
                Role::CircuitPack,
                with(leaves(CIRCUIT_PACK), [nested("ports", Role::Port)]),
            ),
            Checklist::new(
                Role::Port,
                with(
                    leaves(PORT),
                    [nested("supported-interface-capability", Role::Capability).soft()],
                ),
            ),
            Checklist::new(Role::Capability, leaves(&["if-cap-type"])),
            Checklist::new(Role::Degree, leaves(DEGREE)),
            Checklist::new(Role::SharedRiskGroup, leaves(SRG)),
        ],
    }
}

fn v2_2_1() -> VersionDescriptor {
    VersionDescriptor {
        version: SchemaVersion::new(SchemaVersion::V2_2_1),
        checklists: vec![
            Checklist::new(Role::Info, with(leaves(INFO), [leaf("softwareVersion")])),
            Checklist::new(Role::Shelf, with(leaves(SHELF), [nested("slots", Role::Slot)])),
            Checklist::new(
                Role::Slot,
                leaves(&["slot-name", "label", "provisioned-circuit-pack"]),
            ),
            Checklist::new(
                Role::CircuitPack,
                with(leaves(CIRCUIT_PACK), [nested("ports", Role::Port)]),
            ),
            Checklist::new(
                Role::Port,
                with(
                    leaves(PORT),
                    [nested("supported-interface-capability", Role::Capability).soft()],
                ),
            ),
            Checklist::new(Role::Capability, leaves(&["if-cap-type"])),
            Checklist::new(
                Role::Xponder,
                with(
                    leaves(&["xpdr-number", "xpdr-type"]),
                    [nested("xpdr-port", Role::XponderPort)],
                ),
            ),
            Checklist::new(
                Role::XponderPort,
                leaves(&["index", "circuit-pack-name", "port-name"]),
            ),
            Checklist::new(Role::Degree, leaves(DEGREE)),
            Checklist::new(Role::SharedRiskGroup, leaves(SRG)),
        ],
    }
}

fn v7_1() -> VersionDescriptor {
    VersionDescriptor {
        version: SchemaVersion::new(SchemaVersion::V7_1),
        checklists: vec![
            Checklist::new(
                Role::Info,
                with(leaves(INFO), [leaf("software-version"), leaf("openroadm-version")]),
            ),
            Checklist::new(Role::Shelf, with(leaves(SHELF), [nested("slots", Role::Slot)])),
            Checklist::new(
                Role::Slot,
                leaves(&["slot-name", "label", "provisioned-circuit-pack", "slot-status"]),
            ),
            Checklist::new(
                Role::CircuitPack,
                with(leaves(CIRCUIT_PACK), [nested("ports", Role::Port)]),
            ),
            Checklist::new(
                Role::Port,
                with(
                    leaves(PORT),
                    [nested("port-capabilities", Role::Capabilities).soft()],
                ),
            ),
            Checklist::new(
                Role::Capabilities,
                vec![nested("supported-interface-capability", Role::Capability)],
            ),
            Checklist::new(Role::Capability, leaves(&["if-cap-type"])),
            Checklist::new(
                Role::Xponder,
                with(
                    leaves(&["xpdr-number", "xpdr-type"]),
                    [nested("xpdr-port", Role::XponderPort)],
                ),
            ),
            Checklist::new(
                Role::XponderPort,
                leaves(&["index", "circuit-pack-name", "port-name"]),
            ),
            Checklist::new(Role::Degree, leaves(DEGREE)),
            Checklist::new(Role::SharedRiskGroup, leaves(SRG)),
        ],
    }
}

/// Built-in descriptors, oldest model first.
pub(crate) fn descriptors() -> Vec<VersionDescriptor> {
    vec![v1_2_1(), v2_2_1(), v7_1()]
}
