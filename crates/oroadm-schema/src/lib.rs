//! Structural conformance checks for OpenROADM device configuration trees.
//!
//! - [`SchemaRegistry`]: version-keyed, append-only checklists of required
//!   attributes per structural [`Role`]
//! - [`StructuralChecker`]: recursive validators, one per role, producing a
//!   [`ConformanceReport`]
//!
//! # Example
//!
//! ```ignore
//! use oroadm_schema::{SchemaRegistry, StructuralChecker};
//! use oroadm_types::{DeviceCategory, SchemaVersion};
//!
//! let registry = SchemaRegistry::builtin();
//! let checker = StructuralChecker::new(&registry, SchemaVersion::new("2.2.1"))?;
//! let report = checker.check_device(&device_json, Some(DeviceCategory::Xponder));
//! assert!(report.is_valid());
//! ```

mod builtin;
mod checker;
pub mod error;
mod registry;

pub use checker::{
    CategoryResult, ConformanceReport, DefectKind, DeviceTree, Severity, StructuralChecker,
    StructuralDefect,
};
pub use error::{RegistryError, RegistryResult};
pub use registry::{Attribute, Checklist, Role, SchemaRegistry, VersionDescriptor};
