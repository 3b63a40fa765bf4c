//! Interface lifecycle verification for OpenROADM network elements.
//!
//! Drives the controller's device renderer through create/delete cycles for
//! every port of a reconstructed topology and checks that each change is
//! reflected on the device:
//!
//! - [`compare`]: recursive subset assertion between expected and observed trees
//! - [`telemetry`]: current PM and active alarm reads over a management session
//! - [`naming`]: interface names and RPC inputs per port role and rate
//! - [`lifecycle`]: the [`LifecycleVerifier`] producing a [`ValidationVerdict`]
//! - [`restconf`]: controller transport implementing the collaborator seams
//!
//! The collaborator seams ([`ControlApi`], [`SessionFactory`]) are traits so
//! that runs can target a real controller or an in-memory element.

pub mod compare;
pub mod config_file;
pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod naming;
pub mod restconf;
pub mod session;
pub mod telemetry;
pub mod verdict;

pub use compare::{find_mismatch, is_subset, Mismatch, MismatchReason};
pub use config_file::{ControllerConfig, VerifyConfig, DEFAULT_CONFIG_PATH};
pub use error::{ConfigError, TransportError, TransportResult, VerifierError, VerifierResult};
pub use lifecycle::{LifecycleParams, LifecycleState, LifecycleVerifier, RoleClass};
pub use naming::{CyclePlan, Operation, PlannedResource, ResourceKind, Spectrum};
pub use restconf::RestconfClient;
pub use session::{
    ControlApi, InterfaceLookup, ManagementSession, ReadRequest, ResourceId, ResourceType,
    RpcResponse, SessionFactory,
};
pub use telemetry::{AlarmRecord, PmMeasurement, TelemetryClient};
pub use verdict::{Check, DefectCategory, Finding, ValidationVerdict};
