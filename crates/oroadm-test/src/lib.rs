//! Integration test infrastructure for the OpenROADM verifier
//!
//! Provides:
//! - Port-mapping and device configuration fixtures
//! - A device-side renderer turning renderer RPCs into device configuration
//! - A simulated network element implementing the control API and
//!   management sessions, with fault injection
//! - Verdict and residual-state verification helpers

pub mod element;
pub mod fixtures;
pub mod renderer;
mod verification;

pub use element::{Faults, SimulatedElement, SimulatedSession};
pub use fixtures::*;
pub use renderer::{RenderError, Renderer, Rendering};
pub use verification::*;
