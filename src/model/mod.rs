//! Canonical data model.
//!
//! - [`System`]: fleet topology, application and resource catalogs
//! - [`EnvironmentInput`]: per-epoch load, queues and network delays
//! - [`OptSolution`] / [`ControlInput`]: the optimizer's decision
//!
//! The optimizer only reads [`System`] and [`EnvironmentInput`]; it
//! produces fresh [`OptSolution`] values.

mod environment;
mod solution;
mod system;

pub use environment::EnvironmentInput;
pub use solution::{ControlInput, OptSolution, EPSILON};
pub use system::{Application, Node, Resource, ResourceFn, ResourceKind, System};
