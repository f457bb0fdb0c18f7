//! Task coordination: single-flight slots, polling flows, reconciliation

pub mod dock;
pub mod flow;
pub mod license;
pub mod manager;
pub mod models;
pub mod presenter;
pub mod reconcile;
pub mod registry;
pub mod restart;
pub mod scheduler;

pub use dock::{DockItem, DockView};
pub use flow::{FlowKind, FlowSpec, TaskFlow};
pub use license::{LicenseGate, check_license};
pub use manager::TaskManager;
pub use models::{AppId, BackendTaskState, TaskCategory, TaskStatus, Visibility};
pub use presenter::{RenderBody, RenderInstruction};
pub use reconcile::ReconciliationLoop;
pub use registry::{RestoreAction, TaskSlot, TaskSlotRegistry};
pub use scheduler::PeriodicTask;
