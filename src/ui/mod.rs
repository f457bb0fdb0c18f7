//! UI surfaces the coordinator drives
//!
//! The coordinator never renders anything itself. It hands render
//! instructions, dock views and notices to a [`Surface`], which is free to
//! draw them as DOM nodes, terminal output or plain records.

pub mod console;
pub mod prompts;
pub mod recording;

use crate::tasks::dock::DockView;
use crate::tasks::models::{AppId, TaskCategory};
use crate::tasks::presenter::RenderInstruction;

pub use console::{ConsolePrompt, ConsoleSurface};
pub use recording::{RecordingSurface, SurfaceEvent};

/// Identifies the modal owned by one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalId {
    pub category: TaskCategory,
    pub subject: AppId,
}

impl ModalId {
    pub fn new(category: TaskCategory, subject: AppId) -> Self {
        Self { category, subject }
    }
}

/// Buttons a modal can offer; clicks come back through `TaskManager::handle_action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalAction {
    /// Minimize the operation into the dock
    Hide,
    Close,
    RestartNow,
    RestartLater,
}

impl ModalAction {
    pub fn label(self) -> &'static str {
        match self {
            ModalAction::Hide => "Hide",
            ModalAction::Close => "Close",
            ModalAction::RestartNow => "Restart Steam",
            ModalAction::RestartLater => "Restart Later",
        }
    }
}

/// Everything the coordinator shows to the user.
///
/// Calls arrive while the task registry is locked, so implementations must not
/// call back into the `TaskManager` synchronously. User input is expected to
/// be delivered later from the surface's own event source.
pub trait Surface: Send + Sync {
    /// Show a modal. Opening an id that is already open replaces its content.
    fn open_modal(&self, id: ModalId, content: &RenderInstruction);

    /// Update an open modal in place; returns false if the modal is not open
    fn update_modal(&self, id: ModalId, content: &RenderInstruction) -> bool;

    fn close_modal(&self, id: ModalId);

    /// Informational notice (toast), e.g. the busy rejection
    fn notice(&self, message: &str);

    /// Error that needs the user's attention
    fn alert(&self, message: &str);

    fn render_dock(&self, dock: &DockView);

    /// Floating "restart Steam" banner; callers guarantee it is raised once
    fn show_restart_banner(&self);

    /// Re-inject page controls if they are missing; must be idempotent
    fn ensure_injected(&self);

    fn open_url(&self, url: &str);
}
