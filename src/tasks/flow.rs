//! Per-operation polling flows
//!
//! A flow owns the modal of one operation and polls its status endpoint on a
//! fixed period until the operation reaches a terminal state or its registry
//! slot is taken over.

use super::manager::TaskManager;
use super::models::{AppId, TaskCategory, Visibility};
use super::presenter;
use crate::api::constants::methods;
use crate::config::TimingConfig;
use crate::ui::ModalId;
use log::{debug, info};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

/// The concrete operations; several kinds share one category slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    AddGame,
    ApplyFix,
    RemoveFix,
    ApplyBypass,
    RemoveBypass,
}

impl FlowKind {
    pub fn category(self) -> TaskCategory {
        match self {
            FlowKind::AddGame => TaskCategory::Game,
            FlowKind::ApplyFix | FlowKind::RemoveFix => TaskCategory::Fix,
            FlowKind::ApplyBypass | FlowKind::RemoveBypass => TaskCategory::Bypass,
        }
    }

    /// Flow used to restore an operation adopted from the backend.
    ///
    /// The active-operations list does not say which direction is running, so
    /// fixes and bypasses are assumed to be applying.
    pub fn for_adopted(category: TaskCategory) -> Self {
        match category {
            TaskCategory::Game => FlowKind::AddGame,
            TaskCategory::Fix => FlowKind::ApplyFix,
            TaskCategory::Bypass => FlowKind::ApplyBypass,
        }
    }

    pub fn start_method(self) -> &'static str {
        match self {
            FlowKind::AddGame => methods::ADD_GAME,
            FlowKind::ApplyFix => methods::APPLY_FIX,
            FlowKind::RemoveFix => methods::REMOVE_FIX,
            FlowKind::ApplyBypass => methods::APPLY_BYPASS,
            FlowKind::RemoveBypass => methods::REMOVE_BYPASS,
        }
    }

    pub fn status_method(self) -> &'static str {
        match self {
            FlowKind::AddGame => methods::ADD_GAME_STATUS,
            FlowKind::ApplyFix => methods::APPLY_FIX_STATUS,
            FlowKind::RemoveFix => methods::REMOVE_FIX_STATUS,
            FlowKind::ApplyBypass => methods::APPLY_BYPASS_STATUS,
            FlowKind::RemoveBypass => methods::REMOVE_BYPASS_STATUS,
        }
    }

    pub fn poll_period(self, timing: &TimingConfig) -> Duration {
        let millis = match self {
            FlowKind::AddGame => timing.game_poll_ms,
            FlowKind::ApplyFix => timing.fix_apply_poll_ms,
            FlowKind::RemoveFix => timing.fix_remove_poll_ms,
            FlowKind::ApplyBypass | FlowKind::RemoveBypass => timing.bypass_poll_ms,
        };
        Duration::from_millis(millis)
    }

    /// Fixes and bypasses act on the installed game folder
    pub fn needs_install_path(self) -> bool {
        self != FlowKind::AddGame
    }

    pub fn is_removal(self) -> bool {
        matches!(self, FlowKind::RemoveFix | FlowKind::RemoveBypass)
    }

    /// Alert text when the start call fails without a backend message
    pub fn start_failure(self) -> &'static str {
        match self {
            FlowKind::AddGame => "Failed to add game",
            FlowKind::ApplyFix => "Failed to start fix",
            FlowKind::RemoveFix => "Failed to start unfix",
            FlowKind::ApplyBypass => "Failed to start bypass",
            FlowKind::RemoveBypass => "Failed to start remove bypass",
        }
    }
}

/// Everything needed to (re)build the presentation of one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSpec {
    pub kind: FlowKind,
    pub subject: AppId,
    pub display_name: String,
}

impl FlowSpec {
    pub fn new(kind: FlowKind, subject: AppId, display_name: impl Into<String>) -> Self {
        Self {
            kind,
            subject,
            display_name: display_name.into(),
        }
    }

    /// Spec for an operation discovered through reconciliation (no name known)
    pub fn adopted(category: TaskCategory, subject: AppId) -> Self {
        Self::new(FlowKind::for_adopted(category), subject, "")
    }

    pub fn category(&self) -> TaskCategory {
        self.kind.category()
    }

    pub fn modal_id(&self) -> ModalId {
        ModalId::new(self.category(), self.subject)
    }
}

pub struct TaskFlow {
    spec: FlowSpec,
    manager: Arc<TaskManager>,
}

impl TaskFlow {
    pub fn new(spec: FlowSpec, manager: Arc<TaskManager>) -> Self {
        Self { spec, manager }
    }

    pub fn spec(&self) -> &FlowSpec {
        &self.spec
    }

    /// One polling step; `Break` stops the periodic task.
    pub async fn tick(&self) -> ControlFlow<()> {
        let category = self.spec.category();
        let subject = self.spec.subject;

        if !self.manager.owns_slot(category, subject) {
            return self.abandon();
        }

        let state = match self.manager.client().task_status(self.spec.kind, subject).await {
            Ok(state) => state,
            Err(err) => {
                // The next tick is the retry
                debug!("Skipping {} poll for app {}: {}", self.spec.kind.status_method(), subject, err);
                return ControlFlow::Continue(());
            }
        };

        // The slot may have moved on while the poll was in flight
        let Some(visibility) = self.manager.visibility_of(category, subject) else {
            return self.abandon();
        };

        let terminal = state.is_terminal();
        if visibility == Visibility::Minimized {
            if !terminal {
                return ControlFlow::Continue(());
            }
            info!("{} task for app {} finished while minimized, restoring", category, subject);
            self.manager.restore(category);
        }

        let modal = self.spec.modal_id();
        let instruction = presenter::present(&state, &self.spec);
        let surface = self.manager.surface();
        if !surface.update_modal(modal, &instruction) && terminal {
            // Modal was dismissed; show the outcome on its own
            surface.open_modal(modal, &instruction);
        }

        if !terminal {
            return ControlFlow::Continue(());
        }

        self.manager.finish_task(category);
        self.manager.after_terminal(&self.spec, &state);
        ControlFlow::Break(())
    }

    fn abandon(&self) -> ControlFlow<()> {
        debug!(
            "{} task for app {} no longer owns its slot, stopping poll",
            self.spec.category(),
            self.spec.subject
        );
        self.manager.surface().close_modal(self.spec.modal_id());
        ControlFlow::Break(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_categories() {
        assert_eq!(FlowKind::AddGame.category(), TaskCategory::Game);
        assert_eq!(FlowKind::RemoveFix.category(), TaskCategory::Fix);
        assert_eq!(FlowKind::RemoveBypass.category(), TaskCategory::Bypass);
    }

    #[test]
    fn test_adopted_dispatch_table() {
        for category in TaskCategory::ALL {
            let spec = FlowSpec::adopted(category, 9);
            assert_eq!(spec.category(), category);
            assert!(!spec.kind.is_removal());
            assert!(spec.display_name.is_empty());
        }
    }

    #[test]
    fn test_poll_periods_follow_timing() {
        let timing = TimingConfig::default();
        assert_eq!(FlowKind::ApplyFix.poll_period(&timing), Duration::from_millis(500));
        assert_eq!(FlowKind::AddGame.poll_period(&timing), Duration::from_millis(1000));
        assert_eq!(FlowKind::RemoveBypass.poll_period(&timing), Duration::from_millis(1000));
    }

    #[test]
    fn test_status_endpoints() {
        assert_eq!(FlowKind::AddGame.status_method(), "SteamLordAddStatus");
        assert_eq!(FlowKind::RemoveFix.status_method(), "GetUnfixStatus");
        assert_eq!(FlowKind::RemoveBypass.status_method(), "GetRemoveBypassStatus");
        assert!(!FlowKind::AddGame.needs_install_path());
        assert!(FlowKind::ApplyBypass.needs_install_path());
    }
}
