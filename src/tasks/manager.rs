//! Coordinator that owns the registry, the polling flows and the surface
//!
//! All registry access goes through a `std::sync::Mutex` that is never held
//! across an `.await`, so every registry mutation is atomic with respect to
//! the flows and the reconciliation loop.

use super::flow::{FlowKind, FlowSpec, TaskFlow};
use super::license::{ACTIVATION_REQUIRED, LicenseGate};
use super::models::{AppId, BackendTaskState, TaskCategory, TaskStatus, Visibility};
use super::presenter;
use super::registry::{RegistrySettings, RestoreAction, TaskSlot, TaskSlotRegistry};
use super::restart::RestartBanner;
use super::scheduler::PeriodicTask;
use crate::api::client::INSTALL_PATH_MISSING;
use crate::api::{RpcError, SteamLordClient};
use crate::config::TimingConfig;
use crate::tasks::dock::DockView;
use crate::ui::{ModalAction, ModalId, Surface};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const GAME_REMOVED: &str = "Game has Been Removed Successfully";
pub const GAME_REMOVE_FAILED: &str = "Failed to remove game.";

pub fn validate_url(subject: AppId) -> String {
    format!("steam://validate/{}", subject)
}

struct FlowHandle {
    spec: FlowSpec,
    task: PeriodicTask,
}

pub struct TaskManager {
    registry: Mutex<TaskSlotRegistry>,
    flows: Mutex<HashMap<TaskCategory, FlowHandle>>,
    client: SteamLordClient,
    surface: Arc<dyn Surface>,
    timing: TimingConfig,
    license: LicenseGate,
    restart: RestartBanner,
}

impl TaskManager {
    pub fn new(client: SteamLordClient, surface: Arc<dyn Surface>, timing: TimingConfig) -> Arc<Self> {
        let settings = RegistrySettings {
            ignore_window: timing.ignore_window(),
            ignore_capacity: timing.ignore_capacity,
        };

        Arc::new(Self {
            registry: Mutex::new(TaskSlotRegistry::with_settings(surface.clone(), settings)),
            flows: Mutex::new(HashMap::new()),
            client,
            surface,
            timing,
            license: LicenseGate::new(),
            restart: RestartBanner::new(),
        })
    }

    pub fn client(&self) -> &SteamLordClient {
        &self.client
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn license(&self) -> &LicenseGate {
        &self.license
    }

    fn registry(&self) -> MutexGuard<'_, TaskSlotRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flows(&self) -> MutexGuard<'_, HashMap<TaskCategory, FlowHandle>> {
        self.flows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Registry facade

    pub fn start_task<F: FnOnce()>(&self, category: TaskCategory, subject: AppId, on_start: F) -> bool {
        self.registry().start_task(category, subject, on_start)
    }

    pub fn finish_task(&self, category: TaskCategory) -> Option<TaskSlot> {
        self.registry().finish_task(category)
    }

    /// Minimize the slot; restoring reopens the running flow's modal or
    /// relaunches a flow when nothing polls the slot locally
    pub fn minimize(&self, category: TaskCategory, subject: AppId) -> bool {
        let action = match self.polling_spec(category, subject) {
            Some(spec) => RestoreAction::Reopen(spec),
            None => RestoreAction::Relaunch(FlowSpec::adopted(category, subject)),
        };
        self.registry().minimize(category, subject, action)
    }

    /// Bring a minimized slot back and run its restore action
    pub fn restore(self: &Arc<Self>, category: TaskCategory) -> bool {
        let Some(action) = self.registry().restore(category) else {
            return false;
        };

        match action {
            RestoreAction::Reopen(spec) if self.polling_spec(category, spec.subject).is_some() => {
                self.surface.open_modal(spec.modal_id(), &presenter::initial(&spec));
            }
            RestoreAction::Reopen(spec) | RestoreAction::Relaunch(spec) => {
                self.launch_flow(spec);
            }
        }
        true
    }

    pub fn should_ignore(&self, category: TaskCategory, subject: AppId) -> bool {
        self.registry().should_ignore(category, subject)
    }

    /// Track a backend-reported operation as minimized
    pub fn adopt(&self, category: TaskCategory, subject: AppId) -> bool {
        let restore = RestoreAction::Relaunch(FlowSpec::adopted(category, subject));
        self.registry().adopt(category, subject, restore)
    }

    pub fn snapshot(&self, category: TaskCategory) -> Option<TaskSlot> {
        self.registry().slot(category).cloned()
    }

    pub fn slots(&self) -> Vec<TaskSlot> {
        self.registry().slots().cloned().collect()
    }

    pub fn owns_slot(&self, category: TaskCategory, subject: AppId) -> bool {
        self.registry().is_tracking(category, subject)
    }

    pub fn is_idle(&self, category: TaskCategory) -> bool {
        self.registry().is_idle(category)
    }

    pub fn visibility_of(&self, category: TaskCategory, subject: AppId) -> Option<Visibility> {
        self.registry()
            .slot(category)
            .filter(|slot| slot.subject == subject)
            .map(|slot| slot.visibility)
    }

    pub fn dock_view(&self) -> DockView {
        self.registry().dock_view()
    }

    pub fn render_dock(&self) {
        self.registry().render_dock();
    }

    // Flows

    fn polling_spec(&self, category: TaskCategory, subject: AppId) -> Option<FlowSpec> {
        self.flows()
            .get(&category)
            .filter(|handle| handle.spec.subject == subject && handle.task.is_active())
            .map(|handle| handle.spec.clone())
    }

    pub fn is_polling(&self, category: TaskCategory) -> bool {
        self.flows().get(&category).is_some_and(|handle| handle.task.is_active())
    }

    /// Claim the slot, open the modal and start polling.
    ///
    /// A flow already polling the same subject is kept; a flow for another
    /// subject in the same category is cancelled.
    pub fn launch_flow(self: &Arc<Self>, spec: FlowSpec) -> bool {
        let category = spec.category();
        let modal = spec.modal_id();
        let opening = presenter::initial(&spec);

        if !self.start_task(category, spec.subject, || self.surface.open_modal(modal, &opening)) {
            return false;
        }

        let mut flows = self.flows();
        if let Some(handle) = flows.get(&category) {
            if handle.spec.subject == spec.subject && handle.task.is_active() {
                debug!("Flow '{}' already polling", handle.task.name());
                return true;
            }
            handle.task.cancel();
        }

        let name = format!("{:?}:{}", spec.kind, spec.subject);
        let period = spec.kind.poll_period(&self.timing);
        let flow = Arc::new(TaskFlow::new(spec.clone(), Arc::clone(self)));
        let task = PeriodicTask::spawn(name, period, move || {
            let flow = Arc::clone(&flow);
            async move { flow.tick().await }
        });

        flows.insert(category, FlowHandle { spec, task });
        true
    }

    /// Cancel every polling flow
    pub fn shutdown(&self) {
        for (_, handle) in self.flows().drain() {
            handle.task.cancel();
        }
    }

    // User actions

    /// Full user-initiated action: license gate, reservation, start call, flow.
    ///
    /// Returns true when a flow for the subject is running afterwards.
    pub async fn run(self: &Arc<Self>, spec: FlowSpec) -> bool {
        if !self.license.admit(self.timing.license_wait(), self.timing.license_step()).await {
            self.surface.alert(ACTIVATION_REQUIRED);
            return false;
        }

        let category = spec.category();
        let subject = spec.subject;

        if self.owns_slot(category, subject) {
            info!("{} task for app {} already running, bringing it back", category, subject);
            self.restore(category);
            return true;
        }

        if !self.start_task(category, subject, || {}) {
            return false;
        }

        match self.begin(&spec).await {
            Ok(()) => self.launch_flow(spec),
            Err(message) => {
                self.finish_task(category);
                self.surface.alert(&message);
                false
            }
        }
    }

    async fn begin(&self, spec: &FlowSpec) -> Result<(), String> {
        let install_path = if spec.kind.needs_install_path() {
            match self.client.install_path(spec.subject).await {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!("No install path for app {}: {}", spec.subject, err);
                    return Err(INSTALL_PATH_MISSING.to_string());
                }
            }
        } else {
            None
        };

        self.client
            .start(spec.kind, spec.subject, install_path.as_deref(), &spec.display_name)
            .await
            .map_err(|err| {
                warn!("{} for app {} failed: {}", spec.kind.start_method(), spec.subject, err);
                err.user_message(spec.kind.start_failure())
            })
    }

    pub async fn add_game(self: &Arc<Self>, subject: AppId, name: &str) -> bool {
        self.run(FlowSpec::new(FlowKind::AddGame, subject, name)).await
    }

    pub async fn apply_fix(self: &Arc<Self>, subject: AppId, name: &str) -> bool {
        self.run(FlowSpec::new(FlowKind::ApplyFix, subject, name)).await
    }

    pub async fn remove_fix(self: &Arc<Self>, subject: AppId, name: &str) -> bool {
        self.run(FlowSpec::new(FlowKind::RemoveFix, subject, name)).await
    }

    pub async fn apply_bypass(self: &Arc<Self>, subject: AppId, name: &str) -> bool {
        self.run(FlowSpec::new(FlowKind::ApplyBypass, subject, name)).await
    }

    pub async fn remove_bypass(self: &Arc<Self>, subject: AppId, name: &str) -> bool {
        self.run(FlowSpec::new(FlowKind::RemoveBypass, subject, name)).await
    }

    /// Remove a game from the library; success asks for a restart
    pub async fn remove_game(&self, subject: AppId) -> bool {
        if !self.license.admit(self.timing.license_wait(), self.timing.license_step()).await {
            self.surface.alert(ACTIVATION_REQUIRED);
            return false;
        }

        match self.client.delete_game(subject).await {
            Ok(()) => {
                info!("Removed app {}", subject);
                let modal = ModalId::new(TaskCategory::Game, subject);
                self.surface.open_modal(modal, &presenter::restart_prompt(GAME_REMOVED));
                self.surface.ensure_injected();
                true
            }
            Err(err) => {
                warn!("Removing app {} failed: {}", subject, err);
                self.surface.alert(GAME_REMOVE_FAILED);
                false
            }
        }
    }

    /// Discovery lookup (retried on transport errors)
    pub async fn subject_exists(&self, category: TaskCategory, subject: AppId) -> Result<bool, RpcError> {
        self.client.subject_exists(category, subject).await
    }

    /// Route a modal button press
    pub async fn handle_action(self: &Arc<Self>, modal: ModalId, action: ModalAction) {
        debug!("Modal action {:?} on {:?}", action, modal);
        match action {
            ModalAction::Hide => {
                self.minimize(modal.category, modal.subject);
                self.surface.close_modal(modal);
            }
            ModalAction::Close => self.surface.close_modal(modal),
            ModalAction::RestartNow => {
                self.surface.close_modal(modal);
                self.restart_steam().await;
            }
            ModalAction::RestartLater => {
                self.surface.close_modal(modal);
                self.raise_restart_banner(true).await;
            }
        }
    }

    /// Show the restart banner once per process.
    ///
    /// `persist` records the requirement on the backend so the banner survives
    /// a UI reload; it is false when the backend flag raised the banner.
    pub async fn raise_restart_banner(&self, persist: bool) -> bool {
        if !self.restart.raise() {
            return false;
        }

        if persist {
            if let Err(err) = self.client.set_restart_required().await {
                warn!("Could not persist restart requirement: {}", err);
            }
        }

        info!("Restart banner raised");
        self.surface.show_restart_banner();
        true
    }

    pub fn restart_banner_raised(&self) -> bool {
        self.restart.is_raised()
    }

    /// The banner's only action; ignored while no banner is shown
    pub async fn click_restart_banner(&self) -> bool {
        if !self.restart.is_raised() {
            debug!("Restart banner clicked before it was raised");
            return false;
        }
        self.restart_steam().await
    }

    pub async fn restart_steam(&self) -> bool {
        match self.client.restart_steam().await {
            Ok(()) => true,
            Err(err) => {
                warn!("RestartSteam failed: {}", err);
                false
            }
        }
    }

    /// Side effects of a successful terminal state
    pub fn after_terminal(&self, spec: &FlowSpec, state: &BackendTaskState) {
        if state.status != Some(TaskStatus::Done) {
            return;
        }

        match spec.kind {
            FlowKind::AddGame => self.surface.ensure_injected(),
            kind if kind.is_removal() => {
                let surface = Arc::clone(&self.surface);
                let delay = self.timing.validate_delay();
                let url = validate_url(spec.subject);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    surface.open_url(&url);
                });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Backend, ResilienceConfig};
    use crate::ui::{RecordingSurface, SurfaceEvent};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    /// Answers every call with a bare success envelope
    struct AlwaysOk;

    #[async_trait]
    impl Backend for AlwaysOk {
        async fn call(&self, _method: &str, _params: Value) -> Result<Value, RpcError> {
            Ok(json!({ "success": true }))
        }
    }

    fn manager() -> (Arc<TaskManager>, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::new());
        let client = SteamLordClient::new(Arc::new(AlwaysOk), ResilienceConfig::disabled());
        let manager = TaskManager::new(client, surface.clone(), TimingConfig::default());
        manager.license().complete(true);
        (manager, surface)
    }

    #[tokio::test]
    async fn test_minimize_without_flow_relaunches_on_restore() {
        let (manager, surface) = manager();
        assert!(manager.start_task(TaskCategory::Fix, 7, || {}));
        assert!(manager.minimize(TaskCategory::Fix, 7));
        assert!(!manager.is_polling(TaskCategory::Fix));

        assert!(manager.restore(TaskCategory::Fix));
        assert!(manager.is_polling(TaskCategory::Fix));
        assert!(surface.is_open(ModalId::new(TaskCategory::Fix, 7)));
        manager.shutdown();
    }

    #[tokio::test]
    async fn test_restart_banner_raised_once() {
        let (manager, surface) = manager();
        assert!(manager.raise_restart_banner(false).await);
        assert!(!manager.raise_restart_banner(true).await);

        let banners = surface
            .events()
            .into_iter()
            .filter(|event| *event == SurfaceEvent::RestartBanner)
            .count();
        assert_eq!(banners, 1);
    }

    #[tokio::test]
    async fn test_refused_when_license_invalid() {
        let (manager, surface) = manager();
        manager.license().complete(false);

        assert!(!manager.add_game(620, "Portal 2").await);
        assert!(manager.is_idle(TaskCategory::Game));
        assert!(surface.events().contains(&SurfaceEvent::Alert(ACTIVATION_REQUIRED.to_string())));
    }

    #[tokio::test]
    async fn test_remove_game_prompts_restart() {
        let (manager, surface) = manager();
        assert!(manager.remove_game(620).await);

        let modal = ModalId::new(TaskCategory::Game, 620);
        let shown = surface.last_instruction(modal).unwrap();
        assert!(shown.offers(ModalAction::RestartNow));
        assert!(surface.events().contains(&SurfaceEvent::Injected));
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url(1245620), "steam://validate/1245620");
    }
}
