//! Periodic reconciliation with the backend
//!
//! Each tick re-injects page controls, mirrors the backend's restart flag and
//! adopts backend operations the registry does not know about, so work
//! started before a UI reload shows up in the dock.

use super::manager::TaskManager;
use super::scheduler::PeriodicTask;
use log::{debug, trace};
use std::ops::ControlFlow;
use std::sync::Arc;

pub struct ReconciliationLoop {
    manager: Arc<TaskManager>,
}

impl ReconciliationLoop {
    pub fn new(manager: Arc<TaskManager>) -> Self {
        Self { manager }
    }

    /// Run one pass. Backend failures skip the affected step until the next tick.
    pub async fn tick(&self) {
        trace!("Reconciliation tick");
        self.manager.surface().ensure_injected();

        let client = self.manager.client();
        let (restart, active) = futures::join!(client.is_restart_required(), client.active_operations());

        match restart {
            Ok(true) => {
                self.manager.raise_restart_banner(false).await;
            }
            Ok(false) => {}
            Err(err) => debug!("IsRestartRequired skipped: {}", err),
        }

        match active {
            Ok(active) => {
                for (category, subject) in active.operations() {
                    self.manager.adopt(category, subject);
                }
                self.manager.render_dock();
            }
            Err(err) => debug!("GetActiveDownloads skipped: {}", err),
        }
    }

    /// Tick immediately and then once per configured period until cancelled
    pub fn spawn(self) -> PeriodicTask {
        let period = self.manager.timing().reconcile_period();
        let this = Arc::new(self);
        PeriodicTask::spawn_now("reconcile", period, move || {
            let this = Arc::clone(&this);
            async move {
                this.tick().await;
                ControlFlow::Continue(())
            }
        })
    }
}
