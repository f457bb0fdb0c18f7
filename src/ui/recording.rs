//! Surface that records everything it is asked to show

use super::{ModalId, Surface};
use crate::tasks::dock::DockView;
use crate::tasks::presenter::RenderInstruction;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    OpenModal(ModalId, RenderInstruction),
    UpdateModal(ModalId, RenderInstruction),
    CloseModal(ModalId),
    Notice(String),
    Alert(String),
    Dock(DockView),
    RestartBanner,
    Injected,
    OpenUrl(String),
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<SurfaceEvent>,
    open: HashMap<ModalId, RenderInstruction>,
}

/// In-memory surface for headless runs and tests.
///
/// Tracks which modals are open so `update_modal` behaves like a real UI:
/// updating a closed modal is a no-op that reports `false`.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    inner: Mutex<Recorded>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.lock().events.clone()
    }

    pub fn clear(&self) {
        self.lock().events.clear();
    }

    pub fn dock_renders(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|event| matches!(event, SurfaceEvent::Dock(_)))
            .count()
    }

    pub fn last_dock(&self) -> Option<DockView> {
        self.lock().events.iter().rev().find_map(|event| match event {
            SurfaceEvent::Dock(view) => Some(view.clone()),
            _ => None,
        })
    }

    pub fn is_open(&self, id: ModalId) -> bool {
        self.lock().open.contains_key(&id)
    }

    pub fn open_modals(&self) -> Vec<ModalId> {
        self.lock().open.keys().copied().collect()
    }

    /// Latest content shown for `id`, whether or not it is still open
    pub fn last_instruction(&self, id: ModalId) -> Option<RenderInstruction> {
        self.lock().events.iter().rev().find_map(|event| match event {
            SurfaceEvent::OpenModal(modal, content) | SurfaceEvent::UpdateModal(modal, content) if *modal == id => {
                Some(content.clone())
            }
            _ => None,
        })
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Alert(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Notice(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn open_modal(&self, id: ModalId, content: &RenderInstruction) {
        let mut inner = self.lock();
        inner.open.insert(id, content.clone());
        inner.events.push(SurfaceEvent::OpenModal(id, content.clone()));
    }

    fn update_modal(&self, id: ModalId, content: &RenderInstruction) -> bool {
        let mut inner = self.lock();
        let Some(current) = inner.open.get_mut(&id) else {
            return false;
        };
        *current = content.clone();
        inner.events.push(SurfaceEvent::UpdateModal(id, content.clone()));
        true
    }

    fn close_modal(&self, id: ModalId) {
        let mut inner = self.lock();
        if inner.open.remove(&id).is_some() {
            inner.events.push(SurfaceEvent::CloseModal(id));
        }
    }

    fn notice(&self, message: &str) {
        self.lock().events.push(SurfaceEvent::Notice(message.to_string()));
    }

    fn alert(&self, message: &str) {
        self.lock().events.push(SurfaceEvent::Alert(message.to_string()));
    }

    fn render_dock(&self, dock: &DockView) {
        self.lock().events.push(SurfaceEvent::Dock(dock.clone()));
    }

    fn show_restart_banner(&self) {
        self.lock().events.push(SurfaceEvent::RestartBanner);
    }

    fn ensure_injected(&self) {
        self.lock().events.push(SurfaceEvent::Injected);
    }

    fn open_url(&self, url: &str) {
        self.lock().events.push(SurfaceEvent::OpenUrl(url.to_string()));
    }
}
