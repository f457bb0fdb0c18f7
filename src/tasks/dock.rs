//! Minimized-task dock, derived from registry state

use super::models::{AppId, TaskCategory};
use super::registry::TaskSlotRegistry;

/// One indicator in the dock; clicking it restores `category`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockItem {
    pub category: TaskCategory,
    pub subject: AppId,
    pub icon: &'static str,
    pub title: String,
    /// Pulsing activity badge
    pub badge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockView {
    pub items: Vec<DockItem>,
}

impl DockView {
    /// The dock container is hidden entirely when nothing is minimized
    pub fn is_visible(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn item(&self, category: TaskCategory) -> Option<&DockItem> {
        self.items.iter().find(|item| item.category == category)
    }
}

pub fn render(registry: &TaskSlotRegistry) -> DockView {
    let items = registry
        .slots()
        .filter(|slot| slot.is_minimized())
        .map(|slot| DockItem {
            category: slot.category,
            subject: slot.subject,
            icon: slot.category.dock_icon(),
            title: format!("{} - Click to Show", slot.category.dock_title()),
            badge: true,
        })
        .collect();

    DockView { items }
}
